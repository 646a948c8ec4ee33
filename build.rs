use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        // Both programs run on the same board
        println!("cargo:rustc-link-arg=-mmcu=atmega328p");
        println!("cargo:warning=Building for ATmega328P at 8MHz");
    }

    // Debug profiles log at debug level
    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:rustc-cfg=feature=\"debug\"");
    }
}
