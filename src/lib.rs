//! Firmware for two ATmega328P lab instruments sharing one cooperative
//! scheduler: a reaction-time tester (`lab1`) and an autoranging multimeter
//! (`lab2`).
//!
//! Everything above [`hal`] is target independent and runs in host tests.

#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod config;
pub mod drivers;
pub mod error;
pub mod logger;
pub mod measurement;
pub mod render;
pub mod rtos;

#[cfg(target_arch = "avr")]
pub mod hal;

pub use error::{Error, Result};
