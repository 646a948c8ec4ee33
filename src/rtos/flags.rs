//! Single-word flag bus shared between interrupt handlers and tasks
//!
//! Every bit has one producer (an interrupt or a task) and is cleared by its
//! consumer. All read-modify-write operations are single atomic RMWs, so a
//! handler firing between a task's read and write cannot lose an update.

use core::marker::PhantomData;
use portable_atomic::{AtomicU16, Ordering};

/// A named bit on a [`FlagBus`]. Implemented by the [`flags!`](crate::flags) macro.
pub trait Flag: Copy {
    fn index(self) -> u8;

    #[inline]
    fn mask(self) -> u16 {
        debug_assert!(self.index() < 16);
        1 << self.index()
    }
}

/// Declare a `#[repr(u8)]` flag enum usable on a [`FlagBus`].
#[macro_export]
macro_rules! flags {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::rtos::flags::Flag for $name {
            #[inline]
            fn index(self) -> u8 {
                self as u8
            }
        }
    };
}

/// A plain (non-shared) set of flags, used for snapshots and effect masks
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FlagSet<F> {
    bits: u16,
    _flags: PhantomData<F>,
}

impl<F: Flag> FlagSet<F> {
    pub const EMPTY: Self = Self::from_bits(0);

    pub const fn from_bits(bits: u16) -> Self {
        Self {
            bits,
            _flags: PhantomData,
        }
    }

    #[inline]
    pub fn with(self, flag: F) -> Self {
        Self::from_bits(self.bits | flag.mask())
    }

    #[inline]
    pub fn contains(self, flag: F) -> bool {
        self.bits & flag.mask() != 0
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.bits
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl<F: Flag> Default for FlagSet<F> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<F> core::fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FlagSet({:#06x})", self.bits)
    }
}

pub struct FlagBus<F> {
    bits: AtomicU16,
    _flags: PhantomData<F>,
}

impl<F: Flag> FlagBus<F> {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU16::new(0),
            _flags: PhantomData,
        }
    }

    #[inline]
    pub fn set(&self, flag: F) {
        self.bits.fetch_or(flag.mask(), Ordering::AcqRel);
    }

    #[inline]
    pub fn clear(&self, flag: F) {
        self.bits.fetch_and(!flag.mask(), Ordering::AcqRel);
    }

    #[inline]
    pub fn toggle(&self, flag: F) {
        self.bits.fetch_xor(flag.mask(), Ordering::AcqRel);
    }

    #[inline]
    pub fn is_set(&self, flag: F) -> bool {
        self.bits.load(Ordering::Acquire) & flag.mask() != 0
    }

    /// Clear `flag` and report whether it was set.
    #[inline]
    pub fn take(&self, flag: F) -> bool {
        self.bits.fetch_and(!flag.mask(), Ordering::AcqRel) & flag.mask() != 0
    }

    pub fn snapshot(&self) -> FlagSet<F> {
        FlagSet::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Clear then set whole masks, each as one atomic operation.
    pub fn apply(&self, clear: FlagSet<F>, set: FlagSet<F>) {
        if !clear.is_empty() {
            self.bits.fetch_and(!clear.bits(), Ordering::AcqRel);
        }
        if !set.is_empty() {
            self.bits.fetch_or(set.bits(), Ordering::AcqRel);
        }
    }
}

impl<F: Flag> Default for FlagBus<F> {
    fn default() -> Self {
        Self::new()
    }
}
