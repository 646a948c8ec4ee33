//! Firmware error type
//!
//! The collaborators on the board are infallible; the type exists so tasks
//! can propagate a failed pin, display or storage access with `?` and the
//! main loop can report it.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Display collaborator rejected a write
    Display,
    /// Persistent storage read or write failed
    Storage,
    /// Reading a button pin failed
    Input,
    /// Driving an output pin failed
    Output,
}

impl Error {
    pub const fn as_str(self) -> &'static str {
        match self {
            Error::Display => "display",
            Error::Storage => "storage",
            Error::Input => "input pin",
            Error::Output => "output pin",
        }
    }
}

impl ufmt::uDisplay for Error {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
