/// Word-addressed persistent storage (the EEPROM on the board)
pub trait WordStorage {
    type Error;

    fn read_word(&mut self, slot: u16) -> Result<u16, Self::Error>;

    fn write_word(&mut self, slot: u16, value: u16) -> Result<(), Self::Error>;
}

/// Best reaction time kept in one storage slot. Lower is better.
pub struct BestScore {
    slot: u16,
}

impl BestScore {
    pub const fn new(slot: u16) -> Self {
        Self { slot }
    }

    /// Fold `result` into the stored record and return the record afterwards.
    /// The slot is only written when `result` is strictly better.
    pub fn record<S: WordStorage>(&self, storage: &mut S, result: u16) -> Result<u16, S::Error> {
        let best = storage.read_word(self.slot)?;
        if result < best {
            storage.write_word(self.slot, result)?;
            Ok(result)
        } else {
            Ok(best)
        }
    }
}
