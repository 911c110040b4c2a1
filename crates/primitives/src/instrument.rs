//! Instrument identifiers.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Unique identifier for a listed instrument (the vendor inner code).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct InstrumentId(pub u64);

impl InstrumentId {
    /// Create a new instrument ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw code.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_id_display() {
        assert_eq!(InstrumentId::new(1299).to_string(), "1299");
    }

    #[test]
    fn instrument_id_conversions() {
        let id: InstrumentId = 700_u64.into();
        let raw: u64 = id.into();
        assert_eq!(raw, 700);
        assert_eq!(id.get(), 700);
    }
}
