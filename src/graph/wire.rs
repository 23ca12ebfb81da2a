//! Verbindingen tussen blokken.

use std::fmt;

use super::block::BlockId;

/// Pin binnen een blok, aangeduid met de pin-naam.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinId(pub String);

impl PinId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PinId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PinId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Verbinding van een output-pin naar een input-pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Wire {
    pub from_block: BlockId,
    pub from_pin: PinId,
    pub to_block: BlockId,
    pub to_pin: PinId,
}

impl Wire {
    #[must_use]
    pub fn new<F, T, PF, PT>(from_block: F, from_pin: PF, to_block: T, to_pin: PT) -> Self
    where
        F: Into<BlockId>,
        T: Into<BlockId>,
        PF: Into<PinId>,
        PT: Into<PinId>,
    {
        Self {
            from_block: from_block.into(),
            from_pin: from_pin.into(),
            to_block: to_block.into(),
            to_pin: to_pin.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockId, PinId, Wire};

    #[test]
    fn wire_holds_all_fields() {
        let wire = Wire::new(BlockId::new(1), "geometry", BlockId::new(2), "instance");
        assert_eq!(wire.from_block, BlockId::new(1));
        assert_eq!(wire.to_block, BlockId::new(2));
        assert_eq!(wire.from_pin, PinId("geometry".to_owned()));
        assert_eq!(wire.to_pin, PinId("instance".to_owned()));
    }
}
