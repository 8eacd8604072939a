//! Construction errors.

use thiserror::Error;

use crate::config::GameVariant;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("unknown game variant `{0}`")]
    UnknownVariant(String),

    #[error("{variant} program ROM is {actual:#X} bytes, the board maps {expected:#X}")]
    RomTooSmall {
        variant: GameVariant,
        expected: usize,
        actual: usize,
    },
}
