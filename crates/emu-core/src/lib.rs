//! Core traits and types shared by the chip and machine crates.
//!
//! The host CPU is external. Everything here describes how it reaches the
//! hardware (a 68000 word bus with byte masks) and how the hardware is
//! inspected (`Observable`).

mod bus;
mod clock;
mod observable;

pub use bus::{BusResult, MASK_HIGH_BYTE, MASK_LOW_BYTE, MASK_WORD, WordBus, combine_word};
pub use clock::{MasterClock, Ticks};
pub use observable::{Observable, Value, parse_index};
