//! Stone Age program ROM fix-up.
//!
//! The bootleg's program ROM still carries the original's protection
//! checks: a `cmpi.b`/`btst` against a protection address followed four
//! words later by a `beq`/`bne` with a long displacement (`$66FF`/`$67FF`).
//! Each such five-word sequence is replaced with NOPs.

const NOP: u16 = 0x4E71;
const CMPI_B: u16 = 0x0C39;
const BTST: u16 = 0x0839;
const BNE_LONG: u16 = 0x66FF;
const BEQ_LONG: u16 = 0x67FF;
/// Only the first 512K of program space holds the checks.
const PATCH_WINDOW: usize = 0x8_0000;

fn word(rom: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([rom[index * 2], rom[index * 2 + 1]])
}

fn set_word(rom: &mut [u8], index: usize, value: u16) {
    rom[index * 2..index * 2 + 2].copy_from_slice(&value.to_be_bytes());
}

/// NOP out every compare-and-branch self test. Returns the number of
/// sequences patched; running it again patches nothing.
pub fn patch_self_test_compares(rom: &mut [u8]) -> usize {
    let words = rom.len().min(PATCH_WINDOW) / 2;
    let mut patched = 0;
    for index in 4..words {
        if !matches!(word(rom, index), BNE_LONG | BEQ_LONG) {
            continue;
        }
        if !matches!(word(rom, index - 4), CMPI_B | BTST) {
            continue;
        }
        for nop in index - 4..=index {
            set_word(rom, nop, NOP);
        }
        log::debug!("patched self test at {:#07X}", (index - 4) * 2);
        patched += 1;
    }
    if patched > 0 {
        log::info!("stoneage: removed {patched} protection checks");
    }
    patched
}
