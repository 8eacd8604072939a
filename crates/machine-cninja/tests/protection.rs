//! Protection chip behaviour seen from the 68000 bus.

use deco_loopback::InputPorts;
use emu_core::{MASK_HIGH_BYTE, MASK_LOW_BYTE, MASK_WORD, WordBus};
use machine_cninja::{Cninja, CninjaConfig, GameVariant, SoundIrq, VBLANK_IRQ_LEVEL};

const CNINJA_PROT: u32 = 0x1B_C000;
const EDRANDY_PROT: u32 = 0x19_8000;

fn boot(variant: GameVariant) -> Cninja {
    let rom = vec![0; variant.config().memory_map.rom_size()];
    Cninja::new(CninjaConfig::new(variant, rom)).expect("rom covers window")
}

#[test]
fn cninja_reads_back_remapped_registers() {
    let mut board = boot(GameVariant::Cninja);
    let bus = board.bus_mut();
    // Register 0 (master level control) reads back at 0x080.
    bus.write_word(CNINJA_PROT, 0x1234, MASK_WORD);
    // Register 0x0C reads back at 0x0DC.
    bus.write_word(CNINJA_PROT + 0x18, 0x00C0, MASK_WORD);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x080).data, 0x1234);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x0DC).data, 0x00C0);
    // The write address itself is not a read address.
    assert_eq!(bus.read_word(CNINJA_PROT).data, 0);
}

#[test]
fn repeated_writes_are_idempotent() {
    let mut board = boot(GameVariant::Cninja);
    let bus = board.bus_mut();
    for _ in 0..3 {
        bus.write_word(CNINJA_PROT + 2, 0xA5A5, MASK_WORD);
    }
    assert_eq!(bus.read_word(CNINJA_PROT + 0x0DE).data, 0xA5A5);
}

#[test]
fn byte_writes_keep_the_other_half() {
    let mut board = boot(GameVariant::Cninja);
    let bus = board.bus_mut();
    bus.write_word(CNINJA_PROT + 4, 0x1234, MASK_WORD);
    bus.write_word(CNINJA_PROT + 4, 0xFF00, MASK_LOW_BYTE);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x0E6).data, 0x1200);
    bus.write_byte(CNINJA_PROT + 4, 0x56);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x0E6).data, 0x5600);
    bus.write_word(CNINJA_PROT + 4, 0xABCD, MASK_HIGH_BYTE);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x0E6).data, 0xAB00);
}

#[test]
fn unmapped_protection_reads_are_zero_not_open_bus() {
    let mut board = boot(GameVariant::Cninja);
    let bus = board.bus_mut();
    for offset in (0..0x1000).step_by(2) {
        bus.write_word(CNINJA_PROT + (offset & 0x1FF), 0xFFFF, MASK_WORD);
    }
    let mapped = bus.protection.map().offsets();
    for offset in (0..0x1000u32).step_by(2) {
        if mapped.contains(&(offset as u16)) {
            continue;
        }
        assert_eq!(bus.read_word(CNINJA_PROT + offset).data, 0, "offset {offset:#X}");
    }
    assert_eq!(bus.protection.unmapped_reads(), 0x800 - mapped.len() as u64);
}

#[test]
fn inputs_are_mirrored() {
    let mut board = boot(GameVariant::Cninja);
    board.set_inputs(InputPorts {
        player1: 0xFE,
        player2: 0xFD,
        coins: 0xF7,
        dsw1: 0x7F,
        dsw2: 0xBF,
    });
    let bus = board.bus_mut();
    assert_eq!(bus.read_word(CNINJA_PROT + 0x22C).data, 0xFDFE);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x1C8).data, 0x00F7);
    assert_eq!(bus.read_word(CNINJA_PROT + 0x036).data, 0xBF7F);
    assert_eq!(bus.read_byte(CNINJA_PROT + 0x22D).data, 0xFE);
}

#[test]
fn edrandy_table_differs_from_cninja() {
    let mut board = boot(GameVariant::Edrandy);
    let bus = board.bus_mut();
    bus.write_word(EDRANDY_PROT + 0x80, 0x0777, MASK_WORD);
    assert_eq!(bus.read_word(EDRANDY_PROT + 0x32A).data, 0x0777);
    assert_eq!(bus.read_word(EDRANDY_PROT + 0x080).data, 0);
    // 0x6C4 and 0x33E both read register 0x16.
    bus.write_word(EDRANDY_PROT + 0x2C, 0x00A0, MASK_WORD);
    assert_eq!(bus.read_word(EDRANDY_PROT + 0x6C4).data, 0x00A0);
    assert_eq!(bus.read_word(EDRANDY_PROT + 0x33E).data, 0x00A0);
}

#[test]
fn edrandy_spin_read_waits_for_vblank() {
    let mut board = boot(GameVariant::Edrandy);
    let result = board.bus_mut().read_word(EDRANDY_PROT + 0x2A6);
    assert!(result.spin_until_interrupt);
    assert!(board.is_cpu_suspended());

    board.vblank();
    assert!(!board.is_cpu_suspended());
    assert_eq!(board.take_main_irq(), Some(VBLANK_IRQ_LEVEL));
}

#[test]
fn sound_latch_interrupt_line_depends_on_board() {
    for (variant, base, line) in [
        (GameVariant::Cninja, CNINJA_PROT, SoundIrq::Irq1),
        (GameVariant::Stoneage, CNINJA_PROT, SoundIrq::Nmi),
        (GameVariant::Edrandy, EDRANDY_PROT, SoundIrq::Irq1),
    ] {
        let mut board = boot(variant);
        assert_eq!(board.take_sound_interrupt(), None);
        board.bus_mut().write_word(base + 0xA8, 0x0033, MASK_WORD);
        assert_eq!(board.take_sound_interrupt(), Some(line), "{variant}");
        assert_eq!(board.take_sound_interrupt(), None);
        assert_eq!(board.sound_latch(), 0x33);
        assert_eq!(board.bus().protection.registers().word(0x54), 0);
    }
}
