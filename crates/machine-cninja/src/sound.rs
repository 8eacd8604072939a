//! Sound latch between the main CPU and the audio CPU.

/// Interrupt line the latch raises on the audio CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundIrq {
    /// IRQ1 of the HuC6280 (original boards).
    Irq1,
    /// NMI of the Z80 (Stone Age bootleg).
    Nmi,
}

/// One-byte mailbox with a pending interrupt flag.
#[derive(Debug, Clone)]
pub struct SoundLatch {
    line: SoundIrq,
    value: u8,
    pending: bool,
}

impl SoundLatch {
    #[must_use]
    pub fn new(line: SoundIrq) -> Self {
        Self {
            line,
            value: 0,
            pending: false,
        }
    }

    /// Store a command and assert the audio CPU's interrupt.
    pub fn write(&mut self, value: u8) {
        self.value = value;
        self.pending = true;
        log::trace!("sound latch {value:#04X} -> {:?}", self.line);
    }

    /// Last byte written; reading does not clear it.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    #[must_use]
    pub fn line(&self) -> SoundIrq {
        self.line
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Acknowledge the interrupt, returning the line if one was raised.
    pub fn take_interrupt(&mut self) -> Option<SoundIrq> {
        std::mem::take(&mut self.pending).then_some(self.line)
    }
}
