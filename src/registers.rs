use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::memory::Word;

/// Number of general-purpose registers
pub const GENERAL_REGISTERS: usize = 8;

/// Mask of the 12-bit address register
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// Which store READ, WRITE and CONVERT_TO_BASE_TEN operate on
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(TryFromPrimitive, IntoPrimitive)]
pub enum Mode {
    Data = 0,
    Program = 1,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Data
    }
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Data => Mode::Program,
            Mode::Program => Mode::Data,
        }
    }
}

/// Handle to the 8-bit countdown register. Clones refer to the same
/// register, so the timer thread and the processor see every update.
#[derive(Debug, Clone, Default)]
pub struct Countdown(Arc<AtomicU8>);

impl Countdown {
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: u8) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Decrements unless already 0. Returns the new value.
    pub fn decrement(&self) -> u8 {
        match self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| t.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }
}

/// The register file: r0-r7, the address register A, the mode flag M and the
/// countdown register T.
#[derive(Debug, Default)]
pub struct Registers {
    general: [Word; GENERAL_REGISTERS],
    a: u16,
    m: Mode,
    t: Countdown,
}

impl Registers {
    /// Reads a general register. Indices past r7 read as 0
    pub fn get(&self, index: u8) -> Word {
        self.general.get(index as usize).copied().unwrap_or(0)
    }

    /// Writes a general register. Writes past r7 are dropped
    pub fn set(&mut self, index: u8, value: Word) {
        match self.general.get_mut(index as usize) {
            Some(register) => *register = value,
            None => log::debug!("dropped write of {} to r{}", value, index),
        }
    }

    pub fn a(&self) -> u16 {
        self.a
    }

    pub fn set_a(&mut self, value: u16) {
        self.a = value & ADDRESS_MASK;
    }

    pub fn mode(&self) -> Mode {
        self.m
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.m = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.m = self.m.toggled();
    }

    pub fn t(&self) -> u8 {
        self.t.get()
    }

    pub fn set_t(&self, value: u8) {
        self.t.set(value);
    }

    /// A handle sharing this register file's countdown register
    pub fn countdown(&self) -> Countdown {
        self.t.clone()
    }
}

impl Clone for Registers {
    /// Copies every register. The copy gets its own countdown register,
    /// share T through `countdown` instead.
    fn clone(&self) -> Self {
        let t = Countdown::default();
        t.set(self.t());
        Self {
            general: self.general,
            a: self.a,
            m: self.m,
            t,
        }
    }
}
