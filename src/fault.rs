use std::error;
use std::fmt;

use crate::memory::Word;

/// Conditions that stop the processor. Out-of-range memory and display
/// accesses, refused program store writes and bad keyboard input are not
/// faults; they degrade to a default value or a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The leading digit of the code does not select an opcode
    UnknownInstruction { code: String },
    /// The code is not four hexadecimal digits
    MalformedInstruction { code: String },
    /// Jump targets must be even
    OddJumpAddress { address: u16 },
    /// CONVERT_BYTE_TO_ASCII source outside 0..=15
    HexDigitOutOfRange { register: u8, value: Word },
    /// DRAW source outside 0..=127
    AsciiOutOfRange { register: u8, value: Word },
    /// DRAW row or column outside 0..=7
    PositionOutOfBounds { row: u8, column: u8 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::UnknownInstruction { code } => write!(f, "unknown instruction `{}`", code),
            Fault::MalformedInstruction { code } => {
                write!(f, "malformed instruction `{}`: expected 4 hex digits", code)
            }
            Fault::OddJumpAddress { address } => write!(
                f,
                "jump address {} (0x{:X}) is not divisible by 2",
                address, address
            ),
            Fault::HexDigitOutOfRange { register, value } => write!(
                f,
                "value in r{} ({}) is outside 0..=F (15)",
                register, value
            ),
            Fault::AsciiOutOfRange { register, value } => write!(
                f,
                "ASCII value in r{} ({}) exceeds 7F (127)",
                register, value
            ),
            Fault::PositionOutOfBounds { row, column } => write!(
                f,
                "screen position out of bounds: row={}, column={} (0-7)",
                row, column
            ),
        }
    }
}

impl error::Error for Fault {}
