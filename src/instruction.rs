//! Instruction words are 16 bits, always written as 4 hex digits `OXYZ`. The
//! leading digit `O` selects the opcode, the other three hold operands.

use std::convert::TryFrom;
use std::fmt;

use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

use crate::fault::Fault;

/// Positional operand fields of an instruction word.
/// - `[o___]` opcode
/// - `[_x__]`, `[__y_]`, `[___z]` register indices or nibble literals
/// - `[__yz]` byte literal
/// - `[_xyz]` 12-bit address
pub trait Fields {
    fn o(&self) -> u8;
    fn x(&self) -> u8;
    fn y(&self) -> u8;
    fn z(&self) -> u8;
    fn byte(&self) -> u8;
    fn address(&self) -> u16;
}

impl Fields for u16 {
    fn o(&self) -> u8 {
        ((self & 0xF000) >> 12) as u8
    }

    fn x(&self) -> u8 {
        ((self & 0x0F00) >> 8) as u8
    }

    fn y(&self) -> u8 {
        ((self & 0x00F0) >> 4) as u8
    }

    fn z(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn byte(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn address(&self) -> u16 {
        self & 0x0FFF
    }
}

fn word(opcode: Opcode, x: u8, y: u8, z: u8) -> u16 {
    (u16::from(u8::from(opcode)) << 12)
        | (u16::from(x & 0xF) << 8)
        | (u16::from(y & 0xF) << 4)
        | u16::from(z & 0xF)
}

macro_rules! opcodes {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// Leading hex digit of an instruction word
        #[repr(u8)]
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Opcode {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

opcodes! {
    /// `0XYZ`: rX := YZ
    STORE = 0x0,
    /// `1XYZ`: rZ := rX + rY
    ADD = 0x1,
    /// `2XYZ`: rZ := rX - rY
    SUBTRACT = 0x2,
    /// `3X__`: rX := store[A]
    READ = 0x3,
    /// `4X__`: store[A] := rX
    WRITE = 0x4,
    /// `5XYZ`: PC := XYZ, which must be even
    JUMP = 0x5,
    /// `6X__`: rX := hex value typed on the keyboard
    READ_KEYBOARD = 0x6,
    /// `7___`: toggle the memory mode M
    SWITCH_MEMORY = 0x7,
    /// `8XY_`: skip the next instruction if rX == rY
    SKIP_EQUAL = 0x8,
    /// `9XY_`: skip the next instruction if rX != rY
    SKIP_NOT_EQUAL = 0x9,
    /// `AXYZ`: A := XYZ
    SET_A = 0xA,
    /// `B_YZ`: T := YZ
    SET_T = 0xB,
    /// `CX__`: rX := T
    READ_T = 0xC,
    /// `DX__`: decimal digits of rX to store[A..A+3]
    CONVERT_TO_BASE_TEN = 0xD,
    /// `EXY_`: rY := ASCII code of the hex digit in rX
    CONVERT_BYTE_TO_ASCII = 0xE,
    /// `FXYZ`: draw the character in rX at row Y, column Z
    DRAW = 0xF,
}

/// A decoded instruction with its operand fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Store { x: u8, value: u8 },
    Add { x: u8, y: u8, z: u8 },
    Subtract { x: u8, y: u8, z: u8 },
    Read { x: u8 },
    Write { x: u8 },
    Jump { address: u16 },
    ReadKeyboard { x: u8 },
    SwitchMemory,
    SkipEqual { x: u8, y: u8 },
    SkipNotEqual { x: u8, y: u8 },
    SetA { address: u16 },
    SetT { value: u8 },
    ReadT { x: u8 },
    ConvertToBaseTen { x: u8 },
    ConvertByteToAscii { x: u8, y: u8 },
    Draw { x: u8, row: u8, column: u8 },
}

impl Instruction {
    /// Slices the operand fields out of a word. Digits an opcode does not use
    /// are ignored.
    pub fn decode(word: u16) -> Result<Self, Fault> {
        let opcode = Opcode::try_from(word.o()).map_err(|_| Fault::UnknownInstruction {
            code: format_code(word),
        })?;

        let instruction = match opcode {
            Opcode::STORE => Instruction::Store {
                x: word.x(),
                value: word.byte(),
            },
            Opcode::ADD => Instruction::Add {
                x: word.x(),
                y: word.y(),
                z: word.z(),
            },
            Opcode::SUBTRACT => Instruction::Subtract {
                x: word.x(),
                y: word.y(),
                z: word.z(),
            },
            Opcode::READ => Instruction::Read { x: word.x() },
            Opcode::WRITE => Instruction::Write { x: word.x() },
            Opcode::JUMP => Instruction::Jump {
                address: word.address(),
            },
            Opcode::READ_KEYBOARD => Instruction::ReadKeyboard { x: word.x() },
            Opcode::SWITCH_MEMORY => Instruction::SwitchMemory,
            Opcode::SKIP_EQUAL => Instruction::SkipEqual {
                x: word.x(),
                y: word.y(),
            },
            Opcode::SKIP_NOT_EQUAL => Instruction::SkipNotEqual {
                x: word.x(),
                y: word.y(),
            },
            Opcode::SET_A => Instruction::SetA {
                address: word.address(),
            },
            Opcode::SET_T => Instruction::SetT { value: word.byte() },
            Opcode::READ_T => Instruction::ReadT { x: word.x() },
            Opcode::CONVERT_TO_BASE_TEN => Instruction::ConvertToBaseTen { x: word.x() },
            Opcode::CONVERT_BYTE_TO_ASCII => Instruction::ConvertByteToAscii {
                x: word.x(),
                y: word.y(),
            },
            Opcode::DRAW => Instruction::Draw {
                x: word.x(),
                row: word.y(),
                column: word.z(),
            },
        };

        Ok(instruction)
    }

    /// Builds the word for this instruction, unused digits are 0
    pub fn encode(&self) -> u16 {
        let opcode = self.opcode();
        match *self {
            Instruction::Store { x, value } => word(opcode, x, value >> 4, value),
            Instruction::Add { x, y, z } | Instruction::Subtract { x, y, z } => {
                word(opcode, x, y, z)
            }
            Instruction::Read { x }
            | Instruction::Write { x }
            | Instruction::ReadKeyboard { x }
            | Instruction::ReadT { x }
            | Instruction::ConvertToBaseTen { x } => word(opcode, x, 0, 0),
            Instruction::Jump { address } | Instruction::SetA { address } => {
                word(opcode, 0, 0, 0) | (address & 0x0FFF)
            }
            Instruction::SwitchMemory => word(opcode, 0, 0, 0),
            Instruction::SkipEqual { x, y }
            | Instruction::SkipNotEqual { x, y }
            | Instruction::ConvertByteToAscii { x, y } => word(opcode, x, y, 0),
            Instruction::SetT { value } => word(opcode, 0, value >> 4, value),
            Instruction::Draw { x, row, column } => word(opcode, x, row, column),
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Store { .. } => Opcode::STORE,
            Instruction::Add { .. } => Opcode::ADD,
            Instruction::Subtract { .. } => Opcode::SUBTRACT,
            Instruction::Read { .. } => Opcode::READ,
            Instruction::Write { .. } => Opcode::WRITE,
            Instruction::Jump { .. } => Opcode::JUMP,
            Instruction::ReadKeyboard { .. } => Opcode::READ_KEYBOARD,
            Instruction::SwitchMemory => Opcode::SWITCH_MEMORY,
            Instruction::SkipEqual { .. } => Opcode::SKIP_EQUAL,
            Instruction::SkipNotEqual { .. } => Opcode::SKIP_NOT_EQUAL,
            Instruction::SetA { .. } => Opcode::SET_A,
            Instruction::SetT { .. } => Opcode::SET_T,
            Instruction::ReadT { .. } => Opcode::READ_T,
            Instruction::ConvertToBaseTen { .. } => Opcode::CONVERT_TO_BASE_TEN,
            Instruction::ConvertByteToAscii { .. } => Opcode::CONVERT_BYTE_TO_ASCII,
            Instruction::Draw { .. } => Opcode::DRAW,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().name();
        match *self {
            Instruction::Store { x, value } => write!(f, "{} r{} {}", name, x, value),
            Instruction::Add { x, y, z } | Instruction::Subtract { x, y, z } => {
                write!(f, "{} r{} r{} -> r{}", name, x, y, z)
            }
            Instruction::Read { x }
            | Instruction::Write { x }
            | Instruction::ReadKeyboard { x }
            | Instruction::ReadT { x }
            | Instruction::ConvertToBaseTen { x } => write!(f, "{} r{}", name, x),
            Instruction::Jump { address } | Instruction::SetA { address } => {
                write!(f, "{} 0x{:03X}", name, address)
            }
            Instruction::SwitchMemory => f.write_str(name),
            Instruction::SkipEqual { x, y } | Instruction::SkipNotEqual { x, y } => {
                write!(f, "{} r{} r{}", name, x, y)
            }
            Instruction::SetT { value } => write!(f, "{} {}", name, value),
            Instruction::ConvertByteToAscii { x, y } => write!(f, "{} r{} -> r{}", name, x, y),
            Instruction::Draw { x, row, column } => {
                write!(f, "{} r{} row {} column {}", name, x, row, column)
            }
        }
    }
}

/// Builds the instruction named by a 4-hex-digit code such as `"A064"`.
/// The leading digit must be one of `0-9` or `A-F`.
pub fn dispatch(code: &str) -> Result<Instruction, Fault> {
    let leading = code.chars().next();
    if !matches!(leading, Some('0'..='9') | Some('A'..='F')) {
        return Err(Fault::UnknownInstruction {
            code: code.to_string(),
        });
    }

    if code.len() != 4 {
        return Err(Fault::MalformedInstruction {
            code: code.to_string(),
        });
    }
    let word = u16::from_str_radix(code, 16).map_err(|_| Fault::MalformedInstruction {
        code: code.to_string(),
    })?;

    Instruction::decode(word)
}

/// Renders a word as its 4-hex-digit code
pub fn format_code(word: u16) -> String {
    format!("{:04X}", word)
}
