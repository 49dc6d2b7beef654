//! Emulator for a small 16-bit-instruction-word microcomputer: eight general
//! registers, a 4096-word program store, a 4096-word data store and an 8x8
//! character display.

pub mod config;
pub mod console;
pub mod display;
pub mod fault;
pub mod instruction;
pub mod memory;
pub mod processor;
pub mod registers;
pub mod timer;

pub use config::Config;
pub use display::Display;
pub use fault::Fault;
pub use instruction::{dispatch, Instruction, Opcode};
pub use processor::{Halt, Processor, State};
