//! The processor's only contact with the outside world: an observer that
//! receives trace output and display renders, and a keyboard for
//! READ_KEYBOARD.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::fault::Fault;
use crate::memory::{Address, Word};
use crate::processor::Halt;

/// Receives what the processor and the timer want to show. Every method
/// defaults to doing nothing.
pub trait Observer: Send + Sync {
    /// Called before each instruction is executed
    fn instruction(&self, _pc: Address, _code: &str) {}

    /// Called with a rendered display
    fn screen(&self, _rendered: &str) {}

    /// Called when an instruction faults, before the processor halts
    fn fault(&self, _pc: Address, _code: &str, _fault: &Fault) {}

    /// Called once when the processor halts
    fn halted(&self, _halt: Halt) {}
}

/// Writes everything to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn instruction(&self, pc: Address, code: &str) {
        log::info!("PC: {}, Instruction: {}", pc, code);
    }

    fn screen(&self, rendered: &str) {
        log::info!("Current screen:\n{}", rendered);
    }

    fn fault(&self, pc: Address, code: &str, fault: &Fault) {
        log::error!("PC: {}, Instruction: {} terminated the program: {}", pc, code, fault);
    }

    fn halted(&self, halt: Halt) {
        log::info!("Program halted: {}", halt);
    }
}

/// Source of lines for READ_KEYBOARD
pub trait Keyboard {
    fn read_line(&mut self) -> String;
}

/// Shown before every keyboard read
pub const PROMPT: &str = "Enter hex digits (0-F, up to 2 digits): ";

/// Prompts on stdout and reads a line from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinKeyboard;

impl Keyboard for StdinKeyboard {
    fn read_line(&mut self) -> String {
        prompt(&mut io::stdout());

        let mut line = String::new();
        if let Err(err) = io::stdin().lock().read_line(&mut line) {
            log::warn!("failed to read keyboard input: {}", err);
            line.clear();
        }
        line
    }
}

/// Writes the keyboard prompt. A failed write is logged and otherwise ignored.
fn prompt<W: Write>(out: &mut W) -> bool {
    match write!(out, "{}", PROMPT).and_then(|_| out.flush()) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to write keyboard prompt: {}", err);
            false
        }
    }
}

/// Replays queued lines, then returns empty lines
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyboard {
    lines: VecDeque<String>,
}

impl ScriptedKeyboard {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, line: S) {
        self.lines.push_back(line.into());
    }
}

impl Keyboard for ScriptedKeyboard {
    fn read_line(&mut self) -> String {
        self.lines.pop_front().unwrap_or_default()
    }
}

/// Value of a keyboard line: its first two hex characters, ignoring
/// everything else. Lines without any hex characters yield 0.
pub fn parse_hex_input(line: &str) -> Word {
    let digits: String = line
        .chars()
        .filter(char::is_ascii_hexdigit)
        .take(2)
        .collect();

    Word::from_str_radix(&digits, 16).unwrap_or(0)
}
