use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use log::*;

use crate::config::Config;
use crate::console::{parse_hex_input, Keyboard, LogObserver, Observer, StdinKeyboard};
use crate::display::{Display, HEIGHT, WIDTH};
use crate::fault::Fault;
use crate::instruction::{dispatch, format_code, Instruction};
use crate::memory::{Address, DataStore, ProgramStore, Word, STORE_SIZE};
use crate::registers::{Mode, Registers};
use crate::timer::Timer;

/// Why the processor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Halt {
    /// Fetched the all-zero word
    ZeroWord,
    /// The program counter left the program store
    EndOfProgram,
    /// An instruction faulted
    Fault,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::ZeroWord => f.write_str("reached instruction 0000"),
            Halt::EndOfProgram => f.write_str("program counter left the program store"),
            Halt::Fault => f.write_str("instruction fault"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Running,
    Halted(Halt),
}

/// Emulates the CPU: registers, both stores and the display, plus the
/// observer and keyboard it talks to.
pub struct Processor {
    pub registers: Registers,
    /// Program store, holds the program counter
    pub rom: ProgramStore,
    /// Data store
    pub ram: DataStore,
    pub display: Arc<Display>,
    observer: Arc<dyn Observer>,
    keyboard: Box<dyn Keyboard>,
    render_after_draw: bool,
    state: State,
}

impl Default for Processor {
    /// Initializes a new CPU that logs and reads stdin
    fn default() -> Self {
        Self::new(Arc::new(LogObserver), Box::new(StdinKeyboard))
    }
}

impl Processor {
    /// Initializes a new CPU
    pub fn new(observer: Arc<dyn Observer>, keyboard: Box<dyn Keyboard>) -> Self {
        Self {
            registers: Registers::default(),
            rom: ProgramStore::default(),
            ram: DataStore::default(),
            display: Arc::new(Display::default()),
            observer,
            keyboard,
            render_after_draw: true,
            state: State::Running,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_keyboard(mut self, keyboard: Box<dyn Keyboard>) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Loads a program image into the program store and gets ready to run it
    /// from address 0
    pub fn load_program(&mut self, bytes: &[u8]) {
        self.rom.load(bytes);
        self.state = State::Running;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pc(&self) -> Address {
        self.rom.pc()
    }

    fn halt(&mut self, halt: Halt) -> State {
        self.state = State::Halted(halt);
        self.observer.halted(halt);
        self.state
    }

    /// Reads from the store selected by M
    fn read_selected(&self, address: Address) -> Word {
        match self.registers.mode() {
            Mode::Program => self.rom.read(address),
            Mode::Data => self.ram.read(address),
        }
    }

    /// Writes to the store selected by M. Program store writes are refused
    /// unless it is writable.
    fn write_selected(&mut self, address: Address, value: Word) -> bool {
        match self.registers.mode() {
            Mode::Program => self.rom.write(address, value),
            Mode::Data => self.ram.write(address, value),
        }
    }

    /// Performs the effect of an instruction. Skips advance the program
    /// counter once here, on top of the regular advance.
    fn perform(&mut self, instruction: Instruction) -> Result<(), Fault> {
        match instruction {
            Instruction::Store { x, value } => {
                self.registers.set(x, Word::from(value));

                debug!("STORE r{} := {}", x, value);
            }
            Instruction::Add { x, y, z } => {
                let a = self.registers.get(x);
                let b = self.registers.get(y);
                let result = a.wrapping_add(b);
                self.registers.set(z, result);

                debug!("ADD {} {}: {}", a, b, result);
            }
            Instruction::Subtract { x, y, z } => {
                let a = self.registers.get(x);
                let b = self.registers.get(y);
                let result = a.wrapping_sub(b);
                self.registers.set(z, result);

                debug!("SUBTRACT {} {}: {}", a, b, result);
            }
            Instruction::Read { x } => {
                let address = Address::from(self.registers.a());
                let value = self.read_selected(address);
                self.registers.set(x, value);

                debug!(
                    "READ [{}] M={}: {}",
                    address,
                    u8::from(self.registers.mode()),
                    value
                );
            }
            Instruction::Write { x } => {
                let address = Address::from(self.registers.a());
                let value = self.registers.get(x);
                let written = self.write_selected(address, value);

                debug!(
                    "WRITE [{}] M={}: {} (written: {})",
                    address,
                    u8::from(self.registers.mode()),
                    value,
                    written
                );
            }
            Instruction::Jump { address } => {
                if address % 2 != 0 {
                    return Err(Fault::OddJumpAddress { address });
                }
                self.rom.set_pc(Address::from(address));

                debug!("JUMP {}", address);
            }
            Instruction::ReadKeyboard { x } => {
                let line = self.keyboard.read_line();
                let value = parse_hex_input(&line);
                self.registers.set(x, value);

                info!("Stored value {} (0x{:X}) in r{}", value, value, x);
            }
            Instruction::SwitchMemory => {
                self.registers.toggle_mode();

                debug!("SWITCH_MEMORY M={}", u8::from(self.registers.mode()));
            }
            Instruction::SkipEqual { x, y } => {
                let a = self.registers.get(x);
                let b = self.registers.get(y);
                if a == b {
                    self.rom.increment_pc();
                }

                debug!("SKIP_EQUAL {} {}: {}", a, b, a == b);
            }
            Instruction::SkipNotEqual { x, y } => {
                let a = self.registers.get(x);
                let b = self.registers.get(y);
                if a != b {
                    self.rom.increment_pc();
                }

                debug!("SKIP_NOT_EQUAL {} {}: {}", a, b, a != b);
            }
            Instruction::SetA { address } => {
                self.registers.set_a(address);

                debug!("SET_A {}", address);
            }
            Instruction::SetT { value } => {
                self.registers.set_t(value);

                debug!("SET_T {}", value);
            }
            Instruction::ReadT { x } => {
                let value = self.registers.t();
                self.registers.set(x, Word::from(value));

                debug!("READ_T r{} := {}", x, value);
            }
            Instruction::ConvertToBaseTen { x } => {
                let value = self.registers.get(x);
                let address = Address::from(self.registers.a());
                let digits = [value / 100, (value % 100) / 10, value % 10];
                for (offset, digit) in (0..).zip(digits.iter()) {
                    self.write_selected(address + offset, *digit);
                }

                debug!("CONVERT_TO_BASE_TEN {}: {:?} at [{}]", value, digits, address);
            }
            Instruction::ConvertByteToAscii { x, y } => {
                let value = self.registers.get(x);
                let digit = u32::try_from(value)
                    .ok()
                    .and_then(|v| std::char::from_digit(v, 16))
                    .ok_or(Fault::HexDigitOutOfRange { register: x, value })?;
                let ascii = digit.to_ascii_uppercase() as Word;
                self.registers.set(y, ascii);

                debug!("CONVERT_BYTE_TO_ASCII {}: {}", value, ascii);
            }
            Instruction::Draw { x, row, column } => {
                let value = self.registers.get(x);
                if !(0..=0x7F).contains(&value) {
                    return Err(Fault::AsciiOutOfRange { register: x, value });
                }
                if usize::from(row) >= HEIGHT || usize::from(column) >= WIDTH {
                    return Err(Fault::PositionOutOfBounds { row, column });
                }
                self.display.write(Word::from(column), Word::from(row), value);

                debug!("DRAW {} at row {}, column {}", value, row, column);
                if self.render_after_draw {
                    self.observer.screen(&self.display.render());
                }
            }
        }

        Ok(())
    }

    /// Moves the program counter past an instruction. JUMP already set it.
    fn advance(&mut self, instruction: Instruction) {
        if let Instruction::Jump { .. } = instruction {
            return;
        }
        self.rom.increment_pc();
    }

    /// Performs an instruction and advances the program counter. A faulting
    /// instruction leaves the program counter where it was.
    pub fn execute_instruction(&mut self, instruction: Instruction) -> Result<(), Fault> {
        self.perform(instruction)?;
        self.advance(instruction);
        Ok(())
    }

    /// Runs one execution step
    pub fn step(&mut self) -> Result<State, Fault> {
        if let State::Halted(_) = self.state {
            return Ok(self.state);
        }

        let pc = self.rom.pc();
        if pc < 0 || pc as usize >= STORE_SIZE {
            return Ok(self.halt(Halt::EndOfProgram));
        }

        let word = (self.rom.read(pc) & 0xFFFF) as u16;
        if word == 0 {
            return Ok(self.halt(Halt::ZeroWord));
        }

        let code = format_code(word);
        self.observer.instruction(pc, &code);

        let result = dispatch(&code).and_then(|instruction| {
            trace!("{}", instruction);
            self.execute_instruction(instruction)
        });
        if let Err(fault) = result {
            self.observer.fault(pc, &code, &fault);
            self.halt(Halt::Fault);
            return Err(fault);
        }

        let pc = self.rom.pc();
        if pc < 0 || pc as usize >= STORE_SIZE {
            return Ok(self.halt(Halt::EndOfProgram));
        }

        Ok(self.state)
    }

    /// Run program until a halt condition is met, then render the display
    pub fn execute_until_halt(&mut self) -> Result<Halt> {
        let result = loop {
            let pc = self.rom.pc();
            match self.step() {
                Ok(State::Running) => continue,
                Ok(State::Halted(halt)) => break Ok(halt),
                Err(fault) => {
                    let code = self.rom.hex_instruction(pc);
                    break Err::<Halt, _>(fault).wrap_err_with(|| {
                        format!("Program terminated at PC {} (instruction {})", pc, code)
                    });
                }
            }
        };

        self.observer.screen(&self.display.render());
        result
    }

    /// Runs one CPU session: the timer counts T down in the background while
    /// the program runs to a halt
    pub fn run(&mut self, config: &Config) -> Result<Halt> {
        self.render_after_draw = config.render_after_draw;

        let mut timer = Timer::new(
            self.registers.countdown(),
            Arc::clone(&self.display),
            Arc::clone(&self.observer),
            config,
        );
        if config.timer_enabled {
            timer.start();
        }

        let result = self.execute_until_halt();
        timer.stop();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedKeyboard;
    use crate::write_words;
    use color_eyre::eyre::Result;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        instructions: Mutex<Vec<(Address, String)>>,
        screens: Mutex<Vec<String>>,
        faults: Mutex<Vec<Fault>>,
        halts: Mutex<Vec<Halt>>,
    }

    impl Observer for Recorder {
        fn instruction(&self, pc: Address, code: &str) {
            self.instructions.lock().push((pc, code.to_string()));
        }

        fn screen(&self, rendered: &str) {
            self.screens.lock().push(rendered.to_string());
        }

        fn fault(&self, _pc: Address, _code: &str, fault: &Fault) {
            self.faults.lock().push(fault.clone());
        }

        fn halted(&self, halt: Halt) {
            self.halts.lock().push(halt);
        }
    }

    fn cpu() -> Processor {
        Processor::new(Arc::new(Recorder::default()), Box::new(ScriptedKeyboard::default()))
    }

    fn recorded() -> (Processor, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let cpu = cpu().with_observer(Arc::clone(&recorder) as Arc<dyn Observer>);
        (cpu, recorder)
    }

    fn execute(cpu: &mut Processor, word: u16) -> Result<(), Fault> {
        cpu.execute_instruction(Instruction::decode(word)?)
    }

    #[test]
    fn test_store() -> Result<()> {
        let mut cpu = cpu();
        execute(&mut cpu, 0x0348)?;

        assert_eq!(cpu.registers.get(3), 0x48);
        assert_eq!(cpu.pc(), 1);

        Ok(())
    }

    #[test]
    fn test_add() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 10);
        cpu.registers.set(1, 20);
        execute(&mut cpu, 0x1012)?;

        assert_eq!(cpu.registers.get(2), 30);
        assert_eq!(cpu.registers.get(0), 10);
        assert_eq!(cpu.registers.get(1), 20);
        assert_eq!(cpu.pc(), 1);

        Ok(())
    }

    #[test]
    fn test_add_is_not_clamped() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 200);
        cpu.registers.set(1, 100);
        execute(&mut cpu, 0x1010)?;

        assert_eq!(cpu.registers.get(0), 300);

        Ok(())
    }

    #[test]
    fn test_subtract() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 5);
        cpu.registers.set(1, 8);
        execute(&mut cpu, 0x2012)?;
        execute(&mut cpu, 0x2103)?;

        assert_eq!(cpu.registers.get(2), -3);
        assert_eq!(cpu.registers.get(3), 3);
        assert_eq!(cpu.pc(), 2);

        Ok(())
    }

    #[test]
    fn test_read_selects_store_by_mode() -> Result<()> {
        let mut cpu = cpu();
        cpu.ram.write(100, 11);
        cpu.rom.write_array(100, &[22]);
        cpu.registers.set_a(100);

        execute(&mut cpu, 0x3000)?;
        assert_eq!(cpu.registers.get(0), 11);

        cpu.registers.set_mode(Mode::Program);
        execute(&mut cpu, 0x3100)?;
        assert_eq!(cpu.registers.get(1), 22);

        Ok(())
    }

    #[test]
    fn test_write_selects_store_by_mode() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(4, 77);
        cpu.registers.set_a(200);

        execute(&mut cpu, 0x4400)?;
        assert_eq!(cpu.ram.read(200), 77);
        assert_eq!(cpu.rom.read(200), 0);

        cpu.registers.set_mode(Mode::Program);
        execute(&mut cpu, 0x4400)?;
        assert_eq!(cpu.rom.read(200), 0); // write protected

        cpu.rom.set_writable(true);
        execute(&mut cpu, 0x4400)?;
        assert_eq!(cpu.rom.read(200), 77);
        assert_eq!(cpu.pc(), 3);

        Ok(())
    }

    #[test]
    fn test_jump_sets_pc_exactly() -> Result<()> {
        for address in (0..0x1000u16).step_by(2) {
            let mut cpu = cpu();
            cpu.rom.set_pc(7);
            execute(&mut cpu, 0x5000 | address)?;
            assert_eq!(cpu.pc(), Address::from(address));
        }

        Ok(())
    }

    #[test]
    fn test_jump_to_odd_address_faults() {
        for address in (1..0x1000u16).step_by(2) {
            let mut cpu = cpu();
            cpu.rom.set_pc(6);
            let err = execute(&mut cpu, 0x5000 | address).unwrap_err();
            assert_eq!(err, Fault::OddJumpAddress { address });
            assert_eq!(cpu.pc(), 6);
        }
    }

    #[test]
    fn test_read_keyboard() -> Result<()> {
        let mut cpu = cpu().with_keyboard(Box::new(ScriptedKeyboard::new(vec![
            "1f", "zz", "", "ABC",
        ])));

        execute(&mut cpu, 0x6000)?;
        execute(&mut cpu, 0x6100)?;
        cpu.registers.set(2, 99);
        execute(&mut cpu, 0x6200)?;
        execute(&mut cpu, 0x6300)?;

        assert_eq!(cpu.registers.get(0), 0x1F);
        assert_eq!(cpu.registers.get(1), 0);
        assert_eq!(cpu.registers.get(2), 0);
        assert_eq!(cpu.registers.get(3), 0xAB);
        assert_eq!(cpu.pc(), 4);

        Ok(())
    }

    #[test]
    fn test_switch_memory() -> Result<()> {
        let mut cpu = cpu();
        execute(&mut cpu, 0x7000)?;
        assert_eq!(cpu.registers.mode(), Mode::Program);
        execute(&mut cpu, 0x7000)?;
        assert_eq!(cpu.registers.mode(), Mode::Data);
        assert_eq!(cpu.pc(), 2);

        Ok(())
    }

    #[test]
    fn test_skip_equal() -> Result<()> {
        for (a, b) in &[(5, 5), (0, 0), (-1, -1), (5, 6), (0, 1)] {
            let mut cpu = cpu();
            cpu.registers.set(0, *a);
            cpu.registers.set(1, *b);
            execute(&mut cpu, 0x8010)?;
            let expected = if a == b { 2 } else { 1 };
            assert_eq!(cpu.pc(), expected, "{} {}", a, b);
        }

        Ok(())
    }

    #[test]
    fn test_skip_not_equal() -> Result<()> {
        for (a, b) in &[(5, 5), (0, 0), (-1, -1), (5, 6), (0, 1)] {
            let mut cpu = cpu();
            cpu.registers.set(0, *a);
            cpu.registers.set(1, *b);
            execute(&mut cpu, 0x9010)?;
            let expected = if a != b { 2 } else { 1 };
            assert_eq!(cpu.pc(), expected, "{} {}", a, b);
        }

        Ok(())
    }

    #[test]
    fn test_set_a() -> Result<()> {
        let mut cpu = cpu();
        execute(&mut cpu, 0xAFFF)?;
        assert_eq!(cpu.registers.a(), 0xFFF);
        execute(&mut cpu, 0xA064)?;
        assert_eq!(cpu.registers.a(), 100);

        Ok(())
    }

    #[test]
    fn test_set_t_ignores_leading_digit() -> Result<()> {
        let mut cpu = cpu();
        execute(&mut cpu, 0xB9FF)?;
        assert_eq!(cpu.registers.t(), 0xFF);
        execute(&mut cpu, 0xB03C)?;
        assert_eq!(cpu.registers.t(), 0x3C);

        Ok(())
    }

    #[test]
    fn test_read_t() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set_t(42);
        execute(&mut cpu, 0xC500)?;
        assert_eq!(cpu.registers.get(5), 42);
        assert_eq!(cpu.registers.t(), 42);

        Ok(())
    }

    #[test]
    fn test_convert_to_base_ten() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 254);
        cpu.registers.set_a(800);
        execute(&mut cpu, 0xD000)?;

        assert_eq!(cpu.ram.read(800), 2);
        assert_eq!(cpu.ram.read(801), 5);
        assert_eq!(cpu.ram.read(802), 4);
        assert_eq!(cpu.registers.get(0), 254);

        cpu.registers.set(1, 7);
        execute(&mut cpu, 0xD100)?;
        assert_eq!(cpu.ram.read(800), 0);
        assert_eq!(cpu.ram.read(801), 0);
        assert_eq!(cpu.ram.read(802), 7);

        Ok(())
    }

    #[test]
    fn test_convert_to_base_ten_program_store() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 123);
        cpu.registers.set_a(10);
        cpu.registers.set_mode(Mode::Program);

        execute(&mut cpu, 0xD000)?;
        assert_eq!(cpu.rom.read(10), 0);

        cpu.rom.set_writable(true);
        execute(&mut cpu, 0xD000)?;
        assert_eq!(cpu.rom.read(10), 1);
        assert_eq!(cpu.rom.read(11), 2);
        assert_eq!(cpu.rom.read(12), 3);
        assert_eq!(cpu.ram.read(10), 0);

        Ok(())
    }

    #[test]
    fn test_convert_to_base_ten_at_store_end() -> Result<()> {
        let mut cpu = cpu();
        cpu.registers.set(0, 987);
        cpu.registers.set_a(0xFFF);
        execute(&mut cpu, 0xD000)?;
        assert_eq!(cpu.ram.read(0xFFF), 9);

        Ok(())
    }

    #[test]
    fn test_convert_byte_to_ascii() -> Result<()> {
        let expected = b"0123456789ABCDEF";
        for (value, ascii) in expected.iter().enumerate() {
            let mut cpu = cpu();
            cpu.registers.set(1, value as Word);
            execute(&mut cpu, 0xE120)?;
            assert_eq!(cpu.registers.get(2), Word::from(*ascii));
        }

        Ok(())
    }

    #[test]
    fn test_convert_byte_to_ascii_out_of_range() {
        for value in &[16, 255, -1] {
            let mut cpu = cpu();
            cpu.registers.set(1, *value);
            let err = execute(&mut cpu, 0xE120).unwrap_err();
            assert_eq!(
                err,
                Fault::HexDigitOutOfRange {
                    register: 1,
                    value: *value
                }
            );
            assert_eq!(cpu.registers.get(2), 0);
            assert_eq!(cpu.pc(), 0);
        }
    }

    #[test]
    fn test_draw() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        cpu.registers.set(5, 88);
        execute(&mut cpu, 0xF567)?;

        assert_eq!(cpu.display.read(7, 6), 88);
        assert_eq!(recorder.screens.lock().len(), 1);
        assert_eq!(cpu.pc(), 1);

        Ok(())
    }

    #[test]
    fn test_draw_invalid_ascii() {
        let mut cpu = cpu();
        cpu.registers.set(0, 200);
        let err = execute(&mut cpu, 0xF000).unwrap_err();

        assert_eq!(
            err,
            Fault::AsciiOutOfRange {
                register: 0,
                value: 200
            }
        );
        assert!(err.to_string().contains("200"));
        assert!(err.to_string().contains("127"));
        assert!(cpu.display.frame().iter().all(|cell| *cell == 32));
    }

    #[test]
    fn test_draw_out_of_bounds() {
        let mut cpu = cpu();
        cpu.registers.set(0, 65);

        let err = execute(&mut cpu, 0xF080).unwrap_err();
        assert_eq!(err, Fault::PositionOutOfBounds { row: 8, column: 0 });

        let err = execute(&mut cpu, 0xF00F).unwrap_err();
        assert_eq!(err, Fault::PositionOutOfBounds { row: 0, column: 15 });

        assert!(cpu.display.frame().iter().all(|cell| *cell == 32));
    }

    #[test]
    fn test_step_halts_on_zero_word() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        cpu.load_program(&[0x00, 0x00]);

        assert_eq!(cpu.step()?, State::Halted(Halt::ZeroWord));
        assert_eq!(cpu.pc(), 0);
        assert!(recorder.instructions.lock().is_empty());
        assert_eq!(*recorder.halts.lock(), vec![Halt::ZeroWord]);

        // halted processors stay halted
        assert_eq!(cpu.step()?, State::Halted(Halt::ZeroWord));
        assert_eq!(recorder.halts.lock().len(), 1);

        Ok(())
    }

    #[test]
    fn test_step_reports_instructions() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        cpu.load_program(&[0xA0, 0x64, 0x01, 0x66]);

        assert_eq!(cpu.step()?, State::Running);
        assert_eq!(cpu.step()?, State::Running);

        assert_eq!(
            *recorder.instructions.lock(),
            vec![(0, "A064".to_string()), (1, "0166".to_string())]
        );

        Ok(())
    }

    #[test]
    fn test_step_masks_wide_words() -> Result<()> {
        let mut cpu = cpu();
        cpu.rom.write_array(0, &[0x1A064]);

        cpu.step()?;
        assert_eq!(cpu.registers.a(), 100);

        Ok(())
    }

    #[test]
    fn test_step_halts_on_wide_zero_word() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        cpu.registers.set(0, 7);
        cpu.rom.write_array(0, &[0x10000]);

        assert_eq!(cpu.step()?, State::Halted(Halt::ZeroWord));
        assert_eq!(cpu.registers.get(0), 7);
        assert_eq!(cpu.pc(), 0);
        assert!(recorder.instructions.lock().is_empty());

        Ok(())
    }

    #[test]
    fn test_end_of_program_store() -> Result<()> {
        let mut cpu = cpu();
        cpu.rom.write_array(4095, &[0xA001]);
        cpu.rom.set_pc(4095);

        assert_eq!(cpu.step()?, State::Halted(Halt::EndOfProgram));
        assert_eq!(cpu.registers.a(), 1);
        assert_eq!(cpu.pc(), 4096);

        Ok(())
    }

    #[test]
    fn test_fault_halts() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        let rom = &mut cpu.rom;
        write_words!(rom : 0 => 0x0080, 0xF000, 0x0041);

        assert_eq!(cpu.step()?, State::Running);
        let err = cpu.step().unwrap_err();

        assert_eq!(
            err,
            Fault::AsciiOutOfRange {
                register: 0,
                value: 128
            }
        );
        assert_eq!(cpu.state(), State::Halted(Halt::Fault));
        assert_eq!(cpu.pc(), 1);
        assert_eq!(*recorder.faults.lock(), vec![err]);

        Ok(())
    }

    #[test]
    fn test_execute_until_halt_reports_fault() {
        let (mut cpu, recorder) = recorded();
        cpu.load_program(&[0x50, 0x03]);

        let err = cpu.execute_until_halt().unwrap_err();
        let report = format!("{:?}", err);

        assert!(report.contains("PC 0"));
        assert!(report.contains("5003"));
        assert_eq!(
            err.root_cause().downcast_ref::<Fault>(),
            Some(&Fault::OddJumpAddress { address: 3 })
        );
        // final render happens on faults too
        assert_eq!(recorder.screens.lock().len(), 1);
    }

    #[test]
    fn test_execute_until_halt_renders_once() -> Result<()> {
        let (mut cpu, recorder) = recorded();
        cpu.load_program(&[0xA0, 0x64, 0x00, 0x00]);

        assert_eq!(cpu.execute_until_halt()?, Halt::ZeroWord);
        assert_eq!(cpu.registers.a(), 100);
        assert_eq!(cpu.pc(), 1);
        assert_eq!(recorder.screens.lock().len(), 1);

        Ok(())
    }
}
