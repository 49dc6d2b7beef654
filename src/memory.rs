use std::convert::TryFrom;
use std::path::Path;

use color_eyre::eyre::Result;

pub mod load;

/// Contents of a single store slot, register or display cell
pub type Word = i32;
/// Store address. Signed so that negative addresses can be rejected softly
pub type Address = i32;

/// Number of words in either store
pub const STORE_SIZE: usize = 4096;

/// Default memory
pub type StdMem = Memory<STORE_SIZE>;

/// General-purpose read/write memory
pub type DataStore = StdMem;

/// Emulates a word-addressed memory. Accesses outside `0..S` never fail:
/// reads yield 0 and writes are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    pub data: [Word; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> Memory<S> {
    fn slot(address: Address) -> Option<usize> {
        usize::try_from(address).ok().filter(|&slot| slot < S)
    }

    pub fn size(&self) -> usize {
        S
    }

    /// Reads a word from the memory
    pub fn read(&self, address: Address) -> Word {
        Self::slot(address).map_or(0, |slot| self.data[slot])
    }

    /// Writes a word to the memory, returns whether the address was in range
    pub fn write(&mut self, address: Address, value: Word) -> bool {
        match Self::slot(address) {
            Some(slot) => {
                self.data[slot] = value;
                true
            }
            None => {
                log::debug!("dropped write of {} to address {}", value, address);
                false
            }
        }
    }

    /// Writes an array of words to the memory
    pub fn write_array(&mut self, position: Address, words: &[Word]) {
        for (offset, word) in words.iter().enumerate() {
            self.write(position + offset as Address, *word);
        }
    }

    /// The word at `address` as 4 upper-case hex digits
    pub fn hex_word(&self, address: Address) -> String {
        format!("{:04X}", self.read(address) & 0xFFFF)
    }

    /// Logs `length` words starting at `start`, 8 per row
    pub fn dump(&self, start: Address, length: usize) {
        let addresses: Vec<Address> = (start..)
            .take(length)
            .filter(|address| Self::slot(*address).is_some())
            .collect();
        for row in addresses.chunks(8) {
            let words: Vec<String> = row.iter().map(|a| self.hex_word(*a)).collect();
            log::debug!("{:04X}: {}", row[0], words.join(" "));
        }
    }
}

/// Read-mostly instruction memory together with the program counter.
/// Instructions can only write to it while it is marked writable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramStore {
    memory: StdMem,
    pc: Address,
    writable: bool,
}

impl ProgramStore {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut store = Self::default();
        store.load(bytes);
        store
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = load::read_program(path)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Loads a big-endian program image starting at address 0 and resets the
    /// program counter. Slots past the image keep their previous contents.
    /// Returns the number of words loaded.
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        let mut loaded = 0;
        for (slot, word) in load::words(bytes).enumerate() {
            if slot >= STORE_SIZE {
                log::warn!(
                    "program is {} bytes, only the first {} words fit",
                    bytes.len(),
                    STORE_SIZE
                );
                break;
            }
            self.memory.data[slot] = word;
            loaded += 1;
        }
        self.pc = 0;

        log::debug!("loaded {} words", loaded);
        loaded
    }

    /// Writes words ignoring write protection, the way the loader does
    pub fn write_array(&mut self, position: Address, words: &[Word]) {
        self.memory.write_array(position, words);
    }

    pub fn read(&self, address: Address) -> Word {
        self.memory.read(address)
    }

    /// Writes a word if the store is writable and the address is in range
    pub fn write(&mut self, address: Address, value: Word) -> bool {
        if !self.writable {
            log::warn!("program store is write protected, dropped write to {}", address);
            return false;
        }
        self.memory.write(address, value)
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn set_pc(&mut self, address: Address) {
        self.pc = address;
    }

    pub fn increment_pc(&mut self) {
        self.pc += 1;
    }

    pub fn size(&self) -> usize {
        self.memory.size()
    }

    pub fn hex_instruction(&self, address: Address) -> String {
        self.memory.hex_word(address)
    }

    pub fn dump(&self, start: Address, length: usize) {
        self.memory.dump(start, length);
    }
}

/// Writes a block of instruction words directly into a memory
#[macro_export]
macro_rules! write_words {
    ( $mem:ident : $pos:expr => $( $word:expr ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $word as $crate::memory::Word,
            )+
        ]);
    };
}
