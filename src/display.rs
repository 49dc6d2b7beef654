use parking_lot::Mutex;

use crate::memory::Word;

pub const WIDTH: usize = 8;
pub const HEIGHT: usize = 8;
pub const CELLS: usize = WIDTH * HEIGHT;

/// Character code of a blank cell
pub const SPACE: Word = 32;

/// 8x8 grid of character codes. Cells are addressed by (column, row) or by a
/// linear index `row * 8 + column`. Out-of-range writes are dropped and reads
/// yield 0.
///
/// The buffer sits behind a lock so the timer thread can render while the
/// processor draws.
#[derive(Debug)]
pub struct Display {
    cells: Mutex<[Word; CELLS]>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            cells: Mutex::new([SPACE; CELLS]),
        }
    }
}

impl Display {
    /// Linear index of a position, if it is on screen
    pub fn to_index(column: Word, row: Word) -> Option<usize> {
        let on_screen = |v: Word, limit: usize| v >= 0 && (v as usize) < limit;
        if on_screen(column, WIDTH) && on_screen(row, HEIGHT) {
            Some(row as usize * WIDTH + column as usize)
        } else {
            None
        }
    }

    /// (column, row) of a linear index, if it is on screen
    pub fn to_coordinates(index: usize) -> Option<(usize, usize)> {
        if index < CELLS {
            Some((index % WIDTH, index / WIDTH))
        } else {
            None
        }
    }

    pub fn write(&self, column: Word, row: Word, code: Word) {
        if let Some(index) = Self::to_index(column, row) {
            self.cells.lock()[index] = code;
        }
    }

    pub fn write_index(&self, index: usize, code: Word) {
        if let Some(cell) = self.cells.lock().get_mut(index) {
            *cell = code;
        }
    }

    pub fn read(&self, column: Word, row: Word) -> Word {
        Self::to_index(column, row).map_or(0, |index| self.cells.lock()[index])
    }

    pub fn read_index(&self, index: usize) -> Word {
        self.cells.lock().get(index).copied().unwrap_or(0)
    }

    /// Fills the screen with spaces
    pub fn clear(&self) {
        *self.cells.lock() = [SPACE; CELLS];
    }

    /// Copy of the whole buffer
    pub fn frame(&self) -> [Word; CELLS] {
        *self.cells.lock()
    }

    /// Replaces the whole buffer. Rejected unless `frame` has exactly 64 cells
    pub fn set_frame(&self, frame: &[Word]) -> bool {
        if frame.len() != CELLS {
            return false;
        }
        self.cells.lock().copy_from_slice(frame);
        true
    }

    /// Bordered text rendering. Codes outside the printable range show as `?`
    pub fn render(&self) -> String {
        let frame = self.frame();
        let mut out = String::with_capacity((WIDTH + 3) * (HEIGHT + 2) * 3);

        out.push('┌');
        out.extend(std::iter::repeat('─').take(WIDTH));
        out.push_str("┐\n");
        for row in frame.chunks(WIDTH) {
            out.push('│');
            out.extend(row.iter().map(|code| printable(*code)));
            out.push_str("│\n");
        }
        out.push('└');
        out.extend(std::iter::repeat('─').take(WIDTH));
        out.push('┘');

        out
    }
}

fn printable(code: Word) -> char {
    match code {
        32..=126 => code as u8 as char,
        _ => '?',
    }
}

impl std::fmt::Display for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
