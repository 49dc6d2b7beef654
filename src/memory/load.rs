//! Program images are flat byte sequences, two bytes per word, high byte
//! first. A trailing odd byte is ignored.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};

use super::Word;

/// Combines byte pairs into big-endian words
pub fn words(bytes: &[u8]) -> impl Iterator<Item = Word> + '_ {
    bytes
        .chunks_exact(2)
        .map(|pair| Word::from(u16::from_be_bytes([pair[0], pair[1]])))
}

/// Reads a program image from disk
pub fn read_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .wrap_err_with(|| format!("Failed to read program `{}`", path.display()))?;

    if bytes.len() % 2 != 0 {
        log::warn!(
            "program `{}` has an odd length ({} bytes), ignoring the last byte",
            path.display(),
            bytes.len()
        );
    }

    Ok(bytes)
}
