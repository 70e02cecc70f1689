//! Packed 5-letter word encoding
//!
//! A word is stored as a 25-bit integer, 5 bits per letter, first letter in
//! the most significant group. Letters map to 1..=26 ('a' = 1); a zero group
//! never occurs in a valid word and is rendered as a placeholder when
//! decoding damaged data for display.

use crate::error::{LookupError, Result};
use std::fmt;
use std::str::FromStr;

/// Letters per word
pub const WORD_LEN: usize = 5;

const GROUP_BITS: u32 = 5;
const GROUP_MASK: u64 = 0x1F;

/// Glyph used for a zero (absent) letter group
pub const PLACEHOLDER: char = '-';

/// Glyph used for a group outside the alphabet (27..=31)
pub const UNKNOWN: char = '?';

/// A validated 5-letter lowercase word in packed form.
///
/// Ordering follows the packed code, which coincides with alphabetical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word(u32);

impl Word {
    /// Encode a word, rejecting anything but exactly 5 lowercase ASCII letters.
    pub fn parse(word: &str) -> Result<Self> {
        let bytes = word.as_bytes();
        if bytes.len() != WORD_LEN || !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(LookupError::InvalidWord(word.to_string()));
        }
        let code = bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << GROUP_BITS) | u32::from(b - b'a' + 1));
        Ok(Word(code))
    }

    /// Rebuild a word from a packed code read back from storage.
    pub fn from_code(code: u64) -> Result<Self> {
        if code >> (GROUP_BITS as usize * WORD_LEN) != 0 {
            return Err(LookupError::InvalidWord(decode_lossy(code)));
        }
        let valid = (0..WORD_LEN).all(|pos| matches!(group_at(code, pos), 1..=26));
        if !valid {
            return Err(LookupError::InvalidWord(decode_lossy(code)));
        }
        Ok(Word(code as u32))
    }

    /// The packed 25-bit code
    pub fn code(self) -> u32 {
        self.0
    }

    /// Letter index 0..26 at `pos` (0 = first letter)
    pub fn letter_at(self, pos: usize) -> u8 {
        group_at(u64::from(self.0), pos) - 1
    }

    /// Letter indices for all five positions
    pub fn letters(self) -> [u8; WORD_LEN] {
        std::array::from_fn(|pos| self.letter_at(pos))
    }

    /// Five ASCII bytes, as stored in a table header
    pub fn to_ascii(self) -> [u8; WORD_LEN] {
        self.letters().map(|l| b'a' + l)
    }
}

fn group_at(code: u64, pos: usize) -> u8 {
    let shift = GROUP_BITS as usize * (WORD_LEN - 1 - pos);
    ((code >> shift) & GROUP_MASK) as u8
}

/// Decode the low 25 bits of `code` for display, never failing.
pub fn decode_lossy(code: u64) -> String {
    (0..WORD_LEN)
        .map(|pos| match group_at(code, pos) {
            0 => PLACEHOLDER,
            g @ 1..=26 => (b'a' + g - 1) as char,
            _ => UNKNOWN,
        })
        .collect()
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for l in self.to_ascii() {
            write!(f, "{}", l as char)?;
        }
        Ok(())
    }
}

impl FromStr for Word {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        Word::parse(s)
    }
}
