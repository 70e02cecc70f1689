//! On-disk lookup table format, version 1
//!
//! Little-endian, no alignment padding beyond what is listed.
//!
//! ```text
//! Header (32 bytes):
//!   magic:      [u8; 4]  [0..4]    "PLUT"
//!   version:    u32      [4..8]    1
//!   depth:      u32      [8..12]   lookup depth the table was built for
//!   start_code: u64      [12..20]  packed starting word
//!   start_word: [u8; 5]  [20..25]  starting word, ASCII
//!   pad:        [u8; 3]  [25..28]  zero
//!   root:       u32      [28..32]  absolute offset of the root node (= 32)
//!
//! Node:
//!   count:      u32                number of entries
//!   entries:    [Entry; count]     ascending by feedback, unique
//!
//! Entry (16 bytes):
//!   feedback:   u16      [0..2]
//!   reserved:   u16      [2..4]    zero
//!   guess:      u64      [4..12]   packed guess word
//!   child:      u32      [12..16]  absolute offset of the child node, 0 = none
//! ```
//!
//! Child offsets always point past the node that holds them, so the node
//! graph is acyclic by construction.

use plut_engine::word::{decode_lossy, WORD_LEN};
use plut_engine::{LookupError, Result, Word};

pub const MAGIC: [u8; 4] = *b"PLUT";
pub const VERSION: u32 = 1;

pub const HEADER_SIZE: usize = 32;
pub const COUNT_SIZE: usize = 4;
pub const ENTRY_SIZE: usize = 16;

/// Child offset meaning "no subtree"
pub const NO_CHILD: u32 = 0;

/// Bytes taken by a node record with `entries` entries
pub const fn node_size(entries: usize) -> usize {
    COUNT_SIZE + entries * ENTRY_SIZE
}

/// Decoded table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub depth: u32,
    pub start: Word,
    pub root_offset: u32,
}

impl Header {
    pub fn new(start: Word, depth: u32) -> Self {
        Header {
            version: VERSION,
            depth,
            start,
            root_offset: HEADER_SIZE as u32,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..12].copy_from_slice(&self.depth.to_le_bytes());
        out[12..20].copy_from_slice(&u64::from(self.start.code()).to_le_bytes());
        out[20..25].copy_from_slice(&self.start.to_ascii());
        out[28..32].copy_from_slice(&self.root_offset.to_le_bytes());
        out
    }

    /// Parse and validate the header at the front of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(LookupError::format(format!(
                "{} bytes is shorter than the {}-byte header",
                buf.len(),
                HEADER_SIZE
            )));
        }
        if buf[0..4] != MAGIC {
            return Err(LookupError::format(format!(
                "bad magic {:?}",
                String::from_utf8_lossy(&buf[0..4])
            )));
        }
        let version = read_u32(buf, 4);
        if version != VERSION {
            return Err(LookupError::format(format!("unsupported version {}", version)));
        }
        let depth = read_u32(buf, 8);
        let start_code = read_u64(buf, 12);
        let start = Word::from_code(start_code).map_err(|_| {
            LookupError::format(format!("bad start word code '{}'", decode_lossy(start_code)))
        })?;
        let ascii = &buf[20..20 + WORD_LEN];
        if ascii != start.to_ascii() {
            return Err(LookupError::format(format!(
                "start word '{}' disagrees with start code '{}'",
                String::from_utf8_lossy(ascii),
                start
            )));
        }
        let root_offset = read_u32(buf, 28);
        if (root_offset as usize) < HEADER_SIZE || root_offset as usize >= buf.len() {
            return Err(LookupError::format(format!(
                "root offset {} outside table of {} bytes",
                root_offset,
                buf.len()
            )));
        }
        Ok(Header {
            version,
            depth,
            start,
            root_offset,
        })
    }
}

/// Caller guarantees `at + 2 <= buf.len()`.
pub(crate) fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Caller guarantees `at + 4 <= buf.len()`.
pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

/// Caller guarantees `at + 8 <= buf.len()`.
pub(crate) fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}
