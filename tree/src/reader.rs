//! Reading a serialized lookup table back
//!
//! `LookupView` borrows the buffer and never mutates it. `walk` visits nodes
//! depth-first from the root, checking every count and offset against the
//! buffer bounds as it goes. The higher-level helpers (`verify`,
//! `decode_tree`, `dump`) only return a result once the whole walk has
//! succeeded, so a damaged file never yields a partial tree.

use crate::format::{node_size, read_u16, read_u32, read_u64, Header, COUNT_SIZE, ENTRY_SIZE, NO_CHILD};
use plut_engine::feedback::FEEDBACK_COUNT;
use plut_engine::node::{NodeId, ROOT};
use plut_engine::word::decode_lossy;
use plut_engine::{Branch, Feedback, LookupError, LookupTree, Result, Word, MAX_DEPTH};
use std::collections::HashSet;
use std::fmt::Write;

/// An entry exactly as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub feedback: u16,
    pub guess: u64,
    pub child: u32,
}

/// Walk callbacks, in visiting order: a node, then for each of its entries
/// the entry followed by the entry's whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Node { offset: u32, level: u32, count: u32 },
    Entry { level: u32, entry: RawEntry },
}

/// Counts gathered by `verify`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub nodes: usize,
    pub entries: usize,
    /// Deepest node level (root = 0)
    pub max_level: u32,
}

/// Read-only view over a lookup table buffer.
#[derive(Debug, Clone, Copy)]
pub struct LookupView<'a> {
    buf: &'a [u8],
    header: Header,
}

impl<'a> LookupView<'a> {
    /// Validate the header and wrap `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let header = Header::decode(buf)?;
        if header.depth > MAX_DEPTH {
            return Err(LookupError::format(format!("depth {} exceeds {}", header.depth, MAX_DEPTH)));
        }
        Ok(LookupView { buf, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Check the header's start word against the one the caller expects.
    pub fn expect_start(&self, start: Word) -> Result<()> {
        if self.header.start != start {
            return Err(LookupError::format(format!(
                "table starts with '{}', expected '{}'",
                self.header.start, start
            )));
        }
        Ok(())
    }

    /// Entries of the node at `offset`.
    ///
    /// Fails if the record runs past the buffer, feedback codes are out of
    /// range or not strictly ascending, or a child offset does not point past
    /// this record and inside the buffer.
    pub fn node(&self, offset: u32) -> Result<Vec<RawEntry>> {
        let start = offset as usize;
        if start < self.header.root_offset as usize || start + COUNT_SIZE > self.buf.len() {
            return Err(LookupError::format(format!("node offset {} out of bounds", offset)));
        }
        let count = read_u32(self.buf, start);
        if count > u32::from(FEEDBACK_COUNT) {
            return Err(LookupError::format(format!("node@{} claims {} entries", offset, count)));
        }
        let end = start + node_size(count as usize);
        if end > self.buf.len() {
            return Err(LookupError::format(format!(
                "node@{} with {} entries runs past end of {}-byte table",
                offset,
                count,
                self.buf.len()
            )));
        }

        let mut entries = Vec::with_capacity(count as usize);
        let mut previous: Option<u16> = None;
        for i in 0..count as usize {
            let at = start + COUNT_SIZE + i * ENTRY_SIZE;
            let entry = RawEntry {
                feedback: read_u16(self.buf, at),
                guess: read_u64(self.buf, at + 4),
                child: read_u32(self.buf, at + 12),
            };
            if entry.feedback >= FEEDBACK_COUNT {
                return Err(LookupError::format(format!(
                    "node@{}: feedback {} out of range",
                    offset, entry.feedback
                )));
            }
            if previous.is_some_and(|p| p >= entry.feedback) {
                return Err(LookupError::format(format!(
                    "node@{}: entries not strictly ascending at fb={}",
                    offset, entry.feedback
                )));
            }
            if entry.child != NO_CHILD
                && ((entry.child as usize) < end || entry.child as usize >= self.buf.len())
            {
                return Err(LookupError::format(format!(
                    "node@{}: child offset {} is not forward and in bounds",
                    offset, entry.child
                )));
            }
            previous = Some(entry.feedback);
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Depth-first walk from the root.
    ///
    /// Each node may be reached only once, and no node may sit deeper than
    /// the header's depth allows.
    pub fn walk<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(Event) -> Result<()>,
    {
        let mut seen = HashSet::new();
        self.visit(self.header.root_offset, 0, &mut seen, &mut f)
    }

    fn visit<F>(&self, offset: u32, level: u32, seen: &mut HashSet<u32>, f: &mut F) -> Result<()>
    where
        F: FnMut(Event) -> Result<()>,
    {
        if level >= self.header.depth.max(1) {
            return Err(LookupError::format(format!(
                "node@{} at level {} is deeper than table depth {}",
                offset, level, self.header.depth
            )));
        }
        if !seen.insert(offset) {
            return Err(LookupError::format(format!("node@{} reached twice", offset)));
        }
        let entries = self.node(offset)?;
        f(Event::Node {
            offset,
            level,
            count: entries.len() as u32,
        })?;
        for entry in entries {
            f(Event::Entry { level, entry })?;
            if entry.child != NO_CHILD {
                self.visit(entry.child, level + 1, seen, f)?;
            }
        }
        Ok(())
    }
}

/// Walk the whole table and count what it holds.
pub fn verify(buf: &[u8]) -> Result<TableStats> {
    let view = LookupView::parse(buf)?;
    let mut stats = TableStats::default();
    view.walk(|event| {
        match event {
            Event::Node { level, .. } => {
                stats.nodes += 1;
                stats.max_level = stats.max_level.max(level);
            }
            Event::Entry { .. } => stats.entries += 1,
        }
        Ok(())
    })?;
    Ok(stats)
}

/// Rebuild the logical tree stored in `buf`.
///
/// Entries with no child offset decode to entries whose child is an empty
/// node, which is how the builder represents leaves.
pub fn decode_tree(buf: &[u8]) -> Result<(Header, LookupTree)> {
    let view = LookupView::parse(buf)?;
    let mut tree = LookupTree::new();
    let mut open: Vec<NodeId> = Vec::new();
    let mut pending: Option<NodeId> = None;

    view.walk(|event| {
        match event {
            Event::Node { offset, level, .. } => {
                let id = if level == 0 {
                    ROOT
                } else {
                    pending
                        .take()
                        .ok_or_else(|| LookupError::format(format!("node@{} has no parent entry", offset)))?
                };
                open.truncate(level as usize);
                open.push(id);
            }
            Event::Entry { level, entry } => {
                let parent = open[level as usize];
                let feedback = Feedback::new(entry.feedback)?;
                let guess = Word::from_code(entry.guess).map_err(|_| {
                    LookupError::format(format!(
                        "invalid guess code '{}' at fb={}",
                        decode_lossy(entry.guess),
                        entry.feedback
                    ))
                })?;
                match tree.branch(parent, feedback, guess) {
                    Branch::Created(child) => pending = Some(child),
                    Branch::Existing(_) => {
                        return Err(LookupError::format(format!("duplicate fb={}", entry.feedback)));
                    }
                }
            }
        }
        Ok(())
    })?;

    Ok((*view.header(), tree))
}

/// Human-readable dump: a header line, then every node indented by level.
///
/// ```text
/// magic=PLUT version=1 depth=3 start=roate root=32
/// node@32: entries=1
///   fb=000 guess=slate child=52
///     node@52: entries=0
/// ```
pub fn dump(buf: &[u8]) -> Result<String> {
    let view = LookupView::parse(buf)?;
    let header = view.header();
    let mut out = String::new();
    writeln!(
        out,
        "magic=PLUT version={} depth={} start={} root={}",
        header.version, header.depth, header.start, header.root_offset
    )
    .map_err(text_error)?;
    view.walk(|event| {
        let written = match event {
            Event::Node { offset, level, count } => {
                writeln!(out, "{}node@{}: entries={}", indent(2 * level), offset, count)
            }
            Event::Entry { level, entry } => writeln!(
                out,
                "{}fb={:03} guess={} child={}",
                indent(2 * level + 1),
                entry.feedback,
                decode_lossy(entry.guess),
                entry.child
            ),
        };
        written.map_err(text_error)
    })?;
    Ok(out)
}

fn text_error(e: std::fmt::Error) -> LookupError {
    LookupError::format(format!("dump: {}", e))
}

fn indent(steps: u32) -> String {
    "  ".repeat(steps as usize)
}
