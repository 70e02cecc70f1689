//! Serializing a lookup tree into one contiguous buffer
//!
//! Layout is depth-first pre-order: a node record is followed by the full
//! subtree of its first child, then its second child, and so on. Instead of
//! writing placeholders and patching them afterwards, subtree sizes are
//! computed up front (children always have larger arena ids than their
//! parent, so one reverse sweep is a post-order pass), every node's absolute
//! offset is assigned, and the buffer is then emitted in a single pass.

use crate::format::{node_size, Header, ENTRY_SIZE, HEADER_SIZE};
use plut_engine::{LookupError, LookupTree, Result, Word};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialize `tree` with a header for `start` and `depth`.
pub fn serialize(tree: &LookupTree, start: Word, depth: u32) -> Result<Vec<u8>> {
    let nodes = tree.nodes();
    let n = nodes.len();
    let node = move |id: usize| nodes[id].entries();

    let mut subtree = vec![0usize; n];
    for id in (0..n).rev() {
        let entries = node(id);
        let below: usize = entries.iter().map(|e| subtree[e.child as usize]).sum();
        subtree[id] = node_size(entries.len()) + below;
    }

    let total = HEADER_SIZE + subtree[0];
    if u32::try_from(total).is_err() {
        return Err(LookupError::TableTooLarge(total));
    }

    let order = tree.preorder();
    let mut offset = vec![0u32; n];
    offset[0] = HEADER_SIZE as u32;
    for &id in &order {
        let entries = node(id as usize);
        let mut next = offset[id as usize] as usize + node_size(entries.len());
        for e in entries {
            offset[e.child as usize] = next as u32;
            next += subtree[e.child as usize];
        }
    }

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&Header::new(start, depth).encode());
    for &id in &order {
        debug_assert_eq!(buf.len(), offset[id as usize] as usize);
        let entries = node(id as usize);
        buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for e in entries {
            let at = buf.len();
            buf.extend_from_slice(&u16::from(e.feedback.code()).to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&u64::from(e.guess.code()).to_le_bytes());
            buf.extend_from_slice(&offset[e.child as usize].to_le_bytes());
            debug_assert_eq!(buf.len() - at, ENTRY_SIZE);
        }
    }
    debug_assert_eq!(buf.len(), total);

    debug!(bytes = buf.len(), nodes = n, "lookup table serialized");
    Ok(buf)
}

/// Write `bytes` to `path` through a temporary file in the same directory
/// and a rename, so readers never observe a partly written table.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        // best effort, the original error is what matters
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lookup".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
