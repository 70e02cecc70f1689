//! plut Tree - Lookup table construction and inspection
//!
//! This crate folds per-word decision traces into a single lookup tree,
//! serializes it into the flat binary table format, and reads tables back
//! for verification and human-readable dumps.

pub mod builder;
pub mod format;
pub mod generate;
pub mod reader;
pub mod writer;

pub use builder::{build_tree, BuildStats, ConflictPolicy, TreeBuilder};
pub use format::Header;
pub use generate::{build_table, generate, GenerateConfig, Table};
pub use reader::{decode_tree, dump, verify, LookupView, TableStats};
pub use writer::{serialize, write_atomic};
