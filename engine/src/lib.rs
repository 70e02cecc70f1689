//! plut Engine - Word, feedback and oracle types
//!
//! This crate holds the leaf pieces of lookup-table generation: the packed
//! word and feedback codecs, the arena tree that the builder fills in, and
//! the boundary to the external solver that supplies decision traces.
//!
//! It has no knowledge of the on-disk table format; see `plut-tree`.

pub mod error;
pub mod feedback;
pub mod fixtures;
pub mod node;
pub mod oracle;
pub mod word;

pub use error::{LookupError, Result};
pub use feedback::{feedback, Feedback};
pub use node::{Branch, DecisionNode, Entry, LookupTree, NodeId};
pub use oracle::{collect_traces, Oracle, Step, SubprocessOracle, Trace, TraceMap};
pub use word::Word;

/// Largest lookup depth accepted by the builder
pub const MAX_DEPTH: u32 = 16;
