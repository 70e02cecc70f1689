//! End-to-end table generation
//!
//! collect traces -> build tree -> serialize -> verify -> atomic write.
//! Any failure along the way aborts the run before the output path is
//! touched, so either a complete table is written or nothing is.

use crate::builder::{BuildStats, ConflictPolicy, TreeBuilder};
use crate::reader::{verify, TableStats};
use crate::writer::{serialize, write_atomic};
use plut_engine::{collect_traces, LookupError, Oracle, Result, TraceMap, Word};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Settings for one generation run
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub start: Word,
    pub depth: u32,
    pub policy: ConflictPolicy,
    /// Worker cap for trace collection (`None` = rayon default)
    pub jobs: Option<usize>,
}

impl GenerateConfig {
    pub fn new(start: Word, depth: u32) -> Self {
        GenerateConfig {
            start,
            depth,
            policy: ConflictPolicy::default(),
            jobs: None,
        }
    }
}

/// A serialized, verified table ready to be written
#[derive(Debug, Clone)]
pub struct Table {
    pub bytes: Vec<u8>,
    pub build: BuildStats,
    pub layout: TableStats,
}

/// Build and serialize a table from already collected traces.
///
/// The serialized bytes are walked once more before being returned; if the
/// walk does not see exactly the nodes and entries the builder produced the
/// table is rejected.
pub fn build_table(config: &GenerateConfig, traces: &TraceMap) -> Result<Table> {
    let mut builder = TreeBuilder::new(config.start, config.depth)?.with_policy(config.policy);
    for (&target, trace) in traces {
        builder.add_trace(target, trace)?;
    }
    let (tree, build) = builder.finish();

    let bytes = serialize(&tree, config.start, config.depth)?;
    let layout = verify(&bytes)?;
    if layout.nodes != tree.len() || layout.entries != tree.entry_count() {
        return Err(LookupError::format(format!(
            "serialized table holds {} nodes / {} entries, tree has {} / {}",
            layout.nodes,
            layout.entries,
            tree.len(),
            tree.entry_count()
        )));
    }
    Ok(Table { bytes, build, layout })
}

/// Run the whole pipeline and write the table to `output`.
pub fn generate<O>(config: &GenerateConfig, oracle: &O, targets: &[Word], output: &Path) -> Result<Table>
where
    O: Oracle + ?Sized,
{
    // reject a bad depth before spending time on the oracle
    TreeBuilder::new(config.start, config.depth)?;

    let started = Instant::now();
    info!(start = %config.start, depth = config.depth, targets = targets.len(), "generating lookup table");

    let traces = collect_traces(oracle, targets, config.jobs)?;
    let table = build_table(config, &traces)?;
    write_atomic(output, &table.bytes)?;

    info!(
        path = %output.display(),
        bytes = table.bytes.len(),
        nodes = table.layout.nodes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "lookup table written"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plut_engine::fixtures::{answer_words, canned_oracle, first_candidate_traces};
    use plut_engine::Trace;

    #[test]
    fn test_build_table_counts() {
        let start = Word::parse("roate").unwrap();
        let traces = first_candidate_traces(start, &answer_words());
        let table = build_table(&GenerateConfig::new(start, 4), &traces).unwrap();
        assert_eq!(table.build.traces_used, traces.len());
        assert!(table.layout.nodes > 1);
        assert!(table.layout.max_level <= 3);
    }

    #[test]
    fn test_bad_depth_fails_before_collecting() {
        let start = Word::parse("roate").unwrap();
        let oracle = |_: Word| -> Result<Trace> { panic!("oracle must not be consulted") };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("t.bin");
        let err = generate(&GenerateConfig::new(start, 0), &oracle, &answer_words(), &out).unwrap_err();
        assert!(matches!(err, LookupError::InvalidDepth(0)));
        assert!(!out.exists());
    }

    #[test]
    fn test_generate_writes_file() {
        let start = Word::parse("roate").unwrap();
        let answers = answer_words();
        let traces = first_candidate_traces(start, &answers);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("lookup_roate.bin");
        let mut config = GenerateConfig::new(start, 3);
        config.jobs = Some(2);
        let table = generate(&config, &canned_oracle(&traces), &answers, &out).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), table.bytes);
    }
}
