//! Folding decision traces into one shared lookup tree
//!
//! Each trace that opens with the starting word contributes one path: at
//! level L the branch key is the feedback seen after guess L-1 and the value
//! is guess L. Levels run from 1 up to `min(depth, trace length) - 1`, so a
//! tree built for depth D has at most D-1 edges from root to leaf.
//!
//! Once a branch exists its guess is authoritative. A later trace arriving at
//! the same branch with a different guess is a determinism conflict, handled
//! according to `ConflictPolicy`.

use plut_engine::node::ROOT;
use plut_engine::{Branch, LookupError, LookupTree, Result, Step, TraceMap, Word, MAX_DEPTH};
use tracing::{debug, info, warn};

/// What to do when two traces disagree on the guess for a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Abort the build with `DeterminismConflict`
    #[default]
    Fail,
    /// Keep the first-seen guess and carry on (logged and counted)
    KeepFirst,
}

/// Counters gathered while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub traces_used: usize,
    pub traces_skipped: usize,
    pub conflicts: usize,
    /// Deepest level an edge was walked at (0 for an empty tree)
    pub max_depth: u32,
}

/// Incremental tree construction, one trace at a time.
pub struct TreeBuilder {
    start: Word,
    depth: u32,
    policy: ConflictPolicy,
    tree: LookupTree,
    stats: BuildStats,
}

impl TreeBuilder {
    /// `depth` must be in `1..=MAX_DEPTH`.
    pub fn new(start: Word, depth: u32) -> Result<Self> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(LookupError::InvalidDepth(depth));
        }
        Ok(TreeBuilder {
            start,
            depth,
            policy: ConflictPolicy::default(),
            tree: LookupTree::new(),
            stats: BuildStats::default(),
        })
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add the trace collected for `target`.
    ///
    /// Traces that are empty or open with a different word are skipped.
    pub fn add_trace(&mut self, target: Word, trace: &[Step]) -> Result<()> {
        match trace.first() {
            Some(first) if first.guess == self.start => {}
            Some(first) => {
                debug!(word = %target, opener = %first.guess, "skipping trace with foreign opener");
                self.stats.traces_skipped += 1;
                return Ok(());
            }
            None => {
                debug!(word = %target, "skipping empty trace");
                self.stats.traces_skipped += 1;
                return Ok(());
            }
        }

        let limit = trace.len().min(self.depth as usize);
        let mut node = ROOT;
        let mut prefix: Vec<u8> = Vec::with_capacity(limit);

        for level in 1..limit {
            let observed = trace[level - 1].feedback;
            if observed.is_solved() {
                break;
            }
            let candidate = trace[level].guess;

            node = match self.tree.branch(node, observed, candidate) {
                Branch::Created(child) => child,
                Branch::Existing(entry) if entry.guess == candidate => entry.child,
                Branch::Existing(entry) => match self.policy {
                    ConflictPolicy::Fail => {
                        return Err(LookupError::DeterminismConflict {
                            prefix,
                            feedback: observed.code(),
                            existing: entry.guess.to_string(),
                            candidate: candidate.to_string(),
                            target: target.to_string(),
                        });
                    }
                    ConflictPolicy::KeepFirst => {
                        warn!(
                            word = %target,
                            prefix = ?prefix,
                            fb = observed.code(),
                            kept = %entry.guess,
                            dropped = %candidate,
                            "determinism conflict, keeping first guess"
                        );
                        self.stats.conflicts += 1;
                        entry.child
                    }
                },
            };
            prefix.push(observed.code());
            self.stats.max_depth = self.stats.max_depth.max(level as u32);
        }

        self.stats.traces_used += 1;
        Ok(())
    }

    /// Hand over the finished tree.
    pub fn finish(self) -> (LookupTree, BuildStats) {
        info!(
            nodes = self.tree.len(),
            entries = self.tree.entry_count(),
            used = self.stats.traces_used,
            skipped = self.stats.traces_skipped,
            conflicts = self.stats.conflicts,
            "lookup tree built"
        );
        (self.tree, self.stats)
    }
}

/// Build a tree from a complete trace map, in word order.
pub fn build_tree(
    start: Word,
    depth: u32,
    traces: &TraceMap,
    policy: ConflictPolicy,
) -> Result<(LookupTree, BuildStats)> {
    let mut builder = TreeBuilder::new(start, depth)?.with_policy(policy);
    for (&target, trace) in traces {
        builder.add_trace(target, trace)?;
    }
    Ok(builder.finish())
}
