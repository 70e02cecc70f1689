//! Boundary to the external solving strategy
//!
//! The solver that decides each guess is not part of this crate. It is
//! consulted once per target word through the `Oracle` trait and hands back
//! the full play-out for that word as a `Trace`. `SubprocessOracle` drives a
//! solver binary; tests pass plain closures.
//!
//! Collection fans out over rayon but the result is keyed by word in a
//! `BTreeMap`, so downstream consumers always see traces in the same order.

use crate::error::{LookupError, Result};
use crate::feedback::{feedback, Feedback};
use crate::word::Word;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// One round of play: the guess made and the feedback it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub guess: Word,
    pub feedback: Feedback,
}

/// Ordered guesses made while solving for one target word.
pub type Trace = Vec<Step>;

/// Traces for a set of target words, in word order.
pub type TraceMap = BTreeMap<Word, Trace>;

/// Anything that can produce the decision trace for a target word.
///
/// Implementations must be deterministic: the same target always yields the
/// same trace.
pub trait Oracle: Sync {
    fn trace_for(&self, target: Word) -> Result<Trace>;
}

impl<F> Oracle for F
where
    F: Fn(Word) -> Result<Trace> + Sync,
{
    fn trace_for(&self, target: Word) -> Result<Trace> {
        self(target)
    }
}

/// Flags requesting a plain search-based solve with a JSON trace on stdout.
const SOLVER_FLAGS: [&str; 3] = ["--disable-lookup", "--dump-json", "--word"];

/// Runs an external solver binary once per target word.
#[derive(Debug, Clone)]
pub struct SubprocessOracle {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl SubprocessOracle {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        SubprocessOracle {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Extra arguments passed before the trace flags
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }
}

impl Oracle for SubprocessOracle {
    fn trace_for(&self, target: Word) -> Result<Trace> {
        let word = target.to_string();
        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(SOLVER_FLAGS)
            .arg(&word)
            .output()
            .map_err(|e| {
                LookupError::oracle(&word, format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(LookupError::oracle(
                &word,
                format!("solver exited with {}: {}", output.status, last.trim()),
            ));
        }

        parse_trace(target, &String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Deserialize)]
struct RawStep {
    guess: String,
    feedback: u16,
}

/// Parse solver stdout: the last non-empty line must be a JSON array of
/// `{"guess": "<word>", "feedback": <0..=242>}` records.
pub fn parse_trace(target: Word, stdout: &str) -> Result<Trace> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| LookupError::oracle(target, "solver printed nothing"))?;

    let raw: Vec<RawStep> = serde_json::from_str(line)
        .map_err(|e| LookupError::oracle(target, format!("unparsable trace: {}", e)))?;

    raw.into_iter()
        .map(|step| {
            let guess = Word::parse(&step.guess)
                .map_err(|e| LookupError::oracle(target, e.to_string()))?;
            let feedback = Feedback::new(step.feedback)
                .map_err(|e| LookupError::oracle(target, e.to_string()))?;
            Ok(Step { guess, feedback })
        })
        .collect()
}

/// Check that a trace is a plausible play-out for `target`.
///
/// It must be non-empty, each feedback must be what the guess actually
/// scores against the target, and the all-correct code may only appear as
/// the final step. A trace that stops short of all-correct is accepted; the
/// solver may have hit its own guess limit.
pub fn validate_trace(target: Word, trace: &[Step]) -> Result<()> {
    if trace.is_empty() {
        return Err(LookupError::oracle(target, "empty trace"));
    }
    for (round, step) in trace.iter().enumerate() {
        let expected = feedback(step.guess, target);
        if step.feedback != expected {
            return Err(LookupError::oracle(
                target,
                format!(
                    "round {}: guess '{}' reported {} but scores {}",
                    round + 1,
                    step.guess,
                    step.feedback,
                    expected
                ),
            ));
        }
        if step.feedback.is_solved() && round + 1 != trace.len() {
            return Err(LookupError::oracle(
                target,
                format!("trace continues after solving in round {}", round + 1),
            ));
        }
    }
    Ok(())
}

/// Collect and validate one trace per distinct target.
///
/// `jobs` caps the worker count (`Some(1)` runs on the calling thread,
/// `None` uses rayon's global pool). The first failure aborts collection.
pub fn collect_traces<O>(oracle: &O, targets: &[Word], jobs: Option<usize>) -> Result<TraceMap>
where
    O: Oracle + ?Sized,
{
    let targets: Vec<Word> = targets.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let total = targets.len();
    let done = AtomicUsize::new(0);
    info!(targets = total, "collecting traces");

    let fetch = |target: Word| -> Result<(Word, Trace)> {
        let trace = oracle.trace_for(target)?;
        validate_trace(target, &trace)?;
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(word = %target, rounds = trace.len(), "trace collected");
        if n % 100 == 0 || n == total {
            info!(collected = n, total, "trace progress");
        }
        Ok((target, trace))
    };

    let pairs: Vec<(Word, Trace)> = match jobs {
        Some(1) => targets.iter().map(|&t| fetch(t)).collect::<Result<Vec<_>>>()?,
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| LookupError::Io(io::Error::other(e.to_string())))?
            .install(|| targets.par_iter().map(|&t| fetch(t)).collect::<Result<Vec<_>>>())?,
        None => targets.par_iter().map(|&t| fetch(t)).collect::<Result<Vec<_>>>()?,
    };

    Ok(pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Word {
        Word::parse(s).unwrap()
    }

    fn play(target: &str, guesses: &[&str]) -> Trace {
        guesses
            .iter()
            .map(|g| Step {
                guess: w(g),
                feedback: feedback(w(g), w(target)),
            })
            .collect()
    }

    #[test]
    fn test_parse_trace_uses_last_line() {
        let out = "thinking...\n\n[{\"guess\":\"roate\",\"feedback\":26},{\"guess\":\"slate\",\"feedback\":242}]\n\n";
        let trace = parse_trace(w("slate"), out).unwrap();
        assert_eq!(trace, play("slate", &["roate", "slate"]));
    }

    #[test]
    fn test_parse_trace_rejects_garbage() {
        let target = w("slate");
        for out in [
            "",
            "   \n",
            "not json",
            "[{\"guess\":\"roate\"}]",
            "[{\"guess\":\"ROATE\",\"feedback\":0}]",
            "[{\"guess\":\"roate\",\"feedback\":243}]",
            "[{\"guess\":\"roate\",\"feedback\":-1}]",
        ] {
            assert!(
                matches!(parse_trace(target, out), Err(LookupError::OracleFailure { .. })),
                "{:?} should fail",
                out
            );
        }
    }

    #[test]
    fn test_validate_accepts_real_play() {
        let trace = play("pious", &["roate", "lingo", "pious"]);
        assert!(validate_trace(w("pious"), &trace).is_ok());
    }

    #[test]
    fn test_validate_accepts_unsolved_trace() {
        let trace = play("pious", &["roate", "lingo"]);
        assert!(validate_trace(w("pious"), &trace).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_feedback() {
        let mut trace = play("slate", &["roate", "slate"]);
        trace[0].feedback = Feedback::new(0).unwrap();
        assert!(validate_trace(w("slate"), &trace).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_overlong() {
        assert!(validate_trace(w("slate"), &[]).is_err());
        let trace = play("slate", &["roate", "slate", "slate"]);
        assert!(validate_trace(w("slate"), &trace).is_err());
    }

    #[test]
    fn test_collect_is_ordered_and_deduplicated() {
        let oracle = |t: Word| -> Result<Trace> {
            let target = t.to_string();
            Ok(play(&target, &["roate", target.as_str()]))
        };
        let targets = [w("slate"), w("crane"), w("slate"), w("abide")];
        for jobs in [Some(1), Some(3), None] {
            let traces = collect_traces(&oracle, &targets, jobs).unwrap();
            let keys: Vec<String> = traces.keys().map(|k| k.to_string()).collect();
            assert_eq!(keys, vec!["abide", "crane", "slate"]);
        }
    }

    #[test]
    fn test_collect_aborts_on_failure() {
        let oracle = |t: Word| -> Result<Trace> {
            if t.to_string() == "crane" {
                Err(LookupError::oracle(t, "boom"))
            } else {
                let s = t.to_string();
                Ok(play(&s, &[s.as_str()]))
            }
        };
        let targets = [w("slate"), w("crane"), w("abide")];
        let err = collect_traces(&oracle, &targets, Some(1)).unwrap_err();
        assert!(matches!(err, LookupError::OracleFailure { ref target, .. } if target == "crane"));
    }

    #[test]
    fn test_collect_validates_oracle_output() {
        let oracle = |_: Word| -> Result<Trace> {
            Ok(vec![Step {
                guess: w("roate"),
                feedback: Feedback::ALL_CORRECT,
            }])
        };
        assert!(collect_traces(&oracle, &[w("slate")], Some(1)).is_err());
    }

    #[test]
    fn test_subprocess_missing_binary_is_oracle_failure() {
        let oracle = SubprocessOracle::new("/nonexistent/plut-solver");
        let err = oracle.trace_for(w("slate")).unwrap_err();
        assert!(matches!(err, LookupError::OracleFailure { .. }));
    }

    #[cfg(unix)]
    const SLATE_TRACE: &str = r#"[{"guess":"roate","feedback":26},{"guess":"slate","feedback":242}]"#;

    /// Runs `body` through `/bin/sh`, so the script itself needs no exec bit.
    #[cfg(unix)]
    fn shell_oracle(dir: &std::path::Path, body: &str, extra: &[&str]) -> SubprocessOracle {
        let script = dir.join("solver.sh");
        std::fs::write(&script, body).unwrap();
        let mut args = vec![script.to_string_lossy().into_owned()];
        args.extend(extra.iter().map(|a| a.to_string()));
        SubprocessOracle::new("/bin/sh").with_args(args)
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_trace_and_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let body = format!(
            "printf '%s\\n' \"$@\" > '{}'\necho \"$@\"\necho '{}'\n",
            args_file.display(),
            SLATE_TRACE
        );
        let oracle = shell_oracle(dir.path(), &body, &["--threads", "1"]);

        let trace = oracle.trace_for(w("slate")).unwrap();
        assert_eq!(trace, play("slate", &["roate", "slate"]));

        let args = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(
            args,
            vec!["--threads", "1", "--disable-lookup", "--dump-json", "--word", "slate"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_nonzero_exit_is_oracle_failure() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("echo '{}'\necho 'search blew up' >&2\nexit 3\n", SLATE_TRACE);
        let oracle = shell_oracle(dir.path(), &body, &[]);

        match oracle.trace_for(w("slate")) {
            Err(LookupError::OracleFailure { target, reason }) => {
                assert_eq!(target, "slate");
                assert!(reason.contains('3'), "{}", reason);
                assert!(reason.ends_with("search blew up"), "{}", reason);
            }
            other => panic!("expected oracle failure, got {:?}", other),
        }
    }
}
