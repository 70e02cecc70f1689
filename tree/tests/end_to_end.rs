//! Generation scenarios run through the public API, from traces to a file on
//! disk and back.

use plut_engine::feedback::Feedback;
use plut_engine::fixtures::{answer_words, canned_oracle, first_candidate_traces};
use plut_engine::{LookupError, Result, Step, Trace, TraceMap, Word};
use plut_tree::format::HEADER_SIZE;
use plut_tree::{build_table, decode_tree, dump, generate, ConflictPolicy, GenerateConfig, LookupView};

fn w(s: &str) -> Word {
    Word::parse(s).unwrap()
}

fn step(guess: &str, fb: u16) -> Step {
    Step {
        guess: w(guess),
        feedback: Feedback::new(fb).unwrap(),
    }
}

#[test]
fn test_single_trace_table() {
    let mut traces = TraceMap::new();
    traces.insert(w("slate"), vec![step("roate", 0), step("slate", 242)]);
    let table = build_table(&GenerateConfig::new(w("roate"), 3), &traces).unwrap();

    let view = LookupView::parse(&table.bytes).unwrap();
    let root = view.node(view.header().root_offset).unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].feedback, 0);
    assert_eq!(Word::from_code(root[0].guess).unwrap(), w("slate"));
    assert!(view.node(root[0].child).unwrap().is_empty());
}

#[test]
fn test_empty_target_set_is_header_and_zero_count() {
    let table = build_table(&GenerateConfig::new(w("roate"), 3), &TraceMap::new()).unwrap();
    assert_eq!(table.bytes.len(), HEADER_SIZE + 4);
    assert_eq!(&table.bytes[HEADER_SIZE..], &[0, 0, 0, 0]);
}

#[test]
fn test_disagreeing_traces_conflict() {
    let mut traces = TraceMap::new();
    traces.insert(w("abide"), vec![step("roate", 0), step("slate", 3), step("abide", 242)]);
    traces.insert(w("pious"), vec![step("roate", 0), step("crane", 4), step("pious", 242)]);

    let err = build_table(&GenerateConfig::new(w("roate"), 3), &traces).unwrap_err();
    assert!(matches!(err, LookupError::DeterminismConflict { .. }));

    let mut config = GenerateConfig::new(w("roate"), 3);
    config.policy = ConflictPolicy::KeepFirst;
    let table = build_table(&config, &traces).unwrap();
    assert_eq!(table.build.conflicts, 1);
}

#[test]
fn test_generate_round_trips_through_disk() {
    let start = w("roate");
    let answers = answer_words();
    let traces = first_candidate_traces(start, &answers);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("lookup_roate.bin");

    let table = generate(&GenerateConfig::new(start, 4), &canned_oracle(&traces), &answers, &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes, table.bytes);

    let (header, decoded) = decode_tree(&bytes).unwrap();
    let (built, _) = plut_tree::build_tree(start, 4, &traces, ConflictPolicy::Fail).unwrap();
    assert_eq!(header.depth, 4);
    assert_eq!(decoded, built);

    let text = dump(&bytes).unwrap();
    assert!(text.starts_with("magic=PLUT version=1 depth=4 start=roate root=32\n"));
    assert_eq!(text.lines().filter(|l| l.trim_start().starts_with("node@")).count(), table.layout.nodes);
}

#[test]
fn test_generate_twice_is_byte_identical() {
    let start = w("roate");
    let answers = answer_words();
    let traces = first_candidate_traces(start, &answers);
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");

    let mut config = GenerateConfig::new(start, 5);
    config.jobs = Some(4);
    generate(&config, &canned_oracle(&traces), &answers, &a).unwrap();
    config.jobs = Some(1);
    generate(&config, &canned_oracle(&traces), &answers, &b).unwrap();
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn test_oracle_failure_writes_nothing() {
    let start = w("roate");
    let answers = answer_words();
    let traces = first_candidate_traces(start, &answers);
    let canned = canned_oracle(&traces);
    let failing = |t: Word| -> Result<Trace> {
        if t == w("pious") {
            Err(LookupError::OracleFailure {
                target: t.to_string(),
                reason: "solver exited with status 1".to_string(),
            })
        } else {
            plut_engine::Oracle::trace_for(&canned, t)
        }
    };
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("lookup_roate.bin");

    let err = generate(&GenerateConfig::new(start, 3), &failing, &answers, &out).unwrap_err();
    assert!(matches!(err, LookupError::OracleFailure { .. }));
    assert!(!out.exists());
}
