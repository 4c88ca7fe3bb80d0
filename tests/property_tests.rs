//! Property-based tests for eval-table
//!
//! - Step numerals round-trip through path segments
//! - Normalized column names never contain separators
//! - Assembled rows are sorted by identity and keep every record

use eval_table::layout::MergeMode;
use eval_table::path_meta::{parse_step, trailing_seed, MathEvalPath, StepPath};
use eval_table::record::{IdentityColumn, MetricValue, RunIdentity, RunRecord};
use eval_table::table::{normalize_column_name, Cell, CollisionPolicy, TableAssembler};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_model() -> impl Strategy<Value = String> {
    "m[a-z0-9-]{0,8}"
}

fn arb_lm_record() -> impl Strategy<Value = RunRecord> {
    (arb_model(), 0u64..100_000, proptest::collection::vec(("[a-z]{1,4}", 0.0f64..1.0), 0..4))
        .prop_map(|(model, step, metrics)| {
            metrics.into_iter().fold(
                RunRecord::new(RunIdentity::new(model, step)),
                |record, (name, value)| record.with_metric(name, MetricValue::Float(value)),
            )
        })
}

fn row_key(row: &[Cell]) -> (String, u64) {
    match (&row[0], &row[1]) {
        (Cell::Text(model), Cell::UInt(step)) => (model.clone(), *step),
        other => panic!("unexpected identity cells {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: `step<N>` parses back to N
    #[test]
    fn prop_step_segment_round_trip(step in any::<u64>()) {
        prop_assert_eq!(parse_step(&format!("step{step}")).unwrap(), step);
    }

    /// Property: the step of an lm-eval path is the numeral of its step segment
    #[test]
    fn prop_step_path_reads_numeral(model in arb_model(), step in 0u64..1_000_000) {
        let step_segment = format!("step{step}");
        let segs = ["output", model.as_str(), step_segment.as_str(), "results_1.json"];
        let parsed = StepPath::parse(&segs).unwrap();
        prop_assert_eq!(parsed.model_type, model.as_str());
        prop_assert_eq!(parsed.step, step);
    }

    /// Property: trailing digits of the run group are the seed
    #[test]
    fn prop_trailing_seed(prefix in "[a-z_]{0,10}", seed in 0u64..1_000_000) {
        prop_assert_eq!(trailing_seed(&format!("{prefix}{seed}")).unwrap(), seed);
        prop_assert_eq!(trailing_seed(&prefix).unwrap(), 0);
    }

    /// Property: math-eval slots are read from the end regardless of depth
    #[test]
    fn prop_math_eval_slots_from_end(depth in 0usize..5, step in 0u64..10_000, seed in 0u64..100) {
        let revision = format!("step{step}");
        let group = format!("math_eval{seed}");
        let mut segs: Vec<&str> = vec!["prefix"; depth];
        segs.extend(["modelA", revision.as_str(), group.as_str(), "gsm8k", "a.json"]);
        let parsed = MathEvalPath::parse(&segs).unwrap();
        prop_assert_eq!(parsed.model_type, "modelA");
        prop_assert_eq!(parsed.step, step);
        prop_assert_eq!(parsed.seed, seed);
        prop_assert_eq!(parsed.task, "gsm8k");
    }

    /// Property: normalization removes exactly `_` and `,`
    #[test]
    fn prop_normalize_strips_separators(raw in "[a-z_,.-]{0,20}") {
        let normalized = normalize_column_name(&raw);
        prop_assert!(!normalized.contains('_') && !normalized.contains(','));
        let expected: String = raw.chars().filter(|c| *c != '_' && *c != ',').collect();
        prop_assert_eq!(normalized, expected);
    }

    /// Property: append mode keeps every record and sorts by (model_type, step)
    #[test]
    fn prop_append_rows_sorted(records in proptest::collection::vec(arb_lm_record(), 0..20)) {
        let count = records.len();
        let mut assembler = TableAssembler::new(
            &[IdentityColumn::ModelType, IdentityColumn::Step],
            MergeMode::Append,
            CollisionPolicy::Suffix,
        );
        for record in records {
            assembler.push(record);
        }
        let table = assembler.finish().unwrap();
        prop_assert_eq!(table.shape().0, count);

        let keys: Vec<(String, u64)> = table.rows().iter().map(|r| row_key(r)).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        for row in table.rows() {
            prop_assert_eq!(row.len(), table.columns().len());
        }
    }
}
