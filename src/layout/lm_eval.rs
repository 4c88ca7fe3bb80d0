//! lm-evaluation-harness layout

use std::path::Path;

use serde_json::Value;

use super::{MergeMode, ResultLayout};
use crate::discover::{latest_per_directory, ResultFile};
use crate::path_meta::{segments, StepPath};
use crate::record::{
    read_json_object, IdentityColumn, MetricValue, RunIdentity, RunRecord, SkipReason,
};
use crate::Result;

/// File name prefix of lm-eval result files.
pub const RESULTS_PREFIX: &str = "results_";
/// File name suffix of lm-eval result files.
pub const RESULTS_SUFFIX: &str = ".json";

/// lm-evaluation-harness output: newest `results_*.json` per directory,
/// identity from the first `step<N>` segment and its parent, metrics
/// flattened from `results.{task}.{metric}` into `{task}_{metric}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LmEvalLayout;

impl LmEvalLayout {
    /// Whether a file name follows the `results_*.json` convention.
    #[must_use]
    pub fn is_results_file(name: &str) -> bool {
        name.len() >= RESULTS_PREFIX.len() + RESULTS_SUFFIX.len()
            && name.starts_with(RESULTS_PREFIX)
            && name.ends_with(RESULTS_SUFFIX)
    }

    /// Flatten a parsed document into a record for `identity`.
    ///
    /// Numbers and booleans are kept; strings, nulls and nested values are
    /// dropped. A missing `results` key yields a record without
    /// metrics.
    ///
    /// # Errors
    ///
    /// Returns [`SkipReason::NotAnObject`] if `results` is present but is not
    /// an object.
    pub fn flatten(
        identity: RunIdentity,
        document: &serde_json::Map<String, Value>,
    ) -> std::result::Result<RunRecord, SkipReason> {
        let mut record = RunRecord::new(identity);
        let tasks = match document.get("results") {
            None => return Ok(record),
            Some(Value::Object(tasks)) => tasks,
            Some(_) => return Err(SkipReason::NotAnObject),
        };

        for (task, task_results) in tasks {
            let Value::Object(metrics) = task_results else {
                continue;
            };
            for (metric, value) in metrics {
                if let Some(value) = MetricValue::from_json(value) {
                    record.push_metric(format!("{task}_{metric}"), value);
                }
            }
        }
        Ok(record)
    }
}

impl ResultLayout for LmEvalLayout {
    fn name(&self) -> &'static str {
        "lm-eval"
    }

    fn identity_columns(&self) -> &'static [IdentityColumn] {
        &[IdentityColumn::ModelType, IdentityColumn::Step]
    }

    fn merge_mode(&self) -> MergeMode {
        MergeMode::Append
    }

    fn discover(&self, root: &Path) -> Result<Vec<ResultFile>> {
        latest_per_directory(root, Self::is_results_file)
    }

    fn extract(&self, file: &ResultFile) -> std::result::Result<RunRecord, SkipReason> {
        let segs = segments(file.path())?;
        let StepPath { model_type, step } = StepPath::parse(&segs)?;
        let document = read_json_object(file.path())?;
        Self::flatten(RunIdentity::new(model_type, step), &document)
    }
}
