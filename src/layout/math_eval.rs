//! math-evaluation-harness layout

use std::path::Path;

use serde_json::Value;

use super::{MergeMode, ResultLayout};
use crate::discover::{glob_fixed_depth, ResultFile};
use crate::path_meta::{segments, MathEvalPath};
use crate::record::{
    read_json_object, IdentityColumn, MetricValue, RunIdentity, RunRecord, SkipReason,
};
use crate::Result;

/// Relative glob of math-eval result files below the root.
pub const MATH_EVAL_PATTERN: &str = "*/*/math_eval*/*/*.json";

/// Document field holding the task accuracy.
pub const ACCURACY_FIELD: &str = "acc";

/// math-evaluation-harness output:
/// `<root>/<model_type>/step<N>/math_eval<SEED>/<task>/<name>.json`, one
/// accuracy per file, pivoted into one column per task.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathEvalLayout;

impl MathEvalLayout {
    /// Read the accuracy of a parsed document.
    ///
    /// # Errors
    ///
    /// - [`SkipReason::MissingField`] if `acc` is absent or null
    /// - [`SkipReason::NonNumericField`] if `acc` is neither a number nor a
    ///   boolean
    pub fn accuracy(
        document: &serde_json::Map<String, Value>,
    ) -> std::result::Result<MetricValue, SkipReason> {
        match document.get(ACCURACY_FIELD) {
            None | Some(Value::Null) => Err(SkipReason::MissingField(ACCURACY_FIELD)),
            Some(value) => {
                MetricValue::from_json(value).ok_or(SkipReason::NonNumericField(ACCURACY_FIELD))
            }
        }
    }
}

impl ResultLayout for MathEvalLayout {
    fn name(&self) -> &'static str {
        "math-eval"
    }

    fn identity_columns(&self) -> &'static [IdentityColumn] {
        &[
            IdentityColumn::ModelType,
            IdentityColumn::Step,
            IdentityColumn::Seed,
        ]
    }

    fn merge_mode(&self) -> MergeMode {
        MergeMode::Pivot
    }

    fn discover(&self, root: &Path) -> Result<Vec<ResultFile>> {
        glob_fixed_depth(root, MATH_EVAL_PATTERN)
    }

    fn extract(&self, file: &ResultFile) -> std::result::Result<RunRecord, SkipReason> {
        let segs = segments(file.path())?;
        let slots = MathEvalPath::parse(&segs)?;
        let document = read_json_object(file.path())?;
        let accuracy = Self::accuracy(&document)?;
        let identity = RunIdentity::new(slots.model_type, slots.step).with_seed(slots.seed);
        Ok(RunRecord::new(identity).with_metric(slots.task, accuracy))
    }
}
