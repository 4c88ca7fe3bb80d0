//! Run records - one parsed result file, before table assembly
//!
//! A [`RunRecord`] is either fully built (identity plus metrics) or the file is
//! skipped with a [`SkipReason`]. Half-populated records never exist.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Identity of an evaluated checkpoint.
///
/// Field order is the sort order of the final table: `model_type`, then
/// `step`, then `seed`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    model_type: String,
    step: u64,
    seed: Option<u64>,
}

impl RunIdentity {
    /// Create an identity without a seed.
    #[must_use]
    pub fn new(model_type: impl Into<String>, step: u64) -> Self {
        Self {
            model_type: model_type.into(),
            step,
            seed: None,
        }
    }

    /// Attach a seed to the identity.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Get the model variant name.
    #[must_use]
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    /// Get the training step.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the seed, if the layout records one.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// A leading identity column of the final table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityColumn {
    /// Model variant name
    ModelType,
    /// Training step
    Step,
    /// Evaluation seed (0 when the layout records none)
    Seed,
}

impl IdentityColumn {
    /// Raw column name, before normalization.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModelType => "model_type",
            Self::Step => "step",
            Self::Seed => "seed",
        }
    }
}

/// A scalar metric value, kept in the kind the document used.
///
/// Booleans count as metrics. They widen to `1`/`0` wherever a column mixes
/// them with numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral JSON number
    Int(i64),
    /// Any other JSON number
    Float(f64),
    /// JSON boolean
    Bool(bool),
}

impl MetricValue {
    /// Convert a JSON value into a metric value.
    ///
    /// Returns `None` for strings, nulls, arrays and objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self::from_number(number)),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            _ => None,
        }
    }

    fn from_number(number: &Number) -> Self {
        number.as_i64().map_or_else(
            // u64 beyond i64::MAX and every non-integral number
            || Self::Float(number.as_f64().unwrap_or(f64::NAN)),
            Self::Int,
        )
    }

    /// Value widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
            Self::Bool(v) => f64::from(u8::from(v)),
        }
    }

    /// Value as an integer, if it is integral or boolean.
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            Self::Bool(v) => Some(i64::from(v)),
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// One parsed result file: identity plus ordered `(column, value)` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    identity: RunIdentity,
    metrics: Vec<(String, MetricValue)>,
}

impl RunRecord {
    /// Create a record with no metric cells.
    #[must_use]
    pub const fn new(identity: RunIdentity) -> Self {
        Self {
            identity,
            metrics: Vec::new(),
        }
    }

    /// Append a metric cell. Order of insertion is preserved.
    pub fn push_metric(&mut self, column: impl Into<String>, value: MetricValue) {
        self.metrics.push((column.into(), value));
    }

    /// Builder-style variant of [`push_metric`](Self::push_metric).
    #[must_use]
    pub fn with_metric(mut self, column: impl Into<String>, value: MetricValue) -> Self {
        self.push_metric(column, value);
        self
    }

    /// Get the run identity.
    #[must_use]
    pub const fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Get the metric cells in insertion order.
    #[must_use]
    pub fn metrics(&self) -> &[(String, MetricValue)] {
        &self.metrics
    }

    /// Look up a metric cell by raw column name.
    #[must_use]
    pub fn metric(&self, column: &str) -> Option<MetricValue> {
        self.metrics
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| *value)
    }
}

/// Why a candidate file contributed no row.
#[derive(Error, Debug)]
pub enum SkipReason {
    /// File could not be read
    #[error("unreadable file: {0}")]
    Unreadable(#[from] std::io::Error),

    /// File content is not valid JSON
    #[error("malformed JSON: {0}")]
    BadJson(#[from] serde_json::Error),

    /// JSON document is valid but not a top-level object
    #[error("top-level JSON value is not an object")]
    NotAnObject,

    /// No path segment starts with the step marker
    #[error("no 'step' segment in path")]
    MissingStepSegment,

    /// Path does not follow the expected directory convention
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// A step or seed numeral could not be parsed
    #[error("bad numeral in segment '{0}'")]
    BadNumeral(String),

    /// A required document field is absent (or null)
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A required document field holds a non-numeric value
    #[error("field '{0}' is not numeric")]
    NonNumericField(&'static str),
}

/// A skipped candidate file and the reason it was skipped.
#[derive(Error, Debug)]
#[error("skipped {}: {reason}", .path.display())]
pub struct Skip {
    path: PathBuf,
    #[source]
    reason: SkipReason,
}

impl Skip {
    /// Pair a skip reason with the file it applies to.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }

    /// Get the skipped file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the skip reason.
    #[must_use]
    pub const fn reason(&self) -> &SkipReason {
        &self.reason
    }
}

/// Read a file and parse it as a top-level JSON object.
///
/// # Errors
///
/// Returns a [`SkipReason`] if the file is unreadable, is not JSON, or is
/// JSON but not an object.
pub fn read_json_object(path: &Path) -> std::result::Result<Map<String, Value>, SkipReason> {
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(SkipReason::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_ordering() {
        let a = RunIdentity::new("m1", 5);
        let b = RunIdentity::new("m1", 2);
        let c = RunIdentity::new("m2", 1);
        let mut ids = vec![a.clone(), c.clone(), b.clone()];
        ids.sort();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn test_identity_seed_breaks_ties() {
        let a = RunIdentity::new("m", 1).with_seed(3);
        let b = RunIdentity::new("m", 1).with_seed(0);
        assert!(b < a);
        assert_eq!(a.seed(), Some(3));
    }

    #[test]
    fn test_metric_value_from_json() {
        assert_eq!(MetricValue::from_json(&json!(3)), Some(MetricValue::Int(3)));
        assert_eq!(
            MetricValue::from_json(&json!(0.5)),
            Some(MetricValue::Float(0.5))
        );
        assert_eq!(MetricValue::from_json(&json!("0.5")), None);
        assert_eq!(
            MetricValue::from_json(&json!(true)),
            Some(MetricValue::Bool(true))
        );
        assert_eq!(MetricValue::from_json(&Value::Null), None);
        assert_eq!(MetricValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_metric_value_large_unsigned_is_float() {
        let value = MetricValue::from_json(&json!(u64::MAX)).unwrap();
        assert!(matches!(value, MetricValue::Float(_)));
    }

    #[test]
    fn test_metric_value_widening() {
        assert_eq!(MetricValue::Bool(true).as_f64(), 1.0);
        assert_eq!(MetricValue::Bool(false).as_i64(), Some(0));
        assert_eq!(MetricValue::Int(7).as_i64(), Some(7));
        assert_eq!(MetricValue::Float(0.5).as_i64(), None);
        assert_eq!(MetricValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_identity_column_names() {
        let names: Vec<&str> = [
            IdentityColumn::ModelType,
            IdentityColumn::Step,
            IdentityColumn::Seed,
        ]
        .into_iter()
        .map(IdentityColumn::name)
        .collect();
        assert_eq!(names, vec!["model_type", "step", "seed"]);
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = RunRecord::new(RunIdentity::new("pythia", 2000).with_seed(1))
            .with_metric("arc_acc", MetricValue::Float(0.25))
            .with_metric("arc_n", MetricValue::Int(25))
            .with_metric("arc_flag", MetricValue::Bool(true));
        let encoded = serde_json::to_string(&record).unwrap();
        assert!(encoded.contains(r#"["arc_flag",true]"#));
        let decoded: RunRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_record_preserves_metric_order() {
        let record = RunRecord::new(RunIdentity::new("m", 0))
            .with_metric("b", MetricValue::Int(1))
            .with_metric("a", MetricValue::Float(0.5));
        let names: Vec<&str> = record.metrics().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.metric("a"), Some(MetricValue::Float(0.5)));
        assert_eq!(record.metric("c"), None);
    }

    #[test]
    fn test_skip_display_includes_path_and_reason() {
        let skip = Skip::new("/tmp/x.json", SkipReason::MissingField("acc"));
        let msg = format!("{skip}");
        assert!(msg.contains("/tmp/x.json"));
        assert!(msg.contains("missing field 'acc'"));
    }
}
