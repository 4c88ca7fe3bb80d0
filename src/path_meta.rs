//! Path metadata - run identity recovered from result file paths
//!
//! Two directory conventions are supported:
//!
//! ```text
//! lm-eval:    <anything>/<model_type>/step<N>/<anything>/results_<ts>.json
//! math-eval:  <root>/<model_type>/step<N>/math_eval<SEED>/<task>/<name>.json
//! ```
//!
//! The lm-eval convention searches for the step segment; the math-eval
//! convention reads fixed slots counted from the end of the path.

use std::path::{Component, Path};

use crate::record::SkipReason;

/// Literal prefix of a step segment (`step1000`).
pub const STEP_MARKER: &str = "step";

type ParseResult<T> = std::result::Result<T, SkipReason>;

/// Decompose a path into its named segments.
///
/// Root, prefix and `.`/`..` components are dropped.
///
/// # Errors
///
/// Returns [`SkipReason::MalformedPath`] if a segment is not valid UTF-8.
pub fn segments(path: &Path) -> ParseResult<Vec<&str>> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .map(|s| {
            s.to_str().ok_or_else(|| {
                SkipReason::MalformedPath(format!("non UTF-8 segment in {}", path.display()))
            })
        })
        .collect()
}

/// Whether a segment carries the step marker: `step` followed by a digit.
#[must_use]
pub fn is_step_segment(segment: &str) -> bool {
    segment
        .strip_prefix(STEP_MARKER)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Parse the step number out of a `step<N>` segment.
///
/// # Errors
///
/// Returns [`SkipReason::BadNumeral`] if the segment lacks the prefix, has
/// anything but ASCII digits after it, or overflows `u64`.
pub fn parse_step(segment: &str) -> ParseResult<u64> {
    let bad = || SkipReason::BadNumeral(segment.to_string());
    let digits = segment.strip_prefix(STEP_MARKER).ok_or_else(bad)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    digits.parse().map_err(|_| bad())
}

/// Seed encoded as the trailing digit run of a directory name.
///
/// `math_eval3` is seed 3, `math_eval` is seed 0.
///
/// # Errors
///
/// Returns [`SkipReason::BadNumeral`] if the digit run overflows `u64`.
pub fn trailing_seed(segment: &str) -> ParseResult<u64> {
    let head = segment.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &segment[head.len()..];
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| SkipReason::BadNumeral(segment.to_string()))
}

/// Identity fields of an lm-eval result path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPath<'a> {
    /// Segment immediately before the step segment
    pub model_type: &'a str,
    /// Parsed step number
    pub step: u64,
}

impl<'a> StepPath<'a> {
    /// Find the first step segment anywhere in `segments` and take the
    /// segment before it as the model type.
    ///
    /// # Errors
    ///
    /// - [`SkipReason::MissingStepSegment`] if no segment is a step segment
    /// - [`SkipReason::MalformedPath`] if the step segment has no parent
    /// - [`SkipReason::BadNumeral`] if the step number does not parse
    pub fn parse(segments: &[&'a str]) -> ParseResult<Self> {
        let index = segments
            .iter()
            .position(|s| is_step_segment(s))
            .ok_or(SkipReason::MissingStepSegment)?;
        if index == 0 {
            return Err(SkipReason::MalformedPath(format!(
                "step segment '{}' has no model directory before it",
                segments[index]
            )));
        }
        Ok(Self {
            model_type: segments[index - 1],
            step: parse_step(segments[index])?,
        })
    }
}

/// Identity fields of a math-eval result path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathEvalPath<'a> {
    /// `<model_type>` slot (5th from the end)
    pub model_type: &'a str,
    /// `step<N>` revision slot (4th from the end)
    pub revision: &'a str,
    /// `math_eval<SEED>` run-group slot (3rd from the end)
    pub group: &'a str,
    /// `<task>` slot (2nd from the end)
    pub task: &'a str,
    /// Step parsed from the revision
    pub step: u64,
    /// Seed parsed from the run group (0 when it has no trailing digits)
    pub seed: u64,
}

impl<'a> MathEvalPath<'a> {
    /// Number of trailing segments the convention names, file included.
    pub const DEPTH: usize = 5;

    /// Read the fixed slots counted from the end of `segments`.
    ///
    /// # Errors
    ///
    /// - [`SkipReason::MalformedPath`] if fewer than [`Self::DEPTH`] segments
    /// - [`SkipReason::BadNumeral`] if the revision or seed does not parse
    pub fn parse(segments: &[&'a str]) -> ParseResult<Self> {
        let [model_type, revision, group, task, _file] = segments
            .len()
            .checked_sub(Self::DEPTH)
            .and_then(|start| <[&str; 5]>::try_from(&segments[start..]).ok())
            .ok_or_else(|| {
                SkipReason::MalformedPath(format!(
                    "expected <model>/<revision>/<group>/<task>/<file>, got {} segments",
                    segments.len()
                ))
            })?;
        Ok(Self {
            model_type,
            revision,
            group,
            task,
            step: parse_step(revision)?,
            seed: trailing_seed(group)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        assert_eq!(parse_step("step0").unwrap(), 0);
        assert_eq!(parse_step("step1000").unwrap(), 1000);
        assert!(matches!(parse_step("step"), Err(SkipReason::BadNumeral(_))));
        assert!(matches!(parse_step("step-1"), Err(SkipReason::BadNumeral(_))));
        assert!(matches!(parse_step("step+1"), Err(SkipReason::BadNumeral(_))));
        assert!(matches!(parse_step("main"), Err(SkipReason::BadNumeral(_))));
        assert!(matches!(
            parse_step("step99999999999999999999999"),
            Err(SkipReason::BadNumeral(_))
        ));
    }

    #[test]
    fn test_trailing_seed() {
        assert_eq!(trailing_seed("math_eval3").unwrap(), 3);
        assert_eq!(trailing_seed("math_eval42").unwrap(), 42);
        assert_eq!(trailing_seed("math_eval").unwrap(), 0);
        assert_eq!(trailing_seed("7").unwrap(), 7);
    }

    #[test]
    fn test_step_path_first_segment_wins() {
        let segs = ["out", "modelA", "step10", "modelB", "step20", "results_x.json"];
        let parsed = StepPath::parse(&segs).unwrap();
        assert_eq!(parsed.model_type, "modelA");
        assert_eq!(parsed.step, 10);
    }

    #[test]
    fn test_step_path_ignores_non_numeric_step_words() {
        let segs = ["steps", "modelA", "step5", "results_x.json"];
        let parsed = StepPath::parse(&segs).unwrap();
        assert_eq!(parsed.model_type, "modelA");
        assert_eq!(parsed.step, 5);
    }

    #[test]
    fn test_step_path_missing_step() {
        let segs = ["out", "modelA", "main", "results_x.json"];
        assert!(matches!(
            StepPath::parse(&segs),
            Err(SkipReason::MissingStepSegment)
        ));
    }

    #[test]
    fn test_step_path_step_suffix_is_bad_numeral() {
        let segs = ["out", "modelA", "step10-final", "results_x.json"];
        assert!(matches!(
            StepPath::parse(&segs),
            Err(SkipReason::BadNumeral(_))
        ));
    }

    #[test]
    fn test_step_path_without_parent() {
        let segs = ["step3", "results_x.json"];
        assert!(matches!(
            StepPath::parse(&segs),
            Err(SkipReason::MalformedPath(_))
        ));
    }

    #[test]
    fn test_math_eval_path_slots() {
        let segs = ["output", "modelA", "step10", "math_eval3", "taskX", "out.json"];
        let parsed = MathEvalPath::parse(&segs).unwrap();
        assert_eq!(parsed.model_type, "modelA");
        assert_eq!(parsed.revision, "step10");
        assert_eq!(parsed.group, "math_eval3");
        assert_eq!(parsed.task, "taskX");
        assert_eq!(parsed.step, 10);
        assert_eq!(parsed.seed, 3);
    }

    #[test]
    fn test_math_eval_path_too_short() {
        let segs = ["step10", "math_eval3", "taskX", "out.json"];
        assert!(matches!(
            MathEvalPath::parse(&segs),
            Err(SkipReason::MalformedPath(_))
        ));
    }

    #[test]
    fn test_math_eval_path_bad_revision() {
        let segs = ["modelA", "main", "math_eval", "taskX", "out.json"];
        assert!(matches!(
            MathEvalPath::parse(&segs),
            Err(SkipReason::BadNumeral(_))
        ));
    }

    #[test]
    fn test_segments_drop_root() {
        let segs = segments(Path::new("/a/b/./c.json")).unwrap();
        assert_eq!(segs, vec!["a", "b", "c.json"]);
    }
}
