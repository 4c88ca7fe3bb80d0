//! Result layouts - directory conventions of evaluation harnesses
//!
//! A layout knows how to find candidate files under a root and how to turn
//! one file into a [`RunRecord`]. Table assembly is shared.
//!
//! ## Supported layouts
//!
//! | Layout | Discovery | Identity | Metrics |
//! |--------|-----------|----------|---------|
//! | [`LmEvalLayout`] | newest `results_*.json` per directory | `model_type`, `step` | flattened `{task}_{metric}` |
//! | [`MathEvalLayout`] | `*/*/math_eval*/*/*.json` | `model_type`, `step`, `seed` | `acc`, pivoted by task |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eval_table::layout::{LmEvalLayout, ResultLayout};
//!
//! let layout = LmEvalLayout;
//! for file in layout.discover("output".as_ref())? {
//!     match layout.extract(&file) {
//!         Ok(record) => println!("{:?}", record.identity()),
//!         Err(reason) => println!("skip {}: {reason}", file.path().display()),
//!     }
//! }
//! # Ok::<(), eval_table::Error>(())
//! ```

mod lm_eval;
mod math_eval;

pub use lm_eval::LmEvalLayout;
pub use math_eval::MathEvalLayout;

use std::path::Path;

use crate::discover::ResultFile;
use crate::record::{IdentityColumn, RunRecord, SkipReason};
use crate::Result;

/// How records sharing an identity are combined into table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// One row per record; metric columns in first-seen order.
    Append,
    /// One row per distinct identity; later cells overwrite earlier ones and
    /// metric columns are sorted by name.
    Pivot,
}

/// A harness output convention.
pub trait ResultLayout {
    /// Short name used in logs and the CLI.
    fn name(&self) -> &'static str;

    /// Identity column names, in output order.
    fn identity_columns(&self) -> &'static [IdentityColumn];

    /// How records become rows.
    fn merge_mode(&self) -> MergeMode;

    /// Locate candidate result files below `root`, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`](crate::Error::RootNotFound) before any
    /// walk if `root` is not a directory.
    fn discover(&self, root: &Path) -> Result<Vec<ResultFile>>;

    /// Build one record from a candidate file.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] when the file contributes no row.
    fn extract(&self, file: &ResultFile) -> std::result::Result<RunRecord, SkipReason>;
}
