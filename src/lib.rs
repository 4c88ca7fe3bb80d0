//! # eval-table: Evaluation Result Harvesting
//!
//! eval-table walks directory trees of per-run evaluation result files
//! written by benchmark harnesses, recovers each run's identity (model
//! variant, training step, seed) from the file path, and reshapes the
//! scattered metrics into one flat, sorted table.
//!
//! ## Pipeline
//!
//! ```text
//! discover ──> path metadata + JSON record ──> table assembly ──> CSV / Parquet
//!  (layout)          (layout, per file)          (union/pivot)      (storage)
//! ```
//!
//! A file that cannot be used is skipped with a classified reason; only a
//! missing root directory (or an ambiguous column rename) fails the harvest.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use eval_table::{harvest, layout::LmEvalLayout, storage, HarvestOptions};
//!
//! let result = harvest(&LmEvalLayout, "output", &HarvestOptions::default())?;
//! if result.table().is_empty() {
//!     println!("No results found.");
//! } else {
//!     storage::write_csv(result.table(), "lm_eval_results.csv")?;
//! }
//! # Ok::<(), eval_table::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod discover;
pub mod error;
pub mod layout;
pub mod path_meta;
pub mod record;
pub mod storage;
pub mod table;

pub use error::{Error, Result};

use std::path::Path;

use tracing::{info, warn};

use crate::discover::ensure_root;
use crate::layout::ResultLayout;
use crate::record::Skip;
use crate::table::{CollisionPolicy, ResultTable, TableAssembler};

/// Harvest options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestOptions {
    collision_policy: CollisionPolicy,
}

impl HarvestOptions {
    /// Create a new options builder
    #[must_use]
    pub fn builder() -> HarvestOptionsBuilder {
        HarvestOptionsBuilder::default()
    }

    /// Column-name collision handling
    #[must_use]
    pub const fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }
}

/// Harvest options builder
#[derive(Debug, Default)]
pub struct HarvestOptionsBuilder {
    collision_policy: CollisionPolicy,
}

impl HarvestOptionsBuilder {
    /// Set how normalized column-name collisions are handled
    #[must_use]
    pub const fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Build the options
    #[must_use]
    pub const fn build(self) -> HarvestOptions {
        HarvestOptions {
            collision_policy: self.collision_policy,
        }
    }
}

/// Outcome of a harvest: the table plus every skipped file.
#[derive(Debug)]
pub struct Harvest {
    table: ResultTable,
    skipped: Vec<Skip>,
}

impl Harvest {
    /// Get the assembled table (empty when nothing usable was found).
    #[must_use]
    pub const fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Take ownership of the table.
    #[must_use]
    pub fn into_table(self) -> ResultTable {
        self.table
    }

    /// Candidate files that contributed no row, in processing order.
    #[must_use]
    pub fn skipped(&self) -> &[Skip] {
        &self.skipped
    }
}

/// Harvest every result file of `layout` below `root` into one table.
///
/// Files are processed one at a time in path order. Each file either yields
/// a complete record or is skipped with a reason; skips never abort the run.
///
/// # Errors
///
/// - [`Error::RootNotFound`] if `root` is not a directory (before any walk)
/// - [`Error::InvalidPattern`] if discovery cannot be set up for `root`
/// - [`Error::ColumnCollision`] under [`CollisionPolicy::Reject`]
pub fn harvest<L, P>(layout: &L, root: P, options: &HarvestOptions) -> Result<Harvest>
where
    L: ResultLayout + ?Sized,
    P: AsRef<Path>,
{
    let root = root.as_ref();
    ensure_root(root)?;

    let mut candidates = layout.discover(root)?;
    candidates.sort_by(|a, b| a.path().cmp(b.path()));

    let mut assembler = TableAssembler::new(
        layout.identity_columns(),
        layout.merge_mode(),
        options.collision_policy(),
    );
    let mut skipped = Vec::new();
    for file in &candidates {
        match layout.extract(file) {
            Ok(record) => assembler.push(record),
            Err(reason) => {
                warn!(layout = layout.name(), path = %file.path().display(), %reason, "skipping result file");
                skipped.push(Skip::new(file.path(), reason));
            }
        }
    }

    info!(
        layout = layout.name(),
        candidates = candidates.len(),
        records = assembler.len(),
        skipped = skipped.len(),
        "harvested results"
    );
    Ok(Harvest {
        table: assembler.finish()?,
        skipped,
    })
}

/// Harvest lm-evaluation-harness results (`results_*.json`, newest per
/// directory) with default options.
///
/// # Errors
///
/// See [`harvest`].
pub fn parse_lm_eval_results<P: AsRef<Path>>(root: P) -> Result<ResultTable> {
    harvest(&layout::LmEvalLayout, root, &HarvestOptions::default()).map(Harvest::into_table)
}

/// Harvest math-evaluation-harness results
/// (`<model>/step<N>/math_eval<SEED>/<task>/*.json`) with default options.
///
/// # Errors
///
/// See [`harvest`].
pub fn parse_math_eval_results<P: AsRef<Path>>(root: P) -> Result<ResultTable> {
    harvest(&layout::MathEvalLayout, root, &HarvestOptions::default()).map(Harvest::into_table)
}
