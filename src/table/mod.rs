//! Result tables - the flat, sorted dataset produced by a harvest
//!
//! A [`ResultTable`] is a list of normalized column names plus rows of
//! [`Cell`]s. Missing entries after a union or pivot are [`Cell::Absent`],
//! never zero. Use [`crate::storage`] to persist a table as CSV or Parquet.

mod assemble;

pub use assemble::{normalize_column_name, CollisionPolicy, TableAssembler};

use std::fmt;

use crate::record::MetricValue;

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text identity field (`model_type`)
    Text(String),
    /// Unsigned identity field (`step`, `seed`)
    UInt(u64),
    /// Metric value
    Metric(MetricValue),
    /// Absence marker for a metric that was never recorded for the row
    Absent,
}

impl Cell {
    /// Whether this cell is the absence marker.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Metric value of the cell, if it holds one.
    #[must_use]
    pub const fn as_metric(&self) -> Option<MetricValue> {
        match self {
            Self::Metric(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Metric(v) => write!(f, "{v}"),
            Self::Absent => Ok(()),
        }
    }
}

/// Flat result table: identity columns first, then metric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Create an empty table (no columns, no rows).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a table from columns and rows.
    ///
    /// Every row must have exactly one cell per column.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Column names in output order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in output order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Position of a column by (normalized) name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in column `name`.
    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        let index = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// All cells of one column, top to bottom.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[index]).collect())
    }

    /// First `n` rows as a new table.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
