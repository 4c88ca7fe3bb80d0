//! Table assembly - merge run records into one sorted, normalized table
//!
//! Assembly is two-pass. The first pass fixes the full column set across all
//! records; the second materializes every row against it, filling gaps with
//! [`Cell::Absent`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::{Cell, ResultTable};
use crate::layout::MergeMode;
use crate::record::{IdentityColumn, MetricValue, RunIdentity, RunRecord};
use crate::{Error, Result};

type KeyedRows = Vec<(RunIdentity, Vec<(String, MetricValue)>)>;

/// What to do when two distinct raw column names normalize to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail the harvest with [`Error::ColumnCollision`].
    #[default]
    Reject,
    /// Keep both columns; later ones get `.1`, `.2`, ... appended.
    Suffix,
}

/// Strip `_` and `,` from a column name. Everything else is kept.
///
/// ```rust
/// use eval_table::table::normalize_column_name;
///
/// assert_eq!(normalize_column_name("task_1,acc"), "task1acc");
/// assert_eq!(normalize_column_name("model_type"), "modeltype");
/// ```
#[must_use]
pub fn normalize_column_name(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '_' | ',')).collect()
}

/// Accumulates run records and builds the final [`ResultTable`].
#[derive(Debug)]
pub struct TableAssembler {
    identity_columns: &'static [IdentityColumn],
    mode: MergeMode,
    policy: CollisionPolicy,
    records: Vec<RunRecord>,
}

impl TableAssembler {
    /// Create an assembler.
    ///
    /// # Arguments
    ///
    /// * `identity_columns` - leading columns, in output order
    /// * `mode` - append one row per record, or pivot by identity
    /// * `policy` - column-name collision handling
    #[must_use]
    pub const fn new(
        identity_columns: &'static [IdentityColumn],
        mode: MergeMode,
        policy: CollisionPolicy,
    ) -> Self {
        Self {
            identity_columns,
            mode,
            policy,
            records: Vec::new(),
        }
    }

    /// Add a fully built record.
    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    /// Number of records accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build the table.
    ///
    /// Rows are sorted by identity, identity columns lead, and every column
    /// name is normalized once all names are final.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnCollision`] under [`CollisionPolicy::Reject`]
    /// when two distinct raw names normalize to the same name.
    pub fn finish(self) -> Result<ResultTable> {
        if self.records.is_empty() {
            return Ok(ResultTable::empty());
        }

        let (metric_columns, keyed_rows) = match self.mode {
            MergeMode::Append => Self::append_rows(self.records),
            MergeMode::Pivot => Self::pivot_rows(self.records),
        };

        let mut raw_columns: Vec<&str> = self
            .identity_columns
            .iter()
            .map(|column| column.name())
            .collect();
        raw_columns.extend(metric_columns.iter().map(String::as_str));
        let columns = normalize_columns(&raw_columns, self.policy)?;

        let slot: HashMap<&str, usize> = metric_columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let rows = keyed_rows
            .into_iter()
            .map(|(identity, metrics)| {
                let mut row: Vec<Cell> = self
                    .identity_columns
                    .iter()
                    .map(|column| identity_cell(&identity, *column))
                    .collect();
                let mut cells = vec![Cell::Absent; metric_columns.len()];
                for (name, value) in metrics {
                    cells[slot[name.as_str()]] = Cell::Metric(value);
                }
                row.extend(cells);
                row
            })
            .collect::<Vec<_>>();

        debug!(
            rows = rows.len(),
            columns = columns.len(),
            "assembled result table"
        );
        Ok(ResultTable::from_parts(columns, rows))
    }

    /// One row per record, columns in first-seen order, rows stably sorted.
    fn append_rows(records: Vec<RunRecord>) -> (Vec<String>, KeyedRows) {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for record in &records {
            for (name, _) in record.metrics() {
                if seen.insert(name.clone()) {
                    columns.push(name.clone());
                }
            }
        }

        let mut rows: Vec<_> = records
            .into_iter()
            .map(|record| (record.identity().clone(), record.metrics().to_vec()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        (columns, rows)
    }

    /// One row per identity, later cells overwrite earlier ones, columns sorted.
    fn pivot_rows(records: Vec<RunRecord>) -> (Vec<String>, KeyedRows) {
        let mut grouped: BTreeMap<RunIdentity, BTreeMap<String, MetricValue>> = BTreeMap::new();
        let mut columns: BTreeSet<String> = BTreeSet::new();
        for record in records {
            let cells = grouped.entry(record.identity().clone()).or_default();
            for (name, value) in record.metrics() {
                columns.insert(name.clone());
                cells.insert(name.clone(), *value);
            }
        }

        let rows = grouped
            .into_iter()
            .map(|(identity, cells)| (identity, cells.into_iter().collect()))
            .collect();
        (columns.into_iter().collect(), rows)
    }
}

fn identity_cell(identity: &RunIdentity, column: IdentityColumn) -> Cell {
    match column {
        IdentityColumn::ModelType => Cell::Text(identity.model_type().to_string()),
        IdentityColumn::Step => Cell::UInt(identity.step()),
        IdentityColumn::Seed => Cell::UInt(identity.seed().unwrap_or_default()),
    }
}

/// Normalize every raw name, detecting names that collapse onto each other.
fn normalize_columns(raw: &[&str], policy: CollisionPolicy) -> Result<Vec<String>> {
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for &name in raw {
        let normalized = normalize_column_name(name);
        let Some(&first) = owners.get(&normalized) else {
            owners.insert(normalized.clone(), name);
            out.push(normalized);
            continue;
        };
        match policy {
            CollisionPolicy::Reject => {
                return Err(Error::ColumnCollision {
                    normalized,
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
            CollisionPolicy::Suffix => {
                let mut k = 1;
                let mut unique = format!("{normalized}.{k}");
                while owners.contains_key(&unique) {
                    k += 1;
                    unique = format!("{normalized}.{k}");
                }
                owners.insert(unique.clone(), name);
                out.push(unique);
            }
        }
    }
    Ok(out)
}
