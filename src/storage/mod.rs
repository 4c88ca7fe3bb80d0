//! Storage backend (Arrow/CSV/Parquet)
//!
//! A [`ResultTable`] is converted to a single Arrow [`RecordBatch`]:
//!
//! - `model_type` → `Utf8`, `step`/`seed` → `UInt64` (non-null)
//! - metric columns → `Boolean` when every present value is a boolean,
//!   `Int64` when every present value is integral or boolean (booleans as
//!   `1`/`0`), else `Float64`
//! - [`Cell::Absent`] → null
//!
//! CSV output has a header row, comma separators and no index column. Nulls
//! are written as empty fields.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array,
};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::record::MetricValue;
use crate::table::{Cell, ResultTable};
use crate::{Error, Result};

/// Arrow type a column materializes as.
fn column_type(cells: &[&Cell]) -> DataType {
    let mut all_int = true;
    let mut all_bool = true;
    for cell in cells {
        match cell {
            Cell::Text(_) => return DataType::Utf8,
            Cell::UInt(_) => return DataType::UInt64,
            Cell::Metric(MetricValue::Float(_)) => {
                all_int = false;
                all_bool = false;
            }
            Cell::Metric(MetricValue::Int(_)) => all_bool = false,
            Cell::Metric(MetricValue::Bool(_)) | Cell::Absent => {}
        }
    }
    let any_present = cells.iter().any(|c| !c.is_absent());
    match (any_present, all_bool, all_int) {
        (true, true, _) => DataType::Boolean,
        (true, false, true) => DataType::Int64,
        _ => DataType::Float64,
    }
}

fn column_array(cells: &[&Cell], data_type: &DataType) -> Result<ArrayRef> {
    let mismatch = |cell: &Cell| {
        Error::Other(format!("cell {cell:?} does not fit a {data_type} column"))
    };
    let array: ArrayRef = match data_type {
        DataType::Utf8 => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Text(s) => Ok(Some(s.as_str())),
                    Cell::Absent => Ok(None),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<StringArray>>()?,
        ),
        DataType::UInt64 => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::UInt(v) => Ok(Some(*v)),
                    Cell::Absent => Ok(None),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<UInt64Array>>()?,
        ),
        DataType::Int64 => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Metric(v) => v.as_i64().map(Some).ok_or_else(|| mismatch(*c)),
                    Cell::Absent => Ok(None),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Int64Array>>()?,
        ),
        DataType::Boolean => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Metric(MetricValue::Bool(v)) => Ok(Some(*v)),
                    Cell::Absent => Ok(None),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<BooleanArray>>()?,
        ),
        _ => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Metric(v) => Ok(Some(v.as_f64())),
                    Cell::Absent => Ok(None),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Float64Array>>()?,
        ),
    };
    Ok(array)
}

/// Convert a result table into one Arrow record batch.
///
/// # Errors
///
/// Returns error if a column mixes identity and metric cells, or Arrow
/// rejects the batch
pub fn to_record_batch(table: &ResultTable) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays = Vec::with_capacity(table.columns().len());
    for (index, name) in table.columns().iter().enumerate() {
        let cells: Vec<&Cell> = table.rows().iter().map(|row| &row[index]).collect();
        let data_type = column_type(&cells);
        let nullable = cells.iter().any(|c| c.is_absent())
            || matches!(
                data_type,
                DataType::Boolean | DataType::Int64 | DataType::Float64
            );
        arrays.push(column_array(&cells, &data_type)?);
        fields.push(Field::new(name.as_str(), data_type, nullable));
    }

    let schema = Arc::new(Schema::new(fields));
    if arrays.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Render a result table as CSV bytes (header row, no index column).
///
/// # Errors
///
/// Returns error if the table cannot be converted or encoded
pub fn to_csv_bytes(table: &ResultTable) -> Result<Vec<u8>> {
    let batch = to_record_batch(table)?;
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(&batch)?;
    }
    Ok(buf)
}

/// Write a result table as CSV.
///
/// # Errors
///
/// Returns error if the table cannot be encoded or the file written
pub fn write_csv<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    let bytes = to_csv_bytes(table)?;
    fs::write(path.as_ref(), bytes)?;
    info!(path = %path.as_ref().display(), rows = table.shape().0, "wrote CSV");
    Ok(())
}

/// Write a result table as a single-row-group Parquet file.
///
/// # Errors
///
/// Returns error if the table cannot be converted or the file written
pub fn write_parquet<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!(path = %path.as_ref().display(), rows = batch.num_rows(), "wrote Parquet");
    Ok(())
}

/// Load record batches back from a Parquet file.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<RecordBatch>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Pretty-print the first `n` rows of a table.
///
/// # Errors
///
/// Returns error if the table cannot be converted or formatted
pub fn pretty(table: &ResultTable, n: usize) -> Result<String> {
    let batch = to_record_batch(&table.head(n))?;
    Ok(arrow::util::pretty::pretty_format_batches(&[batch])?.to_string())
}
