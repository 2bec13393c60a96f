use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;

use securityhub_core::row::{CellValue, Row};
use securityhub_core::schema::{ColumnDef, ColumnType};
use securityhub_core::table::RowSink;

const UTC: &str = "UTC";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn arrow_field(column: &ColumnDef) -> Field {
    let data_type = match column.column_type {
        ColumnType::String | ColumnType::Json => DataType::Utf8,
        ColumnType::Int => DataType::Int64,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into())),
    };
    Field::new(column.name, data_type, true)
}

pub fn arrow_schema(columns: &[&ColumnDef]) -> Schema {
    Schema::new(
        columns
            .iter()
            .map(|column| arrow_field(column))
            .collect::<Vec<_>>(),
    )
}

fn text_cell(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::String(value) => Some(value.clone()),
        CellValue::Json(value) => Some(value.to_string()),
        CellValue::Null => None,
        other => Some(other.to_json().to_string()),
    }
}

fn column_array(column: &ColumnDef, rows: &[Row]) -> ArrayRef {
    let cells = rows.iter().map(|row| row.get(column.name));
    match column.column_type {
        ColumnType::String | ColumnType::Json => {
            Arc::new(StringArray::from(cells.map(text_cell).collect::<Vec<_>>()))
        }
        ColumnType::Int => Arc::new(Int64Array::from(
            cells
                .map(|cell| cell.and_then(CellValue::as_i64))
                .collect::<Vec<_>>(),
        )),
        ColumnType::Timestamp => Arc::new(
            TimestampMillisecondArray::from(
                cells
                    .map(|cell| {
                        cell.and_then(CellValue::as_timestamp)
                            .map(|ts| ts.timestamp_millis())
                    })
                    .collect::<Vec<_>>(),
            )
            .with_timezone(UTC),
        ),
    }
}

/// Columnar batch of `rows`, typed by the table schema.
pub fn rows_to_record_batch(
    columns: &[&ColumnDef],
    rows: &[Row],
) -> Result<RecordBatch, ExportError> {
    let schema = Arc::new(arrow_schema(columns));
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|column| column_array(column, rows))
        .collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}

pub fn write_parquet<P: AsRef<Path>>(path: P, batch: &RecordBatch) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn write_json_line<W: Write>(writer: &mut W, row: &Row) -> Result<(), ExportError> {
    serde_json::to_writer(&mut *writer, &row.to_json())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// One JSON object per line.
pub fn write_json_lines<W: Write>(mut writer: W, rows: &[Row]) -> Result<(), ExportError> {
    for row in rows {
        write_json_line(&mut writer, row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Row sink writing each row as a JSON line as soon as it is produced.
///
/// A failed write stops the listing (no rows remain wanted) and is reported
/// by [`JsonLinesSink::finish`].
pub struct JsonLinesSink<W: Write> {
    writer: W,
    quota: Option<u64>,
    written: u64,
    error: Option<ExportError>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink capped at a query limit; negative limits allow no rows.
    pub fn new(writer: W, limit: Option<i64>) -> Self {
        Self {
            writer,
            quota: limit.map(|limit| u64::try_from(limit).unwrap_or(0)),
            written: 0,
            error: None,
        }
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> Result<u64, ExportError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn push_row(&mut self, row: Row) {
        if self.rows_remaining() == Some(0) {
            return;
        }
        match write_json_line(&mut self.writer, &row) {
            Ok(()) => self.written += 1,
            Err(error) => self.error = Some(error),
        }
    }

    fn rows_remaining(&self) -> Option<u64> {
        if self.error.is_some() {
            return Some(0);
        }
        self.quota.map(|quota| quota.saturating_sub(self.written))
    }
}
