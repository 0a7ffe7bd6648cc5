//! CSV input and output.
//!
//! Parsing is lenient: ragged records are accepted, short records read
//! missing trailing fields as empty, and bytes that are not UTF-8 are
//! replaced rather than rejected. Surplus fields beyond the header never
//! reach the engine and are dropped on output.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{ConfigError, Result};
use crate::inference::{AssignmentMap, Row};

/// A fully materialized CSV file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    records: Vec<StringRecord>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Reads a CSV with a header line. Row positions follow file order.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = lossy(reader.byte_headers()?)
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut records = Vec::new();
    for (position, result) in reader.byte_records().enumerate() {
        let record = lossy(&result?);
        let row = Row::from_pairs(
            position,
            headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), record.get(i).unwrap_or(""))),
        );
        rows.push(row);
        records.push(record);
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "table read");
    Ok(Table {
        headers,
        rows,
        records,
    })
}

/// Decodes a raw record, replacing invalid UTF-8 with U+FFFD.
fn lossy(record: &ByteRecord) -> StringRecord {
    if let Err(err) = std::str::from_utf8(record.as_slice()) {
        tracing::debug!(%err, "record is not valid UTF-8; decoding lossily");
    }
    record.iter().map(String::from_utf8_lossy).collect()
}

pub fn read_table_path(path: &Path) -> Result<Table> {
    read_table(File::open(path)?)
}

/// Writes `table` back with `column` appended last, filled from
/// `assignments` by row position.
pub fn write_table<W: Write>(
    writer: W,
    table: &Table,
    column: &str,
    assignments: &AssignmentMap,
) -> Result<()> {
    if table.headers.iter().any(|h| h == column) {
        tracing::warn!(column, "input already has the output column; appending another");
    }

    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header = StringRecord::from(table.headers.clone());
    header.push_field(column);
    writer.write_record(&header)?;

    let width = table.headers.len();
    for (row, record) in table.rows.iter().zip(&table.records) {
        if record.len() > width {
            tracing::debug!(
                position = row.position(),
                dropped = record.len() - width,
                "surplus fields dropped"
            );
        }
        let mut out = StringRecord::new();
        for i in 0..width {
            out.push_field(record.get(i).unwrap_or(""));
        }
        let status = assignments
            .get(&row.position())
            .map(String::as_str)
            .unwrap_or("");
        out.push_field(status);
        writer.write_record(&out)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_table_path(
    path: &Path,
    table: &Table,
    column: &str,
    assignments: &AssignmentMap,
) -> Result<()> {
    write_table(File::create(path)?, table, column, assignments)
}

/// Reads the canonical status order from the `column` of a CSV, top to
/// bottom. Blank cells are skipped.
pub fn read_status_order<R: Read>(reader: R, column: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let index = lossy(reader.byte_headers()?)
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ConfigError::MissingOrderColumn {
            column: column.to_string(),
        })?;

    let mut names = Vec::new();
    for result in reader.byte_records() {
        let record = lossy(&result?);
        let name = record.get(index).unwrap_or("").trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn read_status_order_path(path: &Path, column: &str) -> Result<Vec<String>> {
    read_status_order(File::open(path)?, column)
}
