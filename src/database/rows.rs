// ABOUTME: Decoded database rows, ordered row readers, and result iterators
// ABOUTME: The scanner abstraction: single-row scanner and advance/read/error/close iterator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use larder_core::errors::{DatabaseError, DatabaseResult};
use serde::de::DeserializeOwned;

use super::SqlValue;

/// One decoded result row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Row from column values in select order
    #[must_use]
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column value by position
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Reader that consumes columns left to right
    #[must_use]
    pub fn reader(&self) -> RowReader<'_> {
        RowReader {
            row: self,
            position: 0,
        }
    }
}

/// Reads a row's columns in order into typed destinations
#[derive(Debug)]
pub struct RowReader<'r> {
    row: &'r Row,
    position: usize,
}

impl<'r> RowReader<'r> {
    fn next_value(&mut self) -> DatabaseResult<&'r SqlValue> {
        let value = self.row.values.get(self.position).ok_or_else(|| {
            DatabaseError::scan(format!(
                "expected column {} but row has {} columns",
                self.position + 1,
                self.row.len()
            ))
        })?;
        self.position += 1;
        Ok(value)
    }

    fn mismatch(&self, expected: &str, found: &SqlValue) -> DatabaseError {
        DatabaseError::scan(format!(
            "column {} holds {found:?}, expected {expected}",
            self.position
        ))
    }

    /// Columns not yet read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.row.len().saturating_sub(self.position)
    }

    /// Read a non-null unsigned integer
    ///
    /// # Errors
    ///
    /// Returns a scan error for nulls, negatives, and non-integers
    pub fn read_u64(&mut self) -> DatabaseResult<u64> {
        match self.next_value()? {
            SqlValue::Int(value) => {
                u64::try_from(*value).map_err(|_| self.mismatch("unsigned integer", &SqlValue::Int(*value)))
            }
            other => Err(self.mismatch("unsigned integer", other)),
        }
    }

    /// Read a nullable unsigned integer; null and zero both mean unset
    ///
    /// # Errors
    ///
    /// Returns a scan error for negatives and non-integers
    pub fn read_optional_u64(&mut self) -> DatabaseResult<Option<u64>> {
        match self.next_value()? {
            SqlValue::Null | SqlValue::Int(0) => Ok(None),
            SqlValue::Int(value) => u64::try_from(*value)
                .map(Some)
                .map_err(|_| self.mismatch("unsigned integer", &SqlValue::Int(*value))),
            other => Err(self.mismatch("unsigned integer or null", other)),
        }
    }

    /// Read a non-null string
    ///
    /// # Errors
    ///
    /// Returns a scan error for anything but text
    pub fn read_string(&mut self) -> DatabaseResult<String> {
        match self.next_value()? {
            SqlValue::Text(value) => Ok(value.clone()),
            other => Err(self.mismatch("text", other)),
        }
    }

    /// Read a boolean; integer columns holding 0 or 1 are accepted
    ///
    /// # Errors
    ///
    /// Returns a scan error for anything else
    pub fn read_bool(&mut self) -> DatabaseResult<bool> {
        match self.next_value()? {
            SqlValue::Bool(value) => Ok(*value),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            other => Err(self.mismatch("boolean", other)),
        }
    }

    /// Read a float; integer columns are widened
    ///
    /// # Errors
    ///
    /// Returns a scan error for anything else
    pub fn read_f64(&mut self) -> DatabaseResult<f64> {
        match self.next_value()? {
            SqlValue::Float(value) => Ok(*value),
            SqlValue::Int(value) => Ok(*value as f64),
            other => Err(self.mismatch("float", other)),
        }
    }

    /// Read binary data; text columns yield their bytes
    ///
    /// # Errors
    ///
    /// Returns a scan error for anything else
    pub fn read_bytes(&mut self) -> DatabaseResult<Vec<u8>> {
        match self.next_value()? {
            SqlValue::Bytes(value) => Ok(value.clone()),
            SqlValue::Text(value) => Ok(value.clone().into_bytes()),
            other => Err(self.mismatch("binary", other)),
        }
    }

    /// Read a JSON document stored as text or binary
    ///
    /// # Errors
    ///
    /// Returns a scan error if the column is not JSON of the expected shape
    pub fn read_json<T: DeserializeOwned>(&mut self) -> DatabaseResult<T> {
        let parsed = match self.next_value()? {
            SqlValue::Text(raw) => serde_json::from_str(raw),
            SqlValue::Bytes(raw) => serde_json::from_slice(raw),
            other => return Err(self.mismatch("json", other)),
        };
        parsed.map_err(|e| DatabaseError::scan(format!("column {}: {e}", self.position)))
    }
}

/// Cursor over the rows of a read query
///
/// The usual loop is `while rows.advance() { read rows.current()? }` followed by
/// [`check_rows_for_error_and_close`](super::check_rows_for_error_and_close).
pub trait ResultIterator: Send {
    /// Move to the next row; `false` once rows are exhausted or iteration failed
    fn advance(&mut self) -> bool;

    /// The row the cursor is on
    ///
    /// # Errors
    ///
    /// Returns a scan error if `advance` has not produced a row
    fn current(&self) -> DatabaseResult<&Row>;

    /// Take the error that stopped iteration, if any
    fn error(&mut self) -> Option<DatabaseError>;

    /// Release the cursor
    ///
    /// # Errors
    ///
    /// Returns the error the driver reported while closing
    fn close(&mut self) -> DatabaseResult<()>;
}

/// Result rows held in memory
#[derive(Debug, Default)]
pub struct BufferedRows {
    rows: Vec<Row>,
    cursor: Option<usize>,
    pending_error: Option<DatabaseError>,
    error: Option<DatabaseError>,
    close_error: Option<DatabaseError>,
    closed: bool,
}

impl BufferedRows {
    /// Iterator over fully fetched rows
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Report `error` from `error()` once the rows are exhausted
    #[must_use]
    pub fn failing_after_rows(mut self, error: DatabaseError) -> Self {
        self.pending_error = Some(error);
        self
    }

    /// Report `error` from `close()`
    #[must_use]
    pub fn failing_on_close(mut self, error: DatabaseError) -> Self {
        self.close_error = Some(error);
        self
    }
}

impl ResultIterator for BufferedRows {
    fn advance(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.rows.len());
            if let Some(err) = self.pending_error.take() {
                self.error = Some(err);
            }
            false
        }
    }

    fn current(&self) -> DatabaseResult<&Row> {
        self.cursor
            .and_then(|c| self.rows.get(c))
            .ok_or_else(|| DatabaseError::scan("no current row"))
    }

    fn error(&mut self) -> Option<DatabaseError> {
        self.error.take()
    }

    fn close(&mut self) -> DatabaseResult<()> {
        self.closed = true;
        self.close_error.take().map_or(Ok(()), Err)
    }
}

/// Lazily evaluated single-row result; failures surface at [`OneRow::scan`]
#[derive(Debug)]
pub struct OneRow {
    outcome: DatabaseResult<Row>,
}

impl OneRow {
    /// Capture the first row of a query outcome
    #[must_use]
    pub fn from_outcome(outcome: DatabaseResult<Box<dyn ResultIterator>>) -> Self {
        let outcome = outcome.and_then(|mut rows| {
            let first = if rows.advance() {
                rows.current().cloned()
            } else {
                Err(rows.error().unwrap_or(DatabaseError::NoRows))
            };
            // A close failure only matters when the row itself was read
            let closed = rows.close();
            let row = first?;
            closed.map(|()| row)
        });
        Self { outcome }
    }

    /// The row, or why there is none
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoRows`] for an empty result, otherwise the
    /// query or close error
    pub fn scan(self) -> DatabaseResult<Row> {
        self.outcome
    }
}
