//! SQLite store access for salesql
//!
//! Every operation opens its own read-only connection and drops it before
//! returning. Nothing here writes to the store.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, Params, Row, Statement};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub mod executor;
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;
pub mod views;

pub use executor::{ExecutionError, SqliteExecutor};
pub use views::{filter_options, load_sales, overview, FilterOptions, Overview, SalesFilter, StoreError};

/// Rows and column names produced by one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,

    /// Why execution failed; only set on an empty result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Profit statistics over the `profit` column of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub count: usize,
    pub total: f64,
    pub average: f64,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            row_count: rows.len(),
            columns,
            rows,
            error: None,
        }
    }

    /// Empty result carrying the failure detail
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum and mean of the numeric cells of a `profit` column, if the result
    /// has one with at least one number in it
    pub fn profit_summary(&self) -> Option<ProfitSummary> {
        let idx = self.columns.iter().position(|c| c == "profit")?;
        let profits: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(serde_json::Value::as_f64))
            .collect();

        if profits.is_empty() {
            return None;
        }

        let total: f64 = profits.iter().sum();
        Some(ProfitSummary {
            count: profits.len(),
            total,
            average: total / profits.len() as f64,
        })
    }
}

/// Open `path` read-only; a missing file is an error rather than a new store
pub(crate) fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

/// Run a prepared statement to completion, fetching every row eagerly
pub(crate) fn collect_rows<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> rusqlite::Result<QueryResult> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = columns.len();

    let mut rows = stmt.query(params)?;
    let mut result_rows = Vec::new();
    while let Some(row) = rows.next()? {
        result_rows.push(row_to_json(row, column_count)?);
    }

    Ok(QueryResult::new(columns, result_rows))
}

/// Convert every cell of `row` to JSON
fn row_to_json(row: &Row<'_>, column_count: usize) -> rusqlite::Result<Vec<serde_json::Value>> {
    (0..column_count)
        .map(|idx| row.get::<_, SqlValue>(idx).map(sql_value_to_json))
        .collect()
}

fn sql_value_to_json(value: SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Integer(i) => json!(i),
        SqlValue::Real(f) => json!(f),
        SqlValue::Text(s) => serde_json::Value::String(s),
        SqlValue::Blob(b) => serde_json::Value::String(
            b.iter().map(|byte| format!("{:02x}", byte)).collect(),
        ),
    }
}
