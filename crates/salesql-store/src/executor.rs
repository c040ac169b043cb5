//! Executor for generated SQL

use std::path::{Path, PathBuf};

use salesql_schema::{check_statement, GuardError, SchemaDescriptor};
use thiserror::Error;

use crate::{collect_rows, open_read_only, QueryResult};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Statement rejected: {0}")]
    Rejected(#[from] GuardError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Statement would modify the store")]
    NotReadOnly,
}

/// Runs single generated statements against a SQLite file.
///
/// Holds no connection: each call opens one read-only connection and closes
/// it before returning, on success and failure alike.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    path: PathBuf,
    schema: &'static SchemaDescriptor,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>, schema: &'static SchemaDescriptor) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    /// Guard, prepare and run `sql`, returning every row
    pub fn try_execute(&self, sql: &str) -> Result<QueryResult, ExecutionError> {
        check_statement(sql, self.schema)?;

        let conn = open_read_only(&self.path)?;
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(ExecutionError::NotReadOnly);
        }

        Ok(collect_rows(&mut stmt, [])?)
    }

    /// Run `sql`, turning any failure into an empty result that carries the
    /// error detail
    pub fn execute(&self, sql: &str) -> QueryResult {
        match self.try_execute(sql) {
            Ok(result) => {
                tracing::debug!(
                    rows = result.row_count,
                    columns = result.columns.len(),
                    "Statement executed"
                );
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, sql = %sql, "Statement failed");
                QueryResult::failed(e)
            }
        }
    }
}
