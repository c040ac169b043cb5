//! Store builders for tests and local demos
//!
//! The running service never creates or writes a store; these helpers exist
//! so tests can stand one up from known rows.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::{params, Connection};
use salesql_schema::SALES;

/// One sales row, without its auto-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRow {
    pub order_date: String,
    pub region: String,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity_sold: i64,
    pub discount_percent: f64,
    pub profit: f64,
}

impl SaleRow {
    pub fn new(
        order_date: &str,
        region: &str,
        product_name: &str,
        unit_price: f64,
        quantity_sold: i64,
        discount_percent: f64,
        profit: f64,
    ) -> Self {
        Self {
            order_date: order_date.to_string(),
            region: region.to_string(),
            product_name: product_name.to_string(),
            unit_price,
            quantity_sold,
            discount_percent,
            profit,
        }
    }
}

/// Create a fresh store at `path` containing exactly `rows`.
///
/// Any existing file at `path` is replaced.
pub fn create_store(path: &Path, rows: &[SaleRow]) -> rusqlite::Result<()> {
    if path.exists() {
        std::fs::remove_file(path).ok();
    }

    let mut conn = Connection::open(path)?;
    conn.execute_batch(&SALES.create_table_sql())?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sales (order_date, region, product_name, unit_price, quantity_sold, discount_percent, profit) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.order_date,
                row.region,
                row.product_name,
                row.unit_price,
                row.quantity_sold,
                row.discount_percent,
                row.profit,
            ])?;
        }
    }
    tx.commit()
}

/// Unique path under the system temp directory for a throwaway store
pub fn temp_store_path(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("salesql-{}-{}-{}.db", name, std::process::id(), n))
}

/// Store file that is deleted when dropped
#[derive(Debug)]
pub struct TempStore {
    path: PathBuf,
}

impl TempStore {
    /// Create a store holding `rows` at a fresh [`temp_store_path`]
    pub fn create(name: &str, rows: &[SaleRow]) -> rusqlite::Result<Self> {
        let path = temp_store_path(name);
        create_store(&path, rows)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for TempStore {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}
