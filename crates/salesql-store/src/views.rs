//! Fixed aggregate views over the sales table
//!
//! These back the overview endpoints: the full listing, headline metrics,
//! top products and profit per region. All statements are parameterized and
//! share the same optional filter.

use std::path::Path;

use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use salesql_schema::SALES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{collect_rows, open_read_only, QueryResult};

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Row filter shared by every view. Empty sets match everything; profit
/// bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesFilter {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub min_profit: Option<f64>,
    #[serde(default)]
    pub max_profit: Option<f64>,
}

impl SalesFilter {
    /// ` WHERE ...` clause (or nothing) plus its bound parameters
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for (column, values) in [("region", &self.regions), ("product_name", &self.products)] {
            if values.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            conditions.push(format!("{} IN ({})", column, placeholders));
            params.extend(values.iter().cloned().map(SqlValue::Text));
        }

        if let Some(min) = self.min_profit {
            conditions.push("profit >= ?".to_string());
            params.push(SqlValue::Real(min));
        }
        if let Some(max) = self.max_profit {
            conditions.push("profit <= ?".to_string());
            params.push(SqlValue::Real(max));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Headline numbers for a set of sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_records: i64,
    pub total_profit: f64,
    /// Mean of `unit_price * quantity_sold`
    pub average_order_value: f64,
    pub distinct_products: i64,
}

/// Summed profit for one product or region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitGroup {
    pub name: String,
    pub total_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub metrics: Metrics,
    pub top_products: Vec<ProfitGroup>,
    pub profit_by_region: Vec<ProfitGroup>,
}

/// Values available for building a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub products: Vec<String>,
    pub min_profit: Option<f64>,
    pub max_profit: Option<f64>,
}

/// All matching sales, newest first
pub fn load_sales(path: &Path, filter: &SalesFilter) -> Result<QueryResult, StoreError> {
    let (clause, params) = filter.where_clause();
    let sql = format!("SELECT * FROM {}{} ORDER BY order_date DESC", SALES.table, clause);

    let conn = open_read_only(path)?;
    let mut stmt = conn.prepare(&sql)?;
    Ok(collect_rows(&mut stmt, params_from_iter(params))?)
}

/// Metrics, top products and per-region profit for the matching sales
pub fn overview(path: &Path, filter: &SalesFilter) -> Result<Overview, StoreError> {
    let (clause, params) = filter.where_clause();
    let conn = open_read_only(path)?;

    let metrics_sql = format!(
        "SELECT COUNT(*), COALESCE(SUM(profit), 0.0), \
         COALESCE(AVG(unit_price * quantity_sold), 0.0), COUNT(DISTINCT product_name) \
         FROM {}{}",
        SALES.table, clause
    );
    let metrics = conn.query_row(&metrics_sql, params_from_iter(params.iter()), |row| {
        Ok(Metrics {
            total_records: row.get(0)?,
            total_profit: row.get(1)?,
            average_order_value: row.get(2)?,
            distinct_products: row.get(3)?,
        })
    })?;

    let top_products = profit_groups(
        &conn,
        &format!(
            "SELECT product_name, SUM(profit) AS total_profit FROM {}{} \
             GROUP BY product_name ORDER BY total_profit DESC LIMIT {}",
            SALES.table, clause, TOP_PRODUCTS
        ),
        &params,
    )?;

    let profit_by_region = profit_groups(
        &conn,
        &format!(
            "SELECT region, SUM(profit) AS total_profit FROM {}{} \
             GROUP BY region ORDER BY total_profit DESC",
            SALES.table, clause
        ),
        &params,
    )?;

    Ok(Overview {
        metrics,
        top_products,
        profit_by_region,
    })
}

fn profit_groups(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[SqlValue],
) -> rusqlite::Result<Vec<ProfitGroup>> {
    let mut stmt = conn.prepare(sql)?;
    let groups = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(ProfitGroup {
                name: row.get(0)?,
                total_profit: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

/// Distinct regions and products plus the profit range of the whole store
pub fn filter_options(path: &Path) -> Result<FilterOptions, StoreError> {
    let conn = open_read_only(path)?;

    let distinct = |column: &str| -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {0} FROM {1} WHERE {0} IS NOT NULL ORDER BY {0}",
            column, SALES.table
        ))?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    };

    let regions = distinct("region")?;
    let products = distinct("product_name")?;

    let (min_profit, max_profit): (Option<f64>, Option<f64>) = conn.query_row(
        &format!("SELECT MIN(profit), MAX(profit) FROM {}", SALES.table),
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(FilterOptions {
        regions,
        products,
        min_profit,
        max_profit,
    })
}
