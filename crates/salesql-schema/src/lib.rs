//! salesql schema layer
//!
//! Static description of the single queryable table plus the pure text
//! transformations that sit on either side of the language model: the
//! instruction prompt going in, and the sanitizer and statement guard
//! applied to what comes back. Nothing in this crate performs I/O.

use serde::Serialize;

pub mod guard;
pub mod prompt;
pub mod sanitize;

pub use guard::{check_statement, GuardError};
pub use prompt::{build_prompt, WorkedExample, SUGGESTED_QUESTIONS, WORKED_EXAMPLES};
pub use sanitize::sanitize;

/// Semantic kind of a column, as described to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Auto-assigned integer key
    Identifier,
    /// Calendar date stored as text
    Date,
    /// String drawn from a small fixed set of values
    Categorical,
    Decimal,
    Integer,
    /// Percentage in the 0-100 range
    Percent,
}

/// A single column of the described table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// SQLite storage type
    pub sql_type: &'static str,
    pub kind: ColumnKind,
    pub description: &'static str,
    /// Known values for categorical columns, empty otherwise
    #[serde(skip_serializing_if = "no_values")]
    pub known_values: &'static [&'static str],
}

fn no_values(values: &&[&str]) -> bool {
    values.is_empty()
}

/// Immutable description of the one table the model may query
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SchemaDescriptor {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
    /// Text encoding used for date columns
    pub date_format: &'static str,
}

impl SchemaDescriptor {
    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Look up a column, ignoring ASCII case the way SQLite does
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_table(&self, name: &str) -> bool {
        self.table.eq_ignore_ascii_case(name)
    }

    /// `CREATE TABLE` statement matching the descriptor
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| match c.kind {
                ColumnKind::Identifier => format!("{} {} PRIMARY KEY AUTOINCREMENT", c.name, c.sql_type),
                _ => format!("{} {}", c.name, c.sql_type),
            })
            .collect();
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table, columns.join(", "))
    }
}

pub const REGIONS: &[&str] = &["North", "South", "East", "West"];

pub const PRODUCTS: &[&str] = &[
    "Laptop",
    "Tablet",
    "Smartphone",
    "Headphones",
    "Monitor",
    "Keyboard",
    "Mouse",
    "Printer",
];

/// The sales table every question is answered against
pub const SALES: SchemaDescriptor = SchemaDescriptor {
    table: "sales",
    columns: &[
        ColumnSpec {
            name: "id",
            sql_type: "INTEGER",
            kind: ColumnKind::Identifier,
            description: "unique order id",
            known_values: &[],
        },
        ColumnSpec {
            name: "order_date",
            sql_type: "TEXT",
            kind: ColumnKind::Date,
            description: "date the order was placed",
            known_values: &[],
        },
        ColumnSpec {
            name: "region",
            sql_type: "TEXT",
            kind: ColumnKind::Categorical,
            description: "sales region",
            known_values: REGIONS,
        },
        ColumnSpec {
            name: "product_name",
            sql_type: "TEXT",
            kind: ColumnKind::Categorical,
            description: "product sold",
            known_values: PRODUCTS,
        },
        ColumnSpec {
            name: "unit_price",
            sql_type: "REAL",
            kind: ColumnKind::Decimal,
            description: "price of one unit",
            known_values: &[],
        },
        ColumnSpec {
            name: "quantity_sold",
            sql_type: "INTEGER",
            kind: ColumnKind::Integer,
            description: "number of units in the order",
            known_values: &[],
        },
        ColumnSpec {
            name: "discount_percent",
            sql_type: "REAL",
            kind: ColumnKind::Percent,
            description: "discount applied, 0 to 100",
            known_values: &[],
        },
        ColumnSpec {
            name: "profit",
            sql_type: "REAL",
            kind: ColumnKind::Decimal,
            description: "profit of the order, may be negative",
            known_values: &[],
        },
    ],
    date_format: "YYYY-MM-DD",
};
