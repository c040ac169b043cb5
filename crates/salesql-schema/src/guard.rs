//! Statement guard applied to generated SQL before it reaches the store.
//!
//! A statement passes when it parses as exactly one read-only query and every
//! table and column it names exists in the schema descriptor.

use std::collections::HashSet;
use std::ops::ControlFlow;

use sqlparser::ast::{
    Expr, Ident, ObjectName, Query, SelectItem, SetExpr, Statement, TableAlias, TableFactor, Visit,
    Visitor,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

use crate::SchemaDescriptor;

/// Columns SQLite exposes on every rowid table
const IMPLICIT_COLUMNS: &[&str] = &["rowid", "oid", "_rowid_"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("Empty statement")]
    Empty,

    #[error("Failed to parse SQL: {0}")]
    Parse(String),

    #[error("Expected a single statement, found {0}")]
    MultipleStatements(usize),

    #[error("Only SELECT queries are allowed, got {0}")]
    NotAQuery(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

/// Check that `sql` is a single query over `schema`.
pub fn check_statement(sql: &str, schema: &SchemaDescriptor) -> Result<(), GuardError> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Err(GuardError::Empty);
    }

    let statements =
        Parser::parse_sql(&SQLiteDialect {}, sql).map_err(|e| GuardError::Parse(e.to_string()))?;

    let statement = match statements.as_slice() {
        [] => return Err(GuardError::Empty),
        [statement] => statement,
        many => return Err(GuardError::MultipleStatements(many.len())),
    };

    if !matches!(statement, Statement::Query(_)) {
        return Err(GuardError::NotAQuery(leading_keyword(sql)));
    }

    let mut refs = References::new(schema);
    if let ControlFlow::Break(err) = statement.visit(&mut refs) {
        return Err(err);
    }

    for column in &refs.columns {
        let name = column.value.as_str();
        let known = schema.has_column(name)
            || refs.derived.contains(&name.to_lowercase())
            || IMPLICIT_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name));
        // SQLite reads an unresolvable double-quoted identifier as a string
        let string_fallback = column.quote_style == Some('"');
        if !known && !string_fallback {
            return Err(GuardError::UnknownColumn(name.to_string()));
        }
    }

    Ok(())
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Names referenced by a statement. Tables are checked while walking;
/// columns afterwards, once every alias is known.
struct References<'a> {
    schema: &'a SchemaDescriptor,
    columns: Vec<Ident>,
    /// Lowercased names introduced by the statement itself: CTEs, table
    /// aliases, alias column lists and projection aliases
    derived: HashSet<String>,
}

impl<'a> References<'a> {
    fn new(schema: &'a SchemaDescriptor) -> Self {
        Self {
            schema,
            columns: Vec::new(),
            derived: HashSet::new(),
        }
    }

    fn collect_alias(&mut self, alias: &TableAlias) {
        self.derived.insert(alias.name.value.to_lowercase());
        for column in &alias.columns {
            self.derived.insert(column.name.value.to_lowercase());
        }
    }

    fn collect_projection_aliases(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => {
                for item in &select.projection {
                    if let SelectItem::ExprWithAlias { alias, .. } = item {
                        self.derived.insert(alias.value.to_lowercase());
                    }
                }
            }
            SetExpr::Query(query) => self.collect_projection_aliases(&query.body),
            SetExpr::SetOperation { left, right, .. } => {
                self.collect_projection_aliases(left);
                self.collect_projection_aliases(right);
            }
            _ => {}
        }
    }
}

impl Visitor for References<'_> {
    type Break = GuardError;

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.collect_alias(&cte.alias);
            }
        }
        self.collect_projection_aliases(&query.body);
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        let alias = match table_factor {
            TableFactor::Table { alias, .. } | TableFactor::Derived { alias, .. } => alias.as_ref(),
            _ => None,
        };
        if let Some(alias) = alias {
            self.collect_alias(alias);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        // CTE names are collected in pre_visit_query, before any relation
        // inside the query is reached
        match relation.0.last() {
            Some(name)
                if !self.schema.is_table(&name.value)
                    && !self.derived.contains(&name.value.to_lowercase()) =>
            {
                ControlFlow::Break(GuardError::UnknownTable(name.value.clone()))
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Identifier(ident) => self.columns.push(ident.clone()),
            Expr::CompoundIdentifier(parts) => {
                if let Some(column) = parts.last() {
                    self.columns.push(column.clone());
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}
