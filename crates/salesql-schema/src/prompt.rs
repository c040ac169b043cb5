//! Instruction prompt that steers the model toward SQLite statements over the
//! described table.

use crate::{ColumnKind, SchemaDescriptor};

/// A natural-language question paired with the SQL it should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedExample {
    pub question: &'static str,
    pub sql: &'static str,
}

/// Worked examples shown to the model.
///
/// Covers unconditional selection, filtering, counting, grouped aggregation,
/// ordering with a limit, and date range / date part filtering.
pub const WORKED_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "Show all records",
        sql: "SELECT * FROM sales;",
    },
    WorkedExample {
        question: "Show all records from north region",
        sql: "SELECT * FROM sales WHERE region = 'North';",
    },
    WorkedExample {
        question: "How many records are in north region?",
        sql: "SELECT COUNT(*) FROM sales WHERE region = 'North';",
    },
    WorkedExample {
        question: "What is the total profit by region?",
        sql: "SELECT region, SUM(profit) AS total_profit FROM sales GROUP BY region;",
    },
    WorkedExample {
        question: "Show top 10 most profitable orders",
        sql: "SELECT * FROM sales ORDER BY profit DESC LIMIT 10;",
    },
    WorkedExample {
        question: "List all smartphone sales",
        sql: "SELECT * FROM sales WHERE product_name = 'Smartphone';",
    },
    WorkedExample {
        question: "Show orders placed in March 2024",
        sql: "SELECT * FROM sales WHERE order_date BETWEEN '2024-03-01' AND '2024-03-31';",
    },
    WorkedExample {
        question: "What is the total profit per month?",
        sql: "SELECT strftime('%Y-%m', order_date) AS order_month, SUM(profit) AS total_profit FROM sales GROUP BY order_month ORDER BY order_month;",
    },
];

/// Starter questions offered to users, separate from the prompt examples
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "Show all records from North region",
    "What is the total profit by region?",
    "Which product has the highest unit price?",
    "Show orders with discount more than 20%",
    "What is the average quantity sold per product?",
    "Show top 5 most profitable orders",
    "How many orders were placed in each region?",
];

const INTENT_RULES: &[&str] = &[
    "When the user asks to \"show\", \"display\" or \"list\" records, use SELECT * to return all columns",
    "When the user asks \"how many\" or to \"count\", use COUNT(*)",
    "When the user asks for \"all records\" or \"all data\", always use SELECT * and never COUNT(*)",
    "Use single quotes for string values",
];

const OUTPUT_RULES: &[&str] = &[
    "Return only the SQL statement, with no markdown fences and no commentary",
    "Do not include ```sql or ``` in your response",
    "Write exactly one SELECT statement; never modify data",
];

/// Build the instruction block for `schema`.
///
/// Pure and deterministic: the same descriptor always yields the same text.
pub fn build_prompt(schema: &SchemaDescriptor) -> String {
    let column_list = schema.column_names().collect::<Vec<_>>().join(", ");

    let mut prompt = String::new();
    prompt.push_str("You are an expert in converting English questions to SQLite queries!\n");
    prompt.push_str(&format!(
        "The SQL database has a table named '{}' with the following columns - {}\n\n",
        schema.table, column_list
    ));

    prompt.push_str("Columns:\n");
    for column in schema.columns {
        prompt.push_str(&format!(
            "- {} ({}): {}",
            column.name, column.sql_type, column.description
        ));
        if column.kind == ColumnKind::Date {
            prompt.push_str(&format!(", stored as text in {} format", schema.date_format));
        }
        if !column.known_values.is_empty() {
            let values: Vec<String> = column
                .known_values
                .iter()
                .map(|v| format!("'{}'", v))
                .collect();
            prompt.push_str(&format!("; values: {}", values.join(", ")));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nDates are stored as text in {} format. Compare them as strings or use \
         strftime() to extract the year, month or day.\n\n",
        schema.date_format
    ));

    prompt.push_str("For example:\n");
    for (idx, example) in WORKED_EXAMPLES.iter().enumerate() {
        prompt.push_str(&format!(
            "Example {} - \"{}\"\nSQL: {}\n\n",
            idx + 1,
            example.question,
            example.sql
        ));
    }

    prompt.push_str("Important notes:\n");
    prompt.push_str(&format!("- Table name is '{}' (lowercase)\n", schema.table));
    for rule in INTENT_RULES.iter().chain(OUTPUT_RULES) {
        prompt.push_str(&format!("- {}\n", rule));
    }
    prompt.push_str(&format!(
        "- Column names are case-sensitive: {}\n",
        column_list
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SALES;

    #[test]
    fn test_prompt_names_table_and_columns() {
        let prompt = build_prompt(&SALES);
        assert!(prompt.contains("table named 'sales'"));
        assert!(prompt.contains(
            "id, order_date, region, product_name, unit_price, quantity_sold, discount_percent, profit"
        ));
        assert!(prompt.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_prompt_contains_count_example() {
        let prompt = build_prompt(&SALES);
        assert!(prompt.contains("\"How many records are in north region?\""));
        assert!(prompt.contains("SQL: SELECT COUNT(*) FROM sales WHERE region = 'North';"));
        assert!(prompt.contains("use COUNT(*)"));
    }

    #[test]
    fn test_examples_cover_query_shapes() {
        let sqls: Vec<&str> = WORKED_EXAMPLES.iter().map(|e| e.sql).collect();
        assert!(sqls.contains(&"SELECT * FROM sales;"));
        assert!(sqls.iter().any(|s| s.contains("WHERE")));
        assert!(sqls.iter().any(|s| s.contains("COUNT(*)")));
        assert!(sqls.iter().any(|s| s.contains("GROUP BY")));
        assert!(sqls.iter().any(|s| s.contains("ORDER BY") && s.contains("LIMIT")));
        assert!(sqls.iter().any(|s| s.contains("BETWEEN '2024-03-01'")));
        assert!(sqls.iter().any(|s| s.contains("strftime")));
    }

    #[test]
    fn test_prompt_states_output_contract() {
        let prompt = build_prompt(&SALES);
        assert!(prompt.contains("no markdown fences and no commentary"));
    }

    #[test]
    fn test_prompt_lists_categorical_values() {
        let prompt = build_prompt(&SALES);
        assert!(prompt.contains("'North', 'South', 'East', 'West'"));
        assert!(prompt.contains("'Smartphone'"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt(&SALES), build_prompt(&SALES));
    }
}
