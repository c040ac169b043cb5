//! Question answering pipeline: prompt, generate, sanitize, execute

use salesql_schema::{build_prompt, sanitize, SALES};
use salesql_store::{ProfitSummary, QueryResult, SqliteExecutor};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::llm::{GenerationError, QueryGenerator};
use crate::log_event;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A non-blank question, trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn parse(raw: &str) -> Result<Self, AskError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything produced while answering one question
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub request_id: Uuid,
    pub question: String,
    /// Sanitized statement that was handed to the executor
    pub sql: String,
    #[serde(flatten)]
    pub result: QueryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_summary: Option<ProfitSummary>,
}

/// Answer `question` with one generation call and one execution.
///
/// Generation failures are returned as errors. Execution failures are not:
/// they come back as an empty result whose `error` field says why.
pub async fn ask(
    generator: &dyn QueryGenerator,
    executor: &SqliteExecutor,
    question: &Question,
) -> Result<Answer, AskError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ask", request_id = %request_id);

    async move {
        tracing::info!(question = %question.as_str(), "Answering question");

        let instructions = build_prompt(&SALES);
        let raw = generator.generate(&instructions, question.as_str()).await?;
        let sql = sanitize(&raw);
        tracing::info!(sql = %sql, "Generated SQL");

        let task_executor = executor.clone();
        let statement = sql.clone();
        let result = tokio::task::spawn_blocking(move || task_executor.execute(&statement)).await?;

        log_event!(
            level: tracing::Level::INFO,
            event: "question_answered",
            rows: result.row_count,
            failed: result.error.is_some(),
        );

        Ok(Answer {
            request_id,
            question: question.as_str().to_string(),
            profit_summary: result.profit_summary(),
            sql,
            result,
        })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use salesql_store::fixtures::{create_store, temp_store_path, SaleRow};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Generator returning a fixed reply and counting calls
    struct FakeGenerator {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryGenerator for FakeGenerator {
        async fn generate(&self, instructions: &str, _question: &str) -> Result<String, GenerationError> {
            assert!(instructions.contains("sales"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .map_err(|_| GenerationError::Timeout(Duration::from_secs(1)))
        }
    }

    fn north_store(name: &str) -> SqliteExecutor {
        let path = temp_store_path(name);
        let mut rows = Vec::new();
        for i in 0..20 {
            let product = if i % 2 == 0 { "Laptop" } else { "Smartphone" };
            rows.push(SaleRow::new("2024-03-10", "North", product, 100.0, 1, 0.0, 10.0));
        }
        rows.push(SaleRow::new("2024-04-01", "South", "Tablet", 50.0, 2, 5.0, 4.0));
        create_store(&path, &rows).unwrap();
        SqliteExecutor::new(path, &SALES)
    }

    #[test]
    fn test_blank_question_is_rejected() {
        assert!(matches!(Question::parse("   \n"), Err(AskError::EmptyQuestion)));
        assert_eq!(Question::parse("  Show all records ").unwrap().as_str(), "Show all records");
    }

    #[tokio::test]
    async fn test_count_north_end_to_end() {
        let executor = north_store("ask-count");
        let generator =
            FakeGenerator::replying("SELECT COUNT(*) FROM sales WHERE region = 'North';");
        let question = Question::parse("How many records are in north region?").unwrap();

        let answer = ask(&generator, &executor, &question).await.unwrap();

        assert_eq!(answer.result.columns, vec!["COUNT(*)"]);
        assert_eq!(answer.result.rows, vec![vec![json!(20)]]);
        assert!(answer.result.error.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        std::fs::remove_file(executor.path()).ok();
    }

    #[tokio::test]
    async fn test_fenced_reply_is_sanitized() {
        let executor = north_store("ask-fenced");
        let generator = FakeGenerator::replying(
            "```sql\nSELECT * FROM sales WHERE product_name = 'Smartphone';\n```",
        );
        let question = Question::parse("Show smartphone sales").unwrap();

        let answer = ask(&generator, &executor, &question).await.unwrap();

        assert_eq!(answer.sql, "SELECT * FROM sales WHERE product_name = 'Smartphone';");
        assert_eq!(answer.result.row_count, 10);
        let summary = answer.profit_summary.unwrap();
        assert_eq!(summary.count, 10);
        assert_eq!(summary.total, 100.0);

        std::fs::remove_file(executor.path()).ok();
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let executor = north_store("ask-fail");
        let generator = FakeGenerator::failing();
        let question = Question::parse("Show all records").unwrap();

        let err = ask(&generator, &executor, &question).await.unwrap_err();
        assert!(matches!(err, AskError::Generation(GenerationError::Timeout(_))));

        std::fs::remove_file(executor.path()).ok();
    }

    #[tokio::test]
    async fn test_write_statement_yields_error_result() {
        let executor = north_store("ask-delete");
        let generator = FakeGenerator::replying("DELETE FROM sales;");
        let question = Question::parse("Remove everything").unwrap();

        let answer = ask(&generator, &executor, &question).await.unwrap();
        assert!(answer.result.is_empty());
        assert!(answer.result.columns.is_empty());
        assert!(answer.result.error.is_some());
        assert!(answer.profit_summary.is_none());

        let count = executor.execute("SELECT COUNT(*) FROM sales");
        assert_eq!(count.rows, vec![vec![json!(21)]]);

        std::fs::remove_file(executor.path()).ok();
    }
}
