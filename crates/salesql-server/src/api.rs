//! HTTP API
//!
//! Provides REST endpoints for:
//! - Question answering
//! - Schema introspection and suggested questions
//! - Filtered sales listing, insights and filter options

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use salesql_schema::{SchemaDescriptor, SUGGESTED_QUESTIONS, WORKED_EXAMPLES};
use salesql_store::{FilterOptions, Overview, QueryResult, SalesFilter, SqliteExecutor, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{GenerationError, QueryGenerator};
use crate::query::{ask, Answer, AskError, Question};

#[derive(Clone)]
pub struct AppState {
    generator: Arc<dyn QueryGenerator>,
    executor: SqliteExecutor,
}

impl AppState {
    pub fn new(generator: Arc<dyn QueryGenerator>, executor: SqliteExecutor) -> Self {
        Self { generator, executor }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ask(#[from] AskError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Ask(AskError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            ApiError::Ask(AskError::Generation(GenerationError::Timeout(_))) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Ask(AskError::Generation(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Ask(AskError::Join(_)) | ApiError::Store(_) | ApiError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Questions a client can offer as starting points
#[derive(Debug, Serialize)]
pub struct Examples {
    pub questions: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Query-string form of [`SalesFilter`]: comma-separated lists, blank
/// values ignored
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub regions: Option<String>,
    pub products: Option<String>,
    pub min_profit: Option<String>,
    pub max_profit: Option<String>,
}

impl FilterParams {
    fn into_filter(self) -> Result<SalesFilter, ApiError> {
        Ok(SalesFilter {
            regions: split_list(self.regions.as_deref()),
            products: split_list(self.products.as_deref()),
            min_profit: parse_bound("min_profit", self.min_profit.as_deref())?,
            max_profit: parse_bound("max_profit", self.max_profit.as_deref())?,
        })
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<f64>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{} must be a number, got '{}'", name, v))),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/schema", get(get_schema))
        .route("/examples", get(get_examples))
        .route("/query", post(answer_question))
        .route("/sales", get(list_sales))
        .route("/insights", get(get_insights))
        .route("/filters", get(get_filters))
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("salesql server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_schema(State(state): State<AppState>) -> Json<&'static SchemaDescriptor> {
    Json(state.executor.schema())
}

async fn get_examples() -> Json<Examples> {
    let mut questions: Vec<&'static str> = SUGGESTED_QUESTIONS.to_vec();
    for example in WORKED_EXAMPLES {
        if !questions.iter().any(|q| q.eq_ignore_ascii_case(example.question)) {
            questions.push(example.question);
        }
    }
    Json(Examples { questions })
}

async fn answer_question(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Answer>, ApiError> {
    let question = Question::parse(&req.question)?;
    let answer = ask(state.generator.as_ref(), &state.executor, &question).await?;
    Ok(Json(answer))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<QueryResult>, ApiError> {
    let filter = params.into_filter()?;
    let path = state.executor.path().to_path_buf();
    let result = tokio::task::spawn_blocking(move || salesql_store::load_sales(&path, &filter)).await??;
    Ok(Json(result))
}

async fn get_insights(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Overview>, ApiError> {
    let filter = params.into_filter()?;
    let path = state.executor.path().to_path_buf();
    let overview = tokio::task::spawn_blocking(move || salesql_store::overview(&path, &filter)).await??;
    Ok(Json(overview))
}

async fn get_filters(State(state): State<AppState>) -> Result<Json<FilterOptions>, ApiError> {
    let path = state.executor.path().to_path_buf();
    let options = tokio::task::spawn_blocking(move || salesql_store::filter_options(&path)).await??;
    Ok(Json(options))
}
