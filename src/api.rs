use crate::cancel::CancellationToken;
use crate::engine::{IndexSummary, Indexer};
use crate::error::{IndexError, LogSink};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub word: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub word: String,
    pub files: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

// ========== Error Handling ==========

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<IndexError>() {
            Some(IndexError::PathNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = format!("{:#}", self.0);
        tracing::error!("API error: {}", message);

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK"))
}

async fn index_path(
    State(engine): State<Arc<Indexer>>,
    Json(req): Json<IndexRequest>,
) -> Result<Json<ApiResponse<IndexSummary>>, AppError> {
    // Traversal and file reads block, keep them off the async workers.
    let summary = tokio::task::spawn_blocking(move || {
        engine.index_with(&req.path, &LogSink, &CancellationToken::new())
    })
    .await??;

    Ok(Json(ApiResponse::success(summary)))
}

async fn query_word(
    State(engine): State<Arc<Indexer>>,
    Query(req): Query<QueryRequest>,
) -> Json<ApiResponse<QueryResponse>> {
    let mut files: Vec<String> = engine.query(&req.word).into_iter().collect();
    files.sort();

    Json(ApiResponse::success(QueryResponse {
        word: req.word,
        total: files.len(),
        files,
    }))
}

async fn get_stats(State(engine): State<Arc<Indexer>>) -> impl IntoResponse {
    Json(ApiResponse::success(engine.stats()))
}

// ========== Router ==========

pub fn create_router(engine: Arc<Indexer>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/index", post(index_path))
        .route("/query", get(query_word))
        .route("/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}
