//! 엔드포인트 핸들러

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::state::AppState;

/// POST /api/v1/hackrx/run 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// 문서 URL
    pub documents: String,
    pub questions: Vec<String>,
}

/// POST /api/v1/hackrx/run 응답 (질문 순서와 동일)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /api/v1/hackrx/run
pub async fn run_submission(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    tracing::info!(
        "Query request: {} ({} questions)",
        request.documents,
        request.questions.len()
    );

    let answers = state
        .pipeline
        .run(&request.documents, &request.questions)
        .await?;

    Ok(Json(QueryResponse { answers }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
