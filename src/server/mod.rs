//! REST 서버 모듈 (axum)
//!
//! - `POST /api/v1/hackrx/run`: 문서 URL + 질문 목록 → 답변 목록
//! - `GET /health`

mod error;
mod handlers;
mod pipeline;
mod state;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthResponse, QueryRequest, QueryResponse};
pub use pipeline::{QueryPipeline, DEFAULT_CLAUSES};
pub use state::AppState;

/// 라우터 생성
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/hackrx/run", post(handlers::run_submission))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 주소에 바인딩하고 서버 실행
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("API server listening on {}", bind);
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
