//! 핸들러 공유 상태

use std::sync::Arc;

use super::pipeline::QueryPipeline;

/// 라우터 상태 (axum State 추출기로 전달)
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

impl AppState {
    pub fn new(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
