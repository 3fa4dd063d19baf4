//! 애플리케이션 공유 상태.

use std::sync::Arc;

use bracket_execution::ExecutionEngine;

/// axum 핸들러에 주입되는 상태.
///
/// 엔진은 호출 간 상태를 갖지 않으므로 Arc 공유로 충분합니다.
#[derive(Clone)]
pub struct AppState {
    /// 주문 실행 엔진
    pub engine: Arc<ExecutionEngine>,
}

impl AppState {
    /// 새 상태 생성.
    pub fn new(engine: Arc<ExecutionEngine>) -> Self {
        Self { engine }
    }
}
