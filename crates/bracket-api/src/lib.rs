//! 웹훅 리스너.
//!
//! TradingView 알림을 받아 파싱/검증하고 실행 엔진을 호출하는
//! 얇은 협력자입니다. 엔진 경계를 넘는 모든 에러를 잡아 로깅하고,
//! 업스트림에는 항상 200 응답을 돌려줍니다 - TradingView는 에러
//! 응답을 받으면 웹훅을 비활성화합니다 (문서화된 동작이며 버그가
//! 아닙니다).

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
