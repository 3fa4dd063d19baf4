//! 브라켓 주문 실행 엔진의 핵심 도메인 크레이트.
//!
//! 거래소 중립 타입(심볼, 규칙, 포지션, 주문)과 에러 분류 체계,
//! 설정 로딩을 제공합니다. I/O는 포함하지 않으며, 거래소 통신은
//! `FuturesExchange` trait 뒤로 추상화됩니다.

pub mod config;
pub mod domain;
pub mod error;

pub use config::{AppConfig, DuplicatePolicy, MinQuantityPolicy, OperatingMode};
pub use domain::exchange::{ExchangeError, FuturesExchange, OrderAck};
pub use domain::order::BracketOrder;
pub use domain::position::FuturesPosition;
pub use domain::rules::{SymbolRule, SymbolRuleTable};
pub use domain::signal::{Side, TradeSignal};
pub use error::ExecutionError;
