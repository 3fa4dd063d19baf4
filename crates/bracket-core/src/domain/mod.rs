//! 도메인 타입 모듈.

pub mod exchange;
pub mod order;
pub mod position;
pub mod rules;
pub mod signal;
pub mod symbol;

pub use exchange::{ExchangeError, FuturesExchange, OrderAck};
pub use order::BracketOrder;
pub use position::FuturesPosition;
pub use rules::{SymbolRule, SymbolRuleTable};
pub use signal::{Side, TradeSignal};
