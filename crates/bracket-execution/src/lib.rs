//! 포지션 인지 주문 실행.
//!
//! 신호 → 리컨실(포지션 조회/청산) → 사이징(수량/TP/SL) →
//! 브라켓 주문 구성 → 전송의 파이프라인을 담당합니다.
//!
//! ```text
//! ┌──────────────┐
//! │ TradeSignal  │
//! └──────┬───────┘
//!        ▼
//! ╔══════════════════════════════════════╗
//! ║  ExecutionEngine                     ║
//! ╠══════════════════════════════════════╣
//! ║  PositionReconciler → sizing         ║
//! ║       → BracketOrder → FuturesExchange ║
//! ╚══════════════════════════════════════╝
//! ```

pub mod engine;
pub mod reconciler;
pub mod sizing;

pub use engine::{ExecutionEngine, ExecutionOutcome, RiskParams};
pub use reconciler::{PositionReconciler, ReconcileOutcome};
