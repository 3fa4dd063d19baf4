//! 트레이딩 신호 타입.
//!
//! 웹훅 리스너가 파싱을 마친 뒤 엔진에 전달하는 값입니다.
//! 엔진은 파싱되지 않은 원시 페이로드를 절대 받지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 매수/매도 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수 (롱)
    Buy,
    /// 매도 (숏)
    Sell,
}

impl Side {
    /// 반대 방향 반환.
    ///
    /// 기존 포지션 청산 주문의 방향을 결정할 때 사용합니다.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// 거래소 전송용 문자열 ("buy" / "sell").
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 검증이 끝난 진입 신호.
///
/// `symbol`은 정규화 전의 원본 문자열일 수 있습니다 (예: `BTCUSDT.P`).
/// 정규화는 엔진 진입 시점에 수행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// 신호 방향
    pub side: Side,
    /// 거래 심볼 (정규화 전)
    pub symbol: String,
    /// 기준 가격 (알림 발생 시점의 가격)
    pub price: Decimal,
}

impl TradeSignal {
    /// 새 신호 생성.
    pub fn new(side: Side, symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            side,
            symbol: symbol.into(),
            price,
        }
    }
}
