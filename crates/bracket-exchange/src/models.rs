//! CoinDCX 선물 API 와이어 타입.
//!
//! 필드 이름과 중첩 구조는 거래소 계약을 그대로 따릅니다. 필드 선언
//! 순서가 곧 서명 대상 페이로드의 키 순서이므로 순서를 바꾸면 안 됩니다.
//!
//! Decimal 값은 전역 serde-float 설정에 따라 직렬화 시점에만 JSON
//! 숫자로 변환됩니다. 내부 계산은 끝까지 Decimal로 수행됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bracket_core::domain::order::BracketOrder;
use bracket_core::domain::position::FuturesPosition;
use bracket_core::Side;

// =============================================================================
// 주문 생성
// =============================================================================

/// POST /exchange/v1/derivatives/futures/orders/create 본문.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    /// 밀리초 타임스탬프
    pub timestamp: i64,
    /// 주문 상세
    pub order: OrderPayload,
}

/// 주문 상세 페이로드.
#[derive(Debug, Serialize)]
pub struct OrderPayload {
    /// "buy" / "sell"
    pub side: &'static str,
    /// 선물 페어 (예: B-BTC_USDT)
    pub pair: String,
    /// 주문 유형 - 시장가 진입만 사용
    pub order_type: &'static str,
    /// 주문 수량
    pub total_quantity: Decimal,
    /// 레버리지 배수
    pub leverage: u32,
    /// 익절 가격
    pub take_profit_price: Decimal,
    /// 손절 가격
    pub stop_loss_price: Decimal,
}

impl CreateOrderRequest {
    /// 브라켓 주문에서 와이어 요청 구성.
    pub fn from_order(order: &BracketOrder, timestamp: i64) -> Self {
        Self {
            timestamp,
            order: OrderPayload {
                side: order.side.as_str(),
                pair: order.pair.clone(),
                order_type: "market_order",
                total_quantity: order.total_quantity,
                leverage: order.leverage,
                take_profit_price: order.take_profit_price,
                stop_loss_price: order.stop_loss_price,
            },
        }
    }
}

// =============================================================================
// 포지션 조회
// =============================================================================

/// POST /exchange/v1/derivatives/futures/positions 본문.
#[derive(Debug, Serialize)]
pub struct ListPositionsRequest {
    /// 밀리초 타임스탬프
    pub timestamp: i64,
    /// 페이지 번호 (문자열 - 거래소 계약)
    pub page: &'static str,
    /// 페이지 크기 (문자열 - 거래소 계약)
    pub size: &'static str,
}

impl ListPositionsRequest {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            page: "1",
            size: "100",
        }
    }
}

/// 포지션 레코드 (응답).
///
/// `active_pos`는 부호 있는 크기입니다: 양수 = 롱, 음수 = 숏, 0 = 청산됨.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionRecord {
    /// 포지션 ID
    pub id: String,
    /// 선물 페어
    pub pair: String,
    /// 부호 있는 포지션 크기
    pub active_pos: Decimal,
    /// 평균 진입가
    #[serde(default)]
    pub avg_price: Decimal,
}

impl From<PositionRecord> for FuturesPosition {
    fn from(record: PositionRecord) -> Self {
        let side = if record.active_pos.is_sign_negative() {
            Side::Sell
        } else {
            Side::Buy
        };
        Self {
            id: record.id,
            pair: record.pair,
            side,
            size: record.active_pos.abs(),
            avg_price: record.avg_price,
        }
    }
}

// =============================================================================
// 포지션 청산
// =============================================================================

/// POST /exchange/v1/derivatives/futures/positions/exit 본문.
#[derive(Debug, Serialize)]
pub struct ExitPositionRequest {
    /// 밀리초 타임스탬프
    pub timestamp: i64,
    /// 청산할 포지션 ID
    pub id: String,
}
