//! 브라켓 주문 의도.
//!
//! 실행 한 건마다 새로 구성되는 작업 값입니다. 영속화하지 않습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::Side;

/// 진입 + 익절 + 손절이 결합된 브라켓 주문.
///
/// 모든 가격/수량 필드는 이미 심볼 규칙(`SymbolRule`)에 맞게
/// 단위 내림 처리가 끝난 값이어야 합니다. 커넥터는 이 값을 그대로
/// 직렬화할 뿐, 추가 보정을 하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketOrder {
    /// 진입 방향
    pub side: Side,
    /// 선물 페어 (예: B-BTC_USDT)
    pub pair: String,
    /// 주문 수량 (quantity_step의 양의 배수)
    pub total_quantity: Decimal,
    /// 레버리지 배수
    pub leverage: u32,
    /// 익절 가격 (price_tick의 배수)
    pub take_profit_price: Decimal,
    /// 손절 가격 (price_tick의 배수)
    pub stop_loss_price: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_bracket_order_creation() {
        let order = BracketOrder {
            side: Side::Buy,
            pair: "B-BTC_USDT".to_string(),
            total_quantity: dec!(0.001),
            leverage: 20,
            take_profit_price: dec!(52000.0),
            stop_loss_price: dec!(47500.0),
        };
        assert_eq!(order.side, Side::Buy);
        assert!(order.take_profit_price > order.stop_loss_price);
    }
}
