//! 거래소 중립 포지션 스냅샷.
//!
//! 포지션의 소유자는 거래소입니다. 이 타입은 실행 직전에 조회한
//! 일시적 스냅샷일 뿐이며, 호출 간에 캐시하거나 신뢰하지 않습니다.
//! 웹훅 전달과 거래소 상태는 동기화되지 않으므로 매 실행마다 재조회합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::Side;

/// 선물 포지션 스냅샷.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuturesPosition {
    /// 거래소 포지션 ID (청산 요청에 사용)
    pub id: String,
    /// 선물 페어 (예: B-BTC_USDT)
    pub pair: String,
    /// 포지션 방향
    pub side: Side,
    /// 포지션 크기 (절대값, 항상 양수)
    pub size: Decimal,
    /// 평균 진입가
    pub avg_price: Decimal,
}

impl FuturesPosition {
    /// 크기가 0이 아닌 실제 노출인지 여부.
    ///
    /// 거래소에 따라 크기 0인 포지션 레코드가 목록에 남아 있을 수 있습니다.
    pub fn is_open(&self) -> bool {
        !self.size.is_zero()
    }
}
