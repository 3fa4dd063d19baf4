//! 심볼별 정밀도 규칙.
//!
//! 거래소는 심볼마다 허용하는 최소 수량 단위(quantity step)와
//! 가격 단위(price tick)가 다릅니다. 단위에 맞지 않는 주문은 거절되거나,
//! 더 나쁜 경우 의도하지 않은 크기로 체결됩니다.
//!
//! 규칙 테이블은 프로세스 시작 시 한 번 생성되며 이후 읽기 전용입니다.
//! 등록되지 않은 심볼 조회는 호출자가 치명적 오류로 처리해야 합니다 -
//! 추측한 기본값으로 대체하지 않습니다.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// =============================================================================
// 규칙
// =============================================================================

/// 심볼 하나의 정밀도/자본 규칙.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRule {
    /// 최소 거래 수량 단위 (예: BTC 0.001)
    pub quantity_step: Decimal,
    /// TP/SL 가격 단위 (예: BTC 0.1)
    pub price_tick: Decimal,
    /// 심볼별 투입 자본 재정의 (USDT). None이면 전역 설정 사용.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_override: Option<Decimal>,
    /// 심볼별 레버리지 재정의. None이면 전역 설정 사용.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage_override: Option<u32>,
}

impl SymbolRule {
    /// 재정의 없는 규칙 생성.
    pub fn new(quantity_step: Decimal, price_tick: Decimal) -> Self {
        Self {
            quantity_step,
            price_tick,
            capital_override: None,
            leverage_override: None,
        }
    }

    /// 자본/레버리지 재정의 설정.
    pub fn with_overrides(mut self, capital: Decimal, leverage: u32) -> Self {
        self.capital_override = Some(capital);
        self.leverage_override = Some(leverage);
        self
    }
}

// =============================================================================
// 규칙 테이블
// =============================================================================

/// 심볼 → 규칙 매핑 테이블.
///
/// 시작 시 한 번 생성되고 이후 변경되지 않으므로 잠금 없이 공유 가능합니다.
#[derive(Debug, Clone, Default)]
pub struct SymbolRuleTable {
    rules: HashMap<String, SymbolRule>,
}

impl SymbolRuleTable {
    /// 빈 테이블 생성 (테스트/커스텀 배포용).
    pub fn new() -> Self {
        Self::default()
    }

    /// 규칙 추가. 심볼은 정규화된 형태여야 합니다.
    pub fn insert(&mut self, symbol: impl Into<String>, rule: SymbolRule) {
        self.rules.insert(symbol.into(), rule);
    }

    /// 규칙 조회.
    ///
    /// 미등록 심볼은 `None` - 기본값으로 대체하지 않습니다.
    /// 호출자는 이를 설정 오류로 처리해야 합니다.
    pub fn lookup(&self, symbol: &str) -> Option<&SymbolRule> {
        self.rules.get(symbol)
    }

    /// 등록된 심볼 수.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 테이블이 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 운영 기본 테이블.
    ///
    /// USDT 마진 선물에서 실제 운용 중인 심볼들의 단위입니다.
    /// BTCUSDT는 자본 13 USDT / 레버리지 20배 재정의를 가집니다.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            "BTCUSDT",
            SymbolRule::new(dec!(0.001), dec!(0.1)).with_overrides(dec!(13), 20),
        );
        table.insert("ETHUSDT", SymbolRule::new(dec!(0.001), dec!(0.01)));
        table.insert("BNBUSDT", SymbolRule::new(dec!(0.01), dec!(0.01)));
        table.insert("SOLUSDT", SymbolRule::new(dec!(0.01), dec!(0.01)));
        table.insert("XRPUSDT", SymbolRule::new(dec!(0.1), dec!(0.01)));
        table.insert("DOGEUSDT", SymbolRule::new(dec!(1), dec!(0.0001)));
        table
    }
}
