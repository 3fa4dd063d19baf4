//! 수량/가격 정밀도 계산.
//!
//! 돈을 잃는 버그는 대부분 여기서 나옵니다: 수량 반올림과 단위 처리.
//! 모든 연산은 Decimal(십진 고정소수점)로 수행하며, 이진 부동소수점의
//! 드리프트가 퍼센트/나머지 연산에 끼어들 여지를 없앱니다.
//!
//! 반환 전 단위 나눗셈을 재검증합니다. 검증 실패는 내부 결함이므로
//! 조용히 더 절삭하지 않고 `Invariant` 에러로 크게 실패합니다.

use rust_decimal::Decimal;

use bracket_core::{ExecutionError, MinQuantityPolicy, Side, SymbolRule};

/// `value` 이하의 가장 큰 `step` 배수.
///
/// 항상 내림입니다 - 올림은 의도한 자본 노출을 초과할 수 있습니다.
pub fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    (value / step).floor() * step
}

/// 주문 수량 계산.
///
/// `exposure = capital × leverage`, `raw = exposure / entry_price`를
/// `quantity_step` 배수로 내림합니다. 내림 결과가 0 이하이면(진입가가
/// 너무 높아 노출이 한 단위에 못 미치는 경우) `policy`에 따라 한 단위로
/// 보정하거나 거부합니다.
///
/// # Errors
///
/// - `Validation`: 0 이하의 진입가/자본, 레버리지 0, 또는 `Reject`
///   정책에서 수량이 한 단위에 못 미치는 경우
/// - `Invariant`: 결과가 단위 나눗셈 검사에 실패 (내부 결함)
pub fn compute_quantity(
    entry_price: Decimal,
    rule: &SymbolRule,
    capital: Decimal,
    leverage: u32,
    policy: MinQuantityPolicy,
) -> Result<Decimal, ExecutionError> {
    if entry_price <= Decimal::ZERO {
        return Err(ExecutionError::Validation(format!(
            "진입가는 양수여야 합니다: {entry_price}"
        )));
    }
    if capital <= Decimal::ZERO {
        return Err(ExecutionError::Validation(format!(
            "자본은 양수여야 합니다: {capital}"
        )));
    }
    if leverage == 0 {
        return Err(ExecutionError::Validation("레버리지는 1 이상이어야 합니다".into()));
    }

    let step = rule.quantity_step;
    let exposure = capital * Decimal::from(leverage);
    let raw_quantity = exposure / entry_price;

    let mut quantity = floor_to_step(raw_quantity, step);
    if quantity <= Decimal::ZERO {
        match policy {
            MinQuantityPolicy::ClampToStep => quantity = step,
            MinQuantityPolicy::Reject => {
                return Err(ExecutionError::Validation(format!(
                    "노출 {exposure}이 진입가 {entry_price}에서 한 단위({step})에 못 미칩니다"
                )));
            }
        }
    }

    ensure_step_aligned(quantity, step, "quantity")?;
    Ok(quantity)
}

/// TP/SL 가격 계산.
///
/// 매수: `tp = entry × (1 + tp_pct)`, `sl = entry × (1 − sl_pct)`.
/// 매도: 거울상. 두 값 모두 `price_tick` 배수로 내림합니다 - 의도보다
/// 경제적으로 유리한 TP/SL을 내는 일이 없도록 반올림이 아니라 내림입니다.
///
/// # Errors
///
/// - `Validation`: 0 이하의 진입가 또는 퍼센트
/// - `Invariant`: 결과가 단위 나눗셈 검사에 실패
pub fn compute_bracket(
    side: Side,
    entry_price: Decimal,
    tp_percent: Decimal,
    sl_percent: Decimal,
    rule: &SymbolRule,
) -> Result<(Decimal, Decimal), ExecutionError> {
    if entry_price <= Decimal::ZERO {
        return Err(ExecutionError::Validation(format!(
            "진입가는 양수여야 합니다: {entry_price}"
        )));
    }
    if tp_percent <= Decimal::ZERO || sl_percent <= Decimal::ZERO {
        return Err(ExecutionError::Validation(format!(
            "TP/SL 비율은 양수여야 합니다: tp={tp_percent}, sl={sl_percent}"
        )));
    }

    let one = Decimal::ONE;
    let (raw_tp, raw_sl) = match side {
        Side::Buy => (
            entry_price * (one + tp_percent),
            entry_price * (one - sl_percent),
        ),
        Side::Sell => (
            entry_price * (one - tp_percent),
            entry_price * (one + sl_percent),
        ),
    };

    let tick = rule.price_tick;
    let take_profit = floor_to_step(raw_tp, tick);
    let stop_loss = floor_to_step(raw_sl, tick);

    ensure_step_aligned(take_profit, tick, "take_profit")?;
    ensure_step_aligned(stop_loss, tick, "stop_loss")?;

    Ok((take_profit, stop_loss))
}

/// 단위 나눗셈 불변식 검증.
fn ensure_step_aligned(
    value: Decimal,
    step: Decimal,
    field: &str,
) -> Result<(), ExecutionError> {
    if (value % step).is_zero() {
        Ok(())
    } else {
        Err(ExecutionError::Invariant(format!(
            "{field} {value}이 단위 {step}로 나누어떨어지지 않습니다"
        )))
    }
}
