//! 주문 실행 엔진.
//!
//! 실행 한 건의 상태 흐름:
//!
//! ```text
//! Idle → Reconciling → Sizing → Dispatching → Done | Rejected | Failed
//! ```
//!
//! 엔진은 호출 간 상태를 갖지 않습니다. 권위 있는 상태는 거래소의
//! 포지션 장부이며 매 실행마다 다시 읽습니다. 어떤 단계도 자동
//! 재시도하지 않습니다 - `execute` 호출 하나가 원자적 시도 하나입니다.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use bracket_core::domain::symbol;
use bracket_core::{
    AppConfig, BracketOrder, DuplicatePolicy, ExecutionError, FuturesExchange,
    MinQuantityPolicy, OrderAck, Side, SymbolRuleTable, TradeSignal,
};

use crate::reconciler::{PositionReconciler, ReconcileOutcome};
use crate::sizing::{compute_bracket, compute_quantity};

// =============================================================================
// 리스크 파라미터
// =============================================================================

/// 사이징에 쓰이는 전역 리스크 파라미터.
///
/// 심볼 규칙에 자본/레버리지 재정의가 있으면 그쪽이 우선합니다.
#[derive(Debug, Clone)]
pub struct RiskParams {
    /// 기본 투입 자본 (USDT)
    pub capital: Decimal,
    /// 기본 레버리지
    pub leverage: u32,
    /// 익절 비율
    pub tp_percent: Decimal,
    /// 손절 비율
    pub sl_percent: Decimal,
    /// 최소 수량 정책
    pub min_quantity_policy: MinQuantityPolicy,
}

impl RiskParams {
    /// 앱 설정에서 생성.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            capital: config.capital,
            leverage: config.leverage,
            tp_percent: config.tp_percent,
            sl_percent: config.sl_percent,
            min_quantity_policy: config.min_quantity_policy,
        }
    }
}

// =============================================================================
// 실행 결과
// =============================================================================

/// 실행 한 건의 종료 상태.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Done - 주문이 전송(또는 드라이런 단락)됨
    Placed {
        /// 전송된 브라켓 주문
        order: BracketOrder,
        /// 거래소 확인
        ack: OrderAck,
    },
    /// Rejected - 같은 방향 포지션이 이미 존재해 중복 진입을 거부
    AlreadyPositioned {
        /// 선물 페어
        pair: String,
        /// 요청된 방향
        side: Side,
    },
}

// =============================================================================
// 심볼 잠금
// =============================================================================

/// 심볼별 직렬화 잠금 레지스트리.
///
/// 같은 심볼에 대한 두 `execute`가 리컨실→사이징→전송을 동시에
/// 통과하면 둘 다 "반대 포지션 없음"을 관측한 뒤 중복/상충 주문을
/// 낼 수 있습니다. 잠금은 `execute` 전체 구간 동안 유지되며,
/// 서로 다른 심볼은 완전히 병렬로 진행합니다.
struct SymbolLocks {
    inner: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SymbolLocks {
    fn new() -> Self {
        Self {
            inner: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, symbol: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().await;
            registry
                .entry(symbol.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

// =============================================================================
// 엔진
// =============================================================================

/// 포지션 인지 주문 실행 엔진 - 조합 루트.
pub struct ExecutionEngine {
    exchange: Arc<dyn FuturesExchange>,
    rules: SymbolRuleTable,
    risk: RiskParams,
    reconciler: PositionReconciler,
    locks: SymbolLocks,
}

impl ExecutionEngine {
    /// 새 엔진 생성.
    pub fn new(
        exchange: Arc<dyn FuturesExchange>,
        rules: SymbolRuleTable,
        risk: RiskParams,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        let reconciler = PositionReconciler::new(Arc::clone(&exchange), duplicate_policy);
        Self {
            exchange,
            rules,
            risk,
            reconciler,
            locks: SymbolLocks::new(),
        }
    }

    /// 신호 한 건 실행.
    ///
    /// 검증 → 심볼 잠금 → 리컨실 → 사이징 → 브라켓 구성 → 전송.
    ///
    /// # Errors
    ///
    /// - `Validation`: 0 이하의 가격
    /// - `Configuration`: 미등록 심볼 (거래소 호출 전에 실패)
    /// - `Transport`: 포지션 조회/청산/주문 전송 실패
    /// - `Invariant`: 수량/가격 단위 검증 실패 (전송 전에 중단)
    pub async fn execute(
        &self,
        signal: &TradeSignal,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let side = signal.side;
        let price = signal.price;

        if price <= Decimal::ZERO {
            return Err(ExecutionError::Validation(format!(
                "가격은 양수여야 합니다: {price}"
            )));
        }

        let normalized = symbol::normalize(&signal.symbol);
        let rule = self.rules.lookup(&normalized).ok_or_else(|| {
            ExecutionError::Configuration(format!(
                "심볼 규칙 미등록: {normalized} - 단위를 모른 채 주문하지 않습니다"
            ))
        })?;

        // 같은 심볼의 동시 실행 직렬화. 가드는 함수 종료까지 유지.
        let _guard = self.locks.acquire(&normalized).await;

        let pair = symbol::futures_pair(&normalized);
        info!(symbol = %normalized, pair = %pair, side = %side, %price, "신호 실행 시작");

        // Reconciling
        let outcome = self.reconciler.reconcile_before_open(&pair, side).await?;
        if outcome == ReconcileOutcome::AlreadyPositioned {
            return Ok(ExecutionOutcome::AlreadyPositioned { pair, side });
        }

        // Sizing - 심볼 재정의가 전역 리스크 파라미터에 우선
        let capital = rule.capital_override.unwrap_or(self.risk.capital);
        let leverage = rule.leverage_override.unwrap_or(self.risk.leverage);

        let quantity = compute_quantity(
            price,
            rule,
            capital,
            leverage,
            self.risk.min_quantity_policy,
        )?;
        let (take_profit, stop_loss) = compute_bracket(
            side,
            price,
            self.risk.tp_percent,
            self.risk.sl_percent,
            rule,
        )?;

        let order = BracketOrder {
            side,
            pair,
            total_quantity: quantity,
            leverage,
            take_profit_price: take_profit,
            stop_loss_price: stop_loss,
        };

        // Dispatching
        let ack = self.exchange.create_order(&order).await?;
        info!(
            pair = %order.pair,
            quantity = %order.total_quantity,
            sent = ack.was_sent(),
            "실행 완료"
        );

        Ok(ExecutionOutcome::Placed { order, ack })
    }

    /// 심볼의 열린 포지션 전부 청산.
    ///
    /// EXIT 신호 처리용입니다. 페어가 일치하고 크기가 0이 아닌 모든
    /// 포지션에 청산을 요청하고 확인 목록을 반환합니다.
    pub async fn exit(&self, raw_symbol: &str) -> Result<Vec<OrderAck>, ExecutionError> {
        let normalized = symbol::normalize(raw_symbol);
        let _guard = self.locks.acquire(&normalized).await;

        let pair = symbol::futures_pair(&normalized);
        let positions = self.exchange.list_positions().await?;

        let mut acks = Vec::new();
        for position in positions.iter().filter(|p| p.pair == pair && p.is_open()) {
            info!(
                pair = %pair,
                position_id = %position.id,
                size = %position.size,
                "EXIT 신호 - 포지션 청산"
            );
            acks.push(self.exchange.exit_position(&position.id).await?);
        }

        if acks.is_empty() {
            warn!(pair = %pair, "EXIT 신호 - 청산할 포지션 없음");
        }
        Ok(acks)
    }

    /// 거래소 이름 (로깅/상태 응답용).
    pub fn exchange_name(&self) -> &str {
        self.exchange.exchange_name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use bracket_core::{ExchangeError, FuturesPosition, SymbolRule};

    use super::*;

    /// 주문이 포지션으로 반영되는 상태 있는 테스트 거래소.
    struct StatefulExchange {
        positions: Mutex<Vec<FuturesPosition>>,
        calls: Mutex<Vec<String>>,
        fail_create: bool,
        create_delay: Option<Duration>,
        next_id: Mutex<u32>,
    }

    impl StatefulExchange {
        fn new(positions: Vec<FuturesPosition>) -> Self {
            Self {
                positions: Mutex::new(positions),
                calls: Mutex::new(Vec::new()),
                fail_create: false,
                create_delay: None,
                next_id: Mutex::new(1),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl FuturesExchange for StatefulExchange {
        async fn create_order(&self, order: &BracketOrder) -> Result<OrderAck, ExchangeError> {
            self.record(format!("create:{}:{}", order.pair, order.side));
            if let Some(delay) = self.create_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_create {
                return Err(ExchangeError::Api {
                    status: 400,
                    body: "rejected".to_string(),
                });
            }

            let id = {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                format!("pos-{}", *next - 1)
            };
            self.positions.lock().unwrap().push(FuturesPosition {
                id,
                pair: order.pair.clone(),
                side: order.side,
                size: order.total_quantity,
                avg_price: dec!(0),
            });

            Ok(OrderAck::Submitted {
                status: 200,
                body: "{}".to_string(),
            })
        }

        async fn list_positions(&self) -> Result<Vec<FuturesPosition>, ExchangeError> {
            self.record("list".to_string());
            Ok(self.positions.lock().unwrap().clone())
        }

        async fn exit_position(&self, position_id: &str) -> Result<OrderAck, ExchangeError> {
            self.record(format!("exit:{position_id}"));
            self.positions
                .lock()
                .unwrap()
                .retain(|p| p.id != position_id);
            Ok(OrderAck::Submitted {
                status: 200,
                body: "{}".to_string(),
            })
        }

        fn exchange_name(&self) -> &str {
            "Stateful"
        }
    }

    fn test_rules() -> SymbolRuleTable {
        let mut rules = SymbolRuleTable::new();
        rules.insert("BTCUSDT", SymbolRule::new(dec!(0.001), dec!(0.1)));
        rules.insert("ETHUSDT", SymbolRule::new(dec!(0.001), dec!(0.01)));
        rules
    }

    fn test_risk() -> RiskParams {
        RiskParams {
            capital: dec!(5),
            leverage: 5,
            tp_percent: dec!(0.04),
            sl_percent: dec!(0.05),
            min_quantity_policy: MinQuantityPolicy::ClampToStep,
        }
    }

    fn engine_with(
        exchange: Arc<StatefulExchange>,
        rules: SymbolRuleTable,
        policy: DuplicatePolicy,
    ) -> ExecutionEngine {
        ExecutionEngine::new(exchange, rules, test_risk(), policy)
    }

    fn seeded_long() -> FuturesPosition {
        FuturesPosition {
            id: "pos-0".to_string(),
            pair: "B-BTC_USDT".to_string(),
            side: Side::Buy,
            size: dec!(0.001),
            avg_price: dec!(50000),
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_fails_closed() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let result = engine.execute(&TradeSignal::new(Side::Buy, "UNKNOWNUSDT", dec!(100))).await;

        assert!(matches!(result, Err(ExecutionError::Configuration(_))));
        // 거래소 호출 0건
        assert!(exchange.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_price_rejected() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let result = engine.execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(0))).await;

        assert!(matches!(result, Err(ExecutionError::Validation(_))));
        assert!(exchange.calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_signal_places_worked_example_order() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let outcome = engine
            .execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();

        let ExecutionOutcome::Placed { order, ack } = outcome else {
            panic!("Placed를 기대");
        };
        // 자본 5 × 5배 = 25 / 50000 = 0.0005 → 한 단위 보정 0.001
        assert_eq!(order.total_quantity, dec!(0.001));
        assert_eq!(order.take_profit_price, dec!(52000.0));
        assert_eq!(order.stop_loss_price, dec!(47500.0));
        assert_eq!(order.pair, "B-BTC_USDT");
        assert_eq!(order.leverage, 5);
        assert!(ack.was_sent());
        assert_eq!(exchange.calls(), vec!["list", "create:B-BTC_USDT:buy"]);
    }

    #[tokio::test]
    async fn test_duplicate_signal_is_idempotent_noop() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let first = engine
            .execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();
        assert!(matches!(first, ExecutionOutcome::Placed { .. }));

        let second = engine
            .execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();
        assert!(matches!(
            second,
            ExecutionOutcome::AlreadyPositioned { .. }
        ));

        // 주문 생성은 정확히 1건
        let creates = exchange
            .calls()
            .iter()
            .filter(|c| c.starts_with("create"))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_flip_closes_opposing_then_opens() {
        let exchange = Arc::new(StatefulExchange::new(vec![seeded_long()]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let outcome = engine
            .execute(&TradeSignal::new(Side::Sell, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();

        let ExecutionOutcome::Placed { order, .. } = outcome else {
            panic!("Placed를 기대");
        };
        assert_eq!(order.side, Side::Sell);
        // 정확한 호출 순서: 조회 → 청산 → 생성
        assert_eq!(
            exchange.calls(),
            vec!["list", "exit:pos-0", "create:B-BTC_USDT:sell"]
        );
    }

    #[tokio::test]
    async fn test_replace_policy_reopens_same_side() {
        let exchange = Arc::new(StatefulExchange::new(vec![seeded_long()]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Replace);

        let outcome = engine
            .execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();

        assert!(matches!(outcome, ExecutionOutcome::Placed { .. }));
        assert_eq!(
            exchange.calls(),
            vec!["list", "exit:pos-0", "create:B-BTC_USDT:buy"]
        );
    }

    #[tokio::test]
    async fn test_symbol_decoration_stripped() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let outcome = engine
            .execute(&TradeSignal::new(Side::Buy, "btcusdt.P", dec!(50000)))
            .await
            .unwrap();

        let ExecutionOutcome::Placed { order, .. } = outcome else {
            panic!("Placed를 기대");
        };
        assert_eq!(order.pair, "B-BTC_USDT");
    }

    #[tokio::test]
    async fn test_rule_overrides_take_precedence() {
        let mut rules = SymbolRuleTable::new();
        rules.insert(
            "BTCUSDT",
            SymbolRule::new(dec!(0.001), dec!(0.1)).with_overrides(dec!(13), 20),
        );
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), rules, DuplicatePolicy::Ignore);

        let outcome = engine
            .execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000)))
            .await
            .unwrap();

        let ExecutionOutcome::Placed { order, .. } = outcome else {
            panic!("Placed를 기대");
        };
        // 노출 13 × 20 = 260 / 50000 = 0.0052 → 0.005
        assert_eq!(order.total_quantity, dec!(0.005));
        assert_eq!(order.leverage, 20);
    }

    #[tokio::test]
    async fn test_dispatch_failure_propagates() {
        let mut exchange = StatefulExchange::new(vec![]);
        exchange.fail_create = true;
        let engine = engine_with(
            Arc::new(exchange),
            test_rules(),
            DuplicatePolicy::Ignore,
        );

        let result = engine.execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000))).await;
        assert!(matches!(result, Err(ExecutionError::Transport(_))));
    }

    #[tokio::test]
    async fn test_exit_closes_only_matching_pair() {
        let mut eth = seeded_long();
        eth.id = "pos-9".to_string();
        eth.pair = "B-ETH_USDT".to_string();
        let exchange = Arc::new(StatefulExchange::new(vec![seeded_long(), eth]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let acks = engine.exit("BTCUSDT").await.unwrap();

        assert_eq!(acks.len(), 1);
        assert_eq!(exchange.calls(), vec!["list", "exit:pos-0"]);
    }

    #[tokio::test]
    async fn test_exit_without_positions_is_noop() {
        let exchange = Arc::new(StatefulExchange::new(vec![]));
        let engine = engine_with(exchange.clone(), test_rules(), DuplicatePolicy::Ignore);

        let acks = engine.exit("BTCUSDT").await.unwrap();

        assert!(acks.is_empty());
        assert_eq!(exchange.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn test_same_symbol_executions_serialized() {
        // 첫 실행이 create에서 지연되는 동안 두 번째 실행이 끼어들면
        // 둘 다 "포지션 없음"을 관측해 중복 주문이 된다.
        // 잠금이 있으면 두 번째는 첫 실행 완료 후 조회를 시작한다.
        let mut exchange = StatefulExchange::new(vec![]);
        exchange.create_delay = Some(Duration::from_millis(50));
        let exchange = Arc::new(exchange);
        let engine = Arc::new(engine_with(
            exchange.clone(),
            test_rules(),
            DuplicatePolicy::Ignore,
        ));

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000))).await })
        };
        let second = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.execute(&TradeSignal::new(Side::Buy, "BTCUSDT", dec!(50000))).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let placed = results
            .iter()
            .filter(|r| matches!(r, Ok(ExecutionOutcome::Placed { .. })))
            .count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Ok(ExecutionOutcome::AlreadyPositioned { .. })))
            .count();

        assert_eq!(placed, 1);
        assert_eq!(rejected, 1);
        assert_eq!(
            exchange.calls(),
            vec!["list", "create:B-BTC_USDT:buy", "list"]
        );
    }
}
