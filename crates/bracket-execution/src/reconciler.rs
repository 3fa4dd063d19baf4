//! 포지션 리컨실러.
//!
//! 새 포지션을 열기 전에 거래소의 현재 포지션을 확인하고,
//! 반대 방향 포지션이 있으면 먼저 청산합니다. 같은 페어에 반대 방향
//! 노출이 동시에 존재하는 상태는 거래소가 거절할 수도, 안 할 수도
//! 있지만 어느 쪽이든 여기서 의도한 경제적 상태가 아닙니다.
//!
//! 조회/청산 실패는 삼키지 않고 전파합니다 - 기존 포지션이 닫혔는지
//! 확인하지 못한 채 새 포지션을 열면 의도하지 않은 순노출이 생깁니다.

use std::sync::Arc;

use tracing::{debug, info};

use bracket_core::{DuplicatePolicy, ExecutionError, FuturesExchange, Side};

/// 리컨실 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// 진입 가능 (필요한 청산은 완료됨)
    Proceed,
    /// 같은 방향 포지션이 이미 존재 - 호출자는 중복 진입하면 안 됨
    AlreadyPositioned,
}

/// 포지션 리컨실러.
pub struct PositionReconciler {
    exchange: Arc<dyn FuturesExchange>,
    duplicate_policy: DuplicatePolicy,
}

impl PositionReconciler {
    /// 새 리컨실러 생성.
    pub fn new(exchange: Arc<dyn FuturesExchange>, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            exchange,
            duplicate_policy,
        }
    }

    /// 진입 전 리컨실.
    ///
    /// 1. 계정의 전체 포지션을 조회하고 `pair`와 일치하며 크기가 0이
    ///    아닌 것을 찾습니다.
    /// 2. 없으면 `Proceed`.
    /// 3. 같은 방향이면 정책에 따라 `AlreadyPositioned`(기본) 또는
    ///    청산 후 `Proceed`(Replace).
    /// 4. 반대 방향이면 전량 시장가 청산을 요청하고 거래소 확인을
    ///    기다린 뒤 `Proceed`.
    ///
    /// # Errors
    ///
    /// 포지션 조회 또는 청산 중의 거래소 에러는 그대로 전파됩니다.
    pub async fn reconcile_before_open(
        &self,
        pair: &str,
        desired_side: Side,
    ) -> Result<ReconcileOutcome, ExecutionError> {
        let positions = self.exchange.list_positions().await?;

        let existing = positions
            .into_iter()
            .find(|p| p.pair == pair && p.is_open());

        let Some(position) = existing else {
            debug!(pair, "기존 포지션 없음");
            return Ok(ReconcileOutcome::Proceed);
        };

        if position.side == desired_side {
            match self.duplicate_policy {
                DuplicatePolicy::Ignore => {
                    info!(
                        pair,
                        side = %desired_side,
                        size = %position.size,
                        "같은 방향 포지션 존재 - 중복 진입 무시"
                    );
                    return Ok(ReconcileOutcome::AlreadyPositioned);
                }
                DuplicatePolicy::Replace => {
                    info!(
                        pair,
                        position_id = %position.id,
                        "같은 방향 포지션 교체 - 청산 후 재진입"
                    );
                    self.exchange.exit_position(&position.id).await?;
                    return Ok(ReconcileOutcome::Proceed);
                }
            }
        }

        // 반대 방향: 먼저 청산하고 확인을 기다린 뒤 진입
        info!(
            pair,
            position_id = %position.id,
            existing_side = %position.side,
            desired_side = %desired_side,
            size = %position.size,
            "반대 방향 포지션 청산"
        );
        self.exchange.exit_position(&position.id).await?;

        Ok(ReconcileOutcome::Proceed)
    }
}
