//! 선물 거래소 추상화.
//!
//! 실행 엔진과 리컨실러는 이 trait만 의존합니다. 실제 거래소 커넥터
//! (bracket-exchange의 CoindcxClient)가 이를 구현하며, 테스트에서는
//! 호출 순서를 기록하는 mock 구현을 주입합니다.

use async_trait::async_trait;
use thiserror::Error;

use super::order::BracketOrder;
use super::position::FuturesPosition;

// =============================================================================
// 에러 타입
// =============================================================================

/// 거래소 통신 에러.
///
/// 전송 계층에서 발생하는 모든 실패를 분류합니다. 엔진 경계에서
/// `ExecutionError::Transport`로 접힙니다.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크 연결 실패
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 시간 초과
    #[error("요청 시간 초과: {0}")]
    Timeout(String),

    /// 인증 실패 (서명 불일치, API 키 오류)
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// 거래소 API 에러 (non-2xx 응답)
    #[error("API 에러 (status {status}): {body}")]
    Api { status: u16, body: String },

    /// 응답 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),
}

// =============================================================================
// 주문 결과
// =============================================================================

/// 주문/청산 전송 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAck {
    /// 거래소가 수신을 확인한 주문
    Submitted {
        /// HTTP 상태 코드
        status: u16,
        /// 원본 응답 본문 (로깅 이외 용도로 보관하지 않음)
        body: String,
    },
    /// 드라이런 모드 - 요청은 구성/로깅되었으나 전송되지 않음
    DryRun,
}

impl OrderAck {
    /// 실제로 거래소에 전송되었는지 여부.
    pub fn was_sent(&self) -> bool {
        matches!(self, OrderAck::Submitted { .. })
    }
}

// =============================================================================
// FuturesExchange Trait
// =============================================================================

/// 선물 거래소 주문/포지션 인터페이스.
///
/// 세 가지 연산 모두 서명된 HTTPS POST 한 번에 대응합니다.
/// 구현체는 자동 재시도를 하지 않아야 합니다 - 재전송된 시장가 주문은
/// 멱등한 반복이 아니라 별개의 금융 행위입니다.
#[async_trait]
pub trait FuturesExchange: Send + Sync {
    /// 브라켓 주문 생성.
    ///
    /// 드라이런 모드에서는 전송 직전에 중단하고 `OrderAck::DryRun`을
    /// 반환해야 합니다.
    ///
    /// # Errors
    ///
    /// - `ExchangeError::Network` / `Timeout`: 전송 실패
    /// - `ExchangeError::Authentication`: 서명 거절
    /// - `ExchangeError::Api`: non-2xx 응답
    async fn create_order(&self, order: &BracketOrder) -> Result<OrderAck, ExchangeError>;

    /// 계정의 현재 포지션 목록 조회.
    ///
    /// 읽기 전용이므로 드라이런 모드에서도 실제로 조회합니다.
    async fn list_positions(&self) -> Result<Vec<FuturesPosition>, ExchangeError>;

    /// 포지션 전량 청산 (시장가).
    ///
    /// 드라이런 모드에서는 전송 직전에 중단하고 `OrderAck::DryRun`을
    /// 반환해야 합니다.
    async fn exit_position(&self, position_id: &str) -> Result<OrderAck, ExchangeError>;

    /// 거래소 이름.
    fn exchange_name(&self) -> &str;
}
