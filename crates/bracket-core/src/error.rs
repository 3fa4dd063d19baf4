//! 실행 에러 분류 체계.
//!
//! 네 종류 모두 현재 `execute` 호출만 중단시키며, 호스트 프로세스를
//! 죽이지 않습니다. 어느 것도 자동 재시도되지 않습니다 - 재시도 정책은
//! 호출자(운영자)의 몫입니다.

use thiserror::Error;

use crate::domain::exchange::ExchangeError;

/// 실행 한 건을 중단시키는 에러.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 설정 오류 - 자격 증명 누락, 미등록 심볼 규칙.
    ///
    /// 머니 계산의 입력이 정의되지 않았다는 뜻이므로 절대
    /// 잡아서 무시하면 안 됩니다.
    #[error("설정 오류: {0}")]
    Configuration(String),

    /// 신호 검증 실패 - 0 이하의 가격 등.
    ///
    /// 엔진은 기본값을 추측하지 않고 호출자에게 그대로 드러냅니다.
    #[error("신호 검증 실패: {0}")]
    Validation(String),

    /// 거래소 통신 실패 - 네트워크, 타임아웃, non-2xx, 인증 거절.
    #[error("거래소 통신 실패: {0}")]
    Transport(#[from] ExchangeError),

    /// 불변식 위반 - 계산된 수량/가격이 단위 나눗셈 검사에 실패.
    ///
    /// 결함으로 취급합니다: 전체 컨텍스트와 함께 로깅하고 전송 전에
    /// 중단하며, 추가로 절삭하여 조용히 보정하지 않습니다.
    #[error("불변식 위반: {0}")]
    Invariant(String),
}

impl ExecutionError {
    /// 에러 종류 레이블 (로깅/응답용).
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Configuration(_) => "configuration",
            ExecutionError::Validation(_) => "validation",
            ExecutionError::Transport(_) => "transport",
            ExecutionError::Invariant(_) => "invariant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ExecutionError::Configuration("x".into()).kind(),
            "configuration"
        );
        assert_eq!(ExecutionError::Validation("x".into()).kind(), "validation");
        assert_eq!(ExecutionError::Invariant("x".into()).kind(), "invariant");
    }

    #[test]
    fn test_transport_from_exchange_error() {
        let err: ExecutionError = ExchangeError::Timeout("10s 초과".to_string()).into();
        assert_eq!(err.kind(), "transport");
        assert!(matches!(err, ExecutionError::Transport(_)));
    }
}
