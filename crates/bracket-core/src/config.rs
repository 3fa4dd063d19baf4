//! 프로세스 설정.
//!
//! 환경 변수에서 한 번 로드되고 프로세스 수명 동안 불변으로 취급됩니다.
//! `.env` 파일 로딩(dotenvy)은 바이너리 진입점의 책임입니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;

use crate::error::ExecutionError;

// =============================================================================
// 운영 모드
// =============================================================================

/// 운영 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// 실거래 - 주문이 실제로 전송됩니다.
    Live,
    /// 드라이런 - 사이징/브라켓 계산/서명까지 수행하고 전송만 생략합니다.
    DryRun,
}

/// 동일 방향 중복 신호 처리 정책.
///
/// 소스 이터레이션마다 의도가 달랐던 부분이라 정책으로 분리했습니다.
/// 기본값은 더 안전한 `Ignore`입니다 (웹훅 재전송으로 노출이 2배가
/// 되는 것을 방지).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// 무시하고 AlreadyPositioned 보고 (기본값)
    #[default]
    Ignore,
    /// 기존 포지션을 청산하고 새로 진입
    Replace,
}

/// 내림 결과가 0 이하일 때의 수량 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinQuantityPolicy {
    /// 최소 한 단위로 보정 (기본값 - 신호 유실보다 최소 포지션 선호)
    #[default]
    ClampToStep,
    /// 검증 에러로 거부
    Reject,
}

// =============================================================================
// 설정
// =============================================================================

/// 애플리케이션 설정.
pub struct AppConfig {
    /// 운영 모드 (live / dry-run)
    pub mode: OperatingMode,
    /// CoinDCX API 키
    pub api_key: String,
    /// CoinDCX API 시크릿
    pub api_secret: SecretString,
    /// 기본 투입 자본 (USDT)
    pub capital: Decimal,
    /// 기본 레버리지
    pub leverage: u32,
    /// 익절 비율 (예: 0.04 = 4%)
    pub tp_percent: Decimal,
    /// 손절 비율 (예: 0.05 = 5%)
    pub sl_percent: Decimal,
    /// 동일 방향 중복 신호 정책
    pub duplicate_policy: DuplicatePolicy,
    /// 최소 수량 정책
    pub min_quantity_policy: MinQuantityPolicy,
    /// 리스너 바인딩 호스트
    pub host: String,
    /// 리스너 바인딩 포트
    pub port: u16,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("capital", &self.capital)
            .field("leverage", &self.leverage)
            .field("tp_percent", &self.tp_percent)
            .field("sl_percent", &self.sl_percent)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("min_quantity_policy", &self.min_quantity_policy)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl AppConfig {
    /// 환경 변수에서 설정 로드.
    ///
    /// 미설정 항목은 기본값을 사용하지만, 설정되었는데 파싱이 불가능한
    /// 값은 조용히 기본값으로 대체하지 않고 `Configuration` 에러를
    /// 반환합니다 - 머니 계산의 입력이기 때문입니다.
    ///
    /// # Errors
    ///
    /// - 실거래 모드에서 `COINDCX_KEY` / `COINDCX_SECRET` 누락
    /// - 숫자/정책 값 파싱 실패
    pub fn from_env() -> Result<Self, ExecutionError> {
        let mode = if parse_env_or("TEST_MODE", true)? {
            OperatingMode::DryRun
        } else {
            OperatingMode::Live
        };

        let api_key = std::env::var("COINDCX_KEY").unwrap_or_default();
        let api_secret = std::env::var("COINDCX_SECRET").unwrap_or_default();

        if mode == OperatingMode::Live && (api_key.is_empty() || api_secret.is_empty()) {
            return Err(ExecutionError::Configuration(
                "실거래 모드에는 COINDCX_KEY / COINDCX_SECRET이 필요합니다".to_string(),
            ));
        }

        Ok(Self {
            mode,
            api_key,
            api_secret: SecretString::from(api_secret),
            capital: parse_env_or("CAPITAL_USDT", dec!(5))?,
            leverage: parse_env_or("LEVERAGE", 5u32)?,
            tp_percent: parse_env_or("TP_PERCENT", dec!(0.04))?,
            sl_percent: parse_env_or("SL_PERCENT", dec!(0.05))?,
            duplicate_policy: parse_duplicate_policy()?,
            min_quantity_policy: parse_min_quantity_policy()?,
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or("API_PORT", 9000u16)?,
        })
    }

    /// 드라이런 모드 여부.
    pub fn is_dry_run(&self) -> bool {
        self.mode == OperatingMode::DryRun
    }
}

// =============================================================================
// 파싱 헬퍼
// =============================================================================

/// 환경 변수를 파싱하고, 미설정이면 기본값을 반환.
///
/// 설정되었는데 파싱 불가능하면 에러 - 잘못 입력된 자본/레버리지가
/// 기본값으로 둔갑하는 것을 막습니다.
fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ExecutionError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            ExecutionError::Configuration(format!("{key} 값을 파싱할 수 없습니다: {raw:?}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_duplicate_policy() -> Result<DuplicatePolicy, ExecutionError> {
    match std::env::var("DUPLICATE_POLICY") {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "ignore" => Ok(DuplicatePolicy::Ignore),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(ExecutionError::Configuration(format!(
                "DUPLICATE_POLICY는 ignore | replace 중 하나여야 합니다: {other:?}"
            ))),
        },
        Err(_) => Ok(DuplicatePolicy::default()),
    }
}

fn parse_min_quantity_policy() -> Result<MinQuantityPolicy, ExecutionError> {
    match std::env::var("MIN_QTY_POLICY") {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "clamp" => Ok(MinQuantityPolicy::ClampToStep),
            "reject" => Ok(MinQuantityPolicy::Reject),
            other => Err(ExecutionError::Configuration(format!(
                "MIN_QTY_POLICY는 clamp | reject 중 하나여야 합니다: {other:?}"
            ))),
        },
        Err(_) => Ok(MinQuantityPolicy::default()),
    }
}
