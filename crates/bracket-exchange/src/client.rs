//! CoinDCX 선물 REST 클라이언트.
//!
//! 세 연산(주문 생성, 포지션 조회, 포지션 청산) 모두
//! 서명 → 전송(타임아웃 제한) → 파싱 순서로 수행합니다.
//! 자동 재시도는 하지 않습니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use bracket_core::domain::exchange::{ExchangeError, FuturesExchange, OrderAck};
use bracket_core::domain::order::BracketOrder;
use bracket_core::domain::position::FuturesPosition;
use bracket_core::{AppConfig, OperatingMode};

use crate::models::{CreateOrderRequest, ExitPositionRequest, ListPositionsRequest, PositionRecord};
use crate::sign::sign_body;

/// CoinDCX 운영 API 기본 URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coindcx.com";

/// 거래소 호출 타임아웃. 초과 시 `ExchangeError::Timeout`으로 표면화되며
/// 호출자를 무한정 기다리게 하지 않습니다.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ORDER_CREATE_PATH: &str = "/exchange/v1/derivatives/futures/orders/create";
const POSITIONS_PATH: &str = "/exchange/v1/derivatives/futures/positions";
const POSITION_EXIT_PATH: &str = "/exchange/v1/derivatives/futures/positions/exit";

// =============================================================================
// 설정
// =============================================================================

/// 클라이언트 설정.
#[derive(Clone)]
pub struct CoindcxConfig {
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: SecretString,
    /// API 기본 URL (테스트에서 mock 서버로 교체)
    pub base_url: String,
    /// 드라이런 여부 - true면 주문/청산을 전송하지 않음
    pub dry_run: bool,
}

impl std::fmt::Debug for CoindcxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoindcxConfig")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CoindcxConfig {
    /// 앱 설정에서 클라이언트 설정 생성.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dry_run: config.mode == OperatingMode::DryRun,
        }
    }
}

// =============================================================================
// 클라이언트
// =============================================================================

/// CoinDCX 선물 클라이언트.
pub struct CoindcxClient {
    http: Client,
    config: CoindcxConfig,
}

impl CoindcxClient {
    /// 새 클라이언트 생성.
    pub fn new(config: CoindcxConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            config,
        }
    }

    /// 서명된 POST 전송 후 (상태 코드, 본문) 반환.
    ///
    /// 서명한 문자열을 그대로 본문으로 보냅니다 - 재직렬화하면
    /// 서명이 무효화됩니다.
    async fn post_signed(
        &self,
        path: &str,
        payload: String,
        signature: String,
    ) -> Result<(u16, String), ExchangeError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-AUTH-APIKEY", &self.config.api_key)
            .header("X-AUTH-SIGNATURE", &signature)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExchangeError::Timeout(format!("{url}: {e}"))
                } else {
                    ExchangeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ExchangeError::Authentication(body));
            }
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok((status.as_u16(), body))
    }

    fn sign<T: serde::Serialize>(&self, body: &T) -> Result<crate::sign::SignedBody, ExchangeError> {
        sign_body(self.config.api_secret.expose_secret(), body)
    }
}

#[async_trait]
impl FuturesExchange for CoindcxClient {
    async fn create_order(&self, order: &BracketOrder) -> Result<OrderAck, ExchangeError> {
        let request = CreateOrderRequest::from_order(order, Utc::now().timestamp_millis());
        let signed = self.sign(&request)?;

        info!(
            pair = %order.pair,
            side = %order.side,
            quantity = %order.total_quantity,
            leverage = order.leverage,
            tp = %order.take_profit_price,
            sl = %order.stop_loss_price,
            "주문 페이로드: {}", signed.payload
        );

        if self.config.dry_run {
            info!(pair = %order.pair, "드라이런 - 주문 전송 생략");
            return Ok(OrderAck::DryRun);
        }

        let (status, body) = self
            .post_signed(ORDER_CREATE_PATH, signed.payload, signed.signature)
            .await?;

        info!(status, "주문 응답: {}", body);
        Ok(OrderAck::Submitted { status, body })
    }

    async fn list_positions(&self) -> Result<Vec<FuturesPosition>, ExchangeError> {
        let request = ListPositionsRequest::new(Utc::now().timestamp_millis());
        let signed = self.sign(&request)?;

        let (_, body) = self
            .post_signed(POSITIONS_PATH, signed.payload, signed.signature)
            .await?;

        let records: Vec<PositionRecord> = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Parse(format!("포지션 응답 파싱 실패: {e}. 본문: {body}")))?;

        Ok(records.into_iter().map(FuturesPosition::from).collect())
    }

    async fn exit_position(&self, position_id: &str) -> Result<OrderAck, ExchangeError> {
        let request = ExitPositionRequest {
            timestamp: Utc::now().timestamp_millis(),
            id: position_id.to_string(),
        };
        let signed = self.sign(&request)?;

        if self.config.dry_run {
            info!(position_id, "드라이런 - 청산 전송 생략");
            return Ok(OrderAck::DryRun);
        }

        let (status, body) = self
            .post_signed(POSITION_EXIT_PATH, signed.payload, signed.signature)
            .await?;

        if body.is_empty() {
            warn!(position_id, status, "청산 응답 본문이 비어 있음");
        }
        info!(position_id, status, "포지션 청산 확인");
        Ok(OrderAck::Submitted { status, body })
    }

    fn exchange_name(&self) -> &str {
        "CoinDCX"
    }
}
