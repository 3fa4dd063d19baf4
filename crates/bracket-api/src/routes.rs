//! 웹훅 라우트.
//!
//! `POST /webhook` 하나가 유일한 진입점입니다. 본문 파싱과 필드 검증은
//! 전부 여기서 끝나며, 엔진은 형식이 깨진 입력을 절대 보지 않습니다.
//!
//! 응답은 항상 HTTP 200입니다. 파싱 실패든 엔진 에러든 JSON의
//! `status` 필드로만 구분합니다 - 업스트림 신호 소스는 에러 응답을
//! 용납하지 않기 때문입니다. 에러 자체는 tracing으로 전부 기록됩니다.

use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use bracket_core::{Side, TradeSignal};
use bracket_execution::ExecutionOutcome;

use crate::state::AppState;

// ==================== Request/Response 타입 ====================

/// TradingView 알림 본문.
#[derive(Debug, Deserialize)]
pub struct WebhookAlert {
    /// "BUY" | "SELL" | "EXIT"
    pub signal: String,
    /// 거래 심볼 (예: BTCUSDT.P)
    pub symbol: String,
    /// 알림 시점 가격. EXIT에는 필요 없음.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// 웹훅 응답. HTTP 상태는 항상 200.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// "ok" | "ignored" | "rejected" | "error"
    pub status: &'static str,
    /// 사람이 읽을 부가 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl WebhookResponse {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok",
            detail: Some(detail.into()),
        }
    }

    fn ignored(detail: impl Into<String>) -> Self {
        Self {
            status: "ignored",
            detail: Some(detail.into()),
        }
    }

    fn rejected(detail: impl Into<String>) -> Self {
        Self {
            status: "rejected",
            detail: Some(detail.into()),
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error",
            detail: Some(detail.into()),
        }
    }
}

// ==================== 핸들러 ====================

/// 웹훅 수신 핸들러.
///
/// 본문을 직접 파싱합니다 - extractor 거부가 4xx로 새어 나가지 않도록
/// 실패해도 200 + `rejected`로 응답합니다.
async fn webhook(State(state): State<AppState>, body: String) -> Json<WebhookResponse> {
    let alert: WebhookAlert = match serde_json::from_str(&body) {
        Ok(alert) => alert,
        Err(e) => {
            warn!("웹훅 본문 파싱 실패: {e}. 본문: {body}");
            return Json(WebhookResponse::rejected(format!("malformed body: {e}")));
        }
    };

    info!(
        signal = %alert.signal,
        symbol = %alert.symbol,
        price = ?alert.price,
        "웹훅 수신"
    );

    let side = match alert.signal.to_uppercase().as_str() {
        "BUY" => Side::Buy,
        "SELL" => Side::Sell,
        "EXIT" => return handle_exit(&state, &alert.symbol).await,
        other => {
            warn!(signal = other, "알 수 없는 신호 값");
            return Json(WebhookResponse::rejected(format!("unknown signal: {other}")));
        }
    };

    let Some(price) = alert.price else {
        warn!(symbol = %alert.symbol, "price 필드 누락");
        return Json(WebhookResponse::rejected("missing price"));
    };

    let signal = TradeSignal::new(side, alert.symbol, price);
    match state.engine.execute(&signal).await {
        Ok(ExecutionOutcome::Placed { order, ack }) => Json(WebhookResponse::ok(format!(
            "{} {} x{} (sent: {})",
            order.pair,
            order.total_quantity,
            order.leverage,
            ack.was_sent()
        ))),
        Ok(ExecutionOutcome::AlreadyPositioned { pair, side }) => {
            Json(WebhookResponse::ignored(format!(
                "already positioned: {pair} {side}"
            )))
        }
        Err(e) => {
            // 엔진 에러는 여기서 흡수된다. 업스트림에는 200을 돌려주고
            // 운영자는 로그로 파악한다.
            error!(kind = e.kind(), "실행 실패: {e}");
            Json(WebhookResponse::error(e.kind()))
        }
    }
}

async fn handle_exit(state: &AppState, symbol: &str) -> Json<WebhookResponse> {
    match state.engine.exit(symbol).await {
        Ok(acks) if acks.is_empty() => Json(WebhookResponse::ignored("no open position")),
        Ok(acks) => Json(WebhookResponse::ok(format!("closed {} position(s)", acks.len()))),
        Err(e) => {
            error!(kind = e.kind(), "EXIT 처리 실패: {e}");
            Json(WebhookResponse::error(e.kind()))
        }
    }
}

/// 헬스 체크.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "up",
        "exchange": state.engine.exchange_name(),
    }))
}

// ==================== 라우터 ====================

/// 라우터 구성.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    use bracket_core::domain::order::BracketOrder;
    use bracket_core::{
        DuplicatePolicy, ExchangeError, FuturesExchange, FuturesPosition, MinQuantityPolicy,
        OrderAck, SymbolRuleTable,
    };
    use bracket_execution::{ExecutionEngine, RiskParams};

    use super::*;

    /// 아무것도 전송하지 않는 테스트 거래소.
    struct NullExchange;

    #[async_trait]
    impl FuturesExchange for NullExchange {
        async fn create_order(&self, _order: &BracketOrder) -> Result<OrderAck, ExchangeError> {
            Ok(OrderAck::DryRun)
        }

        async fn list_positions(&self) -> Result<Vec<FuturesPosition>, ExchangeError> {
            Ok(vec![])
        }

        async fn exit_position(&self, _position_id: &str) -> Result<OrderAck, ExchangeError> {
            Ok(OrderAck::DryRun)
        }

        fn exchange_name(&self) -> &str {
            "Null"
        }
    }

    fn test_app() -> Router {
        let engine = ExecutionEngine::new(
            Arc::new(NullExchange),
            SymbolRuleTable::builtin(),
            RiskParams {
                capital: dec!(5),
                leverage: 5,
                tp_percent: dec!(0.04),
                sl_percent: dec!(0.05),
                min_quantity_policy: MinQuantityPolicy::ClampToStep,
            },
            DuplicatePolicy::Ignore,
        );
        create_router(AppState::new(Arc::new(engine)))
    }

    async fn post_webhook(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_buy_signal_acknowledged() {
        let (status, json) = post_webhook(
            test_app(),
            r#"{"signal":"BUY","symbol":"BTCUSDT.P","price":50000}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_body_still_200() {
        let (status, json) = post_webhook(test_app(), "not-json-at-all").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "rejected");
    }

    #[tokio::test]
    async fn test_unknown_signal_rejected() {
        let (status, json) = post_webhook(
            test_app(),
            r#"{"signal":"HOLD","symbol":"BTCUSDT","price":50000}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "rejected");
    }

    #[tokio::test]
    async fn test_missing_price_rejected() {
        let (status, json) = post_webhook(
            test_app(),
            r#"{"signal":"SELL","symbol":"BTCUSDT"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "rejected");
    }

    #[tokio::test]
    async fn test_unknown_symbol_maps_to_error_status() {
        // 엔진의 Configuration 에러가 200 + error로 흡수되는지 확인
        let (status, json) = post_webhook(
            test_app(),
            r#"{"signal":"BUY","symbol":"UNKNOWNUSDT","price":100}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "error");
        assert_eq!(json["detail"], "configuration");
    }

    #[tokio::test]
    async fn test_exit_without_position_ignored() {
        let (status, json) = post_webhook(
            test_app(),
            r#"{"signal":"EXIT","symbol":"BTCUSDT"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ignored");
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
