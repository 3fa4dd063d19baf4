//! 브라켓 트레이더 진입점.
//!
//! 설정 로드 → 거래소 클라이언트/실행 엔진 구성 → 웹훅 리스너 시작.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use bracket_api::{create_router, AppState};
use bracket_core::{AppConfig, OperatingMode, SymbolRuleTable};
use bracket_exchange::{CoindcxClient, CoindcxConfig};
use bracket_execution::{ExecutionEngine, RiskParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // tracing 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bracket_api=info,bracket_execution=info,bracket_exchange=info,tower_http=info"
                    .into()
            }),
        )
        .init();

    let config = AppConfig::from_env().context("설정 로드 실패")?;
    info!(?config, "설정 로드 완료");

    match config.mode {
        OperatingMode::DryRun => {
            info!("드라이런 모드 - 주문은 구성/서명까지만 수행되고 전송되지 않습니다");
        }
        OperatingMode::Live => {
            warn!("실거래 모드 - 주문이 실제로 전송됩니다");
        }
    }

    let rules = SymbolRuleTable::builtin();
    info!(symbols = rules.len(), "심볼 규칙 테이블 로드");

    let client = CoindcxClient::new(CoindcxConfig::from_app_config(&config));
    let engine = ExecutionEngine::new(
        Arc::new(client),
        rules,
        RiskParams::from_config(&config),
        config.duplicate_policy,
    );

    let app = create_router(AppState::new(Arc::new(engine)));

    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "웹훅 리스너 시작");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{addr} 바인딩 실패"))?;

    axum::serve(listener, app).await.context("서버 종료")?;

    Ok(())
}
