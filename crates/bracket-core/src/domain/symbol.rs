//! 심볼 정규화 및 선물 페어 변환.
//!
//! TradingView 알림은 `BTCUSDT.P`, `BTCUSDT_1` 처럼 장식이 붙은 심볼을
//! 보내옵니다. 엔진 내부에서는 항상 정규화된 심볼(`BTCUSDT`)만 사용하고,
//! 거래소 전송 시점에만 선물 페어 형식(`B-BTC_USDT`)으로 변환합니다.
//! 선물 페어는 심볼의 순수 함수이며 별도로 저장하지 않습니다.

/// 쿼트 자산 접미사. 현재 USDT 마진 선물만 지원합니다.
const QUOTE_SUFFIX: &str = "USDT";

/// 심볼 정규화.
///
/// 대문자 변환 후 `USDT` 접미사 이후의 장식을 모두 제거합니다.
///
/// - `BTCUSDT.P` → `BTCUSDT`
/// - `btcusdt_1` → `BTCUSDT`
/// - `BTCUSDT` → `BTCUSDT` (변경 없음)
///
/// `USDT`가 포함되지 않은 심볼은 대문자 변환만 적용됩니다.
pub fn normalize(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.find(QUOTE_SUFFIX) {
        Some(idx) => format!("{}{}", &upper[..idx], QUOTE_SUFFIX),
        None => upper,
    }
}

/// 정규화된 심볼을 거래소 선물 페어로 변환.
///
/// `BTCUSDT` → `B-BTC_USDT` (CoinDCX 선물 형식)
pub fn futures_pair(symbol: &str) -> String {
    let base = symbol.strip_suffix(QUOTE_SUFFIX).unwrap_or(symbol);
    format!("B-{}_{}", base, QUOTE_SUFFIX)
}
