//! CoinDCX 요청 서명.
//!
//! 서명은 전송되는 바이트 시퀀스 그대로를 커버합니다. 따라서 정준
//! 직렬화(고정 키 순서, 공백 없음)가 필수이며, 서명한 문자열과
//! 전송하는 본문은 반드시 동일한 값이어야 합니다. 직렬화가 조금이라도
//! 어긋나면 거래소는 비즈니스 에러가 아니라 인증 실패로 거절합니다.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use bracket_core::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

/// 서명 완료된 요청 본문.
#[derive(Debug, Clone)]
pub struct SignedBody {
    /// 정준 직렬화된 페이로드 - 이 문자열이 그대로 전송되어야 합니다.
    pub payload: String,
    /// 페이로드 바이트에 대한 HMAC-SHA256, 소문자 hex.
    pub signature: String,
}

/// HMAC-SHA256 서명을 소문자 hex 문자열로 계산.
pub fn hmac_sha256_hex(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// 본문을 정준 직렬화하고 서명.
///
/// 키 순서는 구조체 필드 선언 순서로 고정되고, serde_json은 공백 없는
/// 최소 형태로 직렬화하므로 동일 입력에 대해 항상 바이트 단위로 동일한
/// 출력이 나옵니다.
///
/// # Errors
///
/// 직렬화 실패 시 `ExchangeError::Parse`를 반환합니다.
pub fn sign_body<T: Serialize>(secret: &str, body: &T) -> Result<SignedBody, ExchangeError> {
    let payload = serde_json::to_string(body)
        .map_err(|e| ExchangeError::Parse(format!("요청 본문 직렬화 실패: {e}")))?;
    let signature = hmac_sha256_hex(secret, &payload);
    Ok(SignedBody { payload, signature })
}
