//! # Enclaveサーバーのエンドポイント
//!
//! | パス | メソッド | 役割 |
//! |------|---------|------|
//! | `/` | GET | 死活確認 |
//! | `/process_data` | POST | 乱数の抽選と署名付きレスポンスの生成 |
//! | `/get_attestation` | GET | Attestation Documentの取得 |

pub mod attestation;
pub mod process_data;

use fortuna_types::{IntentMessage, IntentPayload, ProcessedDataResponse};

use crate::runtime::EnclaveRuntime;

/// 死活確認エンドポイント。
pub async fn ping() -> &'static str {
    "Pong!"
}

/// ペイロードをIntentMessageに包み、正準バイト列に署名してレスポンスを組み立てる。
///
/// 署名対象はJSON表現ではなく正準バイト列
/// （[`IntentMessage::to_signing_bytes`]）であり、Ledger側の検証と
/// バイト単位で一致する。
pub(crate) fn to_signed_response<T: IntentPayload>(
    runtime: &dyn EnclaveRuntime,
    data: T,
    timestamp_ms: u64,
) -> ProcessedDataResponse<IntentMessage<T>> {
    let message = IntentMessage::new(data, timestamp_ms);
    let signature = runtime.sign(&message.to_signing_bytes());

    ProcessedDataResponse {
        response: message,
        signature: fortuna_types::encode_hex(&signature),
    }
}
