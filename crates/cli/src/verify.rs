//! # レスポンス署名のオフライン検証
//!
//! /process_data レスポンスから正準バイト列を再構築し、
//! 既知のEnclave公開鍵で署名を検証する。Ledgerに提出する前の
//! クライアント側プリフライトとして使用する。

use fortuna_crypto::{Ed25519Signature, Ed25519VerifyingKey};
use fortuna_types::{decode_hex, IntentMessage, ProcessedDataResponse, RandomResponse};

use crate::error::ClientError;

/// レスポンスJSONの署名を公開鍵（hex）で検証する。
///
/// 署名が一致しない場合・形式不正な場合は `Ok(false)`。
/// 入力のエンコーディング不正（hex、JSON）のみがエラーになる。
pub fn verify_processed_response(
    pubkey_hex: &str,
    response_json: &str,
) -> Result<bool, ClientError> {
    // 入力のデコードはネットワーク・Ledger呼び出しの前に完結する
    let pubkey_bytes = decode_hex(pubkey_hex)?;
    let key_bytes: [u8; 32] = pubkey_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ClientError::InvalidKey(format!("32バイト必要（実際: {}バイト）", pubkey_bytes.len())))?;
    let verifying_key = Ed25519VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| ClientError::InvalidKey(e.to_string()))?;

    let response: ProcessedDataResponse<IntentMessage<RandomResponse>> =
        serde_json::from_str(response_json)?;
    let signature_bytes = decode_hex(&response.signature)?;

    let Ok(signature) = Ed25519Signature::from_slice(&signature_bytes) else {
        return Ok(false);
    };

    let signing_bytes = response.response.to_signing_bytes();
    Ok(verifying_key.verify_strict(&signing_bytes, &signature).is_ok())
}
