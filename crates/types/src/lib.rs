//! # Fortuna Protocol 共有型定義
//!
//! EnclaveサーバーとLedgerコントラクトの双方が使用する型を提供する。
//!
//! ## エンコーディング規則
//! - Hex: 署名・Attestation Document（境界を越えるバイナリは全てhex文字列）
//! - 署名対象バイト列: [`intent`] モジュールの正準エンコーディング（serdeではない）

use serde::{Deserialize, Serialize};

pub mod hex_codec;
pub mod intent;

pub use hex_codec::{decode_hex, encode_hex, CodecError};
pub use intent::{IntentMessage, IntentPayload, IntentScope, RandomResponse};

// ---------------------------------------------------------------------------
// /process_data リクエスト/レスポンス
// ---------------------------------------------------------------------------

/// /process_data リクエストの外殻。ペイロード型はEnclaveアプリごとに異なる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDataRequest<T> {
    /// リクエストペイロード
    pub payload: T,
}

/// 乱数リクエスト。範囲 [min, max] を指定する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomRequest {
    /// 範囲の下限（含む）
    pub min: u64,
    /// 範囲の上限（含む）
    pub max: u64,
}

/// /process_data レスポンスの外殻。
/// `response` の正準バイト列（[`IntentMessage::to_signing_bytes`]）が署名対象。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDataResponse<T> {
    /// 署名対象の論理メッセージ
    pub response: T,
    /// Hexエンコードされた Ed25519 署名（64バイト）
    pub signature: String,
}

// ---------------------------------------------------------------------------
// /get_attestation レスポンス
// ---------------------------------------------------------------------------

/// /get_attestation レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationResponse {
    /// Hexエンコードされた Attestation Document（COSE Sign1）
    pub attestation: String,
}
