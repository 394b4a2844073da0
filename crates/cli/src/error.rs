//! # クライアントエラー型

use fortuna_types::CodecError;

/// クライアント側のエラー型。
///
/// `Encoding` はネットワーク・Ledger呼び出しの前に検出され、リトライしない。
/// `Transport` はエンドポイント到達性の問題で、呼び出し元がリトライできる。
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// ネットワーク・エンドポイント到達性の問題（リトライ可能）
    #[error("Enclaveエンドポイントへの通信に失敗: {0}")]
    Transport(#[from] reqwest::Error),
    /// 入力のエンコーディング不正（リトライ不可）
    #[error(transparent)]
    Encoding(#[from] CodecError),
    /// レスポンスJSONのパース失敗
    #[error("レスポンスのパースに失敗: {0}")]
    Json(#[from] serde_json::Error),
    /// 公開鍵の形式不正
    #[error("公開鍵が不正です: {0}")]
    InvalidKey(String),
}
