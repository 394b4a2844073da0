//! # Enclaveエラー型
//!
//! 全エンドポイントで共通のエラー型。

use axum::http::StatusCode;

/// Enclaveエラー型。
#[derive(Debug, thiserror::Error)]
pub enum EnclaveError {
    /// 不正なリクエスト（パース失敗、範囲条件違反）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 内部エラー（時刻取得失敗、シリアライズ失敗）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for EnclaveError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            EnclaveError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EnclaveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
