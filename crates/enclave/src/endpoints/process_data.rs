//! /process_data ハンドラ実装

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rand::Rng;

use fortuna_types::{
    IntentMessage, ProcessDataRequest, ProcessedDataResponse, RandomRequest, RandomResponse,
};

use crate::endpoints::to_signed_response;
use crate::error::EnclaveError;
use crate::state::AppState;

/// /process_data エンドポイントハンドラ。
///
/// 指定された範囲 [min, max] から暗号学的に安全なRNGで一様に抽選し、
/// 署名付きレスポンスを返す。
pub async fn handle_process_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessDataRequest<RandomRequest>>,
) -> Result<Json<ProcessedDataResponse<IntentMessage<RandomResponse>>>, EnclaveError> {
    let min = request.payload.min;
    let max = request.payload.max;

    // 入力検証
    if min >= max {
        return Err(EnclaveError::BadRequest(
            "min は max より小さい必要があります".to_string(),
        ));
    }

    let random_number = rand::thread_rng().gen_range(min..=max);

    let current_timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| EnclaveError::Internal(format!("現在時刻の取得に失敗: {}", e)))?
        .as_millis() as u64;

    tracing::debug!(min, max, "乱数レスポンスを生成しました");

    Ok(Json(to_signed_response(
        state.runtime.as_ref(),
        RandomResponse {
            random_number,
            min,
            max,
        },
        current_timestamp,
    )))
}
