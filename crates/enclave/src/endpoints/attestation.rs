//! /get_attestation ハンドラ実装

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use fortuna_types::AttestationResponse;

use crate::error::EnclaveError;
use crate::state::AppState;

/// /get_attestation エンドポイントハンドラ。
///
/// 署名用公開鍵を埋め込んだAttestation Documentをhex文字列で返す。
/// クライアントはこれをLedgerの登録呼び出しに渡す。
pub async fn handle_get_attestation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AttestationResponse>, EnclaveError> {
    let document = state.runtime.attestation();
    Ok(Json(AttestationResponse {
        attestation: fortuna_types::encode_hex(&document),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::mock::MockRuntime;
    use crate::runtime::EnclaveRuntime;

    /// Attestationがhexで返り、署名用公開鍵を含むことを確認
    #[tokio::test]
    async fn test_get_attestation() {
        let runtime = MockRuntime::new();
        runtime.generate_signing_keypair();
        let pubkey = runtime.signing_pubkey();
        let state = Arc::new(AppState {
            runtime: Box::new(runtime),
        });

        let response = handle_get_attestation(State(state)).await.unwrap().0;

        let document = fortuna_types::decode_hex(&response.attestation).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&document).unwrap();
        assert_eq!(doc["module_id"], "mock-enclave");

        let embedded: Vec<u8> = serde_json::from_value(doc["public_key"].clone()).unwrap();
        assert_eq!(embedded, pubkey);
    }
}
