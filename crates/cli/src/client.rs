//! # Enclave HTTPクライアント

use fortuna_types::{
    AttestationResponse, IntentMessage, ProcessDataRequest, ProcessedDataResponse, RandomRequest,
    RandomResponse,
};

use crate::error::ClientError;

/// EnclaveサーバーのHTTPクライアント。
pub struct EnclaveClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl EnclaveClient {
    /// ベースURLからクライアントを作る。
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// /process_data を呼び出し、署名付き乱数レスポンスを取得する。
    pub async fn process_data(
        &self,
        min: u64,
        max: u64,
    ) -> Result<ProcessedDataResponse<IntentMessage<RandomResponse>>, ClientError> {
        let response = self
            .http_client
            .post(format!("{}/process_data", self.base_url))
            .json(&ProcessDataRequest {
                payload: RandomRequest { min, max },
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    /// /get_attestation を呼び出し、Attestation Documentを取得する。
    pub async fn get_attestation(&self) -> Result<AttestationResponse, ClientError> {
        let response = self
            .http_client
            .get(format!("{}/get_attestation", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}
