//! # ローカル開発用モックランタイム
//!
//! TEEハードウェアが利用できない開発環境で使用するモック実装。
//! メモリ内で鍵を生成し、JSON形式のモックAttestation Documentを返す。
//! モックのAttestationは本物の検証（COSE/証明書チェーン）を通らない。

use std::sync::RwLock;

use ed25519_dalek::{Signer, SigningKey};

use super::EnclaveRuntime;

/// モックAttestation Documentの構造体。
///
/// Nitro Enclaveのdebug-modeと同等（PCR値が全てゼロ）。
#[derive(serde::Serialize)]
struct MockAttestationDocument {
    /// モジュールID
    module_id: String,
    /// PCR0（Enclaveイメージ測定値）— debug-modeでは全ゼロ（48バイト）
    pcr0: Vec<u8>,
    /// PCR1（カーネル測定値）— debug-modeでは全ゼロ（48バイト）
    pcr1: Vec<u8>,
    /// PCR2（アプリケーション測定値）— debug-modeでは全ゼロ（48バイト）
    pcr2: Vec<u8>,
    /// 署名用公開鍵
    public_key: Vec<u8>,
}

/// モックEnclaveランタイム。ローカル開発・テスト用。
pub struct MockRuntime {
    /// Ed25519署名用キーペア（メモリ内生成）
    signing_key: RwLock<Option<SigningKey>>,
}

impl MockRuntime {
    /// MockRuntimeを初期化する。
    pub fn new() -> Self {
        Self {
            signing_key: RwLock::new(None),
        }
    }
}

impl EnclaveRuntime for MockRuntime {
    /// モックランタイムの種別を返す。
    fn runtime_kind(&self) -> &str {
        "mock"
    }

    /// メモリ内でEd25519署名用キーペアを生成する。
    fn generate_signing_keypair(&self) {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let mut guard = self.signing_key.write().unwrap();
        *guard = Some(signing_key);
    }

    /// 保持しているEd25519秘密鍵でデータに署名する。
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let guard = self.signing_key.read().unwrap();
        let key = guard.as_ref().expect("署名用キーペアが未生成です");
        let signature = key.sign(message);
        signature.to_bytes().to_vec()
    }

    /// 署名用公開鍵（Ed25519 VerifyingKey）をバイト列で返す。
    fn signing_pubkey(&self) -> Vec<u8> {
        let guard = self.signing_key.read().unwrap();
        let key = guard.as_ref().expect("署名用キーペアが未生成です");
        key.verifying_key().to_bytes().to_vec()
    }

    /// 固定のモックAttestation Documentを返す。
    ///
    /// PCR値は全てゼロ（Nitroのdebug-modeと同等）。
    fn attestation(&self) -> Vec<u8> {
        let doc = MockAttestationDocument {
            module_id: "mock-enclave".to_string(),
            pcr0: vec![0u8; 48],
            pcr1: vec![0u8; 48],
            pcr2: vec![0u8; 48],
            public_key: self.signing_pubkey(),
        };

        serde_json::to_vec(&doc).expect("MockAttestationDocumentのシリアライズに失敗")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    /// 鍵ペア生成→署名→検証のラウンドトリップテスト
    #[test]
    fn test_sign_verify_roundtrip() {
        let rt = MockRuntime::new();
        rt.generate_signing_keypair();

        let message = b"Fortuna Protocol test message";
        let sig_bytes = rt.sign(message);
        let pubkey_bytes = rt.signing_pubkey();

        // 公開鍵と署名をデシリアライズして検証
        let verifying_key =
            VerifyingKey::from_bytes(&pubkey_bytes.try_into().expect("公開鍵は32バイト"))
                .expect("有効なEd25519公開鍵");
        let signature = Signature::from_bytes(&sig_bytes.try_into().expect("署名は64バイト"));

        assert!(verifying_key.verify(message, &signature).is_ok());
    }

    /// 不正なメッセージで署名検証が失敗することを確認
    #[test]
    fn test_sign_verify_wrong_message() {
        let rt = MockRuntime::new();
        rt.generate_signing_keypair();

        let sig_bytes = rt.sign(b"correct message");
        let pubkey_bytes = rt.signing_pubkey();

        let verifying_key =
            VerifyingKey::from_bytes(&pubkey_bytes.try_into().expect("公開鍵は32バイト"))
                .expect("有効なEd25519公開鍵");
        let signature = Signature::from_bytes(&sig_bytes.try_into().expect("署名は64バイト"));

        assert!(verifying_key.verify(b"wrong message", &signature).is_err());
    }

    /// Attestation Documentが正しい構造を持つことを確認
    #[test]
    fn test_attestation_document() {
        let rt = MockRuntime::new();
        rt.generate_signing_keypair();

        let attestation = rt.attestation();
        let doc: serde_json::Value = serde_json::from_slice(&attestation).expect("有効なJSON");

        assert_eq!(doc["module_id"], "mock-enclave");
        // PCR値が全てゼロ（48バイトのゼロ配列）
        let pcr0: Vec<u8> = serde_json::from_value(doc["pcr0"].clone()).unwrap();
        assert_eq!(pcr0.len(), 48);
        assert!(pcr0.iter().all(|&b| b == 0));

        // 署名用公開鍵が含まれていることを確認
        let public_key: Vec<u8> = serde_json::from_value(doc["public_key"].clone()).unwrap();
        assert_eq!(public_key.len(), 32);
        assert_eq!(public_key, rt.signing_pubkey());
    }

    /// 鍵未生成時のパニック確認
    #[test]
    #[should_panic(expected = "署名用キーペアが未生成です")]
    fn test_sign_without_keypair_panics() {
        let rt = MockRuntime::new();
        rt.sign(b"test");
    }
}
