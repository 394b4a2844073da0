//! # AWS Nitro Enclaves ランタイム実装
//!
//! AWS Nitro Enclaves上で動作するEnclaveランタイム。
//! NSM (Nitro Security Module) APIを使用して鍵生成とAttestation取得を行う。
//!
//! ## 設計
//!
//! NSMデバイス操作は `NsmOps` トレイトで抽象化し、テスト時にはモック注入が可能。
//! - 本番（Linux/Nitro Enclave）: `RealNsm` — `/dev/nsm` 経由でNSM APIを呼び出し
//! - テスト: `MockNsm` — `OsRng` でエントロピー生成、モックAttestation返却

use std::sync::RwLock;

use ed25519_dalek::{Signer, SigningKey};

use super::EnclaveRuntime;

// ─────────────────────────────────────────────
// NSMデバイス操作の抽象化
// ─────────────────────────────────────────────

/// NSMデバイス操作の抽象化トレイト。
///
/// テスト時にはモック実装を注入することで、
/// NSMハードウェアなしでNitroRuntimeをテスト可能にする。
trait NsmOps: Send + Sync {
    /// NSMデバイスからランダムバイトを取得する。
    fn get_random(&self, len: usize) -> Vec<u8>;

    /// Attestation Documentを取得する。
    ///
    /// - `public_key`: Attestation Documentに含めるEnclave署名用公開鍵
    fn get_attestation_doc(&self, public_key: Option<&[u8]>) -> Vec<u8>;
}

// ─────────────────────────────────────────────
// 本番NSMデバイス（Linux/Nitro Enclaves）
// ─────────────────────────────────────────────

#[cfg(all(target_os = "linux", feature = "vendor-aws"))]
mod real_nsm {
    use super::NsmOps;
    use aws_nitro_enclaves_nsm_api::api::{Request, Response};
    use aws_nitro_enclaves_nsm_api::driver as nsm_driver;
    use serde_bytes::ByteBuf;

    /// 本番用NSMデバイス。
    /// `/dev/nsm` を開き、NSM APIを呼び出す。
    pub struct RealNsm {
        fd: i32,
    }

    impl RealNsm {
        /// NSMデバイスを初期化する。
        /// Nitro Enclave内でのみ動作する。
        pub fn new() -> Self {
            let fd = nsm_driver::nsm_init();
            assert!(
                fd >= 0,
                "NSMデバイスの初期化に失敗（Nitro Enclave外で実行していませんか？）"
            );
            Self { fd }
        }
    }

    impl Drop for RealNsm {
        fn drop(&mut self) {
            nsm_driver::nsm_exit(self.fd);
        }
    }

    impl NsmOps for RealNsm {
        /// NSM APIの `GetRandom` リクエストでランダムバイトを取得する。
        fn get_random(&self, len: usize) -> Vec<u8> {
            let mut result = Vec::with_capacity(len);
            while result.len() < len {
                match nsm_driver::nsm_process_request(self.fd, Request::GetRandom) {
                    Response::GetRandom { random } => {
                        result.extend_from_slice(&random);
                    }
                    other => panic!(
                        "NSM GetRandomが予期しないレスポンスを返しました: {:?}",
                        other
                    ),
                }
            }
            result.truncate(len);
            result
        }

        /// NSM APIの `Attestation` リクエストでAttestation Documentを取得する。
        fn get_attestation_doc(&self, public_key: Option<&[u8]>) -> Vec<u8> {
            let request = Request::Attestation {
                public_key: public_key.map(|k| ByteBuf::from(k.to_vec())),
                user_data: None,
                nonce: None,
            };

            match nsm_driver::nsm_process_request(self.fd, request) {
                Response::Attestation { document } => document,
                other => panic!(
                    "NSM Attestationが予期しないレスポンスを返しました: {:?}",
                    other
                ),
            }
        }
    }
}

// ─────────────────────────────────────────────
// モックNSMデバイス（テスト用）
// ─────────────────────────────────────────────

#[cfg(test)]
mod mock_nsm {
    use super::NsmOps;

    /// テスト用モックNSMデバイス。
    /// `OsRng` でエントロピーを生成し、モックAttestation Documentを返す。
    pub(super) struct MockNsm;

    impl NsmOps for MockNsm {
        /// `OsRng` でランダムバイトを生成する。
        fn get_random(&self, len: usize) -> Vec<u8> {
            use rand::RngCore;
            let mut buf = vec![0u8; len];
            rand::rngs::OsRng.fill_bytes(&mut buf);
            buf
        }

        /// モックAttestation Documentを返す。
        ///
        /// 実際のNitro Attestation Documentと同様のフィールドを持つが、
        /// COSE Sign1ではなくJSON形式のモック。PCR値は全てゼロ。
        fn get_attestation_doc(&self, public_key: Option<&[u8]>) -> Vec<u8> {
            let doc = serde_json::json!({
                "module_id": "nitro-runtime-mock",
                "digest": "SHA384",
                "timestamp": 1700000000u64,
                "pcrs": {
                    "0": vec![0u8; 48],
                    "1": vec![0u8; 48],
                    "2": vec![0u8; 48],
                },
                "public_key": public_key.map(|k| k.to_vec()),
            });
            serde_json::to_vec(&doc).expect("モックAttestation Documentのシリアライズに失敗")
        }
    }
}

// ─────────────────────────────────────────────
// NitroRuntime本体
// ─────────────────────────────────────────────

/// AWS Nitro Enclaves ランタイム。
///
/// NSM (Nitro Security Module) APIを使用して鍵生成とAttestation取得を行う。
/// 全ての秘密鍵はEnclave内メモリにのみ保持され、外部にはエクスポートされない。
/// Enclave再起動時は新しいキーペアが生成される（鍵ローテーションは再登録で行う）。
pub struct NitroRuntime {
    /// NSMデバイス操作（テスト時はモック注入可能）
    nsm: Box<dyn NsmOps>,
    /// Ed25519署名用キーペア（メモリ内のみ保持）
    signing_key: RwLock<Option<SigningKey>>,
}

impl NitroRuntime {
    /// NitroRuntimeを初期化する（本番用）。
    ///
    /// NSMデバイス `/dev/nsm` を開き、ランタイムを初期化する。
    /// Nitro Enclave内でのみ動作する。
    #[cfg(all(target_os = "linux", feature = "vendor-aws"))]
    pub fn new() -> Self {
        Self {
            nsm: Box::new(real_nsm::RealNsm::new()),
            signing_key: RwLock::new(None),
        }
    }

    /// NitroRuntimeはLinux + `vendor-aws` フィーチャ以外では利用不可。
    /// ローカル開発にはMockRuntimeを使用すること。
    #[cfg(not(all(target_os = "linux", feature = "vendor-aws")))]
    pub fn new() -> Self {
        panic!(
            "NitroRuntimeはLinux (Nitro Enclave) 環境でのみ使用可能です。\
             ローカル開発にはMockRuntimeを使用してください。"
        )
    }

    /// テスト用: モックNSMデバイスでNitroRuntimeを作成する。
    #[cfg(test)]
    pub(crate) fn with_mock() -> Self {
        Self {
            nsm: Box::new(mock_nsm::MockNsm),
            signing_key: RwLock::new(None),
        }
    }
}

impl EnclaveRuntime for NitroRuntime {
    /// AWS Nitro Enclaveのランタイム種別を返す。
    fn runtime_kind(&self) -> &str {
        "aws_nitro"
    }

    /// NSM APIのエントロピーでEd25519署名用キーペアを生成する。
    ///
    /// NSMデバイスから32バイトのエントロピーを取得し、
    /// Ed25519の秘密鍵シードとして使用する。
    /// 秘密鍵はEnclave内メモリにのみ保持される。
    fn generate_signing_keypair(&self) {
        let entropy = self.nsm.get_random(32);
        let seed: [u8; 32] = entropy
            .try_into()
            .expect("NSMエントロピーは32バイトであるべき");
        let signing_key = SigningKey::from_bytes(&seed);
        let mut guard = self.signing_key.write().unwrap();
        *guard = Some(signing_key);
    }

    /// 署名用秘密鍵でデータに署名する。
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

    /// NSM APIからAttestation Documentを取得する。
    ///
    /// Attestation Documentの `public_key` フィールドに
    /// Ed25519署名用公開鍵を埋め込む。登録時にLedger側で抽出される。
    fn attestation(&self) -> Vec<u8> {
        let signing_pk = self.signing_pubkey();
        self.nsm.get_attestation_doc(Some(&signing_pk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    /// 鍵ペア生成→署名→検証のラウンドトリップテスト
    #[test]
    fn test_sign_verify_roundtrip() {
        let rt = NitroRuntime::with_mock();
        rt.generate_signing_keypair();

        let message = b"NitroRuntime test message";
        let sig_bytes = rt.sign(message);
        let pubkey_bytes = rt.signing_pubkey();

        let verifying_key =
            VerifyingKey::from_bytes(&pubkey_bytes.try_into().expect("公開鍵は32バイト"))
                .expect("有効なEd25519公開鍵");
        let signature = Signature::from_bytes(&sig_bytes.try_into().expect("署名は64バイト"));

        assert!(verifying_key.verify(message, &signature).is_ok());
    }

    /// Attestation Documentに署名用公開鍵が埋め込まれることを確認
    #[test]
    fn test_attestation_document_embeds_pubkey() {
        let rt = NitroRuntime::with_mock();
        rt.generate_signing_keypair();

        let attestation = rt.attestation();
        assert!(!attestation.is_empty());

        // モックAttestation DocumentはJSON形式
        let doc: serde_json::Value = serde_json::from_slice(&attestation).expect("有効なJSON");

        assert_eq!(doc["module_id"], "nitro-runtime-mock");

        // 署名用公開鍵が public_key フィールドに含まれる
        let pk: Vec<u8> = serde_json::from_value(doc["public_key"].clone()).unwrap();
        assert_eq!(pk.len(), 32);
        assert_eq!(pk, rt.signing_pubkey());

        // PCR値が含まれる（モックでは全ゼロ）
        let pcrs = &doc["pcrs"];
        let pcr0: Vec<u8> = serde_json::from_value(pcrs["0"].clone()).unwrap();
        assert_eq!(pcr0.len(), 48);
        assert!(pcr0.iter().all(|&b| b == 0));
    }

    /// 鍵未生成時のパニック確認
    #[test]
    #[should_panic(expected = "署名用キーペアが未生成です")]
    fn test_sign_without_keypair_panics() {
        let rt = NitroRuntime::with_mock();
        rt.sign(b"test");
    }

    /// ランタイム種別が "aws_nitro" であることを確認
    #[test]
    fn test_runtime_kind() {
        let rt = NitroRuntime::with_mock();
        assert_eq!(rt.runtime_kind(), "aws_nitro");
    }
}
