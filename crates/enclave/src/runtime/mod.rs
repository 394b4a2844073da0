//! # Enclaveランタイム抽象化
//!
//! 鍵生成・署名・Attestation取得を抽象化するトレイト。
//! 環境変数 `ENCLAVE_RUNTIME` で実装を切り替える。
//!
//! 現在のランタイム実装:
//! - `mock` — ローカル開発・テスト用（メモリ内鍵生成）
//! - `nitro` — AWS Nitro Enclaves（NSM API経由）

pub mod mock;
pub mod nitro;

/// Enclaveランタイムのトレイト。
pub trait EnclaveRuntime: Send + Sync {
    /// ランタイム種別を返す（ログ用）。
    fn runtime_kind(&self) -> &str;

    /// Ed25519署名用キーペアを生成し、内部に保持する。
    fn generate_signing_keypair(&self);

    /// 署名用秘密鍵でデータに署名する。
    fn sign(&self, message: &[u8]) -> Vec<u8>;

    /// 署名用公開鍵を取得する。
    fn signing_pubkey(&self) -> Vec<u8>;

    /// 署名用公開鍵を埋め込んだAttestation Documentを取得する。
    fn attestation(&self) -> Vec<u8>;
}
