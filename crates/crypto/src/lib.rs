//! # Fortuna Protocol 暗号処理
//!
//! Enclaveレスポンスの署名・検証とAttestation Document検証を提供する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | レスポンス署名 | Ed25519 |
//! | Attestation署名 | ECDSA P-384 (COSE ES384) |
//! | オブジェクトID導出 | SHA-256 |

use ed25519_dalek::{Signer, Verifier};
use sha2::{Digest, Sha256};

pub mod attestation;

pub use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519署名検証エラー
    #[error("Ed25519署名検証に失敗しました")]
    SignatureVerifyError,
}

/// Ed25519による署名。
pub fn ed25519_sign(signing_key: &Ed25519SigningKey, message: &[u8]) -> Ed25519Signature {
    signing_key.sign(message)
}

/// Ed25519による署名検証。
pub fn ed25519_verify(
    verifying_key: &Ed25519VerifyingKey,
    message: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), CryptoError> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| CryptoError::SignatureVerifyError)
}

/// SHA-256ハッシュ計算。
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 署名→検証のラウンドトリップテスト
    #[test]
    fn test_ed25519_sign_verify() {
        let signing_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
        let message = b"Fortuna Protocol test message";

        let signature = ed25519_sign(&signing_key, message);
        assert!(ed25519_verify(&signing_key.verifying_key(), message, &signature).is_ok());
    }

    /// 改ざんされたメッセージで検証が失敗することを確認
    #[test]
    fn test_ed25519_verify_tampered_message() {
        let signing_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
        let signature = ed25519_sign(&signing_key, b"original");

        let result = ed25519_verify(&signing_key.verifying_key(), b"tampered", &signature);
        assert!(matches!(result, Err(CryptoError::SignatureVerifyError)));
    }

    /// SHA-256の既知ベクトルを確認
    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc")
        let hash = sha256(b"abc");
        assert_eq!(
            hex_string(&hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    fn hex_string(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
