//! # オブジェクトモデル
//!
//! Ledger上のレコードを識別するIDと、所有者を表すアカウントアドレス。
//!
//! ## エンコーディング規則
//! - ObjectId: hex（レコード識別子）
//! - AccountId: Base58（ウォレットアドレス）

use std::fmt;

use base58::ToBase58;

/// Ledger上のレコード識別子。作成カウンタからSHA-256で導出される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// 作成カウンタからIDを導出する。
    pub(crate) fn derive(counter: u64) -> Self {
        let mut input = Vec::with_capacity(23);
        input.extend_from_slice(b"fortuna-object:");
        input.extend_from_slice(&counter.to_le_bytes());
        Self(fortuna_crypto::sha256(&input))
    }

    /// IDのバイト表現を返す。
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// 呼び出し元アカウントのアドレス。発行レコードの所有者となる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// 32バイトのアドレスからアカウントIDを作る。
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// アドレスのバイト表現を返す。
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// カウンタが異なれば異なるIDが導出されることを確認
    #[test]
    fn test_object_id_unique() {
        let a = ObjectId::derive(1);
        let b = ObjectId::derive(2);
        assert_ne!(a, b);
        // 同一カウンタからは同一ID
        assert_eq!(a, ObjectId::derive(1));
    }

    /// 表示形式の確認（ObjectIdはhex、AccountIdはBase58）
    #[test]
    fn test_display() {
        let id = ObjectId::derive(1);
        let shown = id.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.len(), 2 + 64);

        let account = AccountId::new([0u8; 32]);
        assert_eq!(account.to_string(), "11111111111111111111111111111111");
    }
}
