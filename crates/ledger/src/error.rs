//! # Ledgerエラー型
//!
//! 全コントラクト操作で共通のエラー型。いずれのエラーも
//! 呼び出し全体を中断させ、状態は変更されない。

use fortuna_crypto::attestation::AttestationError;

/// Ledgerエラー型。
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// 提出された値が宣言された範囲を満たさない（min < max かつ min <= n <= max）
    #[error("提出された値が範囲条件を満たしません")]
    InvalidRange,
    /// 署名が登録済みEnclaveの公開鍵で検証できない
    #[error("署名が登録済みEnclaveの鍵で検証できません")]
    InvalidSignature,
    /// Attestation Documentの検証失敗。登録の試行は破棄される。
    #[error("Attestation検証に失敗: {0}")]
    Attestation(#[from] AttestationError),
    /// 同一スキーマに対するConfigは一度しか作成できない
    #[error("このスキーマのEnclaveConfigは既に作成されています")]
    ConfigAlreadyClaimed,
    /// 指定されたConfigが存在しない
    #[error("EnclaveConfigが見つかりません: {0}")]
    ConfigNotFound(crate::ObjectId),
    /// 指定されたEnclaveが存在しない
    #[error("Enclaveが見つかりません: {0}")]
    EnclaveNotFound(crate::ObjectId),
    /// 指定されたレコードが存在しない
    #[error("レコードが見つかりません: {0}")]
    ObjectNotFound(crate::ObjectId),
    /// レコードのスキーマ型が要求された型と一致しない
    #[error("レコードのペイロードスキーマが一致しません")]
    SchemaMismatch,
    /// 所有者以外による破棄要求
    #[error("レコードの所有者ではありません")]
    NotOwner,
}
