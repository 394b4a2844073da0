//! # Attestation Document 検証
//!
//! ハードウェアプラットフォームが発行したAttestation Documentを検証し、
//! Enclaveの署名用公開鍵を抽出する。
//!
//! 対応形式はAWS Nitro Enclaves（COSE Sign1 + CBOR、測定値はPCR0〜PCR2）のみ。
//! 汎用の多ベンダー検証ライブラリではない。

pub mod nitro;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

/// 測定値レジスタ1本分の値。SHA-384ハッシュの48バイト。
pub type Measurement = [u8; 48];

/// Enclaveイメージに期待される3本の測定値レジスタ。
///
/// 登録時にAttestation Document内のPCR値とバイト単位で照合される。
/// 1バイトでも異なるドキュメントは拒否される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedMeasurements {
    /// PCR0 — Enclaveイメージ全体の測定値
    pub pcr0: Measurement,
    /// PCR1 — カーネル・ブートストラップの測定値
    pub pcr1: Measurement,
    /// PCR2 — アプリケーションの測定値
    pub pcr2: Measurement,
}

impl ExpectedMeasurements {
    /// インデックス順 (PCR0, PCR1, PCR2) のイテレータを返す。
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Measurement)> {
        [&self.pcr0, &self.pcr1, &self.pcr2]
            .into_iter()
            .enumerate()
    }
}

/// Attestation Document検証のエラー型。
///
/// いずれの失敗も登録の試行全体を中断させ、部分的なレコードは作られない。
#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    /// 証明書チェーンがトラストアンカーまで検証できない
    #[error("証明書チェーンの検証に失敗: {0}")]
    ChainInvalid(String),
    /// Attestation Document自体の署名が不正
    #[error("Attestation Documentの署名検証に失敗")]
    SignatureInvalid,
    /// 測定値レジスタが期待値と一致しない
    #[error("測定値レジスタ PCR{index} が期待値と一致しません")]
    MeasurementMismatch {
        /// 一致しなかった最初のレジスタ番号（0〜2）
        index: usize,
    },
    /// ドキュメントの構造が不正（COSE/CBORパース失敗、必須フィールド欠落）
    #[error("Attestation Documentの形式が不正: {0}")]
    Malformed(String),
}
