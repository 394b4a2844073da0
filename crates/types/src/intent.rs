//! # Intentメッセージと正準エンコーディング
//!
//! Enclaveが署名し、Ledgerが検証するバイト列の定義。
//! 署名はこのバイト列のみを対象とするため、エンコーディングは
//! Enclave側とLedger側で**バイト単位で一致**しなければならない。
//!
//! ## レイアウト
//!
//! | オフセット | 内容 |
//! |-----------|------|
//! | 0 | intent（1バイト判別子） |
//! | 1..9 | timestamp_ms（u64, リトルエンディアン） |
//! | 9.. | ペイロードのフィールド（宣言順、固定幅リトルエンディアン） |
//!
//! 長さプレフィックスなし、Optionalフィールドなし、圧縮なし。

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Intent判別子
// ---------------------------------------------------------------------------

/// ペイロードの目的を識別する1バイトの判別子。
///
/// 異なる目的のペイロードは、シリアライズ結果のバイト列が偶然一致しても
/// 署名としては決して混同されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntentScope {
    /// /process_data のレスポンスに対する署名
    ProcessData = 0,
}

impl IntentScope {
    /// 判別子のバイト値を返す。
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// バイト値から判別子を復元する。未知の値は拒否する。
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(IntentScope::ProcessData),
            _ => None,
        }
    }
}

impl Serialize for IntentScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for IntentScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        IntentScope::from_u8(value)
            .ok_or_else(|| D::Error::custom(format!("未知のintent判別子: {}", value)))
    }
}

// ---------------------------------------------------------------------------
// ペイロードスキーマ
// ---------------------------------------------------------------------------

/// 署名対象となるペイロードスキーマのトレイト。
///
/// スキーマ型ごとにintent判別子と正準バイトレイアウトをコンパイル時に固定する。
/// 実行時にレイアウトを切り替える手段は存在しない。
pub trait IntentPayload {
    /// このスキーマに束縛されたintent判別子
    const SCOPE: IntentScope;

    /// フィールドを宣言順・固定幅リトルエンディアンで書き出す。
    /// 全フィールド必須のため失敗しない。
    fn encode_canonical(&self, out: &mut Vec<u8>);
}

impl<T: IntentPayload> IntentPayload for &T {
    const SCOPE: IntentScope = T::SCOPE;

    fn encode_canonical(&self, out: &mut Vec<u8>) {
        (*self).encode_canonical(out);
    }
}

/// 乱数レスポンスペイロード。
///
/// `min < max` かつ `min <= random_number <= max` が成立しなければならないが、
/// この型自体は未検証のクライアント入力を運ぶこともあるため、
/// 検証はLedger側（submit_random）で行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomResponse {
    /// 抽選された乱数
    pub random_number: u64,
    /// 範囲の下限（含む）
    pub min: u64,
    /// 範囲の上限（含む）
    pub max: u64,
}

impl IntentPayload for RandomResponse {
    const SCOPE: IntentScope = IntentScope::ProcessData;

    fn encode_canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.random_number.to_le_bytes());
        out.extend_from_slice(&self.min.to_le_bytes());
        out.extend_from_slice(&self.max.to_le_bytes());
    }
}

// ---------------------------------------------------------------------------
// IntentMessage
// ---------------------------------------------------------------------------

/// 署名対象の論理エンベロープ。
///
/// オブジェクトとして永続化されることはなく、署名・検証の両側で
/// 同一の正準バイト列を再構築するためにのみ存在する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMessage<T> {
    /// ペイロードの目的を識別する判別子
    pub intent: IntentScope,
    /// レスポンス生成時刻（Unix ms）
    pub timestamp_ms: u64,
    /// ペイロード本体
    pub data: T,
}

impl<T: IntentPayload> IntentMessage<T> {
    /// ペイロードのスキーマに束縛された判別子でエンベロープを構築する。
    pub fn new(data: T, timestamp_ms: u64) -> Self {
        Self {
            intent: T::SCOPE,
            timestamp_ms,
            data,
        }
    }

    /// 署名対象の正準バイト列を生成する。
    ///
    /// `[intent(1)][timestamp_ms(8, LE)][payload]` の順。決定的で、
    /// 同一の論理入力に対して常に同一のバイト列を返す。
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9);
        out.push(self.intent.as_u8());
        out.extend_from_slice(&self.timestamp_ms.to_le_bytes());
        self.data.encode_canonical(&mut out);
        out
    }
}
