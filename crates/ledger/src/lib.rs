//! # Fortuna Protocol Ledgerコントラクトロジック
//!
//! Enclaveの登録・署名検証・発行レコードのミントを行う、
//! Ledger常駐コントラクトの決定的な状態機械。
//!
//! ## 実行モデル
//!
//! 全ての公開操作は単一のアトミックなトランザクションとして実行される:
//! 先に全検証を行い、成功した場合のみ状態を変更する。`Err` を返した操作が
//! 部分的なレコードを残すことはない。操作内部にI/O・ブロッキングは存在せず、
//! 全てハッシュ・署名検証・比較のみの有界な計算である。
//!
//! ## オブジェクト
//!
//! | 型 | 役割 | ライフサイクル |
//! |----|------|--------------|
//! | `EnclaveConfig<T>`（[`ConfigView`]） | 信頼するトラストアンカーと測定値の宣言 | 作成後は[`ConfigCap`]保持者のみ変更可 |
//! | [`registry::Enclave`]`<T>` | 検証済み公開鍵のレコード | 登録ごとに新規作成、変更不可 |
//! | [`random::RandomNft`] | 検証済み乱数の発行レコード | ミント後は変更不可、所有者のみ破棄可 |

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use fortuna_crypto::attestation::ExpectedMeasurements;
use fortuna_crypto::Ed25519VerifyingKey;

pub mod error;
pub mod object;
pub mod random;
pub mod registry;

pub use error::LedgerError;
pub use object::{AccountId, ObjectId};
pub use random::RandomNft;
pub use registry::{ConfigCap, ConfigView, Enclave};


/// Ledger状態の全体。コントラクトが所有するテーブル群を保持する。
pub struct Ledger {
    /// オブジェクトID導出用のカウンタ
    next_object: u64,
    /// スキーマ型ごとに一度だけConfigを作成できる（one-time witness）
    claimed_schemas: HashSet<TypeId>,
    /// EnclaveConfigレコード
    configs: HashMap<ObjectId, ConfigRecord>,
    /// 登録済みEnclaveレコード
    enclaves: HashMap<ObjectId, EnclaveRecord>,
    /// 発行済みレコード
    nfts: HashMap<ObjectId, RandomNft>,
}

/// EnclaveConfigの格納形。スキーマ型は`TypeId`として消去して保持する。
struct ConfigRecord {
    /// 人間可読なラベル
    label: String,
    /// 期待される測定値レジスタ
    measurements: ExpectedMeasurements,
    /// 証明書チェーンのトラストアンカー（DER）
    trust_anchor: Vec<u8>,
    /// このConfigが受理するペイロードスキーマ
    schema: TypeId,
}

/// 登録済みEnclaveの格納形。公開鍵はレコードの生存期間中変更されない。
struct EnclaveRecord {
    /// 登録に使用されたConfig
    config_id: ObjectId,
    /// Attestationから抽出された検証済み公開鍵
    public_key: Ed25519VerifyingKey,
    /// このEnclaveが検証を許されたペイロードスキーマ
    schema: TypeId,
}

impl Ledger {
    /// 空のLedger状態を作る。
    pub fn new() -> Self {
        Self {
            next_object: 0,
            claimed_schemas: HashSet::new(),
            configs: HashMap::new(),
            enclaves: HashMap::new(),
            nfts: HashMap::new(),
        }
    }

    /// 新しいオブジェクトIDを導出する。
    fn fresh_id(&mut self) -> ObjectId {
        self.next_object += 1;
        ObjectId::derive(self.next_object)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
