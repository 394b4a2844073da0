//! # Enclaveレジストリ
//!
//! EnclaveConfigの作成・更新と、Attestation検証を経たEnclaveの登録。
//!
//! Configはスキーマ型 `T` ごとに一度だけ作成でき（one-time witness）、
//! 作成時に返される [`ConfigCap`] の保持者だけが測定値を更新できる。
//! 登録は呼び出しごとに独立した [`Enclave`] レコードを作成する。
//! 鍵ローテーションの手段は存在せず、鍵を替えたいEnclaveは再登録する。

use std::any::TypeId;
use std::marker::PhantomData;

use fortuna_crypto::attestation::{nitro, ExpectedMeasurements};
use fortuna_crypto::{Ed25519Signature, Ed25519VerifyingKey};
use fortuna_types::{IntentMessage, IntentPayload};

use crate::{ConfigRecord, EnclaveRecord, Ledger, LedgerError, ObjectId};

/// EnclaveConfigの管理権限。
///
/// [`Ledger::create_config`] から一度だけ発行され、複製できない。
/// 保持者のみが測定値を更新できる。
pub struct ConfigCap<T> {
    config_id: ObjectId,
    _schema: PhantomData<T>,
}

impl<T> ConfigCap<T> {
    /// このCapが管理するConfigのIDを返す。
    pub fn config_id(&self) -> ObjectId {
        self.config_id
    }
}

/// EnclaveConfigの読み取りビュー。誰でも読める。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigView<'a> {
    /// 人間可読なラベル
    pub label: &'a str,
    /// 期待される測定値レジスタ
    pub measurements: &'a ExpectedMeasurements,
    /// 証明書チェーンのトラストアンカー（DER）
    pub trust_anchor: &'a [u8],
}

/// 登録済みEnclaveの型付きハンドル。
///
/// スキーマ型 `T` のペイロードのみ検証できる。公開鍵は登録時に
/// Attestation検証を通過したものであり、以後変更されない。
#[derive(Debug, Clone)]
pub struct Enclave<T> {
    id: ObjectId,
    public_key: Ed25519VerifyingKey,
    _schema: PhantomData<T>,
}

impl<T: IntentPayload> Enclave<T> {
    /// レコードIDを返す。
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// 検証済み公開鍵を返す。
    pub fn public_key(&self) -> &Ed25519VerifyingKey {
        &self.public_key
    }

    /// 署名を検証する。
    ///
    /// 呼び出し元から渡されたtimestampとペイロード（いずれも未信頼）から
    /// 正準バイト列を再構築し、登録済み公開鍵で検証する。
    /// 形式不正な署名（長さ違い等）は `false`。決して失敗で巻き戻らない。
    pub fn verify(&self, timestamp_ms: u64, payload: &T, signature: &[u8]) -> bool {
        let message = IntentMessage::new(payload, timestamp_ms);
        let signing_bytes = message.to_signing_bytes();

        let Ok(signature) = Ed25519Signature::from_slice(signature) else {
            return false;
        };
        self.public_key
            .verify_strict(&signing_bytes, &signature)
            .is_ok()
    }
}

impl Ledger {
    /// スキーマ型 `T` のEnclaveConfigを作成する。
    ///
    /// `T` ごとに一度だけ成功し、管理権限 [`ConfigCap`] を返す。
    /// 2回目以降は [`LedgerError::ConfigAlreadyClaimed`]。
    /// 本番のトラストアンカーには
    /// [`nitro::aws_root_certificate`] を渡す。
    pub fn create_config<T: 'static>(
        &mut self,
        label: impl Into<String>,
        measurements: ExpectedMeasurements,
        trust_anchor: Vec<u8>,
    ) -> Result<(ObjectId, ConfigCap<T>), LedgerError> {
        let schema = TypeId::of::<T>();
        if self.claimed_schemas.contains(&schema) {
            return Err(LedgerError::ConfigAlreadyClaimed);
        }

        let id = self.fresh_id();
        self.claimed_schemas.insert(schema);
        self.configs.insert(
            id,
            ConfigRecord {
                label: label.into(),
                measurements,
                trust_anchor,
                schema,
            },
        );

        Ok((
            id,
            ConfigCap {
                config_id: id,
                _schema: PhantomData,
            },
        ))
    }

    /// Configの読み取りビューを返す。
    pub fn config(&self, config_id: ObjectId) -> Result<ConfigView<'_>, LedgerError> {
        let record = self
            .configs
            .get(&config_id)
            .ok_or(LedgerError::ConfigNotFound(config_id))?;
        Ok(ConfigView {
            label: &record.label,
            measurements: &record.measurements,
            trust_anchor: &record.trust_anchor,
        })
    }

    /// Capの保持者として期待測定値を更新する。
    ///
    /// 既存のEnclaveレコードには影響しない。新しい測定値は以後の登録にのみ適用される。
    pub fn update_measurements<T: 'static>(
        &mut self,
        cap: &ConfigCap<T>,
        measurements: ExpectedMeasurements,
    ) -> Result<(), LedgerError> {
        let record = self
            .configs
            .get_mut(&cap.config_id)
            .ok_or(LedgerError::ConfigNotFound(cap.config_id))?;
        record.measurements = measurements;
        Ok(())
    }

    /// Attestation Documentを検証し、Enclaveを登録する。
    ///
    /// Configの測定値・トラストアンカーに対してAttestation検証を実行し、
    /// 成功した場合のみ抽出された公開鍵を新しいEnclaveレコードとして格納する。
    /// 失敗時は [`LedgerError::Attestation`] を返し、レコードは一切作られない。
    /// 同一Configに対する再呼び出しは常に独立した新レコードを作成する。
    pub fn register_enclave<T: IntentPayload + 'static>(
        &mut self,
        config_id: ObjectId,
        document: &[u8],
    ) -> Result<ObjectId, LedgerError> {
        let config = self
            .configs
            .get(&config_id)
            .ok_or(LedgerError::ConfigNotFound(config_id))?;
        if config.schema != TypeId::of::<T>() {
            return Err(LedgerError::SchemaMismatch);
        }

        let public_key = nitro::validate_attestation(
            document,
            &config.trust_anchor,
            &config.measurements,
        )?;

        let id = self.fresh_id();
        self.enclaves.insert(
            id,
            EnclaveRecord {
                config_id,
                public_key,
                schema: TypeId::of::<T>(),
            },
        );
        Ok(id)
    }

    /// 登録済みEnclaveの型付きハンドルを返す。
    ///
    /// レコードのスキーマ型が `T` と一致しない場合は
    /// [`LedgerError::SchemaMismatch`]。
    pub fn enclave<T: IntentPayload + 'static>(
        &self,
        enclave_id: ObjectId,
    ) -> Result<Enclave<T>, LedgerError> {
        let record = self
            .enclaves
            .get(&enclave_id)
            .ok_or(LedgerError::EnclaveNotFound(enclave_id))?;
        if record.schema != TypeId::of::<T>() {
            return Err(LedgerError::SchemaMismatch);
        }
        Ok(Enclave {
            id: enclave_id,
            public_key: record.public_key,
            _schema: PhantomData,
        })
    }

    /// EnclaveレコードからそのConfigのIDを返す。
    pub fn enclave_config_id(&self, enclave_id: ObjectId) -> Result<ObjectId, LedgerError> {
        self.enclaves
            .get(&enclave_id)
            .map(|record| record.config_id)
            .ok_or(LedgerError::EnclaveNotFound(enclave_id))
    }
}
