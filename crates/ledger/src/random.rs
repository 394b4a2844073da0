//! # 乱数発行レコードのミント
//!
//! 登録済みEnclaveが署名した乱数レスポンスを検証し、
//! 発行レコード（[`RandomNft`]）をミントして呼び出し元に譲渡する。
//!
//! ## 検証順序
//!
//! 1. 範囲チェック（`min < max` かつ `min <= random_number <= max`）
//! 2. 署名検証（正準バイト列を再構築して登録済み公開鍵と照合）
//! 3. ミント（レコード作成と所有権の譲渡）
//!
//! 範囲チェックは署名検証より安価なため先に実行されるが、ミントには
//! 両方の通過が必須であり、片方だけでミントに到達する経路は存在しない。
//! 検証とミントはアトミック: 呼び出し全体が成功して丁度1件のレコードが
//! 作られるか、何も作られないかのいずれかである。

use fortuna_types::RandomResponse;

use crate::registry::Enclave;
use crate::{AccountId, Ledger, LedgerError, ObjectId};

/// 検証済み乱数の発行レコード。
///
/// ミント後は変更不可。所有者のみが破棄できる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomNft {
    /// レコードID
    pub id: ObjectId,
    /// 検証済みの乱数
    pub random_number: u64,
    /// 範囲の下限（含む）
    pub min: u64,
    /// 範囲の上限（含む）
    pub max: u64,
    /// Enclaveがレスポンスを生成した時刻（Unix ms）
    pub timestamp_ms: u64,
    /// レコードの所有者
    pub owner: AccountId,
}

impl Ledger {
    /// 署名付き乱数レスポンスを検証し、発行レコードをミントする。
    ///
    /// `random_number`・`min`・`max`・`timestamp_ms`・`signature` は
    /// いずれも未信頼のクライアント入力であり、ここでの検証を通過して
    /// 初めて信頼される。成功時は新しいレコードのIDを返し、所有権は
    /// `caller` に譲渡される。
    ///
    /// 同一の署名付きレスポンスの再提出は拒否されない: 各提出は独立した
    /// 正当なミントとして扱われ、都度新しいレコードが作られる。
    pub fn submit_random(
        &mut self,
        enclave: &Enclave<RandomResponse>,
        random_number: u64,
        min: u64,
        max: u64,
        timestamp_ms: u64,
        signature: &[u8],
        caller: AccountId,
    ) -> Result<ObjectId, LedgerError> {
        // Enclaveレコードが現在も登録されていること
        if !self.enclaves.contains_key(&enclave.id()) {
            return Err(LedgerError::EnclaveNotFound(enclave.id()));
        }

        // 1. 範囲チェック
        if min >= max || random_number < min || random_number > max {
            return Err(LedgerError::InvalidRange);
        }

        // 2. 署名検証
        let payload = RandomResponse {
            random_number,
            min,
            max,
        };
        if !enclave.verify(timestamp_ms, &payload, signature) {
            return Err(LedgerError::InvalidSignature);
        }

        // 3. ミント
        let id = self.fresh_id();
        self.nfts.insert(
            id,
            RandomNft {
                id,
                random_number,
                min,
                max,
                timestamp_ms,
                owner: caller,
            },
        );
        Ok(id)
    }

    /// 発行レコードを読み取る。
    pub fn nft(&self, id: ObjectId) -> Result<&RandomNft, LedgerError> {
        self.nfts.get(&id).ok_or(LedgerError::ObjectNotFound(id))
    }

    /// 発行レコードを破棄する。所有者のみが呼び出せる。
    pub fn destroy(&mut self, id: ObjectId, caller: AccountId) -> Result<(), LedgerError> {
        let record = self.nfts.get(&id).ok_or(LedgerError::ObjectNotFound(id))?;
        if record.owner != caller {
            return Err(LedgerError::NotOwner);
        }
        self.nfts.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fortuna_crypto::attestation::fixtures::AttestationFixture;
    use fortuna_crypto::attestation::ExpectedMeasurements;
    use fortuna_crypto::Ed25519SigningKey;
    use fortuna_types::IntentMessage;

    use super::*;

    /// 登録済みEnclaveと署名用秘密鍵のテストセットアップ
    fn setup() -> (Ledger, Enclave<RandomResponse>, Ed25519SigningKey) {
        let mut ledger = Ledger::new();
        let signing_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
        let pubkey = signing_key.verifying_key().to_bytes();

        let fixture = AttestationFixture::builder().public_key(&pubkey).build();
        let (config_id, _cap) = ledger
            .create_config::<RandomResponse>(
                "random-v1",
                ExpectedMeasurements {
                    pcr0: [0u8; 48],
                    pcr1: [0u8; 48],
                    pcr2: [0u8; 48],
                },
                fixture.trust_anchor.clone(),
            )
            .unwrap();
        let enclave_id = ledger
            .register_enclave::<RandomResponse>(config_id, &fixture.document)
            .unwrap();
        let enclave = ledger.enclave::<RandomResponse>(enclave_id).unwrap();
        (ledger, enclave, signing_key)
    }

    fn sign_response(
        signing_key: &Ed25519SigningKey,
        payload: RandomResponse,
        timestamp_ms: u64,
    ) -> Vec<u8> {
        let message = IntentMessage::new(payload, timestamp_ms);
        fortuna_crypto::ed25519_sign(signing_key, &message.to_signing_bytes())
            .to_bytes()
            .to_vec()
    }

    fn caller() -> AccountId {
        AccountId::new([9u8; 32])
    }

    /// 正当な署名付きレスポンスで丁度1件のレコードがミントされることを確認
    #[test]
    fn test_submit_random_mints_record() {
        let (mut ledger, enclave, signing_key) = setup();
        let payload = RandomResponse {
            random_number: 42,
            min: 1,
            max: 100,
        };
        let signature = sign_response(&signing_key, payload, 1700000000000);

        let nft_id = ledger
            .submit_random(&enclave, 42, 1, 100, 1700000000000, &signature, caller())
            .unwrap();

        let nft = ledger.nft(nft_id).unwrap();
        assert_eq!(nft.random_number, 42);
        assert_eq!(nft.min, 1);
        assert_eq!(nft.max, 100);
        assert_eq!(nft.timestamp_ms, 1700000000000);
        assert_eq!(nft.owner, caller());
        assert_eq!(ledger.nfts.len(), 1);
    }

    /// 範囲外の値が署名の正否にかかわらずInvalidRangeで拒否されることを確認
    #[test]
    fn test_submit_random_out_of_range() {
        let (mut ledger, enclave, signing_key) = setup();

        // Enclaveの正当な署名があっても範囲が崩れていれば拒否
        for (n, min, max) in [(0u64, 1u64, 100u64), (101, 1, 100), (5, 10, 10), (5, 10, 2)] {
            let payload = RandomResponse {
                random_number: n,
                min,
                max,
            };
            let signature = sign_response(&signing_key, payload, 1700000000000);
            let result =
                ledger.submit_random(&enclave, n, min, max, 1700000000000, &signature, caller());
            assert!(matches!(result, Err(LedgerError::InvalidRange)));
        }
        assert!(ledger.nfts.is_empty());
    }

    /// 署名の任意の1バイト反転がInvalidSignatureになることを確認
    #[test]
    fn test_submit_random_bit_flipped_signature() {
        let (mut ledger, enclave, signing_key) = setup();
        let payload = RandomResponse {
            random_number: 42,
            min: 1,
            max: 100,
        };
        let signature = sign_response(&signing_key, payload, 1700000000000);

        for i in 0..signature.len() {
            let mut corrupted = signature.clone();
            corrupted[i] ^= 0x01;
            let result = ledger.submit_random(
                &enclave,
                42,
                1,
                100,
                1700000000000,
                &corrupted,
                caller(),
            );
            assert!(
                matches!(result, Err(LedgerError::InvalidSignature)),
                "バイト{}の反転が検出されませんでした",
                i
            );
        }
        assert!(ledger.nfts.is_empty());
    }

    /// 署名対象と異なるフィールドでの提出が拒否されることを確認
    #[test]
    fn test_submit_random_field_mismatch() {
        let (mut ledger, enclave, signing_key) = setup();
        let payload = RandomResponse {
            random_number: 42,
            min: 1,
            max: 100,
        };
        let signature = sign_response(&signing_key, payload, 1700000000000);

        // 値の差し替え
        let result =
            ledger.submit_random(&enclave, 43, 1, 100, 1700000000000, &signature, caller());
        assert!(matches!(result, Err(LedgerError::InvalidSignature)));

        // timestampの差し替え
        let result =
            ledger.submit_random(&enclave, 42, 1, 100, 1700000000001, &signature, caller());
        assert!(matches!(result, Err(LedgerError::InvalidSignature)));
    }

    /// 同一レスポンスの再提出が独立したレコードを再度ミントすることを確認
    #[test]
    fn test_submit_random_resubmission_mints_again() {
        let (mut ledger, enclave, signing_key) = setup();
        let payload = RandomResponse {
            random_number: 42,
            min: 1,
            max: 100,
        };
        let signature = sign_response(&signing_key, payload, 1700000000000);

        let first = ledger
            .submit_random(&enclave, 42, 1, 100, 1700000000000, &signature, caller())
            .unwrap();
        let second = ledger
            .submit_random(&enclave, 42, 1, 100, 1700000000000, &signature, caller())
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(ledger.nfts.len(), 2);
        assert_eq!(
            ledger.nft(first).unwrap().random_number,
            ledger.nft(second).unwrap().random_number
        );
    }

    /// 所有者による破棄と、所有者以外の破棄拒否を確認
    #[test]
    fn test_destroy() {
        let (mut ledger, enclave, signing_key) = setup();
        let payload = RandomResponse {
            random_number: 42,
            min: 1,
            max: 100,
        };
        let signature = sign_response(&signing_key, payload, 1700000000000);
        let nft_id = ledger
            .submit_random(&enclave, 42, 1, 100, 1700000000000, &signature, caller())
            .unwrap();

        // 所有者以外は破棄できない
        let stranger = AccountId::new([1u8; 32]);
        assert!(matches!(
            ledger.destroy(nft_id, stranger),
            Err(LedgerError::NotOwner)
        ));

        // 所有者は破棄できる
        ledger.destroy(nft_id, caller()).unwrap();
        assert!(matches!(
            ledger.nft(nft_id),
            Err(LedgerError::ObjectNotFound(_))
        ));
    }
}
