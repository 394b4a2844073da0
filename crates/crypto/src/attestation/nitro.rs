//! # AWS Nitro Attestation Document 検証
//!
//! AWS Nitro EnclaveのAttestation Documentを検証し、
//! 測定値の照合を経てEnclaveの署名用公開鍵を抽出する。
//!
//! ## Attestation Document構造
//!
//! COSE Sign1エンベロープ（ES384署名）のペイロードがCBORマップ:
//! - `module_id`: Enclaveモジュール識別子
//! - `digest`: ハッシュアルゴリズム（"SHA384"）
//! - `timestamp`: Unix timestamp (ms)
//! - `pcrs`: PCR値マップ (インデックス → 48バイト)
//! - `certificate`: リーフ証明書（DER）
//! - `cabundle`: 中間証明書の配列（DER）
//! - `public_key`: Enclaveの署名用Ed25519公開鍵
//! - `user_data`: リクエスト時に指定したユーザーデータ
//! - `nonce`: リクエスト時に指定したノンス
//!
//! ## 検証手順
//!
//! 1. COSE Sign1とCBORペイロードをパース
//! 2. 証明書チェーンをトラストアンカーまで検証
//! 3. リーフ証明書の公開鍵でCOSE署名を検証
//! 4. PCR0〜PCR2を期待値とバイト単位で照合
//! 5. 埋め込まれたEd25519公開鍵を抽出
//!
//! 全チェックを通過した場合のみ公開鍵を返す。測定値レジスタは
//! 「監査可能な特定のコードがこの鍵を生成した」ことの唯一の証明であり、
//! 1バイトの差異も登録拒否となる。

use std::collections::BTreeMap;

use coset::CborSerializable;
use der::Decode;
use p384::ecdsa::signature::Verifier;

use super::{AttestationError, ExpectedMeasurements};
use crate::Ed25519VerifyingKey;

/// AWS Nitro Attestation PKIルート証明書（DER形式、base64エンコード）。
///
/// Subject: CN=aws.nitro-enclaves, O=Amazon, OU=AWS, C=US
/// Validity: 2019-10-28 ~ 2049-10-28
/// Algorithm: ECDSA P-384
const AWS_NITRO_ROOT_CERT_B64: &str = "\
MIICETCCAZagAwIBAgIRAPkxdWgbkK/hHUbMtOTn+FYwCgYIKoZIzj0EAwMwSTEL\
MAkGA1UEBhMCVVMxDzANBgNVBAoMBkFtYXpvbjEMMAoGA1UECwwDQVdTMRswGQYD\
VQQDDBJhd3Mubml0cm8tZW5jbGF2ZXMwHhcNMTkxMDI4MTMyODA1WhcNNDkxMDI4\
MTQyODA1WjBJMQswCQYDVQQGEwJVUzEPMA0GA1UECgwGQW1hem9uMQwwCgYDVQQL\
DANBV1MxGzAZBgNVBAMMEmF3cy5uaXRyby1lbmNsYXZlczB2MBAGByqGSM49AgEG\
BSuBBAAiA2IABPwCVOumCMHzaHDimtqQvkY4MpJzbolL//Zy2YlES1BR5TSksfbb\
48C8WBoyt7F2Bw7eEtaaP+ohG2bnUs990d0JX28TcPQXCEPZ3BABIeTPYwEoCWZE\
h8l5YoQwTcU/9KNCMEAwDwYDVR0TAQH/BAUwAwEB/zAdBgNVHQ4EFgQUkCW1DdkF\
R+eWw5b6cp3PmanfS5YwDgYDVR0PAQH/BAQDAgGGMAoGCCqGSM49BAMDA2kAMGYC\
MQCjfy+Rocm9Xue4YnwWmNJVA44fA0P5W2OpYow9OYCVRaEevL8uO1XYru5xtMPW\
rfMCMQCi85sWBbJwKKXdS6BptQFuZbT73o/gBh1qUxl/nNr12UO8Yfwr6wPLb+6N\
IwLz3/Y=";

/// AWS Nitro Attestation PKIのルート証明書をDER形式で返す。
///
/// 本番環境のトラストアンカー。テストではフィクスチャが自己署名証明書を
/// アンカーとして差し替える。
pub fn aws_root_certificate() -> Result<Vec<u8>, AttestationError> {
    base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        AWS_NITRO_ROOT_CERT_B64,
    )
    .map_err(|e| AttestationError::Malformed(format!("トラストアンカーのデコードに失敗: {e}")))
}

/// パース済みAttestation Document。
///
/// 署名・チェーン検証を経ていない生のフィールド値。登録経路では
/// [`validate_attestation`] のみが使用され、この型が外部に出るのは
/// 点検用途（CLIの`--parse`）に限られる。
#[derive(Debug, Clone)]
pub struct NitroAttestationDocument {
    /// Enclaveモジュール識別子
    pub module_id: String,
    /// ハッシュアルゴリズム（通常 "SHA384"）
    pub digest: String,
    /// Attestation生成時のタイムスタンプ（Unix ms）
    pub timestamp: u64,
    /// PCR値マップ（インデックス → 測定値バイト列）
    pub pcrs: BTreeMap<u32, Vec<u8>>,
    /// リーフ証明書（DER）
    pub certificate: Vec<u8>,
    /// 中間証明書チェーン（DER配列）
    pub cabundle: Vec<Vec<u8>>,
    /// Enclaveの署名用Ed25519公開鍵
    pub public_key: Option<Vec<u8>>,
    /// リクエスト時に指定したユーザーデータ
    pub user_data: Option<Vec<u8>>,
    /// リクエスト時に指定したノンス
    pub nonce: Option<Vec<u8>>,
}

/// Attestation Documentを検証し、Enclaveの署名用公開鍵を抽出する。
///
/// Enclave運用者の管理下にあるEnclaveを信頼された署名者に昇格させる
/// 唯一のゲート。いずれかのチェックに失敗した場合、公開鍵は返らない。
pub fn validate_attestation(
    document: &[u8],
    trust_anchor: &[u8],
    expected: &ExpectedMeasurements,
) -> Result<Ed25519VerifyingKey, AttestationError> {
    // 1. COSE Sign1とCBORペイロードをパース
    let cose_sign1 = coset::CoseSign1::from_slice(document)
        .map_err(|e| AttestationError::Malformed(format!("COSE Sign1のパースに失敗: {e:?}")))?;
    let payload_bytes = cose_sign1
        .payload
        .as_ref()
        .ok_or_else(|| AttestationError::Malformed("COSEペイロードがありません".into()))?;
    let doc = extract_attestation_fields(payload_bytes)?;

    // 2. 証明書チェーンをトラストアンカーまで検証
    verify_cert_chain(&doc.certificate, &doc.cabundle, trust_anchor)?;

    // 3. COSE署名の検証（リーフ証明書の公開鍵で）
    verify_cose_signature(&cose_sign1, &doc.certificate)?;

    // 4. 測定値レジスタの照合（バイト単位、最初の不一致を報告）
    for (index, expected_value) in expected.iter() {
        let actual = doc.pcrs.get(&(index as u32));
        if actual.map(|a| a.as_slice()) != Some(expected_value.as_slice()) {
            return Err(AttestationError::MeasurementMismatch { index });
        }
    }

    // 5. 埋め込まれた公開鍵の抽出
    let public_key = doc
        .public_key
        .ok_or_else(|| AttestationError::Malformed("public_keyフィールドがありません".into()))?;
    let key_bytes: [u8; 32] = public_key.as_slice().try_into().map_err(|_| {
        AttestationError::Malformed(format!(
            "public_keyは32バイトである必要があります（実際: {}バイト）",
            public_key.len()
        ))
    })?;
    Ed25519VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| AttestationError::Malformed(format!("public_keyが不正なEd25519公開鍵です: {e}")))
}

/// Attestation Documentのペイロードをパースのみ行う（署名・チェーン検証なし）。
/// PCR値の点検やデバッグ用途。
pub fn parse_attestation(document: &[u8]) -> Result<NitroAttestationDocument, AttestationError> {
    let cose_sign1 = coset::CoseSign1::from_slice(document)
        .map_err(|e| AttestationError::Malformed(format!("COSE Sign1のパースに失敗: {e:?}")))?;

    let payload_bytes = cose_sign1
        .payload
        .as_ref()
        .ok_or_else(|| AttestationError::Malformed("COSEペイロードがありません".into()))?;
    extract_attestation_fields(payload_bytes)
}

// ─────────────────────────────────────────────
// 内部関数
// ─────────────────────────────────────────────

/// CBORペイロードからAttestation Documentのフィールドを抽出する。
fn extract_attestation_fields(
    payload_bytes: &[u8],
) -> Result<NitroAttestationDocument, AttestationError> {
    let value: ciborium::Value = ciborium::from_reader(payload_bytes)
        .map_err(|e| AttestationError::Malformed(format!("CBORのパースに失敗: {e}")))?;

    let map = match &value {
        ciborium::Value::Map(m) => m,
        _ => {
            return Err(AttestationError::Malformed(
                "ペイロードがCBORマップではありません".into(),
            ))
        }
    };

    let module_id = get_text_field(map, "module_id")?;
    let digest = get_text_field(map, "digest")?;
    let timestamp = get_integer_field(map, "timestamp")?;
    let pcrs = get_pcrs_field(map)?;
    let certificate = get_bytes_field(map, "certificate")?;
    let cabundle = get_bytes_array_field(map, "cabundle")?;
    let public_key = get_optional_bytes_field(map, "public_key");
    let user_data = get_optional_bytes_field(map, "user_data");
    let nonce = get_optional_bytes_field(map, "nonce");

    Ok(NitroAttestationDocument {
        module_id,
        digest,
        timestamp,
        pcrs,
        certificate,
        cabundle,
        public_key,
        user_data,
        nonce,
    })
}

/// 証明書チェーンを検証する。
/// リーフ → 中間CA群 → トラストアンカー の順にECDSA-P384署名を検証する。
fn verify_cert_chain(
    leaf_cert_der: &[u8],
    cabundle: &[Vec<u8>],
    trust_anchor: &[u8],
) -> Result<(), AttestationError> {
    // 全証明書をパース: [leaf, ...intermediates, anchor]
    let mut chain_ders: Vec<&[u8]> = Vec::new();
    chain_ders.push(leaf_cert_der);
    for ca_cert in cabundle {
        chain_ders.push(ca_cert);
    }
    chain_ders.push(trust_anchor);

    // 各ペア(child, parent)の署名を検証
    for i in 0..chain_ders.len() - 1 {
        let child = x509_cert::Certificate::from_der(chain_ders[i]).map_err(|e| {
            AttestationError::ChainInvalid(format!("証明書[{}]のパースに失敗: {}", i, e))
        })?;
        let parent = x509_cert::Certificate::from_der(chain_ders[i + 1]).map_err(|e| {
            AttestationError::ChainInvalid(format!("証明書[{}]のパースに失敗: {}", i + 1, e))
        })?;

        verify_cert_signature(&child, &parent).map_err(|e| {
            AttestationError::ChainInvalid(format!("証明書[{}]→[{}]の検証失敗: {}", i, i + 1, e))
        })?;
    }

    // トラストアンカーは自己署名を検証
    let anchor = x509_cert::Certificate::from_der(trust_anchor)
        .map_err(|e| AttestationError::ChainInvalid(format!("トラストアンカーのパースに失敗: {e}")))?;
    verify_cert_signature(&anchor, &anchor).map_err(|e| {
        AttestationError::ChainInvalid(format!("トラストアンカーの自己署名検証失敗: {e}"))
    })?;

    Ok(())
}

/// X.509証明書の署名を親証明書の公開鍵で検証する。
fn verify_cert_signature(
    child: &x509_cert::Certificate,
    parent: &x509_cert::Certificate,
) -> Result<(), String> {
    // 親の公開鍵を抽出
    let parent_spki = &parent.tbs_certificate.subject_public_key_info;
    let parent_pubkey_bits = parent_spki.subject_public_key.raw_bytes();

    let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(parent_pubkey_bits)
        .map_err(|e| format!("P-384公開鍵のパースに失敗: {}", e))?;

    // 子のTBSCertificateをDERエンコード（署名対象）
    let tbs_der = der::Encode::to_der(&child.tbs_certificate)
        .map_err(|e| format!("TBSCertificateのDERエンコードに失敗: {}", e))?;

    // 子の署名をデコード（DER形式のECDSA署名）
    let sig_bytes = child.signature.raw_bytes();
    let der_sig = p384::ecdsa::DerSignature::from_bytes(sig_bytes)
        .map_err(|e| format!("ECDSA署名のデコードに失敗: {}", e))?;

    // 検証
    verifying_key
        .verify(&tbs_der, &der_sig)
        .map_err(|e| format!("署名検証に失敗: {}", e))
}

/// COSE Sign1の署名をリーフ証明書の公開鍵で検証する。
fn verify_cose_signature(
    cose_sign1: &coset::CoseSign1,
    leaf_cert_der: &[u8],
) -> Result<(), AttestationError> {
    // リーフ証明書の公開鍵を抽出
    let leaf = x509_cert::Certificate::from_der(leaf_cert_der)
        .map_err(|e| AttestationError::ChainInvalid(format!("リーフ証明書のパースに失敗: {e}")))?;
    let leaf_pubkey_bits = leaf
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();

    let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(leaf_pubkey_bits)
        .map_err(|e| AttestationError::ChainInvalid(format!("P-384公開鍵のパースに失敗: {e}")))?;

    // Sig_structure（COSE署名対象）を構築
    let aad: Vec<u8> = Vec::new();
    let tbs_data = cose_sign1.tbs_data(&aad);

    // COSE ES384署名はraw形式（r || s、各48バイト = 96バイト）
    let signature = p384::ecdsa::Signature::from_slice(&cose_sign1.signature)
        .map_err(|_| AttestationError::SignatureInvalid)?;

    verifying_key
        .verify(&tbs_data, &signature)
        .map_err(|_| AttestationError::SignatureInvalid)
}

// ─────────────────────────────────────────────
// CBORフィールド抽出ヘルパー
// ─────────────────────────────────────────────

type CborMap = Vec<(ciborium::Value, ciborium::Value)>;

fn find_field<'a>(map: &'a CborMap, key: &str) -> Option<&'a ciborium::Value> {
    map.iter().find_map(|(k, v)| match k {
        ciborium::Value::Text(s) if s == key => Some(v),
        _ => None,
    })
}

fn get_text_field(map: &CborMap, key: &str) -> Result<String, AttestationError> {
    match find_field(map, key) {
        Some(ciborium::Value::Text(s)) => Ok(s.clone()),
        Some(_) => Err(AttestationError::Malformed(format!(
            "フィールド '{}' がテキストではありません",
            key
        ))),
        None => Err(AttestationError::Malformed(format!(
            "必須フィールドがありません: {}",
            key
        ))),
    }
}

fn get_integer_field(map: &CborMap, key: &str) -> Result<u64, AttestationError> {
    match find_field(map, key) {
        Some(ciborium::Value::Integer(i)) => {
            let val: i128 = (*i).into();
            Ok(val as u64)
        }
        Some(_) => Err(AttestationError::Malformed(format!(
            "フィールド '{}' が整数ではありません",
            key
        ))),
        None => Err(AttestationError::Malformed(format!(
            "必須フィールドがありません: {}",
            key
        ))),
    }
}

fn get_bytes_field(map: &CborMap, key: &str) -> Result<Vec<u8>, AttestationError> {
    match find_field(map, key) {
        Some(ciborium::Value::Bytes(b)) => Ok(b.clone()),
        Some(_) => Err(AttestationError::Malformed(format!(
            "フィールド '{}' がバイト列ではありません",
            key
        ))),
        None => Err(AttestationError::Malformed(format!(
            "必須フィールドがありません: {}",
            key
        ))),
    }
}

fn get_optional_bytes_field(map: &CborMap, key: &str) -> Option<Vec<u8>> {
    match find_field(map, key) {
        Some(ciborium::Value::Bytes(b)) => Some(b.clone()),
        Some(ciborium::Value::Null) => None,
        _ => None,
    }
}

fn get_bytes_array_field(map: &CborMap, key: &str) -> Result<Vec<Vec<u8>>, AttestationError> {
    match find_field(map, key) {
        Some(ciborium::Value::Array(arr)) => {
            let mut result = Vec::new();
            for item in arr {
                match item {
                    ciborium::Value::Bytes(b) => result.push(b.clone()),
                    _ => {
                        return Err(AttestationError::Malformed(format!(
                            "フィールド '{}' の配列要素がバイト列ではありません",
                            key
                        )))
                    }
                }
            }
            Ok(result)
        }
        Some(_) => Err(AttestationError::Malformed(format!(
            "フィールド '{}' が配列ではありません",
            key
        ))),
        None => Err(AttestationError::Malformed(format!(
            "必須フィールドがありません: {}",
            key
        ))),
    }
}

fn get_pcrs_field(map: &CborMap) -> Result<BTreeMap<u32, Vec<u8>>, AttestationError> {
    match find_field(map, "pcrs") {
        Some(ciborium::Value::Map(pcr_map)) => {
            let mut result = BTreeMap::new();
            for (k, v) in pcr_map {
                let idx = match k {
                    ciborium::Value::Integer(i) => {
                        let val: i128 = (*i).into();
                        val as u32
                    }
                    _ => {
                        return Err(AttestationError::Malformed(
                            "PCRインデックスが整数ではありません".into(),
                        ))
                    }
                };
                let val = match v {
                    ciborium::Value::Bytes(b) => b.clone(),
                    _ => {
                        return Err(AttestationError::Malformed(
                            "PCR値がバイト列ではありません".into(),
                        ))
                    }
                };
                result.insert(idx, val);
            }
            Ok(result)
        }
        Some(_) => Err(AttestationError::Malformed(
            "pcrsフィールドがマップではありません".into(),
        )),
        None => Err(AttestationError::Malformed(
            "必須フィールドがありません: pcrs".into(),
        )),
    }
}
