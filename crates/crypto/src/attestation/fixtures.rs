//! # Attestation Documentの合成フィクスチャ
//!
//! P-384鍵ペアで自己署名したCOSE Sign1ドキュメントを生成する。
//! 自己署名証明書そのものをトラストアンカーとして使うことで、
//! 実ハードウェアなしに検証経路全体をテストできる。
//!
//! テスト専用（`test-fixtures` フィーチャ）。本番コードから参照してはならない。

use p384::ecdsa::signature::Signer;
use p384::ecdsa::SigningKey;

/// フィクスチャが埋め込むモジュール識別子。
pub const FIXTURE_MODULE_ID: &str = "fixture-enclave";

/// 合成されたAttestation Documentと、それを検証できるトラストアンカー。
pub struct AttestationFixture {
    /// COSE Sign1形式のAttestation Document
    pub document: Vec<u8>,
    /// 自己署名リーフ証明書（DER）。チェーン検証のアンカーを兼ねる。
    pub trust_anchor: Vec<u8>,
}

impl AttestationFixture {
    /// ビルダーを返す。デフォルトはPCR全ゼロ、public_key/user_data/nonceなし。
    pub fn builder() -> AttestationFixtureBuilder {
        AttestationFixtureBuilder {
            pcrs: [vec![0u8; 48], vec![0u8; 48], vec![0u8; 48]],
            public_key: None,
            user_data: None,
            nonce: None,
        }
    }
}

/// [`AttestationFixture`] のビルダー。
pub struct AttestationFixtureBuilder {
    pcrs: [Vec<u8>; 3],
    public_key: Option<Vec<u8>>,
    user_data: Option<Vec<u8>>,
    nonce: Option<Vec<u8>>,
}

impl AttestationFixtureBuilder {
    /// PCR0〜PCR2の値を設定する。
    pub fn pcrs(mut self, pcr0: &[u8], pcr1: &[u8], pcr2: &[u8]) -> Self {
        self.pcrs = [pcr0.to_vec(), pcr1.to_vec(), pcr2.to_vec()];
        self
    }

    /// ドキュメントに埋め込む署名用公開鍵を設定する。
    pub fn public_key(mut self, public_key: &[u8]) -> Self {
        self.public_key = Some(public_key.to_vec());
        self
    }

    /// ドキュメントに埋め込むユーザーデータを設定する。
    pub fn user_data(mut self, user_data: &[u8]) -> Self {
        self.user_data = Some(user_data.to_vec());
        self
    }

    /// ドキュメントに埋め込むノンスを設定する。
    pub fn nonce(mut self, nonce: &[u8]) -> Self {
        self.nonce = Some(nonce.to_vec());
        self
    }

    /// ドキュメントを生成する。
    pub fn build(self) -> AttestationFixture {
        // P-384署名用鍵ペアを生成し、自己署名証明書を作成
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        let cert_der = create_self_signed_cert(&signing_key);

        // CBORペイロードを構築
        let mut pcrs = Vec::new();
        for (i, value) in self.pcrs.iter().enumerate() {
            pcrs.push((
                ciborium::Value::Integer((i as u32).into()),
                ciborium::Value::Bytes(value.clone()),
            ));
        }

        let mut payload_map: Vec<(ciborium::Value, ciborium::Value)> = vec![
            (
                ciborium::Value::Text("module_id".into()),
                ciborium::Value::Text(FIXTURE_MODULE_ID.into()),
            ),
            (
                ciborium::Value::Text("digest".into()),
                ciborium::Value::Text("SHA384".into()),
            ),
            (
                ciborium::Value::Text("timestamp".into()),
                ciborium::Value::Integer(1700000000u64.into()),
            ),
            (
                ciborium::Value::Text("pcrs".into()),
                ciborium::Value::Map(pcrs),
            ),
            (
                ciborium::Value::Text("certificate".into()),
                ciborium::Value::Bytes(cert_der.clone()),
            ),
            (
                ciborium::Value::Text("cabundle".into()),
                ciborium::Value::Array(vec![]),
            ),
        ];

        for (key, value) in [
            ("public_key", self.public_key),
            ("user_data", self.user_data),
            ("nonce", self.nonce),
        ] {
            let cbor_value = match value {
                Some(bytes) => ciborium::Value::Bytes(bytes),
                None => ciborium::Value::Null,
            };
            payload_map.push((ciborium::Value::Text(key.into()), cbor_value));
        }

        let payload_value = ciborium::Value::Map(payload_map);
        let mut payload_bytes = Vec::new();
        ciborium::into_writer(&payload_value, &mut payload_bytes)
            .expect("CBORペイロードのシリアライズに失敗");

        // COSE Sign1を構築して署名
        let mut cose_sign1 = coset::CoseSign1Builder::new()
            .protected(
                coset::HeaderBuilder::new()
                    .algorithm(coset::iana::Algorithm::ES384)
                    .build(),
            )
            .payload(payload_bytes)
            .build();

        let tbs = cose_sign1.tbs_data(&[]);
        let sig: p384::ecdsa::Signature = signing_key.sign(&tbs);
        cose_sign1.signature = sig.to_bytes().to_vec();

        use coset::CborSerializable;
        let document = cose_sign1.to_vec().expect("COSE Sign1のシリアライズに失敗");

        AttestationFixture {
            document,
            trust_anchor: cert_der,
        }
    }
}

/// テスト用の自己署名P-384証明書を作成する。
fn create_self_signed_cert(signing_key: &SigningKey) -> Vec<u8> {
    use der::Encode;

    let verifying_key = signing_key.verifying_key();
    let pubkey_sec1 = verifying_key.to_sec1_bytes();

    // SubjectPublicKeyInfo for P-384
    let spki_oid = der::asn1::ObjectIdentifier::new_unwrap("1.2.840.10045.2.1"); // id-ecPublicKey
    let curve_oid = der::asn1::ObjectIdentifier::new_unwrap("1.3.132.0.34"); // secp384r1

    let algorithm = x509_cert::spki::AlgorithmIdentifierOwned {
        oid: spki_oid,
        parameters: Some(der::asn1::Any::from(&curve_oid)),
    };

    let subject_public_key = der::asn1::BitString::from_bytes(&pubkey_sec1)
        .expect("SubjectPublicKeyのBitString化に失敗");

    let spki = x509_cert::spki::SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    };

    // Minimal TBSCertificate
    let serial = x509_cert::serial_number::SerialNumber::new(&[1])
        .expect("シリアル番号の構築に失敗");
    let sig_alg_oid = der::asn1::ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3"); // ecdsa-with-SHA384
    let sig_alg = x509_cert::spki::AlgorithmIdentifierOwned {
        oid: sig_alg_oid,
        parameters: None,
    };

    let name = x509_cert::name::Name::default();

    let not_before = x509_cert::time::Time::GeneralTime(
        der::asn1::GeneralizedTime::from_date_time(
            der::DateTime::new(2020, 1, 1, 0, 0, 0).expect("not_beforeの構築に失敗"),
        ),
    );
    let not_after = x509_cert::time::Time::GeneralTime(
        der::asn1::GeneralizedTime::from_date_time(
            der::DateTime::new(2049, 12, 31, 23, 59, 59).expect("not_afterの構築に失敗"),
        ),
    );
    let validity = x509_cert::time::Validity {
        not_before,
        not_after,
    };

    let tbs = x509_cert::TbsCertificate {
        version: x509_cert::certificate::Version::V3,
        serial_number: serial,
        signature: sig_alg.clone(),
        issuer: name.clone(),
        validity,
        subject: name,
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };

    // Sign TBS
    let tbs_der = tbs.to_der().expect("TBSCertificateのDERエンコードに失敗");
    let sig: p384::ecdsa::DerSignature = signing_key.sign(&tbs_der);
    let sig_bits = der::asn1::BitString::from_bytes(sig.as_bytes())
        .expect("署名のBitString化に失敗");

    let cert = x509_cert::Certificate {
        tbs_certificate: tbs,
        signature_algorithm: sig_alg,
        signature: sig_bits,
    };

    cert.to_der().expect("証明書のDERエンコードに失敗")
}
