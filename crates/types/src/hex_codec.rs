//! # Hexエンコーディング
//!
//! 署名とAttestation Documentは境界をhex文字列として越える。
//! デコードは厳密で、奇数長や不正な桁は黙って切り詰めずエラーにする。

/// 境界エンコーディングのエラー型。
/// ネットワーク・Ledger呼び出しの前に検出され、リトライ対象にはならない。
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// hex文字列が不正（奇数長、不正な桁）
    #[error("不正なhex文字列: {0}")]
    InvalidHex(String),
}

/// バイト列を小文字hex文字列にエンコードする（プレフィックスなし）。
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// hex文字列をバイト列にデコードする。
///
/// `0x` / `0X` プレフィックスは任意。奇数長は [`CodecError::InvalidHex`]。
pub fn decode_hex(input: &str) -> Result<Vec<u8>, CodecError> {
    let stripped = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(stripped).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// エンコード→デコードのラウンドトリップを確認
    #[test]
    fn test_roundtrip() {
        let cases: &[&[u8]] = &[b"", b"\x00", b"\xff\x00\xab", b"Fortuna Protocol"];
        for &bytes in cases {
            let encoded = encode_hex(bytes);
            assert_eq!(decode_hex(&encoded).unwrap(), bytes);
        }
    }

    /// 0xプレフィックス付き・大文字のデコードを確認
    #[test]
    fn test_prefix_and_case() {
        assert_eq!(decode_hex("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("0XDEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("DeadBeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    /// 奇数長のhex文字列が決定的に拒否されることを確認
    #[test]
    fn test_odd_length_rejected() {
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("0xabc").is_err());
        // 1文字欠けたhexは切り詰めではなくエラー
        let full = encode_hex(&[1, 2, 3, 4]);
        assert!(decode_hex(&full[..full.len() - 1]).is_err());
    }

    /// hex以外の桁が拒否されることを確認
    #[test]
    fn test_invalid_digit_rejected() {
        assert!(decode_hex("zz").is_err());
        assert!(decode_hex("12g4").is_err());
    }

    /// 空文字列は空バイト列にデコードされることを確認
    #[test]
    fn test_empty() {
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
    }
}
