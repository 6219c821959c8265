//! Ciphertext wire form: eight ASCII binary digits per byte, most
//! significant bit first, no separators and no padding.

use crate::error::CryptoError;

pub const BLOCK_BITS: usize = 8;

pub fn to_bit_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * BLOCK_BITS);
    for byte in bytes {
        out.push_str(&format!("{byte:08b}"));
    }
    out
}

/// Parses the wire form back into bytes.
///
/// Any character other than `0`/`1` is rejected before the length is
/// checked, so a stray separator is reported where it sits rather than as
/// a short block.
pub fn from_bit_string(text: &str) -> Result<Vec<u8>, CryptoError> {
    if let Some((index, found)) = text
        .chars()
        .enumerate()
        .find(|&(_, c)| c != '0' && c != '1')
    {
        return Err(CryptoError::InvalidBinaryDigit { index, found });
    }
    if text.len() % BLOCK_BITS != 0 {
        return Err(CryptoError::MalformedCiphertext { len: text.len() });
    }
    Ok(text
        .as_bytes()
        .chunks(BLOCK_BITS)
        .map(|block| block.iter().fold(0u8, |acc, &d| (acc << 1) | (d - b'0')))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn msb_first_blocks() {
        assert_eq!(to_bit_string(&[0x41]), "01000001");
        assert_eq!(to_bit_string(&[0, 255]), "0000000011111111");
        assert_eq!(to_bit_string(&[]), "");
        assert_eq!(from_bit_string("0100000110000000").unwrap(), vec![0x41, 0x80]);
        assert!(from_bit_string("").unwrap().is_empty());
    }

    #[test]
    fn partial_block_rejected() {
        assert_eq!(
            from_bit_string("010000011").unwrap_err(),
            CryptoError::MalformedCiphertext { len: 9 }
        );
        assert_eq!(
            from_bit_string("0101").unwrap_err(),
            CryptoError::MalformedCiphertext { len: 4 }
        );
    }

    #[test]
    fn foreign_digits_rejected() {
        assert_eq!(
            from_bit_string("01000001 01000001").unwrap_err(),
            CryptoError::InvalidBinaryDigit {
                index: 8,
                found: ' '
            }
        );
        assert_eq!(
            from_bit_string("0100002").unwrap_err(),
            CryptoError::InvalidBinaryDigit {
                index: 6,
                found: '2'
            }
        );
        assert!(matches!(
            from_bit_string("0100000é"),
            Err(CryptoError::InvalidBinaryDigit { index: 7, .. })
        ));
    }

    proptest! {
        #[test]
        fn parse_inverts_render(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = to_bit_string(&bytes);
            prop_assert_eq!(text.len(), bytes.len() * BLOCK_BITS);
            prop_assert_eq!(from_bit_string(&text).unwrap(), bytes);
        }
    }
}
