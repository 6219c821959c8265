//! Simplified DES: a two-round Feistel cipher over 8-bit blocks with a
//! 10-bit key.
//!
//! Every byte is enciphered on its own. There is no chaining and no
//! padding, so equal plaintext bytes give equal ciphertext blocks under one
//! key. Peers on the wire depend on exactly this behaviour.

use std::fmt;

use log::debug;

use crate::bits::{from_bit_string, to_bit_string};
use crate::error::CryptoError;
use crate::permutation::{EP_HIGH, EP_LOW, IP, IP_INVERSE, P4, P8, P10};

pub const KEY_BITS: u32 = 10;
pub const SUBKEY_BITS: u32 = 8;

const HALF_KEY_BITS: u32 = KEY_BITS / 2;
const HALF_KEY_MASK: u16 = (1 << HALF_KEY_BITS) - 1;

type SBox = [[u8; 4]; 4];

const S0: SBox = [[1, 0, 3, 2], [3, 2, 1, 0], [0, 2, 1, 3], [3, 1, 3, 2]];
const S1: SBox = [[0, 1, 2, 3], [2, 0, 1, 3], [3, 0, 1, 0], [2, 1, 0, 3]];

/// A cipher key, guaranteed to fit in [`KEY_BITS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CipherKey(u16);

impl CipherKey {
    pub fn new(value: u64) -> Result<Self, CryptoError> {
        if value >> KEY_BITS != 0 {
            return Err(CryptoError::KeyWidth {
                value,
                bits: KEY_BITS,
            });
        }
        Ok(Self(value as u16))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010b}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subkeys {
    pub first: u8,
    pub second: u8,
}

fn rotate_half(half: u16, by: u32) -> u16 {
    ((half << by) | (half >> (HALF_KEY_BITS - by))) & HALF_KEY_MASK
}

/// Derives the two round subkeys.
///
/// After P10 the key splits into two 5-bit halves. Each half is rotated
/// left by one for the first subkey, then by two more (three from the
/// start) for the second. P8 compresses each rotated pair to eight bits.
pub fn key_schedule(key: CipherKey) -> Subkeys {
    let permuted = P10.apply(key.value());
    let mut left = permuted >> HALF_KEY_BITS;
    let mut right = permuted & HALF_KEY_MASK;

    left = rotate_half(left, 1);
    right = rotate_half(right, 1);
    let first = P8.apply((left << HALF_KEY_BITS) | right) as u8;

    left = rotate_half(left, 2);
    right = rotate_half(right, 2);
    let second = P8.apply((left << HALF_KEY_BITS) | right) as u8;

    Subkeys { first, second }
}

pub fn initial_permutation(block: u8) -> u8 {
    IP.apply(block as u16) as u8
}

pub fn inverse_initial_permutation(block: u8) -> u8 {
    IP_INVERSE.apply(block as u16) as u8
}

// Outer bits of the nibble pick the row, inner bits the column.
fn sbox_lookup(sbox: &SBox, nibble: u8) -> u8 {
    let row = ((nibble >> 2) & 0b10) | (nibble & 0b01);
    let col = (nibble >> 1) & 0b11;
    sbox[row as usize][col as usize]
}

/// The keyed mixing function F applied to a 4-bit half block.
pub fn round_function(right: u8, subkey: u8) -> u8 {
    let right = (right & 0x0F) as u16;
    let high = EP_HIGH.apply(right) as u8 ^ (subkey >> 4);
    let low = EP_LOW.apply(right) as u8 ^ (subkey & 0x0F);
    let substituted = (sbox_lookup(&S0, high) << 2) | sbox_lookup(&S1, low);
    P4.apply(substituted as u16) as u8
}

/// One Feistel round: the left half absorbs F of the right half, the right
/// half passes through.
pub fn feistel_round(block: u8, subkey: u8) -> u8 {
    let left = block >> 4;
    let right = block & 0x0F;
    ((left ^ round_function(right, subkey)) << 4) | right
}

pub fn swap_halves(block: u8) -> u8 {
    block.rotate_left(4)
}

fn run_rounds(block: u8, first: u8, second: u8) -> u8 {
    let block = feistel_round(initial_permutation(block), first);
    let block = feistel_round(swap_halves(block), second);
    inverse_initial_permutation(block)
}

/// A cipher instance with its subkeys derived once.
#[derive(Clone, Copy, Debug)]
pub struct Sdes {
    subkeys: Subkeys,
}

impl Sdes {
    pub fn new(key: CipherKey) -> Self {
        let subkeys = key_schedule(key);
        debug!("sdes subkeys derived");
        Self { subkeys }
    }

    pub fn subkeys(&self) -> Subkeys {
        self.subkeys
    }

    pub fn encrypt_byte(&self, byte: u8) -> u8 {
        run_rounds(byte, self.subkeys.first, self.subkeys.second)
    }

    pub fn decrypt_byte(&self, byte: u8) -> u8 {
        run_rounds(byte, self.subkeys.second, self.subkeys.first)
    }

    pub fn encrypt_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|&b| self.encrypt_byte(b)).collect()
    }

    /// Encrypts ASCII text into its binary-digit ciphertext.
    pub fn encrypt(&self, text: &str) -> Result<String, CryptoError> {
        if let Some((index, found)) = text.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(CryptoError::NonAsciiPlaintext { index, found });
        }
        let ciphertext = to_bit_string(&self.encrypt_bytes(text.as_bytes()));
        debug!("sdes encrypt chars={} bits={}", text.len(), ciphertext.len());
        Ok(ciphertext)
    }

    pub fn decrypt_bytes(&self, bits: &str) -> Result<Vec<u8>, CryptoError> {
        let blocks = from_bit_string(bits)?;
        Ok(blocks.into_iter().map(|b| self.decrypt_byte(b)).collect())
    }

    /// Decrypts a binary-digit ciphertext. Each recovered byte becomes the
    /// `char` with the same code point.
    pub fn decrypt(&self, bits: &str) -> Result<String, CryptoError> {
        let plain: String = self.decrypt_bytes(bits)?.into_iter().map(char::from).collect();
        debug!("sdes decrypt bits={} chars={}", bits.len(), plain.chars().count());
        Ok(plain)
    }
}

pub fn encrypt_byte(byte: u8, key: CipherKey) -> u8 {
    Sdes::new(key).encrypt_byte(byte)
}

pub fn decrypt_byte(byte: u8, key: CipherKey) -> u8 {
    Sdes::new(key).decrypt_byte(byte)
}

pub fn encrypt(text: &str, key: CipherKey) -> Result<String, CryptoError> {
    Sdes::new(key).encrypt(text)
}

pub fn decrypt(bits: &str, key: CipherKey) -> Result<String, CryptoError> {
    Sdes::new(key).decrypt(bits)
}
