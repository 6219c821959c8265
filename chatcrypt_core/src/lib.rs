//! Cryptographic core of a small peer-to-peer text chat.
//!
//! Peers agree on a secret with Diffie-Hellman over a 11 to 16-bit prime
//! modulus, stretch it into a 10-bit key with Blum Blum Shub, and encipher
//! each character with Simplified DES. All of it is a teaching-grade toy
//! and must **not** be used to protect real traffic.

pub mod bbs;
pub mod bits;
pub mod dh;
pub mod error;
pub mod permutation;
pub mod preset;
pub mod primes;
pub mod rng;
pub mod sdes;
pub mod session;
pub mod versioning;

pub use crate::bbs::{
    BitBalance, BlumBlumShub, MAX_SEED, bit_balance, blum_blum_shub, cipher_key_from_secret,
};
pub use crate::bits::{BLOCK_BITS, from_bit_string, to_bit_string};
pub use crate::dh::{
    DhParams, KeyBundle, KeyPair, generate_parameters, generate_parameters_with_rng, keygen,
    keygen_with_rng, mod_pow, private_key, private_key_with_rng, public_key, shared_key,
};
pub use crate::error::CryptoError;
pub use crate::preset::{ExchangeBounds, STANDARD_MODULUS_MAX, STANDARD_MODULUS_MIN};
pub use crate::primes::{
    PRIMITIVE_ROOT_LIMIT, PrimeTable, SIEVE_LIMIT, is_prime, next_prime, prev_prime, prime_table,
    primitive_root, random_prime, sieve,
};
pub use crate::rng::{SecureRng, derive_session_rng, secure_rng};
pub use crate::sdes::{CipherKey, KEY_BITS, Sdes, Subkeys, decrypt, encrypt, key_schedule};
pub use crate::session::ChatSession;
pub use crate::versioning::*;
