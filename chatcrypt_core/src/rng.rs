//! RNG helpers distinguishing reproducible session randomness and the
//! secure system RNG.
//!
//! Parameter and key generation default to the OS-backed `OsRng`. Tests,
//! benches and the demo's `--seed` flag instead derive a `ChaCha20Rng` from
//! a BLAKE3 hash of a caller seed and a label, so whole runs can be replayed.

use blake3::Hasher;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

/// Convenience alias for the OS-backed RNG used for key generation.
pub type SecureRng = OsRng;

/// Deterministic RNG derived from a caller seed and a domain label.
pub fn derive_session_rng(seed: &[u8], label: &[u8]) -> ChaCha20Rng {
    let mut hasher = Hasher::new();
    hasher.update(b"chatcrypt::session-rng");
    hasher.update(&(seed.len() as u64).to_le_bytes());
    hasher.update(seed);
    hasher.update(label);
    ChaCha20Rng::from_seed(*hasher.finalize().as_bytes())
}

pub fn secure_rng() -> SecureRng {
    OsRng
}
