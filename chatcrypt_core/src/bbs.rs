//! Blum Blum Shub pseudorandom bit generator.
//!
//! A seed (the Diffie-Hellman shared secret) picks two primes `p, q ≡ 3 mod 4`
//! that do not divide it. The state is squared modulo `N = p·q` and the low
//! bit of every new state is emitted. Everything is recomputed from the seed,
//! so two peers holding the same secret derive the same bits.

use log::debug;
use rand::Rng;

use crate::error::CryptoError;
use crate::primes::prime_table;
use crate::sdes::{CipherKey, KEY_BITS};

/// Largest accepted seed. Keeps `N = p·q` below 2^64 so squaring fits in u128.
pub const MAX_SEED: u64 = (1 << 30) - 1;

const BALANCE_SEED_MIN: u64 = 1 << 7;
const BALANCE_SEED_MAX: u64 = 1 << 16;

/// Smallest prime `p > seed` with `p mod 4 == 3` and `seed mod p != 0`.
pub fn select_modulus_prime(seed: u64) -> Result<u64, CryptoError> {
    select_prime_after(seed, seed)
}

fn select_prime_after(seed: u64, start: u64) -> Result<u64, CryptoError> {
    // Every prime divides zero, so the scan below would never stop.
    if seed == 0 {
        return Err(CryptoError::SeedOutOfRange {
            seed,
            max: MAX_SEED,
        });
    }
    let table = prime_table();
    let mut p = table.next_prime(start)?;
    while p % 4 != 3 || seed % p == 0 {
        p = table.next_prime(p)?;
    }
    Ok(p)
}

#[derive(Clone, Debug)]
pub struct BlumBlumShub {
    p: u64,
    q: u64,
    modulus: u64,
    state: u64,
}

impl BlumBlumShub {
    pub fn from_seed(seed: u64) -> Result<Self, CryptoError> {
        if seed == 0 || seed > MAX_SEED {
            return Err(CryptoError::SeedOutOfRange {
                seed,
                max: MAX_SEED,
            });
        }
        let p = select_modulus_prime(seed)?;
        let rotated = seed.rotate_left(2);
        let mut q = select_modulus_prime(rotated)?;
        if q == p {
            q = select_prime_after(rotated, q)?;
        }
        let modulus = p * q;
        let state = square_mod(seed, modulus);
        debug!("bbs seeded p={} q={} n={}", p, q, modulus);
        Ok(Self {
            p,
            q,
            modulus,
            state,
        })
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    pub fn q(&self) -> u64 {
        self.q
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn next_bit(&mut self) -> u8 {
        self.state = square_mod(self.state, self.modulus);
        (self.state & 1) as u8
    }

    /// Next `count` bits packed most-significant-first.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds 64.
    pub fn next_bits(&mut self, count: u32) -> u64 {
        assert!(count <= u64::BITS, "at most 64 bits fit in one word, got {count}");
        (0..count).fold(0u64, |acc, _| (acc << 1) | self.next_bit() as u64)
    }

    /// Next `count` bits as ASCII binary digits.
    pub fn next_bit_string(&mut self, count: usize) -> String {
        self.by_ref()
            .take(count)
            .map(|bit| if bit == 1 { '1' } else { '0' })
            .collect()
    }
}

impl Iterator for BlumBlumShub {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_bit())
    }
}

fn square_mod(value: u64, modulus: u64) -> u64 {
    let v = value as u128;
    (v * v % modulus as u128) as u64
}

/// `num_bits` bits generated from `seed`, as the integer they encode.
pub fn blum_blum_shub(num_bits: u32, seed: u64) -> Result<u64, CryptoError> {
    let mut generator = BlumBlumShub::from_seed(seed)?;
    Ok(generator.next_bits(num_bits))
}

/// Cipher key for a shared secret: the first 10 generator bits.
pub fn cipher_key_from_secret(shared_secret: u64) -> Result<CipherKey, CryptoError> {
    CipherKey::new(blum_blum_shub(KEY_BITS, shared_secret)?)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitBalance {
    pub zeros: u64,
    pub ones: u64,
}

impl BitBalance {
    pub fn total(&self) -> u64 {
        self.zeros + self.ones
    }

    pub fn ones_ratio(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.ones as f64 / self.total() as f64
    }
}

/// Statistical self-test: counts the bits of `sessions` generators, each
/// seeded at random and run for `bits_per_session` steps. A healthy
/// generator lands close to an even split.
pub fn bit_balance<R: Rng + ?Sized>(
    sessions: usize,
    bits_per_session: usize,
    rng: &mut R,
) -> Result<BitBalance, CryptoError> {
    let mut balance = BitBalance::default();
    for _ in 0..sessions {
        let seed = rng.gen_range(BALANCE_SEED_MIN..BALANCE_SEED_MAX);
        let ones = BlumBlumShub::from_seed(seed)?
            .take(bits_per_session)
            .filter(|&bit| bit == 1)
            .count() as u64;
        balance.ones += ones;
        balance.zeros += bits_per_session as u64 - ones;
    }
    debug!(
        "bit balance sessions={} zeros={} ones={}",
        sessions, balance.zeros, balance.ones
    );
    Ok(balance)
}
