//! Prime utilities backed by a process-wide sieve table.
//!
//! The table holds every prime below [`SIEVE_LIMIT`]. It is built on first
//! use and never mutated afterwards, so any number of threads may query it
//! without locking. Searches that leave the table fall back to trial
//! division instead of wrapping back into it.

use log::debug;
use once_cell::sync::Lazy;
use rand::Rng;

use crate::error::CryptoError;
use crate::rng::secure_rng;

/// Exclusive upper bound of the shared sieve (17-bit primes).
pub const SIEVE_LIMIT: u64 = 1 << 17;

/// Largest modulus accepted by [`primitive_root`]; the search is quadratic.
pub const PRIMITIVE_ROOT_LIMIT: u64 = 1 << 16;

static PRIME_TABLE: Lazy<PrimeTable> = Lazy::new(|| PrimeTable::new(SIEVE_LIMIT));

/// Returns the shared prime table, building it on the first call.
pub fn prime_table() -> &'static PrimeTable {
    &PRIME_TABLE
}

/// [`PrimeTable::next_prime`] on the shared table.
pub fn next_prime(v: u64) -> Result<u64, CryptoError> {
    prime_table().next_prime(v)
}

pub fn prev_prime(v: u64) -> Option<u64> {
    prime_table().prev_prime(v)
}

pub fn random_prime(low: u64, high: u64) -> Result<u64, CryptoError> {
    prime_table().random_prime(low, high)
}

/// Sieve of Eratosthenes: every prime strictly below `limit`, ascending.
pub fn sieve(limit: u64) -> Vec<u64> {
    let size = limit as usize;
    let mut candidates = vec![true; size];
    let mut i = 2;
    while i * i < size {
        if candidates[i] {
            for multiple in (i * i..size).step_by(i) {
                candidates[multiple] = false;
            }
        }
        i += 1;
    }
    (2..size)
        .filter(|&n| candidates[n])
        .map(|n| n as u64)
        .collect()
}

/// Trial division up to `floor(sqrt(n))`. Works for any `n`, inside the
/// table range or not.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut divisor = 2;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

#[derive(Clone, Debug)]
pub struct PrimeTable {
    limit: u64,
    primes: Vec<u64>,
}

impl PrimeTable {
    pub fn new(limit: u64) -> Self {
        let primes = sieve(limit);
        debug!("sieve built limit={} primes={}", limit, primes.len());
        Self { limit, primes }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// Table membership; always false at or above the sieve limit.
    pub fn contains(&self, n: u64) -> bool {
        n < self.limit && self.primes.binary_search(&n).is_ok()
    }

    /// Smallest prime strictly greater than `v`.
    ///
    /// Past the last table entry the search continues by trial division, so
    /// the result is always the true successor. Fails only when the scan
    /// would overflow `u64`.
    pub fn next_prime(&self, v: u64) -> Result<u64, CryptoError> {
        let idx = self.primes.partition_point(|&p| p <= v);
        if let Some(&p) = self.primes.get(idx) {
            return Ok(p);
        }
        // Every prime below the limit is in the table.
        let mut candidate = v.max(self.limit.saturating_sub(1));
        debug!("next_prime leaving sieve table from={} start={}", v, candidate);
        loop {
            candidate = candidate
                .checked_add(1)
                .ok_or(CryptoError::SearchExhausted { from: v })?;
            if is_prime(candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Largest prime strictly smaller than `v`, or `None` below 3.
    pub fn prev_prime(&self, v: u64) -> Option<u64> {
        if v > self.limit {
            if let Some(p) = (self.limit..v).rev().find(|&n| is_prime(n)) {
                return Some(p);
            }
        }
        let idx = self.primes.partition_point(|&p| p < v);
        idx.checked_sub(1).map(|i| self.primes[i])
    }

    /// Uniformly random prime in `[low, high)` drawn by table index.
    pub fn random_prime(&self, low: u64, high: u64) -> Result<u64, CryptoError> {
        let mut rng = secure_rng();
        self.random_prime_with_rng(low, high, &mut rng)
    }

    pub fn random_prime_with_rng<R: Rng + ?Sized>(
        &self,
        low: u64,
        high: u64,
        rng: &mut R,
    ) -> Result<u64, CryptoError> {
        if high > self.limit {
            return Err(CryptoError::PrimeRangeOutsideTable {
                low,
                high,
                limit: self.limit,
            });
        }
        let start = self.primes.partition_point(|&p| p < low);
        let end = self.primes.partition_point(|&p| p < high);
        if start >= end {
            return Err(CryptoError::EmptyPrimeRange { low, high });
        }
        Ok(self.primes[rng.gen_range(start..end)])
    }
}

/// Smallest `g` whose powers `g^1..g^(modulus-1)` reproduce exactly the set
/// of residues coprime to `modulus`. `None` when no such generator exists.
///
/// # Panics
///
/// Panics if `modulus` exceeds [`PRIMITIVE_ROOT_LIMIT`].
pub fn primitive_root(modulus: u64) -> Option<u64> {
    assert!(
        modulus <= PRIMITIVE_ROOT_LIMIT,
        "primitive root search is bounded to moduli <= {PRIMITIVE_ROOT_LIMIT}, got {modulus}"
    );
    if modulus < 2 {
        return None;
    }
    let coprime: Vec<bool> = (0..modulus).map(|i| gcd(i, modulus) == 1).collect();
    let totient = coprime.iter().filter(|&&c| c).count();
    let mut seen = vec![false; modulus as usize];
    (1..modulus)
        .filter(|&g| coprime[g as usize])
        .find(|&g| cycle_len(g, modulus, &mut seen) == totient)
}

// Number of distinct powers of a unit `g`. The first repeated power closes
// the cycle, so the walk stops there.
fn cycle_len(g: u64, modulus: u64, seen: &mut [bool]) -> usize {
    seen.fill(false);
    let mut value = 1;
    let mut distinct = 0;
    for _ in 1..modulus {
        value = value * g % modulus;
        if seen[value as usize] {
            break;
        }
        seen[value as usize] = true;
        distinct += 1;
    }
    distinct
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
