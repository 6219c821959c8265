use crate::error::CryptoError;
use crate::primes::{PRIMITIVE_ROOT_LIMIT, prime_table};

pub const STANDARD_MODULUS_MIN: u64 = 1 << 11;
pub const STANDARD_MODULUS_MAX: u64 = 1 << 16;

/// Ranges for the session modulus and the participants' private keys.
///
/// Moduli are drawn from `[modulus_min, modulus_max)`, private keys from
/// `[private_min, modulus)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeBounds {
    pub modulus_min: u64,
    pub modulus_max: u64,
    pub private_min: u64,
}

impl ExchangeBounds {
    pub const fn standard() -> Self {
        Self {
            modulus_min: STANDARD_MODULUS_MIN,
            modulus_max: STANDARD_MODULUS_MAX,
            private_min: STANDARD_MODULUS_MIN,
        }
    }

    /// Custom modulus range. It must hold at least two primes so that a
    /// private key below the chosen modulus always exists.
    pub fn new(modulus_min: u64, modulus_max: u64) -> Result<Self, CryptoError> {
        if modulus_max > PRIMITIVE_ROOT_LIMIT + 1 {
            return Err(CryptoError::PrimeRangeOutsideTable {
                low: modulus_min,
                high: modulus_max,
                limit: PRIMITIVE_ROOT_LIMIT + 1,
            });
        }
        let primes = prime_table().primes();
        let start = primes.partition_point(|&p| p < modulus_min);
        let end = primes.partition_point(|&p| p < modulus_max);
        if end < start + 2 {
            return Err(CryptoError::EmptyPrimeRange {
                low: modulus_min,
                high: modulus_max,
            });
        }
        Ok(Self {
            modulus_min,
            modulus_max,
            private_min: modulus_min,
        })
    }

    /// Smallest modulus handed out by parameter generation: one past the
    /// first prime at or above `private_min`.
    pub fn modulus_floor(&self) -> Result<u64, CryptoError> {
        let first = prime_table().next_prime(self.private_min.saturating_sub(1))?;
        Ok(self.modulus_min.max(first + 1))
    }
}

impl Default for ExchangeBounds {
    fn default() -> Self {
        Self::standard()
    }
}
