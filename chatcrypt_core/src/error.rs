use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("prime search starting at {from} ran past the largest representable value")]
    SearchExhausted { from: u64 },

    #[error("prime range [{low}, {high}) is outside the sieve table (limit {limit})")]
    PrimeRangeOutsideTable { low: u64, high: u64, limit: u64 },

    #[error("no prime in range [{low}, {high})")]
    EmptyPrimeRange { low: u64, high: u64 },

    #[error("no primitive root exists for {modulus}")]
    NoPrimitiveRoot { modulus: u64 },

    #[error("modulus {modulus} is not prime")]
    ModulusNotPrime { modulus: u64 },

    #[error("modulus {modulus} exceeds the primitive root search limit {limit}")]
    ModulusTooLarge { modulus: u64, limit: u64 },

    #[error("{generator} is not the primitive root of modulus {modulus} (expected {expected})")]
    GeneratorMismatch {
        generator: u64,
        modulus: u64,
        expected: u64,
    },

    #[error("public key {public} does not belong to the private key under modulus {modulus}")]
    KeyMismatch { public: u64, modulus: u64 },

    #[error("seed {seed} outside the accepted range 1..={max}")]
    SeedOutOfRange { seed: u64, max: u64 },

    #[error("key value {value:#x} does not fit in {bits} bits")]
    KeyWidth { value: u64, bits: u32 },

    #[error("ciphertext length {len} is not a multiple of 8 bits")]
    MalformedCiphertext { len: usize },

    #[error("invalid binary digit {found:?} at position {index}")]
    InvalidBinaryDigit { index: usize, found: char },

    #[error("non-ASCII character {found:?} at position {index}")]
    NonAsciiPlaintext { index: usize, found: char },

    #[error("serialization version mismatch for {context}: expected {expected}, found {found}")]
    VersionMismatch {
        context: &'static str,
        expected: u16,
        found: u16,
    },
}
