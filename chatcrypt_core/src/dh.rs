//! Diffie-Hellman key exchange over 11 to 16-bit prime moduli.
//!
//! Parameters are a prime modulus and its smallest primitive root. Private
//! keys are themselves primes drawn below the modulus, matching the wire
//! behaviour peers already expect.

use log::debug;
use rand::Rng;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::preset::ExchangeBounds;
use crate::primes::{PRIMITIVE_ROOT_LIMIT, is_prime, prime_table, primitive_root};
use crate::rng::secure_rng;
use crate::versioning::{DH_PARAMS_VERSION, KEY_BUNDLE_VERSION, check_version, expect_version};

/// Session parameters: a prime modulus and a primitive root of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DhParams {
    pub modulus: u64,
    pub generator: u64,
}

impl DhParams {
    /// Parameters for a caller-chosen modulus, using its smallest primitive root.
    pub fn for_modulus(modulus: u64) -> Result<Self, CryptoError> {
        check_modulus(modulus)?;
        let generator = primitive_root(modulus).ok_or(CryptoError::NoPrimitiveRoot { modulus })?;
        Ok(Self { modulus, generator })
    }

    /// Checks that the modulus is a prime within the searchable range and
    /// that the generator is its smallest primitive root.
    pub fn validate(&self) -> Result<(), CryptoError> {
        let expected = Self::for_modulus(self.modulus)?.generator;
        if self.generator != expected {
            return Err(CryptoError::GeneratorMismatch {
                generator: self.generator,
                modulus: self.modulus,
                expected,
            });
        }
        Ok(())
    }
}

fn check_modulus(modulus: u64) -> Result<(), CryptoError> {
    if modulus > PRIMITIVE_ROOT_LIMIT {
        return Err(CryptoError::ModulusTooLarge {
            modulus,
            limit: PRIMITIVE_ROOT_LIMIT,
        });
    }
    if !is_prime(modulus) {
        return Err(CryptoError::ModulusNotPrime { modulus });
    }
    Ok(())
}

impl Serialize for DhParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("DhParams", 3)?;
        state.serialize_field("version", &DH_PARAMS_VERSION)?;
        state.serialize_field("modulus", &self.modulus)?;
        state.serialize_field("generator", &self.generator)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DhParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            modulus: u64,
            generator: u64,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(helper.version, DH_PARAMS_VERSION, "DhParams")?;
        let params = Self {
            modulus: helper.modulus,
            generator: helper.generator,
        };
        params.validate().map_err(serde::de::Error::custom)?;
        Ok(params)
    }
}

/// One participant's key pair. `public = generator^private mod modulus`.
///
/// The private half is wiped when the pair is dropped, so every copy handed
/// out (a session, a bundle, a clone) cleans up after itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub private: u64,
    pub public: u64,
}

impl Zeroize for KeyPair {
    fn zeroize(&mut self) {
        self.private.zeroize();
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for KeyPair {}

/// Parameters plus a key pair, as stored by tools that persist a participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBundle {
    pub version: u16,
    pub params: DhParams,
    pub keys: KeyPair,
}

impl KeyBundle {
    pub fn new(params: DhParams, keys: KeyPair) -> Self {
        Self {
            version: KEY_BUNDLE_VERSION,
            params,
            keys,
        }
    }

    /// Checks the record version, the parameters, and that the public key
    /// matches the private one.
    pub fn validate(&self) -> Result<(), CryptoError> {
        check_version(self.version, KEY_BUNDLE_VERSION, "KeyBundle")?;
        self.params.validate()?;
        let modulus = self.params.modulus;
        if self.keys.private >= modulus
            || public_key(self.keys.private, &self.params) != self.keys.public
        {
            return Err(CryptoError::KeyMismatch {
                public: self.keys.public,
                modulus,
            });
        }
        Ok(())
    }
}

impl Serialize for KeyBundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("KeyBundle", 3)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("params", &self.params)?;
        state.serialize_field("keys", &self.keys)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for KeyBundle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            params: DhParams,
            keys: KeyPair,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(helper.version, KEY_BUNDLE_VERSION, "KeyBundle")?;
        Ok(Self {
            version: helper.version,
            params: helper.params,
            keys: helper.keys,
        })
    }
}

pub fn generate_parameters() -> Result<DhParams, CryptoError> {
    let mut rng = secure_rng();
    generate_parameters_with_rng(ExchangeBounds::standard(), &mut rng)
}

pub fn generate_parameters_with_rng<R: Rng + ?Sized>(
    bounds: ExchangeBounds,
    rng: &mut R,
) -> Result<DhParams, CryptoError> {
    let floor = bounds.modulus_floor()?;
    let modulus = prime_table().random_prime_with_rng(floor, bounds.modulus_max, rng)?;
    let params = DhParams::for_modulus(modulus)?;
    debug!(
        "dh parameters modulus={} generator={}",
        params.modulus, params.generator
    );
    Ok(params)
}

pub fn private_key(modulus: u64) -> Result<u64, CryptoError> {
    let mut rng = secure_rng();
    private_key_with_rng(modulus, &ExchangeBounds::standard(), &mut rng)
}

/// Random prime in `[bounds.private_min, modulus)`.
pub fn private_key_with_rng<R: Rng + ?Sized>(
    modulus: u64,
    bounds: &ExchangeBounds,
    rng: &mut R,
) -> Result<u64, CryptoError> {
    prime_table().random_prime_with_rng(bounds.private_min, modulus, rng)
}

/// `generator^private mod modulus`.
///
/// # Panics
///
/// Panics if the modulus is below 2.
pub fn public_key(private: u64, params: &DhParams) -> u64 {
    assert!(params.modulus > 1, "modulus must be at least 2");
    mod_pow(params.generator, private, params.modulus)
}

/// `peer_public^private mod modulus`; both sides arrive at the same value.
///
/// # Panics
///
/// Panics if the modulus is below 2.
pub fn shared_key(peer_public: u64, private: u64, modulus: u64) -> u64 {
    assert!(modulus > 1, "modulus must be at least 2");
    mod_pow(peer_public, private, modulus)
}

pub fn keygen(params: &DhParams) -> Result<KeyPair, CryptoError> {
    let mut rng = secure_rng();
    keygen_with_rng(params, &ExchangeBounds::standard(), &mut rng)
}

pub fn keygen_with_rng<R: Rng + ?Sized>(
    params: &DhParams,
    bounds: &ExchangeBounds,
    rng: &mut R,
) -> Result<KeyPair, CryptoError> {
    let private = private_key_with_rng(params.modulus, bounds, rng)?;
    Ok(KeyPair {
        private,
        public: public_key(private, params),
    })
}

/// Square-and-multiply modular exponentiation with 128-bit intermediates.
pub fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus != 0, "modulus must be non-zero");
    let m = modulus as u128;
    let mut base = base as u128 % m;
    let mut result = 1u128 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    result as u64
}
