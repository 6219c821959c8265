use std::fmt;

use log::debug;
use rand::Rng;

use crate::bbs::cipher_key_from_secret;
use crate::dh::{DhParams, KeyBundle, KeyPair, keygen_with_rng, shared_key};
use crate::error::CryptoError;
use crate::preset::ExchangeBounds;
use crate::rng::secure_rng;
use crate::sdes::{self, CipherKey};

/// One chat participant: the session's DH parameters plus its own key pair.
///
/// Nothing about a peer is stored. Every call taking a peer public key
/// recomputes the shared secret and the cipher key from scratch, so one
/// session can talk to any number of peers concurrently through `&self`.
pub struct ChatSession {
    params: DhParams,
    keys: KeyPair,
}

impl ChatSession {
    /// Joins a session with a freshly generated key pair.
    pub fn join(params: DhParams) -> Result<Self, CryptoError> {
        let mut rng = secure_rng();
        Self::join_with_rng(params, &ExchangeBounds::standard(), &mut rng)
    }

    pub fn join_with_rng<R: Rng + ?Sized>(
        params: DhParams,
        bounds: &ExchangeBounds,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        let keys = keygen_with_rng(&params, bounds, rng)?;
        debug!(
            "joined session modulus={} public={}",
            params.modulus, keys.public
        );
        Ok(Self { params, keys })
    }

    /// Restores a participant from stored keys, rejecting unusable
    /// parameters and a public key that does not belong to the private one.
    pub fn from_keys(params: DhParams, keys: KeyPair) -> Result<Self, CryptoError> {
        let bundle = KeyBundle::new(params, keys);
        bundle.validate()?;
        Ok(Self {
            params: bundle.params,
            keys: bundle.keys.clone(),
        })
    }

    pub fn from_bundle(bundle: &KeyBundle) -> Result<Self, CryptoError> {
        bundle.validate()?;
        Ok(Self {
            params: bundle.params,
            keys: bundle.keys.clone(),
        })
    }

    pub fn params(&self) -> &DhParams {
        &self.params
    }

    pub fn public_key(&self) -> u64 {
        self.keys.public
    }

    /// The record a tool persists to resume this participant later.
    pub fn bundle(&self) -> KeyBundle {
        KeyBundle::new(self.params, self.keys.clone())
    }

    /// # Panics
    ///
    /// Panics if `peer_public` is outside `[1, modulus)`.
    pub fn shared_secret(&self, peer_public: u64) -> u64 {
        let modulus = self.params.modulus;
        assert!(
            (1..modulus).contains(&peer_public),
            "peer public key {peer_public} outside [1, {modulus})"
        );
        shared_key(peer_public, self.keys.private, modulus)
    }

    pub fn cipher_key(&self, peer_public: u64) -> Result<CipherKey, CryptoError> {
        cipher_key_from_secret(self.shared_secret(peer_public))
    }

    /// Encrypts ASCII text for `peer_public`, returning the binary-digit
    /// ciphertext.
    pub fn encrypt_for(&self, peer_public: u64, text: &str) -> Result<String, CryptoError> {
        sdes::encrypt(text, self.cipher_key(peer_public)?)
    }

    pub fn decrypt_from(&self, peer_public: u64, bits: &str) -> Result<String, CryptoError> {
        sdes::decrypt(bits, self.cipher_key(peer_public)?)
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("params", &self.params)
            .field("public", &self.keys.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dh::public_key;
    use crate::rng::derive_session_rng;

    fn pair(seed: &[u8]) -> (ChatSession, ChatSession) {
        let params = DhParams::for_modulus(65521).unwrap();
        let bounds = ExchangeBounds::standard();
        let mut rng = derive_session_rng(seed, b"session");
        let alice = ChatSession::join_with_rng(params, &bounds, &mut rng).unwrap();
        let bob = ChatSession::join_with_rng(params, &bounds, &mut rng).unwrap();
        (alice, bob)
    }

    #[test]
    fn peers_agree_on_secret_and_key() {
        let (alice, bob) = pair(b"agree");
        let secret = alice.shared_secret(bob.public_key());
        assert_eq!(secret, bob.shared_secret(alice.public_key()));
        assert!(secret >= 1 && secret < 65521);
        assert_eq!(
            alice.cipher_key(bob.public_key()).unwrap(),
            bob.cipher_key(alice.public_key()).unwrap()
        );
    }

    #[test]
    fn messages_cross_between_peers() {
        let (alice, bob) = pair(b"chat");
        let bits = alice.encrypt_for(bob.public_key(), "meet at noon").unwrap();
        assert_eq!(bits.len(), 12 * 8);
        assert_eq!(
            bob.decrypt_from(alice.public_key(), &bits).unwrap(),
            "meet at noon"
        );
        let reply = bob.encrypt_for(alice.public_key(), "ok").unwrap();
        assert_eq!(alice.decrypt_from(bob.public_key(), &reply).unwrap(), "ok");
    }

    #[test]
    fn restored_session_agrees_with_live_one() {
        let (alice, bob) = pair(b"restore");
        let bundle = alice.bundle();
        let restored = ChatSession::from_bundle(&bundle).unwrap();
        assert_eq!(restored.public_key(), alice.public_key());
        assert_eq!(
            restored.shared_secret(bob.public_key()),
            alice.shared_secret(bob.public_key())
        );
    }

    #[test]
    fn mismatched_keys_rejected() {
        let params = DhParams::for_modulus(2063).unwrap();
        let keys = KeyPair {
            private: 2053,
            public: public_key(2053, &params),
        };
        let forged = KeyPair {
            private: keys.private,
            public: keys.public % 2062 + 1,
        };
        let forged_public = forged.public;
        assert!(ChatSession::from_keys(params, keys).is_ok());
        assert_eq!(
            ChatSession::from_keys(params, forged).unwrap_err(),
            CryptoError::KeyMismatch {
                public: forged_public,
                modulus: 2063
            }
        );
    }

    #[test]
    fn bad_stored_params_rejected_without_panicking() {
        let keys = KeyPair {
            private: 0,
            public: 0,
        };
        let bundle = KeyBundle::new(
            DhParams {
                modulus: 1,
                generator: 0,
            },
            keys,
        );
        assert_eq!(
            ChatSession::from_bundle(&bundle).unwrap_err(),
            CryptoError::ModulusNotPrime { modulus: 1 }
        );
        let wrong_root = DhParams {
            modulus: 65521,
            generator: 2,
        };
        let keys = KeyPair {
            private: 2053,
            public: public_key(2053, &wrong_root),
        };
        assert!(matches!(
            ChatSession::from_keys(wrong_root, keys),
            Err(CryptoError::GeneratorMismatch { expected: 17, .. })
        ));
    }

    #[test]
    fn debug_hides_private_key() {
        let params = DhParams::for_modulus(2063).unwrap();
        let keys = KeyPair {
            private: 2053,
            public: public_key(2053, &params),
        };
        let session = ChatSession::from_keys(params, keys).unwrap();
        let rendered = format!("{session:?}");
        assert!(rendered.contains("public"));
        assert!(!rendered.contains("2053"));
    }

    #[test]
    #[should_panic(expected = "outside [1, 65521)")]
    fn zero_peer_key_is_fatal() {
        let (alice, _) = pair(b"zero");
        let _ = alice.shared_secret(0);
    }

    #[test]
    #[should_panic(expected = "outside [1, 65521)")]
    fn peer_key_at_modulus_is_fatal() {
        let (alice, _) = pair(b"modulus");
        let _ = alice.shared_secret(65521);
    }
}
