//! Version tags carried by serialized key material.

use serde::de::Error as DeError;

use crate::error::CryptoError;

pub const DH_PARAMS_VERSION: u16 = 1;
pub const KEY_BUNDLE_VERSION: u16 = 1;

pub fn check_version(found: u16, expected: u16, context: &'static str) -> Result<(), CryptoError> {
    if found == expected {
        Ok(())
    } else {
        Err(CryptoError::VersionMismatch {
            context,
            expected,
            found,
        })
    }
}

/// [`check_version`] for `Deserialize` impls, reported through the
/// deserializer's own error type.
pub fn expect_version<E: DeError>(
    found: u16,
    expected: u16,
    context: &'static str,
) -> Result<(), E> {
    check_version(found, expected, context).map_err(E::custom)
}
