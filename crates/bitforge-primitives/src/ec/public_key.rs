//! secp256k1 public key.
//!
//! A public key keeps the SEC1 form it was created with so that
//! `to_bytes` (and everything hashed from it, such as addresses) matches
//! the encoding that appears in scripts.

use k256::ecdsa::VerifyingKey;
use std::fmt;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
#[derive(Clone, Debug)]
pub struct PublicKey {
    inner: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    /// Parse a SEC1-encoded public key.
    ///
    /// # Arguments
    /// * `bytes` - A 33-byte compressed or 65-byte uncompressed key.
    ///
    /// # Returns
    /// `Ok(PublicKey)`, or `InvalidPublicKey` if the bytes are not a point
    /// on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let compressed = match bytes.len() {
            COMPRESSED_LEN => true,
            UNCOMPRESSED_LEN => false,
            n => {
                return Err(PrimitivesError::InvalidPublicKey(format!(
                    "invalid length {}",
                    n
                )))
            }
        };
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner, compressed })
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    /// Serialize in the SEC1 form this key carries.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }

    /// Serialize in compressed SEC1 form.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(self.inner.to_encoded_point(true).as_bytes());
        out
    }

    /// Serialize in uncompressed SEC1 form.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(self.inner.to_encoded_point(false).as_bytes());
        out
    }

    /// Whether `to_bytes` yields the compressed form.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Hex of `to_bytes`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// HASH160 of `to_bytes`, the payload of a pay-to-pubkey-hash address.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    /// Verify `sig` over a 32-byte message hash.
    pub fn verify(&self, hash: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
