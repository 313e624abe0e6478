//! secp256k1 private key with WIF import/export and deterministic signing.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::network::Network;
use crate::PrimitivesError;

/// Length of a serialized private key scalar.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Flag byte appended to a WIF payload whose public key is compressed.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key.
///
/// Remembers whether its public key should be serialized compressed; keys
/// created from raw bytes or at random default to compressed.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
        }
    }

    /// Create a private key from a raw 32-byte big-endian scalar.
    ///
    /// # Arguments
    /// * `bytes` - The scalar; must be non-zero and below the curve order.
    ///
    /// # Returns
    /// `Ok(PrivateKey)`, or `InvalidPrivateKey` for a wrong length or an
    /// out-of-range scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey {
            inner,
            compressed: true,
        })
    }

    /// Create a private key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a WIF string.
    ///
    /// The network is recognised from the version byte; a 33-byte payload
    /// ending in 0x01 marks a compressed key.
    ///
    /// # Returns
    /// The key and the network it was encoded for, or `InvalidWif` /
    /// `ChecksumMismatch`.
    pub fn from_wif(wif: &str) -> Result<(Self, &'static Network), PrimitivesError> {
        let payload = base58::check_decode(wif).map_err(|e| match e {
            PrimitivesError::ChecksumMismatch => e,
            other => PrimitivesError::InvalidWif(other.to_string()),
        })?;

        let (prefix, body) = payload
            .split_first()
            .ok_or_else(|| PrimitivesError::InvalidWif("empty payload".to_string()))?;
        let network = Network::from_wif_prefix(*prefix).ok_or_else(|| {
            PrimitivesError::InvalidWif(format!("unknown version byte 0x{:02x}", prefix))
        })?;

        let (key_bytes, compressed) = match body.len() {
            33 if body[32] == COMPRESS_MAGIC => (&body[..32], true),
            32 => (body, false),
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "malformed private key: invalid length {}",
                    n
                )))
            }
        };

        let mut key = Self::from_bytes(key_bytes)?;
        key.compressed = compressed;
        Ok((key, network))
    }

    /// Encode the key as WIF for `network`.
    pub fn to_wif(&self, network: &Network) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1);
        payload.push(network.wif_prefix);
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        let wif = base58::check_encode(&payload);
        payload.zeroize();
        wif
    }

    /// Serialize the scalar as 32 big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Serialize the scalar as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Whether the public key is serialized compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Return a copy of this key with the given public key compression.
    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Derive the corresponding public key.
    pub fn to_public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(*self.inner.verifying_key(), self.compressed)
    }

    /// Sign a 32-byte message hash with an RFC6979 nonce.
    ///
    /// The signature is low-S normalized.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes() && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;
    use crate::network::{LIVENET, TESTNET};

    /// Private key 1 and its well-known WIF encodings.
    const ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const ONE_WIF_COMPRESSED: &str = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
    const ONE_WIF_UNCOMPRESSED: &str = "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf";

    #[test]
    fn test_from_bytes_rejects_bad_scalars() {
        assert!(PrivateKey::from_bytes(&[0u8; 31]).is_err());
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_hex(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
        )
        .is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_wif_known_vectors() {
        let key = PrivateKey::from_hex(ONE).unwrap();
        assert_eq!(key.to_wif(&LIVENET), ONE_WIF_COMPRESSED);
        assert_eq!(
            key.clone().with_compression(false).to_wif(&LIVENET),
            ONE_WIF_UNCOMPRESSED
        );

        let (decoded, network) = PrivateKey::from_wif(ONE_WIF_UNCOMPRESSED).unwrap();
        assert_eq!(network, &LIVENET);
        assert!(!decoded.is_compressed());
        assert_eq!(decoded.to_hex(), ONE);
    }

    #[test]
    fn test_wif_roundtrip_testnet() {
        let key = PrivateKey::new();
        let wif = key.to_wif(&TESTNET);
        let (decoded, network) = PrivateKey::from_wif(&wif).unwrap();
        assert_eq!(network, &TESTNET);
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_wif_rejects_tampering() {
        let mut tampered = ONE_WIF_COMPRESSED.to_string();
        tampered.pop();
        tampered.push('o');
        assert!(PrivateKey::from_wif(&tampered).is_err());
        assert!(PrivateKey::from_wif(&ONE_WIF_COMPRESSED[..40]).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::from_hex(ONE).unwrap();
        let hash = sha256(b"bitforge");
        let sig = key.sign(&hash).unwrap();
        assert!(key.to_public_key().verify(&hash, &sig));

        let other = sha256(b"something else");
        assert!(!key.to_public_key().verify(&other, &sig));
    }
}
