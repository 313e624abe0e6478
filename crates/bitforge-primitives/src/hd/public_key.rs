//! Extended public keys.
//!
//! Only normal (non-hardened) children can be derived from a public key;
//! the child point is `parse256(IL)·G + K_par`.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar};

use crate::ec::PublicKey;
use crate::hash::sha512_hmac;
use crate::hd::{child_depth, fingerprint, parse_path, Payload, HARDENED_START};
use crate::network::Network;
use crate::PrimitivesError;

/// A BIP32 extended public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HdPublicKey {
    public_key: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    network: &'static Network,
}

impl HdPublicKey {
    pub(crate) fn new(
        public_key: PublicKey,
        chain_code: [u8; 32],
        depth: u8,
        parent_fingerprint: [u8; 4],
        child_index: u32,
        network: &'static Network,
    ) -> Self {
        HdPublicKey {
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_index,
            network,
        }
    }

    /// Parse an `xpub`/`tpub` string.
    pub fn from_string(s: &str) -> Result<Self, PrimitivesError> {
        let payload = Payload::decode(s)?;
        let network = Network::from_xpubkey(payload.version).ok_or_else(|| {
            PrimitivesError::InvalidExtendedKey(format!(
                "version {:#010x} is not an extended public key",
                payload.version
            ))
        })?;
        let public_key = PublicKey::from_bytes(&payload.key_data)
            .map_err(|e| PrimitivesError::InvalidExtendedKey(e.to_string()))?;

        Ok(HdPublicKey::new(
            public_key,
            payload.chain_code,
            payload.depth,
            payload.parent_fingerprint,
            payload.child_index,
            network,
        ))
    }

    /// Derive the normal child at `index`.
    ///
    /// # Returns
    /// The child, `HardenedDerivation` if `hardened` is set or `index` has
    /// the hardened bit, or `InvalidChildKey` for an index whose derived
    /// point is invalid.
    pub fn derive(&self, index: u32, hardened: bool) -> Result<Self, PrimitivesError> {
        if hardened || index >= HARDENED_START {
            return Err(PrimitivesError::HardenedDerivation(index | HARDENED_START));
        }
        let depth = child_depth(self.depth)?;

        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&self.public_key.to_compressed());
        data.extend_from_slice(&index.to_be_bytes());
        let digest = sha512_hmac(&self.chain_code, &data)?;

        let mut tweak = [0u8; 32];
        tweak.copy_from_slice(&digest[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        let tweak: Option<Scalar> = <Scalar as PrimeField>::from_repr(FieldBytes::from(tweak)).into();
        let tweak = tweak.ok_or(PrimitivesError::InvalidChildKey(index))?;
        let parent = ProjectivePoint::from(*self.public_key.verifying_key().as_affine());
        let child = VerifyingKey::from_affine(AffinePoint::from(ProjectivePoint::GENERATOR * tweak + parent))
            .map_err(|_| PrimitivesError::InvalidChildKey(index))?;

        Ok(HdPublicKey::new(
            PublicKey::from_verifying_key(child, true),
            chain_code,
            depth,
            self.fingerprint(),
            index,
            self.network,
        ))
    }

    /// Derive along a path of normal indices such as `m/0/1`.
    pub fn derive_path(&self, path: &str) -> Result<Self, PrimitivesError> {
        parse_path(path)?
            .into_iter()
            .try_fold(self.clone(), |key, index| key.derive(index, false))
    }

    /// The plain public key, compressed.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn network(&self) -> &'static Network {
        self.network
    }

    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint(&self.public_key)
    }
}

impl fmt::Display for HdPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = Payload {
            version: self.network.xpubkey,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            chain_code: self.chain_code,
            key_data: self.public_key.to_compressed(),
        };
        f.write_str(&payload.encode())
    }
}

impl FromStr for HdPublicKey {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}
