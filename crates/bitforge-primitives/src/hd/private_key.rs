//! Extended private keys.

use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::ec::{PrivateKey, PublicKey};
use crate::hash::sha512_hmac;
use crate::hd::public_key::HdPublicKey;
use crate::hd::{child_depth, fingerprint, master_key_material, parse_path, Payload, HARDENED_START};
use crate::network::Network;
use crate::PrimitivesError;

/// Length of a random master seed.
const RANDOM_SEED_LEN: usize = 32;

/// A BIP32 extended private key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HdPrivateKey {
    private_key: PrivateKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    network: &'static Network,
}

impl HdPrivateKey {
    /// Generate a master key from a random 32-byte seed.
    pub fn new(network: &'static Network) -> Self {
        let mut seed = [0u8; RANDOM_SEED_LEN];
        loop {
            OsRng.fill_bytes(&mut seed);
            if let Ok(key) = Self::from_seed(&seed, network) {
                seed.zeroize();
                return key;
            }
        }
    }

    /// Derive the master key for `seed`.
    ///
    /// # Arguments
    /// * `seed` - 16 to 64 bytes of entropy.
    /// * `network` - Network whose version bytes the key serializes with.
    ///
    /// # Returns
    /// The depth-0 key, `InvalidSeedLength`, or `InvalidExtendedKey` in the
    /// negligible case that the seed hashes to an invalid scalar.
    pub fn from_seed(seed: &[u8], network: &'static Network) -> Result<Self, PrimitivesError> {
        let mut material = master_key_material(seed)?;
        let key = PrivateKey::from_bytes(&material[..32])
            .map_err(|e| PrimitivesError::InvalidExtendedKey(e.to_string()));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&material[32..]);
        material.zeroize();

        Ok(HdPrivateKey {
            private_key: key?,
            chain_code,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_index: 0,
            network,
        })
    }

    /// Parse an `xprv`/`tprv` string.
    ///
    /// The network is recognised from the version bytes.
    pub fn from_string(s: &str) -> Result<Self, PrimitivesError> {
        let payload = Payload::decode(s)?;
        let network = Network::from_xprivkey(payload.version).ok_or_else(|| {
            PrimitivesError::InvalidExtendedKey(format!(
                "version {:#010x} is not an extended private key",
                payload.version
            ))
        })?;
        if payload.key_data[0] != 0x00 {
            return Err(PrimitivesError::InvalidExtendedKey(
                "private key data must start with 0x00".to_string(),
            ));
        }
        let private_key = PrivateKey::from_bytes(&payload.key_data[1..])
            .map_err(|e| PrimitivesError::InvalidExtendedKey(e.to_string()))?;

        Ok(HdPrivateKey {
            private_key,
            chain_code: payload.chain_code,
            depth: payload.depth,
            parent_fingerprint: payload.parent_fingerprint,
            child_index: payload.child_index,
            network,
        })
    }

    /// Derive the child at `index`.
    ///
    /// `hardened` sets the hardened bit; an index already at or above
    /// `HARDENED_START` is hardened either way.
    ///
    /// # Returns
    /// The child, or `InvalidChildKey` for the rare index whose derived
    /// scalar is out of range.
    pub fn derive(&self, index: u32, hardened: bool) -> Result<Self, PrimitivesError> {
        let index = if hardened { index | HARDENED_START } else { index };
        let depth = child_depth(self.depth)?;

        let mut data = Vec::with_capacity(37);
        if index >= HARDENED_START {
            data.push(0x00);
            data.extend_from_slice(&self.private_key.to_bytes());
        } else {
            data.extend_from_slice(&self.public_key().to_compressed());
        }
        data.extend_from_slice(&index.to_be_bytes());
        let digest = sha512_hmac(&self.chain_code, &data);
        data.zeroize();
        let mut digest = digest?;

        let mut tweak = [0u8; 32];
        tweak.copy_from_slice(&digest[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);
        digest.zeroize();

        let tweak: Option<Scalar> = <Scalar as PrimeField>::from_repr(FieldBytes::from(tweak)).into();
        let tweak = tweak.ok_or(PrimitivesError::InvalidChildKey(index))?;
        let parent: Scalar = **self.private_key.signing_key().as_nonzero_scalar();
        let private_key = PrivateKey::from_bytes(&(parent + tweak).to_bytes())
            .map_err(|_| PrimitivesError::InvalidChildKey(index))?;

        Ok(HdPrivateKey {
            private_key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: index,
            network: self.network,
        })
    }

    /// Derive along a path such as `m/0'/1`, starting from this key.
    pub fn derive_path(&self, path: &str) -> Result<Self, PrimitivesError> {
        parse_path(path)?
            .into_iter()
            .try_fold(self.clone(), |key, index| key.derive(index, false))
    }

    /// The matching extended public key.
    pub fn to_hd_public_key(&self) -> HdPublicKey {
        HdPublicKey::new(
            self.public_key(),
            self.chain_code,
            self.depth,
            self.parent_fingerprint,
            self.child_index,
            self.network,
        )
    }

    /// The plain private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The compressed public key.
    pub fn public_key(&self) -> PublicKey {
        self.private_key.to_public_key()
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Distance from the master key.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// Index this key was derived at, hardened bit included.
    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn network(&self) -> &'static Network {
        self.network
    }

    /// This key's fingerprint, recorded as the parent fingerprint of its
    /// children.
    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint(&self.public_key())
    }
}

impl Drop for HdPrivateKey {
    fn drop(&mut self) {
        self.chain_code.zeroize();
    }
}

impl fmt::Display for HdPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key_data = [0u8; 33];
        key_data[1..].copy_from_slice(&self.private_key.to_bytes());
        let payload = Payload {
            version: self.network.xprivkey,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            chain_code: self.chain_code,
            key_data,
        };
        key_data.zeroize();
        f.write_str(&payload.encode())
    }
}

impl FromStr for HdPrivateKey {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}
