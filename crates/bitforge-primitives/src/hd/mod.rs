//! BIP32 hierarchical deterministic keys.
//!
//! An extended key is a secp256k1 key plus a 32-byte chain code, enough to
//! derive a tree of child keys. Both halves serialize to 78 bytes and then
//! to Base58Check:
//!
//! | Field              | Size |
//! |--------------------|------|
//! | version (BE)       | 4    |
//! | depth              | 1    |
//! | parent fingerprint | 4    |
//! | child index (BE)   | 4    |
//! | chain code         | 32   |
//! | key data           | 33   |
//!
//! Private key data is `0x00 || k`; public key data is the compressed point.

pub mod private_key;
pub mod public_key;

pub use private_key::HdPrivateKey;
pub use public_key::HdPublicKey;

use zeroize::Zeroize;

use crate::base58;
use crate::ec::PublicKey;
use crate::hash::hash160;
use crate::{Buffer, PrimitivesError, Writer};

/// First hardened child index.
pub const HARDENED_START: u32 = 0x8000_0000;

/// HMAC key for deriving a master key from a seed.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// Length of the decoded payload, without checksum.
const SERIALIZED_LEN: usize = 78;

/// First four bytes of HASH160 of the compressed public key.
pub fn fingerprint(public_key: &PublicKey) -> [u8; 4] {
    let id = hash160(&public_key.to_compressed());
    [id[0], id[1], id[2], id[3]]
}

/// Parse a path such as `m/44'/0'/0h/1` into child indices, hardened
/// components carrying the `HARDENED_START` bit.
///
/// # Returns
/// The indices in derivation order (empty for `m`), or
/// `InvalidDerivationPath`.
pub fn parse_path(path: &str) -> Result<Vec<u32>, PrimitivesError> {
    let invalid = || PrimitivesError::InvalidDerivationPath(path.to_string());
    let mut parts = path.split('/');
    if parts.next() != Some("m") {
        return Err(invalid());
    }

    parts
        .map(|part| {
            let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let index: u32 = digits.parse().map_err(|_| invalid())?;
            if index >= HARDENED_START {
                return Err(invalid());
            }
            Ok(if hardened { index | HARDENED_START } else { index })
        })
        .collect()
}

fn master_key_material(seed: &[u8]) -> Result<[u8; 64], PrimitivesError> {
    if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
        return Err(PrimitivesError::InvalidSeedLength(seed.len()));
    }
    crate::hash::sha512_hmac(MASTER_HMAC_KEY, seed)
}

fn child_depth(depth: u8) -> Result<u8, PrimitivesError> {
    depth
        .checked_add(1)
        .ok_or_else(|| PrimitivesError::InvalidExtendedKey("depth 255 has no children".to_string()))
}

/// The 78 serialized bytes of an extended key.
struct Payload {
    version: u32,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: [u8; 32],
    key_data: [u8; 33],
}

impl Payload {
    fn encode(&self) -> String {
        let mut writer = Writer::with_capacity(SERIALIZED_LEN);
        writer.write_bytes(&self.version.to_be_bytes());
        writer.write_u8(self.depth);
        writer.write_bytes(&self.parent_fingerprint);
        writer.write_bytes(&self.child_index.to_be_bytes());
        writer.write_bytes(&self.chain_code);
        writer.write_bytes(&self.key_data);
        let mut bytes = writer.into_bytes();
        let encoded = base58::check_encode(&bytes);
        bytes.zeroize();
        encoded
    }

    fn decode(s: &str) -> Result<Self, PrimitivesError> {
        let mut data = base58::check_decode(s)?;
        let payload = Self::from_bytes(&data);
        data.zeroize();
        payload
    }

    fn from_bytes(data: &[u8]) -> Result<Self, PrimitivesError> {
        if data.len() != SERIALIZED_LEN {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LEN,
                data.len()
            )));
        }
        let mut buffer = Buffer::new(data);
        Ok(Payload {
            version: u32::from_be_bytes(take(&mut buffer)?),
            depth: buffer.read_u8()?,
            parent_fingerprint: take(&mut buffer)?,
            child_index: u32::from_be_bytes(take(&mut buffer)?),
            chain_code: take(&mut buffer)?,
            key_data: take(&mut buffer)?,
        })
    }
}

impl Drop for Payload {
    fn drop(&mut self) {
        self.key_data.zeroize();
        self.chain_code.zeroize();
    }
}

fn take<const N: usize>(buffer: &mut Buffer<'_>) -> Result<[u8; N], PrimitivesError> {
    let mut out = [0u8; N];
    out.copy_from_slice(buffer.read(N)?);
    Ok(out)
}
