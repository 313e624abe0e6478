//! Hash functions used by keys, addresses, scripts and transactions.
//!
//! HASH160 and HASH256 are the two composite digests Bitcoin script
//! exposes as opcodes; the rest are the underlying single digests.

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::PrimitivesError;

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute SHA-256(SHA-256(data)), the digest behind transaction ids,
/// signature hashes and Base58Check checksums.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the RIPEMD-160 digest of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Compute RIPEMD-160(SHA-256(data)).
///
/// This is the hash committed to by pay-to-pubkey-hash and
/// pay-to-script-hash outputs.
///
/// # Arguments
/// * `data` - Byte slice to hash, usually a SEC1 public key or a
///   serialized redeem script.
///
/// # Returns
/// A 20-byte digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Compute the SHA-1 digest of `data`.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Compute HMAC-SHA512 of `data` under `key`.
///
/// # Returns
/// The 64-byte tag; BIP32 splits it into a key and a chain code.
pub fn sha512_hmac(key: &[u8], data: &[u8]) -> Result<[u8; 64], PrimitivesError> {
    type HmacSha512 = Hmac<Sha512>;
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| PrimitivesError::Hmac(e.to_string()))?;
    mac.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}
