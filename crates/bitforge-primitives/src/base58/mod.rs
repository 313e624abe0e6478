//! Base58 and Base58Check codecs.
//!
//! Base58Check appends the first four bytes of SHA-256d(payload) before
//! encoding; it carries WIF private keys and addresses.

use crate::hash::sha256d;
use crate::PrimitivesError;

const CHECKSUM_LEN: usize = 4;

/// Encode bytes using the Bitcoin Base58 alphabet.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a Base58 string.
///
/// # Returns
/// The decoded bytes, or `InvalidBase58` for characters outside the
/// alphabet.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Encode `data` followed by its 4-byte checksum.
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&payload)
}

/// Decode a Base58Check string and strip its checksum.
///
/// # Arguments
/// * `s` - The Base58Check string.
///
/// # Returns
/// The payload without checksum, `InvalidBase58` if the string is malformed
/// or too short, or `ChecksumMismatch`.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(format!(
            "{} bytes is too short for a checksum",
            decoded.len()
        )));
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if checksum != &sha256d(payload)[..CHECKSUM_LEN] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}
