/// Unified error type for all primitives operations.
///
/// Covers errors from hashing, encodings, buffers, networks, and key handling.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("attempted to read {requested} bytes, but buffer only has {remaining}")]
    InsufficientData { remaining: usize, requested: usize },

    #[error("integer of {0} bytes does not fit in 64 bits")]
    IntTooLarge(usize),

    #[error("value {value} does not fit in {length} bytes")]
    IntOverflow { value: u64, length: usize },

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("HMAC failure: {0}")]
    Hmac(String),

    #[error("seed must be 16 to 64 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("child {0:#010x} is not a valid key, skip to the next index")]
    InvalidChildKey(u32),

    #[error("cannot derive hardened child {0:#010x} from a public key")]
    HardenedDerivation(u32),

    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
