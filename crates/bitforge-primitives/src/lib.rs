/// Bitforge - Cryptographic primitives, encodings, and utilities.
///
/// This crate provides the foundational building blocks for bitforge:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, HASH160, SHA-1)
/// - Base58 and Base58Check encoding/decoding
/// - Variable-length and fixed-width integer codecs
/// - A consuming byte `Buffer` and a `Writer` for wire formats
/// - Network parameter tables (livenet, testnet)
/// - Elliptic curve cryptography (secp256k1 keys and DER signatures)
/// - BIP32 hierarchical deterministic keys

pub mod hash;
pub mod util;
pub mod base58;
pub mod network;
pub mod ec;
pub mod hd;

mod error;
pub use error::PrimitivesError;
pub use hd::{HdPrivateKey, HdPublicKey};
pub use network::Network;
pub use util::{Buffer, Writer};
