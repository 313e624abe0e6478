/// Bitcoin addresses.
///
/// An address is a 20-byte hash tagged with what was hashed (a public key
/// or a redeem script) and the network it belongs to. The string form is
/// Base58Check over the network's version byte followed by the hash.

use std::fmt;

use bitforge_primitives::ec::PublicKey;
use bitforge_primitives::{base58, Network};

use crate::{Script, ScriptError};

/// Length of an address hash.
pub const ADDRESS_HASH_LEN: usize = 20;

/// What an address hash commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// hash160 of a public key.
    PublicKeyHash,
    /// hash160 of a redeem script.
    ScriptHash,
}

/// A pay-to-pubkey-hash or pay-to-script-hash address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    hash: [u8; ADDRESS_HASH_LEN],
    kind: AddressType,
    network: &'static Network,
}

impl Address {
    /// Create an address from its parts.
    pub fn new(hash: [u8; ADDRESS_HASH_LEN], kind: AddressType, network: &'static Network) -> Self {
        Address { hash, kind, network }
    }

    /// The pay-to-pubkey-hash address of `key`, hashed in the key's own
    /// encoding.
    pub fn from_public_key(key: &PublicKey, network: &'static Network) -> Self {
        Address::new(key.hash160(), AddressType::PublicKeyHash, network)
    }

    /// The pay-to-script-hash address of `script`.
    pub fn from_script(script: &Script, network: &'static Network) -> Self {
        Address::new(script.to_hash(), AddressType::ScriptHash, network)
    }

    /// Decode a version byte followed by a 20-byte hash.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 21 bytes.
    ///
    /// # Returns
    /// The address, or `InvalidAddress` for a bad length or unknown version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        if bytes.len() != 1 + ADDRESS_HASH_LEN {
            return Err(ScriptError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                1 + ADDRESS_HASH_LEN,
                bytes.len()
            )));
        }
        let prefix = bytes[0];
        let network = Network::from_address_prefix(prefix).ok_or_else(|| {
            ScriptError::InvalidAddress(format!("unknown version byte 0x{:02x}", prefix))
        })?;
        let kind = if prefix == network.pubkeyhash {
            AddressType::PublicKeyHash
        } else {
            AddressType::ScriptHash
        };

        let mut hash = [0u8; ADDRESS_HASH_LEN];
        hash.copy_from_slice(&bytes[1..]);
        Ok(Address::new(hash, kind, network))
    }

    /// Parse a Base58Check address string.
    pub fn from_string(s: &str) -> Result<Self, ScriptError> {
        let payload = base58::check_decode(s)?;
        Address::from_bytes(&payload)
    }

    /// The 20-byte hash.
    pub fn hash(&self) -> &[u8; ADDRESS_HASH_LEN] {
        &self.hash
    }

    /// Whether this commits to a public key or a script.
    pub fn kind(&self) -> AddressType {
        self.kind
    }

    /// The network this address belongs to.
    pub fn network(&self) -> &'static Network {
        self.network
    }

    /// Version byte followed by the hash.
    pub fn to_bytes(&self) -> Vec<u8> {
        let prefix = match self.kind {
            AddressType::PublicKeyHash => self.network.pubkeyhash,
            AddressType::ScriptHash => self.network.scripthash,
        };
        let mut out = Vec::with_capacity(1 + ADDRESS_HASH_LEN);
        out.push(prefix);
        out.extend_from_slice(&self.hash);
        out
    }

    /// The output script paying to this address.
    pub fn to_script(&self) -> Script {
        match self.kind {
            AddressType::PublicKeyHash => Script::pay_to_pubkey_hash_out(&self.hash),
            AddressType::ScriptHash => Script::pay_to_script_hash_out(&self.hash),
        }
    }
}

impl fmt::Display for Address {
    /// Base58Check string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::check_encode(&self.to_bytes()))
    }
}
