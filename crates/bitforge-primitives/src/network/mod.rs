//! Network parameter tables.
//!
//! A `Network` is an immutable set of prefixes and constants distinguishing
//! livenet from testnet. The two known networks are statics; lookups never
//! allocate.

use std::fmt;

use crate::PrimitivesError;

/// Parameters of a Bitcoin network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Network {
    /// Short name used for lookups ("livenet", "testnet").
    pub name: &'static str,
    /// Version byte of pay-to-pubkey-hash addresses.
    pub pubkeyhash: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif_prefix: u8,
    /// Version byte of pay-to-script-hash addresses.
    pub scripthash: u8,
    /// BIP32 extended public key version.
    pub xpubkey: u32,
    /// BIP32 extended private key version.
    pub xprivkey: u32,
    /// P2P message start bytes.
    pub magic: u32,
    /// Default P2P port.
    pub port: u16,
    /// DNS seeds.
    pub seeds: &'static [&'static str],
}

/// The main Bitcoin network.
pub static LIVENET: Network = Network {
    name: "livenet",
    pubkeyhash: 0x00,
    wif_prefix: 0x80,
    scripthash: 0x05,
    xpubkey: 0x0488_b21e,
    xprivkey: 0x0488_ade4,
    magic: 0xf9be_b4d9,
    port: 8333,
    seeds: &[
        "seed.bitcoin.sipa.be",
        "dnsseed.bluematt.me",
        "dnsseed.bitcoin.dashjr.org",
        "seed.bitcoinstats.com",
        "seed.bitnodes.io",
        "bitseed.xf2.org",
    ],
};

/// The public test network.
pub static TESTNET: Network = Network {
    name: "testnet",
    pubkeyhash: 0x6f,
    wif_prefix: 0xef,
    scripthash: 0xc4,
    xpubkey: 0x0435_87cf,
    xprivkey: 0x0435_8394,
    magic: 0x0b11_0907,
    port: 18333,
    seeds: &[
        "testnet-seed.bitcoin.petertodd.org",
        "testnet-seed.bluematt.me",
        "testnet-seed.alexykot.me",
        "testnet-seed.bitcoin.schildbach.de",
    ],
};

static NETWORKS: [&Network; 2] = [&LIVENET, &TESTNET];

impl Network {
    /// Look a network up by name.
    ///
    /// # Arguments
    /// * `name` - "livenet" or "testnet".
    ///
    /// # Returns
    /// The matching network, or `UnknownNetwork`.
    pub fn find(name: &str) -> Result<&'static Network, PrimitivesError> {
        NETWORKS
            .iter()
            .copied()
            .find(|n| n.name == name)
            .ok_or_else(|| PrimitivesError::UnknownNetwork(name.to_string()))
    }

    /// Find the network whose pay-to-pubkey-hash or pay-to-script-hash
    /// version byte is `prefix`.
    pub fn from_address_prefix(prefix: u8) -> Option<&'static Network> {
        NETWORKS
            .iter()
            .copied()
            .find(|n| n.pubkeyhash == prefix || n.scripthash == prefix)
    }

    /// Find the network whose WIF version byte is `prefix`.
    pub fn from_wif_prefix(prefix: u8) -> Option<&'static Network> {
        NETWORKS.iter().copied().find(|n| n.wif_prefix == prefix)
    }

    /// Find the network whose extended private key version is `version`.
    pub fn from_xprivkey(version: u32) -> Option<&'static Network> {
        NETWORKS.iter().copied().find(|n| n.xprivkey == version)
    }

    /// Find the network whose extended public key version is `version`.
    pub fn from_xpubkey(version: u32) -> Option<&'static Network> {
        NETWORKS.iter().copied().find(|n| n.xpubkey == version)
    }

    /// All known networks.
    pub fn all() -> &'static [&'static Network] {
        &NETWORKS
    }
}

impl Default for Network {
    fn default() -> Self {
        LIVENET
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
