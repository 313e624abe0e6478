//! Transaction input referencing a previous output.
//!
//! Contains the source transaction ID, output index, script, and sequence
//! number. Before signing, the script holds a placeholder: the script the
//! signature commits to. Provides binary serialization/deserialization
//! following the Bitcoin wire format.

use bitforge_primitives::ec::PublicKey;
use bitforge_primitives::{Buffer, Writer};
use bitforge_script::{Address, Script};

use crate::TransactionError;

/// Sequence number indicating a finalized input (no lock-time checks).
pub const FINAL_SEQ_NUMBER: u32 = 0xFFFF_FFFF;

/// How an input turns private keys into its final script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignMethod {
    /// Parsed or hand-built input; it can't sign itself.
    Unknown,
    /// Spends a pay-to-pubkey-hash output with a single key.
    Address,
    /// Spends a pay-to-script-hash output; the placeholder is the redeem script.
    Script,
}

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field        | Size                     |
/// |--------------|--------------------------|
/// | tx_id        | 32 bytes (reversed)      |
/// | txo_index    | 4 bytes (LE)             |
/// | script length| VarInt                   |
/// | script       | variable                 |
/// | seq_number   | 4 bytes (LE)             |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    /// ID of the transaction being spent, in display (big-endian) order.
    pub tx_id: [u8; 32],

    /// Index of the output within the source transaction.
    pub txo_index: u32,

    /// The placeholder script before signing, the signature script after.
    pub script: Script,

    /// Sequence number. Defaults to `FINAL_SEQ_NUMBER`.
    pub seq_number: u32,

    method: SignMethod,
}

impl Input {
    /// Create an input with an arbitrary script.
    ///
    /// Such an input can be serialized but not signed.
    pub fn new(tx_id: [u8; 32], txo_index: u32, script: Script, seq_number: u32) -> Self {
        Input {
            tx_id,
            txo_index,
            script,
            seq_number,
            method: SignMethod::Unknown,
        }
    }

    /// Create an input spending a pay-to-pubkey-hash output of `address`.
    ///
    /// The placeholder is the standard output script for the address, so
    /// the spent output's script need not be fetched.
    pub fn address(tx_id: [u8; 32], txo_index: u32, address: &Address) -> Self {
        Input {
            method: SignMethod::Address,
            ..Input::new(tx_id, txo_index, Script::pay_to_pubkey_out(address), FINAL_SEQ_NUMBER)
        }
    }

    /// Create an input spending a pay-to-script-hash output of `redeem_script`.
    pub fn script(tx_id: [u8; 32], txo_index: u32, redeem_script: Script) -> Self {
        Input {
            method: SignMethod::Script,
            ..Input::new(tx_id, txo_index, redeem_script, FINAL_SEQ_NUMBER)
        }
    }

    /// Create an input spending an `m`-of-`n` multisig pay-to-script-hash output.
    ///
    /// # Arguments
    /// * `pubkeys` - The `n` keys of the redeem script, in order.
    /// * `min_signatures` - The required signature count `m`.
    ///
    /// # Returns
    /// The input, or a script error if either count is above 16.
    pub fn multisig(
        tx_id: [u8; 32],
        txo_index: u32,
        pubkeys: &[PublicKey],
        min_signatures: usize,
    ) -> Result<Self, TransactionError> {
        let redeem = Script::redeem_multisig(pubkeys, min_signatures)?;
        Ok(Input::script(tx_id, txo_index, redeem))
    }

    /// Replace the sequence number.
    pub fn with_seq_number(mut self, seq_number: u32) -> Self {
        self.seq_number = seq_number;
        self
    }

    /// Copy of this input with `script` in place of the current one.
    pub fn with_script(&self, script: Script) -> Self {
        Input {
            script,
            ..self.clone()
        }
    }

    /// Copy of this input with an empty script.
    pub fn without_script(&self) -> Self {
        self.with_script(Script::new())
    }

    /// How this input gets signed.
    pub fn sign_method(&self) -> SignMethod {
        self.method
    }

    /// The source transaction ID as a display-order hex string.
    pub fn tx_id_hex(&self) -> String {
        hex::encode(self.tx_id)
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this input into a `Writer`.
    pub fn write_to(&self, writer: &mut Writer) {
        let mut wire_id = self.tx_id;
        wire_id.reverse();
        writer.write_bytes(&wire_id);
        writer.write_u32_le(self.txo_index);
        writer.write_var_bytes(&self.script.to_bytes());
        writer.write_u32_le(self.seq_number);
    }

    /// Serialize this input to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Serialize this input to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Deserialize an input from a `Buffer`.
    ///
    /// # Arguments
    /// * `buffer` - The buffer positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(Input)` on success, or a `TransactionError` if the data is
    /// truncated or the script doesn't parse.
    pub fn from_buffer(buffer: &mut Buffer<'_>) -> Result<Self, TransactionError> {
        let mut tx_id = [0u8; 32];
        tx_id.copy_from_slice(buffer.read(32).map_err(|e| serialization("source tx id", e))?);
        tx_id.reverse();

        let txo_index = buffer.read_u32_le().map_err(|e| serialization("output index", e))?;

        let script_len = buffer.read_varint().map_err(|e| serialization("script length", e))?;
        let script_len = usize::try_from(script_len)
            .map_err(|_| TransactionError::SerializationError(format!("script length {} too large", script_len)))?;
        let script_bytes = buffer.read(script_len).map_err(|e| serialization("script", e))?;
        let script = Script::from_bytes(script_bytes)?;

        let seq_number = buffer.read_u32_le().map_err(|e| serialization("sequence number", e))?;

        Ok(Input::new(tx_id, txo_index, script, seq_number))
    }

    /// Deserialize an input from bytes, ignoring anything after it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        Input::from_buffer(&mut Buffer::new(bytes))
    }

    /// Deserialize an input from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Input::from_bytes(&bytes)
    }
}

/// Parse a display-order transaction ID.
///
/// # Arguments
/// * `hex_str` - 64 hex characters, as shown by explorers.
///
/// # Returns
/// The 32 ID bytes in display order.
pub fn tx_id_from_hex(hex_str: &str) -> Result<[u8; 32], TransactionError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| TransactionError::SerializationError(format!("invalid tx id hex: {}", e)))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        TransactionError::SerializationError(format!("tx id must be 32 bytes, got {}", bytes.len()))
    })
}

fn serialization(field: &str, e: bitforge_primitives::PrimitivesError) -> TransactionError {
    TransactionError::SerializationError(format!("reading {}: {}", field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitforge_primitives::ec::PrivateKey;
    use bitforge_primitives::network::LIVENET;
    use bitforge_script::TemplateKind;

    const TX_ID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn test_tx_id_is_reversed_on_the_wire() {
        let id = tx_id_from_hex(TX_ID).unwrap();
        let input = Input::new(id, 1, Script::new(), FINAL_SEQ_NUMBER);
        let bytes = input.to_bytes();
        assert_eq!(bytes[0], 0x3b);
        assert_eq!(bytes[31], 0x4a);
        assert_eq!(&bytes[32..36], &[1, 0, 0, 0]);
        assert_eq!(bytes[36], 0);
        assert_eq!(&bytes[37..], &[0xff; 4]);

        let parsed = Input::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.tx_id_hex(), TX_ID);
        assert_eq!(parsed, input);
    }

    #[test]
    fn test_address_input_placeholder() {
        let key = PrivateKey::new();
        let address = Address::from_public_key(&key.to_public_key(), &LIVENET);
        let input = Input::address([7u8; 32], 0, &address);
        assert_eq!(input.sign_method(), SignMethod::Address);
        assert!(matches!(input.script.kind(), Some(TemplateKind::PayToPubkeyOut(_))));
        assert_eq!(input.seq_number, FINAL_SEQ_NUMBER);
    }

    #[test]
    fn test_multisig_input_placeholder() {
        let keys: Vec<PublicKey> = (0..3).map(|_| PrivateKey::new().to_public_key()).collect();
        let input = Input::multisig([0u8; 32], 2, &keys, 2).unwrap();
        assert_eq!(input.sign_method(), SignMethod::Script);
        assert!(matches!(input.script.kind(), Some(TemplateKind::RedeemMultisig(_))));

        assert!(Input::multisig([0u8; 32], 2, &keys, 17).is_err());
    }

    #[test]
    fn test_without_script_keeps_outpoint() {
        let redeem = Script::from_string("OP_1").unwrap();
        let input = Input::script([9u8; 32], 3, redeem).with_seq_number(5);
        let bare = input.without_script();
        assert!(bare.script.is_empty());
        assert_eq!(bare.tx_id, input.tx_id);
        assert_eq!(bare.txo_index, 3);
        assert_eq!(bare.seq_number, 5);
        assert_eq!(bare.sign_method(), SignMethod::Script);
    }

    #[test]
    fn test_truncated_input() {
        let bytes = Input::new([1u8; 32], 0, Script::new(), 0).to_bytes();
        let err = Input::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, TransactionError::SerializationError(_)));
    }

    #[test]
    fn test_tx_id_from_hex_rejects_wrong_length() {
        assert!(tx_id_from_hex("abcd").is_err());
        assert!(tx_id_from_hex("zz").is_err());
    }
}
