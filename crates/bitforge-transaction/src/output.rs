//! Transaction output with an amount and a locking script.
//!
//! Defines the spending conditions for the output's value. Provides
//! binary serialization/deserialization following the Bitcoin wire format.

use bitforge_primitives::ec::PublicKey;
use bitforge_primitives::{Buffer, Writer};
use bitforge_script::{Address, Script, TemplateKind};

use crate::TransactionError;

/// Most bytes a data (OP_RETURN) output may carry.
pub const MAX_DATA_LEN: usize = 80;

/// A single output in a transaction.
///
/// # Wire format
///
/// | Field         | Size         |
/// |---------------|--------------|
/// | amount        | 8 bytes (LE) |
/// | script length | VarInt       |
/// | script        | variable     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// Value locked by this output, in satoshis.
    pub amount: u64,

    /// The locking script that defines the spending conditions.
    pub script: Script,
}

impl Output {
    /// Create an output with an arbitrary locking script.
    pub fn new(amount: u64, script: Script) -> Self {
        Output { amount, script }
    }

    /// Create an output paying to `address`.
    ///
    /// Pay-to-pubkey-hash and pay-to-script-hash addresses each get their
    /// standard locking script.
    pub fn address(amount: u64, address: &Address) -> Self {
        Output::new(amount, address.to_script())
    }

    /// Create a pay-to-script-hash output for `redeem_script`.
    pub fn script(amount: u64, redeem_script: &Script) -> Self {
        Output::new(amount, Script::pay_to_script_out(redeem_script))
    }

    /// Create a pay-to-script-hash output for an `m`-of-`n` multisig redeem script.
    pub fn multisig(amount: u64, pubkeys: &[PublicKey], min_signatures: usize) -> Result<Self, TransactionError> {
        let redeem = Script::redeem_multisig(pubkeys, min_signatures)?;
        Ok(Output::script(amount, &redeem))
    }

    /// Create a zero-value `OP_RETURN <data>` output.
    ///
    /// # Returns
    /// The output, or `TooMuchData` if `data` is longer than 80 bytes.
    pub fn data(data: &[u8]) -> Result<Self, TransactionError> {
        if data.len() > MAX_DATA_LEN {
            return Err(TransactionError::TooMuchData(data.len()));
        }
        Ok(Output::new(0, Script::op_return(data)?))
    }

    /// Classify the locking script.
    pub fn kind(&self) -> Option<TemplateKind<'_>> {
        self.script.kind()
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this output into a `Writer`.
    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_u64_le(self.amount);
        writer.write_var_bytes(&self.script.to_bytes());
    }

    /// Serialize this output to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Serialize this output to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Deserialize an output from a `Buffer`.
    ///
    /// Reads the 8-byte amount, a varint script length, and the script bytes.
    pub fn from_buffer(buffer: &mut Buffer<'_>) -> Result<Self, TransactionError> {
        let amount = buffer
            .read_u64_le()
            .map_err(|e| TransactionError::SerializationError(format!("reading amount: {}", e)))?;

        let script_len = buffer
            .read_varint()
            .map_err(|e| TransactionError::SerializationError(format!("reading script length: {}", e)))?;
        let script_len = usize::try_from(script_len)
            .map_err(|_| TransactionError::SerializationError(format!("script length {} too large", script_len)))?;
        let script_bytes = buffer
            .read(script_len)
            .map_err(|e| TransactionError::SerializationError(format!("reading script: {}", e)))?;

        Ok(Output::new(amount, Script::from_bytes(script_bytes)?))
    }

    /// Deserialize an output from bytes, ignoring anything after it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        Output::from_buffer(&mut Buffer::new(bytes))
    }

    /// Deserialize an output from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Output::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitforge_primitives::ec::PrivateKey;
    use bitforge_primitives::network::LIVENET;

    #[test]
    fn test_wire_format() {
        let output = Output::new(1000, Script::from_string("OP_1").unwrap());
        assert_eq!(output.to_hex(), "e8030000000000000151");
        assert_eq!(Output::from_hex(&output.to_hex()).unwrap(), output);
    }

    #[test]
    fn test_too_much_data() {
        let err = Output::data(&[b'0'; 81]).unwrap_err();
        assert!(matches!(err, TransactionError::TooMuchData(81)));

        let output = Output::data(&[b'0'; 80]).unwrap();
        assert_eq!(output.amount, 0);
    }

    #[test]
    fn test_classify() {
        let pubkey = PrivateKey::new().to_public_key();
        let address = Address::from_public_key(&pubkey, &LIVENET);

        let o_p2pk = Output::address(1, &address);
        assert!(matches!(o_p2pk.kind(), Some(TemplateKind::PayToPubkeyOut(_))));

        let o_p2s = Output::script(1, &Script::new());
        assert!(matches!(o_p2s.kind(), Some(TemplateKind::PayToScriptOut(_))));

        let o_multi = Output::multisig(1, &[pubkey], 1).unwrap();
        assert!(matches!(o_multi.kind(), Some(TemplateKind::PayToScriptOut(_))));

        let o_data = Output::data(b"data").unwrap();
        assert!(matches!(o_data.kind(), Some(TemplateKind::OpReturnOut(_))));

        assert!(Output::new(1, Script::new()).kind().is_none());
    }

    #[test]
    fn test_truncated_output() {
        let bytes = Output::new(5, Script::from_string("OP_DUP OP_DROP").unwrap()).to_bytes();
        assert!(Output::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Output::from_bytes(&bytes[..4]).is_err());
    }
}
