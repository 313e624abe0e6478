//! Core transaction type.
//!
//! Represents a complete transaction with version, inputs, outputs, and
//! lock time. Supports binary and hex serialization, transaction ID
//! computation, input signing, and input verification against the
//! script interpreter.

use bitforge_primitives::hash::sha256d;
use bitforge_primitives::ec::PrivateKey;
use bitforge_primitives::{Buffer, Writer};
use bitforge_script::interpreter::{self, ScriptFlags, TxContext, VerifyError, VerifyErrorCode};
use bitforge_script::Script;
use log::debug;

use crate::context::TransactionContext;
use crate::input::Input;
use crate::output::Output;
use crate::sighash;
use crate::template;
use crate::TransactionError;

/// A transaction consisting of a version, a set of inputs, a set of
/// outputs, and a lock time.
///
/// # Wire format
///
/// | Field        | Size                      |
/// |--------------|---------------------------|
/// | version      | 4 bytes (LE)              |
/// | input count  | VarInt                    |
/// | inputs       | variable (per input)      |
/// | output count | VarInt                    |
/// | outputs      | variable (per output)     |
/// | lock_time    | 4 bytes (LE)              |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,

    /// Ordered list of transaction inputs.
    pub inputs: Vec<Input>,

    /// Ordered list of transaction outputs.
    pub outputs: Vec<Output>,

    /// Lock time. If non-zero, the transaction is not valid until the
    /// specified block height or Unix timestamp.
    pub lock_time: u32,
}

impl Transaction {
    /// Create a version 1 transaction with lock time 0.
    ///
    /// # Returns
    /// The transaction, or `NoInputs`/`NoOutputs` if either list is empty.
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Result<Self, TransactionError> {
        if inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }
        if outputs.is_empty() {
            return Err(TransactionError::NoOutputs);
        }
        Ok(Transaction {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        })
    }

    /// Replace the lock time.
    pub fn with_lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    /// Replace the version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The byte slice must contain exactly one complete transaction with
    /// no trailing data.
    ///
    /// # Arguments
    /// * `bytes` - The raw transaction bytes.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or a `TransactionError` if the data
    /// is truncated, malformed, or has trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut buffer = Buffer::new(bytes);
        let tx = Self::from_buffer(&mut buffer)?;
        if !buffer.is_empty() {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                buffer.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `Buffer`.
    ///
    /// Reads the version, input count, inputs, output count, outputs, and
    /// lock time in standard wire format.
    pub fn from_buffer(buffer: &mut Buffer<'_>) -> Result<Self, TransactionError> {
        let version = buffer
            .read_u32_le()
            .map_err(|e| TransactionError::SerializationError(format!("reading version: {}", e)))?;

        let input_count = buffer
            .read_varint()
            .map_err(|e| TransactionError::SerializationError(format!("reading input count: {}", e)))?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(Input::from_buffer(buffer)?);
        }

        let output_count = buffer
            .read_varint()
            .map_err(|e| TransactionError::SerializationError(format!("reading output count: {}", e)))?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(Output::from_buffer(buffer)?);
        }

        let lock_time = buffer
            .read_u32_le()
            .map_err(|e| TransactionError::SerializationError(format!("reading lock time: {}", e)))?;

        Ok(Transaction::new(inputs, outputs)?
            .with_version(version)
            .with_lock_time(lock_time))
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this transaction to raw bytes.
    ///
    /// # Returns
    /// version(4) + varint(n_in) + inputs + varint(n_out) + outputs + locktime(4).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(256);
        writer.write_u32_le(self.version);

        writer.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Serialize this transaction to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Return the size of this transaction in bytes.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    // -----------------------------------------------------------------
    // Transaction ID
    // -----------------------------------------------------------------

    /// Double SHA-256 of the serialized transaction, in internal byte order.
    pub fn hash(&self) -> [u8; 32] {
        sha256d(&self.to_bytes())
    }

    /// The transaction ID: `hash()` byte-reversed, as hex.
    pub fn tx_id(&self) -> String {
        let mut id = self.hash();
        id.reverse();
        hex::encode(id)
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Compute the signature hash for an input.
    ///
    /// # Arguments
    /// * `input_index` - Index of the input being signed.
    /// * `sub_script` - The script the signature commits to.
    /// * `hash_type` - Sighash flags (e.g. `SIGHASH_ALL`).
    pub fn signature_hash(
        &self,
        input_index: usize,
        sub_script: &Script,
        hash_type: u32,
    ) -> Result<[u8; 32], TransactionError> {
        sighash::signature_hash(self, input_index, sub_script, hash_type)
    }

    /// Sign one input, returning a copy of the transaction with that
    /// input's placeholder replaced by its signature script.
    ///
    /// Address inputs take exactly one key. Script inputs take one key per
    /// signature; multisig redeem scripts require exactly `m`.
    ///
    /// # Arguments
    /// * `input_index` - The input to sign.
    /// * `keys` - Private keys to sign with.
    ///
    /// # Returns
    /// The signed transaction, or `InputIndexOutOfRange`,
    /// `UnknownSignatureMethod`, or `InvalidSignatureCount`.
    pub fn sign_input(&self, input_index: usize, keys: &[PrivateKey]) -> Result<Transaction, TransactionError> {
        let input = self.input(input_index)?;
        let unlocker = template::for_input(input, keys)?;
        let script = unlocker.sign(self, input_index)?;
        debug!(
            "signed input {} with {} key(s), sighash 0x{:02x}, script is {} bytes",
            input_index,
            keys.len(),
            sighash::SIGHASH_ALL,
            script.byte_len()
        );

        let mut signed = self.clone();
        signed.inputs[input_index] = input.with_script(script);
        Ok(signed)
    }

    /// Check that input `input_index` validly spends an output locked by
    /// `script_pubkey`.
    ///
    /// # Returns
    /// `Ok(())` on acceptance, otherwise the interpreter's rejection reason.
    pub fn verify_input(
        &self,
        input_index: usize,
        script_pubkey: &Script,
        flags: ScriptFlags,
    ) -> Result<(), VerifyError> {
        let context: &dyn TxContext = &TransactionContext::new(self);
        let script_sig = match self.inputs.get(input_index) {
            Some(input) => &input.script,
            None => {
                return Err(VerifyError::new(
                    VerifyErrorCode::MissingTxContext,
                    format!("input {} not in transaction", input_index),
                ))
            }
        };
        interpreter::verify(script_sig, script_pubkey, Some(context), input_index, flags)
    }

    pub(crate) fn input(&self, index: usize) -> Result<&Input, TransactionError> {
        self.inputs.get(index).ok_or(TransactionError::InputIndexOutOfRange {
            index,
            count: self.inputs.len(),
        })
    }
}

impl std::fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
