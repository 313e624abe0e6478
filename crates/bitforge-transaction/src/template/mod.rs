//! Signing templates for standard input kinds.
//!
//! Provides the `UnlockingScriptTemplate` trait and implementations for
//! pay-to-pubkey-hash and pay-to-script-hash inputs. Each template signs
//! the input's placeholder script with `SIGHASH_ALL`.

pub mod p2pkh;
pub mod p2sh;

use bitforge_primitives::ec::PrivateKey;
use bitforge_script::Script;

use crate::input::{Input, SignMethod};
use crate::sighash::SIGHASH_ALL;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Trait for script templates that produce unlocking scripts.
///
/// The `sign` method receives the full transaction and the input index,
/// computes the signature hash over the input's placeholder, signs it, and
/// returns the unlocking script.
pub trait UnlockingScriptTemplate {
    /// Produce an unlocking script for the given input.
    ///
    /// # Arguments
    /// * `tx` - The transaction being signed.
    /// * `input_index` - The index of the input to sign.
    ///
    /// # Returns
    /// `Ok(Script)` containing the unlocking script, or an error on failure.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError>;
}

/// Pick the template matching how `input` was built.
///
/// # Returns
/// The template borrowing `keys`, or `UnknownSignatureMethod` for inputs
/// built from an arbitrary script.
pub fn for_input<'a>(
    input: &Input,
    keys: &'a [PrivateKey],
) -> Result<Box<dyn UnlockingScriptTemplate + 'a>, TransactionError> {
    match input.sign_method() {
        SignMethod::Address => match keys {
            [key] => Ok(Box::new(p2pkh::unlock(key))),
            _ => Err(TransactionError::InvalidSignatureCount {
                required: 1,
                provided: keys.len(),
            }),
        },
        SignMethod::Script => Ok(Box::new(p2sh::unlock(keys))),
        SignMethod::Unknown => Err(TransactionError::UnknownSignatureMethod),
    }
}

/// DER signature over `sig_hash` with the `SIGHASH_ALL` byte appended.
pub(crate) fn sign_all(key: &PrivateKey, sig_hash: &[u8; 32]) -> Result<Vec<u8>, TransactionError> {
    let mut sig = key.sign(sig_hash)?.to_der();
    sig.push(SIGHASH_ALL as u8);
    Ok(sig)
}

/// Signature hash of `input_index` over its own placeholder script.
pub(crate) fn placeholder_hash(tx: &Transaction, input_index: usize) -> Result<[u8; 32], TransactionError> {
    let input = tx.input(input_index)?;
    tx.signature_hash(input_index, &input.script, SIGHASH_ALL)
}
