//! Pay-to-Public-Key-Hash (P2PKH) signing template.
//!
//! Produces unlocking scripts of the form `<sig> <pubkey>` for inputs whose
//! placeholder is `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.

use bitforge_primitives::ec::PrivateKey;
use bitforge_script::Script;

use crate::template::{placeholder_hash, sign_all, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Create a P2PKH unlocker for signing with `private_key`.
pub fn unlock(private_key: &PrivateKey) -> P2PKH<'_> {
    P2PKH { private_key }
}

/// P2PKH signing template holding a private key.
pub struct P2PKH<'a> {
    private_key: &'a PrivateKey,
}

impl UnlockingScriptTemplate for P2PKH<'_> {
    /// Sign the input and produce `<DER_sig || SIGHASH_ALL> <pubkey>`.
    ///
    /// The public key is pushed in the encoding the private key is flagged
    /// for, so it hashes to the address the placeholder pays.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let sig_hash = placeholder_hash(tx, input_index)?;
        let signature = sign_all(self.private_key, &sig_hash)?;
        Ok(Script::pay_to_pubkey_in(&self.private_key.to_public_key(), &signature)?)
    }
}
