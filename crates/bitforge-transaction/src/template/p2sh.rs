//! Pay-to-Script-Hash (P2SH) signing template.
//!
//! Produces unlocking scripts of the form `OP_0 <sig>... <redeem script>`
//! for inputs whose placeholder is the redeem script itself.

use bitforge_primitives::ec::PrivateKey;
use bitforge_script::{Script, TemplateKind};

use crate::template::{placeholder_hash, sign_all, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Create a P2SH unlocker signing with each of `private_keys`.
pub fn unlock(private_keys: &[PrivateKey]) -> P2SH<'_> {
    P2SH { private_keys }
}

/// P2SH signing template holding the signing keys.
pub struct P2SH<'a> {
    private_keys: &'a [PrivateKey],
}

impl UnlockingScriptTemplate for P2SH<'_> {
    /// Sign the input with every key and wrap the signatures around the
    /// redeem script.
    ///
    /// For a multisig redeem script exactly `m` keys are required, and the
    /// signatures are ordered to match the order of the public keys in the
    /// script, as CHECKMULTISIG expects.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let redeem = &tx.input(input_index)?.script;
        let mut keys: Vec<&PrivateKey> = self.private_keys.iter().collect();

        if let Some(TemplateKind::RedeemMultisig(multisig)) = redeem.kind() {
            let required = multisig.required_signatures() as usize;
            if keys.len() != required {
                return Err(TransactionError::InvalidSignatureCount {
                    required,
                    provided: keys.len(),
                });
            }
            let order = multisig.public_key_bytes();
            keys.sort_by_key(|key| {
                let pubkey = key.to_public_key().to_bytes();
                order.iter().position(|p| *p == pubkey.as_slice()).unwrap_or(usize::MAX)
            });
        }

        let sig_hash = placeholder_hash(tx, input_index)?;
        let signatures = keys
            .into_iter()
            .map(|key| sign_all(key, &sig_hash))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Script::pay_to_script_in(redeem, &signatures)?)
    }
}
