//! Transaction context for the script interpreter.
//!
//! Exposes a `Transaction` through the interpreter's `TxContext` trait so
//! CHECKSIG and CHECKLOCKTIMEVERIFY can see the spending transaction.

use bitforge_primitives::ec::{PublicKey, Signature};
use bitforge_script::interpreter::{TxContext, VerifyError, VerifyErrorCode};
use bitforge_script::Script;

use crate::input::FINAL_SEQ_NUMBER;
use crate::sighash;
use crate::transaction::Transaction;

/// A borrowed transaction, viewed by the interpreter.
pub struct TransactionContext<'a> {
    tx: &'a Transaction,
}

impl<'a> TransactionContext<'a> {
    /// Wrap `tx`.
    pub fn new(tx: &'a Transaction) -> Self {
        TransactionContext { tx }
    }
}

impl TxContext for TransactionContext<'_> {
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, VerifyError> {
        let der = match full_sig.split_last() {
            Some((_, der)) => der,
            None => return Ok(false),
        };
        let signature = Signature::from_der(der)
            .map_err(|e| VerifyError::new(VerifyErrorCode::SigDer, e.to_string()))?;
        let pub_key = PublicKey::from_bytes(pub_key)
            .map_err(|e| VerifyError::new(VerifyErrorCode::PubkeyType, e.to_string()))?;
        let sig_hash = sighash::signature_hash(self.tx, input_idx, sub_script, sighash_flag)
            .map_err(|e| VerifyError::new(VerifyErrorCode::MissingTxContext, e.to_string()))?;
        Ok(pub_key.verify(&sig_hash, &signature))
    }

    fn lock_time(&self) -> u32 {
        self.tx.lock_time
    }

    fn tx_version(&self) -> u32 {
        self.tx.version
    }

    /// Inputs past the end read as final.
    fn input_sequence(&self, input_idx: usize) -> u32 {
        self.tx
            .inputs
            .get(input_idx)
            .map(|input| input.seq_number)
            .unwrap_or(FINAL_SEQ_NUMBER)
    }
}
