//! Bitcoin script interpreter.
//!
//! Verifies that a signature script satisfies a pubkey script, the way a
//! node validates a transaction input.
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate. Callers that
//! need signature or lock time checks provide a [`TxContext`]
//! implementation that computes signature hashes and verifies signatures.
//!
//! Each evaluated script gets its own [`Thread`]. Only the data stack is
//! carried from one phase to the next.
//!
//! # Example
//!
//! ```
//! use bitforge_script::interpreter::{verify, ScriptFlags};
//! use bitforge_script::Script;
//!
//! let script_sig = Script::from_string("OP_2 OP_3").unwrap();
//! let script_pubkey = Script::from_string("OP_ADD OP_5 OP_EQUAL").unwrap();
//! assert!(verify(&script_sig, &script_pubkey, None, 0, ScriptFlags::P2SH).is_ok());
//! ```

pub mod config;
pub mod error;
pub mod flags;
mod ops_arithmetic;
mod ops_crypto;
mod ops_flow;
mod ops_stack;
pub mod scriptnum;
pub mod stack;
pub mod thread;

pub use error::{VerifyError, VerifyErrorCode};
pub use flags::ScriptFlags;
pub use scriptnum::ScriptNumber;
pub use stack::{cast_to_bool, Stack};
pub use thread::Thread;

use log::debug;

use crate::template::TemplateKind;
use crate::Script;

/// Transaction data needed by OP_CHECKSIG, OP_CHECKMULTISIG and
/// OP_CHECKLOCKTIMEVERIFY.
pub trait TxContext {
    /// Verify a signature against a public key for the given input.
    ///
    /// `full_sig` includes the sighash flag byte at the end.
    /// `pub_key` is the public key bytes.
    /// `sub_script` is the part of the executing script after the last
    /// OP_CODESEPARATOR, with the signatures being checked removed.
    /// `input_idx` is the input being verified.
    /// `sighash_flag` is the sighash type.
    ///
    /// Returns Ok(true) if valid, Ok(false) if invalid, Err on failure.
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, VerifyError>;

    /// Get the transaction lock time.
    fn lock_time(&self) -> u32;

    /// Get the transaction version.
    fn tx_version(&self) -> u32;

    /// Get the sequence number of the given input.
    fn input_sequence(&self, input_idx: usize) -> u32;
}

/// Verify that `script_sig` unlocks `script_pubkey`.
///
/// # Arguments
/// * `script_sig` - The input's signature script.
/// * `script_pubkey` - The spent output's pubkey script.
/// * `tx` - Transaction context for signature and lock time checks.
/// * `input_index` - The input being verified.
/// * `flags` - Verification flags.
///
/// # Returns
/// `Ok(())` if the input is validly spent, otherwise the rejection reason.
pub fn verify(
    script_sig: &Script,
    script_pubkey: &Script,
    tx: Option<&dyn TxContext>,
    input_index: usize,
    flags: ScriptFlags,
) -> Result<(), VerifyError> {
    let result = verify_phases(script_sig, script_pubkey, tx, input_index, flags);
    if let Err(ref e) = result {
        debug!("input {} rejected: {} ({})", input_index, e.code, e.description);
    }
    result
}

fn verify_phases(
    script_sig: &Script,
    script_pubkey: &Script,
    tx: Option<&dyn TxContext>,
    input_index: usize,
    flags: ScriptFlags,
) -> Result<(), VerifyError> {
    if flags.has_flag(ScriptFlags::SIGPUSHONLY) && !script_sig.is_push_only() {
        return Err(not_push_only());
    }

    debug!("input {}: evaluating signature script", input_index);
    let stack = evaluate(script_sig, Vec::new(), tx, input_index, flags)?;
    let stack_copy = if flags.has_flag(ScriptFlags::P2SH) {
        Some(stack.clone())
    } else {
        None
    };

    debug!("input {}: evaluating pubkey script", input_index);
    let mut stack = evaluate(script_pubkey, stack, tx, input_index, flags)?;
    require_true(&stack)?;

    if let Some(mut stack_copy) = stack_copy {
        if matches!(script_pubkey.kind(), Some(TemplateKind::PayToScriptOut(_))) {
            if !script_sig.is_push_only() {
                return Err(not_push_only());
            }

            let redeem_bytes = stack_copy.pop().ok_or_else(|| {
                VerifyError::new(VerifyErrorCode::InvalidStackOperation, "no redeem script on the stack")
            })?;
            let redeem_script = Script::from_bytes(&redeem_bytes).map_err(|e| {
                VerifyError::new(VerifyErrorCode::BadOpcode, format!("unparseable redeem script: {}", e))
            })?;

            debug!("input {}: evaluating redeem script", input_index);
            stack = evaluate(&redeem_script, stack_copy, tx, input_index, flags)?;
            require_true(&stack)?;
        }
    }

    if flags.has_flag(ScriptFlags::CLEANSTACK) && stack.len() != 1 {
        return Err(VerifyError::new(
            VerifyErrorCode::CleanStack,
            format!("stack contains {} unexpected items", stack.len().saturating_sub(1)),
        ));
    }
    Ok(())
}

/// Run one script over `stack` and return the resulting stack.
pub fn evaluate(
    script: &Script,
    stack: Vec<Vec<u8>>,
    tx: Option<&dyn TxContext>,
    input_index: usize,
    flags: ScriptFlags,
) -> Result<Vec<Vec<u8>>, VerifyError> {
    let mut thread = Thread::new(script, stack, flags, tx, input_index);
    thread.evaluate()?;
    Ok(thread.into_stack())
}

fn require_true(stack: &[Vec<u8>]) -> Result<(), VerifyError> {
    match stack.last() {
        Some(top) if cast_to_bool(top) => Ok(()),
        Some(_) => Err(VerifyError::new(
            VerifyErrorCode::EvalFalse,
            "false stack entry at end of script execution",
        )),
        None => Err(VerifyError::new(
            VerifyErrorCode::EvalFalse,
            "stack empty at end of script execution",
        )),
    }
}

fn not_push_only() -> VerifyError {
    VerifyError::new(VerifyErrorCode::SigPushOnly, "signature script is not push only")
}
