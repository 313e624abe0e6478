//! Flow control operations for the script interpreter.

use crate::opcode::Opcode;

use super::config::{LOCKTIME_NUM_LENGTH, LOCKTIME_THRESHOLD, SEQUENCE_FINAL};
use super::error::{VerifyError, VerifyErrorCode};
use super::flags::ScriptFlags;
use super::thread::Thread;

impl<'a> Thread<'a> {
    /// OP_IF, or OP_NOTIF when `negate` is set. The condition is only
    /// popped inside an executing branch.
    pub(crate) fn op_if(&mut self, negate: bool) -> Result<(), VerifyError> {
        let mut taken = false;
        if self.is_branch_executing() {
            taken = self.dstack.pop_bool().map_err(|_| {
                VerifyError::new(
                    VerifyErrorCode::UnbalancedConditional,
                    "conditional opcode requires a value on the stack",
                )
            })?;
            if negate {
                taken = !taken;
            }
        }
        self.cond_stack.push(taken);
        Ok(())
    }

    pub(crate) fn op_else(&mut self, opcode: Opcode) -> Result<(), VerifyError> {
        match self.cond_stack.last_mut() {
            Some(taken) => {
                *taken = !*taken;
                Ok(())
            }
            None => Err(unbalanced(opcode)),
        }
    }

    pub(crate) fn op_endif(&mut self, opcode: Opcode) -> Result<(), VerifyError> {
        self.cond_stack.pop().map(|_| ()).ok_or_else(|| unbalanced(opcode))
    }

    /// Pop the top element and fail with `code` unless it is true.
    pub(crate) fn abstract_verify(&mut self, opcode: Opcode, code: VerifyErrorCode) -> Result<(), VerifyError> {
        let verified = self.dstack.pop_bool()?;
        if !verified {
            return Err(VerifyError::new(code, format!("{} failed", opcode)));
        }
        Ok(())
    }

    pub(crate) fn op_return(&mut self) -> Result<(), VerifyError> {
        Err(VerifyError::new(VerifyErrorCode::OpReturn, "script returned early"))
    }

    pub(crate) fn op_upgradable_nop(&self, opcode: Opcode) -> Result<(), VerifyError> {
        if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(VerifyError::new(
                VerifyErrorCode::DiscourageUpgradableNops,
                format!("{} reserved for soft-fork upgrades", opcode),
            ));
        }
        Ok(())
    }

    pub(crate) fn op_check_locktime_verify(&mut self) -> Result<(), VerifyError> {
        if !self.has_flag(ScriptFlags::CHECKLOCKTIMEVERIFY) {
            return self.op_upgradable_nop(Opcode::CheckLockTimeVerify);
        }

        let lock_time = self.dstack.peek_int(0, LOCKTIME_NUM_LENGTH)?;
        if lock_time.is_negative() {
            return Err(VerifyError::new(
                VerifyErrorCode::NegativeLocktime,
                format!("negative lock time: {}", lock_time.to_i64()),
            ));
        }

        let ctx = self.tx_context.ok_or_else(|| {
            VerifyError::new(
                VerifyErrorCode::MissingTxContext,
                "no tx context for CHECKLOCKTIMEVERIFY",
            )
        })?;

        verify_lock_time(ctx.lock_time() as i64, LOCKTIME_THRESHOLD, lock_time.to_i64())?;

        if ctx.input_sequence(self.input_idx) == SEQUENCE_FINAL {
            return Err(VerifyError::new(
                VerifyErrorCode::UnsatisfiedLocktime,
                "transaction input is finalized",
            ));
        }
        Ok(())
    }
}

fn unbalanced(opcode: Opcode) -> VerifyError {
    VerifyError::new(
        VerifyErrorCode::UnbalancedConditional,
        format!(
            "encountered opcode {} with no matching opcode to begin conditional execution",
            opcode
        ),
    )
}

/// Require `lock_time` and `tx_lock_time` on the same side of `threshold`
/// with `lock_time` not past `tx_lock_time`.
pub(crate) fn verify_lock_time(tx_lock_time: i64, threshold: i64, lock_time: i64) -> Result<(), VerifyError> {
    if (tx_lock_time < threshold) != (lock_time < threshold) {
        return Err(VerifyError::new(
            VerifyErrorCode::UnsatisfiedLocktime,
            format!(
                "mismatched locktime types -- tx locktime {}, stack locktime {}",
                tx_lock_time, lock_time
            ),
        ));
    }
    if lock_time > tx_lock_time {
        return Err(VerifyError::new(
            VerifyErrorCode::UnsatisfiedLocktime,
            format!(
                "locktime requirement not satisfied -- locktime is greater than the transaction locktime: {} > {}",
                lock_time, tx_lock_time
            ),
        ));
    }
    Ok(())
}
