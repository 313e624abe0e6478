//! Interpreter error types.

use std::fmt;

/// Why a script was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyErrorCode {
    /// Script finished with an empty stack or a false top element.
    EvalFalse,
    /// OP_RETURN was executed.
    OpReturn,
    /// Serialized script exceeds the size limit.
    ScriptSize,
    /// A pushed element exceeds the element size limit.
    PushSize,
    /// Too many non-push operations.
    OpCount,
    /// Stack and altstack together exceed the element limit.
    StackSize,
    /// Signature count out of range in CHECKMULTISIG.
    SigCount,
    /// Public key count out of range in CHECKMULTISIG.
    PubkeyCount,
    /// OP_VERIFY failed.
    Verify,
    /// OP_EQUALVERIFY failed.
    EqualVerify,
    /// OP_CHECKMULTISIGVERIFY failed.
    CheckMultisigVerify,
    /// OP_CHECKSIGVERIFY failed.
    CheckSigVerify,
    /// OP_NUMEQUALVERIFY failed.
    NumEqualVerify,
    /// Reserved or unassigned opcode executed, or an unparseable script.
    BadOpcode,
    /// A disabled opcode appeared in the script.
    DisabledOpcode,
    /// Not enough elements on the stack.
    InvalidStackOperation,
    /// Not enough elements on the altstack.
    InvalidAltstackOperation,
    /// IF/NOTIF/ELSE/ENDIF do not nest.
    UnbalancedConditional,
    /// CHECKLOCKTIMEVERIFY operand is negative.
    NegativeLocktime,
    /// CHECKLOCKTIMEVERIFY requirement not met by the transaction.
    UnsatisfiedLocktime,
    /// Undefined sighash type under STRICTENC.
    SigHashType,
    /// Signature is not strict DER.
    SigDer,
    /// Push or number not minimally encoded under MINIMALDATA.
    MinimalData,
    /// Signature script is not push-only.
    SigPushOnly,
    /// Signature S value is above half the curve order under LOW_S.
    SigHighS,
    /// CHECKMULTISIG dummy element is not empty under NULLDUMMY.
    SigNullDummy,
    /// Public key is not a valid SEC1 encoding under STRICTENC.
    PubkeyType,
    /// Stack holds more than one element at the end under CLEANSTACK.
    CleanStack,
    /// Upgradable NOP executed under DISCOURAGE_UPGRADABLE_NOPS.
    DiscourageUpgradableNops,
    /// A numeric operand is longer than allowed.
    NumberOverflow,
    /// A transaction-dependent opcode ran without a transaction.
    MissingTxContext,
}

impl fmt::Display for VerifyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A script rejection: a code and a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    /// The rejection reason.
    pub code: VerifyErrorCode,
    /// Details for humans.
    pub description: String,
}

impl VerifyError {
    /// Create an error from a code and description.
    pub fn new(code: VerifyErrorCode, description: impl Into<String>) -> Self {
        VerifyError {
            code,
            description: description.into(),
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

impl std::error::Error for VerifyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_description() {
        let err = VerifyError::new(VerifyErrorCode::EvalFalse, "false stack entry at end of script execution");
        assert_eq!(err.to_string(), "false stack entry at end of script execution");
        assert_eq!(err.code.to_string(), "EvalFalse");
    }
}
