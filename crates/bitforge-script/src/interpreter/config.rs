//! Interpreter limits.

/// Largest serialized script accepted for evaluation.
pub const MAX_SCRIPT_SIZE: usize = 10000;
/// Largest combined stack plus altstack element count.
pub const MAX_STACK_SIZE: usize = 1000;
/// Largest number of non-push operations per script, multisig keys included.
pub const MAX_OPS_PER_SCRIPT: usize = 201;
/// Largest single stack element.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Largest key count of CHECKMULTISIG.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;
/// Default byte length limit of numeric operands.
pub const MAX_SCRIPT_NUM_LENGTH: usize = 4;
/// Byte length limit of the CHECKLOCKTIMEVERIFY operand.
pub const LOCKTIME_NUM_LENGTH: usize = 5;
/// Lock times below this are block heights, at or above it timestamps.
pub const LOCKTIME_THRESHOLD: i64 = 500_000_000;
/// Sequence number that disables lock time checks for an input.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;
