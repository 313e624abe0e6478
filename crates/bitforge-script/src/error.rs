use crate::opcode::Opcode;

/// Error types for script operations.
///
/// Covers opcode lookups, instruction construction, binary and textual
/// parsing, and address handling. Interpreter failures have their own
/// `VerifyError` type.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// A symbolic name that is not in the opcode table.
    #[error("no known operation named {0}")]
    UnknownOpcodeName(String),

    /// Constant pushes cover 1 to 75 bytes only.
    #[error("constant pushes carry 1 to 75 bytes, got {0}")]
    InvalidConstPushLength(usize),

    /// No push opcode can carry this many bytes.
    #[error("no push opcode can carry {0} bytes")]
    InvalidPushLength(u64),

    /// Small-integer opcodes encode 0 through 16.
    #[error("expected number in range [0, 16], got {0}")]
    InvalidSmallInt(i64),

    /// Multisig threshold outside `1..=keys`.
    #[error("multisig needs 1 to {keys} signatures, got {required}")]
    InvalidMultisig {
        /// Requested signature count `m`.
        required: usize,
        /// Number of keys `n`.
        keys: usize,
    },

    /// Push opcode given the wrong amount of data.
    #[error("opcode {opcode} can't push {length} bytes (max/exactly {max})")]
    InvalidDataLength {
        /// The push opcode.
        opcode: Opcode,
        /// Length of the data supplied.
        length: usize,
        /// The exact (constant push) or maximum (variable push) length.
        max: u64,
    },

    /// Data supplied to an opcode that does not push.
    #[error("instruction got data with opcode {0}, which does not push data")]
    UnexpectedData(Opcode),

    /// Script bytes ended inside an instruction.
    #[error("truncated script: {0}")]
    InsufficientData(#[source] bitforge_primitives::PrimitivesError),

    /// Textual script ended before a push had its arguments.
    #[error("missing arguments for {0} operation")]
    MissingPushArguments(String),

    /// Textual push size is not a decimal number.
    #[error("push size must be a number, got {0}")]
    InvalidPushSize(String),

    /// Textual push data is not `0x`-prefixed hex.
    #[error("push data must be hexa encoded and start with 0x, got {0}")]
    InvalidPushData(String),

    /// Declared push size differs from the decoded data length.
    #[error("push data length doesn't match push size, got {0}")]
    InvalidPushDataLength(usize),

    /// Invalid address string or payload.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Error from primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] bitforge_primitives::PrimitivesError),
}
