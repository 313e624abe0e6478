/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A transaction needs at least one input.
    #[error("transactions must have at least one input")]
    NoInputs,
    /// A transaction needs at least one output.
    #[error("transactions must have at least one output")]
    NoOutputs,
    /// An input index past the end of the input list.
    #[error("input index {index} out of range (tx has {count} inputs)")]
    InputIndexOutOfRange { index: usize, count: usize },
    /// The input has no placeholder script that says how to sign it.
    #[error("this input doesn't know how to sign itself; build it as an address, script or multisig input")]
    UnknownSignatureMethod,
    /// The number of keys doesn't match what the input needs.
    #[error("this input requires {required} keys to sign, but {provided} were provided")]
    InvalidSignatureCount { required: usize, provided: usize },
    /// Data outputs carry at most 80 bytes.
    #[error("data outputs can carry at most 80 bytes, but {0} were passed in")]
    TooMuchData(usize),
    /// An error occurred during binary/hex deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An underlying script error (forwarded from `bitforge-script`).
    #[error("script error: {0}")]
    Script(#[from] bitforge_script::ScriptError),
    /// An underlying primitives error (forwarded from `bitforge-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] bitforge_primitives::PrimitivesError),
}
