/// Bitforge - Transaction assembly, signing, and verification.
///
/// Provides the Transaction type with inputs and outputs, the legacy
/// signature hash, key-based input signing, and binary/hex serialization.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;
pub mod template;
pub mod context;

mod error;
pub use error::TransactionError;
pub use transaction::Transaction;
pub use input::{Input, FINAL_SEQ_NUMBER};
pub use output::Output;
pub use context::TransactionContext;
