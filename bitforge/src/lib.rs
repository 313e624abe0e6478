#![deny(missing_docs)]

//! Bitforge - Bitcoin primitives library.
//!
//! Re-exports all bitforge components for convenient single-crate usage.

pub use bitforge_primitives as primitives;
pub use bitforge_script as script;
pub use bitforge_transaction as transaction;
