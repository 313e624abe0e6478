/// Bitforge - Script model, classification, and verification.
///
/// Provides the opcode table, script instructions, parsing and serialization
/// of scripts in binary and text form, standard script templates and their
/// classification, addresses, and a script interpreter.

pub mod opcode;
pub mod instruction;
pub mod script;
pub mod template;
pub mod address;
pub mod interpreter;

mod error;
pub use error::ScriptError;
pub use opcode::Opcode;
pub use instruction::Instruction;
pub use script::{SchematicItem, Script};
pub use template::{classify, TemplateKind};
pub use address::{Address, AddressType};
