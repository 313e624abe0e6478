//! Signature hash computation for transaction signing.
//!
//! Computes the hash that ECDSA signs to authorize spending an input, using
//! the original (pre-segwit) algorithm: a copy of the transaction is
//! redacted according to the hash type, serialized with the hash type
//! appended, and double-SHA256 hashed.

use bitforge_primitives::hash::sha256d;
use bitforge_primitives::Writer;
use bitforge_script::{Opcode, Script};

use crate::input::Input;
use crate::output::Output;
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// Hash signed by SIGHASH_SINGLE when the input has no matching output:
/// the number one, little-endian.
pub const SIGHASH_SINGLE_BUG: [u8; 32] = [
    1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Compute the signature hash for a given input.
///
/// # Arguments
/// * `tx`          - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `sub_script`  - The script the signature commits to. Any
///   OP_CODESEPARATOR in it is dropped.
/// * `hash_type`   - The sighash flags (e.g. `SIGHASH_ALL`).
///
/// # Returns
/// A 32-byte double-SHA256 hash to be signed by ECDSA, or
/// `InputIndexOutOfRange`.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    sub_script: &Script,
    hash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InputIndexOutOfRange {
            index: input_index,
            count: tx.inputs.len(),
        });
    }

    let base_type = hash_type & SIGHASH_MASK;
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Ok(SIGHASH_SINGLE_BUG);
    }

    let preimage = calc_preimage(tx, input_index, sub_script, hash_type);
    Ok(sha256d(&preimage))
}

/// Build the redacted transaction bytes that `signature_hash` hashes.
///
/// The caller guarantees `input_index` is in range, and for
/// SIGHASH_SINGLE that a matching output exists.
///
/// The copy differs from `tx` as follows:
/// 1. Every input script is emptied, except the signed one, which holds
///    `sub_script` without code separators.
/// 2. NONE drops all outputs; SINGLE keeps outputs up to `input_index`,
///    blanking all but the last. Both zero the other inputs' sequences.
/// 3. ANYONECANPAY keeps only the signed input.
/// 4. The 4-byte little-endian hash type is appended.
fn calc_preimage(tx: &Transaction, input_index: usize, sub_script: &Script, hash_type: u32) -> Vec<u8> {
    let base_type = hash_type & SIGHASH_MASK;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;

    let mut script_code = sub_script.clone();
    script_code.remove_opcode(Opcode::CodeSeparator);

    let inputs: Vec<Input> = tx
        .inputs
        .iter()
        .enumerate()
        .filter(|(i, _)| !anyone_can_pay || *i == input_index)
        .map(|(i, input)| {
            if i == input_index {
                return input.with_script(script_code.clone());
            }
            let mut other = input.without_script();
            if base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE {
                other.seq_number = 0;
            }
            other
        })
        .collect();

    let outputs: Vec<Output> = match base_type {
        SIGHASH_NONE => Vec::new(),
        SIGHASH_SINGLE => tx.outputs[..=input_index]
            .iter()
            .enumerate()
            .map(|(i, output)| {
                if i == input_index {
                    output.clone()
                } else {
                    Output::new(u64::MAX, Script::new())
                }
            })
            .collect(),
        _ => tx.outputs.clone(),
    };

    let mut writer = Writer::with_capacity(256);
    writer.write_u32_le(tx.version);

    writer.write_varint(inputs.len() as u64);
    for input in &inputs {
        input.write_to(&mut writer);
    }

    writer.write_varint(outputs.len() as u64);
    for output in &outputs {
        output.write_to(&mut writer);
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(hash_type);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(n_inputs: usize, n_outputs: usize) -> Transaction {
        let inputs = (0..n_inputs)
            .map(|i| Input::new([i as u8 + 1; 32], i as u32, Script::from_string("OP_1").unwrap(), 7))
            .collect();
        let outputs = (0..n_outputs)
            .map(|i| Output::new(1000 * (i as u64 + 1), Script::from_string("OP_DUP").unwrap()))
            .collect();
        Transaction::new(inputs, outputs).unwrap()
    }

    #[test]
    fn test_index_out_of_range() {
        let tx = sample_tx(1, 1);
        let err = signature_hash(&tx, 1, &Script::new(), SIGHASH_ALL).unwrap_err();
        assert!(matches!(err, TransactionError::InputIndexOutOfRange { index: 1, count: 1 }));
    }

    #[test]
    fn test_single_without_matching_output() {
        let tx = sample_tx(2, 1);
        let hash = signature_hash(&tx, 1, &Script::new(), SIGHASH_SINGLE).unwrap();
        assert_eq!(hash, SIGHASH_SINGLE_BUG);

        let hash = signature_hash(&tx, 0, &Script::new(), SIGHASH_SINGLE).unwrap();
        assert_ne!(hash, SIGHASH_SINGLE_BUG);
    }

    #[test]
    fn test_all_preimage_layout() {
        let tx = sample_tx(2, 1);
        let sub = Script::from_string("OP_DUP OP_CODESEPARATOR OP_DROP").unwrap();
        let preimage = calc_preimage(&tx, 0, &sub, SIGHASH_ALL);

        let mut expected = tx.clone();
        expected.inputs[0].script = Script::from_string("OP_DUP OP_DROP").unwrap();
        expected.inputs[1].script = Script::new();
        let mut bytes = expected.to_bytes();
        bytes.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        assert_eq!(preimage, bytes);
    }

    #[test]
    fn test_none_redacts_outputs_and_sequences() {
        let tx = sample_tx(2, 2);
        let preimage = calc_preimage(&tx, 1, &Script::new(), SIGHASH_NONE);

        let mut expected = tx.clone();
        expected.inputs[0] = expected.inputs[0].without_script();
        expected.inputs[0].seq_number = 0;
        expected.inputs[1].script = Script::new();
        expected.outputs.clear();
        let mut bytes = expected.to_bytes();
        bytes.extend_from_slice(&SIGHASH_NONE.to_le_bytes());
        assert_eq!(preimage, bytes);
    }

    #[test]
    fn test_single_blanks_earlier_outputs() {
        let tx = sample_tx(2, 3);
        let preimage = calc_preimage(&tx, 1, &Script::new(), SIGHASH_SINGLE);

        let mut expected = tx.clone();
        expected.inputs[0] = expected.inputs[0].without_script();
        expected.inputs[0].seq_number = 0;
        expected.inputs[1].script = Script::new();
        expected.outputs.truncate(2);
        expected.outputs[0] = Output::new(u64::MAX, Script::new());
        let mut bytes = expected.to_bytes();
        bytes.extend_from_slice(&SIGHASH_SINGLE.to_le_bytes());
        assert_eq!(preimage, bytes);
    }

    #[test]
    fn test_anyone_can_pay_keeps_only_signed_input() {
        let tx = sample_tx(3, 1);
        let hash_type = SIGHASH_ALL | SIGHASH_ANYONECANPAY;
        let preimage = calc_preimage(&tx, 2, &Script::new(), hash_type);

        let mut expected = tx.clone();
        expected.inputs = vec![tx.inputs[2].without_script()];
        let mut bytes = expected.to_bytes();
        bytes.extend_from_slice(&hash_type.to_le_bytes());
        assert_eq!(preimage, bytes);

        // Other inputs may change without invalidating the signature.
        let mut changed = tx.clone();
        changed.inputs[0].seq_number = 1;
        assert_eq!(
            signature_hash(&tx, 2, &Script::new(), hash_type).unwrap(),
            signature_hash(&changed, 2, &Script::new(), hash_type).unwrap()
        );
    }

    #[test]
    fn test_hash_type_changes_digest() {
        let tx = sample_tx(1, 1);
        let sub = Script::from_string("OP_1").unwrap();
        let all = signature_hash(&tx, 0, &sub, SIGHASH_ALL).unwrap();
        let none = signature_hash(&tx, 0, &sub, SIGHASH_NONE).unwrap();
        assert_ne!(all, none);
    }
}
