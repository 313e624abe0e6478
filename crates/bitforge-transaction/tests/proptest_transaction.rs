use proptest::prelude::*;

use bitforge_script::{Instruction, Script};
use bitforge_transaction::{Input, Output, Transaction};

/// A script of pushes only, so any generated data parses back.
fn arb_script() -> impl Strategy<Value = Script> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..4).prop_map(|pushes| {
        Script::from_instructions(
            pushes
                .iter()
                .map(|data| Instruction::push_for(data).unwrap())
                .collect(),
        )
    })
}

/// Strategy to generate a valid random transaction.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()), // source tx id
        any::<u32>(),                        // source output index
        arb_script(),
        any::<u32>(), // sequence
    )
        .prop_map(|(tx_id, idx, script, seq)| Input::new(tx_id, idx, script, seq));

    let arb_output = (any::<u64>(), arb_script()).prop_map(|(amount, script)| Output::new(amount, script));

    (
        any::<u32>(), // version
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(), // lock time
    )
        .prop_map(|(version, inputs, outputs, lock_time)| {
            Transaction::new(inputs, outputs)
                .unwrap()
                .with_version(version)
                .with_lock_time(lock_time)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transaction_serialize_deserialize_roundtrip(tx in arb_transaction()) {
        let bytes = tx.to_bytes();
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx2, &tx);
        prop_assert_eq!(tx2.tx_id(), tx.tx_id());
    }

    #[test]
    fn transaction_hex_roundtrip(tx in arb_transaction()) {
        let tx2 = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(tx.to_hex(), tx2.to_hex());
    }

    #[test]
    fn truncated_transaction_is_rejected(tx in arb_transaction(), cut in 1usize..16) {
        let bytes = tx.to_bytes();
        let cut = cut.min(bytes.len());
        prop_assert!(Transaction::from_bytes(&bytes[..bytes.len() - cut]).is_err());
    }
}
