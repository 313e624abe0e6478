use proptest::prelude::*;

use bitforge_primitives::ec::PrivateKey;
use bitforge_primitives::hash::sha256;
use bitforge_primitives::hd::HdPrivateKey;
use bitforge_primitives::network::{LIVENET, TESTNET};
use bitforge_primitives::util::{decode_int, decode_varint, encode_int, encode_varint, Buffer};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wif_roundtrip(seed in prop::array::uniform32(any::<u8>()), testnet in any::<bool>()) {
        // Not every 32-byte string is a valid scalar.
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let network = if testnet { &TESTNET } else { &LIVENET };
            let (decoded, found) = PrivateKey::from_wif(&key.to_wif(network)).unwrap();
            prop_assert_eq!(found, network);
            prop_assert_eq!(decoded.to_hex(), key.to_hex());
        }
    }

    #[test]
    fn ecdsa_sign_verify(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..128)
    ) {
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let hash = sha256(&msg);
            let sig = key.sign(&hash).unwrap();
            prop_assert!(sig.is_low_s());
            prop_assert!(key.to_public_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn varint_decode_inverts_encode(value in any::<u64>()) {
        let encoded = encode_varint(value);
        let (decoded, used) = decode_varint(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(used, encoded.len());
        prop_assert_eq!(Buffer::new(&encoded).read_varint().unwrap(), value);
    }

    #[test]
    fn int_codec_roundtrip(value in any::<u32>(), big_endian in any::<bool>()) {
        let encoded = encode_int(value as u64, 4, big_endian).unwrap();
        prop_assert_eq!(decode_int(&encoded, big_endian).unwrap(), value as u64);
    }

    #[test]
    fn hd_public_derivation_matches_private(
        seed in prop::collection::vec(any::<u8>(), 16..=64),
        index in 0u32..0x8000_0000
    ) {
        let master = HdPrivateKey::from_seed(&seed, &LIVENET).unwrap();
        let from_private = master.derive(index, false).unwrap().to_hd_public_key();
        let from_public = master.to_hd_public_key().derive(index, false).unwrap();
        prop_assert_eq!(from_private.to_string(), from_public.to_string());
    }
}
