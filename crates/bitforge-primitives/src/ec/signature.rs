//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::util::Buffer;
use crate::PrimitivesError;

/// The secp256k1 curve order N.
pub const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// Half of the curve order, the largest S a low-S signature may carry.
pub const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// An ECDSA signature held as 32-byte big-endian R and S.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Create a signature from raw R and S values.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// The R component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The S component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Parse a DER-encoded signature.
    ///
    /// Expected layout: `0x30 <len> 0x02 <rlen> <r> 0x02 <slen> <s>`, with
    /// `len` covering exactly the remaining bytes. R and S must be non-zero
    /// and below the curve order.
    ///
    /// # Arguments
    /// * `bytes` - DER bytes without any trailing sighash byte.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `InvalidSignature` describing the first
    /// structural problem found.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let malformed = |what: &str| PrimitivesError::InvalidSignature(format!("malformed signature: {}", what));
        let mut buf = Buffer::new(bytes);

        if buf.read_u8().map_err(|_| malformed("empty"))? != DER_SEQUENCE {
            return Err(malformed("no header magic"));
        }
        let len = buf.read_u8().map_err(|_| malformed("missing length"))? as usize;
        if len != buf.remaining() {
            return Err(malformed("bad length"));
        }

        let r = read_der_integer(&mut buf).map_err(|e| malformed(&format!("R {}", e)))?;
        let s = read_der_integer(&mut buf).map_err(|e| malformed(&format!("S {}", e)))?;
        if !buf.is_empty() {
            return Err(malformed("trailing bytes"));
        }

        for (name, value) in [("R", &r), ("S", &s)] {
            if value.iter().all(|&b| b == 0) {
                return Err(PrimitivesError::InvalidSignature(format!("signature {} is zero", name)));
            }
            if value >= &CURVE_ORDER {
                return Err(PrimitivesError::InvalidSignature(format!(
                    "signature {} is >= curve order",
                    name
                )));
            }
        }

        Ok(Signature { r, s })
    }

    /// Serialize in DER form, normalizing S to the lower half of the order.
    pub fn to_der(&self) -> Vec<u8> {
        let s = if self.is_low_s() {
            self.s
        } else {
            subtract_from_order(&self.s)
        };

        let rb = canonicalize_int(&self.r);
        let sb = canonicalize_int(&s);

        let mut out = Vec::with_capacity(6 + rb.len() + sb.len());
        out.push(DER_SEQUENCE);
        out.push((4 + rb.len() + sb.len()) as u8);
        out.push(DER_INTEGER);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(DER_INTEGER);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Whether S is at most half the curve order.
    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_ORDER
    }

    pub(crate) fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let sig: ecdsa::Signature = priv_key
            .signing_key()
            .sign_prehash(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = sig.split_bytes();
        let mut s: [u8; 32] = s_bytes.into();
        if s > HALF_ORDER {
            s = subtract_from_order(&s);
        }
        Ok(Signature {
            r: r_bytes.into(),
            s,
        })
    }

    /// Verify this signature over a 32-byte hash.
    ///
    /// High-S signatures are accepted; whether they are allowed is a policy
    /// decision left to the caller.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        let s = if self.is_low_s() {
            self.s
        } else {
            subtract_from_order(&self.s)
        };
        let sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(self.r),
            k256::FieldBytes::from(s),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        pub_key.verifying_key().verify_prehash(hash, &sig).is_ok()
    }
}

/// Read one DER INTEGER and left-pad it to 32 bytes.
///
/// Negative and non-minimally padded integers are rejected.
fn read_der_integer(buf: &mut Buffer<'_>) -> Result<[u8; 32], &'static str> {
    if buf.read_u8().map_err(|_| "missing")? != DER_INTEGER {
        return Err("no int marker");
    }
    let len = buf.read_u8().map_err(|_| "missing length")? as usize;
    if len == 0 {
        return Err("zero length");
    }
    let body = buf.read(len).map_err(|_| "bogus length")?;
    if body[0] & 0x80 != 0 {
        return Err("negative");
    }
    if len > 1 && body[0] == 0 && body[1] & 0x80 == 0 {
        return Err("excessively padded");
    }
    let trimmed = if body[0] == 0 { &body[1..] } else { body };
    if trimmed.len() > 32 {
        return Err("too large");
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Ok(out)
}

/// Strip leading zeros and add a 0x00 pad when the high bit is set.
fn canonicalize_int(val: &[u8; 32]) -> Vec<u8> {
    let start = val.iter().position(|&b| b != 0).unwrap_or(31);
    let trimmed = &val[start..];
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}

/// Compute N - val.
fn subtract_from_order(val: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - val[i] as i16 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        }
        result[i] = diff as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    fn hex_to_32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    const VALID_DER: &str = "304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41\
                             0220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d09";

    #[test]
    fn test_from_der_valid() {
        let der = hex::decode(VALID_DER).unwrap();
        let sig = Signature::from_der(&der).unwrap();
        assert_eq!(
            sig.r(),
            &hex_to_32("4e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd41")
        );
        assert_eq!(sig.to_der(), der);
    }

    #[test]
    fn test_from_der_structural_failures() {
        let der = hex::decode(VALID_DER).unwrap();

        assert!(Signature::from_der(&[]).is_err());

        let mut bad_magic = der.clone();
        bad_magic[0] = 0x31;
        assert!(Signature::from_der(&bad_magic).is_err());

        let mut bad_len = der.clone();
        bad_len[1] += 1;
        assert!(Signature::from_der(&bad_len).is_err());

        let mut bad_marker = der.clone();
        bad_marker[2] = 0x03;
        assert!(Signature::from_der(&bad_marker).is_err());

        let mut trailing = der.clone();
        trailing.push(0x01);
        assert!(Signature::from_der(&trailing).is_err());

        // Negative R.
        let mut negative = der.clone();
        negative[4] |= 0x80;
        assert!(Signature::from_der(&negative).is_err());

        // Zero R.
        assert!(Signature::from_der(&[0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01]).is_err());
    }

    #[test]
    fn test_to_der_low_s_normalization() {
        let sig = Signature::new(
            hex_to_32("a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404"),
            hex_to_32("971729c7fa944b465b35250c6570a2f31acbb14b13d1565fab7330dcb2b3dfb1"),
        );
        assert!(!sig.is_low_s());
        let expected = hex::decode(
            "3045022100a196ed0e7ebcbe7b63fe1d8eecbdbde03a67ceba4fc8f6482bdcb9606a911404\
             022068e8d638056bb4b9a4cadaf39a8f5d0b9fe32b9b9b7749dc145f2db01d826190",
        )
        .unwrap();
        assert_eq!(sig.to_der(), expected);
    }

    #[test]
    fn test_rfc6979_vectors() {
        let tests = [
            (
                "cca9fbcc1b41e5a95d369eaa6ddcff73b61a4efaa279cfc6567e8daa39cbaf50",
                "sample",
                "3045022100af340daf02cc15c8d5d08d7735dfe6b98a474ed373bdb5fbecf7571be52b384202205009fb27f37034a9b24b707b7c6b79ca23ddef9e25f7282e8a797efe53a8f124",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "Satoshi Nakamoto",
                "3045022100934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d802202442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
            ),
            (
                "f8b8af8ce3c7cca5e300d33939540c10d45ce001b8f252bfbc57ba0342904181",
                "Alan Turing",
                "304402207063ae83e7f62bbb171798131b4a0564b956930092b33b07b395615d9ec7e15c022058dfcc1e00a35e1572f366ffe34ba0fc47db1e7189759b9fb233c5b05ab388ea",
            ),
        ];

        for (key_hex, msg, expected) in tests {
            let key = PrivateKey::from_hex(key_hex).unwrap();
            let hash = sha256(msg.as_bytes());
            let sig = key.sign(&hash).unwrap();
            assert_eq!(hex::encode(sig.to_der()), expected, "message '{}'", msg);
            assert!(key.to_public_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn test_verify_accepts_high_s_form() {
        let key = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        let hash = sha256(b"high s");
        let sig = key.sign(&hash).unwrap();
        let high = Signature::new(*sig.r(), subtract_from_order(sig.s()));
        assert!(!high.is_low_s());
        assert!(key.to_public_key().verify(&hash, &high));
    }
}
