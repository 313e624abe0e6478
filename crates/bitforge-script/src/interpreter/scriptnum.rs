//! Script number arithmetic with Bitcoin consensus rules.
//!
//! Numbers on the stack are little-endian byte arrays in sign-magnitude
//! form: the top bit of the last byte is the sign. Numeric opcodes take
//! operands of at most 4 bytes, but their results may be longer and stay
//! valid as long as they are not read back as numbers.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::error::{VerifyError, VerifyErrorCode};

/// A decoded script number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNumber {
    /// The numeric value.
    pub val: BigInt,
}

impl ScriptNumber {
    /// Create a script number from an i64 value.
    pub fn new(val: i64) -> Self {
        ScriptNumber { val: BigInt::from(val) }
    }

    /// Parse a byte array into a ScriptNumber.
    ///
    /// # Arguments
    /// * `bb` - The encoded number.
    /// * `max_len` - Longest accepted encoding, in bytes.
    /// * `require_minimal` - Reject encodings with redundant trailing bytes.
    ///
    /// # Returns
    /// The number, `NumberOverflow` if too long, or `MinimalData`.
    pub fn from_bytes(bb: &[u8], max_len: usize, require_minimal: bool) -> Result<Self, VerifyError> {
        if bb.len() > max_len {
            return Err(VerifyError::new(
                VerifyErrorCode::NumberOverflow,
                format!(
                    "numeric value encoded as {:02x?} is {} bytes which exceeds the max allowed of {}",
                    bb,
                    bb.len(),
                    max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bb)?;
        }

        let (last, rest) = match bb.split_last() {
            Some(parts) => parts,
            None => return Ok(ScriptNumber { val: BigInt::zero() }),
        };

        let mut v = BigInt::zero();
        for (i, &b) in rest.iter().enumerate() {
            v |= BigInt::from(b) << (8 * i);
        }
        v |= BigInt::from(last & 0x7f) << (8 * rest.len());

        if last & 0x80 != 0 {
            v = -v;
        }
        Ok(ScriptNumber { val: v })
    }

    /// Serialize to the minimal sign-magnitude encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.val.is_zero() {
            return vec![];
        }

        let is_negative = self.val.is_negative();
        let mut result = self.val.abs().to_bytes_le().1;

        if let Some(last) = result.last_mut() {
            if *last & 0x80 != 0 {
                // Sign needs a byte of its own.
                result.push(if is_negative { 0x80 } else { 0x00 });
            } else if is_negative {
                *last |= 0x80;
            }
        }
        result
    }

    pub fn add(&mut self, other: &ScriptNumber) -> &mut Self {
        self.val = &self.val + &other.val;
        self
    }

    pub fn sub(&mut self, other: &ScriptNumber) -> &mut Self {
        self.val = &self.val - &other.val;
        self
    }

    pub fn incr(&mut self) -> &mut Self {
        self.val = &self.val + BigInt::one();
        self
    }

    pub fn decr(&mut self) -> &mut Self {
        self.val = &self.val - BigInt::one();
        self
    }

    pub fn neg(&mut self) -> &mut Self {
        self.val = -self.val.clone();
        self
    }

    pub fn abs(&mut self) -> &mut Self {
        self.val = self.val.abs();
        self
    }

    pub fn is_zero(&self) -> bool {
        self.val.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.val.is_negative()
    }

    pub fn less_than(&self, other: &ScriptNumber) -> bool {
        self.val < other.val
    }

    pub fn less_than_or_equal(&self, other: &ScriptNumber) -> bool {
        self.val <= other.val
    }

    pub fn greater_than(&self, other: &ScriptNumber) -> bool {
        self.val > other.val
    }

    pub fn greater_than_or_equal(&self, other: &ScriptNumber) -> bool {
        self.val >= other.val
    }

    pub fn equal(&self, other: &ScriptNumber) -> bool {
        self.val == other.val
    }

    /// Convert to i64, clamping on overflow.
    pub fn to_i64(&self) -> i64 {
        self.val.to_i64().unwrap_or(if self.val.is_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }
}

/// Minimal script number encoding of `n`.
pub fn encode_script_number(n: i64) -> Vec<u8> {
    ScriptNumber::new(n).to_bytes()
}

/// Check that a byte array uses minimal data encoding.
///
/// The last byte may only be 0x00 or 0x80 when the byte before it has its
/// top bit set.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), VerifyError> {
    let (last, rest) = match v.split_last() {
        Some(parts) => parts,
        None => return Ok(()),
    };

    if last & 0x7f == 0 && rest.last().map_or(true, |b| b & 0x80 == 0) {
        return Err(VerifyError::new(
            VerifyErrorCode::MinimalData,
            format!("numeric value encoded as {:02x?} is not minimally encoded", v),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_script_num_bytes() {
        let tests: Vec<(i64, &str)> = vec![
            (0, ""),
            (1, "01"),
            (-1, "81"),
            (127, "7f"),
            (-127, "ff"),
            (128, "8000"),
            (-128, "8080"),
            (129, "8100"),
            (-129, "8180"),
            (256, "0001"),
            (-256, "0081"),
            (32767, "ff7f"),
            (-32767, "ffff"),
            (32768, "008000"),
            (-32768, "008080"),
            (65535, "ffff00"),
            (-65535, "ffff80"),
            (8388608, "00008000"),
            (-8388608, "00008080"),
            (2147483647, "ffffff7f"),
            (-2147483647, "ffffffff"),
            // Results may exceed the operand range.
            (2147483648, "0000008000"),
            (-2147483648, "0000008080"),
            (4294967295, "ffffffff00"),
            (-4294967295, "ffffffff80"),
            (4294967296, "0000000001"),
            (9223372036854775807, "ffffffffffffff7f"),
            (-9223372036854775807, "ffffffffffffffff"),
        ];

        for (num, expected) in &tests {
            let got = encode_script_number(*num);
            assert_eq!(
                got,
                hex_to_bytes(expected),
                "Bytes: num={}, got={:02x?}, want={}",
                num,
                got,
                expected
            );
        }
    }

    #[test]
    fn test_from_bytes() {
        struct Test {
            serialized: &'static str,
            num: i64,
            num_len: usize,
            minimal_encoding: bool,
            expect_err: Option<VerifyErrorCode>,
        }

        let tests = vec![
            // Negative zero is not minimal.
            Test { serialized: "80", num: 0, num_len: 4, minimal_encoding: true, expect_err: Some(VerifyErrorCode::MinimalData) },
            Test { serialized: "", num: 0, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "01", num: 1, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "81", num: -1, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "8000", num: 128, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "8080", num: -128, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "ffffff7f", num: 2147483647, num_len: 4, minimal_encoding: true, expect_err: None },
            Test { serialized: "ffffffff", num: -2147483647, num_len: 4, minimal_encoding: true, expect_err: None },
            // Lock time operands allow 5 bytes.
            Test { serialized: "ffffffff7f", num: 549755813887, num_len: 5, minimal_encoding: true, expect_err: None },
            Test { serialized: "ffffffffff", num: -549755813887, num_len: 5, minimal_encoding: true, expect_err: None },
            Test { serialized: "0000008000", num: 0, num_len: 4, minimal_encoding: true, expect_err: Some(VerifyErrorCode::NumberOverflow) },
            Test { serialized: "00", num: 0, num_len: 4, minimal_encoding: true, expect_err: Some(VerifyErrorCode::MinimalData) },
            Test { serialized: "0100", num: 0, num_len: 4, minimal_encoding: true, expect_err: Some(VerifyErrorCode::MinimalData) },
            Test { serialized: "00", num: 0, num_len: 4, minimal_encoding: false, expect_err: None },
            Test { serialized: "0100", num: 1, num_len: 4, minimal_encoding: false, expect_err: None },
            Test { serialized: "80", num: 0, num_len: 4, minimal_encoding: false, expect_err: None },
        ];

        for test in &tests {
            let result = ScriptNumber::from_bytes(
                &hex_to_bytes(test.serialized),
                test.num_len,
                test.minimal_encoding,
            );
            match (result, test.expect_err) {
                (Ok(sn), None) => assert_eq!(sn.to_i64(), test.num, "from_bytes({})", test.serialized),
                (Err(e), Some(code)) => assert_eq!(e.code, code, "from_bytes({})", test.serialized),
                (other, _) => panic!("from_bytes({}): unexpected {:?}", test.serialized, other),
            }
        }
    }

    #[test]
    fn test_arithmetic() {
        let mut n = ScriptNumber::new(-5);
        n.abs();
        assert_eq!(n.to_i64(), 5);
        n.neg().decr();
        assert_eq!(n.to_i64(), -6);
        n.add(&ScriptNumber::new(10)).incr();
        assert_eq!(n.to_i64(), 5);
        n.sub(&ScriptNumber::new(5));
        assert!(n.is_zero());
        assert!(ScriptNumber::new(-1).is_negative());
        assert!(ScriptNumber::new(1).less_than(&ScriptNumber::new(2)));
    }
}
