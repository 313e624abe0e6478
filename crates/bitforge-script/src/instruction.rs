//! A single script instruction: an opcode and the data it pushes.

use std::fmt;

use bitforge_primitives::util::encode_int;
use bitforge_primitives::Buffer;

use crate::opcode::Opcode;
use crate::ScriptError;

/// One element of a script.
///
/// Push opcodes always carry data whose length fits the opcode; every other
/// opcode carries none. The constructor enforces this, so a value of this
/// type always serializes cleanly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    data: Option<Vec<u8>>,
}

impl Instruction {
    /// Build an instruction, checking the push/data invariant.
    ///
    /// # Arguments
    /// * `opcode` - The operation.
    /// * `data` - Pushed bytes. Required (possibly empty) for push opcodes,
    ///   `None` for everything else.
    ///
    /// # Returns
    /// The instruction, or `InvalidDataLength` / `UnexpectedData`.
    pub fn new(opcode: Opcode, data: Option<Vec<u8>>) -> Result<Self, ScriptError> {
        let opcode = Opcode::from_number(opcode.number());

        if opcode.is_push() {
            let data = data.unwrap_or_default();
            let length = data.len();
            let max = opcode.data_length_max();
            let valid = if opcode.is_const_push() {
                length as u64 == max
            } else {
                length as u64 <= max
            };
            if !valid {
                return Err(ScriptError::InvalidDataLength { opcode, length, max });
            }
            return Ok(Instruction { opcode, data: Some(data) });
        }

        if data.is_some() {
            return Err(ScriptError::UnexpectedData(opcode));
        }
        Ok(Instruction { opcode, data: None })
    }

    /// Caller upholds the push/data invariant.
    pub(crate) fn from_parts(opcode: Opcode, data: Option<Vec<u8>>) -> Self {
        Instruction { opcode, data }
    }

    /// An instruction with no data.
    pub fn op(opcode: Opcode) -> Result<Self, ScriptError> {
        Instruction::new(opcode, None)
    }

    /// Push `data` with the smallest fitting push opcode. Empty data
    /// becomes OP_0.
    pub fn push_for(data: &[u8]) -> Result<Self, ScriptError> {
        if data.is_empty() {
            return Instruction::op(Opcode::Op0);
        }
        let opcode = Opcode::push_for(data.len() as u64)?;
        Instruction::new(opcode, Some(data.to_vec()))
    }

    /// Read one instruction from a buffer.
    ///
    /// Running out of bytes surfaces as `ScriptError::InsufficientData`.
    pub fn read_from(buf: &mut Buffer<'_>) -> Result<Self, ScriptError> {
        let opcode = Opcode::from_number(buf.read_u8().map_err(ScriptError::InsufficientData)?);

        let data = if opcode.is_const_push() {
            Some(read_data(buf, opcode.number() as u64)?)
        } else if let Some(nbytes) = opcode.data_length_nbytes() {
            let length = match nbytes {
                1 => buf.read_u8().map(u64::from),
                2 => buf.read_u16_le().map(u64::from),
                _ => buf.read_u32_le().map(u64::from),
            }
            .map_err(ScriptError::InsufficientData)?;
            Some(read_data(buf, length)?)
        } else {
            None
        };

        Instruction::new(opcode, data)
    }

    /// The operation.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Pushed data, if this is a push instruction.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        1 + self.opcode.data_length_nbytes().unwrap_or(0)
            + self.data.as_ref().map_or(0, Vec::len)
    }

    /// Always false: an instruction is at least its opcode byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize: opcode byte, then the length prefix for variable pushes,
    /// then the data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.push(self.opcode.number());
        if let Some(ref data) = self.data {
            if let Some(nbytes) = self.opcode.data_length_nbytes() {
                // Lengths were bounded by data_length_max at construction.
                if let Ok(prefix) = encode_int(data.len() as u64, nbytes, false) {
                    out.extend_from_slice(&prefix);
                }
            }
            out.extend_from_slice(data);
        }
        out
    }

    /// Serialize to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Whether this is the most compact encoding of the value it pushes.
    ///
    /// Instructions without data are trivially minimal.
    pub fn is_minimal_push(&self) -> bool {
        let data = match self.data {
            Some(ref data) => data,
            None => return true,
        };
        let number = self.opcode.number();

        match data.len() {
            // Should have been OP_0.
            0 => false,
            1 if (1..=16).contains(&data[0]) => false,
            1 if data[0] == 0x81 => false,
            n if n <= 75 => number as usize == n,
            n if n <= 255 => self.opcode == Opcode::PushData1,
            n if n <= 65535 => self.opcode == Opcode::PushData2,
            _ => true,
        }
    }

    /// Compare opcodes only, treating any two pushes as equal.
    pub fn equal_without_data(&self, other: &Instruction) -> bool {
        self.opcode.equal_without_data(other.opcode)
    }
}

fn read_data(buf: &mut Buffer<'_>, length: u64) -> Result<Vec<u8>, ScriptError> {
    let length = usize::try_from(length).map_err(|_| ScriptError::InvalidPushLength(length))?;
    Ok(buf.read(length).map_err(ScriptError::InsufficientData)?.to_vec())
}

impl fmt::Display for Instruction {
    /// Const pushes render as `N 0xHEX`, variable pushes as
    /// `OP_PUSHDATAk N 0xHEX`, everything else by name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            Some(ref data) if self.opcode.is_const_push() => {
                write!(f, "{} 0x{}", data.len(), hex::encode(data))
            }
            Some(ref data) => {
                write!(f, "{} {} 0x{}", self.opcode, data.len(), hex::encode(data))
            }
            None => write!(f, "{}", self.opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_invariant() {
        assert!(Instruction::new(Opcode::PushBytes(3), Some(vec![1, 2, 3])).is_ok());
        assert!(matches!(
            Instruction::new(Opcode::PushBytes(3), Some(vec![1, 2])),
            Err(ScriptError::InvalidDataLength { length: 2, max: 3, .. })
        ));
        assert!(matches!(
            Instruction::new(Opcode::PushBytes(3), None),
            Err(ScriptError::InvalidDataLength { length: 0, .. })
        ));
        assert!(Instruction::new(Opcode::PushData1, Some(vec![0; 255])).is_ok());
        assert!(matches!(
            Instruction::new(Opcode::PushData1, Some(vec![0; 256])),
            Err(ScriptError::InvalidDataLength { max: 255, .. })
        ));
        assert!(matches!(
            Instruction::new(Opcode::Dup, Some(vec![1])),
            Err(ScriptError::UnexpectedData(Opcode::Dup))
        ));
        let empty = Instruction::new(Opcode::PushData2, None).unwrap();
        assert_eq!(empty.data(), Some(&[][..]));
    }

    #[test]
    fn test_to_bytes() {
        let push = Instruction::new(Opcode::PushBytes(2), Some(vec![0xab, 0xcd])).unwrap();
        assert_eq!(push.to_bytes(), vec![0x02, 0xab, 0xcd]);

        let var = Instruction::new(Opcode::PushData2, Some(vec![0x11; 3])).unwrap();
        assert_eq!(var.to_bytes(), vec![0x4d, 0x03, 0x00, 0x11, 0x11, 0x11]);
        assert_eq!(var.len(), 6);

        let dup = Instruction::op(Opcode::Dup).unwrap();
        assert_eq!(dup.to_hex(), "76");
    }

    #[test]
    fn test_read_from() {
        let bytes = [0x4c, 0x02, 0xaa, 0xbb, 0x76];
        let mut buf = Buffer::new(&bytes);
        let first = Instruction::read_from(&mut buf).unwrap();
        assert_eq!(first.opcode(), Opcode::PushData1);
        assert_eq!(first.data(), Some(&[0xaa, 0xbb][..]));
        assert_eq!(Instruction::read_from(&mut buf).unwrap().opcode(), Opcode::Dup);
        assert!(buf.is_empty());

        let mut short = Buffer::new(&[0x05, 0x01]);
        assert!(matches!(
            Instruction::read_from(&mut short),
            Err(ScriptError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_display() {
        let push = Instruction::new(Opcode::PushBytes(2), Some(vec![0xab, 0xcd])).unwrap();
        assert_eq!(push.to_string(), "2 0xabcd");
        let var = Instruction::new(Opcode::PushData1, Some(vec![0x01])).unwrap();
        assert_eq!(var.to_string(), "OP_PUSHDATA1 1 0x01");
        assert_eq!(Instruction::op(Opcode::CheckSig).unwrap().to_string(), "OP_CHECKSIG");
    }

    #[test]
    fn test_minimal_push() {
        assert!(Instruction::op(Opcode::Op5).unwrap().is_minimal_push());
        assert!(Instruction::push_for(&[0x42; 20]).unwrap().is_minimal_push());
        assert!(Instruction::push_for(&[0x42; 76]).unwrap().is_minimal_push());
        assert!(Instruction::push_for(&[0x42; 300]).unwrap().is_minimal_push());

        // Small values should use OP_N or OP_1NEGATE.
        assert!(!Instruction::push_for(&[0x05]).unwrap().is_minimal_push());
        assert!(!Instruction::push_for(&[0x81]).unwrap().is_minimal_push());
        assert!(Instruction::push_for(&[0x11]).unwrap().is_minimal_push());

        let oversized = Instruction::new(Opcode::PushData1, Some(vec![0x42; 20])).unwrap();
        assert!(!oversized.is_minimal_push());
        let wide = Instruction::new(Opcode::PushData4, Some(vec![0x42; 300])).unwrap();
        assert!(!wide.is_minimal_push());
        let empty = Instruction::new(Opcode::PushData1, Some(vec![])).unwrap();
        assert!(!empty.is_minimal_push());
    }

    #[test]
    fn test_push_for_empty_is_op0() {
        let inst = Instruction::push_for(&[]).unwrap();
        assert_eq!(inst.opcode(), Opcode::Op0);
        assert_eq!(inst.data(), None);
    }
}
