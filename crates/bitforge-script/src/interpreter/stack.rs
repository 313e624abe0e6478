//! Script execution stack.
//!
//! Indexes count from the top: index 0 is the last element pushed. Every
//! access is bounds-checked and reports an underflow instead of panicking.

use super::config::MAX_SCRIPT_NUM_LENGTH;
use super::error::{VerifyError, VerifyErrorCode};
use super::scriptnum::ScriptNumber;

/// Convert byte array to boolean (Bitcoin consensus rules).
///
/// False iff every byte is zero, except that the last byte may be 0x80
/// (negative zero).
pub fn cast_to_bool(t: &[u8]) -> bool {
    for (i, &b) in t.iter().enumerate() {
        if b != 0 {
            return !(i == t.len() - 1 && b == 0x80);
        }
    }
    false
}

/// Convert boolean to byte array.
pub fn from_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

/// The main data stack or the altstack.
#[derive(Debug, Clone)]
pub struct Stack {
    stk: Vec<Vec<u8>>,
    verify_minimal_data: bool,
    underflow: VerifyErrorCode,
}

impl Stack {
    /// An empty data stack.
    pub fn new(verify_minimal_data: bool) -> Self {
        Stack::from_vec(Vec::new(), verify_minimal_data)
    }

    /// An empty altstack. Underflows report `InvalidAltstackOperation`.
    pub fn alt(verify_minimal_data: bool) -> Self {
        Stack {
            stk: Vec::new(),
            verify_minimal_data,
            underflow: VerifyErrorCode::InvalidAltstackOperation,
        }
    }

    /// A data stack holding `items`, bottom first.
    pub fn from_vec(items: Vec<Vec<u8>>, verify_minimal_data: bool) -> Self {
        Stack {
            stk: items,
            verify_minimal_data,
            underflow: VerifyErrorCode::InvalidStackOperation,
        }
    }

    pub fn depth(&self) -> usize {
        self.stk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stk.is_empty()
    }

    pub fn push_byte_array(&mut self, data: Vec<u8>) {
        self.stk.push(data);
    }

    pub fn push_int(&mut self, n: &ScriptNumber) {
        self.push_byte_array(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push_byte_array(from_bool(val));
    }

    pub fn pop_byte_array(&mut self) -> Result<Vec<u8>, VerifyError> {
        self.nip_n(0)
    }

    /// Pop a number of at most 4 bytes.
    pub fn pop_int(&mut self) -> Result<ScriptNumber, VerifyError> {
        let data = self.pop_byte_array()?;
        ScriptNumber::from_bytes(&data, MAX_SCRIPT_NUM_LENGTH, self.verify_minimal_data)
    }

    pub fn pop_bool(&mut self) -> Result<bool, VerifyError> {
        let data = self.pop_byte_array()?;
        Ok(cast_to_bool(&data))
    }

    pub fn peek_byte_array(&self, idx: usize) -> Result<&[u8], VerifyError> {
        let pos = self.position(idx)?;
        Ok(&self.stk[pos])
    }

    /// Read the element at `idx` as a number of at most `max_len` bytes.
    pub fn peek_int(&self, idx: usize, max_len: usize) -> Result<ScriptNumber, VerifyError> {
        let data = self.peek_byte_array(idx)?;
        ScriptNumber::from_bytes(data, max_len, self.verify_minimal_data)
    }

    pub fn peek_bool(&self, idx: usize) -> Result<bool, VerifyError> {
        Ok(cast_to_bool(self.peek_byte_array(idx)?))
    }

    fn position(&self, idx: usize) -> Result<usize, VerifyError> {
        let sz = self.stk.len();
        if idx >= sz {
            return Err(VerifyError::new(
                self.underflow,
                format!("index {} is invalid for stack size {}", idx, sz),
            ));
        }
        Ok(sz - idx - 1)
    }

    /// Remove and return the element at `idx`.
    pub fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, VerifyError> {
        let pos = self.position(idx)?;
        Ok(self.stk.remove(pos))
    }

    pub fn nip_n_discard(&mut self, idx: usize) -> Result<(), VerifyError> {
        self.nip_n(idx)?;
        Ok(())
    }

    /// Copy the top element below the second one: `x1 x2 -> x2 x1 x2`.
    pub fn tuck(&mut self) -> Result<(), VerifyError> {
        let so2 = self.pop_byte_array()?;
        let so1 = self.pop_byte_array()?;
        self.push_byte_array(so2.clone());
        self.push_byte_array(so1);
        self.push_byte_array(so2);
        Ok(())
    }

    pub fn drop_n(&mut self, n: usize) -> Result<(), VerifyError> {
        if self.depth() < n {
            return Err(VerifyError::new(
                self.underflow,
                format!("attempt to drop {} items from stack of size {}", n, self.depth()),
            ));
        }
        self.stk.truncate(self.depth() - n);
        Ok(())
    }

    /// Duplicate the top `n` elements.
    pub fn dup_n(&mut self, n: usize) -> Result<(), VerifyError> {
        for _ in 0..n {
            let so = self.peek_byte_array(n - 1)?.to_vec();
            self.push_byte_array(so);
        }
        Ok(())
    }

    /// Move the `n` elements at depth `2n..3n` to the top.
    pub fn rot_n(&mut self, n: usize) -> Result<(), VerifyError> {
        let entry = 3 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    /// Swap the top `n` elements with the `n` below them.
    pub fn swap_n(&mut self, n: usize) -> Result<(), VerifyError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    /// Copy the `n` elements below the top `n` to the top.
    pub fn over_n(&mut self, n: usize) -> Result<(), VerifyError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.peek_byte_array(entry)?.to_vec();
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn pick_n(&mut self, n: usize) -> Result<(), VerifyError> {
        let so = self.peek_byte_array(n)?.to_vec();
        self.push_byte_array(so);
        Ok(())
    }

    pub fn roll_n(&mut self, n: usize) -> Result<(), VerifyError> {
        let so = self.nip_n(n)?;
        self.push_byte_array(so);
        Ok(())
    }

    /// Stack contents, bottom first.
    pub fn items(&self) -> &[Vec<u8>] {
        &self.stk
    }

    /// Consume the stack, bottom first.
    pub fn into_vec(self) -> Vec<Vec<u8>> {
        self.stk
    }

    pub fn clear(&mut self) {
        self.stk.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(items: &[&[u8]]) -> Stack {
        Stack::from_vec(items.iter().map(|i| i.to_vec()).collect(), false)
    }

    #[test]
    fn test_cast_to_bool() {
        assert!(!cast_to_bool(&[]));
        assert!(!cast_to_bool(&[0x00]));
        assert!(!cast_to_bool(&[0x80]));
        assert!(cast_to_bool(&[0x01]));
        assert!(cast_to_bool(&[0x00, 0x01]));
        assert!(!cast_to_bool(&[0x00, 0x00]));
        assert!(!cast_to_bool(&[0x00, 0x80]));
        assert!(cast_to_bool(&[0x80, 0x00]));
        assert!(cast_to_bool(&[0x81]));
    }

    #[test]
    fn test_stack_basic_ops() {
        let mut s = Stack::new(false);
        s.push_byte_array(vec![1, 2, 3]);
        s.push_byte_array(vec![4, 5]);
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pop_byte_array().unwrap(), vec![4, 5]);
        assert_eq!(s.depth(), 1);
        assert_eq!(s.peek_byte_array(0).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_underflow_at_boundaries() {
        let mut s = stack_of(&[&[1], &[2]]);
        assert!(s.peek_byte_array(1).is_ok());
        let err = s.peek_byte_array(2).unwrap_err();
        assert_eq!(err.code, VerifyErrorCode::InvalidStackOperation);
        assert!(s.pick_n(2).is_err());
        assert!(s.roll_n(2).is_err());
        assert!(s.drop_n(3).is_err());
        assert_eq!(s.depth(), 2);

        let mut empty = Stack::new(false);
        assert!(empty.pop_byte_array().is_err());
        assert!(empty.dup_n(1).is_err());
        assert!(empty.tuck().is_err());

        let mut alt = Stack::alt(false);
        assert_eq!(alt.pop_byte_array().unwrap_err().code, VerifyErrorCode::InvalidAltstackOperation);
    }

    #[test]
    fn test_stack_dup() {
        let mut s = stack_of(&[&[1], &[2]]);
        s.dup_n(2).unwrap();
        assert_eq!(s.items(), &[vec![1], vec![2], vec![1], vec![2]]);
    }

    #[test]
    fn test_stack_rot_swap_over() {
        let mut s = stack_of(&[&[1], &[2], &[3]]);
        s.rot_n(1).unwrap();
        assert_eq!(s.items(), &[vec![2], vec![3], vec![1]]);

        let mut s = stack_of(&[&[1], &[2], &[3], &[4]]);
        s.swap_n(2).unwrap();
        assert_eq!(s.items(), &[vec![3], vec![4], vec![1], vec![2]]);

        let mut s = stack_of(&[&[1], &[2], &[3], &[4]]);
        s.over_n(2).unwrap();
        assert_eq!(s.items(), &[vec![1], vec![2], vec![3], vec![4], vec![1], vec![2]]);

        let mut s = stack_of(&[&[1], &[2], &[3], &[4], &[5], &[6]]);
        s.rot_n(2).unwrap();
        assert_eq!(s.items(), &[vec![3], vec![4], vec![5], vec![6], vec![1], vec![2]]);
    }

    #[test]
    fn test_pick_roll_tuck() {
        let mut s = stack_of(&[&[1], &[2], &[3]]);
        s.pick_n(2).unwrap();
        assert_eq!(s.items(), &[vec![1], vec![2], vec![3], vec![1]]);
        s.roll_n(3).unwrap();
        assert_eq!(s.items(), &[vec![2], vec![3], vec![1], vec![1]]);

        let mut s = stack_of(&[&[1], &[2]]);
        s.tuck().unwrap();
        assert_eq!(s.items(), &[vec![2], vec![1], vec![2]]);
    }
}
