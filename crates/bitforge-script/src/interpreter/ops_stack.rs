//! Stack manipulation and equality operations for the script interpreter.

use super::error::{VerifyError, VerifyErrorCode};
use super::scriptnum::ScriptNumber;
use super::stack::cast_to_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn op_to_alt_stack(&mut self) -> Result<(), VerifyError> {
        let data = self.dstack.pop_byte_array()?;
        self.astack.push_byte_array(data);
        Ok(())
    }

    pub(crate) fn op_from_alt_stack(&mut self) -> Result<(), VerifyError> {
        let data = self.astack.pop_byte_array()?;
        self.dstack.push_byte_array(data);
        Ok(())
    }

    pub(crate) fn op_ifdup(&mut self) -> Result<(), VerifyError> {
        let so = self.dstack.peek_byte_array(0)?;
        if cast_to_bool(so) {
            let so = so.to_vec();
            self.dstack.push_byte_array(so);
        }
        Ok(())
    }

    pub(crate) fn op_depth(&mut self) -> Result<(), VerifyError> {
        let depth = self.dstack.depth() as i64;
        self.dstack.push_int(&ScriptNumber::new(depth));
        Ok(())
    }

    pub(crate) fn op_pick(&mut self) -> Result<(), VerifyError> {
        let n = self.pop_stack_index()?;
        self.dstack.pick_n(n)
    }

    pub(crate) fn op_roll(&mut self) -> Result<(), VerifyError> {
        let n = self.pop_stack_index()?;
        self.dstack.roll_n(n)
    }

    pub(crate) fn op_size(&mut self) -> Result<(), VerifyError> {
        let size = self.dstack.peek_byte_array(0)?.len() as i64;
        self.dstack.push_int(&ScriptNumber::new(size));
        Ok(())
    }

    pub(crate) fn op_equal(&mut self) -> Result<(), VerifyError> {
        let a = self.dstack.pop_byte_array()?;
        let b = self.dstack.pop_byte_array()?;
        self.dstack.push_bool(a == b);
        Ok(())
    }

    /// Pop a PICK/ROLL depth, which must address an element still on the stack.
    fn pop_stack_index(&mut self) -> Result<usize, VerifyError> {
        let n = self.dstack.pop_int()?.to_i64();
        let depth = self.dstack.depth();
        if n < 0 || n as u64 >= depth as u64 {
            return Err(VerifyError::new(
                VerifyErrorCode::InvalidStackOperation,
                format!("index {} is invalid for stack size {}", n, depth),
            ));
        }
        Ok(n as usize)
    }
}
