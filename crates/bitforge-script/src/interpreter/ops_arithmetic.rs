//! Arithmetic operations for the script interpreter.
//!
//! Operands are at most 4 bytes; results may be longer.

use super::error::VerifyError;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn op_unary_int(&mut self, f: impl FnOnce(&mut ScriptNumber)) -> Result<(), VerifyError> {
        let mut m = self.dstack.pop_int()?;
        f(&mut m);
        self.dstack.push_int(&m);
        Ok(())
    }

    /// OP_NOT and OP_0NOTEQUAL.
    pub(crate) fn op_unary_bool(&mut self, f: impl FnOnce(&ScriptNumber) -> bool) -> Result<(), VerifyError> {
        let m = self.dstack.pop_int()?;
        self.dstack.push_bool(f(&m));
        Ok(())
    }

    pub(crate) fn op_add(&mut self) -> Result<(), VerifyError> {
        let mut v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        v0.add(&v1);
        self.dstack.push_int(&v0);
        Ok(())
    }

    pub(crate) fn op_sub(&mut self) -> Result<(), VerifyError> {
        let v0 = self.dstack.pop_int()?;
        let mut v1 = self.dstack.pop_int()?;
        v1.sub(&v0);
        self.dstack.push_int(&v1);
        Ok(())
    }

    /// Binary operation with a boolean result. `a` is the deeper operand.
    pub(crate) fn op_bool_binop(
        &mut self,
        f: impl FnOnce(&ScriptNumber, &ScriptNumber) -> bool,
    ) -> Result<(), VerifyError> {
        let b = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        self.dstack.push_bool(f(&a, &b));
        Ok(())
    }

    pub(crate) fn op_min(&mut self) -> Result<(), VerifyError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(if v1.less_than(&v0) { &v1 } else { &v0 });
        Ok(())
    }

    pub(crate) fn op_max(&mut self) -> Result<(), VerifyError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(if v1.greater_than(&v0) { &v1 } else { &v0 });
        Ok(())
    }

    /// `x min max -> min <= x < max`.
    pub(crate) fn op_within(&mut self) -> Result<(), VerifyError> {
        let max_val = self.dstack.pop_int()?;
        let min_val = self.dstack.pop_int()?;
        let x = self.dstack.pop_int()?;
        self.dstack
            .push_bool(min_val.less_than_or_equal(&x) && x.less_than(&max_val));
        Ok(())
    }
}
