//! Script execution thread: one evaluation of one script.

use log::trace;

use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::Script;

use super::config::{MAX_OPS_PER_SCRIPT, MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE, MAX_STACK_SIZE};
use super::error::{VerifyError, VerifyErrorCode};
use super::flags::ScriptFlags;
use super::ops_crypto::HashType;
use super::scriptnum::ScriptNumber;
use super::stack::Stack;
use super::TxContext;

/// The execution state of a single script.
///
/// A thread starts from a given data stack and owns everything else: the
/// altstack, the branch stack, the program counter and the operation
/// counter all begin empty or zero.
pub struct Thread<'a> {
    /// The main data stack.
    pub(crate) dstack: Stack,
    /// The alternate stack used by OP_TOALTSTACK and OP_FROMALTSTACK.
    pub(crate) astack: Stack,
    /// One entry per open IF/NOTIF: whether that branch is taken.
    pub(crate) cond_stack: Vec<bool>,
    /// The script being executed.
    pub(crate) script: &'a Script,
    /// Index of the next instruction.
    pub(crate) pc: usize,
    /// Index of the first instruction after the last OP_CODESEPARATOR.
    pub(crate) begin_code_hash: usize,
    /// Non-push operations seen so far, executed or not.
    pub(crate) op_count: usize,
    /// Active verification flags.
    pub(crate) flags: ScriptFlags,
    /// Transaction data for signature and lock time checks.
    pub(crate) tx_context: Option<&'a dyn TxContext>,
    /// The input being verified.
    pub(crate) input_idx: usize,
}

impl<'a> Thread<'a> {
    /// Create a thread that runs `script` over `stack` (bottom first).
    pub fn new(
        script: &'a Script,
        stack: Vec<Vec<u8>>,
        flags: ScriptFlags,
        tx_context: Option<&'a dyn TxContext>,
        input_idx: usize,
    ) -> Self {
        let verify_minimal_data = flags.has_flag(ScriptFlags::MINIMALDATA);
        Thread {
            dstack: Stack::from_vec(stack, verify_minimal_data),
            astack: Stack::alt(verify_minimal_data),
            cond_stack: Vec::new(),
            script,
            pc: 0,
            begin_code_hash: 0,
            op_count: 0,
            flags,
            tx_context,
            input_idx,
        }
    }

    /// Check if a specific script verification flag is set.
    pub fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.has_flag(flag)
    }

    /// Check if any of the given script verification flags are set.
    pub fn has_any(&self, flags: &[ScriptFlags]) -> bool {
        self.flags.has_any(flags)
    }

    /// True when no enclosing branch is false.
    pub fn is_branch_executing(&self) -> bool {
        self.cond_stack.iter().all(|&taken| taken)
    }

    /// True once every instruction has been stepped.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.script.len()
    }

    /// The current data stack, bottom first.
    pub fn stack(&self) -> &[Vec<u8>] {
        self.dstack.items()
    }

    /// Consume the thread, returning the data stack (bottom first).
    pub fn into_stack(self) -> Vec<Vec<u8>> {
        self.dstack.into_vec()
    }

    /// Run the script to completion.
    pub fn evaluate(&mut self) -> Result<(), VerifyError> {
        let size = self.script.byte_len();
        if size > MAX_SCRIPT_SIZE {
            return Err(VerifyError::new(
                VerifyErrorCode::ScriptSize,
                format!("script size {} is larger than the max allowed size {}", size, MAX_SCRIPT_SIZE),
            ));
        }

        while !self.is_finished() {
            self.step()?;
        }

        if !self.cond_stack.is_empty() {
            return Err(VerifyError::new(
                VerifyErrorCode::UnbalancedConditional,
                "end of script reached in conditional execution",
            ));
        }
        Ok(())
    }

    /// Execute the next instruction.
    pub fn step(&mut self) -> Result<(), VerifyError> {
        let script = self.script;
        let instruction = script.instructions().get(self.pc).ok_or_else(|| {
            VerifyError::new(
                VerifyErrorCode::BadOpcode,
                format!("program counter {} is past the end of the script", self.pc),
            )
        })?;
        self.pc += 1;

        self.execute_instruction(instruction)?;

        let combined = self.dstack.depth() + self.astack.depth();
        if combined > MAX_STACK_SIZE {
            return Err(VerifyError::new(
                VerifyErrorCode::StackSize,
                format!("combined stack size {} > max allowed {}", combined, MAX_STACK_SIZE),
            ));
        }
        Ok(())
    }

    fn execute_instruction(&mut self, instruction: &Instruction) -> Result<(), VerifyError> {
        let opcode = instruction.opcode();

        if let Some(data) = instruction.data() {
            if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                return Err(VerifyError::new(
                    VerifyErrorCode::PushSize,
                    format!(
                        "element size {} exceeds max allowed size {}",
                        data.len(),
                        MAX_SCRIPT_ELEMENT_SIZE
                    ),
                ));
            }
        }

        if opcode > Opcode::Op16 {
            self.op_count += 1;
            self.check_op_count()?;
        }

        if is_disabled(opcode) {
            return Err(VerifyError::new(
                VerifyErrorCode::DisabledOpcode,
                format!("attempt to execute disabled opcode {}", opcode),
            ));
        }

        if !self.is_branch_executing() && !is_conditional(opcode) {
            return Ok(());
        }

        trace!("pc {}: {}", self.pc - 1, instruction);
        self.dispatch(instruction)
    }

    pub(crate) fn check_op_count(&self) -> Result<(), VerifyError> {
        if self.op_count > MAX_OPS_PER_SCRIPT {
            return Err(VerifyError::new(
                VerifyErrorCode::OpCount,
                format!("exceeded max operation limit of {}", MAX_OPS_PER_SCRIPT),
            ));
        }
        Ok(())
    }

    fn dispatch(&mut self, instruction: &Instruction) -> Result<(), VerifyError> {
        let opcode = instruction.opcode();
        match opcode {
            Opcode::Op0
            | Opcode::PushBytes(_)
            | Opcode::PushData1
            | Opcode::PushData2
            | Opcode::PushData4 => self.op_push(instruction),
            Opcode::Op1Negate => {
                self.dstack.push_int(&ScriptNumber::new(-1));
                Ok(())
            }
            Opcode::Op1
            | Opcode::Op2
            | Opcode::Op3
            | Opcode::Op4
            | Opcode::Op5
            | Opcode::Op6
            | Opcode::Op7
            | Opcode::Op8
            | Opcode::Op9
            | Opcode::Op10
            | Opcode::Op11
            | Opcode::Op12
            | Opcode::Op13
            | Opcode::Op14
            | Opcode::Op15
            | Opcode::Op16 => {
                let n = opcode.small_int_value().unwrap_or_default();
                self.dstack.push_int(&ScriptNumber::new(n as i64));
                Ok(())
            }

            // Flow control
            Opcode::Nop => Ok(()),
            Opcode::If => self.op_if(false),
            Opcode::NotIf => self.op_if(true),
            Opcode::Else => self.op_else(opcode),
            Opcode::EndIf => self.op_endif(opcode),
            Opcode::Verify => self.abstract_verify(opcode, VerifyErrorCode::Verify),
            Opcode::Return => self.op_return(),

            // Stack ops
            Opcode::ToAltStack => self.op_to_alt_stack(),
            Opcode::FromAltStack => self.op_from_alt_stack(),
            Opcode::TwoDrop => self.dstack.drop_n(2),
            Opcode::TwoDup => self.dstack.dup_n(2),
            Opcode::ThreeDup => self.dstack.dup_n(3),
            Opcode::TwoOver => self.dstack.over_n(2),
            Opcode::TwoRot => self.dstack.rot_n(2),
            Opcode::TwoSwap => self.dstack.swap_n(2),
            Opcode::IfDup => self.op_ifdup(),
            Opcode::Depth => self.op_depth(),
            Opcode::Drop => self.dstack.drop_n(1),
            Opcode::Dup => self.dstack.dup_n(1),
            Opcode::Nip => self.dstack.nip_n_discard(1),
            Opcode::Over => self.dstack.over_n(1),
            Opcode::Pick => self.op_pick(),
            Opcode::Roll => self.op_roll(),
            Opcode::Rot => self.dstack.rot_n(1),
            Opcode::Swap => self.dstack.swap_n(1),
            Opcode::Tuck => self.dstack.tuck(),
            Opcode::Size => self.op_size(),

            // Equality
            Opcode::Equal => self.op_equal(),
            Opcode::EqualVerify => {
                self.op_equal()?;
                self.abstract_verify(opcode, VerifyErrorCode::EqualVerify)
            }

            // Arithmetic
            Opcode::OneAdd => self.op_unary_int(|m| {
                m.incr();
            }),
            Opcode::OneSub => self.op_unary_int(|m| {
                m.decr();
            }),
            Opcode::Negate => self.op_unary_int(|m| {
                m.neg();
            }),
            Opcode::Abs => self.op_unary_int(|m| {
                m.abs();
            }),
            Opcode::Not => self.op_unary_bool(|m| m.is_zero()),
            Opcode::ZeroNotEqual => self.op_unary_bool(|m| !m.is_zero()),
            Opcode::Add => self.op_add(),
            Opcode::Sub => self.op_sub(),
            Opcode::BoolAnd => self.op_bool_binop(|a, b| !a.is_zero() && !b.is_zero()),
            Opcode::BoolOr => self.op_bool_binop(|a, b| !a.is_zero() || !b.is_zero()),
            Opcode::NumEqual => self.op_bool_binop(|a, b| a.equal(b)),
            Opcode::NumEqualVerify => {
                self.op_bool_binop(|a, b| a.equal(b))?;
                self.abstract_verify(opcode, VerifyErrorCode::NumEqualVerify)
            }
            Opcode::NumNotEqual => self.op_bool_binop(|a, b| !a.equal(b)),
            Opcode::LessThan => self.op_bool_binop(|a, b| a.less_than(b)),
            Opcode::GreaterThan => self.op_bool_binop(|a, b| a.greater_than(b)),
            Opcode::LessThanOrEqual => self.op_bool_binop(|a, b| a.less_than_or_equal(b)),
            Opcode::GreaterThanOrEqual => self.op_bool_binop(|a, b| a.greater_than_or_equal(b)),
            Opcode::Min => self.op_min(),
            Opcode::Max => self.op_max(),
            Opcode::Within => self.op_within(),

            // Crypto
            Opcode::Ripemd160 => self.op_hash(HashType::Ripemd160),
            Opcode::Sha1 => self.op_hash(HashType::Sha1),
            Opcode::Sha256 => self.op_hash(HashType::Sha256),
            Opcode::Hash160 => self.op_hash(HashType::Hash160),
            Opcode::Hash256 => self.op_hash(HashType::Hash256),
            Opcode::CodeSeparator => {
                self.begin_code_hash = self.pc;
                Ok(())
            }
            Opcode::CheckSig => self.op_checksig(),
            Opcode::CheckSigVerify => {
                self.op_checksig()?;
                self.abstract_verify(opcode, VerifyErrorCode::CheckSigVerify)
            }
            Opcode::CheckMultisig => self.op_checkmultisig(),
            Opcode::CheckMultisigVerify => {
                self.op_checkmultisig()?;
                self.abstract_verify(opcode, VerifyErrorCode::CheckMultisigVerify)
            }

            // Expansion
            Opcode::CheckLockTimeVerify => self.op_check_locktime_verify(),
            Opcode::Nop1
            | Opcode::Nop3
            | Opcode::Nop4
            | Opcode::Nop5
            | Opcode::Nop6
            | Opcode::Nop7
            | Opcode::Nop8
            | Opcode::Nop9
            | Opcode::Nop10 => self.op_upgradable_nop(opcode),

            // Rejected before dispatch.
            Opcode::Cat
            | Opcode::Substr
            | Opcode::Left
            | Opcode::Right
            | Opcode::Invert
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::TwoMul
            | Opcode::TwoDiv
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::LShift
            | Opcode::RShift => Err(VerifyError::new(
                VerifyErrorCode::DisabledOpcode,
                format!("attempt to execute disabled opcode {}", opcode),
            )),

            Opcode::Reserved
            | Opcode::Ver
            | Opcode::VerIf
            | Opcode::VerNotIf
            | Opcode::Reserved1
            | Opcode::Reserved2
            | Opcode::PubkeyHash
            | Opcode::Pubkey
            | Opcode::InvalidOpcode
            | Opcode::Unassigned(_) => Err(VerifyError::new(
                VerifyErrorCode::BadOpcode,
                format!("attempt to execute invalid opcode {}", opcode),
            )),
        }
    }

    fn op_push(&mut self, instruction: &Instruction) -> Result<(), VerifyError> {
        if self.has_flag(ScriptFlags::MINIMALDATA) && !instruction.is_minimal_push() {
            return Err(VerifyError::new(
                VerifyErrorCode::MinimalData,
                format!("{} is not a minimal data push", instruction),
            ));
        }
        let data = instruction.data().map(<[u8]>::to_vec).unwrap_or_default();
        self.dstack.push_byte_array(data);
        Ok(())
    }
}

/// Opcodes that fail wherever they appear, even in an unexecuted branch.
pub(crate) fn is_disabled(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::Cat
            | Opcode::Substr
            | Opcode::Left
            | Opcode::Right
            | Opcode::Invert
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::TwoMul
            | Opcode::TwoDiv
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::LShift
            | Opcode::RShift
    )
}

/// OP_IF through OP_ENDIF, which run even in an unexecuted branch.
pub(crate) fn is_conditional(opcode: Opcode) -> bool {
    (Opcode::If..=Opcode::EndIf).contains(&opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, flags: ScriptFlags) -> Result<Vec<Vec<u8>>, VerifyError> {
        let script = Script::from_string(text).expect("script should parse");
        let mut thread = Thread::new(&script, Vec::new(), flags, None, 0);
        thread.evaluate()?;
        Ok(thread.into_stack())
    }

    #[test]
    fn test_conditional_ranges() {
        assert!(is_conditional(Opcode::If));
        assert!(is_conditional(Opcode::VerNotIf));
        assert!(is_conditional(Opcode::EndIf));
        assert!(!is_conditional(Opcode::Verify));
        assert!(!is_conditional(Opcode::Nop));
        assert!(is_disabled(Opcode::Cat));
        assert!(!is_disabled(Opcode::Size));
    }

    #[test]
    fn test_step_by_step() {
        let script = Script::from_string("OP_2 OP_3 OP_ADD").expect("script should parse");
        let mut thread = Thread::new(&script, Vec::new(), ScriptFlags::NONE, None, 0);
        thread.step().expect("push 2");
        thread.step().expect("push 3");
        assert_eq!(thread.stack(), &[vec![2], vec![3]]);
        thread.step().expect("add");
        assert!(thread.is_finished());
        assert_eq!(thread.stack(), &[vec![5]]);
        assert_eq!(thread.step().unwrap_err().code, VerifyErrorCode::BadOpcode);
    }

    #[test]
    fn test_unexecuted_branch_skips_ops() {
        let stack = run("OP_0 OP_IF OP_RETURN OP_ENDIF OP_1", ScriptFlags::NONE).expect("should run");
        assert_eq!(stack, vec![vec![1]]);
    }

    #[test]
    fn test_disabled_opcode_in_unexecuted_branch() {
        let err = run("OP_0 OP_IF OP_CAT OP_ENDIF OP_1", ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, VerifyErrorCode::DisabledOpcode);
    }

    #[test]
    fn test_verif_in_unexecuted_branch() {
        let err = run("OP_0 OP_IF OP_VERIF OP_ENDIF OP_1", ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, VerifyErrorCode::BadOpcode);
        // OP_VER outside the conditional range is skipped.
        assert!(run("OP_0 OP_IF OP_VER OP_ENDIF OP_1", ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_unbalanced_conditionals() {
        for text in ["OP_1 OP_IF", "OP_ENDIF", "OP_ELSE OP_1", "OP_1 OP_IF OP_ENDIF OP_ENDIF"] {
            let err = run(text, ScriptFlags::NONE).unwrap_err();
            assert_eq!(err.code, VerifyErrorCode::UnbalancedConditional, "script {}", text);
        }
    }

    #[test]
    fn test_minimal_push_flag() {
        let text = "1 0x05";
        assert!(run(text, ScriptFlags::NONE).is_ok());
        let err = run(text, ScriptFlags::MINIMALDATA).unwrap_err();
        assert_eq!(err.code, VerifyErrorCode::MinimalData);
        // Not checked inside an unexecuted branch.
        assert!(run("OP_0 OP_IF 1 0x05 OP_ENDIF", ScriptFlags::MINIMALDATA).is_ok());
    }

    #[test]
    fn test_script_size_limit() {
        let big = Script::from_instructions(
            (0..20)
                .map(|_| Instruction::push_for(&[0xab; 520]).expect("push"))
                .collect(),
        );
        assert!(big.byte_len() > MAX_SCRIPT_SIZE);
        let mut thread = Thread::new(&big, Vec::new(), ScriptFlags::NONE, None, 0);
        assert_eq!(thread.evaluate().unwrap_err().code, VerifyErrorCode::ScriptSize);
    }

    #[test]
    fn test_push_size_limit() {
        let script = Script::from_instructions(vec![Instruction::push_for(&[0u8; 521]).expect("push")]);
        let mut thread = Thread::new(&script, Vec::new(), ScriptFlags::NONE, None, 0);
        assert_eq!(thread.evaluate().unwrap_err().code, VerifyErrorCode::PushSize);
    }

    #[test]
    fn test_codeseparator_moves_subscript_start() {
        let script = Script::from_string("OP_1 OP_CODESEPARATOR OP_2").expect("script should parse");
        let mut thread = Thread::new(&script, Vec::new(), ScriptFlags::NONE, None, 0);
        thread.evaluate().expect("should run");
        assert_eq!(thread.begin_code_hash, 2);
    }
}
