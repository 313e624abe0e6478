//! Script verification flags (bitmask).

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling interpreter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate pay-to-script-hash redeem scripts.
    pub const P2SH: ScriptFlags = ScriptFlags(1 << 0);
    /// Require defined sighash types and SEC1 public keys, plus strict DER.
    pub const STRICTENC: ScriptFlags = ScriptFlags(1 << 1);
    /// Require strict DER signatures.
    pub const DERSIG: ScriptFlags = ScriptFlags(1 << 2);
    /// Require S at most half the curve order.
    pub const LOW_S: ScriptFlags = ScriptFlags(1 << 3);
    /// Require an empty CHECKMULTISIG dummy element.
    pub const NULLDUMMY: ScriptFlags = ScriptFlags(1 << 4);
    /// Require push-only signature scripts.
    pub const SIGPUSHONLY: ScriptFlags = ScriptFlags(1 << 5);
    /// Require minimal pushes and number encodings.
    pub const MINIMALDATA: ScriptFlags = ScriptFlags(1 << 6);
    /// Fail on upgradable NOPs.
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 7);
    /// Require exactly one stack element after evaluation.
    pub const CLEANSTACK: ScriptFlags = ScriptFlags(1 << 8);
    /// Enforce OP_CHECKLOCKTIMEVERIFY instead of treating it as a NOP.
    pub const CHECKLOCKTIMEVERIFY: ScriptFlags = ScriptFlags(1 << 9);

    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }

    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}
