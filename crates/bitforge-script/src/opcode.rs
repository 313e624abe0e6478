//! The opcode table.
//!
//! `Opcode` is a closed enum over every byte value: one variant per named
//! operation, `PushBytes(n)` for the positional 1..=75 byte pushes, and
//! `Unassigned(n)` for bytes with no operation. Equality, ordering and
//! hashing use the numeric value only.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ScriptError;

/// Largest data length a constant push opcode can carry.
pub const MAX_CONST_PUSH: usize = 75;

macro_rules! opcode_table {
    ($($variant:ident = $num:literal => $name:literal,)*) => {
        /// A script operation identified by its byte value.
        #[derive(Debug, Clone, Copy)]
        pub enum Opcode {
            /// Pushes the next N bytes, with N in 1..=75.
            PushBytes(u8),
            $(
                #[allow(missing_docs)]
                $variant,
            )*
            /// A byte value with no assigned operation.
            Unassigned(u8),
        }

        impl Opcode {
            /// Map a byte to its opcode. Every byte has one.
            pub const fn from_number(n: u8) -> Opcode {
                match n {
                    1..=75 => Opcode::PushBytes(n),
                    $($num => Opcode::$variant,)*
                    other => Opcode::Unassigned(other),
                }
            }

            /// The byte value of this opcode.
            pub const fn number(self) -> u8 {
                match self {
                    Opcode::PushBytes(n) | Opcode::Unassigned(n) => n,
                    $(Opcode::$variant => $num,)*
                }
            }

            /// The canonical symbolic name, if the opcode has one.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    Opcode::PushBytes(_) | Opcode::Unassigned(_) => None,
                    $(Opcode::$variant => Some($name),)*
                }
            }
        }

        const NAMED: &[(&str, Opcode)] = &[$(($name, Opcode::$variant),)*];
    };
}

opcode_table! {
    // Constants.
    Op0 = 0 => "OP_0",
    PushData1 = 76 => "OP_PUSHDATA1",
    PushData2 = 77 => "OP_PUSHDATA2",
    PushData4 = 78 => "OP_PUSHDATA4",
    Op1Negate = 79 => "OP_1NEGATE",
    Reserved = 80 => "OP_RESERVED",
    Op1 = 81 => "OP_1",
    Op2 = 82 => "OP_2",
    Op3 = 83 => "OP_3",
    Op4 = 84 => "OP_4",
    Op5 = 85 => "OP_5",
    Op6 = 86 => "OP_6",
    Op7 = 87 => "OP_7",
    Op8 = 88 => "OP_8",
    Op9 = 89 => "OP_9",
    Op10 = 90 => "OP_10",
    Op11 = 91 => "OP_11",
    Op12 = 92 => "OP_12",
    Op13 = 93 => "OP_13",
    Op14 = 94 => "OP_14",
    Op15 = 95 => "OP_15",
    Op16 = 96 => "OP_16",

    // Flow control.
    Nop = 97 => "OP_NOP",
    Ver = 98 => "OP_VER",
    If = 99 => "OP_IF",
    NotIf = 100 => "OP_NOTIF",
    VerIf = 101 => "OP_VERIF",
    VerNotIf = 102 => "OP_VERNOTIF",
    Else = 103 => "OP_ELSE",
    EndIf = 104 => "OP_ENDIF",
    Verify = 105 => "OP_VERIFY",
    Return = 106 => "OP_RETURN",

    // Stack.
    ToAltStack = 107 => "OP_TOALTSTACK",
    FromAltStack = 108 => "OP_FROMALTSTACK",
    TwoDrop = 109 => "OP_2DROP",
    TwoDup = 110 => "OP_2DUP",
    ThreeDup = 111 => "OP_3DUP",
    TwoOver = 112 => "OP_2OVER",
    TwoRot = 113 => "OP_2ROT",
    TwoSwap = 114 => "OP_2SWAP",
    IfDup = 115 => "OP_IFDUP",
    Depth = 116 => "OP_DEPTH",
    Drop = 117 => "OP_DROP",
    Dup = 118 => "OP_DUP",
    Nip = 119 => "OP_NIP",
    Over = 120 => "OP_OVER",
    Pick = 121 => "OP_PICK",
    Roll = 122 => "OP_ROLL",
    Rot = 123 => "OP_ROT",
    Swap = 124 => "OP_SWAP",
    Tuck = 125 => "OP_TUCK",

    // Splice.
    Cat = 126 => "OP_CAT",
    Substr = 127 => "OP_SUBSTR",
    Left = 128 => "OP_LEFT",
    Right = 129 => "OP_RIGHT",
    Size = 130 => "OP_SIZE",

    // Bitwise logic.
    Invert = 131 => "OP_INVERT",
    And = 132 => "OP_AND",
    Or = 133 => "OP_OR",
    Xor = 134 => "OP_XOR",
    Equal = 135 => "OP_EQUAL",
    EqualVerify = 136 => "OP_EQUALVERIFY",
    Reserved1 = 137 => "OP_RESERVED1",
    Reserved2 = 138 => "OP_RESERVED2",

    // Arithmetic.
    OneAdd = 139 => "OP_1ADD",
    OneSub = 140 => "OP_1SUB",
    TwoMul = 141 => "OP_2MUL",
    TwoDiv = 142 => "OP_2DIV",
    Negate = 143 => "OP_NEGATE",
    Abs = 144 => "OP_ABS",
    Not = 145 => "OP_NOT",
    ZeroNotEqual = 146 => "OP_0NOTEQUAL",
    Add = 147 => "OP_ADD",
    Sub = 148 => "OP_SUB",
    Mul = 149 => "OP_MUL",
    Div = 150 => "OP_DIV",
    Mod = 151 => "OP_MOD",
    LShift = 152 => "OP_LSHIFT",
    RShift = 153 => "OP_RSHIFT",
    BoolAnd = 154 => "OP_BOOLAND",
    BoolOr = 155 => "OP_BOOLOR",
    NumEqual = 156 => "OP_NUMEQUAL",
    NumEqualVerify = 157 => "OP_NUMEQUALVERIFY",
    NumNotEqual = 158 => "OP_NUMNOTEQUAL",
    LessThan = 159 => "OP_LESSTHAN",
    GreaterThan = 160 => "OP_GREATERTHAN",
    LessThanOrEqual = 161 => "OP_LESSTHANOREQUAL",
    GreaterThanOrEqual = 162 => "OP_GREATERTHANOREQUAL",
    Min = 163 => "OP_MIN",
    Max = 164 => "OP_MAX",
    Within = 165 => "OP_WITHIN",

    // Crypto.
    Ripemd160 = 166 => "OP_RIPEMD160",
    Sha1 = 167 => "OP_SHA1",
    Sha256 = 168 => "OP_SHA256",
    Hash160 = 169 => "OP_HASH160",
    Hash256 = 170 => "OP_HASH256",
    CodeSeparator = 171 => "OP_CODESEPARATOR",
    CheckSig = 172 => "OP_CHECKSIG",
    CheckSigVerify = 173 => "OP_CHECKSIGVERIFY",
    CheckMultisig = 174 => "OP_CHECKMULTISIG",
    CheckMultisigVerify = 175 => "OP_CHECKMULTISIGVERIFY",

    // Expansion.
    Nop1 = 176 => "OP_NOP1",
    CheckLockTimeVerify = 177 => "OP_CHECKLOCKTIMEVERIFY",
    Nop3 = 178 => "OP_NOP3",
    Nop4 = 179 => "OP_NOP4",
    Nop5 = 180 => "OP_NOP5",
    Nop6 = 181 => "OP_NOP6",
    Nop7 = 182 => "OP_NOP7",
    Nop8 = 183 => "OP_NOP8",
    Nop9 = 184 => "OP_NOP9",
    Nop10 = 185 => "OP_NOP10",

    // Template matching placeholders, invalid inside real scripts.
    PubkeyHash = 253 => "OP_PUBKEYHASH",
    Pubkey = 254 => "OP_PUBKEY",
    InvalidOpcode = 255 => "OP_INVALIDOPCODE",
}

/// Secondary names accepted by `from_name`.
const ALIASES: &[(&str, Opcode)] = &[
    ("OP_FALSE", Opcode::Op0),
    ("OP_TRUE", Opcode::Op1),
    ("OP_NOP2", Opcode::CheckLockTimeVerify),
];

impl Opcode {
    /// Look an opcode up by its symbolic name.
    ///
    /// # Arguments
    /// * `name` - An `OP_`-prefixed name such as `OP_DUP` or `OP_TRUE`.
    ///
    /// # Returns
    /// The opcode, or `UnknownOpcodeName`.
    pub fn from_name(name: &str) -> Result<Opcode, ScriptError> {
        if !name.starts_with("OP_") {
            return Err(ScriptError::UnknownOpcodeName(name.to_string()));
        }
        NAMED
            .iter()
            .chain(ALIASES.iter())
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
            .ok_or_else(|| ScriptError::UnknownOpcodeName(name.to_string()))
    }

    /// The small-integer opcode pushing `n`, for `n` in 0..=16.
    pub fn for_number(n: i64) -> Result<Opcode, ScriptError> {
        match n {
            0 => Ok(Opcode::Op0),
            1..=16 => Ok(Opcode::from_number(Opcode::Op1.number() + n as u8 - 1)),
            _ => Err(ScriptError::InvalidSmallInt(n)),
        }
    }

    /// The constant push opcode for exactly `length` bytes.
    pub fn const_push_for(length: usize) -> Result<Opcode, ScriptError> {
        if (1..=MAX_CONST_PUSH).contains(&length) {
            Ok(Opcode::PushBytes(length as u8))
        } else {
            Err(ScriptError::InvalidConstPushLength(length))
        }
    }

    /// The smallest variable push opcode able to carry `length` bytes.
    pub fn var_push_for(length: u64) -> Result<Opcode, ScriptError> {
        if length < 1 {
            return Err(ScriptError::InvalidPushLength(length));
        }
        [Opcode::PushData1, Opcode::PushData2, Opcode::PushData4]
            .into_iter()
            .find(|op| length <= op.data_length_max())
            .ok_or(ScriptError::InvalidPushLength(length))
    }

    /// A constant push for up to 75 bytes, otherwise a variable push.
    pub fn push_for(length: u64) -> Result<Opcode, ScriptError> {
        if length <= MAX_CONST_PUSH as u64 {
            Opcode::const_push_for(length as usize)
        } else {
            Opcode::var_push_for(length)
        }
    }

    /// Exact length for a constant push, capacity for a variable push,
    /// zero for everything else.
    pub fn data_length_max(self) -> u64 {
        match self {
            Opcode::PushBytes(n) => n as u64,
            Opcode::PushData1 => u8::MAX as u64,
            Opcode::PushData2 => u16::MAX as u64,
            Opcode::PushData4 => u32::MAX as u64,
            _ => 0,
        }
    }

    /// Width of the little-endian length prefix of a variable push.
    pub fn data_length_nbytes(self) -> Option<usize> {
        match self {
            Opcode::PushData1 => Some(1),
            Opcode::PushData2 => Some(2),
            Opcode::PushData4 => Some(4),
            _ => None,
        }
    }

    /// Opcodes 1..=75.
    pub fn is_const_push(self) -> bool {
        matches!(self.number(), 1..=75)
    }

    /// OP_PUSHDATA1, OP_PUSHDATA2 and OP_PUSHDATA4.
    pub fn is_var_push(self) -> bool {
        self.data_length_nbytes().is_some()
    }

    /// Whether this opcode carries data.
    pub fn is_push(self) -> bool {
        self.is_const_push() || self.is_var_push()
    }

    /// The value 0..=16 pushed by a small-integer opcode.
    pub fn small_int_value(self) -> Option<u8> {
        match self.number() {
            0 => Some(0),
            n @ 81..=96 => Some(n - 80),
            _ => None,
        }
    }

    /// Opcodes pushing a number without data: OP_0, OP_1NEGATE, OP_1..OP_16.
    pub fn is_number(self) -> bool {
        self.small_int_value().is_some() || self == Opcode::Op1Negate
    }

    /// Compare ignoring which push opcode is used: any two pushes are
    /// equal, everything else compares by number.
    pub fn equal_without_data(self, other: Opcode) -> bool {
        (self.is_push() && other.is_push()) || self == other
    }
}

impl From<u8> for Opcode {
    fn from(n: u8) -> Self {
        Opcode::from_number(n)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.number()
    }
}

impl PartialEq for Opcode {
    fn eq(&self, other: &Self) -> bool {
        self.number() == other.number()
    }
}

impl Eq for Opcode {}

impl PartialOrd for Opcode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Opcode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }
}

impl Hash for Opcode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number().hash(state);
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None if self.is_const_push() => write!(f, "PUSH_{}_BYTES", self.number()),
            None => write!(f, "OP_UNKNOWN{}", self.number()),
        }
    }
}
