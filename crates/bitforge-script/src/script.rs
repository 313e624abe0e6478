/// Bitcoin Script: an ordered sequence of instructions.
///
/// Scripts appear in transaction outputs (the spending condition) and
/// inputs (its satisfaction). This module handles the binary and textual
/// encodings, building scripts from schematics, and the standard
/// constructors.

use std::fmt;

use bitforge_primitives::ec::PublicKey;
use bitforge_primitives::hash::hash160;
use bitforge_primitives::Buffer;

use crate::address::Address;
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::template::{classify, TemplateKind};
use crate::ScriptError;

/// One element of a script schematic passed to `Script::compile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchematicItem {
    /// A data-less opcode.
    Op(Opcode),
    /// An opcode given by its byte value.
    Number(u8),
    /// Data pushed with the smallest fitting push opcode.
    Bytes(Vec<u8>),
    /// Data pushed with an explicit opcode.
    Push(Opcode, Vec<u8>),
}

impl From<Opcode> for SchematicItem {
    fn from(op: Opcode) -> Self {
        SchematicItem::Op(op)
    }
}

impl From<Vec<u8>> for SchematicItem {
    fn from(data: Vec<u8>) -> Self {
        SchematicItem::Bytes(data)
    }
}

impl From<&[u8]> for SchematicItem {
    fn from(data: &[u8]) -> Self {
        SchematicItem::Bytes(data.to_vec())
    }
}

/// A script, held as its parsed instructions.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script {
    instructions: Vec<Instruction>,
}

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create an empty script.
    pub fn new() -> Self {
        Script { instructions: Vec::new() }
    }

    /// Wrap already-validated instructions.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Script { instructions }
    }

    /// Parse the binary encoding.
    ///
    /// # Arguments
    /// * `bytes` - Concatenated `opcode [length] [data]` records.
    ///
    /// # Returns
    /// The script, or `InsufficientData` if a push runs past the end.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        let mut buf = Buffer::new(bytes);
        let mut instructions = Vec::new();
        while !buf.is_empty() {
            instructions.push(Instruction::read_from(&mut buf)?);
        }
        Ok(Script { instructions })
    }

    /// Parse the hex of the binary encoding.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Script::from_bytes(&hex::decode(hex_str)?)
    }

    /// Parse the textual encoding.
    ///
    /// Tokens are opcode names (`OP_DUP`), `N 0xHEX` for constant pushes
    /// and `OP_PUSHDATAk N 0xHEX` for variable pushes.
    ///
    /// # Arguments
    /// * `text` - Whitespace-separated tokens.
    ///
    /// # Returns
    /// The script, or one of `UnknownOpcodeName`, `MissingPushArguments`,
    /// `InvalidPushSize`, `InvalidPushData`, `InvalidPushDataLength`.
    pub fn from_string(text: &str) -> Result<Self, ScriptError> {
        let mut tokens = text.split_whitespace();
        let mut instructions = Vec::new();

        while let Some(token) = tokens.next() {
            let opcode = parse_opcode_token(token)?;
            let missing = || ScriptError::MissingPushArguments(token.to_string());

            let instruction = if opcode.is_const_push() {
                let data = parse_push_data(tokens.next().ok_or_else(missing)?)?;
                Instruction::new(opcode, Some(data))?
            } else if opcode.is_var_push() {
                let size_token = tokens.next().ok_or_else(missing)?;
                let data_token = tokens.next().ok_or_else(missing)?;
                let size: usize = size_token
                    .parse()
                    .map_err(|_| ScriptError::InvalidPushSize(size_token.to_string()))?;
                let data = parse_push_data(data_token)?;
                if size != data.len() {
                    return Err(ScriptError::InvalidPushDataLength(data.len()));
                }
                Instruction::new(opcode, Some(data))?
            } else {
                Instruction::op(opcode)?
            };
            instructions.push(instruction);
        }

        Ok(Script { instructions })
    }

    /// Build a script from a schematic.
    pub fn compile<I>(schematic: I) -> Result<Self, ScriptError>
    where
        I: IntoIterator<Item = SchematicItem>,
    {
        let instructions = schematic
            .into_iter()
            .map(|item| match item {
                SchematicItem::Op(op) => Instruction::op(op),
                SchematicItem::Number(n) => Instruction::op(Opcode::from_number(n)),
                SchematicItem::Bytes(data) => Instruction::push_for(&data),
                SchematicItem::Push(op, data) => Instruction::new(op, Some(data)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Script { instructions })
    }

    // -----------------------------------------------------------------------
    // Standard scripts
    // -----------------------------------------------------------------------

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG` for a
    /// pay-to-pubkey-hash address.
    pub fn pay_to_pubkey_out(address: &Address) -> Self {
        Script::pay_to_pubkey_hash_out(address.hash())
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn pay_to_pubkey_hash_out(hash: &[u8; 20]) -> Self {
        Script {
            instructions: vec![
                bare(Opcode::Dup),
                bare(Opcode::Hash160),
                push20(hash),
                bare(Opcode::EqualVerify),
                bare(Opcode::CheckSig),
            ],
        }
    }

    /// `<signature> <pubkey>`.
    ///
    /// # Arguments
    /// * `pubkey` - Pushed in its own encoding.
    /// * `signature` - DER signature with its sighash byte appended.
    pub fn pay_to_pubkey_in(pubkey: &PublicKey, signature: &[u8]) -> Result<Self, ScriptError> {
        Script::compile([
            SchematicItem::from(signature),
            SchematicItem::Bytes(pubkey.to_bytes()),
        ])
    }

    /// `OP_HASH160 <hash160(script)> OP_EQUAL`.
    pub fn pay_to_script_out(script: &Script) -> Self {
        Script::pay_to_script_hash_out(&script.to_hash())
    }

    /// `OP_HASH160 <hash> OP_EQUAL`.
    pub fn pay_to_script_hash_out(hash: &[u8; 20]) -> Self {
        Script {
            instructions: vec![bare(Opcode::Hash160), push20(hash), bare(Opcode::Equal)],
        }
    }

    /// `OP_0 <sig>... <script>`.
    ///
    /// The leading OP_0 feeds the extra element CHECKMULTISIG pops.
    pub fn pay_to_script_in<S>(script: &Script, signatures: &[S]) -> Result<Self, ScriptError>
    where
        S: AsRef<[u8]>,
    {
        let items = std::iter::once(SchematicItem::Op(Opcode::Op0))
            .chain(signatures.iter().map(|s| SchematicItem::from(s.as_ref())))
            .chain(std::iter::once(SchematicItem::Bytes(script.to_bytes())));
        Script::compile(items)
    }

    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    ///
    /// # Arguments
    /// * `pubkeys` - Between 1 and 16 keys.
    /// * `min_signatures` - Required signature count `m`, at most `pubkeys.len()`.
    ///
    /// # Returns
    /// The redeem script, `InvalidMultisig` unless `1 <= m <= n`, or
    /// `InvalidSmallInt` if `n` is above 16.
    pub fn redeem_multisig(pubkeys: &[PublicKey], min_signatures: usize) -> Result<Self, ScriptError> {
        if min_signatures == 0 || min_signatures > pubkeys.len() {
            return Err(ScriptError::InvalidMultisig {
                required: min_signatures,
                keys: pubkeys.len(),
            });
        }
        let m = Opcode::for_number(min_signatures as i64)?;
        let n = Opcode::for_number(pubkeys.len() as i64)?;
        let items = std::iter::once(SchematicItem::Op(m))
            .chain(pubkeys.iter().map(|k| SchematicItem::Bytes(k.to_bytes())))
            .chain([SchematicItem::Op(n), SchematicItem::Op(Opcode::CheckMultisig)]);
        Script::compile(items)
    }

    /// `OP_RETURN <data>`.
    pub fn op_return(data: &[u8]) -> Result<Self, ScriptError> {
        Script::compile([SchematicItem::Op(Opcode::Return), SchematicItem::from(data)])
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The instructions in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the script has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Append `data` with the smallest fitting push.
    pub fn push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        self.instructions.push(Instruction::push_for(data)?);
        Ok(())
    }

    /// Classify against the standard templates.
    pub fn kind(&self) -> Option<TemplateKind<'_>> {
        classify(self)
    }

    // -----------------------------------------------------------------------
    // Queries and edits
    // -----------------------------------------------------------------------

    /// Same length and opcode-wise `equal_without_data`.
    pub fn equal_without_data(&self, other: &Script) -> bool {
        self.instructions.len() == other.instructions.len()
            && self
                .instructions
                .iter()
                .zip(&other.instructions)
                .all(|(a, b)| a.equal_without_data(b))
    }

    /// Whether every opcode is a push or a small integer (at most OP_16).
    pub fn is_push_only(&self) -> bool {
        self.instructions.iter().all(|i| i.opcode() <= Opcode::Op16)
    }

    /// Drop every instruction pushing exactly `data`.
    pub fn remove_opcode_by_data(&mut self, data: &[u8]) {
        self.instructions.retain(|i| i.data() != Some(data));
    }

    /// Drop every occurrence of `opcode`.
    pub fn remove_opcode(&mut self, opcode: Opcode) {
        self.instructions.retain(|i| i.opcode() != opcode);
    }

    /// The instructions from `index` onward.
    pub fn subscript_from(&self, index: usize) -> Script {
        Script {
            instructions: self.instructions.get(index..).unwrap_or_default().to_vec(),
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// The binary encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for instruction in &self.instructions {
            out.extend_from_slice(&instruction.to_bytes());
        }
        out
    }

    /// Length of the binary encoding.
    pub fn byte_len(&self) -> usize {
        self.instructions.iter().map(Instruction::len).sum()
    }

    /// Lowercase hex of the binary encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// RIPEMD160(SHA256(bytes)), the pay-to-script-hash commitment.
    pub fn to_hash(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }
}

fn bare(opcode: Opcode) -> Instruction {
    Instruction::from_parts(opcode, None)
}

fn push20(hash: &[u8; 20]) -> Instruction {
    Instruction::from_parts(Opcode::PushBytes(20), Some(hash.to_vec()))
}

fn parse_opcode_token(token: &str) -> Result<Opcode, ScriptError> {
    match Opcode::from_name(token) {
        Ok(op) => Ok(op),
        Err(_) if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) => {
            let length: usize = token
                .parse()
                .map_err(|_| ScriptError::InvalidPushSize(token.to_string()))?;
            Opcode::const_push_for(length)
        }
        Err(e) => Err(e),
    }
}

fn parse_push_data(token: &str) -> Result<Vec<u8>, ScriptError> {
    let hex_str = token
        .strip_prefix("0x")
        .ok_or_else(|| ScriptError::InvalidPushData(token.to_string()))?;
    hex::decode(hex_str).map_err(|_| ScriptError::InvalidPushData(token.to_string()))
}

impl fmt::Display for Script {
    /// The textual encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, instruction) in self.instructions.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self)
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitforge_primitives::network::LIVENET;

    const P2PKH_HEX: &str = "76a91404d03f746652cfcb6cb55119ab473a045137d26588ac";
    const G_COMPRESSED: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    // -----------------------------------------------------------------------
    // Binary encoding
    // -----------------------------------------------------------------------

    /// Verify a P2PKH script parses into its five instructions.
    #[test]
    fn test_from_hex_p2pkh() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        let ops: Vec<Opcode> = script.instructions().iter().map(|i| i.opcode()).collect();
        assert_eq!(
            ops,
            vec![
                Opcode::Dup,
                Opcode::Hash160,
                Opcode::PushBytes(20),
                Opcode::EqualVerify,
                Opcode::CheckSig
            ]
        );
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert_eq!(script.byte_len(), 25);
    }

    /// Verify variable pushes parse their little-endian length prefix.
    #[test]
    fn test_from_bytes_var_push() {
        let mut bytes = vec![0x4d, 0x00, 0x01];
        bytes.extend_from_slice(&[0x33; 256]);
        bytes.push(0x87);
        let script = Script::from_bytes(&bytes).expect("valid script");
        assert_eq!(script.len(), 2);
        assert_eq!(script.instructions()[0].opcode(), Opcode::PushData2);
        assert_eq!(script.instructions()[0].data().map(<[u8]>::len), Some(256));
        assert_eq!(script.to_bytes(), bytes);
    }

    /// Verify truncated pushes fail instead of panicking.
    #[test]
    fn test_from_bytes_truncated() {
        for hex_str in ["4c", "4c05aa", "4d01", "4e0000", "14aabb"] {
            assert!(
                matches!(
                    Script::from_hex(hex_str),
                    Err(ScriptError::InsufficientData(_))
                ),
                "{}",
                hex_str
            );
        }
    }

    /// Verify the empty script.
    #[test]
    fn test_empty() {
        let script = Script::from_bytes(&[]).expect("empty");
        assert!(script.is_empty());
        assert_eq!(script.to_string(), "");
        assert_eq!(Script::from_string("").expect("empty"), script);
    }

    // -----------------------------------------------------------------------
    // Textual encoding
    // -----------------------------------------------------------------------

    /// Verify the textual form of a P2PKH script and its inverse.
    #[test]
    fn test_to_string_p2pkh() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        let text = script.to_string();
        assert_eq!(
            text,
            "OP_DUP OP_HASH160 20 0x04d03f746652cfcb6cb55119ab473a045137d265 OP_EQUALVERIFY OP_CHECKSIG"
        );
        assert_eq!(Script::from_string(&text).expect("parses"), script);
    }

    /// Verify variable pushes in text form.
    #[test]
    fn test_from_string_var_push() {
        let script = Script::from_string("OP_PUSHDATA1 2 0xabcd OP_TRUE").expect("parses");
        assert_eq!(script.to_hex(), "4c02abcd51");
        assert_eq!(script.to_string(), "OP_PUSHDATA1 2 0xabcd OP_1");
    }

    /// Verify each textual parse error surfaces as its own variant.
    #[test]
    fn test_from_string_errors() {
        assert!(matches!(
            Script::from_string("OP_DUP OP_BOGUS"),
            Err(ScriptError::UnknownOpcodeName(name)) if name == "OP_BOGUS"
        ));
        assert!(matches!(
            Script::from_string("2"),
            Err(ScriptError::MissingPushArguments(_))
        ));
        assert!(matches!(
            Script::from_string("OP_PUSHDATA1 2"),
            Err(ScriptError::MissingPushArguments(_))
        ));
        assert!(matches!(
            Script::from_string("2 abcd"),
            Err(ScriptError::InvalidPushData(_))
        ));
        assert!(matches!(
            Script::from_string("OP_PUSHDATA1 two 0xabcd"),
            Err(ScriptError::InvalidPushSize(_))
        ));
        assert!(matches!(
            Script::from_string("OP_PUSHDATA1 3 0xabcd"),
            Err(ScriptError::InvalidPushDataLength(2))
        ));
        assert!(matches!(
            Script::from_string("3 0xabcd"),
            Err(ScriptError::InvalidDataLength { .. })
        ));
        assert!(matches!(
            Script::from_string("76 0xab"),
            Err(ScriptError::InvalidConstPushLength(76))
        ));
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Verify compile picks push opcodes by size.
    #[test]
    fn test_compile() {
        let script = Script::compile([
            SchematicItem::Op(Opcode::Dup),
            SchematicItem::Number(0x87),
            SchematicItem::Bytes(vec![0xaa; 80]),
            SchematicItem::Bytes(vec![]),
            SchematicItem::Push(Opcode::PushData1, vec![0x01]),
        ])
        .expect("compiles");
        let ops: Vec<Opcode> = script.instructions().iter().map(|i| i.opcode()).collect();
        assert_eq!(
            ops,
            vec![Opcode::Dup, Opcode::Equal, Opcode::PushData1, Opcode::Op0, Opcode::PushData1]
        );
        assert!(Script::compile([SchematicItem::Push(Opcode::Dup, vec![1])]).is_err());
    }

    /// Verify the standard constructors produce the expected bytes.
    #[test]
    fn test_standard_scripts() {
        let key = PublicKey::from_hex(G_COMPRESSED).expect("valid key");
        let address = Address::from_public_key(&key, &LIVENET);
        assert_eq!(
            Script::pay_to_pubkey_out(&address).to_hex(),
            "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"
        );

        let redeem = Script::redeem_multisig(&[key.clone(), key.clone()], 1).expect("multisig");
        let hex_str = redeem.to_hex();
        assert!(hex_str.starts_with("5121"));
        assert!(hex_str.ends_with("52ae"));

        let p2sh = Script::pay_to_script_out(&redeem);
        assert_eq!(p2sh.to_hex(), format!("a914{}87", hex::encode(redeem.to_hash())));

        let input = Script::pay_to_script_in(&redeem, &[vec![0x30; 71]]).expect("p2sh in");
        assert_eq!(input.instructions()[0].opcode(), Opcode::Op0);
        assert_eq!(input.instructions()[2].data(), Some(&redeem.to_bytes()[..]));

        assert_eq!(Script::op_return(b"hi").expect("op_return").to_hex(), "6a026869");
        assert!(matches!(
            Script::redeem_multisig(&vec![key; 17], 1),
            Err(ScriptError::InvalidSmallInt(17))
        ));
    }

    /// Verify thresholds outside `1..=n` are refused.
    #[test]
    fn test_redeem_multisig_threshold() {
        let key = PublicKey::from_hex(G_COMPRESSED).expect("valid key");
        assert!(matches!(
            Script::redeem_multisig(&[], 1),
            Err(ScriptError::InvalidMultisig { required: 1, keys: 0 })
        ));
        assert!(matches!(
            Script::redeem_multisig(&[key.clone()], 0),
            Err(ScriptError::InvalidMultisig { required: 0, keys: 1 })
        ));
        assert!(matches!(
            Script::redeem_multisig(&[key.clone(), key.clone()], 3),
            Err(ScriptError::InvalidMultisig { required: 3, keys: 2 })
        ));

        let one_of_one = Script::redeem_multisig(&[key], 1).expect("1-of-1");
        assert!(matches!(
            crate::template::classify(&one_of_one),
            Some(crate::template::TemplateKind::RedeemMultisig(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Queries and edits
    // -----------------------------------------------------------------------

    /// Verify push-only detection.
    #[test]
    fn test_is_push_only() {
        assert!(Script::from_string("OP_0 2 0xabcd OP_16").expect("parses").is_push_only());
        assert!(Script::from_string("OP_1NEGATE OP_RESERVED").expect("parses").is_push_only());
        assert!(!Script::from_string("2 0xabcd OP_NOP").expect("parses").is_push_only());
        assert!(!Script::from_hex(P2PKH_HEX).expect("valid hex").is_push_only());
    }

    /// Verify removal by data and by opcode.
    #[test]
    fn test_remove() {
        let mut script =
            Script::from_string("1 0xaa OP_CODESEPARATOR 1 0xbb OP_PUSHDATA1 1 0xaa OP_CODESEPARATOR")
                .expect("parses");
        script.remove_opcode_by_data(&[0xaa]);
        assert_eq!(script.to_string(), "OP_CODESEPARATOR 1 0xbb OP_CODESEPARATOR");
        script.remove_opcode(Opcode::CodeSeparator);
        assert_eq!(script.to_string(), "1 0xbb");
    }

    /// Verify subscripts clamp past the end.
    #[test]
    fn test_subscript_from() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        assert_eq!(script.subscript_from(3).to_hex(), "88ac");
        assert!(script.subscript_from(5).is_empty());
        assert!(script.subscript_from(9).is_empty());
    }

    /// Verify shape equality ignores pushed data.
    #[test]
    fn test_equal_without_data() {
        let a = Script::from_hex(P2PKH_HEX).expect("valid hex");
        let b = Script::pay_to_pubkey_hash_out(&[0u8; 20]);
        assert!(a.equal_without_data(&b));
        assert_ne!(a, b);
        assert!(!a.equal_without_data(&a.subscript_from(1)));
    }

    /// Verify serde uses the hex string.
    #[test]
    fn test_serde_hex() {
        let script = Script::from_hex(P2PKH_HEX).expect("valid hex");
        let json = serde_json::to_string(&script).expect("serializes");
        assert_eq!(json, format!("\"{}\"", P2PKH_HEX));
        let back: Script = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, script);
    }
}
