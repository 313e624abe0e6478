//! Standard script templates.
//!
//! `classify` reduces each instruction to its opcode, with every data push
//! treated as a wildcard, and compares that shape against the standard
//! templates. A match yields a typed view borrowing from the script.

use bitforge_primitives::ec::PublicKey;

use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::{Script, ScriptError};

/// A recognized script template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateKind<'a> {
    /// `<sig> <pubkey>`
    PayToPubkeyIn(PayToPubkeyIn<'a>),
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    PayToPubkeyOut(PayToPubkeyOut<'a>),
    /// `OP_0 <push>... <redeem script>`
    PayToScriptIn(PayToScriptIn<'a>),
    /// `OP_HASH160 <hash> OP_EQUAL`
    PayToScriptOut(PayToScriptOut<'a>),
    /// `OP_RETURN <data>`
    OpReturnOut(OpReturnOut<'a>),
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
    RedeemMultisig(RedeemMultisig<'a>),
}

impl TemplateKind<'_> {
    /// Short name of the template.
    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::PayToPubkeyIn(_) => "pay-to-pubkey-in",
            TemplateKind::PayToPubkeyOut(_) => "pay-to-pubkey-out",
            TemplateKind::PayToScriptIn(_) => "pay-to-script-in",
            TemplateKind::PayToScriptOut(_) => "pay-to-script-out",
            TemplateKind::OpReturnOut(_) => "op-return-out",
            TemplateKind::RedeemMultisig(_) => "redeem-multisig",
        }
    }
}

/// Signature and public key of a pay-to-pubkey-hash spend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayToPubkeyIn<'a> {
    signature: &'a [u8],
    public_key: &'a [u8],
}

impl<'a> PayToPubkeyIn<'a> {
    /// The signature with its sighash byte.
    pub fn signature(&self) -> &'a [u8] {
        self.signature
    }

    /// The raw public key push.
    pub fn public_key_bytes(&self) -> &'a [u8] {
        self.public_key
    }

    /// The pushed public key, decoded.
    pub fn public_key(&self) -> Result<PublicKey, ScriptError> {
        Ok(PublicKey::from_bytes(self.public_key)?)
    }
}

/// A pay-to-pubkey-hash output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayToPubkeyOut<'a> {
    hash: &'a [u8; 20],
}

impl<'a> PayToPubkeyOut<'a> {
    /// hash160 of the public key allowed to spend.
    pub fn pubkey_hash(&self) -> &'a [u8; 20] {
        self.hash
    }
}

/// A pay-to-script-hash spend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayToScriptIn<'a> {
    signatures: Vec<&'a [u8]>,
    redeem_script: &'a [u8],
}

impl<'a> PayToScriptIn<'a> {
    /// Every push before the redeem script.
    pub fn signatures(&self) -> &[&'a [u8]] {
        &self.signatures
    }

    /// Serialized redeem script, the last push.
    pub fn redeem_script_bytes(&self) -> &'a [u8] {
        self.redeem_script
    }

    /// The redeem script, parsed.
    pub fn redeem_script(&self) -> Result<Script, ScriptError> {
        Script::from_bytes(self.redeem_script)
    }
}

/// A pay-to-script-hash output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayToScriptOut<'a> {
    hash: &'a [u8],
}

impl<'a> PayToScriptOut<'a> {
    /// The committed script hash.
    pub fn script_hash(&self) -> &'a [u8] {
        self.hash
    }
}

/// A provably unspendable data carrier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpReturnOut<'a> {
    data: &'a [u8],
}

impl<'a> OpReturnOut<'a> {
    /// The embedded data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// An m-of-n multisig redeem script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemMultisig<'a> {
    required: u8,
    total: u8,
    public_keys: Vec<&'a [u8]>,
}

impl<'a> RedeemMultisig<'a> {
    /// Signatures needed to spend.
    pub fn required_signatures(&self) -> u8 {
        self.required
    }

    /// The key count declared by the script.
    pub fn total_keys(&self) -> u8 {
        self.total
    }

    /// Raw public key pushes in script order.
    pub fn public_key_bytes(&self) -> &[&'a [u8]] {
        &self.public_keys
    }

    /// The public keys, decoded.
    pub fn public_keys(&self) -> Result<Vec<PublicKey>, ScriptError> {
        self.public_keys
            .iter()
            .map(|bytes| PublicKey::from_bytes(bytes).map_err(ScriptError::from))
            .collect()
    }
}

/// Match `script` against the standard templates.
///
/// Unrecognized shapes return `None`.
pub fn classify(script: &Script) -> Option<TemplateKind<'_>> {
    let ins = script.instructions();

    pay_to_pubkey_out(ins)
        .map(TemplateKind::PayToPubkeyOut)
        .or_else(|| pay_to_script_out(ins).map(TemplateKind::PayToScriptOut))
        .or_else(|| op_return_out(ins).map(TemplateKind::OpReturnOut))
        .or_else(|| redeem_multisig(ins).map(TemplateKind::RedeemMultisig))
        .or_else(|| pay_to_pubkey_in(ins).map(TemplateKind::PayToPubkeyIn))
        .or_else(|| pay_to_script_in(ins).map(TemplateKind::PayToScriptIn))
}

/// Data of a push instruction; `None` for everything else.
fn pushed(ins: &Instruction) -> Option<&[u8]> {
    if ins.opcode().is_push() {
        ins.data()
    } else {
        None
    }
}

fn is_op(ins: &Instruction, opcode: Opcode) -> bool {
    ins.opcode() == opcode
}

fn pay_to_pubkey_out(ins: &[Instruction]) -> Option<PayToPubkeyOut<'_>> {
    match ins {
        [dup, hash160, push, equal_verify, check_sig]
            if is_op(dup, Opcode::Dup)
                && is_op(hash160, Opcode::Hash160)
                && is_op(equal_verify, Opcode::EqualVerify)
                && is_op(check_sig, Opcode::CheckSig) =>
        {
            let hash = pushed(push)?.try_into().ok()?;
            Some(PayToPubkeyOut { hash })
        }
        _ => None,
    }
}

fn pay_to_script_out(ins: &[Instruction]) -> Option<PayToScriptOut<'_>> {
    match ins {
        [hash160, push, equal] if is_op(hash160, Opcode::Hash160) && is_op(equal, Opcode::Equal) => {
            Some(PayToScriptOut { hash: pushed(push)? })
        }
        _ => None,
    }
}

fn op_return_out(ins: &[Instruction]) -> Option<OpReturnOut<'_>> {
    match ins {
        [ret, push] if is_op(ret, Opcode::Return) => Some(OpReturnOut { data: pushed(push)? }),
        _ => None,
    }
}

fn redeem_multisig(ins: &[Instruction]) -> Option<RedeemMultisig<'_>> {
    match ins {
        [m, keys @ .., n, check] if !keys.is_empty() && is_op(check, Opcode::CheckMultisig) => {
            let required = m.opcode().small_int_value()?;
            let total = n.opcode().small_int_value()?;
            let public_keys = keys.iter().map(pushed).collect::<Option<Vec<_>>>()?;
            Some(RedeemMultisig { required, total, public_keys })
        }
        _ => None,
    }
}

fn pay_to_pubkey_in(ins: &[Instruction]) -> Option<PayToPubkeyIn<'_>> {
    match ins {
        [sig, key] => Some(PayToPubkeyIn {
            signature: pushed(sig)?,
            public_key: pushed(key)?,
        }),
        _ => None,
    }
}

fn pay_to_script_in(ins: &[Instruction]) -> Option<PayToScriptIn<'_>> {
    match ins {
        [first, sigs @ .., redeem] => {
            first.opcode().small_int_value()?;
            let signatures = sigs.iter().map(pushed).collect::<Option<Vec<_>>>()?;
            Some(PayToScriptIn {
                signatures,
                redeem_script: pushed(redeem)?,
            })
        }
        _ => None,
    }
}
