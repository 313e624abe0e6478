//! Crypto operations for the script interpreter.

use bitforge_primitives::ec::Signature;
use bitforge_primitives::hash;
use log::debug;

use crate::Script;

use super::config::MAX_PUBKEYS_PER_MULTISIG;
use super::error::{VerifyError, VerifyErrorCode};
use super::flags::ScriptFlags;
use super::thread::Thread;

const SIGHASH_ANYONECANPAY: u32 = 0x80;

pub(crate) enum HashType {
    Ripemd160,
    Sha1,
    Sha256,
    Hash160,
    Hash256,
}

impl<'a> Thread<'a> {
    pub(crate) fn op_hash(&mut self, hash_type: HashType) -> Result<(), VerifyError> {
        let buf = self.dstack.pop_byte_array()?;
        let result = match hash_type {
            HashType::Ripemd160 => hash::ripemd160(&buf).to_vec(),
            HashType::Sha1 => hash::sha1(&buf).to_vec(),
            HashType::Sha256 => hash::sha256(&buf).to_vec(),
            HashType::Hash160 => hash::hash160(&buf).to_vec(),
            HashType::Hash256 => hash::sha256d(&buf).to_vec(),
        };
        self.dstack.push_byte_array(result);
        Ok(())
    }

    /// The instructions after the last OP_CODESEPARATOR.
    pub(crate) fn sub_script(&self) -> Script {
        self.script.subscript_from(self.begin_code_hash)
    }

    pub(crate) fn op_checksig(&mut self) -> Result<(), VerifyError> {
        let pk_bytes = self.dstack.pop_byte_array()?;
        let full_sig_bytes = self.dstack.pop_byte_array()?;

        let mut sub_script = self.sub_script();
        sub_script.remove_opcode_by_data(&full_sig_bytes);

        let valid = self.check_sig(&full_sig_bytes, &pk_bytes, &sub_script)?;
        self.dstack.push_bool(valid);
        Ok(())
    }

    /// Pops `dummy sig1..sigm m key1..keyn n` and pushes whether every
    /// signature matched a key, in order.
    pub(crate) fn op_checkmultisig(&mut self) -> Result<(), VerifyError> {
        let num_keys = self.dstack.pop_int()?.to_i64();
        if num_keys < 0 || num_keys > MAX_PUBKEYS_PER_MULTISIG as i64 {
            return Err(VerifyError::new(
                VerifyErrorCode::PubkeyCount,
                format!(
                    "number of pubkeys {} is outside 0..={}",
                    num_keys, MAX_PUBKEYS_PER_MULTISIG
                ),
            ));
        }
        let num_keys = num_keys as usize;

        self.op_count += num_keys;
        self.check_op_count()?;

        let mut pub_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            pub_keys.push(self.dstack.pop_byte_array()?);
        }

        let num_sigs = self.dstack.pop_int()?.to_i64();
        if num_sigs < 0 || num_sigs > num_keys as i64 {
            return Err(VerifyError::new(
                VerifyErrorCode::SigCount,
                format!("number of signatures {} is outside 0..={}", num_sigs, num_keys),
            ));
        }
        let num_sigs = num_sigs as usize;

        let mut signatures = Vec::with_capacity(num_sigs);
        for _ in 0..num_sigs {
            signatures.push(self.dstack.pop_byte_array()?);
        }

        // One extra element is consumed, an off-by-one kept for consensus.
        let dummy = self.dstack.pop_byte_array()?;
        if self.has_flag(ScriptFlags::NULLDUMMY) && !dummy.is_empty() {
            return Err(VerifyError::new(
                VerifyErrorCode::SigNullDummy,
                format!("multisig dummy argument has length {} instead of 0", dummy.len()),
            ));
        }

        let mut sub_script = self.sub_script();
        for sig in &signatures {
            sub_script.remove_opcode_by_data(sig);
        }

        let mut success = true;
        let mut sigs = signatures.iter().peekable();
        let mut keys_left = pub_keys.len();
        for pub_key in &pub_keys {
            let sig = match sigs.peek() {
                Some(sig) => *sig,
                None => break,
            };
            if self.check_sig(sig, pub_key, &sub_script)? {
                sigs.next();
            }
            keys_left -= 1;
            if sigs.len() > keys_left {
                success = false;
                break;
            }
        }

        self.dstack.push_bool(success);
        Ok(())
    }

    /// Check encodings, then verify one signature against the transaction.
    ///
    /// # Arguments
    /// * `full_sig` - DER signature followed by the sighash type byte.
    /// * `pub_key` - SEC1 public key bytes.
    /// * `sub_script` - The subscript with signatures already removed.
    ///
    /// # Returns
    /// Whether the signature is valid; an empty signature is simply invalid.
    fn check_sig(&self, full_sig: &[u8], pub_key: &[u8], sub_script: &Script) -> Result<bool, VerifyError> {
        self.check_signature_encoding(full_sig)?;
        self.check_pub_key_encoding(pub_key)?;

        let shf = match full_sig.last() {
            Some(&b) => b as u32,
            None => return Ok(false),
        };

        let ctx = self.tx_context.ok_or_else(|| {
            VerifyError::new(VerifyErrorCode::MissingTxContext, "no tx context for checksig")
        })?;

        match ctx.verify_signature(full_sig, pub_key, sub_script, self.input_idx, shf) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                debug!("signature check on input {} failed: {}", self.input_idx, e);
                Ok(false)
            }
        }
    }

    pub(crate) fn check_hash_type_encoding(&self, shf: u32) -> Result<(), VerifyError> {
        if !self.has_flag(ScriptFlags::STRICTENC) {
            return Ok(());
        }
        let base = shf & !SIGHASH_ANYONECANPAY;
        if !(1..=3).contains(&base) {
            return Err(VerifyError::new(
                VerifyErrorCode::SigHashType,
                format!("invalid hash type 0x{:x}", shf),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_pub_key_encoding(&self, pub_key: &[u8]) -> Result<(), VerifyError> {
        if !self.has_flag(ScriptFlags::STRICTENC) {
            return Ok(());
        }
        match (pub_key.len(), pub_key.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
            _ => Err(VerifyError::new(
                VerifyErrorCode::PubkeyType,
                "unsupported public key type",
            )),
        }
    }

    /// Encoding rules for a signature including its sighash byte. Empty
    /// signatures pass so that CHECKSIG can push false.
    pub(crate) fn check_signature_encoding(&self, full_sig: &[u8]) -> Result<(), VerifyError> {
        let (&shf, der) = match full_sig.split_last() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        if self.has_any(&[ScriptFlags::DERSIG, ScriptFlags::LOW_S, ScriptFlags::STRICTENC]) {
            if let Some(problem) = der_violation(der) {
                return Err(VerifyError::new(
                    VerifyErrorCode::SigDer,
                    format!("malformed signature: {}", problem),
                ));
            }
        }

        if self.has_flag(ScriptFlags::LOW_S) {
            let low = Signature::from_der(der).map(|s| s.is_low_s()).unwrap_or(false);
            if !low {
                return Err(VerifyError::new(
                    VerifyErrorCode::SigHighS,
                    "signature is not canonical due to unnecessarily high S value",
                ));
            }
        }

        self.check_hash_type_encoding(shf as u32)
    }
}

/// The first strict DER rule `sig` breaks, if any.
fn der_violation(sig: &[u8]) -> Option<&'static str> {
    let sig_len = sig.len();
    if sig_len < 8 {
        return Some("too short");
    }
    if sig_len > 72 {
        return Some("too long");
    }
    if sig[0] != 0x30 {
        return Some("format has wrong type");
    }
    if sig[1] as usize != sig_len - 2 {
        return Some("bad length");
    }

    let r_len = sig[3] as usize;
    let s_type_offset = 4 + r_len;
    let s_len_offset = s_type_offset + 1;
    if s_len_offset >= sig_len {
        return Some("S type indicator or length missing");
    }

    let s_offset = s_len_offset + 1;
    let s_len = sig[s_len_offset] as usize;
    if s_offset + s_len != sig_len {
        return Some("invalid S length");
    }

    if sig[2] != 0x02 {
        return Some("R integer marker is not 0x02");
    }
    if r_len == 0 {
        return Some("R length is zero");
    }
    if sig[4] & 0x80 != 0 {
        return Some("R is negative");
    }
    if r_len > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return Some("R value has too much padding");
    }

    if sig[s_type_offset] != 0x02 {
        return Some("S integer marker is not 0x02");
    }
    if s_len == 0 {
        return Some("S length is zero");
    }
    if sig[s_offset] & 0x80 != 0 {
        return Some("S is negative");
    }
    if s_len > 1 && sig[s_offset] == 0x00 && sig[s_offset + 1] & 0x80 == 0 {
        return Some("S value has too much padding");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_with(script: &Script, flags: ScriptFlags) -> Thread<'_> {
        Thread::new(script, Vec::new(), flags, None, 0)
    }

    const GOOD_DER: &str = "3044022057bc2e0b5c2b25c16a3bb10aa0a5e2cd2e1e00a6e9d7bc2b2ec5d3e2e0f5c0d002207c8d6fb6a4a4c5b3f1e2d3c4b5a69788796a5b4c3d2e1f0a1b2c3d4e5f6a7b8c";

    #[test]
    fn test_der_violation() {
        let good = hex::decode(GOOD_DER).unwrap();
        assert_eq!(der_violation(&good), None);

        let mut bad_header = good.clone();
        bad_header[0] = 0x31;
        assert_eq!(der_violation(&bad_header), Some("format has wrong type"));

        let mut bad_len = good.clone();
        bad_len[1] = 0x45;
        assert_eq!(der_violation(&bad_len), Some("bad length"));

        let mut negative_r = good.clone();
        negative_r[4] = 0x80;
        assert_eq!(der_violation(&negative_r), Some("R is negative"));

        assert_eq!(der_violation(&good[..7]), Some("too short"));
        assert_eq!(der_violation(&[0x30; 73]), Some("too long"));
    }

    #[test]
    fn test_signature_encoding_flags() {
        let script = Script::new();
        let mut full = hex::decode(GOOD_DER).unwrap();
        full.push(0x01);

        let strict = thread_with(&script, ScriptFlags::STRICTENC);
        assert!(strict.check_signature_encoding(&full).is_ok());
        assert!(strict.check_signature_encoding(&[]).is_ok());

        let mut bad_type = full.clone();
        *bad_type.last_mut().unwrap() = 0x04;
        assert_eq!(
            strict.check_signature_encoding(&bad_type).unwrap_err().code,
            VerifyErrorCode::SigHashType
        );
        *bad_type.last_mut().unwrap() = 0x81;
        assert!(strict.check_signature_encoding(&bad_type).is_ok());

        let mut bad_der = full.clone();
        bad_der[0] = 0x31;
        assert_eq!(
            thread_with(&script, ScriptFlags::DERSIG)
                .check_signature_encoding(&bad_der)
                .unwrap_err()
                .code,
            VerifyErrorCode::SigDer
        );
        assert!(thread_with(&script, ScriptFlags::NONE)
            .check_signature_encoding(&bad_der)
            .is_ok());
    }

    #[test]
    fn test_high_s_rejected() {
        let script = Script::new();
        // S = order - 1 is above half the order.
        let mut der = vec![0x30, 0x26, 0x02, 0x01, 0x01, 0x02, 0x21, 0x00];
        der.extend_from_slice(
            &hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140").unwrap(),
        );
        der.push(0x01);
        let err = thread_with(&script, ScriptFlags::LOW_S)
            .check_signature_encoding(&der)
            .unwrap_err();
        assert_eq!(err.code, VerifyErrorCode::SigHighS);
    }

    #[test]
    fn test_pub_key_encoding() {
        let script = Script::new();
        let strict = thread_with(&script, ScriptFlags::STRICTENC);
        let mut compressed = vec![0x02];
        compressed.extend_from_slice(&[0x11; 32]);
        assert!(strict.check_pub_key_encoding(&compressed).is_ok());
        let mut uncompressed = vec![0x04];
        uncompressed.extend_from_slice(&[0x11; 64]);
        assert!(strict.check_pub_key_encoding(&uncompressed).is_ok());
        compressed[0] = 0x04;
        assert_eq!(
            strict.check_pub_key_encoding(&compressed).unwrap_err().code,
            VerifyErrorCode::PubkeyType
        );
        assert!(thread_with(&script, ScriptFlags::NONE)
            .check_pub_key_encoding(&compressed)
            .is_ok());
    }

    #[test]
    fn test_hash_ops() {
        let script = Script::from_string("OP_0 OP_HASH160").expect("script should parse");
        let mut thread = thread_with(&script, ScriptFlags::NONE);
        thread.evaluate().expect("should run");
        assert_eq!(
            hex::encode(&thread.stack()[0]),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
