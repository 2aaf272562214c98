//! Signature and public key encoding validators
//!
//! These checks gate the crypto opcodes: a malformed public key or
//! signature encoding is a script error before any curve operation runs.
//! The DER rules match the strict (BIP66) form: matching length markers
//! and minimally-encoded positive integers of at most 33 bytes for both
//! `r` and `s`.

use crate::constants::SCHNORR_SIGNATURE_LENGTH;
use crate::signing_serialization::SighashType;

/// Whether `public_key` is a validly-shaped SEC1 encoding: 33 bytes with a
/// `0x02`/`0x03` prefix, or 65 bytes with a `0x04` prefix.
pub fn is_valid_public_key_encoding(public_key: &[u8]) -> bool {
    match public_key.first() {
        Some(0x02) | Some(0x03) => public_key.len() == 33,
        Some(0x04) => public_key.len() == 65,
        _ => false,
    }
}

/// Whether `signature` (without sighash byte) is strict DER.
pub fn is_strict_der_signature(signature: &[u8]) -> bool {
    // Shortest strict form: 0x30 0x06 0x02 0x01 <r> 0x02 0x01 <s>.
    // Longest: both integers at 33 bytes.
    if signature.len() < 8 || signature.len() > 72 {
        return false;
    }
    if signature[0] != 0x30 || signature[1] as usize != signature.len() - 2 {
        return false;
    }

    let r_length = signature[3] as usize;
    if signature[2] != 0x02 || r_length == 0 || r_length > 33 {
        return false;
    }
    if 5 + r_length >= signature.len() {
        return false;
    }
    let r = &signature[4..4 + r_length];
    // Positive, minimally encoded.
    if r[0] & 0x80 != 0 {
        return false;
    }
    if r_length > 1 && r[0] == 0x00 && r[1] & 0x80 == 0 {
        return false;
    }

    let s_marker = 4 + r_length;
    let s_length = signature[s_marker + 1] as usize;
    if signature[s_marker] != 0x02 || s_length == 0 || s_length > 33 {
        return false;
    }
    if s_marker + 2 + s_length != signature.len() {
        return false;
    }
    let s = &signature[s_marker + 2..];
    if s[0] & 0x80 != 0 {
        return false;
    }
    if s_length > 1 && s[0] == 0x00 && s[1] & 0x80 == 0 {
        return false;
    }

    true
}

/// Whether `signature` is validly encoded for a BCH transaction signature
/// check (OP_CHECKSIG / OP_CHECKMULTISIG).
///
/// Accepted forms: the empty string (a null signature, which can never
/// verify but is not an encoding error), a strict-DER ECDSA signature
/// followed by a valid forkid sighash byte, or a 64-byte Schnorr signature
/// followed by a valid forkid sighash byte.
pub fn is_valid_signature_encoding(signature: &[u8]) -> bool {
    let Some((sighash_byte, body)) = signature.split_last() else {
        return true;
    };
    if !SighashType::from_byte(*sighash_byte).is_valid() {
        return false;
    }
    body.len() == SCHNORR_SIGNATURE_LENGTH || is_strict_der_signature(body)
}

/// Whether `signature` is validly encoded for OP_CHECKDATASIG: the empty
/// string, strict DER, or a 64-byte Schnorr signature. Data signatures
/// carry no sighash byte.
pub fn is_valid_data_signature_encoding(signature: &[u8]) -> bool {
    signature.is_empty()
        || signature.len() == SCHNORR_SIGNATURE_LENGTH
        || is_strict_der_signature(signature)
}
