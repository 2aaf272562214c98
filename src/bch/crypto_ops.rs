//! Crypto opcode handlers: hashes, OP_CODESEPARATOR, and the signature
//! checking family
//!
//! Signature checks assemble the BIP143-with-forkid signing serialization
//! from the state's transaction context and covered bytecode, then
//! dispatch to Schnorr or ECDSA verification by signature length. The
//! consensus-critical step orders of OP_CHECKSIG and OP_CHECKMULTISIG are
//! spelled out inline.

use crate::bch::combinators::{
    increment_operation_count, pop_one, pop_script_number, pop_three, pop_two, push_to_stack,
};
use crate::bch::state::ScriptState;
use crate::constants::{
    MAX_PUBLIC_KEYS_PER_MULTISIG, MAX_SCRIPT_NUMBER_LENGTH, SCHNORR_SIGNATURE_LENGTH,
};
use crate::crypto::CryptoProvider;
use crate::encoding::{
    is_valid_data_signature_encoding, is_valid_public_key_encoding, is_valid_signature_encoding,
};
use crate::error::ScriptError;
use crate::script_num::encode_script_boolean;
use crate::signing_serialization::{signing_serialization_digest, SighashType};
use crate::types::ByteString;

// ============================================================================
// Hash opcodes
// ============================================================================

fn hash_op(state: &mut ScriptState, hash: impl Fn(&[u8]) -> ByteString) {
    if let Some(item) = pop_one(state) {
        push_to_stack(state, hash(&item));
    }
}

pub fn op_ripemd160(state: &mut ScriptState, crypto: &dyn CryptoProvider) {
    hash_op(state, |input| crypto.ripemd160(input).to_vec());
}

pub fn op_sha1(state: &mut ScriptState, crypto: &dyn CryptoProvider) {
    hash_op(state, |input| crypto.sha1(input).to_vec());
}

pub fn op_sha256(state: &mut ScriptState, crypto: &dyn CryptoProvider) {
    hash_op(state, |input| crypto.sha256(input).to_vec());
}

pub fn op_hash160(state: &mut ScriptState, crypto: &dyn CryptoProvider) {
    hash_op(state, |input| crypto.hash160(input).to_vec());
}

pub fn op_hash256(state: &mut ScriptState, crypto: &dyn CryptoProvider) {
    hash_op(state, |input| crypto.hash256(input).to_vec());
}

/// Record the current instruction index; signature checks cover only the
/// bytecode after it.
pub fn op_codeseparator(state: &mut ScriptState) {
    state.last_code_separator = state.ip as i32 - 1;
}

// ============================================================================
// Transaction signature checks
// ============================================================================

/// Verify one transaction signature against one public key. The final
/// byte of `bitcoin_encoded_signature` is the sighash type; the rest is
/// either a 64-byte Schnorr signature or strict-DER ECDSA.
fn check_transaction_signature(
    state: &ScriptState,
    crypto: &dyn CryptoProvider,
    covered_bytecode: &[u8],
    bitcoin_encoded_signature: &[u8],
    public_key: &[u8],
) -> bool {
    let Some((sighash_byte, signature)) = bitcoin_encoded_signature.split_last() else {
        return false;
    };
    let digest = signing_serialization_digest(
        &state.context,
        covered_bytecode,
        SighashType::from_byte(*sighash_byte),
    );
    if signature.len() == SCHNORR_SIGNATURE_LENGTH {
        crypto.verify_schnorr(signature, public_key, &digest)
    } else {
        crypto.verify_ecdsa_low_s(signature, public_key, &digest)
    }
}

pub fn op_checksig(
    state: &mut ScriptState,
    crypto: &dyn CryptoProvider,
    require_null_signature_failures: bool,
) {
    let (signature, public_key) = match pop_two(state) {
        Some(items) => items,
        None => return,
    };
    if !is_valid_public_key_encoding(&public_key) {
        state.fail(ScriptError::InvalidPublicKeyEncoding);
        return;
    }
    if !is_valid_signature_encoding(&signature) {
        state.fail(ScriptError::InvalidSignatureEncoding);
        return;
    }
    let covered_bytecode = state.covered_bytecode();
    let success = !signature.is_empty()
        && check_transaction_signature(state, crypto, &covered_bytecode, &signature, &public_key);
    if !success && require_null_signature_failures && !signature.is_empty() {
        state.fail(ScriptError::NonNullSignatureFailure);
        return;
    }
    push_to_stack(state, encode_script_boolean(success));
}

pub fn op_checkmultisig(
    state: &mut ScriptState,
    crypto: &dyn CryptoProvider,
    require_minimal: bool,
    require_null_signature_failures: bool,
    require_bug_value_zero: bool,
) {
    let public_key_count =
        match pop_script_number(state, require_minimal, MAX_SCRIPT_NUMBER_LENGTH) {
            Some(count) => count,
            None => return,
        };
    if public_key_count < 0 {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    if public_key_count > MAX_PUBLIC_KEYS_PER_MULTISIG {
        state.fail(ScriptError::ExceedsMaximumMultisigPublicKeyCount);
        return;
    }
    // Every listed key charges the operation budget, tried or not.
    increment_operation_count(state, public_key_count as usize);
    if state.error.is_some() {
        return;
    }

    let mut public_keys = Vec::with_capacity(public_key_count as usize);
    for _ in 0..public_key_count {
        match pop_one(state) {
            Some(key) => public_keys.push(key),
            None => return,
        }
    }
    public_keys.reverse();

    let signature_count =
        match pop_script_number(state, require_minimal, MAX_SCRIPT_NUMBER_LENGTH) {
            Some(count) => count,
            None => return,
        };
    if signature_count < 0 {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    if signature_count > public_key_count {
        state.fail(ScriptError::InsufficientPublicKeys);
        return;
    }

    let mut signatures = Vec::with_capacity(signature_count as usize);
    for _ in 0..signature_count {
        match pop_one(state) {
            Some(signature) => signatures.push(signature),
            None => return,
        }
    }
    signatures.reverse();

    // The historical off-by-one pop. Consensus requires it to be empty.
    let protocol_bug_value = match pop_one(state) {
        Some(value) => value,
        None => return,
    };
    if require_bug_value_zero && !protocol_bug_value.is_empty() {
        state.fail(ScriptError::InvalidProtocolBugValue);
        return;
    }

    let covered_bytecode = state.covered_bytecode();

    // Signatures must appear in key order: a matching pair advances both
    // cursors, a mismatch advances only the key cursor.
    let mut signature_index = 0;
    let mut key_index = 0;
    let mut success = true;
    while success && signature_index < signatures.len() {
        if signatures.len() - signature_index > public_keys.len() - key_index {
            success = false;
            break;
        }
        let signature = &signatures[signature_index];
        if !is_valid_signature_encoding(signature) {
            state.fail(ScriptError::InvalidSignatureEncoding);
            return;
        }
        if signature.len() == SCHNORR_SIGNATURE_LENGTH + 1 {
            state.fail(ScriptError::SchnorrSizedSignatureInCheckMultiSig);
            return;
        }
        let public_key = &public_keys[key_index];
        if !is_valid_public_key_encoding(public_key) {
            state.fail(ScriptError::InvalidPublicKeyEncoding);
            return;
        }
        let verified = !signature.is_empty()
            && check_transaction_signature(state, crypto, &covered_bytecode, signature, public_key);
        if verified {
            signature_index += 1;
        }
        key_index += 1;
    }
    success = success && signature_index == signatures.len();

    if !success
        && require_null_signature_failures
        && signatures.iter().any(|signature| !signature.is_empty())
    {
        state.fail(ScriptError::NonNullSignatureFailure);
        return;
    }
    push_to_stack(state, encode_script_boolean(success));
}

// ============================================================================
// Data signature checks (OP_CHECKDATASIG, November 2018)
// ============================================================================

pub fn op_checkdatasig(
    state: &mut ScriptState,
    crypto: &dyn CryptoProvider,
    require_null_signature_failures: bool,
) {
    let (signature, message, public_key) = match pop_three(state) {
        Some(items) => items,
        None => return,
    };
    if !is_valid_public_key_encoding(&public_key) {
        state.fail(ScriptError::InvalidPublicKeyEncoding);
        return;
    }
    if !is_valid_data_signature_encoding(&signature) {
        state.fail(ScriptError::InvalidSignatureEncoding);
        return;
    }
    // Data signatures commit to a single SHA-256 of the message.
    let digest = crypto.sha256(&message);
    let success = !signature.is_empty()
        && if signature.len() == SCHNORR_SIGNATURE_LENGTH {
            crypto.verify_schnorr(&signature, &public_key, &digest)
        } else {
            crypto.verify_ecdsa_low_s(&signature, &public_key, &digest)
        };
    if !success && require_null_signature_failures && !signature.is_empty() {
        state.fail(ScriptError::NonNullSignatureFailure);
        return;
    }
    push_to_stack(state, encode_script_boolean(success));
}
