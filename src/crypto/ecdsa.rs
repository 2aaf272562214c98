//! ECDSA and key arithmetic over secp256k1
//!
//! Signing uses RFC6979 deterministic nonces and always produces low-S
//! normalized signatures. Verification rejects high-S and malformed DER
//! by returning `false` rather than raising; only signing, derivation,
//! and tweak operations surface typed errors.

use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Scalar, Secp256k1, SecretKey};
use std::sync::OnceLock;

use crate::error::{CryptoError, Result};

/// Shared secp256k1 context, built on first use.
pub(crate) fn secp() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

pub(crate) fn parse_private_key(private_key: &[u8]) -> Result<SecretKey> {
    if private_key.len() != 32 {
        return Err(CryptoError::InvalidPrivateKeyLength);
    }
    SecretKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)
}

fn parse_public_key(public_key: &[u8]) -> Result<PublicKey> {
    PublicKey::from_slice(public_key).map_err(|_| CryptoError::MalformedPublicKey)
}

fn parse_message_hash(message_hash: &[u8]) -> Result<Message> {
    Message::from_digest_slice(message_hash).map_err(|_| CryptoError::InvalidMessageHashLength)
}

fn parse_tweak(tweak: &[u8]) -> Result<Scalar> {
    let bytes: [u8; 32] = tweak.try_into().map_err(|_| CryptoError::InvalidTweak)?;
    Scalar::from_be_bytes(bytes).map_err(|_| CryptoError::InvalidTweak)
}

/// True iff `private_key` is 32 bytes encoding a scalar in `[1, n)`.
pub fn validate_private_key(private_key: &[u8]) -> bool {
    private_key.len() == 32 && SecretKey::from_slice(private_key).is_ok()
}

/// Derive the 33-byte compressed public key for `private_key`.
pub fn derive_public_key_compressed(private_key: &[u8]) -> Result<[u8; 33]> {
    let secret = parse_private_key(private_key)?;
    Ok(PublicKey::from_secret_key(secp(), &secret).serialize())
}

/// Derive the 65-byte uncompressed public key for `private_key`.
pub fn derive_public_key_uncompressed(private_key: &[u8]) -> Result<[u8; 65]> {
    let secret = parse_private_key(private_key)?;
    Ok(PublicKey::from_secret_key(secp(), &secret).serialize_uncompressed())
}

/// Compute `private_key + tweak (mod n)`.
pub fn add_tweak_private_key(private_key: &[u8], tweak: &[u8]) -> Result<[u8; 32]> {
    let secret = parse_private_key(private_key)?;
    let tweak = parse_tweak(tweak)?;
    secret
        .add_tweak(&tweak)
        .map(|key| key.secret_bytes())
        .map_err(|_| CryptoError::InvalidResultingKey)
}

/// Compute `private_key * tweak (mod n)`.
pub fn mul_tweak_private_key(private_key: &[u8], tweak: &[u8]) -> Result<[u8; 32]> {
    let secret = parse_private_key(private_key)?;
    let tweak = parse_tweak(tweak)?;
    secret
        .mul_tweak(&tweak)
        .map(|key| key.secret_bytes())
        .map_err(|_| CryptoError::InvalidResultingKey)
}

/// Compute `P + tweak*G`, returning the compressed encoding.
pub fn add_tweak_public_key_compressed(public_key: &[u8], tweak: &[u8]) -> Result<[u8; 33]> {
    let point = parse_public_key(public_key)?;
    let tweak = parse_tweak(tweak)?;
    point
        .add_exp_tweak(secp(), &tweak)
        .map(|p| p.serialize())
        .map_err(|_| CryptoError::InvalidResultingKey)
}

/// Compute `tweak * P`, returning the compressed encoding.
pub fn mul_tweak_public_key_compressed(public_key: &[u8], tweak: &[u8]) -> Result<[u8; 33]> {
    let point = parse_public_key(public_key)?;
    let tweak = parse_tweak(tweak)?;
    point
        .mul_tweak(secp(), &tweak)
        .map(|p| p.serialize())
        .map_err(|_| CryptoError::InvalidResultingKey)
}

/// ECDSA-sign a 32-byte message hash, returning the DER encoding.
///
/// The nonce is RFC6979 deterministic and the signature is low-S
/// normalized, so the output is canonical for transaction use.
pub fn sign_message_hash_der(private_key: &[u8], message_hash: &[u8]) -> Result<Vec<u8>> {
    let secret = parse_private_key(private_key)?;
    let message = parse_message_hash(message_hash)?;
    Ok(secp()
        .sign_ecdsa(&message, &secret)
        .serialize_der()
        .to_vec())
}

/// ECDSA-sign a 32-byte message hash, returning the 64-byte compact
/// `r || s` encoding (low-S normalized).
pub fn sign_message_hash_compact(private_key: &[u8], message_hash: &[u8]) -> Result<[u8; 64]> {
    let secret = parse_private_key(private_key)?;
    let message = parse_message_hash(message_hash)?;
    Ok(secp().sign_ecdsa(&message, &secret).serialize_compact())
}

/// Verify a strict-DER ECDSA signature (without sighash byte), rejecting
/// high-S signatures. Never raises: malformed input returns `false`.
pub fn verify_signature_der_low_s(signature: &[u8], public_key: &[u8], message_hash: &[u8]) -> bool {
    let message = match Message::from_digest_slice(message_hash) {
        Ok(message) => message,
        Err(_) => return false,
    };
    let point = match PublicKey::from_slice(public_key) {
        Ok(point) => point,
        Err(_) => return false,
    };
    let parsed = match Signature::from_der(signature) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    // High-S check: normalization must be a no-op. The compact form is
    // deterministic, so comparing serializations detects any change.
    let mut normalized = parsed;
    normalized.normalize_s();
    if normalized.serialize_compact() != parsed.serialize_compact() {
        return false;
    }
    secp().verify_ecdsa(&message, &parsed, &point).is_ok()
}

/// Verify a 64-byte compact ECDSA signature, rejecting high-S.
pub fn verify_signature_compact_low_s(
    signature: &[u8],
    public_key: &[u8],
    message_hash: &[u8],
) -> bool {
    let der = match signature_compact_to_der(signature) {
        Ok(der) => der,
        Err(_) => return false,
    };
    verify_signature_der_low_s(&der, public_key, message_hash)
}

/// Re-encode a DER signature to its canonical low-S form.
///
/// Accepts lax DER (extra leading zeroes, over-long length encodings) and
/// produces strict DER with `s <= n/2`; already-canonical signatures round
/// trip unchanged.
pub fn normalize_signature_der(signature: &[u8]) -> Result<Vec<u8>> {
    let mut parsed =
        Signature::from_der_lax(signature).map_err(|_| CryptoError::MalformedSignature)?;
    parsed.normalize_s();
    Ok(parsed.serialize_der().to_vec())
}

/// Convert a 64-byte compact `r || s` signature to strict DER.
pub fn signature_compact_to_der(signature: &[u8]) -> Result<Vec<u8>> {
    Signature::from_compact(signature)
        .map(|s| s.serialize_der().to_vec())
        .map_err(|_| CryptoError::MalformedSignature)
}

/// Convert a strict-DER signature to the 64-byte compact `r || s` form.
pub fn signature_der_to_compact(signature: &[u8]) -> Result<[u8; 64]> {
    Signature::from_der(signature)
        .map(|s| s.serialize_compact())
        .map_err(|_| CryptoError::MalformedSignature)
}

/// Re-encode a public key in compressed form.
pub fn compress_public_key(public_key: &[u8]) -> Result<[u8; 33]> {
    parse_public_key(public_key).map(|p| p.serialize())
}

/// Re-encode a public key in uncompressed form.
pub fn uncompress_public_key(public_key: &[u8]) -> Result<[u8; 65]> {
    parse_public_key(public_key).map(|p| p.serialize_uncompressed())
}
