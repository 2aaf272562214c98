//! BCH Schnorr signatures (2019-05 upgrade)
//!
//! Signatures are 64 bytes `r || s` with the "square y" convention: the
//! nonce point R must have a Y coordinate that is a quadratic residue mod
//! the field prime. The challenge is
//! `e = sha256(r || P_compressed || m) mod n`.
//!
//! Group arithmetic uses secp256k1 tweak operations; the quadratic-residue
//! test and challenge reduction are the only big-integer computations and
//! use Euler's criterion over the fixed field prime.

use num_bigint::BigUint;
use secp256k1::{PublicKey, Scalar, SecretKey};

use crate::crypto::ecdsa::{parse_private_key, secp};
use crate::crypto::sha256;
use crate::error::{CryptoError, Result};

/// secp256k1 field prime p, big-endian.
const FIELD_PRIME: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xff, 0xff,
    0xfc, 0x2f,
];

/// secp256k1 group order n, big-endian.
const GROUP_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
    0x41, 0x41,
];

/// Additional-data tag from the BCH Schnorr nonce recommendation.
const NONCE_TAG: &[u8; 16] = b"Schnorr+SHA256  ";

/// Euler's criterion: y is a quadratic residue mod p iff
/// `y^((p-1)/2) == 1 (mod p)`.
fn has_square_y(y: &[u8]) -> bool {
    let p = BigUint::from_bytes_be(&FIELD_PRIME);
    let exponent = (&p - 1u8) >> 1;
    BigUint::from_bytes_be(y).modpow(&exponent, &p) == BigUint::from(1u8)
}

/// Challenge scalar `e = sha256(r || P || m) mod n`.
fn challenge_scalar(r: &[u8; 32], public_key: &[u8; 33], message_hash: &[u8; 32]) -> Scalar {
    let mut preimage = Vec::with_capacity(97);
    preimage.extend_from_slice(r);
    preimage.extend_from_slice(public_key);
    preimage.extend_from_slice(message_hash);
    let digest = sha256(&preimage);

    let n = BigUint::from_bytes_be(&GROUP_ORDER);
    let reduced = BigUint::from_bytes_be(&digest) % &n;
    let mut bytes = [0u8; 32];
    let be = reduced.to_bytes_be();
    bytes[32 - be.len()..].copy_from_slice(&be);
    // Reduced below n, so this cannot be out of range.
    Scalar::from_be_bytes(bytes).unwrap_or(Scalar::ZERO)
}

/// Deterministic nonce for signing. Domain-tagged SHA-256 of the secret
/// key, message, and a retry counter; see DESIGN.md for the rationale.
fn derive_nonce(secret: &SecretKey, message_hash: &[u8; 32]) -> Result<SecretKey> {
    for counter in 0u8..=255 {
        let mut preimage = Vec::with_capacity(32 + 32 + NONCE_TAG.len() + 1);
        preimage.extend_from_slice(&secret.secret_bytes());
        preimage.extend_from_slice(message_hash);
        preimage.extend_from_slice(NONCE_TAG);
        preimage.push(counter);
        if let Ok(nonce) = SecretKey::from_slice(&sha256(&preimage)) {
            return Ok(nonce);
        }
    }
    Err(CryptoError::NonceDerivationFailure)
}

/// Sign a 32-byte message hash, returning the 64-byte `r || s` signature.
pub fn sign_message_hash_schnorr(private_key: &[u8], message_hash: &[u8]) -> Result<[u8; 64]> {
    let secret = parse_private_key(private_key)?;
    let digest: [u8; 32] = message_hash
        .try_into()
        .map_err(|_| CryptoError::InvalidMessageHashLength)?;
    let context = secp();
    let public_key = PublicKey::from_secret_key(context, &secret).serialize();

    let mut nonce = derive_nonce(&secret, &digest)?;
    let r_point = PublicKey::from_secret_key(context, &nonce).serialize_uncompressed();
    let mut r = [0u8; 32];
    r.copy_from_slice(&r_point[1..33]);
    // Negating the nonce flips y(R) between the residue classes while
    // leaving x(R) unchanged (p ≡ 3 mod 4).
    if !has_square_y(&r_point[33..65]) {
        nonce = nonce.negate();
    }

    let e = challenge_scalar(&r, &public_key, &digest);
    let nonce_scalar = Scalar::from_be_bytes(nonce.secret_bytes())
        .map_err(|_| CryptoError::NonceDerivationFailure)?;
    // s = k + e*x mod n
    let s = if e == Scalar::ZERO {
        nonce
    } else {
        secret
            .mul_tweak(&e)
            .and_then(|ex| ex.add_tweak(&nonce_scalar))
            .map_err(|_| CryptoError::InvalidResultingKey)?
    };

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&r);
    signature[32..].copy_from_slice(&s.secret_bytes());
    Ok(signature)
}

/// Verify a 64-byte `r || s` signature over a 32-byte message hash.
///
/// Never raises: any malformed input returns `false`. Rejects `r >= p`,
/// `s >= n` or `s = 0`, a nonce point at infinity or with a non-square Y
/// coordinate, and `x(R) != r`.
pub fn verify_signature_schnorr(signature: &[u8], public_key: &[u8], message_hash: &[u8]) -> bool {
    if signature.len() != 64 {
        return false;
    }
    let digest: [u8; 32] = match message_hash.try_into() {
        Ok(digest) => digest,
        Err(_) => return false,
    };
    let point = match PublicKey::from_slice(public_key) {
        Ok(point) => point,
        Err(_) => return false,
    };

    let mut r = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    if r[..] >= FIELD_PRIME[..] {
        return false;
    }
    // SecretKey parsing enforces 0 < s < n.
    let s = match SecretKey::from_slice(&signature[32..]) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let context = secp();
    // The challenge always commits to the compressed key encoding.
    let e = challenge_scalar(&r, &point.serialize(), &digest);

    // R = sG - eP; a point at infinity fails combination.
    let s_g = PublicKey::from_secret_key(context, &s);
    let r_point = if e == Scalar::ZERO {
        s_g
    } else {
        let e_p = match point.mul_tweak(context, &e) {
            Ok(e_p) => e_p,
            Err(_) => return false,
        };
        match s_g.combine(&e_p.negate(context)) {
            Ok(r_point) => r_point,
            Err(_) => return false,
        }
    };

    let serialized = r_point.serialize_uncompressed();
    has_square_y(&serialized[33..65]) && serialized[1..33] == r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdsa::derive_public_key_compressed;

    const KEY: [u8; 32] = [
        0x12, 0xb0, 0x04, 0xff, 0xf7, 0xf4, 0xb6, 0x9e, 0xf8, 0x65, 0x0e, 0x76, 0x7f, 0x18, 0xf1,
        0x1e, 0xde, 0x15, 0x81, 0x48, 0xb4, 0x25, 0x66, 0x07, 0x23, 0xb9, 0xf9, 0xa6, 0x6e, 0x61,
        0xf7, 0x47,
    ];

    #[test]
    fn test_sign_verify_round_trip() {
        let public_key = derive_public_key_compressed(&KEY).unwrap();
        for message in [&b"schnorr"[..], b"", b"another message"] {
            let digest = sha256(message);
            let signature = sign_message_hash_schnorr(&KEY, &digest).unwrap();
            assert!(verify_signature_schnorr(&signature, &public_key, &digest));
        }
    }

    #[test]
    fn test_verify_accepts_uncompressed_key_encoding() {
        // The challenge always uses the compressed form, so verification
        // succeeds no matter how the caller encodes the key.
        let digest = sha256(b"key form");
        let signature = sign_message_hash_schnorr(&KEY, &digest).unwrap();
        let uncompressed = crate::crypto::ecdsa::derive_public_key_uncompressed(&KEY).unwrap();
        assert!(verify_signature_schnorr(&signature, &uncompressed, &digest));
    }

    #[test]
    fn test_verify_rejects_mutations() {
        let public_key = derive_public_key_compressed(&KEY).unwrap();
        let digest = sha256(b"mutation");
        let signature = sign_message_hash_schnorr(&KEY, &digest).unwrap();
        for index in [0, 31, 32, 63] {
            let mut mutated = signature;
            mutated[index] ^= 0x01;
            assert!(!verify_signature_schnorr(&mutated, &public_key, &digest));
        }
        let other = sha256(b"different digest");
        assert!(!verify_signature_schnorr(&signature, &public_key, &other));
    }

    #[test]
    fn test_verify_rejects_bad_shapes() {
        let public_key = derive_public_key_compressed(&KEY).unwrap();
        let digest = sha256(b"shape");
        assert!(!verify_signature_schnorr(&[0u8; 63], &public_key, &digest));
        assert!(!verify_signature_schnorr(&[0u8; 65], &public_key, &digest));
        // s >= n
        let mut signature = [0xffu8; 64];
        signature[..32].copy_from_slice(&[0x01; 32]);
        assert!(!verify_signature_schnorr(&signature, &public_key, &digest));
        // r >= p
        let mut signature = [0x01u8; 64];
        signature[..32].copy_from_slice(&[0xff; 32]);
        assert!(!verify_signature_schnorr(&signature, &public_key, &digest));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let digest = sha256(b"determinism");
        let first = sign_message_hash_schnorr(&KEY, &digest).unwrap();
        let second = sign_message_hash_schnorr(&KEY, &digest).unwrap();
        assert_eq!(first, second);
    }
}
