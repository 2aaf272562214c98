//! Cryptographic primitives for script evaluation
//!
//! Hash functions are pure and safe for concurrent use. The secp256k1
//! surface lives in [`ecdsa`] and [`schnorr`]; its shared verification
//! context is built on first use and reused for the lifetime of the
//! process (context construction is the only initialization point).
//!
//! For incremental hashing, the underlying RustCrypto hasher types are
//! re-exported: construct one, feed it with `update`, and `finalize`.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

pub mod ecdsa;
pub mod schnorr;

pub use ripemd::Digest;
pub use ripemd::Ripemd160 as Ripemd160Hasher;
pub use sha1::Sha1 as Sha1Hasher;
pub use sha2::Sha256 as Sha256Hasher;
pub use sha2::Sha512 as Sha512Hasher;

/// SHA-1 digest of `input`.
pub fn sha1(input: &[u8]) -> [u8; 20] {
    Sha1::digest(input).into()
}

/// SHA-256 digest of `input`.
pub fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// SHA-512 digest of `input`.
pub fn sha512(input: &[u8]) -> [u8; 64] {
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&Sha512::digest(input));
    digest
}

/// RIPEMD-160 digest of `input`.
pub fn ripemd160(input: &[u8]) -> [u8; 20] {
    Ripemd160::digest(input).into()
}

/// Double SHA-256: `sha256(sha256(input))`.
pub fn hash256(input: &[u8]) -> [u8; 32] {
    sha256(&sha256(input))
}

/// RIPEMD-160 of SHA-256: `ripemd160(sha256(input))`.
pub fn hash160(input: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(input))
}

/// Cryptographic capabilities consumed by the crypto opcodes.
///
/// The BCH instruction set takes an implementation at construction time,
/// so tests can substitute deterministic stubs and callers can swap the
/// backing implementation without touching the VM. Implementations must be
/// safe for concurrent read-only use across parallel evaluations.
pub trait CryptoProvider: Send + Sync {
    fn ripemd160(&self, input: &[u8]) -> [u8; 20];
    fn sha1(&self, input: &[u8]) -> [u8; 20];
    fn sha256(&self, input: &[u8]) -> [u8; 32];
    fn hash160(&self, input: &[u8]) -> [u8; 20];
    fn hash256(&self, input: &[u8]) -> [u8; 32];

    /// Verify a strict-DER ECDSA signature (without sighash byte) over a
    /// 32-byte digest. Must reject high-S signatures and never panic on
    /// malformed input.
    fn verify_ecdsa_low_s(&self, signature_der: &[u8], public_key: &[u8], digest: &[u8; 32])
        -> bool;

    /// Verify a 64-byte BCH Schnorr signature over a 32-byte digest.
    fn verify_schnorr(&self, signature: &[u8], public_key: &[u8], digest: &[u8; 32]) -> bool;
}

/// [`CryptoProvider`] backed by the native sha2/ripemd/secp256k1 stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCrypto;

impl CryptoProvider for NativeCrypto {
    fn ripemd160(&self, input: &[u8]) -> [u8; 20] {
        ripemd160(input)
    }

    fn sha1(&self, input: &[u8]) -> [u8; 20] {
        sha1(input)
    }

    fn sha256(&self, input: &[u8]) -> [u8; 32] {
        sha256(input)
    }

    fn hash160(&self, input: &[u8]) -> [u8; 20] {
        hash160(input)
    }

    fn hash256(&self, input: &[u8]) -> [u8; 32] {
        hash256(input)
    }

    fn verify_ecdsa_low_s(
        &self,
        signature_der: &[u8],
        public_key: &[u8],
        digest: &[u8; 32],
    ) -> bool {
        ecdsa::verify_signature_der_low_s(signature_der, public_key, digest)
    }

    fn verify_schnorr(&self, signature: &[u8], public_key: &[u8], digest: &[u8; 32]) -> bool {
        schnorr::verify_signature_schnorr(signature, public_key, digest)
    }
}
