//! BCH signing serialization (sighash)
//!
//! Builds the byte preimage a transaction signature commits to, following
//! BIP143 extended with the BCH FORKID flag. The digest that is actually
//! signed is the double SHA-256 of the preimage. A one-bit deviation here
//! rejects valid transactions or accepts invalid ones, so every numeric
//! field is little-endian and every length prefix uses the standard
//! compact-size rule.

use serde::{Deserialize, Serialize};

use crate::crypto::hash256;
use crate::serialization::write_compact_size;
use crate::types::{ByteString, Hash, TransactionContext};

/// Sighash-type byte.
///
/// Bit layout (lsb = 0): bits 0-1 encode the base type (`ALL` = 1,
/// `NONE` = 2, `SINGLE` = 3), bit 6 is `FORKID` (mandatory on BCH), bit 7
/// is `ANYONECANPAY`. Any other bit set makes the byte invalid for
/// transaction signatures. The raw byte is preserved exactly for preimage
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(pub u8);

impl SighashType {
    /// Base type: sign all outputs
    pub const ALL: u8 = 0x01;
    /// Base type: sign no outputs
    pub const NONE: u8 = 0x02;
    /// Base type: sign only the corresponding output
    pub const SINGLE: u8 = 0x03;
    /// BCH replay-protection flag, mandatory for transaction signatures
    pub const FORKID: u8 = 0x40;
    /// Only the signing input is committed to
    pub const ANYONECANPAY: u8 = 0x80;

    pub const ALL_FORKID: Self = SighashType(0x41);
    pub const NONE_FORKID: Self = SighashType(0x42);
    pub const SINGLE_FORKID: Self = SighashType(0x43);
    pub const ALL_FORKID_ANYONECANPAY: Self = SighashType(0xc1);
    pub const NONE_FORKID_ANYONECANPAY: Self = SighashType(0xc2);
    pub const SINGLE_FORKID_ANYONECANPAY: Self = SighashType(0xc3);

    /// Wrap a raw sighash byte, preserving its exact value.
    pub fn from_byte(byte: u8) -> Self {
        SighashType(byte)
    }

    /// Raw byte value, widened for preimage serialization.
    pub fn as_u32(&self) -> u32 {
        self.0 as u32
    }

    /// Base sighash type (bits 0-1).
    pub fn base_type(&self) -> u8 {
        self.0 & 0x03
    }

    /// Whether the FORKID bit is set.
    pub fn has_forkid(&self) -> bool {
        self.0 & Self::FORKID != 0
    }

    /// Whether the ANYONECANPAY bit is set.
    pub fn is_anyone_can_pay(&self) -> bool {
        self.0 & Self::ANYONECANPAY != 0
    }

    /// Whether the base type signs all outputs.
    pub fn is_all(&self) -> bool {
        self.base_type() == Self::ALL
    }

    /// Whether the base type is SIGHASH_NONE.
    pub fn is_none(&self) -> bool {
        self.base_type() == Self::NONE
    }

    /// Whether the base type is SIGHASH_SINGLE.
    pub fn is_single(&self) -> bool {
        self.base_type() == Self::SINGLE
    }

    /// Whether this byte is valid for a BCH transaction signature: a
    /// defined base type, the FORKID bit set, and no undefined bits.
    pub fn is_valid(&self) -> bool {
        let base = self.base_type();
        base >= Self::ALL
            && base <= Self::SINGLE
            && self.has_forkid()
            && self.0 & !(0x03 | Self::FORKID | Self::ANYONECANPAY) == 0
    }
}

/// `hashPrevouts`: double SHA-256 of all input outpoints, or zeroes under
/// ANYONECANPAY.
pub fn hash_prevouts(context: &TransactionContext, sighash_type: SighashType) -> Hash {
    if sighash_type.is_anyone_can_pay() {
        [0u8; 32]
    } else {
        hash256(&context.transaction_outpoints)
    }
}

/// `hashSequence`: double SHA-256 of all input sequence numbers, or zeroes
/// under ANYONECANPAY, SINGLE, or NONE.
pub fn hash_sequence(context: &TransactionContext, sighash_type: SighashType) -> Hash {
    if !sighash_type.is_anyone_can_pay() && sighash_type.is_all() {
        hash256(&context.transaction_sequence_numbers)
    } else {
        [0u8; 32]
    }
}

/// `hashOutputs`: double SHA-256 of all outputs; under SINGLE, of the
/// corresponding output only (zeroes when there is none); zeroes under
/// NONE.
pub fn hash_outputs(context: &TransactionContext, sighash_type: SighashType) -> Hash {
    if sighash_type.is_all() {
        hash256(&context.transaction_outputs)
    } else if sighash_type.is_single() {
        match &context.corresponding_output {
            Some(output) => hash256(output),
            None => [0u8; 32],
        }
    } else {
        [0u8; 32]
    }
}

/// Assemble the signing-serialization preimage for one input.
///
/// `covered_bytecode` is the executing script sliced after the last
/// OP_CODESEPARATOR; it is written with a compact-size length prefix.
pub fn generate_signing_serialization(
    context: &TransactionContext,
    covered_bytecode: &[u8],
    sighash_type: SighashType,
) -> ByteString {
    let mut preimage = ByteString::with_capacity(157 + covered_bytecode.len());
    preimage.extend_from_slice(&context.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts(context, sighash_type));
    preimage.extend_from_slice(&hash_sequence(context, sighash_type));
    preimage.extend_from_slice(&context.outpoint_transaction_hash);
    preimage.extend_from_slice(&context.outpoint_index.to_le_bytes());
    write_compact_size(&mut preimage, covered_bytecode.len() as u64);
    preimage.extend_from_slice(covered_bytecode);
    preimage.extend_from_slice(&context.output_value.to_le_bytes());
    preimage.extend_from_slice(&context.sequence_number.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs(context, sighash_type));
    preimage.extend_from_slice(&context.locktime.to_le_bytes());
    preimage.extend_from_slice(&sighash_type.as_u32().to_le_bytes());
    preimage
}

/// The digest a signature commits to: double SHA-256 of the preimage.
pub fn signing_serialization_digest(
    context: &TransactionContext,
    covered_bytecode: &[u8],
    sighash_type: SighashType,
) -> Hash {
    hash256(&generate_signing_serialization(
        context,
        covered_bytecode,
        sighash_type,
    ))
}
