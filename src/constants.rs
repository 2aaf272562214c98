//! Consensus constants for BCH script evaluation

/// Maximum script length in bytes
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum size of a single stack element in bytes
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum combined depth of the stack and alternate stack
pub const MAX_STACK_DEPTH: usize = 1000;

/// Maximum number of non-push operations executed per script
pub const MAX_OPERATION_COUNT: usize = 201;

/// Maximum number of public keys accepted by OP_CHECKMULTISIG
pub const MAX_PUBLIC_KEYS_PER_MULTISIG: i64 = 20;

/// Length of a Schnorr signature without the sighash-type byte
pub const SCHNORR_SIGNATURE_LENGTH: usize = 64;

/// Maximum operand length for arithmetic script numbers
pub const MAX_SCRIPT_NUMBER_LENGTH: usize = 4;

/// Operand length accepted by OP_CHECKLOCKTIMEVERIFY / OP_CHECKSEQUENCEVERIFY
///
/// Lock times are u32 values, so a full-range comparison needs five
/// sign-magnitude bytes.
pub const LOCKTIME_SCRIPT_NUMBER_LENGTH: usize = 5;

/// Lock time threshold: values below this are block heights, values at or
/// above it are UNIX timestamps
pub const LOCKTIME_THRESHOLD: i64 = 500_000_000;

/// Sequence number that disables lock time enforcement for its input
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Sequence-number bit that disables relative lock time (BIP68)
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// Sequence-number bit selecting time-based rather than height-based
/// relative lock time (BIP68)
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// Mask extracting the relative lock time value from a sequence number
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000ffff;
