//! Error types for script evaluation and the cryptographic surface

use thiserror::Error;

/// Script evaluation errors.
///
/// This is a closed enumeration: the first error encountered is stored in
/// the evaluation state and every subsequent handler becomes an identity
/// transition. Errors are data, not exceptions. Each kind carries a stable
/// identifier string surfaced to debuggers via [`ScriptError::identifier`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script ends with a malformed push instruction")]
    MalformedPush,

    #[error("script ended inside an unclosed conditional")]
    UnbalancedConditional,

    #[error("attempted to read from an empty stack")]
    EmptyStack,

    #[error("stack index is out of range")]
    InvalidStackIndex,

    #[error("combined stack depth exceeds 1000 items")]
    ExceededMaximumStackDepth,

    #[error("stack element exceeds 520 bytes")]
    ExceededMaximumElementSize,

    #[error("operation count exceeds 201")]
    ExceededMaximumOperationCount,

    #[error("opcode is beyond the executable opcode range")]
    ExceededMaximumOpcode,

    #[error("opcode is disabled")]
    DisabledOpcode,

    #[error("opcode is unknown")]
    UnknownOpcode,

    #[error("operand must be a non-negative number")]
    InvalidNaturalNumber,

    #[error("script number is not minimally encoded")]
    NonMinimallyEncodedScriptNumber,

    #[error("script number operand is too long")]
    ExceededMaximumScriptNumberLength,

    #[error("division by zero")]
    DivisionByZero,

    #[error("bitwise operands differ in length")]
    MismatchedBitwiseOperandLength,

    #[error("split index is out of range")]
    InvalidSplitIndex,

    #[error("public key count exceeds 20")]
    ExceedsMaximumMultisigPublicKeyCount,

    #[error("required signature count exceeds the public key count")]
    InsufficientPublicKeys,

    #[error("protocol bug value must be an empty byte string")]
    InvalidProtocolBugValue,

    #[error("public key is not validly encoded")]
    InvalidPublicKeyEncoding,

    #[error("signature is not validly encoded")]
    InvalidSignatureEncoding,

    #[error("schnorr-sized signature in OP_CHECKMULTISIG")]
    SchnorrSizedSignatureInCheckMultiSig,

    #[error("non-null signature failed verification")]
    NonNullSignatureFailure,

    #[error("lock time requirement is not satisfied")]
    UnsatisfiedLocktime,

    #[error("sequence number requirement is not satisfied")]
    UnsatisfiedSequenceNumber,

    #[error("OP_VERIFY failed")]
    FailedVerify,

    #[error("OP_RETURN was called")]
    CalledReturn,
}

impl ScriptError {
    /// Stable identifier for debuggers and test harnesses.
    pub fn identifier(&self) -> &'static str {
        match self {
            ScriptError::MalformedPush => "malformedPush",
            ScriptError::UnbalancedConditional => "unbalancedConditional",
            ScriptError::EmptyStack => "emptyStack",
            ScriptError::InvalidStackIndex => "invalidStackIndex",
            ScriptError::ExceededMaximumStackDepth => "exceededMaximumStackDepth",
            ScriptError::ExceededMaximumElementSize => "exceededMaximumElementSize",
            ScriptError::ExceededMaximumOperationCount => "exceededMaximumOperationCount",
            ScriptError::ExceededMaximumOpcode => "exceededMaximumOpcode",
            ScriptError::DisabledOpcode => "disabledOpcode",
            ScriptError::UnknownOpcode => "unknownOpcode",
            ScriptError::InvalidNaturalNumber => "invalidNaturalNumber",
            ScriptError::NonMinimallyEncodedScriptNumber => "nonMinimallyEncodedScriptNumber",
            ScriptError::ExceededMaximumScriptNumberLength => "exceededMaximumScriptNumberLength",
            ScriptError::DivisionByZero => "divisionByZero",
            ScriptError::MismatchedBitwiseOperandLength => "mismatchedBitwiseOperandLength",
            ScriptError::InvalidSplitIndex => "invalidSplitIndex",
            ScriptError::ExceedsMaximumMultisigPublicKeyCount => {
                "exceedsMaximumMultisigPublicKeyCount"
            }
            ScriptError::InsufficientPublicKeys => "insufficientPublicKeys",
            ScriptError::InvalidProtocolBugValue => "invalidProtocolBugValue",
            ScriptError::InvalidPublicKeyEncoding => "invalidPublicKeyEncoding",
            ScriptError::InvalidSignatureEncoding => "invalidSignatureEncoding",
            ScriptError::SchnorrSizedSignatureInCheckMultiSig => {
                "schnorrSizedSignatureInCheckMultiSig"
            }
            ScriptError::NonNullSignatureFailure => "nonNullSignatureFailure",
            ScriptError::UnsatisfiedLocktime => "unsatisfiedLocktime",
            ScriptError::UnsatisfiedSequenceNumber => "unsatisfiedSequenceNumber",
            ScriptError::FailedVerify => "failedVerify",
            ScriptError::CalledReturn => "calledReturn",
        }
    }
}

/// Errors from the secp256k1 primitive surface.
///
/// Verification functions never return these: they report `false` on any
/// malformed input. Signing, derivation, and tweak operations surface them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    #[error("private key must be 32 bytes")]
    InvalidPrivateKeyLength,

    #[error("private key is outside the range [1, n)")]
    InvalidPrivateKey,

    #[error("public key encoding is malformed")]
    MalformedPublicKey,

    #[error("signature encoding is malformed")]
    MalformedSignature,

    #[error("message hash must be 32 bytes")]
    InvalidMessageHashLength,

    #[error("tweak is outside the valid scalar range")]
    InvalidTweak,

    #[error("operation would produce an invalid key")]
    InvalidResultingKey,

    #[error("could not derive a signing nonce")]
    NonceDerivationFailure,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
