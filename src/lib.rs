//! # bchvm
//!
//! Script authentication virtual machine for the BCH instruction set.
//!
//! The crate provides the consensus-critical core of transaction
//! authentication: a generic bytecode stack machine, the cryptographic
//! primitives its opcodes depend on (SHA-1/SHA-256/RIPEMD-160, ECDSA and
//! Schnorr over secp256k1), and the BIP143-with-forkid signing
//! serialization that binds signatures to their transaction context. It
//! evaluates one input script against one previous output script; wire
//! parsing, block validation, and policy live elsewhere.
//!
//! ## Architecture
//!
//! - [`vm`] - the generic machine, parameterized over an instruction set
//! - [`bch`] - the concrete BCH instruction set, state, and opcode
//!   handlers
//! - [`crypto`] - hashes, ECDSA, and BCH Schnorr primitives
//! - [`signing_serialization`] - the sighash preimage and digest
//! - [`instruction`], [`script_num`], [`encoding`] - the codecs and
//!   validators the opcode handlers are built from
//!
//! ## Design principles
//!
//! 1. **Errors are data**: evaluation errors are recorded in the state and
//!    short-circuit the remaining steps; nothing panics on untrusted input.
//! 2. **Bit-exact consensus behavior**: the sighash algorithm and
//!    signature rules match the reference node implementations exactly.
//! 3. **Capabilities over globals**: crypto implementations are supplied
//!    when the instruction set is constructed, so tests can substitute
//!    deterministic stubs.
//!
//! ## Usage
//!
//! ```rust
//! use bchvm::bch::{standard_vm, Program};
//! use bchvm::types::TransactionContext;
//!
//! let vm = standard_vm();
//! // 2 3 OP_ADD 5 OP_NUMEQUAL
//! let program = Program::from_bytecode(
//!     &[0x52, 0x53, 0x93, 0x55, 0x9c],
//!     TransactionContext::default(),
//! );
//! let state = vm.evaluate(&program);
//! assert!(vm.verify(&state));
//! ```

pub mod bch;
pub mod constants;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod instruction;
pub mod opcodes;
pub mod script_num;
pub mod serialization;
pub mod signing_serialization;
pub mod types;
pub mod vm;

pub use bch::{standard_vm, verify_spend, BchInstructionSet, Options, Program, ScriptState};
pub use error::{CryptoError, Result, ScriptError};
pub use instruction::{parse_script, serialize_instructions, Instruction};
pub use signing_serialization::SighashType;
pub use types::{ByteString, Hash, TransactionContext};
pub use vm::{AuthVm, InstructionSet, Operation};
