//! End-to-end virtual machine scenarios
//!
//! Exercises the generic driver loop over a minimal custom instruction
//! set, then the full BCH set against real signatures: P2PKH success and
//! failure, multisig with the protocol bug value, element-size caps, and
//! the operation-count budget.

use std::sync::Arc;

use bchvm::bch::{standard_vm, verify_spend, BchInstructionSet, Options, Program};
use bchvm::crypto::ecdsa::{derive_public_key_compressed, sign_message_hash_der};
use bchvm::crypto::{hash160, schnorr::sign_message_hash_schnorr, NativeCrypto};
use bchvm::instruction::{serialize_instructions, Instruction};
use bchvm::opcodes::*;
use bchvm::signing_serialization::{signing_serialization_digest, SighashType};
use bchvm::types::{ByteString, TransactionContext};
use bchvm::vm::{AuthVm, InstructionSet, Operation};
use bchvm::ScriptError;

// ============================================================================
// S1: a minimal custom instruction set over its own state type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct CounterState {
    instructions: Vec<u8>,
    ip: usize,
    stack: Vec<i64>,
}

/// Four opcodes: 0 pushes zero, 1 increments, 2 decrements, 3 adds.
struct CounterSet {
    operations: Vec<Option<Operation<CounterState>>>,
}

impl CounterSet {
    fn new() -> Self {
        let mut operations: Vec<Option<Operation<CounterState>>> = Vec::new();
        operations.push(Some(Box::new(|state: &mut CounterState| {
            state.stack.push(0);
        })));
        operations.push(Some(Box::new(|state: &mut CounterState| {
            if let Some(top) = state.stack.last_mut() {
                *top += 1;
            }
        })));
        operations.push(Some(Box::new(|state: &mut CounterState| {
            if let Some(top) = state.stack.last_mut() {
                *top -= 1;
            }
        })));
        operations.push(Some(Box::new(|state: &mut CounterState| {
            if let (Some(b), Some(a)) = (state.stack.pop(), state.stack.pop()) {
                state.stack.push(a + b);
            }
        })));
        CounterSet { operations }
    }
}

impl InstructionSet for CounterSet {
    type Program = Vec<u8>;
    type State = CounterState;

    fn initial_state(&self, program: &Vec<u8>) -> CounterState {
        CounterState {
            instructions: program.clone(),
            ip: 0,
            stack: Vec::new(),
        }
    }

    fn can_continue(&self, state: &CounterState) -> bool {
        state.ip < state.instructions.len()
    }

    fn next_opcode(&self, state: &mut CounterState) -> Option<u8> {
        let opcode = *state.instructions.get(state.ip)?;
        state.ip += 1;
        Some(opcode)
    }

    fn operation(&self, opcode: u8) -> Option<&Operation<CounterState>> {
        self.operations.get(opcode as usize)?.as_ref()
    }

    fn undefined(&self, _state: &mut CounterState) {}

    fn verify(&self, state: &CounterState) -> bool {
        state.stack.last().is_some_and(|top| *top != 0)
    }
}

#[test]
fn s1_minimal_instruction_set_evaluate() {
    let vm = AuthVm::new(CounterSet::new());
    let program = vec![0, 1, 1, 0, 2, 3];
    let state = vm.evaluate(&program);
    assert_eq!(state.ip, 6);
    assert_eq!(state.stack, vec![1]);
    assert!(vm.verify(&state));
}

#[test]
fn s1_minimal_instruction_set_debug() {
    let vm = AuthVm::new(CounterSet::new());
    let program = vec![0, 1, 1, 0, 2, 3];
    let trace = vm.debug(&program);
    assert_eq!(trace.len(), 7);
    let terminal = &trace[6];
    assert_eq!(terminal.ip, 6);
    assert_eq!(terminal.stack, vec![1]);
    // The final step is an identity transition.
    assert_eq!(trace[5], trace[6]);
    // Intermediate states show the run in progress.
    assert_eq!(trace[0].stack, vec![0]);
    assert_eq!(trace[2].stack, vec![2]);
    assert_eq!(trace[4].stack, vec![2, -1]);
}

// ============================================================================
// P2PKH scenarios (S2, S3)
// ============================================================================

const KEY: [u8; 32] = [
    0x70, 0x1e, 0x2c, 0xcb, 0x11, 0xfb, 0x72, 0x1b, 0x4c, 0xf6, 0x7e, 0x41, 0x78, 0x7a, 0x54,
    0x0c, 0x25, 0x86, 0x06, 0x10, 0x7d, 0x5b, 0x05, 0x13, 0x0d, 0x82, 0x1b, 0x97, 0x01, 0x85,
    0x22, 0x9a,
];

fn test_context() -> TransactionContext {
    TransactionContext {
        version: 2,
        transaction_outpoints: vec![0x11; 36],
        transaction_sequence_numbers: vec![0xff, 0xff, 0xff, 0xff],
        outpoint_transaction_hash: [0x22; 32],
        outpoint_index: 0,
        output_value: 10_000,
        sequence_number: 0xffffffff,
        corresponding_output: Some(vec![0x33; 34]),
        transaction_outputs: vec![0x33; 34],
        locktime: 0,
    }
}

fn p2pkh_locking_bytecode(public_key: &[u8]) -> ByteString {
    serialize_instructions(&[
        Instruction::Op(OP_DUP),
        Instruction::Op(OP_HASH160),
        Instruction::push(hash160(public_key).to_vec()),
        Instruction::Op(OP_EQUALVERIFY),
        Instruction::Op(OP_CHECKSIG),
    ])
}

fn p2pkh_unlocking_bytecode(
    context: &TransactionContext,
    locking_bytecode: &[u8],
) -> ByteString {
    let digest =
        signing_serialization_digest(context, locking_bytecode, SighashType::ALL_FORKID);
    let mut signature = sign_message_hash_der(&KEY, &digest).unwrap();
    signature.push(SighashType::ALL_FORKID.0);
    let public_key = derive_public_key_compressed(&KEY).unwrap();
    serialize_instructions(&[
        Instruction::push(signature),
        Instruction::push(public_key.to_vec()),
    ])
}

#[test]
fn s2_p2pkh_success() {
    let vm = standard_vm();
    let context = test_context();
    let public_key = derive_public_key_compressed(&KEY).unwrap();
    let locking = p2pkh_locking_bytecode(&public_key);
    let unlocking = p2pkh_unlocking_bytecode(&context, &locking);

    let (state, success) = verify_spend(&vm, &unlocking, &locking, &context);
    assert!(success, "terminal state: {state:?}");
    assert_eq!(state.stack, vec![vec![0x01]]);
    assert_eq!(state.error, None);
}

#[test]
fn s3_p2pkh_fails_when_context_mutated() {
    // Null-signature failures disabled: a failing signature pushes an
    // empty element rather than erroring.
    let vm = AuthVm::new(BchInstructionSet::new(
        Arc::new(NativeCrypto),
        Options {
            require_null_signature_failures: false,
            ..Default::default()
        },
    ));
    let context = test_context();
    let public_key = derive_public_key_compressed(&KEY).unwrap();
    let locking = p2pkh_locking_bytecode(&public_key);
    let unlocking = p2pkh_unlocking_bytecode(&context, &locking);

    // One-bit change to the committed output value invalidates the digest.
    let mutated = TransactionContext {
        output_value: context.output_value + 1,
        ..context
    };
    let (state, success) = verify_spend(&vm, &unlocking, &locking, &mutated);
    assert!(!success);
    assert_eq!(state.error, None);
    assert_eq!(state.stack, vec![ByteString::new()]);
}

#[test]
fn s3_variant_null_signature_failure_under_default_options() {
    let vm = standard_vm();
    let context = test_context();
    let public_key = derive_public_key_compressed(&KEY).unwrap();
    let locking = p2pkh_locking_bytecode(&public_key);
    let unlocking = p2pkh_unlocking_bytecode(&context, &locking);

    let mutated = TransactionContext {
        output_value: context.output_value + 1,
        ..context
    };
    let (state, success) = verify_spend(&vm, &unlocking, &locking, &mutated);
    assert!(!success);
    assert_eq!(state.error, Some(ScriptError::NonNullSignatureFailure));
}

// ============================================================================
// Multisig scenarios (S4)
// ============================================================================

fn multisig_keys() -> Vec<[u8; 32]> {
    vec![[0xa1; 32], [0xb2; 32], [0xc3; 32]]
}

fn multisig_locking_bytecode(keys: &[[u8; 32]]) -> ByteString {
    let mut instructions = vec![Instruction::Op(OP_2)];
    for key in keys {
        instructions.push(Instruction::push(
            derive_public_key_compressed(key).unwrap().to_vec(),
        ));
    }
    instructions.push(Instruction::Op(OP_3));
    instructions.push(Instruction::Op(OP_CHECKMULTISIG));
    serialize_instructions(&instructions)
}

fn transaction_signature(key: &[u8; 32], digest: &[u8; 32]) -> ByteString {
    let mut signature = sign_message_hash_der(key, digest).unwrap();
    signature.push(SighashType::ALL_FORKID.0);
    signature
}

#[test]
fn s4_multisig_null_dummy() {
    let vm = standard_vm();
    let context = test_context();
    let keys = multisig_keys();
    let locking = multisig_locking_bytecode(&keys);
    let digest = signing_serialization_digest(&context, &locking, SighashType::ALL_FORKID);

    let unlocking = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::push(transaction_signature(&keys[0], &digest)),
        Instruction::push(transaction_signature(&keys[1], &digest)),
    ]);
    let (state, success) = verify_spend(&vm, &unlocking, &locking, &context);
    assert!(success, "terminal state: {state:?}");
    assert_eq!(state.stack, vec![vec![0x01]]);

    // A non-empty bug value is a consensus error under the default flags.
    let bad_unlocking = serialize_instructions(&[
        Instruction::Op(OP_1),
        Instruction::push(transaction_signature(&keys[0], &digest)),
        Instruction::push(transaction_signature(&keys[1], &digest)),
    ]);
    let (state, success) = verify_spend(&vm, &bad_unlocking, &locking, &context);
    assert!(!success);
    assert_eq!(state.error, Some(ScriptError::InvalidProtocolBugValue));
}

#[test]
fn s4_variant_signature_order_matters() {
    let vm = standard_vm();
    let context = test_context();
    let keys = multisig_keys();
    let locking = multisig_locking_bytecode(&keys);
    let digest = signing_serialization_digest(&context, &locking, SighashType::ALL_FORKID);

    // Signatures out of key order cannot all match.
    let unlocking = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::push(transaction_signature(&keys[1], &digest)),
        Instruction::push(transaction_signature(&keys[0], &digest)),
    ]);
    let (state, success) = verify_spend(&vm, &unlocking, &locking, &context);
    assert!(!success);
    assert_eq!(state.error, Some(ScriptError::NonNullSignatureFailure));
}

#[test]
fn multisig_rejects_schnorr_sized_signature() {
    let vm = standard_vm();
    let context = test_context();
    let keys = multisig_keys();
    let locking = multisig_locking_bytecode(&keys);
    let digest = signing_serialization_digest(&context, &locking, SighashType::ALL_FORKID);

    let mut schnorr = sign_message_hash_schnorr(&keys[0], &digest).unwrap().to_vec();
    schnorr.push(SighashType::ALL_FORKID.0);
    let unlocking = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::push(schnorr),
        Instruction::push(transaction_signature(&keys[1], &digest)),
    ]);
    let (state, success) = verify_spend(&vm, &unlocking, &locking, &context);
    assert!(!success);
    assert_eq!(
        state.error,
        Some(ScriptError::SchnorrSizedSignatureInCheckMultiSig)
    );
}

// ============================================================================
// Element size cap (S6) and operation budget
// ============================================================================

#[test]
fn s6_element_size_cap() {
    let vm = standard_vm();
    let mut bytecode = vec![OP_PUSHDATA2, 0x09, 0x02]; // 521 bytes, little-endian
    bytecode.extend(std::iter::repeat(0x00).take(521));
    bytecode.push(OP_SIZE);
    let program = Program::from_bytecode(&bytecode, TransactionContext::default());
    let state = vm.evaluate(&program);
    assert_eq!(state.error, Some(ScriptError::ExceededMaximumElementSize));
    // The push itself fails; OP_SIZE is never reached.
    assert_eq!(state.ip, 1);
    assert!(state.stack.is_empty());
}

#[test]
fn element_at_cap_is_accepted() {
    let vm = standard_vm();
    let mut bytecode = vec![OP_PUSHDATA2, 0x08, 0x02]; // exactly 520 bytes
    bytecode.extend(std::iter::repeat(0x00).take(520));
    let program = Program::from_bytecode(&bytecode, TransactionContext::default());
    let state = vm.evaluate(&program);
    assert_eq!(state.error, None);
    assert_eq!(state.stack.len(), 1);
}

#[test]
fn operation_count_errors_at_the_202nd_operation() {
    let vm = standard_vm();
    let mut bytecode = vec![OP_1];
    bytecode.extend(std::iter::repeat(OP_NOP).take(202));
    let program = Program::from_bytecode(&bytecode, TransactionContext::default());
    let state = vm.evaluate(&program);
    assert_eq!(
        state.error,
        Some(ScriptError::ExceededMaximumOperationCount)
    );
    // OP_1 plus 202 NOPs: the error fires on the 202nd non-push opcode.
    assert_eq!(state.ip, 203);
    assert_eq!(state.operation_count, 202);
}

#[test]
fn operation_count_at_the_cap_succeeds() {
    let vm = standard_vm();
    let mut bytecode = vec![OP_1];
    bytecode.extend(std::iter::repeat(OP_NOP).take(201));
    let program = Program::from_bytecode(&bytecode, TransactionContext::default());
    let state = vm.evaluate(&program);
    assert_eq!(state.error, None);
    assert!(vm.verify(&state));
}

#[test]
fn skipped_branches_still_charge_the_operation_budget() {
    let vm = standard_vm();
    let mut bytecode = vec![OP_1, OP_0, OP_IF];
    bytecode.extend(std::iter::repeat(OP_NOP).take(200));
    bytecode.push(OP_ENDIF);
    let program = Program::from_bytecode(&bytecode, TransactionContext::default());
    let state = vm.evaluate(&program);
    // IF + 200 skipped NOPs + ENDIF = 202 operations.
    assert_eq!(
        state.error,
        Some(ScriptError::ExceededMaximumOperationCount)
    );
}
