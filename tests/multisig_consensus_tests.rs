//! OP_CHECKMULTISIG consensus limits
//!
//! Key-count bounds, the per-key operation charge, negative operands, and
//! degenerate 0-of-N scripts.

use bchvm::bch::{standard_vm, Program};
use bchvm::instruction::{serialize_instructions, Instruction};
use bchvm::opcodes::*;
use bchvm::script_num::encode_script_number;
use bchvm::types::TransactionContext;
use bchvm::ScriptError;

fn evaluate(bytecode: &[u8]) -> bchvm::ScriptState {
    let vm = standard_vm();
    vm.evaluate(&Program::from_bytecode(
        bytecode,
        TransactionContext::default(),
    ))
}

#[test]
fn zero_of_zero_multisig_succeeds() {
    // 0 0 0 CHECKMULTISIG: no signatures required, bug value empty.
    let state = evaluate(&[OP_0, OP_0, OP_0, OP_CHECKMULTISIG]);
    assert_eq!(state.error, None);
    assert_eq!(state.stack, vec![vec![0x01]]);
}

#[test]
fn zero_of_n_ignores_the_keys() {
    let key = vec![0x02; 33];
    let bytecode = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::Op(OP_0),
        Instruction::push(key.clone()),
        Instruction::push(key),
        Instruction::Op(OP_2),
        Instruction::Op(OP_CHECKMULTISIG),
    ]);
    let state = evaluate(&bytecode);
    assert_eq!(state.error, None);
    assert_eq!(state.stack, vec![vec![0x01]]);
}

#[test]
fn public_key_count_above_twenty_errors() {
    let mut instructions = vec![Instruction::Op(OP_0), Instruction::Op(OP_0)];
    for _ in 0..21 {
        instructions.push(Instruction::push(vec![0x02; 33]));
    }
    instructions.push(Instruction::push(encode_script_number(21)));
    instructions.push(Instruction::Op(OP_CHECKMULTISIG));
    let state = evaluate(&serialize_instructions(&instructions));
    assert_eq!(
        state.error,
        Some(ScriptError::ExceedsMaximumMultisigPublicKeyCount)
    );
}

#[test]
fn negative_public_key_count_errors() {
    let bytecode = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::Op(OP_0),
        Instruction::Op(OP_1NEGATE),
        Instruction::Op(OP_CHECKMULTISIG),
    ]);
    let state = evaluate(&bytecode);
    assert_eq!(state.error, Some(ScriptError::InvalidNaturalNumber));
}

#[test]
fn required_signatures_above_key_count_errors() {
    let key = vec![0x02; 33];
    let bytecode = serialize_instructions(&[
        Instruction::Op(OP_0),
        Instruction::Op(OP_0),
        Instruction::Op(OP_0),
        Instruction::Op(OP_2),
        Instruction::push(key),
        Instruction::Op(OP_1),
        Instruction::Op(OP_CHECKMULTISIG),
    ]);
    let state = evaluate(&bytecode);
    assert_eq!(state.error, Some(ScriptError::InsufficientPublicKeys));
}

#[test]
fn listed_keys_charge_the_operation_budget() {
    // 10 CHECKMULTISIGs with 20 keys each: 10 * (1 + 20) = 210 > 201.
    let mut instructions = Vec::new();
    instructions.push(Instruction::Op(OP_1));
    for _ in 0..10 {
        instructions.push(Instruction::Op(OP_0));
        instructions.push(Instruction::Op(OP_0));
        for _ in 0..20 {
            instructions.push(Instruction::push(vec![0x02; 33]));
        }
        instructions.push(Instruction::push(encode_script_number(20)));
        instructions.push(Instruction::Op(OP_CHECKMULTISIG));
        instructions.push(Instruction::Op(OP_DROP));
    }
    let state = evaluate(&serialize_instructions(&instructions));
    assert_eq!(
        state.error,
        Some(ScriptError::ExceededMaximumOperationCount)
    );
}

#[test]
fn missing_bug_value_is_an_empty_stack_error() {
    // N=0, M=0 but nothing underneath for the bug value pop.
    let state = evaluate(&[OP_0, OP_0, OP_CHECKMULTISIG]);
    assert_eq!(state.error, Some(ScriptError::EmptyStack));
}
