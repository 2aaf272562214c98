//! Lock time opcodes: OP_CHECKLOCKTIMEVERIFY (BIP65) and
//! OP_CHECKSEQUENCEVERIFY (BIP112)
//!
//! Both inspect the top stack element without popping it and compare it
//! against the transaction context. Lock time operands may be up to five
//! bytes so the full u32 range is expressible.

use crate::bch::state::ScriptState;
use crate::constants::{
    LOCKTIME_SCRIPT_NUMBER_LENGTH, LOCKTIME_THRESHOLD, SEQUENCE_FINAL,
    SEQUENCE_LOCKTIME_DISABLE_FLAG, SEQUENCE_LOCKTIME_MASK, SEQUENCE_LOCKTIME_TYPE_FLAG,
};
use crate::error::ScriptError;
use crate::script_num::decode_script_number;

fn peek_locktime_operand(state: &mut ScriptState, require_minimal: bool) -> Option<i64> {
    let top = match state.stack.last() {
        Some(top) => top,
        None => {
            state.fail(ScriptError::EmptyStack);
            return None;
        }
    };
    match decode_script_number(top, require_minimal, LOCKTIME_SCRIPT_NUMBER_LENGTH) {
        Ok(value) => Some(value),
        Err(error) => {
            state.fail(error);
            None
        }
    }
}

pub fn op_checklocktimeverify(state: &mut ScriptState, require_minimal: bool) {
    let required = match peek_locktime_operand(state, require_minimal) {
        Some(required) => required,
        None => return,
    };
    if required < 0 {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    let locktime = state.context.locktime as i64;
    // Block heights and timestamps are incomparable domains.
    if (required < LOCKTIME_THRESHOLD) != (locktime < LOCKTIME_THRESHOLD) {
        state.fail(ScriptError::UnsatisfiedLocktime);
        return;
    }
    if required > locktime {
        state.fail(ScriptError::UnsatisfiedLocktime);
        return;
    }
    // A final sequence number opts the input out of lock time entirely,
    // which would let the transaction bypass the constraint.
    if state.context.sequence_number == SEQUENCE_FINAL {
        state.fail(ScriptError::UnsatisfiedLocktime);
    }
}

pub fn op_checksequenceverify(state: &mut ScriptState, require_minimal: bool) {
    let required = match peek_locktime_operand(state, require_minimal) {
        Some(required) => required,
        None => return,
    };
    if required < 0 {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    // With the disable flag set in the operand, the opcode is a NOP.
    if required as u32 & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
        return;
    }
    // Relative lock time needs version 2 transactions and an input that
    // has not disabled it.
    if state.context.version < 2 {
        state.fail(ScriptError::UnsatisfiedSequenceNumber);
        return;
    }
    let sequence = state.context.sequence_number;
    if sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
        state.fail(ScriptError::UnsatisfiedSequenceNumber);
        return;
    }
    let required = required as u32;
    if required & SEQUENCE_LOCKTIME_TYPE_FLAG != sequence & SEQUENCE_LOCKTIME_TYPE_FLAG {
        state.fail(ScriptError::UnsatisfiedSequenceNumber);
        return;
    }
    if required & SEQUENCE_LOCKTIME_MASK > sequence & SEQUENCE_LOCKTIME_MASK {
        state.fail(ScriptError::UnsatisfiedSequenceNumber);
    }
}
