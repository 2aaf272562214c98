//! Reusable stack-manipulation helpers for opcode handlers
//!
//! Every helper records its failure in the state and returns `None`, so a
//! handler body reads as a straight-line sequence of `let Some(..) =
//! helper(state) else { return }` steps with no separate error plumbing.

use crate::bch::state::ScriptState;
use crate::constants::{MAX_OPERATION_COUNT, MAX_SCRIPT_ELEMENT_SIZE, MAX_STACK_DEPTH};
use crate::error::ScriptError;
use crate::script_num::decode_script_number;
use crate::types::ByteString;
use crate::vm::Operation;

/// Pop the top stack element, or record `emptyStack`.
pub fn pop_one(state: &mut ScriptState) -> Option<ByteString> {
    match state.stack.pop() {
        Some(item) => Some(item),
        None => {
            state.fail(ScriptError::EmptyStack);
            None
        }
    }
}

/// Pop the top two stack elements. Returns `(a, b)` where `b` was on top.
pub fn pop_two(state: &mut ScriptState) -> Option<(ByteString, ByteString)> {
    let b = pop_one(state)?;
    let a = pop_one(state)?;
    Some((a, b))
}

/// Pop the top three stack elements. Returns `(a, b, c)` where `c` was on
/// top.
pub fn pop_three(state: &mut ScriptState) -> Option<(ByteString, ByteString, ByteString)> {
    let c = pop_one(state)?;
    let b = pop_one(state)?;
    let a = pop_one(state)?;
    Some((a, b, c))
}

/// Pop and decode a script number of at most `max_length` bytes.
pub fn pop_script_number(
    state: &mut ScriptState,
    require_minimal: bool,
    max_length: usize,
) -> Option<i64> {
    let item = pop_one(state)?;
    match decode_script_number(&item, require_minimal, max_length) {
        Ok(value) => Some(value),
        Err(error) => {
            state.fail(error);
            None
        }
    }
}

/// Push an element, enforcing the 520-byte element cap and the 1000-item
/// combined stack depth cap.
pub fn push_to_stack(state: &mut ScriptState, item: ByteString) {
    if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
        state.fail(ScriptError::ExceededMaximumElementSize);
        return;
    }
    if state.stack.len() + state.alternate_stack.len() >= MAX_STACK_DEPTH {
        state.fail(ScriptError::ExceededMaximumStackDepth);
        return;
    }
    state.stack.push(item);
}

/// Push onto the alternate stack, under the same caps.
pub fn push_to_alternate_stack(state: &mut ScriptState, item: ByteString) {
    if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
        state.fail(ScriptError::ExceededMaximumElementSize);
        return;
    }
    if state.stack.len() + state.alternate_stack.len() >= MAX_STACK_DEPTH {
        state.fail(ScriptError::ExceededMaximumStackDepth);
        return;
    }
    state.alternate_stack.push(item);
}

/// Charge `count` operations against the consensus cap of 201.
pub fn increment_operation_count(state: &mut ScriptState, count: usize) {
    state.operation_count += count;
    if state.operation_count > MAX_OPERATION_COUNT {
        state.fail(ScriptError::ExceededMaximumOperationCount);
    }
}

/// Sequential composition of two operations, short-circuiting on error.
/// Used for the `*VERIFY` opcode variants.
pub fn combine_operations(
    first: impl Fn(&mut ScriptState) + Send + Sync + 'static,
    second: impl Fn(&mut ScriptState) + Send + Sync + 'static,
) -> Operation<ScriptState> {
    Box::new(move |state| {
        first(state);
        if state.error.is_none() {
            second(state);
        }
    })
}
