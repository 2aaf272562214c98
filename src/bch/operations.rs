//! Constant, flow-control, stack, splice, bitwise, and arithmetic handlers
//!
//! Each handler is a `state -> state` transition that may record an error.
//! Handlers assume the table assembly in [`crate::bch`] has already dealt
//! with operation counting and conditional-branch skipping.

use crate::bch::combinators::{
    pop_one, pop_script_number, pop_three, pop_two, push_to_alternate_stack, push_to_stack,
};
use crate::bch::state::ScriptState;
use crate::constants::{MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_NUMBER_LENGTH};
use crate::error::ScriptError;
use crate::instruction::Instruction;
use crate::script_num::{
    decode_script_boolean, decode_script_number, encode_script_boolean, encode_script_number,
};
use crate::types::ByteString;

fn pop_operand(state: &mut ScriptState, require_minimal: bool) -> Option<i64> {
    pop_script_number(state, require_minimal, MAX_SCRIPT_NUMBER_LENGTH)
}

// ============================================================================
// Constants and pushes
// ============================================================================

/// Handler for every push-data opcode: the payload comes from the
/// instruction under the pointer, not the raw byte stream.
pub fn op_push(state: &mut ScriptState) {
    let instruction = state.current_instruction().cloned();
    match instruction {
        Some(Instruction::Push { data, .. }) => push_to_stack(state, data),
        Some(Instruction::MalformedPush { .. }) => state.fail(ScriptError::MalformedPush),
        _ => state.fail(ScriptError::UnknownOpcode),
    }
}

/// OP_0 and OP_1NEGATE/OP_1..OP_16: push a constant number.
pub fn op_push_number(state: &mut ScriptState, value: i64) {
    push_to_stack(state, encode_script_number(value));
}

// ============================================================================
// Flow control
// ============================================================================

pub fn op_nop(_state: &mut ScriptState) {}

/// Reserved opcodes fail the script when reached.
pub fn op_reserved(state: &mut ScriptState) {
    state.fail(ScriptError::UnknownOpcode);
}

pub fn op_if(state: &mut ScriptState) {
    let condition = if state.executing() {
        match pop_one(state) {
            Some(item) => decode_script_boolean(&item),
            None => return,
        }
    } else {
        false
    };
    state.execution_stack.push(condition);
}

pub fn op_notif(state: &mut ScriptState) {
    let condition = if state.executing() {
        match pop_one(state) {
            Some(item) => !decode_script_boolean(&item),
            None => return,
        }
    } else {
        false
    };
    state.execution_stack.push(condition);
}

pub fn op_else(state: &mut ScriptState) {
    match state.execution_stack.last_mut() {
        Some(branch) => *branch = !*branch,
        None => state.fail(ScriptError::UnbalancedConditional),
    }
}

pub fn op_endif(state: &mut ScriptState) {
    if state.execution_stack.pop().is_none() {
        state.fail(ScriptError::UnbalancedConditional);
    }
}

pub fn op_verify(state: &mut ScriptState) {
    if let Some(item) = pop_one(state) {
        if !decode_script_boolean(&item) {
            state.fail(ScriptError::FailedVerify);
        }
    }
}

pub fn op_return(state: &mut ScriptState) {
    state.fail(ScriptError::CalledReturn);
}

// ============================================================================
// Stack operations
// ============================================================================

pub fn op_toaltstack(state: &mut ScriptState) {
    if let Some(item) = pop_one(state) {
        push_to_alternate_stack(state, item);
    }
}

pub fn op_fromaltstack(state: &mut ScriptState) {
    match state.alternate_stack.pop() {
        Some(item) => push_to_stack(state, item),
        None => state.fail(ScriptError::EmptyStack),
    }
}

pub fn op_2drop(state: &mut ScriptState) {
    pop_two(state);
}

pub fn op_2dup(state: &mut ScriptState) {
    if state.stack.len() < 2 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let a = state.stack[state.stack.len() - 2].clone();
    let b = state.stack[state.stack.len() - 1].clone();
    push_to_stack(state, a);
    push_to_stack(state, b);
}

pub fn op_3dup(state: &mut ScriptState) {
    if state.stack.len() < 3 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let a = state.stack[state.stack.len() - 3].clone();
    let b = state.stack[state.stack.len() - 2].clone();
    let c = state.stack[state.stack.len() - 1].clone();
    push_to_stack(state, a);
    push_to_stack(state, b);
    push_to_stack(state, c);
}

pub fn op_2over(state: &mut ScriptState) {
    if state.stack.len() < 4 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let a = state.stack[state.stack.len() - 4].clone();
    let b = state.stack[state.stack.len() - 3].clone();
    push_to_stack(state, a);
    push_to_stack(state, b);
}

pub fn op_2rot(state: &mut ScriptState) {
    if state.stack.len() < 6 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let base = state.stack.len() - 6;
    let a = state.stack.remove(base);
    let b = state.stack.remove(base);
    state.stack.push(a);
    state.stack.push(b);
}

pub fn op_2swap(state: &mut ScriptState) {
    if state.stack.len() < 4 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let len = state.stack.len();
    state.stack.swap(len - 4, len - 2);
    state.stack.swap(len - 3, len - 1);
}

pub fn op_ifdup(state: &mut ScriptState) {
    match state.stack.last() {
        Some(item) if decode_script_boolean(item) => {
            let item = item.clone();
            push_to_stack(state, item);
        }
        Some(_) => {}
        None => state.fail(ScriptError::EmptyStack),
    }
}

pub fn op_depth(state: &mut ScriptState) {
    let depth = state.stack.len() as i64;
    push_to_stack(state, encode_script_number(depth));
}

pub fn op_drop(state: &mut ScriptState) {
    pop_one(state);
}

pub fn op_dup(state: &mut ScriptState) {
    match state.stack.last() {
        Some(item) => {
            let item = item.clone();
            push_to_stack(state, item);
        }
        None => state.fail(ScriptError::EmptyStack),
    }
}

pub fn op_nip(state: &mut ScriptState) {
    if let Some((_, b)) = pop_two(state) {
        state.stack.push(b);
    }
}

pub fn op_over(state: &mut ScriptState) {
    if state.stack.len() < 2 {
        state.fail(ScriptError::EmptyStack);
        return;
    }
    let item = state.stack[state.stack.len() - 2].clone();
    push_to_stack(state, item);
}

pub fn op_pick(state: &mut ScriptState, require_minimal: bool) {
    let depth = match pop_operand(state, require_minimal) {
        Some(depth) => depth,
        None => return,
    };
    if depth < 0 || depth as usize >= state.stack.len() {
        state.fail(ScriptError::InvalidStackIndex);
        return;
    }
    let item = state.stack[state.stack.len() - 1 - depth as usize].clone();
    push_to_stack(state, item);
}

pub fn op_roll(state: &mut ScriptState, require_minimal: bool) {
    let depth = match pop_operand(state, require_minimal) {
        Some(depth) => depth,
        None => return,
    };
    if depth < 0 || depth as usize >= state.stack.len() {
        state.fail(ScriptError::InvalidStackIndex);
        return;
    }
    let item = state.stack.remove(state.stack.len() - 1 - depth as usize);
    state.stack.push(item);
}

pub fn op_rot(state: &mut ScriptState) {
    if let Some((a, b, c)) = pop_three(state) {
        state.stack.push(b);
        state.stack.push(c);
        state.stack.push(a);
    }
}

pub fn op_swap(state: &mut ScriptState) {
    if let Some((a, b)) = pop_two(state) {
        state.stack.push(b);
        state.stack.push(a);
    }
}

pub fn op_tuck(state: &mut ScriptState) {
    if let Some((a, b)) = pop_two(state) {
        push_to_stack(state, b.clone());
        state.stack.push(a);
        state.stack.push(b);
    }
}

// ============================================================================
// Splice operations
// ============================================================================

pub fn op_cat(state: &mut ScriptState) {
    if let Some((mut a, b)) = pop_two(state) {
        a.extend_from_slice(&b);
        push_to_stack(state, a);
    }
}

pub fn op_split(state: &mut ScriptState, require_minimal: bool) {
    let index = match pop_operand(state, require_minimal) {
        Some(index) => index,
        None => return,
    };
    let data = match pop_one(state) {
        Some(data) => data,
        None => return,
    };
    if index < 0 || index as usize > data.len() {
        state.fail(ScriptError::InvalidSplitIndex);
        return;
    }
    let (left, right) = data.split_at(index as usize);
    let (left, right) = (left.to_vec(), right.to_vec());
    push_to_stack(state, left);
    push_to_stack(state, right);
}

/// Strip a byte string down to its minimal numeric encoding, with no
/// length limit. Negative zero minimizes to the empty string.
fn minimally_encode_number(mut data: ByteString) -> ByteString {
    let Some(&last) = data.last() else {
        return data;
    };
    if last & 0x7f != 0 {
        return data;
    }
    if data.len() == 1 {
        return ByteString::new();
    }
    if data[data.len() - 2] & 0x80 != 0 {
        return data;
    }
    // The top byte carries only the sign; fold it into the highest
    // non-zero byte, keeping an extra byte when that byte needs its high
    // bit for magnitude.
    for index in (0..data.len() - 1).rev() {
        if data[index] != 0 {
            if data[index] & 0x80 != 0 {
                data[index + 1] = last;
                data.truncate(index + 2);
            } else {
                data[index] |= last;
                data.truncate(index + 1);
            }
            return data;
        }
    }
    ByteString::new()
}

pub fn op_num2bin(state: &mut ScriptState, require_minimal: bool) {
    let size = match pop_operand(state, require_minimal) {
        Some(size) => size,
        None => return,
    };
    if size < 0 {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    if size as usize > MAX_SCRIPT_ELEMENT_SIZE {
        state.fail(ScriptError::ExceededMaximumElementSize);
        return;
    }
    let size = size as usize;
    let mut data = match pop_one(state) {
        Some(data) => minimally_encode_number(data),
        None => return,
    };
    if data.len() > size {
        // The requested width cannot represent the value.
        state.fail(ScriptError::ExceededMaximumElementSize);
        return;
    }
    if data.len() < size {
        let sign = match data.last_mut() {
            Some(last) => {
                let sign = *last & 0x80;
                *last &= 0x7f;
                sign
            }
            None => 0x00,
        };
        data.resize(size - 1, 0x00);
        data.push(sign);
    }
    push_to_stack(state, data);
}

pub fn op_bin2num(state: &mut ScriptState) {
    let data = match pop_one(state) {
        Some(data) => minimally_encode_number(data),
        None => return,
    };
    if data.len() > MAX_SCRIPT_NUMBER_LENGTH {
        state.fail(ScriptError::ExceededMaximumScriptNumberLength);
        return;
    }
    push_to_stack(state, data);
}

pub fn op_size(state: &mut ScriptState) {
    match state.stack.last() {
        Some(item) => {
            let length = item.len() as i64;
            push_to_stack(state, encode_script_number(length));
        }
        None => state.fail(ScriptError::EmptyStack),
    }
}

pub fn op_reversebytes(state: &mut ScriptState) {
    if let Some(mut item) = pop_one(state) {
        item.reverse();
        push_to_stack(state, item);
    }
}

// ============================================================================
// Bitwise logic
// ============================================================================

fn bitwise_op(state: &mut ScriptState, combine: impl Fn(u8, u8) -> u8) {
    if let Some((a, b)) = pop_two(state) {
        if a.len() != b.len() {
            state.fail(ScriptError::MismatchedBitwiseOperandLength);
            return;
        }
        let result = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| combine(*x, *y))
            .collect();
        push_to_stack(state, result);
    }
}

pub fn op_and(state: &mut ScriptState) {
    bitwise_op(state, |x, y| x & y);
}

pub fn op_or(state: &mut ScriptState) {
    bitwise_op(state, |x, y| x | y);
}

pub fn op_xor(state: &mut ScriptState) {
    bitwise_op(state, |x, y| x ^ y);
}

pub fn op_invert(state: &mut ScriptState) {
    if let Some(item) = pop_one(state) {
        let result = item.iter().map(|byte| !byte).collect();
        push_to_stack(state, result);
    }
}

pub fn op_equal(state: &mut ScriptState) {
    if let Some((a, b)) = pop_two(state) {
        push_to_stack(state, encode_script_boolean(a == b));
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn unary_numeric_op(state: &mut ScriptState, require_minimal: bool, f: impl Fn(i64) -> i64) {
    if let Some(a) = pop_operand(state, require_minimal) {
        push_to_stack(state, encode_script_number(f(a)));
    }
}

fn binary_numeric_op(state: &mut ScriptState, require_minimal: bool, f: impl Fn(i64, i64) -> i64) {
    let b = match pop_operand(state, require_minimal) {
        Some(b) => b,
        None => return,
    };
    let a = match pop_operand(state, require_minimal) {
        Some(a) => a,
        None => return,
    };
    push_to_stack(state, encode_script_number(f(a, b)));
}

pub fn op_1add(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, |a| a + 1);
}

pub fn op_1sub(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, |a| a - 1);
}

pub fn op_negate(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, |a| -a);
}

pub fn op_abs(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, i64::abs);
}

pub fn op_not(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, |a| i64::from(a == 0));
}

pub fn op_0notequal(state: &mut ScriptState, require_minimal: bool) {
    unary_numeric_op(state, require_minimal, |a| i64::from(a != 0));
}

pub fn op_add(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| a + b);
}

pub fn op_sub(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| a - b);
}

pub fn op_mul(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| a * b);
}

pub fn op_div(state: &mut ScriptState, require_minimal: bool) {
    let b = match pop_operand(state, require_minimal) {
        Some(b) => b,
        None => return,
    };
    let a = match pop_operand(state, require_minimal) {
        Some(a) => a,
        None => return,
    };
    if b == 0 {
        state.fail(ScriptError::DivisionByZero);
        return;
    }
    push_to_stack(state, encode_script_number(a / b));
}

pub fn op_mod(state: &mut ScriptState, require_minimal: bool) {
    let b = match pop_operand(state, require_minimal) {
        Some(b) => b,
        None => return,
    };
    let a = match pop_operand(state, require_minimal) {
        Some(a) => a,
        None => return,
    };
    if b == 0 {
        state.fail(ScriptError::DivisionByZero);
        return;
    }
    push_to_stack(state, encode_script_number(a % b));
}

pub fn op_lshift(state: &mut ScriptState, require_minimal: bool) {
    let b = match pop_operand(state, require_minimal) {
        Some(b) => b,
        None => return,
    };
    let a = match pop_operand(state, require_minimal) {
        Some(a) => a,
        None => return,
    };
    if !(0..=31).contains(&b) {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    push_to_stack(state, encode_script_number(a << b));
}

pub fn op_rshift(state: &mut ScriptState, require_minimal: bool) {
    let b = match pop_operand(state, require_minimal) {
        Some(b) => b,
        None => return,
    };
    let a = match pop_operand(state, require_minimal) {
        Some(a) => a,
        None => return,
    };
    if !(0..=31).contains(&b) {
        state.fail(ScriptError::InvalidNaturalNumber);
        return;
    }
    push_to_stack(state, encode_script_number(a >> b));
}

pub fn op_booland(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| {
        i64::from(a != 0 && b != 0)
    });
}

pub fn op_boolor(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| {
        i64::from(a != 0 || b != 0)
    });
}

pub fn op_numequal(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a == b));
}

pub fn op_numnotequal(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a != b));
}

pub fn op_lessthan(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a < b));
}

pub fn op_greaterthan(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a > b));
}

pub fn op_lessthanorequal(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a <= b));
}

pub fn op_greaterthanorequal(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, |a, b| i64::from(a >= b));
}

pub fn op_min(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, i64::min);
}

pub fn op_max(state: &mut ScriptState, require_minimal: bool) {
    binary_numeric_op(state, require_minimal, i64::max);
}

pub fn op_within(state: &mut ScriptState, require_minimal: bool) {
    let items = match pop_three(state) {
        Some(items) => items,
        None => return,
    };
    let decode = |bytes: &[u8]| decode_script_number(bytes, require_minimal, MAX_SCRIPT_NUMBER_LENGTH);
    let (x, min, max) = match (decode(&items.0), decode(&items.1), decode(&items.2)) {
        (Ok(x), Ok(min), Ok(max)) => (x, min, max),
        (a, b, c) => {
            let error = [a.err(), b.err(), c.err()].into_iter().flatten().next();
            if let Some(error) = error {
                state.fail(error);
            }
            return;
        }
    };
    push_to_stack(
        state,
        encode_script_boolean(min <= x && x < max),
    );
}
