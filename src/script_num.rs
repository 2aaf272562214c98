//! Bitcoin script number codec
//!
//! Script numbers are sign-magnitude little-endian: the high bit of the
//! most-significant byte carries the sign. Zero encodes as the empty byte
//! string. Arithmetic operands are limited to 4 bytes; lock time operands
//! to 5; results of arithmetic may temporarily exceed the operand range.

use crate::constants::MAX_SCRIPT_NUMBER_LENGTH;
use crate::error::ScriptError;
use crate::types::ByteString;

/// Encode an integer as a minimally-encoded script number.
pub fn encode_script_number(value: i64) -> ByteString {
    if value == 0 {
        return ByteString::new();
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut result = ByteString::with_capacity(9);
    while magnitude > 0 {
        result.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // The top bit of the top byte is the sign bit; if the magnitude already
    // uses it, an extra byte carries the sign instead.
    let top = *result.last().unwrap_or(&0);
    if top & 0x80 != 0 {
        result.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        *result.last_mut().unwrap() |= 0x80;
    }
    result
}

/// Decode a script number of at most `max_length` bytes.
///
/// When `require_minimal` is set, encodings with an unnecessary trailing
/// `0x00`/`0x80` byte are rejected as non-minimal.
pub fn decode_script_number(
    bytes: &[u8],
    require_minimal: bool,
    max_length: usize,
) -> Result<i64, ScriptError> {
    if bytes.len() > max_length {
        return Err(ScriptError::ExceededMaximumScriptNumberLength);
    }
    if bytes.is_empty() {
        return Ok(0);
    }
    let last = bytes[bytes.len() - 1];
    if require_minimal && last & 0x7f == 0 {
        // The top byte carries only a sign; it is redundant unless the byte
        // below it needs its high bit for magnitude.
        if bytes.len() == 1 || bytes[bytes.len() - 2] & 0x80 == 0 {
            return Err(ScriptError::NonMinimallyEncodedScriptNumber);
        }
    }
    let mut result: i64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        let magnitude = if i == bytes.len() - 1 {
            (byte & 0x7f) as i64
        } else {
            *byte as i64
        };
        result |= magnitude << (8 * i);
    }
    if last & 0x80 != 0 {
        result = -result;
    }
    Ok(result)
}

/// Decode a script number with the standard 4-byte arithmetic operand limit.
pub fn decode_arithmetic_operand(bytes: &[u8], require_minimal: bool) -> Result<i64, ScriptError> {
    decode_script_number(bytes, require_minimal, MAX_SCRIPT_NUMBER_LENGTH)
}

/// Truthiness of a stack element: false for empty, all-zero, and negative
/// zero (`0x80` in the top byte with zeroes below); true otherwise.
pub fn decode_script_boolean(bytes: &[u8]) -> bool {
    for (i, byte) in bytes.iter().enumerate() {
        if *byte != 0 {
            // Negative zero is false.
            return !(i == bytes.len() - 1 && *byte == 0x80);
        }
    }
    false
}

/// Encode a boolean as the script numbers 1 / 0 (empty).
pub fn encode_script_boolean(value: bool) -> ByteString {
    if value {
        vec![1]
    } else {
        ByteString::new()
    }
}
