//! Property-based tests for the codecs
//!
//! Uses PropTest to verify the parser and script-number round-trip
//! invariants over randomly generated inputs.

use bchvm::instruction::{parse_script, serialize_instructions, Instruction};
use bchvm::script_num::{decode_script_number, encode_script_number};
use proptest::prelude::*;

proptest! {
    /// serialize(parse(b)) == b for every byte string, including scripts
    /// that end mid-push: the malformed tail is captured verbatim.
    #[test]
    fn parser_round_trips_all_inputs(
        script in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let instructions = parse_script(&script);
        prop_assert_eq!(serialize_instructions(&instructions), script);
    }

    /// At most one instruction can be malformed, and only the last.
    #[test]
    fn only_the_final_instruction_is_malformed(
        script in prop::collection::vec(any::<u8>(), 0..2048)
    ) {
        let instructions = parse_script(&script);
        for instruction in instructions.iter().rev().skip(1) {
            prop_assert!(!instruction.is_malformed());
        }
    }

    /// Minimal push construction always re-parses to itself.
    #[test]
    fn minimal_push_round_trips(
        data in prop::collection::vec(any::<u8>(), 1..1000)
    ) {
        let instruction = Instruction::push(data.clone());
        let serialized = serialize_instructions(std::slice::from_ref(&instruction));
        let reparsed = parse_script(&serialized);
        prop_assert_eq!(reparsed, vec![instruction]);
    }

    /// decode(encode(v)) == v over the full arithmetic result range.
    #[test]
    fn script_number_round_trips(value in -0x7fffffffi64..=0x7fffffff) {
        let encoded = encode_script_number(value);
        prop_assert_eq!(decode_script_number(&encoded, true, 4), Ok(value));
    }

    /// Encoded forms are minimal: the minimal-encoding check accepts every
    /// encoder output, and no shorter encoding decodes to the same value.
    #[test]
    fn script_number_encodings_are_minimal(value in -0x7fffffffi64..=0x7fffffff) {
        let encoded = encode_script_number(value);
        prop_assert!(decode_script_number(&encoded, true, 4).is_ok());
        if !encoded.is_empty() {
            // Dropping the top byte must change or invalidate the value.
            let shorter = &encoded[..encoded.len() - 1];
            match decode_script_number(shorter, false, 4) {
                Ok(decoded) => prop_assert_ne!(decoded, value),
                Err(_) => {}
            }
        }
    }

    /// Distinct values never share an encoding.
    #[test]
    fn script_number_encoding_is_injective(
        a in -0x7fffffffi64..=0x7fffffff,
        b in -0x7fffffffi64..=0x7fffffff
    ) {
        if a != b {
            prop_assert_ne!(encode_script_number(a), encode_script_number(b));
        }
    }

    /// Five-byte lock time operands cover the full u32 range.
    #[test]
    fn locktime_operands_round_trip(value in 0i64..=0xffffffff) {
        let encoded = encode_script_number(value);
        prop_assert!(encoded.len() <= 5);
        prop_assert_eq!(decode_script_number(&encoded, true, 5), Ok(value));
    }
}
