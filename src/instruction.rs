//! Script instruction parsing and serialization
//!
//! A raw script byte sequence decodes into a sequence of instructions:
//! opcodes `0x01..=0x4b` carry the next N bytes as their push payload,
//! `OP_PUSHDATA1/2/4` read a 1/2/4-byte little-endian length followed by
//! that many payload bytes, and every other byte is an instruction with no
//! data. A script that ends mid-push decodes into a final malformed-push
//! instruction which the VM treats as a fatal script error.
//!
//! Serialization is the exact inverse: `serialize(parse(b)) == b` for every
//! input, including malformed ones, because the malformed variant captures
//! all remaining bytes verbatim.

use serde::{Deserialize, Serialize};

use crate::opcodes::{OP_0, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use crate::types::ByteString;

/// A single script instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// An opcode with no payload.
    Op(u8),
    /// A push instruction and its payload. `opcode` records which push
    /// encoding the script used, so serialization is lossless.
    Push { opcode: u8, data: ByteString },
    /// A push instruction whose payload (or declared length) ran past the
    /// end of the script. `remaining` holds every byte after the opcode.
    MalformedPush { opcode: u8, remaining: ByteString },
}

impl Instruction {
    /// The instruction's opcode byte.
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Op(opcode) => *opcode,
            Instruction::Push { opcode, .. } => *opcode,
            Instruction::MalformedPush { opcode, .. } => *opcode,
        }
    }

    /// Whether this instruction is a truncated push.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Instruction::MalformedPush { .. })
    }

    /// Build the minimally-encoded push instruction for `data`.
    ///
    /// Empty data becomes OP_0. Payloads of 1-75 bytes use a direct push;
    /// longer payloads use the smallest OP_PUSHDATA variant that fits.
    pub fn push(data: ByteString) -> Instruction {
        match data.len() {
            0 => Instruction::Op(OP_0),
            len @ 1..=0x4b => Instruction::Push {
                opcode: len as u8,
                data,
            },
            len if len <= 0xff => Instruction::Push {
                opcode: OP_PUSHDATA1,
                data,
            },
            len if len <= 0xffff => Instruction::Push {
                opcode: OP_PUSHDATA2,
                data,
            },
            _ => Instruction::Push {
                opcode: OP_PUSHDATA4,
                data,
            },
        }
    }
}

/// Read an `N`-byte little-endian push length starting at `offset`.
fn read_push_length(script: &[u8], offset: usize, width: usize) -> Option<usize> {
    if offset + width > script.len() {
        return None;
    }
    let mut length = 0usize;
    for (i, byte) in script[offset..offset + width].iter().enumerate() {
        length |= (*byte as usize) << (8 * i);
    }
    Some(length)
}

/// Decode a raw script into its instruction sequence.
pub fn parse_script(script: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut i = 0;
    while i < script.len() {
        let opcode = script[i];
        i += 1;
        let (length_width, data_length) = match opcode {
            0x01..=0x4b => (0, Some(opcode as usize)),
            OP_PUSHDATA1 => (1, read_push_length(script, i, 1)),
            OP_PUSHDATA2 => (2, read_push_length(script, i, 2)),
            OP_PUSHDATA4 => (4, read_push_length(script, i, 4)),
            _ => {
                instructions.push(Instruction::Op(opcode));
                continue;
            }
        };
        match data_length {
            // The length bytes were fully read, so `i + length_width` is in
            // bounds; comparing against the remainder avoids overflow on
            // absurd declared lengths.
            Some(length) if length <= script.len() - (i + length_width) => {
                let start = i + length_width;
                instructions.push(Instruction::Push {
                    opcode,
                    data: script[start..start + length].to_vec(),
                });
                i = start + length;
            }
            _ => {
                // Truncated length bytes or payload: capture the remainder.
                instructions.push(Instruction::MalformedPush {
                    opcode,
                    remaining: script[i..].to_vec(),
                });
                i = script.len();
            }
        }
    }
    instructions
}

/// Append the serialization of one instruction to `out`.
pub fn serialize_instruction(instruction: &Instruction, out: &mut ByteString) {
    match instruction {
        Instruction::Op(opcode) => out.push(*opcode),
        Instruction::Push { opcode, data } => {
            out.push(*opcode);
            match *opcode {
                OP_PUSHDATA1 => out.push(data.len() as u8),
                OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                _ => {}
            }
            out.extend_from_slice(data);
        }
        Instruction::MalformedPush { opcode, remaining } => {
            out.push(*opcode);
            out.extend_from_slice(remaining);
        }
    }
}

/// Re-serialize an instruction sequence to raw script bytes.
pub fn serialize_instructions(instructions: &[Instruction]) -> ByteString {
    let mut out = ByteString::new();
    for instruction in instructions {
        serialize_instruction(instruction, &mut out);
    }
    out
}
