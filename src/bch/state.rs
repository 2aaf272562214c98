//! Evaluation state and program descriptor for the BCH instruction set

use std::sync::Arc;

use crate::error::ScriptError;
use crate::instruction::{parse_script, serialize_instructions, Instruction};
use crate::types::{ByteString, TransactionContext};

/// Program descriptor: an immutable instruction sequence plus the flat
/// transaction context of the input being authenticated. Both are shared
/// by reference into every state created from the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub instructions: Arc<[Instruction]>,
    pub context: Arc<TransactionContext>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, context: TransactionContext) -> Self {
        Program {
            instructions: instructions.into(),
            context: Arc::new(context),
        }
    }

    /// Parse raw script bytes into a program.
    pub fn from_bytecode(bytecode: &[u8], context: TransactionContext) -> Self {
        Program::new(parse_script(bytecode), context)
    }
}

/// VM state for the BCH instruction set.
///
/// Cloning is a deep copy of the mutable parts; the instruction sequence
/// and transaction context are shared read-only. Once `error` is set,
/// every handler becomes an identity transition and the stopping predicate
/// holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptState {
    pub instructions: Arc<[Instruction]>,
    pub context: Arc<TransactionContext>,
    /// Instruction pointer: index of the next instruction to execute.
    pub ip: usize,
    pub stack: Vec<ByteString>,
    pub alternate_stack: Vec<ByteString>,
    /// Truth values of the enclosing OP_IF/OP_NOTIF branches. An opcode
    /// executes only while every entry is true.
    pub execution_stack: Vec<bool>,
    /// Instruction index of the last executed OP_CODESEPARATOR, -1 if none.
    pub last_code_separator: i32,
    /// Count of non-push opcodes executed, capped by consensus at 201.
    pub operation_count: usize,
    pub error: Option<ScriptError>,
}

impl ScriptState {
    pub fn from_program(program: &Program) -> Self {
        ScriptState::with_stack(program, Vec::new())
    }

    /// Build a state with a pre-seeded stack, as when a locking script
    /// continues from the stack an unlocking script produced.
    pub fn with_stack(program: &Program, stack: Vec<ByteString>) -> Self {
        ScriptState {
            instructions: Arc::clone(&program.instructions),
            context: Arc::clone(&program.context),
            ip: 0,
            stack,
            alternate_stack: Vec::new(),
            execution_stack: Vec::new(),
            last_code_separator: -1,
            operation_count: 0,
            error: None,
        }
    }

    /// Whether the current conditional path is executing.
    pub fn executing(&self) -> bool {
        self.execution_stack.iter().all(|branch| *branch)
    }

    /// Record the first error; later errors are ignored.
    pub fn fail(&mut self, error: ScriptError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// The instruction most recently consumed by the driver loop.
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.ip
            .checked_sub(1)
            .and_then(|index| self.instructions.get(index))
    }

    /// Bytecode covered by a signature check: the serialized instructions
    /// after the last executed OP_CODESEPARATOR.
    pub fn covered_bytecode(&self) -> ByteString {
        let start = (self.last_code_separator + 1) as usize;
        serialize_instructions(&self.instructions[start.min(self.instructions.len())..])
    }

    /// Stable identifier of the recorded error, for debuggers.
    pub fn error_identifier(&self) -> Option<&'static str> {
        self.error.map(|error| error.identifier())
    }
}
