//! BCH instruction set
//!
//! Assembles the 256-entry operation table over [`ScriptState`], wiring
//! the handlers in [`operations`], [`crypto_ops`], and [`time`] to the
//! cryptographic capabilities and construction flags supplied by the
//! caller. The generic driver loop lives in [`crate::vm`].

pub mod combinators;
pub mod crypto_ops;
pub mod operations;
pub mod state;
pub mod time;

pub use state::{Program, ScriptState};

use std::sync::Arc;

use crate::bch::combinators::{combine_operations, increment_operation_count};
use crate::crypto::{CryptoProvider, NativeCrypto};
use crate::error::ScriptError;
use crate::instruction::Instruction;
use crate::opcodes::*;
use crate::script_num::decode_script_boolean;
use crate::types::{ByteString, TransactionContext};
use crate::vm::{AuthVm, InstructionSet, Operation};

/// Construction flags for the BCH instruction set.
///
/// The null-signature-failure and bug-value rules are always on for
/// current BCH but are surfaced as flags rather than hardcoded; the
/// disabled-era opcodes consult a flag so a network-era change is a flag
/// flip rather than a table edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Reject non-minimally-encoded script numbers.
    pub require_minimal_encoding: bool,
    /// Turn a failing non-null signature into a script error instead of a
    /// falsy push.
    pub require_null_signature_failures: bool,
    /// Require the OP_CHECKMULTISIG protocol bug value to be empty.
    pub require_bug_value_zero: bool,
    /// OP_MUL is re-enabled on BCH.
    pub enable_op_mul: bool,
    /// OP_INVERT remains disabled on current BCH.
    pub enable_op_invert: bool,
    /// OP_LSHIFT / OP_RSHIFT remain disabled on current BCH.
    pub enable_shift_operations: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            require_minimal_encoding: true,
            require_null_signature_failures: true,
            require_bug_value_zero: true,
            enable_op_mul: true,
            enable_op_invert: false,
            enable_shift_operations: false,
        }
    }
}

/// Whether a table entry runs inside unexecuted conditional branches.
///
/// Flow control must always run to track branch nesting, and disabled
/// opcodes fail the script no matter where they appear. Everything else
/// is skipped while an enclosing branch is false.
#[derive(Clone, Copy)]
enum Evaluation {
    Conditional,
    Always,
}

/// The BCH instruction set: operation table plus construction flags.
pub struct BchInstructionSet {
    operations: Vec<Option<Operation<ScriptState>>>,
    options: Options,
}

impl BchInstructionSet {
    pub fn new(crypto: Arc<dyn CryptoProvider>, options: Options) -> Self {
        let mut operations: Vec<Option<Operation<ScriptState>>> = Vec::with_capacity(256);
        operations.resize_with(256, || None);
        let mut set = BchInstructionSet {
            operations,
            options,
        };
        set.install(crypto);
        set
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Wrap a handler with operation counting and conditional-branch
    /// skipping, then place it in the table.
    fn register(
        &mut self,
        opcode: u8,
        evaluation: Evaluation,
        inner: impl Fn(&mut ScriptState) + Send + Sync + 'static,
    ) {
        let operation: Operation<ScriptState> = Box::new(move |state| {
            // Non-push opcodes charge the operation budget even when the
            // enclosing branch is not executing.
            if opcode > LAST_PUSH_OPCODE {
                increment_operation_count(state, 1);
                if state.error.is_some() {
                    return;
                }
            }
            if matches!(evaluation, Evaluation::Conditional) && !state.executing() {
                return;
            }
            inner(state);
        });
        self.operations[opcode as usize] = Some(operation);
    }

    fn register_disabled(&mut self, opcode: u8) {
        self.register(opcode, Evaluation::Always, |state| {
            state.fail(ScriptError::DisabledOpcode)
        });
    }

    fn install(&mut self, crypto: Arc<dyn CryptoProvider>) {
        use Evaluation::{Always, Conditional};
        let options = self.options;
        let minimal = options.require_minimal_encoding;
        let null_failures = options.require_null_signature_failures;

        // Constants and pushes.
        self.register(OP_0, Conditional, |s| operations::op_push_number(s, 0));
        for opcode in 0x01..=0x4b {
            self.register(opcode, Conditional, operations::op_push);
        }
        for opcode in [OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4] {
            self.register(opcode, Conditional, operations::op_push);
        }
        self.register(OP_1NEGATE, Conditional, |s| {
            operations::op_push_number(s, -1)
        });
        for opcode in OP_1..=OP_16 {
            let value = (opcode - OP_N_BASE) as i64;
            self.register(opcode, Conditional, move |s| {
                operations::op_push_number(s, value)
            });
        }

        // Flow control.
        self.register(OP_NOP, Conditional, operations::op_nop);
        self.register(OP_RESERVED, Conditional, operations::op_reserved);
        self.register(OP_VER, Conditional, operations::op_reserved);
        self.register(OP_IF, Always, operations::op_if);
        self.register(OP_NOTIF, Always, operations::op_notif);
        self.register(OP_VERIF, Always, operations::op_reserved);
        self.register(OP_VERNOTIF, Always, operations::op_reserved);
        self.register(OP_ELSE, Always, operations::op_else);
        self.register(OP_ENDIF, Always, operations::op_endif);
        self.register(OP_VERIFY, Conditional, operations::op_verify);
        self.register(OP_RETURN, Conditional, operations::op_return);

        // Stack operations.
        self.register(OP_TOALTSTACK, Conditional, operations::op_toaltstack);
        self.register(OP_FROMALTSTACK, Conditional, operations::op_fromaltstack);
        self.register(OP_2DROP, Conditional, operations::op_2drop);
        self.register(OP_2DUP, Conditional, operations::op_2dup);
        self.register(OP_3DUP, Conditional, operations::op_3dup);
        self.register(OP_2OVER, Conditional, operations::op_2over);
        self.register(OP_2ROT, Conditional, operations::op_2rot);
        self.register(OP_2SWAP, Conditional, operations::op_2swap);
        self.register(OP_IFDUP, Conditional, operations::op_ifdup);
        self.register(OP_DEPTH, Conditional, operations::op_depth);
        self.register(OP_DROP, Conditional, operations::op_drop);
        self.register(OP_DUP, Conditional, operations::op_dup);
        self.register(OP_NIP, Conditional, operations::op_nip);
        self.register(OP_OVER, Conditional, operations::op_over);
        self.register(OP_PICK, Conditional, move |s| operations::op_pick(s, minimal));
        self.register(OP_ROLL, Conditional, move |s| operations::op_roll(s, minimal));
        self.register(OP_ROT, Conditional, operations::op_rot);
        self.register(OP_SWAP, Conditional, operations::op_swap);
        self.register(OP_TUCK, Conditional, operations::op_tuck);

        // Splice operations.
        self.register(OP_CAT, Conditional, operations::op_cat);
        self.register(OP_SPLIT, Conditional, move |s| {
            operations::op_split(s, minimal)
        });
        self.register(OP_NUM2BIN, Conditional, move |s| {
            operations::op_num2bin(s, minimal)
        });
        self.register(OP_BIN2NUM, Conditional, operations::op_bin2num);
        self.register(OP_SIZE, Conditional, operations::op_size);
        self.register(OP_REVERSEBYTES, Conditional, operations::op_reversebytes);

        // Bitwise logic.
        if options.enable_op_invert {
            self.register(OP_INVERT, Conditional, operations::op_invert);
        } else {
            self.register_disabled(OP_INVERT);
        }
        self.register(OP_AND, Conditional, operations::op_and);
        self.register(OP_OR, Conditional, operations::op_or);
        self.register(OP_XOR, Conditional, operations::op_xor);
        self.register(OP_EQUAL, Conditional, operations::op_equal);
        self.register(
            OP_EQUALVERIFY,
            Conditional,
            combine_operations(operations::op_equal, operations::op_verify),
        );
        self.register(OP_RESERVED1, Conditional, operations::op_reserved);
        self.register(OP_RESERVED2, Conditional, operations::op_reserved);

        // Arithmetic.
        self.register(OP_1ADD, Conditional, move |s| operations::op_1add(s, minimal));
        self.register(OP_1SUB, Conditional, move |s| operations::op_1sub(s, minimal));
        self.register_disabled(OP_2MUL);
        self.register_disabled(OP_2DIV);
        self.register(OP_NEGATE, Conditional, move |s| {
            operations::op_negate(s, minimal)
        });
        self.register(OP_ABS, Conditional, move |s| operations::op_abs(s, minimal));
        self.register(OP_NOT, Conditional, move |s| operations::op_not(s, minimal));
        self.register(OP_0NOTEQUAL, Conditional, move |s| {
            operations::op_0notequal(s, minimal)
        });
        self.register(OP_ADD, Conditional, move |s| operations::op_add(s, minimal));
        self.register(OP_SUB, Conditional, move |s| operations::op_sub(s, minimal));
        if options.enable_op_mul {
            self.register(OP_MUL, Conditional, move |s| operations::op_mul(s, minimal));
        } else {
            self.register_disabled(OP_MUL);
        }
        self.register(OP_DIV, Conditional, move |s| operations::op_div(s, minimal));
        self.register(OP_MOD, Conditional, move |s| operations::op_mod(s, minimal));
        if options.enable_shift_operations {
            self.register(OP_LSHIFT, Conditional, move |s| {
                operations::op_lshift(s, minimal)
            });
            self.register(OP_RSHIFT, Conditional, move |s| {
                operations::op_rshift(s, minimal)
            });
        } else {
            self.register_disabled(OP_LSHIFT);
            self.register_disabled(OP_RSHIFT);
        }
        self.register(OP_BOOLAND, Conditional, move |s| {
            operations::op_booland(s, minimal)
        });
        self.register(OP_BOOLOR, Conditional, move |s| {
            operations::op_boolor(s, minimal)
        });
        self.register(OP_NUMEQUAL, Conditional, move |s| {
            operations::op_numequal(s, minimal)
        });
        self.register(
            OP_NUMEQUALVERIFY,
            Conditional,
            combine_operations(
                move |s: &mut ScriptState| operations::op_numequal(s, minimal),
                operations::op_verify,
            ),
        );
        self.register(OP_NUMNOTEQUAL, Conditional, move |s| {
            operations::op_numnotequal(s, minimal)
        });
        self.register(OP_LESSTHAN, Conditional, move |s| {
            operations::op_lessthan(s, minimal)
        });
        self.register(OP_GREATERTHAN, Conditional, move |s| {
            operations::op_greaterthan(s, minimal)
        });
        self.register(OP_LESSTHANOREQUAL, Conditional, move |s| {
            operations::op_lessthanorequal(s, minimal)
        });
        self.register(OP_GREATERTHANOREQUAL, Conditional, move |s| {
            operations::op_greaterthanorequal(s, minimal)
        });
        self.register(OP_MIN, Conditional, move |s| operations::op_min(s, minimal));
        self.register(OP_MAX, Conditional, move |s| operations::op_max(s, minimal));
        self.register(OP_WITHIN, Conditional, move |s| {
            operations::op_within(s, minimal)
        });

        // Crypto.
        let hash_opcodes: [(u8, fn(&mut ScriptState, &dyn CryptoProvider)); 5] = [
            (OP_RIPEMD160, crypto_ops::op_ripemd160),
            (OP_SHA1, crypto_ops::op_sha1),
            (OP_SHA256, crypto_ops::op_sha256),
            (OP_HASH160, crypto_ops::op_hash160),
            (OP_HASH256, crypto_ops::op_hash256),
        ];
        for (opcode, hash_opcode) in hash_opcodes {
            let crypto = Arc::clone(&crypto);
            self.register(opcode, Conditional, move |s: &mut ScriptState| {
                hash_opcode(s, crypto.as_ref())
            });
        }
        self.register(OP_CODESEPARATOR, Conditional, crypto_ops::op_codeseparator);

        let checksig = {
            let crypto = Arc::clone(&crypto);
            move |s: &mut ScriptState| crypto_ops::op_checksig(s, crypto.as_ref(), null_failures)
        };
        self.register(OP_CHECKSIG, Conditional, checksig.clone());
        self.register(
            OP_CHECKSIGVERIFY,
            Conditional,
            combine_operations(checksig, operations::op_verify),
        );

        let checkmultisig = {
            let crypto = Arc::clone(&crypto);
            let bug_value_zero = options.require_bug_value_zero;
            move |s: &mut ScriptState| {
                crypto_ops::op_checkmultisig(
                    s,
                    crypto.as_ref(),
                    minimal,
                    null_failures,
                    bug_value_zero,
                )
            }
        };
        self.register(OP_CHECKMULTISIG, Conditional, checkmultisig.clone());
        self.register(
            OP_CHECKMULTISIGVERIFY,
            Conditional,
            combine_operations(checkmultisig, operations::op_verify),
        );

        let checkdatasig = {
            let crypto = Arc::clone(&crypto);
            move |s: &mut ScriptState| {
                crypto_ops::op_checkdatasig(s, crypto.as_ref(), null_failures)
            }
        };
        self.register(OP_CHECKDATASIG, Conditional, checkdatasig.clone());
        self.register(
            OP_CHECKDATASIGVERIFY,
            Conditional,
            combine_operations(checkdatasig, operations::op_verify),
        );

        // Lock time and upgradable NOPs.
        self.register(OP_NOP1, Conditional, operations::op_nop);
        self.register(OP_CHECKLOCKTIMEVERIFY, Conditional, move |s| {
            time::op_checklocktimeverify(s, minimal)
        });
        self.register(OP_CHECKSEQUENCEVERIFY, Conditional, move |s| {
            time::op_checksequenceverify(s, minimal)
        });
        for opcode in OP_NOP4..=OP_NOP10 {
            self.register(opcode, Conditional, operations::op_nop);
        }
    }
}

impl InstructionSet for BchInstructionSet {
    type Program = Program;
    type State = ScriptState;

    fn initial_state(&self, program: &Program) -> ScriptState {
        let mut state = ScriptState::from_program(program);
        // A script that ends mid-push never starts executing.
        if program
            .instructions
            .last()
            .is_some_and(Instruction::is_malformed)
        {
            state.fail(ScriptError::MalformedPush);
        }
        state
    }

    fn can_continue(&self, state: &ScriptState) -> bool {
        state.error.is_none() && state.ip < state.instructions.len()
    }

    fn next_opcode(&self, state: &mut ScriptState) -> Option<u8> {
        let opcode = state.instructions.get(state.ip)?.opcode();
        state.ip += 1;
        Some(opcode)
    }

    fn operation(&self, opcode: u8) -> Option<&Operation<ScriptState>> {
        self.operations[opcode as usize].as_ref()
    }

    fn undefined(&self, state: &mut ScriptState) {
        increment_operation_count(state, 1);
        if state.error.is_some() || !state.executing() {
            return;
        }
        let opcode = state
            .current_instruction()
            .map(Instruction::opcode)
            .unwrap_or_default();
        state.fail(if opcode > OP_MAXIMUM {
            ScriptError::ExceededMaximumOpcode
        } else {
            ScriptError::UnknownOpcode
        });
    }

    fn verify(&self, state: &ScriptState) -> bool {
        verification_failure(state).is_none()
    }
}

/// Why a terminal state fails verification, if it does: a recorded
/// evaluation error, an unclosed conditional, or a missing/falsy top stack
/// element.
pub fn verification_failure(state: &ScriptState) -> Option<ScriptError> {
    if let Some(error) = state.error {
        return Some(error);
    }
    if state.ip < state.instructions.len() {
        return Some(ScriptError::FailedVerify);
    }
    if !state.execution_stack.is_empty() {
        return Some(ScriptError::UnbalancedConditional);
    }
    match state.stack.last() {
        Some(top) if decode_script_boolean(top) => None,
        _ => Some(ScriptError::FailedVerify),
    }
}

/// Build a VM over the BCH instruction set with native crypto and default
/// options.
pub fn standard_vm() -> AuthVm<BchInstructionSet> {
    AuthVm::new(BchInstructionSet::new(
        Arc::new(NativeCrypto),
        Options::default(),
    ))
}

/// Evaluate an unlocking/locking script pair the way node validation
/// does: the unlocking script runs first and its final stack seeds the
/// locking script evaluation. Returns the terminal state and the verdict.
pub fn verify_spend(
    vm: &AuthVm<BchInstructionSet>,
    unlocking_bytecode: &[u8],
    locking_bytecode: &[u8],
    context: &TransactionContext,
) -> (ScriptState, bool) {
    let unlocking_program = Program::from_bytecode(unlocking_bytecode, context.clone());
    let unlocking_state = vm.evaluate(&unlocking_program);
    if unlocking_state.error.is_some() || !unlocking_state.execution_stack.is_empty() {
        return (unlocking_state, false);
    }
    let stack: Vec<ByteString> = unlocking_state.stack;
    let locking_program = Program::from_bytecode(locking_bytecode, context.clone());
    let seeded = ScriptState::with_stack(&locking_program, stack);
    let terminal = vm.state_evaluate(&seeded);
    let success = vm.verify(&terminal);
    (terminal, success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate_bytecode(bytecode: &[u8]) -> ScriptState {
        let vm = standard_vm();
        vm.evaluate(&Program::from_bytecode(
            bytecode,
            TransactionContext::default(),
        ))
    }

    fn verify_bytecode(bytecode: &[u8]) -> bool {
        let vm = standard_vm();
        let state = vm.evaluate(&Program::from_bytecode(
            bytecode,
            TransactionContext::default(),
        ));
        vm.verify(&state)
    }

    #[test]
    fn test_op_1_verifies() {
        assert!(verify_bytecode(&[OP_1]));
    }

    #[test]
    fn test_empty_script_fails() {
        assert!(!verify_bytecode(&[]));
    }

    #[test]
    fn test_op_0_is_falsy() {
        assert!(!verify_bytecode(&[OP_0]));
    }

    #[test]
    fn test_arithmetic_program() {
        // 2 3 ADD 5 NUMEQUAL
        assert!(verify_bytecode(&[OP_2, OP_3, OP_ADD, OP_5, OP_NUMEQUAL]));
    }

    #[test]
    fn test_if_else_branches() {
        assert!(verify_bytecode(&[OP_1, OP_IF, OP_1, OP_ELSE, OP_0, OP_ENDIF]));
        assert!(verify_bytecode(&[OP_0, OP_IF, OP_0, OP_ELSE, OP_1, OP_ENDIF]));
        // NOTIF takes the other branch
        assert!(verify_bytecode(&[
            OP_0, OP_NOTIF, OP_1, OP_ELSE, OP_0, OP_ENDIF
        ]));
    }

    #[test]
    fn test_nested_branches_skip_correctly() {
        // Outer false branch must skip the inner IF entirely.
        assert!(verify_bytecode(&[
            OP_0, OP_IF, OP_1, OP_IF, OP_0, OP_ENDIF, OP_ELSE, OP_1, OP_ENDIF
        ]));
    }

    #[test]
    fn test_unbalanced_else_errors() {
        let state = evaluate_bytecode(&[OP_1, OP_ELSE]);
        assert_eq!(state.error, Some(ScriptError::UnbalancedConditional));
    }

    #[test]
    fn test_unclosed_if_fails_verification() {
        let state = evaluate_bytecode(&[OP_1, OP_IF, OP_1]);
        assert_eq!(state.error, None);
        assert_eq!(
            verification_failure(&state),
            Some(ScriptError::UnbalancedConditional)
        );
    }

    #[test]
    fn test_op_return_errors() {
        let state = evaluate_bytecode(&[OP_1, OP_RETURN, OP_1]);
        assert_eq!(state.error, Some(ScriptError::CalledReturn));
        assert_eq!(state.ip, 2);
    }

    #[test]
    fn test_op_return_skipped_in_false_branch() {
        assert!(verify_bytecode(&[
            OP_0, OP_IF, OP_RETURN, OP_ENDIF, OP_1
        ]));
    }

    #[test]
    fn test_disabled_opcode_fails_even_when_skipped() {
        let state = evaluate_bytecode(&[OP_0, OP_IF, OP_INVERT, OP_ENDIF, OP_1]);
        assert_eq!(state.error, Some(ScriptError::DisabledOpcode));
    }

    #[test]
    fn test_invert_enabled_by_flag() {
        let vm = AuthVm::new(BchInstructionSet::new(
            Arc::new(NativeCrypto),
            Options {
                enable_op_invert: true,
                ..Default::default()
            },
        ));
        let program = Program::from_bytecode(
            &[0x01, 0xf0, OP_INVERT],
            TransactionContext::default(),
        );
        let state = vm.evaluate(&program);
        assert_eq!(state.stack, vec![vec![0x0f]]);
    }

    #[test]
    fn test_shift_operations_behind_flag() {
        let state = evaluate_bytecode(&[OP_1, OP_1, OP_LSHIFT]);
        assert_eq!(state.error, Some(ScriptError::DisabledOpcode));

        let vm = AuthVm::new(BchInstructionSet::new(
            Arc::new(NativeCrypto),
            Options {
                enable_shift_operations: true,
                ..Default::default()
            },
        ));
        let program =
            Program::from_bytecode(&[OP_1, OP_3, OP_LSHIFT], TransactionContext::default());
        let state = vm.evaluate(&program);
        assert_eq!(state.stack, vec![vec![0x08]]);
    }

    #[test]
    fn test_reserved_opcode_only_fails_when_executed() {
        let state = evaluate_bytecode(&[OP_RESERVED]);
        assert_eq!(state.error, Some(ScriptError::UnknownOpcode));
        assert!(verify_bytecode(&[OP_0, OP_IF, OP_RESERVED, OP_ENDIF, OP_1]));
    }

    #[test]
    fn test_verif_fails_even_when_skipped() {
        let state = evaluate_bytecode(&[OP_0, OP_IF, OP_VERIF, OP_ENDIF, OP_1]);
        assert_eq!(state.error, Some(ScriptError::UnknownOpcode));
    }

    #[test]
    fn test_undefined_opcode_kinds() {
        let state = evaluate_bytecode(&[0xbd]);
        assert_eq!(state.error, Some(ScriptError::ExceededMaximumOpcode));
        let state = evaluate_bytecode(&[0xff]);
        assert_eq!(state.error, Some(ScriptError::ExceededMaximumOpcode));
    }

    #[test]
    fn test_malformed_push_fails_before_execution() {
        let state = evaluate_bytecode(&[OP_1, 0x4b]);
        assert_eq!(state.error, Some(ScriptError::MalformedPush));
        assert_eq!(state.ip, 0);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_alt_stack_round_trip() {
        assert!(verify_bytecode(&[
            OP_1, OP_TOALTSTACK, OP_0, OP_DROP, OP_FROMALTSTACK
        ]));
    }

    #[test]
    fn test_equalverify() {
        assert!(verify_bytecode(&[OP_2, OP_2, OP_EQUALVERIFY, OP_1]));
        let state = evaluate_bytecode(&[OP_2, OP_3, OP_EQUALVERIFY, OP_1]);
        assert_eq!(state.error, Some(ScriptError::FailedVerify));
    }

    #[test]
    fn test_codeseparator_updates_state() {
        let state = evaluate_bytecode(&[OP_1, OP_CODESEPARATOR, OP_1, OP_DROP]);
        assert_eq!(state.last_code_separator, 1);
    }

    #[test]
    fn test_verify_spend_links_stacks() {
        let vm = standard_vm();
        let (state, success) = verify_spend(
            &vm,
            &[OP_2, OP_3],
            &[OP_ADD, OP_5, OP_NUMEQUAL],
            &TransactionContext::default(),
        );
        assert!(success, "state: {state:?}");
    }

    #[test]
    fn test_state_step_non_mutation() {
        let vm = standard_vm();
        let program = Program::from_bytecode(
            &[OP_1, OP_2, OP_ADD],
            TransactionContext::default(),
        );
        let initial = vm.instruction_set().initial_state(&program);
        let stepped = vm.state_step(&initial);
        assert_ne!(initial, stepped);
        assert_eq!(initial.ip, 0);
        assert!(initial.stack.is_empty());
    }

    #[test]
    fn test_terminated_state_step_is_identity() {
        let vm = standard_vm();
        let program = Program::from_bytecode(&[OP_1], TransactionContext::default());
        let terminal = vm.evaluate(&program);
        assert_eq!(vm.state_step(&terminal), terminal);
    }

    #[test]
    fn test_debug_trace_ends_with_identity_entry() {
        let vm = standard_vm();
        let program =
            Program::from_bytecode(&[OP_1, OP_2, OP_ADD], TransactionContext::default());
        let trace = vm.debug(&program);
        assert_eq!(trace.len(), 4);
        assert_eq!(trace[trace.len() - 1], trace[trace.len() - 2]);
        assert_eq!(trace.last().unwrap().stack, vec![vec![0x03]]);
    }
}
