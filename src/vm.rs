//! Generic script authentication virtual machine
//!
//! The machine is parameterized over an [`InstructionSet`]: a stopping
//! predicate, an opcode-to-handler table, a fallback for unmapped opcodes,
//! and a terminal success verdict. The driver loop itself knows nothing
//! about BCH; the concrete BCH set lives in [`crate::bch`], and tests can
//! run the same machine over minimal custom sets.
//!
//! Each evaluation is single-threaded and caller-driven: a state advances
//! only through explicit steps, there is no suspension and no internal
//! parallelism. Independent evaluations may run in parallel as long as
//! each owns its state.

/// A single opcode handler. Handlers mutate the state in place; the
/// non-mutating entrypoints clone before stepping. Boxing lets handlers
/// capture the capabilities (crypto implementations, construction flags)
/// they were built with.
pub type Operation<S> = Box<dyn Fn(&mut S) + Send + Sync>;

/// The capability set the driver loop requires.
pub trait InstructionSet {
    /// Program descriptor consumed by [`InstructionSet::initial_state`].
    type Program;
    /// Evaluation state. `Clone` must be a deep copy: the non-mutating
    /// entrypoints rely on it, though immutable element bytes may be
    /// shared by reference.
    type State: Clone;

    /// Build the initial state for a full program evaluation.
    fn initial_state(&self, program: &Self::Program) -> Self::State;

    /// Stopping predicate: false once an error is set or the instruction
    /// pointer has run past the final instruction.
    fn can_continue(&self, state: &Self::State) -> bool;

    /// Consume the opcode under the instruction pointer, advancing it.
    /// Returns `None` past the end of the program.
    fn next_opcode(&self, state: &mut Self::State) -> Option<u8>;

    /// Handler registered for `opcode`, if any.
    fn operation(&self, opcode: u8) -> Option<&Operation<Self::State>>;

    /// Fallback handler for opcodes with no table entry.
    fn undefined(&self, state: &mut Self::State);

    /// Terminal success verdict for a finished state.
    fn verify(&self, state: &Self::State) -> bool;
}

/// Script authentication virtual machine over an instruction set.
pub struct AuthVm<I: InstructionSet> {
    instruction_set: I,
}

impl<I: InstructionSet> AuthVm<I> {
    pub fn new(instruction_set: I) -> Self {
        AuthVm { instruction_set }
    }

    pub fn instruction_set(&self) -> &I {
        &self.instruction_set
    }

    /// Run a program to termination, returning the final state.
    pub fn evaluate(&self, program: &I::Program) -> I::State {
        let mut state = self.instruction_set.initial_state(program);
        self.run(&mut state);
        state
    }

    /// Run a program to termination, returning one deep-copied state per
    /// executed step (the initial state is excluded). The trace ends with
    /// an identity terminal entry, so the final state appears twice for
    /// any program that executed at least one instruction.
    pub fn debug(&self, program: &I::Program) -> Vec<I::State> {
        self.trace(self.instruction_set.initial_state(program))
    }

    /// Run a caller-supplied state to termination without mutating it.
    pub fn state_evaluate(&self, state: &I::State) -> I::State {
        let mut next = state.clone();
        self.run(&mut next);
        next
    }

    /// Trace a caller-supplied state to termination without mutating it.
    /// Excludes the supplied state, includes the terminal state.
    pub fn state_debug(&self, state: &I::State) -> Vec<I::State> {
        self.trace(state.clone())
    }

    /// Apply one step to a clone of `state`. If the stopping predicate
    /// already holds, the clone is returned unchanged.
    pub fn state_step(&self, state: &I::State) -> I::State {
        let mut next = state.clone();
        self.state_step_mutate(&mut next);
        next
    }

    /// Apply one step to `state` in place. This is the hot path for real
    /// validation; the cloning entrypoints delegate to it.
    pub fn state_step_mutate(&self, state: &mut I::State) {
        if !self.instruction_set.can_continue(state) {
            return;
        }
        let opcode = match self.instruction_set.next_opcode(state) {
            Some(opcode) => opcode,
            None => return,
        };
        match self.instruction_set.operation(opcode) {
            Some(operation) => operation(state),
            None => self.instruction_set.undefined(state),
        }
    }

    /// Terminal success verdict for a finished state.
    pub fn verify(&self, state: &I::State) -> bool {
        self.instruction_set.verify(state)
    }

    fn run(&self, state: &mut I::State) {
        while self.instruction_set.can_continue(state) {
            self.state_step_mutate(state);
        }
    }

    fn trace(&self, mut state: I::State) -> Vec<I::State> {
        let mut states = Vec::new();
        while self.instruction_set.can_continue(&state) {
            self.state_step_mutate(&mut state);
            states.push(state.clone());
        }
        // A step on a terminated state is an identity transition.
        states.push(state);
        states
    }
}
