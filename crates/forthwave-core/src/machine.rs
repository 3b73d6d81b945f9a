//! The stack machine that executes an installed [`Program`].

use crate::dictionary::Operation;
use crate::error::RuntimeError;
use crate::program::{Instruction, Program};
use crate::stack::{DEFAULT_STACK_LIMIT, Stack};
use std::sync::Arc;

/// Name faults raised by a literal push are attributed to.
pub const LITERAL_WORD: &str = "<literal>";

/// Executes the installed program over a persistent operand stack.
///
/// The stack survives between runs, so values left by one sample are visible
/// to the next. With no program installed, [`run`](Self::run) does nothing.
#[derive(Debug)]
pub struct Machine {
    stack: Stack,
    program: Option<Program>,
    literal: Arc<str>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_LIMIT)
    }
}

impl Machine {
    /// Create a machine with an empty stack of the given depth ceiling.
    pub fn new(stack_limit: usize) -> Self {
        Self {
            stack: Stack::with_limit(stack_limit),
            program: None,
            literal: Arc::from(LITERAL_WORD),
        }
    }

    /// Install `program`, returning the one it replaces.
    ///
    /// The returned program should be dropped by the caller once any lock
    /// guarding the machine has been released.
    pub fn install(&mut self, program: Program) -> Option<Program> {
        self.program.replace(program)
    }

    /// Remove the installed program.
    pub fn uninstall(&mut self) -> Option<Program> {
        self.program.take()
    }

    /// Whether a program is installed.
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// The installed program.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Execute the installed program once, front to back.
    ///
    /// Stops at the first failing instruction; the stack is left as that
    /// instruction left it.
    #[inline]
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        match &self.program {
            Some(program) => execute(&mut self.stack, program.instructions(), &self.literal),
            None => Ok(()),
        }
    }

    /// The operand stack.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Mutable access to the operand stack.
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Drop every value on the operand stack.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }
}

// Recursion depth is bounded by the compiler's call depth limit.
fn execute(
    stack: &mut Stack,
    instructions: &[Instruction],
    literal: &Arc<str>,
) -> Result<(), RuntimeError> {
    for instruction in instructions {
        match instruction {
            Instruction::Push(value) => stack
                .push(*value)
                .map_err(|e| RuntimeError::in_word(literal, e))?,
            Instruction::Invoke { name, op } => match op {
                Operation::Native(f) => f(stack).map_err(|e| RuntimeError::in_word(name, e))?,
                Operation::Word(body) => execute(stack, body, literal)?,
                Operation::Literal(value) => stack
                    .push(*value)
                    .map_err(|e| RuntimeError::in_word(name, e))?,
            },
        }
    }
    Ok(())
}
