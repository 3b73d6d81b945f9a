//! Compiled instruction sequences.

use crate::dictionary::Operation;
use std::sync::Arc;

/// One compiled step.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// Push a literal value.
    Push(f64),
    /// Invoke an operation resolved at compile time.
    ///
    /// The name is kept for fault attribution only; execution never looks it up.
    Invoke {
        /// Name the operation was resolved under.
        name: Arc<str>,
        /// The bound operation.
        op: Operation,
    },
}

/// A fully resolved instruction sequence, executed front to back once per run.
#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Wrap a resolved instruction sequence.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// A program that does nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of top-level instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether there are no top-level instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The top-level instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}
