//! Error types for compilation and execution.

use std::sync::Arc;
use thiserror::Error;

/// A failed build. The previously installed program keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A name token has no dictionary entry.
    #[error("unresolved word '{name}' at {line}:{column}")]
    UnresolvedWord {
        /// The name as written in the source.
        name: String,
        /// Line of the token.
        line: usize,
        /// Column of the token.
        column: usize,
    },

    /// `:` at the very end of the source.
    #[error("missing word name after ':' at {line}:{column}")]
    MissingWordName {
        /// Line of the `:` marker.
        line: usize,
        /// Column of the `:` marker.
        column: usize,
    },

    /// A number or marker follows `:` where a name was expected.
    #[error("'{name}' cannot be used as a word name at {line}:{column}")]
    InvalidWordName {
        /// The offending text.
        name: String,
        /// Line of the offending token.
        line: usize,
        /// Column of the offending token.
        column: usize,
    },

    /// `;` with no open definition.
    #[error("';' without a matching ':' at {line}:{column}")]
    UnexpectedDefinitionEnd {
        /// Line of the `;` marker.
        line: usize,
        /// Column of the `;` marker.
        column: usize,
    },

    /// The source ended inside a definition.
    #[error("definition of '{name}' at {line}:{column} is missing its ';'")]
    UnterminatedDefinition {
        /// Name of the open definition.
        name: String,
        /// Line of the definition's name.
        line: usize,
        /// Column of the definition's name.
        column: usize,
    },

    /// A definition calls words nested deeper than [`MAX_CALL_DEPTH`].
    ///
    /// [`MAX_CALL_DEPTH`]: crate::compiler::MAX_CALL_DEPTH
    #[error("definition of '{name}' at {line}:{column} nests calls deeper than {limit}")]
    CallDepthExceeded {
        /// Name of the rejected definition.
        name: String,
        /// The nesting limit.
        limit: usize,
        /// Line of the definition's name.
        line: usize,
        /// Column of the definition's name.
        column: usize,
    },

    /// The source bytes are not UTF-8.
    #[error("program source is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

impl CompileError {
    /// Line and column the error points at, 1-based.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Self::UnresolvedWord { line, column, .. }
            | Self::MissingWordName { line, column }
            | Self::InvalidWordName { line, column, .. }
            | Self::UnexpectedDefinitionEnd { line, column }
            | Self::UnterminatedDefinition { line, column, .. }
            | Self::CallDepthExceeded { line, column, .. } => Some((*line, *column)),
            Self::InvalidEncoding(_) => None,
        }
    }
}

/// Misuse of the operand stack by a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    /// Pop from an empty stack.
    #[error("stack underflow")]
    Underflow,

    /// Push past the depth ceiling.
    #[error("stack overflow (limit {limit})")]
    Overflow {
        /// The configured depth ceiling.
        limit: usize,
    },
}

/// A fault during a run, attributed to the operation that caused it.
///
/// Faults are fatal to the run that raised them: the scheduler uninstalls the
/// program and outputs silence until the next successful build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The named operation popped from an empty stack.
    #[error("stack underflow in '{word}'")]
    StackUnderflow {
        /// Innermost operation that failed.
        word: Arc<str>,
    },

    /// The named operation pushed past the depth ceiling.
    #[error("stack overflow in '{word}' (limit {limit})")]
    StackOverflow {
        /// Innermost operation that failed.
        word: Arc<str>,
        /// The configured depth ceiling.
        limit: usize,
    },
}

impl RuntimeError {
    /// Attribute a stack error to the word that raised it.
    pub fn in_word(word: &Arc<str>, error: StackError) -> Self {
        match error {
            StackError::Underflow => Self::StackUnderflow {
                word: Arc::clone(word),
            },
            StackError::Overflow { limit } => Self::StackOverflow {
                word: Arc::clone(word),
                limit,
            },
        }
    }

    /// Name of the operation that faulted.
    pub fn word(&self) -> &str {
        match self {
            Self::StackUnderflow { word } | Self::StackOverflow { word, .. } => word,
        }
    }
}
