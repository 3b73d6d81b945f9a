//! Name to operation mapping.
//!
//! Natives are registered by modules at construction time; user words are
//! defined by compiled programs. Both share one namespace and the last
//! registration under a name wins.

use crate::error::StackError;
use crate::program::Instruction;
use crate::stack::Stack;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// Behavior of a native operation: it receives the live stack and may pop and
/// push any number of values.
pub type NativeFn = Arc<dyn Fn(&mut Stack) -> Result<(), StackError> + Send + Sync>;

/// A named, invocable behavior.
#[derive(Clone)]
pub enum Operation {
    /// Implemented in Rust by a module.
    Native(NativeFn),
    /// A compiled user word, executed in place on the caller's stack.
    Word(Arc<[Instruction]>),
    /// A constant, compiled to a push.
    Literal(f64),
}

impl Operation {
    /// Wrap a closure as a native operation.
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
    {
        Self::Native(Arc::new(f))
    }

    /// The kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Native(_) => OperationKind::Native,
            Self::Word(_) => OperationKind::Word,
            Self::Literal(_) => OperationKind::Literal,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Native(..)"),
            Self::Word(body) => f.debug_tuple("Word").field(&body.len()).finish(),
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
        }
    }
}

/// Discriminant of an [`Operation`], for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Provided by a module.
    Native,
    /// Defined by a program.
    Word,
    /// A named constant.
    Literal,
}

impl OperationKind {
    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Word => "word",
            Self::Literal => "literal",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation namespace.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashMap<String, Operation>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native operation, replacing any entry under `name`.
    ///
    /// Returns the replaced entry.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> Option<Operation>
    where
        F: Fn(&mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
    {
        self.define(name, Operation::native(f))
    }

    /// Insert or overwrite the entry under `name`.
    pub fn define(&mut self, name: impl Into<String>, op: Operation) -> Option<Operation> {
        self.words.insert(name.into(), op)
    }

    /// Look up an operation by exact name.
    pub fn lookup(&self, name: &str) -> Option<&Operation> {
        self.words.get(name)
    }

    /// Whether `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.words.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.words.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over entries in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.words.iter().map(|(name, op)| (name.as_str(), op))
    }
}
