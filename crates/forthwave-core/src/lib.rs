//! Forthwave Core - interpreter and sample scheduler for live-coded audio
//!
//! A program is plain text in a small Forth-style language. It is compiled
//! against a dictionary of named operations and then run once per output
//! sample. Control threads may recompile it at any time while audio plays.
//!
//! # Components
//!
//! - [`Tokenizer`] - lazy, restartable split of source text into [`Token`]s
//! - [`Dictionary`] - name to [`Operation`] mapping shared by natives and user words
//! - [`compile`] - tokens to a fully resolved [`Program`]
//! - [`Machine`] - executes a program over a persistent [`Stack`]
//! - [`Collection`] - per-sample ticks, one run, two output registers
//! - [`Runtime`] - the locking that lets rebuilds race rendering safely
//!
//! # Example
//!
//! ```rust
//! use forthwave_core::Runtime;
//!
//! let runtime = Runtime::default();
//! runtime.build(": half 0.5 * ; 1 half >out1").unwrap();
//!
//! let mut left = [0.0f32; 4];
//! let mut right = [0.0f32; 4];
//! runtime.process_block(&mut left, &mut right).unwrap();
//! assert_eq!(left, [0.5; 4]);
//! assert_eq!(right, [0.0; 4]);
//! ```
//!
//! # Language
//!
//! Words are separated by whitespace. A decimal literal pushes itself, any
//! other word invokes the operation of that name. `: name body ;` defines a
//! word; definitions may nest and may be redefined by later builds. Names
//! must already exist when referenced, so there are no forward references.
//! `( ... )` and `\` start comments.
//!
//! # Features
//!
//! - `tracing` - emit `tracing` events for builds and transport changes.
//!   Nothing is logged from the per-sample path.

pub mod collection;
pub mod compiler;
pub mod control;
pub mod dictionary;
pub mod error;
pub mod machine;
pub mod program;
pub mod runtime;
pub mod stack;
pub mod token;
pub mod words;

pub use collection::{Collection, Outputs, Ticker};
pub use compiler::{Compiled, MAX_CALL_DEPTH, compile};
pub use control::{ControlValue, Transport};
pub use dictionary::{Dictionary, NativeFn, Operation, OperationKind};
pub use error::{CompileError, RuntimeError, StackError};
pub use machine::{LITERAL_WORD, Machine};
pub use program::{Instruction, Program};
pub use runtime::{BuildReport, Runtime, RuntimeConfig};
pub use stack::{DEFAULT_STACK_LIMIT, MAX_STACK_LIMIT, Stack};
pub use token::{Location, Token, TokenKind, Tokenizer, parse_decimal, tokenize};
