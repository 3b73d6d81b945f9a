//! Token stream to [`Program`] compilation.
//!
//! Compilation is a single left-to-right pass. Outside a definition, numbers
//! become [`Instruction::Push`] and names become [`Instruction::Invoke`] bound
//! to the dictionary entry current at that point. A definition
//! (`: name body ;`) compiles its body into its own instruction sequence and
//! emits nothing at the definition site; it may contain further definitions.
//!
//! Definitions are staged: later tokens of the same build see them, but the
//! dictionary is only touched by the caller after the whole build succeeds.
//! A failed compile therefore leaves both the dictionary and the running
//! program untouched.
//!
//! User words execute by recursion, so a definition whose chain of nested
//! word calls is deeper than [`MAX_CALL_DEPTH`] is rejected.

use crate::dictionary::{Dictionary, Operation};
use crate::error::CompileError;
use crate::program::{Instruction, Program};
use crate::token::{Token, TokenKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Deepest chain of nested user-word calls a definition may contain.
pub const MAX_CALL_DEPTH: usize = 256;

/// Result of a successful compile.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// The top-level program.
    pub program: Program,
    /// User words defined by the source, in definition order. A name defined
    /// twice appears twice; committing them in order leaves the last one.
    pub definitions: Vec<(String, Operation)>,
}

impl Compiled {
    /// Names of the defined words, in definition order.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|(name, _)| name.as_str())
    }

    /// Write the staged definitions into `dictionary` and return the program.
    pub fn commit(self, dictionary: &mut Dictionary) -> Program {
        for (name, op) in self.definitions {
            dictionary.define(name, op);
        }
        self.program
    }
}

/// Compile a token stream against `dictionary`.
pub fn compile<'a, I>(tokens: I, dictionary: &Dictionary) -> Result<Compiled, CompileError>
where
    I: IntoIterator<Item = Token<'a>>,
{
    Compiler::new(dictionary).run(tokens.into_iter())
}

/// A body under construction. The outermost frame is the program itself.
struct Frame<'a> {
    name: Option<Token<'a>>,
    body: Vec<Instruction>,
}

struct Compiler<'d> {
    dictionary: &'d Dictionary,
    staged: HashMap<String, Operation>,
    definitions: Vec<(String, Operation)>,
    // Call depth of every word body seen, keyed by body address. Every key
    // stays alive for the whole compile.
    depths: HashMap<usize, usize>,
}

fn body_key(body: &Arc<[Instruction]>) -> usize {
    Arc::as_ptr(body).cast::<Instruction>() as usize
}

impl<'d> Compiler<'d> {
    fn new(dictionary: &'d Dictionary) -> Self {
        Self {
            dictionary,
            staged: HashMap::new(),
            definitions: Vec::new(),
            depths: HashMap::new(),
        }
    }

    fn resolve(&self, name: &str) -> Option<&Operation> {
        self.staged
            .get(name)
            .or_else(|| self.dictionary.lookup(name))
    }

    fn run<'a>(mut self, mut tokens: impl Iterator<Item = Token<'a>>) -> Result<Compiled, CompileError> {
        let mut frames = vec![Frame {
            name: None,
            body: Vec::new(),
        }];

        while let Some(token) = tokens.next() {
            match token.kind {
                TokenKind::Number(value) => emit(&mut frames, Instruction::Push(value)),
                TokenKind::Name => {
                    let instruction = self.invoke(&token)?;
                    emit(&mut frames, instruction);
                }
                TokenKind::DefinitionStart => {
                    let name = tokens.next().ok_or(CompileError::MissingWordName {
                        line: token.location.line,
                        column: token.location.column,
                    })?;
                    if name.kind != TokenKind::Name {
                        return Err(CompileError::InvalidWordName {
                            name: name.text.to_string(),
                            line: name.location.line,
                            column: name.location.column,
                        });
                    }
                    frames.push(Frame {
                        name: Some(name),
                        body: Vec::new(),
                    });
                }
                TokenKind::DefinitionEnd => {
                    let unexpected = CompileError::UnexpectedDefinitionEnd {
                        line: token.location.line,
                        column: token.location.column,
                    };
                    if frames.len() < 2 {
                        return Err(unexpected);
                    }
                    let Some(Frame {
                        name: Some(name),
                        body,
                    }) = frames.pop()
                    else {
                        return Err(unexpected);
                    };
                    let depth = 1 + self.body_depth(&body);
                    if depth > MAX_CALL_DEPTH {
                        return Err(CompileError::CallDepthExceeded {
                            name: name.text.to_string(),
                            limit: MAX_CALL_DEPTH,
                            line: name.location.line,
                            column: name.location.column,
                        });
                    }
                    let body: Arc<[Instruction]> = Arc::from(body);
                    self.depths.insert(body_key(&body), depth);
                    self.stage(name.text, Operation::Word(body));
                }
            }
        }

        if let Some(open) = frames.last().and_then(|f| f.name) {
            return Err(CompileError::UnterminatedDefinition {
                name: open.text.to_string(),
                line: open.location.line,
                column: open.location.column,
            });
        }

        let body = frames.pop().map(|f| f.body).unwrap_or_default();
        Ok(Compiled {
            program: Program::new(body),
            definitions: self.definitions,
        })
    }

    fn invoke(&self, token: &Token<'_>) -> Result<Instruction, CompileError> {
        match self.resolve(token.text) {
            Some(Operation::Literal(value)) => Ok(Instruction::Push(*value)),
            Some(op) => Ok(Instruction::Invoke {
                name: Arc::from(token.text),
                op: op.clone(),
            }),
            None => Err(CompileError::UnresolvedWord {
                name: token.text.to_string(),
                line: token.location.line,
                column: token.location.column,
            }),
        }
    }

    /// Deepest word nesting reached from `body`, not counting `body` itself.
    fn body_depth(&mut self, body: &[Instruction]) -> usize {
        body.iter()
            .filter_map(|instruction| match instruction {
                Instruction::Invoke {
                    op: Operation::Word(inner),
                    ..
                } => Some(inner),
                _ => None,
            })
            .map(|inner| self.word_depth(inner))
            .max()
            .unwrap_or(0)
    }

    fn word_depth(&mut self, body: &Arc<[Instruction]>) -> usize {
        let key = body_key(body);
        if let Some(&depth) = self.depths.get(&key) {
            return depth;
        }
        let depth = 1 + self.body_depth(body);
        self.depths.insert(key, depth);
        depth
    }

    fn stage(&mut self, name: &str, op: Operation) {
        self.staged.insert(name.to_string(), op.clone());
        self.definitions.push((name.to_string(), op));
    }
}

fn emit(frames: &mut [Frame<'_>], instruction: Instruction) {
    if let Some(frame) = frames.last_mut() {
        frame.body.push(instruction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Stack;
    use crate::token::tokenize;

    fn arithmetic() -> Dictionary {
        let mut dictionary = Dictionary::new();
        dictionary.register("+", |s| {
            let (a, b) = s.pop2()?;
            s.push(a + b)
        });
        dictionary.register("*", |s| {
            let (a, b) = s.pop2()?;
            s.push(a * b)
        });
        dictionary
    }

    fn compile_str(source: &str, dictionary: &Dictionary) -> Result<Compiled, CompileError> {
        compile(tokenize(source), dictionary)
    }

    #[test]
    fn empty_source_compiles_to_empty_program() {
        let compiled = compile_str("", &Dictionary::new()).unwrap();
        assert!(compiled.program.is_empty());
        assert!(compiled.definitions.is_empty());
    }

    #[test]
    fn numbers_and_names() {
        let compiled = compile_str("3 4 +", &arithmetic()).unwrap();
        let instructions = compiled.program.instructions();
        assert_eq!(instructions.len(), 3);
        assert!(matches!(instructions[0], Instruction::Push(v) if v == 3.0));
        assert!(matches!(&instructions[2], Instruction::Invoke { name, .. } if &**name == "+"));
    }

    #[test]
    fn definitions_are_not_inlined() {
        let compiled = compile_str(": double 2 * ; 5 double", &arithmetic()).unwrap();
        assert_eq!(compiled.program.len(), 2);
        assert_eq!(compiled.definition_names().collect::<Vec<_>>(), vec!["double"]);
        let (_, op) = &compiled.definitions[0];
        assert!(matches!(op, Operation::Word(body) if body.len() == 2));
    }

    #[test]
    fn nested_definition_is_registered_before_outer_continues() {
        let compiled =
            compile_str(": quad : double 2 * ; double double ; 1 quad", &arithmetic()).unwrap();
        assert_eq!(compiled.program.len(), 2);
        assert_eq!(
            compiled.definition_names().collect::<Vec<_>>(),
            vec!["double", "quad"]
        );
        let quad = compiled
            .definitions
            .iter()
            .find(|(n, _)| n == "quad")
            .map(|(_, op)| op.clone());
        assert!(matches!(quad, Some(Operation::Word(body)) if body.len() == 2));
    }

    #[test]
    fn literals_compile_to_push() {
        let mut dictionary = Dictionary::new();
        dictionary.define("srate", Operation::Literal(48000.0));
        let compiled = compile_str("srate", &dictionary).unwrap();
        assert!(matches!(compiled.program.instructions()[0], Instruction::Push(v) if v == 48000.0));
    }

    #[test]
    fn unresolved_word_fails() {
        let err = compile_str("7 bogus", &arithmetic()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnresolvedWord {
                name: "bogus".into(),
                line: 1,
                column: 3
            }
        );
    }

    #[test]
    fn forward_reference_fails() {
        let err = compile_str(": a b ; : b 1 ;", &arithmetic()).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedWord { name, .. } if name == "b"));
    }

    #[test]
    fn marker_errors() {
        let dictionary = arithmetic();
        assert!(matches!(
            compile_str(":", &dictionary),
            Err(CompileError::MissingWordName { line: 1, column: 1 })
        ));
        assert!(matches!(
            compile_str(": 5 ;", &dictionary),
            Err(CompileError::InvalidWordName { .. })
        ));
        assert!(matches!(
            compile_str(": ; ;", &dictionary),
            Err(CompileError::InvalidWordName { .. })
        ));
        assert!(matches!(
            compile_str("1 ;", &dictionary),
            Err(CompileError::UnexpectedDefinitionEnd { line: 1, column: 3 })
        ));
        assert!(matches!(
            compile_str(": foo 1 2 +", &dictionary),
            Err(CompileError::UnterminatedDefinition { name, .. }) if name == "foo"
        ));
    }

    #[test]
    fn failed_compile_leaves_dictionary_untouched() {
        let dictionary = arithmetic();
        let before = dictionary.len();
        assert!(compile_str(": fine 1 ; nope", &dictionary).is_err());
        assert_eq!(dictionary.len(), before);
        assert!(!dictionary.contains("fine"));
    }

    #[test]
    fn call_sites_bind_at_compile_time() {
        // The first `k` binds to the first definition, the second to the redefinition.
        let compiled = compile_str(": k 1 ; k : k 2 ; k", &Dictionary::new()).unwrap();
        let mut stack = Stack::new();
        for instruction in compiled.program.instructions() {
            if let Instruction::Invoke {
                op: Operation::Word(body),
                ..
            } = instruction
            {
                for inner in body.iter() {
                    if let Instruction::Push(v) = inner {
                        stack.push(*v).unwrap();
                    }
                }
            }
        }
        assert_eq!(stack.as_slice(), &[1.0, 2.0]);
    }

    fn chain(words: usize) -> String {
        let mut source = String::from(": w0 1 ;");
        for i in 1..words {
            source.push_str(&format!(" : w{i} w{} ;", i - 1));
        }
        source
    }

    #[test]
    fn call_depth_limit_is_inclusive() {
        let compiled = compile_str(&chain(MAX_CALL_DEPTH), &Dictionary::new()).unwrap();
        assert_eq!(compiled.definitions.len(), MAX_CALL_DEPTH);
    }

    #[test]
    fn too_deep_definition_is_rejected() {
        let err = compile_str(&chain(MAX_CALL_DEPTH + 1), &Dictionary::new()).unwrap_err();
        let expected = format!("w{MAX_CALL_DEPTH}");
        assert!(matches!(
            err,
            CompileError::CallDepthExceeded { ref name, limit: MAX_CALL_DEPTH, .. } if *name == expected
        ));
    }

    #[test]
    fn depth_counts_words_from_earlier_builds() {
        let mut dictionary = Dictionary::new();
        compile_str(&chain(MAX_CALL_DEPTH), &dictionary)
            .unwrap()
            .commit(&mut dictionary);
        let last = MAX_CALL_DEPTH - 1;
        assert!(compile_str(&format!("w{last}"), &dictionary).is_ok());
        assert!(matches!(
            compile_str(&format!(": deeper w{last} ;"), &dictionary),
            Err(CompileError::CallDepthExceeded { .. })
        ));
    }

    #[test]
    fn shared_callees_are_measured_once() {
        // Each word calls the previous one twice; a naive walk would visit 2^64 bodies.
        let mut source = String::from(": d0 1 ;");
        for i in 1..64 {
            source.push_str(&format!(" : d{i} d{p} d{p} ;", p = i - 1));
        }
        assert!(compile_str(&source, &Dictionary::new()).is_ok());
    }

    #[test]
    fn commit_applies_in_order() {
        let mut dictionary = Dictionary::new();
        let compiled = compile_str(": k 1 ; : k 2 3 ;", &dictionary).unwrap();
        compiled.commit(&mut dictionary);
        assert!(matches!(dictionary.lookup("k"), Some(Operation::Word(body)) if body.len() == 2));
    }
}
