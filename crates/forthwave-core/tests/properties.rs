//! Property-based tests for forthwave-core.
//!
//! Covers instruction counts, run determinism, output register reset and
//! failed-rebuild idempotence with randomly generated programs.

use forthwave_core::{Dictionary, Runtime, compile, tokenize};
use proptest::prelude::*;

/// One generated source item.
#[derive(Debug, Clone)]
enum Item {
    Number(i32),
    Word(&'static str),
    Definition(Vec<Item>),
}

const WORDS: &[&str] = &["+", "-", "*", "dup", "drop", "swap", "over", "abs", "neg"];
const BINARY: &[&str] = &["+", "-", "*", "max", "min"];

fn atom() -> impl Strategy<Value = Item> {
    prop_oneof![
        (-100i32..100).prop_map(Item::Number),
        prop::sample::select(WORDS).prop_map(Item::Word),
    ]
}

fn item() -> impl Strategy<Value = Item> {
    atom().prop_recursive(2, 16, 6, |inner| {
        prop_oneof![
            3 => atom(),
            1 => prop::collection::vec(inner, 0..6).prop_map(Item::Definition),
        ]
    })
}

/// Render items to source, naming definitions `d0`, `d1`, ...
fn render_source(items: &[Item], next_name: &mut usize, out: &mut String) {
    for item in items {
        match item {
            Item::Number(n) => out.push_str(&format!("{n} ")),
            Item::Word(w) => out.push_str(&format!("{w} ")),
            Item::Definition(body) => {
                out.push_str(&format!(": d{} ", *next_name));
                *next_name += 1;
                render_source(body, next_name, out);
                out.push_str("; ");
            }
        }
    }
}

fn source_of(items: &[Item]) -> String {
    let mut out = String::new();
    render_source(items, &mut 0, &mut out);
    out
}

fn arithmetic_program() -> impl Strategy<Value = String> {
    // Every word is preceded by enough literals, so runs never underflow.
    prop::collection::vec(
        (
            -8i32..8,
            -8i32..8,
            prop::sample::select(BINARY),
        ),
        1..8,
    )
    .prop_map(|ops| {
        let body: Vec<String> = ops
            .iter()
            .map(|(a, b, w)| format!("{a} {b} {w} drop"))
            .collect();
        format!("{} 0.125 dup >out1 >out2", body.join(" "))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Top-level instruction count equals the number of tokens outside
    /// definitions.
    #[test]
    fn instruction_count_excludes_definitions(items in prop::collection::vec(item(), 0..24)) {
        let mut dictionary = Dictionary::new();
        for w in WORDS {
            dictionary.register(*w, |_| Ok(()));
        }
        let source = source_of(&items);
        let expected = items
            .iter()
            .filter(|i| !matches!(i, Item::Definition(_)))
            .count();

        let compiled = compile(tokenize(&source), &dictionary).unwrap();
        prop_assert_eq!(compiled.program.len(), expected);
    }

    /// Two runtimes fed the same program produce identical stacks.
    #[test]
    fn runs_are_deterministic(values in prop::collection::vec(-1000.0f64..1000.0, 1..12)) {
        let mut source: String = values.iter().map(|v| format!("{v:.3} ")).collect();
        source.push_str("dup * swap abs over");

        let a = Runtime::default();
        let b = Runtime::default();
        a.build(&source).unwrap();
        b.build(&source).unwrap();

        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        let ra = a.process_block(&mut left, &mut right).is_ok();
        let rb = b.process_block(&mut left, &mut right).is_ok();
        prop_assert_eq!(ra, rb);

        let sa: Vec<u64> = a.stack_snapshot().iter().map(|v| v.to_bits()).collect();
        let sb: Vec<u64> = b.stack_snapshot().iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(sa, sb);
    }

    /// Output registers start every run at zero, whatever the last run wrote.
    #[test]
    fn outputs_reset_before_each_run(level in -1.0f32..1.0) {
        let runtime = Runtime::default();
        runtime.build(&format!("{level:.4} dup >out1 >out2")).unwrap();
        let mut left = [0.0f32; 1];
        let mut right = [0.0f32; 1];
        runtime.process_block(&mut left, &mut right).unwrap();

        runtime.build("1 drop").unwrap();
        runtime.process_block(&mut left, &mut right).unwrap();
        prop_assert_eq!((left[0], right[0]), (0.0, 0.0));
    }

    /// A failed rebuild leaves rendering exactly as it was.
    #[test]
    fn failed_rebuild_is_idempotent(program in arithmetic_program(), bad in "[a-z]{3,8}") {
        let reference = Runtime::default();
        let subject = Runtime::default();
        reference.build(&program).unwrap();
        subject.build(&program).unwrap();

        let broken = format!("{program} : extra 1 ; zz{bad}");
        prop_assert!(subject.build(&broken).is_err());
        prop_assert!(!subject.contains("extra"));

        let mut expected = ([0.0f32; 32], [0.0f32; 32]);
        let mut actual = ([0.0f32; 32], [0.0f32; 32]);
        reference.process_block(&mut expected.0, &mut expected.1).unwrap();
        subject.process_block(&mut actual.0, &mut actual.1).unwrap();
        prop_assert_eq!(expected, actual);
        prop_assert_eq!(reference.stack_snapshot(), subject.stack_snapshot());
    }
}
