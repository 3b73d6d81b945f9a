//! Built-in words every runtime starts with.
//!
//! | Group | Words |
//! |---|---|
//! | arithmetic | `+ - * / mod neg abs min max floor` |
//! | transcendental | `sin cos tanh exp pow sqrt` |
//! | comparison | `< > = <= >=` (push 1 or 0) |
//! | logic | `and or not` (non-zero is true) |
//! | selection | `?` picks `a` when `c` is non-zero, else `b`: `( c a b -- x )` |
//! | stack | `dup drop swap over rot nip tuck clear depth` |
//! | constants | `pi tau` |
//! | transport | `playing?` |
//! | output | `>out1 >out2` |
//!
//! Division and `mod` by zero yield 0, never infinity or NaN. `mod` is
//! Euclidean: the result is never negative.

use crate::collection::Outputs;
use crate::control::Transport;
use crate::dictionary::{Dictionary, Operation};
use crate::error::StackError;
use std::f64::consts::{PI, TAU};
use std::sync::Arc;

/// Register every built-in word into `dictionary`.
pub fn install(dictionary: &mut Dictionary, outputs: &Arc<Outputs>, transport: &Transport) {
    arithmetic(dictionary);
    transcendental(dictionary);
    logic(dictionary);
    stack(dictionary);

    dictionary.define("pi", Operation::Literal(PI));
    dictionary.define("tau", Operation::Literal(TAU));

    let transport = transport.clone();
    dictionary.register("playing?", move |s| s.push(truth(transport.is_playing())));

    let out = Arc::clone(outputs);
    dictionary.register(">out1", move |s| {
        out.set_left(s.pop()? as f32);
        Ok(())
    });
    let out = Arc::clone(outputs);
    dictionary.register(">out2", move |s| {
        out.set_right(s.pop()? as f32);
        Ok(())
    });
}

#[inline]
fn truth(flag: bool) -> f64 {
    f64::from(flag)
}

fn unary(dictionary: &mut Dictionary, name: &str, f: fn(f64) -> f64) {
    dictionary.register(name, move |s| {
        let a = s.pop()?;
        s.push(f(a))
    });
}

fn binary(dictionary: &mut Dictionary, name: &str, f: fn(f64, f64) -> f64) {
    dictionary.register(name, move |s| {
        let (a, b) = s.pop2()?;
        s.push(f(a, b))
    });
}

fn arithmetic(d: &mut Dictionary) {
    binary(d, "+", |a, b| a + b);
    binary(d, "-", |a, b| a - b);
    binary(d, "*", |a, b| a * b);
    binary(d, "/", |a, b| if b == 0.0 { 0.0 } else { a / b });
    binary(d, "mod", |a, b| if b == 0.0 { 0.0 } else { a.rem_euclid(b) });
    binary(d, "min", f64::min);
    binary(d, "max", f64::max);
    unary(d, "neg", |a| -a);
    unary(d, "abs", f64::abs);
    unary(d, "floor", f64::floor);
}

fn transcendental(d: &mut Dictionary) {
    unary(d, "sin", f64::sin);
    unary(d, "cos", f64::cos);
    unary(d, "tanh", f64::tanh);
    unary(d, "exp", f64::exp);
    unary(d, "sqrt", f64::sqrt);
    binary(d, "pow", f64::powf);
}

fn logic(d: &mut Dictionary) {
    binary(d, "<", |a, b| truth(a < b));
    binary(d, ">", |a, b| truth(a > b));
    binary(d, "=", |a, b| truth(a == b));
    binary(d, "<=", |a, b| truth(a <= b));
    binary(d, ">=", |a, b| truth(a >= b));
    binary(d, "and", |a, b| truth(a != 0.0 && b != 0.0));
    binary(d, "or", |a, b| truth(a != 0.0 || b != 0.0));
    unary(d, "not", |a| truth(a == 0.0));
    d.register("?", |s| {
        if s.len() < 3 {
            return Err(StackError::Underflow);
        }
        let (a, b) = s.pop2()?;
        let c = s.pop()?;
        s.push(if c != 0.0 { a } else { b })
    });
}

fn stack(d: &mut Dictionary) {
    d.register("dup", |s| {
        let a = s.peek()?;
        s.push(a)
    });
    d.register("drop", |s| s.pop().map(drop));
    d.register("swap", |s| {
        let (a, b) = s.pop2()?;
        s.push(b)?;
        s.push(a)
    });
    d.register("over", |s| {
        let a = s.pick(1)?;
        s.push(a)
    });
    d.register("rot", |s| {
        let c = s.pick(2)?;
        let (a, b) = s.pop2()?;
        s.pop()?;
        s.push(a)?;
        s.push(b)?;
        s.push(c)
    });
    d.register("nip", |s| {
        let (_, b) = s.pop2()?;
        s.push(b)
    });
    d.register("tuck", |s| {
        let (a, b) = s.pop2()?;
        s.push(b)?;
        s.push(a)?;
        s.push(b)
    });
    d.register("clear", |s| {
        s.clear();
        Ok(())
    });
    d.register("depth", |s| s.push(s.len() as f64));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::error::RuntimeError;
    use crate::machine::Machine;
    use crate::token::tokenize;

    fn eval(source: &str) -> Result<Vec<f64>, RuntimeError> {
        let mut dictionary = Dictionary::new();
        install(&mut dictionary, &Arc::new(Outputs::new()), &Transport::default());
        let program = compile(tokenize(source), &dictionary)
            .unwrap()
            .commit(&mut dictionary);
        let mut machine = Machine::new(32);
        machine.install(program);
        machine.run()?;
        Ok(machine.stack().as_slice().to_vec())
    }

    #[test]
    fn arithmetic_operand_order() {
        assert_eq!(eval("10 4 -").unwrap(), vec![6.0]);
        assert_eq!(eval("10 4 /").unwrap(), vec![2.5]);
        assert_eq!(eval("2 3 pow").unwrap(), vec![8.0]);
        assert_eq!(eval("3 7 min 3 7 max").unwrap(), vec![3.0, 7.0]);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval("1 0 / 5 0 mod").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn mod_is_euclidean() {
        assert_eq!(eval("-1 4 mod 7 4 mod").unwrap(), vec![3.0, 3.0]);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval("1 2 < 1 2 > 2 2 =").unwrap(), vec![1.0, 0.0, 1.0]);
        assert_eq!(eval("1 0 and 1 0 or 0 not").unwrap(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn select() {
        assert_eq!(eval("1 10 20 ?").unwrap(), vec![10.0]);
        assert_eq!(eval("0 10 20 ?").unwrap(), vec![20.0]);
    }

    #[test]
    fn select_underflow_leaves_stack() {
        let err = eval("1 2 ?").unwrap_err();
        assert_eq!(err.word(), "?");
    }

    #[test]
    fn stack_shuffles() {
        assert_eq!(eval("1 2 swap").unwrap(), vec![2.0, 1.0]);
        assert_eq!(eval("1 2 over").unwrap(), vec![1.0, 2.0, 1.0]);
        assert_eq!(eval("1 2 3 rot").unwrap(), vec![2.0, 3.0, 1.0]);
        assert_eq!(eval("1 2 nip").unwrap(), vec![2.0]);
        assert_eq!(eval("1 2 tuck").unwrap(), vec![2.0, 1.0, 2.0]);
        assert_eq!(eval("4 dup depth").unwrap(), vec![4.0, 4.0, 2.0]);
        assert_eq!(eval("1 2 3 clear").unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn underflow_is_attributed() {
        assert_eq!(eval("1 +").unwrap_err().word(), "+");
        assert_eq!(eval("swap").unwrap_err().word(), "swap");
        assert_eq!(eval("1 2 rot").unwrap_err().word(), "rot");
    }

    #[test]
    fn constants() {
        assert_eq!(eval("pi tau").unwrap(), vec![PI, TAU]);
    }

    #[test]
    fn outputs_write_registers() {
        let outputs = Arc::new(Outputs::new());
        let mut dictionary = Dictionary::new();
        install(&mut dictionary, &outputs, &Transport::default());
        let program = compile(tokenize("0.5 >out1 0.25 >out2 0.75 >out1"), &dictionary)
            .unwrap()
            .commit(&mut dictionary);
        let mut machine = Machine::new(8);
        machine.install(program);
        machine.run().unwrap();
        assert_eq!(outputs.get(), (0.75, 0.25));
    }

    #[test]
    fn playing_reflects_transport() {
        let transport = Transport::default();
        let mut dictionary = Dictionary::new();
        install(&mut dictionary, &Arc::new(Outputs::new()), &transport);
        let program = compile(tokenize("playing?"), &dictionary)
            .unwrap()
            .commit(&mut dictionary);
        let mut machine = Machine::new(8);
        machine.install(program);
        machine.run().unwrap();
        transport.set(true);
        machine.run().unwrap();
        assert_eq!(machine.stack().as_slice(), &[0.0, 1.0]);
    }
}
