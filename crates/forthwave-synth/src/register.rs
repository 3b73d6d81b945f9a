//! Named scalar variables `A` through `Z`.
//!
//! `>A ( v -- )` stores, `A ( -- v )` fetches. Values persist across samples
//! and rebuilds.

use forthwave_core::{ControlValue, Runtime};

/// Register names, in registration order.
pub const NAMES: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Register one variable under `name`.
pub fn register(runtime: &Runtime, name: &str) {
    let cell = ControlValue::new(0.0);
    let store = cell.clone();
    runtime.register(format!(">{name}"), move |s| {
        store.set(s.pop()?);
        Ok(())
    });
    runtime.register(name, move |s| s.push(cell.get()));
}

/// Register `A` through `Z`.
pub fn register_all(runtime: &Runtime) {
    let mut buf = [0u8; 4];
    for letter in NAMES.chars() {
        register(runtime, letter.encode_utf8(&mut buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_persist_across_samples() {
        let runtime = Runtime::default();
        register_all(&runtime);
        runtime.build("A 0.25 + dup >A >out1").unwrap();
        let mut left = [0.0; 3];
        let mut right = [0.0; 3];
        runtime.process_block(&mut left, &mut right).unwrap();
        assert_eq!(left, [0.25, 0.5, 0.75]);
        assert!(runtime.contains(">Z") && runtime.contains("Z"));
    }
}
