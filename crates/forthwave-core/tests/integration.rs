//! Integration tests for forthwave-core.
//!
//! Exercises the full path from source text to rendered buffers, including
//! rebuilds racing the audio thread.

use forthwave_core::{
    CompileError, MAX_CALL_DEPTH, Runtime, RuntimeConfig, RuntimeError, Stack, StackError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

fn render(runtime: &Runtime, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    runtime
        .process_block(&mut left, &mut right)
        .expect("render failed");
    (left, right)
}

// ============================================================================
// 1. End-to-end evaluation
// ============================================================================

#[test]
fn three_four_plus_leaves_seven() {
    let runtime = Runtime::default();
    runtime.build("3 4 +").unwrap();
    render(&runtime, 1);
    assert_eq!(runtime.stack_snapshot(), vec![7.0]);
}

#[test]
fn double_leaves_ten() {
    let runtime = Runtime::default();
    runtime.build(": double 2 * ; 5 double").unwrap();
    render(&runtime, 1);
    assert_eq!(runtime.stack_snapshot(), vec![10.0]);
}

#[test]
fn unresolved_name_keeps_previous_program() {
    let runtime = Runtime::default();
    runtime.build("0.5 dup >out1 >out2").unwrap();
    let err = runtime.build("7 bogus").unwrap_err();
    assert_eq!(
        err,
        CompileError::UnresolvedWord {
            name: "bogus".into(),
            line: 1,
            column: 3,
        }
    );
    let (left, right) = render(&runtime, 8);
    assert_eq!(left, vec![0.5; 8]);
    assert_eq!(right, vec![0.5; 8]);
}

#[test]
fn user_word_shadows_builtin_for_later_builds() {
    let runtime = Runtime::default();
    runtime.build(": + * ; 3 4 + >out1").unwrap();
    let (left, _) = render(&runtime, 1);
    assert_eq!(left, vec![12.0]);
}

#[test]
fn call_sites_keep_their_compile_time_binding() {
    let runtime = Runtime::default();
    runtime.build(": level 0.25 ; : out level >out1 ; out").unwrap();
    // `out` was compiled against the first `level`.
    runtime.build(": level 0.75 ; out").unwrap();
    let (left, _) = render(&runtime, 1);
    assert_eq!(left, vec![0.25]);

    runtime.build("level >out1").unwrap();
    let (left, _) = render(&runtime, 1);
    assert_eq!(left, vec![0.75]);
}

#[test]
fn comments_are_ignored() {
    let runtime = Runtime::default();
    runtime
        .build("( a comment ) 0.5 >out1 \\ trailing\n0.25 >out2")
        .unwrap();
    let (left, right) = render(&runtime, 1);
    assert_eq!((left[0], right[0]), (0.5, 0.25));
}

#[test]
fn module_state_via_ticks() {
    let runtime = Runtime::default();
    let counter = Arc::new(AtomicUsize::new(0));
    let tick_counter = Arc::clone(&counter);
    runtime.register_tick(move || {
        tick_counter.fetch_add(1, Ordering::Relaxed);
    });
    let read_counter = Arc::clone(&counter);
    runtime.register("ticks", move |s: &mut Stack| {
        s.push(read_counter.load(Ordering::Relaxed) as f64)
    });
    runtime.build("ticks >out1").unwrap();
    let (left, _) = render(&runtime, 4);
    // The tick runs before the program on every sample.
    assert_eq!(left, vec![1.0, 2.0, 3.0, 4.0]);
}

// ============================================================================
// 2. Runtime faults
// ============================================================================

#[test]
fn underflow_names_the_operation() {
    let runtime = Runtime::default();
    runtime.build("1 >out1 +").unwrap();
    let mut left = vec![0.0; 4];
    let mut right = vec![0.0; 4];
    let err = runtime.process_block(&mut left, &mut right).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::StackUnderflow {
            word: Arc::from("+")
        }
    );
    assert!(left.iter().all(|&s| s == 0.0));
}

#[test]
fn sustained_imbalance_overflows() {
    let runtime = Runtime::new(RuntimeConfig {
        stack_limit: 10,
        ..RuntimeConfig::default()
    });
    runtime.build("1").unwrap();
    let mut left = vec![0.0; 64];
    let mut right = vec![0.0; 64];
    let err = runtime.process_block(&mut left, &mut right).unwrap_err();
    assert!(matches!(err, RuntimeError::StackOverflow { limit: 10, .. }));
    assert!(runtime.stack_snapshot().is_empty());
}

#[test]
fn native_errors_propagate() {
    let runtime = Runtime::default();
    runtime.register("fail", |_: &mut Stack| Err(StackError::Underflow));
    runtime.build(": wrapper fail ; wrapper").unwrap();
    let faults = runtime.faults();
    let mut left = vec![0.0; 2];
    let mut right = vec![0.0; 2];
    assert!(runtime.process_block(&mut left, &mut right).is_err());
    assert_eq!(faults.try_recv().unwrap().word(), "fail");
}

// ============================================================================
// 3. Concurrency
// ============================================================================

/// A rebuild racing buffer renders never yields a buffer that mixes the old
/// and new programs.
#[test]
fn rebuilds_never_tear_a_buffer() {
    let runtime = Arc::new(Runtime::default());
    let programs = [
        ": level 0.25 ; level dup >out1 >out2",
        ": level 0.75 ; level dup >out1 >out2",
    ];
    runtime.build(programs[0]).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let builder = {
        let runtime = Arc::clone(&runtime);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut builds = 0usize;
            loop {
                runtime.build(programs[builds % 2]).unwrap();
                builds += 1;
                if done.load(Ordering::Acquire) {
                    break builds;
                }
            }
        })
    };

    let mut left = vec![0.0f32; 128];
    let mut right = vec![0.0f32; 128];
    for _ in 0..2000 {
        runtime.process_block(&mut left, &mut right).unwrap();
        let first = left[0];
        assert!(first == 0.25 || first == 0.75, "unexpected sample {first}");
        assert!(left.iter().chain(&right).all(|&s| s == first), "torn buffer");
    }
    done.store(true, Ordering::Release);
    let builds = builder.join().unwrap();

    assert!(builds > 0);
    assert!(runtime.stack_snapshot().is_empty());
}

#[test]
fn failed_rebuilds_race_rendering() {
    let runtime = Arc::new(Runtime::default());
    runtime.build("0.5 >out1").unwrap();

    let failing = {
        let runtime = Arc::clone(&runtime);
        thread::spawn(move || {
            for i in 0..500 {
                let source = format!(": w{i} 1 ; 7 missing{i}");
                assert!(runtime.build(&source).is_err());
            }
        })
    };
    for _ in 0..500 {
        let (left, _) = render(&runtime, 64);
        assert!(left.iter().all(|&s| s == 0.5));
    }
    failing.join().unwrap();
    assert!(!runtime.contains("w0"));
}

#[test]
fn deepest_allowed_word_chain_runs_on_a_small_stack() {
    let mut source = String::from(": w0 0.5 ;");
    for i in 1..MAX_CALL_DEPTH {
        source.push_str(&format!(" : w{i} w{} ;", i - 1));
    }
    let top = MAX_CALL_DEPTH - 1;
    source.push_str(&format!(" w{top} >out1"));

    let runtime = Arc::new(Runtime::default());
    runtime.build(&source).unwrap();

    let audio = Arc::clone(&runtime);
    let left = thread::Builder::new()
        .stack_size(256 * 1024)
        .spawn(move || render(&audio, 4).0)
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(left, vec![0.5; 4]);
}

#[test]
fn too_deep_chain_is_rejected_and_program_keeps_running() {
    let runtime = Runtime::default();
    runtime.build("0.25 >out1").unwrap();

    let mut source = String::from(": w0 1 drop ;");
    for i in 1..5000 {
        source.push_str(&format!(" : w{i} w{} ;", i - 1));
    }
    let err = runtime.build(&source).unwrap_err();
    assert!(matches!(err, CompileError::CallDepthExceeded { limit: MAX_CALL_DEPTH, .. }));
    assert!(!runtime.contains("w0"));

    let (left, _) = render(&runtime, 2);
    assert_eq!(left, vec![0.25; 2]);
}
