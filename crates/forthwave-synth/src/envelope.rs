//! Attack-decay envelope.
//!
//! A trigger starts a linear rise from the current level to 1 over the attack
//! time, followed by an exponential fall that reaches -60 dB after the decay
//! time. Retriggering mid-decay rises from where the level is, so repeated
//! hits do not click.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `name` | `( attack decay -- level )` | set times in seconds, push the current level |
//! | `name.trig` | `( flag -- )` | start the attack when `flag` is non-zero |

use crate::module::{Tick, attach, native};
use forthwave_core::Runtime;

/// Level below which the decay snaps to zero.
const SILENCE: f64 = 1.0e-4;

/// -60 dB as a natural log ratio.
const DECAY_RATIO_LN: f64 = -6.907755278982137;

/// Envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising toward 1.
    Attack,
    /// Falling toward 0.
    Decay,
}

/// Attack-decay envelope state.
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: Stage,
    level: f64,
    sample_rate: f64,
    attack_step: f64,
    decay_coeff: f64,
    attack: f64,
    decay: f64,
}

impl Envelope {
    /// Create an idle envelope with 10 ms attack and 200 ms decay.
    pub fn new(sample_rate: f64) -> Self {
        let mut env = Self {
            stage: Stage::Idle,
            level: 0.0,
            sample_rate,
            attack_step: 1.0,
            decay_coeff: 0.0,
            attack: f64::NAN,
            decay: f64::NAN,
        };
        env.set_times(0.01, 0.2);
        env
    }

    /// Set attack and decay times in seconds. Non-positive times are instant.
    pub fn set_times(&mut self, attack: f64, decay: f64) {
        // Programs call this every sample; skip the exp when nothing changed.
        if attack == self.attack && decay == self.decay {
            return;
        }
        self.attack = attack;
        self.decay = decay;
        self.attack_step = if attack > 0.0 {
            1.0 / (attack * self.sample_rate)
        } else {
            1.0
        };
        self.decay_coeff = if decay > 0.0 {
            libm::exp(DECAY_RATIO_LN / (decay * self.sample_rate))
        } else {
            0.0
        };
    }

    /// Start the attack stage.
    pub fn trigger(&mut self) {
        self.stage = Stage::Attack;
    }

    /// Current output level in `[0, 1]`.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

impl Tick for Envelope {
    fn tick(&mut self) {
        match self.stage {
            Stage::Idle => {}
            Stage::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level *= self.decay_coeff;
                if self.level < SILENCE {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
    }
}

/// Register envelope `name` into `runtime`.
pub fn register(runtime: &Runtime, name: &str) {
    let env = attach(runtime, Envelope::new(f64::from(runtime.sample_rate())));

    native(runtime, name, &env, |env, s| {
        let (attack, decay) = s.pop2()?;
        env.set_times(attack, decay);
        s.push(env.level())
    });
    native(runtime, format!("{name}.trig"), &env, |env, s| {
        if s.pop()? != 0.0 {
            env.trigger();
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(env: &mut Envelope, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|_| {
                env.tick();
                env.level()
            })
            .collect()
    }

    #[test]
    fn idle_until_triggered() {
        let mut env = Envelope::new(1000.0);
        assert!(run(&mut env, 10).iter().all(|&l| l == 0.0));
    }

    #[test]
    fn linear_attack_then_decay() {
        let mut env = Envelope::new(1000.0);
        env.set_times(0.004, 0.1);
        env.trigger();
        let levels = run(&mut env, 5);
        assert_eq!(&levels[..4], &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(env.stage(), Stage::Decay);
        assert!(levels[4] < 1.0 && levels[4] > 0.9);
    }

    #[test]
    fn decay_reaches_silence_in_decay_time() {
        let mut env = Envelope::new(1000.0);
        env.set_times(0.0, 0.05);
        env.trigger();
        env.tick();
        assert_eq!(env.level(), 1.0);
        // -60 dB after 50 samples, idle shortly after.
        let levels = run(&mut env, 50);
        assert!((levels[49] - 0.001).abs() < 1.0e-6);
        run(&mut env, 50);
        assert_eq!(env.stage(), Stage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn retrigger_rises_from_current_level() {
        let mut env = Envelope::new(1000.0);
        env.set_times(0.004, 0.01);
        env.trigger();
        run(&mut env, 8);
        let before = env.level();
        env.trigger();
        env.tick();
        assert!((env.level() - (before + 0.25)).abs() < 1.0e-12);
    }

    #[test]
    fn words() {
        let runtime = Runtime::new(forthwave_core::RuntimeConfig {
            sample_rate: 1000,
            ..Default::default()
        });
        register(&runtime, "env1");
        runtime.build("1 env1.trig 0.002 0.5 env1 >out1").unwrap();
        let mut left = [0.0; 3];
        let mut right = [0.0; 3];
        runtime.process_block(&mut left, &mut right).unwrap();
        assert_eq!(left, [0.0, 0.5, 1.0]);
    }
}
