//! MIDI input as words.
//!
//! Events arrive on a bounded channel from any control thread and are drained
//! by the ticker at the start of each sample, so the program always sees a
//! consistent state. Notes are monophonic with last-note priority: releasing
//! the newest held note falls back to the one held before it.
//!
//! | Word | Stack | Value |
//! |---|---|---|
//! | `midi.note` | `( -- n )` | current note number |
//! | `midi.vel` | `( -- v )` | velocity of the current note, 0 to 1 |
//! | `midi.gate` | `( -- 0/1 )` | whether any note is held |
//! | `midi.cc` | `( n -- v )` | last value of controller `n`, 0 to 1 |

use crate::module::{Tick, attach, native};
use crossbeam_channel::{Receiver, Sender, bounded};
use forthwave_core::Runtime;

/// Pending events the channel holds before senders see it as full.
pub const EVENT_QUEUE: usize = 256;

/// A MIDI channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Key pressed. A velocity of 0 is treated as a release.
    NoteOn {
        /// Note number, 0 to 127.
        note: u8,
        /// Velocity, 0 to 127.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Note number, 0 to 127.
        note: u8,
    },
    /// Controller moved.
    ControlChange {
        /// Controller number, 0 to 127.
        controller: u8,
        /// Value, 0 to 127.
        value: u8,
    },
}

/// Sending half handed to control threads. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct MidiSender(Sender<MidiEvent>);

impl MidiSender {
    /// Queue an event without blocking.
    ///
    /// Returns `false` if the queue is full or the runtime is gone.
    pub fn send(&self, event: MidiEvent) -> bool {
        self.0.try_send(event).is_ok()
    }
}

/// Monophonic note and controller state.
#[derive(Debug)]
pub struct MidiInput {
    events: Receiver<MidiEvent>,
    held: Vec<(u8, u8)>,
    controllers: [u8; 128],
    last_note: u8,
    last_velocity: u8,
}

impl MidiInput {
    /// Create input state and the sender that feeds it.
    pub fn new() -> (Self, MidiSender) {
        let (tx, rx) = bounded(EVENT_QUEUE);
        let input = Self {
            events: rx,
            held: Vec::with_capacity(128),
            controllers: [0; 128],
            last_note: 0,
            last_velocity: 0,
        };
        (input, MidiSender(tx))
    }

    /// Apply one event.
    pub fn apply(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn { note, velocity: 0 } | MidiEvent::NoteOff { note } => {
                self.held.retain(|&(n, _)| n != note);
                if let Some(&(n, v)) = self.held.last() {
                    self.last_note = n;
                    self.last_velocity = v;
                }
            }
            MidiEvent::NoteOn { note, velocity } => {
                self.held.retain(|&(n, _)| n != note);
                self.held.push((note, velocity));
                self.last_note = note;
                self.last_velocity = velocity;
            }
            MidiEvent::ControlChange { controller, value } => {
                self.controllers[usize::from(controller & 0x7f)] = value;
            }
        }
    }

    /// Current note number. Holds the last note after release.
    pub fn note(&self) -> u8 {
        self.last_note
    }

    /// Current velocity, 0 to 1.
    pub fn velocity(&self) -> f64 {
        f64::from(self.last_velocity) / 127.0
    }

    /// Whether any note is held.
    pub fn gate(&self) -> bool {
        !self.held.is_empty()
    }

    /// Controller value, 0 to 1. Out-of-range numbers read as 0.
    pub fn controller(&self, number: f64) -> f64 {
        if (0.0..128.0).contains(&number) {
            f64::from(self.controllers[number as usize]) / 127.0
        } else {
            0.0
        }
    }
}

impl Tick for MidiInput {
    fn tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }
}

/// Register the `midi.*` words and return the sender that feeds them.
pub fn register(runtime: &Runtime) -> MidiSender {
    let (input, sender) = MidiInput::new();
    let input = attach(runtime, input);
    native(runtime, "midi.note", &input, |m, s| s.push(f64::from(m.note())));
    native(runtime, "midi.vel", &input, |m, s| s.push(m.velocity()));
    native(runtime, "midi.gate", &input, |m, s| s.push(f64::from(m.gate())));
    native(runtime, "midi.cc", &input, |m, s| {
        let number = s.pop()?;
        s.push(m.controller(number))
    });
    sender
}
