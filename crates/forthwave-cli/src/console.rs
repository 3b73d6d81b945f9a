//! Line-oriented control surface for a playing runtime.
//!
//! | Input | Effect |
//! |---|---|
//! | empty line, `toggle` | start or stop the transport |
//! | a decimal number | set the value read by `prompt` |
//! | `reload` | rebuild from the program file |
//! | `stack` | print the operand stack |
//! | `note <n> [vel]` | MIDI note on, velocity defaults to 100 |
//! | `off <n>` | MIDI note off |
//! | `cc <n> <v>` | MIDI control change |
//! | `help` | list commands |
//! | `quit` | stop |

use crate::commands::common::rebuild;
use crossbeam_channel::{Receiver, unbounded};
use forthwave_core::{ControlValue, Runtime, parse_decimal};
use forthwave_synth::{MidiEvent, MidiSender};
use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_VELOCITY: u8 = 100;

const HELP: &str = "\
commands:
  <enter> | toggle   start/stop the transport
  <number>           set prompt
  reload             rebuild the program file
  stack              show the operand stack
  note <n> [vel]     MIDI note on
  off <n>            MIDI note off
  cc <n> <v>         MIDI control change
  quit               stop";

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Toggle,
    Prompt(f64),
    Reload,
    Stack,
    Note { note: u8, velocity: u8 },
    Off(u8),
    Cc { controller: u8, value: u8 },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

fn midi_byte(arg: Option<&str>, usage: &'static str) -> Result<u8, ConsoleError> {
    arg.and_then(|a| a.parse::<u8>().ok())
        .filter(|&v| v <= 127)
        .ok_or(ConsoleError::Usage(usage))
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(Self::Toggle);
        };
        let rest: Vec<&str> = parts.collect();

        let command = match head {
            "toggle" => Self::Toggle,
            "reload" => Self::Reload,
            "stack" => Self::Stack,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "note" => {
                const USAGE: &str = "note <0-127> [velocity 0-127]";
                if rest.len() > 2 {
                    return Err(ConsoleError::Usage(USAGE));
                }
                let note = midi_byte(rest.first().copied(), USAGE)?;
                let velocity = match rest.get(1).copied() {
                    Some(v) => midi_byte(Some(v), USAGE)?,
                    None => DEFAULT_VELOCITY,
                };
                Self::Note { note, velocity }
            }
            "off" => {
                const USAGE: &str = "off <0-127>";
                if rest.len() != 1 {
                    return Err(ConsoleError::Usage(USAGE));
                }
                Self::Off(midi_byte(rest.first().copied(), USAGE)?)
            }
            "cc" => {
                const USAGE: &str = "cc <0-127> <0-127>";
                if rest.len() != 2 {
                    return Err(ConsoleError::Usage(USAGE));
                }
                Self::Cc {
                    controller: midi_byte(rest.first().copied(), USAGE)?,
                    value: midi_byte(rest.get(1).copied(), USAGE)?,
                }
            }
            other => match parse_decimal(other) {
                Some(value) if rest.is_empty() => Self::Prompt(value),
                _ => return Err(ConsoleError::Unknown(line.trim().to_string())),
            },
        };

        if rest.is_empty() || matches!(command, Self::Note { .. } | Self::Off(_) | Self::Cc { .. }) {
            Ok(command)
        } else {
            Err(ConsoleError::Unknown(line.trim().to_string()))
        }
    }
}

/// Control-side handles the console acts on.
pub struct Console {
    runtime: Arc<Runtime>,
    prompt: ControlValue,
    midi: MidiSender,
    program: PathBuf,
}

impl Console {
    pub fn new(runtime: Arc<Runtime>, prompt: ControlValue, midi: MidiSender, program: PathBuf) -> Self {
        Self {
            runtime,
            prompt,
            midi,
            program,
        }
    }

    /// Apply one command. `Break` means the user asked to quit.
    pub fn execute(&self, command: Command) -> ControlFlow<(), Option<String>> {
        let reply = match command {
            Command::Toggle => {
                let playing = self.runtime.toggle_transport();
                Some(if playing { "playing" } else { "stopped" }.to_string())
            }
            Command::Prompt(value) => {
                self.prompt.set(value);
                None
            }
            Command::Reload => Some(match rebuild(&self.runtime, &self.program) {
                Ok(report) => format!("ok, {} instruction(s)", report.instructions),
                Err(err) => format!("{err:#}"),
            }),
            Command::Stack => {
                let stack = self.runtime.stack_snapshot();
                let items: Vec<String> = stack.iter().map(f64::to_string).collect();
                Some(format!("<{}> {}", stack.len(), items.join(" ")))
            }
            Command::Note { note, velocity } => {
                self.send(MidiEvent::NoteOn { note, velocity })
            }
            Command::Off(note) => self.send(MidiEvent::NoteOff { note }),
            Command::Cc { controller, value } => {
                self.send(MidiEvent::ControlChange { controller, value })
            }
            Command::Help => Some(HELP.to_string()),
            Command::Quit => return ControlFlow::Break(()),
        };
        ControlFlow::Continue(reply)
    }

    fn send(&self, event: MidiEvent) -> Option<String> {
        (!self.midi.send(event)).then(|| "MIDI queue full, event dropped".to_string())
    }
}

/// Read stdin lines on a background thread. The channel closes at end of input.
pub fn spawn_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
