//! Action events and the sinks that consume them
//!
//! The dispatcher hands each action to a sink exactly once. Sinks only
//! observe: the trait offers no way to reach back into the machine state.
//! Two backends ship here, a human-readable console renderer and a
//! JSON-lines writer.

use std::io::Write;

use serde::Serialize;

use crate::ast::{Axis, SetupCode};
use crate::machine::MotionMode;

/// Semantic machine action. Feed rates are mm/s, coordinates mm with
/// three-decimal-place significance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    Home,
    MoveTo { x: f64, y: f64, z: f64 },
    MoveAxis { axis: Axis, value: f64 },
    SetMotionMode(MotionMode),
    SetFeedRate(f64),
    SetSpindleSpeed(u32),
    SpindleOn,
    SpindleOff,
    ChangeTool(String),
    CoolantOn,
    CoolantOff,
    ShowSetup { code: SetupCode, text: &'static str },
    Stop,
}

/// Consumer of the dispatcher's action stream.
pub trait ActionSink {
    fn action(&mut self, action: &Action);
}

/// Collecting sink for tests and programmatic use.
impl ActionSink for Vec<Action> {
    fn action(&mut self, action: &Action) {
        self.push(action.clone());
    }
}

/// Renders actions as operator console text.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ActionSink for ConsoleSink<W> {
    fn action(&mut self, action: &Action) {
        let _ = match action {
            Action::Home => writeln!(self.out, "Moving to home."),
            Action::MoveTo { x, y, z } => {
                writeln!(self.out, "Moving to X={:.3} Y={:.3} Z={:.3} [mm].", x, y, z)
            }
            Action::MoveAxis { axis, value } => {
                writeln!(self.out, "Moving {} to {:.3} [mm].", axis.letter(), value)
            }
            Action::SetMotionMode(mode) => {
                writeln!(self.out, "Setting movement mode to '{}'.", mode)
            }
            Action::SetFeedRate(value) => {
                writeln!(self.out, "Using feed rate {:.2} [mm/s].", value)
            }
            Action::SetSpindleSpeed(rpm) => {
                writeln!(self.out, "Using spindle speed {} [rpm].", rpm)
            }
            Action::SpindleOn => writeln!(self.out, "Spindle on."),
            Action::SpindleOff => writeln!(self.out, "Spindle off."),
            Action::ChangeTool(id) => writeln!(self.out, "Changing tool '{}'.", id),
            Action::CoolantOn => writeln!(self.out, "Coolant on."),
            Action::CoolantOff => writeln!(self.out, "Coolant off."),
            Action::ShowSetup { code, text } => {
                writeln!(self.out, "[{}] {}", code.word(), text)
            }
            Action::Stop => writeln!(self.out, "Stopping machine."),
        };
    }
}

/// Writes one JSON object per action, for piping into other tools.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ActionSink for JsonSink<W> {
    fn action(&mut self, action: &Action) {
        if let Ok(line) = serde_json::to_string(action) {
            let _ = writeln!(self.out, "{}", line);
        }
    }
}
