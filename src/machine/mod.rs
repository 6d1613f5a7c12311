//! Machine state and the dispatcher that folds commands through it
//!
//! The dispatcher owns the single session state, applies commands strictly
//! in order, and emits semantic actions to a sink. A violated precondition
//! halts the session; nothing downstream of the sink can feed back in.

use std::fmt;
use std::ops::Range;

use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::ast::{Axis, Command, MotionCode, ParsedCommand, SetupCode};
use crate::sink::{Action, ActionSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositioningMode {
    /// Coordinate words are absolute targets.
    #[default]
    Absolute,
    /// Coordinate words are deltas added to the current position.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    #[default]
    Unset,
    Rapid,
    Linear,
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotionMode::Unset => "unset",
            MotionMode::Rapid => "rapid positioning",
            MotionMode::Linear => "linear motion",
        })
    }
}

/// Mutable machine configuration and position for one session.
///
/// Coordinates are mm, feed rate mm/s, spindle speed rpm. Zero feed rate
/// and zero spindle speed mean "never set".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachineState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub positioning_mode: PositioningMode,
    pub motion_mode: MotionMode,
    pub feed_rate: f64,
    pub spindle_speed: u32,
    pub spindle_on: bool,
    pub tool: Option<String>,
    pub coolant_on: bool,
}

/// A state requirement that must hold before a command may take effect.
/// Violations are fatal to the session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("feed rate not set")]
    FeedRateNotSet,
    #[error("spindle speed not set")]
    SpindleSpeedNotSet,
    #[error("no tool selected")]
    NoToolSelected,
}

/// A precondition violation tagged with the offending source line.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} (line {line})")]
pub struct DispatchError {
    pub kind: PreconditionError,
    pub line: usize,
    pub span: Range<usize>,
}

enum Flow {
    Continue,
    Stop,
}

/// Applies commands in order against the machine state it exclusively owns.
pub struct Dispatcher {
    state: MachineState,
}

impl Dispatcher {
    pub fn new(state: MachineState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Fold the command sequence through the machine state.
    ///
    /// Halts at the first precondition violation, leaving the remaining
    /// commands unapplied. `M30` ends the fold normally.
    pub fn run(
        &mut self,
        program: &[ParsedCommand],
        sink: &mut dyn ActionSink,
    ) -> Result<(), DispatchError> {
        for parsed in program {
            match self.apply(&parsed.command, sink) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(kind) => {
                    return Err(DispatchError {
                        kind,
                        line: parsed.line,
                        span: parsed.span.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        command: &Command,
        sink: &mut dyn ActionSink,
    ) -> Result<Flow, PreconditionError> {
        match command {
            Command::Move { code, axes, feed } => {
                // Preconditions are checked before anything is emitted, so
                // a rejected command leaves no trace in the action stream.
                if *code == MotionCode::Linear
                    && !axes.is_empty()
                    && feed.is_none()
                    && self.state.feed_rate == 0.0
                {
                    return Err(PreconditionError::FeedRateNotSet);
                }

                self.announce_motion_mode(*code, sink);

                if !axes.is_empty() {
                    if *code == MotionCode::Linear {
                        if let Some(value) = feed {
                            self.set_feed_rate(*value, sink);
                        }
                    }
                    self.resolve_axes(axes, sink);
                }
                Ok(Flow::Continue)
            }
            Command::Home { axes } => {
                sink.action(&Action::Home);
                self.resolve_axes(axes, sink);
                Ok(Flow::Continue)
            }
            Command::Setup(code) => {
                match code {
                    SetupCode::Absolute => {
                        self.state.positioning_mode = PositioningMode::Absolute;
                        self.state.x = 0.0;
                        self.state.y = 0.0;
                        self.state.z = 0.0;
                    }
                    SetupCode::Incremental => {
                        self.state.positioning_mode = PositioningMode::Incremental;
                    }
                    _ => {}
                }
                sink.action(&Action::ShowSetup {
                    code: *code,
                    text: code.description(),
                });
                Ok(Flow::Continue)
            }
            Command::FeedRate(value) => {
                self.set_feed_rate(*value, sink);
                Ok(Flow::Continue)
            }
            Command::SpindleSpeed(rpm) => {
                self.state.spindle_speed = *rpm;
                sink.action(&Action::SetSpindleSpeed(*rpm));
                Ok(Flow::Continue)
            }
            Command::Spindle { on: true } => {
                if self.state.spindle_speed == 0 {
                    return Err(PreconditionError::SpindleSpeedNotSet);
                }
                self.state.spindle_on = true;
                sink.action(&Action::SpindleOn);
                Ok(Flow::Continue)
            }
            Command::Spindle { on: false } => {
                self.state.spindle_on = false;
                sink.action(&Action::SpindleOff);
                Ok(Flow::Continue)
            }
            Command::ToolSelect(id) => {
                self.state.tool = Some(id.clone());
                Ok(Flow::Continue)
            }
            Command::ToolChange => {
                let id = self
                    .state
                    .tool
                    .clone()
                    .ok_or(PreconditionError::NoToolSelected)?;
                // Spindle and coolant must be off before the carousel moves.
                self.state.spindle_speed = 0;
                self.state.coolant_on = false;
                sink.action(&Action::ChangeTool(id));
                Ok(Flow::Continue)
            }
            Command::Coolant { on } => {
                if *on == self.state.coolant_on {
                    warn!(
                        "coolant is already {}",
                        if *on { "on" } else { "off" }
                    );
                } else {
                    self.state.coolant_on = *on;
                    sink.action(if *on {
                        &Action::CoolantOn
                    } else {
                        &Action::CoolantOff
                    });
                }
                Ok(Flow::Continue)
            }
            Command::Stop => {
                sink.action(&Action::Stop);
                Ok(Flow::Stop)
            }
        }
    }

    /// Announce a motion mode change; an unchanged mode stays silent.
    fn announce_motion_mode(&mut self, code: MotionCode, sink: &mut dyn ActionSink) {
        let mode = match code {
            MotionCode::Rapid => MotionMode::Rapid,
            MotionCode::Linear => MotionMode::Linear,
        };
        if self.state.motion_mode != mode {
            self.state.motion_mode = mode;
            sink.action(&Action::SetMotionMode(mode));
        }
    }

    /// Store a feed rate [mm/s]. Re-announcing an unchanged rate is
    /// suppressed.
    fn set_feed_rate(&mut self, value: f64, sink: &mut dyn ActionSink) {
        if value == self.state.feed_rate {
            return;
        }
        self.state.feed_rate = value;
        sink.action(&Action::SetFeedRate(value));
    }

    /// Apply the axis words of a motion command.
    ///
    /// A single axis moves that axis; X together with Y moves in the XY
    /// plane at the current Z. Other combinations (XYZ, XZ, YZ) are a
    /// reserved extension point and emit nothing.
    fn resolve_axes(&mut self, axes: &[(Axis, f64)], sink: &mut dyn ActionSink) {
        // Last occurrence wins when an axis repeats on a line.
        let lookup = |axis| {
            axes.iter()
                .rev()
                .find(|(a, _)| *a == axis)
                .map(|(_, value)| *value)
        };

        match (lookup(Axis::X), lookup(Axis::Y), lookup(Axis::Z)) {
            (Some(value), None, None) => self.move_axis(Axis::X, value, sink),
            (None, Some(value), None) => self.move_axis(Axis::Y, value, sink),
            (None, None, Some(value)) => self.move_axis(Axis::Z, value, sink),
            (Some(x), Some(y), None) => self.move_xy(x, y, sink),
            _ => {}
        }
    }

    fn move_axis(&mut self, axis: Axis, value: f64, sink: &mut dyn ActionSink) {
        let target = match self.state.positioning_mode {
            // Absolute targets always emit, even when nothing changes.
            PositioningMode::Absolute => value,
            PositioningMode::Incremental => {
                if value == 0.0 {
                    return;
                }
                self.coord(axis) + value
            }
        };
        *self.coord_mut(axis) = target;
        sink.action(&Action::MoveAxis {
            axis,
            value: target,
        });
    }

    fn move_xy(&mut self, x: f64, y: f64, sink: &mut dyn ActionSink) {
        match self.state.positioning_mode {
            PositioningMode::Absolute => {
                self.state.x = x;
                self.state.y = y;
            }
            PositioningMode::Incremental => {
                if x == 0.0 && y == 0.0 {
                    return;
                }
                self.state.x += x;
                self.state.y += y;
            }
        }
        sink.action(&Action::MoveTo {
            x: self.state.x,
            y: self.state.y,
            z: self.state.z,
        });
    }

    fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.state.x,
            Axis::Y => self.state.y,
            Axis::Z => self.state.z,
        }
    }

    fn coord_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.state.x,
            Axis::Y => &mut self.state.y,
            Axis::Z => &mut self.state.z,
        }
    }
}
