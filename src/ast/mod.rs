//! Command-level data model for part programs
//! One line of source yields at most one Command; the dispatcher consumes
//! each exactly once.

use std::ops::Range;

use serde::Serialize;

/// Machine axis addressed by a coordinate word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'X' => Some(Axis::X),
            b'Y' => Some(Axis::Y),
            b'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

/// Motion group of a move command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCode {
    Rapid,  // G00
    Linear, // G01
}

/// Parameterless setup codes. Purely informational except for G90/G91,
/// which switch the positioning mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SetupCode {
    #[serde(rename = "G17")]
    XyPlane,
    #[serde(rename = "G21")]
    Millimeters,
    #[serde(rename = "G40")]
    CutterCompOff,
    #[serde(rename = "G49")]
    LengthCompOff,
    #[serde(rename = "G54")]
    WorkOffset,
    #[serde(rename = "G80")]
    CancelCanned,
    #[serde(rename = "G90")]
    Absolute,
    #[serde(rename = "G91")]
    Incremental,
    #[serde(rename = "G94")]
    UnitsPerMinute,
}

impl SetupCode {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "G17" => Some(SetupCode::XyPlane),
            "G21" => Some(SetupCode::Millimeters),
            "G40" => Some(SetupCode::CutterCompOff),
            "G49" => Some(SetupCode::LengthCompOff),
            "G54" => Some(SetupCode::WorkOffset),
            "G80" => Some(SetupCode::CancelCanned),
            "G90" => Some(SetupCode::Absolute),
            "G91" => Some(SetupCode::Incremental),
            "G94" => Some(SetupCode::UnitsPerMinute),
            _ => None,
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            SetupCode::XyPlane => "G17",
            SetupCode::Millimeters => "G21",
            SetupCode::CutterCompOff => "G40",
            SetupCode::LengthCompOff => "G49",
            SetupCode::WorkOffset => "G54",
            SetupCode::CancelCanned => "G80",
            SetupCode::Absolute => "G90",
            SetupCode::Incremental => "G91",
            SetupCode::UnitsPerMinute => "G94",
        }
    }

    /// Fixed operator-facing description of what the code configures.
    pub fn description(&self) -> &'static str {
        match self {
            SetupCode::XyPlane => "All commands are now to be interpreted in the XY plane.",
            SetupCode::Millimeters => "Units are set to millimeters when programming.",
            SetupCode::CutterCompOff => "Set tool radius compensation off.",
            SetupCode::LengthCompOff => "Set tool length offset compensation off.",
            SetupCode::WorkOffset => {
                "Setting a specific coordinate system as the reference point for cutting a particular part."
            }
            SetupCode::CancelCanned => "Motion modes cancelled.",
            SetupCode::Absolute => {
                "Setting machine positioning mode to absolute and taking current position as the reference point."
            }
            SetupCode::Incremental => "Setting machine positioning mode to incremental.",
            SetupCode::UnitsPerMinute => "Feed rate mode units are set to units per minute mode.",
        }
    }
}

/// One parsed part-program instruction.
///
/// Feed rates are already converted to mm/s by the parser; coordinates stay
/// in mm as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// G00/G01 with the axis words found on the line, in source order.
    Move {
        code: MotionCode,
        axes: Vec<(Axis, f64)>,
        feed: Option<f64>,
    },
    /// G28, optionally followed by axis words applied after homing.
    Home { axes: Vec<(Axis, f64)> },
    Setup(SetupCode),
    /// Standalone F word [mm/s].
    FeedRate(f64),
    /// S word [rpm].
    SpindleSpeed(u32),
    /// M03 (on) / M05 (off).
    Spindle { on: bool },
    /// T word; selects but does not mount the tool.
    ToolSelect(String),
    /// M06; mounts the previously selected tool.
    ToolChange,
    /// M08 (on) / M09 (off).
    Coolant { on: bool },
    /// M30.
    Stop,
}

/// A command plus where it came from, for error reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub command: Command,
    /// 1-based source line number.
    pub line: usize,
    /// Byte range of the line within the source buffer.
    pub span: Range<usize>,
}
