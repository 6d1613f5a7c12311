//! Line classifier for part programs
//! Each source line becomes at most one Command

use crate::ast::{Axis, Command, MotionCode, ParsedCommand};
use crate::lexer::{lex_line, Token};

/// Feed words are written in mm/min; the machine state works in mm/s.
const FEED_PER_SECOND: f64 = 60.0;

/// Parse a whole part program into its ordered command sequence.
///
/// Line numbers are 1-based; spans are byte ranges into `source` so a
/// failed command can be pointed at in an error report.
pub fn parse_program(source: &str) -> Vec<ParsedCommand> {
    let mut commands = Vec::new();
    let mut offset = 0;

    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let span = offset..offset + line.len();
        offset += raw.len();

        if let Some(command) = parse_line(line) {
            commands.push(ParsedCommand {
                command,
                line: index + 1,
                span,
            });
        }
    }

    commands
}

/// Parse one raw line into zero or one command.
///
/// Lines starting with `%` or `(` are directives/comments and are skipped
/// without tokenization. The first recognized command word claims the line;
/// motion words collect the trailing axis (and for G01, feed) words.
pub fn parse_line(line: &str) -> Option<Command> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('%') || trimmed.starts_with('(') {
        return None;
    }

    let mut tokens = lex_line(line).into_iter();
    while let Some(token) = tokens.next() {
        let command = match token {
            Token::Rapid => {
                let (axes, _) = axes_and_feed(tokens.by_ref());
                Command::Move {
                    code: MotionCode::Rapid,
                    axes,
                    feed: None,
                }
            }
            Token::Linear => {
                let (axes, feed) = axes_and_feed(tokens.by_ref());
                Command::Move {
                    code: MotionCode::Linear,
                    axes,
                    feed,
                }
            }
            Token::Home => {
                let (axes, _) = axes_and_feed(tokens.by_ref());
                Command::Home { axes }
            }
            Token::Setup(code) => Command::Setup(code),
            Token::SpindleOn => Command::Spindle { on: true },
            Token::SpindleOff => Command::Spindle { on: false },
            Token::ToolChange => Command::ToolChange,
            Token::CoolantOn => Command::Coolant { on: true },
            Token::CoolantOff => Command::Coolant { on: false },
            Token::ProgramEnd => Command::Stop,
            Token::FeedWord(value) => Command::FeedRate(value / FEED_PER_SECOND),
            Token::SpindleWord(rpm) => Command::SpindleSpeed(rpm),
            Token::ToolWord(id) => Command::ToolSelect(id),
            // A coordinate word with no motion word ahead of it commands
            // nothing.
            Token::AxisWord(_) => continue,
        };
        return Some(command);
    }

    None
}

fn axes_and_feed(rest: impl Iterator<Item = Token>) -> (Vec<(Axis, f64)>, Option<f64>) {
    let mut axes = Vec::new();
    let mut feed = None;

    for token in rest {
        match token {
            Token::AxisWord((axis, value)) => axes.push((axis, value)),
            Token::FeedWord(value) => feed = Some(value / FEED_PER_SECOND),
            _ => {}
        }
    }

    (axes, feed)
}
