mod ast;
mod lexer;
mod machine;
mod parser;
mod sink;

use std::fs;
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};

use machine::{DispatchError, Dispatcher, MachineState};
use sink::{ActionSink, ConsoleSink, JsonSink};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut json = false;
    let mut path = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--json" => json = true,
            other => path = Some(other.to_string()),
        }
    }

    let Some(path) = path else {
        eprintln!("Usage: kerf [--json] <program.gcode>");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  kerf rectangle.gcode");
        return ExitCode::FAILURE;
    };

    // An unreadable file means the session never starts.
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read file {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let program = parser::parse_program(&source);

    let stdout = std::io::stdout();
    let mut sink: Box<dyn ActionSink> = if json {
        Box::new(JsonSink::new(stdout.lock()))
    } else {
        Box::new(ConsoleSink::new(stdout.lock()))
    };

    let mut dispatcher = Dispatcher::new(MachineState::default());
    if let Err(err) = dispatcher.run(&program, sink.as_mut()) {
        report(&path, &source, &err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Render a fatal dispatch error against the part program source.
fn report(path: &str, source: &str, err: &DispatchError) {
    let rendered = Report::build(ReportKind::Error, path, err.span.start)
        .with_message(err.kind)
        .with_label(
            Label::new((path, err.span.clone()))
                .with_message("program halted at this command")
                .with_color(Color::Red),
        )
        .finish()
        .eprint((path, Source::from(source)));
    if rendered.is_err() {
        eprintln!("{}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine::PreconditionError;
    use pretty_assertions::assert_eq;
    use sink::Action;

    #[test]
    fn test_rectangle_program() {
        let source = "\
%
(RECTANGLE POCKET)
G17 G21 G40 G49 G54 G80 G90 G94
T01
M06
S1500
M03
M08
G00 X0.000 Y0.000
G00 Z2.000
G01 Z-1.000 F100.0
G01 X40.000 F250.0
G01 Y25.000
G01 X0.000
G01 Y0.000
G00 Z2.000
M09
M05
G28 Z0.000
M30
";

        let program = parser::parse_program(source);
        let mut actions: Vec<Action> = Vec::new();
        let mut dispatcher = Dispatcher::new(MachineState::default());
        dispatcher.run(&program, &mut actions).expect("valid program");

        // Spot-check the action stream around the cut.
        assert!(actions.contains(&Action::ChangeTool("01".to_string())));
        assert!(actions.contains(&Action::SpindleOn));
        assert!(actions.contains(&Action::CoolantOn));
        assert!(actions.contains(&Action::SetFeedRate(100.0 / 60.0)));
        assert!(actions.contains(&Action::MoveTo {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }));
        assert_eq!(actions.last(), Some(&Action::Stop));

        let state = dispatcher.state();
        assert_eq!((state.x, state.y, state.z), (0.0, 0.0, 0.0));
        assert!(!state.spindle_on);
        assert!(!state.coolant_on);
    }

    #[test]
    fn test_cut_before_feed_rate_halts_session() {
        let source = "G21\nG90\nS1200\nM03\nG01 X10.000\nM30\n";

        let program = parser::parse_program(source);
        let mut actions: Vec<Action> = Vec::new();
        let mut dispatcher = Dispatcher::new(MachineState::default());
        let err = dispatcher.run(&program, &mut actions).unwrap_err();

        assert_eq!(err.kind, PreconditionError::FeedRateNotSet);
        assert_eq!(err.line, 5);
        assert_eq!(&source[err.span.clone()], "G01 X10.000");
        // M30 never ran.
        assert_eq!(actions.last(), Some(&Action::SpindleOn));
    }
}
