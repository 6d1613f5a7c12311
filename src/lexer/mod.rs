use logos::Logos;

use crate::ast::{Axis, SetupCode};

/// Tokens for the words of one part-program line
/// Fixed vocabulary; anything outside it is dropped without complaint

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(error = LexError)]
pub enum Token {
    #[token("G00")]
    Rapid,

    #[token("G01")]
    Linear,

    #[token("G28")]
    Home,

    #[regex(r"G(17|21|40|49|54|80|90|91|94)", |lex| SetupCode::from_word(lex.slice()))]
    Setup(SetupCode),

    #[token("M03")]
    SpindleOn,

    #[token("M05")]
    SpindleOff,

    #[token("M06")]
    ToolChange,

    #[token("M08")]
    CoolantOn,

    #[token("M09")]
    CoolantOff,

    #[token("M30")]
    ProgramEnd,

    // Coordinate words require a decimal point; "X10" is not a coordinate.
    #[regex(r"[XYZ]-?\d*\.\d+", |lex| {
        let slice = lex.slice();
        let axis = Axis::from_letter(slice.as_bytes()[0])?;
        let value = slice[1..].parse::<f64>().ok()?;
        Some((axis, value))
    })]
    AxisWord((Axis, f64)),

    /// Feed rate as written in the program [mm/min].
    #[regex(r"F-?\d*\.\d+", |lex| lex.slice()[1..].parse::<f64>().ok())]
    FeedWord(f64),

    #[regex(r"S\d+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    SpindleWord(u32),

    // Tool ids keep their digits verbatim, leading zeros included.
    #[regex(r"T\d+", |lex| lex.slice()[1..].to_string())]
    ToolWord(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexError;

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized word")
    }
}

impl std::error::Error for LexError {}

/// Tokenize one line. Each whitespace-delimited word must be consumed by
/// exactly one token; words that mismatch or only partially match are
/// dropped silently.
pub fn lex_line(line: &str) -> Vec<Token> {
    line.split_whitespace()
        .filter_map(|word| {
            let mut lexer = Token::lexer(word);
            match lexer.next() {
                Some(Ok(token)) if lexer.span().end == word.len() => Some(token),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_line_tokens() {
        let tokens = lex_line("G01 X10.000 Y-5.500 F600.0");

        assert_eq!(tokens, vec![
            Token::Linear,
            Token::AxisWord((Axis::X, 10.0)),
            Token::AxisWord((Axis::Y, -5.5)),
            Token::FeedWord(600.0),
        ]);
    }

    #[test]
    fn test_setup_and_machine_words() {
        let tokens = lex_line("G21 G90 M03 S1200 T01 M30");

        assert_eq!(tokens, vec![
            Token::Setup(SetupCode::Millimeters),
            Token::Setup(SetupCode::Absolute),
            Token::SpindleOn,
            Token::SpindleWord(1200),
            Token::ToolWord("01".to_string()),
            Token::ProgramEnd,
        ]);
    }

    #[test]
    fn test_unknown_words_dropped() {
        // Line numbers, unsupported codes and stray text all vanish.
        let tokens = lex_line("N10 G02 X1.000 FOO");

        assert_eq!(tokens, vec![Token::AxisWord((Axis::X, 1.0))]);
    }

    #[test]
    fn test_coordinate_requires_decimal_point() {
        assert_eq!(lex_line("X10"), vec![]);
        assert_eq!(lex_line("X.5"), vec![Token::AxisWord((Axis::X, 0.5))]);
        assert_eq!(lex_line("Z-0.250"), vec![Token::AxisWord((Axis::Z, -0.25))]);
    }

    #[test]
    fn test_partial_word_match_dropped() {
        // "S12.5" lexes as S12 followed by ".5"; the word as a whole is
        // not a spindle word, so it is discarded.
        assert_eq!(lex_line("S12.5"), vec![]);
        assert_eq!(lex_line("GX1.0"), vec![]);
        assert_eq!(lex_line("T01abc"), vec![]);
    }

    #[test]
    fn test_tool_word_keeps_leading_zeros() {
        assert_eq!(lex_line("T05"), vec![Token::ToolWord("05".to_string())]);
    }
}
