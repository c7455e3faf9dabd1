//! Statement splitting for multi-statement scripts.
//!
//! Scripts are split on top-level semicolons. Quoted strings, backtick
//! identifiers and comments are scanned lexically so that a `;` inside them
//! never ends a statement. Every statement keeps the row/column span it
//! occupies in the original script so the UI can highlight it.

mod cursor;

pub use cursor::{next_statement, CurrentStatement, MultiStatementState};

use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::Chars;

/// Zero-based location in a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    fn next_column(self) -> Self {
        Self::new(self.row, self.column + 1)
    }
}

/// A single statement of a script together with its source span.
///
/// `end` is exclusive: it points just past the terminating semicolon, or past
/// the last non-whitespace character for the final statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub start: Position,
    pub end: Position,
    #[serde(rename = "statement")]
    pub text: String,
}

/// Removes one trailing semicolon (and any whitespace after it).
///
/// Text without a trailing semicolon is returned unchanged.
pub fn strip_trailing_semicolon(text: &str) -> &str {
    text.trim_end().strip_suffix(';').unwrap_or(text)
}

/// Splits a script into its statements, in source order.
///
/// Chunks made only of whitespace or comments are dropped. Unterminated
/// quotes run to the end of the script.
pub fn split_statements(script: &str) -> Vec<Statement> {
    let script = strip_trailing_semicolon(script);
    let mut scanner = Scanner::new(script);
    let mut statements = Vec::new();
    let mut pending = Pending::default();
    let mut state = Lex::Code;

    while let Some((c, at)) = scanner.bump() {
        match state {
            Lex::LineComment => {
                pending.push(c, at, false);
                if c == '\n' {
                    state = Lex::Code;
                }
                continue;
            }
            Lex::BlockComment { star } => {
                pending.push(c, at, false);
                state = if star && c == '/' {
                    Lex::Code
                } else {
                    Lex::BlockComment { star: c == '*' }
                };
                continue;
            }
            Lex::Quoted(quote) => {
                pending.push(c, at, true);
                if c == '\\' {
                    if let Some((escaped, at)) = scanner.bump() {
                        pending.push(escaped, at, true);
                    }
                } else if c == quote {
                    state = Lex::Code;
                }
                continue;
            }
            Lex::Code => {}
        }

        match c {
            ';' => {
                let finished = std::mem::take(&mut pending);
                statements.extend(finished.finish(Some(at.next_column())));
            }
            '-' if scanner.peek() == Some('-') => {
                pending.push(c, at, false);
                state = Lex::LineComment;
            }
            '/' if scanner.peek() == Some('*') => {
                pending.push(c, at, false);
                if let Some((star, at)) = scanner.bump() {
                    pending.push(star, at, false);
                }
                state = Lex::BlockComment { star: false };
            }
            '\'' | '"' | '`' => {
                pending.push(c, at, true);
                state = Lex::Quoted(c);
            }
            _ => pending.push(c, at, true),
        }
    }

    statements.extend(pending.finish(None));
    statements
}

#[derive(Debug, Clone, Copy)]
enum Lex {
    Code,
    Quoted(char),
    LineComment,
    BlockComment { star: bool },
}

/// Character iterator that tracks the position of each character.
struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    pos: Position,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            pos: Position::default(),
        }
    }

    fn bump(&mut self) -> Option<(char, Position)> {
        let c = self.chars.next()?;
        let at = self.pos;
        self.pos = if c == '\n' {
            Position::new(at.row + 1, 0)
        } else {
            at.next_column()
        };
        Some((c, at))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }
}

/// Statement text collected since the last top-level semicolon.
#[derive(Debug, Default)]
struct Pending {
    text: String,
    start: Option<Position>,
    end: Position,
    has_code: bool,
}

impl Pending {
    fn push(&mut self, c: char, at: Position, code: bool) {
        if self.start.is_none() {
            if c.is_whitespace() {
                return;
            }
            self.start = Some(at);
        }
        self.text.push(c);
        if !c.is_whitespace() {
            self.end = at.next_column();
            self.has_code |= code;
        }
    }

    fn finish(self, end: Option<Position>) -> Option<Statement> {
        if !self.has_code {
            return None;
        }
        Some(Statement {
            start: self.start?,
            end: end.unwrap_or(self.end),
            text: strip_trailing_semicolon(self.text.trim()).to_string(),
        })
    }
}
