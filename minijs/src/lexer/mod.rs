//! Lexer implementation using logos

mod token;

pub use token::Token;

use logos::Logos;
use serde::Serialize;

use crate::error::{Error, Result};

/// A lexed token with its position and raw source text.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub token: Token,
    /// Byte offset into the source.
    pub pos: usize,
    /// Zero-based line.
    pub line: usize,
    /// Zero-based column in characters.
    pub col: usize,
    pub text: String,
    /// Token lexed immediately before this one, whitespace and
    /// comments included. Drives newline statement termination.
    pub prev: Option<Token>,
}

impl Chunk {
    /// One-based position for error messages.
    pub fn position_display(&self) -> String {
        format!("[{}:{}]", self.line + 1, self.col + 1)
    }
}

enum Mode {
    Template,
    Expr { braces: usize },
}

struct Cursor {
    chunks: Vec<Chunk>,
    line: usize,
    col: usize,
    prev: Option<Token>,
    last_primary: Option<Token>,
}

impl Cursor {
    fn emit(&mut self, token: Token, pos: usize, text: &str) {
        let chunk = Chunk {
            token,
            pos,
            line: self.line,
            col: self.col,
            text: text.to_string(),
            prev: self.prev,
        };
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.prev = Some(token);
        if token.is_primary() {
            self.last_primary = Some(token);
            self.chunks.push(chunk);
        }
    }
}

/// Tokenize source text into primary chunks, with an EOF chunk
/// appended. Whitespace and comments are dropped but remain visible
/// through the `prev` link of the chunk that follows them.
pub fn tokenize(source: &str) -> Result<Vec<Chunk>> {
    let mut lexer = Token::lexer(source);
    let mut modes: Vec<Mode> = Vec::new();
    let mut cur = Cursor {
        chunks: Vec::new(),
        line: 0,
        col: 0,
        prev: None,
        last_primary: None,
    };

    loop {
        if matches!(modes.last(), Some(Mode::Template)) {
            let pos = lexer.span().end;
            let rest = lexer.remainder();
            if rest.is_empty() {
                // missing closing backtick, the parser reports it
                break;
            }
            if rest.starts_with('`') {
                lexer.bump(1);
                cur.emit(Token::Backtick, pos, "`");
                modes.pop();
            } else if rest.starts_with("${") {
                lexer.bump(2);
                cur.emit(Token::DollarLCurly, pos, "${");
                modes.push(Mode::Expr { braces: 0 });
            } else {
                let len = template_text_len(rest);
                let text = &rest[..len];
                lexer.bump(len);
                cur.emit(Token::TStr, pos, text);
            }
            continue;
        }
        let Some(result) = lexer.next() else {
            break;
        };
        let mut token = match result {
            Ok(token) => token,
            Err(()) => {
                return Err(Error::lex(
                    format!("unexpected character: {:?}", lexer.slice()),
                    cur.line + 1,
                    cur.col + 1,
                    lexer.span().start,
                ));
            }
        };
        if matches!(token, Token::Slash | Token::SlashEq)
            && !cur.last_primary.is_some_and(Token::ends_operand)
        {
            if let Some(extra) = regex_tail_len(lexer.remainder()) {
                lexer.bump(extra);
                token = Token::Regex;
            }
        }
        match token {
            Token::Backtick => modes.push(Mode::Template),
            Token::LCurly => {
                if let Some(Mode::Expr { braces }) = modes.last_mut() {
                    *braces += 1;
                }
            }
            Token::RCurly => {
                if let Some(Mode::Expr { braces }) = modes.last_mut() {
                    if *braces == 0 {
                        modes.pop();
                    } else {
                        *braces -= 1;
                    }
                }
            }
            _ => {}
        }
        cur.emit(token, lexer.span().start, lexer.slice());
    }

    let eof = Chunk {
        token: Token::Eof,
        pos: source.len(),
        line: cur.line,
        col: cur.col,
        text: String::new(),
        prev: cur.prev,
    };
    cur.chunks.push(eof);
    Ok(cur.chunks)
}

/// Length of the raw text run inside a template literal, stopping
/// before a closing backtick or a `${` placeholder.
fn template_text_len(rest: &str) -> usize {
    let mut escaped = false;
    let mut dollar = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            dollar = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                dollar = false;
            }
            '`' => return i,
            '{' if dollar => return i - 1,
            '$' => dollar = true,
            _ => dollar = false,
        }
    }
    rest.len()
}

/// Length of the rest of a regex literal after the opening slash has
/// been consumed, or `None` when no closing slash exists on the line
/// and the slash was division after all.
fn regex_tail_len(rest: &str) -> Option<usize> {
    let mut in_class = false;
    let mut escaped = false;
    let mut end = None;
    for (i, c) in rest.char_indices() {
        if escaped {
            if c == '\n' {
                return None;
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\n' => return None,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                end = Some(i);
                break;
            }
            _ => {}
        }
    }
    let mut len = end? + 1;
    for c in rest[len..].chars() {
        if c.is_ascii_alphabetic() {
            len += c.len_utf8();
        } else {
            break;
        }
    }
    Some(len)
}
