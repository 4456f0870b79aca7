//! Error types and reporting

use thiserror::Error as ThisError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    #[error("lexer error at [{line}:{col}]: {message}")]
    Lex {
        message: String,
        line: usize,
        col: usize,
        pos: usize,
    },

    #[error("syntax error at [{line}:{col}]: {message}")]
    Syntax {
        message: String,
        line: usize,
        col: usize,
        pos: usize,
    },

    #[error("{message}")]
    Eval { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl Error {
    /// `line` and `col` are 1-based display positions
    pub fn lex(message: impl Into<String>, line: usize, col: usize, pos: usize) -> Self {
        Self::Lex {
            message: message.into(),
            line,
            col,
            pos,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, col: usize, pos: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            col,
            pos,
        }
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Self::Eval {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Byte offset into the source, for errors that carry one
    pub fn pos(&self) -> Option<usize> {
        match self {
            Self::Lex { pos, .. } => Some(*pos),
            Self::Syntax { pos, .. } => Some(*pos),
            Self::Eval { .. } | Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. } => message,
            Self::Syntax { message, .. } => message,
            Self::Eval { message } => message,
            Self::Io { message } => message,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(e.to_string())
    }
}

/// Report a positioned error with ariadne
pub fn report(filename: &str, source: &str, error: &Error) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        Error::Lex { .. } => "lexer",
        Error::Syntax { .. } => "syntax",
        Error::Eval { .. } => "eval",
        Error::Io { .. } => "io",
    };

    if let Some(pos) = error.pos() {
        let end = (pos + 1).min(source.len());
        let _ = Report::build(ReportKind::Error, (filename, pos..end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, pos..end))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
            .print((filename, Source::from(source)));
    } else {
        let _ = Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish()
            .print((filename, Source::from(source)));
    }
}
