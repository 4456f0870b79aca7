//! Token definitions

use std::fmt;

use logos::Logos;
use serde::Serialize;

/// Tokens of the scripting grammar. `Regex`, `DollarLCurly`, `TStr` and
/// `Eof` carry no pattern, the lexer loop produces them by hand.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Token {
    // whitespace that crosses at least one newline, the whole run
    #[regex(r"[ \t\r]*\n[ \t\r\n]*")]
    WsLf,
    #[regex(r"[ \t\r]+")]
    Ws,
    #[regex(r"//[^\n]*")]
    LComment,
    #[regex(r"/\*[^*]*\*+([^*/][^*]*\*+)*/")]
    BComment,

    #[token("`")]
    Backtick,
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("...")]
    DotDotDot,
    #[token(".")]
    Dot,

    // keywords
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("new")]
    New,
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("typeof")]
    Typeof,
    #[token("instanceof")]
    Instanceof,
    #[token("delete")]
    Delete,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("of")]
    Of,
    #[token("do")]
    Do,
    #[token("while")]
    While,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("this")]
    This,
    #[token("void")]
    Void,

    // operators
    #[token("===")]
    EqEqEq,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("=>")]
    EqGt,
    #[token("<<=")]
    LtLtEq,
    #[token("<<")]
    LtLt,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">>>=")]
    GtGtGtEq,
    #[token(">>>")]
    GtGtGt,
    #[token(">>=")]
    GtGtEq,
    #[token(">>")]
    GtGt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("!==")]
    NotEqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Not,
    #[token("||=")]
    PipePipeEq,
    #[token("||")]
    PipePipe,
    #[token("|=")]
    PipeEq,
    #[token("|")]
    Pipe,
    #[token("&&=")]
    AmpAmpEq,
    #[token("&&")]
    AmpAmp,
    #[token("&=")]
    AmpEq,
    #[token("&")]
    Amp,
    #[token("^=")]
    CaretEq,
    #[token("^")]
    Caret,
    #[token("??")]
    QuesQues,
    #[token("?")]
    Ques,
    #[token("++")]
    PlusPlus,
    #[token("+=")]
    PlusEq,
    #[token("+")]
    Plus,
    #[token("--")]
    MinusMinus,
    #[token("-=")]
    MinusEq,
    #[token("-")]
    Minus,
    #[token("**=")]
    StarStarEq,
    #[token("**")]
    StarStar,
    #[token("*=")]
    StarEq,
    #[token("*")]
    Star,
    #[token("/=")]
    SlashEq,
    #[token("/")]
    Slash,
    #[token("%=")]
    PercentEq,
    #[token("%")]
    Percent,
    #[token("~")]
    Tilde,

    // literals, unescaped newlines are allowed inside quotes
    #[regex(r"'([^'\\]|\\[\s\S])*'")]
    SStr,
    #[regex(r#""([^"\\]|\\[\s\S])*""#)]
    DStr,
    #[regex(r"0[xX][0-9a-fA-F]+", priority = 3)]
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", priority = 2)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", priority = 2)]
    Number,
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", priority = 1)]
    Ident,

    // produced by hand in the lexer loop
    Regex,
    DollarLCurly,
    TStr,
    Eof,
}

impl Token {
    /// Primary tokens are handed to the parser, the rest only survive
    /// as the `prev` link on the following chunk.
    pub fn is_primary(self) -> bool {
        !matches!(
            self,
            Token::WsLf | Token::Ws | Token::LComment | Token::BComment | Token::Eof
        )
    }

    /// Keywords double as property names after a dot.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Token::Null
                | Token::True
                | Token::False
                | Token::Function
                | Token::Return
                | Token::Try
                | Token::Catch
                | Token::Finally
                | Token::Throw
                | Token::New
                | Token::Var
                | Token::Let
                | Token::Const
                | Token::If
                | Token::Else
                | Token::Typeof
                | Token::Instanceof
                | Token::Delete
                | Token::For
                | Token::In
                | Token::Of
                | Token::Do
                | Token::While
                | Token::Switch
                | Token::Case
                | Token::Default
                | Token::Break
                | Token::This
                | Token::Void
        )
    }

    /// True when this token can end an operand, in which case a `/`
    /// right after it is division and not the start of a regex literal.
    /// A backtick can only be a closing one here, the lexer never asks
    /// while inside a template.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            Token::Ident
                | Token::Number
                | Token::SStr
                | Token::DStr
                | Token::Regex
                | Token::Backtick
                | Token::RParen
                | Token::RBracket
                | Token::This
                | Token::True
                | Token::False
                | Token::Null
                | Token::PlusPlus
                | Token::MinusMinus
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Token::WsLf => "WS_LF",
            Token::Ws => "WS",
            Token::LComment => "L_COMMENT",
            Token::BComment => "B_COMMENT",
            Token::Backtick => "BACKTICK",
            Token::LCurly => "L_CURLY",
            Token::RCurly => "R_CURLY",
            Token::LBracket => "L_BRACKET",
            Token::RBracket => "R_BRACKET",
            Token::LParen => "L_PAREN",
            Token::RParen => "R_PAREN",
            Token::Comma => "COMMA",
            Token::Colon => "COLON",
            Token::Semi => "SEMI",
            Token::DotDotDot => "DOT_DOT_DOT",
            Token::Dot => "DOT",
            Token::Null => "NULL",
            Token::True => "TRUE",
            Token::False => "FALSE",
            Token::Function => "FUNCTION",
            Token::Return => "RETURN",
            Token::Try => "TRY",
            Token::Catch => "CATCH",
            Token::Finally => "FINALLY",
            Token::Throw => "THROW",
            Token::New => "NEW",
            Token::Var => "VAR",
            Token::Let => "LET",
            Token::Const => "CONST",
            Token::If => "IF",
            Token::Else => "ELSE",
            Token::Typeof => "TYPEOF",
            Token::Instanceof => "INSTANCEOF",
            Token::Delete => "DELETE",
            Token::For => "FOR",
            Token::In => "IN",
            Token::Of => "OF",
            Token::Do => "DO",
            Token::While => "WHILE",
            Token::Switch => "SWITCH",
            Token::Case => "CASE",
            Token::Default => "DEFAULT",
            Token::Break => "BREAK",
            Token::This => "THIS",
            Token::Void => "VOID",
            Token::EqEqEq => "EQ_EQ_EQ",
            Token::EqEq => "EQ_EQ",
            Token::Eq => "EQ",
            Token::EqGt => "EQ_GT",
            Token::LtLtEq => "LT_LT_EQ",
            Token::LtLt => "LT_LT",
            Token::LtEq => "LT_EQ",
            Token::Lt => "LT",
            Token::GtGtGtEq => "GT_GT_GT_EQ",
            Token::GtGtGt => "GT_GT_GT",
            Token::GtGtEq => "GT_GT_EQ",
            Token::GtGt => "GT_GT",
            Token::GtEq => "GT_EQ",
            Token::Gt => "GT",
            Token::NotEqEq => "NOT_EQ_EQ",
            Token::NotEq => "NOT_EQ",
            Token::Not => "NOT",
            Token::PipePipeEq => "PIPE_PIPE_EQ",
            Token::PipePipe => "PIPE_PIPE",
            Token::PipeEq => "PIPE_EQ",
            Token::Pipe => "PIPE",
            Token::AmpAmpEq => "AMP_AMP_EQ",
            Token::AmpAmp => "AMP_AMP",
            Token::AmpEq => "AMP_EQ",
            Token::Amp => "AMP",
            Token::CaretEq => "CARET_EQ",
            Token::Caret => "CARET",
            Token::QuesQues => "QUES_QUES",
            Token::Ques => "QUES",
            Token::PlusPlus => "PLUS_PLUS",
            Token::PlusEq => "PLUS_EQ",
            Token::Plus => "PLUS",
            Token::MinusMinus => "MINUS_MINUS",
            Token::MinusEq => "MINUS_EQ",
            Token::Minus => "MINUS",
            Token::StarStarEq => "STAR_STAR_EQ",
            Token::StarStar => "STAR_STAR",
            Token::StarEq => "STAR_EQ",
            Token::Star => "STAR",
            Token::SlashEq => "SLASH_EQ",
            Token::Slash => "SLASH",
            Token::PercentEq => "PERCENT_EQ",
            Token::Percent => "PERCENT",
            Token::Tilde => "TILDE",
            Token::SStr => "S_STRING",
            Token::DStr => "D_STRING",
            Token::Number => "NUMBER",
            Token::Ident => "IDENT",
            Token::Regex => "REGEX",
            Token::DollarLCurly => "DOLLAR_L_CURLY",
            Token::TStr => "T_STRING",
            Token::Eof => "EOF",
        };
        write!(f, "{name}")
    }
}
