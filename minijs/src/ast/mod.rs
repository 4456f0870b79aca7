//! Syntax tree produced by the parser

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::lexer::{Chunk, Token};

/// Node kinds, one per grammar production plus the leaf wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyntaxKind {
    Leaf,
    Root,
    Program,
    Statement,
    IfStmt,
    VarStmt,
    VarStmtNames,
    ReturnStmt,
    TryStmt,
    ThrowStmt,
    ForStmt,
    WhileStmt,
    DoWhileStmt,
    SwitchStmt,
    CaseBlock,
    DefaultBlock,
    BreakStmt,
    DeleteStmt,
    Block,
    Eos,
    Expr,
    ExprList,
    FnExpr,
    FnArrowExpr,
    FnDeclArgs,
    FnDeclArg,
    NewExpr,
    TypeofExpr,
    InstanceofExpr,
    FnCallExpr,
    FnCallArgs,
    FnCallArg,
    AssignExpr,
    LogicExpr,
    LogicAndExpr,
    LogicTernExpr,
    LogicBitExpr,
    MathAddExpr,
    MathMulExpr,
    MathExpExpr,
    MathPostExpr,
    MathPreExpr,
    RefExpr,
    RefDotExpr,
    RefBracketExpr,
    UnaryExpr,
    LitObject,
    ObjectElem,
    LitArray,
    ArrayElem,
    LitExpr,
    ParenExpr,
    LitTemplate,
    RegexLiteral,
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntaxKind::Leaf => "LEAF",
            SyntaxKind::Root => "ROOT",
            SyntaxKind::Program => "PROGRAM",
            SyntaxKind::Statement => "STATEMENT",
            SyntaxKind::IfStmt => "IF_STMT",
            SyntaxKind::VarStmt => "VAR_STMT",
            SyntaxKind::VarStmtNames => "VAR_STMT_NAMES",
            SyntaxKind::ReturnStmt => "RETURN_STMT",
            SyntaxKind::TryStmt => "TRY_STMT",
            SyntaxKind::ThrowStmt => "THROW_STMT",
            SyntaxKind::ForStmt => "FOR_STMT",
            SyntaxKind::WhileStmt => "WHILE_STMT",
            SyntaxKind::DoWhileStmt => "DO_WHILE_STMT",
            SyntaxKind::SwitchStmt => "SWITCH_STMT",
            SyntaxKind::CaseBlock => "CASE_BLOCK",
            SyntaxKind::DefaultBlock => "DEFAULT_BLOCK",
            SyntaxKind::BreakStmt => "BREAK_STMT",
            SyntaxKind::DeleteStmt => "DELETE_STMT",
            SyntaxKind::Block => "BLOCK",
            SyntaxKind::Eos => "EOS",
            SyntaxKind::Expr => "EXPR",
            SyntaxKind::ExprList => "EXPR_LIST",
            SyntaxKind::FnExpr => "FN_EXPR",
            SyntaxKind::FnArrowExpr => "FN_ARROW_EXPR",
            SyntaxKind::FnDeclArgs => "FN_DECL_ARGS",
            SyntaxKind::FnDeclArg => "FN_DECL_ARG",
            SyntaxKind::NewExpr => "NEW_EXPR",
            SyntaxKind::TypeofExpr => "TYPEOF_EXPR",
            SyntaxKind::InstanceofExpr => "INSTANCEOF_EXPR",
            SyntaxKind::FnCallExpr => "FN_CALL_EXPR",
            SyntaxKind::FnCallArgs => "FN_CALL_ARGS",
            SyntaxKind::FnCallArg => "FN_CALL_ARG",
            SyntaxKind::AssignExpr => "ASSIGN_EXPR",
            SyntaxKind::LogicExpr => "LOGIC_EXPR",
            SyntaxKind::LogicAndExpr => "LOGIC_AND_EXPR",
            SyntaxKind::LogicTernExpr => "LOGIC_TERN_EXPR",
            SyntaxKind::LogicBitExpr => "LOGIC_BIT_EXPR",
            SyntaxKind::MathAddExpr => "MATH_ADD_EXPR",
            SyntaxKind::MathMulExpr => "MATH_MUL_EXPR",
            SyntaxKind::MathExpExpr => "MATH_EXP_EXPR",
            SyntaxKind::MathPostExpr => "MATH_POST_EXPR",
            SyntaxKind::MathPreExpr => "MATH_PRE_EXPR",
            SyntaxKind::RefExpr => "REF_EXPR",
            SyntaxKind::RefDotExpr => "REF_DOT_EXPR",
            SyntaxKind::RefBracketExpr => "REF_BRACKET_EXPR",
            SyntaxKind::UnaryExpr => "UNARY_EXPR",
            SyntaxKind::LitObject => "LIT_OBJECT",
            SyntaxKind::ObjectElem => "OBJECT_ELEM",
            SyntaxKind::LitArray => "LIT_ARRAY",
            SyntaxKind::ArrayElem => "ARRAY_ELEM",
            SyntaxKind::LitExpr => "LIT_EXPR",
            SyntaxKind::ParenExpr => "PAREN_EXPR",
            SyntaxKind::LitTemplate => "LIT_TEMPLATE",
            SyntaxKind::RegexLiteral => "REGEX_LITERAL",
        };
        write!(f, "{name}")
    }
}

/// Parse tree node. Inner nodes carry a kind and children, leaf nodes
/// additionally carry the chunk they wrap. Children are reference
/// counted so function values can hold on to their body subtree after
/// the enclosing program node is dropped.
#[derive(Debug, Serialize)]
pub struct Node {
    pub kind: SyntaxKind,
    pub chunk: Option<Chunk>,
    pub children: Vec<Rc<Node>>,
}

impl Node {
    pub fn new(kind: SyntaxKind) -> Node {
        Node {
            kind,
            chunk: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(chunk: Chunk) -> Node {
        Node {
            kind: SyntaxKind::Leaf,
            chunk: Some(chunk),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == SyntaxKind::Leaf
    }

    /// Token of a leaf node, `None` for inner nodes.
    pub fn token(&self) -> Option<Token> {
        self.chunk.as_ref().map(|c| c.token)
    }

    /// Leaf text, empty for inner nodes.
    pub fn chunk_text(&self) -> &str {
        match &self.chunk {
            Some(chunk) => &chunk.text,
            None => "",
        }
    }

    /// First chunk in document order, used for error positions.
    pub fn first_chunk(&self) -> Option<&Chunk> {
        if let Some(chunk) = &self.chunk {
            return Some(chunk);
        }
        for child in &self.children {
            if let Some(chunk) = child.first_chunk() {
                return Some(chunk);
            }
        }
        None
    }

    /// Depth-first search for the first descendant of the given kind.
    pub fn find_first(&self, kind: SyntaxKind) -> Option<&Node> {
        for child in &self.children {
            if child.kind == kind {
                return Some(child);
            }
            if let Some(found) = child.find_first(kind) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first search for the first leaf with the given token.
    pub fn find_first_token(&self, token: Token) -> Option<&Node> {
        for child in &self.children {
            if child.token() == Some(token) {
                return Some(child);
            }
            if let Some(found) = child.find_first_token(token) {
                return Some(found);
            }
        }
        None
    }

    /// Direct children of the given kind.
    pub fn children_of(&self, kind: SyntaxKind) -> impl Iterator<Item = &Rc<Node>> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Source text of the subtree with whitespace removed. Display
    /// joins leaf texts with spaces instead, for error messages.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(chunk) = &self.chunk {
            out.push_str(&chunk.text);
            return;
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(chunk) = &self.chunk {
            return write!(f, "{}", chunk.text);
        }
        let mut first = true;
        for child in &self.children {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{child}")?;
            first = false;
        }
        Ok(())
    }
}
