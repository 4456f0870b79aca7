//! Backtracking recursive descent parser

#[cfg(test)]
mod tests;

use std::rc::Rc;

use crate::ast::{Node, SyntaxKind};
use crate::error::{Error, Result};
use crate::lexer::{tokenize, Chunk, Token};

const MAX_DEPTH: usize = 100;
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

enum Shift {
    None,
    Left,
    Right,
}

struct Marker {
    position: usize,
    node: Node,
}

/// Single-use parser over a tokenized source. Productions try
/// alternatives in a fixed order and roll the cursor back through
/// markers when one does not pan out.
pub struct Parser {
    chunks: Vec<Chunk>,
    position: usize,
    root: Node,
    markers: Vec<Marker>,
}

impl Parser {
    pub fn new(source: &str) -> Result<Parser> {
        let chunks = tokenize(source)?;
        Ok(Parser {
            chunks,
            position: 0,
            root: Node::new(SyntaxKind::Root),
            markers: Vec::new(),
        })
    }

    pub fn parse(&mut self) -> Result<Rc<Node>> {
        self.enter(SyntaxKind::Program)?;
        loop {
            if !self.statement(false)? {
                break;
            }
        }
        if self.peek() != Token::Eof {
            return Err(self.fail("cannot parse statement"));
        }
        self.exit();
        match self.root.children.pop() {
            Some(program) => Ok(program),
            None => Err(self.fail("cannot parse statement")),
        }
    }

    //==================================================================
    // marker machinery

    fn enter(&mut self, kind: SyntaxKind) -> Result<()> {
        self.markers.push(Marker {
            position: self.position,
            node: Node::new(kind),
        });
        if self.markers.len() > MAX_DEPTH {
            return Err(self.fail("too much recursion"));
        }
        Ok(())
    }

    fn enter_if(&mut self, kind: SyntaxKind, tokens: &[Token]) -> Result<bool> {
        if !self.peek_any_of(tokens) {
            return Ok(false);
        }
        self.enter(kind)?;
        self.consume_next();
        Ok(true)
    }

    fn exit(&mut self) -> bool {
        self.finish(true, Shift::None);
        true
    }

    fn exit_if(&mut self, result: bool, mandatory: bool) -> Result<bool> {
        if mandatory && !result {
            let kind = match self.markers.last() {
                Some(marker) => marker.node.kind,
                None => SyntaxKind::Root,
            };
            return Err(self.fail(&format!("expected: [{kind}]")));
        }
        self.finish(result, Shift::None);
        Ok(result)
    }

    fn exit_shift(&mut self, shift: Shift) {
        self.finish(true, shift);
    }

    fn finish(&mut self, result: bool, shift: Shift) {
        let Some(marker) = self.markers.pop() else {
            return;
        };
        if !result {
            self.position = marker.position;
            return;
        }
        let parent = match self.markers.last_mut() {
            Some(m) => &mut m.node,
            None => &mut self.root,
        };
        attach(parent, marker.node, shift);
    }

    fn current_node(&mut self) -> &mut Node {
        match self.markers.last_mut() {
            Some(m) => &mut m.node,
            None => &mut self.root,
        }
    }

    //==================================================================
    // cursor

    fn peek(&self) -> Token {
        match self.chunks.get(self.position) {
            Some(chunk) => chunk.token,
            None => Token::Eof,
        }
    }

    fn peek_if(&self, token: Token) -> bool {
        self.peek() == token
    }

    fn peek_prev(&self) -> Token {
        if self.position == 0 {
            return Token::Eof;
        }
        match self.chunks.get(self.position - 1) {
            Some(chunk) => chunk.token,
            None => Token::Eof,
        }
    }

    fn peek_any_of(&self, tokens: &[Token]) -> bool {
        tokens.iter().any(|t| self.peek_if(*t))
    }

    fn consume_next(&mut self) {
        if let Some(chunk) = self.chunks.get(self.position) {
            let leaf = Node::leaf(chunk.clone());
            self.position += 1;
            self.current_node().children.push(Rc::new(leaf));
        }
    }

    fn consume(&mut self, token: Token) -> Result<()> {
        if self.consume_if(token) {
            Ok(())
        } else {
            Err(self.expected_tokens(&[token]))
        }
    }

    fn consume_if(&mut self, token: Token) -> bool {
        if self.peek_if(token) {
            self.consume_next();
            true
        } else {
            false
        }
    }

    fn any_of(&mut self, tokens: &[Token]) -> bool {
        for token in tokens {
            if self.consume_if(*token) {
                return true;
            }
        }
        false
    }

    //==================================================================
    // errors

    fn fail(&self, message: &str) -> Error {
        let chunk = if self.position < self.chunks.len() {
            self.chunks.get(self.position)
        } else {
            self.chunks.last()
        };
        match chunk {
            Some(chunk) => Error::syntax(message, chunk.line + 1, chunk.col + 1, chunk.pos),
            None => Error::syntax(message, 1, 1, 0),
        }
    }

    fn expected_tokens(&self, tokens: &[Token]) -> Error {
        let names: Vec<String> = tokens.iter().map(Token::to_string).collect();
        self.fail(&format!("expected: [{}]", names.join(", ")))
    }

    fn expected_kinds(&self, kinds: &[SyntaxKind]) -> Error {
        let names: Vec<String> = kinds.iter().map(SyntaxKind::to_string).collect();
        self.fail(&format!("expected: [{}]", names.join(", ")))
    }

    /// End of statement: EOF, a closing brace ahead, an explicit
    /// semicolon, or a newline before the next chunk.
    fn eos(&mut self) -> Result<bool> {
        if self.peek() == Token::Eof {
            return Ok(true);
        }
        if self.peek_if(Token::RCurly) {
            return Ok(true);
        }
        if self.enter_if(SyntaxKind::Eos, &[Token::Semi])? {
            return Ok(self.exit());
        }
        match self.chunks.get(self.position) {
            Some(chunk) => Ok(chunk.prev == Some(Token::WsLf)),
            None => Ok(false),
        }
    }

    //==================================================================
    // statements

    fn statement(&mut self, mandatory: bool) -> Result<bool> {
        self.enter(SyntaxKind::Statement)?;
        let mut result = self.if_stmt()?;
        result = result || (self.var_stmt()? && self.eos()?);
        result = result || (self.return_stmt()? && self.eos()?);
        result = result || (self.throw_stmt()? && self.eos()?);
        result = result || self.try_stmt()?;
        result = result || self.for_stmt()?;
        result = result || self.while_stmt()?;
        result = result || self.do_while_stmt()?;
        result = result || self.switch_stmt()?;
        result = result || (self.break_stmt()? && self.eos()?);
        result = result || (self.delete_stmt()? && self.eos()?);
        result = result || (self.expr_list()? && self.eos()?);
        result = result || self.block(false)?;
        result = result || self.consume_if(Token::Semi); // empty statement
        self.exit_if(result, mandatory)
    }

    fn expr_list(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::ExprList)?;
        let mut at_least_one = false;
        loop {
            if self.expr(-1, false)? {
                at_least_one = true;
            } else {
                break;
            }
            if !self.consume_if(Token::Comma) {
                break;
            }
        }
        self.exit_if(at_least_one, false)
    }

    fn if_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::IfStmt, &[Token::If])? {
            return Ok(false);
        }
        self.consume(Token::LParen)?;
        self.expr(-1, true)?;
        self.consume(Token::RParen)?;
        self.statement(true)?;
        if self.consume_if(Token::Else) {
            self.statement(true)?;
        }
        Ok(self.exit())
    }

    fn var_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::VarStmt, &[Token::Var, Token::Const, Token::Let])? {
            return Ok(false);
        }
        if !self.var_stmt_names()? {
            return Err(self.expected_kinds(&[SyntaxKind::VarStmtNames]));
        }
        if self.consume_if(Token::Eq) {
            self.expr(-1, true)?;
        }
        Ok(self.exit())
    }

    fn var_stmt_names(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::VarStmtNames, &[Token::Ident])? {
            return Ok(false);
        }
        while self.consume_if(Token::Comma) {
            self.consume(Token::Ident)?;
        }
        Ok(self.exit())
    }

    fn return_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::ReturnStmt, &[Token::Return])? {
            return Ok(false);
        }
        self.expr(-1, false)?;
        Ok(self.exit())
    }

    fn throw_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::ThrowStmt, &[Token::Throw])? {
            return Ok(false);
        }
        self.expr(-1, true)?;
        Ok(self.exit())
    }

    fn try_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::TryStmt, &[Token::Try])? {
            return Ok(false);
        }
        self.block(true)?;
        if self.consume_if(Token::Catch) {
            if self.consume_if(Token::LParen)
                && self.consume_if(Token::Ident)
                && self.consume_if(Token::RParen)
                && self.block(true)?
            {
                if self.consume_if(Token::Finally) {
                    self.block(true)?;
                }
            } else if self.block(false)? {
                // catch without an error variable
            } else {
                return Err(self.expected_tokens(&[Token::Catch]));
            }
        } else if self.consume_if(Token::Finally) {
            self.block(true)?;
        } else {
            return Err(self.expected_tokens(&[Token::Catch, Token::Finally]));
        }
        Ok(self.exit())
    }

    fn for_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::ForStmt, &[Token::For])? {
            return Ok(false);
        }
        self.consume(Token::LParen)?;
        if self.peek_if(Token::Semi) || self.var_stmt()? || self.expr(-1, false)? {
            // ok
        } else {
            return Err(self.expected_kinds(&[SyntaxKind::VarStmt, SyntaxKind::Expr]));
        }
        if self.consume_if(Token::Semi) {
            if self.peek_if(Token::Semi) || self.expr(-1, false)? {
                if self.consume_if(Token::Semi) {
                    if self.peek_if(Token::RParen) || self.expr(-1, false)? {
                        // ok
                    } else {
                        return Err(self.expected_kinds(&[SyntaxKind::Expr]));
                    }
                } else {
                    return Err(self.expected_tokens(&[Token::Semi]));
                }
            } else {
                return Err(self.expected_kinds(&[SyntaxKind::Expr]));
            }
        } else if self.any_of(&[Token::In, Token::Of]) {
            self.expr(-1, true)?;
        } else {
            return Err(self.expected_tokens(&[Token::Semi, Token::In, Token::Of]));
        }
        self.consume(Token::RParen)?;
        self.statement(true)?;
        Ok(self.exit())
    }

    fn while_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::WhileStmt, &[Token::While])? {
            return Ok(false);
        }
        self.consume(Token::LParen)?;
        self.expr(-1, true)?;
        self.consume(Token::RParen)?;
        self.statement(true)?;
        Ok(self.exit())
    }

    fn do_while_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::DoWhileStmt, &[Token::Do])? {
            return Ok(false);
        }
        self.statement(true)?;
        self.consume(Token::While)?;
        self.consume(Token::LParen)?;
        self.expr(-1, true)?;
        self.consume(Token::RParen)?;
        Ok(self.exit())
    }

    fn switch_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::SwitchStmt, &[Token::Switch])? {
            return Ok(false);
        }
        self.consume(Token::LParen)?;
        self.expr(-1, true)?;
        self.consume(Token::RParen)?;
        self.consume(Token::LCurly)?;
        loop {
            if !self.case_block()? {
                break;
            }
        }
        self.default_block()?;
        self.consume(Token::RCurly)?;
        Ok(self.exit())
    }

    fn case_block(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::CaseBlock, &[Token::Case])? {
            return Ok(false);
        }
        self.expr(-1, true)?;
        self.consume(Token::Colon)?;
        loop {
            if !self.statement(false)? {
                break;
            }
        }
        Ok(self.exit())
    }

    fn default_block(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::DefaultBlock, &[Token::Default])? {
            return Ok(false);
        }
        self.consume(Token::Colon)?;
        loop {
            if !self.statement(false)? {
                break;
            }
        }
        Ok(self.exit())
    }

    fn break_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::BreakStmt, &[Token::Break])? {
            return Ok(false);
        }
        Ok(self.exit())
    }

    // an expression by the book, but easier to treat as a statement
    fn delete_stmt(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::DeleteStmt, &[Token::Delete])? {
            return Ok(false);
        }
        self.expr(8, true)?;
        Ok(self.exit())
    }

    fn block(&mut self, mandatory: bool) -> Result<bool> {
        if !self.enter_if(SyntaxKind::Block, &[Token::LCurly])? {
            if mandatory {
                return Err(self.expected_kinds(&[SyntaxKind::Block]));
            }
            return Ok(false);
        }
        loop {
            if !self.statement(false)? {
                break;
            }
        }
        self.consume(Token::RCurly)?;
        Ok(self.exit())
    }

    //==================================================================
    // expressions

    fn expr(&mut self, priority: i32, mandatory: bool) -> Result<bool> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.expr_inner(priority, mandatory)
        })
    }

    fn expr_inner(&mut self, priority: i32, mandatory: bool) -> Result<bool> {
        self.enter(SyntaxKind::Expr)?;
        let mut result = self.fn_arrow_expr()?;
        result = result || self.fn_expr()?;
        result = result || self.new_expr()?;
        result = result || self.typeof_expr()?;
        result = result || self.ref_expr()?;
        result = result || self.lit_expr()?;
        result = result || self.paren_expr()?;
        result = result || self.unary_expr()?;
        result = result || self.math_pre_expr()?;
        self.expr_rhs(priority)?;
        self.exit_if(result, mandatory)
    }

    fn expr_rhs(&mut self, priority: i32) -> Result<()> {
        loop {
            if priority < 0
                && self.enter_if(
                    SyntaxKind::AssignExpr,
                    &[
                        Token::Eq,
                        Token::PlusEq,
                        Token::MinusEq,
                        Token::StarEq,
                        Token::SlashEq,
                        Token::PercentEq,
                        Token::StarStarEq,
                        Token::GtGtEq,
                        Token::LtLtEq,
                        Token::GtGtGtEq,
                    ],
                )?
            {
                self.expr(-1, true)?;
                self.exit_shift(Shift::Right);
            } else if priority < 1 && self.enter_if(SyntaxKind::LogicTernExpr, &[Token::Ques])? {
                self.expr(-1, true)?;
                self.consume(Token::Colon)?;
                self.expr(-1, true)?;
                self.exit_shift(Shift::Right);
            } else if priority < 2
                && self.enter_if(SyntaxKind::LogicAndExpr, &[Token::AmpAmp, Token::PipePipe])?
            {
                self.expr(2, true)?;
                self.exit_shift(Shift::Left);
            } else if priority < 3
                && self.enter_if(
                    SyntaxKind::LogicExpr,
                    &[
                        Token::EqEqEq,
                        Token::NotEqEq,
                        Token::EqEq,
                        Token::NotEq,
                        Token::Lt,
                        Token::Gt,
                        Token::LtEq,
                        Token::GtEq,
                    ],
                )?
            {
                self.expr(3, true)?;
                self.exit_shift(Shift::Left);
            } else if priority < 4
                && self.enter_if(
                    SyntaxKind::LogicBitExpr,
                    &[
                        Token::Amp,
                        Token::Pipe,
                        Token::Caret,
                        Token::GtGt,
                        Token::LtLt,
                        Token::GtGtGt,
                    ],
                )?
            {
                self.expr(4, true)?;
                self.exit_shift(Shift::Left);
            } else if priority < 5
                && self.enter_if(SyntaxKind::MathAddExpr, &[Token::Plus, Token::Minus])?
            {
                self.expr(5, true)?;
                self.exit_shift(Shift::Left);
            } else if priority < 6
                && self.enter_if(
                    SyntaxKind::MathMulExpr,
                    &[Token::Star, Token::Slash, Token::Percent],
                )?
            {
                self.expr(6, true)?;
                self.exit_shift(Shift::Left);
            } else if priority < 7 && self.peek_if(Token::StarStar) {
                loop {
                    self.enter(SyntaxKind::MathExpExpr)?;
                    self.consume_next();
                    self.expr(7, true)?;
                    self.exit_shift(Shift::Right);
                    if !self.peek_if(Token::StarStar) {
                        break;
                    }
                }
            } else if self.enter_if(SyntaxKind::FnCallExpr, &[Token::LParen])? {
                self.fn_call_args()?;
                self.consume(Token::RParen)?;
                self.exit_shift(Shift::Left);
            } else if self.enter_if(SyntaxKind::RefDotExpr, &[Token::Dot])? {
                let next = self.peek();
                // reserved words are fine as property accessors
                if next == Token::Ident || next.is_keyword() {
                    self.consume_next();
                } else {
                    return Err(self.expected_tokens(&[Token::Ident]));
                }
                self.exit_shift(Shift::Left);
            } else if self.enter_if(SyntaxKind::RefBracketExpr, &[Token::LBracket])? {
                self.expr(-1, true)?;
                self.consume(Token::RBracket)?;
                self.exit_shift(Shift::Left);
            } else if self.enter_if(
                SyntaxKind::MathPostExpr,
                &[Token::PlusPlus, Token::MinusMinus],
            )? {
                self.exit_shift(Shift::Left);
            } else if self.enter_if(SyntaxKind::InstanceofExpr, &[Token::Instanceof])? {
                self.consume(Token::Ident)?;
                self.exit_shift(Shift::Left);
            } else {
                break;
            }
        }
        Ok(())
    }

    fn fn_arrow_expr(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::FnArrowExpr)?;
        let mut result = self.consume_if(Token::Ident);
        result = result
            || (self.consume_if(Token::LParen)
                && self.fn_decl_args()?
                && self.consume_if(Token::RParen));
        result = result && self.consume_if(Token::EqGt);
        result = result && (self.block(false)? || self.expr(-1, false)?);
        self.exit_if(result, false)
    }

    fn fn_expr(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::FnExpr, &[Token::Function])? {
            return Ok(false);
        }
        self.consume_if(Token::Ident);
        self.consume(Token::LParen)?;
        self.fn_decl_args()?;
        self.consume(Token::RParen)?;
        self.block(true)?;
        Ok(self.exit())
    }

    fn fn_decl_args(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::FnDeclArgs)?;
        loop {
            if self.peek_if(Token::RParen) {
                break;
            }
            if !self.fn_decl_arg()? {
                break;
            }
        }
        Ok(self.exit())
    }

    fn fn_decl_arg(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::FnDeclArg)?;
        if self.consume_if(Token::DotDotDot) {
            self.consume(Token::Ident)?;
            if !self.peek_if(Token::RParen) {
                return Err(self.expected_tokens(&[Token::RParen]));
            }
            return Ok(self.exit());
        }
        let mut result = self.consume_if(Token::Ident);
        result = result && (self.consume_if(Token::Comma) || self.peek_if(Token::RParen));
        self.exit_if(result, false)
    }

    fn fn_call_args(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::FnCallArgs)?;
        loop {
            if self.peek_if(Token::RParen) {
                break;
            }
            if !self.fn_call_arg()? {
                break;
            }
        }
        Ok(self.exit())
    }

    fn fn_call_arg(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::FnCallArg)?;
        self.consume_if(Token::DotDotDot);
        let mut result = self.expr(-1, false)?;
        result = result && (self.consume_if(Token::Comma) || self.peek_if(Token::RParen));
        self.exit_if(result, false)
    }

    fn new_expr(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::NewExpr, &[Token::New])? {
            return Ok(false);
        }
        self.expr(8, true)?;
        Ok(self.exit())
    }

    fn typeof_expr(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::TypeofExpr, &[Token::Typeof])? {
            return Ok(false);
        }
        self.expr(8, true)?;
        Ok(self.exit())
    }

    fn ref_expr(&mut self) -> Result<bool> {
        // `this` resolves through the context chain like any other name
        if !self.enter_if(SyntaxKind::RefExpr, &[Token::Ident, Token::This])? {
            return Ok(false);
        }
        Ok(self.exit())
    }

    fn lit_expr(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::LitExpr)?;
        let mut result = self.lit_object()? || self.lit_array()?;
        result = result
            || self.any_of(&[
                Token::SStr,
                Token::DStr,
                Token::Number,
                Token::True,
                Token::False,
                Token::Null,
            ]);
        result = result || self.lit_template()? || self.regex_literal()?;
        self.exit_if(result, false)
    }

    fn lit_template(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::LitTemplate, &[Token::Backtick])? {
            return Ok(false);
        }
        loop {
            if self.peek() == Token::Eof {
                // unbalanced backticks
                return Err(self.expected_tokens(&[Token::Backtick]));
            }
            if self.consume_if(Token::Backtick) {
                break;
            }
            if !self.consume_if(Token::TStr) && self.consume_if(Token::DollarLCurly) {
                self.expr(-1, false)?;
                self.consume(Token::RCurly)?;
            }
        }
        Ok(self.exit())
    }

    fn unary_expr(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::UnaryExpr, &[Token::Not, Token::Tilde])? {
            return Ok(false);
        }
        self.expr(-1, true)?;
        Ok(self.exit())
    }

    fn math_pre_expr(&mut self) -> Result<bool> {
        if !self.enter_if(
            SyntaxKind::MathPreExpr,
            &[
                Token::PlusPlus,
                Token::MinusMinus,
                Token::Minus,
                Token::Plus,
            ],
        )? {
            return Ok(false);
        }
        if self.expr(8, false)? || self.consume_if(Token::Number) {
            // all good
        } else {
            return Err(self.expected_kinds(&[SyntaxKind::Expr]));
        }
        Ok(self.exit())
    }

    fn lit_object(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::LitObject, &[Token::LCurly])? {
            return Ok(false);
        }
        loop {
            if self.peek_if(Token::RCurly) {
                break;
            }
            if !self.object_elem()? {
                break;
            }
        }
        let result = self.consume_if(Token::RCurly);
        self.exit_if(result, false)
    }

    fn object_elem(&mut self) -> Result<bool> {
        if !self.enter_if(
            SyntaxKind::ObjectElem,
            &[
                Token::Ident,
                Token::SStr,
                Token::DStr,
                Token::Number,
                Token::DotDotDot,
            ],
        )? {
            return Ok(false);
        }
        if self.consume_if(Token::Comma) || self.peek_if(Token::RCurly) {
            // shorthand property
            return Ok(self.exit());
        }
        let mut spread = false;
        if !self.consume_if(Token::Colon) {
            if self.peek_prev() == Token::DotDotDot {
                if self.consume_if(Token::Ident) {
                    spread = true;
                } else {
                    return Err(self.expected_tokens(&[Token::Ident]));
                }
            } else {
                // could be a block
                return self.exit_if(false, false);
            }
        }
        if !spread {
            self.expr(-1, true)?;
        }
        if self.consume_if(Token::Comma) || self.peek_if(Token::RCurly) {
            // all good
        } else {
            return Err(self.expected_tokens(&[Token::Comma, Token::RCurly]));
        }
        Ok(self.exit())
    }

    fn lit_array(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::LitArray, &[Token::LBracket])? {
            return Ok(false);
        }
        loop {
            if self.peek_if(Token::RBracket) {
                break;
            }
            if !self.array_elem()? {
                break;
            }
        }
        self.consume(Token::RBracket)?;
        Ok(self.exit())
    }

    fn array_elem(&mut self) -> Result<bool> {
        self.enter(SyntaxKind::ArrayElem)?;
        self.consume_if(Token::DotDotDot); // spread
        self.expr(-1, false)?; // optional for sparse arrays
        if self.consume_if(Token::Comma) || self.peek_if(Token::RBracket) {
            // all good
        } else {
            return Err(self.expected_tokens(&[Token::Comma, Token::RBracket]));
        }
        Ok(self.exit())
    }

    fn regex_literal(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::RegexLiteral, &[Token::Regex])? {
            return Ok(false);
        }
        Ok(self.exit())
    }

    fn paren_expr(&mut self) -> Result<bool> {
        if !self.enter_if(SyntaxKind::ParenExpr, &[Token::LParen])? {
            return Ok(false);
        }
        self.expr(-1, true)?;
        self.consume(Token::RParen)?;
        Ok(self.exit())
    }
}

fn attach(parent: &mut Node, node: Node, shift: Shift) {
    match shift {
        Shift::None => parent.children.push(Rc::new(node)),
        Shift::Left => {
            let mut node = node;
            if !parent.children.is_empty() {
                let prev = parent.children.remove(0);
                node.children.insert(0, prev);
            }
            parent.children.push(Rc::new(node));
        }
        Shift::Right => {
            if parent.children.is_empty() {
                parent.children.push(Rc::new(node));
                return;
            }
            let prev = parent.children.remove(0);
            if prev.kind == node.kind && prev.children.len() >= 3 && node.children.len() >= 2 {
                // rebalance a chain like 1 ** 2 ** 3 to associate right
                let mut top = Node::new(node.kind);
                let mut rhs = Node::new(node.kind);
                top.children.push(prev.children[0].clone());
                top.children.push(prev.children[1].clone());
                rhs.children.push(prev.children[2].clone());
                rhs.children.push(node.children[0].clone());
                rhs.children.push(node.children[1].clone());
                top.children.push(Rc::new(rhs));
                parent.children.push(Rc::new(top));
            } else {
                let mut node = node;
                node.children.insert(0, prev);
                parent.children.push(Rc::new(node));
            }
        }
    }
}
