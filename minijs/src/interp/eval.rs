//! Tree-walking evaluation. One function per syntax kind, control
//! flow carried as signals on the context rather than unwinding the
//! Rust stack.

use std::rc::Rc;

use crate::ast::{Node, SyntaxKind};
use crate::error::{Error, Result};
use crate::interp::{
    builtins, coerce, Callable, Context, JsFunction, JsObject, PropertyRef, Value,
};
use crate::lexer::Token;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

pub fn eval(node: &Node, ctx: &Context) -> Result<Value> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || eval_inner(node, ctx))
}

fn eval_inner(node: &Node, ctx: &Context) -> Result<Value> {
    match node.kind {
        SyntaxKind::Leaf => eval_leaf(node, ctx),
        SyntaxKind::Program => eval_program(node, ctx),
        SyntaxKind::Statement => eval_statement(node, ctx),
        SyntaxKind::Block => eval_block(node, ctx),
        SyntaxKind::Eos => Ok(Value::Undefined),
        SyntaxKind::IfStmt => eval_if_stmt(node, ctx),
        SyntaxKind::VarStmt => eval_var_stmt(node, ctx),
        SyntaxKind::ReturnStmt => eval_return_stmt(node, ctx),
        SyntaxKind::ThrowStmt => eval_throw_stmt(node, ctx),
        SyntaxKind::TryStmt => eval_try_stmt(node, ctx),
        SyntaxKind::ForStmt => eval_for_stmt(node, ctx),
        SyntaxKind::WhileStmt => eval_while_stmt(node, ctx),
        SyntaxKind::DoWhileStmt => eval_do_while_stmt(node, ctx),
        SyntaxKind::SwitchStmt => eval_switch_stmt(node, ctx),
        SyntaxKind::BreakStmt => {
            ctx.stop_and_return(Value::Undefined);
            Ok(Value::Undefined)
        }
        SyntaxKind::DeleteStmt => {
            PropertyRef::new(&node.children[1], ctx)?.delete();
            Ok(Value::Bool(true))
        }
        SyntaxKind::ExprList => eval_expr_list(node, ctx),
        SyntaxKind::Expr | SyntaxKind::LitExpr => eval(&node.children[0], ctx),
        SyntaxKind::ParenExpr => eval(&node.children[1], ctx),
        SyntaxKind::FnExpr => eval_fn_expr(node, ctx),
        SyntaxKind::FnArrowExpr => eval_fn_arrow_expr(node, ctx),
        SyntaxKind::FnCallExpr => eval_fn_call(node, ctx),
        SyntaxKind::NewExpr => eval_new_expr(node, ctx),
        SyntaxKind::TypeofExpr => {
            let value = eval(&node.children[1], ctx)?;
            Ok(Value::str(coerce::type_of(&value)))
        }
        SyntaxKind::InstanceofExpr => eval_instanceof_expr(node, ctx),
        SyntaxKind::AssignExpr => eval_assign_expr(node, ctx),
        SyntaxKind::LogicExpr => eval_logic_expr(node, ctx),
        SyntaxKind::LogicAndExpr => eval_logic_and_expr(node, ctx),
        SyntaxKind::LogicTernExpr => eval_logic_tern_expr(node, ctx),
        SyntaxKind::LogicBitExpr => eval_logic_bit_expr(node, ctx),
        SyntaxKind::MathAddExpr | SyntaxKind::MathMulExpr | SyntaxKind::MathExpExpr => {
            eval_math_expr(node, ctx)
        }
        SyntaxKind::MathPostExpr => eval_math_post_expr(node, ctx),
        SyntaxKind::MathPreExpr => eval_math_pre_expr(node, ctx),
        SyntaxKind::RefExpr => Ok(ctx.get(node.children[0].chunk_text())),
        SyntaxKind::RefDotExpr | SyntaxKind::RefBracketExpr => {
            PropertyRef::new(node, ctx)?.get()
        }
        SyntaxKind::UnaryExpr => eval_unary_expr(node, ctx),
        SyntaxKind::LitObject => eval_lit_object(node, ctx),
        SyntaxKind::LitArray => eval_lit_array(node, ctx),
        SyntaxKind::LitTemplate => eval_lit_template(node, ctx),
        SyntaxKind::RegexLiteral => builtins::regex::from_literal(node.children[0].chunk_text()),
        _ => Err(Error::eval(format!("eval - unexpected node: {}", node.kind))),
    }
}

fn eval_leaf(node: &Node, ctx: &Context) -> Result<Value> {
    let text = node.chunk_text();
    match node.token() {
        Some(Token::Ident) => Ok(ctx.get(text)),
        Some(Token::This) => Ok(ctx.get("this")),
        Some(Token::SStr | Token::DStr) => Ok(Value::from(coerce::unquote(text))),
        Some(Token::Number) => Ok(Value::Num(coerce::str_to_number(text))),
        Some(Token::Null) => Ok(Value::Null),
        Some(Token::True) => Ok(Value::Bool(true)),
        Some(Token::False) => Ok(Value::Bool(false)),
        Some(Token::Regex) => builtins::regex::from_literal(text),
        Some(Token::Semi) => Ok(Value::Undefined),
        _ => Err(Error::eval(format!("eval - unexpected token: {text}"))),
    }
}

//======================================================================
// program and statements

fn eval_program(node: &Node, ctx: &Context) -> Result<Value> {
    let mut result = Value::Undefined;
    for child in &node.children {
        match eval(child, ctx) {
            Ok(value) => result = value,
            Err(e) => {
                ctx.bump_errors();
                ctx.clear_error();
                return Err(frame_failure(child, e.message()));
            }
        }
        if ctx.is_error() {
            ctx.bump_errors();
            let thrown = ctx.error_thrown().unwrap_or(Value::Undefined);
            // reset signals so the same context stays usable
            ctx.clear_error();
            return Err(frame_failure(child, &error_message(&thrown)));
        }
        // a stray break must not bleed into the next statement
        ctx.clear_stopped();
    }
    Ok(result)
}

/// Failure report for one top-level statement: the statement text and
/// the position of its first token.
fn frame_failure(stmt: &Node, message: &str) -> Error {
    let pos = stmt
        .first_chunk()
        .map(|c| c.position_display())
        .unwrap_or_default();
    Error::eval(format!(
        "js failed:\n==========\n{stmt}\n----------\n{pos} {message}"
    ))
}

/// Message extraction for uncaught values: error objects report their
/// `message` member, everything else its display form.
fn error_message(thrown: &Value) -> String {
    if let Value::Object(o) = thrown {
        if let Some(Value::Str(message)) = o.get_own("message") {
            return message.to_string();
        }
    }
    coerce::to_display(thrown)
}

fn eval_statement(node: &Node, ctx: &Context) -> Result<Value> {
    ctx.bump_statements();
    eval(&node.children[0], ctx)
}

fn eval_block(node: &Node, ctx: &Context) -> Result<Value> {
    let mut result = Value::Undefined;
    for child in node.children_of(SyntaxKind::Statement) {
        result = eval(child, ctx)?;
        if ctx.is_stopped() {
            break;
        }
    }
    Ok(result)
}

fn eval_if_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let cond = eval(&node.children[2], ctx)?;
    if coerce::is_truthy(&cond) {
        eval(&node.children[4], ctx)
    } else if node.children.len() > 6 {
        eval(&node.children[6], ctx)
    } else {
        Ok(Value::Undefined)
    }
}

fn eval_var_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let value = if node.children.len() > 3 {
        eval(&node.children[3], ctx)?
    } else {
        Value::Undefined
    };
    let names = &node.children[1];
    for ident in names.children.iter().filter(|c| c.token() == Some(Token::Ident)) {
        ctx.declare(ident.chunk_text(), value.clone());
    }
    Ok(value)
}

fn eval_return_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let value = if node.children.len() > 1 {
        eval(&node.children[1], ctx)?
    } else {
        Value::Undefined
    };
    ctx.stop_and_return(value.clone());
    Ok(value)
}

fn eval_throw_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let value = eval(&node.children[1], ctx)?;
    ctx.stop_and_throw(value);
    Ok(Value::Undefined)
}

fn eval_try_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    // internal failures become catchable error objects here
    let mut result = match eval(&node.children[1], ctx) {
        Ok(value) => value,
        Err(e) => {
            ctx.stop_and_throw(builtins::error::from_message(e.message()));
            Value::Undefined
        }
    };
    let mut finally_block: Option<&Rc<Node>> = None;
    match node.children[2].token() {
        Some(Token::Catch) => {
            let with_binding = node.children[3].token() == Some(Token::LParen);
            if with_binding && node.children.len() > 8 {
                finally_block = Some(&node.children[8]);
            } else if !with_binding && node.children.len() > 5 {
                finally_block = Some(&node.children[5]);
            }
            if ctx.is_error() {
                let thrown = ctx.error_thrown().unwrap_or(Value::Undefined);
                ctx.clear_error();
                let catch_ctx = ctx.child();
                let block = if with_binding {
                    catch_ctx.declare(node.children[4].chunk_text(), thrown);
                    &node.children[6]
                } else {
                    &node.children[3]
                };
                result = match eval(block, &catch_ctx) {
                    Ok(value) => value,
                    Err(e) => {
                        catch_ctx.stop_and_throw(builtins::error::from_message(e.message()));
                        Value::Undefined
                    }
                };
                ctx.update_from(&catch_ctx);
            }
        }
        Some(Token::Finally) => finally_block = Some(&node.children[3]),
        _ => {}
    }
    if let Some(block) = finally_block {
        let finally_ctx = ctx.child();
        match eval(block, &finally_ctx) {
            Ok(_) => {}
            Err(e) => {
                return Err(Error::eval(format!(
                    "finally block threw error: {}",
                    e.message()
                )));
            }
        }
        // a throw out of finally is fatal, it cannot be caught
        if finally_ctx.is_error() {
            let thrown = finally_ctx.error_thrown().unwrap_or(Value::Undefined);
            return Err(Error::eval(format!(
                "finally block threw error: {}",
                error_message(&thrown)
            )));
        }
    }
    Ok(result)
}

fn eval_for_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let children = &node.children;
    let body = children.last().map(Rc::as_ref);
    let Some(body) = body else {
        return Ok(Value::Undefined);
    };
    // loop variables live in their own scope and do not escape
    let loop_ctx = ctx.child();
    let iter_pos = children
        .iter()
        .position(|c| matches!(c.token(), Some(Token::In | Token::Of)));
    if let Some(pos) = iter_pos {
        let by_value = children[pos].token() == Some(Token::Of);
        let name = children[pos - 1]
            .find_first_token(Token::Ident)
            .map(|n| n.chunk_text().to_string())
            .ok_or_else(|| Error::eval("for-in needs a variable"))?;
        let iterable = eval(&children[pos + 1], &loop_ctx)?;
        for (key, value) in builtins::key_values(&iterable) {
            loop_ctx.declare(&name, if by_value { value } else { key });
            eval(body, &loop_ctx)?;
            if loop_ctx.is_stopped() {
                ctx.update_from(&loop_ctx);
                break;
            }
        }
        return Ok(Value::Undefined);
    }
    // classic three-part form, each part optional
    let mut i = 2;
    let mut init = None;
    if matches!(children[i].kind, SyntaxKind::VarStmt | SyntaxKind::Expr) {
        init = Some(&children[i]);
        i += 1;
    }
    i += 1; // first semicolon
    let mut cond = None;
    if children[i].kind == SyntaxKind::Expr {
        cond = Some(&children[i]);
        i += 1;
    }
    i += 1; // second semicolon
    let mut update = None;
    if children[i].kind == SyntaxKind::Expr {
        update = Some(&children[i]);
    }
    if let Some(init) = init {
        eval(init, &loop_ctx)?;
    }
    loop {
        if let Some(cond) = cond {
            if !coerce::is_truthy(&eval(cond, &loop_ctx)?) {
                break;
            }
        }
        eval(body, &loop_ctx)?;
        if loop_ctx.is_stopped() {
            ctx.update_from(&loop_ctx);
            break;
        }
        if let Some(update) = update {
            eval(update, &loop_ctx)?;
        }
    }
    Ok(Value::Undefined)
}

fn eval_while_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let loop_ctx = ctx.child();
    loop {
        let cond = eval(&node.children[2], &loop_ctx)?;
        if !coerce::is_truthy(&cond) {
            break;
        }
        eval(&node.children[4], &loop_ctx)?;
        if loop_ctx.is_stopped() {
            ctx.update_from(&loop_ctx);
            break;
        }
    }
    Ok(Value::Undefined)
}

fn eval_do_while_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let loop_ctx = ctx.child();
    loop {
        eval(&node.children[1], &loop_ctx)?;
        if loop_ctx.is_stopped() {
            ctx.update_from(&loop_ctx);
            break;
        }
        let cond = eval(&node.children[4], &loop_ctx)?;
        if !coerce::is_truthy(&cond) {
            break;
        }
    }
    Ok(Value::Undefined)
}

/// First strictly matching case starts execution, which then falls
/// through following blocks until a break.
fn eval_switch_stmt(node: &Node, ctx: &Context) -> Result<Value> {
    let value = eval(&node.children[2], ctx)?;
    let blocks: Vec<&Rc<Node>> = node
        .children
        .iter()
        .filter(|c| matches!(c.kind, SyntaxKind::CaseBlock | SyntaxKind::DefaultBlock))
        .collect();
    let mut start = None;
    for (i, block) in blocks.iter().enumerate() {
        if block.kind != SyntaxKind::CaseBlock {
            continue;
        }
        let case_value = eval(&block.children[1], ctx)?;
        if coerce::eq(&value, &case_value, true) {
            start = Some(i);
            break;
        }
    }
    let start = start.or_else(|| blocks.iter().position(|b| b.kind == SyntaxKind::DefaultBlock));
    let Some(start) = start else {
        return Ok(Value::Undefined);
    };
    let mut result = Value::Undefined;
    'blocks: for block in &blocks[start..] {
        for stmt in block.children_of(SyntaxKind::Statement) {
            result = eval(stmt, ctx)?;
            if ctx.is_stopped() {
                break 'blocks;
            }
        }
    }
    Ok(result)
}

fn eval_expr_list(node: &Node, ctx: &Context) -> Result<Value> {
    let mut result = Value::Undefined;
    for child in node.children_of(SyntaxKind::Expr) {
        result = eval(child, ctx)?;
    }
    Ok(result)
}

//======================================================================
// operators

fn eval_assign_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let prop = PropertyRef::new(&node.children[0], ctx)?;
    let mut value = eval(&node.children[2], ctx)?;
    match node.children[1].token() {
        Some(Token::Eq) => {}
        Some(Token::PlusEq) => value = coerce::add(&prop.get()?, &value),
        Some(Token::MinusEq) => value = coerce::sub(&prop.get()?, &value),
        Some(Token::StarEq) => value = coerce::mul(&prop.get()?, &value),
        Some(Token::SlashEq) => value = coerce::div(&prop.get()?, &value),
        Some(Token::PercentEq) => value = coerce::rem(&prop.get()?, &value),
        Some(Token::StarStarEq) => value = coerce::exp(&prop.get()?, &value),
        Some(Token::GtGtEq) => value = coerce::shr(&prop.get()?, &value),
        Some(Token::LtLtEq) => value = coerce::shl(&prop.get()?, &value),
        Some(Token::GtGtGtEq) => value = coerce::shr_unsigned(&prop.get()?, &value),
        _ => return Err(Error::eval("eval - unexpected assignment operator")),
    }
    prop.set(value.clone())?;
    Ok(value)
}

fn eval_logic_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let lhs = eval(&node.children[0], ctx)?;
    let rhs = eval(&node.children[2], ctx)?;
    let op = node.children[1].token();
    // NaN comparisons short out before coercion
    if lhs.is_nan() || rhs.is_nan() {
        let both = lhs.is_nan() && rhs.is_nan();
        let negated = matches!(op, Some(Token::NotEq | Token::NotEqEq));
        return Ok(Value::Bool(both && negated));
    }
    let result = match op {
        Some(Token::EqEq) => coerce::eq(&lhs, &rhs, false),
        Some(Token::NotEq) => !coerce::eq(&lhs, &rhs, false),
        Some(Token::EqEqEq) => coerce::eq(&lhs, &rhs, true),
        Some(Token::NotEqEq) => !coerce::eq(&lhs, &rhs, true),
        Some(Token::Lt) => coerce::lt(&lhs, &rhs),
        Some(Token::Gt) => coerce::gt(&lhs, &rhs),
        Some(Token::LtEq) => coerce::le(&lhs, &rhs),
        Some(Token::GtEq) => coerce::ge(&lhs, &rhs),
        _ => return Err(Error::eval("eval - unexpected comparison operator")),
    };
    Ok(Value::Bool(result))
}

fn eval_logic_and_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let lhs = eval(&node.children[0], ctx)?;
    let rhs = eval(&node.children[2], ctx)?;
    let take_rhs = match node.children[1].token() {
        Some(Token::AmpAmp) => coerce::is_truthy(&lhs),
        Some(Token::PipePipe) => !coerce::is_truthy(&lhs),
        _ => return Err(Error::eval("eval - unexpected logic operator")),
    };
    Ok(if take_rhs { rhs } else { lhs })
}

fn eval_logic_tern_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let cond = eval(&node.children[0], ctx)?;
    if coerce::is_truthy(&cond) {
        eval(&node.children[2], ctx)
    } else {
        eval(&node.children[4], ctx)
    }
}

fn eval_logic_bit_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let lhs = eval(&node.children[0], ctx)?;
    let rhs = eval(&node.children[2], ctx)?;
    match node.children[1].token() {
        Some(Token::Amp) => Ok(coerce::bit_and(&lhs, &rhs)),
        Some(Token::Pipe) => Ok(coerce::bit_or(&lhs, &rhs)),
        Some(Token::Caret) => Ok(coerce::bit_xor(&lhs, &rhs)),
        Some(Token::GtGt) => Ok(coerce::shr(&lhs, &rhs)),
        Some(Token::LtLt) => Ok(coerce::shl(&lhs, &rhs)),
        Some(Token::GtGtGt) => Ok(coerce::shr_unsigned(&lhs, &rhs)),
        _ => Err(Error::eval("eval - unexpected bitwise operator")),
    }
}

fn eval_math_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let lhs = eval(&node.children[0], ctx)?;
    let rhs = eval(&node.children[2], ctx)?;
    match node.children[1].token() {
        Some(Token::Plus) => Ok(coerce::add(&lhs, &rhs)),
        Some(Token::Minus) => Ok(coerce::sub(&lhs, &rhs)),
        Some(Token::Star) => Ok(coerce::mul(&lhs, &rhs)),
        Some(Token::Slash) => Ok(coerce::div(&lhs, &rhs)),
        Some(Token::Percent) => Ok(coerce::rem(&lhs, &rhs)),
        Some(Token::StarStar) => Ok(coerce::exp(&lhs, &rhs)),
        _ => Err(Error::eval("eval - unexpected math operator")),
    }
}

fn eval_math_post_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let prop = PropertyRef::new(&node.children[0], ctx)?;
    let old = coerce::to_number(&prop.get()?).as_f64();
    let next = match node.children[1].token() {
        Some(Token::PlusPlus) => old + 1.0,
        _ => old - 1.0,
    };
    prop.set(Value::Num(coerce::narrow(next)))?;
    Ok(Value::Num(coerce::narrow(old)))
}

fn eval_math_pre_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let operand = &node.children[1];
    match node.children[0].token() {
        Some(Token::Minus) => {
            let value = eval(operand, ctx)?;
            Ok(Value::Num(coerce::narrow(-coerce::to_number(&value).as_f64())))
        }
        Some(Token::Plus) => {
            let value = eval(operand, ctx)?;
            Ok(Value::Num(coerce::to_number(&value)))
        }
        op => {
            let prop = PropertyRef::new(operand, ctx)?;
            let old = coerce::to_number(&prop.get()?).as_f64();
            let next = if op == Some(Token::PlusPlus) {
                old + 1.0
            } else {
                old - 1.0
            };
            let value = Value::Num(coerce::narrow(next));
            prop.set(value.clone())?;
            Ok(value)
        }
    }
}

fn eval_unary_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let value = eval(&node.children[1], ctx)?;
    match node.children[0].token() {
        Some(Token::Not) => Ok(Value::Bool(!coerce::is_truthy(&value))),
        Some(Token::Tilde) => Ok(coerce::bit_not(&value)),
        _ => Err(Error::eval("eval - unexpected unary operator")),
    }
}

fn eval_instanceof_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let lhs = eval(&node.children[0], ctx)?;
    let rhs = ctx.get(node.children[2].chunk_text());
    Ok(Value::Bool(coerce::instance_of(&lhs, &rhs)))
}

//======================================================================
// functions

fn arg_names(node: &Node) -> Vec<Rc<str>> {
    let mut names = Vec::new();
    for arg in node.children_of(SyntaxKind::FnDeclArg) {
        if arg.children[0].token() == Some(Token::DotDotDot) {
            // rest parameter, marked by the leading dot
            names.push(Rc::from(format!(".{}", arg.children[1].chunk_text())));
        } else {
            names.push(Rc::from(arg.children[0].chunk_text()));
        }
    }
    names
}

fn eval_fn_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let named = node.children[1].token() == Some(Token::Ident);
    let (args_index, body_index) = if named { (3, 5) } else { (2, 4) };
    let f = JsFunction::script(
        false,
        arg_names(&node.children[args_index]),
        node.children[body_index].clone(),
        ctx.clone(),
    );
    if named {
        ctx.declare(node.children[1].chunk_text(), Value::Function(f.clone()));
    }
    Ok(Value::Function(f))
}

fn eval_fn_arrow_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let (params, body) = if node.children[0].token() == Some(Token::Ident) {
        (
            vec![Rc::from(node.children[0].chunk_text())],
            node.children[2].clone(),
        )
    } else {
        (arg_names(&node.children[1]), node.children[4].clone())
    };
    Ok(Value::Function(JsFunction::script(
        true,
        params,
        body,
        ctx.clone(),
    )))
}

fn eval_call_args(node: &Node, ctx: &Context) -> Result<Vec<Value>> {
    let mut args = Vec::new();
    for arg in node.children_of(SyntaxKind::FnCallArg) {
        let spread = arg.children[0].token() == Some(Token::DotDotDot);
        let expr = if spread { &arg.children[1] } else { &arg.children[0] };
        let value = eval(expr, ctx)?;
        if spread {
            match value {
                Value::Array(items) => args.extend(items.borrow().iter().cloned()),
                Value::Str(s) => args.extend(s.chars().map(|c| Value::from(c.to_string()))),
                other => args.push(other),
            }
        } else {
            args.push(value);
        }
    }
    Ok(args)
}

fn eval_fn_call(node: &Node, ctx: &Context) -> Result<Value> {
    // consume the construction slot before anything nested can
    let construct = ctx.take_construct();
    let prop = PropertyRef::new(&node.children[0], ctx)?;
    let (f, this) = prop.get_callable()?;
    let args = eval_call_args(&node.children[2], ctx)?;
    match construct {
        Some(instance) => construct_with(&f, instance, &args, ctx),
        None => invoke(&f, &this, &args, ctx),
    }
}

fn eval_new_expr(node: &Node, ctx: &Context) -> Result<Value> {
    let mut inner = node.children[1].as_ref();
    while inner.kind == SyntaxKind::Expr && !inner.children.is_empty() {
        inner = &inner.children[0];
    }
    if inner.kind == SyntaxKind::FnCallExpr {
        ctx.set_construct(Value::Object(JsObject::new()));
        let result = eval(inner, ctx);
        ctx.take_construct();
        return result;
    }
    // `new Foo` without parentheses
    let callee = eval(inner, ctx)?;
    match callee {
        Value::Function(f) => construct_with(&f, Value::Object(JsObject::new()), &[], ctx),
        _ => Err(Error::eval(format!("not a function: {}", inner.text()))),
    }
}

fn construct_with(
    f: &Rc<JsFunction>,
    instance: Value,
    args: &[Value],
    ctx: &Context,
) -> Result<Value> {
    if let Value::Object(obj) = &instance {
        *obj.proto.borrow_mut() = Some(f.get_prototype());
    }
    let result = invoke(f, &instance, args, ctx)?;
    if ctx.is_error() {
        return Ok(Value::Undefined);
    }
    // `new String(..)` yields the primitive, other primitive returns
    // are discarded in favor of the instance
    if f.is_native(builtins::string::construct) {
        return Ok(result);
    }
    if result.is_primitive() {
        Ok(instance)
    } else {
        Ok(result)
    }
}

fn invoke(f: &Rc<JsFunction>, this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    match &f.callable {
        Callable::Native { f: native, .. } => native(this, args, ctx),
        Callable::Host(host) => host(args),
        Callable::Script(s) => {
            let child = if s.arrow {
                s.decl_ctx.child()
            } else {
                s.decl_ctx.merge(Some(ctx))
            };
            if !s.arrow {
                child.declare("this", this.clone());
                let shadowed = s
                    .params
                    .iter()
                    .any(|p| p.as_ref() == "arguments" || p.as_ref() == ".arguments");
                if !shadowed {
                    child.declare("arguments", Value::array(args.to_vec()));
                }
            }
            for (i, param) in s.params.iter().enumerate() {
                if let Some(rest) = param.strip_prefix('.') {
                    let tail = args.get(i..).unwrap_or_default().to_vec();
                    child.declare(rest, Value::array(tail));
                    break;
                }
                child.declare(param, args.get(i).cloned().unwrap_or(Value::Undefined));
            }
            let result = eval(&s.body, &child)?;
            // only errors cross the call boundary
            if child.is_error() {
                ctx.stop_and_throw(child.error_thrown().unwrap_or(Value::Undefined));
                return Ok(Value::Undefined);
            }
            if s.body.kind == SyntaxKind::Block {
                Ok(child.return_value())
            } else {
                Ok(result)
            }
        }
    }
}

/// Invocation entry point for built-ins running script callbacks and
/// for the engine. Callers must check `ctx.is_error()` afterwards.
pub fn call_function(
    f: &Rc<JsFunction>,
    this: &Value,
    args: &[Value],
    ctx: &Context,
) -> Result<Value> {
    invoke(f, this, args, ctx)
}

/// `Function.prototype.call`
pub(crate) fn call_method(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let Value::Function(f) = this else {
        return Err(Error::eval("call target is not a function"));
    };
    let bound = args.first().cloned().unwrap_or(Value::Undefined);
    let rest = args.get(1..).unwrap_or_default();
    invoke(f, &bound, rest, ctx)
}

/// `Function.prototype.apply`
pub(crate) fn apply_method(this: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
    let Value::Function(f) = this else {
        return Err(Error::eval("apply target is not a function"));
    };
    let bound = args.first().cloned().unwrap_or(Value::Undefined);
    let spread = match args.get(1) {
        Some(Value::Array(items)) => items.borrow().clone(),
        _ => Vec::new(),
    };
    invoke(f, &bound, &spread, ctx)
}

//======================================================================
// literals

fn eval_lit_object(node: &Node, ctx: &Context) -> Result<Value> {
    let obj = JsObject::new();
    for elem in node.children_of(SyntaxKind::ObjectElem) {
        let first = &elem.children[0];
        if first.token() == Some(Token::DotDotDot) {
            if let Value::Object(source) = ctx.get(elem.children[1].chunk_text()) {
                for (key, value) in source.props.borrow().entries() {
                    obj.put(key, value);
                }
            }
            continue;
        }
        let key = match first.token() {
            Some(Token::SStr | Token::DStr) => coerce::unquote(first.chunk_text()),
            _ => first.chunk_text().to_string(),
        };
        let keyed = elem.children.len() >= 3 && elem.children[1].token() == Some(Token::Colon);
        let value = if keyed {
            eval(&elem.children[2], ctx)?
        } else {
            ctx.get(&key)
        };
        obj.put(key, value);
    }
    Ok(Value::Object(obj))
}

fn eval_lit_array(node: &Node, ctx: &Context) -> Result<Value> {
    let mut items = Vec::new();
    for elem in node.children_of(SyntaxKind::ArrayElem) {
        let first = &elem.children[0];
        match first.token() {
            Some(Token::DotDotDot) => {
                let value = eval(&elem.children[1], ctx)?;
                match value {
                    Value::Array(source) => items.extend(source.borrow().iter().cloned()),
                    Value::Str(s) => {
                        items.extend(s.chars().map(|c| Value::from(c.to_string())))
                    }
                    other => items.push(other),
                }
            }
            // elision produces a null slot
            Some(Token::Comma) => items.push(Value::Null),
            _ => items.push(eval(first, ctx)?),
        }
    }
    Ok(Value::array(items))
}

fn eval_lit_template(node: &Node, ctx: &Context) -> Result<Value> {
    let mut out = String::new();
    for child in &node.children {
        if child.token() == Some(Token::TStr) {
            out.push_str(&coerce::unescape(child.chunk_text()));
        } else if child.kind == SyntaxKind::Expr {
            let value = eval(child, ctx)?;
            if value.is_undefined() {
                return Err(Error::eval(format!("{} is not defined", child.text())));
            }
            out.push_str(&coerce::to_display(&value));
        }
    }
    Ok(Value::from(out))
}
