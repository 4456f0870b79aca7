//! Parse tree shape tests

use std::rc::Rc;

use serde_json::{json, Value};

use crate::ast::{Node, SyntaxKind};
use crate::lexer::Token;
use crate::parser::Parser;

/// Compact tree rendering: inner nodes with a single child collapse,
/// leaves render as their literal value, identifiers get a `$` prefix.
fn ser(node: &Node) -> Value {
    if let Some(chunk) = &node.chunk {
        return match chunk.token {
            Token::Ident => json!(format!("${}", chunk.text)),
            Token::SStr | Token::DStr => json!(chunk.text[1..chunk.text.len() - 1]),
            Token::Number => num_json(&chunk.text),
            Token::Null => Value::Null,
            Token::True => json!(true),
            Token::False => json!(false),
            _ => json!(chunk.text),
        };
    }
    match node.kind {
        SyntaxKind::ParenExpr => ser(&node.children[1]),
        SyntaxKind::ObjectElem if node.children.len() >= 3 => {
            let key = match ser(&node.children[0]) {
                Value::String(s) => s,
                other => other.to_string(),
            };
            json!([format!("{key}:"), ser(&node.children[2])])
        }
        SyntaxKind::ObjectElem | SyntaxKind::ArrayElem => ser(&node.children[0]),
        SyntaxKind::Program => {
            if node.children.len() == 1 {
                json!({ "PROGRAM": ser(&node.children[0]) })
            } else {
                let list: Vec<Value> = node.children.iter().map(|c| ser(c)).collect();
                json!({ "PROGRAM": list })
            }
        }
        _ => {
            if node.children.len() == 1 {
                ser(&node.children[0])
            } else {
                Value::Array(node.children.iter().map(|c| ser(c)).collect())
            }
        }
    }
}

fn num_json(text: &str) -> Value {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return json!(n);
        }
    }
    if let Ok(n) = text.parse::<i64>() {
        return json!(n);
    }
    match text.parse::<f64>() {
        Ok(f) => json!(f),
        Err(_) => json!(text),
    }
}

fn parse(text: &str) -> Rc<Node> {
    Parser::new(text).unwrap().parse().unwrap()
}

fn expr(text: &str, expected: Value) {
    let root = parse(text);
    let stmt = root.find_first(SyntaxKind::Statement).unwrap();
    assert_eq!(ser(&stmt.children[0]), expected, "text: {text}");
}

fn program(text: &str, expected: Value) {
    let root = parse(text);
    assert_eq!(ser(&root), expected, "text: {text}");
}

fn error(text: &str) {
    let result = Parser::new(text).and_then(|mut p| p.parse());
    assert!(result.is_err(), "expected parse error: {text}");
}

// ============================================
// statements
// ============================================

#[test]
fn test_block() {
    expr("{ a }", json!(["{", "$a", "}"]));
    expr("{ 1; 2 }", json!(["{", [1, ";"], 2, "}"]));
}

#[test]
fn test_program() {
    program("1;2", json!({"PROGRAM": [[1, ";"], 2]}));
    program("1\n2", json!({"PROGRAM": [1, 2]}));
    program("1 \n 2", json!({"PROGRAM": [1, 2]}));
    program("1 \n 2 ", json!({"PROGRAM": [1, 2]}));
    program("1;2;", json!({"PROGRAM": [[1, ";"], [2, ";"]]}));
    program("1 ;2", json!({"PROGRAM": [[1, ";"], 2]}));
    program("1;2 ", json!({"PROGRAM": [[1, ";"], 2]}));
    program("1;2; ", json!({"PROGRAM": [[1, ";"], [2, ";"]]}));
}

#[test]
fn test_var_statement() {
    expr("var foo", json!(["var", "$foo"]));
    expr("var foo, bar", json!(["var", ["$foo", ",", "$bar"]]));
    expr("var foo = 1", json!(["var", "$foo", "=", 1]));
    expr("var foo, bar = 1", json!(["var", ["$foo", ",", "$bar"], "=", 1]));
    expr(
        "var a, b = 1 + 2",
        json!(["var", ["$a", ",", "$b"], "=", [1, "+", 2]]),
    );
}

#[test]
fn test_if_statement() {
    expr(
        "if (true) a = 1",
        json!(["if", "(", true, ")", ["$a", "=", 1]]),
    );
    expr(
        "if (true) a = 1; else a = 2",
        json!(["if", "(", true, ")", [["$a", "=", 1], ";"], "else", ["$a", "=", 2]]),
    );
}

#[test]
fn test_for_statement() {
    expr("for(;;){}", json!(["for", "(", ";", ";", ")", ["{", "}"]]));
}

#[test]
fn test_try_statement() {
    expr(
        "try {} catch (e) {}",
        json!(["try", ["{", "}"], "catch", "(", "$e", ")", ["{", "}"]]),
    );
    expr(
        "try {} finally {}",
        json!(["try", ["{", "}"], "finally", ["{", "}"]]),
    );
    expr(
        "try {} catch (e) {} finally {}",
        json!(["try", ["{", "}"], "catch", "(", "$e", ")", ["{", "}"], "finally", ["{", "}"]]),
    );
    expr("try {} catch {}", json!(["try", ["{", "}"], "catch", ["{", "}"]]));
}

#[test]
fn test_switch_statement() {
    expr(
        "switch (a) { case 1: b\n default: c }",
        json!([
            "switch", "(", "$a", ")", "{",
            ["case", 1, ":", "$b"],
            ["default", ":", "$c"],
            "}"
        ]),
    );
}

#[test]
fn test_do_while_statement() {
    expr(
        "do { a++ } while (b)",
        json!(["do", ["{", ["$a", "++"], "}"], "while", "(", "$b", ")"]),
    );
}

// ============================================
// expressions
// ============================================

#[test]
fn test_primitives() {
    expr("1", json!(1));
    expr("null", json!(null));
}

#[test]
fn test_add_expr() {
    expr("1 + 2", json!([1, "+", 2]));
    expr("2 - 1", json!([2, "-", 1]));
    expr("1 + 2 + 3", json!([[1, "+", 2], "+", 3]));
    expr("1 - 2 + 3", json!([[1, "-", 2], "+", 3]));
}

#[test]
fn test_mul_expr() {
    expr("2 * 3", json!([2, "*", 3]));
    expr("6 / 2", json!([6, "/", 2]));
}

#[test]
fn test_add_mul_precedence() {
    expr("1 * 2 + 3", json!([[1, "*", 2], "+", 3]));
    expr("1 + 2 * 3", json!([1, "+", [2, "*", 3]]));
}

#[test]
fn test_exp_expr() {
    expr("2 ** 3", json!([2, "**", 3]));
    expr("1 ** 2 ** 3", json!([1, "**", [2, "**", 3]]));
    expr("(2 ** 3) ** 2", json!([[2, "**", 3], "**", 2]));
}

#[test]
fn test_post_expr() {
    expr("a++", json!(["$a", "++"]));
    expr("b--", json!(["$b", "--"]));
    expr("a = b++", json!(["$a", "=", ["$b", "++"]]));
}

#[test]
fn test_pre_expr() {
    expr("++a", json!(["++", "$a"]));
    expr("--b", json!(["--", "$b"]));
    expr("a = --b", json!(["$a", "=", ["--", "$b"]]));
}

#[test]
fn test_bitwise() {
    expr("1 | 2", json!([1, "|", 2]));
    expr("5 | 1 | 2", json!([[5, "|", 1], "|", 2]));
}

#[test]
fn test_paren() {
    expr("(1)", json!(1));
    expr("(1 + 3) * 2", json!([[1, "+", 3], "*", 2]));
    expr("2 * (1 + 3)", json!([2, "*", [1, "+", 3]]));
}

#[test]
fn test_strings() {
    expr("'foo'", json!("foo"));
    expr("\"foo\"", json!("foo"));
    // escapes stay raw in the tree
    expr("\"\\\"foo\\\"\"", json!("\\\"foo\\\""));
    expr("'\\'foo\\''", json!("\\'foo\\'"));
    expr("read('foobar')", json!(["$read", "(", "foobar", ")"]));
}

#[test]
fn test_regex() {
    expr("/foo/", json!("/foo/"));
    expr("(/a\\/b/)", json!("/a\\/b/"));
    expr("/foo/i", json!("/foo/i"));
    expr("var re1 = /test/", json!(["var", "$re1", "=", "/test/"]));
}

#[test]
fn test_path_expr() {
    expr("a", json!("$a"));
    expr("a.b", json!(["$a", ".", "$b"]));
    expr("a.b.c", json!([["$a", ".", "$b"], ".", "$c"]));
    expr("a.b.c.d", json!([[["$a", ".", "$b"], ".", "$c"], ".", "$d"]));
    expr("a.b[c]", json!([["$a", ".", "$b"], "[", "$c", "]"]));
    expr(
        "a.b[c].d",
        json!([[["$a", ".", "$b"], "[", "$c", "]"], ".", "$d"]),
    );
    expr(
        "a[b].c[d]",
        json!([[["$a", "[", "$b", "]"], ".", "$c"], "[", "$d", "]"]),
    );
    expr("a[b].c", json!([["$a", "[", "$b", "]"], ".", "$c"]));
    expr("a['b']", json!(["$a", "[", "b", "]"]));
    expr("a[b]", json!(["$a", "[", "$b", "]"]));
    expr("a['b']['c']", json!([["$a", "[", "b", "]"], "[", "c", "]"]));
    expr("a[b][c]", json!([["$a", "[", "$b", "]"], "[", "$c", "]"]));
}

#[test]
fn test_path_reserved_words() {
    expr("a.null", json!(["$a", ".", null]));
}

#[test]
fn test_path_mix() {
    expr("(a)", json!("$a"));
    expr("(a).b", json!(["$a", ".", "$b"]));
    expr("a[(b)]", json!(["$a", "[", "$b", "]"]));
    expr("a[b + 'c']", json!(["$a", "[", ["$b", "+", "c"], "]"]));
}

#[test]
fn test_object() {
    expr("{}", json!(["{", "}"]));
    expr("{ a: 1 }", json!(["{", ["$a:", 1], "}"]));
    expr("{ a: 'b' }", json!(["{", ["$a:", "b"], "}"]));
}

#[test]
fn test_array() {
    expr("[]", json!(["[", "]"]));
    expr("[1]", json!(["[", 1, "]"]));
    expr("[1,]", json!(["[", 1, "]"]));
    expr("[a]", json!(["[", "$a", "]"]));
    expr("['a']", json!(["[", "a", "]"]));
    expr("[1,2]", json!(["[", 1, 2, "]"]));
    expr("[1,2,3]", json!(["[", 1, 2, 3, "]"]));
}

#[test]
fn test_fn_expr() {
    expr("function(){}", json!(["function", "(", [], ")", ["{", "}"]]));
    expr(
        "function(){ return true }",
        json!(["function", "(", [], ")", ["{", ["return", true], "}"]]),
    );
    expr(
        "function(a){ return a }",
        json!(["function", "(", "$a", ")", ["{", ["return", "$a"], "}"]]),
    );
    expr(
        "function(a){ return { a } }",
        json!(["function", "(", "$a", ")", ["{", ["return", ["{", "$a", "}"]], "}"]]),
    );
    expr(
        "function(a){ return { a, b } }",
        json!(["function", "(", "$a", ")", ["{", ["return", ["{", "$a", "$b", "}"]], "}"]]),
    );
}

#[test]
fn test_fn_call() {
    expr("a.b()", json!([["$a", ".", "$b"], "(", [], ")"]));
    expr("foo()", json!(["$foo", "(", [], ")"]));
    expr("foo.bar()", json!([["$foo", ".", "$bar"], "(", [], ")"]));
}

#[test]
fn test_fn_arrow_expr() {
    expr("() => true", json!(["(", [], ")", "=>", true]));
    expr("() => {}", json!(["(", [], ")", "=>", ["{", "}"]]));
    expr("a => true", json!(["$a", "=>", true]));
    expr("(a) => true", json!(["(", "$a", ")", "=>", true]));
    expr("(a, b) => true", json!(["(", [["$a", ","], "$b"], ")", "=>", true]));
    expr(
        "a => { return true }",
        json!(["$a", "=>", ["{", ["return", true], "}"]]),
    );
}

#[test]
fn test_assign() {
    expr("a = 1", json!(["$a", "=", 1]));
    expr("a.b = 1", json!([["$a", ".", "$b"], "=", 1]));
    expr("a.b.c = 1", json!([[["$a", ".", "$b"], ".", "$c"], "=", 1]));
    expr("a = 1 + 2", json!(["$a", "=", [1, "+", 2]]));
    expr("a = 2 * 3", json!(["$a", "=", [2, "*", 3]]));
    expr(
        "a = function(){ return true }",
        json!(["$a", "=", ["function", "(", [], ")", ["{", ["return", true], "}"]]]),
    );
}

#[test]
fn test_comma_expression() {
    expr("a, b, c", json!(["$a", ",", "$b", ",", "$c"]));
}

#[test]
fn test_assign_bit_shift() {
    expr("n >>>= 0", json!(["$n", ">>>=", 0]));
    expr("n >>= 0", json!(["$n", ">>=", 0]));
}

#[test]
fn test_ternary() {
    expr("true ? 'foo' : bar", json!([true, "?", "foo", ":", "$bar"]));
}

#[test]
fn test_logical_expr() {
    expr("a < b", json!(["$a", "<", "$b"]));
    expr("x = a >= b", json!(["$x", "=", ["$a", ">=", "$b"]]));
}

#[test]
fn test_typeof() {
    expr(
        "typeof 'foo' === 'string'",
        json!([["typeof", "foo"], "===", "string"]),
    );
}

#[test]
fn test_instanceof() {
    expr("foo instanceof Foo", json!(["$foo", "instanceof", "$Foo"]));
}

#[test]
fn test_template() {
    expr("``", json!(["`", "`"]));
    expr("`foo`", json!(["`", "foo", "`"]));
    expr("`${}`", json!(["`", "${", "}", "`"]));
    expr("`${foo}`", json!(["`", "${", "$foo", "}", "`"]));
    expr("`${1 + 2}`", json!(["`", "${", [1, "+", 2], "}", "`"]));
    expr("`[${}]`", json!(["`", "[", "${", "}", "]", "`"]));
}

// ============================================
// errors
// ============================================

#[test]
fn test_syntax_error() {
    error("function");
}

#[test]
fn test_backtick_edge_cases() {
    error("`");
}

#[test]
fn test_unclosed_tag_edge_cases() {
    error("<x>x</");
    error("<foo>foo</foo>\n");
}

#[test]
fn test_too_much_recursion() {
    let text = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    error(&text);
}
