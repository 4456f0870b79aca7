//! End-to-end tests running scripts through the engine.

use std::cell::RefCell;
use std::rc::Rc;

use minijs::{Engine, Num, Value};

fn eval(source: &str) -> Value {
    Engine::new().eval(source).expect(source)
}

fn eval_str(source: &str) -> String {
    minijs::interp::coerce::to_display(&eval(source))
}

fn eval_num(source: &str) -> f64 {
    match eval(source) {
        Value::Num(n) => n.as_f64(),
        other => panic!("expected number from {source}, got {other:?}"),
    }
}

fn eval_bool(source: &str) -> bool {
    match eval(source) {
        Value::Bool(b) => b,
        other => panic!("expected bool from {source}, got {other:?}"),
    }
}

fn eval_err(source: &str) -> String {
    match Engine::new().eval(source) {
        Ok(value) => panic!("expected error from {source}, got {value:?}"),
        Err(e) => e.message().to_string(),
    }
}

//======================================================================
// literals and numbers

#[test]
fn test_literals() {
    assert_eq!(eval_num("42"), 42.0);
    assert_eq!(eval_num("2.5"), 2.5);
    assert_eq!(eval_num("0x10"), 16.0);
    assert_eq!(eval_str("'single'"), "single");
    assert_eq!(eval_str("\"double\""), "double");
    assert!(eval_bool("true"));
    assert!(matches!(eval("null"), Value::Null));
    assert!(eval("undefined").is_undefined());
}

#[test]
fn test_number_narrowing() {
    assert!(matches!(eval("1 + 2"), Value::Num(Num::I32(3))));
    assert!(matches!(eval("5000000000"), Value::Num(Num::I64(_))));
    assert!(matches!(eval("1 / 2"), Value::Num(Num::F64(_))));
    assert!(matches!(eval("2.5 + 2.5"), Value::Num(Num::I32(5))));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval_num("2 + 3 * 4"), 14.0);
    assert_eq!(eval_num("(2 + 3) * 4"), 20.0);
    assert_eq!(eval_num("10 % 3"), 1.0);
    assert_eq!(eval_num("2 ** 10"), 1024.0);
    assert_eq!(eval_num("-5 + 2"), -3.0);
    assert_eq!(eval_str("0.1 + 0.2"), "0.30000000000000004");
}

#[test]
fn test_division_edges() {
    assert!(eval("0 / 0").is_nan());
    assert_eq!(eval_str("1 / 0"), "Infinity");
    assert_eq!(eval_str("-1 / 0"), "-Infinity");
    assert_eq!(eval_str("-0"), "-0");
    assert_eq!(eval_num("6 / 3"), 2.0);
}

#[test]
fn test_bitwise() {
    assert_eq!(eval_num("6 & 3"), 2.0);
    assert_eq!(eval_num("4 | 1"), 5.0);
    assert_eq!(eval_num("5 ^ 1"), 4.0);
    assert_eq!(eval_num("~0"), -1.0);
    assert_eq!(eval_num("1 << 3"), 8.0);
    assert_eq!(eval_num("-8 >> 2"), -2.0);
    assert_eq!(eval_num("-1 >>> 0"), 4294967295.0);
    assert_eq!(eval_num("-1 >>> 32"), 0.0);
}

#[test]
fn test_increments_and_compound_assignment() {
    assert_eq!(eval_num("var i = 0; i++ + ++i"), 2.0);
    assert_eq!(eval_num("var i = 5; i--; --i; i"), 3.0);
    assert_eq!(eval_num("var x = 5; x += 2; x *= 3; x"), 21.0);
    assert_eq!(eval_num("var x = 8; x >>= 2; x"), 2.0);
}

//======================================================================
// equality and coercion

#[test]
fn test_loose_vs_strict_equality() {
    assert!(eval_bool("1 == '1'"));
    assert!(!eval_bool("1 === '1'"));
    assert!(eval_bool("null == undefined"));
    assert!(!eval_bool("null === undefined"));
    assert!(eval_bool("0 == false"));
    assert!(eval_bool("0 == ''"));
    assert!(eval_bool("'a' === 'a'"));
    assert!(!eval_bool("[] == []"));
    assert!(eval_bool("var a = [1]; var b = a; a == b"));
}

#[test]
fn test_nan_comparisons() {
    assert!(!eval_bool("NaN == NaN"));
    assert!(!eval_bool("NaN === NaN"));
    assert!(eval_bool("NaN != NaN"));
    assert!(eval_bool("(0 / 0) !== (0 / 0)"));
    assert!(!eval_bool("NaN < 1"));
    assert!(!eval_bool("1 == NaN"));
}

#[test]
fn test_relational_numeric_coercion() {
    // both sides go through ToNumber, so letter strings are NaN
    assert!(!eval_bool("'a' < 'b'"));
    assert!(!eval_bool("'b' > 'a'"));
    assert!(!eval_bool("'a' <= 'a'"));
    // numeric strings compare by value, not character order
    assert!(eval_bool("'9' < '10'"));
    assert!(!eval_bool("'10' < '9'"));
    assert!(eval_bool("'10' >= '9'"));
    assert!(eval_bool("'2' < 10"));
    assert!(eval_bool("true < 2"));
}

#[test]
fn test_truthiness() {
    assert!(!eval_bool("!!''"));
    assert!(eval_bool("!!'0'"));
    assert!(!eval_bool("!!0"));
    assert!(eval_bool("!![]"));
    assert!(eval_bool("!!{}"));
    assert!(!eval_bool("!!null"));
}

#[test]
fn test_logic_operators_return_operands() {
    assert_eq!(eval_str("0 || 'fallback'"), "fallback");
    assert_eq!(eval_num("'a' && 2"), 2.0);
    assert_eq!(eval_num("7 || 9"), 7.0);
    assert!(eval("null || undefined").is_undefined());
    assert_eq!(eval_str("1 ? 'a' : 'b'"), "a");
    assert_eq!(eval_str("0 ? 'a' : 'b'"), "b");
}

#[test]
fn test_typeof() {
    assert_eq!(eval_str("typeof 1"), "number");
    assert_eq!(eval_str("typeof 'a'"), "string");
    assert_eq!(eval_str("typeof true"), "boolean");
    assert_eq!(eval_str("typeof undefined"), "undefined");
    assert_eq!(eval_str("typeof null"), "object");
    assert_eq!(eval_str("typeof {}"), "object");
    assert_eq!(eval_str("typeof function(){}"), "function");
}

//======================================================================
// strings

#[test]
fn test_string_concat() {
    assert_eq!(eval_str("'a' + 1"), "a1");
    assert_eq!(eval_str("1 + 'a'"), "1a");
    assert_eq!(eval_str("1 + undefined"), "1undefined");
    assert_eq!(eval_str("'x' + null"), "xnull");
    assert_eq!(eval_str("'' + 0.5"), "0.5");
}

#[test]
fn test_string_members() {
    assert_eq!(eval_num("'hello'.length"), 5.0);
    assert_eq!(eval_str("'abc'[1]"), "b");
    assert_eq!(eval_str("'abc'.charAt(2)"), "c");
    assert_eq!(eval_num("'abc'.charCodeAt(0)"), 97.0);
    assert_eq!(eval_num("'hello'.indexOf('ll')"), 2.0);
    assert_eq!(eval_str("'abcdef'.slice(-2)"), "ef");
    assert_eq!(eval_str("'abcdef'.substring(4, 2)"), "cd");
    assert_eq!(eval_str("'ab'.repeat(3)"), "ababab");
    assert_eq!(eval_str("'5'.padStart(3, '0')"), "005");
    assert_eq!(eval_str("'  x  '.trim()"), "x");
    assert_eq!(eval_str("'Hello'.toUpperCase()"), "HELLO");
    assert!(eval_bool("'hello'.startsWith('he')"));
    assert_eq!(eval_str("'a,b,c'.split(',').join('-')"), "a-b-c");
    assert_eq!(eval_num("'abc'.split('').length"), 3.0);
    assert_eq!(eval_str("'aaa'.replace('a', 'b')"), "baa");
    assert_eq!(eval_str("'aaa'.replaceAll('a', 'b')"), "bbb");
    assert_eq!(eval_str("String.fromCharCode(104, 105)"), "hi");
}

#[test]
fn test_templates() {
    assert_eq!(eval_str("`x=${1 + 1}`"), "x=2");
    assert_eq!(eval_str("var name = 'js'; `hi ${name}!`"), "hi js!");
    assert_eq!(eval_str("`a${'b'}${'c'}d`"), "abcd");
    let err = eval_err("`${missing}`");
    assert!(err.contains("missing is not defined"), "{err}");
}

#[test]
fn test_string_escapes() {
    assert_eq!(eval_str("'a\\nb'"), "a\nb");
    assert_eq!(eval_str("'\\u0041'"), "A");
    assert_eq!(eval_str("'it\\'s'"), "it's");
}

//======================================================================
// arrays

#[test]
fn test_array_basics() {
    assert_eq!(eval_num("[1, 2, 3].length"), 3.0);
    assert_eq!(eval_num("[1, 2, 3][1]"), 2.0);
    assert_eq!(eval_num("var a = [1, 2]; a[0] = 9; a[0]"), 9.0);
    assert_eq!(eval_num("var a = [1]; a[3] = 9; a.length"), 4.0);
    assert_eq!(eval_str("[1, 2] + ''"), "[1,2]");
    assert!(matches!(eval("[1, , 3][1]"), Value::Null));
    assert_eq!(eval_str("[...[1, 2], 3]"), "[1,2,3]");
}

#[test]
fn test_array_mutators() {
    assert_eq!(eval_num("var a = [1]; a.push(2, 3)"), 3.0);
    assert_eq!(eval_num("var a = [1, 2, 3]; a.pop(); a.length"), 2.0);
    assert_eq!(eval_num("[9, 1].shift()"), 9.0);
    assert_eq!(eval_str("var a = [2]; a.unshift(1); a.join(',')"), "1,2");
    assert_eq!(eval_str("[1, 2, 3].reverse().join('')"), "321");
    assert_eq!(
        eval_str("var a = [1, 2, 3, 4]; a.splice(1, 2, 'x'); a.join(',')"),
        "1,x,4"
    );
    assert_eq!(eval_str("[1, 2, 3].fill(0, 1).join('')"), "100");
}

#[test]
fn test_array_accessors() {
    assert_eq!(eval_str("[1, 2, 3].slice(1).join(',')"), "2,3");
    assert_eq!(eval_str("[1, 2].concat([3], 4).join('')"), "1234");
    assert_eq!(eval_num("[1, 2, 3].at(-1)"), 3.0);
    assert!(eval_bool("[1, NaN].includes(NaN)"));
    assert_eq!(eval_num("[5, 6, 7].indexOf(6)"), 1.0);
    assert_eq!(eval_str("[[1, [2]], 3].flat(2).join('')"), "123");
    assert_eq!(eval_str("[1, 2].entries()[1].join(':')"), "1:2");
}

#[test]
fn test_array_callbacks() {
    assert_eq!(eval_str("[1, 2, 3].map(n => n * n).join(',')"), "1,4,9");
    assert_eq!(
        eval_str("[1, 2, 3, 4].filter(function(n) { return n % 2 == 0 }).join(',')"),
        "2,4"
    );
    assert_eq!(eval_num("[1, 2, 3].reduce((a, b) => a + b)"), 6.0);
    assert_eq!(eval_num("[1, 2, 3].reduce((a, b) => a + b, 10)"), 16.0);
    assert_eq!(eval_num("[3, 8, 5].find(n => n > 4)"), 8.0);
    assert_eq!(eval_num("[3, 8, 5].findLastIndex(n => n > 4)"), 2.0);
    assert!(eval_bool("[2, 4].every(n => n % 2 == 0)"));
    assert!(eval_bool("[1, 3, 4].some(n => n % 2 == 0)"));
    assert_eq!(
        eval_num("var sum = 0; [1, 2, 3].forEach(n => sum += n); sum"),
        6.0
    );
    assert_eq!(eval_str("[1, 2].flatMap(n => [n, n]).join('')"), "1122");
    let err = eval_err("[].reduce((a, b) => a + b)");
    assert!(err.contains("reduce of empty array"), "{err}");
}

#[test]
fn test_array_sort() {
    assert_eq!(
        eval_str("[3, 1, 2].sort(function(a, b) { return a - b }).join('')"),
        "123"
    );
    assert_eq!(eval_str("[10, 9].sort().join(',')"), "10,9");
    assert_eq!(eval_str("['b', 'a'].sort().join('')"), "ab");
}

#[test]
fn test_array_statics() {
    assert!(eval_bool("Array.isArray([])"));
    assert!(!eval_bool("Array.isArray('abc')"));
    assert_eq!(eval_str("Array.of(1, 2).join(',')"), "1,2");
    assert_eq!(eval_str("Array.from('abc').join('-')"), "a-b-c");
    assert_eq!(eval_str("Array.from([1, 2], n => n * 2).join(',')"), "2,4");
}

//======================================================================
// objects

#[test]
fn test_object_literals() {
    assert_eq!(eval_num("var o = {a: 1, b: 2}; o.a + o['b']"), 3.0);
    assert_eq!(eval_num("var x = 5; var o = {x}; o.x"), 5.0);
    assert_eq!(eval_num("var o = {'key with space': 1}; o['key with space']"), 1.0);
    assert_eq!(eval_num("var a = {x: 1}; var b = {...a, y: 2}; b.x + b.y"), 3.0);
    assert_eq!(eval_num("var o = {a: {b: 3}}; o.a.b"), 3.0);
}

#[test]
fn test_object_mutation_and_delete() {
    assert_eq!(eval_num("var o = {}; o.x = 1; o.x"), 1.0);
    assert!(eval("var o = {a: 1}; delete o.a; o.a").is_undefined());
    assert!(eval_bool("var o = {a: 1}; o.hasOwnProperty('a')"));
    assert!(!eval_bool("var o = {a: 1}; o.hasOwnProperty('b')"));
}

#[test]
fn test_object_statics() {
    assert_eq!(eval_str("Object.keys({a: 1, b: 2}).join(',')"), "a,b");
    assert_eq!(eval_str("Object.values({a: 1, b: 2}).join(',')"), "1,2");
    assert_eq!(eval_str("Object.entries({a: 1})[0].join(':')"), "a:1");
    assert_eq!(eval_num("Object.assign({}, {a: 1}, {b: 2}).b"), 2.0);
    assert_eq!(eval_num("Object.fromEntries([['a', 7]]).a"), 7.0);
}

//======================================================================
// functions

#[test]
fn test_functions_and_closures() {
    assert_eq!(eval_num("function add(a, b) { return a + b } add(2, 3)"), 5.0);
    assert_eq!(eval_num("(function() { return 7 })()"), 7.0);
    assert_eq!(eval_num("var add = a => b => a + b; add(2)(3)"), 5.0);
    assert_eq!(
        eval_num(
            "function counter() { var n = 0; return function() { n += 1; return n } } \
             var c = counter(); c(); c(); c()"
        ),
        3.0
    );
    assert!(eval("function noop() {} noop()").is_undefined());
}

#[test]
fn test_default_undefined_params() {
    assert!(eval("function f(a, b) { return b } f(1)").is_undefined());
    assert_eq!(eval_num("function f() { return arguments.length } f(1, 2, 3)"), 3.0);
    assert_eq!(eval_num("function f() { return arguments[1] } f(4, 5)"), 5.0);
}

#[test]
fn test_rest_and_spread() {
    assert_eq!(eval_num("function f(a, ...rest) { return rest.length } f(1, 2, 3)"), 2.0);
    assert_eq!(
        eval_str("function f(...all) { return all.join(',') } f('x', 'y')"),
        "x,y"
    );
    assert_eq!(eval_num("function add(a, b, c) { return a + b + c } add(...[1, 2, 3])"), 6.0);
}

#[test]
fn test_call_and_apply() {
    assert_eq!(
        eval_str("function who() { return this.name } who.call({name: 'a'})"),
        "a"
    );
    assert_eq!(
        eval_num("function add(a, b) { return a + b } add.apply(null, [4, 5])"),
        9.0
    );
    assert_eq!(eval_str("function f() {} f.name"), "f");
    assert_eq!(eval_str("var g = function() {}; g.name"), "g");
}

#[test]
fn test_constructors_and_prototypes() {
    assert_eq!(
        eval_str("function Dog(name) { this.name = name } new Dog('rex').name"),
        "rex"
    );
    assert!(eval_bool(
        "function Dog() {} var d = new Dog(); d instanceof Dog"
    ));
    assert_eq!(
        eval_str(
            "function Dog(name) { this.name = name } \
             Dog.prototype.speak = function() { return this.name + ' barks' } \
             new Dog('rex').speak()"
        ),
        "rex barks"
    );
    // prototype edits are visible to existing instances
    assert_eq!(
        eval_num(
            "function T() {} var t = new T(); \
             T.prototype.answer = function() { return 42 } \
             t.answer()"
        ),
        42.0
    );
    assert_eq!(
        eval_num("function P() { return {x: 9} } new P().x"),
        9.0
    );
    assert_eq!(eval_str("new String(42)"), "42");
}

//======================================================================
// control flow

#[test]
fn test_if_else() {
    assert_eq!(eval_num("if (1 > 0) { 1 } else { 2 }"), 1.0);
    assert_eq!(eval_num("var r; if (false) r = 1; else if (true) r = 2; else r = 3; r"), 2.0);
}

#[test]
fn test_loops() {
    assert_eq!(
        eval_num("var sum = 0; for (var i = 1; i <= 4; i++) sum += i; sum"),
        10.0
    );
    assert_eq!(
        eval_num("var i = 0; while (i < 5) { i = i + 1; if (i == 3) break } i"),
        3.0
    );
    assert_eq!(eval_num("var n = 0; do { n++ } while (n < 3); n"), 3.0);
    assert_eq!(eval_num("var sum = 0; for (var v of [1, 2, 3]) sum += v; sum"), 6.0);
    assert_eq!(eval_str("var ks = ''; for (var k in {a: 1, b: 2}) ks += k; ks"), "ab");
    assert_eq!(eval_str("var s = ''; for (var i in ['x', 'y']) s += i; s"), "01");
}

#[test]
fn test_loop_variables_stay_scoped() {
    assert_eq!(
        eval_str("for (var i = 0; i < 2; i++) { var y = i }\ntypeof i"),
        "undefined"
    );
    assert_eq!(
        eval_str("for (var i = 0; i < 2; i++) { var y = i }\ntypeof y"),
        "undefined"
    );
    assert_eq!(eval_str("for (var v of [1, 2]) {}\ntypeof v"), "undefined");
    assert_eq!(eval_str("for (var k in {a: 1}) {}\ntypeof k"), "undefined");
    // assignments from the body still reach enclosing bindings
    assert_eq!(eval_num("var last = -1; for (var i = 0; i < 3; i++) last = i; last"), 2.0);
    // return from inside a loop crosses the loop scope
    assert_eq!(
        eval_num("function f() { for (var i = 0; ; i++) { if (i == 4) return i } } f()"),
        4.0
    );
}

#[test]
fn test_switch_fall_through() {
    assert_eq!(
        eval_str(
            "var r = ''; switch (1) { case 1: r += 'a'; case 2: r += 'b'; break; default: r += 'c' } r"
        ),
        "ab"
    );
    assert_eq!(
        eval_str("var r = ''; switch (9) { case 1: r += 'a'; break; default: r += 'd' } r"),
        "d"
    );
    // matching is strict
    assert_eq!(
        eval_str("var r = 'none'; switch ('1') { case 1: r = 'num'; break } r"),
        "none"
    );
}

//======================================================================
// errors

#[test]
fn test_try_catch() {
    assert_eq!(eval_str("try { throw 'boom' } catch (e) { e }"), "boom");
    assert_eq!(
        eval_str("try { throw new Error('bad') } catch (e) { e.message }"),
        "bad"
    );
    assert_eq!(
        eval_str("try { throw new TypeError('t') } catch (e) { e.name }"),
        "TypeError"
    );
    // internal failures are catchable error objects
    assert_eq!(
        eval_str("try { nope() } catch (e) { e.message }"),
        "undefined is not a function: nope"
    );
    assert_eq!(eval_num("try { 1 } catch (e) { 2 }"), 1.0);
}

#[test]
fn test_finally() {
    assert_eq!(
        eval_str(
            "var log = ''; try { log += 't'; throw 1 } catch (e) { log += 'c' } finally { log += 'f' } log"
        ),
        "tcf"
    );
    // assignment inside finally lands in the enclosing scope
    assert_eq!(eval_num("var b = 0; try { b = 1 } finally { a = 3 } a + b"), 4.0);
    let err = eval_err("try { 1 } finally { throw 'fatal' }");
    assert!(err.contains("finally block threw error"), "{err}");
}

#[test]
fn test_uncaught_errors() {
    let err = eval_err("nope()");
    assert!(err.contains("js failed:"), "{err}");
    assert!(err.contains("undefined is not a function: nope"), "{err}");

    let err = eval_err("throw 'kaput'");
    assert!(err.contains("kaput"), "{err}");

    let err = eval_err("var x = null; x()");
    assert!(err.contains("null is not a function"), "{err}");
}

#[test]
fn test_rethrow_propagates() {
    let err = eval_err(
        "function inner() { throw new Error('deep') } \
         function outer() { inner() } \
         outer()",
    );
    assert!(err.contains("deep"), "{err}");
    assert_eq!(
        eval_str(
            "function inner() { throw new Error('deep') } \
             try { inner() } catch (e) { e.message }"
        ),
        "deep"
    );
}

//======================================================================
// built-in namespaces

#[test]
fn test_math() {
    assert_eq!(eval_num("Math.abs(-4)"), 4.0);
    assert_eq!(eval_num("Math.floor(1.9)"), 1.0);
    assert_eq!(eval_num("Math.round(2.5)"), 3.0);
    assert_eq!(eval_num("Math.round(-2.5)"), -2.0);
    assert_eq!(eval_num("Math.max(1, 9, 3)"), 9.0);
    assert_eq!(eval_str("Math.max()"), "-Infinity");
    assert_eq!(eval_num("Math.pow(2, 8)"), 256.0);
    assert!(eval_bool("Math.PI > 3.14 && Math.PI < 3.15"));
    assert!(eval_bool("var r = Math.random(); r >= 0 && r < 1"));
}

#[test]
fn test_json() {
    assert_eq!(eval_str("JSON.stringify({a: 1, b: [1, 2]})"), "{\"a\":1,\"b\":[1,2]}");
    assert_eq!(eval_str("JSON.stringify(['x', null, true])"), "[\"x\",null,true]");
    assert_eq!(eval_num("JSON.parse('{\"a\": 41}').a + 1"), 42.0);
    assert_eq!(eval_num("JSON.parse('[1, 2, 3]').length"), 3.0);
    // functions are dropped from objects
    assert_eq!(eval_str("JSON.stringify({a: 1, f: function() {}})"), "{\"a\":1}");
    assert_eq!(eval_str("JSON.stringify({a: 1, b: 2}, ['b'])"), "{\"b\":2}");
    let err = eval_err("JSON.parse('{oops')");
    assert!(err.contains("json parse error"), "{err}");
}

#[test]
fn test_regex() {
    assert!(eval_bool("/ab+/.test('xabby')"));
    assert!(!eval_bool("/^q/.test('xq')"));
    assert!(eval_bool("/HAT/i.test('that')"));
    assert_eq!(eval_str("/a(b+)/.exec('xabby')[1]"), "bb");
    assert_eq!(eval_num("/a(b+)/.exec('xabby').index"), 1.0);
    assert!(matches!(eval("/z/.exec('abc')"), Value::Null));
    assert_eq!(eval_num("var r = /a/g; r.test('banana'); r.lastIndex"), 2.0);
    assert_eq!(eval_num("'cat hat'.match(/.at/g).length"), 2.0);
    assert_eq!(eval_str("'a1b2'.replace(/[0-9]/g, '#')"), "a#b#");
    assert_eq!(eval_num("'xyz'.search(/y/)"), 1.0);
    assert_eq!(eval_str("/ab/gi.flags"), "gi");
    assert_eq!(eval_str("new RegExp('a+', 'i').source"), "a+");
    let err = eval_err("new RegExp('(unclosed')");
    assert!(err.contains("invalid regex"), "{err}");
}

#[test]
fn test_date() {
    assert_eq!(eval_str("new Date(0).toISOString()"), "1970-01-01T00:00:00.000Z");
    assert_eq!(eval_num("new Date(0).getTime()"), 0.0);
    assert_eq!(eval_num("new Date(0).getFullYear()"), 1970.0);
    assert_eq!(eval_num("new Date(2021, 5, 15).getMonth()"), 5.0);
    assert_eq!(eval_num("new Date('2021-06-15T00:00:00Z').getDate()"), 15.0);
    assert!(eval_bool("Date.now() > 1500000000000"));
    assert!(eval("Date.parse('garbage')").is_nan());
}

#[test]
fn test_global_functions() {
    assert_eq!(eval_num("parseInt('42')"), 42.0);
    assert_eq!(eval_num("parseInt('3.9')"), 3.0);
    assert!(eval("parseInt('zzz')").is_nan());
    assert_eq!(eval_num("Number('0x10')"), 16.0);
    assert_eq!(eval_num("Number('')"), 0.0);
    assert!(eval("Number('abc')").is_nan());
}

//======================================================================
// engine embedding

#[test]
fn test_engine_bindings_persist() {
    let engine = Engine::new();
    engine.eval("var total = 0").unwrap();
    engine.eval("total += 5").unwrap();
    let result = engine.eval("total").unwrap();
    assert!(matches!(result, Value::Num(Num::I32(5))));
}

#[test]
fn test_engine_host_function() {
    let engine = Engine::new();
    let calls = Rc::new(RefCell::new(0));
    let seen = calls.clone();
    engine.register(
        "tick",
        Rc::new(move |_args| {
            *seen.borrow_mut() += 1;
            Ok(Value::Undefined)
        }),
    );
    engine.eval("for (var i = 0; i < 3; i++) tick()").unwrap();
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_engine_console_hook() {
    let engine = Engine::new();
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = lines.clone();
    engine.set_on_console(Rc::new(move |line| sink.borrow_mut().push(line.to_string())));
    engine.eval("console.log('n =', 1 + 1)").unwrap();
    engine.eval("console.log(null)").unwrap();
    assert_eq!(lines.borrow().as_slice(), ["n = 2", "[object Null]"]);
}

#[test]
fn test_engine_copy_and_counters() {
    let engine = Engine::new();
    engine.eval("var a = 1").unwrap();
    let fork = engine.copy();
    fork.eval("a = 100").unwrap();
    assert!(matches!(engine.get("a"), Value::Num(Num::I32(1))));
    assert!(matches!(fork.get("a"), Value::Num(Num::I32(100))));

    assert_eq!(engine.statement_count(), 1);
    assert!(engine.eval("boom()").is_err());
    assert_eq!(engine.error_count(), 1);
    // the engine stays usable after a failure
    assert!(engine.eval("2 + 2").is_ok());
}

#[test]
fn test_engine_eval_with() {
    let engine = Engine::new();
    engine.set("base", Value::from(10));
    let result = engine
        .eval_with("base + bonus", &[("bonus", Value::from(5))])
        .unwrap();
    assert!(matches!(result, Value::Num(Num::I32(15))));
    assert!(engine.get("bonus").is_undefined());
}

//======================================================================
// scope

#[test]
fn test_closures_share_state() {
    assert_eq!(
        eval_num(
            "function pair() { var n = 0; \
               return {inc: function() { n++ }, get: function() { return n }} } \
             var p = pair(); p.inc(); p.inc(); p.get()"
        ),
        2.0
    );
}

#[test]
fn test_var_shadowing_in_functions() {
    assert_eq!(
        eval_num("var x = 1; function f() { var x = 2; return x } f() + x"),
        3.0
    );
    assert_eq!(
        eval_num("var x = 1; function f() { x = 5 } f(); x"),
        5.0
    );
}

#[test]
fn test_arrow_this_is_lexical() {
    assert_eq!(
        eval_str(
            "var o = {name: 'o', run: function() { \
               var f = () => this.name; return f() }}; \
             o.run()"
        ),
        "o"
    );
}
