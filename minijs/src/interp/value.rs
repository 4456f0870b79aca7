//! Runtime values and the prototype-based object model

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, FixedOffset};

use crate::ast::Node;
use crate::interp::Context;
use crate::Result;

/// Numbers keep their narrowest representation. Arithmetic widens to
/// f64 and [`crate::interp::coerce::narrow`] brings whole results back
/// down to integers.
#[derive(Clone, Copy, Debug)]
pub enum Num {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::I32(n) => n as f64,
            Num::I64(n) => n as f64,
            Num::F64(n) => n,
        }
    }

    /// 32-bit view: i64 wraps, f64 saturates with NaN going to zero.
    pub fn to_i32(self) -> i32 {
        match self {
            Num::I32(n) => n,
            Num::I64(n) => n as i32,
            Num::F64(n) => n as i32,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Num::I32(n) => n as i64,
            Num::I64(n) => n,
            Num::F64(n) => n as i64,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Num::F64(n) if n.is_nan())
    }

    /// Same-representation equality, the way boxed numbers compare:
    /// different widths are never equal, and floats compare by bits so
    /// NaN equals NaN while 0.0 and -0.0 differ.
    pub fn same(self, other: Num) -> bool {
        match (self, other) {
            (Num::I32(a), Num::I32(b)) => a == b,
            (Num::I64(a), Num::I64(b)) => a == b,
            (Num::F64(a), Num::F64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(Num),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<JsObject>),
    Function(Rc<JsFunction>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n:?})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(o) => {
                let props = o.props.borrow();
                let mut map = f.debug_map();
                for (key, value) in props.entries() {
                    map.entry(&key, &value);
                }
                map.finish()
            }
            Value::Function(func) => {
                write!(f, "Function({})", func.get_name().unwrap_or_default())
            }
        }
    }
}

impl Value {
    pub const NAN: Value = Value::Num(Num::F64(f64::NAN));

    pub fn str(text: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(text.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Num(n) if n.is_nan())
    }

    /// Strings, numbers, booleans, null and undefined.
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Function(_)
        )
    }

    /// Identity for reference values, false for everything else.
    pub fn ref_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Num(Num::I32(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Num(Num::I64(value))
    }
}

impl From<Num> for Value {
    fn from(value: Num) -> Value {
        Value::Num(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Value {
        Value::Str(value)
    }
}

//======================================================================
// objects

/// Insertion-ordered property map. Objects in scripts stay small, so a
/// flat vector beats a hash map here and keeps key order for free.
#[derive(Default)]
pub struct PropMap {
    entries: Vec<(Rc<str>, Value)>,
}

impl PropMap {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.clone())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key.as_ref() == name)
    }

    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: Value) {
        let name = name.into();
        for entry in &mut self.entries {
            if entry.0 == name {
                entry.1 = value;
                return;
            }
        }
        self.entries.push((name, value));
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(key, _)| key.as_ref() == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(Rc<str>, Value)> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything that is not a plain property bag hangs off the kind:
/// the Math and JSON namespaces, regexes and dates.
pub enum Exotic {
    None,
    Math,
    Json,
    Regex(RegexData),
    Date(RefCell<DateTime<FixedOffset>>),
}

pub struct RegexData {
    pub source: String,
    pub flags: String,
    pub regex: regex::Regex,
    pub last_index: Cell<usize>,
}

pub struct JsObject {
    pub kind: Exotic,
    pub props: RefCell<PropMap>,
    /// Instances constructed with `new` link to the live prototype
    /// object of their constructor.
    pub proto: RefCell<Option<Rc<JsObject>>>,
}

impl JsObject {
    pub fn new() -> Rc<JsObject> {
        JsObject::with_kind(Exotic::None)
    }

    pub fn with_kind(kind: Exotic) -> Rc<JsObject> {
        Rc::new(JsObject {
            kind,
            props: RefCell::new(PropMap::default()),
            proto: RefCell::new(None),
        })
    }

    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.props.borrow().get(name)
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.props.borrow().contains_key(name)
    }

    pub fn put(&self, name: impl Into<Rc<str>>, value: Value) {
        self.props.borrow_mut().insert(name, value);
    }

    pub fn remove(&self, name: &str) {
        self.props.borrow_mut().remove(name);
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        self.props.borrow().keys()
    }
}

//======================================================================
// functions

pub type NativeFn = fn(&Value, &[Value], &Context) -> Result<Value>;

pub type HostFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A script function closes over the context it was declared in.
/// Parameter names carry a leading `.` for a rest parameter.
pub struct ScriptFn {
    pub arrow: bool,
    pub params: Vec<Rc<str>>,
    pub body: Rc<Node>,
    pub decl_ctx: Context,
}

pub enum Callable {
    Script(ScriptFn),
    Native { name: &'static str, f: NativeFn },
    Host(HostFn),
}

pub struct JsFunction {
    pub name: RefCell<Option<Rc<str>>>,
    pub props: RefCell<PropMap>,
    /// Created on first access and seeded with `constructor`, so
    /// later edits are visible to already constructed instances.
    pub prototype: RefCell<Option<Rc<JsObject>>>,
    pub callable: Callable,
}

impl JsFunction {
    pub fn script(arrow: bool, params: Vec<Rc<str>>, body: Rc<Node>, decl_ctx: Context) -> Rc<JsFunction> {
        JsFunction::with_callable(Callable::Script(ScriptFn {
            arrow,
            params,
            body,
            decl_ctx,
        }))
    }

    pub fn native(name: &'static str, f: NativeFn) -> Rc<JsFunction> {
        let function = JsFunction::with_callable(Callable::Native { name, f });
        function.set_name(name);
        function
    }

    pub fn host(name: &str, f: HostFn) -> Rc<JsFunction> {
        let function = JsFunction::with_callable(Callable::Host(f));
        function.set_name(name);
        function
    }

    fn with_callable(callable: Callable) -> Rc<JsFunction> {
        Rc::new(JsFunction {
            name: RefCell::new(None),
            props: RefCell::new(PropMap::default()),
            prototype: RefCell::new(None),
            callable,
        })
    }

    pub fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = Some(Rc::from(name));
    }

    pub fn get_name(&self) -> Option<Rc<str>> {
        self.name.borrow().clone()
    }

    pub fn is_native(&self, f: NativeFn) -> bool {
        matches!(&self.callable, Callable::Native { f: other, .. } if *other == f)
    }

    /// The live prototype object instances will delegate to.
    pub fn get_prototype(self: &Rc<Self>) -> Rc<JsObject> {
        let mut slot = self.prototype.borrow_mut();
        match &*slot {
            Some(proto) => proto.clone(),
            None => {
                let proto = JsObject::new();
                proto.put("constructor", Value::Function(self.clone()));
                *slot = Some(proto.clone());
                proto
            }
        }
    }
}
