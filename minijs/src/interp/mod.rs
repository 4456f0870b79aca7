//! Tree-walking interpreter: values, scope chain, property
//! resolution, evaluation and the built-in library.

pub mod builtins;
pub mod coerce;
mod context;
mod eval;
mod property;
mod value;

pub use context::{Context, Counters};
pub use eval::{call_function, eval};
pub use property::{get_member, PropertyRef};
pub use value::{
    Callable, Exotic, HostFn, JsFunction, JsObject, NativeFn, Num, PropMap, RegexData, ScriptFn,
    Value,
};
