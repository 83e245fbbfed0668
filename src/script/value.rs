//! Runtime values
//!
//! Lists and dicts are shared by reference (`Rc<RefCell<_>>`) so aliasing
//! behaves like Python: `b = a; b.append(1)` is visible through `a`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::ast::FunctionDef;
use super::builtins::Builtin;
use super::error::{ErrorKind, ScriptError, ScriptResult};

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Range { start: i64, stop: i64, step: i64 },
    Function(Rc<Function>),
    Builtin(Builtin),
    ExceptionClass(ErrorKind),
    Exception(Rc<ScriptError>),
    /// Result of `type(x)`
    Type(&'static str),
}

impl Value {
    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
            Value::Builtin(b) if b.type_name().is_some() => "type",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::ExceptionClass(_) | Value::Type(_) => "type",
            Value::Exception(err) => err.kind.name(),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Range { .. } => range_len(self) > 0,
            _ => true,
        }
    }

    /// Numeric view for arithmetic: bools count as ints
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            other => other.as_int().map(|n| n as f64),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Text produced by `str(value)` and `print(value)`
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Exception(err) => err.message.clone(),
            other => other.repr(),
        }
    }

    /// Text produced by `repr(value)`
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<usize>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(x) => out.push_str(&format_float(*x)),
            Value::Str(s) => out.push_str(&quote_str(s)),
            Value::List(items) => {
                let id = Rc::as_ptr(items) as *const () as usize;
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(id);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out, seen);
                }
                out.push(']');
                seen.pop();
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const () as usize;
                if seen.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(id);
                out.push('{');
                for (i, (key, value)) in dict.borrow().entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, seen);
                    out.push_str(": ");
                    value.write_repr(out, seen);
                }
                out.push('}');
                seen.pop();
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    out.push_str(&format!("range({}, {})", start, stop));
                } else {
                    out.push_str(&format!("range({}, {}, {})", start, stop, step));
                }
            }
            Value::Function(func) => out.push_str(&format!("<function {}>", func.def.name)),
            Value::Builtin(b) => match b.type_name() {
                Some(name) => out.push_str(&format!("<class '{}'>", name)),
                None => out.push_str(&format!("<built-in function {}>", b.name())),
            },
            Value::ExceptionClass(kind) => out.push_str(&format!("<class '{}'>", kind.name())),
            Value::Type(name) => out.push_str(&format!("<class '{}'>", name)),
            Value::Exception(err) => {
                out.push_str(err.kind.name());
                out.push('(');
                if !err.message.is_empty() {
                    out.push_str(&quote_str(&err.message));
                }
                out.push(')');
            }
        }
    }

    /// `==` semantics
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
                self.as_int() == other.as_int()
            }
            (a, b) if a.is_number() && b.is_number() => a.as_float() == b.as_float(),
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.py_eq(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.entries
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.py_eq(other)))
            }
            (Value::Range { .. }, Value::Range { .. }) => {
                range_items(self).collect::<Vec<_>>() == range_items(other).collect::<Vec<_>>()
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::ExceptionClass(a), Value::ExceptionClass(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Type(name), Value::Builtin(b)) | (Value::Builtin(b), Value::Type(name)) => {
                b.type_name() == Some(*name)
            }
            _ => false,
        }
    }

    /// `is` semantics
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Str(_), Value::Str(_)) => self.py_eq(other),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::None, Value::None) => true,
            (Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Str(_), _)
            | (_, Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Str(_)) => false,
            _ => self.py_eq(other),
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `sorted` and `min`/`max`
    pub fn compare(&self, other: &Value, symbol: &str) -> ScriptResult<Ordering> {
        match (self, other) {
            (a, b) if a.is_number() && b.is_number() => {
                if let (Some(x), Some(y)) = (a.as_int(), b.as_int()) {
                    return Ok(x.cmp(&y));
                }
                let (x, y) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
                // NaN compares false both ways; report it as equal
                Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
            }
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.py_eq(y) {
                        return x.compare(y, symbol);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(ScriptError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

/// Python-style float repr: `1.0`, `0.1`, `1e+16`, `inf`
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let text = format!("{:e}", x);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Python-style string repr with single quotes preferred
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Number of items in a `Value::Range` (0 for anything else)
pub fn range_len(value: &Value) -> usize {
    let Value::Range { start, stop, step } = *value else {
        return 0;
    };
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let len = if step > 0 && start < stop {
        (stop - start + step - 1) / step
    } else if step < 0 && start > stop {
        (start - stop - step - 1) / (-step)
    } else {
        0
    };
    usize::try_from(len).unwrap_or(usize::MAX)
}

/// The `index`th integer of a `Value::Range`; callers bounds-check first
pub fn range_item(value: &Value, index: usize) -> i64 {
    let (start, step) = match *value {
        Value::Range { start, step, .. } => (start, step),
        _ => (0, 1),
    };
    (start as i128 + step as i128 * index as i128) as i64
}

/// Iterate the integers of a `Value::Range`
pub fn range_items(value: &Value) -> impl Iterator<Item = i64> + '_ {
    (0..range_len(value)).map(move |i| range_item(value, i))
}

/// Insertion-ordered dictionary with Python key equality
#[derive(Debug, Clone, Default)]
pub struct Dict {
    pub entries: Vec<(Value, Value)>,
}

impl Dict {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.py_eq(key))
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace; an existing key keeps its original position
    pub fn insert(&mut self, key: Value, value: Value) -> ScriptResult<()> {
        if !key.is_hashable() {
            return Err(ScriptError::type_error(format!(
                "unhashable type: '{}'",
                key.type_name()
            )));
        }
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// A variable scope; function scopes chain to their defining scope
#[derive(Debug, Default)]
pub struct Scope {
    pub vars: RefCell<HashMap<String, Value>>,
    pub parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn child(parent: Option<Rc<Scope>>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent,
        })
    }

    /// Look a name up in this scope and its parents
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.vars.borrow_mut().remove(name)
    }
}

/// A user-defined function
pub struct Function {
    pub def: Rc<FunctionDef>,
    /// Default values, evaluated once at definition time
    pub defaults: Vec<Option<Value>>,
    /// Enclosing function scope, for nested definitions
    pub closure: Option<Rc<Scope>>,
}

// Scopes can contain the function itself, so never print them
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.def.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_repr() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_str_repr_quotes() {
        assert_eq!(quote_str("hi"), "'hi'");
        assert_eq!(quote_str("it's"), "\"it's\"");
        assert_eq!(quote_str("a\nb"), "'a\\nb'");
    }

    #[test]
    fn test_nested_repr() {
        let mut dict = Dict::default();
        dict.insert(Value::str("k"), Value::list(vec![Value::Int(1), Value::None]))
            .unwrap();
        assert_eq!(Value::dict(dict).repr(), "{'k': [1, None]}");
    }

    #[test]
    fn test_self_referencing_list_repr() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.repr(), "[1, [...]]");
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&Value::str("1")));
    }

    #[test]
    fn test_range_len() {
        let r = |start, stop, step| Value::Range { start, stop, step };
        assert_eq!(range_len(&r(0, 5, 1)), 5);
        assert_eq!(range_len(&r(0, 5, 2)), 3);
        assert_eq!(range_len(&r(5, 0, -1)), 5);
        assert_eq!(range_len(&r(5, 0, 1)), 0);
        assert_eq!(range_items(&r(10, 0, -3)).collect::<Vec<_>>(), vec![10, 7, 4, 1]);
        let wide = r(-i64::MAX, i64::MAX, 1_000_000_000_000_000_000);
        assert_eq!(range_len(&wide), 19);
        assert_eq!(range_item(&wide, 18), 8_776_627_963_145_224_193);
    }

    #[test]
    fn test_dict_keeps_insertion_order_on_update() {
        let mut dict = Dict::default();
        dict.insert(Value::str("a"), Value::Int(1)).unwrap();
        dict.insert(Value::str("b"), Value::Int(2)).unwrap();
        dict.insert(Value::str("a"), Value::Int(3)).unwrap();
        assert_eq!(Value::dict(dict).repr(), "{'a': 3, 'b': 2}");
    }

    #[test]
    fn test_unhashable_key() {
        let mut dict = Dict::default();
        let err = dict.insert(Value::list(vec![]), Value::None).unwrap_err();
        assert_eq!(err.message, "unhashable type: 'list'");
    }
}
