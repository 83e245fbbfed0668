//! Builtin functions and methods of `str`, `list` and `dict`

use std::cmp::Ordering;
use std::rc::Rc;

use super::ast::BinOp;
use super::error::{ErrorKind, ScriptError, ScriptResult};
use super::format::format_value;
use super::interpreter::{binary_op, unhashable, Interpreter};
use super::value::{range_len, Dict, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Input,
    Len,
    Str,
    Int,
    Float,
    Bool,
    List,
    Dict,
    Range,
    Abs,
    Min,
    Max,
    Sum,
    Round,
    Sorted,
    Reversed,
    Type,
    Repr,
    Isinstance,
    Format,
    Any,
    All,
    Chr,
    Ord,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Print,
        Builtin::Input,
        Builtin::Len,
        Builtin::Str,
        Builtin::Int,
        Builtin::Float,
        Builtin::Bool,
        Builtin::List,
        Builtin::Dict,
        Builtin::Range,
        Builtin::Abs,
        Builtin::Min,
        Builtin::Max,
        Builtin::Sum,
        Builtin::Round,
        Builtin::Sorted,
        Builtin::Reversed,
        Builtin::Type,
        Builtin::Repr,
        Builtin::Isinstance,
        Builtin::Format,
        Builtin::Any,
        Builtin::All,
        Builtin::Chr,
        Builtin::Ord,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Input => "input",
            Builtin::Len => "len",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::List => "list",
            Builtin::Dict => "dict",
            Builtin::Range => "range",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Round => "round",
            Builtin::Sorted => "sorted",
            Builtin::Reversed => "reversed",
            Builtin::Type => "type",
            Builtin::Repr => "repr",
            Builtin::Isinstance => "isinstance",
            Builtin::Format => "format",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// The value type this builtin constructs, if it is a type
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            Builtin::Str => Some("str"),
            Builtin::Int => Some("int"),
            Builtin::Float => Some("float"),
            Builtin::Bool => Some("bool"),
            Builtin::List => Some("list"),
            Builtin::Dict => Some("dict"),
            Builtin::Range => Some("range"),
            _ => None,
        }
    }
}

/// Keyword arguments not yet consumed by a call
struct KwArgs(Vec<(String, Value)>);

impl KwArgs {
    fn take(&mut self, key: &str) -> Option<Value> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    fn finish(self, func: &str) -> ScriptResult<()> {
        match self.0.first() {
            Some((key, _)) => Err(ScriptError::type_error(format!(
                "'{}' is an invalid keyword argument for {}()",
                key, func
            ))),
            None => Ok(()),
        }
    }
}

fn no_kwargs(func: &str, kwargs: &[(String, Value)]) -> ScriptResult<()> {
    if kwargs.is_empty() {
        Ok(())
    } else {
        Err(ScriptError::type_error(format!(
            "{}() takes no keyword arguments",
            func
        )))
    }
}

fn arity(func: &str, args: &[Value], min: usize, max: usize) -> ScriptResult<()> {
    let given = args.len();
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let message = if min == 1 && max == 1 {
        format!("{}() takes exactly one argument ({} given)", func, given)
    } else if min == max {
        format!("{}() takes exactly {} arguments ({} given)", func, min, given)
    } else if given < min {
        let plural = if min == 1 { "" } else { "s" };
        format!("{}() expected at least {} argument{}, got {}", func, min, plural, given)
    } else {
        let plural = if max == 1 { "" } else { "s" };
        format!("{}() takes at most {} argument{} ({} given)", func, max, plural, given)
    };
    Err(ScriptError::type_error(message))
}

fn expect_int(value: &Value) -> ScriptResult<i64> {
    value.as_int().ok_or_else(|| {
        ScriptError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn expect_str<'a>(value: &'a Value, context: &str) -> ScriptResult<&'a str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(ScriptError::type_error(format!(
            "{} must be str, not {}",
            context,
            other.type_name()
        ))),
    }
}

fn len_of(value: &Value) -> ScriptResult<usize> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.borrow().len()),
        Value::Dict(dict) => Ok(dict.borrow().len()),
        Value::Range { .. } => Ok(range_len(value)),
        other => Err(ScriptError::type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

fn parse_int(text: &str, base: u32) -> ScriptResult<Value> {
    let invalid = || {
        ScriptError::value_error(format!(
            "invalid literal for int() with base {}: {}",
            base,
            Value::str(text).repr()
        ))
    };
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let prefixed = |prefix: &str| {
        digits
            .get(..2)
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    let (base, digits) = match base {
        0 | 16 if prefixed("0x") => (16, &digits[2..]),
        0 | 8 if prefixed("0o") => (8, &digits[2..]),
        0 | 2 if prefixed("0b") => (2, &digits[2..]),
        0 => (10, digits),
        b => (b, digits),
    };
    if digits.is_empty()
        || digits.starts_with(['_', '+', '-'])
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    let signed = if negative {
        format!("-{}", cleaned)
    } else {
        cleaned
    };
    match i64::from_str_radix(&signed, base) {
        Ok(n) => Ok(Value::Int(n)),
        Err(e) => match e.kind() {
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                Err(ScriptError::overflow())
            }
            _ => Err(invalid()),
        },
    }
}

fn float_to_int(x: f64) -> ScriptResult<Value> {
    if x.is_nan() {
        return Err(ScriptError::value_error("cannot convert float NaN to integer"));
    }
    if x.is_infinite() {
        return Err(ScriptError::new(
            ErrorKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(ScriptError::overflow());
    }
    Ok(Value::Int(truncated as i64))
}

fn parse_float(text: &str) -> ScriptResult<Value> {
    let trimmed = text.trim();
    let cleaned: String = trimmed.chars().filter(|&c| c != '_').collect();
    let valid_underscores = !trimmed.starts_with('_') && !trimmed.ends_with('_');
    match cleaned.parse::<f64>() {
        Ok(x) if valid_underscores && !trimmed.is_empty() => Ok(Value::Float(x)),
        _ => Err(ScriptError::value_error(format!(
            "could not convert string to float: {}",
            Value::str(text).repr()
        ))),
    }
}

fn round_float(x: f64, digits: i64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if digits >= 0 {
        let digits = digits.min(17) as usize;
        format!("{:.*}", digits, x).parse().unwrap_or(x)
    } else {
        let factor = 10f64.powi((-digits).min(308) as i32);
        (x / factor).round_ties_even() * factor
    }
}

impl Interpreter<'_> {
    pub(super) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ScriptResult<Value> {
        let name = builtin.name();
        match builtin {
            Builtin::Print => {
                let mut kw = KwArgs(kwargs);
                let sep = match kw.take("sep") {
                    None | Some(Value::None) => " ".to_string(),
                    Some(Value::Str(s)) => s,
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "sep must be None or a string, not {}",
                            other.type_name()
                        )))
                    }
                };
                let end = match kw.take("end") {
                    None | Some(Value::None) => "\n".to_string(),
                    Some(Value::Str(s)) => s,
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "end must be None or a string, not {}",
                            other.type_name()
                        )))
                    }
                };
                kw.take("flush");
                kw.finish(name)?;
                let mut text = args
                    .iter()
                    .map(Value::to_str)
                    .collect::<Vec<_>>()
                    .join(&sep);
                text.push_str(&end);
                self.host.write_output(&text);
                Ok(Value::None)
            }
            Builtin::Input => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                let prompt = args.first().map(Value::to_str).unwrap_or_default();
                match self.host.request_input(&prompt) {
                    Some(text) => Ok(Value::Str(text)),
                    None => Err(ScriptError::interrupted()),
                }
            }
            Builtin::Len => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                let len = len_of(&args[0])?;
                i64::try_from(len).map(Value::Int).map_err(|_| {
                    ScriptError::new(
                        ErrorKind::OverflowError,
                        "Python int too large to convert to C ssize_t",
                    )
                })
            }
            Builtin::Str => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                Ok(Value::Str(args.first().map(Value::to_str).unwrap_or_default()))
            }
            Builtin::Repr => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                Ok(Value::Str(args[0].repr()))
            }
            Builtin::Int => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 2)?;
                match args.as_slice() {
                    [] => Ok(Value::Int(0)),
                    [Value::Str(s)] => parse_int(s, 10),
                    [Value::Str(s), base] => {
                        let base = expect_int(base)?;
                        if base != 0 && !(2..=36).contains(&base) {
                            return Err(ScriptError::value_error(
                                "int() base must be >= 2 and <= 36, or 0",
                            ));
                        }
                        parse_int(s, base as u32)
                    }
                    [_, _] => Err(ScriptError::type_error(
                        "int() can't convert non-string with explicit base",
                    )),
                    [Value::Float(x)] => float_to_int(*x),
                    [v] if v.as_int().is_some() => Ok(Value::Int(v.as_int().unwrap_or(0))),
                    [other] => Err(ScriptError::type_error(format!(
                        "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                        other.type_name()
                    ))),
                    _ => unreachable!("arity checked"),
                }
            }
            Builtin::Float => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                match args.first() {
                    None => Ok(Value::Float(0.0)),
                    Some(Value::Str(s)) => parse_float(s),
                    Some(v) if v.is_number() => Ok(Value::Float(v.as_float().unwrap_or(0.0))),
                    Some(other) => Err(ScriptError::type_error(format!(
                        "float() argument must be a string or a real number, not '{}'",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Bool => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                Ok(Value::Bool(args.first().is_some_and(Value::truthy)))
            }
            Builtin::List => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                match args.first() {
                    None => Ok(Value::list(Vec::new())),
                    Some(v) => Ok(Value::list(self.iterate(v)?)),
                }
            }
            Builtin::Dict => {
                arity(name, &args, 0, 1)?;
                let mut dict = match args.first() {
                    None => Dict::default(),
                    Some(Value::Dict(source)) => source.borrow().clone(),
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "'{}' object is not iterable as key/value pairs",
                            other.type_name()
                        )))
                    }
                };
                for (key, value) in kwargs {
                    dict.insert(Value::Str(key), value)?;
                }
                Ok(Value::dict(dict))
            }
            Builtin::Range => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 3)?;
                let ints = args.iter().map(expect_int).collect::<ScriptResult<Vec<_>>>()?;
                let (start, stop, step) = match ints.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => unreachable!("arity checked"),
                };
                if step == 0 {
                    return Err(ScriptError::value_error("range() arg 3 must not be zero"));
                }
                Ok(Value::Range { start, stop, step })
            }
            Builtin::Abs => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                match &args[0] {
                    Value::Float(x) => Ok(Value::Float(x.abs())),
                    v => match v.as_int() {
                        Some(n) => n.checked_abs().map(Value::Int).ok_or_else(ScriptError::overflow),
                        None => Err(ScriptError::type_error(format!(
                            "bad operand type for abs(): '{}'",
                            v.type_name()
                        ))),
                    },
                }
            }
            Builtin::Min | Builtin::Max => self.min_max(builtin, args, kwargs),
            Builtin::Sum => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 2)?;
                let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
                if matches!(total, Value::Str(_)) {
                    return Err(ScriptError::type_error(
                        "sum() can't sum strings [use ''.join(seq) instead]",
                    ));
                }
                for item in self.iterate(&args[0])? {
                    total = binary_op(BinOp::Add, &total, &item)?;
                }
                Ok(total)
            }
            Builtin::Round => {
                let mut kw = KwArgs(kwargs);
                let ndigits = kw.take("ndigits");
                kw.finish(name)?;
                arity(name, &args, 1, 2)?;
                let ndigits = match args.get(1).or(ndigits.as_ref()) {
                    None | Some(Value::None) => None,
                    Some(v) => Some(expect_int(v)?),
                };
                match (&args[0], ndigits) {
                    (Value::Float(x), None) => float_to_int(x.round_ties_even()),
                    (Value::Float(x), Some(digits)) => Ok(Value::Float(round_float(*x, digits))),
                    (v, digits) if v.as_int().is_some() => {
                        let n = v.as_int().unwrap_or(0);
                        match digits {
                            Some(d) if d < 0 => float_to_int(round_float(n as f64, d)),
                            _ => Ok(Value::Int(n)),
                        }
                    }
                    (other, _) => Err(ScriptError::type_error(format!(
                        "type {} doesn't define __round__ method",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Sorted => {
                let mut kw = KwArgs(kwargs);
                let key = kw.take("key");
                let reverse = kw.take("reverse").is_some_and(|v| v.truthy());
                kw.finish(name)?;
                arity(name, &args, 1, 1)?;
                let items = self.iterate(&args[0])?;
                Ok(Value::list(self.sort_values(items, key, reverse)?))
            }
            Builtin::Reversed => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                if matches!(args[0], Value::Dict(_)) {
                    return Err(ScriptError::type_error("'dict' object is not reversible"));
                }
                let mut items = self.iterate(&args[0])?;
                items.reverse();
                Ok(Value::list(items))
            }
            Builtin::Type => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                Ok(match &args[0] {
                    Value::Exception(err) => Value::ExceptionClass(err.kind),
                    other => Value::Type(other.type_name()),
                })
            }
            Builtin::Isinstance => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 2, 2)?;
                let (value, class) = (&args[0], &args[1]);
                let type_name = match class {
                    Value::Builtin(b) => b.type_name(),
                    Value::Type(t) => Some(*t),
                    Value::ExceptionClass(kind) => {
                        return Ok(Value::Bool(matches!(
                            value,
                            Value::Exception(err) if err.kind.is_subclass_of(*kind)
                        )));
                    }
                    _ => None,
                };
                match type_name {
                    Some(t) => Ok(Value::Bool(
                        value.type_name() == t || (t == "int" && matches!(value, Value::Bool(_))),
                    )),
                    None => Err(ScriptError::type_error(
                        "isinstance() arg 2 must be a type, a tuple of types, or a union",
                    )),
                }
            }
            Builtin::Format => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 2)?;
                let spec = match args.get(1) {
                    Some(v) => expect_str(v, "format() argument 2")?.to_string(),
                    None => String::new(),
                };
                Ok(Value::Str(format_value(&args[0], &spec)?))
            }
            Builtin::Any | Builtin::All => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                let items = self.iterate(&args[0])?;
                Ok(Value::Bool(if builtin == Builtin::Any {
                    items.iter().any(Value::truthy)
                } else {
                    items.iter().all(Value::truthy)
                }))
            }
            Builtin::Chr => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                let code = expect_int(&args[0])?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| ScriptError::value_error("chr() arg not in range(0x110000)"))
            }
            Builtin::Ord => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                let text = match &args[0] {
                    Value::Str(s) => s,
                    other => {
                        return Err(ScriptError::type_error(format!(
                            "ord() expected string of length 1, but {} found",
                            other.type_name()
                        )))
                    }
                };
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Int(c as i64)),
                    _ => Err(ScriptError::type_error(format!(
                        "ord() expected a character, but string of length {} found",
                        text.chars().count()
                    ))),
                }
            }
        }
    }

    fn min_max(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ScriptResult<Value> {
        let name = builtin.name();
        let mut kw = KwArgs(kwargs);
        let key = kw.take("key").filter(|k| !matches!(k, Value::None));
        let default = kw.take("default");
        kw.finish(name)?;
        arity(name, &args, 1, usize::MAX)?;

        let items = if args.len() == 1 {
            self.iterate(&args[0])?
        } else {
            args
        };
        let (want, symbol) = if builtin == Builtin::Max {
            (Ordering::Greater, ">")
        } else {
            (Ordering::Less, "<")
        };

        let mut best: Option<(Value, Value)> = None;
        for item in items {
            let rank = match &key {
                Some(key) => self.call_value(key, vec![item.clone()], Vec::new())?,
                None => item.clone(),
            };
            let replace = match &best {
                None => true,
                Some((best_rank, _)) => rank.compare(best_rank, symbol)? == want,
            };
            if replace {
                best = Some((rank, item));
            }
        }
        match (best, default) {
            (Some((_, item)), _) => Ok(item),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(ScriptError::value_error(format!(
                "{}() arg is an empty sequence",
                name
            ))),
        }
    }

    /// Stable sort with an optional key function
    fn sort_values(
        &mut self,
        items: Vec<Value>,
        key: Option<Value>,
        reverse: bool,
    ) -> ScriptResult<Vec<Value>> {
        let ranks = match key.filter(|k| !matches!(k, Value::None)) {
            Some(key) => items
                .iter()
                .map(|item| self.call_value(&key, vec![item.clone()], Vec::new()))
                .collect::<ScriptResult<Vec<_>>>()?,
            None => items.clone(),
        };
        let mut order: Vec<usize> = (0..items.len()).collect();
        let mut failure = None;
        order.sort_by(|&a, &b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            let (x, y) = if reverse { (&ranks[b], &ranks[a]) } else { (&ranks[a], &ranks[b]) };
            match x.compare(y, "<") {
                Ok(ordering) => ordering,
                Err(err) => {
                    failure = Some(err);
                    Ordering::Equal
                }
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(order.into_iter().map(|i| items[i].clone()).collect())
    }

    pub(super) fn call_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ScriptResult<Value> {
        let result = match receiver {
            Value::Str(s) => self.str_method(s, method, args, kwargs),
            Value::List(items) => self.list_method(items, method, args, kwargs),
            Value::Dict(dict) => dict_method(dict, method, args, kwargs),
            _ => None,
        };
        result.unwrap_or_else(|| {
            Err(ScriptError::new(
                ErrorKind::AttributeError,
                format!(
                    "'{}' object has no attribute '{}'",
                    receiver.type_name(),
                    method
                ),
            ))
        })
    }

    /// `None` when the method does not exist
    fn str_method(
        &mut self,
        s: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Option<ScriptResult<Value>> {
        if method == "format" {
            return Some(format_template(s, &args, &kwargs).map(Value::Str));
        }
        let qualified = format!("str.{}", method);
        let run = |args: &[Value]| -> ScriptResult<Value> {
            no_kwargs(&qualified, &kwargs)?;
            let text = |v: &Value| -> ScriptResult<String> {
                expect_str(v, "argument").map(String::from)
            };
            let strip_chars = |args: &[Value]| -> ScriptResult<Option<Vec<char>>> {
                arity(&qualified, args, 0, 1)?;
                match args.first() {
                    None | Some(Value::None) => Ok(None),
                    Some(v) => Ok(Some(text(v)?.chars().collect())),
                }
            };
            Ok(match method {
                "upper" => Value::str(s.to_uppercase()),
                "lower" => Value::str(s.to_lowercase()),
                "strip" => Value::str(match strip_chars(args)? {
                    Some(chars) => s.trim_matches(chars.as_slice()),
                    None => s.trim(),
                }),
                "lstrip" => Value::str(match strip_chars(args)? {
                    Some(chars) => s.trim_start_matches(chars.as_slice()),
                    None => s.trim_start(),
                }),
                "rstrip" => Value::str(match strip_chars(args)? {
                    Some(chars) => s.trim_end_matches(chars.as_slice()),
                    None => s.trim_end(),
                }),
                "split" => {
                    arity(&qualified, args, 0, 2)?;
                    let maxsplit = match args.get(1) {
                        Some(v) => expect_int(v)?,
                        None => -1,
                    };
                    let parts = match args.first() {
                        None | Some(Value::None) => split_whitespace(s, maxsplit),
                        Some(sep) => {
                            let sep = text(sep)?;
                            if sep.is_empty() {
                                return Err(ScriptError::value_error("empty separator"));
                            }
                            if maxsplit < 0 {
                                s.split(sep.as_str()).map(String::from).collect()
                            } else {
                                s.splitn(maxsplit as usize + 1, sep.as_str())
                                    .map(String::from)
                                    .collect()
                            }
                        }
                    };
                    Value::list(parts.into_iter().map(Value::Str).collect())
                }
                "splitlines" => {
                    arity(&qualified, args, 0, 0)?;
                    Value::list(s.lines().map(Value::str).collect())
                }
                "replace" => {
                    arity(&qualified, args, 2, 3)?;
                    let (old, new) = (text(&args[0])?, text(&args[1])?);
                    match args.get(2).map(expect_int).transpose()? {
                        Some(count) if count >= 0 => {
                            Value::str(s.replacen(old.as_str(), &new, count as usize))
                        }
                        _ => Value::str(s.replace(old.as_str(), &new)),
                    }
                }
                "startswith" | "endswith" => {
                    arity(&qualified, args, 1, 1)?;
                    let affix = text(&args[0])?;
                    Value::Bool(if method == "startswith" {
                        s.starts_with(affix.as_str())
                    } else {
                        s.ends_with(affix.as_str())
                    })
                }
                "find" | "index" => {
                    arity(&qualified, args, 1, 1)?;
                    let needle = text(&args[0])?;
                    match s.find(needle.as_str()) {
                        Some(byte) => Value::Int(s[..byte].chars().count() as i64),
                        None if method == "find" => Value::Int(-1),
                        None => return Err(ScriptError::value_error("substring not found")),
                    }
                }
                "count" => {
                    arity(&qualified, args, 1, 1)?;
                    let needle = text(&args[0])?;
                    let count = if needle.is_empty() {
                        s.chars().count() + 1
                    } else {
                        s.matches(needle.as_str()).count()
                    };
                    Value::Int(count as i64)
                }
                "join" => {
                    arity(&qualified, args, 1, 1)?;
                    let items = self.iterate(&args[0])?;
                    let mut parts = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        match item {
                            Value::Str(part) => parts.push(part.clone()),
                            other => {
                                return Err(ScriptError::type_error(format!(
                                    "sequence item {}: expected str instance, {} found",
                                    i,
                                    other.type_name()
                                )))
                            }
                        }
                    }
                    Value::str(parts.join(s))
                }
                "isdigit" | "isalpha" | "isalnum" | "isspace" => {
                    arity(&qualified, args, 0, 0)?;
                    let test: fn(char) -> bool = match method {
                        "isdigit" => |c: char| c.is_ascii_digit(),
                        "isalpha" => char::is_alphabetic,
                        "isalnum" => char::is_alphanumeric,
                        _ => char::is_whitespace,
                    };
                    Value::Bool(!s.is_empty() && s.chars().all(test))
                }
                "isupper" | "islower" => {
                    arity(&qualified, args, 0, 0)?;
                    let cased: Vec<char> = s.chars().filter(|c| c.is_alphabetic()).collect();
                    let test: fn(&char) -> bool = if method == "isupper" {
                        |c: &char| !c.is_lowercase()
                    } else {
                        |c: &char| !c.is_uppercase()
                    };
                    Value::Bool(!cased.is_empty() && cased.iter().all(test))
                }
                "title" => {
                    arity(&qualified, args, 0, 0)?;
                    let mut out = String::with_capacity(s.len());
                    let mut previous_cased = false;
                    for c in s.chars() {
                        if previous_cased {
                            out.extend(c.to_lowercase());
                        } else {
                            out.extend(c.to_uppercase());
                        }
                        previous_cased = c.is_alphabetic();
                    }
                    Value::Str(out)
                }
                "capitalize" => {
                    arity(&qualified, args, 0, 0)?;
                    let mut chars = s.chars();
                    let out = match chars.next() {
                        Some(first) => first
                            .to_uppercase()
                            .chain(chars.flat_map(char::to_lowercase))
                            .collect(),
                        None => String::new(),
                    };
                    Value::Str(out)
                }
                "zfill" => {
                    arity(&qualified, args, 1, 1)?;
                    let width = expect_int(&args[0])?.max(0) as usize;
                    let len = s.chars().count();
                    if len >= width {
                        Value::str(s)
                    } else {
                        let (sign, rest) = match s.chars().next() {
                            Some(c @ ('+' | '-')) => (c.to_string(), &s[1..]),
                            _ => (String::new(), s),
                        };
                        Value::Str(format!("{}{}{}", sign, "0".repeat(width - len), rest))
                    }
                }
                "center" | "ljust" | "rjust" => {
                    arity(&qualified, args, 1, 2)?;
                    let width = expect_int(&args[0])?.max(0) as usize;
                    let fill = match args.get(1) {
                        Some(v) => {
                            let fill = text(v)?;
                            let mut chars = fill.chars();
                            match (chars.next(), chars.next()) {
                                (Some(c), None) => c,
                                _ => {
                                    return Err(ScriptError::type_error(
                                        "The fill character must be exactly one character long",
                                    ))
                                }
                            }
                        }
                        None => ' ',
                    };
                    let len = s.chars().count();
                    let padding = width.saturating_sub(len);
                    let (left, right) = match method {
                        "ljust" => (0, padding),
                        "rjust" => (padding, 0),
                        _ => {
                            let left = padding / 2 + (padding & width & 1);
                            (left, padding - left)
                        }
                    };
                    let fill = |n: usize| fill.to_string().repeat(n);
                    Value::Str(format!("{}{}{}", fill(left), s, fill(right)))
                }
                _ => unreachable!("filtered by STR_METHODS"),
            })
        };
        STR_METHODS.contains(&method).then(|| run(&args))
    }

    fn list_method(
        &mut self,
        items: &Rc<std::cell::RefCell<Vec<Value>>>,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Option<ScriptResult<Value>> {
        if !LIST_METHODS.contains(&method) {
            return None;
        }
        let qualified = format!("list.{}", method);
        if method == "sort" {
            let mut kw = KwArgs(kwargs);
            let key = kw.take("key");
            let reverse = kw.take("reverse").is_some_and(|v| v.truthy());
            return Some((|| {
                kw.finish("sort")?;
                arity(&qualified, &args, 0, 0)?;
                let current = items.borrow().clone();
                let sorted = self.sort_values(current, key, reverse)?;
                *items.borrow_mut() = sorted;
                Ok(Value::None)
            })());
        }
        if let Err(err) = no_kwargs(&qualified, &kwargs) {
            return Some(Err(err));
        }
        let result = (|| -> ScriptResult<Value> {
            match method {
                "append" => {
                    arity(&qualified, &args, 1, 1)?;
                    items.borrow_mut().push(args[0].clone());
                }
                "extend" => {
                    arity(&qualified, &args, 1, 1)?;
                    let extra = self.iterate(&args[0])?;
                    items.borrow_mut().extend(extra);
                }
                "insert" => {
                    arity(&qualified, &args, 2, 2)?;
                    let len = items.borrow().len() as i64;
                    let raw = expect_int(&args[0])?;
                    let index = if raw < 0 { (raw + len).max(0) } else { raw.min(len) };
                    items.borrow_mut().insert(index as usize, args[1].clone());
                }
                "pop" => {
                    arity(&qualified, &args, 0, 1)?;
                    let mut list = items.borrow_mut();
                    if list.is_empty() {
                        return Err(ScriptError::new(ErrorKind::IndexError, "pop from empty list"));
                    }
                    let len = list.len() as i64;
                    let raw = args.first().map(expect_int).transpose()?.unwrap_or(-1);
                    let index = if raw < 0 { raw + len } else { raw };
                    if !(0..len).contains(&index) {
                        return Err(ScriptError::new(ErrorKind::IndexError, "pop index out of range"));
                    }
                    return Ok(list.remove(index as usize));
                }
                "remove" => {
                    arity(&qualified, &args, 1, 1)?;
                    let pos = items.borrow().iter().position(|v| v.py_eq(&args[0]));
                    match pos {
                        Some(i) => {
                            items.borrow_mut().remove(i);
                        }
                        None => {
                            return Err(ScriptError::value_error("list.remove(x): x not in list"))
                        }
                    }
                }
                "index" => {
                    arity(&qualified, &args, 1, 1)?;
                    let pos = items.borrow().iter().position(|v| v.py_eq(&args[0]));
                    return match pos {
                        Some(i) => Ok(Value::Int(i as i64)),
                        None => Err(ScriptError::value_error(format!(
                            "{} is not in list",
                            args[0].repr()
                        ))),
                    };
                }
                "count" => {
                    arity(&qualified, &args, 1, 1)?;
                    let count = items.borrow().iter().filter(|v| v.py_eq(&args[0])).count();
                    return Ok(Value::Int(count as i64));
                }
                "reverse" => {
                    arity(&qualified, &args, 0, 0)?;
                    items.borrow_mut().reverse();
                }
                "clear" => {
                    arity(&qualified, &args, 0, 0)?;
                    items.borrow_mut().clear();
                }
                "copy" => {
                    arity(&qualified, &args, 0, 0)?;
                    return Ok(Value::list(items.borrow().clone()));
                }
                _ => unreachable!("filtered by LIST_METHODS"),
            }
            Ok(Value::None)
        })();
        Some(result)
    }
}

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "splitlines", "replace",
    "startswith", "endswith", "find", "index", "count", "join", "isdigit", "isalpha",
    "isalnum", "isspace", "isupper", "islower", "title", "capitalize", "zfill", "center",
    "ljust", "rjust",
];

const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "index", "count", "reverse", "sort",
    "clear", "copy",
];

fn dict_method(
    dict: &Rc<std::cell::RefCell<Dict>>,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Option<ScriptResult<Value>> {
    let qualified = format!("dict.{}", method);
    let run = || -> ScriptResult<Value> {
        no_kwargs(&qualified, &kwargs)?;
        let hashable = |key: &Value| {
            if key.is_hashable() {
                Ok(())
            } else {
                Err(unhashable(key))
            }
        };
        match method {
            "get" => {
                arity(&qualified, &args, 1, 2)?;
                hashable(&args[0])?;
                let found = dict.borrow().get(&args[0]).cloned();
                Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
            }
            "keys" => {
                arity(&qualified, &args, 0, 0)?;
                Ok(Value::list(dict.borrow().keys()))
            }
            "values" => {
                arity(&qualified, &args, 0, 0)?;
                Ok(Value::list(dict.borrow().values()))
            }
            "pop" => {
                arity(&qualified, &args, 1, 2)?;
                hashable(&args[0])?;
                let removed = dict.borrow_mut().remove(&args[0]);
                match (removed, args.get(1)) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(default.clone()),
                    (None, None) => Err(ScriptError::new(ErrorKind::KeyError, args[0].repr())),
                }
            }
            "setdefault" => {
                arity(&qualified, &args, 1, 2)?;
                let existing = dict.borrow().get(&args[0]).cloned();
                match existing {
                    Some(value) => Ok(value),
                    None => {
                        let value = args.get(1).cloned().unwrap_or(Value::None);
                        dict.borrow_mut().insert(args[0].clone(), value.clone())?;
                        Ok(value)
                    }
                }
            }
            "update" => {
                arity(&qualified, &args, 1, 1)?;
                let Value::Dict(other) = &args[0] else {
                    return Err(ScriptError::type_error(format!(
                        "'{}' object is not iterable as key/value pairs",
                        args[0].type_name()
                    )));
                };
                let entries = other.borrow().entries.clone();
                let mut target = dict.borrow_mut();
                for (key, value) in entries {
                    target.insert(key, value)?;
                }
                Ok(Value::None)
            }
            "clear" => {
                arity(&qualified, &args, 0, 0)?;
                dict.borrow_mut().entries.clear();
                Ok(Value::None)
            }
            "copy" => {
                arity(&qualified, &args, 0, 0)?;
                Ok(Value::dict(dict.borrow().clone()))
            }
            _ => unreachable!("filtered by DICT_METHODS"),
        }
    };
    DICT_METHODS.contains(&method).then(run)
}

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "pop", "setdefault", "update", "clear", "copy",
];

fn split_whitespace(s: &str, maxsplit: i64) -> Vec<String> {
    if maxsplit < 0 {
        return s.split_whitespace().map(String::from).collect();
    }
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if parts.len() as i64 == maxsplit {
            parts.push(rest.to_string());
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }
    parts
}

/// `str.format` with `{}`, `{0}`, `{name}`, conversions and format specs
pub fn format_template(
    template: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> ScriptResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;
    let mut numbering: Option<bool> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(ScriptError::value_error(
                    "Single '}' encountered in format string",
                ))
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(ScriptError::value_error(
                        "expected '}' before end of string",
                    ));
                }
                let (head, spec) = match field.split_once(':') {
                    Some((head, spec)) => (head, spec),
                    None => (field.as_str(), ""),
                };
                let (name, conversion) = match head.split_once('!') {
                    Some((name, conv)) => (name, conv.chars().next()),
                    None => (head, None),
                };

                let value = if name.is_empty() {
                    if numbering == Some(true) {
                        return Err(ScriptError::value_error(
                            "cannot switch from manual field specification to automatic field numbering",
                        ));
                    }
                    numbering = Some(false);
                    let value = positional(args, auto_index)?;
                    auto_index += 1;
                    value
                } else if let Ok(index) = name.parse::<usize>() {
                    if numbering == Some(false) {
                        return Err(ScriptError::value_error(
                            "cannot switch from automatic field numbering to manual field specification",
                        ));
                    }
                    numbering = Some(true);
                    positional(args, index)?
                } else {
                    kwargs
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| {
                            ScriptError::new(ErrorKind::KeyError, Value::str(name).repr())
                        })?
                };
                let value = match conversion {
                    Some('r') | Some('a') => Value::Str(value.repr()),
                    Some('s') => Value::Str(value.to_str()),
                    Some(other) => {
                        return Err(ScriptError::value_error(format!(
                            "Unknown conversion specifier {}",
                            other
                        )))
                    }
                    None => value,
                };
                out.push_str(&format_value(&value, spec)?);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn positional(args: &[Value], index: usize) -> ScriptResult<Value> {
    args.get(index).cloned().ok_or_else(|| {
        ScriptError::new(
            ErrorKind::IndexError,
            format!(
                "Replacement index {} out of range for positional args tuple",
                index
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Builtin::from_name("sorted"), Some(Builtin::Sorted));
        assert_eq!(Builtin::from_name("exec"), None);
        assert_eq!(Builtin::Int.type_name(), Some("int"));
        assert_eq!(Builtin::Print.type_name(), None);
    }

    #[test]
    fn test_parse_int() {
        assert!(matches!(parse_int(" 42 ", 10), Ok(Value::Int(42))));
        assert!(matches!(parse_int("-1_000", 10), Ok(Value::Int(-1000))));
        assert!(matches!(parse_int("ff", 16), Ok(Value::Int(255))));
        assert!(matches!(parse_int("0b101", 0), Ok(Value::Int(5))));
        let err = parse_int("abc", 10).unwrap_err();
        assert_eq!(err.message, "invalid literal for int() with base 10: 'abc'");
        assert_eq!(
            parse_int("99999999999999999999", 10).unwrap_err().kind,
            ErrorKind::OverflowError
        );
    }

    #[test]
    fn test_parse_float() {
        assert!(matches!(parse_float("2.5"), Ok(Value::Float(x)) if x == 2.5));
        assert!(matches!(parse_float(" 1e3 "), Ok(Value::Float(x)) if x == 1000.0));
        assert_eq!(
            parse_float("x1").unwrap_err().message,
            "could not convert string to float: 'x1'"
        );
    }

    #[test]
    fn test_round_float() {
        assert_eq!(round_float(3.14159, 2), 3.14);
        assert_eq!(round_float(1234.0, -2), 1200.0);
    }

    #[test]
    fn test_format_template() {
        let args = [Value::str("a"), Value::Int(7)];
        let kwargs = [("name".to_string(), Value::str("Ada"))];
        assert_eq!(format_template("{} {}", &args, &[]).unwrap(), "a 7");
        assert_eq!(format_template("{1}{0}{1}", &args, &[]).unwrap(), "7a7");
        assert_eq!(format_template("hi {name}!", &[], &kwargs).unwrap(), "hi Ada!");
        assert_eq!(format_template("{0!r:>5}", &args, &[]).unwrap(), "  'a'");
        assert_eq!(format_template("{{x}}", &[], &[]).unwrap(), "{x}");
        assert_eq!(
            format_template("{} {}", &args[..1], &[]).unwrap_err().message,
            "Replacement index 1 out of range for positional args tuple"
        );
        assert!(format_template("{} {0}", &args, &[]).is_err());
    }

    #[test]
    fn test_split_whitespace_with_limit() {
        assert_eq!(split_whitespace("  a b  c ", -1), vec!["a", "b", "c"]);
        assert_eq!(split_whitespace("a b c", 1), vec!["a", "b c"]);
    }
}
