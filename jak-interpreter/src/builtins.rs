use std::collections::HashMap;
use std::rc::Rc;

use gc::Gc;

use crate::error::{ErrorKind, EvaluationError, Location};
use crate::object::{BuiltinFn, Object};

/// Name to built-in table handed to the evaluator. Lookups fall back to it
/// after the environment chain.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    table: HashMap<Rc<str>, Gc<Object>>,
}

const STANDARD: &[(&str, BuiltinFn)] = &[
    ("len", builtin_len),
    ("first", builtin_first),
    ("last", builtin_last),
    ("tail", builtin_tail),
    ("push", builtin_push),
    ("keys", builtin_keys),
    ("values", builtin_values),
    ("typeof", builtin_typeof),
    ("str", builtin_str),
    ("int", builtin_int),
    ("float", builtin_float),
    ("bool", builtin_bool),
    ("range", builtin_range),
    ("format", builtin_format),
    ("math.abs", math_abs),
    ("math.floor", math_floor),
    ("math.ceil", math_ceil),
    ("math.sqrt", math_sqrt),
    ("math.min", math_min),
    ("math.max", math_max),
    ("strings.upper", strings_upper),
    ("strings.lower", strings_lower),
    ("strings.trim", strings_trim),
    ("strings.split", strings_split),
    ("strings.join", strings_join),
    ("strings.contains", strings_contains),
];

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-ins that do not touch the host.
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        for (name, func) in STANDARD {
            builtins.register(name, *func);
        }
        builtins
    }

    pub fn register(&mut self, name: &str, func: BuiltinFn) -> &mut Self {
        self.table.insert(name.into(), Object::builtin(name, func));
        self
    }

    pub fn get(&self, name: &str) -> Option<Gc<Object>> {
        self.table.get(name).cloned()
    }

    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names = self.table.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}

pub fn builtin_error(location: &Location, message: impl Into<String>) -> EvaluationError {
    location.error(ErrorKind::Builtin(message.into()))
}

pub fn check_arity(
    location: &Location,
    args: &[Gc<Object>],
    want: usize,
) -> Result<(), EvaluationError> {
    if args.len() != want {
        return Err(builtin_error(
            location,
            format!("wrong number of arguments. got={}, want={}", args.len(), want),
        ));
    }
    Ok(())
}

pub fn unsupported_argument(location: &Location, name: &str, object: &Object) -> EvaluationError {
    builtin_error(
        location,
        format!("argument to `{}` not supported, got {}", name, object.type_name()),
    )
}

pub fn wrong_type(location: &Location, name: &str, want: &str, object: &Object) -> EvaluationError {
    builtin_error(
        location,
        format!(
            "argument to `{}` must be {}, got {}",
            name,
            want,
            object.type_name()
        ),
    )
}

pub fn expect_string<'a>(
    location: &Location,
    name: &str,
    object: &'a Object,
) -> Result<&'a str, EvaluationError> {
    match object {
        Object::String(string) => Ok(&string.value),
        other => Err(wrong_type(location, name, "STRING", other)),
    }
}

pub fn expect_integer(location: &Location, name: &str, object: &Object) -> Result<i64, EvaluationError> {
    match object {
        Object::Integer(value) => Ok(*value),
        other => Err(wrong_type(location, name, "INTEGER", other)),
    }
}

fn expect_array(
    location: &Location,
    name: &str,
    object: &Object,
) -> Result<Vec<Gc<Object>>, EvaluationError> {
    match object {
        Object::Array(array) => Ok(array.elements.borrow().clone()),
        other => Err(wrong_type(location, name, "ARRAY", other)),
    }
}

pub(crate) fn builtin_len(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::String(string) => Ok(Object::integer(string.value.chars().count() as i64)),
        Object::Array(array) => Ok(Object::integer(array.len() as i64)),
        Object::Hash(hash) => Ok(Object::integer(hash.pairs.borrow().len() as i64)),
        other => Err(unsupported_argument(location, "len", other)),
    }
}

pub(crate) fn builtin_first(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let elements = expect_array(location, "first", &args[0])?;
    Ok(elements.first().cloned().unwrap_or_else(Object::null))
}

pub(crate) fn builtin_last(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let elements = expect_array(location, "last", &args[0])?;
    Ok(elements.last().cloned().unwrap_or_else(Object::null))
}

fn builtin_tail(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let elements = expect_array(location, "tail", &args[0])?;
    if elements.is_empty() {
        return Ok(Object::null());
    }
    Ok(Object::array(elements[1..].to_vec()))
}

/// Returns a new array; the argument is left untouched.
fn builtin_push(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let mut elements = expect_array(location, "push", &args[0])?;
    elements.push(args[1].clone());
    Ok(Object::array(elements))
}

pub(crate) fn builtin_keys(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Hash(hash) => Ok(Object::array(
            hash.pairs.borrow().iter().map(|pair| pair.key.clone()).collect(),
        )),
        other => Err(wrong_type(location, "keys", "HASH", other)),
    }
}

pub(crate) fn builtin_values(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Hash(hash) => Ok(Object::array(
            hash.pairs.borrow().iter().map(|pair| pair.value.clone()).collect(),
        )),
        other => Err(wrong_type(location, "values", "HASH", other)),
    }
}

fn builtin_typeof(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    Ok(Object::string(args[0].type_name()))
}

fn builtin_str(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::String(_) => Ok(args[0].clone()),
        other => Ok(Object::string(other.to_string())),
    }
}

fn builtin_int(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(_) => Ok(args[0].clone()),
        Object::Float(value) => Ok(Object::integer(*value as i64)),
        Object::String(string) => string
            .value
            .parse()
            .map(Object::integer)
            .map_err(|_| builtin_error(location, "could not convert string to integer")),
        other => Err(unsupported_argument(location, "int", other)),
    }
}

fn builtin_float(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(value) => Ok(Object::float(*value as f64)),
        Object::Float(_) => Ok(args[0].clone()),
        Object::String(string) => string
            .value
            .parse()
            .map(Object::float)
            .map_err(|_| builtin_error(location, "could not convert string to float")),
        other => Err(unsupported_argument(location, "float", other)),
    }
}

fn builtin_bool(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Boolean(_) => Ok(args[0].clone()),
        Object::String(string) => match string.value.as_str() {
            "true" => Ok(Object::boolean(true)),
            "false" => Ok(Object::boolean(false)),
            _ => Err(builtin_error(location, "could not convert string to boolean")),
        },
        other => Err(unsupported_argument(location, "bool", other)),
    }
}

const MAX_RANGE_LENGTH: i64 = 1 << 24;

fn builtin_range(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let end = expect_integer(location, "range", &args[0])?;
    if end > MAX_RANGE_LENGTH {
        return Err(builtin_error(
            location,
            format!("range length must be at most {}, got {}", MAX_RANGE_LENGTH, end),
        ));
    }
    Ok(Object::array((0..end).map(Object::integer).collect()))
}

/// `format("{0} and {1}", a, b)`: each `{i}` is replaced by argument `i` as
/// `str` would render it.
fn builtin_format(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    let Some((template, rest)) = args.split_first() else {
        return Err(builtin_error(
            location,
            "wrong number of arguments. got=0, want=1(at least)",
        ));
    };
    let mut formatted = expect_string(location, "format", template)?.to_owned();
    for (i, arg) in rest.iter().enumerate() {
        formatted = formatted.replace(&format!("{{{}}}", i), &arg.to_string());
    }
    Ok(Object::string(formatted))
}

fn math_abs(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(value) => Ok(Object::integer(value.wrapping_abs())),
        Object::Float(value) => Ok(Object::float(value.abs())),
        other => Err(unsupported_argument(location, "math.abs", other)),
    }
}

fn math_floor(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(_) => Ok(args[0].clone()),
        Object::Float(value) => Ok(Object::integer(value.floor() as i64)),
        other => Err(unsupported_argument(location, "math.floor", other)),
    }
}

fn math_ceil(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(_) => Ok(args[0].clone()),
        Object::Float(value) => Ok(Object::integer(value.ceil() as i64)),
        other => Err(unsupported_argument(location, "math.ceil", other)),
    }
}

fn math_sqrt(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Integer(value) => Ok(Object::float((*value as f64).sqrt())),
        Object::Float(value) => Ok(Object::float(value.sqrt())),
        other => Err(unsupported_argument(location, "math.sqrt", other)),
    }
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Float(value) => Some(*value),
        _ => None,
    }
}

fn pick_number(
    location: &Location,
    name: &str,
    args: Vec<Gc<Object>>,
    take_second: fn(f64, f64) -> bool,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let Some(first) = as_number(&args[0]) else {
        return Err(unsupported_argument(location, name, &args[0]));
    };
    let Some(second) = as_number(&args[1]) else {
        return Err(unsupported_argument(location, name, &args[1]));
    };
    if take_second(first, second) {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

fn math_min(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    pick_number(location, "math.min", args, |first, second| second < first)
}

fn math_max(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    pick_number(location, "math.max", args, |first, second| second > first)
}

pub(crate) fn strings_upper(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    Ok(Object::string(
        expect_string(location, "strings.upper", &args[0])?.to_uppercase(),
    ))
}

pub(crate) fn strings_lower(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    Ok(Object::string(
        expect_string(location, "strings.lower", &args[0])?.to_lowercase(),
    ))
}

pub(crate) fn strings_trim(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    Ok(Object::string(
        expect_string(location, "strings.trim", &args[0])?.trim(),
    ))
}

pub(crate) fn strings_split(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let value = expect_string(location, "strings.split", &args[0])?;
    let separator = expect_string(location, "strings.split", &args[1])?;
    let parts = if separator.is_empty() {
        value.chars().map(Object::string).collect()
    } else {
        value.split(separator).map(Object::string).collect()
    };
    Ok(Object::array(parts))
}

pub(crate) fn strings_join(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let elements = expect_array(location, "strings.join", &args[0])?;
    let separator = expect_string(location, "strings.join", &args[1])?;
    let joined = elements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator);
    Ok(Object::string(joined))
}

pub(crate) fn strings_contains(
    location: &Location,
    args: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let value = expect_string(location, "strings.contains", &args[0])?;
    let needle = expect_string(location, "strings.contains", &args[1])?;
    Ok(Object::boolean(value.contains(needle)))
}
