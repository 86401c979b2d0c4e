//! Methods reachable through `receiver.method(...)`. Each entry reuses a
//! built-in where one exists, with the receiver passed as its first argument.

use gc::Gc;

use crate::builtins::{self, builtin_error, check_arity, unsupported_argument};
use crate::error::{ErrorKind, EvaluationError, Location};
use crate::object::{BuiltinFn, Object};

/// Name, argument count excluding the receiver, implementation.
type MethodTable = &'static [(&'static str, usize, BuiltinFn)];

const STRING_METHODS: MethodTable = &[
    ("len", 0, builtins::builtin_len),
    ("upper", 0, builtins::strings_upper),
    ("lower", 0, builtins::strings_lower),
    ("trim", 0, builtins::strings_trim),
    ("split", 1, builtins::strings_split),
    ("contains", 1, builtins::strings_contains),
];

const ARRAY_METHODS: MethodTable = &[
    ("len", 0, builtins::builtin_len),
    ("push", 1, array_push),
    ("pop", 0, array_pop),
    ("first", 0, builtins::builtin_first),
    ("last", 0, builtins::builtin_last),
    ("join", 1, builtins::strings_join),
];

const HASH_METHODS: MethodTable = &[
    ("len", 0, builtins::builtin_len),
    ("keys", 0, builtins::builtin_keys),
    ("values", 0, builtins::builtin_values),
    ("has", 1, hash_has),
    ("delete", 1, hash_delete),
];

pub fn call_method(
    location: &Location,
    receiver: Gc<Object>,
    method: &str,
    arguments: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    let table: MethodTable = match receiver.as_ref() {
        Object::String(_) => STRING_METHODS,
        Object::Array(_) => ARRAY_METHODS,
        Object::Hash(_) => HASH_METHODS,
        _ => &[],
    };

    let Some((_, arity, func)) = table.iter().find(|(name, _, _)| *name == method) else {
        return Err(location.error(ErrorKind::UnknownMethod {
            receiver: receiver.object_type(),
            method: method.into(),
        }));
    };

    if arguments.len() != *arity {
        return Err(builtin_error(
            location,
            format!(
                "wrong number of arguments to `{}`. got={}, want={}",
                method,
                arguments.len(),
                arity
            ),
        ));
    }

    let mut call_arguments = Vec::with_capacity(arguments.len() + 1);
    call_arguments.push(receiver);
    call_arguments.extend(arguments);
    func(location, call_arguments)
}

/// Appends in place and hands back the receiver so calls can be chained.
fn array_push(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    match args[0].as_ref() {
        Object::Array(array) => {
            array.elements.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }
        other => Err(unsupported_argument(location, "push", other)),
    }
}

fn array_pop(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    match args[0].as_ref() {
        Object::Array(array) => Ok(array
            .elements
            .borrow_mut()
            .pop()
            .unwrap_or_else(Object::null)),
        other => Err(unsupported_argument(location, "pop", other)),
    }
}

fn hash_has(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let Object::Hash(hash) = args[0].as_ref() else {
        return Err(unsupported_argument(location, "has", &args[0]));
    };
    let key = args[1]
        .hash_key()
        .ok_or_else(|| location.error(ErrorKind::UnusableAsHashKey(args[1].object_type())))?;
    Ok(Object::boolean(hash.pairs.borrow().get(&key).is_some()))
}

/// Removes the entry and returns its value, or null when there was none.
fn hash_delete(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let Object::Hash(hash) = args[0].as_ref() else {
        return Err(unsupported_argument(location, "delete", &args[0]));
    };
    let key = args[1]
        .hash_key()
        .ok_or_else(|| location.error(ErrorKind::UnusableAsHashKey(args[1].object_type())))?;
    let removed = hash.pairs.borrow_mut().remove(&key);
    Ok(removed.map(|pair| pair.value.clone()).unwrap_or_else(Object::null))
}
