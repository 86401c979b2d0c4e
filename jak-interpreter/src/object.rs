use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use gc::{Finalize, Gc, GcCell, Trace};
use jak_core::ast;

use crate::environment::Environment;
use crate::error::{EvaluationError, Location};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Integer,
    Float,
    Boolean,
    String,
    Array,
    Hash,
    Function,
    Builtin,
    Quote,
    Macro,
    File,
    Null,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        use ObjectType::*;
        match self {
            Integer => "INTEGER",
            Float => "FLOAT",
            Boolean => "BOOLEAN",
            String => "STRING",
            Array => "ARRAY",
            Hash => "HASH",
            Function => "FUNCTION",
            Builtin => "BUILTIN",
            Quote => "QUOTE",
            Macro => "MACRO",
            File => "FILE",
            Null => "NULL",
        }
    }
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Trace, Finalize)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(StringObject),
    Array(Array),
    Hash(Hash),
    Function(Function),
    Builtin(BuiltinFunction),
    /// An unevaluated expression produced by `quote`.
    Quote(#[unsafe_ignore_trace] ast::Expression),
    Macro(Macro),
    File(FileHandle),
    Null,
}

thread_local! {
    static NULL: Gc<Object> = Gc::new(Object::Null);
    static TRUE: Gc<Object> = Gc::new(Object::Boolean(true));
    static FALSE: Gc<Object> = Gc::new(Object::Boolean(false));
}

impl Object {
    pub fn null() -> Gc<Object> {
        NULL.with(|x| x.clone())
    }
    pub fn boolean(value: bool) -> Gc<Object> {
        if value {
            TRUE.with(|x| x.clone())
        } else {
            FALSE.with(|x| x.clone())
        }
    }
    pub fn integer(value: i64) -> Gc<Object> {
        Gc::new(Object::Integer(value))
    }
    pub fn float(value: f64) -> Gc<Object> {
        Gc::new(Object::Float(value))
    }
    pub fn string(value: impl Into<String>) -> Gc<Object> {
        Gc::new(Object::String(StringObject::new(value.into())))
    }
    pub fn array(elements: Vec<Gc<Object>>) -> Gc<Object> {
        Gc::new(Object::Array(Array::new(elements)))
    }
    pub fn hash(pairs: HashPairs) -> Gc<Object> {
        Gc::new(Object::Hash(Hash::new(pairs)))
    }
    pub fn function(
        parameters: Vec<ast::Identifier>,
        body: ast::BlockStatement,
        env: Environment,
    ) -> Gc<Object> {
        Gc::new(Object::Function(Function {
            parameters,
            body,
            env,
        }))
    }
    pub fn macro_object(
        parameters: Vec<ast::Identifier>,
        body: ast::BlockStatement,
        env: Environment,
    ) -> Gc<Object> {
        Gc::new(Object::Macro(Macro {
            parameters,
            body,
            env,
        }))
    }
    pub fn quote(node: ast::Expression) -> Gc<Object> {
        Gc::new(Object::Quote(node))
    }
    pub fn builtin(name: &str, func: BuiltinFn) -> Gc<Object> {
        Gc::new(Object::Builtin(BuiltinFunction {
            name: name.into(),
            func,
        }))
    }
    pub fn file(path: &str, file: std::fs::File) -> Gc<Object> {
        Gc::new(Object::File(FileHandle {
            path: path.into(),
            file: RefCell::new(Some(file)),
        }))
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Float(_) => ObjectType::Float,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::String(_) => ObjectType::String,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Quote(_) => ObjectType::Quote,
            Object::Macro(_) => ObjectType::Macro,
            Object::File(_) => ObjectType::File,
            Object::Null => ObjectType::Null,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.object_type().as_str()
    }

    /// Truthiness used by conditions and the logical operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(value) => *value,
            Object::String(string) => !string.value.is_empty(),
            Object::Integer(value) => *value != 0,
            Object::Array(array) => !array.elements.borrow().is_empty(),
            Object::Hash(hash) => !hash.pairs.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        let value = match self {
            Object::Integer(value) => *value as u64,
            Object::Boolean(value) => u64::from(*value),
            Object::String(string) => fnv1a(string.value.as_bytes()),
            _ => return None,
        };
        Some(HashKey {
            kind: self.object_type(),
            value,
        })
    }

    pub fn as_iterable(&self) -> Option<&dyn Iterable> {
        match self {
            Object::String(string) => Some(string),
            Object::Array(array) => Some(array),
            Object::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    /// Inspect form of an element nested in an array or hash: strings are
    /// quoted there.
    fn fmt_nested(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::String(string) => write!(f, "\"{}\"", ast::escape_string(&string.value)),
            other => write!(f, "{}", other),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Float(value) => write!(f, "{}", ast::format_float(*value)),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(string) => write!(f, "{}", string.value),
            Object::Array(array) => {
                write!(f, "[")?;
                for (i, element) in array.elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Object::Hash(hash) => {
                write!(f, "{{")?;
                for (i, pair) in hash.pairs.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    pair.key.fmt_nested(f)?;
                    write!(f, ": ")?;
                    pair.value.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
            Object::Function(function) => {
                write!(f, "func(")?;
                write_parameters(f, &function.parameters)?;
                write!(f, ") {}", function.body)
            }
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::Quote(node) => write!(f, "{}", node),
            Object::Macro(macro_object) => {
                write!(f, "macro(")?;
                write_parameters(f, &macro_object.parameters)?;
                write!(f, ") {}", macro_object.body)
            }
            Object::File(handle) => write!(f, "<file {}>", handle.path),
            Object::Null => write!(f, "null"),
        }
    }
}

fn write_parameters(
    f: &mut std::fmt::Formatter<'_>,
    parameters: &[ast::Identifier],
) -> std::fmt::Result {
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", parameter.name)?;
    }
    Ok(())
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct HashKey {
    pub kind: ObjectType,
    pub value: u64,
}

#[derive(Debug, PartialEq, Clone, Trace, Finalize)]
pub struct HashPair {
    pub key: Gc<Object>,
    pub value: Gc<Object>,
}

/// Hash entries in insertion order, indexed by their `HashKey`.
#[derive(Debug, PartialEq, Clone, Default, Trace, Finalize)]
pub struct HashPairs {
    entries: Vec<HashPair>,
    #[unsafe_ignore_trace]
    index: HashMap<HashKey, usize>,
}

impl HashPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `key`, returning the previous value.
    pub fn insert(&mut self, key: HashKey, pair: HashPair) -> Option<Gc<Object>> {
        match self.index.get(&key) {
            Some(&position) => {
                let previous = std::mem::replace(&mut self.entries[position], pair);
                Some(previous.value.clone())
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(pair);
                None
            }
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&HashPair> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn remove(&mut self, key: &HashKey) -> Option<HashPair> {
        let position = self.index.remove(key)?;
        let pair = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(pair)
    }

    pub fn get_index(&self, position: usize) -> Option<&HashPair> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HashPair> {
        self.entries.iter()
    }
}

/// Cursor-based iteration used by `foreach`. `next` yields the element and
/// its index (or key, for hashes).
pub trait Iterable {
    fn reset(&self);
    fn next(&self) -> Option<(Gc<Object>, Gc<Object>)>;
}

#[derive(Debug, Trace, Finalize)]
pub struct StringObject {
    pub value: String,
    /// Byte offset of the next character.
    #[unsafe_ignore_trace]
    offset: Cell<usize>,
    #[unsafe_ignore_trace]
    position: Cell<usize>,
}

impl StringObject {
    pub fn new(value: String) -> Self {
        StringObject {
            value,
            offset: Cell::new(0),
            position: Cell::new(0),
        }
    }
}

impl PartialEq for StringObject {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Iterable for StringObject {
    fn reset(&self) {
        self.offset.set(0);
        self.position.set(0);
    }

    fn next(&self) -> Option<(Gc<Object>, Gc<Object>)> {
        let offset = self.offset.get();
        let ch = self.value.get(offset..)?.chars().next()?;
        let position = self.position.get();
        self.offset.set(offset + ch.len_utf8());
        self.position.set(position + 1);
        Some((Object::string(ch), Object::integer(position as i64)))
    }
}

#[derive(Debug, Trace, Finalize)]
pub struct Array {
    pub elements: GcCell<Vec<Gc<Object>>>,
    #[unsafe_ignore_trace]
    cursor: Cell<usize>,
}

impl Array {
    pub fn new(elements: Vec<Gc<Object>>) -> Self {
        Array {
            elements: GcCell::new(elements),
            cursor: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn get(&self, index: i64) -> Option<Gc<Object>> {
        let index = usize::try_from(index).ok()?;
        self.elements.borrow().get(index).cloned()
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        *self.elements.borrow() == *other.elements.borrow()
    }
}

impl Iterable for Array {
    fn reset(&self) {
        self.cursor.set(0);
    }

    fn next(&self) -> Option<(Gc<Object>, Gc<Object>)> {
        let position = self.cursor.get();
        let element = self.elements.borrow().get(position).cloned()?;
        self.cursor.set(position + 1);
        Some((element, Object::integer(position as i64)))
    }
}

#[derive(Debug, Trace, Finalize)]
pub struct Hash {
    pub pairs: GcCell<HashPairs>,
    #[unsafe_ignore_trace]
    cursor: Cell<usize>,
}

impl Hash {
    pub fn new(pairs: HashPairs) -> Self {
        Hash {
            pairs: GcCell::new(pairs),
            cursor: Cell::new(0),
        }
    }
}

impl PartialEq for Hash {
    fn eq(&self, other: &Self) -> bool {
        *self.pairs.borrow() == *other.pairs.borrow()
    }
}

impl Iterable for Hash {
    fn reset(&self) {
        self.cursor.set(0);
    }

    fn next(&self) -> Option<(Gc<Object>, Gc<Object>)> {
        let position = self.cursor.get();
        let entry = self
            .pairs
            .borrow()
            .get_index(position)
            .map(|pair| (pair.value.clone(), pair.key.clone()))?;
        self.cursor.set(position + 1);
        Some(entry)
    }
}

#[derive(Trace, Finalize)]
pub struct Function {
    #[unsafe_ignore_trace]
    pub parameters: Vec<ast::Identifier>,
    #[unsafe_ignore_trace]
    pub body: ast::BlockStatement,
    pub env: Environment,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters && self.body == other.body && self.env == other.env
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters.len())
            .field("ptr", &(self as *const Function as usize))
            .finish()
    }
}

#[derive(Trace, Finalize)]
pub struct Macro {
    #[unsafe_ignore_trace]
    pub parameters: Vec<ast::Identifier>,
    #[unsafe_ignore_trace]
    pub body: ast::BlockStatement,
    pub env: Environment,
}

impl PartialEq for Macro {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters && self.body == other.body && self.env == other.env
    }
}

impl std::fmt::Debug for Macro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Macro")
            .field("ptr", &(self as *const Macro as usize))
            .finish()
    }
}

/// Signature shared by every built-in: the call site and the already
/// evaluated arguments.
pub type BuiltinFn = fn(&Location, Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError>;

#[derive(Clone, Trace, Finalize)]
pub struct BuiltinFunction {
    #[unsafe_ignore_trace]
    pub name: Rc<str>,
    #[unsafe_ignore_trace]
    pub func: BuiltinFn,
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .finish()
    }
}

/// An open host file; `None` once closed.
#[derive(Trace, Finalize)]
pub struct FileHandle {
    #[unsafe_ignore_trace]
    pub path: Rc<str>,
    #[unsafe_ignore_trace]
    pub file: RefCell<Option<std::fs::File>>,
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("open", &self.file.borrow().is_some())
            .finish()
    }
}

/// Non-local exits travelling up the evaluator through the `Err` channel.
#[derive(Debug, PartialEq)]
pub enum QuickReturn {
    Return(Gc<Object>),
    Error(EvaluationError),
}

impl From<EvaluationError> for QuickReturn {
    fn from(value: EvaluationError) -> Self {
        QuickReturn::Error(value)
    }
}
