use std::fmt::Display;
use std::rc::Rc;

use jak_core::parser::ParseError;
use jak_core::token::Token;

use crate::object::ObjectType;

/// Where an evaluation error was raised: file name, 1-based line and the
/// byte span of the originating token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Location {
    pub file: Rc<str>,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Location {
    pub fn new(file: Rc<str>, token: &Token) -> Self {
        Location {
            file,
            line: token.line,
            start: token.start,
            end: token.end,
        }
    }

    pub fn error(&self, kind: ErrorKind) -> EvaluationError {
        EvaluationError {
            kind,
            location: self.clone(),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "File: {}: Line: {}", self.file, self.line)
    }
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("{location}: {kind}")]
pub struct EvaluationError {
    pub kind: ErrorKind,
    pub location: Location,
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ErrorKind {
    #[error("identifier not found: {0}")]
    UnknownIdentifier(Rc<str>),
    #[error("Variable `{0}` already defined")]
    AlreadyDefined(Rc<str>),
    #[error("Variable `{0}` not defined")]
    NotDefined(Rc<str>),
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: &'static str,
        right: ObjectType,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },
    #[error("division by zero: {left} {operator} {right}")]
    DivisionByZero {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },
    #[error("not a function: {0}")]
    NotAFunction(ObjectType),
    #[error("unusable as hash key: {0}")]
    UnusableAsHashKey(ObjectType),
    #[error("index operator not supported: {0}")]
    IndexNotSupported(ObjectType),
    #[error("{0} object doesn't implement the Iterable interface")]
    NotIterable(ObjectType),
    #[error("unknown method `{method}` for {receiver}")]
    UnknownMethod {
        receiver: ObjectType,
        method: Rc<str>,
    },
    #[error("{0} is not a number")]
    InvalidPostfixOperand(Rc<str>),
    #[error("quote: {0}")]
    Quote(String),
    #[error("macro: {0}")]
    Macro(String),
    #[error("could not import {path}: {reason}")]
    Import { path: String, reason: String },
    #[error("{0}")]
    Builtin(String),
    #[error("{0}")]
    Io(String),
}

/// Failure of a full parse-and-evaluate run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{}", join_lines(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

fn join_lines(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
