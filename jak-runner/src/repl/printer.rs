use gc::Gc;
use jak_core::parser::DEFAULT_FILE_NAME;
use jak_interpreter::{Object, RunError};

use crate::diagnostics;

pub trait Printer {
    type Object;

    fn print(&mut self, source: &str, object: Self::Object);
}

pub struct InterpreterPrinter {}

impl Printer for InterpreterPrinter {
    type Object = Result<Gc<Object>, RunError>;

    fn print(&mut self, source: &str, object: Self::Object) {
        match object {
            Ok(object) => {
                if let Some(output) = render_value(&object) {
                    println!("{}", output);
                }
            }
            Err(err) => diagnostics::report(DEFAULT_FILE_NAME, source, &err),
        }
    }
}

/// `null` results are not echoed.
fn render_value(object: &Object) -> Option<String> {
    match object {
        Object::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_value() {
        let tests = vec![
            (Object::null(), None),
            (Object::integer(3), Some("3")),
            (Object::string("hi"), Some("hi")),
            (
                Object::array(vec![Object::string("a"), Object::boolean(true)]),
                Some("[\"a\", true]"),
            ),
        ];

        for (object, expected) in tests {
            assert_eq!(render_value(&object).as_deref(), expected);
        }
    }
}
