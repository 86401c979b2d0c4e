use gc::Gc;
use jak_interpreter::{Environment, Object, RunError};

use crate::host::{self, FsLoader};
use crate::DebugOptions;

pub trait Evaluator {
    type Object;

    fn evaluate(&mut self, source: &str) -> Self::Object;
}

/// Evaluates every line in the same global environment, so bindings and
/// macros survive from one input to the next.
pub struct InterpreterEvaluator {
    evaluator: jak_interpreter::Evaluator,
    environment: Environment,
    options: DebugOptions,
}

impl InterpreterEvaluator {
    pub fn new(options: DebugOptions) -> Self {
        Self {
            evaluator: jak_interpreter::Evaluator::new(host::builtins())
                .with_loader(Box::new(FsLoader)),
            environment: Environment::new(),
            options,
        }
    }
}

impl Evaluator for InterpreterEvaluator {
    type Object = Result<Gc<Object>, RunError>;

    fn evaluate(&mut self, source: &str) -> Self::Object {
        self.options.dump(source);
        self.evaluator.run(source, &self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_survives_between_lines() {
        let mut evaluator = InterpreterEvaluator::new(DebugOptions::default());
        let tests = vec![
            ("var x = 5;", Object::null()),
            ("var add = func(a, b) { a + b };", Object::null()),
            ("add(x, 10)", Object::integer(15)),
            ("mut x = x * 2;", Object::null()),
            ("x", Object::integer(10)),
        ];

        for (input, expected) in tests {
            assert_eq!(evaluator.evaluate(input).unwrap(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_macros_survive_between_lines() {
        let mut evaluator = InterpreterEvaluator::new(DebugOptions::default());
        evaluator
            .evaluate("var twice = macro(x) { quote(unquote(x) + unquote(x)) };")
            .unwrap();
        assert_eq!(evaluator.evaluate("twice(21)").unwrap(), Object::integer(42));
    }

    #[test]
    fn test_errors_keep_the_session() {
        let mut evaluator = InterpreterEvaluator::new(DebugOptions::default());
        evaluator.evaluate("var x = 1;").unwrap();
        assert!(evaluator.evaluate("var x = 2;").is_err());
        assert!(evaluator.evaluate("var = ;").is_err());
        assert_eq!(evaluator.evaluate("x").unwrap(), Object::integer(1));
    }
}
