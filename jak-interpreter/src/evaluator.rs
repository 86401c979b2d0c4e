use std::rc::Rc;

use gc::Gc;
use jak_core::ast::{
    self, AssignKind, Expression, InfixOperationKind, PostfixOperationKind, PrefixOperationKind,
};
use jak_core::lexer::Tokenizer;
use jak_core::parser::{Parser, DEFAULT_FILE_NAME};
use jak_core::token::Token;
use tracing::{debug, trace};

use crate::builtins::Builtins;
use crate::environment::Environment;
use crate::error::{ErrorKind, EvaluationError, Location, RunError};
use crate::loader::{NoLoader, SourceLoader};
use crate::methods;
use crate::object::{HashPair, HashPairs, Object, QuickReturn};

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Tree-walking evaluator. Holds the built-in table, the loader used by
/// `use` statements and the name of the file being evaluated.
pub struct Evaluator {
    builtins: Builtins,
    loader: Box<dyn SourceLoader>,
    file_name: Rc<str>,
}

impl Evaluator {
    pub fn new(builtins: Builtins) -> Self {
        Evaluator {
            builtins,
            loader: Box::new(NoLoader),
            file_name: DEFAULT_FILE_NAME.into(),
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<Rc<str>>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn file_name(&self) -> &Rc<str> {
        &self.file_name
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Parses `source`, expands its macros and evaluates it in `environment`.
    pub fn run(&mut self, source: &str, environment: &Environment) -> Result<Gc<Object>, RunError> {
        let parser = Parser::with_file_name(Tokenizer::new(source), self.file_name.clone());
        let mut program = parser.parse().map_err(RunError::Parse)?;
        self.define_macros(&mut program, environment);
        let program = self.expand_macros(program, environment)?;
        Ok(self.eval_program(&program, environment)?)
    }

    pub fn eval_program(
        &mut self,
        program: &ast::Program,
        environment: &Environment,
    ) -> Result<Gc<Object>, EvaluationError> {
        let mut output = Object::null();
        for statement in &program.statements {
            match self.eval_statement(statement, environment) {
                Err(QuickReturn::Return(value)) => return Ok(value),
                Err(QuickReturn::Error(error)) => return Err(error),
                Ok(object) => output = object,
            };
        }
        Ok(output)
    }

    pub(crate) fn location(&self, token: &Token) -> Location {
        Location::new(self.file_name.clone(), token)
    }

    fn eval_statement(
        &mut self,
        statement: &ast::Statement,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        match statement {
            ast::Statement::Expression(expression) => self.eval_expression(expression, environment),
            ast::Statement::Return(statement) => {
                let value = match &statement.value {
                    Some(value) => self.eval_expression(value, environment)?,
                    None => Object::null(),
                };
                Err(QuickReturn::Return(value))
            }
            ast::Statement::Assign(statement) => self.eval_assign_statement(statement, environment),
            ast::Statement::Import(statement) => self.eval_import_statement(statement, environment),
        }
    }

    fn eval_assign_statement(
        &mut self,
        statement: &ast::AssignStatement,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        let value = self.eval_expression(&statement.value, environment)?;
        let name = &statement.identifier.name;
        match statement.kind {
            AssignKind::Declare => {
                if environment.contains_local(name) {
                    return Err(self
                        .location(&statement.identifier.token)
                        .error(ErrorKind::AlreadyDefined(name.clone()))
                        .into());
                }
                environment.set(name.clone(), value);
            }
            AssignKind::Mutate => {
                if !environment.assign(name, value) {
                    return Err(self
                        .location(&statement.identifier.token)
                        .error(ErrorKind::NotDefined(name.clone()))
                        .into());
                }
            }
        }
        Ok(Object::null())
    }

    /// Loads, parses and evaluates the target into the current environment.
    /// Errors inside it are reported against the imported path.
    fn eval_import_statement(
        &mut self,
        statement: &ast::ImportStatement,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        let location = self.location(&statement.token);
        let path = statement.path.as_str();
        let import_error = |reason: String| {
            location.error(ErrorKind::Import {
                path: path.to_owned(),
                reason,
            })
        };

        debug!(path, "importing");
        let source = self
            .loader
            .load(path)
            .map_err(|err| import_error(err.to_string()))?;

        let parser = Parser::with_file_name(Tokenizer::new(&source), path);
        let program = parser.parse().map_err(|errors| {
            import_error(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let importer = std::mem::replace(&mut self.file_name, path.into());
        let result = self.eval_imported(program, environment);
        self.file_name = importer;
        result?;
        Ok(Object::null())
    }

    fn eval_imported(
        &mut self,
        mut program: ast::Program,
        environment: &Environment,
    ) -> Result<Gc<Object>, EvaluationError> {
        self.define_macros(&mut program, environment);
        let program = self.expand_macros(program, environment)?;
        self.eval_program(&program, environment)
    }

    pub(crate) fn eval_block_statement(
        &mut self,
        block: &ast::BlockStatement,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        let mut result = Object::null();
        for statement in &block.statements {
            result = self.eval_statement(statement, environment)?;
        }
        Ok(result)
    }

    pub(crate) fn eval_expression(
        &mut self,
        expression: &Expression,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expression_inner(expression, environment)
        })
    }

    fn eval_expression_inner(
        &mut self,
        expression: &Expression,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        match expression {
            Expression::IntegerLiteral(value) => Ok(Object::integer(*value)),
            Expression::FloatLiteral(value) => Ok(Object::float(*value)),
            Expression::BooleanLiteral(value) => Ok(Object::boolean(*value)),
            Expression::StringLiteral(value) => Ok(Object::string(value.clone())),
            Expression::NullLiteral => Ok(Object::null()),
            Expression::ArrayLiteral(elements) => Ok(Object::array(
                self.eval_expressions(elements, environment)?,
            )),
            Expression::HashLiteral { token, pairs } => {
                let mut hash = HashPairs::new();
                for (key, value) in pairs {
                    let key = self.eval_expression(key, environment)?;
                    let value = self.eval_expression(value, environment)?;
                    let Some(hash_key) = key.hash_key() else {
                        return Err(self
                            .location(token)
                            .error(ErrorKind::UnusableAsHashKey(key.object_type()))
                            .into());
                    };
                    hash.insert(hash_key, HashPair { key, value });
                }
                Ok(Object::hash(hash))
            }
            Expression::Identifier(identifier) => environment
                .get(&identifier.name)
                .or_else(|| self.builtins.get(&identifier.name))
                .ok_or_else(|| {
                    self.location(&identifier.token)
                        .error(ErrorKind::UnknownIdentifier(identifier.name.clone()))
                        .into()
                }),
            Expression::PrefixOperation {
                token,
                operator,
                right,
            } => {
                let right = self.eval_expression(right, environment)?;
                eval_prefix_operation(operator, right)
                    .map_err(|kind| self.location(token).error(kind).into())
            }
            Expression::InfixOperation {
                token,
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, environment)?;
                let right = self.eval_expression(right, environment)?;
                eval_infix_operation(operator, left, right)
                    .map_err(|kind| self.location(token).error(kind).into())
            }
            Expression::PostfixOperation {
                token,
                operator,
                identifier,
            } => self.eval_postfix_operation(token, operator, identifier, environment),
            Expression::IfExpression {
                condition,
                consequence,
                elifs,
                alternative,
            } => {
                if self.eval_expression(condition, environment)?.is_truthy() {
                    return self.eval_block_statement(consequence, environment);
                }
                for elif in elifs {
                    if self.eval_expression(&elif.condition, environment)?.is_truthy() {
                        return self.eval_block_statement(&elif.consequence, environment);
                    }
                }
                match alternative {
                    Some(alternative) => self.eval_block_statement(alternative, environment),
                    None => Ok(Object::null()),
                }
            }
            // Runs the body until the condition becomes truthy.
            Expression::ForLoopExpression { condition, body } => {
                loop {
                    if self.eval_expression(condition, environment)?.is_truthy() {
                        break;
                    }
                    self.eval_block_statement(body, environment)?;
                }
                Ok(Object::null())
            }
            Expression::ForeachExpression {
                token,
                index,
                value,
                iterable,
                body,
            } => {
                let object = self.eval_expression(iterable, environment)?;
                let Some(iterable) = object.as_iterable() else {
                    return Err(self
                        .location(token)
                        .error(ErrorKind::NotIterable(object.object_type()))
                        .into());
                };

                let scope = Environment::new_enclosed(environment);
                iterable.reset();
                while let Some((element, position)) = iterable.next() {
                    scope.set(value.name.clone(), element);
                    if let Some(index) = index {
                        scope.set(index.name.clone(), position);
                    }
                    self.eval_block_statement(body, &scope)?;
                }
                Ok(Object::null())
            }
            Expression::SwitchExpression { subject, arms, .. } => {
                let subject = self.eval_expression(subject, environment)?;
                for arm in arms {
                    let Some(pattern) = &arm.pattern else {
                        continue;
                    };
                    let candidate = self.eval_expression(pattern, environment)?;
                    if candidate.object_type() == subject.object_type()
                        && candidate.to_string() == subject.to_string()
                    {
                        return self.eval_block_statement(&arm.body, environment);
                    }
                }
                match arms.iter().find(|arm| arm.is_default()) {
                    Some(arm) => self.eval_block_statement(&arm.body, environment),
                    None => Ok(Object::null()),
                }
            }
            Expression::FunctionLiteral { parameters, body } => Ok(Object::function(
                parameters.clone(),
                body.clone(),
                environment.clone(),
            )),
            Expression::MacroLiteral { parameters, body } => Ok(Object::macro_object(
                parameters.clone(),
                body.clone(),
                environment.clone(),
            )),
            Expression::CallExpression {
                token,
                function,
                arguments,
            } => {
                if matches!(function.as_ref(), Expression::Identifier(identifier) if &*identifier.name == "quote")
                {
                    return self.eval_quote(token, arguments, environment);
                }
                let function = self.eval_expression(function, environment)?;
                let arguments = self.eval_expressions(arguments, environment)?;
                self.apply_function(token, function, arguments)
            }
            Expression::IndexExpression { token, left, index } => {
                let left = self.eval_expression(left, environment)?;
                let index = self.eval_expression(index, environment)?;
                eval_index_expression(left, index)
                    .map_err(|kind| self.location(token).error(kind).into())
            }
            Expression::ObjectCallExpression {
                token,
                receiver,
                method,
                arguments,
            } => {
                let receiver = self.eval_expression(receiver, environment)?;
                let arguments = self.eval_expressions(arguments, environment)?;
                methods::call_method(&self.location(token), receiver, &method.name, arguments)
                    .map_err(QuickReturn::Error)
            }
        }
    }

    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        environment: &Environment,
    ) -> Result<Vec<Gc<Object>>, QuickReturn> {
        let mut result = Vec::with_capacity(expressions.len());
        for expression in expressions {
            result.push(self.eval_expression(expression, environment)?);
        }
        Ok(result)
    }

    /// Missing arguments are bound to null; extra ones are dropped.
    fn apply_function(
        &mut self,
        token: &Token,
        function: Gc<Object>,
        arguments: Vec<Gc<Object>>,
    ) -> Result<Gc<Object>, QuickReturn> {
        match function.as_ref() {
            Object::Function(function) => {
                let scope = Environment::new_enclosed(&function.env);
                for (i, parameter) in function.parameters.iter().enumerate() {
                    let argument = arguments.get(i).cloned().unwrap_or_else(Object::null);
                    scope.set(parameter.name.clone(), argument);
                }
                match self.eval_block_statement(&function.body, &scope) {
                    Ok(value) | Err(QuickReturn::Return(value)) => Ok(value),
                    Err(error) => Err(error),
                }
            }
            Object::Builtin(builtin) => {
                trace!(name = %builtin.name, arguments = arguments.len(), "calling builtin");
                (builtin.func)(&self.location(token), arguments).map_err(QuickReturn::Error)
            }
            other => Err(self
                .location(token)
                .error(ErrorKind::NotAFunction(other.object_type()))
                .into()),
        }
    }

    /// Rebinds the name with mutate semantics and yields the previous value.
    fn eval_postfix_operation(
        &mut self,
        token: &Token,
        operator: &PostfixOperationKind,
        identifier: &ast::Identifier,
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        let name = &identifier.name;
        let Some(current) = environment.get(name) else {
            return Err(self
                .location(token)
                .error(ErrorKind::UnknownIdentifier(name.clone()))
                .into());
        };

        let step = match operator {
            PostfixOperationKind::Increment => 1,
            PostfixOperationKind::Decrement => -1,
        };
        let updated = match current.as_ref() {
            Object::Integer(value) => Object::integer(value.wrapping_add(step)),
            Object::Float(value) => Object::float(value + step as f64),
            _ => {
                return Err(self
                    .location(token)
                    .error(ErrorKind::InvalidPostfixOperand(name.clone()))
                    .into());
            }
        };
        environment.assign(name, updated);
        Ok(current)
    }
}

fn eval_prefix_operation(
    operator: &PrefixOperationKind,
    right: Gc<Object>,
) -> Result<Gc<Object>, ErrorKind> {
    match (operator, right.as_ref()) {
        (PrefixOperationKind::Bang, Object::Boolean(value)) => Ok(Object::boolean(!value)),
        (PrefixOperationKind::Bang, Object::Null) => Ok(Object::boolean(true)),
        (PrefixOperationKind::Bang, _) => Ok(Object::boolean(false)),
        (PrefixOperationKind::Minus, Object::Integer(value)) => {
            Ok(Object::integer(value.wrapping_neg()))
        }
        (PrefixOperationKind::Minus, Object::Float(value)) => Ok(Object::float(-value)),
        (PrefixOperationKind::Minus, _) => Err(ErrorKind::UnknownPrefixOperator {
            operator: operator.to_str(),
            right: right.object_type(),
        }),
    }
}

fn eval_infix_operation(
    operator: &InfixOperationKind,
    left: Gc<Object>,
    right: Gc<Object>,
) -> Result<Gc<Object>, ErrorKind> {
    use InfixOperationKind::*;

    // Both operands are already evaluated; there is no short-circuit.
    if let And | Or = operator {
        let (left, right) = (left.is_truthy(), right.is_truthy());
        let value = match operator {
            And => left && right,
            _ => left || right,
        };
        return Ok(Object::boolean(value));
    }

    let divides_by_zero = match (operator, left.as_ref(), right.as_ref()) {
        (Divide | Modulo, Object::Integer(_), Object::Integer(0)) => true,
        (Divide, Object::Integer(_) | Object::Float(_), Object::Float(divisor)) => *divisor == 0.0,
        (Divide, Object::Float(_), Object::Integer(0)) => true,
        _ => false,
    };
    if divides_by_zero {
        return Err(ErrorKind::DivisionByZero {
            left: left.object_type(),
            operator: operator.to_str(),
            right: right.object_type(),
        });
    }

    let result = match (left.as_ref(), right.as_ref()) {
        (Object::Integer(l), Object::Integer(r)) => integer_infix(operator, *l, *r),
        (Object::Float(l), Object::Float(r)) => float_infix(operator, *l, *r),
        (Object::Integer(l), Object::Float(r)) => float_infix(operator, *l as f64, *r),
        (Object::Float(l), Object::Integer(r)) => float_infix(operator, *l, *r as f64),
        (Object::String(l), Object::String(r)) => string_infix(operator, &l.value, &r.value),
        _ => match operator {
            Equal => Some(Object::boolean(Gc::ptr_eq(&left, &right))),
            NotEqual => Some(Object::boolean(!Gc::ptr_eq(&left, &right))),
            _ => None,
        },
    };

    result.ok_or_else(|| {
        let (left, right) = (left.object_type(), right.object_type());
        let operator = operator.to_str();
        if left != right {
            ErrorKind::TypeMismatch {
                left,
                operator,
                right,
            }
        } else {
            ErrorKind::UnknownInfixOperator {
                left,
                operator,
                right,
            }
        }
    })
}

/// Overflow wraps. `^` goes through `f64` and saturates on the way back.
fn integer_infix(operator: &InfixOperationKind, left: i64, right: i64) -> Option<Gc<Object>> {
    use InfixOperationKind::*;
    let object = match operator {
        Plus => Object::integer(left.wrapping_add(right)),
        Minus => Object::integer(left.wrapping_sub(right)),
        Multiply => Object::integer(left.wrapping_mul(right)),
        Divide => Object::integer(left.wrapping_div(right)),
        Modulo => Object::integer(left.wrapping_rem(right)),
        Power => Object::integer((left as f64).powf(right as f64) as i64),
        LessThan => Object::boolean(left < right),
        GreaterThan => Object::boolean(left > right),
        LessEqual => Object::boolean(left <= right),
        GreaterEqual => Object::boolean(left >= right),
        Equal => Object::boolean(left == right),
        NotEqual => Object::boolean(left != right),
        And | Or => return None,
    };
    Some(object)
}

fn float_infix(operator: &InfixOperationKind, left: f64, right: f64) -> Option<Gc<Object>> {
    use InfixOperationKind::*;
    let object = match operator {
        Plus => Object::float(left + right),
        Minus => Object::float(left - right),
        Multiply => Object::float(left * right),
        Divide => Object::float(left / right),
        LessThan => Object::boolean(left < right),
        GreaterThan => Object::boolean(left > right),
        LessEqual => Object::boolean(left <= right),
        GreaterEqual => Object::boolean(left >= right),
        Equal => Object::boolean(left == right),
        NotEqual => Object::boolean(left != right),
        Modulo | Power | And | Or => return None,
    };
    Some(object)
}

fn string_infix(operator: &InfixOperationKind, left: &str, right: &str) -> Option<Gc<Object>> {
    match operator {
        InfixOperationKind::Plus => Some(Object::string(format!("{}{}", left, right))),
        InfixOperationKind::Equal => Some(Object::boolean(left == right)),
        InfixOperationKind::NotEqual => Some(Object::boolean(left != right)),
        _ => None,
    }
}

fn eval_index_expression(left: Gc<Object>, index: Gc<Object>) -> Result<Gc<Object>, ErrorKind> {
    match (left.as_ref(), index.as_ref()) {
        (Object::Array(array), Object::Integer(position)) => {
            Ok(array.get(*position).unwrap_or_else(Object::null))
        }
        (Object::Hash(hash), _) => {
            let key = index
                .hash_key()
                .ok_or_else(|| ErrorKind::UnusableAsHashKey(index.object_type()))?;
            Ok(hash
                .pairs
                .borrow()
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or_else(Object::null))
        }
        _ => Err(ErrorKind::IndexNotSupported(left.object_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::object::ObjectType;

    fn run(input: &str) -> Result<Gc<Object>, RunError> {
        Evaluator::new(Builtins::standard()).run(input, &Environment::new())
    }

    fn test_evaluation(inputs: Vec<(&str, Result<Gc<Object>, ErrorKind>)>) {
        for (input, expected) in inputs {
            let result = run(input).map_err(|error| match error {
                RunError::Evaluation(error) => error.kind,
                RunError::Parse(errors) => panic!("parse errors in {:?}: {:?}", input, errors),
            });

            assert_eq!(result, expected, "input: {}", input);
        }
    }

    fn mismatch(left: ObjectType, operator: &'static str, right: ObjectType) -> ErrorKind {
        ErrorKind::TypeMismatch {
            left,
            operator,
            right,
        }
    }

    #[test]
    fn test_literal() {
        let inputs = vec![
            ("5;", Ok(Object::integer(5))),
            ("2.5;", Ok(Object::float(2.5))),
            ("true;", Ok(Object::boolean(true))),
            ("false;", Ok(Object::boolean(false))),
            ("\"hello\";", Ok(Object::string("hello"))),
            ("null;", Ok(Object::null())),
            ("", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_prefix_operations() {
        let inputs = vec![
            ("-10;", Ok(Object::integer(-10))),
            ("--5;", Ok(Object::integer(5))),
            ("-1.5;", Ok(Object::float(-1.5))),
            ("!false;", Ok(Object::boolean(true))),
            ("!!true;", Ok(Object::boolean(true))),
            ("!null;", Ok(Object::boolean(true))),
            ("!5;", Ok(Object::boolean(false))),
            ("!0;", Ok(Object::boolean(false))),
            ("!\"\";", Ok(Object::boolean(false))),
            (
                "-true;",
                Err(ErrorKind::UnknownPrefixOperator {
                    operator: "-",
                    right: ObjectType::Boolean,
                }),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_integer_arithmetic() {
        let inputs = vec![
            ("5 + 5 + 5 + 5 - 10", Ok(Object::integer(10))),
            ("2 * 2 * 2 * 2 * 2", Ok(Object::integer(32))),
            ("-50 + 100 + -50", Ok(Object::integer(0))),
            ("20 + 2 * -10", Ok(Object::integer(0))),
            ("3 * (3 * 3) + 10", Ok(Object::integer(37))),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", Ok(Object::integer(50))),
            ("7 / 2", Ok(Object::integer(3))),
            ("-7 / 2", Ok(Object::integer(-3))),
            ("7 % 3", Ok(Object::integer(1))),
            ("2 ^ 10", Ok(Object::integer(1024))),
            ("2 ^ -1", Ok(Object::integer(0))),
            ("2 ^ 3 * 2", Ok(Object::integer(16))),
            ("9223372036854775807 + 1", Ok(Object::integer(i64::MIN))),
            ("2 ^ 100", Ok(Object::integer(i64::MAX))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_division_by_zero() {
        let zero = |left, right| ErrorKind::DivisionByZero {
            left,
            operator: "/",
            right,
        };
        let inputs = vec![
            ("1 / 0", Err(zero(ObjectType::Integer, ObjectType::Integer))),
            ("1.0 / 0.0", Err(zero(ObjectType::Float, ObjectType::Float))),
            ("1 / 0.0", Err(zero(ObjectType::Integer, ObjectType::Float))),
            ("1.5 / 0", Err(zero(ObjectType::Float, ObjectType::Integer))),
            (
                "5 % 0",
                Err(ErrorKind::DivisionByZero {
                    left: ObjectType::Integer,
                    operator: "%",
                    right: ObjectType::Integer,
                }),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_float_arithmetic() {
        let inputs = vec![
            ("1.5 + 1.5", Ok(Object::float(3.0))),
            ("1 + 0.5", Ok(Object::float(1.5))),
            ("0.5 * 4", Ok(Object::float(2.0))),
            ("1 / 4.0", Ok(Object::float(0.25))),
            ("2.5 > 2", Ok(Object::boolean(true))),
            ("2 <= 2.0", Ok(Object::boolean(true))),
            ("1.0 == 1", Ok(Object::boolean(true))),
            (
                "1.5 % 1.0",
                Err(ErrorKind::UnknownInfixOperator {
                    left: ObjectType::Float,
                    operator: "%",
                    right: ObjectType::Float,
                }),
            ),
            (
                "2 ^ 0.5",
                Err(mismatch(ObjectType::Integer, "^", ObjectType::Float)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_comparisons() {
        let inputs = vec![
            ("1 < 2", Ok(Object::boolean(true))),
            ("1 > 2", Ok(Object::boolean(false))),
            ("1 >= 1", Ok(Object::boolean(true))),
            ("1 == 1", Ok(Object::boolean(true))),
            ("1 != 1", Ok(Object::boolean(false))),
            ("true == true", Ok(Object::boolean(true))),
            ("true != false", Ok(Object::boolean(true))),
            ("(1 < 2) == true", Ok(Object::boolean(true))),
            ("null == null", Ok(Object::boolean(true))),
            ("\"a\" == \"a\"", Ok(Object::boolean(true))),
            ("\"a\" != \"b\"", Ok(Object::boolean(true))),
            ("[1] == [1]", Ok(Object::boolean(false))),
            ("var a = [1]; a == a", Ok(Object::boolean(true))),
            ("1 == true", Ok(Object::boolean(false))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_logical_operators() {
        let inputs = vec![
            ("true && false", Ok(Object::boolean(false))),
            ("1 && \"a\"", Ok(Object::boolean(true))),
            ("0 || []", Ok(Object::boolean(false))),
            ("null || 3", Ok(Object::boolean(true))),
            // Both sides run even when the left one decides the result.
            (
                "var n = 0; var bump = func() { mut n = n + 1; true }; false && bump(); n",
                Ok(Object::integer(1)),
            ),
            (
                "var n = 0; var bump = func() { mut n = n + 1; false }; true || bump(); n",
                Ok(Object::integer(1)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_string_operations() {
        let inputs = vec![
            ("\"Hello\" + \" \" + \"World!\"", Ok(Object::string("Hello World!"))),
            (
                "\"Hello\" - \"World\"",
                Err(ErrorKind::UnknownInfixOperator {
                    left: ObjectType::String,
                    operator: "-",
                    right: ObjectType::String,
                }),
            ),
            (
                "\"a\" + 1",
                Err(mismatch(ObjectType::String, "+", ObjectType::Integer)),
            ),
            (
                "true + false",
                Err(ErrorKind::UnknownInfixOperator {
                    left: ObjectType::Boolean,
                    operator: "+",
                    right: ObjectType::Boolean,
                }),
            ),
            ("5 + true", Err(mismatch(ObjectType::Integer, "+", ObjectType::Boolean))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_assign_statements() {
        let inputs = vec![
            ("var a = 5; a;", Ok(Object::integer(5))),
            ("var a = 5 * 5; a;", Ok(Object::integer(25))),
            ("var a = 5; var b = a; b;", Ok(Object::integer(5))),
            ("var a = 5; mut a = a + 1; a", Ok(Object::integer(6))),
            ("var a = 5;", Ok(Object::null())),
            (
                "var x = 5; var x = 6;",
                Err(ErrorKind::AlreadyDefined("x".into())),
            ),
            ("mut y = 1;", Err(ErrorKind::NotDefined("y".into()))),
            ("var a = b;", Err(ErrorKind::UnknownIdentifier("b".into()))),
            // Shadowing in an inner scope is allowed.
            (
                "var x = 1; var f = func() { var x = 2; x }; f() + x",
                Ok(Object::integer(3)),
            ),
            // `mut` writes to the scope that defines the name.
            (
                "var x = 1; var f = func() { mut x = 10; }; f(); x",
                Ok(Object::integer(10)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_return_statements() {
        let inputs = vec![
            ("return 10;", Ok(Object::integer(10))),
            ("return 10; 9;", Ok(Object::integer(10))),
            ("9; return 2 * 5; 9;", Ok(Object::integer(10))),
            ("return;", Ok(Object::null())),
            (
                "if (10 > 1) { if (10 > 1) { return 10; } return 1; }",
                Ok(Object::integer(10)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_conditionals() {
        let inputs = vec![
            ("if (true) { 10 }", Ok(Object::integer(10))),
            ("if (false) { 10 }", Ok(Object::null())),
            ("if (1) { 10 }", Ok(Object::integer(10))),
            ("if (0) { 10 } else { 20 }", Ok(Object::integer(20))),
            ("if (\"\") { 10 } else { 20 }", Ok(Object::integer(20))),
            ("if ([]) { 1 } elif ([0]) { 2 } else { 3 }", Ok(Object::integer(2))),
            (
                "var x = 3; if (x == 1) { 1 } elif (x == 2) { 2 } elif (x == 3) { 3 } else { 4 }",
                Ok(Object::integer(3)),
            ),
            ("if (false) { 1 } elif (false) { 2 } else { 3 }", Ok(Object::integer(3))),
            ("if (false) { 1 } elif (false) { 2 }", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_for_loop_runs_until_condition_holds() {
        let inputs = vec![
            (
                "var i = 0; for (i == 5) { mut i = i + 1; }; i",
                Ok(Object::integer(5)),
            ),
            ("var i = 0; for (true) { mut i = i + 1; }; i", Ok(Object::integer(0))),
            ("for (true) { 1 }", Ok(Object::null())),
            (
                "var f = func() { var i = 0; for (false) { mut i = i + 1; if (i == 3) { return i; } } }; f()",
                Ok(Object::integer(3)),
            ),
            (
                "for (false) { 1 / 0 }",
                Err(ErrorKind::DivisionByZero {
                    left: ObjectType::Integer,
                    operator: "/",
                    right: ObjectType::Integer,
                }),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_foreach() {
        let inputs = vec![
            (
                "var out = []; foreach i, v in [10, 20, 30] { out.push([i, v]) }; out",
                Ok(Object::array(vec![
                    Object::array(vec![Object::integer(0), Object::integer(10)]),
                    Object::array(vec![Object::integer(1), Object::integer(20)]),
                    Object::array(vec![Object::integer(2), Object::integer(30)]),
                ])),
            ),
            (
                "var out = \"\"; foreach c in \"abc\" { mut out = c + out }; out",
                Ok(Object::string("cba")),
            ),
            (
                "var total = 0; foreach k, v in {\"a\": 1, \"b\": 2} { mut total = total + v }; total",
                Ok(Object::integer(3)),
            ),
            (
                "var keys = \"\"; foreach k, v in {\"x\": 1, \"y\": 2} { mut keys = keys + k }; keys",
                Ok(Object::string("xy")),
            ),
            ("foreach v in [1] { v }", Ok(Object::null())),
            (
                "var xs = [1, 2]; foreach v in xs { v }; xs",
                Ok(Object::array(vec![Object::integer(1), Object::integer(2)])),
            ),
            ("foreach v in [1] { v }; v", Err(ErrorKind::UnknownIdentifier("v".into()))),
            (
                "foreach v in 5 { v }",
                Err(ErrorKind::NotIterable(ObjectType::Integer)),
            ),
            (
                "var f = func() { foreach v in [1, 2, 3] { if (v == 2) { return v * 10 } } }; f()",
                Ok(Object::integer(20)),
            ),
            // One scope is shared by every iteration.
            (
                "var fs = []; foreach v in [1, 2, 3] { fs.push(func() { v }) }; fs[0]()",
                Ok(Object::integer(3)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_switch() {
        let inputs = vec![
            (
                "var r = 0; switch (2) { case 1 { mut r = 1 } case 2 { mut r = 2 } default { mut r = 3 } }; r",
                Ok(Object::integer(2)),
            ),
            (
                "switch (9) { case 1 { \"one\" } default { \"other\" } }",
                Ok(Object::string("other")),
            ),
            ("switch (9) { case 1 { \"one\" } }", Ok(Object::null())),
            (
                "switch (\"a\") { case \"a\" { 1 } case \"a\" { 2 } }",
                Ok(Object::integer(1)),
            ),
            // Same rendering but different types never match.
            (
                "switch (\"1\") { case 1 { 1 } default { 2 } }",
                Ok(Object::integer(2)),
            ),
            (
                "switch ([1, 2]) { case [1, 2] { \"arrays\" } }",
                Ok(Object::string("arrays")),
            ),
            (
                "switch (1 + 1) { default { 0 } case 2 { 2 } }",
                Ok(Object::integer(2)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_function_application() {
        let inputs = vec![
            ("var identity = func(x) { x }; identity(5)", Ok(Object::integer(5))),
            (
                "var identity = func(x) { return x }; identity(5)",
                Ok(Object::integer(5)),
            ),
            ("var double = func(x) { x * 2 }; double(5)", Ok(Object::integer(10))),
            (
                "var add = func(x, y) { x + y }; add(5 + 5, add(5, 5))",
                Ok(Object::integer(20)),
            ),
            ("func(x) { x }(5)", Ok(Object::integer(5))),
            ("var f = func(a, b) { b }; f(1)", Ok(Object::null())),
            ("var f = func(a) { a }; f(1, 2, 3)", Ok(Object::integer(1))),
            (
                "
                var factorial = func(n) {
                    if (n < 2) { 1 } else { factorial(n - 1) * n }
                };
                factorial(5)",
                Ok(Object::integer(120)),
            ),
            ("5()", Err(ErrorKind::NotAFunction(ObjectType::Integer))),
            (
                "len(1)",
                Err(ErrorKind::Builtin(
                    "argument to `len` not supported, got INTEGER".to_owned(),
                )),
            ),
            ("math.abs(-3) + len(\"abc\")", Ok(Object::integer(6))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closures() {
        let inputs = vec![
            (
                "var adder = func(a) { func(b) { a + b } }; adder(5)(10)",
                Ok(Object::integer(15)),
            ),
            (
                r#"
                var fa = func() {
                    var x = 5;
                    var fb = func() { x };
                    fb
                };
                var temp = fa();
                temp()"#,
                Ok(Object::integer(5)),
            ),
            // Closures see later `mut`s of the captured binding.
            (
                "var x = 1; var get = func() { x }; mut x = 2; get()",
                Ok(Object::integer(2)),
            ),
            (
                r#"
                var counter = func() {
                    var count = 0;
                    func() { mut count = count + 1; count }
                };
                var next = counter();
                next(); next(); next()"#,
                Ok(Object::integer(3)),
            ),
            (
                r#"
                var is_even = func(x) { if (x == 0) { true } else { is_odd(x - 1) } };
                var is_odd = func(x) { if (x == 0) { false } else { is_even(x - 1) } };
                is_even(3)"#,
                Ok(Object::boolean(false)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_collections() {
        let inputs = vec![
            ("[1, 2 * 2, 3 + 3][1]", Ok(Object::integer(4))),
            ("[1, 2, 3][3]", Ok(Object::null())),
            ("[1, 2, 3][-1]", Ok(Object::null())),
            ("var a = [1, 2, 3]; a[0] + a[1] + a[2]", Ok(Object::integer(6))),
            ("{\"one\": 1, \"two\": 2}[\"two\"]", Ok(Object::integer(2))),
            ("{1: 1}[2]", Ok(Object::null())),
            ("{true: \"yes\"}[true]", Ok(Object::string("yes"))),
            (
                "{\"k\": 1}[[]]",
                Err(ErrorKind::UnusableAsHashKey(ObjectType::Array)),
            ),
            (
                "{[]: 1}",
                Err(ErrorKind::UnusableAsHashKey(ObjectType::Array)),
            ),
            ("1[0]", Err(ErrorKind::IndexNotSupported(ObjectType::Integer))),
            ("[1][\"a\"]", Err(ErrorKind::IndexNotSupported(ObjectType::Array))),
        ];

        test_evaluation(inputs);

        let hash = run("{\"b\": 2, \"a\": 1, 3: null}").unwrap();
        assert_eq!(hash.to_string(), "{\"b\": 2, \"a\": 1, 3: null}");
    }

    #[test]
    fn test_method_calls() {
        let inputs = vec![
            ("\"abc\".upper()", Ok(Object::string("ABC"))),
            ("\"a,b\".split(\",\").len()", Ok(Object::integer(2))),
            ("var a = [1]; a.push(2).push(3); a.len()", Ok(Object::integer(3))),
            ("[1, 2, 3].pop()", Ok(Object::integer(3))),
            ("[1, 2].join(\"+\")", Ok(Object::string("1+2"))),
            ("var h = {\"a\": 1}; h.delete(\"a\"); h.len()", Ok(Object::integer(0))),
            ("{\"a\": 1}.has(\"b\")", Ok(Object::boolean(false))),
            (
                "var n = 5; n.len()",
                Err(ErrorKind::UnknownMethod {
                    receiver: ObjectType::Integer,
                    method: "len".into(),
                }),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_postfix_operations() {
        let inputs = vec![
            ("var x = 1; x++", Ok(Object::integer(1))),
            ("var x = 1; x++; x", Ok(Object::integer(2))),
            ("var x = 1; x--; x--; x", Ok(Object::integer(-1))),
            ("var x = 1.5; x++; x", Ok(Object::float(2.5))),
            (
                "var x = 0; var f = func() { x++ }; f(); f(); x",
                Ok(Object::integer(2)),
            ),
            ("y++", Err(ErrorKind::UnknownIdentifier("y".into()))),
            (
                "var s = \"a\"; s++",
                Err(ErrorKind::InvalidPostfixOperand("s".into())),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_builtin_lookup_falls_back_after_environment() {
        let inputs = vec![
            ("len", Ok(Builtins::standard().get("len").unwrap())),
            ("var len = 3; len", Ok(Object::integer(3))),
            ("nope", Err(ErrorKind::UnknownIdentifier("nope".into()))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_error_location() {
        let mut evaluator = Evaluator::new(Builtins::standard()).with_file_name("main.jak");
        let error = evaluator
            .run("var a = 1;\nvar b = a + true;", &Environment::new())
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "File: main.jak: Line: 2: type mismatch: INTEGER + BOOLEAN"
        );
    }

    #[test]
    fn test_parse_errors_skip_evaluation() {
        let environment = Environment::new();
        let result = Evaluator::new(Builtins::standard()).run("var a = 1; var = 2;", &environment);

        assert!(matches!(result, Err(RunError::Parse(ref errors)) if errors.len() == 1));
        assert_eq!(environment.get("a"), None);
    }

    #[test]
    fn test_import() {
        let loader = MemoryLoader::new()
            .with_file("lib.jak", "var square = func(x) { x * x };")
            .with_file("broken.jak", "var = 1;")
            .with_file("failing.jak", "\n\nvar a = 1 / 0;");
        let mut evaluator = Evaluator::new(Builtins::standard())
            .with_loader(Box::new(loader))
            .with_file_name("main.jak");
        let environment = Environment::new();

        let result = evaluator.run("use \"lib.jak\"; square(4)", &environment);
        assert_eq!(result.unwrap(), Object::integer(16));

        let error = evaluator.run("use \"missing.jak\"", &environment).unwrap_err();
        assert_eq!(
            error.to_string(),
            "File: main.jak: Line: 1: could not import missing.jak: no such file"
        );

        let error = evaluator.run("use \"broken.jak\"", &environment).unwrap_err();
        match error {
            RunError::Evaluation(error) => assert!(matches!(
                error.kind,
                ErrorKind::Import { ref path, .. } if path == "broken.jak"
            )),
            other => panic!("expected import error, got {:?}", other),
        }

        let error = evaluator.run("use \"failing.jak\"", &environment).unwrap_err();
        assert_eq!(
            error.to_string(),
            "File: failing.jak: Line: 3: division by zero: INTEGER / INTEGER"
        );
        assert_eq!(&**evaluator.file_name(), "main.jak");
    }

    #[test]
    fn test_import_without_loader() {
        let result = run("use \"lib.jak\"");
        assert!(matches!(
            result,
            Err(RunError::Evaluation(EvaluationError {
                kind: ErrorKind::Import { .. },
                ..
            }))
        ));
    }

    #[test]
    fn test_environment_persists_between_runs() {
        let mut evaluator = Evaluator::new(Builtins::standard());
        let environment = Environment::new();

        evaluator.run("var x = 2;", &environment).unwrap();
        evaluator.run("mut x = x * 21;", &environment).unwrap();
        assert_eq!(evaluator.run("x", &environment).unwrap(), Object::integer(42));
    }

    #[test]
    fn test_deep_recursion() {
        let result = run(
            "var count = func(n) { if (n == 0) { 0 } else { 1 + count(n - 1) } }; count(5000)",
        );
        assert_eq!(result.unwrap(), Object::integer(5000));
    }

    #[test]
    fn test_closure_scope_is_collected() {
        let program = Parser::new(Tokenizer::new("var f = func() { marker }; f;"))
            .parse()
            .unwrap();
        let marker = match &program.statements[0] {
            ast::Statement::Assign(ast::AssignStatement {
                value: Expression::FunctionLiteral { body, .. },
                ..
            }) => match &body.statements[0] {
                ast::Statement::Expression(Expression::Identifier(identifier)) => {
                    identifier.name.clone()
                }
                other => panic!("expected an identifier, got {:?}", other),
            },
            other => panic!("expected a function declaration, got {:?}", other),
        };
        let before = Rc::strong_count(&marker);

        let environment = Environment::new();
        let function = Evaluator::new(Builtins::standard())
            .eval_program(&program, &environment)
            .unwrap();
        assert!(Rc::strong_count(&marker) > before);

        // `f` is bound in the scope its own closure captures.
        drop(function);
        drop(environment);
        gc::force_collect();
        assert_eq!(Rc::strong_count(&marker), before);
    }
}
