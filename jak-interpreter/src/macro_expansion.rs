use gc::Gc;
use jak_core::ast::modify::{modify_expression, modify_program};
use jak_core::ast::{AssignStatement, Expression, Program, Statement};
use jak_core::token::{Token, TokenKind};
use tracing::debug;

use crate::environment::Environment;
use crate::error::{ErrorKind, EvaluationError, Location};
use crate::evaluator::Evaluator;
use crate::object::{Macro, Object, QuickReturn};

impl Evaluator {
    /// `quote(<expr>)`: the argument is kept as syntax, with every
    /// `unquote(...)` inside it replaced by the value it evaluates to.
    pub(crate) fn eval_quote(
        &mut self,
        token: &Token,
        arguments: &[Expression],
        environment: &Environment,
    ) -> Result<Gc<Object>, QuickReturn> {
        let [argument] = arguments else {
            return Err(self
                .location(token)
                .error(ErrorKind::Quote(format!(
                    "wrong number of arguments. got={}, want=1",
                    arguments.len()
                )))
                .into());
        };
        let node = self.eval_unquote_calls(argument.clone(), environment)?;
        Ok(Object::quote(node))
    }

    fn eval_unquote_calls(
        &mut self,
        node: Expression,
        environment: &Environment,
    ) -> Result<Expression, EvaluationError> {
        modify_expression(node, &mut |expression| match expression {
            Expression::CallExpression {
                token,
                function,
                arguments,
            } if is_unquote_call(&function, &arguments) => {
                let location = self.location(&token);
                let value = match self.eval_expression(&arguments[0], environment) {
                    Ok(value) | Err(QuickReturn::Return(value)) => value,
                    Err(QuickReturn::Error(error)) => return Err(error),
                };
                object_to_expression(&location, &value)
            }
            other => Ok(other),
        })
    }

    /// Moves top-level `var name = macro(...) {...}` definitions out of the
    /// program and binds them in `environment`.
    pub fn define_macros(&self, program: &mut Program, environment: &Environment) {
        program.statements.retain(|statement| match statement {
            Statement::Assign(AssignStatement {
                identifier,
                value: Expression::MacroLiteral { parameters, body },
                ..
            }) => {
                debug!(name = %identifier.name, "defining macro");
                environment.set(
                    identifier.name.clone(),
                    Object::macro_object(parameters.clone(), body.clone(), environment.clone()),
                );
                false
            }
            _ => true,
        });
    }

    /// Replaces every call to a macro bound in `environment` with the syntax
    /// the macro returns.
    pub fn expand_macros(
        &mut self,
        program: Program,
        environment: &Environment,
    ) -> Result<Program, EvaluationError> {
        modify_program(program, &mut |expression| match expression {
            Expression::CallExpression {
                token,
                function,
                arguments,
            } => {
                let callee = match function.as_ref() {
                    Expression::Identifier(identifier) => environment.get(&identifier.name),
                    _ => None,
                };
                match callee.as_deref() {
                    Some(Object::Macro(definition)) => {
                        self.expand_macro_call(&token, definition, arguments)
                    }
                    _ => Ok(Expression::CallExpression {
                        token,
                        function,
                        arguments,
                    }),
                }
            }
            other => Ok(other),
        })
    }

    fn expand_macro_call(
        &mut self,
        token: &Token,
        definition: &Macro,
        arguments: Vec<Expression>,
    ) -> Result<Expression, EvaluationError> {
        let location = self.location(token);
        let scope = Environment::new_enclosed(&definition.env);
        let mut arguments = arguments.into_iter();
        for parameter in &definition.parameters {
            let argument = arguments.next().unwrap_or(Expression::NullLiteral);
            scope.set(parameter.name.clone(), Object::quote(argument));
        }

        let expanded = match self.eval_block_statement(&definition.body, &scope) {
            Ok(value) | Err(QuickReturn::Return(value)) => value,
            Err(QuickReturn::Error(error)) => return Err(error),
        };
        match expanded.as_ref() {
            Object::Quote(node) => Ok(node.clone()),
            other => Err(location.error(ErrorKind::Macro(format!(
                "we only support returning AST-nodes from macros, got {}",
                other.type_name()
            )))),
        }
    }
}

fn is_unquote_call(function: &Expression, arguments: &[Expression]) -> bool {
    arguments.len() == 1
        && matches!(function, Expression::Identifier(identifier) if &*identifier.name == "unquote")
}

/// Syntax that evaluates back to `object`.
fn object_to_expression(location: &Location, object: &Object) -> Result<Expression, EvaluationError> {
    let expression = match object {
        Object::Integer(value) => Expression::IntegerLiteral(*value),
        Object::Float(value) => Expression::FloatLiteral(*value),
        Object::Boolean(value) => Expression::BooleanLiteral(*value),
        Object::String(string) => Expression::StringLiteral(string.value.clone()),
        Object::Null => Expression::NullLiteral,
        Object::Quote(node) => node.clone(),
        Object::Array(array) => Expression::ArrayLiteral(
            array
                .elements
                .borrow()
                .iter()
                .map(|element| object_to_expression(location, element))
                .collect::<Result<_, _>>()?,
        ),
        Object::Hash(hash) => Expression::HashLiteral {
            token: Token::synthetic(TokenKind::LBrace, "{"),
            pairs: hash
                .pairs
                .borrow()
                .iter()
                .map(|pair| -> Result<_, EvaluationError> {
                    Ok((
                        object_to_expression(location, &pair.key)?,
                        object_to_expression(location, &pair.value)?,
                    ))
                })
                .collect::<Result<_, _>>()?,
        },
        other => {
            return Err(location.error(ErrorKind::Quote(format!(
                "cannot unquote {}",
                other.type_name()
            ))))
        }
    };
    Ok(expression)
}
