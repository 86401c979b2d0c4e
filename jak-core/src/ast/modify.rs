//! Bottom-up rewriting of syntax trees. Children are rewritten before
//! their parent is handed to the modifier, and the first error aborts the
//! walk.

use super::{
    BlockStatement, ElifBranch, Expression, Program, ReturnStatement, Statement, SwitchArm,
};

pub fn modify_program<E, F>(program: Program, modifier: &mut F) -> Result<Program, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    Ok(Program {
        statements: modify_statements(program.statements, modifier)?,
    })
}

pub fn modify_block<E, F>(block: BlockStatement, modifier: &mut F) -> Result<BlockStatement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    Ok(BlockStatement {
        statements: modify_statements(block.statements, modifier)?,
    })
}

fn modify_statements<E, F>(statements: Vec<Statement>, modifier: &mut F) -> Result<Vec<Statement>, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let mut modified = Vec::with_capacity(statements.len());
    for statement in statements {
        modified.push(modify_statement(statement, modifier)?);
    }
    Ok(modified)
}

pub fn modify_statement<E, F>(statement: Statement, modifier: &mut F) -> Result<Statement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let statement = match statement {
        Statement::Assign(mut assign) => {
            assign.value = modify_expression(assign.value, modifier)?;
            Statement::Assign(assign)
        }
        Statement::Return(ReturnStatement { token, value }) => {
            let value = match value {
                Some(value) => Some(modify_expression(value, modifier)?),
                None => None,
            };
            Statement::Return(ReturnStatement { token, value })
        }
        Statement::Import(import) => Statement::Import(import),
        Statement::Expression(expression) => {
            Statement::Expression(modify_expression(expression, modifier)?)
        }
    };
    Ok(statement)
}

fn modify_all<E, F>(expressions: Vec<Expression>, modifier: &mut F) -> Result<Vec<Expression>, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let mut modified = Vec::with_capacity(expressions.len());
    for expression in expressions {
        modified.push(modify_expression(expression, modifier)?);
    }
    Ok(modified)
}

fn modify_boxed<E, F>(expression: Box<Expression>, modifier: &mut F) -> Result<Box<Expression>, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    Ok(Box::new(modify_expression(*expression, modifier)?))
}

pub fn modify_expression<E, F>(expression: Expression, modifier: &mut F) -> Result<Expression, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    use Expression::*;
    let expression = match expression {
        ArrayLiteral(elements) => ArrayLiteral(modify_all(elements, modifier)?),
        HashLiteral { token, pairs } => {
            let mut modified = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = modify_expression(key, modifier)?;
                let value = modify_expression(value, modifier)?;
                modified.push((key, value));
            }
            HashLiteral {
                token,
                pairs: modified,
            }
        }
        PrefixOperation {
            token,
            operator,
            right,
        } => PrefixOperation {
            token,
            operator,
            right: modify_boxed(right, modifier)?,
        },
        InfixOperation {
            token,
            operator,
            left,
            right,
        } => InfixOperation {
            token,
            operator,
            left: modify_boxed(left, modifier)?,
            right: modify_boxed(right, modifier)?,
        },
        IfExpression {
            condition,
            consequence,
            elifs,
            alternative,
        } => {
            let condition = modify_boxed(condition, modifier)?;
            let consequence = modify_block(consequence, modifier)?;
            let mut modified = Vec::with_capacity(elifs.len());
            for elif in elifs {
                modified.push(ElifBranch {
                    condition: modify_expression(elif.condition, modifier)?,
                    consequence: modify_block(elif.consequence, modifier)?,
                });
            }
            let alternative = match alternative {
                Some(alternative) => Some(modify_block(alternative, modifier)?),
                None => None,
            };
            IfExpression {
                condition,
                consequence,
                elifs: modified,
                alternative,
            }
        }
        ForLoopExpression { condition, body } => ForLoopExpression {
            condition: modify_boxed(condition, modifier)?,
            body: modify_block(body, modifier)?,
        },
        ForeachExpression {
            token,
            index,
            value,
            iterable,
            body,
        } => ForeachExpression {
            token,
            index,
            value,
            iterable: modify_boxed(iterable, modifier)?,
            body: modify_block(body, modifier)?,
        },
        SwitchExpression {
            token,
            subject,
            arms,
        } => {
            let subject = modify_boxed(subject, modifier)?;
            let mut modified = Vec::with_capacity(arms.len());
            for arm in arms {
                let pattern = match arm.pattern {
                    Some(pattern) => Some(modify_expression(pattern, modifier)?),
                    None => None,
                };
                modified.push(SwitchArm {
                    token: arm.token,
                    pattern,
                    body: modify_block(arm.body, modifier)?,
                });
            }
            SwitchExpression {
                token,
                subject,
                arms: modified,
            }
        }
        FunctionLiteral { parameters, body } => FunctionLiteral {
            parameters,
            body: modify_block(body, modifier)?,
        },
        MacroLiteral { parameters, body } => MacroLiteral {
            parameters,
            body: modify_block(body, modifier)?,
        },
        CallExpression {
            token,
            function,
            arguments,
        } => CallExpression {
            token,
            function: modify_boxed(function, modifier)?,
            arguments: modify_all(arguments, modifier)?,
        },
        IndexExpression { token, left, index } => IndexExpression {
            token,
            left: modify_boxed(left, modifier)?,
            index: modify_boxed(index, modifier)?,
        },
        ObjectCallExpression {
            token,
            receiver,
            method,
            arguments,
        } => ObjectCallExpression {
            token,
            receiver: modify_boxed(receiver, modifier)?,
            method,
            arguments: modify_all(arguments, modifier)?,
        },
        leaf @ (Identifier(_)
        | IntegerLiteral(_)
        | FloatLiteral(_)
        | StringLiteral(_)
        | BooleanLiteral(_)
        | NullLiteral
        | PostfixOperation { .. }) => leaf,
    };
    modifier(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Tokenizer;
    use crate::parser::Parser;

    fn one_to_two(expression: Expression) -> Result<Expression, ()> {
        match expression {
            Expression::IntegerLiteral(1) => Ok(Expression::IntegerLiteral(2)),
            other => Ok(other),
        }
    }

    #[test]
    fn test_modify() {
        let tests = vec![
            ("1", "2;\n"),
            ("1 + 1", "(2 + 2);\n"),
            ("-1", "(-2);\n"),
            ("x[1]", "(x[2]);\n"),
            ("var a = 1", "var a = 2;\n"),
            ("return 1", "return 2;\n"),
            ("[1, 3, 1]", "[2, 3, 2];\n"),
            ("{1: 1}", "{2: 2};\n"),
            (
                "if (1) { 1 } elif (1) { 1 } else { 1 }",
                "if (2) {2;} elif (2) {2;} else {2;};\n",
            ),
            ("for (1) { 1 }", "for (2) {2;};\n"),
            ("foreach x in [1] { 1 }", "foreach x in [2] {2;};\n"),
            (
                "switch (1) { case 1 { 1 } default { 1 } }",
                "switch (2) {case 2 {2;} default {2;}};\n",
            ),
            ("func(x) { 1 }", "func(x) {2;};\n"),
            ("f(1, 3)", "f(2, 3);\n"),
            ("a.push(1)", "(a).push(2);\n"),
        ];

        for (input, expected) in tests {
            let program = Parser::new(Tokenizer::new(input)).parse().unwrap();
            let modified = modify_program(program, &mut one_to_two).unwrap();
            assert_eq!(modified.to_string(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_modify_stops_on_error() {
        let program = Parser::new(Tokenizer::new("[1, 2, 3]")).parse().unwrap();
        let mut visited = Vec::new();
        let result = modify_program(program, &mut |expression: Expression| match expression {
            Expression::IntegerLiteral(2) => Err("two"),
            Expression::IntegerLiteral(n) => {
                visited.push(n);
                Ok(expression)
            }
            other => Ok(other),
        });

        assert_eq!(result, Err("two"));
        assert_eq!(visited, vec![1]);
    }
}
