pub mod modify;

use std::fmt::Display;
use std::rc::Rc;

use crate::token::Token;

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Assign(AssignStatement),
    Return(ReturnStatement),
    Import(ImportStatement),
    Expression(Expression),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssignKind {
    /// `var`: introduces a new binding in the current scope.
    Declare,
    /// `mut`: rebinds an existing name.
    Mutate,
}

#[derive(Debug, PartialEq, Clone)]
pub struct AssignStatement {
    pub token: Token,
    pub kind: AssignKind,
    pub identifier: Identifier,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Option<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ImportStatement {
    pub token: Token,
    pub path: String,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    ArrayLiteral(Vec<Expression>),
    HashLiteral {
        token: Token,
        pairs: Vec<(Expression, Expression)>,
    },
    PrefixOperation {
        token: Token,
        operator: PrefixOperationKind,
        right: Box<Expression>,
    },
    InfixOperation {
        token: Token,
        operator: InfixOperationKind,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `x++`/`x--`. Always applies to the identifier lexed right before the
    /// operator.
    PostfixOperation {
        token: Token,
        operator: PostfixOperationKind,
        identifier: Identifier,
    },
    IfExpression {
        condition: Box<Expression>,
        consequence: BlockStatement,
        elifs: Vec<ElifBranch>,
        alternative: Option<BlockStatement>,
    },
    ForLoopExpression {
        condition: Box<Expression>,
        body: BlockStatement,
    },
    ForeachExpression {
        token: Token,
        index: Option<Identifier>,
        value: Identifier,
        iterable: Box<Expression>,
        body: BlockStatement,
    },
    SwitchExpression {
        token: Token,
        subject: Box<Expression>,
        arms: Vec<SwitchArm>,
    },
    FunctionLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    MacroLiteral {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    CallExpression {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    IndexExpression {
        token: Token,
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// `receiver.method(arguments)`, dispatched on the receiver's type.
    ObjectCallExpression {
        token: Token,
        receiver: Box<Expression>,
        method: Identifier,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElifBranch {
    pub condition: Expression,
    pub consequence: BlockStatement,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SwitchArm {
    pub token: Token,
    /// `None` marks the `default` arm.
    pub pattern: Option<Expression>,
    pub body: BlockStatement,
}

impl SwitchArm {
    pub fn is_default(&self) -> bool {
        self.pattern.is_none()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOperationKind {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOperationKind {
    Minus,
    Bang,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PostfixOperationKind {
    Increment,
    Decrement,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub name: Rc<str>,
    pub token: Token,
}

impl Identifier {
    pub fn new(token: Token) -> Self {
        Identifier {
            name: token.literal.clone(),
            token,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Renders a float so that it lexes back as a float literal.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            ch => escaped.push(ch),
        }
    }
    escaped
}

impl Display for AssignStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self.kind {
            AssignKind::Declare => "var",
            AssignKind::Mutate => "mut",
        };
        write!(f, "{} {} = {};", keyword, self.identifier.name, self.value)
    }
}

impl Display for ReturnStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "return {};", value),
            None => write!(f, "return;"),
        }
    }
}

impl Display for ImportStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "use \"{}\";", escape_string(&self.path))
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        write_separated(f, &self.statements, " ")?;
        write!(f, "}}")
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Expression::*;
        match self {
            Identifier(ident) => write!(f, "{}", ident.name),
            IntegerLiteral(i64::MIN) => write!(f, "({} - 1)", i64::MIN + 1),
            IntegerLiteral(val) if *val < 0 => write!(f, "({})", val),
            IntegerLiteral(val) => write!(f, "{}", val),
            FloatLiteral(val) if *val < 0.0 => write!(f, "({})", format_float(*val)),
            FloatLiteral(val) => write!(f, "{}", format_float(*val)),
            StringLiteral(val) => write!(f, "\"{}\"", escape_string(val)),
            BooleanLiteral(val) => write!(f, "{}", val),
            NullLiteral => write!(f, "null"),
            ArrayLiteral(arr) => {
                write!(f, "[")?;
                write_separated(f, arr, ", ")?;
                write!(f, "]")
            }
            HashLiteral { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            PrefixOperation {
                operator, right, ..
            } => write!(f, "({}{})", operator.to_str(), right),
            InfixOperation {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator.to_str(), right),
            PostfixOperation {
                operator,
                identifier,
                ..
            } => write!(f, "{}{}", identifier.name, operator.to_str()),
            IfExpression {
                condition,
                consequence,
                elifs,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                for elif in elifs {
                    write!(f, " elif ({}) {}", elif.condition, elif.consequence)?;
                }
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            ForLoopExpression { condition, body } => write!(f, "for ({}) {}", condition, body),
            ForeachExpression {
                index,
                value,
                iterable,
                body,
                ..
            } => {
                write!(f, "foreach ")?;
                if let Some(index) = index {
                    write!(f, "{}, ", index.name)?;
                }
                write!(f, "{} in {} {}", value.name, iterable, body)
            }
            SwitchExpression { subject, arms, .. } => {
                write!(f, "switch ({}) {{", subject)?;
                write_separated(f, arms, " ")?;
                write!(f, "}}")
            }
            FunctionLiteral { parameters, body } => {
                write!(f, "func(")?;
                write_separated(f, parameters, ", ")?;
                write!(f, ") {}", body)
            }
            MacroLiteral { parameters, body } => {
                write!(f, "macro(")?;
                write_separated(f, parameters, ", ")?;
                write!(f, ") {}", body)
            }
            CallExpression {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
            IndexExpression { left, index, .. } => write!(f, "({}[{}])", left, index),
            ObjectCallExpression {
                receiver,
                method,
                arguments,
                ..
            } => {
                write!(f, "({}).{}(", receiver, method.name)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
        }
    }
}

impl Display for SwitchArm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "case {} {}", pattern, self.body),
            None => write!(f, "default {}", self.body),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Statement::*;
        match self {
            Assign(statement) => write!(f, "{}", statement),
            Return(statement) => write!(f, "{}", statement),
            Import(statement) => write!(f, "{}", statement),
            Expression(expression) => write!(f, "{};", expression),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl PrefixOperationKind {
    pub fn to_str(&self) -> &'static str {
        use PrefixOperationKind::*;
        match self {
            Minus => "-",
            Bang => "!",
        }
    }
}

impl InfixOperationKind {
    pub fn to_str(&self) -> &'static str {
        use InfixOperationKind::*;
        match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Power => "^",
            LessThan => "<",
            GreaterThan => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "&&",
            Or => "||",
        }
    }
}

impl PostfixOperationKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            PostfixOperationKind::Increment => "++",
            PostfixOperationKind::Decrement => "--",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn ident(name: &str) -> Identifier {
        Identifier::new(Token::synthetic(TokenKind::Ident, name))
    }

    #[test]
    fn test_assign_rendering() {
        let program = Program {
            statements: vec![Statement::Assign(AssignStatement {
                token: Token::synthetic(TokenKind::Var, "var"),
                kind: AssignKind::Declare,
                identifier: ident("myVar"),
                value: Expression::Identifier(ident("anotherVar")),
            })],
        };

        assert_eq!(program.to_string(), "var myVar = anotherVar;\n");
    }

    #[test]
    fn test_literal_rendering() {
        let tests = vec![
            (Expression::FloatLiteral(2.0), "2.0"),
            (Expression::FloatLiteral(0.25), "0.25"),
            (Expression::IntegerLiteral(-3), "(-3)"),
            (
                Expression::IntegerLiteral(i64::MIN),
                "(-9223372036854775807 - 1)",
            ),
            (
                Expression::StringLiteral("a \"b\"\n".to_owned()),
                r#""a \"b\"\n""#,
            ),
            (
                Expression::ArrayLiteral(vec![
                    Expression::IntegerLiteral(1),
                    Expression::NullLiteral,
                ]),
                "[1, null]",
            ),
        ];

        for (expression, expected) in tests {
            assert_eq!(expression.to_string(), expected);
        }
    }
}
