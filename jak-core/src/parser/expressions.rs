use super::error::{ParseError, ParseErrorKind};
use super::statements::parse_statement;
use crate::ast::{
    BlockStatement, ElifBranch, Expression, Identifier, InfixOperationKind, PostfixOperationKind,
    PrefixOperationKind, SwitchArm,
};
use crate::parser::Parser;
use crate::token::{Token, TokenKind};

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(PartialOrd, PartialEq, Debug, Clone, Copy)]
pub enum Precedence {
    Lowest = 0,
    Equals,
    Logical,
    LessGreaterEqual,
    LessGreater,
    Sum,
    Product,
    Modulo,
    Power,
    Prefix,
    Call,
    Index,
}

pub fn precedence_of(token: &TokenKind) -> Precedence {
    match token {
        TokenKind::Equal | TokenKind::NotEqual => Precedence::Equals,
        TokenKind::And | TokenKind::Or => Precedence::Logical,
        TokenKind::LessEqual | TokenKind::GreaterEqual => Precedence::LessGreaterEqual,
        TokenKind::LessThan | TokenKind::GreaterThan => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::Modulo => Precedence::Modulo,
        TokenKind::Caret => Precedence::Power,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn postfix_operation(token: &TokenKind) -> Option<PostfixOperationKind> {
    match token {
        TokenKind::PlusPlus => Some(PostfixOperationKind::Increment),
        TokenKind::MinusMinus => Some(PostfixOperationKind::Decrement),
        _ => None,
    }
}

pub fn parse_expression(
    parser: &mut Parser,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        parse_expression_inner(parser, precedence)
    })
}

fn parse_expression_inner(
    parser: &mut Parser,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    // `++`/`--` in operand position refer to the token lexed before them.
    if let Some(operator) = postfix_operation(&parser.peek().kind) {
        return parse_postfix_expression(parser, operator);
    }

    let token = parser.next();
    let mut left_expression = prefix_parsing(token, parser)?;

    loop {
        let next_kind = parser.peek().kind;

        let after_identifier = matches!(left_expression, Expression::Identifier(_));
        if let Some(operator) = postfix_operation(&next_kind).filter(|_| after_identifier) {
            left_expression = parse_postfix_expression(parser, operator)?;
            continue;
        }

        let statement_ended = next_kind == TokenKind::SemiColon;
        if statement_ended || precedence >= precedence_of(&next_kind) {
            break;
        }

        let next_token = parser.next();
        let Some(infix_parse_function) = infix_parsing_function(next_token) else {
            break;
        };
        left_expression = infix_parse_function(left_expression, parser)?;
    }

    Ok(left_expression)
}

fn parse_postfix_expression(
    parser: &mut Parser,
    operator: PostfixOperationKind,
) -> Result<Expression, ParseError> {
    let previous = parser.previous().cloned();
    let token = parser.next();
    match previous {
        Some(previous) if previous.kind == TokenKind::Ident => Ok(Expression::PostfixOperation {
            token,
            operator,
            identifier: Identifier::new(previous),
        }),
        _ => Err(parser.error(
            ParseErrorKind::PostfixWithoutIdentifier(token.kind),
            token,
        )),
    }
}

fn prefix_operation(
    token: Token,
    operator: PrefixOperationKind,
    parser: &mut Parser,
) -> Result<Expression, ParseError> {
    Ok(Expression::PrefixOperation {
        token,
        operator,
        right: Box::new(parse_expression(parser, Precedence::Prefix)?),
    })
}

fn parse_grouped_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let expression = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RParen)?;

    Ok(expression)
}

/// Parses `element (separator element)* terminator`, with the opening
/// delimiter already consumed. A trailing separator is accepted.
fn parse_sequence<T>(
    parser: &mut Parser,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    loop {
        if parser.next_if(terminator).is_some() {
            return Ok(elements);
        }
        elements.push(parse_element(parser)?);

        if parser.next_if(separator).is_some() {
            continue;
        }
        parser.expect_token(terminator)?;
        return Ok(elements);
    }
}

fn parse_array_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let expressions = parse_sequence(
        parser,
        |parser| parse_expression(parser, Precedence::Lowest),
        TokenKind::Comma,
        TokenKind::RBracket,
    )?;
    Ok(Expression::ArrayLiteral(expressions))
}

fn parse_hash_literal(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let pairs = parse_sequence(
        parser,
        |parser| {
            let key = parse_expression(parser, Precedence::Lowest)?;
            parser.expect_token(TokenKind::Colon)?;
            let value = parse_expression(parser, Precedence::Lowest)?;
            Ok((key, value))
        },
        TokenKind::Comma,
        TokenKind::RBrace,
    )?;
    Ok(Expression::HashLiteral { token, pairs })
}

fn parse_condition(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect_token(TokenKind::LParen)?;
    let condition = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RParen)?;
    Ok(condition)
}

fn parse_braced_block(parser: &mut Parser) -> Result<BlockStatement, ParseError> {
    parser.expect_token(TokenKind::LBrace)?;
    parse_block_statement(parser)
}

fn parse_if_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let condition = Box::new(parse_condition(parser)?);
    let consequence = parse_braced_block(parser)?;

    let mut elifs = Vec::new();
    while parser.next_if(TokenKind::Elif).is_some() {
        let condition = parse_condition(parser)?;
        let consequence = parse_braced_block(parser)?;
        elifs.push(ElifBranch {
            condition,
            consequence,
        });
    }

    let alternative = if parser.next_if(TokenKind::Else).is_some() {
        Some(parse_braced_block(parser)?)
    } else {
        None
    };

    Ok(Expression::IfExpression {
        condition,
        consequence,
        elifs,
        alternative,
    })
}

fn parse_for_loop_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let condition = Box::new(parse_condition(parser)?);
    let body = parse_braced_block(parser)?;

    Ok(Expression::ForLoopExpression { condition, body })
}

fn parse_foreach_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let first = parser.parse_ident()?;

    let (index, value) = if parser.next_if(TokenKind::Comma).is_some() {
        if parser.peek().kind != TokenKind::Ident {
            let got = parser.peek().clone();
            return Err(parser.error(ParseErrorKind::ForeachBinding(got.kind), got));
        }
        (Some(first), parser.parse_ident()?)
    } else {
        (None, first)
    };

    parser.expect_token(TokenKind::In)?;
    let iterable = Box::new(parse_expression(parser, Precedence::Lowest)?);
    let body = parse_braced_block(parser)?;

    Ok(Expression::ForeachExpression {
        token,
        index,
        value,
        iterable,
        body,
    })
}

fn parse_switch_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let subject = Box::new(parse_condition(parser)?);
    parser.expect_token(TokenKind::LBrace)?;

    let mut arms: Vec<SwitchArm> = Vec::new();
    loop {
        let arm_token = parser.next();
        let pattern = match arm_token.kind {
            TokenKind::RBrace => break,
            TokenKind::Eof => {
                return Err(parser.error(ParseErrorKind::UnterminatedBlock, arm_token));
            }
            TokenKind::Default => None,
            TokenKind::Case if parser.next_if(TokenKind::Default).is_some() => None,
            TokenKind::Case => Some(parse_expression(parser, Precedence::Lowest)?),
            got => {
                return Err(parser.error(
                    ParseErrorKind::UnexpectedToken {
                        expected: TokenKind::Case,
                        got,
                    },
                    arm_token,
                ));
            }
        };

        if pattern.is_none() && arms.iter().any(SwitchArm::is_default) {
            return Err(parser.error(ParseErrorKind::DuplicateDefault, arm_token));
        }

        let body = parse_braced_block(parser)?;
        arms.push(SwitchArm {
            token: arm_token,
            pattern,
            body,
        });
    }

    Ok(Expression::SwitchExpression {
        token,
        subject,
        arms,
    })
}

/// Parses statements up to the closing `}`. The opening brace must already
/// be consumed.
pub(crate) fn parse_block_statement(parser: &mut Parser) -> Result<BlockStatement, ParseError> {
    let mut statements = Vec::new();

    loop {
        match parser.peek().kind {
            TokenKind::RBrace => {
                parser.next();
                return Ok(BlockStatement { statements });
            }
            TokenKind::Eof => {
                let eof = parser.peek().clone();
                return Err(parser.error(ParseErrorKind::UnterminatedBlock, eof));
            }
            _ => {
                statements.push(parse_statement(parser)?);
                parser.next_if(TokenKind::SemiColon);
            }
        }
    }
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Identifier>, ParseError> {
    parser.expect_token(TokenKind::LParen)?;
    parse_sequence(
        parser,
        |parser| parser.parse_ident(),
        TokenKind::Comma,
        TokenKind::RParen,
    )
}

fn parse_function_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let parameters = parse_parameters(parser)?;
    let body = parse_braced_block(parser)?;

    Ok(Expression::FunctionLiteral { parameters, body })
}

fn parse_macro_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let parameters = parse_parameters(parser)?;
    let body = parse_braced_block(parser)?;

    Ok(Expression::MacroLiteral { parameters, body })
}

pub fn prefix_parsing(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    match token.kind {
        TokenKind::Ident => Ok(Expression::Identifier(Identifier::new(token))),
        TokenKind::Int => match token.literal.parse() {
            Ok(val) => Ok(Expression::IntegerLiteral(val)),
            Err(_) => Err(parser.error(
                ParseErrorKind::InvalidInteger(token.literal.clone()),
                token,
            )),
        },
        TokenKind::Float => match token.literal.parse() {
            Ok(val) => Ok(Expression::FloatLiteral(val)),
            Err(_) => Err(parser.error(ParseErrorKind::InvalidFloat(token.literal.clone()), token)),
        },
        TokenKind::String => Ok(Expression::StringLiteral(token.literal.to_string())),
        TokenKind::True => Ok(Expression::BooleanLiteral(true)),
        TokenKind::False => Ok(Expression::BooleanLiteral(false)),
        TokenKind::Null => Ok(Expression::NullLiteral),
        TokenKind::Bang => prefix_operation(token, PrefixOperationKind::Bang, parser),
        TokenKind::Minus => prefix_operation(token, PrefixOperationKind::Minus, parser),
        TokenKind::LParen => parse_grouped_expression(parser),
        TokenKind::LBracket => parse_array_literal(parser),
        TokenKind::LBrace => parse_hash_literal(token, parser),
        TokenKind::If => parse_if_expression(parser),
        TokenKind::For => parse_for_loop_expression(parser),
        TokenKind::Foreach => parse_foreach_expression(token, parser),
        TokenKind::Switch => parse_switch_expression(token, parser),
        TokenKind::Function => parse_function_literal(parser),
        TokenKind::Macro => parse_macro_literal(parser),
        TokenKind::Illegal => Err(parser.error(ParseErrorKind::IllegalToken(token.literal.clone()), token)),
        kind => Err(parser.error(ParseErrorKind::NoPrefixFunction(kind), token)),
    }
}

type InfixFunction = Box<dyn FnOnce(Expression, &mut Parser) -> Result<Expression, ParseError>>;

fn infix_operation(token: Token, operator: InfixOperationKind) -> InfixFunction {
    Box::new(
        move |left: Expression, parser: &mut Parser| -> Result<Expression, ParseError> {
            let new_precedence = precedence_of(&token.kind);
            let right = parse_expression(parser, new_precedence)?;

            Ok(Expression::InfixOperation {
                token,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        },
    )
}

fn parse_call_expression(token: Token) -> InfixFunction {
    Box::new(move |left: Expression, parser: &mut Parser| {
        let arguments = parse_sequence(
            parser,
            |parser| parse_expression(parser, Precedence::Lowest),
            TokenKind::Comma,
            TokenKind::RParen,
        )?;

        Ok(Expression::CallExpression {
            token,
            function: Box::new(left),
            arguments,
        })
    })
}

fn parse_index_expression(token: Token) -> InfixFunction {
    Box::new(move |left: Expression, parser: &mut Parser| {
        let index = parse_expression(parser, Precedence::Lowest)?;
        parser.expect_token(TokenKind::RBracket)?;

        Ok(Expression::IndexExpression {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    })
}

fn parse_method_call(token: Token) -> InfixFunction {
    Box::new(move |receiver: Expression, parser: &mut Parser| {
        let method = parser.parse_ident()?;
        parser.expect_token(TokenKind::LParen)?;
        let arguments = parse_sequence(
            parser,
            |parser| parse_expression(parser, Precedence::Lowest),
            TokenKind::Comma,
            TokenKind::RParen,
        )?;

        Ok(Expression::ObjectCallExpression {
            token,
            receiver: Box::new(receiver),
            method,
            arguments,
        })
    })
}

pub fn infix_parsing_function(token: Token) -> Option<InfixFunction> {
    use InfixOperationKind as InfixKind;

    let operator = match token.kind {
        TokenKind::Plus => InfixKind::Plus,
        TokenKind::Minus => InfixKind::Minus,
        TokenKind::Asterisk => InfixKind::Multiply,
        TokenKind::Slash => InfixKind::Divide,
        TokenKind::Modulo => InfixKind::Modulo,
        TokenKind::Caret => InfixKind::Power,
        TokenKind::LessThan => InfixKind::LessThan,
        TokenKind::GreaterThan => InfixKind::GreaterThan,
        TokenKind::LessEqual => InfixKind::LessEqual,
        TokenKind::GreaterEqual => InfixKind::GreaterEqual,
        TokenKind::Equal => InfixKind::Equal,
        TokenKind::NotEqual => InfixKind::NotEqual,
        TokenKind::And => InfixKind::And,
        TokenKind::Or => InfixKind::Or,
        TokenKind::LParen => return Some(parse_call_expression(token)),
        TokenKind::LBracket => return Some(parse_index_expression(token)),
        TokenKind::Dot => return Some(parse_method_call(token)),
        _ => return None,
    };
    Some(infix_operation(token, operator))
}
