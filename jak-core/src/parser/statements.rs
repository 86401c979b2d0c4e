use crate::ast::{AssignKind, AssignStatement, ImportStatement, ReturnStatement, Statement};
use crate::parser::expressions::{parse_expression, Precedence};
use crate::parser::{ParseError, Parser};
use crate::token::TokenKind;

pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    match parser.peek().kind {
        TokenKind::Var => Ok(Statement::Assign(parse_assign_statement(
            parser,
            AssignKind::Declare,
        )?)),
        TokenKind::Mut => Ok(Statement::Assign(parse_assign_statement(
            parser,
            AssignKind::Mutate,
        )?)),
        TokenKind::Return => Ok(Statement::Return(parse_return_statement(parser)?)),
        TokenKind::Use => Ok(Statement::Import(parse_import_statement(parser)?)),
        _ => Ok(Statement::Expression(parse_expression_statement(parser)?)),
    }
}

fn parse_assign_statement(
    parser: &mut Parser,
    kind: AssignKind,
) -> Result<AssignStatement, ParseError> {
    let token = parser.next();
    let identifier = parser.parse_ident()?;
    parser.expect_token(TokenKind::Assign)?;
    let value = parse_expression(parser, Precedence::Lowest)?;

    Ok(AssignStatement {
        token,
        kind,
        identifier,
        value,
    })
}

fn parse_return_statement(parser: &mut Parser) -> Result<ReturnStatement, ParseError> {
    let token = parser.expect_token(TokenKind::Return)?;
    let value = match parser.peek().kind {
        TokenKind::SemiColon | TokenKind::RBrace | TokenKind::Eof => None,
        _ => Some(parse_expression(parser, Precedence::Lowest)?),
    };

    Ok(ReturnStatement { token, value })
}

fn parse_import_statement(parser: &mut Parser) -> Result<ImportStatement, ParseError> {
    let token = parser.expect_token(TokenKind::Use)?;
    let path = parser.expect_token(TokenKind::String)?;

    Ok(ImportStatement {
        token,
        path: path.literal.to_string(),
    })
}

fn parse_expression_statement(parser: &mut Parser) -> Result<crate::ast::Expression, ParseError> {
    parse_expression(parser, Precedence::Lowest)
}
