use std::rc::Rc;

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("File: {}: Line: {}: {}", .file, .token.line, .kind)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The token the parser was looking at when it gave up.
    pub token: Token,
    pub file: Rc<str>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected next token to be {expected}, got {got} instead")]
    UnexpectedToken { expected: TokenKind, got: TokenKind },
    #[error("no prefix parse function for {0} found")]
    NoPrefixFunction(TokenKind),
    #[error("could not parse {0:?} as integer")]
    InvalidInteger(Rc<str>),
    #[error("could not parse {0:?} as float")]
    InvalidFloat(Rc<str>),
    #[error("illegal token {0:?}")]
    IllegalToken(Rc<str>),
    #[error("A switch-statement should only have one default block")]
    DuplicateDefault,
    #[error("unterminated block, expected }} before end of input")]
    UnterminatedBlock,
    #[error("postfix operator {0} must directly follow an identifier")]
    PostfixWithoutIdentifier(TokenKind),
    #[error("second argument to foreach must be ident, got {0}")]
    ForeachBinding(TokenKind),
}
