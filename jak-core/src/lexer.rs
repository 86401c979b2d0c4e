use crate::token::{keyword, Token, TokenKind};

/// Prefixes that may be joined to the following identifier with a dot, so
/// `math.floor` is a single identifier.
const NAMESPACES: [&str; 2] = ["math", "strings"];

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            line: 1,
        }
    }

    fn is_letter(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn is_number_terminator(ch: char) -> bool {
        ch.is_whitespace() || "+-*/%^=!<>&|,;:()[]{}#".contains(ch)
    }

    /// Returns the next token. Once the input is exhausted every call yields
    /// an `Eof` token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some((idx, ch)) = self.iter.next() else {
            let end = self.input.len();
            return Token {
                kind: TokenKind::Eof,
                literal: "".into(),
                line: self.line,
                start: end,
                end,
            };
        };

        match ch {
            '=' => self.either(idx, '=', TokenKind::Equal, TokenKind::Assign),
            '!' => self.either(idx, '=', TokenKind::NotEqual, TokenKind::Bang),
            '<' => self.either(idx, '=', TokenKind::LessEqual, TokenKind::LessThan),
            '>' => self.either(idx, '=', TokenKind::GreaterEqual, TokenKind::GreaterThan),
            '+' => self.either(idx, '+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => self.either(idx, '-', TokenKind::MinusMinus, TokenKind::Minus),
            '&' => self.either(idx, '&', TokenKind::And, TokenKind::Illegal),
            '|' => self.either(idx, '|', TokenKind::Or, TokenKind::Illegal),
            '*' => self.token(TokenKind::Asterisk, idx),
            '/' => self.token(TokenKind::Slash, idx),
            '%' => self.token(TokenKind::Modulo, idx),
            '^' => self.token(TokenKind::Caret, idx),
            ',' => self.token(TokenKind::Comma, idx),
            ';' => self.token(TokenKind::SemiColon, idx),
            ':' => self.token(TokenKind::Colon, idx),
            '.' => self.token(TokenKind::Dot, idx),
            '(' => self.token(TokenKind::LParen, idx),
            ')' => self.token(TokenKind::RParen, idx),
            '{' => self.token(TokenKind::LBrace, idx),
            '}' => self.token(TokenKind::RBrace, idx),
            '[' => self.token(TokenKind::LBracket, idx),
            ']' => self.token(TokenKind::RBracket, idx),
            '"' => self.read_string(idx),
            c if Tokenizer::is_letter(c) => self.read_identifier(idx),
            c if c.is_ascii_digit() => self.read_number(idx),
            _ => self.token(TokenKind::Illegal, idx),
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.iter.peek() {
                Some((_, '\n')) => {
                    self.line += 1;
                    self.iter.next();
                }
                Some((_, ' ' | '\t' | '\r')) => {
                    self.iter.next();
                }
                Some((_, '#')) => while self.iter.next_if(|(_, ch)| *ch != '\n').is_some() {},
                _ => break,
            }
        }
    }

    fn token(&mut self, kind: TokenKind, start: usize) -> Token {
        let end = self.next_idx();
        Token {
            kind,
            literal: self.input[start..end].into(),
            line: self.line,
            start,
            end,
        }
    }

    fn either(&mut self, start: usize, second: char, double: TokenKind, single: TokenKind) -> Token {
        if self.iter.next_if(|(_, ch)| *ch == second).is_some() {
            self.token(double, start)
        } else {
            self.token(single, start)
        }
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| Self::is_letter(*ch)).is_some() {}

        let input = self.input;
        let ident = &input[start..self.next_idx()];

        if NAMESPACES.contains(&ident) {
            let mut lookahead = self.iter.clone();
            if let Some((_, '.')) = lookahead.next() {
                if lookahead.peek().is_some_and(|(_, ch)| Self::is_letter(*ch)) {
                    self.iter.next();
                    while self.iter.next_if(|(_, ch)| Self::is_letter(*ch)).is_some() {}
                    return self.token(TokenKind::Ident, start);
                }
            }
        }

        self.token(keyword(ident).unwrap_or(TokenKind::Ident), start)
    }

    fn read_number(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}

        let mut kind = TokenKind::Int;
        let mut lookahead = self.iter.clone();
        if let Some((_, '.')) = lookahead.next() {
            if lookahead.peek().is_some_and(|(_, ch)| ch.is_ascii_digit()) {
                self.iter.next();
                while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}
                kind = TokenKind::Float;
            }
        }

        match self.iter.peek() {
            Some(&(_, ch)) if !Self::is_number_terminator(ch) => {
                // `3x`, `1.2.3`: swallow everything up to the next whitespace
                while self.iter.next_if(|(_, ch)| !ch.is_whitespace()).is_some() {}
                self.token(TokenKind::Illegal, start)
            }
            _ => self.token(kind, start),
        }
    }

    fn read_string(&mut self, start: usize) -> Token {
        let mut value = String::new();

        loop {
            match self.iter.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.iter.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return self.unterminated_string(start),
                },
                Some((_, ch)) => value.push(ch),
                None => return self.unterminated_string(start),
            }
        }

        Token {
            kind: TokenKind::String,
            literal: value.into(),
            line: self.line,
            start,
            end: self.next_idx(),
        }
    }

    fn unterminated_string(&mut self, start: usize) -> Token {
        Token {
            kind: TokenKind::Illegal,
            literal: "unterminated string".into(),
            line: self.line,
            start,
            end: self.next_idx(),
        }
    }

    fn next_idx(&mut self) -> usize {
        self.iter
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
