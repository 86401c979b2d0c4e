use std::fmt::Display;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    Float,
    String,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Modulo,
    Caret,

    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,

    PlusPlus,
    MinusMinus,
    And,
    Or,

    Comma,
    SemiColon,
    Colon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Function,
    Var,
    Mut,
    If,
    Elif,
    Else,
    Return,
    True,
    False,
    Null,
    For,
    Foreach,
    In,
    Use,
    Switch,
    Case,
    Default,
    Macro,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Illegal => "ILLEGAL",
            Eof => "EOF",
            Ident => "IDENT",
            Int => "INT",
            Float => "FLOAT",
            String => "STRING",
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Bang => "!",
            Asterisk => "*",
            Slash => "/",
            Modulo => "%",
            Caret => "^",
            LessThan => "<",
            GreaterThan => ">",
            Equal => "==",
            NotEqual => "!=",
            LessEqual => "<=",
            GreaterEqual => ">=",
            PlusPlus => "++",
            MinusMinus => "--",
            And => "&&",
            Or => "||",
            Comma => ",",
            SemiColon => ";",
            Colon => ":",
            Dot => ".",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Function => "func",
            Var => "var",
            Mut => "mut",
            If => "if",
            Elif => "elif",
            Else => "else",
            Return => "return",
            True => "true",
            False => "false",
            Null => "null",
            For => "for",
            Foreach => "foreach",
            In => "in",
            Use => "use",
            Switch => "switch",
            Case => "case",
            Default => "default",
            Macro => "macro",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lexed token. `start` and `end` are byte offsets into the source, `end`
/// exclusive; `line` is 1-based.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Rc<str>,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// A token that does not come from source text, used for nodes built by
    /// macro expansion.
    pub fn synthetic(kind: TokenKind, literal: &str) -> Self {
        Token {
            kind,
            literal: literal.into(),
            line: 0,
            start: 0,
            end: 0,
        }
    }
}

pub fn keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "func" => Some(TokenKind::Function),
        "var" => Some(TokenKind::Var),
        "mut" => Some(TokenKind::Mut),
        "if" => Some(TokenKind::If),
        "elif" => Some(TokenKind::Elif),
        "else" => Some(TokenKind::Else),
        "return" => Some(TokenKind::Return),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "for" => Some(TokenKind::For),
        "foreach" => Some(TokenKind::Foreach),
        "in" => Some(TokenKind::In),
        "use" => Some(TokenKind::Use),
        "switch" => Some(TokenKind::Switch),
        "case" => Some(TokenKind::Case),
        "default" => Some(TokenKind::Default),
        "macro" => Some(TokenKind::Macro),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        let tests = vec![
            ("func", Some(TokenKind::Function)),
            ("var", Some(TokenKind::Var)),
            ("mut", Some(TokenKind::Mut)),
            ("foreach", Some(TokenKind::Foreach)),
            ("use", Some(TokenKind::Use)),
            ("macro", Some(TokenKind::Macro)),
            ("fn", None),
            ("let", None),
            ("Var", None),
        ];

        for (input, expected) in tests {
            assert_eq!(keyword(input), expected);
        }
    }
}
