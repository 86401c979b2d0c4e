pub mod error;
pub mod expressions;
pub mod statements;

use std::rc::Rc;

use crate::ast::{Identifier, Program};
use crate::lexer::Tokenizer;
use crate::token::{Token, TokenKind};
pub use error::{ParseError, ParseErrorKind};
use statements::parse_statement;

pub const DEFAULT_FILE_NAME: &str = "<input>";

pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    peeked: Token,
    previous: Option<Token>,
    file_name: Rc<str>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(tokenizer: Tokenizer<'a>) -> Self {
        Self::with_file_name(tokenizer, DEFAULT_FILE_NAME)
    }

    pub fn with_file_name(mut tokenizer: Tokenizer<'a>, file_name: impl Into<Rc<str>>) -> Self {
        let peeked = tokenizer.next_token();
        Self {
            tokenizer,
            peeked,
            previous: None,
            file_name: file_name.into(),
            errors: Vec::new(),
        }
    }

    pub fn file_name(&self) -> &Rc<str> {
        &self.file_name
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.peeked
    }

    /// The token consumed most recently.
    pub(crate) fn previous(&self) -> Option<&Token> {
        self.previous.as_ref()
    }

    pub(crate) fn next(&mut self) -> Token {
        let token = std::mem::replace(&mut self.peeked, self.tokenizer.next_token());
        self.previous = Some(token.clone());
        token
    }

    pub(crate) fn next_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peeked.kind == kind {
            Some(self.next())
        } else {
            None
        }
    }

    pub(crate) fn error(&self, kind: ParseErrorKind, token: Token) -> ParseError {
        ParseError {
            kind,
            token,
            file: self.file_name.clone(),
        }
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        if self.peeked.kind == token_kind {
            return Ok(self.next());
        }
        Err(self.error(
            ParseErrorKind::UnexpectedToken {
                expected: token_kind,
                got: self.peeked.kind,
            },
            self.peeked.clone(),
        ))
    }

    pub(crate) fn parse_ident(&mut self) -> Result<Identifier, ParseError> {
        self.expect_token(TokenKind::Ident).map(Identifier::new)
    }

    /// Skips to just past the next `;` so parsing can resume at a statement
    /// boundary.
    fn synchronize(&mut self) {
        if self
            .previous
            .as_ref()
            .is_some_and(|token| token.kind == TokenKind::SemiColon)
        {
            return;
        }
        while self.peeked.kind != TokenKind::Eof {
            if self.next().kind == TokenKind::SemiColon {
                break;
            }
        }
    }

    /// Parses the whole input. Statements that fail to parse are dropped and
    /// their errors collected in `errors()`.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while self.peeked.kind != TokenKind::Eof {
            match parse_statement(self) {
                Ok(statement) => {
                    statements.push(statement);
                    self.next_if(TokenKind::SemiColon);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "parse error");
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        tracing::trace!(
            file = %self.file_name,
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Program { statements }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        let program = self.parse_program();
        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Program, Vec<ParseError>> {
        Parser::new(Tokenizer::new(input)).parse()
    }

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let program = parse(input).unwrap();

            assert_eq!(program.to_string(), expected, "input: {}", input)
        }
    }

    fn parse_error_kinds(input: &str) -> Vec<ParseErrorKind> {
        parse(input)
            .unwrap_err()
            .into_iter()
            .map(|err| err.kind)
            .collect()
    }

    #[test]
    fn test_expression_1() {
        let tests = vec![
            ("-a * b", "((-a) * b);\n"),
            ("!-a", "(!(-a));\n"),
            ("a + b + c", "((a + b) + c);\n"),
            ("a + b - c", "((a + b) - c);\n"),
            ("a * b * c", "((a * b) * c);\n"),
            ("a * b / c", "((a * b) / c);\n"),
            ("a + b / c", "(a + (b / c));\n"),
            (
                "a + b * c + d / e - f",
                "(((a + (b * c)) + (d / e)) - f);\n",
            ),
            ("3 + 4; -5 * 5", "(3 + 4);\n((-5) * 5);\n"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));\n"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4));\n"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)));\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_extended_precedence() {
        let tests = vec![
            ("a * b % c", "(a * (b % c));\n"),
            ("a % b ^ c", "(a % (b ^ c));\n"),
            ("2 ^ 3 ^ 2", "((2 ^ 3) ^ 2);\n"),
            ("-2 ^ 2", "((-2) ^ 2);\n"),
            ("a < b <= c", "((a < b) <= c);\n"),
            ("a <= b < c", "(a <= (b < c));\n"),
            ("a <= b + 1", "(a <= (b + 1));\n"),
            ("a && b || c", "((a && b) || c);\n"),
            ("a == b && c", "(a == (b && c));\n"),
            ("a && b < c", "(a && (b < c));\n"),
            ("x[1] ^ 2", "((x[1]) ^ 2);\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_expression_precedence() {
        let tests = vec![
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);\n"),
            ("(5 + 5) * 2", "((5 + 5) * 2);\n"),
            ("2 / (5 + 5)", "(2 / (5 + 5));\n"),
            ("-(5 + 5)", "(-(5 + 5));\n"),
            ("!(true == true)", "(!(true == true));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_literals() {
        let tests = vec![
            ("5", "5;\n"),
            ("2.5", "2.5;\n"),
            ("\"hello\\n\"", "\"hello\\n\";\n"),
            ("null", "null;\n"),
            ("[1, 2 * 2, 3 + 3]", "[1, (2 * 2), (3 + 3)];\n"),
            ("[]", "[];\n"),
            ("{\"one\": 1, \"two\": 2}", "{\"one\": 1, \"two\": 2};\n"),
            ("{}", "{};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_call_expression() {
        let tests = vec![
            ("a + add(b * c) + d", "((a + add((b * c))) + d);\n"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)));\n",
            ),
            (
                "add(a + b + c * d / f + g)",
                "add((((a + b) + ((c * d) / f)) + g));\n",
            ),
            ("math.floor(2.5)", "math.floor(2.5);\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_method_call() {
        let tests = vec![
            ("a.push(1)", "(a).push(1);\n"),
            ("a.push(1).len()", "((a).push(1)).len();\n"),
            ("\"abc\".upper()", "(\"abc\").upper();\n"),
            ("a.len() + 1", "((a).len() + 1);\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_index_expression() {
        let tests = vec![
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d);\n"),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])));\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_statements() {
        let tests = vec![
            ("var x = 5;", "var x = 5;\n"),
            ("mut x = x + 1", "mut x = (x + 1);\n"),
            ("return 5;", "return 5;\n"),
            ("return;", "return;\n"),
            ("use \"lib.jak\";", "use \"lib.jak\";\n"),
            ("var a = 1 var b = 2", "var a = 1;\nvar b = 2;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_conditional() {
        let tests = vec![
            ("if (x < y) { x }", "if ((x < y)) {x;};\n"),
            (
                "if (x < y) { x } else { y }",
                "if ((x < y)) {x;} else {y;};\n",
            ),
            (
                "if (a) { 1 } elif (b) { 2 } elif (c) { 3 } else { 4 }",
                "if (a) {1;} elif (b) {2;} elif (c) {3;} else {4;};\n",
            ),
            ("if (a) {}", "if (a) {};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_loops() {
        let tests = vec![
            ("for (i > 3) { mut i = i + 1; }", "for ((i > 3)) {mut i = (i + 1);};\n"),
            ("foreach x in [1, 2] { x }", "foreach x in [1, 2] {x;};\n"),
            ("foreach i, x in xs { x; i }", "foreach i, x in xs {x; i;};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_switch_expression() {
        let tests = vec![
            ("switch (x) {}", "switch (x) {};\n"),
            (
                "switch (2) { case 1 { \"one\" } case 2 { \"two\" } default { \"many\" } }",
                "switch (2) {case 1 {\"one\";} case 2 {\"two\";} default {\"many\";}};\n",
            ),
            ("switch (x) { case default { 0 } }", "switch (x) {default {0;}};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_function() {
        let tests = vec![
            (
                "var getName = func(person) { person[\"name\"]; };",
                "var getName = func(person) {(person[\"name\"]);};\n",
            ),
            (
                "var getName = func(person) { person[\"name\"] };",
                "var getName = func(person) {(person[\"name\"]);};\n",
            ),
            ("func() {}", "func() {};\n"),
            ("func(x, y) { x + y }(1, 2)", "func(x, y) {(x + y);}(1, 2);\n"),
            (
                "var unless = macro(c, a, b) { quote(c) }",
                "var unless = macro(c, a, b) {quote(c);};\n",
            ),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_postfix() {
        let tests = vec![
            ("x++", "x++;\n"),
            ("x--;", "x--;\n"),
            ("a + b++", "(a + b++);\n"),
            ("x++ * 2", "(x++ * 2);\n"),
            ("var y = x++", "var y = x++;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_postfix_requires_identifier() {
        assert_eq!(
            parse_error_kinds("(a + b)++"),
            vec![ParseErrorKind::PostfixWithoutIdentifier(TokenKind::PlusPlus)]
        );
        assert_eq!(
            parse_error_kinds("++x"),
            vec![ParseErrorKind::PostfixWithoutIdentifier(TokenKind::PlusPlus)]
        );
    }

    #[test]
    fn test_duplicate_default() {
        assert_eq!(
            parse_error_kinds("switch (1) { default { 1 } default { 2 } }"),
            vec![ParseErrorKind::DuplicateDefault]
        );
    }

    #[test]
    fn test_errors() {
        let tests = vec![
            (
                "var = 5;",
                vec![ParseErrorKind::UnexpectedToken {
                    expected: TokenKind::Ident,
                    got: TokenKind::Assign,
                }],
            ),
            (
                "var x 5; var y = 1;",
                vec![ParseErrorKind::UnexpectedToken {
                    expected: TokenKind::Assign,
                    got: TokenKind::Int,
                }],
            ),
            ("}", vec![ParseErrorKind::NoPrefixFunction(TokenKind::RBrace)]),
            ("1 +;", vec![ParseErrorKind::NoPrefixFunction(TokenKind::SemiColon)]),
            (
                "99999999999999999999",
                vec![ParseErrorKind::InvalidInteger("99999999999999999999".into())],
            ),
            ("3x", vec![ParseErrorKind::IllegalToken("3x".into())]),
            ("if (x) { 1", vec![ParseErrorKind::UnterminatedBlock]),
            (
                "foreach a, 1 in b {}",
                vec![ParseErrorKind::ForeachBinding(TokenKind::Int)],
            ),
            (
                "use x;",
                vec![ParseErrorKind::UnexpectedToken {
                    expected: TokenKind::String,
                    got: TokenKind::Ident,
                }],
            ),
        ];

        for (input, expected) in tests {
            assert_eq!(parse_error_kinds(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = parse("var = 1; var x 2; var ok = 3;").unwrap_err();
        assert_eq!(errors.len(), 2);

        let mut parser = Parser::new(Tokenizer::new("var = 1; var ok = 3;"));
        let program = parser.parse_program();
        assert_eq!(program.to_string(), "var ok = 3;\n");
        assert_eq!(parser.errors().len(), 1);
    }

    #[test]
    fn test_error_message() {
        let tokenizer = Tokenizer::new("var a = 1;\nvar = 2;");
        let errors = Parser::with_file_name(tokenizer, "main.jak")
            .parse()
            .unwrap_err();

        assert_eq!(
            errors[0].to_string(),
            "File: main.jak: Line: 2: expected next token to be IDENT, got = instead"
        );
    }

    #[test]
    fn test_rendered_program_reparses() {
        let inputs = vec![
            "var add = func(a, b) { return a + b; }; add(1, 2 * 3);",
            "var x = -5; mut x = !true; x++; x--;",
            "if (x <= 1) { \"a\\tb\" } elif (x >= 2.5) { [1, {\"k\": null}] } else { x % 2 ^ 3 }",
            "for (i == 10) { mut i = i + 1 }",
            "foreach k, v in {\"a\": 1} { print(k, v) }",
            "switch (typeof(x)) { case \"INTEGER\" { 1 } default { return; } }",
            "var m = macro(a) { quote(unquote(a) + 1) }; m(2);",
            "xs.push(1).len(); math.floor(3.0); use \"other.jak\";",
            "var h = {1: [1, 2][0], true: a && b || !c};",
        ];

        for input in inputs {
            let rendered = parse(input).unwrap().to_string();
            let reparsed = parse(&rendered).unwrap();
            assert_eq!(reparsed.to_string(), rendered, "input: {}", input);
        }
    }
}
