//! Formula lexer and parser.
//!
//! One forward scan produces span-carrying tokens; a precedence-climbing
//! parser turns them into the [`Expr`] tree. Identifiers are case-folded to
//! upper case while lexing, so keywords (`AND`, `OR`, `NOT`, `TRUE`,
//! `FALSE`) and function/variable names are case-insensitive throughout.

use std::str::FromStr;

use payrule_decimal::Decimal;

use crate::ast::{BinaryExpr, BinaryOp, CallExpr, Expr, UnaryExpr, UnaryOp, VariablePath};
use crate::error::{ParseError, Span};

/// Limits enforced by this parser.
///
/// Formulas come from end-user rule editors; the caps keep a pathological
/// input from overflowing the Rust stack during parsing or evaluation.
const MAX_FORMULA_CHARS: usize = 8_192;
const MAX_NESTED_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(String),
    Str(String),
    /// Identifier lexeme, already upcased.
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Comma,
    Dot,
    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(raw) => format!("number `{raw}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Le => "`<=`".to_string(),
            TokenKind::Ge => "`>=`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::Ne => "`!=`".to_string(),
            TokenKind::AndAnd => "`&&`".to_string(),
            TokenKind::OrOr => "`||`".to_string(),
            TokenKind::Bang => "`!`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenize a formula. The stream always ends with [`TokenKind::Eof`].
pub fn lex(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(src).lex()
}

/// Parse a formula into an expression tree.
///
/// Trailing tokens after one complete expression are a hard error: `1 + 2 3`
/// is rejected rather than silently evaluating `1 + 2`.
pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let char_len = src.chars().count();
    if char_len > MAX_FORMULA_CHARS {
        return Err(ParseError::new(
            format!("formula exceeds the {MAX_FORMULA_CHARS}-character limit (got {char_len})"),
            Span::new(0, src.len()),
        ));
    }
    let tokens = lex(src)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression(0)?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
        });
    }

    fn lex(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(ch) = self.peek_char() {
            let start = self.pos;
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                // A digit, or a dot directly followed by a digit, starts a
                // number literal. No exponent, no sign: unary minus is the
                // parser's job.
                '0'..='9' => {
                    let raw = self.take_while(|c| c.is_ascii_digit() || c == '.');
                    self.push(TokenKind::Number(raw.to_string()), start);
                }
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    let raw = self.take_while(|c| c.is_ascii_digit() || c == '.');
                    self.push(TokenKind::Number(raw.to_string()), start);
                }
                '\'' | '"' => {
                    let value = self.lex_string(ch, start)?;
                    self.push(TokenKind::Str(value), start);
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let raw = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    self.push(TokenKind::Ident(raw.to_ascii_uppercase()), start);
                }
                '<' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        self.push(TokenKind::Le, start);
                    } else {
                        self.push(TokenKind::Lt, start);
                    }
                }
                '>' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        self.push(TokenKind::Ge, start);
                    } else {
                        self.push(TokenKind::Gt, start);
                    }
                }
                '=' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        self.push(TokenKind::EqEq, start);
                    } else {
                        return Err(self.unexpected_char('=', start));
                    }
                }
                '!' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        self.push(TokenKind::Ne, start);
                    } else {
                        self.push(TokenKind::Bang, start);
                    }
                }
                '&' => {
                    self.bump();
                    if self.peek_char() == Some('&') {
                        self.bump();
                        self.push(TokenKind::AndAnd, start);
                    } else {
                        return Err(self.unexpected_char('&', start));
                    }
                }
                '|' => {
                    self.bump();
                    if self.peek_char() == Some('|') {
                        self.bump();
                        self.push(TokenKind::OrOr, start);
                    } else {
                        return Err(self.unexpected_char('|', start));
                    }
                }
                '+' => {
                    self.bump();
                    self.push(TokenKind::Plus, start);
                }
                '-' => {
                    self.bump();
                    self.push(TokenKind::Minus, start);
                }
                '*' => {
                    self.bump();
                    self.push(TokenKind::Star, start);
                }
                '/' => {
                    self.bump();
                    self.push(TokenKind::Slash, start);
                }
                '(' => {
                    self.bump();
                    self.push(TokenKind::LParen, start);
                }
                ')' => {
                    self.bump();
                    self.push(TokenKind::RParen, start);
                }
                ',' => {
                    self.bump();
                    self.push(TokenKind::Comma, start);
                }
                '.' => {
                    self.bump();
                    self.push(TokenKind::Dot, start);
                }
                other => {
                    self.bump();
                    return Err(self.unexpected_char(other, start));
                }
            }
        }
        let end = self.pos;
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    fn lex_string(&mut self, quote: char, start: usize) -> Result<String, ParseError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(ParseError::new(
                            "unterminated string literal",
                            Span::new(start, self.pos),
                        ))
                    }
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        Span::new(start, self.pos),
                    ))
                }
            }
        }
    }

    fn unexpected_char(&self, ch: char, offset: usize) -> ParseError {
        ParseError::new(
            format!("unexpected character `{ch}`"),
            Span::new(offset, offset + ch.len_utf8()),
        )
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.peek().span)
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        match &self.peek().kind {
            TokenKind::Eof => Ok(()),
            other => Err(self.error_at(format!(
                "expected end of input, found {}",
                other.describe()
            ))),
        }
    }

    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start_depth = self.depth;
        let mut lhs = self.parse_prefix()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::OrOr => Some(BinaryOp::Or),
                TokenKind::AndAnd => Some(BinaryOp::And),
                TokenKind::EqEq => Some(BinaryOp::Eq),
                TokenKind::Ne => Some(BinaryOp::Ne),
                TokenKind::Lt => Some(BinaryOp::Lt),
                TokenKind::Le => Some(BinaryOp::Le),
                TokenKind::Gt => Some(BinaryOp::Gt),
                TokenKind::Ge => Some(BinaryOp::Ge),
                TokenKind::Plus => Some(BinaryOp::Add),
                TokenKind::Minus => Some(BinaryOp::Sub),
                TokenKind::Star => Some(BinaryOp::Mul),
                TokenKind::Slash => Some(BinaryOp::Div),
                TokenKind::Ident(name) => match name.as_str() {
                    "AND" => Some(BinaryOp::And),
                    "OR" => Some(BinaryOp::Or),
                    _ => None,
                },
                _ => None,
            };

            let Some(op) = op else { break };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            // Each operator wrapped around `lhs` deepens the tree the
            // evaluator later walks recursively, so operator chains count
            // against the same limit as parenthesized nesting.
            if self.depth >= MAX_NESTED_DEPTH {
                return Err(self.error_at(format!(
                    "expression nesting exceeds the {MAX_NESTED_DEPTH}-level limit"
                )));
            }
            self.depth += 1;
            self.bump(); // consume operator
            let rhs = self.parse_expression(r_bp)?;
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            });
        }

        self.depth = start_depth;
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTED_DEPTH {
            return Err(self.error_at(format!(
                "expression nesting exceeds the {MAX_NESTED_DEPTH}-level limit"
            )));
        }
        self.depth += 1;
        let result = self.parse_prefix_inner();
        self.depth -= 1;
        result
    }

    fn parse_prefix_inner(&mut self) -> Result<Expr, ParseError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Minus => {
                let operand = self.parse_prefix()?;
                Ok(Expr::Unary(UnaryExpr {
                    op: UnaryOp::Neg,
                    expr: Box::new(operand),
                }))
            }
            TokenKind::Bang => {
                let operand = self.parse_prefix()?;
                Ok(Expr::Unary(UnaryExpr {
                    op: UnaryOp::Not,
                    expr: Box::new(operand),
                }))
            }
            TokenKind::Number(raw) => Decimal::from_str(&raw)
                .map(Expr::Number)
                .map_err(|_| ParseError::new(format!("invalid number literal `{raw}`"), token.span)),
            TokenKind::Str(value) => Ok(Expr::Text(value)),
            TokenKind::LParen => {
                let inner = self.parse_expression(0)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "NOT" => {
                    let operand = self.parse_prefix()?;
                    Ok(Expr::Unary(UnaryExpr {
                        op: UnaryOp::Not,
                        expr: Box::new(operand),
                    }))
                }
                "TRUE" => Ok(Expr::Bool(true)),
                "FALSE" => Ok(Expr::Bool(false)),
                _ => self.parse_identifier(name),
            },
            other => Err(ParseError::new(
                format!("expected expression, found {}", other.describe()),
                token.span,
            )),
        }
    }

    /// Disambiguate an identifier by one-token lookahead: `(` makes it a
    /// call, `.` a dotted variable path, anything else a bare variable.
    fn parse_identifier(&mut self, name: String) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.bump();
                let args = self.parse_call_args()?;
                Ok(Expr::Call(CallExpr { name, args }))
            }
            TokenKind::Dot => {
                let mut segments = vec![name];
                while matches!(self.peek().kind, TokenKind::Dot) {
                    self.bump();
                    let segment = self.bump();
                    match segment.kind {
                        TokenKind::Ident(seg) => segments.push(seg),
                        other => {
                            return Err(ParseError::new(
                                format!("expected identifier after `.`, found {}", other.describe()),
                                segment.span,
                            ))
                        }
                    }
                }
                Ok(Expr::Variable(VariablePath::new(segments)))
            }
            _ => Ok(Expr::Variable(VariablePath::new(vec![name]))),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek().kind, TokenKind::RParen) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(0)?);
            let token = self.bump();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                other => {
                    return Err(ParseError::new(
                        format!("expected `,` or `)`, found {}", other.describe()),
                        token.span,
                    ))
                }
            }
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        let token = self.bump();
        match token.kind {
            TokenKind::RParen => Ok(()),
            other => Err(ParseError::new(
                format!("expected `)`, found {}", other.describe()),
                token.span,
            )),
        }
    }
}

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (10, 11),
        BinaryOp::And => (20, 21),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => (30, 31),
        BinaryOp::Add | BinaryOp::Sub => (40, 41),
        BinaryOp::Mul | BinaryOp::Div => (50, 51),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_operators_with_two_char_lookahead() {
        assert_eq!(
            kinds("<= >= == != && || < > !"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers_including_leading_dot() {
        assert_eq!(
            kinds("12 3.25 .5"),
            vec![
                TokenKind::Number("12".into()),
                TokenKind::Number("3.25".into()),
                TokenKind::Number(".5".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_are_upcased() {
        assert_eq!(
            kinds("base_salary.Amount"),
            vec![
                TokenKind::Ident("BASE_SALARY".into()),
                TokenKind::Dot,
                TokenKind::Ident("AMOUNT".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_support_both_quotes_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b""#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\"b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_character_names_offset() {
        let err = lex("1 + #").unwrap_err();
        assert!(err.message.contains('#'), "{}", err.message);
        assert_eq!(err.span.start, 4);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(lex("'abc").is_err());
        assert!(lex(r"'abc\'").is_err());
    }

    #[test]
    fn precedence_builds_the_expected_tree() {
        let expr = parse("2 + 3 * 4").unwrap();
        let Expr::Binary(add) = expr else {
            panic!("expected binary node");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expr::Binary(mul) = *add.right else {
            panic!("expected `3 * 4` on the right");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    }

    #[test]
    fn keywords_parse_as_operators_and_literals() {
        let expr = parse("NOT TRUE AND FALSE").unwrap();
        let Expr::Binary(and) = expr else {
            panic!("expected AND at the root");
        };
        assert_eq!(and.op, BinaryOp::And);
        assert_eq!(
            *and.left,
            Expr::Unary(UnaryExpr {
                op: UnaryOp::Not,
                expr: Box::new(Expr::Bool(true)),
            })
        );
        assert_eq!(*and.right, Expr::Bool(false));
    }

    #[test]
    fn identifier_lookahead_resolves_calls_paths_and_variables() {
        let expr = parse("MIN(a.b, c)").unwrap();
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.name, "MIN");
        assert_eq!(
            call.args,
            vec![
                Expr::Variable(VariablePath::new(vec!["A".into(), "B".into()])),
                Expr::Variable(VariablePath::new(vec!["C".into()])),
            ]
        );
    }

    #[test]
    fn empty_argument_lists_parse() {
        let expr = parse("F()").unwrap();
        assert_eq!(
            expr,
            Expr::Call(CallExpr {
                name: "F".into(),
                args: vec![],
            })
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse("1 + 2 3").unwrap_err();
        assert!(err.message.contains("end of input"), "{}", err.message);
    }

    #[test]
    fn malformed_number_is_rejected() {
        assert!(parse("1.2.3").is_err());
    }

    #[test]
    fn expected_token_mismatch_names_both_sides() {
        let err = parse("(1 + 2").unwrap_err();
        assert!(err.message.contains("expected `)`"), "{}", err.message);
        let err = parse("MIN(1; 2)").unwrap_err();
        assert!(err.message.contains(';'), "{}", err.message);
    }

    #[test]
    fn nesting_depth_is_capped() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let err = parse(&deep).unwrap_err();
        assert!(err.message.contains("nesting"), "{}", err.message);
    }

    #[test]
    fn long_operator_chains_are_capped() {
        // A maximal-length chain stays inside the character limit but would
        // otherwise build a tree too deep to evaluate.
        let chain = format!("0{}", "+1".repeat(4095));
        let err = parse(&chain).unwrap_err();
        assert!(err.message.contains("nesting"), "{}", err.message);
    }

    #[test]
    fn operator_chains_at_the_limit_parse() {
        let chain = format!("0{}", "+1".repeat(64));
        assert!(parse(&chain).is_ok());
        // Sibling expressions do not inherit each other's depth.
        let wide = format!("MIN({}, {})", "0+1+2", "(3)*(4)");
        assert!(parse(&wide).is_ok());
    }
}
