//! Formula parser
//!
//! A recursive descent parser over the lexer's token stream with Excel's
//! operator precedence: `:` (range) binds tightest, then unary minus, `^`,
//! `*` `/`, `+` `-`, `&`, and finally the comparison operators. `^` is
//! right-associative, everything else is left-associative.

use crate::ast::{BinaryOp, Expr};
use crate::lexer::{Lexer, Token, TokenKind};
use reckon_core::{column_from_letters, CellAddress, MAX_ROWS};
use thiserror::Error;

/// Result type for parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors produced while parsing formula text. These never cross the
/// evaluator boundary: `Evaluator::eval` converts them into a `#VALUE!`
/// result.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The lexer could not scan the input
    #[error("lex error: {0}")]
    Lex(String),

    /// A token appeared somewhere the grammar does not allow
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    /// The formula ended mid-expression
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// Input remained after a complete expression
    #[error("trailing input after expression: '{0}'")]
    TrailingInput(String),
}

/// Parse a formula string into an expression tree.
///
/// The leading `=` is optional: a bare `A1` or `1+2` parses the same as
/// `=A1` or `=1+2`.
///
/// # Example
/// ```rust
/// use reckon_formula::parser::parse;
///
/// let expr = parse("=SUM(A1:A10)").unwrap();
/// assert_eq!(expr.to_string(), "SUM(A1:A10)");
/// ```
pub fn parse(text: &str) -> ParseResult<Expr> {
    let text = text.trim();
    let text = text.strip_prefix('=').unwrap_or(text);

    let tokens: Vec<Token> = Lexer::new(text).collect();
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::LexError) {
        return Err(ParseError::Lex(bad.text.clone()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    if let Some(tok) = parser.current() {
        return Err(ParseError::TrailingInput(tok.text.clone()));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.current() {
            Some(tok) if tok.kind == kind => Ok(self.bump().unwrap()),
            Some(tok) => Err(ParseError::UnexpectedToken(tok.text.clone())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    // === Precedence chain ===

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.kind() {
                Some(TokenKind::Eq) => BinaryOp::Eq,
                Some(TokenKind::Ne) => BinaryOp::Ne,
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let right = self.parse_concat()?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        while self.kind() == Some(TokenKind::Amp) {
            self.bump();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op: BinaryOp::Concat,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = match self.kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.bump();
            let right = self.parse_exponent()?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> ParseResult<Expr> {
        let left = self.parse_unary()?;
        if self.kind() == Some(TokenKind::Caret) {
            self.bump();
            // Right associative
            let right = self.parse_exponent()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(left),
                rhs: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            Some(TokenKind::Minus) => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Expr::Negate(Box::new(operand)))
            }
            Some(TokenKind::Plus) => {
                self.bump();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    // === Primary expressions ===

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let tok = self.current().cloned().ok_or(ParseError::UnexpectedEnd)?;
        match tok.kind {
            TokenKind::Number => {
                // A row range like `1:4` is two integer tokens around a colon
                if self.kind_pair_is_range() {
                    return self.parse_horizontal_range();
                }
                self.bump();
                let n: f64 = tok
                    .text
                    .parse()
                    .map_err(|_| ParseError::UnexpectedToken(tok.text.clone()))?;
                Ok(Expr::Number(n))
            }
            TokenKind::String => {
                self.bump();
                Ok(Expr::String(tok.text))
            }
            TokenKind::Bool => {
                self.bump();
                Ok(Expr::Bool(tok.text == "TRUE"))
            }
            TokenKind::Error => {
                self.bump();
                let kind = reckon_core::ErrorKind::from_literal(&tok.text)
                    .ok_or_else(|| ParseError::UnexpectedToken(tok.text.clone()))?;
                Ok(Expr::Error(kind))
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_const_array(),
            TokenKind::CellRef => self.parse_cell_or_range(),
            TokenKind::Sheet => {
                self.bump();
                let inner = self.parse_prefixed_reference()?;
                Ok(Expr::Prefix {
                    sheet: tok.text,
                    inner: Box::new(inner),
                })
            }
            TokenKind::Name => {
                // Pure column letters around a colon form a column range
                if self.vertical_range_ahead() {
                    return self.parse_vertical_range();
                }
                self.bump();
                Ok(Expr::NamedRange(tok.text))
            }
            TokenKind::Function => {
                self.bump();
                self.parse_function_call(tok.text)
            }
            _ => Err(ParseError::UnexpectedToken(tok.text)),
        }
    }

    /// Reference forms allowed after a `Sheet!` prefix
    fn parse_prefixed_reference(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            Some(TokenKind::CellRef) => self.parse_cell_or_range(),
            Some(TokenKind::Number) if self.kind_pair_is_range() => self.parse_horizontal_range(),
            Some(TokenKind::Name) if self.vertical_range_ahead() => self.parse_vertical_range(),
            Some(TokenKind::Name) => {
                let tok = self.bump().unwrap();
                Ok(Expr::NamedRange(tok.text))
            }
            Some(_) => Err(ParseError::UnexpectedToken(
                self.current().unwrap().text.clone(),
            )),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_cell_or_range(&mut self) -> ParseResult<Expr> {
        let tok = self.expect(TokenKind::CellRef)?;
        let start = CellAddress::parse(&tok.text)
            .map_err(|_| ParseError::UnexpectedToken(tok.text.clone()))?;
        if self.kind() == Some(TokenKind::Colon) && self.peek_kind(1) == Some(TokenKind::CellRef) {
            self.bump();
            let end_tok = self.expect(TokenKind::CellRef)?;
            let end = CellAddress::parse(&end_tok.text)
                .map_err(|_| ParseError::UnexpectedToken(end_tok.text.clone()))?;
            return Ok(Expr::Range { start, end });
        }
        Ok(Expr::CellRef(start))
    }

    fn kind_pair_is_range(&self) -> bool {
        self.kind() == Some(TokenKind::Number)
            && self.peek_kind(1) == Some(TokenKind::Colon)
            && self.peek_kind(2) == Some(TokenKind::Number)
            && self.current().map_or(false, |t| is_row_number(&t.text))
            && self
                .tokens
                .get(self.pos + 2)
                .map_or(false, |t| is_row_number(&t.text))
    }

    fn parse_horizontal_range(&mut self) -> ParseResult<Expr> {
        let start_tok = self.expect(TokenKind::Number)?;
        self.expect(TokenKind::Colon)?;
        let end_tok = self.expect(TokenKind::Number)?;
        let a: u32 = start_tok.text.parse().unwrap_or(0);
        let b: u32 = end_tok.text.parse().unwrap_or(0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Ok(Expr::HorizontalRange {
            start_row: lo - 1,
            end_row: hi - 1,
        })
    }

    fn vertical_range_ahead(&self) -> bool {
        let letters_only =
            |t: &Token| !t.text.is_empty() && t.text.chars().all(|c| c.is_ascii_alphabetic());
        self.current().map_or(false, |t| letters_only(t))
            && self.peek_kind(1) == Some(TokenKind::Colon)
            && matches!(
                self.peek_kind(2),
                Some(TokenKind::Name) | Some(TokenKind::CellRef)
            )
            && self.tokens.get(self.pos + 2).map_or(false, |t| letters_only(t))
    }

    fn parse_vertical_range(&mut self) -> ParseResult<Expr> {
        let start_tok = self.bump().ok_or(ParseError::UnexpectedEnd)?;
        self.expect(TokenKind::Colon)?;
        let end_tok = self.bump().ok_or(ParseError::UnexpectedEnd)?;
        let a = column_from_letters(&start_tok.text)
            .map_err(|_| ParseError::UnexpectedToken(start_tok.text.clone()))?;
        let b = column_from_letters(&end_tok.text)
            .map_err(|_| ParseError::UnexpectedToken(end_tok.text.clone()))?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Ok(Expr::VerticalRange {
            start_col: lo,
            end_col: hi,
        })
    }

    fn parse_const_array(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut rows = Vec::new();
        let mut row = Vec::new();
        if self.kind() == Some(TokenKind::RBrace) {
            self.bump();
            return Ok(Expr::ConstArray(vec![]));
        }
        loop {
            row.push(self.parse_expression()?);
            match self.kind() {
                Some(TokenKind::Comma) => {
                    self.bump();
                }
                Some(TokenKind::Semi) => {
                    self.bump();
                    rows.push(std::mem::take(&mut row));
                }
                Some(TokenKind::RBrace) => {
                    self.bump();
                    rows.push(row);
                    return Ok(Expr::ConstArray(rows));
                }
                Some(_) => {
                    return Err(ParseError::UnexpectedToken(
                        self.current().unwrap().text.clone(),
                    ));
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.kind() == Some(TokenKind::RParen) {
            self.bump();
            return Ok(Expr::FunctionCall { name, args });
        }
        loop {
            // A comma (or the closing paren) in argument position is an
            // omitted argument
            if matches!(self.kind(), Some(TokenKind::Comma) | Some(TokenKind::RParen)) {
                args.push(Expr::Empty);
            } else {
                args.push(self.parse_expression()?);
            }
            match self.kind() {
                Some(TokenKind::Comma) => {
                    self.bump();
                }
                Some(TokenKind::RParen) => {
                    self.bump();
                    return Ok(Expr::FunctionCall { name, args });
                }
                Some(_) => {
                    return Err(ParseError::UnexpectedToken(
                        self.current().unwrap().text.clone(),
                    ))
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

fn is_row_number(text: &str) -> bool {
    text.parse::<u32>().map_or(false, |n| n >= 1 && n <= MAX_ROWS)
}
