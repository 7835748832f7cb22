//! Formula lexer
//!
//! A hand-written scanner that turns formula text into a stream of
//! classified tokens. Tokens are produced one at a time; on unrecoverable
//! input the stream ends with a single [`TokenKind::LexError`] token.

use lazy_regex::regex;
use reckon_core::{column_from_letters, MAX_COLS, MAX_ROWS};

/// Error literals recognized in formula text, longest first so that prefix
/// matching is unambiguous.
const ERROR_LITERALS: &[&str] = &[
    "#DIV/0!", "#VALUE!", "#SPILL!", "#NAME?", "#NULL!", "#NUM!", "#REF!", "#N/A",
];

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// TRUE or FALSE
    Bool,
    /// Numeric literal
    Number,
    /// String literal (text holds the unescaped content)
    String,
    /// Cell reference such as `A1` or `$B$2`
    CellRef,
    /// Sheet name before `!` (text holds the unquoted name)
    Sheet,
    /// Named range or reserved name
    Name,
    /// Error literal such as `#REF!`
    Error,
    /// Built-in function name (identifier immediately followed by `(`)
    Function,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Colon,
    Comma,
    Semi,
    /// Unrecoverable scan failure; always the last token produced
    LexError,
}

/// A classified piece of formula text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Whether an identifier is shaped like a cell reference (`$`-markers
/// allowed) and within the sheet bounds.
pub fn is_cell_reference(text: &str) -> bool {
    let re = regex!(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$");
    let Some(caps) = re.captures(text) else {
        return false;
    };
    let col_ok = column_from_letters(&caps[1]).map_or(false, |c| c < MAX_COLS);
    let row_ok = caps[2].parse::<u64>().map_or(false, |r| r >= 1 && r <= MAX_ROWS as u64);
    col_ok && row_ok
}

/// Incremental scanner over formula text
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            finished: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn fail(&mut self, text: &str) -> Token {
        self.finished = true;
        Token::new(TokenKind::LexError, text)
    }

    fn scan_string(&mut self) -> Token {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    if self.peek() == Some('"') {
                        self.bump();
                        out.push('"');
                    } else {
                        return Token::new(TokenKind::String, out);
                    }
                }
                Some(c) => out.push(c),
                None => return self.fail("unterminated string literal"),
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> Token {
        self.bump(); // opening quote
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        self.bump();
                        name.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => name.push(c),
                None => return self.fail("unterminated sheet name"),
            }
        }
        if self.peek() == Some('!') {
            self.bump();
            Token::new(TokenKind::Sheet, name)
        } else {
            self.fail("quoted sheet name must be followed by '!'")
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if self.peek().map_or(false, |c| c == 'e' || c == 'E') {
            // Only consume an exponent if digits follow
            let mark = self.pos;
            self.bump();
            if self.peek().map_or(false, |c| c == '+' || c == '-') {
                self.bump();
            }
            if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.pos = mark;
            }
        }
        Token::new(TokenKind::Number, &self.input[start..self.pos])
    }

    fn scan_error_literal(&mut self) -> Token {
        for literal in ERROR_LITERALS {
            if self
                .rest()
                .to_ascii_uppercase()
                .starts_with(literal)
            {
                self.pos += literal.len();
                return Token::new(TokenKind::Error, *literal);
            }
        }
        self.fail("unrecognized error literal")
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.bump();
        }
        let text = &self.input[start..self.pos];

        // A bare identifier directly followed by '!' names a sheet
        if self.peek() == Some('!') {
            self.bump();
            return Token::new(TokenKind::Sheet, text);
        }
        // An identifier directly followed by '(' is a function name
        if self.peek() == Some('(') {
            return Token::new(TokenKind::Function, text.to_ascii_uppercase());
        }
        let upper = text.to_ascii_uppercase();
        if upper == "TRUE" || upper == "FALSE" {
            return Token::new(TokenKind::Bool, upper);
        }
        if is_cell_reference(text) {
            return Token::new(TokenKind::CellRef, text.to_ascii_uppercase());
        }
        Token::new(TokenKind::Name, text)
    }

    fn scan_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.peek()?;

        let simple = |kind| Some(Token::new(kind, c.to_string()));
        match c {
            '(' => {
                self.bump();
                return simple(TokenKind::LParen);
            }
            ')' => {
                self.bump();
                return simple(TokenKind::RParen);
            }
            '{' => {
                self.bump();
                return simple(TokenKind::LBrace);
            }
            '}' => {
                self.bump();
                return simple(TokenKind::RBrace);
            }
            '+' => {
                self.bump();
                return simple(TokenKind::Plus);
            }
            '-' => {
                self.bump();
                return simple(TokenKind::Minus);
            }
            '*' => {
                self.bump();
                return simple(TokenKind::Star);
            }
            '/' => {
                self.bump();
                return simple(TokenKind::Slash);
            }
            '^' => {
                self.bump();
                return simple(TokenKind::Caret);
            }
            '&' => {
                self.bump();
                return simple(TokenKind::Amp);
            }
            ':' => {
                self.bump();
                return simple(TokenKind::Colon);
            }
            ',' => {
                self.bump();
                return simple(TokenKind::Comma);
            }
            ';' => {
                self.bump();
                return simple(TokenKind::Semi);
            }
            '=' => {
                self.bump();
                return simple(TokenKind::Eq);
            }
            _ => {}
        }

        // Two-character operators, longest match first
        if c == '<' {
            self.bump();
            return Some(match self.peek() {
                Some('=') => {
                    self.bump();
                    Token::new(TokenKind::Le, "<=")
                }
                Some('>') => {
                    self.bump();
                    Token::new(TokenKind::Ne, "<>")
                }
                _ => Token::new(TokenKind::Lt, "<"),
            });
        }
        if c == '>' {
            self.bump();
            return Some(if self.peek() == Some('=') {
                self.bump();
                Token::new(TokenKind::Ge, ">=")
            } else {
                Token::new(TokenKind::Gt, ">")
            });
        }

        if c == '"' {
            return Some(self.scan_string());
        }
        if c == '\'' {
            return Some(self.scan_quoted_sheet());
        }
        if c == '#' {
            return Some(self.scan_error_literal());
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).map_or(false, |d| d.is_ascii_digit()))
        {
            return Some(self.scan_number());
        }
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return Some(self.scan_identifier());
        }

        Some(self.fail(&format!("unexpected character '{c}'")))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        self.scan_token()
    }
}

/// Tokenize a full formula string
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(
            kinds("1+2.5*3e2"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
            ]
        );
        let tokens = tokenize("3e2");
        assert_eq!(tokens[0].text, "3e2");
    }

    #[test]
    fn test_two_char_operators_longest_match() {
        assert_eq!(
            kinds("1<=2>=3<>4<5>6"),
            vec![
                TokenKind::Number,
                TokenKind::Le,
                TokenKind::Number,
                TokenKind::Ge,
                TokenKind::Number,
                TokenKind::Ne,
                TokenKind::Number,
                TokenKind::Lt,
                TokenKind::Number,
                TokenKind::Gt,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn test_string_escaping() {
        let tokens = tokenize("\"a\"\"b\"");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\"b");
    }

    #[test]
    fn test_unterminated_string_is_lex_error() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::LexError);
    }

    #[test]
    fn test_cell_references() {
        let tokens = tokenize("A1 $B$2 XFD1048576");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::CellRef));
        // Out of bounds rows/columns are names, not references
        let tokens = tokenize("XFE1");
        assert_eq!(tokens[0].kind, TokenKind::Name);
    }

    #[test]
    fn test_function_vs_reference() {
        // LOG10 followed by '(' is a function, not the cell LOG10
        let tokens = tokenize("LOG10(100)");
        assert_eq!(tokens[0].kind, TokenKind::Function);
        assert_eq!(tokens[0].text, "LOG10");
        let tokens = tokenize("LOG10");
        assert_eq!(tokens[0].kind, TokenKind::CellRef);
    }

    #[test]
    fn test_sheet_names() {
        let tokens = tokenize("'My Sheet'!B2");
        assert_eq!(tokens[0].kind, TokenKind::Sheet);
        assert_eq!(tokens[0].text, "My Sheet");
        assert_eq!(tokens[1].kind, TokenKind::CellRef);

        let tokens = tokenize("Sheet1!A1:B4");
        assert_eq!(tokens[0].kind, TokenKind::Sheet);
        assert_eq!(tokens[0].text, "Sheet1");
        assert_eq!(
            tokens[1..].iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::CellRef, TokenKind::Colon, TokenKind::CellRef]
        );
    }

    #[test]
    fn test_error_literals() {
        for literal in ERROR_LITERALS {
            let tokens = tokenize(literal);
            assert_eq!(tokens.len(), 1, "lexing {literal}");
            assert_eq!(tokens[0].kind, TokenKind::Error);
        }
        // #DIV/0! must not lex as #DIV then /0!
        let tokens = tokenize("1+#DIV/0!");
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].text, "#DIV/0!");
    }

    #[test]
    fn test_booleans() {
        let tokens = tokenize("TRUE+false");
        assert_eq!(tokens[0].kind, TokenKind::Bool);
        assert_eq!(tokens[2].kind, TokenKind::Bool);
        assert_eq!(tokens[2].text, "FALSE");
        // TRUE( is the function, not the literal
        let tokens = tokenize("TRUE()");
        assert_eq!(tokens[0].kind, TokenKind::Function);
    }

    #[test]
    fn test_named_range() {
        let tokens = tokenize("TaxRate*2");
        assert_eq!(tokens[0].kind, TokenKind::Name);
        assert_eq!(tokens[0].text, "TaxRate");
    }

    #[test]
    fn test_stream_stops_after_error() {
        let tokens = tokenize("1+@+2");
        let error_pos = tokens
            .iter()
            .position(|t| t.kind == TokenKind::LexError)
            .unwrap();
        assert_eq!(error_pos, tokens.len() - 1);
    }
}
