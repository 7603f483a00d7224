use crate::error::EvaluationError;

/// Char offsets `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,

    Lt,
    LtEq,
    Gt,
    GtEq,
    EqEq,
    BangEq,
    Bang,
    AndAnd,
    OrOr,

    Question,
    Colon,
    Comma,
    LParen,
    RParen,

    Eof,
}

impl TokenKind {
    fn can_end_implicit_mul(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_) | TokenKind::Ident(_) | TokenKind::RParen
        )
    }

    fn can_start_implicit_mul(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_) | TokenKind::Ident(_) | TokenKind::LParen
        )
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Splits the source into tokens, ending with [`TokenKind::Eof`].
    ///
    /// Juxtaposition such as `2x` or `(x+1)(x-1)` gets an explicit `*` token;
    /// an identifier directly followed by `(` stays a call and two adjacent
    /// numbers stay separate (the parser rejects them).
    pub fn tokenize(mut self) -> Result<Vec<Token>, EvaluationError> {
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            let token = self.next_token()?;
            if let Some(prev) = self.tokens.last() {
                let is_call = matches!(prev.kind, TokenKind::Ident(_))
                    && token.kind == TokenKind::LParen;
                let is_number_pair = matches!(prev.kind, TokenKind::Number(_))
                    && matches!(token.kind, TokenKind::Number(_));
                if prev.kind.can_end_implicit_mul()
                    && token.kind.can_start_implicit_mul()
                    && !is_call
                    && !is_number_pair
                {
                    let span = Span::new(prev.span.end, token.span.start);
                    self.tokens.push(Token::new(TokenKind::Star, span));
                }
            }
            self.tokens.push(token);
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(self.pos, self.pos)));
        Ok(self.tokens)
    }

    fn next_token(&mut self) -> Result<Token, EvaluationError> {
        let start = self.pos;
        let ch = self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' | '\u{2212}' => TokenKind::Minus,
            '*' | '\u{00D7}' | '\u{22C5}' => TokenKind::Star,
            '/' | '\u{00F7}' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '<' => self.choose('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.choose('=', TokenKind::GtEq, TokenKind::Gt),
            '!' => self.choose('=', TokenKind::BangEq, TokenKind::Bang),
            '\u{2264}' => TokenKind::LtEq,
            '\u{2265}' => TokenKind::GtEq,
            '\u{2260}' => TokenKind::BangEq,
            '=' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::EqEq
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::OrOr
            }
            '\u{03C0}' => TokenKind::Ident("pi".to_string()),
            c if c.is_ascii_digit() || c == '.' => return self.read_number(start),
            c if is_ident_start(c) => return Ok(self.read_identifier(start)),
            _ => {
                return Err(EvaluationError::parse(
                    format!("unexpected character '{ch}'"),
                    start,
                ));
            }
        };

        Ok(Token::new(kind, Span::new(start, self.pos)))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, EvaluationError> {
        self.pos = start;
        self.eat_digits();
        if self.peek() == Some('.') {
            self.advance();
            self.eat_digits();
        }

        // Only an exponent if digits follow, so `2e` stays `2 * e`.
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.eat_digits();
            }
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let value: f64 = text
            .parse()
            .map_err(|_| EvaluationError::parse(format!("invalid number '{text}'"), start))?;
        Ok(Token::new(TokenKind::Number(value), Span::new(start, self.pos)))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        let text: String = self.source[start..self.pos].iter().collect();
        Token::new(TokenKind::Ident(text), Span::new(start, self.pos))
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn choose(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            matched
        } else {
            otherwise
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.pos];
        self.pos += 1;
        c
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
