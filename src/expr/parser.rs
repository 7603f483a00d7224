use crate::error::EvaluationError;
use crate::expr::ast::{BinaryOp, Builtin, Expr, UnaryOp};
use crate::expr::lexer::{Lexer, Span, Token, TokenKind};

/// Binding power of prefix `-`, `+` and `!`: above `*` but below `^`, so
/// `-x^2` is `-(x^2)`.
const PREFIX_BP: u8 = 13;

/// Deepest tree the parser will build, and the deepest it will recurse while
/// building one. Evaluating and dropping an [`Expr`] recurse over its height,
/// so this also bounds the stack those need.
pub const MAX_DEPTH: usize = 256;

/// A parsed subtree and its height (a leaf has height 1).
struct Parsed {
    expr: Expr,
    height: usize,
}

impl Parsed {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }
}

/// Pratt parser over the lexer's token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|tok| tok.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |tok| tok.span.end);
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    /// Parses one complete expression; trailing tokens are an error.
    pub fn parse(mut self) -> Result<Expr, EvaluationError> {
        if self.is_at_end() {
            return Err(EvaluationError::parse("empty expression", 0));
        }
        let parsed = self.parse_conditional()?;
        if !self.is_at_end() {
            let tok = self.peek();
            return Err(EvaluationError::parse(
                format!("unexpected {:?}", tok.kind),
                tok.span.start,
            ));
        }
        Ok(parsed.expr)
    }

    /// `cond ? a : b`, right-associative and looser than every binary operator.
    fn parse_conditional(&mut self) -> Result<Parsed, EvaluationError> {
        let cond = self.parse_expr(0)?;
        if self.peek().kind != TokenKind::Question {
            return Ok(cond);
        }
        self.advance();
        let then = self.nested(Self::parse_conditional)?;
        self.expect(TokenKind::Colon, "':' in conditional")?;
        let otherwise = self.nested(Self::parse_conditional)?;
        let height = 1 + cond.height.max(then.height).max(otherwise.height);
        self.node(
            Expr::Conditional {
                cond: Box::new(cond.expr),
                then: Box::new(then.expr),
                otherwise: Box::new(otherwise.expr),
            },
            height,
        )
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Parsed, EvaluationError> {
        self.nested(|parser| parser.parse_binary(min_bp))
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Parsed, EvaluationError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (op, left_bp, right_bp) = match self.peek().kind {
                TokenKind::OrOr => (BinaryOp::Or, 1, 2),
                TokenKind::AndAnd => (BinaryOp::And, 3, 4),
                TokenKind::EqEq => (BinaryOp::Eq, 5, 6),
                TokenKind::BangEq => (BinaryOp::NotEq, 5, 6),
                TokenKind::Lt => (BinaryOp::Lt, 7, 8),
                TokenKind::LtEq => (BinaryOp::LtEq, 7, 8),
                TokenKind::Gt => (BinaryOp::Gt, 7, 8),
                TokenKind::GtEq => (BinaryOp::GtEq, 7, 8),
                TokenKind::Plus => (BinaryOp::Add, 9, 10),
                TokenKind::Minus => (BinaryOp::Sub, 9, 10),
                TokenKind::Star => (BinaryOp::Mul, 11, 12),
                TokenKind::Slash => (BinaryOp::Div, 11, 12),
                TokenKind::Percent => (BinaryOp::Rem, 11, 12),
                TokenKind::Caret => (BinaryOp::Pow, 16, 15), // right-associative
                _ => break,
            };

            if left_bp < min_bp {
                break;
            }

            self.advance();
            let rhs = self.parse_expr(right_bp)?;
            // Left-deep chains such as `x+x+x` grow here without recursing.
            let height = 1 + lhs.height.max(rhs.height);
            lhs = self.node(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs.expr),
                    rhs: Box::new(rhs.expr),
                },
                height,
            )?;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Parsed, EvaluationError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Number(value) => Ok(Parsed::leaf(Expr::Number(value))),
            TokenKind::Ident(name) => {
                if self.peek().kind == TokenKind::LParen {
                    self.parse_call(name)
                } else {
                    Ok(Parsed::leaf(Expr::Var(name)))
                }
            }
            TokenKind::LParen => {
                let inner = self.parse_conditional()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Minus => self.parse_unary(UnaryOp::Neg),
            TokenKind::Plus => self.parse_unary(UnaryOp::Plus),
            TokenKind::Bang => self.parse_unary(UnaryOp::Not),
            TokenKind::Eof => Err(EvaluationError::parse(
                "unexpected end of expression",
                tok.span.start,
            )),
            kind => Err(EvaluationError::parse(
                format!("expected expression, found {kind:?}"),
                tok.span.start,
            )),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<Parsed, EvaluationError> {
        let operand = self.parse_expr(PREFIX_BP)?;
        let height = 1 + operand.height;
        self.node(
            Expr::Unary {
                op,
                operand: Box::new(operand.expr),
            },
            height,
        )
    }

    fn parse_call(&mut self, name: String) -> Result<Parsed, EvaluationError> {
        let Some(func) = Builtin::from_name(&name) else {
            return Err(EvaluationError::UnknownFunction(name));
        };
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        let mut height = 0;
        if self.peek().kind != TokenKind::RParen {
            loop {
                let arg = self.parse_conditional()?;
                height = height.max(arg.height);
                args.push(arg.expr);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;

        if args.len() != func.arity() {
            return Err(EvaluationError::Arity {
                function: name,
                expected: func.arity(),
                found: args.len(),
            });
        }
        self.node(Expr::Call { func, args }, 1 + height)
    }

    /// Runs `f` one recursion level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Parsed, EvaluationError>,
    ) -> Result<Parsed, EvaluationError> {
        if self.nesting >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        let parsed = f(self);
        self.nesting -= 1;
        parsed
    }

    /// Wraps a finished node, failing if it is taller than [`MAX_DEPTH`].
    fn node(&self, expr: Expr, height: usize) -> Result<Parsed, EvaluationError> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(Parsed { expr, height })
    }

    fn too_deep(&self) -> EvaluationError {
        EvaluationError::parse("expression nested too deeply", self.peek().span.start)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, EvaluationError> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(EvaluationError::parse(
                format!("expected {what}, found {:?}", tok.kind),
                tok.span.start,
            ))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }
}

/// Tokenizes and parses `source` in one go.
pub fn parse(source: &str) -> Result<Expr, EvaluationError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}
