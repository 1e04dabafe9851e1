use crate::ast::*;
use crate::error::{Error, Result};
use crate::tokenizer::{Token, Tokenizer};

/// How deep parenthesized sub-expressions may nest: a group inside a group,
/// no further.
pub const MAX_GROUP_DEPTH: usize = 2;

/// Recursive-descent parser for one filter condition.
///
/// ```text
/// predicate := expr COMPARE expr
/// expr      := term (('+' | '-') term)*
/// term      := factor (('*' | '/') factor)*
/// factor    := IDENT | ['-'] NUMBER | '(' expr ')'
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Tokenizes and parses a single condition.
    ///
    /// # Example
    /// ```
    /// # use qframe::parser::Parser;
    /// # use qframe::ast::CompareOp;
    /// let p = Parser::parse_condition("price * 2 >= 40").unwrap();
    /// assert_eq!(p.op, CompareOp::GreaterEqual);
    /// assert!(Parser::parse_condition("price >").is_err());
    /// ```
    pub fn parse_condition(input: &str) -> Result<Predicate> {
        let tokens = Tokenizer::new(input).tokenize()?;
        Parser::new(tokens).parse().map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("invalid condition `{input}`: {msg}")),
            other => other,
        })
    }

    pub fn parse(&mut self) -> Result<Predicate> {
        let lhs = self.parse_expr()?;
        let op = self.consume_comparison()?;
        let rhs = self.parse_expr()?;

        if !self.is_at_end() {
            return Err(Error::validation(format!(
                "unexpected token after condition: {:?}",
                self.current_token()
            )));
        }
        Ok(Predicate { lhs, op, rhs })
    }

    // helpers
    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::validation(format!(
                "expected {expected:?}, found {:?}",
                self.current_token()
            )))
        }
    }

    fn consume_comparison(&mut self) -> Result<CompareOp> {
        let op = match self.current_token() {
            Token::Greater => CompareOp::Greater,
            Token::Lower => CompareOp::Lower,
            Token::GreaterEqual => CompareOp::GreaterEqual,
            Token::LowerEqual => CompareOp::LowerEqual,
            Token::Equal | Token::EqualEqual => CompareOp::Equal,
            Token::NotEqual => CompareOp::NotEqual,
            Token::Like => CompareOp::Like,
            Token::Tilde => CompareOp::Match,
            other => {
                return Err(Error::validation(format!(
                    "expected a comparison operator, found {other:?}"
                )));
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current_token() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current_token() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        match self.current_token().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Column(name))
            }
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Minus => {
                self.advance();
                match self.current_token().clone() {
                    Token::Number(n) => {
                        self.advance();
                        Ok(Expr::Number(format!("-{n}")))
                    }
                    other => Err(Error::validation(format!(
                        "unary minus applies to numeric literals only, found {other:?}"
                    ))),
                }
            }
            Token::LeftParen => {
                if self.depth == MAX_GROUP_DEPTH {
                    return Err(Error::validation(format!(
                        "parentheses nest deeper than {MAX_GROUP_DEPTH} levels"
                    )));
                }
                self.advance();
                self.depth += 1;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                self.consume(Token::RightParen)?;
                Ok(inner)
            }
            other => Err(Error::validation(format!(
                "expected a column, number or `(`, found {other:?}"
            ))),
        }
    }
}
