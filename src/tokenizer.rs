use crate::error::{Error, Result};

/// Smallest meaningful units of a filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- Identifiers & Literals ---
    /// A column name (e.g. `price`, `bid_size`).
    Ident(String),
    /// A numeric literal, kept as written (e.g. `42`, `1.5`, `.25`).
    Number(String),

    // --- Arithmetic ---
    Plus,
    Minus,
    Star,
    Slash,
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,

    // --- Comparisons ---
    Greater,
    Lower,
    GreaterEqual,
    LowerEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// The `like` pattern match keyword.
    Like,
    /// `~`, match
    Tilde,

    // --- Special ---
    /// Represents the end of the input.
    Eof,
}

impl Token {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Greater
                | Token::Lower
                | Token::GreaterEqual
                | Token::LowerEqual
                | Token::Equal
                | Token::EqualEqual
                | Token::NotEqual
                | Token::Like
                | Token::Tilde
        )
    }
}

/// A lexical scanner that converts one condition into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given condition.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens ending with
    /// [Token::Eof].
    ///
    /// # Errors
    /// Returns [Error::Validation] on a character the condition grammar does
    /// not know.
    ///
    /// # Example
    /// ```
    /// # use qframe::tokenizer::{Tokenizer, Token};
    /// let tokens = Tokenizer::new("price>=20").tokenize().unwrap();
    /// assert_eq!(tokens[1], Token::GreaterEqual);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '~' => self.single(Token::Tilde),
            '>' => self.with_equal(Token::Greater, Token::GreaterEqual),
            '<' => self.with_equal(Token::Lower, Token::LowerEqual),
            '=' => self.with_equal(Token::Equal, Token::EqualEqual),
            '!' => {
                self.advance();
                if self.peek_is('=') {
                    self.advance();
                    Ok(Token::NotEqual)
                } else {
                    Err(Error::validation("`!` must be followed by `=`"))
                }
            }
            c if c.is_ascii_alphabetic() => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => self.read_number(),
            '.' if self.next_is_digit() => self.read_number(),
            _ => Err(Error::validation(format!(
                "character {ch:?} is not allowed in a condition"
            ))),
        }
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek_is(&self, c: char) -> bool {
        self.input.get(self.position) == Some(&c)
    }

    fn next_is_digit(&self) -> bool {
        self.input
            .get(self.position + 1)
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    /// Reads a one-char operator that may be extended by a trailing `=`.
    fn with_equal(&mut self, plain: Token, extended: Token) -> Result<Token> {
        self.advance();
        if self.peek_is('=') {
            self.advance();
            Ok(extended)
        } else {
            Ok(plain)
        }
    }

    // --- Extraction Logic ---

    /// Reads `[A-Za-z][A-Za-z0-9_]*`. The keyword `like` is matched
    /// case-insensitively.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_ascii_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        if ident.eq_ignore_ascii_case("like") {
            Token::Like
        } else {
            Token::Ident(ident)
        }
    }

    /// Reads digits with at most one decimal point.
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        let mut seen_dot = false;

        while !self.is_at_end() {
            let c = self.current_char();
            if c.is_ascii_digit() {
                number.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                number.push(c);
            } else {
                break;
            }
            self.advance();
        }

        if number.ends_with('.') {
            return Err(Error::validation(format!(
                "numeric literal `{number}` has no digits after the point"
            )));
        }
        if !self.is_at_end() && (self.current_char().is_ascii_alphabetic() || self.current_char() == '.') {
            return Err(Error::validation(format!(
                "malformed numeric literal starting with `{number}`"
            )));
        }
        Ok(Token::Number(number))
    }
}
