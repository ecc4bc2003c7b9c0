// src/parser/lexer.rs
//! Lexical analyzer (tokenizer) for the promotion DSL

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords (case-insensitive in source)
    When,
    Then,
    And,
    Or,
    Buy,
    Get,
    Of,
    Free,
    Cart,
    Percent,
    Fixed,
    Product,
    Category,
    Label,

    // Literals and identifiers
    Ident(String),
    Number(f64),
    Str(String),

    // Comparison operators
    Gt,
    Gte,
    Lt,
    Lte,
    EqEq,
    NotEq,

    // Punctuation
    LeftParen,
    RightParen,
    Comma,
    Dot,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Gt => write!(f, "'>'"),
            Token::Gte => write!(f, "'>='"),
            Token::Lt => write!(f, "'<'"),
            Token::Lte => write!(f, "'<='"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lex error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Tokenize DSL source, best-effort.
///
/// Unrecognized characters are recorded as errors and scanning continues so
/// the parser can surface further syntax errors in the same pass.
pub fn tokenize(input: &str) -> (Vec<Token>, Vec<LexError>) {
    Lexer::new(input).run()
}

struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            let ch = self.current_char();

            match ch {
                '(' => {
                    self.advance();
                    tokens.push(Token::LeftParen);
                }
                ')' => {
                    self.advance();
                    tokens.push(Token::RightParen);
                }
                ',' => {
                    self.advance();
                    tokens.push(Token::Comma);
                }
                '.' => {
                    self.advance();
                    tokens.push(Token::Dot);
                }
                // Longest match first so ">=" is not split into '>' and '='.
                '>' => {
                    self.advance();
                    if !self.is_at_end() && self.current_char() == '=' {
                        self.advance();
                        tokens.push(Token::Gte);
                    } else {
                        tokens.push(Token::Gt);
                    }
                }
                '<' => {
                    self.advance();
                    if !self.is_at_end() && self.current_char() == '=' {
                        self.advance();
                        tokens.push(Token::Lte);
                    } else {
                        tokens.push(Token::Lt);
                    }
                }
                '=' => {
                    self.advance();
                    if !self.is_at_end() && self.current_char() == '=' {
                        self.advance();
                        tokens.push(Token::EqEq);
                    } else {
                        errors.push(self.error("expected '==' after '='"));
                    }
                }
                '!' => {
                    self.advance();
                    if !self.is_at_end() && self.current_char() == '=' {
                        self.advance();
                        tokens.push(Token::NotEq);
                    } else {
                        errors.push(self.error("expected '!=' after '!'"));
                    }
                }
                '"' => match self.read_string() {
                    Ok(token) => tokens.push(token),
                    Err(err) => errors.push(err),
                },
                _ if ch.is_ascii_digit() => match self.read_number() {
                    Ok(token) => tokens.push(token),
                    Err(err) => errors.push(err),
                },
                _ if ch.is_ascii_alphabetic() || ch == '_' => {
                    tokens.push(self.read_word());
                }
                _ => {
                    errors.push(self.error(&format!("unexpected character: '{}'", ch)));
                    self.advance();
                }
            }
        }

        (tokens, errors)
    }

    fn read_word(&mut self) -> Token {
        let start = self.position;

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.advance();
            } else {
                break;
            }
        }

        let word: String = self.input[start..self.position].iter().collect();

        match word.to_ascii_uppercase().as_str() {
            "WHEN" => Token::When,
            "THEN" => Token::Then,
            "AND" => Token::And,
            "OR" => Token::Or,
            "BUY" => Token::Buy,
            "GET" => Token::Get,
            "OF" => Token::Of,
            "FREE" => Token::Free,
            "CART" => Token::Cart,
            "PERCENT" => Token::Percent,
            "FIXED" => Token::Fixed,
            "PRODUCT" => Token::Product,
            "CATEGORY" => Token::Category,
            "LABEL" => Token::Label,
            _ => Token::Ident(word),
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            self.advance();
        }

        // A fractional part needs a digit after the dot, otherwise the dot
        // is left for the punctuation lexer.
        if !self.is_at_end()
            && self.current_char() == '.'
            && self.peek().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(&format!("invalid number: {}", text)))
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        self.advance(); // consume opening "

        let mut result = String::new();

        while !self.is_at_end() && self.current_char() != '"' {
            let ch = self.current_char();

            if ch == '\\' {
                self.advance();
                if self.is_at_end() {
                    return Err(self.error("unterminated string"));
                }

                let escaped = match self.current_char() {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '"' => '"',
                    '\\' => '\\',
                    c => c,
                };

                result.push(escaped);
                self.advance();
            } else {
                result.push(ch);
                self.advance();
            }
        }

        if self.is_at_end() {
            return Err(self.error("unterminated string"));
        }

        self.advance(); // consume closing "

        Ok(Token::Str(result))
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            if self.current_char() == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn error(&self, message: &str) -> LexError {
        LexError {
            message: message.to_string(),
            line: self.line,
            column: self.column,
        }
    }
}
