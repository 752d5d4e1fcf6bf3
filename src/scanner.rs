//! Streaming lexer for Lox source.
//!
//! [`Scanner`] walks a byte slice and yields `Result<Token>` items: whitespace
//! and `//` comments are skipped, every other lexeme becomes a token, and the
//! stream always ends with exactly one `EOF`.  A lexical error is yielded in
//! place of the offending lexeme and scanning resumes right after it, so a
//! caller that keeps pulling sees every error in the file.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for item in Scanner::new(b"print 1 + 2; // comment") {
//!     match item {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

/// Reserved words, resolved at compile time.
static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Token kind for a byte that is a complete lexeme on its own.
fn punctuator(byte: u8) -> Option<TokenType> {
    let tt = match byte {
        b'(' => TokenType::LEFT_PAREN,
        b')' => TokenType::RIGHT_PAREN,
        b'{' => TokenType::LEFT_BRACE,
        b'}' => TokenType::RIGHT_BRACE,
        b',' => TokenType::COMMA,
        b'.' => TokenType::DOT,
        b'-' => TokenType::MINUS,
        b'+' => TokenType::PLUS,
        b';' => TokenType::SEMICOLON,
        b'*' => TokenType::STAR,
        _ => return None,
    };
    Some(tt)
}

#[inline]
fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Lexer over a borrowed source buffer.  Emitted tokens own their lexemes,
/// so they may outlive the buffer.
pub struct Scanner<'a> {
    src: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to examine.
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume the next byte if it is `expected`.
    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `with_eq` if the next byte is `=`, otherwise `alone`.
    fn one_or_two(&mut self, alone: TokenType, with_eq: TokenType) -> TokenType {
        if self.eat(b'=') {
            with_eq
        } else {
            alone
        }
    }

    fn lexeme(&self) -> &'a [u8] {
        &self.src[self.start..self.pos]
    }

    /// Scan one lexeme starting at `self.pos`.  `Ok(None)` means the bytes
    /// consumed were insignificant (whitespace, newline, comment).
    fn scan_token(&mut self, byte: u8) -> Result<Option<TokenType>> {
        if let Some(tt) = punctuator(byte) {
            return Ok(Some(tt));
        }

        let tt = match byte {
            b'!' => self.one_or_two(TokenType::BANG, TokenType::BANG_EQUAL),
            b'=' => self.one_or_two(TokenType::EQUAL, TokenType::EQUAL_EQUAL),
            b'<' => self.one_or_two(TokenType::LESS, TokenType::LESS_EQUAL),
            b'>' => self.one_or_two(TokenType::GREATER, TokenType::GREATER_EQUAL),

            b'/' if self.eat(b'/') => {
                self.skip_comment();
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                self.skip_continuation_bytes();
                let character = String::from_utf8_lossy(self.lexeme());
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", character),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// Consume the rest of a multi-byte UTF-8 sequence so one character
    /// yields one error.
    fn skip_continuation_bytes(&mut self) {
        while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
            self.pos += 1;
        }
    }

    /// Jump to the next newline (left unconsumed for line counting) or EOF.
    fn skip_comment(&mut self) {
        self.pos = match memchr(b'\n', &self.src[self.pos..]) {
            Some(offset) => self.pos + offset,
            None => self.src.len(),
        };
    }

    /// String literal; may span lines.  The payload excludes the quotes.
    fn string(&mut self) -> Result<TokenType> {
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\n') => self.line += 1,
                Some(_) => {}
                None => return Err(LoxError::lex(self.line, "Unterminated string.")),
            }
        }

        let body = &self.src[self.start + 1..self.pos - 1];
        Ok(TokenType::STRING(String::from_utf8_lossy(body).into_owned()))
    }

    /// Digits with an optional fraction; a trailing `.` is not consumed.
    fn number(&mut self) -> TokenType {
        self.skip_digits();

        let has_fraction =
            self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if has_fraction {
            self.pos += 1;
            self.skip_digits();
        }

        // Only ASCII digits and one '.' were consumed.
        let value = std::str::from_utf8(self.lexeme())
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .unwrap_or_default();

        TokenType::NUMBER(value)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_some_and(is_identifier_byte) {
            self.pos += 1;
        }

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.start = self.pos;

            let Some(byte) = self.bump() else {
                self.done = true;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            };

            match self.scan_token(byte) {
                Ok(None) => continue,
                Ok(Some(tt)) => {
                    let lexeme = String::from_utf8_lossy(self.lexeme()).into_owned();
                    debug!("Scanned {:?} on line {}", tt, self.line);
                    return Some(Ok(Token::new(tt, lexeme, self.line)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `src` to completion, collecting every token and every lexical error.
pub fn scan_all(src: &[u8]) -> (Vec<Token>, Vec<LoxError>) {
    let (tokens, errors): (Vec<_>, Vec<_>) = Scanner::new(src).partition(|item| item.is_ok());

    let tokens: Vec<Token> = tokens.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<LoxError> = errors.into_iter().filter_map(Result::err).collect();

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
