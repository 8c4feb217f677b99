//! Lexer for the condition / order mini-language.
//!
//! Dotted identifiers (`OptionalAddress.Country.Name`, with an optional
//! bracket hint such as `person[optional_address].name`) come out as a single
//! [`Token::Ident`]. Operators are always single characters: `!=` is lexed as
//! `Op('!')` followed by `Op('=')`, and consumers join the adjacent pairs that
//! form a comparison themselves.

use compact_str::CompactString;

/// Reserved words that act as operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    In,
    Not,
    And,
    Or,
    Like,
    Is,
    Between,
    Exists,
    Asc,
    Desc,
    True,
    False,
}

impl Keyword {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Keyword::In => "IN",
            Keyword::Not => "NOT",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Like => "LIKE",
            Keyword::Is => "IS",
            Keyword::Between => "BETWEEN",
            Keyword::Exists => "EXISTS",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        const ALL: [Keyword; 12] = [
            Keyword::In,
            Keyword::Not,
            Keyword::And,
            Keyword::Or,
            Keyword::Like,
            Keyword::Is,
            Keyword::Between,
            Keyword::Exists,
            Keyword::Asc,
            Keyword::Desc,
            Keyword::True,
            Keyword::False,
        ];
        ALL.into_iter().find(|k| k.as_str().eq_ignore_ascii_case(word))
    }
}

const AGGREGATES: [&str; 7] = ["MIN", "MAX", "LENGTH", "AVG", "GROUP", "COUNT", "SUM"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Possibly dotted identifier, raw text including any `[hint]`.
    Ident(CompactString),
    /// Function name; aggregates are upper-cased.
    Func(CompactString),
    /// String literal, raw text including delimiters.
    Str(CompactString),
    Int(CompactString),
    Float(CompactString),
    Placeholder,
    LParen,
    RParen,
    Comma,
    Op(char),
    Keyword(Keyword),
    Null,
    /// Any character outside the token alphabet, passed through untouched.
    Other(char),
    Eof,
}

/// Streaming tokenizer; yields [`Token::Eof`] exactly once, then `None`.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else if c == '[' {
                self.eat_while(|c| c != ']');
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];

        if self.peek() == Some('(') {
            return Token::Func(aggregate(word).unwrap_or(word).into());
        }
        if word.eq_ignore_ascii_case("NULL") || word.eq_ignore_ascii_case("NIL") {
            return Token::Null;
        }
        if let Some(keyword) = Keyword::parse(word) {
            return Token::Keyword(keyword);
        }
        if let Some(name) = aggregate(word) {
            return Token::Func(name.into());
        }
        Token::Ident(word.into())
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        self.eat_while(|c| c.is_ascii_digit());
        let is_float = self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
            return Token::Float(self.src[start..self.pos].into());
        }
        Token::Int(self.src[start..self.pos].into())
    }

    /// Scans a quoted literal. An unterminated literal ends the token stream.
    fn string(&mut self, quote: char) -> Token {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => break,
                Some(_) => {}
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        Token::Str(self.src[start..self.pos].into())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            self.done = true;
            return Some(Token::Eof);
        };

        let token = match c {
            c if c.is_alphabetic() || c == '_' => self.ident(),
            c if c.is_ascii_digit() => self.number(),
            '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                let start = self.pos;
                self.bump();
                self.eat_while(|c| c.is_ascii_digit());
                Token::Float(self.src[start..self.pos].into())
            }
            '\'' | '"' | '`' => self.string(c),
            _ => {
                self.bump();
                match c {
                    '?' => Token::Placeholder,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '=' | '!' | '>' | '<' | '*' | '%' | '/' | '-' | '+' => Token::Op(c),
                    other => Token::Other(other),
                }
            }
        };

        // An unterminated literal stops scanning; the stream still ends with Eof.
        if self.done {
            self.done = false;
            self.pos = self.src.len();
        }
        Some(token)
    }
}

fn aggregate(word: &str) -> Option<&'static str> {
    AGGREGATES
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(word))
}

/// Tokenizes the whole input, including the trailing [`Token::Eof`].
pub fn tokenize(src: &str) -> Vec<Token> {
    Lexer::new(src).collect()
}
