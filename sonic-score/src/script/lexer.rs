use std::{iter::Peekable, str::Chars};

use super::{ScriptError, ScriptErrorKind};

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Ident(String),
    /// `$name`, without the dollar
    Global(String),
    /// `:name`, without the colon
    Symbol(String),
    Str(String),
    /// raw text, e.g. `1/4r`, `120`, `0.5`
    Number(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Assign,
    Newline,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
    Lexer {
        chars: source.chars().peekable(),
        line: 1,
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<Spanned>,
}
impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Spanned>, ScriptError> {
        while let Some(c) = self.chars.next() {
            let token = match c {
                '\n' | ';' => {
                    self.push(Token::Newline);
                    if c == '\n' {
                        self.line += 1;
                    }
                    continue;
                }
                c if c.is_whitespace() => continue,
                '#' => {
                    while self.chars.next_if(|c| *c != '\n').is_some() {}
                    continue;
                }
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '=' => Token::Assign,
                '"' | '\'' => Token::Str(self.string(c)?),
                ':' => Token::Symbol(self.word(None)),
                '$' => Token::Global(self.word(None)),
                c if c.is_ascii_digit() || c == '-' => {
                    Token::Number(self.number(c))
                }
                c if c.is_alphabetic() || c == '_' => {
                    Token::Ident(self.word(Some(c)))
                }
                c => return Err(self.error(ScriptErrorKind::UnexpectedChar(c))),
            };
            self.push(token);
        }
        Ok(self.tokens)
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(Spanned {
            token,
            line: self.line,
        });
    }

    fn error(&self, kind: ScriptErrorKind) -> ScriptError {
        ScriptError {
            line: self.line,
            kind,
        }
    }

    fn word(&mut self, first: Option<char>) -> String {
        let mut word: String = first.into_iter().collect();
        while let Some(c) =
            self.chars.next_if(|c| c.is_alphanumeric() || *c == '_')
        {
            word.push(c);
        }
        word
    }

    fn number(&mut self, first: char) -> String {
        let mut number = String::from(first);
        while let Some(c) = self
            .chars
            .next_if(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '/'))
        {
            number.push(c);
        }
        number
    }

    fn string(&mut self, quote: char) -> Result<String, ScriptError> {
        let start = self.line;
        let mut string = String::new();
        loop {
            let c = self.chars.next().ok_or(ScriptError {
                line: start,
                kind: ScriptErrorKind::UnterminatedString,
            })?;
            match c {
                c if c == quote => return Ok(string),
                '\\' => match self.chars.next() {
                    Some('n') => string.push('\n'),
                    Some('t') => string.push('\t'),
                    Some(escaped) => string.push(escaped),
                    None => {
                        return Err(ScriptError {
                            line: start,
                            kind: ScriptErrorKind::UnterminatedString,
                        })
                    }
                },
                '\n' => {
                    self.line += 1;
                    string.push(c);
                }
                c => string.push(c),
            }
        }
    }
}
