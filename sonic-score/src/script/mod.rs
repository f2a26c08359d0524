//! Reader of score scripts.
//!
//! Scripts are written in the ruby-flavoured language, produced by
//! MusicXML converters:
//!
//! ```text
//! $title = "Suku"
//! in_thread do
//!   use_metre [[1/8r, 1/8r, 1/8r], [1/8r, 1/8r, 1/8r]]
//!   bar do
//!     use_bpm 92
//!     add_note :cs4, 0, 1
//!     add_note [:c4, :eb4], 1, 2
//!     add_rest 1, 1
//!   end
//! end
//! ```
//!
//! Metre fractions can also be written as `[numerator, denominator]`
//! pairs: `use_metre [[1, 4], [1, 4], [1, 4]]`.

mod lexer;

use fraction::Fraction;

use crate::{
    pipeline::{Call, PitchArg},
    primitives::{parse_rational, parts, MetreLiteral},
    ScoreError,
};
use lexer::{tokenize, Spanned, Token};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ScriptErrorKind {
    #[error("Unexpected character: `{0}`")]
    UnexpectedChar(char),
    #[error("String is not terminated")]
    UnterminatedString,
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Unknown call: `{0}`")]
    UnknownCall(String),
    #[error("`{0}` block is not closed by `end`")]
    UnclosedBlock(&'static str),
    #[error("`end` without block")]
    StrayEnd,
    #[error("Invalid argument of `{verb}`: {reason}")]
    BadArgument { verb: &'static str, reason: String },
    #[error(transparent)]
    Score(#[from] ScoreError),
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ScriptError {
    pub line: usize,
    pub kind: ScriptErrorKind,
}

/// Read script into the ordered call sequence.
pub fn parse_script(source: &str) -> Result<Vec<Call>, ScriptError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
    };
    let calls = parser.block(None)?;
    log::debug!("parsed {} top-level calls", calls.len());
    Ok(calls)
}

/// Argument value, before it is given meaning by the call.
#[derive(Debug, PartialEq, Clone)]
enum Value {
    Number(String),
    Symbol(String),
    Str(String),
    List(Vec<Value>),
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}
impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        token
    }

    fn error(&self, kind: impl Into<ScriptErrorKind>) -> ScriptError {
        ScriptError {
            line: self.line(),
            kind: kind.into(),
        }
    }

    fn unexpected(&self) -> ScriptError {
        let found = match self.peek() {
            Some(token) => format!("{token:?}"),
            None => "end of script".to_string(),
        };
        self.error(ScriptErrorKind::UnexpectedToken(found))
    }

    fn expect(&mut self, expected: Token) -> Result<(), ScriptError> {
        match self.peek() == Some(&expected) {
            true => {
                self.pos += 1;
                Ok(())
            }
            false => Err(self.unexpected()),
        }
    }

    fn is_end(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word == "end")
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    /// Calls until `end` (if inside block) or until the end of script.
    fn block(
        &mut self,
        opened: Option<(&'static str, usize)>,
    ) -> Result<Vec<Call>, ScriptError> {
        let mut calls = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().is_none() {
                return match opened {
                    None => Ok(calls),
                    Some((verb, line)) => Err(ScriptError {
                        line,
                        kind: ScriptErrorKind::UnclosedBlock(verb),
                    }),
                };
            }
            if self.is_end() {
                return match opened {
                    None => Err(self.error(ScriptErrorKind::StrayEnd)),
                    Some(_) => {
                        self.pos += 1;
                        Ok(calls)
                    }
                };
            }
            calls.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> Result<Call, ScriptError> {
        let line = self.line();
        let call = match self.next() {
            Some(Token::Global(name)) if name == "title" => {
                self.expect(Token::Assign)?;
                match self.next() {
                    Some(Token::Str(title)) => Call::SetTitle(title),
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected());
                    }
                }
            }
            Some(Token::Global(name)) => {
                return Err(ScriptError {
                    line,
                    kind: ScriptErrorKind::UnknownCall(format!("${name}")),
                })
            }
            Some(Token::Ident(verb)) => self.call(&verb, line)?,
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };
        match self.peek() {
            None | Some(Token::Newline) => Ok(call),
            _ if self.is_end() => Ok(call),
            _ => Err(self.unexpected()),
        }
    }

    fn call(&mut self, verb: &str, line: usize) -> Result<Call, ScriptError> {
        let bad = |verb, reason: &str| ScriptError {
            line,
            kind: ScriptErrorKind::BadArgument {
                verb,
                reason: reason.to_string(),
            },
        };
        let score = |error: ScoreError| ScriptError {
            line,
            kind: error.into(),
        };
        match verb {
            "bar" => {
                self.expect(Token::Ident("do".to_string()))?;
                Ok(Call::Bar(self.block(Some(("bar", line)))?))
            }
            "in_thread" => {
                self.expect(Token::Ident("do".to_string()))?;
                Ok(Call::InThread(self.block(Some(("in_thread", line)))?))
            }
            "use_metre" => match self.args()?.as_slice() {
                [metre] => Ok(Call::UseMetre(
                    metre_literal(metre)
                        .ok_or_else(|| bad("use_metre", "expected metre list"))?
                        .map_err(score)?,
                )),
                _ => Err(bad("use_metre", "expected single metre list")),
            },
            "use_bpm" => match self.args()?.as_slice() {
                [Value::Number(bpm)] => {
                    Ok(Call::UseBpm(parse_rational(bpm).map_err(score)?))
                }
                _ => Err(bad("use_bpm", "expected tempo number")),
            },
            "add_note" => match self.args()?.as_slice() {
                [pitch, level, duration] => Ok(Call::AddNote {
                    pitch: pitch_arg(pitch)
                        .ok_or_else(|| bad("add_note", "expected pitch"))?,
                    level: level_arg(level)
                        .ok_or_else(|| bad("add_note", "expected level"))?,
                    duration: duration_arg(duration)
                        .ok_or_else(|| bad("add_note", "expected duration"))?
                        .map_err(score)?,
                }),
                _ => Err(bad("add_note", "expected pitch, level, duration")),
            },
            "add_rest" => match self.args()?.as_slice() {
                [level, duration] => Ok(Call::AddRest {
                    level: level_arg(level)
                        .ok_or_else(|| bad("add_rest", "expected level"))?,
                    duration: duration_arg(duration)
                        .ok_or_else(|| bad("add_rest", "expected duration"))?
                        .map_err(score)?,
                }),
                _ => Err(bad("add_rest", "expected level, duration")),
            },
            unknown => Err(ScriptError {
                line,
                kind: ScriptErrorKind::UnknownCall(unknown.to_string()),
            }),
        }
    }

    /// Comma-separated values, optionally in parentheses.
    fn args(&mut self) -> Result<Vec<Value>, ScriptError> {
        let parens = self.peek() == Some(&Token::LParen);
        if parens {
            self.pos += 1;
        }
        let mut args = Vec::new();
        let done = |parser: &Self| match parens {
            true => parser.peek() == Some(&Token::RParen),
            false => {
                matches!(parser.peek(), None | Some(Token::Newline))
                    || parser.is_end()
            }
        };
        while !done(&*self) {
            if !args.is_empty() {
                self.expect(Token::Comma)?;
            }
            args.push(self.value()?);
        }
        if parens {
            self.expect(Token::RParen)?;
        }
        Ok(args)
    }

    fn value(&mut self) -> Result<Value, ScriptError> {
        let value = match self.peek() {
            Some(Token::Number(n)) => Value::Number(n.clone()),
            Some(Token::Symbol(s)) => Value::Symbol(s.clone()),
            Some(Token::Str(s)) => Value::Str(s.clone()),
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_newlines();
                    if self.peek() == Some(&Token::RBracket) {
                        break;
                    }
                    if !items.is_empty() {
                        self.expect(Token::Comma)?;
                        self.skip_newlines();
                    }
                    items.push(self.value()?);
                }
                Value::List(items)
            }
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        Ok(value)
    }
}

/// Plain integer, without rational or decimal parts.
fn integer(text: &str) -> Option<i64> {
    text.parse::<i64>().ok()
}

fn metre_literal(value: &Value) -> Option<Result<MetreLiteral, ScoreError>> {
    match value {
        Value::Number(text) => Some(parse_rational(text).and_then(|frac| {
            let invalid = || ScoreError::InvalidDuration(text.clone());
            let (numer, denom) = parts(&frac).ok_or_else(invalid)?;
            let numer = i64::try_from(numer).map_err(|_| invalid())?;
            let denom = i64::try_from(denom).map_err(|_| invalid())?;
            match frac.is_sign_negative() {
                true => Ok(MetreLiteral::Fraction(-numer, denom)),
                false => Ok(MetreLiteral::Fraction(numer, denom)),
            }
        })),
        Value::List(items) => match items.as_slice() {
            [Value::Number(n), Value::Number(d)] => {
                match (integer(n), integer(d)) {
                    (Some(n), Some(d)) => {
                        Some(Ok(MetreLiteral::Fraction(n, d)))
                    }
                    _ => list_literal(items),
                }
            }
            _ => list_literal(items),
        },
        _ => None,
    }
}

fn list_literal(items: &[Value]) -> Option<Result<MetreLiteral, ScoreError>> {
    let items = items
        .iter()
        .map(metre_literal)
        .collect::<Option<Result<Vec<_>, _>>>()?;
    Some(items.map(MetreLiteral::List))
}

fn pitch_name(value: &Value) -> Option<String> {
    match value {
        Value::Symbol(name) | Value::Str(name) => Some(name.clone()),
        _ => None,
    }
}

fn pitch_arg(value: &Value) -> Option<PitchArg> {
    match value {
        Value::List(items) => Some(PitchArg::Chord(
            items.iter().map(pitch_name).collect::<Option<Vec<_>>>()?,
        )),
        value => pitch_name(value).map(PitchArg::Single),
    }
}

fn level_arg(value: &Value) -> Option<usize> {
    match value {
        Value::Number(text) => text.parse::<usize>().ok(),
        _ => None,
    }
}

fn duration_arg(value: &Value) -> Option<Result<Fraction, ScoreError>> {
    match value {
        Value::Number(text) => Some(parse_rational(text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{parse_script, ScriptError, ScriptErrorKind};
    use crate::{
        pipeline::{Call, PitchArg},
        primitives::MetreLiteral,
        ScoreError,
    };

    #[test]
    fn test_metre_forms() {
        let rational = parse_script("use_metre [[1/8r, 1/8r], [1/4r]]").unwrap();
        assert_eq!(
            rational,
            vec![Call::UseMetre(MetreLiteral::list([
                MetreLiteral::flat(&[(1, 8), (1, 8)]),
                MetreLiteral::flat(&[(1, 4)]),
            ]))]
        );
        let pairs = parse_script("use_metre [[1, 4], [1, 4], [2, 8]]").unwrap();
        assert_eq!(
            pairs,
            vec![Call::UseMetre(MetreLiteral::flat(&[(1, 4), (1, 4), (2, 8)]))]
        );
    }

    #[test]
    fn test_blocks() {
        let calls = parse_script(
            "$title = 'Test'\n\
            in_thread do\n\
              bar do\n\
                use_bpm 92.5\n\
                add_note :cs4, 0, 1\n\
                add_note [:c4, :eb4], 1, 2\n\
                add_rest(1, 1/2r)\n\
              end\n\
            end\n",
        )
        .unwrap();
        let one = Fraction::new(1u64, 1u64);
        assert_eq!(
            calls,
            vec![
                Call::SetTitle("Test".to_string()),
                Call::InThread(vec![Call::Bar(vec![
                    Call::UseBpm(Fraction::new(185u64, 2u64)),
                    Call::AddNote {
                        pitch: PitchArg::Single("cs4".to_string()),
                        level: 0,
                        duration: one,
                    },
                    Call::AddNote {
                        pitch: PitchArg::Chord(vec![
                            "c4".to_string(),
                            "eb4".to_string()
                        ]),
                        level: 1,
                        duration: Fraction::new(2u64, 1u64),
                    },
                    Call::AddRest {
                        level: 1,
                        duration: Fraction::new(1u64, 2u64),
                    },
                ])]),
            ]
        );
    }

    #[test]
    fn test_one_line_block() {
        let calls = parse_script("bar do add_rest 0, 4 end").unwrap();
        assert_eq!(
            calls,
            vec![Call::Bar(vec![Call::AddRest {
                level: 0,
                duration: Fraction::new(4u64, 1u64),
            }])]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_script("bar do\nadd_rest 0, 1\n"),
            Err(ScriptError {
                line: 1,
                kind: ScriptErrorKind::UnclosedBlock("bar")
            })
        );
        assert_eq!(
            parse_script("\n\nend").unwrap_err(),
            ScriptError {
                line: 3,
                kind: ScriptErrorKind::StrayEnd
            }
        );
        assert_eq!(
            parse_script("play 60").unwrap_err().kind,
            ScriptErrorKind::UnknownCall("play".to_string())
        );
        assert!(matches!(
            parse_script("add_rest :c4, 1").unwrap_err().kind,
            ScriptErrorKind::BadArgument {
                verb: "add_rest",
                ..
            }
        ));
        assert_eq!(
            parse_script("use_metre [[1/0r]]").unwrap_err().kind,
            ScriptErrorKind::Score(ScoreError::InvalidDuration(
                "1/0".to_string()
            ))
        );
    }
}
