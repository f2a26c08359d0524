//! Pitch names, as music21 understands them.
//!
//! Input names use letters for accidentals (`cs4`, `bb3`), while
//! music21 expects symbols (`c#4`, `b-3`). The first letter is always
//! the step, so `b` there is never treated as flat.

use std::fmt::Display;

use crate::{ScoreError, ScoreResult};

static SHARP: (char, char) = ('s', '#');
static FLAT: (char, char) = ('b', '-');

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Pitch {
    name: String,
}
impl Pitch {
    /// # Example
    ///
    /// ```
    /// # use sonic_score::primitives::Pitch;
    /// assert_eq!(Pitch::parse("cs4").unwrap().name(), "c#4");
    /// assert_eq!(Pitch::parse("bb3").unwrap().name(), "b-3");
    /// assert!(Pitch::parse("h4").is_err());
    /// ```
    pub fn parse(name: &str) -> ScoreResult<Self> {
        let mut chars = name.trim().chars();
        let step = chars
            .next()
            .filter(|c| matches!(c.to_ascii_lowercase(), 'a'..='g'))
            .ok_or_else(|| ScoreError::InvalidPitch(name.to_string()))?;
        let name = std::iter::once(step)
            .chain(chars.map(|c| match c {
                c if c == SHARP.0 => SHARP.1,
                c if c == FLAT.0 => FLAT.1,
                c => c,
            }))
            .collect();
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered chord pitches. Chord can not be empty.
    pub fn parse_chord<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> ScoreResult<Vec<Self>> {
        let pitches = names
            .into_iter()
            .map(Self::parse)
            .collect::<ScoreResult<Vec<_>>>()?;
        match pitches.is_empty() {
            true => Err(ScoreError::InvalidPitch("[]".to_string())),
            false => Ok(pitches),
        }
    }
}
impl Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
