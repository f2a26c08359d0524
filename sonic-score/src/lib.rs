//! Translate a declarative score description into a music21 program.
//!
//! The flow is:
//! script (or hand-built calls) → [`pipeline::Pipeline`] →
//! [`emission::InstructionStream`] → [`music21_render`] text.
//!
//! Durations are resolved against a hierarchical metre: every note is
//! given as "`duration` units of beat-level `level`", and the unit is
//! looked up in the [`primitives::MetreTree`] at the running bar offset.

pub mod emission;
pub mod music21_render;
pub mod pipeline;
pub mod primitives;
pub mod script;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("Level {level} is out of range for metre of depth {depth}")]
    LevelOutOfRange { level: usize, depth: usize },
    #[error("No metre in use: `{0}` called before `use_metre`")]
    NoMetre(&'static str),
    #[error("Metre sequence can not be empty")]
    EmptyMetre,
    #[error("Malformed metre expression: `{0}`")]
    MalformedMetre(String),
    #[error("Invalid pitch: `{0}`")]
    InvalidPitch(String),
    #[error("`{0}` can be called only inside a bar")]
    NoOpenBar(&'static str),
    #[error("Bar can not be opened inside another bar")]
    NestedBar,
}
pub type ScoreResult<T> = Result<T, ScoreError>;
