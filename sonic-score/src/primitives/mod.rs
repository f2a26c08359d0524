//! Building blocks of the score description.
//!
//! Fractions are whole-note based in the metre (1/4 is a quarter note),
//! while every resolved length and bar offset is in quarter notes, as
//! music21 counts them.

pub mod fraction_tools;
pub mod metre;
pub mod pitch;
pub mod resolver;

pub use fraction_tools::{
    add, div, mul, parse_rational, parts, quarter_length, reduce, sub, zero,
};
pub use metre::{Metre, MetreLiteral, MetreTree};
pub use pitch::Pitch;
pub use resolver::{get_level, offset_to_quarter_length, resolve_duration};
