//! Rendering of the instruction stream into a music21 python program.
//!
//! This is the only place, where text of the target program is built.
//! Values are rendered as python literals, that give back exactly the
//! same values: fractions stay fractions, strings are escaped.

pub mod settings;

use std::str::FromStr;

use fraction::Fraction;
use itertools::Itertools;

use crate::{
    emission::{Container, Finish, Instruction, InstructionStream},
    primitives::{parse_rational, parts, MetreTree, Pitch},
    ScoreError, ScoreResult,
};

pub use settings::{output_path, run_python, RenderSettings};

static HEADER: &str = "from fractions import Fraction\n\
                       from music21 import *\n\
                       \n\
                       score = stream.Score()\n";
static TERMINAL_OPEN: &str = "meter.MeterTerminal('";
static TERMINAL_CLOSE: &str = "')";
static SEQUENCE_OPEN: &str = "meter.MeterSequence([";
static SEQUENCE_CLOSE: &str = "])";

pub trait RendersToMusic21 {
    fn render_music21(&self) -> String;
}

/// Integer if whole, `Fraction(n, d)` otherwise.
///
/// NaN and infinities become python floats.
impl RendersToMusic21 for Fraction {
    fn render_music21(&self) -> String {
        let Some((numer, denom)) = parts(self) else {
            return format!("float('{self}')");
        };
        let sign = match self.is_sign_negative() && numer != 0 {
            true => "-",
            false => "",
        };
        match denom {
            1 => format!("{sign}{numer}"),
            _ => format!("Fraction({sign}{numer}, {denom})"),
        }
    }
}

/// Beat sequence for `TimeSignature.beatSequence`.
///
/// ```
/// # use fraction::Fraction;
/// # use sonic_score::music21_render::RendersToMusic21;
/// # use sonic_score::primitives::{MetreLiteral, MetreTree};
/// let tree = MetreTree::from_literal(&MetreLiteral::list([
///     MetreLiteral::flat(&[(1, 8), (1, 8)]),
///     MetreLiteral::Fraction(1, 4),
/// ])).unwrap();
/// assert_eq!(
///     tree.render_music21(),
///     "meter.MeterSequence([\
///     meter.MeterSequence([meter.MeterTerminal('1/8'), \
///     meter.MeterTerminal('1/8')]), meter.MeterTerminal('1/4')])"
/// );
/// ```
impl RendersToMusic21 for MetreTree {
    fn render_music21(&self) -> String {
        match self {
            Self::Terminal(fraction) => match parts(fraction) {
                Some((numer, denom)) => {
                    format!("{TERMINAL_OPEN}{numer}/{denom}{TERMINAL_CLOSE}")
                }
                None => format!("{TERMINAL_OPEN}{fraction}{TERMINAL_CLOSE}"),
            },
            Self::Sequence(children) => format!(
                "{SEQUENCE_OPEN}{}{SEQUENCE_CLOSE}",
                children.iter().map(|c| c.render_music21()).join(", ")
            ),
        }
    }
}

impl RendersToMusic21 for Pitch {
    fn render_music21(&self) -> String {
        self.name().render_music21()
    }
}

/// Single-quoted python string literal.
impl RendersToMusic21 for str {
    fn render_music21(&self) -> String {
        let mut literal = String::with_capacity(self.len() + 2);
        literal.push('\'');
        for c in self.chars() {
            match c {
                '\\' => literal.push_str("\\\\"),
                '\'' => literal.push_str("\\'"),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                '\t' => literal.push_str("\\t"),
                c if c.is_control() => {
                    literal.push_str(&format!("\\u{:04x}", c as u32))
                }
                c => literal.push(c),
            }
        }
        literal.push('\'');
        literal
    }
}

impl RendersToMusic21 for InstructionStream {
    fn render_music21(&self) -> String {
        let mut renderer = StreamRenderer::default();
        let mut program = String::from(HEADER);
        for instruction in self.iter() {
            program.push_str(&renderer.render(instruction));
            program.push('\n');
        }
        program
    }
}

/// Keeps track of nested parts, so every part has its own variable.
#[derive(Debug, Default)]
struct StreamRenderer {
    part_depth: usize,
}
impl StreamRenderer {
    fn part_name(&self) -> String {
        match self.part_depth {
            0 | 1 => "part".to_string(),
            depth => format!("part_{depth}"),
        }
    }

    fn render(&mut self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::OpenPart => {
                self.part_depth += 1;
                format!("{} = stream.Part()", self.part_name())
            }
            Instruction::ClosePart => {
                let line = format!("score.append({})", self.part_name());
                self.part_depth = self.part_depth.saturating_sub(1);
                line
            }
            Instruction::OpenMeasure => "measure = stream.Measure()".into(),
            Instruction::Note {
                pitch,
                quarter_length,
            } => format!(
                "n = note.Note({})\n\
                n.duration.quarterLength = {}\n\
                measure.append(n)",
                pitch.render_music21(),
                quarter_length.render_music21()
            ),
            Instruction::Chord {
                pitches,
                quarter_length,
            } => format!(
                "n = chord.Chord([{}])\n\
                n.duration.quarterLength = {}\n\
                measure.append(n)",
                pitches.iter().map(|p| p.render_music21()).join(", "),
                quarter_length.render_music21()
            ),
            Instruction::Rest { quarter_length } => format!(
                "r = note.Rest(quarterLength={})\n\
                measure.append(r)",
                quarter_length.render_music21()
            ),
            Instruction::Tempo { bpm, referent } => format!(
                "measure.append(tempo.MetronomeMark(number={}, referent={}))",
                bpm.render_music21(),
                referent.render_music21()
            ),
            Instruction::TimeSignature { beat_sequence } => format!(
                "ts = measure.bestTimeSignature()\n\
                ts.beatSequence = {}\n\
                measure.insert(0, ts)",
                beat_sequence.render_music21()
            ),
            Instruction::CloseMeasure { container } => match container {
                Container::Part => format!("{}.append(measure)", self.part_name()),
                Container::Score => "score.append(measure)".into(),
            },
            Instruction::Title(title) => format!(
                "score.metadata = metadata.Metadata(title={})",
                title.render_music21()
            ),
            Instruction::Finish(Finish::Show) => "score.show()".into(),
            Instruction::Finish(Finish::Write(path)) => format!(
                "score.write('musicxml', {})",
                path.to_string_lossy().render_music21()
            ),
        }
    }
}

/// Read back beat sequence, rendered by [RendersToMusic21].
impl FromStr for MetreTree {
    type Err = ScoreError;

    fn from_str(s: &str) -> ScoreResult<Self> {
        let (tree, rest) = parse_tree(s)?;
        match rest.trim().is_empty() {
            true => Ok(tree),
            false => Err(ScoreError::MalformedMetre(rest.to_string())),
        }
    }
}

fn parse_tree(input: &str) -> ScoreResult<(MetreTree, &str)> {
    let input = input.trim_start();
    let malformed = || ScoreError::MalformedMetre(input.to_string());
    if let Some(rest) = input.strip_prefix(TERMINAL_OPEN) {
        let (fraction, rest) =
            rest.split_once(TERMINAL_CLOSE).ok_or_else(malformed)?;
        let tree = MetreTree::terminal(parse_rational(fraction)?)?;
        return Ok((tree, rest));
    }
    let mut rest = input.strip_prefix(SEQUENCE_OPEN).ok_or_else(malformed)?;
    let mut children = Vec::new();
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(SEQUENCE_CLOSE) {
            return Ok((MetreTree::sequence(children)?, after));
        }
        if !children.is_empty() {
            rest = rest.strip_prefix(',').ok_or_else(malformed)?;
        }
        let (child, after) = parse_tree(rest)?;
        children.push(child);
        rest = after;
    }
}
