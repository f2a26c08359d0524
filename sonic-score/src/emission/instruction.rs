//! Structured form of the generated program.
//!
//! Every variant maps to one music21 statement group, see
//! [crate::music21_render].
use std::path::PathBuf;

use fraction::Fraction;

use crate::primitives::{MetreTree, Pitch};

#[derive(Debug, PartialEq, Clone)]
pub enum Instruction {
    OpenPart,
    ClosePart,
    OpenMeasure,
    Note {
        pitch: Pitch,
        quarter_length: Fraction,
    },
    Chord {
        pitches: Vec<Pitch>,
        quarter_length: Fraction,
    },
    Rest {
        quarter_length: Fraction,
    },
    /// bpm per beat of the current metre
    Tempo {
        bpm: Fraction,
        referent: Fraction,
    },
    /// Best time signature of the measure, with the given beat sequence.
    TimeSignature {
        beat_sequence: MetreTree,
    },
    CloseMeasure {
        container: Container,
    },
    Title(String),
    Finish(Finish),
}
impl Instruction {
    pub fn is_time_signature(&self) -> bool {
        matches!(self, Self::TimeSignature { .. })
    }
    /// Note, chord or rest.
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Self::Note { .. } | Self::Chord { .. } | Self::Rest { .. }
        )
    }
    pub fn quarter_length(&self) -> Option<Fraction> {
        match self {
            Self::Note { quarter_length, .. }
            | Self::Chord { quarter_length, .. }
            | Self::Rest { quarter_length } => Some(*quarter_length),
            _ => None,
        }
    }
}

/// Where closed measure goes.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Container {
    Score,
    Part,
}

/// The last thing generated program does with the score.
#[derive(Debug, PartialEq, Clone)]
pub enum Finish {
    Show,
    Write(PathBuf),
}

/// Append-only sequence of instructions of a finished run.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct InstructionStream {
    instructions: Vec<Instruction>,
}
impl InstructionStream {
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
    pub fn len(&self) -> usize {
        self.instructions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }
}
impl From<Vec<Instruction>> for InstructionStream {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}
impl<'a> IntoIterator for &'a InstructionStream {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
