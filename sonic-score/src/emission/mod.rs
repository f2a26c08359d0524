//! Per-run state of score generation.
//!
//! EmissionState holds current metre, position inside the current bar
//! and the instructions emitted so far.
//!
//! Bars and parts are opened by [EmissionState::open_bar] and
//! [EmissionState::open_part]. They return scopes, which close the bar
//! (or part) when dropped, so closing instruction is emitted on every
//! exit path, including `?`.
//!
//! # Example
//!
//! ```
//! # use fraction::Fraction;
//! # use sonic_score::emission::{EmissionState, Finish};
//! # use sonic_score::primitives::{Metre, MetreLiteral, Pitch};
//! let mut state = EmissionState::new();
//! state.use_metre(Metre::new(&MetreLiteral::flat(&[(1, 4); 4])).unwrap());
//! {
//!     let mut part = state.open_part();
//!     let mut bar = part.open_bar().unwrap();
//!     let one = Fraction::new(1u64, 1u64);
//!     bar.add_note(Pitch::parse("c4").unwrap(), 0, one).unwrap();
//!     bar.add_rest(0, Fraction::new(3u64, 1u64)).unwrap();
//!     assert_eq!(bar.offset(), Fraction::new(4u64, 1u64));
//! }
//! let stream = state.finish(None, Finish::Show);
//! assert_eq!(stream.iter().filter(|i| i.is_time_signature()).count(), 1);
//! ```

pub mod instruction;

use std::ops::{Deref, DerefMut};

use fraction::Fraction;

use crate::{
    primitives::{add, resolve_duration, zero, Metre, Pitch},
    ScoreError, ScoreResult,
};

pub use instruction::{Container, Finish, Instruction, InstructionStream};

#[derive(Debug)]
pub struct EmissionState {
    metre: Option<Metre>,
    /// true from `use_metre` until the metre is written to a bar
    metre_changed: bool,
    /// in quarters from the bar start
    offset: Fraction,
    in_bar: bool,
    part_depth: usize,
    instructions: Vec<Instruction>,
}
impl Default for EmissionState {
    fn default() -> Self {
        Self::new()
    }
}
impl EmissionState {
    pub fn new() -> Self {
        Self {
            metre: None,
            metre_changed: false,
            offset: zero(),
            in_bar: false,
            part_depth: 0,
            instructions: Vec::new(),
        }
    }

    pub fn metre(&self) -> Option<&Metre> {
        self.metre.as_ref()
    }
    pub fn metre_changed(&self) -> bool {
        self.metre_changed
    }
    pub fn offset(&self) -> Fraction {
        self.offset
    }
    pub fn in_bar(&self) -> bool {
        self.in_bar
    }
    pub fn part_depth(&self) -> usize {
        self.part_depth
    }
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Replace current metre. It will be written to the next non-empty
    /// bar.
    pub fn use_metre(&mut self, metre: Metre) {
        log::debug!(
            "use metre {:?}, beat duration: {}",
            metre.tree(),
            metre.beat_duration()
        );
        self.metre = Some(metre);
        self.metre_changed = true;
    }

    pub fn use_bpm(&mut self, bpm: Fraction) -> ScoreResult<()> {
        let referent = self.current_metre("use_bpm")?.beat_duration();
        self.require_bar("use_bpm")?;
        self.instructions.push(Instruction::Tempo { bpm, referent });
        Ok(())
    }

    /// # Returns
    /// Quarter length of the note.
    pub fn add_note(
        &mut self,
        pitch: Pitch,
        level: usize,
        duration: Fraction,
    ) -> ScoreResult<Fraction> {
        let quarter_length = self.resolve("add_note", level, duration)?;
        log::trace!("note {pitch} at {}: {quarter_length}", self.offset);
        self.push_event(Instruction::Note {
            pitch,
            quarter_length,
        })
    }

    /// # Returns
    /// Quarter length of the chord.
    pub fn add_chord(
        &mut self,
        pitches: Vec<Pitch>,
        level: usize,
        duration: Fraction,
    ) -> ScoreResult<Fraction> {
        let quarter_length = self.resolve("add_note", level, duration)?;
        log::trace!("chord {pitches:?} at {}: {quarter_length}", self.offset);
        self.push_event(Instruction::Chord {
            pitches,
            quarter_length,
        })
    }

    /// # Returns
    /// Quarter length of the rest.
    pub fn add_rest(
        &mut self,
        level: usize,
        duration: Fraction,
    ) -> ScoreResult<Fraction> {
        let quarter_length = self.resolve("add_rest", level, duration)?;
        log::trace!("rest at {}: {quarter_length}", self.offset);
        self.push_event(Instruction::Rest { quarter_length })
    }

    pub fn open_part(&mut self) -> PartScope<'_> {
        self.instructions.push(Instruction::OpenPart);
        self.part_depth += 1;
        PartScope { state: self }
    }

    /// Start a new bar from offset 0.
    pub fn open_bar(&mut self) -> ScoreResult<BarScope<'_>> {
        if self.in_bar {
            return Err(ScoreError::NestedBar);
        }
        self.instructions.push(Instruction::OpenMeasure);
        self.offset = zero();
        self.in_bar = true;
        Ok(BarScope { state: self })
    }

    /// Append title and the final action, and give the instructions
    /// away.
    pub fn finish(
        mut self,
        title: Option<String>,
        finish: Finish,
    ) -> InstructionStream {
        self.instructions
            .push(Instruction::Title(title.unwrap_or_default()));
        self.instructions.push(Instruction::Finish(finish));
        InstructionStream::from(self.instructions)
    }

    fn current_metre(&self, verb: &'static str) -> ScoreResult<&Metre> {
        self.metre.as_ref().ok_or(ScoreError::NoMetre(verb))
    }

    fn require_bar(&self, verb: &'static str) -> ScoreResult<()> {
        match self.in_bar {
            true => Ok(()),
            false => Err(ScoreError::NoOpenBar(verb)),
        }
    }

    fn resolve(
        &self,
        verb: &'static str,
        level: usize,
        duration: Fraction,
    ) -> ScoreResult<Fraction> {
        let metre = self.current_metre(verb)?;
        self.require_bar(verb)?;
        resolve_duration(metre.tree(), level, self.offset, duration)
    }

    fn push_event(&mut self, event: Instruction) -> ScoreResult<Fraction> {
        let quarter_length = event.quarter_length().unwrap_or_else(zero);
        self.offset = add(self.offset, quarter_length)?;
        self.instructions.push(event);
        Ok(quarter_length)
    }

    fn close_bar(&mut self) {
        if self.metre_changed && self.offset > zero() {
            if let Some(metre) = &self.metre {
                self.instructions.push(Instruction::TimeSignature {
                    beat_sequence: metre.tree().clone(),
                });
            }
            self.metre_changed = false;
        }
        let container = match self.part_depth {
            0 => Container::Score,
            _ => Container::Part,
        };
        self.instructions
            .push(Instruction::CloseMeasure { container });
        self.in_bar = false;
    }

    fn close_part(&mut self) {
        self.instructions.push(Instruction::ClosePart);
        self.part_depth -= 1;
    }
}

/// Open bar. Closes it on drop.
#[derive(Debug)]
pub struct BarScope<'a> {
    state: &'a mut EmissionState,
}
impl Deref for BarScope<'_> {
    type Target = EmissionState;
    fn deref(&self) -> &Self::Target {
        self.state
    }
}
impl DerefMut for BarScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}
impl Drop for BarScope<'_> {
    fn drop(&mut self) {
        self.state.close_bar();
    }
}

/// Open part (thread). Closes it on drop.
#[derive(Debug)]
pub struct PartScope<'a> {
    state: &'a mut EmissionState,
}
impl Deref for PartScope<'_> {
    type Target = EmissionState;
    fn deref(&self) -> &Self::Target {
        self.state
    }
}
impl DerefMut for PartScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}
impl Drop for PartScope<'_> {
    fn drop(&mut self) {
        self.state.close_part();
    }
}
