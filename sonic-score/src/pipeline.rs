//! Drives [EmissionState] by the ordered sequence of front-end calls.
//!
//! Calls are the verbs of the score script: `use_metre`, `use_bpm`,
//! `bar`, `add_note`, `add_rest`, `in_thread` and the title assignment.
//! Block verbs (`bar`, `in_thread`) carry their nested calls.
//!
//! Generation is all-or-nothing: the first failing call stops the run,
//! and no instructions are returned.

use fraction::Fraction;

use crate::{
    emission::{EmissionState, Finish, InstructionStream},
    primitives::{Metre, MetreLiteral, Pitch},
    ScoreError,
};

/// Pitch argument of `add_note`, as written by user (e.g. `cs4`).
#[derive(Debug, PartialEq, Clone)]
pub enum PitchArg {
    Single(String),
    Chord(Vec<String>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Call {
    UseMetre(MetreLiteral),
    UseBpm(Fraction),
    Bar(Vec<Call>),
    AddNote {
        pitch: PitchArg,
        level: usize,
        duration: Fraction,
    },
    AddRest {
        level: usize,
        duration: Fraction,
    },
    InThread(Vec<Call>),
    SetTitle(String),
}
impl Call {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::UseMetre(_) => "use_metre",
            Self::UseBpm(_) => "use_bpm",
            Self::Bar(_) => "bar",
            Self::AddNote { .. } => "add_note",
            Self::AddRest { .. } => "add_rest",
            Self::InThread(_) => "in_thread",
            Self::SetTitle(_) => "$title",
        }
    }
}

/// Failed call and its 1-based position in the call sequence.
///
/// Positions count nested calls in order of appearance, block calls
/// before their contents.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("call #{position} (`{verb}`): {source}")]
pub struct PipelineError {
    pub position: usize,
    pub verb: &'static str,
    #[source]
    pub source: ScoreError,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    finish: Finish,
}
impl Pipeline {
    /// `finish` is appended after the title, as the last instruction.
    pub fn new(finish: Finish) -> Self {
        Self { finish }
    }

    /// Process calls from scratch.
    ///
    /// # Example
    ///
    /// ```
    /// # use fraction::Fraction;
    /// # use sonic_score::emission::Finish;
    /// # use sonic_score::pipeline::{Call, Pipeline, PitchArg};
    /// # use sonic_score::primitives::MetreLiteral;
    /// let calls = vec![
    ///     Call::UseMetre(MetreLiteral::flat(&[(1, 4); 4])),
    ///     Call::InThread(vec![Call::Bar(vec![Call::AddNote {
    ///         pitch: PitchArg::Single("cs4".to_string()),
    ///         level: 0,
    ///         duration: Fraction::new(4u64, 1u64),
    ///     }])]),
    /// ];
    /// let stream = Pipeline::new(Finish::Show).run(&calls).unwrap();
    /// assert_eq!(stream.iter().filter(|i| i.is_event()).count(), 1);
    /// ```
    pub fn run(
        &self,
        calls: &[Call],
    ) -> Result<InstructionStream, PipelineError> {
        let mut state = EmissionState::new();
        let mut runner = Runner::default();
        runner.run_block(&mut state, calls)?;
        log::debug!("processed {} calls", runner.position);
        Ok(state.finish(runner.title, self.finish.clone()))
    }
}

#[derive(Debug, Default)]
struct Runner {
    position: usize,
    title: Option<String>,
}
impl Runner {
    fn run_block(
        &mut self,
        state: &mut EmissionState,
        calls: &[Call],
    ) -> Result<(), PipelineError> {
        for call in calls {
            self.dispatch(state, call)?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        state: &mut EmissionState,
        call: &Call,
    ) -> Result<(), PipelineError> {
        self.position += 1;
        let position = self.position;
        let fail = |source| PipelineError {
            position,
            verb: call.verb(),
            source,
        };
        log::debug!("call #{position}: {}", call.verb());
        match call {
            Call::UseMetre(literal) => {
                state.use_metre(Metre::new(literal).map_err(fail)?)
            }
            Call::UseBpm(bpm) => state.use_bpm(*bpm).map_err(fail)?,
            Call::Bar(block) => {
                let mut bar = state.open_bar().map_err(fail)?;
                self.run_block(&mut bar, block)?;
            }
            Call::InThread(block) => {
                let mut part = state.open_part();
                self.run_block(&mut part, block)?;
            }
            Call::AddNote {
                pitch: PitchArg::Single(name),
                level,
                duration,
            } => {
                let pitch = Pitch::parse(name).map_err(fail)?;
                state.add_note(pitch, *level, *duration).map_err(fail)?;
            }
            Call::AddNote {
                pitch: PitchArg::Chord(names),
                level,
                duration,
            } => {
                let pitches =
                    Pitch::parse_chord(names.iter().map(String::as_str))
                        .map_err(fail)?;
                state.add_chord(pitches, *level, *duration).map_err(fail)?;
            }
            Call::AddRest { level, duration } => {
                state.add_rest(*level, *duration).map_err(fail)?;
            }
            Call::SetTitle(title) => self.title = Some(title.clone()),
        }
        Ok(())
    }
}
