//! Resolving of note lengths against the metre.
//!
//! Note length is given as `duration` units of some metre `level`. The
//! unit is the sub-metre under the current bar offset, so in unbalanced
//! metres (e.g. 5/8 as 2+3) the same `(level, duration)` pair can give
//! different lengths depending on where the note starts.
//!
//! All offsets are in quarter notes from the bar start.
//!
//! ```
//! # use fraction::Fraction;

use fraction::Fraction;

use super::{add, div, mul, sub, zero, MetreTree};
use crate::{ScoreError, ScoreResult};

/// Sub-metre at the given level, that contains offset.
///
/// Level 0 is the tree itself. Each next level descends into child,
/// which span contains offset. Terminal, reached before the level (in a
/// shallow branch of unbalanced metre), stands for all deeper levels.
///
/// # Returns
/// The node and offset relative to the node start.
pub fn get_level(
    tree: &MetreTree,
    level: usize,
    offset: Fraction,
) -> ScoreResult<(&MetreTree, Fraction)> {
    check_level(tree, level)?;
    let (node, local, _) = descend(tree, level, offset)?;
    Ok((node, local))
}

/// Length (in quarters) of a single unit of the level at offset.
///
/// Unit is the child of the level node. If the node is terminal, unit
/// is the terminal halved once per level below it: in flat 4/4 level 1
/// is an eighth, in 6/8 level 2 is a sixteenth.
pub fn offset_to_quarter_length(
    tree: &MetreTree,
    level: usize,
    offset: Fraction,
) -> ScoreResult<Fraction> {
    check_level(tree, level)?;
    let (unit, _, unit_level) = descend(tree, level + 1, offset)?;
    subdivide(unit.quarter_length()?, level + 1 - unit_level)
}

/// Length (in quarters) of `duration` units of the level at offset.
pub fn resolve_duration(
    tree: &MetreTree,
    level: usize,
    offset: Fraction,
    duration: Fraction,
) -> ScoreResult<Fraction> {
    if duration.is_sign_negative() {
        return Err(ScoreError::InvalidDuration(format!(
            "note duration can not be negative, got {duration}"
        )));
    }
    mul(offset_to_quarter_length(tree, level, offset)?, duration)
}

fn check_level(tree: &MetreTree, level: usize) -> ScoreResult<()> {
    let depth = tree.depth();
    match level > depth {
        true => Err(ScoreError::LevelOutOfRange { level, depth }),
        false => Ok(()),
    }
}

/// Walk down to level, stopping at terminal.
///
/// # Returns
/// The node, offset relative to it, and the level of the node.
fn descend(
    tree: &MetreTree,
    level: usize,
    offset: Fraction,
) -> ScoreResult<(&MetreTree, Fraction, usize)> {
    let mut node = tree;
    let mut local = offset;
    for reached in 0..level {
        match locate(node, local)? {
            Some((child, child_local)) => {
                node = child;
                local = child_local;
            }
            None => return Ok((node, local, reached)),
        }
    }
    Ok((node, local, level))
}

/// Find child, which contains offset.
///
/// Offset past the node end wraps around, so overfull bar keeps
/// following metre pattern.
///
/// None, if node is terminal.
fn locate(
    node: &MetreTree,
    offset: Fraction,
) -> ScoreResult<Option<(&MetreTree, Fraction)>> {
    let children = node.children();
    if children.is_empty() {
        return Ok(None);
    }
    let offset = wrap(offset, node.quarter_length()?)?;
    let mut start = zero();
    for child in children {
        let end = add(start, child.quarter_length()?)?;
        if offset < end {
            return Ok(Some((child, sub(offset, start)?)));
        }
        start = end;
    }
    Ok(None)
}

fn wrap(offset: Fraction, span: Fraction) -> ScoreResult<Fraction> {
    if offset < span || span == zero() {
        return Ok(offset);
    }
    let cycles = div(offset, span)?.floor();
    sub(offset, mul(cycles, span)?)
}

/// Length halved `times` times.
fn subdivide(length: Fraction, times: usize) -> ScoreResult<Fraction> {
    let parts = u32::try_from(times)
        .ok()
        .and_then(|times| 2_u64.checked_pow(times))
        .ok_or_else(|| {
            ScoreError::InvalidDuration(format!(
                "{length} can not be halved {times} times"
            ))
        })?;
    div(length, Fraction::new(parts, 1_u64))
}
