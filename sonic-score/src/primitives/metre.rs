//! Hierarchical metre.
//!
//! Metre is a tree: leaves are fractions of a whole note, nodes are
//! ordered groups of sub-metres. E.g. 6/8 grouped by dotted quarters is
//!
//! ```text
//! Sequence
//! ├── Sequence [1/8, 1/8, 1/8]
//! └── Sequence [1/8, 1/8, 1/8]
//! ```
//!
//! Trees are built once from [MetreLiteral] and never mutated.

use fraction::Fraction;

use super::{add, parts, quarter_length, reduce, zero};
use crate::{ScoreError, ScoreResult};

/// Nested list description of metre, as written by user.
///
/// `[[1, 4], [1, 4]]` is a sequence of two quarters,
/// `[[[1, 8], [1, 8]], [1, 4]]` groups two eights into the first beat.
#[derive(Debug, PartialEq, Clone)]
pub enum MetreLiteral {
    Fraction(i64, i64),
    List(Vec<MetreLiteral>),
}
impl MetreLiteral {
    pub fn list(items: impl IntoIterator<Item = MetreLiteral>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Sequence of simple fractions.
    ///
    /// ```
    /// # use sonic_score::primitives::MetreLiteral;
    /// assert_eq!(
    ///     MetreLiteral::flat(&[(1, 4), (1, 4)]),
    ///     MetreLiteral::List(vec![
    ///         MetreLiteral::Fraction(1, 4),
    ///         MetreLiteral::Fraction(1, 4),
    ///     ])
    /// );
    /// ```
    pub fn flat(pairs: &[(i64, i64)]) -> Self {
        Self::list(pairs.iter().map(|(n, d)| Self::Fraction(*n, *d)))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum MetreTree {
    Terminal(Fraction),
    Sequence(Vec<MetreTree>),
}
impl MetreTree {
    /// Terminal of the given length. Should be finite and strictly
    /// positive.
    pub fn terminal(fraction: Fraction) -> ScoreResult<Self> {
        if parts(&fraction).is_none()
            || fraction.is_sign_negative()
            || fraction == zero()
        {
            return Err(ScoreError::InvalidDuration(format!(
                "metre unit should be positive, got {fraction}"
            )));
        }
        Ok(Self::Terminal(fraction))
    }

    /// Sequence of the given children. Should not be empty.
    pub fn sequence(children: Vec<MetreTree>) -> ScoreResult<Self> {
        if children.is_empty() {
            return Err(ScoreError::EmptyMetre);
        }
        Ok(Self::Sequence(children))
    }

    pub fn from_literal(literal: &MetreLiteral) -> ScoreResult<Self> {
        match literal {
            MetreLiteral::Fraction(numer, denom) => {
                Self::terminal(reduce(*numer, *denom)?)
            }
            MetreLiteral::List(items) => Self::sequence(
                items
                    .iter()
                    .map(Self::from_literal)
                    .collect::<ScoreResult<Vec<_>>>()?,
            ),
        }
    }

    /// Terminal has depth of 0.
    pub fn depth(&self) -> usize {
        match self {
            Self::Terminal(_) => 0,
            Self::Sequence(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn children(&self) -> &[MetreTree] {
        match self {
            Self::Terminal(_) => &[],
            Self::Sequence(children) => children,
        }
    }

    /// Sum of all terminals under the node, in whole notes.
    pub fn extent(&self) -> ScoreResult<Fraction> {
        match self {
            Self::Terminal(fraction) => Ok(*fraction),
            Self::Sequence(children) => children
                .iter()
                .try_fold(zero(), |acc, child| add(acc, child.extent()?)),
        }
    }

    pub fn quarter_length(&self) -> ScoreResult<Fraction> {
        quarter_length(self.extent()?)
    }
}

/// Metre, installed by `use_metre`.
///
/// Root is always a sequence: top-level children are the beats.
#[derive(Debug, PartialEq, Clone)]
pub struct Metre {
    tree: MetreTree,
    beat_duration: Fraction,
    quarter_length: Fraction,
}
impl Metre {
    pub fn new(literal: &MetreLiteral) -> ScoreResult<Self> {
        Self::from_tree(MetreTree::from_literal(literal)?)
    }

    /// Single terminal becomes a one-beat sequence.
    pub fn from_tree(tree: MetreTree) -> ScoreResult<Self> {
        let tree = match tree {
            MetreTree::Terminal(_) => MetreTree::sequence(vec![tree])?,
            sequence => sequence,
        };
        let beat_duration = tree
            .children()
            .first()
            .ok_or(ScoreError::EmptyMetre)?
            .quarter_length()?;
        let quarter_length = tree.quarter_length()?;
        Ok(Self {
            tree,
            beat_duration,
            quarter_length,
        })
    }

    pub fn tree(&self) -> &MetreTree {
        &self.tree
    }

    /// Quarter length of the first top-level beat.
    pub fn beat_duration(&self) -> Fraction {
        self.beat_duration
    }

    /// Whole metre length in quarters.
    pub fn quarter_length(&self) -> Fraction {
        self.quarter_length
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{Metre, MetreLiteral, MetreTree};
    use crate::ScoreError;

    fn six_eight() -> MetreLiteral {
        MetreLiteral::list([
            MetreLiteral::flat(&[(1, 8), (1, 8), (1, 8)]),
            MetreLiteral::flat(&[(1, 8), (1, 8), (1, 8)]),
        ])
    }

    #[test]
    fn test_from_literal() {
        let tree = MetreTree::from_literal(&MetreLiteral::flat(&[
            (2, 8),
            (1, 4),
        ]))
        .unwrap();
        assert_eq!(
            tree,
            MetreTree::Sequence(vec![
                MetreTree::Terminal(Fraction::new(1u64, 4u64)),
                MetreTree::Terminal(Fraction::new(1u64, 4u64)),
            ])
        );
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.extent(), Ok(Fraction::new(1u64, 2u64)));
    }

    #[test]
    fn test_invalid_literal() {
        assert_eq!(
            MetreTree::from_literal(&MetreLiteral::flat(&[(1, 0)])),
            Err(ScoreError::InvalidDuration("1/0".to_string()))
        );
        assert_eq!(
            MetreTree::from_literal(&MetreLiteral::list([
                MetreLiteral::Fraction(1, 4),
                MetreLiteral::List(vec![]),
            ])),
            Err(ScoreError::EmptyMetre)
        );
        assert!(matches!(
            MetreTree::from_literal(&MetreLiteral::flat(&[(-1, 4)])),
            Err(ScoreError::InvalidDuration(_))
        ));
        assert!(matches!(
            MetreTree::from_literal(&MetreLiteral::flat(&[(0, 4)])),
            Err(ScoreError::InvalidDuration(_))
        ));
        assert!(matches!(
            MetreTree::terminal(Fraction::infinity()),
            Err(ScoreError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_extent_overflow() {
        // coprime huge denominators: the sum does not fit in u64
        let tree = MetreTree::from_literal(&MetreLiteral::flat(&[
            (1, 9_223_372_036_854_775_783),
            (1, 9_223_372_036_854_775_643),
        ]))
        .unwrap();
        assert!(matches!(tree.extent(), Err(ScoreError::InvalidDuration(_))));
        assert!(matches!(
            Metre::from_tree(tree),
            Err(ScoreError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_depth_unbalanced() {
        let tree = MetreTree::from_literal(&MetreLiteral::list([
            MetreLiteral::list([
                MetreLiteral::flat(&[(1, 16), (1, 16)]),
                MetreLiteral::Fraction(1, 8),
            ]),
            MetreLiteral::Fraction(1, 4),
        ]))
        .unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.quarter_length(), Ok(Fraction::new(2u64, 1u64)));
    }

    #[test]
    fn test_metre() {
        let metre = Metre::new(&six_eight()).unwrap();
        assert_eq!(metre.beat_duration(), Fraction::new(3u64, 2u64));
        assert_eq!(metre.quarter_length(), Fraction::new(3u64, 1u64));

        let common = Metre::new(&MetreLiteral::flat(&[(1, 4); 4])).unwrap();
        assert_eq!(common.beat_duration(), Fraction::new(1u64, 1u64));

        let single = Metre::new(&MetreLiteral::Fraction(3, 4)).unwrap();
        assert_eq!(single.tree().child_count(), 1);
        assert_eq!(single.beat_duration(), Fraction::new(3u64, 1u64));
    }
}
