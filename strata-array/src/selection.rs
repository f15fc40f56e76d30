use std::fmt::{Display, Formatter};
use std::ops::{Range, RangeFull};
use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail, strata_err};

/// A selection of positions along one axis.
///
/// Selections are interpreted against the extent of the axis they are applied to. `Full` and
/// `Slice` never materialize their positions; composition keeps them lazy for as long as the
/// result is still a contiguous range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AxisSelection {
    /// Every position along the axis, ascending.
    Full,
    /// A contiguous ascending run of positions.
    Slice(Range<usize>),
    /// An explicit list of positions. May be unsorted and may contain duplicates.
    Indices(Arc<[usize]>),
    /// A single position. Only valid for element access, never for views.
    Scalar(usize),
}

impl AxisSelection {
    /// An explicit list of positions.
    pub fn indices(positions: impl Into<Arc<[usize]>>) -> Self {
        Self::Indices(positions.into())
    }

    /// The number of positions selected from an axis of the given extent.
    pub fn len(&self, extent: usize) -> usize {
        match self {
            Self::Full => extent,
            Self::Slice(range) => range.len(),
            Self::Indices(positions) => positions.len(),
            Self::Scalar(_) => 1,
        }
    }

    /// Whether no position is selected from an axis of the given extent.
    pub fn is_empty(&self, extent: usize) -> bool {
        self.len(extent) == 0
    }

    /// The `k`-th selected position. `k` must be less than `self.len(extent)`.
    #[inline]
    pub fn position(&self, k: usize) -> usize {
        match self {
            Self::Full => k,
            Self::Slice(range) => range.start + k,
            Self::Indices(positions) => positions[k],
            Self::Scalar(p) => *p,
        }
    }

    /// Iterate the selected positions in selection order.
    pub fn positions(&self, extent: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len(extent)).map(move |k| self.position(k))
    }

    /// The selected positions as one ascending contiguous range, if they form one.
    ///
    /// Explicit lists qualify when every entry is one greater than the previous entry.
    pub fn as_contiguous(&self, extent: usize) -> Option<Range<usize>> {
        match self {
            Self::Full => Some(0..extent),
            Self::Slice(range) => Some(range.clone()),
            Self::Scalar(p) => Some(*p..*p + 1),
            Self::Indices(positions) => {
                let first = *positions.first()?;
                positions
                    .iter()
                    .tuple_windows()
                    .all(|(a, b)| a + 1 == *b)
                    .then_some(first..first + positions.len())
            }
        }
    }

    /// Check that every selected position lies within `extent`.
    ///
    /// `axis` is only used to name the axis in the error.
    pub fn validate(&self, axis: usize, extent: usize) -> StrataResult<()> {
        match self {
            Self::Full => {}
            Self::Slice(range) => {
                if range.start > range.end {
                    strata_bail!(
                        "slice {}..{} on axis {} is reversed",
                        range.start,
                        range.end,
                        axis
                    );
                }
                if range.end > extent {
                    let value = if range.is_empty() {
                        range.start
                    } else {
                        range.end - 1
                    };
                    strata_bail!(IndexOutOfRange: axis, value, extent);
                }
            }
            Self::Indices(positions) => {
                if let Some(value) = positions.iter().find(|p| **p >= extent) {
                    strata_bail!(IndexOutOfRange: axis, *value, extent);
                }
            }
            Self::Scalar(p) => {
                if *p >= extent {
                    strata_bail!(IndexOutOfRange: axis, *p, extent);
                }
            }
        }
        Ok(())
    }

    /// Apply `inner`, expressed in the output positions of `self`, producing a selection in the
    /// input positions of `self`.
    ///
    /// `inner` must already be validated against the length of `self`. `Full` on either side is
    /// the identity. Composition is associative: `a.compose(&b.compose(&c))` selects the same
    /// positions as `a.compose(&b).compose(&c)`.
    pub fn compose(&self, inner: &AxisSelection) -> AxisSelection {
        match (self, inner) {
            (Self::Full, inner) => inner.clone(),
            (outer, Self::Full) => outer.clone(),
            (Self::Slice(outer), Self::Slice(inner)) => {
                Self::Slice(outer.start + inner.start..outer.start + inner.end)
            }
            (Self::Slice(outer), Self::Indices(inner)) => {
                Self::Indices(inner.iter().map(|k| outer.start + k).collect())
            }
            (Self::Slice(outer), Self::Scalar(k)) => Self::Scalar(outer.start + k),
            (Self::Indices(outer), Self::Slice(inner)) => Self::Indices(outer[inner.clone()].into()),
            (Self::Indices(outer), Self::Indices(inner)) => {
                Self::Indices(inner.iter().map(|k| outer[*k]).collect())
            }
            (Self::Indices(outer), Self::Scalar(k)) => Self::Scalar(outer[*k]),
            (Self::Scalar(p), _) => Self::Scalar(*p),
        }
    }
}

impl From<RangeFull> for AxisSelection {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

impl From<Range<usize>> for AxisSelection {
    fn from(range: Range<usize>) -> Self {
        Self::Slice(range)
    }
}

impl From<Vec<usize>> for AxisSelection {
    fn from(positions: Vec<usize>) -> Self {
        Self::Indices(positions.into())
    }
}

impl From<&[usize]> for AxisSelection {
    fn from(positions: &[usize]) -> Self {
        Self::Indices(positions.into())
    }
}

impl<const N: usize> From<[usize; N]> for AxisSelection {
    fn from(positions: [usize; N]) -> Self {
        Self::Indices(positions.to_vec().into())
    }
}

impl From<usize> for AxisSelection {
    fn from(position: usize) -> Self {
        Self::Scalar(position)
    }
}

impl Display for AxisSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, ":"),
            Self::Slice(range) => write!(f, "{}..{}", range.start, range.end),
            Self::Indices(positions) => write!(f, "[{}]", positions.iter().join(", ")),
            Self::Scalar(p) => write!(f, "{p}"),
        }
    }
}

/// Validate a full set of per-axis selections against `extents`.
///
/// Fails with `ShapeMismatch` when the number of selections differs from the number of axes,
/// and with `IndexOutOfRange` when a position exceeds its axis.
pub(crate) fn validate_all(selections: &[AxisSelection], extents: &[usize]) -> StrataResult<()> {
    if selections.len() != extents.len() {
        return Err(strata_err!(
            ShapeMismatch: "{} selections given for an array with {} dimensions",
            selections.len(),
            extents.len()
        ));
    }
    selections
        .iter()
        .zip(extents)
        .enumerate()
        .try_for_each(|(axis, (selection, extent))| selection.validate(axis, *extent))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_error::StrataError;

    use super::*;

    fn expand(selection: &AxisSelection, extent: usize) -> Vec<usize> {
        selection.positions(extent).collect()
    }

    #[rstest]
    #[case(AxisSelection::Full, 4, vec![0, 1, 2, 3])]
    #[case(AxisSelection::Slice(2..5), 10, vec![2, 3, 4])]
    #[case(AxisSelection::from([5, 1, 1]), 10, vec![5, 1, 1])]
    #[case(AxisSelection::Scalar(7), 10, vec![7])]
    fn positions(#[case] selection: AxisSelection, #[case] extent: usize, #[case] expected: Vec<usize>) {
        assert_eq!(selection.len(extent), expected.len());
        assert_eq!(expand(&selection, extent), expected);
    }

    #[rstest]
    #[case(AxisSelection::from([3, 4, 5]), Some(3..6))]
    #[case(AxisSelection::from([3, 5]), None)]
    #[case(AxisSelection::from([4, 3]), None)]
    #[case(AxisSelection::from([2, 2]), None)]
    #[case(AxisSelection::from(Vec::new()), None)]
    #[case(AxisSelection::Full, Some(0..8))]
    fn contiguous_detection(#[case] selection: AxisSelection, #[case] expected: Option<Range<usize>>) {
        assert_eq!(selection.as_contiguous(8), expected);
    }

    #[test]
    fn out_of_range_names_axis_and_value() {
        let err = AxisSelection::from([2, 3, 10]).validate(1, 10).unwrap_err();
        assert!(matches!(
            err,
            StrataError::IndexOutOfRange {
                axis: 1,
                value: 10,
                len: 10
            }
        ));
        assert!(AxisSelection::Slice(2..11).validate(0, 10).is_err());
        assert!(AxisSelection::Slice(2..10).validate(0, 10).is_ok());
        assert!(AxisSelection::Scalar(10).validate(0, 10).is_err());
    }

    #[test]
    fn empty_slice_past_the_end_reports_its_start() {
        let err = AxisSelection::Slice(5..5).validate(2, 3).unwrap_err();
        assert!(matches!(
            err,
            StrataError::IndexOutOfRange {
                axis: 2,
                value: 5,
                len: 3
            }
        ));
        assert!(AxisSelection::Slice(3..3).validate(0, 3).is_ok());
    }

    #[test]
    fn dimensionality_must_match() {
        let err = validate_all(&[AxisSelection::Full], &[3, 4]).unwrap_err();
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
    }

    #[test]
    fn full_is_identity() {
        let list = AxisSelection::from([4, 0, 4]);
        assert_eq!(AxisSelection::Full.compose(&list), list);
        assert_eq!(list.compose(&AxisSelection::Full), list);
        assert_eq!(
            AxisSelection::Full.compose(&AxisSelection::Full),
            AxisSelection::Full
        );
    }

    #[test]
    fn slices_stay_lazy() {
        let composed = AxisSelection::Slice(10..100).compose(&AxisSelection::Slice(5..15));
        assert_eq!(composed, AxisSelection::Slice(15..25));
    }

    #[rstest]
    #[case(AxisSelection::Slice(2..12), AxisSelection::from([9, 0, 0]), vec![11, 2, 2])]
    #[case(AxisSelection::from([7, 5, 3, 1]), AxisSelection::Slice(1..3), vec![5, 3])]
    #[case(AxisSelection::from([7, 5, 3, 1]), AxisSelection::from([3, 3, 0]), vec![1, 1, 7])]
    fn composes_lists(
        #[case] outer: AxisSelection,
        #[case] inner: AxisSelection,
        #[case] expected: Vec<usize>,
    ) {
        let composed = outer.compose(&inner);
        assert_eq!(expand(&composed, 0), expected);
    }

    #[test]
    fn composition_is_associative() {
        let extent = 40;
        let a = AxisSelection::Slice(3..33);
        let b = AxisSelection::from([29, 0, 4, 4, 17, 8, 12]);
        let c = AxisSelection::from([6, 1, 1, 3]);
        let d = AxisSelection::Slice(1..3);

        let left = a.compose(&b.compose(&c.compose(&d)));
        let right = a.compose(&b).compose(&c).compose(&d);
        assert_eq!(expand(&left, extent), expand(&right, extent));
        assert_eq!(expand(&left, extent), vec![3, 3]);
    }

    #[test]
    fn scalar_composition() {
        assert_eq!(
            AxisSelection::from([4, 8]).compose(&AxisSelection::Scalar(1)),
            AxisSelection::Scalar(8)
        );
        assert_eq!(
            AxisSelection::Slice(3..9).compose(&AxisSelection::Scalar(2)),
            AxisSelection::Scalar(5)
        );
    }

    #[test]
    fn display() {
        assert_eq!(AxisSelection::Full.to_string(), ":");
        assert_eq!(AxisSelection::Slice(1..5).to_string(), "1..5");
        assert_eq!(AxisSelection::from([3, 1]).to_string(), "[3, 1]");
    }
}
