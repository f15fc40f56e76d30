use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use itertools::Itertools;
use strata_error::StrataExpect;

/// The per-axis extents of an array. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Arc<[usize]>);

impl Shape {
    /// Create a shape from per-axis extents.
    pub fn new(dims: impl Into<Arc<[usize]>>) -> Self {
        Self(dims.into())
    }

    /// The per-axis extents.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// The number of axes.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// The total number of elements, or `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
    }

    /// The total number of elements.
    ///
    /// # Panics
    ///
    /// Panics if the element count overflows `usize`.
    pub fn len(&self) -> usize {
        self.checked_len()
            .strata_expect("shape element count overflows usize")
    }

    /// Whether any axis has zero extent.
    pub fn is_empty(&self) -> bool {
        self.0.contains(&0)
    }

    /// The same extents in reverse axis order.
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }

    /// Strides of a buffer where the first axis varies fastest.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = Vec::with_capacity(self.ndim());
        let mut acc = 1usize;
        for d in self.0.iter() {
            strides.push(acc);
            acc *= *d;
        }
        strides
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self::new(value.to_vec())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self::new(value)
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.len() == 1 {
            write!(f, "({},)", self.0[0])
        } else {
            write!(f, "({})", self.0.iter().join(", "))
        }
    }
}
