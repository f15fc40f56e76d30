#![deny(missing_docs)]

//! Error handling for Strata.
//!
//! Structural errors ([`StrataError::IndexOutOfRange`], [`StrataError::ShapeMismatch`],
//! [`StrataError::UnsupportedLayout`], [`StrataError::ReadOnlyViolation`]) are raised before any
//! storage read is issued. [`StrataError::IOFailure`] wraps the storage engine's error verbatim
//! and is never retried by the library.

use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::num::TryFromIntError;
use std::ops::Deref;
use std::{fmt, io};

/// A string that can be used as an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Strata.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum StrataError {
    /// A selection names a position outside the extent of its axis.
    #[error("index {value} out of range for axis {axis} of extent {len}")]
    IndexOutOfRange {
        /// The axis, in caller order.
        axis: usize,
        /// The offending position.
        value: usize,
        /// The extent of the axis.
        len: usize,
    },
    /// Shapes, dimensionalities or the CSC triple do not agree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(ErrString),
    /// The operation is not defined for the array's storage layout.
    #[error("unsupported layout: {0}")]
    UnsupportedLayout(ErrString),
    /// An attempt was made to modify read-only storage.
    ///
    /// Strata itself exposes no write path; this is reserved for adapters offering a mutable
    /// array interface.
    #[error("read-only violation: {0}")]
    ReadOnlyViolation(ErrString),
    /// An opaque failure surfaced unchanged from the storage engine.
    #[error(transparent)]
    IOFailure(#[from] io::Error),
    /// The caller supplied an invalid argument.
    #[error("{0}")]
    InvalidArgument(ErrString),
    /// A typed access named a different element type than the one stored.
    #[error("expected element type {expected} but found {actual}")]
    MismatchedTypes {
        /// The element type the caller asked for.
        expected: ErrString,
        /// The element type actually stored.
        actual: ErrString,
    },
    /// An integer conversion failed.
    #[error(transparent)]
    TryFromInt(#[from] TryFromIntError),
    /// An error wrapped with additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<StrataError>),
}

impl StrataError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        StrataError::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &StrataError {
        match self {
            StrataError::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// Whether this error originated in the storage engine.
    ///
    /// Only storage failures are worth retrying; every other error is structural.
    pub fn is_io(&self) -> bool {
        matches!(self.root(), StrataError::IOFailure(_))
    }

    /// Panics with this error as the message.
    #[allow(clippy::panic)]
    pub fn panic(self) -> ! {
        panic!("{}", self)
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`StrataError`]s as their error type.
pub type StrataResult<T> = Result<T, StrataError>;

/// A trait for unwrapping a value, panicking with a [`StrataError`] as the message.
pub trait StrataExpect {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value, or panics with the given message.
    fn strata_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> StrataExpect for Result<T, E>
where
    E: Into<StrataError>,
{
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| -> StrataError { err.into() })
            .unwrap_or_else(|e| e.with_context(msg.to_string()).panic())
    }
}

impl<T> StrataExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| StrataError::InvalidArgument(msg.to_string().into()).panic())
    }
}

/// Constructs a [`StrataError`].
///
/// Without a variant tag the error is an [`StrataError::InvalidArgument`].
#[macro_export]
macro_rules! strata_err {
    (IndexOutOfRange: $axis:expr, $value:expr, $len:expr) => {{
        $crate::StrataError::IndexOutOfRange {
            axis: $axis,
            value: $value,
            len: $len,
        }
    }};
    (MismatchedTypes: $expected:expr, $actual:expr) => {{
        $crate::StrataError::MismatchedTypes {
            expected: $expected.to_string().into(),
            actual: $actual.to_string().into(),
        }
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::StrataError::Context($msg.into(), Box::new($err))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::StrataError::$variant(format!($fmt $(, $arg)*).into())
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::strata_err!(InvalidArgument: $fmt $(, $arg)*)
    }};
}

/// Returns early with a [`StrataError`].
#[macro_export]
macro_rules! strata_bail {
    ($($tt:tt)+) => {
        return Err($crate::strata_err!($($tt)+))
    };
}

/// Panics with a [`StrataError`].
#[macro_export]
macro_rules! strata_panic {
    ($($tt:tt)+) => {
        $crate::strata_err!($($tt)+).panic()
    };
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn index_out_of_range_names_axis_and_value() {
        let err = strata_err!(IndexOutOfRange: 1, 12, 10);
        assert_eq!(
            err.to_string(),
            "index 12 out of range for axis 1 of extent 10"
        );
    }

    #[test]
    fn tagged_variants() {
        let err = strata_err!(ShapeMismatch: "indptr has {} entries, expected {}", 3, 11);
        assert!(matches!(err, StrataError::ShapeMismatch(_)));
        assert_eq!(err.to_string(), "shape mismatch: indptr has 3 entries, expected 11");

        let err = strata_err!("plain {}", "message");
        assert!(matches!(err, StrataError::InvalidArgument(_)));
    }

    #[test]
    fn io_errors_pass_through() {
        let err: StrataError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        let err = err.with_context("reading block");
        assert!(err.is_io());
        match err.root() {
            StrataError::IOFailure(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            _ => unreachable!(),
        }
    }

    fn bails() -> StrataResult<()> {
        strata_bail!(UnsupportedLayout: "sparse extraction needs 2 dimensions, got {}", 3)
    }

    #[test]
    fn bail_returns_error() {
        assert!(matches!(
            bails().unwrap_err(),
            StrataError::UnsupportedLayout(_)
        ));
    }
}
