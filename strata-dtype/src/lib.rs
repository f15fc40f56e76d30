#![deny(missing_docs)]

//! The element type system for Strata.
//!
//! Datasets carry a runtime [`ElementKind`] tag. Typed access goes through the [`NativeElement`]
//! trait, which knows how to decode the little-endian representation returned by storage reads.

pub use decode::*;
pub use element::*;
pub use half;
pub use shape::*;

mod decode;
mod element;
mod shape;
