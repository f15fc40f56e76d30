#![deny(missing_docs)]

//! Lazy read-only arrays over chunked storage.
//!
//! A [`LazyArray`] wraps either a dense dataset or a compressed sparse column group. Views are
//! built in a [`ViewArena`] by composing per-axis [`AxisSelection`]s without touching storage.
//! When values are needed a view is resolved to root coordinates, planned into chunk-aligned
//! blocks by the [`BlockPlanner`], read, and assembled into a [`DenseArray`] or a
//! [`CscMatrix`].
//!
//! Axes are listed in caller order, which is the reverse of the on-disk order used by
//! [`strata_io`] handles. Dense outputs store their first axis fastest.

pub use array::*;
pub use csc::*;
pub use dense_array::*;
pub use extract::*;
pub use options::*;
pub use planner::*;
pub use selection::*;
pub use view::*;

mod array;
mod convert;
mod csc;
mod dense_array;
mod extract;
mod options;
mod order;
mod planner;
mod selection;
#[cfg(feature = "test-harness")]
pub mod test_harness;
mod view;
