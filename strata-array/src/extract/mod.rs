//! Block-wise materialization of resolved selections.

pub use dense::*;
pub use sparse::*;

mod dense;
mod sparse;
