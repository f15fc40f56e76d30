//! Lazy read-only dense and sparse arrays over chunked containers.
//!
//! ```
//! use strata::io::InMemoryDataset;
//! use strata::{AxisSelection, ExtractOptions, LazyArray, ViewArena};
//!
//! // On-disk shape (3, 4) is caller shape (4, 3).
//! let values: Vec<i32> = (0..12).collect();
//! let dataset = InMemoryDataset::try_new([3, 4], &values)?;
//!
//! let mut arena = ViewArena::new(LazyArray::try_new_dense(dataset)?);
//! let view = arena.subset(arena.root(), &[AxisSelection::Slice(1..3), AxisSelection::from([2, 0])])?;
//! let dense = arena.extract_dense::<i32>(view, &ExtractOptions::default())?;
//! assert_eq!(dense.values(), &[9, 10, 1, 2]);
//! # Ok::<(), strata::error::StrataError>(())
//! ```

pub use strata_array::*;
pub use {
    strata_dtype as dtype, strata_error as error, strata_io as io, strata_metrics as metrics,
};
