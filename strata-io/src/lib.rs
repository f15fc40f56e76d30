//! Storage handles for Strata.
//!
//! The container format itself (opening files, resolving dataset paths, decompressing chunks) is
//! provided by an external storage engine. This crate defines the narrow contract Strata
//! consumes from it, [`DatasetHandle`] and [`GroupHandle`], together with in-memory
//! implementations and adapters that record or inject failures into reads.

pub use failing::*;
pub use handle::*;
pub use instrumented::*;
pub use memory::*;
pub use read_ranges::*;

mod failing;
mod handle;
mod instrumented;
mod memory;
mod read_ranges;
