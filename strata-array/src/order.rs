//! The one place where caller axis order and on-disk axis order meet.
//!
//! Storage lists axes outermost first, callers list them innermost first, so caller axis `k` is
//! disk axis `ndim - 1 - k`. A row-major buffer in disk order is therefore exactly a
//! column-major buffer in caller order, and block contents never need to be permuted: only
//! extents and ranges cross this boundary.

use std::ops::Range;

use strata_dtype::Shape;

/// Convert on-disk extents to caller order.
pub(crate) fn shape_to_caller(disk: &Shape) -> Shape {
    disk.reversed()
}

/// Convert a caller-order block to the on-disk ranges passed to `read_block`.
pub(crate) fn block_to_disk(caller: &[Range<usize>]) -> Vec<Range<usize>> {
    caller.iter().rev().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_axes() {
        assert_eq!(shape_to_caller(&Shape::from([10, 20])), Shape::from([20, 10]));
        assert_eq!(block_to_disk(&[0..2, 5..9, 1..3]), vec![1..3, 5..9, 0..2]);
    }
}
