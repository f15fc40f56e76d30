use std::io;
use std::ops::Range;

use bytes::Bytes;

use crate::DatasetHandle;

/// Read every range of a one-dimensional dataset, coalescing ranges separated by at most
/// `max_gap` elements into a single read.
///
/// Results are returned in the order of `ranges`; overlapping and repeated ranges are allowed.
pub fn read_ranges(
    handle: &dyn DatasetHandle,
    ranges: &[Range<usize>],
    max_gap: usize,
) -> io::Result<Vec<Bytes>> {
    let width = handle.element_kind().byte_width();
    let merged_ranges = merge_ranges(
        ranges.iter().filter(|r| !r.is_empty()).cloned().collect(),
        max_gap,
    );
    log::trace!(
        "coalesced {} ranges into {} reads",
        ranges.len(),
        merged_ranges.len()
    );

    let read_ranges = merged_ranges
        .iter()
        .map(|r| handle.read_block(std::slice::from_ref(r)))
        .collect::<io::Result<Vec<_>>>()?;

    let mut result_bytes = Vec::with_capacity(ranges.len());
    for range in ranges {
        if range.is_empty() {
            result_bytes.push(Bytes::new());
            continue;
        }
        let read_idx = merged_ranges.partition_point(|mr| mr.start <= range.start) - 1;

        let read_range_start = merged_ranges[read_idx].start;
        let read_bytes = &read_ranges[read_idx];
        let start = (range.start - read_range_start) * width;
        let end = (range.end - read_range_start) * width;
        result_bytes.push(read_bytes.slice(start..end.min(read_bytes.len())));
    }

    Ok(result_bytes)
}

/// Sort `ranges` and merge those that overlap or are separated by at most `max_gap`.
pub fn merge_ranges(mut ranges: Vec<Range<usize>>, max_gap: usize) -> Vec<Range<usize>> {
    if ranges.is_empty() {
        return Vec::new();
    }

    ranges.sort_unstable_by_key(|r| r.start);
    let mut merged_ranges = Vec::with_capacity(ranges.len());

    let mut start_idx = 0;
    let mut end_idx = 1;

    while start_idx < ranges.len() {
        let mut range_end = ranges[start_idx].end;

        while end_idx < ranges.len()
            && ranges[end_idx]
                .start
                .checked_sub(range_end)
                .is_none_or(|gap| gap <= max_gap)
        {
            range_end = range_end.max(ranges[end_idx].end);
            end_idx += 1;
        }

        merged_ranges.push(ranges[start_idx].start..range_end);
        start_idx = end_idx;
        end_idx += 1;
    }

    merged_ranges
}
