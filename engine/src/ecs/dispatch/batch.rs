use std::ops::Range;

/// Split `len` items into contiguous batches of `ceil(len / parts)` items each. The last batch may
/// be shorter, and there are never more than `parts` batches. Zero items yields no batches.
pub fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let size = len.div_ceil(parts.max(1));
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}
