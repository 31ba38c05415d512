//! Commit-range arithmetic: `(low, high)` pairs of ballot counters, with
//! `(0, 0)` standing in for "no range".

/// Unions two ranges. `(0, 0)` is treated as the empty range and is
/// absorbed by the other operand; otherwise the two ranges must already
/// overlap or abut (the caller is responsible for only unioning ranges
/// that belong to the same ballot field sequence).
pub fn range_union(min1: u32, max1: u32, min2: u32, max2: u32) -> (u32, u32) {
    if min1 == 0 && max1 == 0 {
        return (min2, max2);
    }
    if min2 == 0 && max2 == 0 {
        return (min1, max1);
    }
    (min1.min(min2), max1.max(max2))
}

/// Folds `range_union` over a list of ballot counters, treating each as a
/// singleton range. Panics on a value that cannot appear in a range.
pub fn make_range(numbers: &[u32]) -> (u32, u32) {
    let mut acc = (0u32, 0u32);
    for &n in numbers {
        acc = range_union(acc.0, acc.1, n, n);
    }
    acc
}
