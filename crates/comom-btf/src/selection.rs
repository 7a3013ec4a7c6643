//! Which patterns take part in the solve of one class.
//!
//! Classes are numbered `1..=R` here. While class `c` is being added a
//! pattern is *live* when its support lies in classes `1..c-1` (its values
//! are solved), *carried* when its largest support index is the class being
//! added (its values are copied forward), and *zero* otherwise. Within a
//! macro group supports run in colexicographic order, so live and carried
//! patterns are leading contiguous runs and only counts are needed.
//!
//! All counts use `C(n, k) = 0` for `k > n`.

use std::ops::{Range, RangeInclusive};

use comom_core::binomial;

/// Number of live patterns of macro group `h` for class `class`.
pub fn live_leaves(h: usize, class: usize) -> usize {
    binomial(class.saturating_sub(1), h)
}

/// Number of carried patterns of macro group `h`; zero when `h = 0` or the
/// class being added is the last one.
pub fn carried_leaves(h: usize, class: usize, classes: usize) -> usize {
    if h == 0 || class >= classes {
        return 0;
    }
    binomial(class - 1, h - 1)
}

/// Leaf offsets `start..end` of the carried run inside macro group `h`.
pub fn carried_range(h: usize, class: usize, classes: usize) -> Range<usize> {
    let start = live_leaves(h, class);
    start..start + carried_leaves(h, class, classes)
}

/// Macro groups holding live patterns, `0..=min(c - 1, M)`.
pub fn live_groups(class: usize, stations: usize) -> RangeInclusive<usize> {
    0..=class.saturating_sub(1).min(stations)
}

/// Macro groups holding carried patterns, `1..=min(c, M)` for `c < R`.
pub fn carry_groups(class: usize, classes: usize, stations: usize) -> Option<RangeInclusive<usize>> {
    if class == 0 || class >= classes {
        return None;
    }
    Some(1..=class.min(stations))
}
