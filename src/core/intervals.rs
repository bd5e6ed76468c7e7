// intervals.rs - Merging and bridging repeat intervals within one sequence

use serde::{Deserialize, Serialize};

/// Closed interval `[start, end]` in sequence-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Width used to rank competing spans
    pub fn width(&self) -> i64 {
        self.end - self.start
    }
}

impl From<(i64, i64)> for Span {
    fn from((start, end): (i64, i64)) -> Self {
        Span::new(start, end)
    }
}

/// Tolerances for reconciling repeat intervals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeParams {
    /// Slack around the flank bounds before an interval counts as outside
    pub buffer: i64,
    /// Largest gap between spans that is bridged
    pub max_separation: i64,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            buffer: 20,
            max_separation: 50,
        }
    }
}

/// Union overlapping or abutting intervals into maximal spans, sorted by start
pub fn merge_spans(spans: &[Span]) -> Vec<Span> {
    let mut sorted: Vec<Span> = spans.iter().copied().filter(|s| !s.is_empty()).collect();
    sorted.sort();

    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end + 1 => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Gaps between consecutive merged spans
pub fn complement_spans(merged: &[Span]) -> Vec<Span> {
    merged
        .windows(2)
        .map(|w| Span::new(w[0].end + 1, w[1].start - 1))
        .filter(|gap| !gap.is_empty())
        .collect()
}

/// Reconcile repeat intervals found in one sequence.
///
/// Intervals lying wholly outside `[bounds.0 - buffer, bounds.1 + buffer]`
/// are dropped, the rest merged, and gaps no wider than `max_separation`
/// bridged.
pub fn combine_repeat_coords(spans: &[Span], bounds: (i64, i64), params: MergeParams) -> Vec<Span> {
    let kept: Vec<Span> = spans
        .iter()
        .copied()
        .filter(|s| !(s.end < bounds.0 - params.buffer || s.start > bounds.1 + params.buffer))
        .collect();
    if kept.is_empty() {
        return Vec::new();
    }

    let mut merged = merge_spans(&kept);
    let gaps: Vec<Span> = complement_spans(&merged)
        .into_iter()
        .filter(|gap| gap.len() <= params.max_separation)
        .collect();

    merged.extend(gaps);
    merge_spans(&merged)
}

/// The widest span, first one wins on ties
pub fn widest(spans: &[Span]) -> Option<Span> {
    spans.iter().copied().fold(None, |best, span| match best {
        Some(b) if b.width() >= span.width() => Some(b),
        _ => Some(span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(v: &[(i64, i64)]) -> Vec<Span> {
        v.iter().map(|&s| Span::from(s)).collect()
    }

    #[test]
    fn test_merge_overlapping_and_adjacent() {
        let merged = merge_spans(&spans(&[(50, 60), (1, 10), (5, 20), (21, 30)]));
        assert_eq!(merged, spans(&[(1, 30), (50, 60)]));
    }

    #[test]
    fn test_complement() {
        let gaps = complement_spans(&spans(&[(1, 30), (50, 60), (61, 70)]));
        assert_eq!(gaps, spans(&[(31, 49)]));
    }

    #[test]
    fn test_gap_of_max_separation_is_bridged() {
        let params = MergeParams::default();
        // gap 101..=150 is exactly 50bp
        let merged = combine_repeat_coords(&spans(&[(1, 100), (151, 200)]), (1, 200), params);
        assert_eq!(merged, spans(&[(1, 200)]));

        // gap 101..=151 is 51bp
        let split = combine_repeat_coords(&spans(&[(1, 100), (152, 200)]), (1, 200), params);
        assert_eq!(split, spans(&[(1, 100), (152, 200)]));
    }

    #[test]
    fn test_intervals_outside_flanks_dropped() {
        let params = MergeParams::default();
        let merged = combine_repeat_coords(&spans(&[(1, 50), (120, 180), (400, 420)]), (100, 300), params);
        assert_eq!(merged, spans(&[(120, 180)]));

        // within the buffer still counts
        let merged = combine_repeat_coords(&spans(&[(60, 85)]), (100, 300), params);
        assert_eq!(merged, spans(&[(60, 85)]));

        assert!(combine_repeat_coords(&spans(&[(1, 10)]), (100, 300), params).is_empty());
    }

    #[test]
    fn test_combine_is_idempotent() {
        let params = MergeParams::default();
        let input = spans(&[(90, 130), (140, 170), (260, 300), (305, 310), (500, 520)]);
        let once = combine_repeat_coords(&input, (100, 450), params);
        let twice = combine_repeat_coords(&once, (100, 450), params);
        assert_eq!(once, twice);
        assert_eq!(once, spans(&[(90, 170), (260, 310)]));
    }

    #[test]
    fn test_widest() {
        let s = spans(&[(1, 10), (20, 60), (70, 110)]);
        assert_eq!(widest(&s), Some(Span::new(20, 60)));
        assert_eq!(widest(&[]), None);
    }
}
