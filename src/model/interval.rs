use serde::{Deserialize, Serialize};
use snafu::{ensure, Snafu};

/// A watched time range in seconds.
///
/// Both ends are finite and non-negative and `start <= end`; the only way to get an `Interval` is through
/// [Interval::new], so code that receives one can rely on it. On the wire it is a two element array `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct Interval {
    start: f64,
    end: f64,
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum InvalidInterval {
    #[snafu(display("interval [{start}, {end}] must have finite bounds"))]
    NotFinite { start: f64, end: f64 },

    #[snafu(display("interval [{start}, {end}] must not start before 0"))]
    Negative { start: f64, end: f64 },

    #[snafu(display("interval [{start}, {end}] ends before it starts"))]
    Reversed { start: f64, end: f64 },
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Result<Self, InvalidInterval> {
        ensure!(start.is_finite() && end.is_finite(), NotFiniteSnafu { start, end });
        ensure!(start >= 0.0, NegativeSnafu { start, end });
        ensure!(start <= end, ReversedSnafu { start, end });

        // -0.0 passes the checks above, normalize it so sorting treats it as 0.
        Ok(Interval {
            start: start + 0.0,
            end: end + 0.0,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

impl TryFrom<(f64, f64)> for Interval {
    type Error = InvalidInterval;

    fn try_from((start, end): (f64, f64)) -> Result<Self, Self::Error> {
        Interval::new(start, end)
    }
}

impl From<Interval> for (f64, f64) {
    fn from(interval: Interval) -> Self {
        (interval.start, interval.end)
    }
}

/// Merges overlapping and touching ranges into the canonical set: sorted by start, every consecutive pair separated
/// by a strictly positive gap. Merging a canonical set returns it unchanged.
pub fn merge(intervals: impl IntoIterator<Item = Interval>) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals.into_iter().collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for next in sorted {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => current.end = current.end.max(next.end),
            _ => merged.push(next),
        }
    }

    merged
}

/// Total seconds covered by `intervals`. Only meaningful for a canonical set, overlaps are counted twice.
pub fn total_length(intervals: &[Interval]) -> f64 {
    intervals.iter().map(Interval::length).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals(pairs: &[(f64, f64)]) -> Vec<Interval> {
        pairs
            .iter()
            .map(|&(start, end)| Interval::new(start, end).unwrap())
            .collect()
    }

    fn pairs(intervals: &[Interval]) -> Vec<(f64, f64)> {
        intervals.iter().map(|&i| i.into()).collect()
    }

    /// Checks the canonical form: sorted, and a strictly positive gap between neighbours.
    fn assert_canonical(merged: &[Interval]) {
        for pair in merged.windows(2) {
            assert!(
                pair[0].end < pair[1].start,
                "{:?} and {:?} should have been merged",
                pair[0],
                pair[1]
            );
        }
    }

    /// Whether `point` lies in any of `intervals`.
    fn covers(intervals: &[Interval], point: f64) -> bool {
        intervals.iter().any(|i| i.start <= point && point <= i.end)
    }

    #[test]
    fn overlapping_ranges_merge() {
        let merged = merge(intervals(&[(0.0, 10.0), (5.0, 15.0), (20.0, 25.0)]));
        assert_eq!(pairs(&merged), vec![(0.0, 15.0), (20.0, 25.0)]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn touching_ranges_merge() {
        let merged = merge(intervals(&[(10.0, 20.0), (0.0, 10.0)]));
        assert_eq!(pairs(&merged), vec![(0.0, 20.0)]);
    }

    #[test]
    fn contained_range_is_absorbed() {
        let merged = merge(intervals(&[(0.0, 30.0), (5.0, 6.0), (29.0, 30.0)]));
        assert_eq!(pairs(&merged), vec![(0.0, 30.0)]);
    }

    #[test]
    fn small_gaps_are_kept() {
        let merged = merge(intervals(&[(0.0, 1.0), (1.5, 2.0), (2.0, 2.25)]));
        assert_eq!(pairs(&merged), vec![(0.0, 1.0), (1.5, 2.25)]);
    }

    #[test]
    fn output_is_canonical_and_covers_the_same_points() {
        let input = intervals(&[
            (40.0, 45.0),
            (3.0, 7.5),
            (0.0, 2.0),
            (7.5, 9.0),
            (41.0, 50.0),
            (12.0, 12.0),
            (1.0, 3.0),
            (60.0, 61.5),
        ]);
        let merged = merge(input.clone());

        assert_canonical(&merged);

        let mut point = 0.0;
        while point <= 70.0 {
            assert_eq!(
                covers(&input, point),
                covers(&merged, point),
                "coverage differs at {point}"
            );
            point += 0.25;
        }

        assert_eq!(pairs(&merged), vec![(0.0, 9.0), (12.0, 12.0), (40.0, 50.0), (60.0, 61.5)]);
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let once = merge(intervals(&[(5.0, 8.0), (0.0, 3.0), (2.0, 4.0), (9.0, 9.5)]));
        let twice = merge(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let input = intervals(&[(0.0, 3.0), (2.0, 4.0), (5.0, 8.0), (8.0, 9.0), (20.0, 21.0)]);
        let expected = merge(input.clone());

        // every rotation and its reverse
        for shift in 0..input.len() {
            let mut rotated = input.clone();
            rotated.rotate_left(shift);
            assert_eq!(merge(rotated.clone()), expected);

            rotated.reverse();
            assert_eq!(merge(rotated), expected);
        }
    }

    #[test]
    fn total_length_of_canonical_set() {
        let merged = merge(intervals(&[(0.0, 10.0), (5.0, 15.0), (20.0, 25.0)]));
        assert_eq!(total_length(&merged), 20.0);
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(matches!(
            Interval::new(5.0, 1.0),
            Err(InvalidInterval::Reversed { .. })
        ));
        assert!(matches!(
            Interval::new(-1.0, 1.0),
            Err(InvalidInterval::Negative { .. })
        ));
        assert!(matches!(
            Interval::new(0.0, f64::INFINITY),
            Err(InvalidInterval::NotFinite { .. })
        ));
        assert!(matches!(
            Interval::new(f64::NAN, 1.0),
            Err(InvalidInterval::NotFinite { .. })
        ));
    }

    #[test]
    fn wire_format_is_a_pair() {
        let interval: Interval = serde_json::from_str("[1.5, 4]").unwrap();
        assert_eq!((interval.start(), interval.end()), (1.5, 4.0));
        assert_eq!(serde_json::to_string(&interval).unwrap(), "[1.5,4.0]");

        let error = serde_json::from_str::<Interval>("[4, 1.5]").unwrap_err();
        assert!(error.to_string().contains("ends before it starts"), "{error}");
    }
}
