//! Pure aggregation helpers shared by the renderers.
//!
//! Nothing in here panics or produces NaN for empty or zero inputs; the
//! degenerate cases are normalized explicitly.

use indexmap::IndexMap;
use serde::Serialize;

/// Compound score at or beyond which a comment counts as polarized.
pub const SENTIMENT_THRESHOLD: f64 = 0.05;

/// One named range for [`bucketize`]. The bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket<'a> {
    pub label: &'a str,
    pub upper_inclusive: f64,
}

/// Comment length buckets, in display order.
pub const LENGTH_BUCKETS: [Bucket<'static>; 5] = [
    Bucket {
        label: "very_short",
        upper_inclusive: 25.0,
    },
    Bucket {
        label: "short",
        upper_inclusive: 50.0,
    },
    Bucket {
        label: "medium",
        upper_inclusive: 100.0,
    },
    Bucket {
        label: "long",
        upper_inclusive: 200.0,
    },
    Bucket {
        label: "very_long",
        upper_inclusive: f64::INFINITY,
    },
];

/// `part` as a percentage of `whole`, or 0 when `whole` is 0.
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Count values per bucket.
///
/// Each value goes to the first bucket whose upper bound it does not exceed.
/// The last bucket is open-ended and takes everything else (NaN included),
/// so the counts always add up to the number of values. Every label is
/// present in the output, empty buckets included.
pub fn bucketize<I>(values: I, boundaries: &[Bucket<'_>]) -> IndexMap<String, u64>
where
    I: IntoIterator<Item = f64>,
{
    let mut counts: IndexMap<String, u64> = boundaries
        .iter()
        .map(|b| (b.label.to_string(), 0))
        .collect();

    let Some(last) = boundaries.len().checked_sub(1) else {
        return counts;
    };

    for value in values {
        let index = boundaries[..last]
            .iter()
            .position(|b| value <= b.upper_inclusive)
            .unwrap_or(last);
        counts[index] += 1;
    }

    counts
}

/// Linear interpolation of a font size between `min_px` and `max_px`.
///
/// When every count is the same (`max_count == min_count`) the result is
/// `min_px`.
pub fn font_size_for(count: f64, min_count: f64, max_count: f64, min_px: f64, max_px: f64) -> f64 {
    if max_count == min_count {
        return min_px;
    }
    min_px + (count - min_count) / (max_count - min_count) * (max_px - min_px)
}

/// Sort entries by count, highest first. Equal counts keep their input order.
pub fn rank_by_frequency<K, I>(entries: I) -> Vec<(K, u64)>
where
    I: IntoIterator<Item = (K, u64)>,
{
    let mut ranked: Vec<(K, u64)> = entries.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Min, max, range and mean of a set of measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeStats {
    pub min: u64,
    pub max: u64,
    pub range: u64,
    pub mean: f64,
}

impl RangeStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[u64]) -> Option<Self> {
        let min = *values.iter().min()?;
        let max = *values.iter().max()?;
        let total: u64 = values.iter().sum();
        Some(Self {
            min,
            max,
            range: max - min,
            mean: total as f64 / values.len() as f64,
        })
    }
}

/// Polarity class of a compound sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= SENTIMENT_THRESHOLD {
            Self::Positive
        } else if compound <= -SENTIMENT_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Positive => "😊",
            Self::Neutral => "😐",
            Self::Negative => "😞",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage_of(5.0, 0.0), 0.0);
        assert_eq!(percentage_of(0.0, 0.0), 0.0);
        assert_eq!(percentage_of(1.0, 4.0), 25.0);
    }

    #[test]
    fn bucketize_uses_inclusive_upper_bounds() {
        let lengths = [1.0, 25.0, 26.0, 50.0, 100.0, 101.0, 200.0, 201.0, 5000.0];
        let counts = bucketize(lengths, &LENGTH_BUCKETS);

        let values: Vec<u64> = counts.values().copied().collect();
        assert_eq!(values, vec![2, 2, 1, 2, 2]);
        let labels: Vec<&str> = counts.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["very_short", "short", "medium", "long", "very_long"]);
    }

    #[test]
    fn bucketize_final_bucket_is_open_ended() {
        let boundaries = [
            Bucket {
                label: "low",
                upper_inclusive: 10.0,
            },
            Bucket {
                label: "rest",
                upper_inclusive: 20.0,
            },
        ];
        let counts = bucketize([5.0, 15.0, 500.0], &boundaries);
        assert_eq!(counts["low"], 1);
        assert_eq!(counts["rest"], 2);
    }

    #[test]
    fn bucketize_without_boundaries_is_empty() {
        assert!(bucketize([1.0, 2.0], &[]).is_empty());
    }

    #[test]
    fn font_size_equal_counts_is_minimum() {
        assert_eq!(font_size_for(7.0, 7.0, 7.0, 14.0, 34.0), 14.0);
    }

    #[test]
    fn font_size_interpolates_linearly() {
        assert_eq!(font_size_for(2.0, 2.0, 10.0, 14.0, 34.0), 14.0);
        assert_eq!(font_size_for(10.0, 2.0, 10.0, 14.0, 34.0), 34.0);
        assert_eq!(font_size_for(6.0, 2.0, 10.0, 14.0, 34.0), 24.0);
    }

    #[test]
    fn rank_keeps_input_order_on_ties() {
        let ranked = rank_by_frequency(vec![("a", 1), ("b", 3), ("c", 1), ("d", 3)]);
        assert_eq!(ranked, vec![("b", 3), ("d", 3), ("a", 1), ("c", 1)]);
    }

    #[test]
    fn range_stats_handles_empty_and_values() {
        assert_eq!(RangeStats::from_values(&[]), None);
        let stats = RangeStats::from_values(&[4, 10, 1]).unwrap();
        assert_eq!((stats.min, stats.max, stats.range), (1, 10, 9));
        assert_eq!(stats.mean, 5.0);
    }

    #[test]
    fn sentiment_class_thresholds_are_inclusive() {
        assert_eq!(SentimentClass::from_compound(0.05), SentimentClass::Positive);
        assert_eq!(SentimentClass::from_compound(-0.05), SentimentClass::Negative);
        assert_eq!(SentimentClass::from_compound(0.02), SentimentClass::Neutral);
        assert_eq!(SentimentClass::from_compound(-0.02), SentimentClass::Neutral);
        assert_eq!(SentimentClass::from_compound(0.02).glyph(), "😐");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    proptest! {
        #[test]
        fn percentage_of_nothing_is_always_zero(part in any::<f64>()) {
            prop_assert_eq!(percentage_of(part, 0.0), 0.0);
        }

        #[test]
        fn bucketize_partitions_every_value(
            values in proptest::collection::vec(0u32..1000, 0..200),
        ) {
            let counts = bucketize(values.iter().map(|v| f64::from(*v)), &LENGTH_BUCKETS);
            prop_assert_eq!(counts.len(), LENGTH_BUCKETS.len());
            prop_assert_eq!(counts.values().sum::<u64>(), values.len() as u64);
        }

        #[test]
        fn ranking_is_sorted_and_stable(counts in proptest::collection::vec(0u64..5, 0..50)) {
            let entries: Vec<(usize, u64)> = counts.iter().copied().enumerate().collect();
            let ranked = rank_by_frequency(entries);

            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
                if pair[0].1 == pair[1].1 {
                    prop_assert!(pair[0].0 < pair[1].0, "tie order changed: {:?}", pair);
                }
            }
        }

        #[test]
        fn equal_counts_always_get_minimum_size(count in 1u64..10_000, min_px in 1.0f64..40.0) {
            let c = count as f64;
            prop_assert_eq!(font_size_for(c, c, c, min_px, min_px + 20.0), min_px);
        }
    }
}
