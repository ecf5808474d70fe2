//! Interval deduplication for multi-device activity samples
//!
//! A watch and its paired phone both count steps and both report them, so the
//! raw export double-counts whenever the two were carried together. The sweep
//! here keeps a non-overlapping chronological subset, trusting the wearable
//! tier whenever the two disagree.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::models::{ActivitySample, SourceTier};

/// Resolve overlapping samples into a non-overlapping, start-ordered sequence
///
/// Samples are sorted by start, then tier (wearable first); equal keys keep
/// input order. A sample is accepted when it starts at or after the end of the
/// last accepted one. An overlapping sample is dropped whole (no splitting),
/// except that a wearable sample overlapping an accepted non-wearable sample
/// replaces it. A replacement never reaches further back than that one sample.
pub fn deduplicate(samples: Vec<ActivitySample>, wearable_markers: &[String]) -> Vec<ActivitySample> {
    let total = samples.len();

    let mut ranked: Vec<(SourceTier, ActivitySample)> = samples
        .into_iter()
        .map(|s| (SourceTier::classify(&s.source, wearable_markers), s))
        .collect();
    ranked.sort_by(|a, b| a.1.start.cmp(&b.1.start).then(a.0.cmp(&b.0)));

    let mut accepted: Vec<(SourceTier, ActivitySample)> = Vec::with_capacity(ranked.len());
    let mut last_accepted_end = NaiveDateTime::MIN;
    let mut replaced = 0usize;

    for (tier, sample) in ranked {
        if sample.start >= last_accepted_end {
            last_accepted_end = sample.end;
            accepted.push((tier, sample));
            continue;
        }

        let outranks_last = accepted
            .last()
            .map(|(last_tier, last)| tier < *last_tier && sample.overlaps(last))
            .unwrap_or(false);

        if outranks_last {
            // Sorted by start, so the replacement cannot reach the sample before it
            accepted.pop();
            last_accepted_end = sample.end;
            accepted.push((tier, sample));
            replaced += 1;
        }
    }

    debug!(
        input = total,
        kept = accepted.len(),
        replaced,
        "Deduplicated activity samples"
    );

    accepted.into_iter().map(|(_, sample)| sample).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PHONE: &str = "Jane's iPhone";
    const WATCH: &str = "Jane's Apple Watch";

    fn markers() -> Vec<String> {
        vec!["Apple Watch".to_string()]
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample(start: (u32, u32), end: (u32, u32), value: f64, source: &str) -> ActivitySample {
        ActivitySample::new(at(start.0, start.1), at(end.0, end.1), value, source)
    }

    fn assert_ordered_and_disjoint(samples: &[ActivitySample]) {
        for pair in samples.windows(2) {
            assert!(pair[0].start <= pair[1].start, "not ordered: {:?}", pair);
            assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
    }

    #[test]
    fn test_watch_wins_overlap_with_earlier_phone_sample() {
        let samples = vec![
            sample((10, 0), (10, 5), 50.0, PHONE),
            sample((10, 2), (10, 8), 80.0, WATCH),
        ];

        let kept = deduplicate(samples, &markers());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, WATCH);
        assert_eq!(kept[0].value, Some(80.0));
    }

    #[test]
    fn test_equal_start_prefers_wearable_regardless_of_order() {
        let phone = sample((9, 0), (9, 10), 300.0, PHONE);
        let watch = sample((9, 0), (9, 10), 280.0, WATCH);

        for input in [vec![phone.clone(), watch.clone()], vec![watch.clone(), phone.clone()]] {
            let kept = deduplicate(input, &markers());
            assert_eq!(kept, vec![watch.clone()]);
        }
    }

    #[test]
    fn test_lower_tier_extending_past_accepted_is_dropped_whole() {
        let samples = vec![
            sample((10, 0), (10, 10), 100.0, WATCH),
            sample((10, 5), (10, 30), 400.0, PHONE),
            sample((10, 30), (10, 40), 90.0, PHONE),
        ];

        let kept = deduplicate(samples, &markers());

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].source, WATCH);
        assert_eq!(kept[1].start, at(10, 30));
    }

    #[test]
    fn test_same_tier_overlap_keeps_first() {
        let samples = vec![
            sample((10, 0), (10, 10), 100.0, PHONE),
            sample((10, 5), (10, 15), 100.0, "Other iPhone"),
        ];

        let kept = deduplicate(samples, &markers());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, PHONE);
    }

    #[test]
    fn test_adjacent_and_zero_duration_samples_are_kept() {
        // The zero-length watch sample sorts ahead of the phone sample sharing its start
        let samples = vec![
            sample((10, 0), (10, 5), 10.0, PHONE),
            sample((10, 5), (10, 9), 12.0, PHONE),
            sample((10, 5), (10, 5), 1.0, WATCH),
        ];

        let kept = deduplicate(samples, &markers());

        assert_eq!(kept.len(), 3);
        assert_eq!(kept[1].source, WATCH);
        assert_ordered_and_disjoint(&kept);
    }

    #[test]
    fn test_zero_duration_sample_inside_accepted_interval_is_dropped() {
        let samples = vec![
            sample((10, 0), (10, 10), 10.0, PHONE),
            sample((10, 4), (10, 4), 1.0, PHONE),
            sample((10, 5), (10, 9), 12.0, PHONE),
        ];

        let kept = deduplicate(samples, &markers());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].end, at(10, 10));
    }

    #[test]
    fn test_watch_gap_falls_back_to_phone() {
        // Watch charging between 12:00 and 13:00
        let samples = vec![
            sample((11, 0), (12, 0), 900.0, WATCH),
            sample((11, 0), (12, 0), 850.0, PHONE),
            sample((12, 10), (12, 50), 400.0, PHONE),
            sample((13, 0), (14, 0), 1200.0, WATCH),
            sample((13, 0), (14, 0), 1100.0, PHONE),
        ];

        let kept = deduplicate(samples, &markers());
        let sources: Vec<&str> = kept.iter().map(|s| s.source.as_str()).collect();

        assert_eq!(sources, vec![WATCH, PHONE, WATCH]);
        assert_ordered_and_disjoint(&kept);
    }

    #[test]
    fn test_output_is_disjoint_for_dense_mixed_input() {
        let mut samples = Vec::new();
        for i in 0..40u32 {
            let source = if i % 3 == 0 { WATCH } else { PHONE };
            let start = (8 + i / 12, (i * 5) % 60);
            let end_minute = (start.1 + 7).min(59);
            samples.push(sample(start, (start.0, end_minute), i as f64, source));
        }

        let kept = deduplicate(samples, &markers());

        assert!(!kept.is_empty());
        assert_ordered_and_disjoint(&kept);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new(), &markers()).is_empty());
    }
}
