//! Histogram binning for raw samples.

use serde::Serialize;

/// One bucket of a histogram.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bin a sample with Sturges' rule.
///
/// `k = max(1, ceil(log2(n) + 1))` equal-width buckets span `[min, max]`;
/// a zero-width sample gets buckets of width 1. Non-finite values are
/// ignored. The maximum lands in the last bucket.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn build_histogram(values: &[f64], precision: usize) -> Vec<HistogramBin> {
    let sample: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sample.is_empty() {
        return Vec::new();
    }

    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // log2(n) + 1 >= 1 for n >= 1, so the cast is positive and small.
    let k = (((sample.len() as f64).log2() + 1.0).ceil() as usize).max(1);
    let span = max - min;
    let width = if span > 0.0 { span / k as f64 } else { 1.0 };

    let mut counts = vec![0usize; k];
    for v in &sample {
        let idx = (((v - min) / width).floor() as usize).min(k - 1);
        if let Some(count) = counts.get_mut(idx) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = min + i as f64 * width;
            let end = start + width;
            HistogramBin {
                label: format!("{start:.precision$}\u{2013}{end:.precision$}"),
                start,
                end,
                count,
            }
        })
        .collect()
}
