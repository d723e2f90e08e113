use crate::dataset::DANGER_THRESHOLD;
use serde::Serialize;

/// Descriptive statistics over a set of readings. The numeric fields are `None` for an empty
/// set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Readings at or above the danger threshold.
    pub dangerous: usize,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let dangerous = sorted.iter().filter(|v| **v >= DANGER_THRESHOLD).count();
        if count == 0 {
            return Self {
                count,
                min: None,
                max: None,
                mean: None,
                median: None,
                dangerous,
            };
        }
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Self {
            count,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            mean: Some(sorted.iter().sum::<f64>() / count as f64),
            median: Some(median),
            dangerous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub center: f64,
    pub width: f64,
    pub count: usize,
}

/// Fixed-width bins from 0 to `max(peak, 1.1)` ppm; empty bins are omitted.
///
/// The axis always reaches past the 1 ppm danger line so histograms stay comparable.
pub fn histogram(values: &[f64], bin_width: f64) -> Vec<HistogramBin> {
    if values.is_empty() || bin_width.is_nan() || bin_width <= 0.0 {
        return Vec::new();
    }
    let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max = peak.max(1.1);
    let bins = ((max / bin_width).ceil()) as usize;
    if bins == 0 {
        return Vec::new();
    }
    let mut counts = vec![0usize; bins];
    for &v in values {
        if v > 0.0 {
            let idx = (v / bin_width).floor() as usize;
            if idx < bins {
                counts[idx] += 1;
            } else if v <= max {
                counts[bins - 1] += 1;
            }
        } else if v == 0.0 {
            counts[0] += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, c)| *c > 0)
        .map(|(i, count)| HistogramBin {
            center: (i as f64 + 0.5) * bin_width,
            width: bin_width,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_and_even_medians() {
        let s = Summary::from_values(&[3.0, 1.0, 2.0]);
        assert_eq!(s.median, Some(2.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(3.0));
        assert_eq!(s.dangerous, 3);

        let s = Summary::from_values(&[0.1, 0.4, 0.2, 0.3]);
        assert!((s.median.expect("median") - 0.25).abs() < 1e-12);
        assert!((s.mean.expect("mean") - 0.25).abs() < 1e-12);
        assert_eq!(s.dangerous, 0);
    }

    #[test]
    fn empty_summary() {
        let s = Summary::from_values(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
    }

    #[test]
    fn histogram_bins() {
        let bins = histogram(&[0.0, 0.01, 0.07, 1.3], 0.05);
        let counts: Vec<(usize, usize)> = bins
            .iter()
            .map(|b| ((b.center / 0.05) as usize, b.count))
            .collect();
        // 0.0 and 0.01 share the first bin; 1.3 sets the axis end at 1.3.
        assert_eq!(counts, vec![(0, 2), (1, 1), (26, 1)]);
        assert!(histogram(&[], 0.05).is_empty());
    }
}
