use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Stage;
use crate::{AnalysisError, ReturnSeries, ValidationError};

/// One equal-width histogram bin. `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: usize,
    /// `count / (total * width)`.
    pub density: f64,
}

/// Density-normalized histogram spanning `[min, max]` of a return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBins {
    width: f64,
    total: usize,
    bins: Vec<HistogramBin>,
}

impl HistogramBins {
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Number of observations binned.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// `Σ density · width`; equals 1 up to rounding.
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|bin| bin.density * self.width).sum()
    }
}

/// Bins `returns` into `bin_count` equal-width intervals between its extremes.
///
/// # Errors
/// - [`ValidationError::ZeroBinCount`] when `bin_count == 0`.
/// - [`AnalysisError::InsufficientData`] for an empty series (needs 1, has 0)
///   or a zero-range series (needs 2 distinct values, has 1).
pub fn bin(returns: &ReturnSeries, bin_count: usize) -> Result<HistogramBins, AnalysisError> {
    if bin_count == 0 {
        return Err(ValidationError::ZeroBinCount.into());
    }
    if returns.is_empty() {
        return Err(AnalysisError::insufficient(Stage::Histogram, 1, 0));
    }

    let min = returns.min();
    let max = returns.max();
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Err(AnalysisError::insufficient(Stage::Histogram, 2, 1));
    }

    let width = range / bin_count as f64;
    let mut counts = vec![0_usize; bin_count];
    for point in returns.points() {
        let offset = ((point.value - min) / width).floor();
        let index = (offset.max(0.0) as usize).min(bin_count - 1);
        counts[index] += 1;
    }

    let total = returns.len();
    let scale = 1.0 / (total as f64 * width);
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| {
            let lower = min + index as f64 * width;
            let upper = if index + 1 == bin_count {
                max
            } else {
                min + (index + 1) as f64 * width
            };
            HistogramBin {
                lower,
                upper,
                center: 0.5 * (lower + upper),
                count,
                density: count as f64 * scale,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        bins = bin_count,
        width,
        observations = total,
        empty = bins.iter().filter(|bin| bin.count == 0).count(),
        "binned returns"
    );

    Ok(HistogramBins { width, total, bins })
}
