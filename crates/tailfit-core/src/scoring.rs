//! Bin-wise goodness of fit.
//!
//! The score is a mean absolute percentage error between empirical bin
//! densities and the model density at each bin center. Bins without
//! observations are left out of the mean instead of counting as infinite
//! error.

use serde::{Deserialize, Serialize};

use crate::error::Stage;
use crate::{AnalysisError, DistributionModel, HistogramBins};

/// MAPE (in percent) of `model` against the non-empty bins of `bins`.
///
/// # Errors
/// [`AnalysisError::DegenerateInput`] when no bin has a positive density or
/// the model density is not finite at some bin center.
pub fn score(bins: &HistogramBins, model: &DistributionModel) -> Result<f64, AnalysisError> {
    let mut total = 0.0;
    let mut scored = 0_usize;
    for bin in bins.bins().iter().filter(|bin| bin.density > 0.0) {
        let fitted = model.pdf(bin.center);
        if !fitted.is_finite() {
            return Err(AnalysisError::degenerate(
                Stage::Score,
                format!("{} density at {} is {fitted}", model.name(), bin.center),
            ));
        }
        total += (bin.density - fitted).abs() / bin.density * 100.0;
        scored += 1;
    }

    if scored == 0 {
        return Err(AnalysisError::degenerate(
            Stage::Score,
            "every histogram bin is empty",
        ));
    }
    Ok(total / scored as f64)
}

/// Empirical and fitted densities at one bin center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub center: f64,
    pub empirical: f64,
    /// One density per model, in the order the models were given.
    pub fitted: Vec<f64>,
}

/// Plot-ready series pairing each bin with every model's density.
pub fn overlay<'a>(
    bins: &HistogramBins,
    models: impl IntoIterator<Item = &'a DistributionModel> + Clone,
) -> Vec<OverlayPoint> {
    bins.bins()
        .iter()
        .map(|bin| OverlayPoint {
            center: bin.center,
            empirical: bin.density,
            fitted: models
                .clone()
                .into_iter()
                .map(|model| model.pdf(bin.center))
                .collect(),
        })
        .collect()
}
