//! Per-instrument orchestration: prices → returns → fits + histogram → scores.
//!
//! A run is all-or-nothing: the first failing stage aborts the instrument and
//! its error is returned unchanged. [`TickerPipeline::process_batch`] runs
//! several instruments in parallel and keeps each outcome separate.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::distribution::{fit, FittedModel};
use crate::histogram::bin;
use crate::returns::compute_returns;
use crate::scoring::{overlay, score, OverlayPoint};
use crate::source::{PriceRequest, PriceSource};
use crate::{
    AnalysisConfig, AnalysisError, DateRange, DistributionModel, HistogramBins, ModelFamily,
    PriceHistory, ReturnKind, ReturnSeries, Symbol, ValidationError,
};

/// Parameters and score of one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFit {
    pub family: ModelFamily,
    pub name: &'static str,
    pub model: DistributionModel,
    /// Mean absolute percentage error against the histogram, in percent.
    pub mape: f64,
    pub iterations: usize,
    pub log_likelihood: f64,
}

/// Everything the presentation layer needs for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerResult {
    pub symbol: Symbol,
    pub range: DateRange,
    pub return_kind: ReturnKind,
    pub returns: ReturnSeries,
    pub histogram: HistogramBins,
    /// In configured model order.
    pub fits: Vec<ModelFit>,
}

impl TickerResult {
    pub fn model_names(&self) -> Vec<&'static str> {
        self.fits.iter().map(|fit| fit.name).collect()
    }

    pub fn mape_values(&self) -> Vec<f64> {
        self.fits.iter().map(|fit| fit.mape).collect()
    }

    pub fn models(&self) -> Vec<DistributionModel> {
        self.fits.iter().map(|fit| fit.model).collect()
    }

    pub fn fit_for(&self, family: ModelFamily) -> Option<&ModelFit> {
        self.fits.iter().find(|fit| fit.family == family)
    }

    pub fn normal_mean(&self) -> Option<f64> {
        match self.fit_for(ModelFamily::Normal)?.model {
            DistributionModel::Normal { mean, .. } => Some(mean),
            DistributionModel::StudentT { .. } => None,
        }
    }

    pub fn student_t_location(&self) -> Option<f64> {
        match self.fit_for(ModelFamily::StudentT)?.model {
            DistributionModel::StudentT { location, .. } => Some(location),
            DistributionModel::Normal { .. } => None,
        }
    }

    pub fn student_t_degrees_of_freedom(&self) -> Option<f64> {
        match self.fit_for(ModelFamily::StudentT)?.model {
            DistributionModel::StudentT {
                degrees_of_freedom, ..
            } => Some(degrees_of_freedom),
            DistributionModel::Normal { .. } => None,
        }
    }

    /// The fit with the lowest MAPE.
    pub fn best_fit(&self) -> Option<&ModelFit> {
        self.fits.iter().min_by(|a, b| a.mape.total_cmp(&b.mape))
    }

    /// Histogram overlaid with every fitted density, in `fits` order.
    pub fn overlay(&self) -> Vec<OverlayPoint> {
        overlay(&self.histogram, self.fits.iter().map(|fit| &fit.model))
    }
}

/// Result of one instrument in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub symbol: Symbol,
    pub result: Result<TickerResult, AnalysisError>,
}

/// Validated, reusable pipeline for one [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct TickerPipeline {
    config: AnalysisConfig,
    range: DateRange,
}

impl TickerPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let range = config.range()?;
        Ok(Self { config, range })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fetches prices for `symbol` from `source` and runs every stage.
    ///
    /// # Errors
    /// [`AnalysisError::Source`] when the source fails; any stage error otherwise.
    pub fn process<S>(&self, source: &S, symbol: &Symbol) -> Result<TickerResult, AnalysisError>
    where
        S: PriceSource + ?Sized,
    {
        let request = PriceRequest::new(symbol.clone(), self.range);
        let history = source
            .daily_closes(&request)
            .map_err(|error| AnalysisError::Source {
                symbol: symbol.to_string(),
                source: error,
            })?;
        debug!(
            symbol = %symbol,
            source = source.id(),
            prices = history.len(),
            "fetched price history"
        );
        self.process_history(&history)
    }

    /// Runs every stage on prices already in hand.
    pub fn process_history(&self, history: &PriceHistory) -> Result<TickerResult, AnalysisError> {
        let returns = compute_returns(history, &self.range, &self.config.return_options())?;

        let fitted = self
            .config
            .models
            .iter()
            .map(|&family| fit(family, &returns, &self.config.fit).map(|model| (family, model)))
            .collect::<Result<Vec<(ModelFamily, FittedModel)>, _>>()?;

        let histogram = bin(&returns, self.config.bin_count)?;

        let fits = fitted
            .into_iter()
            .map(|(family, fitted)| {
                Ok(ModelFit {
                    family,
                    name: family.display_name(),
                    model: fitted.model,
                    mape: score(&histogram, &fitted.model)?,
                    iterations: fitted.iterations,
                    log_likelihood: fitted.log_likelihood,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let scores: Vec<(&str, f64)> = fits
            .iter()
            .map(|fit| (fit.family.as_str(), fit.mape))
            .collect();
        info!(
            symbol = %history.symbol(),
            returns = returns.len(),
            mape = ?scores,
            "processed instrument"
        );

        Ok(TickerResult {
            symbol: history.symbol().clone(),
            range: self.range,
            return_kind: returns.kind(),
            returns,
            histogram,
            fits,
        })
    }

    /// Processes `symbols` in parallel. Outcomes keep the input order and a
    /// failing instrument never affects the others.
    pub fn process_batch<S>(&self, source: &S, symbols: &[Symbol]) -> Vec<TickerOutcome>
    where
        S: PriceSource + ?Sized,
    {
        symbols
            .par_iter()
            .map(|symbol| TickerOutcome {
                symbol: symbol.clone(),
                result: self.process(source, symbol),
            })
            .collect()
    }
}
