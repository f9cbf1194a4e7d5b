//! Price-to-return conversion.
//!
//! Log returns are the default: `r_t = ln(p_t / p_{t-1})`. Simple returns
//! (`p_t / p_{t-1} - 1`) can be selected through [`ReturnKind`]. The kind is
//! fixed per pipeline run, so the fits and the histogram always see the same
//! return definition.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Stage;
use crate::{AnalysisError, DateRange, PriceHistory, TradingDate, ValidationError};

/// Smallest number of returns that still describes a distribution.
pub const MIN_RETURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    #[default]
    Log,
    Simple,
}

impl ReturnKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Simple => "simple",
        }
    }

    fn compute(self, previous: f64, current: f64) -> f64 {
        match self {
            Self::Log => (current / previous).ln(),
            Self::Simple => current / previous - 1.0,
        }
    }
}

impl Display for ReturnKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "simple" => Ok(Self::Simple),
            other => Err(ValidationError::InvalidReturnKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Knobs for [`compute_returns`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnOptions {
    pub kind: ReturnKind,
    /// Drop returns further than this many standard deviations from the mean.
    pub outlier_sigma: Option<f64>,
    /// Minimum number of prices inside the range; values below 2 act as 2.
    pub min_prices: usize,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            kind: ReturnKind::Log,
            outlier_sigma: None,
            min_prices: 2,
        }
    }
}

/// One return, tagged with the date of the later price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: TradingDate,
    pub value: f64,
}

/// Finite, date-ordered returns produced by [`compute_returns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    kind: ReturnKind,
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn mean(&self) -> f64 {
        mean(self.points.iter().map(|point| point.value), self.points.len())
    }

    /// Standard deviation with divisor `n`, the maximum-likelihood estimate.
    pub fn population_std_dev(&self) -> f64 {
        population_std_dev(self.points.iter().map(|point| point.value), self.points.len())
    }

    pub fn min(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.value)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.value)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[cfg(test)]
    pub(crate) fn from_values(values: &[f64]) -> Self {
        let start = TradingDate::parse("2000-01-01").expect("valid date");
        let points = values
            .iter()
            .enumerate()
            .map(|(offset, &value)| ReturnPoint {
                date: TradingDate::from_date(
                    start.into_inner() + time::Duration::days(offset as i64),
                ),
                value,
            })
            .collect();
        Self {
            kind: ReturnKind::Log,
            points,
        }
    }
}

/// Converts the prices of `history` inside `range` into a return series.
///
/// # Errors
/// - [`AnalysisError::InsufficientData`] when fewer than `options.min_prices`
///   prices fall in the range or fewer than [`MIN_RETURNS`] returns survive.
/// - [`AnalysisError::DegenerateInput`] when every return is identical.
pub fn compute_returns(
    history: &PriceHistory,
    range: &DateRange,
    options: &ReturnOptions,
) -> Result<ReturnSeries, AnalysisError> {
    let prices: Vec<_> = history
        .points()
        .iter()
        .filter(|point| range.contains(point.date))
        .collect();

    let required = options.min_prices.max(2);
    if prices.len() < required {
        return Err(AnalysisError::insufficient(
            Stage::Returns,
            required,
            prices.len(),
        ));
    }

    let mut points: Vec<ReturnPoint> = prices
        .windows(2)
        .map(|pair| ReturnPoint {
            date: pair[1].date,
            value: options.kind.compute(pair[0].price, pair[1].price),
        })
        .filter(|point| point.value.is_finite())
        .collect();

    if let Some(sigma) = options.outlier_sigma {
        let before = points.len();
        points = drop_outliers(points, sigma);
        debug!(
            symbol = %history.symbol(),
            dropped = before - points.len(),
            sigma,
            "applied outlier filter"
        );
    }

    if points.len() < MIN_RETURNS {
        return Err(AnalysisError::insufficient(
            Stage::Returns,
            MIN_RETURNS,
            points.len(),
        ));
    }

    let first = points[0].value;
    if points.iter().all(|point| point.value == first) {
        return Err(AnalysisError::degenerate(
            Stage::Returns,
            format!("all {} returns equal {first}", points.len()),
        ));
    }

    debug!(
        symbol = %history.symbol(),
        kind = %options.kind,
        prices = prices.len(),
        returns = points.len(),
        "computed returns"
    );

    Ok(ReturnSeries {
        kind: options.kind,
        points,
    })
}

fn drop_outliers(points: Vec<ReturnPoint>, sigma: f64) -> Vec<ReturnPoint> {
    let n = points.len();
    let center = mean(points.iter().map(|point| point.value), n);
    let spread = population_std_dev(points.iter().map(|point| point.value), n);
    if spread.is_nan() || spread <= 0.0 {
        return points;
    }

    let limit = sigma * spread;
    points
        .into_iter()
        .filter(|point| (point.value - center).abs() <= limit)
        .collect()
}

pub(crate) fn mean(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    values.sum::<f64>() / n as f64
}

pub(crate) fn population_std_dev(values: impl Iterator<Item = f64> + Clone, n: usize) -> f64 {
    let center = mean(values.clone(), n);
    let sum_sq: f64 = values.map(|value| (value - center).powi(2)).sum();
    (sum_sq / n as f64).sqrt()
}
