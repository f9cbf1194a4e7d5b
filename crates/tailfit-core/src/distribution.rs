//! Maximum-likelihood fitting of the candidate return distributions.
//!
//! - Normal: closed form. The mean is the arithmetic mean and the standard
//!   deviation uses divisor `n` (the MLE, not the unbiased sample estimate).
//! - Student-t: ECME iteration over `(location, scale, nu)`. Location and
//!   scale follow the usual EM weights `w_i = (nu + 1) / (nu + z_i^2)`; `nu`
//!   then maximizes the observed likelihood for the current location/scale,
//!   found by bisection on the score in `ln nu`. The loop is capped by
//!   [`FitOptions::max_iterations`] and reports
//!   [`AnalysisError::FitConvergence`] when the cap is hit.
//!
//! Fits are deterministic: the solver starts from the sample moments and
//! never draws random numbers.

use std::f64::consts::PI;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal, StudentsT};
use statrs::function::gamma::{digamma, ln_gamma};
use tracing::debug;

use crate::error::Stage;
use crate::{AnalysisError, ReturnSeries, ValidationError};

/// Scale below which a series is treated as constant.
const MIN_SCALE: f64 = 1.0e-300;
const INITIAL_DEGREES_OF_FREEDOM: f64 = 5.0;
/// Upper bound on halvings of the `ln nu` bracket.
const DOF_BISECTION_STEPS: usize = 64;
const DOF_BRACKET_WIDTH: f64 = 1.0e-12;

/// Candidate distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Normal,
    StudentT,
}

impl ModelFamily {
    /// Comparison order used when no explicit model list is configured.
    pub const DEFAULT_ORDER: [Self; 2] = [Self::Normal, Self::StudentT];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::StudentT => "student_t",
        }
    }

    /// Human-readable label for legends and tables.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::StudentT => "Student's t",
        }
    }
}

impl Display for ModelFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "norm" => Ok(Self::Normal),
            "student_t" | "student-t" | "t" => Ok(Self::StudentT),
            other => Err(ValidationError::InvalidModel {
                value: other.to_owned(),
            }),
        }
    }
}

/// Fitted distribution with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum DistributionModel {
    Normal {
        mean: f64,
        std_dev: f64,
    },
    StudentT {
        location: f64,
        scale: f64,
        degrees_of_freedom: f64,
    },
}

impl DistributionModel {
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::Normal { .. } => ModelFamily::Normal,
            Self::StudentT { .. } => ModelFamily::StudentT,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.family().display_name()
    }

    /// Mean for the normal model, location for Student-t.
    pub const fn location(&self) -> f64 {
        match *self {
            Self::Normal { mean, .. } => mean,
            Self::StudentT { location, .. } => location,
        }
    }

    /// Probability density at `x`. `NaN` if the parameters are invalid.
    pub fn pdf(&self, x: f64) -> f64 {
        match *self {
            Self::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(|dist| dist.pdf(x))
                .unwrap_or(f64::NAN),
            Self::StudentT {
                location,
                scale,
                degrees_of_freedom,
            } => StudentsT::new(location, scale, degrees_of_freedom)
                .map(|dist| dist.pdf(x))
                .unwrap_or(f64::NAN),
        }
    }

    pub fn log_likelihood(&self, values: &[f64]) -> f64 {
        match *self {
            Self::Normal { mean, std_dev } => normal_log_likelihood(values, mean, std_dev),
            Self::StudentT {
                location,
                scale,
                degrees_of_freedom,
            } => student_t_log_likelihood(values, location, scale, degrees_of_freedom),
        }
    }
}

/// Bounds for the iterative Student-t solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Relative change in log-likelihood, location and scale that counts as converged.
    pub tolerance: f64,
    /// Lower bound for `nu`; must exceed 1 so the mean exists.
    pub min_degrees_of_freedom: f64,
    pub max_degrees_of_freedom: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            tolerance: 1.0e-8,
            min_degrees_of_freedom: 1.05,
            max_degrees_of_freedom: 500.0,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidFitOption {
                field: "max_iterations",
                reason: String::from("must be greater than zero"),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ValidationError::InvalidFitOption {
                field: "tolerance",
                reason: format!("must be finite and positive, got {}", self.tolerance),
            });
        }
        if !self.min_degrees_of_freedom.is_finite() || self.min_degrees_of_freedom <= 1.0 {
            return Err(ValidationError::InvalidFitOption {
                field: "min_degrees_of_freedom",
                reason: format!("must exceed 1, got {}", self.min_degrees_of_freedom),
            });
        }
        if !self.max_degrees_of_freedom.is_finite()
            || self.max_degrees_of_freedom <= self.min_degrees_of_freedom
        {
            return Err(ValidationError::InvalidFitOption {
                field: "max_degrees_of_freedom",
                reason: format!(
                    "must be finite and exceed min_degrees_of_freedom ({}), got {}",
                    self.min_degrees_of_freedom, self.max_degrees_of_freedom
                ),
            });
        }
        Ok(())
    }
}

/// A fitted model plus solver diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub model: DistributionModel,
    /// Solver iterations used; zero for closed-form fits.
    pub iterations: usize,
    pub log_likelihood: f64,
}

/// Fits `family` to `returns` by maximum likelihood.
///
/// # Errors
/// - [`AnalysisError::InsufficientData`] for fewer than two returns.
/// - [`AnalysisError::DegenerateInput`] for a zero-variance series.
/// - [`AnalysisError::FitConvergence`] when the Student-t solver exceeds its budget.
/// - [`AnalysisError::Validation`] for invalid `options`.
pub fn fit(
    family: ModelFamily,
    returns: &ReturnSeries,
    options: &FitOptions,
) -> Result<FittedModel, AnalysisError> {
    options.validate()?;
    if returns.len() < crate::returns::MIN_RETURNS {
        return Err(AnalysisError::insufficient(
            Stage::Fit,
            crate::returns::MIN_RETURNS,
            returns.len(),
        ));
    }

    let values = returns.values();
    if values.iter().all(|&value| value == values[0]) {
        return Err(AnalysisError::degenerate(
            Stage::Fit,
            format!("all {} returns are identical", values.len()),
        ));
    }

    let fitted = match family {
        ModelFamily::Normal => fit_normal(&values)?,
        ModelFamily::StudentT => fit_student_t(&values, options)?,
    };

    debug!(
        family = %family,
        iterations = fitted.iterations,
        log_likelihood = fitted.log_likelihood,
        model = ?fitted.model,
        "fitted distribution"
    );
    Ok(fitted)
}

fn fit_normal(values: &[f64]) -> Result<FittedModel, AnalysisError> {
    let n = values.len();
    let mean = crate::returns::mean(values.iter().copied(), n);
    let std_dev = crate::returns::population_std_dev(values.iter().copied(), n);
    if !std_dev.is_finite() || std_dev < MIN_SCALE {
        return Err(AnalysisError::degenerate(
            Stage::Fit,
            format!("normal standard deviation is {std_dev}"),
        ));
    }

    Ok(FittedModel {
        model: DistributionModel::Normal { mean, std_dev },
        iterations: 0,
        log_likelihood: normal_log_likelihood(values, mean, std_dev),
    })
}

fn fit_student_t(values: &[f64], options: &FitOptions) -> Result<FittedModel, AnalysisError> {
    let n = values.len();
    let mut location = crate::returns::mean(values.iter().copied(), n);
    let mut scale = crate::returns::population_std_dev(values.iter().copied(), n);
    if !scale.is_finite() || scale < MIN_SCALE {
        return Err(AnalysisError::degenerate(
            Stage::Fit,
            format!("student-t starting scale is {scale}"),
        ));
    }

    let mut dof = INITIAL_DEGREES_OF_FREEDOM.clamp(
        options.min_degrees_of_freedom,
        options.max_degrees_of_freedom,
    );
    let mut log_likelihood = student_t_log_likelihood(values, location, scale, dof);
    let tolerance = options.tolerance;

    for iteration in 1..=options.max_iterations {
        let inv_var = 1.0 / (scale * scale);
        let mut weight_sum = 0.0;
        let mut weighted_sum = 0.0;
        let weights: Vec<f64> = values
            .iter()
            .map(|&x| {
                let z2 = (x - location).powi(2) * inv_var;
                let w = (dof + 1.0) / (dof + z2);
                weight_sum += w;
                weighted_sum += w * x;
                w
            })
            .collect();

        let next_location = weighted_sum / weight_sum;
        let next_var = values
            .iter()
            .zip(&weights)
            .map(|(&x, &w)| w * (x - next_location).powi(2))
            .sum::<f64>()
            / n as f64;
        let next_scale = next_var.sqrt();
        if !next_location.is_finite() || !next_scale.is_finite() || next_scale < MIN_SCALE {
            return Err(AnalysisError::FitConvergence {
                family: ModelFamily::StudentT.as_str(),
                iterations: iteration,
                reason: format!("scale collapsed to {next_scale}"),
            });
        }

        let next_dof = maximize_degrees_of_freedom(values, next_location, next_scale, options);
        let next_log_likelihood =
            student_t_log_likelihood(values, next_location, next_scale, next_dof);
        if !next_log_likelihood.is_finite() {
            return Err(AnalysisError::FitConvergence {
                family: ModelFamily::StudentT.as_str(),
                iterations: iteration,
                reason: String::from("log-likelihood is not finite"),
            });
        }

        let converged = (next_log_likelihood - log_likelihood).abs()
            <= tolerance * (1.0 + log_likelihood.abs())
            && (next_location - location).abs() <= tolerance * next_scale
            && (next_scale - scale).abs() <= tolerance * next_scale;

        location = next_location;
        scale = next_scale;
        dof = next_dof;
        log_likelihood = next_log_likelihood;

        if converged {
            return Ok(FittedModel {
                model: DistributionModel::StudentT {
                    location,
                    scale,
                    degrees_of_freedom: dof,
                },
                iterations: iteration,
                log_likelihood,
            });
        }
    }

    Err(AnalysisError::FitConvergence {
        family: ModelFamily::StudentT.as_str(),
        iterations: options.max_iterations,
        reason: format!(
            "last estimate location={location}, scale={scale}, degrees_of_freedom={dof}"
        ),
    })
}

/// Profile maximizer of the Student-t likelihood in `nu` for fixed location and scale.
///
/// Returns a bound when the score keeps its sign across the whole bracket.
fn maximize_degrees_of_freedom(
    values: &[f64],
    location: f64,
    scale: f64,
    options: &FitOptions,
) -> f64 {
    let inv_var = 1.0 / (scale * scale);
    let squared: Vec<f64> = values
        .iter()
        .map(|&x| (x - location).powi(2) * inv_var)
        .collect();
    let score = |dof: f64| dof_score(&squared, dof);

    let lower = options.min_degrees_of_freedom;
    let upper = options.max_degrees_of_freedom;
    if score(lower) <= 0.0 {
        return lower;
    }
    if score(upper) >= 0.0 {
        return upper;
    }

    let (mut lo, mut hi) = (lower.ln(), upper.ln());
    for _ in 0..DOF_BISECTION_STEPS {
        if hi - lo < DOF_BRACKET_WIDTH {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if score(mid.exp()) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (0.5 * (lo + hi)).exp()
}

/// Derivative of the Student-t log-likelihood with respect to `nu`.
///
/// `squared` holds the standardized squared residuals `((x - mu) / sigma)^2`.
fn dof_score(squared: &[f64], dof: f64) -> f64 {
    let n = squared.len() as f64;
    let constant = 0.5 * n * (digamma(0.5 * (dof + 1.0)) - digamma(0.5 * dof) - 1.0 / dof);
    let (log_sum, ratio_sum) = squared.iter().fold((0.0, 0.0), |(log_sum, ratio_sum), &d| {
        (log_sum + (d / dof).ln_1p(), ratio_sum + d / (dof + d))
    });
    constant - 0.5 * log_sum + 0.5 * (dof + 1.0) / dof * ratio_sum
}

fn normal_log_likelihood(values: &[f64], mean: f64, std_dev: f64) -> f64 {
    let var = std_dev * std_dev;
    let norm = -0.5 * (2.0 * PI * var).ln();
    values
        .iter()
        .map(|&x| norm - 0.5 * (x - mean).powi(2) / var)
        .sum()
}

fn student_t_log_likelihood(values: &[f64], location: f64, scale: f64, dof: f64) -> f64 {
    let norm = ln_gamma(0.5 * (dof + 1.0)) - ln_gamma(0.5 * dof) - 0.5 * (dof * PI).ln()
        - scale.ln();
    values
        .iter()
        .map(|&x| {
            let z = (x - location) / scale;
            norm - 0.5 * (dof + 1.0) * (z * z / dof).ln_1p()
        })
        .sum()
}
