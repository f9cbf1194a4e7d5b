use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::date;

use crate::{
    DateRange, FitOptions, ModelFamily, ReturnKind, ReturnOptions, TradingDate, ValidationError,
};

/// First date of the default analysis window: all available history.
pub const DEFAULT_START: TradingDate = TradingDate::from_date(date!(1900 - 01 - 01));
pub const DEFAULT_END: TradingDate = TradingDate::from_date(date!(2024 - 12 - 01));
pub const DEFAULT_BIN_COUNT: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Every tunable of the pipeline.
///
/// ```yaml
/// start: 2010-01-01
/// end: 2024-12-01
/// bin_count: 60
/// return_kind: log
/// models: [normal, student_t]
/// fit:
///   max_iterations: 2000
///   tolerance: 1.0e-9
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub start: TradingDate,
    pub end: TradingDate,
    pub bin_count: usize,
    pub return_kind: ReturnKind,
    pub outlier_sigma: Option<f64>,
    pub min_prices: usize,
    /// Models to fit, in the order results are reported.
    pub models: Vec<ModelFamily>,
    pub fit: FitOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
            bin_count: DEFAULT_BIN_COUNT,
            return_kind: ReturnKind::Log,
            outlier_sigma: None,
            min_prices: 2,
            models: ModelFamily::DEFAULT_ORDER.to_vec(),
            fit: FitOptions::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn range(&self) -> Result<DateRange, ValidationError> {
        DateRange::new(self.start, self.end)
    }

    pub fn return_options(&self) -> ReturnOptions {
        ReturnOptions {
            kind: self.return_kind,
            outlier_sigma: self.outlier_sigma,
            min_prices: self.min_prices,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.range()?;

        if self.bin_count == 0 {
            return Err(ValidationError::ZeroBinCount);
        }
        if self.min_prices < 2 {
            return Err(ValidationError::MinPricesTooSmall {
                value: self.min_prices,
            });
        }
        if let Some(sigma) = self.outlier_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(ValidationError::InvalidOutlierSigma { value: sigma });
            }
        }

        if self.models.is_empty() {
            return Err(ValidationError::EmptyModelList);
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.models.iter().find(|model| !seen.insert(**model)) {
            return Err(ValidationError::DuplicateModel {
                model: duplicate.to_string(),
            });
        }

        self.fit.validate()
    }
}
