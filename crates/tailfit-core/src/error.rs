use thiserror::Error;

use crate::source::SourceError;

/// Validation and contract errors exposed by `tailfit-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date range start {start} must be before end {end}")]
    EmptyDateRange { start: String, end: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be strictly positive")]
    NonPositiveValue { field: &'static str },
    #[error("duplicate price observation for {date}")]
    DuplicateDate { date: String },

    #[error("invalid return kind '{value}', expected one of log, simple")]
    InvalidReturnKind { value: String },
    #[error("invalid model '{value}', expected one of normal, student_t")]
    InvalidModel { value: String },
    #[error("model list must contain at least one model")]
    EmptyModelList,
    #[error("model '{model}' is listed more than once")]
    DuplicateModel { model: String },
    #[error("bin count must be greater than zero")]
    ZeroBinCount,
    #[error("min_prices must be at least 2, got {value}")]
    MinPricesTooSmall { value: usize },
    #[error("optimizer setting '{field}' is out of range: {reason}")]
    InvalidFitOption {
        field: &'static str,
        reason: String,
    },
    #[error("outlier sigma must be finite and positive, got {value}")]
    InvalidOutlierSigma { value: f64 },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Pipeline stage an [`AnalysisError`] was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Returns,
    Fit,
    Histogram,
    Score,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Returns => "returns",
            Self::Fit => "fit",
            Self::Histogram => "histogram",
            Self::Score => "score",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure for one instrument.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data at {stage} stage: need at least {required}, got {actual}")]
    InsufficientData {
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error("degenerate input at {stage} stage: {reason}")]
    DegenerateInput { stage: Stage, reason: String },

    #[error("{family} fit did not converge after {iterations} iterations: {reason}")]
    FitConvergence {
        family: &'static str,
        iterations: usize,
        reason: String,
    },

    #[error("price source failed for {symbol}: {source}")]
    Source { symbol: String, source: SourceError },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalysisError {
    pub fn insufficient(stage: Stage, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            stage,
            required,
            actual,
        }
    }

    pub fn degenerate(stage: Stage, reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            stage,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in envelope errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "analysis.insufficient_data",
            Self::DegenerateInput { .. } => "analysis.degenerate_input",
            Self::FitConvergence { .. } => "analysis.fit_convergence",
            Self::Source { source, .. } => source.code(),
            Self::Validation(_) => "validation.invalid_input",
        }
    }
}
