mod compare;
mod fit;
mod tickers;

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tailfit_core::{
    catalog, AnalysisConfig, CsvPriceSource, DistributionModel, Envelope, EnvelopeError,
    EnvelopeMeta, ModelFamily, ReturnKind, Symbol, TickerResult, TradingDate,
};
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Command, TuningArgs};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub source: &'static str,
}

impl CommandResult {
    pub fn ok(data: Value, source: &'static str) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            source,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Fit(args) => {
            let config = analysis_config(cli, &args.tuning)?;
            fit::run(args, config, &CsvPriceSource::new(cli.data_dir.clone()))?
        }
        Command::Compare(args) => {
            let config = analysis_config(cli, &args.tuning)?;
            compare::run(args, config, &CsvPriceSource::new(cli.data_dir.clone()))?
        }
        Command::Tickers => tickers::run()?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        source,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), source, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

/// Config file (or defaults) with command-line overrides applied, validated.
fn analysis_config(cli: &Cli, tuning: &TuningArgs) -> Result<AnalysisConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading analysis config");
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(start) = &tuning.start {
        config.start = TradingDate::parse(start)?;
    }
    if let Some(end) = &tuning.end {
        config.end = TradingDate::parse(end)?;
    }
    if let Some(bins) = tuning.bins {
        config.bin_count = bins;
    }
    if let Some(kind) = &tuning.return_kind {
        config.return_kind = kind.parse::<ReturnKind>()?;
    }
    if let Some(sigma) = tuning.outlier_sigma {
        config.outlier_sigma = Some(sigma);
    }
    if let Some(max_iterations) = tuning.max_iterations {
        config.fit.max_iterations = max_iterations;
    }
    if let Some(tolerance) = tuning.tolerance {
        config.fit.tolerance = tolerance;
    }

    config.validate()?;
    Ok(config)
}

/// Warnings for tickers outside the bundled catalog.
fn uncatalogued(symbols: &[Symbol]) -> Vec<String> {
    symbols
        .iter()
        .filter(|symbol| catalog::lookup(symbol.as_str()).is_none())
        .map(|symbol| format!("{symbol} is not in the bundled ETF catalog"))
        .collect()
}

/// Serializable digest of one instrument's result.
#[derive(Debug, Serialize)]
pub struct TickerSummary {
    pub symbol: String,
    pub start: String,
    pub end: String,
    pub return_kind: ReturnKind,
    pub observations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub bin_count: usize,
    pub bin_width: f64,
    pub fits: Vec<FitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_fit: Option<ModelFamily>,
}

#[derive(Debug, Serialize)]
pub struct FitSummary {
    pub family: ModelFamily,
    pub name: &'static str,
    pub parameters: DistributionModel,
    pub mape: f64,
    pub iterations: usize,
    pub log_likelihood: f64,
}

impl From<&TickerResult> for TickerSummary {
    fn from(result: &TickerResult) -> Self {
        Self {
            symbol: result.symbol.to_string(),
            start: result.range.start.to_string(),
            end: result.range.end.to_string(),
            return_kind: result.return_kind,
            observations: result.returns.len(),
            mean: result.returns.mean(),
            std_dev: result.returns.population_std_dev(),
            min: result.returns.min(),
            max: result.returns.max(),
            bin_count: result.histogram.len(),
            bin_width: result.histogram.width(),
            fits: result
                .fits
                .iter()
                .map(|fit| FitSummary {
                    family: fit.family,
                    name: fit.name,
                    parameters: fit.model,
                    mape: fit.mape,
                    iterations: fit.iterations,
                    log_likelihood: fit.log_likelihood,
                })
                .collect(),
            best_fit: result.best_fit().map(|fit| fit.family),
        }
    }
}
