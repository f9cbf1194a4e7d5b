use serde::Serialize;
use tailfit_core::{
    catalog, AnalysisConfig, EnvelopeError, ModelFamily, PriceSource, Symbol, TickerPipeline,
};

use crate::cli::CompareArgs;
use crate::error::CliError;

use super::{uncatalogued, CommandResult, TickerSummary};

#[derive(Debug, Serialize)]
struct CompareResponseData {
    tickers: Vec<TickerSummary>,
    mape: Vec<MapeRow>,
}

/// One model's MAPE across the compared tickers. `None` where the ticker
/// failed or the model was not fitted.
#[derive(Debug, Serialize)]
struct MapeRow {
    model: &'static str,
    family: ModelFamily,
    values: Vec<TickerMape>,
}

#[derive(Debug, Serialize)]
struct TickerMape {
    symbol: String,
    mape: Option<f64>,
}

pub fn run<S>(
    args: &CompareArgs,
    config: AnalysisConfig,
    source: &S,
) -> Result<CommandResult, CliError>
where
    S: PriceSource,
{
    let symbols = requested_symbols(&args.symbols)?;
    let models = config.models.clone();
    let pipeline = TickerPipeline::new(config)?;

    let outcomes = pipeline.process_batch(source, &symbols);

    let mut tickers = Vec::new();
    let mut errors = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => tickers.push(TickerSummary::from(result)),
            Err(error) => errors.push(EnvelopeError::from_analysis(outcome.symbol.as_str(), error)),
        }
    }

    let mape = models
        .iter()
        .map(|&family| MapeRow {
            model: family.display_name(),
            family,
            values: outcomes
                .iter()
                .map(|outcome| TickerMape {
                    symbol: outcome.symbol.to_string(),
                    mape: outcome
                        .result
                        .as_ref()
                        .ok()
                        .and_then(|result| result.fit_for(family))
                        .map(|fit| fit.mape),
                })
                .collect(),
        })
        .collect();

    let data = CompareResponseData { tickers, mape };
    Ok(CommandResult::ok(serde_json::to_value(data)?, source.id())
        .with_warnings(uncatalogued(&symbols))
        .with_errors(errors))
}

/// Parsed, de-duplicated symbols; the default pair when none are given.
fn requested_symbols(raw: &[String]) -> Result<Vec<Symbol>, CliError> {
    let mut symbols: Vec<Symbol> = Vec::new();
    if raw.is_empty() {
        for symbol in catalog::default_pair() {
            symbols.push(Symbol::parse(symbol)?);
        }
        return Ok(symbols);
    }

    for value in raw {
        let symbol = Symbol::parse(value)?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}
