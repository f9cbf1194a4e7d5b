use serde::Serialize;
use tailfit_core::{
    AnalysisConfig, EnvelopeError, OverlayPoint, PriceSource, Symbol, TickerPipeline,
};

use crate::cli::FitArgs;
use crate::error::CliError;

use super::{uncatalogued, CommandResult, TickerSummary};

#[derive(Debug, Serialize)]
struct FitResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<TickerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Vec<OverlayPoint>>,
}

pub fn run<S>(args: &FitArgs, config: AnalysisConfig, source: &S) -> Result<CommandResult, CliError>
where
    S: PriceSource,
{
    let symbol = Symbol::parse(&args.symbol)?;
    let pipeline = TickerPipeline::new(config)?;
    let warnings = uncatalogued(std::slice::from_ref(&symbol));

    let (data, errors) = match pipeline.process(source, &symbol) {
        Ok(result) => {
            let data = FitResponseData {
                summary: Some(TickerSummary::from(&result)),
                histogram: args.histogram.then(|| result.overlay()),
            };
            (data, Vec::new())
        }
        Err(error) => {
            let data = FitResponseData {
                summary: None,
                histogram: None,
            };
            (data, vec![EnvelopeError::from_analysis(symbol.as_str(), &error)])
        }
    };

    Ok(CommandResult::ok(serde_json::to_value(data)?, source.id())
        .with_warnings(warnings)
        .with_errors(errors))
}
