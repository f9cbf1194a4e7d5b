use serde::Serialize;
use tailfit_core::catalog::{self, CatalogEntry};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TickersResponseData {
    tickers: Vec<CatalogEntry>,
    default_pair: [&'static str; 2],
}

pub fn run() -> Result<CommandResult, CliError> {
    let data = TickersResponseData {
        tickers: catalog::entries().to_vec(),
        default_pair: catalog::default_pair(),
    };

    Ok(CommandResult::ok(serde_json::to_value(data)?, "catalog"))
}
