//! Shared fixtures for the tailfit behaviour tests.
//!
//! Price series are built from seeded return draws so every test sees the
//! same data: `price[i] = price[i - 1] * exp(r[i])`, one calendar day apart.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StudentT};
use tailfit_core::{InMemoryPriceSource, PricePoint, Symbol, TradingDate};
use time::macros::date;
use time::Duration;

pub use tailfit_core::{AnalysisConfig, AnalysisError, ModelFamily, Stage, TickerPipeline};

pub const FIRST_DATE: TradingDate = TradingDate::from_date(date!(1980 - 01 - 01));
pub const START_PRICE: f64 = 100.0;

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("fixture symbol must be valid")
}

pub fn date_after(days: usize) -> TradingDate {
    let offset = i64::try_from(days).expect("fixture offset fits in i64");
    TradingDate::from_date(FIRST_DATE.into_inner() + Duration::days(offset))
}

/// `returns.len() + 1` prices whose log returns are exactly `returns`.
pub fn prices_from_log_returns(returns: &[f64]) -> Vec<PricePoint> {
    let mut price = START_PRICE;
    let mut points = vec![PricePoint::new(date_after(0), price).expect("start price")];
    for (index, value) in returns.iter().enumerate() {
        price *= value.exp();
        points.push(PricePoint::new(date_after(index + 1), price).expect("fixture price"));
    }
    points
}

/// `count` identical prices.
pub fn flat_prices(count: usize, price: f64) -> Vec<PricePoint> {
    (0..count)
        .map(|day| PricePoint::new(date_after(day), price).expect("fixture price"))
        .collect()
}

pub fn normal_returns(seed: u64, count: usize, mean: f64, std_dev: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(mean, std_dev).expect("valid normal");
    (0..count).map(|_| dist.sample(&mut rng)).collect()
}

pub fn student_t_returns(seed: u64, count: usize, dof: f64, scale: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = StudentT::new(dof).expect("valid student t");
    (0..count).map(|_| scale * dist.sample(&mut rng)).collect()
}

/// In-memory source holding one series per `(ticker, prices)` pair.
pub fn source_with(series: Vec<(&str, Vec<PricePoint>)>) -> InMemoryPriceSource {
    series
        .into_iter()
        .fold(InMemoryPriceSource::new(), |source, (ticker, points)| {
            source.with_series(symbol(ticker), points)
        })
}

pub fn default_pipeline() -> TickerPipeline {
    TickerPipeline::new(AnalysisConfig::default()).expect("default config is valid")
}
