//! Core contracts for tailfit.
//!
//! Compares how well a Normal and a Student-t distribution describe the
//! daily returns of an instrument. This crate contains:
//! - Validated domain types (symbols, dates, price histories)
//! - The price-source boundary and local adapters
//! - Return calculation, maximum-likelihood fitting, histogram binning and
//!   MAPE scoring
//! - The per-instrument pipeline and its configuration
//! - The response envelope and structured errors
//!
//! The core performs no rendering and holds no global state; each pipeline
//! call owns its inputs and outputs.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod distribution;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod histogram;
pub mod pipeline;
pub mod returns;
pub mod scoring;
pub mod source;

pub use adapters::CsvPriceSource;
pub use catalog::CatalogEntry;
pub use config::{AnalysisConfig, ConfigError};
pub use distribution::{fit, DistributionModel, FitOptions, FittedModel, ModelFamily};
pub use domain::{DateRange, PriceHistory, PricePoint, Symbol, TradingDate, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{AnalysisError, Stage, ValidationError};
pub use histogram::{bin, HistogramBin, HistogramBins};
pub use pipeline::{ModelFit, TickerOutcome, TickerPipeline, TickerResult};
pub use returns::{compute_returns, ReturnKind, ReturnOptions, ReturnPoint, ReturnSeries};
pub use scoring::{overlay, score, OverlayPoint};
pub use source::{InMemoryPriceSource, PriceRequest, PriceSource, SourceError, SourceErrorKind};
