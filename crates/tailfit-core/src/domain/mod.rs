//! # Domain Models
//!
//! Validated input types shared by every pipeline stage.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Normalized instrument ticker |
//! | [`TradingDate`] | Calendar date of a daily observation |
//! | [`DateRange`] | Half-open `[start, end)` analysis window |
//! | [`PricePoint`] | One daily closing price |
//! | [`PriceHistory`] | Date-ordered prices for one instrument |
//! | [`UtcDateTime`] | UTC timestamp for envelope metadata |
//!
//! All constructors validate their invariants and return
//! [`ValidationError`](crate::ValidationError) on failure.

mod date;
mod price;
mod symbol;

pub use date::{DateRange, TradingDate, UtcDateTime};
pub use price::{PriceHistory, PricePoint};
pub use symbol::Symbol;
