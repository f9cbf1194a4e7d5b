use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDate, ValidationError};

/// One daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: TradingDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: TradingDate, price: f64) -> Result<Self, ValidationError> {
        if !price.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "price" });
        }
        if price <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field: "price" });
        }
        Ok(Self { date, price })
    }
}

/// Date-ordered price history for a single instrument. Only built through
/// [`PriceHistory::new`], so it is serialize-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Sorts `points` by date. Two observations on the same date are rejected.
    pub fn new(symbol: Symbol, mut points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        points.sort_by_key(|point| point.date);
        if let Some(pair) = points.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(ValidationError::DuplicateDate {
                date: pair[0].date.to_string(),
            });
        }
        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
