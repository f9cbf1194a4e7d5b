use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::{DateRange, PriceHistory, PricePoint, Symbol};

/// Price-source error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotFound,
    Unavailable,
    Malformed,
    InvalidRequest,
}

/// Structured failure reported by a [`PriceSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for daily closing prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub symbol: Symbol,
    pub range: DateRange,
}

impl PriceRequest {
    pub fn new(symbol: Symbol, range: DateRange) -> Self {
        Self { symbol, range }
    }
}

/// Price-history provider contract.
///
/// Implementations may return observations outside `req.range`; the return
/// calculator applies the range itself.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> &'static str;
    fn daily_closes(&self, req: &PriceRequest) -> Result<PriceHistory, SourceError>;
}

/// Price source backed by series held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<Symbol, Vec<PricePoint>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: Symbol, points: Vec<PricePoint>) -> Self {
        self.series.insert(symbol, points);
        self
    }
}

impl PriceSource for InMemoryPriceSource {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn daily_closes(&self, req: &PriceRequest) -> Result<PriceHistory, SourceError> {
        let points = self.series.get(&req.symbol).ok_or_else(|| {
            SourceError::not_found(format!("no price series registered for {}", req.symbol))
        })?;
        PriceHistory::new(req.symbol.clone(), points.clone())
            .map_err(|error| SourceError::malformed(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TradingDate;

    fn range() -> DateRange {
        DateRange::new(
            TradingDate::parse("2024-01-01").expect("date"),
            TradingDate::parse("2025-01-01").expect("date"),
        )
        .expect("range")
    }

    #[test]
    fn in_memory_source_reports_unknown_symbol() {
        let source = InMemoryPriceSource::new();
        let request = PriceRequest::new(Symbol::parse("SPY").expect("symbol"), range());
        let err = source.daily_closes(&request).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::NotFound);
        assert_eq!(err.code(), "source.not_found");
        assert!(err.to_string().contains("SPY"));
    }

    #[test]
    fn in_memory_source_returns_sorted_history() {
        let symbol = Symbol::parse("QQQ").expect("symbol");
        let points = vec![
            PricePoint::new(TradingDate::parse("2024-03-02").expect("date"), 11.0).expect("p"),
            PricePoint::new(TradingDate::parse("2024-03-01").expect("date"), 10.0).expect("p"),
        ];
        let source = InMemoryPriceSource::new().with_series(symbol.clone(), points);

        let history = source
            .daily_closes(&PriceRequest::new(symbol, range()))
            .expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history.points()[0].price, 10.0);
    }
}
