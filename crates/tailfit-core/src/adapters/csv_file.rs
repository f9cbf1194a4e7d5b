use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::source::{PriceRequest, PriceSource, SourceError};
use crate::{PriceHistory, PricePoint, TradingDate};

const DATE_COLUMN: &str = "date";
const PRICE_COLUMNS: [&str; 4] = ["adj close", "adj_close", "close", "price"];

/// Reads daily closes from `<dir>/<SYMBOL>.csv`.
///
/// The file needs a header row with a `date` column and one of
/// `adj close`, `adj_close`, `close` or `price` (matched case-insensitively,
/// in that order of preference). Vendor exports mark missing sessions with an
/// empty cell or `null`; such rows are skipped.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    root: PathBuf,
}

impl CsvPriceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, req: &PriceRequest) -> PathBuf {
        self.root.join(format!("{}.csv", req.symbol))
    }
}

impl PriceSource for CsvPriceSource {
    fn id(&self) -> &'static str {
        "csv"
    }

    fn daily_closes(&self, req: &PriceRequest) -> Result<PriceHistory, SourceError> {
        let path = self.path_for(req);
        let file = File::open(&path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => {
                SourceError::not_found(format!("no price file at {}", path.display()))
            }
            _ => SourceError::unavailable(format!("cannot open {}: {error}", path.display())),
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|error| SourceError::malformed(format!("{}: {error}", path.display())))?
            .clone();
        let (date_index, price_index) = locate_columns(&headers)
            .ok_or_else(|| {
                SourceError::malformed(format!(
                    "{}: header must contain a date column and one of {}",
                    path.display(),
                    PRICE_COLUMNS.join(", ")
                ))
            })?;

        let mut points = Vec::new();
        let mut skipped = 0_usize;
        for (row, record) in reader.records().enumerate() {
            let line = row + 2;
            let record = record
                .map_err(|error| SourceError::malformed(format!("{}: {error}", path.display())))?;

            let raw_price = record.get(price_index).unwrap_or_default();
            if raw_price.is_empty() || raw_price.eq_ignore_ascii_case("null") {
                skipped += 1;
                continue;
            }

            let raw_date = record.get(date_index).unwrap_or_default();
            let date = TradingDate::parse(date_part(raw_date)).map_err(|error| {
                SourceError::malformed(format!("{} line {line}: {error}", path.display()))
            })?;
            let price = raw_price.parse::<f64>().map_err(|_| {
                SourceError::malformed(format!(
                    "{} line {line}: price '{raw_price}' is not a number",
                    path.display()
                ))
            })?;
            let point = PricePoint::new(date, price).map_err(|error| {
                SourceError::malformed(format!("{} line {line}: {error}", path.display()))
            })?;
            points.push(point);
        }

        if skipped > 0 {
            warn!(
                symbol = %req.symbol,
                skipped,
                "skipped rows without a price in {}",
                path.display()
            );
        }
        debug!(symbol = %req.symbol, rows = points.len(), "loaded price file");

        PriceHistory::new(req.symbol.clone(), points)
            .map_err(|error| SourceError::malformed(format!("{}: {error}", path.display())))
    }
}

fn locate_columns(headers: &StringRecord) -> Option<(usize, usize)> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|header| header.trim_matches('\u{feff}').to_ascii_lowercase())
        .collect();
    let position = |name: &str| normalized.iter().position(|header| header == name);

    let date_index = position(DATE_COLUMN)?;
    let price_index = PRICE_COLUMNS.iter().find_map(|name| position(name))?;
    Some((date_index, price_index))
}

/// Strips a time-of-day suffix such as `2024-01-02 00:00:00-05:00`.
fn date_part(raw: &str) -> &str {
    raw.split([' ', 'T']).next().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::source::SourceErrorKind;
    use crate::{DateRange, Symbol};

    fn request(symbol: &str) -> PriceRequest {
        let range = DateRange::new(
            TradingDate::parse("1900-01-01").expect("date"),
            TradingDate::parse("2100-01-01").expect("date"),
        )
        .expect("range");
        PriceRequest::new(Symbol::parse(symbol).expect("symbol"), range)
    }

    #[test]
    fn prefers_adjusted_close_over_close() {
        let headers = StringRecord::from(vec!["Date", "Open", "Close", "Adj Close"]);
        assert_eq!(locate_columns(&headers), Some((0, 3)));

        let headers = StringRecord::from(vec!["\u{feff}date", "price"]);
        assert_eq!(locate_columns(&headers), Some((0, 1)));

        let headers = StringRecord::from(vec!["timestamp", "close"]);
        assert_eq!(locate_columns(&headers), None);
    }

    #[test]
    fn strips_time_of_day() {
        assert_eq!(date_part("2024-01-02 00:00:00-05:00"), "2024-01-02");
        assert_eq!(date_part("2024-01-02T00:00:00Z"), "2024-01-02");
        assert_eq!(date_part("2024-01-02"), "2024-01-02");
    }

    #[test]
    fn reads_yahoo_style_export_and_skips_null_rows() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("SPY.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,1,1,1,101.0,100.5,10\n\
             2024-01-02,1,1,1,100.0,99.5,10\n\
             2024-01-04,null,null,null,null,null,null\n",
        )
        .expect("write");

        let history = CsvPriceSource::new(dir.path())
            .daily_closes(&request("spy"))
            .expect("history");
        let prices: Vec<f64> = history.points().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![99.5, 100.5]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = CsvPriceSource::new(dir.path())
            .daily_closes(&request("TLT"))
            .expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::NotFound);
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("GDX.csv"), "date,close\n2024-01-02,abc\n").expect("write");
        let err = CsvPriceSource::new(dir.path())
            .daily_closes(&request("GDX"))
            .expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::Malformed);
        assert!(err.message().contains("line 2"), "{}", err.message());
    }
}
