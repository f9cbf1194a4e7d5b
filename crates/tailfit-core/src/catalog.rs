//! Bundled list of high-volume ETFs offered for comparison.
//!
//! Leveraged and inverse products are excluded.

use serde::Serialize;

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub symbol: &'static str,
    pub name: &'static str,
}

impl CatalogEntry {
    /// `"<SYMBOL> - <name>"`, the label used in selection lists.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.symbol, self.name)
    }
}

const ENTRIES: [CatalogEntry; 13] = [
    entry("FXI", "iShares China Large-Cap ETF"),
    entry("SPY", "SPDR S&P 500 ETF Trust"),
    entry("IBIT", "iShares Bitcoin Trust ETF"),
    entry("TLT", "iShares 20+ Year Treasury Bond ETF"),
    entry("XLF", "Financial Select Sector SPDR Fund"),
    entry("HYG", "iShares iBoxx $ High Yield Corporate Bond ETF"),
    entry("QQQ", "Invesco QQQ Trust Series I"),
    entry("EEM", "iShares MSCI Emerging Markets ETF"),
    entry("KWEB", "KraneShares CSI China Internet ETF"),
    entry("LQD", "iShares iBoxx $ Investment Grade Corporate Bond ETF"),
    entry("IWM", "iShares Russell 2000 ETF"),
    entry("GDX", "VanEck Gold Miners ETF"),
    entry("SLV", "iShares Silver Trust"),
];

const DEFAULT_PAIR: [&str; 2] = ["SPY", "IBIT"];

const fn entry(symbol: &'static str, name: &'static str) -> CatalogEntry {
    CatalogEntry { symbol, name }
}

pub fn entries() -> &'static [CatalogEntry] {
    &ENTRIES
}

/// Case-insensitive lookup by ticker.
pub fn lookup(symbol: &str) -> Option<&'static CatalogEntry> {
    let symbol = symbol.trim();
    ENTRIES
        .iter()
        .find(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
}

/// The two tickers compared when none are chosen.
pub fn default_pair() -> [&'static str; 2] {
    DEFAULT_PAIR
}
