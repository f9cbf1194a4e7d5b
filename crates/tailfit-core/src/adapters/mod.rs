//! Local [`PriceSource`](crate::PriceSource) implementations.

mod csv_file;

pub use csv_file::CsvPriceSource;
