//! CSV loader for daily bar history.
//!
//! Expected columns: date, open, high, low, close, volume, vix.
//! Dates are `%Y-%m-%d`. Rows must be in ascending date order; the loader
//! rejects files that are not, since the simulator depends on ordering.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use super::types::DailyBar;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("bars out of order at {0}")]
    OutOfOrder(NaiveDate),

    #[error("history file contained no bars")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    date: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: i64,
    vix: f64,
}

/// Load a daily-bar series from a CSV file.
pub fn load_daily_bars(path: &Path) -> Result<Vec<DailyBar>, HistoryError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| match e.kind() {
        csv::ErrorKind::Io(_) => HistoryError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        },
        _ => HistoryError::Csv(e),
    })?;

    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let raw: RawBar = record?;
        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
            .map_err(|_| HistoryError::InvalidDate(raw.date.clone()))?;

        if let Some(prev) = bars.last().map(|b: &DailyBar| b.date) {
            if date <= prev {
                return Err(HistoryError::OutOfOrder(date));
            }
        }

        bars.push(DailyBar {
            date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            vix: raw.vix,
        });
    }

    if bars.is_empty() {
        return Err(HistoryError::Empty);
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("spreadlab_{}_{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_ordered_bars() {
        let path = write_temp(
            "ordered",
            "date,open,high,low,close,volume,vix\n\
             2024-01-02,470.0,472.5,468.0,471.2,1000000,13.2\n\
             2024-01-03,471.2,473.0,469.5,470.1,900000,13.8\n",
        );
        let bars = load_daily_bars(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].vix, 13.8);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let path = write_temp(
            "unordered",
            "date,open,high,low,close,volume,vix\n\
             2024-01-03,470.0,472.5,468.0,471.2,1000000,13.2\n\
             2024-01-02,471.2,473.0,469.5,470.1,900000,13.8\n",
        );
        let err = load_daily_bars(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, HistoryError::OutOfOrder(_)));
    }
}
