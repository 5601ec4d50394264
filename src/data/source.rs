//! Market data boundary.
//!
//! Acquisition of snapshots and option chains is a collaborator concern;
//! the core consumes it through this narrow interface. A failed fetch is
//! propagated, never papered over with a default reading. Retries, caching
//! and timeouts all belong on the provider side of the trait.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::{MarketSnapshot, OptionChainSlice};

/// Errors surfaced by a market data provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("no market snapshot available")]
    SnapshotUnavailable,

    #[error("no expiration within {tolerance} days of {target} DTE")]
    NoExpirationInRange { target: i64, tolerance: i64 },

    #[error("malformed provider data: {0}")]
    Malformed(String),

    #[error("provider failure: {0}")]
    Provider(String),
}

/// Narrow interface to the external data collaborator.
///
/// Implementations may block or delegate to async runtimes internally; the
/// core only assumes that the most recent completed call wins.
pub trait MarketDataSource {
    /// Fetch the current technical snapshot of the underlying.
    fn fetch_market_snapshot(&self) -> Result<MarketSnapshot, MarketDataError>;

    /// Fetch the option chain slice whose expiration lies nearest
    /// `target_dte`, within `tolerance_days`.
    fn fetch_option_chain(
        &self,
        target_dte: i64,
        tolerance_days: i64,
    ) -> Result<OptionChainSlice, MarketDataError>;
}

/// Provider backed by pre-loaded data. Used by tests and the CLI demo;
/// production providers live outside this crate.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    snapshot: Option<MarketSnapshot>,
    slices: Vec<OptionChainSlice>,
}

impl InMemoryDataSource {
    pub fn new(snapshot: MarketSnapshot, slices: Vec<OptionChainSlice>) -> Self {
        Self {
            snapshot: Some(snapshot),
            slices,
        }
    }

    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_slice(mut self, slice: OptionChainSlice) -> Self {
        self.slices.push(slice);
        self
    }

    /// Expirations currently loaded, for diagnostics.
    pub fn expirations(&self) -> Vec<NaiveDate> {
        self.slices.iter().map(|s| s.expiration).collect()
    }
}

impl MarketDataSource for InMemoryDataSource {
    fn fetch_market_snapshot(&self) -> Result<MarketSnapshot, MarketDataError> {
        self.snapshot
            .clone()
            .ok_or(MarketDataError::SnapshotUnavailable)
    }

    fn fetch_option_chain(
        &self,
        target_dte: i64,
        tolerance_days: i64,
    ) -> Result<OptionChainSlice, MarketDataError> {
        self.slices
            .iter()
            .filter(|s| (s.dte - target_dte).abs() <= tolerance_days)
            .min_by_key(|s| (s.dte - target_dte).abs())
            .cloned()
            .ok_or(MarketDataError::NoExpirationInRange {
                target: target_dte,
                tolerance: tolerance_days,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn slice(dte: i64) -> OptionChainSlice {
        let exp = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        OptionChainSlice::new(exp, dte, dec!(100))
    }

    #[test]
    fn test_empty_source_fails() {
        let source = InMemoryDataSource::default();
        assert!(matches!(
            source.fetch_market_snapshot(),
            Err(MarketDataError::SnapshotUnavailable)
        ));
    }

    #[test]
    fn test_chain_within_tolerance() {
        let source = InMemoryDataSource::default()
            .with_slice(slice(21))
            .with_slice(slice(33));

        let found = source.fetch_option_chain(30, 5).unwrap();
        assert_eq!(found.dte, 33);
    }

    #[test]
    fn test_chain_outside_tolerance_raises() {
        let source = InMemoryDataSource::default().with_slice(slice(60));

        let err = source.fetch_option_chain(30, 5).unwrap_err();
        assert!(matches!(
            err,
            MarketDataError::NoExpirationInRange {
                target: 30,
                tolerance: 5
            }
        ));
    }
}
