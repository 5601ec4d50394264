//! Market data types and the collaborator boundary.

pub mod history;
pub mod source;
pub mod types;

pub use history::{load_daily_bars, HistoryError};
pub use source::{InMemoryDataSource, MarketDataError, MarketDataSource};
pub use types::{
    DailyBar, Greeks, MarketSnapshot, OptionChainSlice, OptionQuote, OptionType,
};
