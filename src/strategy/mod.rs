//! Strategy selection and parameter building.

pub mod parameters;
pub mod selector;

pub use parameters::{
    ParameterBuilder, StrategyConfig, StrategyError, StrategyParameters, ValidationError,
};
pub use selector::{select_strategy, StrategyDirection, StrategyKind};
