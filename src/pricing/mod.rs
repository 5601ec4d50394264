//! Options pricing and probability-of-profit model.

pub mod model;

pub use model::{PricingModel, VerticalPricing};
