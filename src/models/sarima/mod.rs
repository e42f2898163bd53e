//! Weekly seasonal ARIMA.

mod diff;
mod model;

pub use diff::{seasonal_difference, seasonal_integrate};
pub use model::{FittedSarima, Sarima, SarimaParams};
