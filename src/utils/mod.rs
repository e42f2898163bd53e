//! Numeric utilities shared by the model and evaluation layers.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{finite_mean, mean, sample_quantile};
