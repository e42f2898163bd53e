//! # raincast
//!
//! Single-day weather forecasting from archived daily history.
//!
//! For a coordinate and target date, fetches several years of daily
//! observations (Open-Meteo first, then NASA POWER, degrading to
//! deterministic synthetic data when both archives are unreachable),
//! fits a weekly SARIMA plus two tree
//! ensembles per variable, and fuses them by inverse validation error
//! into one forecast per variable with accuracy metrics attached.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod ensemble;
pub mod error;
pub mod eval;
pub mod features;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{PredictError, Result};

pub mod prelude {
    pub use crate::config::PredictorConfig;
    pub use crate::core::{HistorySeries, WeatherVariable};
    pub use crate::ensemble::SelectionStrategy;
    pub use crate::error::{PredictError, Result};
    pub use crate::history::{
        ChainedProvider, HistoryProvider, OpenMeteoClient, PowerClient, SyntheticProvider,
    };
    pub use crate::models::ModelKind;
    pub use crate::pipeline::Predictor;
    pub use crate::report::{PredictionResult, accuracy_bundle};
}
