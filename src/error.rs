//! Error types for the raincast crate.

use thiserror::Error;

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, PredictError>;

/// Errors that can occur while fetching history or producing a forecast.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The target date string does not parse as `YYYY-MM-DD`.
    #[error("invalid target date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The fetched history contains no observed values at all.
    #[error("history contains no observed values")]
    EmptySeries,

    /// A future feature row was requested from a history with no rows.
    #[error("empty history: cannot build a future feature row")]
    EmptyHistory,

    /// Not enough rows to fit a model.
    #[error("insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData {
        /// Minimum number of rows the model needs.
        needed: usize,
        /// Number of rows actually available.
        got: usize,
    },

    /// Model estimation failed.
    #[error("model fit failed: {0}")]
    Fit(String),

    /// The archive holds no data for the requested date range.
    #[error("archive has no data for {start}..{end}")]
    NoArchiveData {
        /// First day requested.
        start: chrono::NaiveDate,
        /// Last day requested.
        end: chrono::NaiveDate,
    },

    /// A request to the weather archive could not be completed.
    #[error("request to {url} failed")]
    Upstream {
        /// The request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The weather archive answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: reqwest::StatusCode,
    },

    /// The weather archive response body could not be decoded.
    #[error("could not decode response from {url}")]
    Decode {
        /// The request URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// A blocking pipeline task failed to join.
    #[error("blocking task failed: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = PredictError::InvalidDate("2024-13-01".to_string());
        assert!(err.to_string().contains("2024-13-01"));
        assert!(err.to_string().contains("YYYY-MM-DD"));

        let err = PredictError::InsufficientData { needed: 16, got: 4 };
        assert!(err.to_string().contains("16"));
        assert!(err.to_string().contains('4'));

        let err = PredictError::EmptySeries;
        assert!(err.to_string().contains("no observed values"));

        let err = PredictError::Fit("optimizer diverged".to_string());
        assert!(err.to_string().contains("optimizer diverged"));
    }

    #[test]
    fn status_error_names_url_and_code() {
        let err = PredictError::Status {
            url: "https://power.larc.nasa.gov/api".to_string(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        };
        let message = err.to_string();
        assert!(message.contains("power.larc.nasa.gov"));
        assert!(message.contains("503"));
    }
}
