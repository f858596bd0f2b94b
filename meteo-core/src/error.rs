use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the geocoding, forecast and reverse-geocoding calls.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("failed to reach {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed forecast payload: {0}")]
    Malformed(String),

    #[error("no results found")]
    EmptyResult,
}

impl WeatherError {
    /// Transport failures and non-2xx statuses are both reported to the user as
    /// a network problem.
    pub fn is_network(&self) -> bool {
        matches!(self, WeatherError::Transport { .. } | WeatherError::Status { .. })
    }
}

/// Device position lookup errors.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
}

/// Persisted key-value store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(String),
}
