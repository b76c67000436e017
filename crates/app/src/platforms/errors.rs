//! Platform call errors.

use thiserror::Error;

/// Failure of a single platform call. Every variant is a call failure to the engine.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request to {platform} timed out")]
    Timeout { platform: &'static str },

    #[error("request to {platform} failed")]
    Transport {
        platform: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} responded with HTTP {status}")]
    Status { platform: &'static str, status: u16 },

    /// Non-success envelope.
    #[error("{platform} rejected the request: {message}")]
    Rejected {
        platform: &'static str,
        message: String,
    },

    /// RPC fault code, reported regardless of HTTP status.
    #[error("{platform} fault {code}: {message}")]
    Fault {
        platform: &'static str,
        code: String,
        message: String,
    },

    #[error("{platform} returned no data")]
    MissingData { platform: &'static str },

    #[error("{platform} returned a body that could not be decoded")]
    Decode {
        platform: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PlatformError {
    pub(crate) fn from_reqwest(platform: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout { platform };
        }

        Self::Transport {
            platform,
            source: error,
        }
    }
}
