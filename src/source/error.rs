use std::time::Duration;

use thiserror::Error;

use super::wait::WaitError;

#[derive(Debug, Error)]
/// Errors surfaced by a [`SourceAdapter`](super::SourceAdapter).
///
/// Everything here is fatal for the dataset being extracted. Field-level problems
/// never reach this type; see [`FieldExtractionError`](super::fields::FieldExtractionError).
pub enum SourceError {
    /// Login failed or the login page could not be reached.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// A listing page required for extraction could not be reached.
    #[error("cannot reach {page}: {reason}")]
    Navigation { page: String, reason: String },

    /// A landmark did not appear within the configured timeout.
    #[error("timed out after {waited:?} waiting for {landmark}")]
    Timeout { landmark: String, waited: Duration },

    /// The site answered with a client error status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// A listing was requested before [`authenticate`](super::SourceAdapter::authenticate).
    #[error("not authenticated")]
    NotAuthenticated,

    /// No source site is configured for this run.
    #[error("no source site configured")]
    NotConfigured,

    /// A built-in CSS selector failed to parse.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<WaitError<SourceError>> for SourceError {
    fn from(err: WaitError<SourceError>) -> Self {
        match err {
            WaitError::Timeout {
                landmark, waited, ..
            } => SourceError::Timeout { landmark, waited },
            WaitError::Check(inner) => inner,
        }
    }
}

impl SourceError {
    /// Re-labels a failure while loading `page` as a [`SourceError::Navigation`].
    pub fn into_navigation(self, page: impl Into<String>) -> Self {
        match self {
            err @ (SourceError::Navigation { .. } | SourceError::Authentication { .. }) => err,
            other => SourceError::Navigation {
                page: page.into(),
                reason: other.to_string(),
            },
        }
    }
}
