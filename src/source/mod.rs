//! Source-site adapter: the boundary to the conference management system.
//!
//! - [`SourceAdapter`] is the extraction contract the pipeline depends on.
//! - [`pcs::PcsAdapter`] implements it over HTTP with [`pages`] doing the HTML work.
//! - [`fields`] turns per-field failures into sentinel values.
//! - [`wait`] provides bounded polling for page landmarks.

pub mod error;
pub mod fields;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pages;
pub mod pcs;
pub mod wait;


pub use error::SourceError;
pub use fields::{FieldExtractionError, FieldResult, ReviewerRecordBuilder, SubmissionRecordBuilder};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCalls, MockSourceAdapter};
pub use pcs::PcsAdapter;
pub use wait::{BackoffPolicy, WaitError, poll_until};

use crate::records::{PotentialReviewer, ReviewerRecord, SubmissionRecord};

#[derive(Clone, PartialEq, Eq)]
/// Login for the source site. `Debug` never prints the password.
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An authenticated session with the source site.
pub struct Session {
    pub username: String,
    pub site: String,
}

impl Session {
    pub fn new(username: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            site: site.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Adapter-specific reference to one submission's suggestion listing.
pub struct SubmissionHandle {
    locator: String,
}

impl SubmissionHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// Extraction contract for a paginated, unreliable record source.
///
/// Listing methods fail only when the listing itself is unreachable. Individual
/// records that cannot be read come back with sentinel fields instead.
pub trait SourceAdapter {
    /// Logs in. Must succeed before any listing call.
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, SourceError>;

    /// All committee members, in listing order.
    fn list_reviewers(&mut self) -> Result<Vec<ReviewerRecord>, SourceError>;

    /// All assigned submissions, in listing order, with their suggestion rows.
    fn list_submissions(&mut self) -> Result<Vec<SubmissionRecord>, SourceError>;

    /// The site's own reviewer suggestions for one submission; empty on failure.
    fn list_potential_reviewers(&mut self, submission: &SubmissionHandle) -> Vec<PotentialReviewer>;
}

#[derive(Debug, Default, Clone, Copy)]
/// Adapter for runs with no source site configured. Every call fails with
/// [`SourceError::NotConfigured`].
pub struct NoSource;

impl SourceAdapter for NoSource {
    fn authenticate(&mut self, _credentials: &Credentials) -> Result<Session, SourceError> {
        Err(SourceError::NotConfigured)
    }

    fn list_reviewers(&mut self) -> Result<Vec<ReviewerRecord>, SourceError> {
        Err(SourceError::NotConfigured)
    }

    fn list_submissions(&mut self) -> Result<Vec<SubmissionRecord>, SourceError> {
        Err(SourceError::NotConfigured)
    }

    fn list_potential_reviewers(&mut self, _submission: &SubmissionHandle) -> Vec<PotentialReviewer> {
        Vec::new()
    }
}

impl<A: SourceAdapter + ?Sized> SourceAdapter for Box<A> {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, SourceError> {
        (**self).authenticate(credentials)
    }

    fn list_reviewers(&mut self) -> Result<Vec<ReviewerRecord>, SourceError> {
        (**self).list_reviewers()
    }

    fn list_submissions(&mut self) -> Result<Vec<SubmissionRecord>, SourceError> {
        (**self).list_submissions()
    }

    fn list_potential_reviewers(&mut self, submission: &SubmissionHandle) -> Vec<PotentialReviewer> {
        (**self).list_potential_reviewers(submission)
    }
}
