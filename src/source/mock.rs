use std::collections::HashMap;

use super::{Credentials, Session, SourceAdapter, SourceError, SubmissionHandle};
use crate::records::{PotentialReviewer, ReviewerRecord, SubmissionRecord};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// How often each adapter method was invoked.
pub struct MockCalls {
    pub authenticate: usize,
    pub list_reviewers: usize,
    pub list_submissions: usize,
    pub list_potential_reviewers: usize,
}

#[derive(Debug, Default)]
/// In-memory adapter with call counting and injectable failures.
pub struct MockSourceAdapter {
    reviewers: Vec<ReviewerRecord>,
    submissions: Vec<SubmissionRecord>,
    potential: HashMap<String, Vec<PotentialReviewer>>,
    reject_credentials: bool,
    unreachable_listings: bool,
    session: Option<Session>,
    calls: MockCalls,
}

impl MockSourceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviewers(mut self, reviewers: Vec<ReviewerRecord>) -> Self {
        self.reviewers = reviewers;
        self
    }

    pub fn with_submissions(mut self, submissions: Vec<SubmissionRecord>) -> Self {
        self.submissions = submissions;
        self
    }

    pub fn with_potential_reviewers(
        mut self,
        locator: impl Into<String>,
        rows: Vec<PotentialReviewer>,
    ) -> Self {
        self.potential.insert(locator.into(), rows);
        self
    }

    /// Every `authenticate` call fails.
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Every listing call fails with a navigation error.
    pub fn with_unreachable_listings(mut self) -> Self {
        self.unreachable_listings = true;
        self
    }

    pub fn calls(&self) -> MockCalls {
        self.calls
    }

    fn check_listing(&self, page: &str) -> Result<(), SourceError> {
        if self.session.is_none() {
            return Err(SourceError::NotAuthenticated);
        }
        if self.unreachable_listings {
            return Err(SourceError::Navigation {
                page: page.to_string(),
                reason: "listing unreachable (mock)".to_string(),
            });
        }
        Ok(())
    }
}

impl SourceAdapter for MockSourceAdapter {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, SourceError> {
        self.calls.authenticate += 1;
        if self.reject_credentials {
            return Err(SourceError::Authentication {
                reason: "credentials rejected (mock)".to_string(),
            });
        }
        let session = Session::new(credentials.username(), "mock://source");
        self.session = Some(session.clone());
        Ok(session)
    }

    fn list_reviewers(&mut self) -> Result<Vec<ReviewerRecord>, SourceError> {
        self.calls.list_reviewers += 1;
        self.check_listing("reviewers")?;
        Ok(self.reviewers.clone())
    }

    fn list_submissions(&mut self) -> Result<Vec<SubmissionRecord>, SourceError> {
        self.calls.list_submissions += 1;
        self.check_listing("submissions")?;
        Ok(self.submissions.clone())
    }

    fn list_potential_reviewers(&mut self, submission: &SubmissionHandle) -> Vec<PotentialReviewer> {
        self.calls.list_potential_reviewers += 1;
        self.potential
            .get(submission.locator())
            .cloned()
            .unwrap_or_default()
    }
}
