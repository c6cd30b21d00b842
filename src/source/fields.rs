//! Per-field extraction results and the record builders that default them.
//!
//! A page parser returns one [`FieldResult`] per field. The builders accept those
//! results independently and substitute the sentinel (or an empty value) for each
//! failed field, so one bad field never costs the rest of the record.

use thiserror::Error;
use tracing::warn;

use crate::constants::SENTINEL;
use crate::records::{PotentialReviewer, ReviewerRecord, SubmissionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Why a single optional field could not be extracted.
pub enum FieldExtractionError {
    /// No element matched.
    #[error("no element for {field} ({selector})")]
    Missing {
        field: &'static str,
        selector: String,
    },

    /// The element was present but had no text.
    #[error("{field} is empty")]
    Empty { field: &'static str },

    /// The record's page never became available.
    #[error("page unavailable: {reason}")]
    PageUnavailable { reason: String },
}

pub type FieldResult<T> = Result<T, FieldExtractionError>;

fn or_sentinel(source: &str, field: &'static str, result: Option<FieldResult<String>>) -> String {
    match result {
        Some(Ok(value)) => value,
        Some(Err(error)) => {
            warn!(source, field, %error, "Field extraction failed, using sentinel");
            SENTINEL.to_string()
        }
        None => SENTINEL.to_string(),
    }
}

fn or_empty<T>(source: &str, field: &'static str, result: Option<FieldResult<Vec<T>>>) -> Vec<T> {
    match result {
        Some(Ok(values)) => values,
        Some(Err(error)) => {
            warn!(source, field, %error, "Field extraction failed, using empty list");
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[derive(Debug, Default)]
/// Assembles a [`ReviewerRecord`] from independently extracted fields.
pub struct ReviewerRecordBuilder {
    source: String,
    name: Option<FieldResult<String>>,
    affiliation: Option<FieldResult<String>>,
    expert: Option<FieldResult<Vec<String>>>,
    competent: Option<FieldResult<Vec<String>>>,
    mail: Option<String>,
}

impl ReviewerRecordBuilder {
    /// `source` identifies the page in log output (usually its URL).
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// A record whose page could not be loaded at all: every field defaults.
    pub fn unavailable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        let error = FieldExtractionError::PageUnavailable {
            reason: reason.into(),
        };
        Self::new(source)
            .name(Err(error.clone()))
            .affiliation(Err(error.clone()))
            .expert_keywords(Err(error.clone()))
            .competent_keywords(Err(error))
    }

    pub fn name(mut self, result: FieldResult<String>) -> Self {
        self.name = Some(result);
        self
    }

    pub fn affiliation(mut self, result: FieldResult<String>) -> Self {
        self.affiliation = Some(result);
        self
    }

    pub fn expert_keywords(mut self, result: FieldResult<Vec<String>>) -> Self {
        self.expert = Some(result);
        self
    }

    pub fn competent_keywords(mut self, result: FieldResult<Vec<String>>) -> Self {
        self.competent = Some(result);
        self
    }

    pub fn mail(mut self, mail: Option<String>) -> Self {
        self.mail = mail;
        self
    }

    pub fn build(self) -> ReviewerRecord {
        let source = self.source.as_str();
        ReviewerRecord {
            name: or_sentinel(source, "name", self.name),
            affiliation: or_sentinel(source, "affiliation", self.affiliation),
            expertise_keywords: or_empty(source, "expert keywords", self.expert),
            competent_keywords: or_empty(source, "competent keywords", self.competent),
            mail: self.mail,
        }
    }
}

#[derive(Debug, Default)]
/// Assembles a [`SubmissionRecord`] from independently extracted fields.
pub struct SubmissionRecordBuilder {
    source: String,
    title: Option<FieldResult<String>>,
    abstract_text: Option<FieldResult<String>>,
    potential_reviewers: Vec<PotentialReviewer>,
}

impl SubmissionRecordBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn unavailable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        let error = FieldExtractionError::PageUnavailable {
            reason: reason.into(),
        };
        Self::new(source)
            .title(Err(error.clone()))
            .abstract_text(Err(error))
    }

    pub fn title(mut self, result: FieldResult<String>) -> Self {
        self.title = Some(result);
        self
    }

    pub fn abstract_text(mut self, result: FieldResult<String>) -> Self {
        self.abstract_text = Some(result);
        self
    }

    pub fn potential_reviewers(mut self, rows: Vec<PotentialReviewer>) -> Self {
        self.potential_reviewers = rows;
        self
    }

    pub fn build(self) -> SubmissionRecord {
        let source = self.source.as_str();
        SubmissionRecord {
            title: or_sentinel(source, "title", self.title),
            abstract_text: or_sentinel(source, "abstract", self.abstract_text),
            potential_reviewers: self.potential_reviewers,
        }
    }
}
