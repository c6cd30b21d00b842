//! Reviewer and submission records as extracted from the source site.
//!
//! Records are immutable once built. Their identity is positional: reviewers by load
//! order, submissions by the 1-based paper ID assigned in processing order. Field names
//! on the wire (`expert`, `abstract`, `potential_reviewers`) match the snapshot files
//! written by earlier runs.


use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{REVIEWERS_CACHE_FILENAME, SUBMISSIONS_CACHE_FILENAME, SENTINEL};

/// One row of the source site's own reviewer suggestions, keyed by column header.
pub type PotentialReviewer = BTreeMap<String, String>;

fn sentinel() -> String {
    SENTINEL.to_string()
}

fn is_sentinel(value: &str) -> bool {
    value.trim() == SENTINEL
}

/// Which persisted collection a record type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Reviewers,
    Submissions,
}

impl RecordKind {
    /// Snapshot file name inside the cache directory.
    pub fn cache_filename(self) -> &'static str {
        match self {
            Self::Reviewers => REVIEWERS_CACHE_FILENAME,
            Self::Submissions => SUBMISSIONS_CACHE_FILENAME,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reviewers => write!(f, "reviewers"),
            Self::Submissions => write!(f, "submissions"),
        }
    }
}

/// A record type that can be persisted as a snapshot.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: RecordKind;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A committee member and the keywords they declared.
pub struct ReviewerRecord {
    /// Display name (without the site's "Reviewer " prefix).
    #[serde(default = "sentinel")]
    pub name: String,
    /// First affiliation line, or the sentinel.
    #[serde(default = "sentinel")]
    pub affiliation: String,
    /// Keywords in the "Expert" category, in page order.
    #[serde(rename = "expert", default)]
    pub expertise_keywords: Vec<String>,
    /// Keywords in the "Competent" category, in page order.
    #[serde(rename = "competent", default, skip_serializing_if = "Vec::is_empty")]
    pub competent_keywords: Vec<String>,
    /// Contact address when the profile exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
}

impl Record for ReviewerRecord {
    const KIND: RecordKind = RecordKind::Reviewers;
}

impl ReviewerRecord {
    pub fn new(name: impl Into<String>, affiliation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: affiliation.into(),
            expertise_keywords: Vec::new(),
            competent_keywords: Vec::new(),
            mail: None,
        }
    }

    pub fn with_expertise<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_competence<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.competent_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = Some(mail.into());
        self
    }

    /// Keywords used for matching. Competent keywords follow expert ones unless
    /// `expert_only` is set.
    pub fn keywords(&self, expert_only: bool) -> Vec<&str> {
        let expert = self.expertise_keywords.iter().map(String::as_str);
        if expert_only {
            expert.collect()
        } else {
            expert
                .chain(self.competent_keywords.iter().map(String::as_str))
                .collect()
        }
    }

    /// `name ⊕ sep ⊕ join(keywords, ", ")`, with no extra whitespace.
    pub fn embedding_text(&self, sep: &str, expert_only: bool) -> String {
        format!("{}{}{}", self.name, sep, self.keywords(expert_only).join(", "))
    }

    /// `true` when there is nothing to embed besides the separator.
    pub fn is_blank(&self, expert_only: bool) -> bool {
        self.name.trim().is_empty() && self.keywords(expert_only).is_empty()
    }

    pub fn mail_or_placeholder(&self) -> &str {
        self.mail
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(SENTINEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A paper assigned to the area chair.
pub struct SubmissionRecord {
    #[serde(default = "sentinel")]
    pub title: String,
    #[serde(rename = "abstract", default = "sentinel")]
    pub abstract_text: String,
    /// Side channel from the site's suggestion feature; never used for matching.
    #[serde(default)]
    pub potential_reviewers: Vec<PotentialReviewer>,
}

impl Record for SubmissionRecord {
    const KIND: RecordKind = RecordKind::Submissions;
}

impl SubmissionRecord {
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            potential_reviewers: Vec::new(),
        }
    }

    pub fn with_potential_reviewers(mut self, rows: Vec<PotentialReviewer>) -> Self {
        self.potential_reviewers = rows;
        self
    }

    /// `title ⊕ sep ⊕ abstract`, with no extra whitespace.
    pub fn embedding_text(&self, sep: &str) -> String {
        format!("{}{}{}", self.title, sep, self.abstract_text)
    }

    /// `false` when both title and abstract are empty or whitespace.
    ///
    /// Sentinel fields count as content: they embed as `N/A[SEP]N/A`.
    pub fn has_content(&self) -> bool {
        !(self.title.trim().is_empty() && self.abstract_text.trim().is_empty())
    }

    /// `true` when neither title nor abstract was extracted, which is what a
    /// submission page that never loaded leaves behind.
    pub fn is_placeholder(&self) -> bool {
        is_sentinel(&self.title) && is_sentinel(&self.abstract_text)
    }
}
