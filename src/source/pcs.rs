//! HTTP adapter for the conference management site.

use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::error::SourceError;
use super::fields::{ReviewerRecordBuilder, SubmissionRecordBuilder};
use super::pages::{self, COMPETENT_HEADING, EXPERT_HEADING, PageSelectors};
use super::wait::{BackoffPolicy, poll_until};
use super::{Credentials, Session, SourceAdapter, SubmissionHandle};
use crate::records::{PotentialReviewer, ReviewerRecord, SubmissionRecord};

const USER_AGENT: &str = concat!("reviewer-affinity/", env!("CARGO_PKG_VERSION"));

/// Session-holding client for one run against the site.
///
/// Each page visit waits for a landmark element with [`poll_until`]. Listing pages
/// that never show their landmark are fatal; record pages degrade to sentinel
/// records.
pub struct PcsAdapter {
    client: Client,
    base_url: Url,
    conference_name: String,
    policy: BackoffPolicy,
    selectors: PageSelectors,
    session: Option<Session>,
    dashboard: Option<Url>,
}

impl std::fmt::Debug for PcsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcsAdapter")
            .field("base_url", &self.base_url.as_str())
            .field("conference_name", &self.conference_name)
            .field("policy", &self.policy)
            .field("authenticated", &self.session.is_some())
            .finish()
    }
}

impl PcsAdapter {
    pub fn new(
        base_url: Url,
        conference_name: impl Into<String>,
        page_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(page_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Self::as_directory(base_url),
            conference_name: conference_name.into(),
            policy: BackoffPolicy::with_timeout(page_timeout),
            selectors: PageSelectors::new()?,
            session: None,
            dashboard: None,
        })
    }

    /// Builds an adapter from the run configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, SourceError> {
        let base = config.base_url.as_deref().ok_or(SourceError::NotConfigured)?;
        let base_url = Url::parse(base).map_err(|e| SourceError::Navigation {
            page: base.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(base_url, config.conference_name.clone(), config.page_timeout)
    }

    // `Url::join` replaces the last path segment unless the base ends in '/'.
    fn as_directory(mut url: Url) -> Url {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    fn resolve(&self, base: &Url, href: &str) -> Result<Url, SourceError> {
        base.join(href).map_err(|e| SourceError::Navigation {
            page: href.to_string(),
            reason: e.to_string(),
        })
    }

    /// One attempt: `Some(doc)` if the page loaded and shows `landmark`.
    fn fetch(&self, url: &Url, landmark: &Selector) -> Result<Option<Html>, SourceError> {
        let response = match self.client.get(url.clone()).send() {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Request failed, will retry");
                return Ok(None);
            }
        };

        let status = response.status();
        if status.is_client_error() {
            return Err(SourceError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Server not ready, will retry");
            return Ok(None);
        }

        let body = match response.text() {
            Ok(body) => body,
            Err(e) => {
                debug!(url = %url, error = %e, "Body read failed, will retry");
                return Ok(None);
            }
        };

        let doc = Html::parse_document(&body);
        if doc.select(landmark).next().is_some() {
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    fn wait_for(&self, url: &Url, landmark: &Selector, name: &str) -> Result<Html, SourceError> {
        poll_until(name, &self.policy, || self.fetch(url, landmark)).map_err(SourceError::from)
    }

    /// Visits a listing page; any failure is a navigation error.
    fn navigate(&self, url: &Url, landmark: &Selector, name: &str) -> Result<Html, SourceError> {
        self.wait_for(url, landmark, name)
            .map_err(|e| e.into_navigation(url.as_str()))
    }

    fn require_session(&self) -> Result<(), SourceError> {
        self.session
            .as_ref()
            .map(|_| ())
            .ok_or(SourceError::NotAuthenticated)
    }

    /// The committee dashboard for the configured conference (resolved once).
    fn dashboard(&mut self) -> Result<Url, SourceError> {
        if let Some(ref url) = self.dashboard {
            return Ok(url.clone());
        }
        self.require_session()?;

        let reviews_url = self.resolve(&self.base_url, "reviews")?;
        let reviews = self.navigate(&reviews_url, &self.selectors.reviews_table, "reviews table")?;

        let href = pages::committee_link(&reviews, &self.selectors, &self.conference_name)
            .ok_or_else(|| SourceError::Navigation {
                page: reviews_url.to_string(),
                reason: format!(
                    "no committee entry for conference '{}'",
                    self.conference_name
                ),
            })?;

        let url = self.resolve(&reviews_url, &href)?;
        info!(conference = %self.conference_name, url = %url, "Resolved committee dashboard");
        self.dashboard = Some(url.clone());
        Ok(url)
    }

    fn extract_reviewer(&self, url: &Url) -> ReviewerRecord {
        match self.wait_for(url, &self.selectors.heading_h1, "reviewer heading") {
            Ok(doc) => {
                let sel = &self.selectors;
                ReviewerRecordBuilder::new(url.as_str())
                    .name(pages::reviewer_name(&doc, sel))
                    .affiliation(pages::reviewer_affiliation(&doc, sel))
                    .expert_keywords(pages::keyword_list(&doc, sel, EXPERT_HEADING))
                    .competent_keywords(pages::keyword_list(&doc, sel, COMPETENT_HEADING))
                    .mail(pages::reviewer_mail(&doc, sel))
                    .build()
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Reviewer page unavailable");
                ReviewerRecordBuilder::unavailable(url.as_str(), e.to_string()).build()
            }
        }
    }

    fn extract_submission(&mut self, url: &Url) -> SubmissionRecord {
        let doc = match self.wait_for(url, &self.selectors.submission_title, "submission title") {
            Ok(doc) => doc,
            Err(e) => {
                warn!(url = %url, error = %e, "Submission page unavailable");
                return SubmissionRecordBuilder::unavailable(url.as_str(), e.to_string()).build();
            }
        };

        let sel = &self.selectors;
        let builder = SubmissionRecordBuilder::new(url.as_str())
            .title(pages::submission_title(&doc, sel))
            .abstract_text(pages::submission_abstract(&doc, sel));

        let link = pages::potential_reviewers_link(&doc, sel).map(|href| self.resolve(url, &href));
        let potential = match link {
            Some(Ok(link)) => self.list_potential_reviewers(&SubmissionHandle::new(link.as_str())),
            Some(Err(e)) => {
                warn!(url = %url, error = %e, "Bad potential reviewers link");
                Vec::new()
            }
            None => {
                warn!(url = %url, "No potential reviewers link");
                Vec::new()
            }
        };

        builder.potential_reviewers(potential).build()
    }
}

impl SourceAdapter for PcsAdapter {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, SourceError> {
        let auth_failed = |reason: String| SourceError::Authentication { reason };

        let login_url = self.resolve(&self.base_url, "login")?;
        let login_page = self
            .wait_for(&login_url, &self.selectors.login_username, "login form")
            .map_err(|e| auth_failed(format!("login page unavailable: {}", e)))?;

        let form = pages::login_form(&login_page, &self.selectors)
            .ok_or_else(|| auth_failed("login form not found".to_string()))?;
        let action = match form.action.as_deref() {
            Some(action) => self.resolve(&login_url, action)?,
            None => login_url.clone(),
        };

        let mut fields = form.hidden_fields;
        fields.push(("username".to_string(), credentials.username().to_string()));
        fields.push(("password".to_string(), credentials.password().to_string()));

        let response = self
            .client
            .post(action)
            .form(&fields)
            .send()
            .map_err(|e| auth_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(auth_failed(format!("login returned HTTP {}", status.as_u16())));
        }

        let body = response.text().map_err(|e| auth_failed(e.to_string()))?;
        if pages::is_login_page(&Html::parse_document(&body), &self.selectors) {
            return Err(auth_failed("credentials rejected".to_string()));
        }

        let session = Session::new(credentials.username(), self.base_url.as_str());
        info!(user = %session.username, "Authenticated");
        self.session = Some(session.clone());
        self.dashboard = None;
        Ok(session)
    }

    fn list_reviewers(&mut self) -> Result<Vec<ReviewerRecord>, SourceError> {
        let dashboard_url = self.dashboard()?;
        let dashboard = self.navigate(
            &dashboard_url,
            &self.selectors.reviewers_list_link,
            "reviewer list link",
        )?;

        let href = pages::reviewers_list_link(&dashboard, &self.selectors).ok_or_else(|| {
            SourceError::Navigation {
                page: dashboard_url.to_string(),
                reason: "no reviewer list link".to_string(),
            }
        })?;
        let list_url = self.resolve(&dashboard_url, &href)?;
        let list = self.navigate(&list_url, &self.selectors.reviewers_table, "reviewers table")?;

        let links = pages::reviewer_links(&list, &self.selectors);
        info!(count = links.len(), "Extracting reviewer profiles");

        let mut reviewers = Vec::with_capacity(links.len());
        for (idx, href) in links.iter().enumerate() {
            let record = match self.resolve(&list_url, href) {
                Ok(url) => self.extract_reviewer(&url),
                Err(e) => {
                    warn!(href = %href, error = %e, "Unresolvable reviewer link");
                    ReviewerRecordBuilder::unavailable(href.as_str(), e.to_string()).build()
                }
            };
            debug!(index = idx + 1, name = %record.name, "Reviewer extracted");
            reviewers.push(record);
        }

        Ok(reviewers)
    }

    fn list_submissions(&mut self) -> Result<Vec<SubmissionRecord>, SourceError> {
        let dashboard_url = self.dashboard()?;
        let dashboard = self.navigate(
            &dashboard_url,
            &self.selectors.assignments_table,
            "assignments table",
        )?;

        let links = pages::submission_links(&dashboard, &self.selectors);
        info!(count = links.len(), "Extracting submissions");

        let mut submissions = Vec::with_capacity(links.len());
        for (idx, href) in links.iter().enumerate() {
            let record = match self.resolve(&dashboard_url, href) {
                Ok(url) => self.extract_submission(&url),
                Err(e) => {
                    warn!(href = %href, error = %e, "Unresolvable submission link");
                    SubmissionRecordBuilder::unavailable(href.as_str(), e.to_string()).build()
                }
            };
            debug!(index = idx + 1, title = %record.title, "Submission extracted");
            submissions.push(record);
        }

        Ok(submissions)
    }

    fn list_potential_reviewers(&mut self, submission: &SubmissionHandle) -> Vec<PotentialReviewer> {
        let url = match Url::parse(submission.locator()) {
            Ok(url) => url,
            Err(e) => {
                warn!(locator = %submission.locator(), error = %e, "Bad potential reviewers locator");
                return Vec::new();
            }
        };

        match self.wait_for(&url, &self.selectors.affinities_table, "potential reviewers table") {
            Ok(doc) => pages::potential_reviewers(&doc, &self.selectors),
            Err(e) => {
                warn!(url = %url, error = %e, "Potential reviewers unavailable");
                Vec::new()
            }
        }
    }
}
