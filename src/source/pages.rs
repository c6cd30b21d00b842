//! HTML parsing for the conference management site's pages.
//!
//! Pure functions over a parsed [`Html`] document. Listing-level functions return
//! plain values (an absent listing is the caller's navigation problem); record-level
//! functions return [`FieldResult`]s for the record builders.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::error::SourceError;
use super::fields::{FieldExtractionError, FieldResult};
use crate::records::PotentialReviewer;

const LOGIN_USERNAME: &str = "input#username";
const LOGIN_PASSWORD: &str = "input#password";
const FORM: &str = "form";
const HIDDEN_INPUT: &str = "input[type=\"hidden\"][name]";
const REVIEWS_TABLE: &str = "table#user_reviews";
const REVIEWS_TABLE_ROW: &str = "table#user_reviews tr";
const COMMITTEE_LINK: &str = "a[href*=\"committee\"]";
const REVIEWERS_LIST_LINK: &str = "ul.actionList a[href*=\"/committee/reviewers\"]";
const REVIEWERS_TABLE: &str = "table#track_public_reviewers";
const REVIEWERS_TABLE_ROW: &str = "table#track_public_reviewers tbody tr";
const ASSIGNMENTS_TABLE: &str = "table#reviewer_assignments_primary";
const ASSIGNMENTS_TABLE_ROW: &str = "table#reviewer_assignments_primary tbody tr";
const ASSIGNMENT_LINK: &str = "td:nth-child(5) a[href]";
const ANY_LINK: &str = "a[href]";
const HEADING_H1: &str = "h1";
const HEADING_H3: &str = "h3";
const AFFILIATION: &str = "ul.plain > li";
const LIST_ITEM: &str = "li";
const MAILTO_LINK: &str = "a[href^=\"mailto:\"]";
const SUBMISSION_TITLE: &str = "div.submissionTitle";
const AFFINITIES_TABLE: &str = "table#submission_affinities";
const TABLE_HEADER_CELL: &str = "thead th";
const TABLE_BODY_ROW: &str = "tbody tr";
const TABLE_CELL: &str = "td";

const REVIEWER_PREFIX: &str = "reviewer ";
const NONE_PROVIDED: &str = "none provided";
const POTENTIAL_REVIEWERS_LINK_TEXT: &str = "Show potential reviewers";

/// Heading above the expert keyword list on reviewer pages.
pub const EXPERT_HEADING: &str = "Expert";
/// Heading above the competent keyword list on reviewer pages.
pub const COMPETENT_HEADING: &str = "Competent";
const ABSTRACT_HEADING: &str = "Abstract";

fn parse(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Pre-parsed selectors for every page the adapter visits.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub login_username: Selector,
    pub login_password: Selector,
    form: Selector,
    hidden_input: Selector,
    pub reviews_table: Selector,
    reviews_row: Selector,
    committee_link: Selector,
    pub reviewers_list_link: Selector,
    pub reviewers_table: Selector,
    reviewers_row: Selector,
    pub assignments_table: Selector,
    assignments_row: Selector,
    assignment_link: Selector,
    any_link: Selector,
    pub heading_h1: Selector,
    heading_h3: Selector,
    affiliation: Selector,
    list_item: Selector,
    mailto_link: Selector,
    pub submission_title: Selector,
    pub affinities_table: Selector,
    header_cell: Selector,
    body_row: Selector,
    cell: Selector,
}

impl PageSelectors {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            login_username: parse(LOGIN_USERNAME)?,
            login_password: parse(LOGIN_PASSWORD)?,
            form: parse(FORM)?,
            hidden_input: parse(HIDDEN_INPUT)?,
            reviews_table: parse(REVIEWS_TABLE)?,
            reviews_row: parse(REVIEWS_TABLE_ROW)?,
            committee_link: parse(COMMITTEE_LINK)?,
            reviewers_list_link: parse(REVIEWERS_LIST_LINK)?,
            reviewers_table: parse(REVIEWERS_TABLE)?,
            reviewers_row: parse(REVIEWERS_TABLE_ROW)?,
            assignments_table: parse(ASSIGNMENTS_TABLE)?,
            assignments_row: parse(ASSIGNMENTS_TABLE_ROW)?,
            assignment_link: parse(ASSIGNMENT_LINK)?,
            any_link: parse(ANY_LINK)?,
            heading_h1: parse(HEADING_H1)?,
            heading_h3: parse(HEADING_H3)?,
            affiliation: parse(AFFILIATION)?,
            list_item: parse(LIST_ITEM)?,
            mailto_link: parse(MAILTO_LINK)?,
            submission_title: parse(SUBMISSION_TITLE)?,
            affinities_table: parse(AFFINITIES_TABLE)?,
            header_cell: parse(TABLE_HEADER_CELL)?,
            body_row: parse(TABLE_BODY_ROW)?,
            cell: parse(TABLE_CELL)?,
        })
    }
}

/// Rendered text of an element with whitespace runs collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn href(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// First element of type `tag` following `element` among its siblings.
fn following_sibling<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == tag)
}

fn heading<'a>(doc: &'a Html, sel: &PageSelectors, text: &str) -> Option<ElementRef<'a>> {
    doc.select(&sel.heading_h3)
        .find(|h| element_text(*h) == text)
}

fn non_empty(field: &'static str, text: String) -> FieldResult<String> {
    if text.is_empty() {
        Err(FieldExtractionError::Empty { field })
    } else {
        Ok(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the login page asks us to submit.
pub struct LoginForm {
    /// Form `action`, relative to the login page.
    pub action: Option<String>,
    /// Hidden inputs (CSRF tokens and the like) to echo back.
    pub hidden_fields: Vec<(String, String)>,
}

/// Extracts the form containing the username field.
pub fn login_form(doc: &Html, sel: &PageSelectors) -> Option<LoginForm> {
    let form = doc
        .select(&sel.form)
        .find(|form| form.select(&sel.login_username).next().is_some())?;

    let hidden_fields = form
        .select(&sel.hidden_input)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(LoginForm {
        action: form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string),
        hidden_fields,
    })
}

/// `true` if the page still asks for a password (login rejected).
pub fn is_login_page(doc: &Html, sel: &PageSelectors) -> bool {
    doc.select(&sel.login_password).next().is_some()
}

/// Committee link in the reviews table row mentioning `conference_name`.
pub fn committee_link(doc: &Html, sel: &PageSelectors, conference_name: &str) -> Option<String> {
    doc.select(&sel.reviews_row)
        .filter(|row| element_text(*row).contains(conference_name))
        .find_map(|row| row.select(&sel.committee_link).find_map(href))
}

/// Link to the full reviewer list on the committee dashboard.
pub fn reviewers_list_link(doc: &Html, sel: &PageSelectors) -> Option<String> {
    doc.select(&sel.reviewers_list_link).find_map(href)
}

/// Profile links, one per reviewer row. Rows without a link are skipped.
pub fn reviewer_links(doc: &Html, sel: &PageSelectors) -> Vec<String> {
    doc.select(&sel.reviewers_row)
        .enumerate()
        .filter_map(|(idx, row)| {
            let link = row.select(&sel.any_link).find_map(href);
            if link.is_none() {
                warn!(row = idx, "Reviewer row has no profile link, skipping");
            }
            link
        })
        .collect()
}

/// Submission links from the fifth column of the primary assignments table.
pub fn submission_links(doc: &Html, sel: &PageSelectors) -> Vec<String> {
    doc.select(&sel.assignments_row)
        .enumerate()
        .filter_map(|(idx, row)| {
            let link = row.select(&sel.assignment_link).find_map(href);
            if link.is_none() {
                warn!(row = idx, "Assignment row has no submission link, skipping");
            }
            link
        })
        .collect()
}

/// Reviewer name from the page heading, without the "Reviewer " prefix.
pub fn reviewer_name(doc: &Html, sel: &PageSelectors) -> FieldResult<String> {
    let h1 = doc
        .select(&sel.heading_h1)
        .next()
        .ok_or_else(|| FieldExtractionError::Missing {
            field: "name",
            selector: HEADING_H1.to_string(),
        })?;

    let text = element_text(h1);
    let name = match text.get(..REVIEWER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(REVIEWER_PREFIX) => {
            text[REVIEWER_PREFIX.len()..].trim().to_string()
        }
        _ => text,
    };
    non_empty("name", name)
}

/// First line of the reviewer's affiliation list.
pub fn reviewer_affiliation(doc: &Html, sel: &PageSelectors) -> FieldResult<String> {
    let item = doc
        .select(&sel.affiliation)
        .next()
        .ok_or_else(|| FieldExtractionError::Missing {
            field: "affiliation",
            selector: AFFILIATION.to_string(),
        })?;
    non_empty("affiliation", element_text(item))
}

/// Keywords listed under the `<h3>` titled `heading`.
///
/// A page without the heading or list yields an empty list; "none provided"
/// placeholders are dropped.
pub fn keyword_list(doc: &Html, sel: &PageSelectors, heading_text: &str) -> FieldResult<Vec<String>> {
    let Some(list) = heading(doc, sel, heading_text).and_then(|h| following_sibling(h, "ul"))
    else {
        return Ok(Vec::new());
    };

    Ok(list
        .select(&sel.list_item)
        .map(element_text)
        .filter(|kw| !kw.is_empty() && !kw.eq_ignore_ascii_case(NONE_PROVIDED))
        .collect())
}

/// Address from the first `mailto:` link, if any.
pub fn reviewer_mail(doc: &Html, sel: &PageSelectors) -> Option<String> {
    doc.select(&sel.mailto_link)
        .find_map(href)
        .and_then(|h| h.strip_prefix("mailto:").map(str::to_string))
        .map(|addr| addr.split('?').next().unwrap_or_default().trim().to_string())
        .filter(|addr| !addr.is_empty())
}

pub fn submission_title(doc: &Html, sel: &PageSelectors) -> FieldResult<String> {
    let title = doc
        .select(&sel.submission_title)
        .next()
        .ok_or_else(|| FieldExtractionError::Missing {
            field: "title",
            selector: SUBMISSION_TITLE.to_string(),
        })?;
    non_empty("title", element_text(title))
}

/// Text of the first `<div>` following the "Abstract" heading.
pub fn submission_abstract(doc: &Html, sel: &PageSelectors) -> FieldResult<String> {
    let body = heading(doc, sel, ABSTRACT_HEADING)
        .and_then(|h| following_sibling(h, "div"))
        .ok_or_else(|| FieldExtractionError::Missing {
            field: "abstract",
            selector: "h3 ~ div".to_string(),
        })?;
    non_empty("abstract", element_text(body))
}

/// Link behind "Show potential reviewers" on a submission page.
pub fn potential_reviewers_link(doc: &Html, sel: &PageSelectors) -> Option<String> {
    doc.select(&sel.any_link)
        .filter(|a| element_text(*a).contains(POTENTIAL_REVIEWERS_LINK_TEXT))
        .find_map(href)
}

/// Rows of the suggestion table keyed by column header.
///
/// Rows whose cell count differs from the header count are skipped.
pub fn potential_reviewers(doc: &Html, sel: &PageSelectors) -> Vec<PotentialReviewer> {
    let Some(table) = doc.select(&sel.affinities_table).next() else {
        warn!("No potential reviewers table found");
        return Vec::new();
    };

    let headers: Vec<String> = table.select(&sel.header_cell).map(element_text).collect();

    table
        .select(&sel.body_row)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&sel.cell).map(element_text).collect();
            if cells.len() != headers.len() {
                return None;
            }
            Some(headers.iter().cloned().zip(cells).collect())
        })
        .collect()
}
