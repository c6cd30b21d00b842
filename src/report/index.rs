use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ReportError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// 1-based paper ID → title, using the same IDs as the matrix columns.
///
/// Serialized as a JSON object whose keys are the decimal IDs (`"1"`, `"2"`, ...).
pub struct PaperIdIndex(BTreeMap<usize, String>);

impl PaperIdIndex {
    /// Assigns IDs `1..=N` to `titles` in order.
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            titles
                .into_iter()
                .enumerate()
                .map(|(idx, title)| (idx + 1, title.into()))
                .collect(),
        )
    }

    pub fn title(&self, paper_id: usize) -> Option<&str> {
        self.0.get(&paper_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(id, title)| (*id, title.as_str()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
