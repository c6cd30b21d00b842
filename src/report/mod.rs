//! Output artifacts: the reviewer distance table and the paper ID index.
//!
//! Row order is reviewer load order. Column order is submission processing order,
//! which is also the order of paper IDs `1..=N`. Nothing is sorted.

pub mod error;
pub mod index;
pub mod table;


pub use error::ReportError;
pub use index::PaperIdIndex;
pub use table::{DistanceRow, DistanceTable, MAIL_COLUMN, NAME_COLUMN, paper_column};

use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::{DISTANCE_MATRIX_FILENAME, PAPER_INDEX_FILENAME};
use crate::matching::AffinityMatrix;
use crate::records::{ReviewerRecord, SubmissionRecord};
use crate::storage::write_atomic_all;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where [`ReportBuilder::write`] put the artifacts.
pub struct ReportPaths {
    pub distance_matrix: PathBuf,
    pub paper_index: PathBuf,
}

#[derive(Debug, Clone)]
/// Turns a finished matrix into the run's artifacts.
pub struct ReportBuilder {
    output_dir: PathBuf,
}

impl ReportBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Pairs matrix rows with reviewers and columns with paper IDs.
    pub fn build(
        &self,
        matrix: &AffinityMatrix,
        reviewers: &[ReviewerRecord],
        submissions: &[SubmissionRecord],
    ) -> Result<(DistanceTable, PaperIdIndex), ReportError> {
        let expected = (reviewers.len(), submissions.len());
        if matrix.shape() != expected {
            return Err(ReportError::ShapeMismatch {
                expected,
                actual: matrix.shape(),
            });
        }

        let rows = reviewers
            .iter()
            .zip(matrix.rows())
            .map(|(reviewer, distances)| DistanceRow {
                name: reviewer.name.clone(),
                mail: reviewer.mail_or_placeholder().to_string(),
                distances: distances.to_vec(),
            })
            .collect();

        let table = DistanceTable::new(submissions.len(), rows);
        let index = PaperIdIndex::from_titles(submissions.iter().map(|s| s.title.as_str()));
        Ok((table, index))
    }

    /// Writes both artifacts atomically into the output directory.
    ///
    /// Both are encoded and staged before either is moved into place, so a failure
    /// leaves the previous pair of artifacts untouched.
    pub fn write(
        &self,
        table: &DistanceTable,
        index: &PaperIdIndex,
    ) -> Result<ReportPaths, ReportError> {
        let csv = table.to_csv()?;
        let json = index.to_json()?;

        let paths = ReportPaths {
            distance_matrix: self.output_dir.join(DISTANCE_MATRIX_FILENAME),
            paper_index: self.output_dir.join(PAPER_INDEX_FILENAME),
        };

        write_atomic_all(&[
            (paths.distance_matrix.as_path(), csv.as_slice()),
            (paths.paper_index.as_path(), json.as_slice()),
        ])?;

        info!(
            reviewers = table.rows().len(),
            papers = table.paper_count(),
            matrix = %paths.distance_matrix.display(),
            index = %paths.paper_index.display(),
            "Report written"
        );
        Ok(paths)
    }
}
