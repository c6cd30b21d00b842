use super::error::ReportError;

/// Header of the first two columns; paper columns follow as `Paper 1..N`.
pub const NAME_COLUMN: &str = "name";
pub const MAIL_COLUMN: &str = "mail";

/// Header label of the column holding paper ID `paper_id`.
pub fn paper_column(paper_id: usize) -> String {
    format!("Paper {}", paper_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRow {
    pub name: String,
    pub mail: String,
    /// Distance to paper ID `i + 1` at index `i`.
    pub distances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
/// One row per reviewer in load order, one distance column per paper in ID order.
pub struct DistanceTable {
    paper_count: usize,
    rows: Vec<DistanceRow>,
}

impl DistanceTable {
    pub(crate) fn new(paper_count: usize, rows: Vec<DistanceRow>) -> Self {
        Self { paper_count, rows }
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.paper_count + 2);
        header.push(NAME_COLUMN.to_string());
        header.push(MAIL_COLUMN.to_string());
        header.extend((1..=self.paper_count).map(paper_column));
        header
    }

    pub fn rows(&self) -> &[DistanceRow] {
        &self.rows
    }

    pub fn paper_count(&self) -> usize {
        self.paper_count
    }

    /// Encodes the table as CSV.
    ///
    /// Distances are written with `{:?}`, the shortest text that parses back to
    /// the same `f64`.
    pub fn to_csv(&self) -> Result<Vec<u8>, ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(self.header())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.distances.len() + 2);
            record.push(row.name.clone());
            record.push(row.mail.clone());
            record.extend(row.distances.iter().map(|d| format!("{:?}", d)));
            writer.write_record(&record)?;
        }

        writer.into_inner().map_err(|e| ReportError::CsvFlush {
            reason: e.error().to_string(),
        })
    }
}
