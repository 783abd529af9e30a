use std::io::Write;

use crate::errors::MatcherResult;

/// First cell of the header row.
pub const CORNER_LABEL: &str = "Resume/JD";

/// Dense résumé x job-description cosine similarity table.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    pub resume_titles: Vec<String>,
    pub jd_titles: Vec<String>,
    /// Row-major scores, `scores[r][j]`.
    pub scores: Vec<Vec<f32>>,
}

impl SimilarityMatrix {
    pub fn rows(&self) -> usize {
        self.resume_titles.len()
    }

    pub fn columns(&self) -> usize {
        self.jd_titles.len()
    }

    pub fn get(&self, resume: usize, jd: usize) -> Option<f32> {
        self.scores.get(resume)?.get(jd).copied()
    }

    /// Serialize as a delimited table with scores formatted to 4 decimals.
    pub fn write_table<W: Write>(&self, writer: W, delimiter: u8) -> MatcherResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        let mut header = Vec::with_capacity(self.columns() + 1);
        header.push(CORNER_LABEL.to_string());
        header.extend(self.jd_titles.iter().cloned());
        writer.write_record(&header)?;

        for (title, row) in self.resume_titles.iter().zip(&self.scores) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(title.clone());
            record.extend(row.iter().map(|score| format!("{score:.4}")));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
