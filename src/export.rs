//! Downloadable renderings of an analysis.

use crate::pipeline::AnalysisResult;

pub const TEXT_FILE_NAME: &str = "neural_lens_analysis.txt";
pub const CSV_FILE_NAME: &str = "neural_lens_analysis.csv";

/// All texts separated by a blank line.
pub fn to_text(result: &AnalysisResult) -> String {
    result.texts().collect::<Vec<_>>().join("\n\n")
}

/// Two-column CSV (`Image`, `Analysis`) with a header row.
pub fn to_csv(result: &AnalysisResult) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Image", "Analysis"])?;
    for entry in result.entries() {
        writer.write_record([entry.label().as_str(), entry.text.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
