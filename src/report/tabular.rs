//! CSV export of a prediction

use crate::report::record::ResultRecord;
use anyhow::{Context, Result};

pub const CSV_FILE_NAME: &str = "customer_churn_prediction.csv";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Serialize the record as a header row and one data row, comma-delimited
pub fn export_csv(record: &ResultRecord) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(record.keys())
        .context("Failed to write CSV header")?;
    writer
        .write_record(record.values())
        .context("Failed to write CSV row")?;

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::record::tests::sample_assessment;
    use crate::report::record::RECORD_KEYS;

    #[test]
    fn test_csv_round_trip() {
        let record = ResultRecord::from_assessment(&sample_assessment());
        let bytes = export_csv(&record).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, RECORD_KEYS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);

        for (key, value) in headers.iter().zip(rows[0].iter()) {
            assert_eq!(record.get(key), Some(value));
        }
    }

    #[test]
    fn test_csv_layout() {
        let record = ResultRecord::from_assessment(&sample_assessment());
        let text = String::from_utf8(export_csv(&record).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Credit Score,Age,Tenure,Balance"));
        assert!(lines[1].ends_with("0.75,0.25,Churn"));
    }
}
