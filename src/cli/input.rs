//! Video id collection for the CLI: inline comma-separated lists and CSV
//! files. The engine itself only ever sees the resulting id sequence.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// CSV header the ids are read from.
const ID_COLUMN: &str = "Video Id";

/// Split a comma-separated id list, trimming whitespace and dropping
/// empty entries.
pub fn parse_inline_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read ids from the `Video Id` column of a CSV file.
pub fn read_csv_ids(path: &Path) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("cannot open id file {}", path.display()))?;
    csv_ids(file).with_context(|| format!("cannot read ids from {}", path.display()))
}

fn csv_ids<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().context("missing CSV header row")?;
    let Some(column) = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(ID_COLUMN))
    else {
        bail!("CSV has no {ID_COLUMN:?} column");
    };

    let mut ids = Vec::new();
    for record in csv.records() {
        let record = record?;
        if let Some(id) = record.get(column) {
            let id = id.trim();
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_ids_are_trimmed_and_filtered() {
        assert_eq!(
            parse_inline_ids(" vid1, vid2 ,,vid3 "),
            vec!["vid1", "vid2", "vid3"]
        );
        assert!(parse_inline_ids("").is_empty());
        assert!(parse_inline_ids(" , ,").is_empty());
    }

    #[test]
    fn csv_column_is_found_by_header() {
        let data = "Name,Video Id,Notes\nFirst,vid1,ok\nSecond,vid2,\n";
        assert_eq!(csv_ids(data.as_bytes()).unwrap(), vec!["vid1", "vid2"]);
    }

    #[test]
    fn csv_header_match_ignores_case_and_padding() {
        let data = " video id \nvid1\n\nvid2\n";
        assert_eq!(csv_ids(data.as_bytes()).unwrap(), vec!["vid1", "vid2"]);
    }

    #[test]
    fn csv_without_id_column_is_an_error() {
        let data = "Name,Url\nFirst,https://x\n";
        assert!(csv_ids(data.as_bytes()).is_err());
    }

    #[test]
    fn blank_rows_are_skipped() {
        let data = "Video Id\nvid1\n  \nvid2\n";
        assert_eq!(csv_ids(data.as_bytes()).unwrap(), vec!["vid1", "vid2"]);
    }
}
