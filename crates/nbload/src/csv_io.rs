//! CSV row source and the failed/skipped output tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use nbload_core::{ClassifiedRow, ImportReport, Row};

use crate::error::CliError;

/// Parsed input: header columns in file order plus one `Row` per record.
#[derive(Debug, Clone, Default)]
pub struct CsvInput {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Read all rows from `path`. A missing file or bad header is fatal.
pub fn read_rows(path: &Path) -> Result<CsvInput, CliError> {
    let file = File::open(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })?;
    let input = read_from(file).map_err(|source| CliError::InputFormat {
        path: path.display().to_string(),
        source,
    })?;

    if input.headers.iter().all(String::is_empty) {
        return Err(CliError::Validation {
            field: "input".into(),
            reason: format!("{} has no header row", path.display()),
        });
    }
    Ok(input)
}

/// Parse CSV from any reader. Headers and values are trimmed; short
/// records leave the trailing columns empty.
pub fn read_from<R: Read>(reader: R) -> Result<CsvInput, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(Row::from_pairs(headers.iter().zip(record.iter())));
    }

    Ok(CsvInput { headers, rows })
}

/// Write one classified table (input headers + `reason`) to `writer`.
pub fn write_to<W: Write>(
    writer: W,
    report: &ImportReport,
    rows: &[ClassifiedRow],
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(report.output_headers())?;
    for record in report.records(rows) {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one classified table to `path`, replacing any previous file.
pub fn write_table(
    path: &Path,
    report: &ImportReport,
    rows: &[ClassifiedRow],
) -> Result<(), CliError> {
    let to_err = |source: csv::Error| CliError::OutputFile {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(|e| to_err(csv::Error::from(e)))?;
    write_to(file, report, rows).map_err(to_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nbload_core::Outcome;

    use super::*;

    #[test]
    fn headers_and_values_are_trimmed() {
        let input = read_from(" name , address \n sw1 , 10.0.0.1 \n".as_bytes()).unwrap();
        assert_eq!(input.headers, vec!["name", "address"]);
        assert_eq!(input.rows.len(), 1);
        assert_eq!(input.rows[0].name(), "sw1");
        assert_eq!(input.rows[0].get("address"), "10.0.0.1");
    }

    #[test]
    fn short_records_read_missing_columns_as_empty() {
        let input = read_from("name,site,address\nsw1,hq\n".as_bytes()).unwrap();
        assert_eq!(input.rows[0].get("site"), "hq");
        assert_eq!(input.rows[0].get("address"), "");
        assert_eq!(input.rows[0].get("tenant"), "");
    }

    #[test]
    fn output_table_keeps_input_columns_and_appends_reason() {
        let input = read_from("name,address\nsw1,10.0.0.1\nsw2,\n".as_bytes()).unwrap();
        let mut report = ImportReport::new(input.headers.clone());
        let mut rows = input.rows.into_iter();
        report.record(
            rows.next().unwrap(),
            &Outcome::Failed {
                reason: "Missing reference: site".into(),
            },
        );
        report.record(rows.next().unwrap(), &Outcome::Applied);

        let mut buf = Vec::new();
        write_to(&mut buf, &report, report.failed()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "name,address,reason\nsw1,10.0.0.1,Missing reference: site\n"
        );
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_rows(Path::new("/nonexistent/devices.csv")).unwrap_err();
        assert!(matches!(err, CliError::InputFile { .. }));
    }
}
