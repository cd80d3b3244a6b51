//! Delimited text (CSV and friends) into a sequence of records.

use std::path::{Path, PathBuf};

use crate::error::{SourceError, SourceResult};
use crate::logs::log_warning;
use crate::model::{Record, Value};

use super::{decode_content, detect_delimiter, InputSource};

/// Reads delimited text into records keyed by header.
///
/// Headers come from the caller when given, otherwise from the first row.
/// Short rows are padded with empty values and long rows truncated; both
/// are logged.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    headers: Option<Vec<String>>,
    delimiter: Option<u8>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            headers: None,
            delimiter: None,
        }
    }

    /// Use these headers; every row of the file is then data.
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Use this delimiter instead of detecting it from the first line.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse already-decoded text into records.
    pub fn parse_str(&self, content: &str) -> SourceResult<Vec<Value>> {
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(content));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut rows = reader.records();

        let headers = match &self.headers {
            Some(headers) => headers.clone(),
            None => match rows.next() {
                Some(row) => row?.iter().map(str::to_string).collect(),
                None => return Err(SourceError::NoHeaders),
            },
        };
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(SourceError::NoHeaders);
        }

        let mut records = Vec::new();
        for row in rows {
            let row = row?;
            // The csv reader yields a single empty field for blank lines.
            if row.iter().all(str::is_empty) {
                continue;
            }
            if row.len() != headers.len() {
                let line = row.position().map(|p| p.line()).unwrap_or(0);
                log_warning(format!(
                    "Line {}: record length {} does not match header length {}",
                    line,
                    row.len(),
                    headers.len()
                ));
            }

            let record: Record = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = row.get(i).unwrap_or("");
                    (header.clone(), Value::scalar(value))
                })
                .collect();
            records.push(Value::Mapping(record));
        }

        Ok(records)
    }
}

impl InputSource for CsvSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> SourceResult<Value> {
        Ok(Value::Sequence(self.parse_str(&decode_content(bytes))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_headers() {
        let source = CsvSource::new("test.csv").with_headers(["header1", "header2"]);

        let rows = source.parse_str("value1,value2\n").unwrap();
        assert_eq!(rows, vec![Value::mapping([("header1", "value1"), ("header2", "value2")])]);

        let rows = source.parse_str("value1,value2\nvalue3,value4\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].field_str("header2"), Some("value4"));
    }

    #[test]
    fn test_header_row() {
        let rows = CsvSource::new("f.csv").parse_str("name;priority\nalpha;2\nbeta;1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field_str("name"), Some("alpha"));
        assert_eq!(rows[1].field_str("priority"), Some("1"));
    }

    #[test]
    fn test_quoted_values() {
        let rows = CsvSource::new("f.csv")
            .parse_str("name,value\n\"Alice\",\"Hello, World\"")
            .unwrap();
        assert_eq!(rows[0].field_str("name"), Some("Alice"));
        assert_eq!(rows[0].field_str("value"), Some("Hello, World"));
    }

    #[test]
    fn test_short_and_long_rows() {
        let rows = CsvSource::new("f.csv")
            .with_delimiter(b';')
            .parse_str("a;b;c\n1;2\n1;2;3;4\n")
            .unwrap();

        assert_eq!(rows[0].field_str("c"), Some(""));
        assert_eq!(rows[1].field_str("c"), Some("3"));
        assert_eq!(rows[1].as_mapping().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let rows = CsvSource::new("f.csv").parse_str("a;b\n1;2\n\n3;4\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_headers() {
        let err = CsvSource::new("f.csv").parse_str("").unwrap_err();
        assert!(matches!(err, SourceError::NoHeaders));
    }

    #[test]
    fn test_provide_attaches_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.csv"), "").unwrap();

        let err = CsvSource::new("empty.csv").provide(dir.path()).unwrap_err();
        assert!(err.to_string().contains("empty.csv"));
        assert!(err.to_string().contains("No headers"));
    }
}
