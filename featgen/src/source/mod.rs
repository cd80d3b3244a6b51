//! Input sources: convert raw files into the dynamic record model.
//!
//! | Source | Output |
//! |--------|--------|
//! | [`LineSource`] | sequence of scalars |
//! | [`PropertiesSource`] | mapping of scalars |
//! | [`CsvSource`] | sequence of records |
//! | [`YamlSource`] | whatever the document holds |
//!
//! All sources decode bytes the same way: UTF-8 when valid, otherwise the
//! encoding is detected and the content transcoded.

pub mod delimited;
pub mod lines;
pub mod properties;
pub mod yaml;

use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::model::Value;

pub use delimited::CsvSource;
pub use lines::LineSource;
pub use properties::{parse_properties, PropertiesSource};
pub use yaml::YamlSource;

/// A file-backed source of records.
pub trait InputSource {
    /// Path of the file, relative to the directory given to [`Self::provide`].
    fn path(&self) -> &Path;

    /// Parse already-read bytes.
    fn parse(&self, bytes: &[u8]) -> SourceResult<Value>;

    /// Read `root/path` and parse it.
    fn provide(&self, root: &Path) -> SourceResult<Value> {
        let path = root.join(self.path());
        let bytes = std::fs::read(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        self.parse(&bytes).map_err(|e| e.in_file(path))
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to text. Valid UTF-8 (with or without BOM) is used as-is.
///
/// Anything else goes through charset detection; content the detected
/// charset cannot decode is read as Windows-1252, which maps every byte.
pub fn decode_content(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let encoding = detect_encoding(bytes);
    let decoder = match encoding.as_str() {
        "iso-8859-1" | "windows-1252" => encoding_rs::WINDOWS_1252,
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .unwrap_or(encoding_rs::WINDOWS_1252),
    };
    let (text, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        crate::logs::log_warning(format!(
            "Content is not valid {}, reading as windows-1252",
            decoder.name()
        ));
        return encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned();
    }
    text.into_owned()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b';', b',', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}
