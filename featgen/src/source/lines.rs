//! Line-oriented text lists, one item per line.

use std::path::{Path, PathBuf};

use crate::error::SourceResult;
use crate::model::Value;

use super::{decode_content, InputSource};

/// Reads a text file into a sequence of scalars. Empty lines are dropped.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
    /// Drop everything from the first `#` on each line
    ignore_comment: bool,
    trim: bool,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ignore_comment: false,
            trim: false,
        }
    }

    pub fn ignore_comment(mut self, ignore: bool) -> Self {
        self.ignore_comment = ignore;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Split already-decoded text.
    pub fn parse_str(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| {
                let line = match (self.ignore_comment, line.find('#')) {
                    (true, Some(idx)) => &line[..idx],
                    _ => line,
                };
                if self.trim {
                    line.trim()
                } else {
                    line
                }
            })
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl InputSource for LineSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> SourceResult<Value> {
        Ok(Value::sequence(self.parse_str(&decode_content(bytes))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_comment_no_trim() {
        let source = LineSource::new("file");
        assert_eq!(source.parse_str("foo\n\nbar"), vec!["foo", "bar"]);
        assert_eq!(source.parse_str("  foo  "), vec!["  foo  "]);
    }

    #[test]
    fn test_trim() {
        let source = LineSource::new("file").trim(true);
        assert_eq!(source.parse_str("  foo  \n  bar  \n   \n"), vec!["foo", "bar"]);
    }

    #[test]
    fn test_ignore_comment() {
        let source = LineSource::new("file").ignore_comment(true);
        assert_eq!(
            source.parse_str("foo # comment 1\n# line comment\nbar# comment 2"),
            vec!["foo ", "bar"]
        );
    }

    #[test]
    fn test_crlf_and_comment_with_trim() {
        let source = LineSource::new("file").ignore_comment(true).trim(true);
        assert_eq!(source.parse_str("a\r\n  # c\r\n b # x\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_provide_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("features.txt"), "a\nb\n").unwrap();

        let value = LineSource::new("features.txt").provide(dir.path()).unwrap();
        assert_eq!(value, Value::sequence(["a", "b"]));
    }
}
