//! Key-value property files (`key=value`, `key: value`, `key value`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::Chars;

use crate::error::{SourceError, SourceResult};
use crate::model::Value;

use super::{decode_content, InputSource};

/// Reads a properties file into a mapping of scalars.
#[derive(Debug, Clone)]
pub struct PropertiesSource {
    path: PathBuf,
}

impl PropertiesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InputSource for PropertiesSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> SourceResult<Value> {
        let entries = parse_properties(&decode_content(bytes))?;
        Ok(Value::mapping(entries))
    }
}

/// Parse properties text. Later duplicates replace earlier ones.
///
/// Supports `#` and `!` comment lines, backslash line continuations and
/// the usual escapes (`\t \n \r \f \uXXXX`, escaped separators).
pub fn parse_properties(content: &str) -> SourceResult<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let mut lines = content.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line = idx + 1;
        let first = raw.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut current = first;
        while continues(current) {
            logical.push_str(&current[..current.len() - 1]);
            match lines.next() {
                Some((_, next)) => current = next.trim_start(),
                None => {
                    current = "";
                    break;
                }
            }
        }
        logical.push_str(current);

        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key, line)?, unescape(value, line)?);
    }

    Ok(entries)
}

/// An odd number of trailing backslashes continues the logical line.
fn continues(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace.
fn split_entry(logical: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = logical.len();
    for (i, c) in logical.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = logical[key_end..].trim_start();
    let rest = rest.strip_prefix(&['=', ':'][..]).unwrap_or(rest).trim_start();
    (&logical[..key_end], rest)
}

fn unescape(raw: &str, line: usize) -> SourceResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Decode the digits after `\u`, joining a UTF-16 surrogate pair when needed.
fn unicode_escape(chars: &mut Chars<'_>, line: usize) -> SourceResult<char> {
    let high = hex4(chars, line)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).ok_or_else(|| invalid(line, format!("\\u{:04X} is not a character", high)));
    }

    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(invalid(line, format!("unpaired surrogate \\u{:04X}", high)));
    }
    let low = hex4(chars, line)?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(invalid(line, format!("unpaired surrogate \\u{:04X}", high)));
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| invalid(line, format!("invalid code point {:X}", code)))
}

fn hex4(chars: &mut Chars<'_>, line: usize) -> SourceResult<u32> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err(invalid(line, format!("truncated \\u escape '{}'", digits)));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| invalid(line, format!("invalid \\u escape '{}'", digits)))
}

fn invalid(line: usize, message: String) -> SourceError {
    SourceError::Properties { line, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> BTreeMap<String, String> {
        parse_properties(content).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let entries = parse("key1=value1\nkey2=value2\n# comment\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["key1"], "value1");
        assert_eq!(entries["key2"], "value2");
    }

    #[test]
    fn test_separators_and_whitespace() {
        let entries = parse("a = 1\nb:2\nc 3\n  d  =  spaced value  \n! bang comment\ne=\nf\n");
        assert_eq!(entries["a"], "1");
        assert_eq!(entries["b"], "2");
        assert_eq!(entries["c"], "3");
        assert_eq!(entries["d"], "spaced value  ");
        assert_eq!(entries["e"], "");
        assert_eq!(entries["f"], "");
        assert!(!entries.contains_key("!"));
    }

    #[test]
    fn test_continuation_lines() {
        let entries = parse("list = a, \\\n       b, \\\n       c\nnext=1\n");
        assert_eq!(entries["list"], "a, b, c");
        assert_eq!(entries["next"], "1");

        // Escaped backslash at end of line does not continue.
        let entries = parse("path=C:\\\\\nother=x\n");
        assert_eq!(entries["path"], "C:\\");
        assert_eq!(entries["other"], "x");
    }

    #[test]
    fn test_escapes() {
        let entries = parse("key\\=with\\:sep = tab\\there\nuni=caf\\u00e9\nemoji=\\uD83D\\uDE00\n");
        assert_eq!(entries["key=with:sep"], "tab\there");
        assert_eq!(entries["uni"], "café");
        assert_eq!(entries["emoji"], "😀");
    }

    #[test]
    fn test_later_duplicates_win() {
        assert_eq!(parse("a=1\na=2\n")["a"], "2");
    }

    #[test]
    fn test_invalid_unicode_escape() {
        let err = parse_properties("ok=1\nbad=\\u12\n").unwrap_err();
        match err {
            SourceError::Properties { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("truncated"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_properties("x=\\uD83D alone").is_err());
    }

    #[test]
    fn test_source_output_shape() {
        let value = PropertiesSource::new("test.properties")
            .parse(b"a=Alpha\n")
            .unwrap();
        assert_eq!(value, Value::mapping([("a", "Alpha")]));
    }
}
