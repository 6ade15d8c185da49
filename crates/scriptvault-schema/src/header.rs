//! Comment-header metadata extraction.
//!
//! Scripts describe themselves with lines such as `# Author: Alice` near the
//! top of the file. Each known field is matched by a pattern anchored at the
//! start of a line; the first matching line for a field wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead};
use std::sync::LazyLock;

/// A recognized comment-header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeaderField {
    Author,
    Title,
    Version,
    Verified,
    Description,
}

impl HeaderField {
    pub const ALL: [HeaderField; 5] = [
        HeaderField::Author,
        HeaderField::Title,
        HeaderField::Version,
        HeaderField::Verified,
        HeaderField::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderField::Author => "Author",
            HeaderField::Title => "Title",
            HeaderField::Version => "Version",
            HeaderField::Verified => "Verified",
            HeaderField::Description => "Description",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

static FIELD_MATCHERS: LazyLock<Vec<(HeaderField, Regex)>> = LazyLock::new(|| {
    HeaderField::ALL
        .iter()
        .map(|&field| {
            let pattern = format!(r"^# {}:\s*(.*)$", field.as_str());
            (field, Regex::new(&pattern).expect("valid header pattern"))
        })
        .collect()
});

/// Header fields found in a script. Fields without a matching line are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMetadata {
    fields: BTreeMap<HeaderField, String>,
}

impl HeaderMetadata {
    pub fn get(&self, field: HeaderField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True once every known field has been captured.
    pub fn is_complete(&self) -> bool {
        self.fields.len() == HeaderField::ALL.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeaderField, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn scan_line(&mut self, line: &str) {
        for (field, matcher) in FIELD_MATCHERS.iter() {
            if self.fields.contains_key(field) {
                continue;
            }
            if let Some(caps) = matcher.captures(line) {
                let value = caps.get(1).map_or("", |m| m.as_str());
                self.fields.insert(*field, value.to_owned());
            }
        }
    }
}

/// Extract header metadata from script text.
pub fn extract(text: &str) -> HeaderMetadata {
    let mut meta = HeaderMetadata::default();
    for line in text.lines() {
        meta.scan_line(line);
        if meta.is_complete() {
            break;
        }
    }
    meta
}

/// Extract header metadata line by line from a reader.
///
/// Invalid UTF-8 is decoded lossily so that a stray byte in a script body
/// does not hide its header. Reading stops early once every field is known.
pub fn extract_from_reader<R: BufRead>(mut reader: R) -> io::Result<HeaderMetadata> {
    let mut meta = HeaderMetadata::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        meta.scan_line(line.trim_end_matches(|c: char| c == '\n' || c == '\r'));
        if meta.is_complete() {
            break;
        }
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_fields() {
        let text = "#!/bin/sh\n\
                    # Author: Alice\n\
                    # Title: Demo\n\
                    # Version: 1.2.0\n\
                    # Verified: yes\n\
                    # Description: Prints a greeting\n\
                    echo hi\n";
        let meta = extract(text);
        assert_eq!(meta.len(), 5);
        assert_eq!(meta.get(HeaderField::Author), Some("Alice"));
        assert_eq!(meta.get(HeaderField::Title), Some("Demo"));
        assert_eq!(meta.get(HeaderField::Version), Some("1.2.0"));
        assert_eq!(meta.get(HeaderField::Verified), Some("yes"));
        assert_eq!(meta.get(HeaderField::Description), Some("Prints a greeting"));
    }

    #[test]
    fn first_match_wins() {
        let meta = extract("# Author: X\n# Author: Y\n");
        assert_eq!(meta.get(HeaderField::Author), Some("X"));
    }

    #[test]
    fn missing_field_is_absent() {
        let meta = extract("# Author: Alice\n# Title: Demo\n");
        assert_eq!(meta.get(HeaderField::Version), None);
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn pattern_is_anchored_at_line_start() {
        let meta = extract("  # Author: Indented\necho '# Title: inline'\n");
        assert!(meta.is_empty());
    }

    #[test]
    fn empty_value_is_captured() {
        let meta = extract("# Verified:\n");
        assert_eq!(meta.get(HeaderField::Verified), Some(""));
    }

    #[test]
    fn whitespace_after_colon_is_optional() {
        let meta = extract("# Title:Compact\n# Version:\t3\n");
        assert_eq!(meta.get(HeaderField::Title), Some("Compact"));
        assert_eq!(meta.get(HeaderField::Version), Some("3"));
    }

    #[test]
    fn field_name_is_case_sensitive() {
        let meta = extract("# author: lower\n# AUTHOR: upper\n");
        assert!(meta.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let meta = extract_from_reader("# Author: Bob\r\n# Title: T\r\n".as_bytes()).unwrap();
        assert_eq!(meta.get(HeaderField::Author), Some("Bob"));
        assert_eq!(meta.get(HeaderField::Title), Some("T"));
    }

    #[test]
    fn reader_tolerates_invalid_utf8() {
        let mut bytes = b"# Author: Carol\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"# Title: After\n");
        let meta = extract_from_reader(bytes.as_slice()).unwrap();
        assert_eq!(meta.get(HeaderField::Author), Some("Carol"));
        assert_eq!(meta.get(HeaderField::Title), Some("After"));
    }

    #[test]
    fn reader_matches_text_extraction() {
        let text = "# Title: One\nbody\n# Title: Two\n# Description: d";
        assert_eq!(extract(text), extract_from_reader(text.as_bytes()).unwrap());
    }

    #[test]
    fn iter_yields_fields_in_declaration_order() {
        let meta = extract("# Description: d\n# Author: a\n");
        let fields: Vec<_> = meta.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![HeaderField::Author, HeaderField::Description]);
    }
}
