//! Frontmatter splitting and metadata parsing.
//!
//! A source document starts with a delimiter line that appears again later
//! as a full line:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! # Body
//! ```
//!
//! Everything between the two delimiter lines is frontmatter, everything
//! after the second is the body. Frontmatter is read as a YAML mapping only
//! when the delimiter starts with `---`.

use std::collections::BTreeMap;

use memchr::{memchr, memmem};

/// Parsed frontmatter, ordered by key.
pub type Metadata = BTreeMap<String, serde_yaml::Value>;

/// Marker that makes frontmatter YAML.
const YAML_MARKER: &[u8] = b"---";

/// Error returned when a document has no frontmatter boundaries.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("frontmatter delimiter not found")]
    DelimiterNotFound,
}

/// Error returned when frontmatter cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("frontmatter is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("invalid YAML frontmatter: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A document cut into its three parts. All slices borrow the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split<'a> {
    /// First line of the document, including its newline.
    pub delimiter: &'a [u8],
    /// Bytes between the two delimiter lines.
    pub frontmatter: &'a [u8],
    /// Bytes after the second delimiter line.
    pub body: &'a [u8],
}

impl Split<'_> {
    /// Whether the frontmatter should be read as YAML.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.delimiter.starts_with(YAML_MARKER)
    }

    /// Parse the frontmatter, or return an empty mapping when the delimiter
    /// does not mark YAML.
    pub fn metadata(&self) -> Result<Metadata, MetadataError> {
        if self.has_metadata() {
            parse_metadata(self.frontmatter)
        } else {
            Ok(Metadata::new())
        }
    }
}

/// Split a document at its first two delimiter lines.
///
/// The delimiter is the first line including its newline. Its second
/// occurrence must start a line; a match in the middle of a line is skipped.
/// Later occurrences belong to the body.
pub fn split(input: &[u8]) -> Result<Split<'_>, SplitError> {
    let newline = memchr(b'\n', input).ok_or(SplitError::DelimiterNotFound)?;
    let (delimiter, rest) = input.split_at(newline + 1);

    let end = memmem::find_iter(rest, delimiter)
        .find(|&pos| pos == 0 || rest[pos - 1] == b'\n')
        .ok_or(SplitError::DelimiterNotFound)?;

    Ok(Split {
        delimiter,
        frontmatter: &rest[..end],
        body: &rest[end + delimiter.len()..],
    })
}

/// Parse YAML frontmatter into a mapping.
///
/// Blank frontmatter yields an empty mapping.
pub fn parse_metadata(frontmatter: &[u8]) -> Result<Metadata, MetadataError> {
    let text = std::str::from_utf8(frontmatter)?;
    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }
    Ok(serde_yaml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rejoin(split: &Split<'_>) -> Vec<u8> {
        [split.delimiter, split.frontmatter, split.delimiter, split.body].concat()
    }

    #[test]
    fn test_split_yaml_document() {
        let input = b"---\ntitle: Hello\n---\n# Body\n";
        let split = split(input).unwrap();
        assert_eq!(split.delimiter, b"---\n");
        assert_eq!(split.frontmatter, b"title: Hello\n");
        assert_eq!(split.body, b"# Body\n");
        assert!(split.has_metadata());
    }

    #[test]
    fn test_split_round_trip() {
        let inputs: [&[u8]; 5] = [
            b"---\ntitle: Hello\n---\n# Body\n",
            b"---\n---\n",
            b"+++\nkey = 1\n+++\nbody without newline",
            b"\n\nbody after blank lines",
            b"===\r\na\r\n===\r\nb\r\n",
        ];
        for input in inputs {
            let split = split(input).unwrap();
            assert_eq!(rejoin(&split), input.to_vec());
        }
    }

    #[test]
    fn test_split_empty_input() {
        assert_eq!(split(b""), Err(SplitError::DelimiterNotFound));
    }

    #[test]
    fn test_split_without_newline() {
        assert_eq!(split(b"---"), Err(SplitError::DelimiterNotFound));
    }

    #[test]
    fn test_split_without_second_delimiter() {
        assert_eq!(
            split(b"---\ntitle: x\n# Body\n"),
            Err(SplitError::DelimiterNotFound)
        );
        // Missing trailing newline on the closing line
        assert_eq!(split(b"---\ntitle: x\n---"), Err(SplitError::DelimiterNotFound));
    }

    #[test]
    fn test_split_ignores_mid_line_match() {
        let split = split(b"---\ntitle: a---\n---\nbody").unwrap();
        assert_eq!(split.frontmatter, b"title: a---\n");
        assert_eq!(split.body, b"body");
    }

    #[test]
    fn test_split_later_delimiters_stay_in_body() {
        let split = split(b"---\na: 1\n---\nintro\n---\nmore\n").unwrap();
        assert_eq!(split.frontmatter, b"a: 1\n");
        assert_eq!(split.body, b"intro\n---\nmore\n");
    }

    #[test]
    fn test_metadata_parsed_for_yaml_marker() {
        let split = split(b"---\ntitle: Hello\ntags: [a, b]\n---\n").unwrap();
        let metadata = split.metadata().unwrap();
        assert_eq!(
            metadata.get("title").and_then(serde_yaml::Value::as_str),
            Some("Hello")
        );
        assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["tags", "title"]);
    }

    #[test]
    fn test_metadata_skipped_for_other_marker() {
        let split = split(b"+++\nnot: [valid yaml\n+++\nbody").unwrap();
        assert!(!split.has_metadata());
        assert!(split.metadata().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_blank_frontmatter() {
        let split = split(b"---\n  \n---\nbody").unwrap();
        assert!(split.metadata().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_uniformly_indented() {
        let metadata = parse_metadata(b"  title: A\n  tags: [x]\n").unwrap();
        assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["tags", "title"]);
        assert_eq!(
            metadata.get("title").and_then(serde_yaml::Value::as_str),
            Some("A")
        );
    }

    #[test]
    fn test_metadata_malformed_yaml() {
        let split = split(b"---\ntitle: [unclosed\n---\nbody").unwrap();
        let err = split.metadata().unwrap_err();
        assert!(matches!(err, MetadataError::Parse(_)));
    }

    #[test]
    fn test_metadata_must_be_mapping() {
        assert!(matches!(
            parse_metadata(b"- a\n- b\n"),
            Err(MetadataError::Parse(_))
        ));
    }

    #[test]
    fn test_metadata_invalid_utf8() {
        assert!(matches!(
            parse_metadata(b"title: \xff\n"),
            Err(MetadataError::InvalidUtf8(_))
        ));
    }
}
