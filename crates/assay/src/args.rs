//! Validated operator arguments shared by the validation and transform operators.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{AssayError, Result};

/// A non-empty list of non-blank column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnList(Vec<String>);

impl ColumnList {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(AssayError::Config(
                "columns_to_check must be a non-empty list of column names".to_string(),
            ));
        }
        if let Some(pos) = columns.iter().position(|c| c.trim().is_empty()) {
            return Err(AssayError::Config(format!(
                "columns_to_check entry {} must be a non-empty string",
                pos
            )));
        }
        Ok(Self(columns))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ColumnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|c| format!("'{}'", c)).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// A compiled, case-insensitive, dot-matches-newline pattern.
///
/// A value satisfies the pattern when it matches anywhere in the value; use
/// `^...$` for a full match.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Regex,
}

impl RegexPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(AssayError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "pattern must be a non-empty string".to_string(),
            });
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| AssayError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_column_list_rejects_empty() {
        let none: Vec<String> = Vec::new();
        assert_eq!(ColumnList::new(none).unwrap_err().kind(), ErrorKind::Configuration);
        assert!(ColumnList::new(["a", "  "]).is_err());
        assert_eq!(ColumnList::new(["a", "b"]).unwrap().to_string(), "['a', 'b']");
    }

    #[test]
    fn test_pattern_flags() {
        let p = RegexPattern::new("^(?:eur|euros|euro|€)$").unwrap();
        assert!(p.is_match("EUR"));
        assert!(p.is_match("€"));
        assert!(!p.is_match("usd"));

        let dot = RegexPattern::new("a.b").unwrap();
        assert!(dot.is_match("a\nb"));
    }

    #[test]
    fn test_pattern_searches() {
        let p = RegexPattern::new(r"\d+").unwrap();
        assert!(p.is_match("budget of 100 euro"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RegexPattern::new("   "),
            Err(AssayError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RegexPattern::new("(unclosed"),
            Err(AssayError::InvalidPattern { .. })
        ));
    }
}
