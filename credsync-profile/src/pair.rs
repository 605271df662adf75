//! Name/value pairs split out of a single raw line.
//!
//! A pair is built once from its raw text and never changes afterwards. The
//! name and value are trimmed; a blank name yields no pair at all, and a blank
//! value yields a name without a value.

/// Delimiter used when none is given explicitly.
pub const DEFAULT_DELIMITER: &str = "=";

/// A `name <delimiter> value` line.
#[derive(Debug, Clone)]
pub struct NameValuePair {
    raw_text: String,
    delimiter: String,
    name: Option<String>,
    value: Option<String>,
}

impl NameValuePair {
    /// Split `raw_text` on the default `=` delimiter.
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self::with_delimiter(raw_text, DEFAULT_DELIMITER)
    }

    /// Split `raw_text` on the first occurrence of `delimiter`.
    ///
    /// An empty delimiter falls back to [`DEFAULT_DELIMITER`].
    pub fn with_delimiter(raw_text: impl Into<String>, delimiter: impl Into<String>) -> Self {
        let raw_text: String = raw_text.into();
        let mut delimiter: String = delimiter.into();
        if delimiter.is_empty() {
            delimiter = DEFAULT_DELIMITER.to_string();
        }

        let (name, value) = split_pair(&raw_text, &delimiter);

        Self {
            raw_text,
            delimiter,
            name,
            value,
        }
    }

    /// Trimmed name, or `None` when the line has no delimiter or a blank name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Trimmed value, or `None` when absent or blank.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The line exactly as it was given.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// True when both a name and a value are present.
    pub fn is_pair(&self) -> bool {
        self.name.is_some() && self.value.is_some()
    }

    /// Case-sensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Case-insensitive name comparison.
    pub fn is_ignore_case(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name.trim()))
    }

    /// Equality that ignores the case of the name but not of the value.
    pub fn eq_ignore_case(&self, other: &Self) -> bool {
        let names_match = match (&self.name, &other.name) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        names_match && self.value == other.value
    }
}

/// Pairs compare by name and value; the raw text is not part of identity.
impl PartialEq for NameValuePair {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for NameValuePair {}

fn split_pair(raw_text: &str, delimiter: &str) -> (Option<String>, Option<String>) {
    let Some((name, value)) = raw_text.split_once(delimiter) else {
        return (None, None);
    };

    let name = name.trim();
    if name.is_empty() {
        return (None, None);
    }

    let value = value.trim();
    let value = (!value.is_empty()).then(|| value.to_string());

    (Some(name.to_string()), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pair() {
        let pair = NameValuePair::new("hello = goodbye");
        assert_eq!(pair.name(), Some("hello"));
        assert_eq!(pair.value(), Some("goodbye"));
        assert!(pair.is_pair());
    }

    #[test]
    fn test_pair_is_trimmed() {
        let pair = NameValuePair::new("  hello=goodbye\t");
        assert_eq!(pair.name(), Some("hello"));
        assert_eq!(pair.value(), Some("goodbye"));
        assert_eq!(pair.raw_text(), "  hello=goodbye\t");
    }

    #[test]
    fn test_custom_delimiter() {
        let pair = NameValuePair::with_delimiter("  hello | goodbye\t", "|");
        assert_eq!(pair.name(), Some("hello"));
        assert_eq!(pair.value(), Some("goodbye"));
        assert_eq!(pair.delimiter(), "|");
    }

    #[test]
    fn test_no_delimiter_is_not_a_pair() {
        let pair = NameValuePair::new("bogus");
        assert_eq!(pair.name(), None);
        assert_eq!(pair.value(), None);
        assert!(!pair.is_pair());
    }

    #[test]
    fn test_blank_value_keeps_name() {
        let pair = NameValuePair::new("aws_session_token = ");
        assert_eq!(pair.name(), Some("aws_session_token"));
        assert_eq!(pair.value(), None);
        assert!(!pair.is_pair());
    }

    #[test]
    fn test_blank_name_discards_value() {
        let pair = NameValuePair::new(" = value");
        assert_eq!(pair.name(), None);
        assert_eq!(pair.value(), None);
    }

    #[test]
    fn test_value_keeps_later_delimiters() {
        let pair = NameValuePair::new("token = abc==");
        assert_eq!(pair.value(), Some("abc=="));
    }

    #[test]
    fn test_case_variants() {
        let pair = NameValuePair::new("Source = /tmp/creds");
        assert!(pair.is("Source"));
        assert!(!pair.is("source"));
        assert!(pair.is_ignore_case("source"));

        let other = NameValuePair::new("SOURCE=/tmp/creds");
        assert_ne!(pair, other);
        assert!(pair.eq_ignore_case(&other));
        assert!(!pair.eq_ignore_case(&NameValuePair::new("source = /TMP/creds")));
    }
}
