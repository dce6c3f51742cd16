//! CMI key validation and value sanitization.
//!
//! The session store accepts whatever it is given, so every key and value
//! coming from SCORM content passes through here first.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Longest key accepted.
pub const MAX_KEY_LEN: usize = 255;

static KEY_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(cmi|adl)(\.[a-z0-9_]+)+$").expect("CMI key pattern is valid")
});

/// Elements the content may read but never write.
const READ_ONLY: &[&str] = &[
    "cmi.core.student_id",
    "cmi.core.student_name",
    "cmi.core.credit",
    "cmi.core.lesson_mode",
    "cmi.core.total_time",
    "cmi.learner_id",
    "cmi.learner_name",
    "cmi.credit",
    "cmi.mode",
    "cmi.launch_data",
    "cmi.total_time",
];

/// Elements the content may write but never read.
const WRITE_ONLY: &[&str] = &[
    "cmi.core.session_time",
    "cmi.core.exit",
    "cmi.session_time",
    "cmi.exit",
];

/// Enumerated elements and their allowed values.
const VOCABULARIES: &[(&str, &[&str])] = &[
    (
        "cmi.core.lesson_status",
        &[
            "passed",
            "completed",
            "failed",
            "incomplete",
            "browsed",
            "not attempted",
        ],
    ),
    (
        "cmi.completion_status",
        &["completed", "incomplete", "not attempted", "unknown"],
    ),
    ("cmi.success_status", &["passed", "failed", "unknown"]),
    ("cmi.mode", &["browse", "normal", "review"]),
    ("cmi.core.lesson_mode", &["browse", "normal", "review"]),
    ("cmi.core.exit", &["time-out", "suspend", "logout", ""]),
    (
        "cmi.exit",
        &["time-out", "suspend", "logout", "normal", ""],
    ),
];

/// A CMI data model element name that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CmiKey(String);

impl CmiKey {
    /// Validate `raw` as a CMI element name.
    ///
    /// Accepts `cmi.` or `adl.` followed by dot-separated segments of
    /// lowercase letters, digits and underscores.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() > MAX_KEY_LEN || !KEY_SHAPE.is_match(raw) {
            return Err(Error::InvalidKey(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read-only elements, including `_count`, `_children` and `_version` keywords.
    pub fn is_read_only(&self) -> bool {
        READ_ONLY.contains(&self.as_str()) || self.is_keyword()
    }

    pub fn is_write_only(&self) -> bool {
        WRITE_ONLY.contains(&self.as_str())
    }

    fn is_keyword(&self) -> bool {
        self.0
            .rsplit('.')
            .next()
            .is_some_and(|segment| segment.starts_with('_'))
    }
}

impl fmt::Display for CmiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CmiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean a value written by content before it is cached.
///
/// Drops control characters other than newline and tab, drops angle
/// brackets, trims surrounding whitespace and keeps at most `max_len`
/// characters.
pub fn sanitize_value(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| (!c.is_control() || matches!(c, '\n' | '\t')) && !matches!(c, '<' | '>'))
        .collect::<String>()
        .trim()
        .chars()
        .take(max_len)
        .collect()
}

/// Reject values outside the vocabulary of enumerated elements.
///
/// Elements without a vocabulary accept anything.
pub fn validate_vocabulary(key: &CmiKey, value: &str) -> Result<()> {
    let allowed = VOCABULARIES
        .iter()
        .find(|(element, _)| *element == key.as_str())
        .map(|(_, values)| *values);

    match allowed {
        Some(values) if !values.contains(&value) => Err(Error::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}
