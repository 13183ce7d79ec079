//! Sanitization of untrusted project and file names into single path segments

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A name that passed [`sanitize`]: only `[A-Za-z0-9_.-]`, no `..`,
/// not starting with `.` or `/`, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SafeName(String);

/// Name of a project directory under the store root
pub type ProjectName = SafeName;

/// Name of a file directly inside a project directory
pub type FileName = SafeName;

impl SafeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SafeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Normalize an untrusted string into a safe path segment.
///
/// Surrounding whitespace is trimmed, internal whitespace runs become a single
/// `_`, and every character outside `[A-Za-z0-9_.-]` is dropped. Returns `None`
/// when the result is empty, contains `..`, or starts with `.` or `/`.
pub fn sanitize(raw: &str) -> Option<SafeName> {
    let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), "_");
    let cleaned: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    if cleaned.is_empty()
        || cleaned.contains("..")
        || cleaned.starts_with('.')
        || cleaned.starts_with('/')
    {
        return None;
    }

    Some(SafeName(cleaned))
}
