use std::fmt;

use super::error::StorageError;

/// Relative location of an object inside a store, e.g.
/// `ppt-submissions/ppt-1718000000000-0a1b2c3d.pptx`.
///
/// Keys are one or more `/`-separated segments of ASCII letters, digits,
/// `.`, `_` and `-`; `.` and `..` segments are rejected so a key can never
/// escape the store root.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Validate an existing key, e.g. one read back from the database.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() || raw.len() > 512 {
            return Err(StorageError::InvalidKey(format!(
                "key length must be 1-512, got {}",
                raw.len()
            )));
        }
        for segment in raw.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(format!(
                    "bad segment in '{raw}'"
                )));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            {
                return Err(StorageError::InvalidKey(format!(
                    "unsupported character in '{raw}'"
                )));
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// Generate a fresh key `{folder}/{prefix}-{millis}-{random}.{extension}`.
    pub fn generate(folder: &str, prefix: &str, extension: &str) -> Result<Self, StorageError> {
        let millis = chrono::Utc::now().timestamp_millis();
        let random = uuid::Uuid::new_v4().simple().to_string();
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        Self::parse(&format!(
            "{folder}/{prefix}-{millis}-{}.{extension}",
            &random[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
