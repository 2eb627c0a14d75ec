use thiserror::Error;

/// Error when parsing an unknown enum string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{invalid}'. Valid values: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    expected: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, invalid: &str, valid: &[&'static str]) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            expected: valid.join(", "),
        }
    }

    pub fn invalid(&self) -> &str {
        &self.invalid
    }
}
