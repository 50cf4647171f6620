use std::fmt;

/// Default ceiling on problem statement length, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 5000;

/// Substring that is refused outright
const DISALLOWED_MARKER: &str = "<script";

/// Reasons a problem statement is refused before any call is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter valid text.")]
    Empty,
    #[error("Input too long. Please keep it under {max} characters.")]
    TooLong { max: usize },
    #[error("Invalid input detected.")]
    Disallowed,
}

/// A validated, immutable problem statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemStatement(String);

impl ProblemStatement {
    /// Validate raw user input. The length limit applies to the input as submitted;
    /// surrounding whitespace is then dropped and the rest kept verbatim.
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, ValidationError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty);
        }
        if raw.chars().count() > max_chars {
            return Err(ValidationError::TooLong { max: max_chars });
        }
        if text.contains(DISALLOWED_MARKER) {
            return Err(ValidationError::Disallowed);
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProblemStatement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
