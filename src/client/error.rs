use std::fmt;

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// How an exhausted call is reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallErrorKind {
    Network,
    RateLimited,
    Server,
    Other,
    Cancelled,
}

impl CallErrorKind {
    /// Classify the failure of the last attempt
    pub fn classify(error: &AttemptError) -> Self {
        match error {
            AttemptError::Network(_) | AttemptError::Timeout(_) => Self::Network,
            AttemptError::Status { status: 429, .. } => Self::RateLimited,
            AttemptError::Status { status, .. } if (500..600).contains(status) => Self::Server,
            AttemptError::Status { .. } | AttemptError::Malformed(_) => Self::Other,
        }
    }

    /// User-facing message for this kind of failure
    pub const fn message(self) -> &'static str {
        match self {
            Self::Network => "Network error. Please check your connection and try again.",
            Self::RateLimited => "Rate limit exceeded. Please wait a moment and try again.",
            Self::Server => "Server error. Please try again later.",
            Self::Other => "Could not get a response. Please try again.",
            Self::Cancelled => "Request cancelled.",
        }
    }
}

impl fmt::Display for CallErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Other => "other",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A model call that did not produce text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} (after {attempts} attempt(s): {detail})", .kind.message())]
pub struct CallError {
    pub kind: CallErrorKind,
    /// Attempts made before giving up
    pub attempts: u32,
    /// Technical detail of the last failure, for logs
    pub detail: String,
}

impl CallError {
    pub fn exhausted(last: &AttemptError, attempts: u32) -> Self {
        Self {
            kind: CallErrorKind::classify(last),
            attempts,
            detail: last.to_string(),
        }
    }

    pub fn cancelled(attempts: u32) -> Self {
        Self {
            kind: CallErrorKind::Cancelled,
            attempts,
            detail: "cancelled by caller".to_string(),
        }
    }

    pub const fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// Inline text shown (and interpolated) in place of a model output
    pub fn placeholder(&self) -> String {
        format!("Error: {}", self.message())
    }
}

/// Outcome of one logical model call
pub type CallResult = Result<String, CallError>;

/// Text to display for a settled call, success or not
pub fn display_text(result: &CallResult) -> String {
    match result {
        Ok(text) => text.clone(),
        Err(error) => error.placeholder(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> AttemptError {
        AttemptError::Status {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            CallErrorKind::classify(&AttemptError::Network("refused".into())),
            CallErrorKind::Network
        );
        assert_eq!(
            CallErrorKind::classify(&AttemptError::Timeout(60)),
            CallErrorKind::Network
        );
        assert_eq!(CallErrorKind::classify(&status(429)), CallErrorKind::RateLimited);
        assert_eq!(CallErrorKind::classify(&status(500)), CallErrorKind::Server);
        assert_eq!(CallErrorKind::classify(&status(503)), CallErrorKind::Server);
        assert_eq!(CallErrorKind::classify(&status(404)), CallErrorKind::Other);
        assert_eq!(
            CallErrorKind::classify(&AttemptError::Malformed("no text".into())),
            CallErrorKind::Other
        );
    }

    #[test]
    fn test_placeholder() {
        let error = CallError::exhausted(&status(429), 3);
        assert_eq!(
            error.placeholder(),
            "Error: Rate limit exceeded. Please wait a moment and try again."
        );
        assert_eq!(display_text(&Err(error)), display_text(&Err(CallError::exhausted(&status(429), 1))));
        assert_eq!(display_text(&Ok("fine".to_string())), "fine");
    }
}
