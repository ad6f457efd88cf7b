/// Failure to turn raw query text into a typed [`Identifier`].
///
/// [`Identifier`]: crate::identifier::Identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    EmptyInput,
    InvalidGameLink,
    InvalidUserLink,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Empty query"),
            Self::InvalidGameLink => write!(f, "Invalid Game Link"),
            Self::InvalidUserLink => write!(f, "Invalid User Link"),
        }
    }
}

/// Terminal failure of a lookup. Non-fatal degradation (placeholder icon,
/// cached fallback) is a success with a flag, never one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Unparseable or semantically wrong identifier kind.
    InvalidInput(String),
    /// Username or place resolved to nothing upstream.
    NotFound(String),
    /// Network error, 5xx, or per-call timeout from a required upstream call.
    UpstreamUnavailable(String),
    /// Request-level deadline exceeded.
    Timeout,
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(m) | Self::NotFound(m) | Self::UpstreamUnavailable(m) => {
                write!(f, "{m}")
            },
            Self::Timeout => write!(f, "Lookup timed out"),
        }
    }
}

impl From<ExtractError> for LookupError {
    fn from(e: ExtractError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}
