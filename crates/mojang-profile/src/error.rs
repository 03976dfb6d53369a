use std::fmt;

/// Errors from the Mojang profile client
#[derive(Debug)]
pub enum UpstreamError {
    /// The name does not belong to any profile
    NotFound(String),
    Http(Box<reqwest::Error>),
    Status(u16),
    Decode(String),
    /// The profile advertises no skin, which every profile must have
    MissingSkin,
    EmptyBody,
}

impl UpstreamError {
    /// Whether the upstream answered that the player does not exist, as
    /// opposed to failing to answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "Profile not found: {name}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Status(status) => write!(f, "Upstream returned status {status}"),
            Self::Decode(msg) => write!(f, "Decode error: {msg}"),
            Self::MissingSkin => write!(f, "Profile has no skin texture"),
            Self::EmptyBody => write!(f, "Upstream returned an empty body"),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
