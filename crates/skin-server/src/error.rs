//! Error types for the skin server

use std::fmt;
use std::sync::Arc;

use mojang_profile::UpstreamError;
use texture_store::{AssetKind, StoreError};

/// Why a texture could not be served from the override, cache or upstream.
///
/// Never returned to callers of `Resolver::resolve`; every variant degrades
/// to the default texture. Cloned so that every resolver waiting on one
/// upstream fetch receives its outcome.
#[derive(Debug, Clone)]
pub enum ResolveError {
    InvalidKey(String),
    IdentityNotFound(String),
    UpstreamUnavailable(String),
    /// The profile is valid but has no texture of this kind
    AssetKindAbsent(AssetKind),
    StoreWriteFailure(Arc<StoreError>),
}

impl ResolveError {
    pub(crate) fn upstream(name: &str, err: UpstreamError) -> Self {
        if err.is_not_found() {
            ResolveError::IdentityNotFound(name.to_string())
        } else {
            ResolveError::UpstreamUnavailable(err.to_string())
        }
    }

    /// Expected outcomes that do not indicate anything wrong with the service
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ResolveError::IdentityNotFound(_) | ResolveError::AssetKindAbsent(_)
        )
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidKey(key) => write!(f, "Invalid player name: {:?}", key),
            ResolveError::IdentityNotFound(name) => write!(f, "Player not found: {}", name),
            ResolveError::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            ResolveError::AssetKindAbsent(kind) => write!(f, "Profile has no {}", kind),
            ResolveError::StoreWriteFailure(err) => write!(f, "Cache write failed: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::StoreWriteFailure(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ServerError {
    Store(StoreError),
    Upstream(UpstreamError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Store(err) => write!(f, "Store error: {}", err),
            ServerError::Upstream(err) => write!(f, "Upstream client error: {}", err),
            ServerError::Io(err) => write!(f, "IO error: {}", err),
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Store(err) => Some(err),
            ServerError::Upstream(err) => Some(err),
            ServerError::Io(err) => Some(err.as_ref()),
            ServerError::Config(_) => None,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        ServerError::Store(err)
    }
}

impl From<UpstreamError> for ServerError {
    fn from(err: UpstreamError) -> Self {
        ServerError::Upstream(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
