//! Error types for the dual-system router
//!
//! Provides explicit discriminants for:
//! - Backend failures (what a store raises)
//! - Operative failures (the source-of-truth backend failed; propagated)
//! - Shadow failures (the observed backend failed; logged, never returned)
//! - Configuration loading

use std::fmt;
use std::path::PathBuf;

/// Which backend an error or call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// The established store being phased out
    Legacy,
    /// The newer store being phased in
    Target,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Errors raised by either backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Neither name nor alias resolved
    #[error("personality '{0}' not found")]
    NotFound(String),

    /// Requester does not own the personality
    #[error("'{requester}' is not allowed to modify personality '{name}'")]
    Unauthorized { name: String, requester: String },

    /// Name or alias already taken
    #[error("'{0}' is already registered")]
    AlreadyExists(String),

    /// Input rejected by the store
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Store could not be reached or failed internally
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Check if the error means "no such personality"
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the error is an ownership failure
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Router error
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    /// The backend designated as source of truth failed
    #[error("{backend} backend failed during {operation}: {source}")]
    Operative {
        /// Failing backend
        backend: Backend,
        /// Router operation
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: BackendError,
    },

    /// The non-operative backend failed during shadowing or a secondary write
    #[error("shadow {backend} call failed during {operation}: {source}")]
    Shadow {
        /// Failing backend
        backend: Backend,
        /// Router operation
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: BackendError,
    },
}

impl RouterError {
    /// Operative failure
    #[inline]
    #[must_use]
    pub fn operative(backend: Backend, operation: &'static str, source: BackendError) -> Self {
        Self::Operative {
            backend,
            operation,
            source,
        }
    }

    /// Shadow failure
    #[inline]
    #[must_use]
    pub fn shadow(backend: Backend, operation: &'static str, source: BackendError) -> Self {
        Self::Shadow {
            backend,
            operation,
            source,
        }
    }

    /// Check if this must reach the caller
    #[inline]
    #[must_use]
    pub fn is_operative(&self) -> bool {
        matches!(self, Self::Operative { .. })
    }

    /// Check if this must be swallowed
    #[inline]
    #[must_use]
    pub fn is_shadow(&self) -> bool {
        matches!(self, Self::Shadow { .. })
    }

    /// Backend that failed
    #[inline]
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Operative { backend, .. } | Self::Shadow { backend, .. } => *backend,
        }
    }

    /// Underlying backend error
    #[inline]
    #[must_use]
    pub fn backend_error(&self) -> &BackendError {
        match self {
            Self::Operative { source, .. } | Self::Shadow { source, .. } => source,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML syntax or schema error
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File extension not recognised
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_error_display() {
        let err = RouterError::operative(
            Backend::Target,
            "get",
            BackendError::Unavailable("timeout".into()),
        );
        assert_eq!(
            err.to_string(),
            "target backend failed during get: backend unavailable: timeout"
        );
        assert!(err.is_operative());
        assert_eq!(err.backend(), Backend::Target);
    }

    #[test]
    fn shadow_error_classification() {
        let err = RouterError::shadow(Backend::Target, "create", BackendError::Invalid("x".into()));
        assert!(err.is_shadow());
        assert!(!err.is_operative());
        assert_eq!(err.backend_error(), &BackendError::Invalid("x".into()));
    }

    #[test]
    fn backend_error_helpers() {
        assert!(BackendError::NotFound("a".into()).is_not_found());
        let unauthorized = BackendError::Unauthorized {
            name: "a".into(),
            requester: "u2".into(),
        };
        assert!(unauthorized.is_unauthorized());
        assert_eq!(
            unauthorized.to_string(),
            "'u2' is not allowed to modify personality 'a'"
        );
    }
}
