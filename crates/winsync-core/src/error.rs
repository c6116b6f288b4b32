//! Error types for the window registry
//!
//! Store failures never escape the reconciliation loop; they are handled
//! locally by degrading to single-window mode. A caller sees errors only
//! from construction, from misuse of `initialize`, and from an explicit
//! store reset.

/// Errors from the shared key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached (disabled by the user, missing, or throwing)
    Unavailable(String),

    /// A write was rejected because the store is full
    QuotaExceeded,

    /// The registry blob could not be serialized
    Serialization(String),
}

impl StoreError {
    /// Create an unavailable error with message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            Self::QuotaExceeded => write!(f, "store quota exceeded"),
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors surfaced by [`RegistryClient`](crate::RegistryClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `initialize` was called a second time on the same process
    AlreadyInitialized,

    /// A configuration value is out of range
    InvalidConfig {
        /// The offending field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A store operation failed outside the self-healing tick path
    Store(StoreError),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "registry already initialized"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config '{}': {}", field, reason)
            }
            Self::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
