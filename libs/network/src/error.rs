//! Transport Error Types
//!
//! Error handling for the runtime link: socket failures, connection
//! lifecycle, address validation and the separate code-transfer channel.

use std::net::SocketAddr;
use thiserror::Error;

use codec::ProtocolError;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network connectivity errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection management errors
    #[error("Connection error: {message} (remote: {remote_addr:?})")]
    Connection {
        message: String,
        remote_addr: Option<SocketAddr>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Wire protocol errors surfaced through a transport
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<ProtocolError>,
    },

    /// Configuration errors, including malformed target addresses
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Transport timeout errors
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Generic I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create a network error with source
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>, remote_addr: Option<SocketAddr>) -> Self {
        Self::Connection {
            message: message.into(),
            remote_addr,
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        remote_addr: Option<SocketAddr>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            remote_addr,
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Whether a fresh connection could succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network { .. } => true,
            TransportError::Connection { .. } => true,
            TransportError::Timeout { .. } => true,
            TransportError::Io { .. } => true,
            TransportError::Protocol { .. } => false,
            TransportError::Configuration { .. } => false,
        }
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::Network { .. } => "network",
            TransportError::Connection { .. } => "connection",
            TransportError::Protocol { .. } => "protocol",
            TransportError::Configuration { .. } => "configuration",
            TransportError::Timeout { .. } => "timeout",
            TransportError::Io { .. } => "io",
        }
    }
}

// Custom Clone implementation since Box<dyn Error> doesn't implement Clone
impl Clone for TransportError {
    fn clone(&self) -> Self {
        match self {
            TransportError::Network { message, .. } => TransportError::Network {
                message: message.clone(),
                source: None,
            },
            TransportError::Connection {
                message,
                remote_addr,
                ..
            } => TransportError::Connection {
                message: message.clone(),
                remote_addr: *remote_addr,
                source: None,
            },
            TransportError::Protocol { message, source } => TransportError::Protocol {
                message: message.clone(),
                source: source.clone(),
            },
            TransportError::Configuration { message, field } => TransportError::Configuration {
                message: message.clone(),
                field: field.clone(),
            },
            TransportError::Timeout {
                operation,
                timeout_ms,
            } => TransportError::Timeout {
                operation: operation.clone(),
                timeout_ms: *timeout_ms,
            },
            TransportError::Io { message, source } => TransportError::Io {
                message: message.clone(),
                source: std::io::Error::new(source.kind(), message.as_str()),
            },
        }
    }
}

/// Convert standard I/O errors to transport errors
impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::Io {
            message: error.to_string(),
            source: error,
        }
    }
}

/// Wrap codec failures, keeping the original error as source
impl From<ProtocolError> for TransportError {
    fn from(error: ProtocolError) -> Self {
        TransportError::Protocol {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

/// Failures of the code upload/download channel
///
/// Kept apart from [`TransportError`]: transfers are unary operations with no
/// bearing on the realtime session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Robot host could not be reached
    #[error("Robot unreachable at {host}: {message}")]
    Unreachable { host: String, message: String },

    /// Credentials were rejected
    #[error("Authentication failed for {user}@{host}")]
    Authentication { host: String, user: String },

    /// Connected, but copying the file failed
    #[error("Transfer of {path} failed: {message}")]
    Transfer { path: String, message: String },
}

impl TransferError {
    pub fn category(&self) -> &'static str {
        match self {
            TransferError::Unreachable { .. } => "unreachable",
            TransferError::Authentication { .. } => "authentication",
            TransferError::Transfer { .. } => "transfer",
        }
    }
}
