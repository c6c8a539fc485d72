use thiserror::Error;

/// Main error type for kubemem
#[derive(Error, Debug)]
pub enum KubememError {
    /// Kubernetes API errors
    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] KubernetesError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed resource quantities
    #[error("Quantity error: {0}")]
    Quantity(#[from] QuantityError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Kubernetes-specific errors
#[derive(Error, Debug)]
pub enum KubernetesError {
    /// API server connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid resource specification
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// API error
    #[error("API error: {0}")]
    ApiError(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Named context is absent from the kubeconfig
    #[error("Context not found in kubeconfig: {0}")]
    ContextNotFound(String),

    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Configuration file error
    #[error("File error: {0}")]
    FileError(String),
}

/// Errors raised while parsing a Kubernetes quantity string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    #[error("unknown suffix in quantity '{0}'")]
    UnknownSuffix(String),

    #[error("negative quantity '{0}'")]
    Negative(String),

    #[error("quantity '{0}' is out of range")]
    OutOfRange(String),
}

/// Helper type alias for Results
pub type Result<T> = std::result::Result<T, KubememError>;
