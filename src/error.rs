//! Error types for rust-yangbind

use thiserror::Error;

/// Main error type for codec binding operations
#[derive(Debug, Error)]
pub enum YangBindError {
    /// Owning model package or its bundle metadata cannot be located
    #[error("cannot resolve model bundle: {0}")]
    Resolution(String),

    /// Sniffed (namespace, local-name) matches no registered model package
    #[error("no registered top-level model for '{namespace}:{entity}'")]
    EntityNotFound {
        /// Namespace URI or module name extracted from the payload
        namespace: String,
        /// Local name of the unresolved top-level element
        entity: String,
    },

    /// Decoded payload root did not hold exactly one top-level container
    #[error("codec supports a single entity per payload, found {0}; split the payload")]
    PayloadStructure(usize),

    /// Payload or tree content rejected by the schema
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Payload could not be parsed at the grammar level
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// XML serialization error
    #[error("XML encode error: {0}")]
    XmlEncode(String),

    /// Leaf value outside its YANG value space
    #[error("type conversion error: {0}")]
    TypeConversion(String),

    /// Schema bundle file is structurally invalid
    #[error("invalid schema bundle: {0}")]
    InvalidBundle(String),

    /// Model package registration conflict
    #[error("registration conflict: {0}")]
    Registration(String),

    /// Field name not declared by a model object
    #[error("model object has no field '{0}'")]
    UnknownField(String),

    /// IO error (schema bundle loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for codec binding operations
pub type Result<T> = std::result::Result<T, YangBindError>;
