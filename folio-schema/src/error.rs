//! Schema error types

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised by the validator, registry and binder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// No type is registered under the namespace
    #[error("Named type for namespace '{0}' not found")]
    KeyNotFound(String),

    /// Two different types were registered under one namespace
    #[error("Namespace '{namespace}' is claimed by more than one type: {types:?}")]
    NamespaceConflict {
        namespace: String,
        types: Vec<&'static str>,
    },

    /// The schema itself could not be compiled
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A payload could not be decoded into its named type
    #[error("Failed to decode value as '{namespace}': {message}")]
    Decode { namespace: String, message: String },

    /// A named value could not be encoded
    #[error("Failed to encode value: {0}")]
    Encode(String),

    /// The payload carries no discriminator
    #[error("Value has no '{0}' discriminator")]
    MissingDiscriminator(&'static str),
}

impl SchemaError {
    pub fn decode(namespace: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            namespace: namespace.into(),
            message: message.to_string(),
        }
    }
}
