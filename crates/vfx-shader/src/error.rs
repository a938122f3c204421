//! Error types for shader generation.
//!
//! Every error is a usage error reported synchronously at the offending call:
//! - Dynamic property registration and lookup
//! - Indexed access to registered resources
//! - Texture registration with inconsistent data
//! - Loading [`GpuShaderOptions`](crate::GpuShaderOptions) from YAML

use thiserror::Error;

use crate::dynamic::DynamicPropertyType;

/// Result type for shader generation operations.
pub type ShaderResult<T> = Result<T, ShaderError>;

/// Errors that can occur while building a shader description.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A dynamic property of this kind is already registered.
    #[error("dynamic property already here: {kind}")]
    DuplicateKind {
        /// Kind that was registered twice.
        kind: DynamicPropertyType,
    },

    /// No dynamic property of this kind is registered.
    #[error("dynamic property not found: {kind}")]
    NotFound {
        /// Kind that was queried.
        kind: DynamicPropertyType,
    },

    /// Indexed access beyond the registered count.
    #[error("access error: index = {index} where size = {len}")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of registered entries.
        len: usize,
    },

    /// Texture data does not match its declared shape.
    #[error("invalid texture '{name}': {reason}")]
    InvalidTexture {
        /// Texture name.
        name: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// Language name not recognized.
    #[error("unknown shader language: {name}")]
    UnknownLanguage {
        /// The unrecognized name.
        name: String,
    },

    /// I/O error reading an options file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
