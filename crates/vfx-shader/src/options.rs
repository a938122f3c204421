//! Producer-side configuration of a shader description.
//!
//! ```
//! use vfx_shader::{GpuLanguage, GpuShaderOptions};
//!
//! let opts = GpuShaderOptions::from_yaml("language: hlsl_dx11\nfunction_name: Grade\n").unwrap();
//! assert_eq!(opts.language, GpuLanguage::HlslDx11);
//! assert_eq!(opts.resource_prefix, "ocio");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ShaderResult;
use crate::language::GpuLanguage;

/// Default entry function name.
pub const DEFAULT_FUNCTION_NAME: &str = "OCIOMain";
/// Default prefix of generated resource names.
pub const DEFAULT_RESOURCE_PREFIX: &str = "ocio";
/// Default output pixel variable name.
pub const DEFAULT_PIXEL_NAME: &str = "outColor";

/// Identity fields of a shader description, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuShaderOptions {
    /// Producer-assigned unique id.
    pub uid: String,
    /// Target language.
    pub language: GpuLanguage,
    /// Entry function name.
    pub function_name: String,
    /// Prefix of generated resource names.
    pub resource_prefix: String,
    /// Output pixel variable name.
    pub pixel_name: String,
}

impl Default for GpuShaderOptions {
    fn default() -> Self {
        Self {
            uid: String::new(),
            language: GpuLanguage::default(),
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            resource_prefix: DEFAULT_RESOURCE_PREFIX.to_string(),
            pixel_name: DEFAULT_PIXEL_NAME.to_string(),
        }
    }
}

impl GpuShaderOptions {
    /// Parses options from a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> ShaderResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads options from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> ShaderResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Serializes options to YAML.
    pub fn to_yaml(&self) -> ShaderResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
