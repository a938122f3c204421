//! Target shading languages.
//!
//! The set is closed: every language belongs to exactly one
//! [`WrapperFamily`], which decides how the accumulated fragments are turned
//! into a standalone program.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShaderError;

/// Target shader language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GpuLanguage {
    /// NVIDIA Cg shading language.
    Cg,
    /// GLSL 1.20 (OpenGL 2.1)
    #[default]
    Glsl1_2,
    /// GLSL 1.30 (OpenGL 3.0)
    Glsl1_3,
    /// GLSL 4.00 (OpenGL 4.0)
    Glsl4_0,
    /// GLSL ES 1.00 (WebGL 1.0)
    GlslEs1_0,
    /// GLSL ES 3.00 (WebGL 2.0)
    GlslEs3_0,
    /// HLSL Shader Model 5.0 (DirectX 11)
    HlslDx11,
    /// Open Shading Language 1.x
    Osl1,
    /// Metal Shading Language 2
    MslMetal,
}

/// How a language turns the fragment pile into a standalone program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperFamily {
    /// Fragments assemble directly into the final program.
    None,
    /// The function is enclosed in a type holding its resources.
    ClassWrap,
    /// The function is called from a language-specific shader entry point.
    EntryWrap,
}

impl GpuLanguage {
    /// All supported languages.
    pub const ALL: [GpuLanguage; 9] = [
        GpuLanguage::Cg,
        GpuLanguage::Glsl1_2,
        GpuLanguage::Glsl1_3,
        GpuLanguage::Glsl4_0,
        GpuLanguage::GlslEs1_0,
        GpuLanguage::GlslEs3_0,
        GpuLanguage::HlslDx11,
        GpuLanguage::Osl1,
        GpuLanguage::MslMetal,
    ];

    /// Canonical name, as used in cache keys and option files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuLanguage::Cg => "cg",
            GpuLanguage::Glsl1_2 => "glsl_1.2",
            GpuLanguage::Glsl1_3 => "glsl_1.3",
            GpuLanguage::Glsl4_0 => "glsl_4.0",
            GpuLanguage::GlslEs1_0 => "glsl_es_1.0",
            GpuLanguage::GlslEs3_0 => "glsl_es_3.0",
            GpuLanguage::HlslDx11 => "hlsl_dx11",
            GpuLanguage::Osl1 => "osl_1",
            GpuLanguage::MslMetal => "msl_2",
        }
    }

    /// Returns true if this is a GLSL variant.
    pub fn is_glsl(&self) -> bool {
        matches!(
            self,
            GpuLanguage::Glsl1_2
                | GpuLanguage::Glsl1_3
                | GpuLanguage::Glsl4_0
                | GpuLanguage::GlslEs1_0
                | GpuLanguage::GlslEs3_0
        )
    }

    /// Wrapping strategy required by this language.
    pub fn wrapper_family(&self) -> WrapperFamily {
        match self {
            GpuLanguage::MslMetal => WrapperFamily::ClassWrap,
            GpuLanguage::Osl1 => WrapperFamily::EntryWrap,
            _ => WrapperFamily::None,
        }
    }
}

impl fmt::Display for GpuLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GpuLanguage {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        GpuLanguage::ALL
            .into_iter()
            .find(|lang| lang.as_str() == name)
            .ok_or_else(|| ShaderError::UnknownLanguage { name: s.to_string() })
    }
}

impl TryFrom<String> for GpuLanguage {
    type Error = ShaderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GpuLanguage> for String {
    fn from(lang: GpuLanguage) -> Self {
        lang.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for lang in GpuLanguage::ALL {
            assert_eq!(lang.as_str().parse::<GpuLanguage>().unwrap(), lang);
        }
        assert_eq!("GLSL_4.0".parse::<GpuLanguage>().unwrap(), GpuLanguage::Glsl4_0);
    }

    #[test]
    fn unknown_name() {
        let err = "wgsl".parse::<GpuLanguage>().unwrap_err();
        assert!(matches!(err, ShaderError::UnknownLanguage { ref name } if name == "wgsl"));
    }

    #[test]
    fn families() {
        assert_eq!(GpuLanguage::MslMetal.wrapper_family(), WrapperFamily::ClassWrap);
        assert_eq!(GpuLanguage::Osl1.wrapper_family(), WrapperFamily::EntryWrap);
        assert_eq!(GpuLanguage::HlslDx11.wrapper_family(), WrapperFamily::None);
        assert_eq!(GpuLanguage::Cg.wrapper_family(), WrapperFamily::None);
    }

    #[test]
    fn is_glsl() {
        assert!(GpuLanguage::Glsl1_2.is_glsl());
        assert!(GpuLanguage::GlslEs3_0.is_glsl());
        assert!(!GpuLanguage::HlslDx11.is_glsl());
        assert!(!GpuLanguage::MslMetal.is_glsl());
    }
}
