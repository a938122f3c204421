//! Multi-target GPU shader generation for VFX color pipelines.
//!
//! A color pipeline describes its transforms as text fragments (uniform and
//! texture declarations, helper functions, the body of one color function).
//! This crate collects those fragments and assembles them into a complete
//! program for one of several shading languages:
//!
//! - GLSL 1.2 / 1.3 / 4.0 and GLSL ES 1.0 / 3.0, HLSL (DX11), Cg
//! - Metal, where the function is wrapped in a struct holding its textures
//! - OSL, where the function is called from a `shader` entry point
//!
//! Every description carries a cache key built from its configuration and a
//! content hash of the assembled program, so hosts can memoize compiled
//! shaders.
//!
//! # Quick Start
//!
//! ```
//! use vfx_shader::{DynamicProperty, DynamicPropertyType, GpuLanguage, GpuShaderDesc};
//!
//! let desc = GpuShaderDesc::new();
//! desc.set_language(GpuLanguage::HlslDx11);
//!
//! // What a color pipeline would emit
//! desc.add_to_declarations("uniform float ocio_exposure;\n");
//! desc.add_to_function_header("float4 OCIOMain(float4 inPixel)\n{\n  float4 outColor = inPixel;\n");
//! desc.add_to_function_body("  outColor.rgb *= exp2(ocio_exposure);\n");
//! desc.add_to_function_footer("  return outColor;\n}\n");
//! desc.add_dynamic_property(DynamicProperty::new(DynamicPropertyType::Exposure, 0.0)).unwrap();
//!
//! desc.finalize();
//! println!("{}", desc.shader_text());
//! println!("cache key: {}", desc.cache_key());
//! ```
//!
//! # Metal
//!
//! ```
//! use vfx_shader::{GpuInterpolation, GpuLanguage, GpuShaderDesc};
//!
//! let desc = GpuShaderDesc::new();
//! desc.set_language(GpuLanguage::MslMetal);
//! desc.add_3d_texture("ocio_lut3d_0", "ocio_lut3d_0Sampler", 2,
//!     GpuInterpolation::Linear, vec![0.0; 2 * 2 * 2 * 3]).unwrap();
//! desc.finalize();
//!
//! assert!(desc.shader_text().contains("struct OCIO"));
//! assert_eq!(desc.wrapper_parameters().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod desc;
mod dynamic;
mod error;
mod language;
mod options;
mod resources;
mod segments;
mod text;
mod wrapper;

// Re-exports
pub use desc::{GpuShaderDesc, METAL_FUNCTION_NAME};
pub use dynamic::{DynamicProperties, DynamicProperty, DynamicPropertyRc, DynamicPropertyType};
pub use error::{ShaderError, ShaderResult};
pub use language::{GpuLanguage, WrapperFamily};
pub use options::{
    GpuShaderOptions, DEFAULT_FUNCTION_NAME, DEFAULT_PIXEL_NAME, DEFAULT_RESOURCE_PREFIX,
};
pub use resources::{
    GpuInterpolation, GpuTexture, GpuTextureType, GpuUniform, ResourceLedger, TextureChannel,
    TextureParameter, UniformData,
};
pub use segments::{content_hash, AssembledProgram, Segment, ShaderSegments};
pub use text::{GpuShaderText, TextureInfo, IN_PIXEL};
pub use wrapper::{ClassWrapper, ShaderWrapper, CLASS_WRAPPER_NAME};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_start_example() {
        let desc = GpuShaderDesc::new();
        desc.set_language(GpuLanguage::HlslDx11);
        desc.add_to_declarations("uniform float ocio_exposure;\n");
        desc.add_to_function_body("  outColor.rgb *= exp2(ocio_exposure);\n");
        desc.add_dynamic_property(DynamicProperty::new(DynamicPropertyType::Exposure, 0.0))
            .unwrap();
        desc.finalize();

        let text = desc.shader_text();
        let decl = text.find("uniform float ocio_exposure;").unwrap();
        let body = text.find("exp2(ocio_exposure)").unwrap();
        assert!(decl < body);
        assert!(desc.cache_key().ends_with(&desc.content_hash()));
    }

    #[test]
    fn language_change_keeps_properties() {
        let desc = GpuShaderDesc::new();
        desc.add_dynamic_property(DynamicProperty::new(DynamicPropertyType::Contrast, 1.0))
            .unwrap();
        desc.set_language(GpuLanguage::Osl1);
        desc.set_language(GpuLanguage::Cg);
        assert!(desc.has_dynamic_property(DynamicPropertyType::Contrast));
        assert_eq!(desc.num_dynamic_properties(), 1);
    }
}
