//! Textures, uniforms and resource slot counting.
//!
//! The [`ResourceLedger`] hands out resource indices and records the
//! textures and uniforms a generated shader needs. It does not know how the
//! resources are declared in source text; producers emit the declarations
//! themselves and the wrapper builder reads the ledger back when a language
//! needs explicit resource parameters.

use std::sync::Arc;

use crate::dynamic::DynamicPropertyRc;
use crate::error::{ShaderError, ShaderResult};

/// Texture type for GPU LUTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuTextureType {
    /// 1D texture (for 1D LUTs).
    Texture1D,
    /// 2D texture (for 1D LUT with channel separation).
    Texture2D,
    /// 3D texture (for 3D LUTs).
    Texture3D,
}

impl GpuTextureType {
    /// Number of dimensions.
    pub fn dimensions(&self) -> u32 {
        match self {
            GpuTextureType::Texture1D => 1,
            GpuTextureType::Texture2D => 2,
            GpuTextureType::Texture3D => 3,
        }
    }
}

/// Channel layout of texture values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureChannel {
    /// Single red channel.
    Red,
    /// Interleaved RGB.
    #[default]
    Rgb,
}

impl TextureChannel {
    /// Values per texel.
    pub fn count(&self) -> usize {
        match self {
            TextureChannel::Red => 1,
            TextureChannel::Rgb => 3,
        }
    }
}

/// Texture interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuInterpolation {
    /// Nearest neighbor.
    Nearest,
    /// Linear interpolation.
    #[default]
    Linear,
}

/// GPU texture requirement for LUT sampling.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    /// Texture name as declared in the shader.
    pub name: String,
    /// Sampler name as declared in the shader.
    pub sampler_name: String,
    /// Texture type.
    pub texture_type: GpuTextureType,
    /// Texture width (edge length for 3D textures).
    pub width: u32,
    /// Texture height (1 for 1D textures).
    pub height: u32,
    /// Texture depth (1 for 1D/2D textures).
    pub depth: u32,
    /// Channel layout.
    pub channel: TextureChannel,
    /// Interpolation mode.
    pub interpolation: GpuInterpolation,
    /// Texel values, `channel.count()` floats per texel.
    pub values: Vec<f32>,
}

/// Value source of a uniform.
#[derive(Debug, Clone)]
pub enum UniformData {
    /// Constant scalar.
    Double(f64),
    /// Constant 3-component vector.
    Vector3([f32; 3]),
    /// Scalar read from a dynamic property when the uniform is bound.
    Property(DynamicPropertyRc),
}

/// Shader uniform variable.
#[derive(Debug, Clone)]
pub struct GpuUniform {
    /// Uniform name.
    pub name: String,
    /// Value source.
    pub data: UniformData,
}

impl GpuUniform {
    /// Resolves the uniform to its current components.
    pub fn current_value(&self) -> Vec<f64> {
        match &self.data {
            UniformData::Double(v) => vec![*v],
            UniformData::Vector3(v) => v.iter().map(|&c| f64::from(c)).collect(),
            UniformData::Property(prop) => vec![prop.value()],
        }
    }
}

/// (type, name) pair passed to a class-wrapped function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureParameter {
    /// Declared parameter type, e.g. `texture3d<float>` or `sampler`.
    pub type_name: String,
    /// Parameter name.
    pub name: String,
}

impl TextureParameter {
    /// Type string of sampler parameters.
    pub const SAMPLER: &'static str = "sampler";

    /// Creates a parameter.
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Returns true for sampler parameters.
    pub fn is_sampler(&self) -> bool {
        self.type_name == Self::SAMPLER
    }
}

/// Resource slot counter plus registered textures and uniforms.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    next_index: u32,
    textures: Vec<Arc<GpuTexture>>,
    textures_3d: Vec<Arc<GpuTexture>>,
    uniforms: Vec<GpuUniform>,
}

impl ResourceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current counter value, then increments it.
    ///
    /// Indices are never reused.
    pub fn allocate(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Number of indices allocated so far.
    pub fn num_resources(&self) -> u32 {
        self.next_index
    }

    /// Registers a 1D or 2D texture (2D when `height > 1`).
    ///
    /// Returns the texture position among 1D/2D textures.
    #[allow(clippy::too_many_arguments)]
    pub fn add_texture(
        &mut self,
        name: &str,
        sampler_name: &str,
        width: u32,
        height: u32,
        channel: TextureChannel,
        interpolation: GpuInterpolation,
        values: Vec<f32>,
    ) -> ShaderResult<u32> {
        if width == 0 || height == 0 {
            return Err(invalid(name, format!("empty size {width}x{height}")));
        }
        let expected = width as usize * height as usize * channel.count();
        if values.len() != expected {
            return Err(invalid(
                name,
                format!("expected {expected} values, got {}", values.len()),
            ));
        }

        let texture_type = if height > 1 {
            GpuTextureType::Texture2D
        } else {
            GpuTextureType::Texture1D
        };
        self.textures.push(Arc::new(GpuTexture {
            name: name.to_string(),
            sampler_name: sampler_name.to_string(),
            texture_type,
            width,
            height,
            depth: 1,
            channel,
            interpolation,
            values,
        }));
        Ok(self.textures.len() as u32 - 1)
    }

    /// Registers an RGB 3D texture of `edge_len`³ texels.
    ///
    /// Returns the texture position among 3D textures.
    pub fn add_3d_texture(
        &mut self,
        name: &str,
        sampler_name: &str,
        edge_len: u32,
        interpolation: GpuInterpolation,
        values: Vec<f32>,
    ) -> ShaderResult<u32> {
        if edge_len < 2 {
            return Err(invalid(name, format!("edge length {edge_len} below 2")));
        }
        let edge = edge_len as usize;
        let expected = edge * edge * edge * 3;
        if values.len() != expected {
            return Err(invalid(
                name,
                format!("expected {expected} values, got {}", values.len()),
            ));
        }

        self.textures_3d.push(Arc::new(GpuTexture {
            name: name.to_string(),
            sampler_name: sampler_name.to_string(),
            texture_type: GpuTextureType::Texture3D,
            width: edge_len,
            height: edge_len,
            depth: edge_len,
            channel: TextureChannel::Rgb,
            interpolation,
            values,
        }));
        Ok(self.textures_3d.len() as u32 - 1)
    }

    /// 1D/2D textures in registration order.
    pub fn textures(&self) -> &[Arc<GpuTexture>] {
        &self.textures
    }

    /// 3D textures in registration order.
    pub fn textures_3d(&self) -> &[Arc<GpuTexture>] {
        &self.textures_3d
    }

    /// Registers a uniform. Returns false if the name is already taken.
    pub fn add_uniform(&mut self, name: &str, data: UniformData) -> bool {
        if self.uniforms.iter().any(|u| u.name == name) {
            return false;
        }
        self.uniforms.push(GpuUniform {
            name: name.to_string(),
            data,
        });
        true
    }

    /// Uniforms in registration order.
    pub fn uniforms(&self) -> &[GpuUniform] {
        &self.uniforms
    }
}

fn invalid(name: &str, reason: String) -> ShaderError {
    ShaderError::InvalidTexture {
        name: name.to_string(),
        reason,
    }
}

/// Indexed access shared by the texture and uniform accessors.
pub(crate) fn at<T: Clone>(items: &[T], index: usize) -> ShaderResult<T> {
    items.get(index).cloned().ok_or(ShaderError::OutOfRange {
        index,
        len: items.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{DynamicProperty, DynamicPropertyType};

    #[test]
    fn indices_are_sequential() {
        let mut ledger = ResourceLedger::new();
        let got: Vec<u32> = (0..5).map(|_| ledger.allocate()).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
        assert_eq!(ledger.num_resources(), 5);
    }

    #[test]
    fn texture_shape_checked() {
        let mut ledger = ResourceLedger::new();
        let idx = ledger
            .add_texture("lut1d_0", "lut1d_0Sampler", 4, 1, TextureChannel::Red,
                GpuInterpolation::Linear, vec![0.0; 4])
            .unwrap();
        assert_eq!(idx, 0);
        assert_eq!(ledger.textures()[0].texture_type, GpuTextureType::Texture1D);

        let idx = ledger
            .add_texture("lut1d_1", "lut1d_1Sampler", 4, 2, TextureChannel::Rgb,
                GpuInterpolation::Nearest, vec![0.0; 24])
            .unwrap();
        assert_eq!(idx, 1);
        assert_eq!(ledger.textures()[1].texture_type, GpuTextureType::Texture2D);

        let err = ledger
            .add_texture("bad", "badSampler", 4, 1, TextureChannel::Rgb,
                GpuInterpolation::Linear, vec![0.0; 4])
            .unwrap_err();
        assert!(matches!(err, ShaderError::InvalidTexture { ref name, .. } if name == "bad"));
        assert_eq!(ledger.textures().len(), 2);
    }

    #[test]
    fn texture_3d_shape_checked() {
        let mut ledger = ResourceLedger::new();
        ledger
            .add_3d_texture("lut3d_0", "lut3d_0Sampler", 2, GpuInterpolation::Linear, vec![0.5; 24])
            .unwrap();
        assert_eq!(ledger.textures_3d()[0].depth, 2);

        assert!(ledger
            .add_3d_texture("tiny", "tinySampler", 1, GpuInterpolation::Linear, vec![0.0; 3])
            .is_err());
    }

    #[test]
    fn uniform_names_unique() {
        let mut ledger = ResourceLedger::new();
        let prop = DynamicProperty::new(DynamicPropertyType::Exposure, 0.0);
        assert!(ledger.add_uniform("ocio_exposure", UniformData::Property(Arc::clone(&prop))));
        assert!(!ledger.add_uniform("ocio_exposure", UniformData::Double(1.0)));

        prop.set_value(2.0);
        assert_eq!(ledger.uniforms()[0].current_value(), vec![2.0]);
    }

    #[test]
    fn indexed_access() {
        let items = vec![1, 2];
        assert_eq!(at(&items, 1).unwrap(), 2);
        assert!(matches!(at(&items, 2), Err(ShaderError::OutOfRange { index: 2, len: 2 })));
    }
}
