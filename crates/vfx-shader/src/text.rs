//! Line-oriented shader text builder with per-language syntax queries.
//!
//! [`GpuShaderText`] accumulates indented lines for one target language and
//! knows the language-specific spelling of texture types, sampler names and
//! the Metal class wrapper.
//!
//! ```
//! use vfx_shader::{GpuLanguage, GpuShaderText};
//!
//! let mut ss = GpuShaderText::new(GpuLanguage::Glsl4_0);
//! ss.line("vec4 f(vec4 c)").line("{");
//! ss.indent().line("return c;").dedent().line("}");
//! assert_eq!(ss.as_str(), "vec4 f(vec4 c)\n{\n  return c;\n}\n");
//! ```

use crate::language::{GpuLanguage, WrapperFamily};
use crate::resources::GpuTextureType;

const INDENT: &str = "  ";

/// Pixel parameter name used by wrapper entry points.
pub const IN_PIXEL: &str = "inPixel";

/// Texture name and dimensionality, as needed by class wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Texture parameter name.
    pub name: String,
    /// Dimensionality.
    pub dimensions: GpuTextureType,
}

/// Shader source builder bound to a language.
#[derive(Debug, Clone)]
pub struct GpuShaderText {
    language: GpuLanguage,
    buf: String,
    indent: usize,
}

impl GpuShaderText {
    /// Creates an empty builder.
    pub fn new(language: GpuLanguage) -> Self {
        Self {
            language,
            buf: String::new(),
            indent: 0,
        }
    }

    /// Target language.
    pub fn language(&self) -> GpuLanguage {
        self.language
    }

    /// Appends one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    /// Appends an empty line.
    pub fn new_line(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Increases indentation for following lines.
    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    /// Decreases indentation for following lines.
    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Appends raw text, ignoring indentation.
    pub fn push_str(&mut self, raw: &str) -> &mut Self {
        self.buf.push_str(raw);
        self
    }

    /// Text built so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consumes the builder.
    pub fn into_string(self) -> String {
        self.buf
    }

    /// Texture type spelling for `dims` in `language`.
    pub fn texture_type(language: GpuLanguage, dims: GpuTextureType) -> String {
        let n = dims.dimensions();
        match language {
            GpuLanguage::MslMetal => format!("texture{n}d<float>"),
            GpuLanguage::HlslDx11 => format!("Texture{n}D"),
            // No 1D textures in GLSL ES.
            GpuLanguage::GlslEs1_0 | GpuLanguage::GlslEs3_0 if n == 1 => "sampler2D".to_string(),
            GpuLanguage::Osl1 => "string".to_string(),
            _ => format!("sampler{n}D"),
        }
    }

    /// Sampler name paired with a texture.
    pub fn sampler_name(texture_name: &str) -> String {
        format!("{texture_name}Sampler")
    }

    /// Maps a declared parameter type back to its dimensionality.
    pub fn dimensions(&self, type_name: &str) -> Option<GpuTextureType> {
        [
            GpuTextureType::Texture1D,
            GpuTextureType::Texture2D,
            GpuTextureType::Texture3D,
        ]
        .into_iter()
        .find(|&dims| Self::texture_type(self.language, dims) == type_name)
    }

    /// Whether the language mandates a class wrapper for this many textures.
    ///
    /// A resource-free Metal function is callable as-is.
    pub fn has_class_wrapper(&self, num_textures: usize) -> bool {
        self.language.wrapper_family() == WrapperFamily::ClassWrap && num_textures > 0
    }

    /// Writes the opening of a wrapper type whose constructor takes every
    /// texture and its sampler.
    pub fn class_wrapper_header(&mut self, class_name: &str, textures: &[TextureInfo]) -> &mut Self {
        let params = self.parameter_list(textures);

        self.line(format!("struct {class_name}"));
        self.line("{");
        self.line(format!("{class_name}({params})"));
        self.line("{");
        self.indent();
        for tex in textures {
            let sampler = Self::sampler_name(&tex.name);
            self.line(format!("this->{0} = {0};", tex.name));
            self.line(format!("this->{0} = {0};", sampler));
        }
        self.dedent();
        self.line("}");
        self
    }

    /// Writes the closing of the wrapper type plus a free entry function that
    /// forwards the same textures, in the same order, to `function_name`.
    pub fn class_wrapper_footer(
        &mut self,
        class_name: &str,
        textures: &[TextureInfo],
        function_name: &str,
    ) -> &mut Self {
        let mut params = self.parameter_list(textures);
        if !params.is_empty() {
            params.push_str(", ");
        }
        let args = textures
            .iter()
            .flat_map(|tex| [tex.name.clone(), Self::sampler_name(&tex.name)])
            .collect::<Vec<_>>()
            .join(", ");

        self.line("};");
        self.new_line();
        self.line(format!("float4 {function_name}({params}float4 {IN_PIXEL})"));
        self.line("{");
        self.indent();
        self.line(format!(
            "return {class_name}({args}).{function_name}({IN_PIXEL});"
        ));
        self.dedent();
        self.line("}");
        self
    }

    fn parameter_list(&self, textures: &[TextureInfo]) -> String {
        textures
            .iter()
            .map(|tex| {
                format!(
                    "{} {}, sampler {}",
                    Self::texture_type(self.language, tex.dimensions),
                    tex.name,
                    Self::sampler_name(&tex.name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
