//! Language-specific wrapper text.
//!
//! Some languages cannot use the accumulated fragments as a standalone
//! program. [`ShaderWrapper`] has one variant per [`WrapperFamily`] and turns
//! the registered resources into a header placed before the declarations and
//! a footer placed after the function footer. Segments are never modified,
//! so building the wrapper twice yields the same text.

use tracing::{trace, warn};

use crate::language::{GpuLanguage, WrapperFamily};
use crate::resources::{ResourceLedger, TextureParameter};
use crate::text::{GpuShaderText, TextureInfo};

/// Name of the Metal wrapper type.
pub const CLASS_WRAPPER_NAME: &str = "OCIO";

const CLASS_HEADER_BANNER: &str = "\n// Declaration of class wrapper\n\n";
const CLASS_FOOTER_BANNER: &str = "\n// close class wrapper\n\n";

/// Inputs the wrapper needs from the shader description.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WrapContext<'a> {
    pub language: GpuLanguage,
    pub function_name: &'a str,
    pub resources: &'a ResourceLedger,
}

/// Text placed around the assembled segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WrapperText {
    pub header: String,
    pub footer: String,
}

/// Wrapper state for the active language.
#[derive(Debug, Clone, Default)]
pub enum ShaderWrapper {
    /// Fragments are used as-is.
    #[default]
    None,
    /// Function enclosed in a resource-holding type.
    ClassWrap(ClassWrapper),
    /// Function called from a shader entry point.
    EntryWrap,
}

impl ShaderWrapper {
    /// Fresh wrapper state for `language`.
    pub fn for_language(language: GpuLanguage) -> Self {
        match language.wrapper_family() {
            WrapperFamily::None => ShaderWrapper::None,
            WrapperFamily::ClassWrap => ShaderWrapper::ClassWrap(ClassWrapper::default()),
            WrapperFamily::EntryWrap => ShaderWrapper::EntryWrap,
        }
    }

    /// Function parameters collected by the last build (class wrap only).
    pub fn parameters(&self) -> &[TextureParameter] {
        match self {
            ShaderWrapper::ClassWrap(class) => &class.params,
            _ => &[],
        }
    }

    pub(crate) fn build(&mut self, ctx: &WrapContext<'_>) -> WrapperText {
        match self {
            ShaderWrapper::None => WrapperText::default(),
            ShaderWrapper::ClassWrap(class) => class.build(ctx),
            ShaderWrapper::EntryWrap => entry_wrapper(ctx),
        }
    }
}

/// Class wrapping state: the resource parameter list and the text built
/// from it.
#[derive(Debug, Clone, Default)]
pub struct ClassWrapper {
    params: Vec<TextureParameter>,
    header: String,
    footer: String,
}

impl ClassWrapper {
    fn add_parameter(&mut self, type_name: impl Into<String>, name: impl Into<String>) {
        self.params.push(TextureParameter::new(type_name, name));
    }

    fn add_header(&mut self, code: &str) {
        if self.header.is_empty() {
            self.header.push_str(CLASS_HEADER_BANNER);
        }
        self.header.push_str(code);
    }

    fn add_footer(&mut self, code: &str) {
        if self.footer.is_empty() {
            self.footer.push_str(CLASS_FOOTER_BANNER);
        }
        self.footer.push_str(code);
    }

    fn build(&mut self, ctx: &WrapContext<'_>) -> WrapperText {
        self.params.clear();
        self.header.clear();
        self.footer.clear();

        let textures = ctx
            .resources
            .textures_3d()
            .iter()
            .chain(ctx.resources.textures());
        for tex in textures {
            let tex_type = GpuShaderText::texture_type(ctx.language, tex.texture_type);
            self.add_parameter(tex_type, tex.name.as_str());
            self.add_parameter(TextureParameter::SAMPLER, GpuShaderText::sampler_name(&tex.name));
        }

        let ss = GpuShaderText::new(ctx.language);
        let infos = self.texture_infos(&ss);
        if !ss.has_class_wrapper(infos.len()) {
            trace!(language = %ctx.language, "no class wrapper required");
            return WrapperText::default();
        }

        let mut header = GpuShaderText::new(ctx.language);
        header.new_line();
        header.class_wrapper_header(CLASS_WRAPPER_NAME, &infos);
        header.new_line();
        self.add_header(header.as_str());

        let mut footer = GpuShaderText::new(ctx.language);
        footer.new_line();
        footer.class_wrapper_footer(CLASS_WRAPPER_NAME, &infos, ctx.function_name);
        self.add_footer(footer.as_str());

        trace!(textures = infos.len(), "class wrapper built");
        WrapperText {
            header: self.header.clone(),
            footer: self.footer.clone(),
        }
    }

    fn texture_infos(&self, ss: &GpuShaderText) -> Vec<TextureInfo> {
        self.params
            .iter()
            .filter(|p| !p.is_sampler())
            .filter_map(|p| match ss.dimensions(&p.type_name) {
                Some(dimensions) => Some(TextureInfo {
                    name: p.name.clone(),
                    dimensions,
                }),
                None => {
                    warn!(param = %p.name, type_name = %p.type_name, "unknown texture type, skipped");
                    None
                }
            })
            .collect()
    }
}

const OSL_HELPERS: &[(&str, &str)] = &[
    (
        "vector4 __operator__mul__(vector4 v, matrix m)",
        "return vector4(v.x * m[0][0] + v.y * m[1][0] + v.z * m[2][0] + v.w * m[3][0], \
         v.x * m[0][1] + v.y * m[1][1] + v.z * m[2][1] + v.w * m[3][1], \
         v.x * m[0][2] + v.y * m[1][2] + v.z * m[2][2] + v.w * m[3][2], \
         v.x * m[0][3] + v.y * m[1][3] + v.z * m[2][3] + v.w * m[3][3]);",
    ),
    (
        "vector4 __operator__mul__(color4 c, vector4 v)",
        "return vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a) * v;",
    ),
    (
        "vector4 __operator__mul__(vector4 v, color4 c)",
        "return v * vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a);",
    ),
    (
        "vector4 __operator__sub__(color4 c, vector4 v)",
        "return vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a) - v;",
    ),
    (
        "vector4 __operator__add__(vector4 v, color4 c)",
        "return v + vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a);",
    ),
    (
        "vector4 __operator__add__(color4 c, vector4 v)",
        "return vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a) + v;",
    ),
    (
        "vector4 pow(color4 c, vector4 v)",
        "return pow(vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a), v);",
    ),
    (
        "vector4 max(vector4 v, color4 c)",
        "return max(v, vector4(c.rgb.r, c.rgb.g, c.rgb.b, c.a));",
    ),
];

/// OSL shader entry point around the generated function.
fn entry_wrapper(ctx: &WrapContext<'_>) -> WrapperText {
    let mut kw = GpuShaderText::new(ctx.language);
    kw.new_line();
    kw.line("/* All the includes */");
    kw.new_line();
    kw.line("#include \"vector4.h\"");
    kw.line("#include \"color4.h\"");
    kw.new_line();
    kw.line("/* All the generic helper methods */");

    for (signature, body) in OSL_HELPERS {
        kw.new_line();
        kw.line(signature).line("{");
        kw.indent().line(body).dedent();
        kw.line("}");
    }

    kw.new_line();
    kw.line("/* The shader implementation */");
    kw.new_line();
    kw.line(format!(
        "shader OSL_{}(color4 inColor = {{color(0), 1}}, output color4 outColor = {{color(0), 1}})",
        ctx.function_name
    ));
    kw.line("{");

    let mut footer = GpuShaderText::new(ctx.language);
    footer.new_line();
    footer.line(format!("outColor = {}(inColor);", ctx.function_name));
    footer.line("}");

    WrapperText {
        header: kw.into_string(),
        footer: footer.into_string(),
    }
}
