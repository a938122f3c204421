//! Shader description: fragment accumulation, assembly and cache identity.
//!
//! A [`GpuShaderDesc`] is filled by one producer (the color pipeline) and read
//! by any number of consumers. All state sits behind a single lock, so an
//! identity query never observes a half-applied mutation and `finalize` is
//! serialized with everything else.
//!
//! The cache key is versioned: every identity mutation bumps a generation
//! counter, and the stored key remembers the generation it was computed for.
//! A stale key is recomputed on the next query.
//!
//! # Example
//!
//! ```
//! use vfx_shader::{GpuLanguage, GpuShaderDesc};
//!
//! let desc = GpuShaderDesc::new();
//! desc.set_language(GpuLanguage::Glsl4_0);
//! desc.add_to_function_header("vec4 OCIOMain(vec4 inPixel)\n{\n  vec4 outColor = inPixel;\n");
//! desc.add_to_function_body("  outColor.rgb *= 2.0;\n");
//! desc.add_to_function_footer("  return outColor;\n}\n");
//! desc.finalize();
//!
//! assert!(desc.shader_text().contains("outColor.rgb *= 2.0;"));
//! assert!(desc.cache_key().starts_with("glsl_4.0 OCIOMain ocio outColor 0 "));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dynamic::{DynamicProperties, DynamicPropertyRc, DynamicPropertyType};
use crate::error::ShaderResult;
use crate::language::GpuLanguage;
use crate::options::GpuShaderOptions;
use crate::resources::{
    at, GpuInterpolation, GpuTexture, GpuUniform, ResourceLedger, TextureChannel,
    TextureParameter, UniformData,
};
use crate::segments::{AssembledProgram, Segment, ShaderSegments};
use crate::wrapper::{ShaderWrapper, WrapContext};

/// Entry function name Metal hosts expect.
pub const METAL_FUNCTION_NAME: &str = "Display";

/// Collapses runs of underscores so generated names never contain `__`,
/// which GLSL reserves.
fn sanitize_name(name: &str) -> String {
    let mut out = name.to_string();
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out
}

#[derive(Debug, Clone)]
struct Identity {
    uid: String,
    language: GpuLanguage,
    function_name: String,
    resource_prefix: String,
    pixel_name: String,
}

impl From<&GpuShaderOptions> for Identity {
    fn from(opts: &GpuShaderOptions) -> Self {
        Self {
            uid: opts.uid.clone(),
            language: opts.language,
            function_name: sanitize_name(&opts.function_name),
            resource_prefix: sanitize_name(&opts.resource_prefix),
            pixel_name: sanitize_name(&opts.pixel_name),
        }
    }
}

/// Cache key stamped with the generation it describes.
#[derive(Debug, Clone)]
struct CachedKey {
    generation: u64,
    key: Arc<str>,
}

#[derive(Debug)]
struct ShaderState {
    identity: Identity,
    generation: u64,
    cache_key: Option<CachedKey>,
    segments: ShaderSegments,
    wrapper: ShaderWrapper,
    resources: ResourceLedger,
    properties: DynamicProperties,
    program: Option<AssembledProgram>,
}

impl ShaderState {
    fn new(identity: Identity) -> Self {
        Self {
            wrapper: ShaderWrapper::for_language(identity.language),
            identity,
            generation: 0,
            cache_key: None,
            segments: ShaderSegments::new(),
            resources: ResourceLedger::new(),
            properties: DynamicProperties::new(),
            program: None,
        }
    }

    /// Marks the cached key stale.
    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn set_language(&mut self, language: GpuLanguage) {
        self.identity.language = language;
        self.wrapper = ShaderWrapper::for_language(language);
        if language == GpuLanguage::MslMetal {
            self.identity.function_name = METAL_FUNCTION_NAME.to_string();
        }
        trace!(%language, function = %self.identity.function_name, "shader language set");
        self.touch();
    }

    fn cache_key(&mut self) -> Arc<str> {
        if let Some(cached) = &self.cache_key {
            if cached.generation == self.generation {
                return Arc::clone(&cached.key);
            }
        }

        let id = &self.identity;
        let hash = self.program.as_ref().map_or("", AssembledProgram::hash);
        let key: Arc<str> = format!(
            "{} {} {} {} {} {}",
            id.language,
            id.function_name,
            id.resource_prefix,
            id.pixel_name,
            self.resources.num_resources(),
            hash
        )
        .into();

        self.cache_key = Some(CachedKey {
            generation: self.generation,
            key: Arc::clone(&key),
        });
        key
    }

    fn finalize(&mut self) {
        self.program = None;

        let ctx = WrapContext {
            language: self.identity.language,
            function_name: &self.identity.function_name,
            resources: &self.resources,
        };
        let wrap = self.wrapper.build(&ctx);
        let program = AssembledProgram::new(self.segments.assemble(&wrap.header, &wrap.footer));

        debug!(
            language = %self.identity.language,
            hash = %program.short_hash(),
            "GPU fragment shader program\n{}",
            program.text()
        );

        self.program = Some(program);
        self.touch();
    }
}

/// Accumulates shader fragments and assembles them into a program for one
/// target language.
#[derive(Debug)]
pub struct GpuShaderDesc {
    state: Mutex<ShaderState>,
}

impl Default for GpuShaderDesc {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GpuShaderDesc {
    /// Copies identity, fragments, resources and dynamic properties. The
    /// assembled program is not copied: the clone must be finalized itself.
    fn clone(&self) -> Self {
        let state = self.state.lock();
        Self {
            state: Mutex::new(ShaderState {
                identity: state.identity.clone(),
                generation: state.generation,
                cache_key: None,
                segments: state.segments.clone(),
                wrapper: ShaderWrapper::for_language(state.identity.language),
                resources: state.resources.clone(),
                properties: state.properties.clone(),
                program: None,
            }),
        }
    }
}

impl GpuShaderDesc {
    /// Creates a description with default options.
    pub fn new() -> Self {
        Self::with_options(&GpuShaderOptions::default())
    }

    /// Creates a description from options.
    ///
    /// Names are sanitized and language-specific setup applies exactly as
    /// with the individual setters; in particular Metal forces the
    /// [`METAL_FUNCTION_NAME`] entry name.
    pub fn with_options(opts: &GpuShaderOptions) -> Self {
        let mut state = ShaderState::new(Identity::from(opts));
        state.set_language(opts.language);
        Self {
            state: Mutex::new(state),
        }
    }

    // --- Identity ---

    /// Sets the producer-assigned unique id.
    pub fn set_unique_id(&self, uid: &str) {
        let mut state = self.state.lock();
        state.identity.uid = uid.to_string();
        state.touch();
    }

    /// Producer-assigned unique id (empty if unset).
    pub fn unique_id(&self) -> String {
        self.state.lock().identity.uid.clone()
    }

    /// Sets the target language.
    ///
    /// Always replaces the language wrapper state; dynamic properties,
    /// resources and fragments are kept.
    pub fn set_language(&self, language: GpuLanguage) {
        self.state.lock().set_language(language);
    }

    /// Target language.
    pub fn language(&self) -> GpuLanguage {
        self.state.lock().identity.language
    }

    /// Sets the entry function name. `__` is collapsed to `_`.
    pub fn set_function_name(&self, name: &str) {
        let mut state = self.state.lock();
        state.identity.function_name = sanitize_name(name);
        state.touch();
    }

    /// Entry function name.
    pub fn function_name(&self) -> String {
        self.state.lock().identity.function_name.clone()
    }

    /// Sets the resource name prefix. `__` is collapsed to `_`.
    pub fn set_resource_prefix(&self, prefix: &str) {
        let mut state = self.state.lock();
        state.identity.resource_prefix = sanitize_name(prefix);
        state.touch();
    }

    /// Resource name prefix.
    pub fn resource_prefix(&self) -> String {
        self.state.lock().identity.resource_prefix.clone()
    }

    /// Sets the output pixel variable name. `__` is collapsed to `_`.
    pub fn set_pixel_name(&self, name: &str) {
        let mut state = self.state.lock();
        state.identity.pixel_name = sanitize_name(name);
        state.touch();
    }

    /// Output pixel variable name.
    pub fn pixel_name(&self) -> String {
        self.state.lock().identity.pixel_name.clone()
    }

    /// Current options, e.g. for persisting the configuration.
    pub fn options(&self) -> GpuShaderOptions {
        let state = self.state.lock();
        let id = &state.identity;
        GpuShaderOptions {
            uid: id.uid.clone(),
            language: id.language,
            function_name: id.function_name.clone(),
            resource_prefix: id.resource_prefix.clone(),
            pixel_name: id.pixel_name.clone(),
        }
    }

    /// Identity generation; changes whenever the cache key may change.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Cache key: `language function prefix pixel resources hash`.
    ///
    /// The hash is the content hash of the last finalized program (empty
    /// before the first [`finalize`](Self::finalize)). Repeated calls without
    /// an intervening mutation return the same allocation.
    pub fn cache_key(&self) -> Arc<str> {
        self.state.lock().cache_key()
    }

    // --- Resources ---

    /// Returns the next resource index: 0, 1, 2, ...
    pub fn allocate_resource_index(&self) -> u32 {
        let mut state = self.state.lock();
        let index = state.resources.allocate();
        state.touch();
        index
    }

    /// Number of resource indices allocated so far.
    pub fn num_resources(&self) -> u32 {
        self.state.lock().resources.num_resources()
    }

    /// Registers a 1D/2D texture. See [`ResourceLedger::add_texture`].
    #[allow(clippy::too_many_arguments)]
    pub fn add_texture(
        &self,
        name: &str,
        sampler_name: &str,
        width: u32,
        height: u32,
        channel: TextureChannel,
        interpolation: GpuInterpolation,
        values: Vec<f32>,
    ) -> ShaderResult<u32> {
        let mut state = self.state.lock();
        let index = state.resources.add_texture(
            name,
            sampler_name,
            width,
            height,
            channel,
            interpolation,
            values,
        )?;
        state.touch();
        Ok(index)
    }

    /// Registers a 3D texture. See [`ResourceLedger::add_3d_texture`].
    pub fn add_3d_texture(
        &self,
        name: &str,
        sampler_name: &str,
        edge_len: u32,
        interpolation: GpuInterpolation,
        values: Vec<f32>,
    ) -> ShaderResult<u32> {
        let mut state = self.state.lock();
        let index =
            state
                .resources
                .add_3d_texture(name, sampler_name, edge_len, interpolation, values)?;
        state.touch();
        Ok(index)
    }

    /// Number of 1D/2D textures.
    pub fn num_textures(&self) -> usize {
        self.state.lock().resources.textures().len()
    }

    /// 1D/2D texture at `index`.
    pub fn texture(&self, index: usize) -> ShaderResult<Arc<GpuTexture>> {
        at(self.state.lock().resources.textures(), index)
    }

    /// Number of 3D textures.
    pub fn num_3d_textures(&self) -> usize {
        self.state.lock().resources.textures_3d().len()
    }

    /// 3D texture at `index`.
    pub fn texture_3d(&self, index: usize) -> ShaderResult<Arc<GpuTexture>> {
        at(self.state.lock().resources.textures_3d(), index)
    }

    /// Registers a uniform. Returns false if the name is already used.
    pub fn add_uniform(&self, name: &str, data: UniformData) -> bool {
        self.state.lock().resources.add_uniform(name, data)
    }

    /// Number of uniforms.
    pub fn num_uniforms(&self) -> usize {
        self.state.lock().resources.uniforms().len()
    }

    /// Uniform at `index`.
    pub fn uniform(&self, index: usize) -> ShaderResult<GpuUniform> {
        at(self.state.lock().resources.uniforms(), index)
    }

    /// Class-wrap parameters built by the last finalize.
    pub fn wrapper_parameters(&self) -> Vec<TextureParameter> {
        self.state.lock().wrapper.parameters().to_vec()
    }

    // --- Dynamic properties ---

    /// Returns true if a property of this kind is registered.
    pub fn has_dynamic_property(&self, kind: DynamicPropertyType) -> bool {
        self.state.lock().properties.has(kind)
    }

    /// Registers a dynamic property; fails on a duplicate kind.
    pub fn add_dynamic_property(&self, prop: DynamicPropertyRc) -> ShaderResult<()> {
        self.state.lock().properties.add(prop)
    }

    /// Number of dynamic properties.
    pub fn num_dynamic_properties(&self) -> usize {
        self.state.lock().properties.len()
    }

    /// Dynamic property at `index` in registration order.
    pub fn dynamic_property(&self, index: usize) -> ShaderResult<DynamicPropertyRc> {
        self.state.lock().properties.get(index)
    }

    /// Dynamic property of the given kind.
    pub fn dynamic_property_by_kind(
        &self,
        kind: DynamicPropertyType,
    ) -> ShaderResult<DynamicPropertyRc> {
        self.state.lock().properties.get_by_kind(kind)
    }

    // --- Fragments ---

    /// Appends a fragment to `segment`. Empty fragments are ignored.
    ///
    /// The assembled program does not change until the next finalize.
    pub fn add_to(&self, segment: Segment, code: &str) {
        self.state.lock().segments.append(segment, code);
    }

    /// Appends to the global declarations.
    pub fn add_to_declarations(&self, code: &str) {
        self.add_to(Segment::Declarations, code);
    }

    /// Appends to the helper functions.
    pub fn add_to_helpers(&self, code: &str) {
        self.add_to(Segment::Helpers, code);
    }

    /// Appends to the main function header.
    pub fn add_to_function_header(&self, code: &str) {
        self.add_to(Segment::FunctionHeader, code);
    }

    /// Appends to the main function body.
    pub fn add_to_function_body(&self, code: &str) {
        self.add_to(Segment::FunctionBody, code);
    }

    /// Appends to the main function footer.
    pub fn add_to_function_footer(&self, code: &str) {
        self.add_to(Segment::FunctionFooter, code);
    }

    /// Current text of one segment, banner included.
    pub fn segment(&self, segment: Segment) -> String {
        self.state.lock().segments.get(segment).to_string()
    }

    // --- Assembly ---

    /// Assembles wrapper header, segments and wrapper footer into the
    /// program text, hashes it and invalidates the cache key.
    ///
    /// Never fails: with no fragments the program is just the wrapper text
    /// (possibly empty).
    pub fn finalize(&self) {
        self.state.lock().finalize();
    }

    /// Program text from the last finalize (empty before the first one).
    pub fn shader_text(&self) -> Arc<str> {
        self.state
            .lock()
            .program
            .as_ref()
            .map_or_else(|| Arc::from(""), AssembledProgram::shared_text)
    }

    /// Content hash of the last finalized program (empty before the first).
    pub fn content_hash(&self) -> String {
        self.state
            .lock()
            .program
            .as_ref()
            .map(|p| p.hash().to_string())
            .unwrap_or_default()
    }

    /// Returns true once finalize has run on this object.
    pub fn is_finalized(&self) -> bool {
        self.state.lock().program.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynamicProperty;
    use crate::error::ShaderError;

    #[test]
    fn defaults() {
        let desc = GpuShaderDesc::new();
        assert_eq!(desc.language(), GpuLanguage::Glsl1_2);
        assert_eq!(desc.function_name(), "OCIOMain");
        assert_eq!(desc.resource_prefix(), "ocio");
        assert_eq!(desc.pixel_name(), "outColor");
        assert_eq!(desc.unique_id(), "");
        assert_eq!(&*desc.shader_text(), "");
        assert!(!desc.is_finalized());
    }

    #[test]
    fn names_sanitized() {
        let desc = GpuShaderDesc::new();
        desc.set_function_name("my__func");
        desc.set_resource_prefix("pre___fix");
        desc.set_pixel_name("__px");
        assert_eq!(desc.function_name(), "my_func");
        assert_eq!(desc.resource_prefix(), "pre_fix");
        assert_eq!(desc.pixel_name(), "_px");
    }

    #[test]
    fn cache_key_format() {
        let desc = GpuShaderDesc::new();
        assert_eq!(&*desc.cache_key(), "glsl_1.2 OCIOMain ocio outColor 0 ");

        desc.allocate_resource_index();
        desc.finalize();
        let key = desc.cache_key();
        let expected = format!("glsl_1.2 OCIOMain ocio outColor 1 {}", desc.content_hash());
        assert_eq!(&*key, expected);
    }

    #[test]
    fn cache_key_reused_until_mutation() {
        let desc = GpuShaderDesc::new();
        let a = desc.cache_key();
        let b = desc.cache_key();
        assert!(Arc::ptr_eq(&a, &b));

        desc.set_pixel_name("result");
        let c = desc.cache_key();
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(c.contains(" result "));
    }

    #[test]
    fn setters_bump_generation() {
        let desc = GpuShaderDesc::new();
        let g0 = desc.generation();
        desc.set_unique_id("x");
        desc.set_resource_prefix("p");
        assert_eq!(desc.generation(), g0 + 2);

        // fragments alone do not change the key
        desc.add_to_function_body("x;\n");
        assert_eq!(desc.generation(), g0 + 2);
    }

    #[test]
    fn uid_not_part_of_key() {
        let desc = GpuShaderDesc::new();
        let before = desc.cache_key();
        desc.set_unique_id("shot_010");
        assert_eq!(desc.unique_id(), "shot_010");
        assert_eq!(desc.cache_key(), before);
    }

    #[test]
    fn metal_overrides_function_name() {
        let desc = GpuShaderDesc::new();
        desc.set_function_name("Custom");
        desc.set_language(GpuLanguage::MslMetal);
        assert_eq!(desc.function_name(), METAL_FUNCTION_NAME);

        // later renames are honored
        desc.set_function_name("Custom");
        assert_eq!(desc.function_name(), "Custom");
    }

    #[test]
    fn options_applied_through_setters() {
        let opts = GpuShaderOptions {
            language: GpuLanguage::MslMetal,
            resource_prefix: "my__prefix".into(),
            ..Default::default()
        };
        let desc = GpuShaderDesc::with_options(&opts);
        assert_eq!(desc.function_name(), METAL_FUNCTION_NAME);
        assert_eq!(desc.resource_prefix(), "my_prefix");
        assert_eq!(desc.options().language, GpuLanguage::MslMetal);
    }

    #[test]
    fn dynamic_property_errors() {
        let desc = GpuShaderDesc::new();
        desc.add_dynamic_property(DynamicProperty::new(DynamicPropertyType::Exposure, 0.0))
            .unwrap();
        assert!(matches!(
            desc.add_dynamic_property(DynamicProperty::new(DynamicPropertyType::Exposure, 1.0)),
            Err(ShaderError::DuplicateKind { .. })
        ));
        assert!(matches!(
            desc.dynamic_property(1),
            Err(ShaderError::OutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            desc.dynamic_property_by_kind(DynamicPropertyType::Gamma),
            Err(ShaderError::NotFound { kind: DynamicPropertyType::Gamma })
        ));
    }

    #[test]
    fn finalize_twice_is_identical() {
        let desc = GpuShaderDesc::new();
        desc.set_language(GpuLanguage::Osl1);
        desc.add_to_declarations("float k = 1.0;\n");
        desc.finalize();
        let (text, key) = (desc.shader_text(), desc.cache_key());
        desc.finalize();
        assert_eq!(desc.shader_text(), text);
        assert_eq!(desc.cache_key(), key);
    }

    #[test]
    fn finalize_empty() {
        let desc = GpuShaderDesc::new();
        desc.finalize();
        assert_eq!(&*desc.shader_text(), "");
        assert_eq!(desc.content_hash().len(), 64);

        let metal = GpuShaderDesc::new();
        metal.set_language(GpuLanguage::MslMetal);
        metal.finalize();
        assert_eq!(&*metal.shader_text(), "");
        assert!(metal.wrapper_parameters().is_empty());
    }

    #[test]
    fn texture_registration_invalidates_key() {
        let desc = GpuShaderDesc::new();
        let g = desc.generation();
        desc.add_texture("t", "tSampler", 2, 1, TextureChannel::Red, GpuInterpolation::Linear, vec![0.0, 1.0])
            .unwrap();
        assert!(desc.generation() > g);
        assert_eq!(desc.texture(0).unwrap().name, "t");
        assert!(desc.texture(1).is_err());
        assert!(desc.texture_3d(0).is_err());
    }
}
