//! Dynamic properties exposed by generated shaders.
//!
//! A dynamic property is a value slot declared while the shader is generated
//! and resolved later, when the consumer binds it to a uniform. Properties are
//! shared: the registry keeps one [`DynamicPropertyRc`] and consumers hold
//! clones of it, so a [`DynamicProperty::set_value`] from the application is
//! visible to every holder.
//!
//! # Example
//!
//! ```
//! use vfx_shader::{DynamicProperties, DynamicProperty, DynamicPropertyType};
//!
//! let mut props = DynamicProperties::new();
//! props.add(DynamicProperty::new(DynamicPropertyType::Exposure, 0.0)).unwrap();
//!
//! let exposure = props.get_by_kind(DynamicPropertyType::Exposure).unwrap();
//! exposure.set_value(1.5);
//! assert_eq!(props.get(0).unwrap().value(), 1.5);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ShaderError, ShaderResult};

/// Dynamic property types that can be adjusted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicPropertyType {
    /// Exposure adjustment (stops).
    Exposure,
    /// Contrast adjustment (multiplier around pivot).
    Contrast,
    /// Gamma adjustment (power).
    Gamma,
    /// Saturation adjustment (multiplier).
    Saturation,
    /// Look on/off switch (0 or 1).
    LookSwitch,
}

impl DynamicPropertyType {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicPropertyType::Exposure => "exposure",
            DynamicPropertyType::Contrast => "contrast",
            DynamicPropertyType::Gamma => "gamma",
            DynamicPropertyType::Saturation => "saturation",
            DynamicPropertyType::LookSwitch => "look_switch",
        }
    }
}

impl fmt::Display for DynamicPropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to a dynamic property.
pub type DynamicPropertyRc = Arc<DynamicProperty>;

/// A typed value slot bound to a runtime value by the consumer.
#[derive(Debug)]
pub struct DynamicProperty {
    kind: DynamicPropertyType,
    value: RwLock<f64>,
}

impl DynamicProperty {
    /// Creates a shared property with an initial value.
    pub fn new(kind: DynamicPropertyType, value: f64) -> DynamicPropertyRc {
        Arc::new(Self {
            kind,
            value: RwLock::new(value),
        })
    }

    /// Property kind.
    pub fn kind(&self) -> DynamicPropertyType {
        self.kind
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        *self.value.read()
    }

    /// Replaces the current value. Visible to every holder of the handle.
    pub fn set_value(&self, value: f64) {
        *self.value.write() = value;
    }
}

/// Registry holding at most one property per [`DynamicPropertyType`].
///
/// Indexed access follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct DynamicProperties {
    props: Vec<DynamicPropertyRc>,
}

impl DynamicProperties {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a property of this kind is registered.
    pub fn has(&self, kind: DynamicPropertyType) -> bool {
        self.props.iter().any(|p| p.kind() == kind)
    }

    /// Registers a property.
    ///
    /// Fails with [`ShaderError::DuplicateKind`] if the kind is already
    /// present; the existing property is left untouched.
    pub fn add(&mut self, prop: DynamicPropertyRc) -> ShaderResult<()> {
        if self.has(prop.kind()) {
            return Err(ShaderError::DuplicateKind { kind: prop.kind() });
        }
        self.props.push(prop);
        Ok(())
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Property at `index` in insertion order.
    pub fn get(&self, index: usize) -> ShaderResult<DynamicPropertyRc> {
        self.props
            .get(index)
            .cloned()
            .ok_or(ShaderError::OutOfRange {
                index,
                len: self.props.len(),
            })
    }

    /// Property of the given kind.
    pub fn get_by_kind(&self, kind: DynamicPropertyType) -> ShaderResult<DynamicPropertyRc> {
        self.props
            .iter()
            .find(|p| p.kind() == kind)
            .cloned()
            .ok_or(ShaderError::NotFound { kind })
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DynamicPropertyRc> {
        self.props.iter()
    }
}
