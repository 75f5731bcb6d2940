// Capability validation
//
// Every requested instance extension and layer must appear in what the
// driver reports, or nothing gets created.

use std::ffi::{CStr, CString};

use ash::vk;

use crate::backend::Backend;
use crate::error::{CapabilityKind, GfxError};

/// Extension and layer names the caller wants enabled, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedCapabilitySet {
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

impl RequestedCapabilitySet {
    /// Appends extension names, skipping ones already requested.
    pub fn add_extensions<I: IntoIterator<Item = CString>>(&mut self, names: I) {
        push_unique(&mut self.extensions, names);
    }

    /// Appends layer names, skipping ones already requested.
    pub fn add_layers<I: IntoIterator<Item = CString>>(&mut self, names: I) {
        push_unique(&mut self.layers, names);
    }
}

fn push_unique<I: IntoIterator<Item = CString>>(list: &mut Vec<CString>, names: I) {
    for name in names {
        if !list.contains(&name) {
            list.push(name);
        }
    }
}

/// Driver property records that carry a capability name.
pub trait CapabilityName {
    fn capability_name(&self) -> &CStr;
}

impl CapabilityName for vk::ExtensionProperties {
    fn capability_name(&self) -> &CStr {
        // The driver always NUL-terminates fixed-size name arrays.
        unsafe { CStr::from_ptr(self.extension_name.as_ptr()) }
    }
}

impl CapabilityName for vk::LayerProperties {
    fn capability_name(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.layer_name.as_ptr()) }
    }
}

/// Checks that each requested name is in `available`.
///
/// Fails on the first name that is missing. Every request is treated as
/// mandatory.
pub fn validate<P: CapabilityName>(
    kind: CapabilityKind,
    requested: &[CString],
    available: &[P],
) -> Result<(), GfxError> {
    for name in requested {
        let is_available = available
            .iter()
            .any(|props| props.capability_name() == name.as_c_str());

        if !is_available {
            return Err(GfxError::MissingCapability {
                kind,
                name: name.to_string_lossy().into_owned(),
            });
        }
    }

    Ok(())
}

/// Queries instance extensions and layers and validates the request
/// against them.
pub fn validate_requested<B: Backend>(
    backend: &B,
    requested: &RequestedCapabilitySet,
) -> Result<(), GfxError> {
    let extensions = backend
        .instance_extension_properties()
        .map_err(GfxError::query("instance extensions"))?;
    let layers = backend
        .instance_layer_properties()
        .map_err(GfxError::query("instance layers"))?;

    log_available(CapabilityKind::Extension, &extensions);
    log_available(CapabilityKind::Layer, &layers);

    validate(CapabilityKind::Extension, &requested.extensions, &extensions)?;
    validate(CapabilityKind::Layer, &requested.layers, &layers)
}

fn log_available<P: CapabilityName>(kind: CapabilityKind, available: &[P]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    log::debug!("available instance {}s: {}", kind, available.len());
    for props in available {
        log::debug!("    {}", props.capability_name().to_string_lossy());
    }
}
