// Connection - instance creation
//
// Turns a validated request into a Vulkan instance.

use std::ffi::{c_char, CString};

use ash::vk;

use super::capability::RequestedCapabilitySet;
use crate::backend::Backend;
use crate::error::GfxError;

/// Application and engine identity reported to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,
    pub api_version: u32,
}

impl AppIdentity {
    pub fn new(application_name: &str, engine_name: &str) -> Result<Self, GfxError> {
        Ok(Self {
            application_name: c_name("application name", application_name)?,
            engine_name: c_name("engine name", engine_name)?,
            ..Self::default()
        })
    }
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            application_name: c"prism".to_owned(),
            application_version: vk::make_api_version(0, 0, 1, 0),
            engine_name: c"prism".to_owned(),
            engine_version: vk::make_api_version(0, 0, 1, 0),
            api_version: vk::API_VERSION_1_1,
        }
    }
}

pub(crate) fn c_name(what: &'static str, name: &str) -> Result<CString, GfxError> {
    CString::new(name).map_err(|_| GfxError::InvalidName {
        what,
        name: name.to_string(),
    })
}

/// Creates the instance with exactly the requested extensions and layers.
///
/// The request must already have been validated.
pub fn connect<B: Backend>(
    backend: &mut B,
    identity: &AppIdentity,
    requested: &RequestedCapabilitySet,
) -> Result<(), GfxError> {
    let app_info = vk::ApplicationInfo::default()
        .application_name(&identity.application_name)
        .application_version(identity.application_version)
        .engine_name(&identity.engine_name)
        .engine_version(identity.engine_version)
        .api_version(identity.api_version);

    let extension_names: Vec<*const c_char> =
        requested.extensions.iter().map(|name| name.as_ptr()).collect();
    let layer_names: Vec<*const c_char> =
        requested.layers.iter().map(|name| name.as_ptr()).collect();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names);

    backend
        .create_instance(&create_info)
        .map_err(GfxError::ConnectionCreationFailed)?;

    log::info!(
        "Created instance for {:?} ({} extension(s), {} layer(s))",
        identity.application_name,
        extension_names.len(),
        layer_names.len()
    );

    Ok(())
}
