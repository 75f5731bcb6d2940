// Device selection
//
// Physical devices are probed lazily in enumeration order and the first
// eligible one wins. Probing (driver queries) is kept apart from the
// selection policy so the policy can be exercised without a driver.

use std::ffi::CStr;

use ash::{khr, vk};

use super::capability::CapabilityName;
use crate::backend::Backend;
use crate::error::{Enumeration, GfxError};

/// What a surface offers on one physical device.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// A probed physical device. Probing stops at the first failed check, so
/// later fields keep their defaults for rejected devices.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub supports_swapchain: bool,
    pub surface: SurfaceSupport,
}

/// The physical device selected for rendering.
#[derive(Debug, Clone)]
pub struct RenderDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub surface: SurfaceSupport,
}

impl From<DeviceCandidate> for RenderDevice {
    fn from(candidate: DeviceCandidate) -> Self {
        Self {
            handle: candidate.handle,
            name: candidate.name,
            surface: candidate.surface,
        }
    }
}

/// Discrete GPU, swapchain extension, at least one surface format and one
/// present mode.
pub fn is_eligible(candidate: &DeviceCandidate) -> bool {
    candidate.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
        && candidate.supports_swapchain
        && !candidate.surface.formats.is_empty()
        && !candidate.surface.present_modes.is_empty()
}

/// First candidate satisfying `predicate`. Candidates after the match are
/// never pulled from the iterator.
pub fn select_device<C, I, P>(candidates: I, mut predicate: P) -> Option<C>
where
    I: IntoIterator<Item = C>,
    P: FnMut(&C) -> bool,
{
    candidates.into_iter().find(|candidate| predicate(candidate))
}

/// Runs the eligibility queries for one device, stopping at the first
/// failed check. Query errors count as a failed check.
pub fn probe<B: Backend>(
    backend: &B,
    handle: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> DeviceCandidate {
    let mut candidate = DeviceCandidate {
        handle,
        name: String::new(),
        device_type: vk::PhysicalDeviceType::OTHER,
        supports_swapchain: false,
        surface: SurfaceSupport::default(),
    };

    let properties = match backend.physical_device_properties(handle) {
        Ok(properties) => properties,
        Err(result) => {
            log::warn!("Failed to query properties of {:?}: {}", handle, result);
            return candidate;
        }
    };

    candidate.name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned();
    candidate.device_type = properties.device_type;

    if candidate.device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
        log::debug!("Rejecting {}: {:?} is not a discrete GPU", candidate.name, candidate.device_type);
        return candidate;
    }

    candidate.supports_swapchain = match backend.device_extension_properties(handle) {
        Ok(extensions) => extensions
            .iter()
            .any(|props| props.capability_name() == khr::swapchain::NAME),
        Err(result) => {
            log::warn!("Failed to query extensions of {}: {}", candidate.name, result);
            false
        }
    };

    if !candidate.supports_swapchain {
        log::debug!("Rejecting {}: no swapchain support", candidate.name);
        return candidate;
    }

    candidate.surface = query_surface_support(backend, handle, surface).unwrap_or_else(|result| {
        log::warn!("Failed to query surface support of {}: {}", candidate.name, result);
        SurfaceSupport::default()
    });

    if candidate.surface.formats.is_empty() || candidate.surface.present_modes.is_empty() {
        log::debug!(
            "Rejecting {}: {} surface format(s), {} present mode(s)",
            candidate.name,
            candidate.surface.formats.len(),
            candidate.surface.present_modes.len()
        );
    }

    candidate
}

fn query_surface_support<B: Backend>(
    backend: &B,
    handle: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> ash::prelude::VkResult<SurfaceSupport> {
    Ok(SurfaceSupport {
        capabilities: backend.surface_capabilities(handle, surface)?,
        formats: backend.surface_formats(handle, surface)?,
        present_modes: backend.surface_present_modes(handle, surface)?,
    })
}

/// Enumerates physical devices and picks the first eligible one for
/// `surface`.
pub fn pick_render_device<B: Backend>(
    backend: &B,
    surface: vk::SurfaceKHR,
) -> Result<RenderDevice, GfxError> {
    let handles = backend
        .physical_devices()
        .map_err(GfxError::query("physical-devices"))?;

    if handles.is_empty() {
        return Err(GfxError::EnumerationEmpty(Enumeration::PhysicalDevices));
    }

    log::debug!("{} physical-device(s) available", handles.len());

    let candidates = handles.iter().map(|&handle| probe(backend, handle, surface));
    let chosen = select_device(candidates, is_eligible).ok_or(GfxError::NoCompatibleDevice)?;

    log::info!("Selected GPU: {}", chosen.name);
    log_surface_capabilities(&chosen.surface.capabilities);

    Ok(RenderDevice::from(chosen))
}

fn log_surface_capabilities(caps: &vk::SurfaceCapabilitiesKHR) {
    log::debug!("surface capabilities:");
    log::debug!("    image count: {}..{}", caps.min_image_count, caps.max_image_count);
    log::debug!(
        "    current extent: {}x{}",
        caps.current_extent.width,
        caps.current_extent.height
    );
    log::debug!(
        "    extent range: {}x{} .. {}x{}",
        caps.min_image_extent.width,
        caps.min_image_extent.height,
        caps.max_image_extent.width,
        caps.max_image_extent.height
    );
    log::debug!("    max image array layers: {}", caps.max_image_array_layers);
    log::debug!("    supported transforms: {:?}", caps.supported_transforms);
    log::debug!("    current transform: {:?}", caps.current_transform);
    log::debug!("    composite alpha: {:?}", caps.supported_composite_alpha);
    log::debug!("    usage flags: {:?}", caps.supported_usage_flags);
}
