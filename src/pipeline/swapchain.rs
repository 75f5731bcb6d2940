// Swapchain negotiation
//
// The choice of format, present mode, extent and image count is a pure
// function of what the surface reports. Creation is a separate step so the
// policy can be checked without a driver.

use ash::vk;

use super::device::SurfaceSupport;
use super::queue::QueueFamilyAssignment;
use crate::backend::Backend;
use crate::error::{Enumeration, GfxError};

/// Used when the surface has no preference, and preferred when offered.
pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

const PREFERRED_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;

/// Images requested beyond the surface minimum.
const EXTRA_IMAGES: u32 = 1;

/// Everything decided before the swapchain is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

/// How swapchain images are shared between queue families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    Concurrent([u32; 2]),
}

impl ImageSharing {
    /// Concurrent across both families when they differ, exclusive otherwise.
    pub fn for_families(assignment: &QueueFamilyAssignment) -> Self {
        if assignment.is_shared() {
            Self::Exclusive
        } else {
            Self::Concurrent([assignment.graphics, assignment.present])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(indices) => indices,
        }
    }
}

/// A created swapchain and the images it owns.
#[derive(Debug, Clone)]
pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub config: SwapchainConfig,
    pub sharing: ImageSharing,
    pub images: Vec<vk::Image>,
}

/// First available format, unless it is UNDEFINED (no preference) or the
/// preferred pair is also on offer.
pub fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let first = *available.first()?;

    if first.format == vk::Format::UNDEFINED {
        return Some(PREFERRED_SURFACE_FORMAT);
    }

    let preferred = available.iter().copied().find(|format| {
        format.format == PREFERRED_SURFACE_FORMAT.format
            && format.color_space == PREFERRED_SURFACE_FORMAT.color_space
    });

    Some(preferred.unwrap_or(first))
}

/// MAILBOX if available, else IMMEDIATE, else FIFO.
///
/// FIFO is always supported. IMMEDIATE is kept as a fallback since some
/// drivers implement FIFO badly.
pub fn choose_present_mode(available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    let mut selected = vk::PresentModeKHR::FIFO;

    for &mode in available {
        if mode == PREFERRED_PRESENT_MODE {
            return mode;
        }
        if mode == vk::PresentModeKHR::IMMEDIATE {
            selected = mode;
        }
    }

    selected
}

/// One more than the minimum, capped by the maximum when there is one
/// (a maximum of 0 means unbounded).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count.saturating_add(EXTRA_IMAGES);

    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Decides the swapchain configuration for a surface.
pub fn negotiate(support: &SurfaceSupport) -> Result<SwapchainConfig, GfxError> {
    let capabilities = &support.capabilities;

    let surface_format = choose_surface_format(&support.formats)
        .ok_or(GfxError::EnumerationEmpty(Enumeration::SurfaceFormats))?;

    let config = SwapchainConfig {
        surface_format,
        present_mode: choose_present_mode(&support.present_modes),
        // TODO: fall back to the window size when the surface reports the
        // 0xFFFFFFFF "any extent" sentinel (Wayland).
        extent: capabilities.current_extent,
        image_count: choose_image_count(capabilities),
        pre_transform: capabilities.current_transform,
    };

    log::debug!("selected swapchain config:");
    log::debug!(
        "    format: {:?} / {:?}",
        config.surface_format.format,
        config.surface_format.color_space
    );
    log::debug!("    present mode: {:?}", config.present_mode);
    log::debug!("    extent: {}x{}", config.extent.width, config.extent.height);
    log::debug!("    image count: {}", config.image_count);
    log::debug!("    pre-transform: {:?}", config.pre_transform);

    Ok(config)
}

/// Creates the swapchain for `config` and fetches its images.
///
/// If the images cannot be fetched the swapchain is destroyed again before
/// the error is returned.
pub fn create_swapchain<B: Backend>(
    backend: &mut B,
    surface: vk::SurfaceKHR,
    config: &SwapchainConfig,
    assignment: &QueueFamilyAssignment,
) -> Result<Swapchain, GfxError> {
    let sharing = ImageSharing::for_families(assignment);

    let mut create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(config.image_count)
        .image_format(config.surface_format.format)
        .image_color_space(config.surface_format.color_space)
        .image_extent(config.extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing.mode())
        .pre_transform(config.pre_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(config.present_mode)
        .clipped(true);

    if let ImageSharing::Concurrent(indices) = &sharing {
        create_info = create_info.queue_family_indices(indices);
    }

    let handle = backend
        .create_swapchain(&create_info)
        .map_err(GfxError::SwapchainCreationFailed)?;

    let images = match backend.swapchain_images(handle) {
        Ok(images) if !images.is_empty() => images,
        Ok(_) => {
            backend.destroy_swapchain(handle);
            return Err(GfxError::EnumerationEmpty(Enumeration::SwapchainImages));
        }
        Err(result) => {
            backend.destroy_swapchain(handle);
            return Err(GfxError::query("swapchain images")(result));
        }
    };

    log::info!(
        "Created swapchain with {} images ({}x{}, {:?}, {:?})",
        images.len(),
        config.extent.width,
        config.extent.height,
        config.present_mode,
        sharing.mode()
    );

    Ok(Swapchain {
        handle,
        config: *config,
        sharing,
        images,
    })
}
