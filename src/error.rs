// Error taxonomy for the negotiation pipeline
//
// Every stage returns `GfxError`. Nothing in the library exits the process;
// the binary hands the error to `diagnostics::report_fatal`.

use std::fmt;

use ash::vk;
use thiserror::Error;

use crate::diagnostics;

/// Which instance capability list a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Extension,
    Layer,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extension => "extension",
            Self::Layer => "layer",
        })
    }
}

/// Backend lists that must not come back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumeration {
    PhysicalDevices,
    QueueFamilies,
    SurfaceFormats,
    SwapchainImages,
}

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PhysicalDevices => "physical-devices",
            Self::QueueFamilies => "queue-families",
            Self::SurfaceFormats => "surface formats",
            Self::SwapchainImages => "swapchain images",
        })
    }
}

/// Role a queue family is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Graphics,
    Present,
}

impl fmt::Display for QueueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Graphics => "graphics",
            Self::Present => "present",
        })
    }
}

#[derive(Debug, Error)]
pub enum GfxError {
    #[error("failed to load the Vulkan library. Is Vulkan installed?")]
    LoaderUnavailable(#[from] ash::LoadingError),

    #[error("requested {kind} \"{name}\" is not available")]
    MissingCapability { kind: CapabilityKind, name: String },

    #[error("{what} {name:?} contains an interior NUL byte")]
    InvalidName { what: &'static str, name: String },

    #[error("failed to create instance")]
    ConnectionCreationFailed(vk::Result),

    #[error("failed to create debug messenger")]
    DebugMessengerFailed(vk::Result),

    #[error("failed to get window handles: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("failed to create surface")]
    SurfaceCreationFailed(vk::Result),

    #[error("failed to query {query}")]
    QueryFailed {
        query: &'static str,
        result: vk::Result,
    },

    #[error("no {0} found")]
    EnumerationEmpty(Enumeration),

    #[error("failed to find a physical-device that meets requirements")]
    NoCompatibleDevice,

    #[error("failed to find {0} queue-family for selected physical-device")]
    NoQueueFamily(QueueRole),

    #[error("failed to create logical-device for selected physical-device")]
    DeviceCreationFailed(vk::Result),

    #[error("failed to create swapchain")]
    SwapchainCreationFailed(vk::Result),

    #[error("failed to create image view for swapchain image {index}")]
    ImageViewCreationFailed { index: usize, result: vk::Result },
}

impl GfxError {
    /// Builds a `map_err` adapter for a failed query.
    pub(crate) fn query(query: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| Self::QueryFailed { query, result }
    }

    /// The backend result code behind this error, if there is one.
    pub fn result_code(&self) -> Option<vk::Result> {
        match *self {
            Self::ConnectionCreationFailed(result)
            | Self::DebugMessengerFailed(result)
            | Self::SurfaceCreationFailed(result)
            | Self::DeviceCreationFailed(result)
            | Self::SwapchainCreationFailed(result)
            | Self::QueryFailed { result, .. }
            | Self::ImageViewCreationFailed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Name of the backend result code, resolved through the diagnostics table.
    pub fn result_name(&self) -> Option<&'static str> {
        self.result_code().and_then(diagnostics::result_name)
    }

    /// Subsystem label handed to the diagnostics sink.
    pub fn subsystem(&self) -> &'static str {
        match self {
            Self::WindowHandle(_) => "WINDOW",
            _ => "VULKAN",
        }
    }
}
