// Pipeline module - device and swapchain negotiation
//
// Stages run in a fixed order, each consuming the output of the previous:
//
//   capability -> connection -> surface -> device -> queue
//              -> logical_device -> swapchain -> image_view
//
// `initialize` drives them and hands back a `GfxContext` owning everything
// that was created. Dropping the context (including a partially built one
// when a stage fails) releases resources in reverse creation order.

pub mod capability;
pub mod connection;
pub mod device;
pub mod image_view;
pub mod logical_device;
pub mod queue;
pub mod swapchain;

pub use capability::RequestedCapabilitySet;
pub use connection::AppIdentity;
pub use device::RenderDevice;
pub use logical_device::LogicalDevice;
pub use queue::QueueFamilyAssignment;
pub use swapchain::{Swapchain, SwapchainConfig};

use std::ffi::{CStr, CString};

use ash::{ext, vk};

use crate::backend::Backend;
use crate::diagnostics;
use crate::error::GfxError;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Instance-level settings for `initialize`.
#[derive(Debug, Clone)]
pub struct GfxSettings {
    pub identity: AppIdentity,
    /// Extra instance extensions on top of what the window needs.
    pub extensions: Vec<CString>,
    /// Extra instance layers.
    pub layers: Vec<CString>,
    /// Enables the validation layer and a debug messenger.
    pub validation: bool,
}

impl Default for GfxSettings {
    fn default() -> Self {
        Self {
            identity: AppIdentity::default(),
            extensions: Vec::new(),
            layers: Vec::new(),
            validation: true,
        }
    }
}

impl GfxSettings {
    /// Window extensions first, then configured names, then validation
    /// support when enabled. Duplicates are dropped.
    pub fn requested_capabilities(&self, window_extensions: Vec<CString>) -> RequestedCapabilitySet {
        let mut requested = RequestedCapabilitySet::default();

        requested.add_extensions(window_extensions);
        requested.add_extensions(self.extensions.iter().cloned());
        requested.add_layers(self.layers.iter().cloned());

        if self.validation {
            requested.add_extensions([ext::debug_utils::NAME.to_owned()]);
            requested.add_layers([VALIDATION_LAYER.to_owned()]);
        }

        requested
    }
}

/// The presentation front-end: names the instance extensions it needs and
/// creates the surface once the instance exists.
pub trait SurfaceFactory<B: Backend> {
    fn required_extensions(&self) -> Result<Vec<CString>, GfxError>;
    fn create_surface(&self, backend: &B) -> Result<vk::SurfaceKHR, GfxError>;
}

/// Everything the pipeline created, owned in one place.
pub struct GfxContext<B: Backend> {
    backend: B,
    debug_messenger: bool,
    surface: Option<vk::SurfaceKHR>,
    render_device: Option<RenderDevice>,
    queue_families: Option<QueueFamilyAssignment>,
    logical_device: Option<LogicalDevice>,
    swapchain: Option<Swapchain>,
    image_views: Vec<vk::ImageView>,
}

impl<B: Backend> GfxContext<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            debug_messenger: false,
            surface: None,
            render_device: None,
            queue_families: None,
            logical_device: None,
            swapchain: None,
            image_views: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }

    pub fn render_device(&self) -> Option<&RenderDevice> {
        self.render_device.as_ref()
    }

    pub fn queue_families(&self) -> Option<QueueFamilyAssignment> {
        self.queue_families
    }

    pub fn logical_device(&self) -> Option<&LogicalDevice> {
        self.logical_device.as_ref()
    }

    pub fn swapchain(&self) -> Option<&Swapchain> {
        self.swapchain.as_ref()
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}

impl<B: Backend> Drop for GfxContext<B> {
    fn drop(&mut self) {
        for view in self.image_views.drain(..) {
            self.backend.destroy_image_view(view);
        }

        if let Some(swapchain) = self.swapchain.take() {
            self.backend.destroy_swapchain(swapchain.handle);
        }

        if self.logical_device.take().is_some() {
            self.backend.destroy_device();
        }

        if let Some(surface) = self.surface.take() {
            self.backend.destroy_surface(surface);
        }

        if self.debug_messenger {
            self.backend.destroy_debug_messenger();
            self.debug_messenger = false;
        }

        self.backend.destroy_instance();
    }
}

/// Runs every stage against `backend` and `window`.
///
/// On failure, whatever was created before the failing stage is released
/// before the error is returned.
pub fn initialize<B, S>(backend: B, window: &S, settings: &GfxSettings) -> Result<GfxContext<B>, GfxError>
where
    B: Backend,
    S: SurfaceFactory<B>,
{
    let mut ctx = GfxContext::new(backend);

    // Step 1: Validate the requested instance components
    let requested = settings.requested_capabilities(window.required_extensions()?);
    capability::validate_requested(&ctx.backend, &requested)?;

    // Step 2: Create the instance
    connection::connect(&mut ctx.backend, &settings.identity, &requested)?;

    if settings.validation {
        ctx.backend
            .create_debug_messenger(&diagnostics::messenger_create_info())
            .map_err(GfxError::DebugMessengerFailed)?;
        ctx.debug_messenger = true;
        log::info!("Validation layer enabled");
    }

    // Step 3: Create the surface
    let surface = window.create_surface(&ctx.backend)?;
    ctx.surface = Some(surface);

    // Step 4: Pick the physical device and its queue families
    let render_device = device::pick_render_device(&ctx.backend, surface)?;
    let families = queue::resolve_queue_families(&ctx.backend, &render_device, surface)?;
    ctx.queue_families = Some(families);

    // Step 5: Create the logical device
    let logical = logical_device::provision(&mut ctx.backend, &render_device, &families)?;
    ctx.logical_device = Some(logical);

    // Step 6: Negotiate and create the swapchain
    let config = swapchain::negotiate(&render_device.surface)?;
    ctx.render_device = Some(render_device);
    let created = swapchain::create_swapchain(&mut ctx.backend, surface, &config, &families)?;
    let images = created.images.clone();
    ctx.swapchain = Some(created);

    // Step 7: Create image views
    ctx.image_views = image_view::create_image_views(&mut ctx.backend, &images, config.surface_format.format)?;

    log::info!("Graphics pipeline initialized ({} presentable images)", images.len());

    Ok(ctx)
}
