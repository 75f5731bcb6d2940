// Window surface - winit window as the presentation front-end
//
// ash-window picks the platform surface extension and creates the surface
// from the raw handles winit exposes.

use std::ffi::{CStr, CString};

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use crate::backend::VulkanBackend;
use crate::error::GfxError;
use crate::pipeline::SurfaceFactory;

pub struct WindowSurface<'a> {
    window: &'a Window,
}

impl<'a> WindowSurface<'a> {
    pub fn new(window: &'a Window) -> Self {
        Self { window }
    }
}

impl SurfaceFactory<VulkanBackend> for WindowSurface<'_> {
    fn required_extensions(&self) -> Result<Vec<CString>, GfxError> {
        let display_handle = self.window.display_handle()?.as_raw();

        let names = ash_window::enumerate_required_extensions(display_handle)
            .map_err(GfxError::query("window extensions"))?;

        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_owned())
            .collect())
    }

    fn create_surface(&self, backend: &VulkanBackend) -> Result<vk::SurfaceKHR, GfxError> {
        let instance = backend.instance().map_err(GfxError::SurfaceCreationFailed)?;
        let display_handle = self.window.display_handle()?.as_raw();
        let window_handle = self.window.window_handle()?.as_raw();

        let surface = unsafe {
            ash_window::create_surface(backend.entry(), instance, display_handle, window_handle, None)
        }
        .map_err(GfxError::SurfaceCreationFailed)?;

        log::info!("Created window surface");
        Ok(surface)
    }
}
