// Vulkan backend - the real driver behind `Backend`
//
// Responsibilities:
// - Load the Vulkan library
// - Own the instance, debug messenger and logical device once created
// - Keep the extension loaders (surface, swapchain, debug utils) alongside
//   the handle they were loaded from
//
// List queries go through `enumerate` so every call site shares the same
// count-then-fill logic.

use std::ptr;

use ash::prelude::VkResult;
use ash::{ext, khr, vk, Entry};

use super::{enumerate, Backend};
use crate::error::GfxError;

/// Vulkan driver with automatic cleanup of whatever is still alive on drop.
pub struct VulkanBackend {
    // Loaders and handles (order matters for drop!)
    swapchain_loader: Option<khr::swapchain::Device>,
    device: Option<ash::Device>,
    debug_utils: Option<(ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface_loader: Option<khr::surface::Instance>,
    instance: Option<ash::Instance>,
    entry: Entry,
}

impl VulkanBackend {
    /// Load the Vulkan library. No instance is created yet.
    pub fn load() -> Result<Self, GfxError> {
        let entry = unsafe { Entry::load() }?;
        log::debug!("Vulkan library loaded");

        Ok(Self {
            swapchain_loader: None,
            device: None,
            debug_utils: None,
            surface_loader: None,
            instance: None,
            entry,
        })
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The instance, once `create_instance` has succeeded.
    pub fn instance(&self) -> VkResult<&ash::Instance> {
        self.instance
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn device(&self) -> VkResult<&ash::Device> {
        self.device
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn surface_loader(&self) -> VkResult<&khr::surface::Instance> {
        self.surface_loader
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn swapchain_loader(&self) -> VkResult<&khr::swapchain::Device> {
        self.swapchain_loader
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }
}

impl Backend for VulkanBackend {
    fn instance_extension_properties(&self) -> VkResult<Vec<vk::ExtensionProperties>> {
        let fp = self.entry.fp_v1_0();
        enumerate(|count, data| unsafe {
            (fp.enumerate_instance_extension_properties)(ptr::null(), count, data)
        })
    }

    fn instance_layer_properties(&self) -> VkResult<Vec<vk::LayerProperties>> {
        let fp = self.entry.fp_v1_0();
        enumerate(|count, data| unsafe { (fp.enumerate_instance_layer_properties)(count, data) })
    }

    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo<'_>) -> VkResult<()> {
        let instance = unsafe { self.entry.create_instance(create_info, None) }?;

        self.surface_loader = Some(khr::surface::Instance::new(&self.entry, &instance));
        self.instance = Some(instance);
        Ok(())
    }

    fn destroy_instance(&mut self) {
        self.surface_loader = None;

        if let Some(instance) = self.instance.take() {
            // Physical devices go away with the instance.
            unsafe { instance.destroy_instance(None) };
        }
    }

    fn create_debug_messenger(
        &mut self,
        create_info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<()> {
        let debug_utils = ext::debug_utils::Instance::new(&self.entry, self.instance()?);
        let messenger = unsafe { debug_utils.create_debug_utils_messenger(create_info, None) }?;

        self.debug_utils = Some((debug_utils, messenger));
        Ok(())
    }

    fn destroy_debug_messenger(&mut self) {
        if let Some((debug_utils, messenger)) = self.debug_utils.take() {
            unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    fn destroy_surface(&mut self, surface: vk::SurfaceKHR) {
        if let Ok(loader) = self.surface_loader() {
            unsafe { loader.destroy_surface(surface, None) };
        }
    }

    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        let instance = self.instance()?;
        let fp = instance.fp_v1_0();
        enumerate(|count, data| unsafe {
            (fp.enumerate_physical_devices)(instance.handle(), count, data)
        })
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::PhysicalDeviceProperties> {
        let instance = self.instance()?;
        Ok(unsafe { instance.get_physical_device_properties(physical_device) })
    }

    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        let fp = self.instance()?.fp_v1_0();
        enumerate(|count, data| unsafe {
            (fp.enumerate_device_extension_properties)(physical_device, ptr::null(), count, data)
        })
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::QueueFamilyProperties>> {
        let fp = self.instance()?.fp_v1_0();
        enumerate(|count, data| unsafe {
            (fp.get_physical_device_queue_family_properties)(physical_device, count, data)
        })
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let loader = self.surface_loader()?;
        unsafe {
            loader.get_physical_device_surface_support(physical_device, queue_family_index, surface)
        }
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        let loader = self.surface_loader()?;
        unsafe { loader.get_physical_device_surface_capabilities(physical_device, surface) }
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let fp = self.surface_loader()?.fp();
        enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_formats_khr)(physical_device, surface, count, data)
        })
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        let fp = self.surface_loader()?.fp();
        enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_present_modes_khr)(physical_device, surface, count, data)
        })
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<vk::Device> {
        let instance = self.instance()?;
        let device = unsafe { instance.create_device(physical_device, create_info, None) }?;
        let handle = device.handle();
        let swapchain_loader = khr::swapchain::Device::new(instance, &device);

        self.swapchain_loader = Some(swapchain_loader);
        self.device = Some(device);
        Ok(handle)
    }

    fn device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        match self.device() {
            Ok(device) => unsafe { device.get_device_queue(queue_family_index, queue_index) },
            Err(_) => vk::Queue::null(),
        }
    }

    fn destroy_device(&mut self) {
        self.swapchain_loader = None;

        if let Some(device) = self.device.take() {
            unsafe {
                if let Err(result) = device.device_wait_idle() {
                    log::warn!("Failed to wait for device idle before destroy: {}", result);
                }
                // Queues go away with the device.
                device.destroy_device(None);
            }
        }
    }

    fn create_swapchain(
        &mut self,
        create_info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        let loader = self.swapchain_loader()?;
        unsafe { loader.create_swapchain(create_info, None) }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let device = self.device()?.handle();
        let fp = self.swapchain_loader()?.fp();
        enumerate(|count, data| unsafe {
            (fp.get_swapchain_images_khr)(device, swapchain, count, data)
        })
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        // Swapchain images go away with the swapchain.
        if let Ok(loader) = self.swapchain_loader() {
            unsafe { loader.destroy_swapchain(swapchain, None) };
        }
    }

    fn create_image_view(
        &mut self,
        create_info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        let device = self.device()?;
        unsafe { device.create_image_view(create_info, None) }
    }

    fn destroy_image_view(&mut self, image_view: vk::ImageView) {
        if let Ok(device) = self.device() {
            unsafe { device.destroy_image_view(image_view, None) };
        }
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        // Normally everything was released by the pipeline context already.
        self.destroy_device();
        self.destroy_debug_messenger();
        self.destroy_instance();
    }
}
