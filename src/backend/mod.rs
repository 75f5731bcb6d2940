// Backend module - the graphics driver seam
//
// The pipeline talks to the driver only through `Backend`. `VulkanBackend`
// is the real implementation; tests use a scripted fake. Create infos are
// plain ash structs built by the pipeline stages.

pub mod enumerate;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod fake;

pub use enumerate::enumerate;
pub use vulkan::VulkanBackend;

use ash::prelude::VkResult;
use ash::vk;

/// Driver calls consumed by the negotiation pipeline.
///
/// The backend owns the instance and logical device it creates; the
/// `destroy_*` methods release them and must be idempotent.
pub trait Backend {
    // Connection
    fn instance_extension_properties(&self) -> VkResult<Vec<vk::ExtensionProperties>>;
    fn instance_layer_properties(&self) -> VkResult<Vec<vk::LayerProperties>>;
    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo<'_>) -> VkResult<()>;
    fn destroy_instance(&mut self);

    fn create_debug_messenger(
        &mut self,
        create_info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<()>;
    fn destroy_debug_messenger(&mut self);

    fn destroy_surface(&mut self, surface: vk::SurfaceKHR);

    // Physical devices
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::PhysicalDeviceProperties>;
    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>>;
    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::QueueFamilyProperties>>;

    // Surface queries
    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    // Logical device
    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<vk::Device>;
    /// Returns a null handle when no logical device exists.
    fn device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue;
    fn destroy_device(&mut self);

    // Swapchain
    fn create_swapchain(
        &mut self,
        create_info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR>;
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR);

    fn create_image_view(
        &mut self,
        create_info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView>;
    fn destroy_image_view(&mut self, image_view: vk::ImageView);
}
