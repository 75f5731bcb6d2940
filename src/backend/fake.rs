// Scripted backend for tests
//
// Devices, queue families and failures are plain data. Every call that
// matters to ordering is recorded as an `Event` in a shared log, so a test
// can keep a handle on the log after the backend moves into a context.

use std::cell::RefCell;
use std::ffi::{c_char, CStr};
use std::rc::Rc;
use std::slice;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};

use super::Backend;
use crate::error::GfxError;
use crate::pipeline::SurfaceFactory;

pub fn fake_surface() -> vk::SurfaceKHR {
    vk::SurfaceKHR::from_raw(0x5)
}

const FAKE_DEVICE: u64 = 0xD0;
const FAKE_SWAPCHAIN: u64 = 0x5C;

fn copy_name(dst: &mut [c_char], name: &CStr) {
    for (slot, &byte) in dst.iter_mut().zip(name.to_bytes()) {
        *slot = byte as c_char;
    }
}

fn name_of(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn names_of(ptrs: *const *const c_char, count: u32) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(ptrs, count as usize) }
        .iter()
        .map(|&ptr| name_of(ptr))
        .collect()
}

pub fn extension(name: &CStr) -> vk::ExtensionProperties {
    let mut props = vk::ExtensionProperties::default();
    copy_name(&mut props.extension_name, name);
    props
}

pub fn layer(name: &CStr) -> vk::LayerProperties {
    let mut props = vk::LayerProperties::default();
    copy_name(&mut props.layer_name, name);
    props
}

/// Swapchain create info, as received.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapchainRecord {
    pub surface: vk::SurfaceKHR,
    pub min_image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub sharing_mode: vk::SharingMode,
    pub queue_family_indices: Vec<u32>,
    pub present_mode: vk::PresentModeKHR,
    pub clipped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateInstance {
        application: String,
        extensions: Vec<String>,
        layers: Vec<String>,
    },
    DestroyInstance,
    CreateDebugMessenger,
    DestroyDebugMessenger,
    CreateSurface,
    DestroySurface,
    PropertiesQueried { device: usize },
    SurfaceQueried { device: usize },
    CreateDevice {
        queue_families: Vec<u32>,
        extensions: Vec<String>,
    },
    DestroyDevice,
    CreateSwapchain(SwapchainRecord),
    DestroySwapchain,
    CreateImageView { image: vk::Image, view: vk::ImageView },
    DestroyImageView { view: vk::ImageView },
}

/// One scripted physical device.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub extensions: Vec<vk::ExtensionProperties>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    /// Family properties and whether the family can present.
    pub families: Vec<(vk::QueueFamilyProperties, bool)>,
    /// Families whose present-support query returns an error.
    pub failing_present_queries: Vec<u32>,
}

impl FakeDevice {
    /// Discrete GPU that passes every check: swapchain extension, a single
    /// "no preference" format, FIFO only, and one family for both roles.
    pub fn discrete(name: &str) -> Self {
        Self {
            name: name.to_string(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            extensions: vec![extension(ash::khr::swapchain::NAME)],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 1,
                max_image_count: 0,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::UNDEFINED,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            families: vec![(
                vk::QueueFamilyProperties {
                    queue_flags: vk::QueueFlags::GRAPHICS
                        | vk::QueueFlags::COMPUTE
                        | vk::QueueFlags::TRANSFER,
                    queue_count: 1,
                    ..Default::default()
                },
                true,
            )],
            failing_present_queries: Vec::new(),
        }
    }

    pub fn device_type(mut self, device_type: vk::PhysicalDeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn without_swapchain(mut self) -> Self {
        self.extensions.clear();
        self
    }

    pub fn formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.formats = formats;
        self
    }

    pub fn present_modes(mut self, present_modes: Vec<vk::PresentModeKHR>) -> Self {
        self.present_modes = present_modes;
        self
    }

    /// Replaces the queue families with `(flags, can_present)` pairs, one
    /// queue each.
    pub fn families(mut self, families: &[(vk::QueueFlags, bool)]) -> Self {
        self.families = families
            .iter()
            .map(|&(queue_flags, present)| {
                let props = vk::QueueFamilyProperties {
                    queue_flags,
                    queue_count: 1,
                    ..Default::default()
                };
                (props, present)
            })
            .collect();
        self
    }

    pub fn failing_present_query(mut self, family: u32) -> Self {
        self.failing_present_queries.push(family);
        self
    }
}

pub struct FakeBackend {
    pub events: Rc<RefCell<Vec<Event>>>,
    pub instance_extensions: Vec<vk::ExtensionProperties>,
    pub instance_layers: Vec<vk::LayerProperties>,
    pub devices: Vec<FakeDevice>,

    pub fail_instance: Option<vk::Result>,
    pub fail_device: Option<vk::Result>,
    pub fail_swapchain: Option<vk::Result>,
    /// Index of the `create_image_view` call that fails.
    pub fail_image_view_at: Option<usize>,
    /// Overrides the number of images a swapchain reports.
    pub swapchain_image_count: Option<u32>,

    pub instance_alive: bool,
    pub messenger_alive: bool,
    pub device_alive: bool,
    pub image_view_calls: usize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            events: Rc::default(),
            instance_extensions: vec![
                extension(c"VK_KHR_surface"),
                extension(c"VK_KHR_xcb_surface"),
                extension(c"VK_EXT_debug_utils"),
            ],
            instance_layers: vec![layer(c"VK_LAYER_KHRONOS_validation")],
            devices: Vec::new(),
            fail_instance: None,
            fail_device: None,
            fail_swapchain: None,
            fail_image_view_at: None,
            swapchain_image_count: None,
            instance_alive: false,
            messenger_alive: false,
            device_alive: false,
            image_view_calls: 0,
        }
    }
}

impl FakeBackend {
    pub fn with_devices(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn last_swapchain(&self) -> Option<SwapchainRecord> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Event::CreateSwapchain(record) => Some(record.clone()),
            _ => None,
        })
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    fn device_at(&self, handle: vk::PhysicalDevice) -> VkResult<(usize, &FakeDevice)> {
        let index = (handle.as_raw() as usize)
            .checked_sub(1)
            .ok_or(vk::Result::ERROR_DEVICE_LOST)?;
        self.devices
            .get(index)
            .map(|device| (index, device))
            .ok_or(vk::Result::ERROR_DEVICE_LOST)
    }
}

impl Backend for FakeBackend {
    fn instance_extension_properties(&self) -> VkResult<Vec<vk::ExtensionProperties>> {
        Ok(self.instance_extensions.clone())
    }

    fn instance_layer_properties(&self) -> VkResult<Vec<vk::LayerProperties>> {
        Ok(self.instance_layers.clone())
    }

    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo<'_>) -> VkResult<()> {
        if let Some(result) = self.fail_instance {
            return Err(result);
        }

        let app_info = unsafe { &*create_info.p_application_info };
        self.record(Event::CreateInstance {
            application: name_of(app_info.p_application_name),
            extensions: names_of(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            ),
            layers: names_of(create_info.pp_enabled_layer_names, create_info.enabled_layer_count),
        });
        self.instance_alive = true;
        Ok(())
    }

    fn destroy_instance(&mut self) {
        if self.instance_alive {
            self.instance_alive = false;
            self.record(Event::DestroyInstance);
        }
    }

    fn create_debug_messenger(
        &mut self,
        _create_info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<()> {
        self.messenger_alive = true;
        self.record(Event::CreateDebugMessenger);
        Ok(())
    }

    fn destroy_debug_messenger(&mut self) {
        if self.messenger_alive {
            self.messenger_alive = false;
            self.record(Event::DestroyDebugMessenger);
        }
    }

    fn destroy_surface(&mut self, _surface: vk::SurfaceKHR) {
        self.record(Event::DestroySurface);
    }

    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok((1..=self.devices.len() as u64)
            .map(vk::PhysicalDevice::from_raw)
            .collect())
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::PhysicalDeviceProperties> {
        let (index, device) = self.device_at(physical_device)?;
        self.record(Event::PropertiesQueried { device: index });

        let mut properties = vk::PhysicalDeviceProperties {
            device_type: device.device_type,
            api_version: vk::API_VERSION_1_1,
            ..Default::default()
        };
        for (slot, byte) in properties.device_name.iter_mut().zip(device.name.bytes()) {
            *slot = byte as c_char;
        }
        Ok(properties)
    }

    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        Ok(self.device_at(physical_device)?.1.extensions.clone())
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::QueueFamilyProperties>> {
        let (_, device) = self.device_at(physical_device)?;
        Ok(device.families.iter().map(|&(props, _)| props).collect())
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let (_, device) = self.device_at(physical_device)?;
        if device.failing_present_queries.contains(&queue_family_index) {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        device
            .families
            .get(queue_family_index as usize)
            .map(|&(_, present)| present)
            .ok_or(vk::Result::ERROR_UNKNOWN)
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        let (index, device) = self.device_at(physical_device)?;
        self.record(Event::SurfaceQueried { device: index });
        Ok(device.capabilities)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.device_at(physical_device)?.1.formats.clone())
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.device_at(physical_device)?.1.present_modes.clone())
    }

    fn create_device(
        &mut self,
        _physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<vk::Device> {
        if let Some(result) = self.fail_device {
            return Err(result);
        }

        let queue_infos = unsafe {
            slice::from_raw_parts(
                create_info.p_queue_create_infos,
                create_info.queue_create_info_count as usize,
            )
        };
        self.record(Event::CreateDevice {
            queue_families: queue_infos.iter().map(|info| info.queue_family_index).collect(),
            extensions: names_of(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            ),
        });
        self.device_alive = true;
        Ok(vk::Device::from_raw(FAKE_DEVICE))
    }

    fn device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        if !self.device_alive {
            return vk::Queue::null();
        }
        vk::Queue::from_raw(0x1000 + u64::from(queue_family_index) * 16 + u64::from(queue_index))
    }

    fn destroy_device(&mut self) {
        if self.device_alive {
            self.device_alive = false;
            self.record(Event::DestroyDevice);
        }
    }

    fn create_swapchain(
        &mut self,
        create_info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        if let Some(result) = self.fail_swapchain {
            return Err(result);
        }

        let queue_family_indices = if create_info.queue_family_index_count == 0 {
            Vec::new()
        } else {
            unsafe {
                slice::from_raw_parts(
                    create_info.p_queue_family_indices,
                    create_info.queue_family_index_count as usize,
                )
            }
            .to_vec()
        };

        self.record(Event::CreateSwapchain(SwapchainRecord {
            surface: create_info.surface,
            min_image_count: create_info.min_image_count,
            format: vk::SurfaceFormatKHR {
                format: create_info.image_format,
                color_space: create_info.image_color_space,
            },
            extent: create_info.image_extent,
            sharing_mode: create_info.image_sharing_mode,
            queue_family_indices,
            present_mode: create_info.present_mode,
            clipped: create_info.clipped == vk::TRUE,
        }));
        Ok(vk::SwapchainKHR::from_raw(FAKE_SWAPCHAIN))
    }

    fn swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let count = match self.swapchain_image_count {
            Some(count) => count,
            None => self
                .last_swapchain()
                .map_or(0, |record| record.min_image_count),
        };
        Ok((0..u64::from(count))
            .map(|i| vk::Image::from_raw(0x100 + i))
            .collect())
    }

    fn destroy_swapchain(&mut self, _swapchain: vk::SwapchainKHR) {
        self.record(Event::DestroySwapchain);
    }

    fn create_image_view(
        &mut self,
        create_info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        let call = self.image_view_calls;
        self.image_view_calls += 1;

        if self.fail_image_view_at == Some(call) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }

        let view = vk::ImageView::from_raw(0x2000 + call as u64);
        self.record(Event::CreateImageView {
            image: create_info.image,
            view,
        });
        Ok(view)
    }

    fn destroy_image_view(&mut self, image_view: vk::ImageView) {
        self.record(Event::DestroyImageView { view: image_view });
    }
}

/// Window stand-in asking for the usual XCB surface extensions.
#[derive(Debug, Default)]
pub struct FakeWindow {
    pub fail_surface: Option<vk::Result>,
}

impl SurfaceFactory<FakeBackend> for FakeWindow {
    fn required_extensions(&self) -> Result<Vec<std::ffi::CString>, GfxError> {
        Ok(vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xcb_surface".to_owned()])
    }

    fn create_surface(&self, backend: &FakeBackend) -> Result<vk::SurfaceKHR, GfxError> {
        if let Some(result) = self.fail_surface {
            return Err(GfxError::SurfaceCreationFailed(result));
        }
        backend.record(Event::CreateSurface);
        Ok(fake_surface())
    }
}
