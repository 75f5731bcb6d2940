// Logical device provisioning
//
// One queue is requested per distinct family index, no matter how many
// roles share it.

use ash::{khr, vk};

use super::device::RenderDevice;
use super::queue::QueueFamilyAssignment;
use crate::backend::Backend;
use crate::error::GfxError;

/// One queue per family is all the pipeline needs.
static QUEUE_PRIORITIES: [f32; 1] = [1.0];

/// Queue slot retrieved for every role.
const QUEUE_INDEX: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRequest {
    pub family_index: u32,
}

/// Queue handle per role. Roles sharing a family share the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queues {
    pub graphics: vk::Queue,
    pub present: vk::Queue,
}

#[derive(Debug, Clone)]
pub struct LogicalDevice {
    pub handle: vk::Device,
    pub queue_requests: Vec<QueueRequest>,
    pub queues: Queues,
}

/// Queue requests for `assignment`, deduplicated by family index in role
/// order.
pub fn queue_requests(assignment: &QueueFamilyAssignment) -> Vec<QueueRequest> {
    let mut requests: Vec<QueueRequest> = Vec::with_capacity(2);

    for (_, family_index) in assignment.roles() {
        if requests.iter().any(|request| request.family_index == family_index) {
            continue;
        }
        requests.push(QueueRequest { family_index });
    }

    requests
}

/// Creates the logical device with the swapchain extension and no optional
/// features, then fetches a queue for each role.
pub fn provision<B: Backend>(
    backend: &mut B,
    device: &RenderDevice,
    assignment: &QueueFamilyAssignment,
) -> Result<LogicalDevice, GfxError> {
    let requests = queue_requests(assignment);

    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo<'_>> = requests
        .iter()
        .map(|request| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(request.family_index)
                .queue_priorities(&QUEUE_PRIORITIES)
        })
        .collect();

    // Must have swapchain extension enabled so swapchains can be created.
    let extension_names = [khr::swapchain::NAME.as_ptr()];
    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let handle = backend
        .create_device(device.handle, &create_info)
        .map_err(GfxError::DeviceCreationFailed)?;

    let queues = Queues {
        graphics: backend.device_queue(assignment.graphics, QUEUE_INDEX),
        present: backend.device_queue(assignment.present, QUEUE_INDEX),
    };

    log::info!(
        "Created logical device on {} with {} queue request(s)",
        device.name,
        requests.len()
    );

    Ok(LogicalDevice {
        handle,
        queue_requests: requests,
        queues,
    })
}
