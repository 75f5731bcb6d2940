// Queue family resolution
//
// Graphics and present roles are resolved independently in a single pass
// and may land on the same family.

use ash::vk;

use super::device::RenderDevice;
use crate::backend::Backend;
use crate::error::{Enumeration, GfxError, QueueRole};

/// Family indices for each queue role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyAssignment {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyAssignment {
    /// Roles in request order.
    pub fn roles(&self) -> [(QueueRole, u32); 2] {
        [(QueueRole::Graphics, self.graphics), (QueueRole::Present, self.present)]
    }

    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }
}

/// Single pass over `families`.
///
/// The first family with queues and the GRAPHICS bit takes the graphics
/// role; the first family `supports_present` accepts takes the present role.
/// `supports_present` is not called again once the present role is taken,
/// and the pass stops as soon as both roles are taken.
pub fn resolve_families<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<QueueFamilyAssignment, GfxError>
where
    F: FnMut(u32) -> bool,
{
    if families.is_empty() {
        return Err(GfxError::EnumerationEmpty(Enumeration::QueueFamilies));
    }

    let mut graphics = None;
    let mut present = None;

    for (index, family) in (0u32..).zip(families) {
        if graphics.is_none()
            && family.queue_count > 0
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            graphics = Some(index);
        }

        if present.is_none() && supports_present(index) {
            present = Some(index);
        }

        if graphics.is_some() && present.is_some() {
            break;
        }
    }

    Ok(QueueFamilyAssignment {
        graphics: graphics.ok_or(GfxError::NoQueueFamily(QueueRole::Graphics))?,
        present: present.ok_or(GfxError::NoQueueFamily(QueueRole::Present))?,
    })
}

/// Resolves queue families of `device` against `surface`.
pub fn resolve_queue_families<B: Backend>(
    backend: &B,
    device: &RenderDevice,
    surface: vk::SurfaceKHR,
) -> Result<QueueFamilyAssignment, GfxError> {
    let families = backend
        .queue_family_properties(device.handle)
        .map_err(GfxError::query("queue-families"))?;

    log_queue_families(&families);

    let assignment = resolve_families(&families, |index| {
        backend
            .surface_support(device.handle, index, surface)
            .unwrap_or_else(|result| {
                log::warn!("Failed to query present support of family {}: {}", index, result);
                false
            })
    })?;

    log::info!(
        "Queue families: graphics={}, present={}",
        assignment.graphics,
        assignment.present
    );

    Ok(assignment)
}

fn log_queue_families(families: &[vk::QueueFamilyProperties]) {
    log::debug!("{} queue-famil(ies) available", families.len());
    for (index, family) in families.iter().enumerate() {
        log::debug!(
            "    [{}] {} queue(s), flags {:?}",
            index,
            family.queue_count,
            family.queue_flags
        );
    }
}
