// Presentable image views
//
// One 2D color view per swapchain image, in image order.

use ash::vk;

use crate::backend::Backend;
use crate::error::GfxError;

/// 2D color view over the whole of `image`, identity swizzle, one mip level
/// and one array layer.
pub fn view_create_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
}

/// Creates a view for each image. On failure the views created so far are
/// destroyed and the index of the failing image is reported.
pub fn create_image_views<B: Backend>(
    backend: &mut B,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>, GfxError> {
    let mut views = Vec::with_capacity(images.len());

    for (index, &image) in images.iter().enumerate() {
        match backend.create_image_view(&view_create_info(image, format)) {
            Ok(view) => views.push(view),
            Err(result) => {
                for view in views.drain(..).rev() {
                    backend.destroy_image_view(view);
                }
                return Err(GfxError::ImageViewCreationFailed { index, result });
            }
        }
    }

    log::debug!("Created {} image view(s)", views.len());

    Ok(views)
}
