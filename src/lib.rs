// prism - Vulkan device and swapchain negotiation
//
// Validates the requested instance components, connects to the driver,
// picks a GPU and queue families, provisions a logical device and builds a
// presentable swapchain with one image view per image.
//
// The driver is reached only through `backend::Backend`; `pipeline`
// contains the stages and `pipeline::initialize` runs them in order.

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod window;

pub use error::GfxError;
