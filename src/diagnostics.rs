// Diagnostics - result-code names, fatal reporting, validation messages
//
// The pipeline never formats fatal output itself. It hands a subsystem label,
// an optional result-code name and a message to `report_fatal`.

use std::ffi::CStr;
use std::fmt;

use ash::vk;

/// Result codes the driver may hand back, paired with their Vulkan names.
static VK_RESULT_NAMES: &[(vk::Result, &str)] = &[
    (vk::Result::SUCCESS, "VK_SUCCESS"),
    (vk::Result::NOT_READY, "VK_NOT_READY"),
    (vk::Result::TIMEOUT, "VK_TIMEOUT"),
    (vk::Result::EVENT_SET, "VK_EVENT_SET"),
    (vk::Result::EVENT_RESET, "VK_EVENT_RESET"),
    (vk::Result::INCOMPLETE, "VK_INCOMPLETE"),
    (vk::Result::ERROR_OUT_OF_HOST_MEMORY, "VK_ERROR_OUT_OF_HOST_MEMORY"),
    (vk::Result::ERROR_OUT_OF_DEVICE_MEMORY, "VK_ERROR_OUT_OF_DEVICE_MEMORY"),
    (vk::Result::ERROR_INITIALIZATION_FAILED, "VK_ERROR_INITIALIZATION_FAILED"),
    (vk::Result::ERROR_DEVICE_LOST, "VK_ERROR_DEVICE_LOST"),
    (vk::Result::ERROR_MEMORY_MAP_FAILED, "VK_ERROR_MEMORY_MAP_FAILED"),
    (vk::Result::ERROR_LAYER_NOT_PRESENT, "VK_ERROR_LAYER_NOT_PRESENT"),
    (vk::Result::ERROR_EXTENSION_NOT_PRESENT, "VK_ERROR_EXTENSION_NOT_PRESENT"),
    (vk::Result::ERROR_FEATURE_NOT_PRESENT, "VK_ERROR_FEATURE_NOT_PRESENT"),
    (vk::Result::ERROR_INCOMPATIBLE_DRIVER, "VK_ERROR_INCOMPATIBLE_DRIVER"),
    (vk::Result::ERROR_TOO_MANY_OBJECTS, "VK_ERROR_TOO_MANY_OBJECTS"),
    (vk::Result::ERROR_FORMAT_NOT_SUPPORTED, "VK_ERROR_FORMAT_NOT_SUPPORTED"),
    (vk::Result::ERROR_FRAGMENTED_POOL, "VK_ERROR_FRAGMENTED_POOL"),
    // The _KHR aliases share these values.
    (vk::Result::ERROR_OUT_OF_POOL_MEMORY, "VK_ERROR_OUT_OF_POOL_MEMORY"),
    (vk::Result::ERROR_INVALID_EXTERNAL_HANDLE, "VK_ERROR_INVALID_EXTERNAL_HANDLE"),
    (vk::Result::ERROR_SURFACE_LOST_KHR, "VK_ERROR_SURFACE_LOST_KHR"),
    (vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR, "VK_ERROR_NATIVE_WINDOW_IN_USE_KHR"),
    (vk::Result::SUBOPTIMAL_KHR, "VK_SUBOPTIMAL_KHR"),
    (vk::Result::ERROR_OUT_OF_DATE_KHR, "VK_ERROR_OUT_OF_DATE_KHR"),
    (vk::Result::ERROR_INCOMPATIBLE_DISPLAY_KHR, "VK_ERROR_INCOMPATIBLE_DISPLAY_KHR"),
    (vk::Result::ERROR_VALIDATION_FAILED_EXT, "VK_ERROR_VALIDATION_FAILED_EXT"),
    (vk::Result::ERROR_INVALID_SHADER_NV, "VK_ERROR_INVALID_SHADER_NV"),
    (vk::Result::ERROR_FRAGMENTATION, "VK_ERROR_FRAGMENTATION_EXT"),
    (vk::Result::from_raw(-1_000_174_001), "VK_ERROR_NOT_PERMITTED_EXT"),
];

/// Looks up the Vulkan name of a result code.
pub fn result_name(result: vk::Result) -> Option<&'static str> {
    VK_RESULT_NAMES
        .iter()
        .find(|(code, _)| *code == result)
        .map(|&(_, name)| name)
}

/// Reports a fatal condition and terminates the process.
pub fn report_fatal(subsystem: &str, result_name: Option<&str>, message: impl fmt::Display) -> ! {
    match result_name {
        Some(name) => log::error!("[{} ERROR] {}: {}", subsystem, name, message),
        None => log::error!("[{} ERROR] {}", subsystem, message),
    }

    std::process::exit(1)
}

/// Create info for the debug messenger installed when validation is enabled.
pub fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::trace!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}
