// Two-call enumeration
//
// Every list query in Vulkan is called once with a null buffer to get the
// count, then again with a buffer of that size. `enumerate` does that for
// any call signature and returns an owned Vec.

use std::ptr;

use ash::prelude::VkResult;
use ash::vk;

/// Status returned by a list query. Some queries (queue families) return
/// nothing and cannot fail.
pub trait CallStatus {
    fn into_result(self) -> vk::Result;
}

impl CallStatus for vk::Result {
    fn into_result(self) -> vk::Result {
        self
    }
}

impl CallStatus for () {
    fn into_result(self) -> vk::Result {
        vk::Result::SUCCESS
    }
}

/// Runs a two-call list query.
///
/// `call` receives the count pointer and the output pointer; the output
/// pointer is null on the counting call. `INCOMPLETE` means the list grew
/// between the two calls, in which case the query starts over.
pub fn enumerate<T, S, F>(mut call: F) -> VkResult<Vec<T>>
where
    S: CallStatus,
    F: FnMut(*mut u32, *mut T) -> S,
{
    loop {
        let mut count = 0u32;
        call(&mut count as *mut u32, ptr::null_mut()).into_result().result()?;

        let mut data = Vec::with_capacity(count as usize);
        if count == 0 {
            return Ok(data);
        }

        match call(&mut count as *mut u32, data.as_mut_ptr()).into_result() {
            vk::Result::SUCCESS => {
                // SAFETY: the driver wrote `count` elements, never more than
                // the capacity it was given.
                unsafe { data.set_len(count as usize) };
                return Ok(data);
            }
            vk::Result::INCOMPLETE => continue,
            err => return Err(err),
        }
    }
}
