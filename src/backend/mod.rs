// Backend module - Vulkan abstraction layer
//
// Thin wrappers around ash: device, swapchain, pipeline, shaders, sync.
// Every object here is created once at startup and lives until exit.

pub mod device;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use device::VulkanDevice;
pub use swapchain::Swapchain;
