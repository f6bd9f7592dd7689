// =============================================================================
// VULKAN HELLO TRIANGLE - one static triangle on a solid background
// =============================================================================
//
// A tutorial-sized program showing the full sequence of setup calls needed
// to get a pixel on screen with raw Vulkan:
//
//   window -> instance -> surface -> device -> swapchain -> render pass
//   -> pipeline -> command buffer -> frame loop (wait, acquire, record,
//   submit, present)
//
// Every Vulkan object is created once at startup and lives until exit.
// Exactly one frame is in flight: the CPU blocks on a single fence before
// starting the next frame. Swapchain recreation on resize is deliberately
// not implemented; a stale swapchain is logged and the frame skipped.
//
// =============================================================================

mod backend;
mod config;

use anyhow::{Context, Result};
use ash::vk;
use backend::{shader, sync::FrameSync, Swapchain, VulkanDevice};
use config::Config;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

/// Compiled shader binaries, loaded at startup. Their absence is fatal.
const VERT_SHADER_PATH: &str = "shaders/triangle.vert.spv";
const FRAG_SHADER_PATH: &str = "shaders/triangle.frag.spv";

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();
    log::info!("Starting Vulkan triangle");
    log::info!(
        "Window: {}x{} at ({}, {})",
        config.window.width,
        config.window.height,
        config.window.position[0],
        config.window.position[1],
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Main application struct holding all Vulkan resources.
///
/// Resources are destroyed in reverse order of creation in Drop.
/// Either init_vulkan populates everything or the frame loop never runs.
struct App {
    config: Config,

    // Window
    window: Option<Arc<Window>>,

    // Vulkan core
    device: Option<Arc<VulkanDevice>>,
    swapchain: Option<Swapchain>,

    // Fixed per-process render objects
    render_pass: Option<vk::RenderPass>,
    framebuffers: Vec<vk::Framebuffer>,
    pipeline: Option<vk::Pipeline>,
    pipeline_layout: Option<vk::PipelineLayout>,

    // Commands: a single buffer, reset and re-recorded every frame
    command_pool: Option<vk::CommandPool>,
    command_buffer: Option<vk::CommandBuffer>,

    // Synchronization for the one frame in flight
    frame_sync: Option<FrameSync>,

    // Pre-allocated to avoid per-frame heap allocations
    wait_stages: [vk::PipelineStageFlags; 1],

    // FPS tracking
    frame_count: u32,
    last_fps_update: Instant,
    last_frame_time: Instant,
}

impl App {
    fn new(config: Config) -> Self {
        let now = Instant::now();
        Self {
            config,
            window: None,
            device: None,
            swapchain: None,
            render_pass: None,
            framebuffers: Vec::new(),
            pipeline: None,
            pipeline_layout: None,
            command_pool: None,
            command_buffer: None,
            frame_sync: None,
            wait_stages: [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
            frame_count: 0,
            last_fps_update: now,
            last_frame_time: now,
        }
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Create every Vulkan object the frame loop needs, in order:
    /// device, swapchain, shaders, render pass, framebuffers, pipeline,
    /// command pool + buffer, sync objects.
    fn init_vulkan(&mut self, window: Arc<Window>) -> Result<()> {
        log::info!("Initializing Vulkan...");

        let enable_validation = cfg!(debug_assertions) && self.config.debug.validation_layers;
        let device = VulkanDevice::new(
            window.raw_display_handle(),
            window.raw_window_handle(),
            &self.config.window.title,
            enable_validation,
        )?;

        let size = window.inner_size();
        let swapchain = Swapchain::new(device.clone(), size.width, size.height)?;

        // Shader binaries must exist and be well formed, or startup fails
        let vert_bytes = shader::load_spirv(VERT_SHADER_PATH)?;
        let frag_bytes = shader::load_spirv(FRAG_SHADER_PATH)?;
        log::info!(
            "Loaded shaders: {} ({} bytes), {} ({} bytes)",
            VERT_SHADER_PATH,
            vert_bytes.len(),
            FRAG_SHADER_PATH,
            frag_bytes.len()
        );

        let vert_module = shader::create_shader_module(&device, &vert_bytes)?;
        let frag_module = shader::create_shader_module(&device, &frag_bytes)?;

        let render_pass = backend::pipeline::create_render_pass(&device, swapchain.format)?;
        let framebuffers = backend::pipeline::create_framebuffers(
            &device,
            &swapchain.image_views,
            render_pass,
            swapchain.extent,
        )?;

        let pipeline_result = backend::pipeline::create_graphics_pipeline(
            &device,
            render_pass,
            swapchain.extent,
            vert_module,
            frag_module,
        );

        // Modules are only needed for pipeline creation
        unsafe {
            device.device.destroy_shader_module(vert_module, None);
            device.device.destroy_shader_module(frag_module, None);
        }
        let (pipeline, pipeline_layout) = pipeline_result?;

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(device.queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let command_pool = unsafe { device.device.create_command_pool(&pool_info, None) }
            .context("Failed to create command pool")?;

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe { device.device.allocate_command_buffers(&alloc_info) }
            .context("Failed to allocate command buffer")?;

        let frame_sync = FrameSync::new(&device)?;

        self.device = Some(device);
        self.swapchain = Some(swapchain);
        self.render_pass = Some(render_pass);
        self.framebuffers = framebuffers;
        self.pipeline = Some(pipeline);
        self.pipeline_layout = Some(pipeline_layout);
        self.command_pool = Some(command_pool);
        self.command_buffer = Some(command_buffers[0]);
        self.frame_sync = Some(frame_sync);

        log::info!("Vulkan initialized successfully!");
        Ok(())
    }

    // =========================================================================
    // RENDER LOOP
    // =========================================================================

    /// Render a single frame: wait for the previous one, acquire an image,
    /// re-record the command buffer, submit, present.
    ///
    /// Returns false when the frame was skipped (stale swapchain).
    fn render_frame(&mut self) -> Result<bool> {
        let device = self.device.as_ref().context("Device not initialized")?;
        let swapchain = self.swapchain.as_ref().context("Swapchain not initialized")?;
        let sync = self.frame_sync.as_ref().context("Sync not initialized")?;
        let render_pass = self.render_pass.context("Render pass not initialized")?;
        let pipeline = self.pipeline.context("Pipeline not initialized")?;
        let cmd = self.command_buffer.context("Command buffer not initialized")?;

        // Wait for the previous frame before touching any shared resource
        unsafe {
            device
                .device
                .wait_for_fences(&[sync.in_flight_fence], true, u64::MAX)?;
        }

        let (image_index, stale) =
            swapchain.acquire_next_image(u64::MAX, sync.image_available)?;
        if stale {
            // Window likely resized; recreation is not implemented
            log::warn!("Swapchain is stale, skipping recreation");
        }
        let Some(image_index) = image_index else {
            // Nothing was acquired and nothing will signal the fence,
            // so it must stay signaled for the next iteration
            return Ok(false);
        };

        unsafe {
            device.device.reset_fences(&[sync.in_flight_fence])?;
        }

        self.record_commands(device, swapchain, render_pass, pipeline, cmd, image_index)?;

        let wait_semaphores = [sync.image_available];
        let signal_semaphores = [sync.render_finished];
        let command_buffers = [cmd];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&self.wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device
                .device
                .queue_submit(device.queue, &[submit_info.build()], sync.in_flight_fence)
                .context("Failed to submit draw command buffer")?;
        }

        let suboptimal =
            swapchain.present(device.queue, image_index, &[sync.render_finished])?;
        if suboptimal {
            log::warn!("Swapchain is stale after present, skipping recreation");
        }

        Ok(true)
    }

    /// Record the fixed command sequence for one frame: clear to the
    /// configured color, bind the pipeline, draw three vertices.
    fn record_commands(
        &self,
        device: &VulkanDevice,
        swapchain: &Swapchain,
        render_pass: vk::RenderPass,
        pipeline: vk::Pipeline,
        cmd: vk::CommandBuffer,
        image_index: u32,
    ) -> Result<()> {
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.config.graphics.clear_color,
            },
        }];

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: swapchain.extent,
        };

        unsafe {
            device
                .device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())?;

            let begin_info = vk::CommandBufferBeginInfo::builder();
            device.device.begin_command_buffer(cmd, &begin_info)?;

            let render_pass_begin = vk::RenderPassBeginInfo::builder()
                .render_pass(render_pass)
                .framebuffer(self.framebuffers[image_index as usize])
                .render_area(render_area)
                .clear_values(&clear_values);

            device
                .device
                .cmd_begin_render_pass(cmd, &render_pass_begin, vk::SubpassContents::INLINE);

            device
                .device
                .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);

            // The triangle's three vertices come from the vertex shader
            device.device.cmd_draw(cmd, 3, 1, 0, 0);

            device.device.cmd_end_render_pass(cmd);
            device.device.end_command_buffer(cmd)?;
        }

        Ok(())
    }

    // =========================================================================
    // FPS TRACKING
    // =========================================================================

    fn update_fps(&mut self) {
        if !self.config.debug.show_fps {
            return;
        }

        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.frame_count += 1;

        // Update title every second
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f32 / elapsed;

            if let Some(ref window) = self.window {
                window.set_title(&format!(
                    "{} - {:.0} FPS ({:.2}ms)",
                    self.config.window.title,
                    fps,
                    frame_time * 1000.0,
                ));
            }

            self.frame_count = 0;
            self.last_fps_update = now;
        }
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_position(winit::dpi::PhysicalPosition::new(
                self.config.window.position[0],
                self.config.window.position[1],
            ))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        // All-or-nothing: any startup failure exits before the frame loop
        if let Err(e) = self.init_vulkan(window.clone()) {
            log::error!("Failed to initialize Vulkan: {:?}", e);
            event_loop.exit();
            return;
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                // Finish the in-flight frame so shutdown lands on an
                // iteration boundary
                if let Some(ref device) = self.device {
                    let _ = device.wait_idle();
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                // Logged only; the swapchain keeps its startup extent
                log::info!("Window resized to {}x{}", size.width, size.height);
            }

            WindowEvent::RedrawRequested => {
                match self.render_frame() {
                    Ok(rendered) => {
                        if rendered {
                            self.update_fps();
                        }
                    }
                    Err(e) => {
                        log::error!("Render error: {:?}", e);
                        event_loop.exit();
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed() {
                    if let PhysicalKey::Code(KeyCode::Escape) = event.physical_key {
                        log::info!("ESC pressed, exiting...");
                        if let Some(ref device) = self.device {
                            let _ = device.wait_idle();
                        }
                        event_loop.exit();
                    }
                }
            }

            _ => {}
        }
    }

    /// Request continuous redraws: the loop renders every iteration.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

// =============================================================================
// CLEANUP
// =============================================================================

impl Drop for App {
    fn drop(&mut self) {
        log::info!("Cleaning up Vulkan resources...");

        if let Some(ref device) = self.device {
            // Wait for GPU to finish before destroying anything
            let _ = device.wait_idle();

            unsafe {
                // Destroy in reverse order of creation
                if let Some(sync) = self.frame_sync.take() {
                    sync.destroy(&device.device);
                }

                // Command pool also frees its command buffer
                if let Some(pool) = self.command_pool.take() {
                    device.device.destroy_command_pool(pool, None);
                }

                if let Some(pipeline) = self.pipeline.take() {
                    device.device.destroy_pipeline(pipeline, None);
                }
                if let Some(layout) = self.pipeline_layout.take() {
                    device.device.destroy_pipeline_layout(layout, None);
                }

                for framebuffer in self.framebuffers.drain(..) {
                    device.device.destroy_framebuffer(framebuffer, None);
                }

                if let Some(render_pass) = self.render_pass.take() {
                    device.device.destroy_render_pass(render_pass, None);
                }

                // Swapchain, surface, and device drop automatically
            }
        }

        log::info!("Cleanup complete");
    }
}
