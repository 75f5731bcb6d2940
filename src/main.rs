// =============================================================================
// PRISM - Vulkan device and swapchain bring-up
// =============================================================================
//
// Opens a window, negotiates everything needed to present to it, and then
// waits for the window to be closed.
//
// FLOW:
// 1. Load config.toml and set up logging
// 2. Create the window once the event loop is running
// 3. Run the negotiation pipeline against the window surface
// 4. Idle until Escape or close, then release everything in reverse order
//
// The swapchain is never recreated, so the window is not resizable.
//
// =============================================================================

use anyhow::Result;
use log::LevelFilter;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use prism::backend::VulkanBackend;
use prism::config::Config;
use prism::diagnostics;
use prism::pipeline::{self, GfxContext, GfxSettings};
use prism::window::WindowSurface;
use prism::GfxError;

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml, report it once logging is up
    let (config, source) = Config::load();

    init_logging(config.log_level());
    source.log(&config);
    log::info!("Starting prism");
    log::info!(
        "Window: {}x{} \"{}\"",
        config.window.width,
        config.window.height,
        config.window.title
    );

    let settings = config.gfx_settings()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, settings);
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Initialize logging. RUST_LOG overrides the configured level.
fn init_logging(level: LevelFilter) {
    use env_logger::Builder;

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Logs the error and exits with status 1.
fn fatal(err: &GfxError) -> ! {
    diagnostics::report_fatal(err.subsystem(), err.result_name(), err)
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// IMPORTANT: Field order matters for Drop! The graphics context holds a
/// surface created from the window, so it must go first.
struct App {
    config: Config,
    settings: GfxSettings,

    gfx: Option<GfxContext<VulkanBackend>>,
    window: Option<Window>,
}

impl App {
    fn new(config: Config, settings: GfxSettings) -> Self {
        Self {
            config,
            settings,
            gfx: None,
            window: None,
        }
    }

    fn init_graphics(&self, window: &Window) -> Result<GfxContext<VulkanBackend>, GfxError> {
        log::info!("Initializing Vulkan...");

        let backend = VulkanBackend::load()?;
        let gfx = pipeline::initialize(backend, &WindowSurface::new(window), &self.settings)?;

        log::info!("Vulkan initialized successfully!");
        Ok(gfx)
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
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => w,
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        match self.init_graphics(&window) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(err) => fatal(&err),
        }

        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed() && event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    log::info!("ESC pressed, exiting...");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

// =============================================================================
// CLEANUP
// =============================================================================

impl Drop for App {
    fn drop(&mut self) {
        log::info!("Cleaning up Vulkan resources...");

        // Context before window.
        self.gfx = None;
        self.window = None;

        log::info!("Cleanup complete");
    }
}
