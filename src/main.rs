use std::process::ExitCode;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::Key,
    window::{Window, WindowId},
};

// Import from the library crate
use donut::{
    logging, ui, DonutConfig, Error, Result,
    controller, view,
    utils::Mesh,
};

use controller::{FpsCounter, FrameClock, FrameLoopContext, FrameOutcome};
use controller::{InputEvent, InputProcessor, InputState, KeyBindings};
use view::{texture, GpuContext, Renderer};

/// Everything that exists once the window is up
struct Running {
    window: Arc<Window>,
    renderer: Renderer,
    frame_loop: FrameLoopContext<Renderer>,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,

    // Input handling
    input_state: InputState,
    input_processor: InputProcessor,

    // Frame timing
    clock: FrameClock,
    fps: FpsCounter,

    /// Set by window events; a held frame is presented again only when dirty
    overlay_dirty: bool,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &DonutConfig, mesh: &Mesh) -> Result<Self> {
        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));
        let window = event_loop
            .create_window(window_attributes)
            .map_err(|e| Error::setup(format!("failed to create window: {e}")))?;
        let window = Arc::new(window);
        let size = window.inner_size();

        let gpu = pollster::block_on(GpuContext::new_native(window.clone(), size.width, size.height))?;
        let image = texture::load_or_paint(config.texture_path.as_deref())?;
        let mut renderer = pollster::block_on(Renderer::new(gpu, config, &image))?;
        renderer.enable_overlay();

        let frame_loop = FrameLoopContext::new(&mut renderer, mesh, config.rotation_period, config.resume_mode);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            renderer,
            frame_loop,
            egui_ctx,
            egui_state,
            input_state: InputState::new(),
            input_processor: InputProcessor::new(KeyBindings { toggle_pause: config.toggle_key.clone() }),
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            overlay_dirty: true,
        })
    }

    fn input(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event: KeyEvent { state: ElementState::Pressed, logical_key: Key::Character(key), repeat: false, .. },
            ..
        } = event
        {
            self.input_state
                .process_event(&InputEvent::KeyDown(key.to_string()), &self.input_processor);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, config: &DonutConfig) {
        let now = self.clock.elapsed();
        let fps = self.fps.tick(now);

        // UI runs first so its events land before the frame reads input
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut events = Vec::new();
        let output = self.egui_ctx.run(raw_input, |ctx| {
            events = ui::build_ui(ctx, &self.input_state, &config.slider_range, &config.toggle_key, fps);
        });
        let repaint = ui::needs_repaint(&output) | std::mem::take(&mut self.overlay_dirty);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        for event in &events {
            self.input_state.process_event(event, &self.input_processor);
        }

        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        self.renderer.stage_overlay(primitives, output.textures_delta, output.pixels_per_point);

        let result = match self.frame_loop.tick(now, &self.input_state, &mut self.renderer) {
            Ok(FrameOutcome::Drawn) => Ok(()),
            // The scene is held; present it again only when the controls changed
            Ok(FrameOutcome::Held) if repaint => self.renderer.present_held(self.frame_loop.mesh()),
            Ok(FrameOutcome::Held) => Ok(()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => self.renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => tracing::warn!("frame skipped: {e}"),
        }
    }
}

struct App {
    config: DonutConfig,
    mesh: Mesh,
    running: Option<Running>,
    failed: bool,
}

impl App {
    fn new(config: DonutConfig, mesh: Mesh) -> Self {
        Self { config, mesh, running: None, failed: false }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match Running::new(event_loop, &self.config, &self.mesh) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                // Setup failures are reported once and never retried
                tracing::error!("{e}");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else { return };
        if window_id != running.window.id() {
            return;
        }

        // egui sees every event; keys it consumes do not reach the toggle
        let response = running.egui_state.on_window_event(&running.window, &event);
        running.overlay_dirty |= response.repaint;
        let consumed = response.consumed;

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                running.renderer.resize(size.width, size.height);
                running.overlay_dirty = true;
            }
            WindowEvent::RedrawRequested => running.redraw(event_loop, &self.config),
            ref other if !consumed => running.input(other),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.window.request_redraw();
        }
    }
}

fn main() -> ExitCode {
    logging::init();

    let config = DonutConfig::from_env();
    tracing::info!(torus = ?config.torus, period = config.rotation_period, "starting donut");

    let mesh = match config.torus.generate() {
        Ok(mesh) => mesh,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(config, mesh);
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("event loop terminated: {e}");
        return ExitCode::FAILURE;
    }

    if app.failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
