use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use reveal::{RevealSequencer, Timeline};
use sceneconfig::Panel;
use tracing::{error, info, warn};
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::{GpuState, OverlayUniforms, SmokeUniforms};
use crate::pointer::PointerState;
use crate::runtime::{time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy};
use crate::types::RendererConfig;
use crate::viewport::Viewport;

/// Everything the redraw cycle touches. `gpu` is declared before `window`
/// so the surface is dropped while its window is still alive.
pub(crate) struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
    viewport: Viewport,
    pointer: PointerState,
    reveal: RevealSequencer,
    panels: Vec<Panel>,
    time_source: BoxedTimeSource,
    scheduler: FrameScheduler,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config.antialiasing)?;

        let scene = &config.scene;
        let viewport = Viewport::new(
            size,
            window.scale_factor(),
            scene.display.max_pixel_ratio,
        );

        let mut reveal = RevealSequencer::start(Timeline::from_config(scene), Instant::now());
        if config.skip_reveal {
            reveal.skip();
        }

        let target_fps = match &config.policy {
            RenderPolicy::Animate { target_fps } => *target_fps,
            RenderPolicy::Export { .. } => None,
        };

        let [res_x, res_y] = viewport.render_resolution();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = viewport.scale_factor(),
            res_x,
            res_y,
            panels = scene.panels.len(),
            target_fps = ?target_fps,
            "landing window ready"
        );

        Ok(Self {
            gpu,
            window,
            viewport,
            pointer: PointerState::new(scene.pointer.smoothing),
            reveal,
            panels: scene.panels.clone(),
            time_source: time_source_for_policy(&config.policy),
            scheduler: FrameScheduler::new(target_fps),
        })
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.viewport.resize(new_size);
        self.gpu.resize(new_size);
    }

    pub(crate) fn set_scale_factor(&mut self, scale_factor: f64) {
        self.viewport.set_scale_factor(scale_factor);
        let [res_x, res_y] = self.viewport.render_resolution();
        tracing::debug!(scale_factor, res_x, res_y, "scale factor changed");
    }

    pub(crate) fn handle_pointer(&mut self, position: PhysicalPosition<f64>) {
        if let Some(target) = self.viewport.normalize(position) {
            self.pointer.set_target(target);
        }
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        if self.viewport.is_empty() {
            return Ok(());
        }
        let now = Instant::now();
        let sample = self.time_source.sample();
        let smoothed = self.pointer.step();
        let frame = self.reveal.frame(now);

        let smoke = SmokeUniforms::new(sample.seconds, smoothed, &self.viewport);
        let overlay =
            OverlayUniforms::from_frame(&frame, &self.panels, self.pointer.target(), &self.viewport);

        self.gpu.render(&smoke, &overlay)?;
        self.scheduler.mark_rendered(now);
        Ok(())
    }

    fn recover_surface(&mut self) {
        tracing::debug!(size = ?self.gpu.size(), "reconfiguring lost surface");
        self.gpu.reconfigure();
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Opens the landing window and drives it until it is closed.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title("noirsmoke")
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err}"))?;
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if is_escape(&event) {
                            info!("escape pressed; closing");
                            elwt.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_pointer(position);
                    }
                    WindowEvent::Touch(Touch {
                        phase: TouchPhase::Started | TouchPhase::Moved,
                        location,
                        ..
                    }) => {
                        state.handle_pointer(location);
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        state.set_scale_factor(scale_factor);
                    }
                    WindowEvent::RedrawRequested => match state.render_frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.recover_surface();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!(error = ?other, "surface error; retrying next frame");
                        }
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if state.scheduler.ready_for_frame(now) {
                    tracing::trace!("scheduler: issuing redraw now");
                    state.window().request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = state.scheduler.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
