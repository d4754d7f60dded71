//! Renderer crate for noirsmoke.
//!
//! Glues the `winit` window, the `wgpu` pipeline and the reveal timeline
//! together. The overall flow is:
//!
//! ```text
//!   noirsmoke CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          │                                      │
//!          │                                      ├─▶ SmokeUniforms   ─▶ smoke pass
//!          │                                      └─▶ OverlayUniforms ─▶ overlay pass
//!          └─▶ export::render_still (CPU mirror) ─▶ PNG
//! ```
//!
//! `WindowState` owns the GPU resources, the smoothed pointer and the reveal
//! sequencer. The smoke program exists twice: as GLSL in [`shader`] for the
//! GPU and as a plain Rust mirror in [`noir`] for still exports and tests.

mod gpu;
mod window;

pub mod export;
pub mod noir;
pub mod pointer;
pub mod runtime;
pub mod shader;
pub mod types;
pub mod viewport;

use anyhow::Result;

pub use runtime::RenderPolicy;
pub use types::{Antialiasing, RendererConfig};

/// Entry point used by the CLI.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the landing window, or writes a still frame for export policies.
    pub fn run(self) -> Result<()> {
        match &self.config.policy {
            RenderPolicy::Animate { target_fps } => {
                tracing::info!(
                    width = self.config.surface_size.0,
                    height = self.config.surface_size.1,
                    target_fps = ?target_fps,
                    antialiasing = ?self.config.antialiasing,
                    "launching landing window"
                );
                window::run(self.config)
            }
            RenderPolicy::Export { path, .. } => {
                let mut clock = runtime::time_source_for_policy(&self.config.policy);
                let time = clock.sample().seconds;
                export::render_still(self.config.surface_size, time, path).map(|_| ())
            }
        }
    }
}
