//! GPU orchestration for the landing window.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` builds a full-screen pass around one fragment program and
//!   its uniform block.
//! - `uniforms` packs smoke and overlay parameters into std140 blocks.
//! - `state` draws smoke then overlay into one render pass and exposes the
//!   `GpuState` API used by `window`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
pub(crate) use uniforms::{OverlayUniforms, SmokeUniforms};
