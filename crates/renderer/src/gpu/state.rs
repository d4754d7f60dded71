use std::mem::size_of;
use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::shader::{OVERLAY_FRAGMENT_GLSL, SMOKE_FRAGMENT_GLSL};
use crate::types::Antialiasing;

use super::context::GpuContext;
use super::pipeline::{FullscreenPass, PassBlend};
use super::uniforms::{OverlayUniforms, SmokeUniforms};

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

/// Frame counters reported once per second.
struct RenderStats {
    last_update: Instant,
    frames_since_update: u32,
    frames_per_second: f32,
    frame_count: u64,
}

impl RenderStats {
    fn new(now: Instant) -> Self {
        Self {
            last_update: now,
            frames_since_update: 0,
            frames_per_second: 0.0,
            frame_count: 0,
        }
    }

    fn record(&mut self, now: Instant, time: f32) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.frames_since_update += 1;
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_update as f32 / elapsed.as_secs_f32();
            self.frames_since_update = 0;
            self.last_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time,
                "render stats"
            );
        }
    }
}

pub(crate) struct GpuState {
    context: GpuContext,
    smoke: FullscreenPass,
    overlay: FullscreenPass,
    multisample_target: Option<MultisampleTarget>,
    stats: RenderStats,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing)?;

        let smoke = FullscreenPass::new(
            &context.device,
            "noir smoke",
            SMOKE_FRAGMENT_GLSL,
            size_of::<SmokeUniforms>() as u64,
            context.surface_format,
            context.sample_count,
            PassBlend::Replace,
        )?;
        let overlay = FullscreenPass::new(
            &context.device,
            "reveal overlay",
            OVERLAY_FRAGMENT_GLSL,
            size_of::<OverlayUniforms>() as u64,
            context.surface_format,
            context.sample_count,
            PassBlend::Over,
        )?;

        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            smoke,
            overlay,
            multisample_target,
            stats: RenderStats::new(Instant::now()),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Restores the swapchain after `Lost`/`Outdated`.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    pub(crate) fn render(
        &mut self,
        smoke: &SmokeUniforms,
        overlay: &OverlayUniforms,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame_acquisition_start = Instant::now();
        let frame = self.context.surface.get_current_texture()?;
        let frame_acquisition = frame_acquisition_start.elapsed();
        if self.stats.frames_per_second > 0.0 {
            let budget = Duration::from_secs_f32(1.0 / self.stats.frames_per_second);
            if frame_acquisition > budget * 2 {
                warn!(
                    acquisition_ms = frame_acquisition.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "acquiring frame exceeded the frame budget"
                );
            }
        }
        self.stats.record(Instant::now(), smoke.time);

        self.smoke.write(&self.context.queue, smoke);
        self.overlay.write(&self.context.queue, overlay);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (attachment_view, resolve_target) =
                if let Some(msaa) = self.multisample_target.as_ref() {
                    (&msaa.view, Some(&view))
                } else {
                    (&view, None)
                };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.smoke.draw(&mut render_pass);
            if overlay_is_visible(overlay) {
                self.overlay.draw(&mut render_pass);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn overlay_is_visible(overlay: &OverlayUniforms) -> bool {
    overlay.loader[2] > 0.5 || overlay.meta[0] > 0.0
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::*;

    #[test]
    fn overlay_skipped_when_nothing_to_draw() {
        let mut overlay = OverlayUniforms::zeroed();
        assert!(!overlay_is_visible(&overlay));
        overlay.loader[2] = 1.0;
        assert!(overlay_is_visible(&overlay));
        overlay.loader[2] = 0.0;
        overlay.meta[0] = 2.0;
        assert!(overlay_is_visible(&overlay));
    }
}
