use bytemuck::{Pod, Zeroable};
use reveal::RevealFrame;
use sceneconfig::{Panel, MAX_PANELS};

use crate::viewport::Viewport;

/// Loader bar width in logical pixels.
pub(crate) const LOADER_BAR_WIDTH: f32 = 240.0;
/// Loader bar height in logical pixels.
pub(crate) const LOADER_BAR_HEIGHT: f32 = 2.0;

/// Mirrors the `SmokeParams` std140 block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SmokeUniforms {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub frag_scale: [f32; 2],
    pub surface: [f32; 2],
    pub time: f32,
    pub padding: [f32; 3],
}

unsafe impl Zeroable for SmokeUniforms {}
unsafe impl Pod for SmokeUniforms {}

impl SmokeUniforms {
    pub fn new(time: f32, mouse: [f32; 2], viewport: &Viewport) -> Self {
        let surface = viewport.surface_size();
        Self {
            resolution: viewport.render_resolution(),
            mouse,
            frag_scale: viewport.frag_scale(),
            surface: [surface.width as f32, surface.height as f32],
            time,
            padding: [0.0; 3],
        }
    }
}

/// Mirrors the `OverlayParams` std140 block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OverlayUniforms {
    /// Bar progress, loader opacity, loader visible, loaded.
    pub loader: [f32; 4],
    /// Surface width/height, pointer with a top-left origin.
    pub viewport: [f32; 4],
    /// Panel count, bar width and height as fractions of the window.
    pub meta: [f32; 4],
    pub panel_rect: [[f32; 4]; MAX_PANELS],
    pub panel_color: [[f32; 4]; MAX_PANELS],
    /// Opacity, downward offset, hover boost, hovered.
    pub panel_state: [[f32; 4]; MAX_PANELS],
}

unsafe impl Zeroable for OverlayUniforms {}
unsafe impl Pod for OverlayUniforms {}

impl OverlayUniforms {
    /// Packs a reveal frame for the overlay pass. `pointer` is the raw target
    /// (bottom-left origin); hover only applies once the scene is loaded.
    pub fn from_frame(
        frame: &RevealFrame,
        panels: &[Panel],
        pointer: [f32; 2],
        viewport: &Viewport,
    ) -> Self {
        let surface = viewport.surface_size();
        let [logical_w, logical_h] = viewport.logical_size();
        let pointer_top_left = [pointer[0], 1.0 - pointer[1]];

        let mut uniforms = Self::zeroed();
        uniforms.loader = [
            frame.bar_progress,
            frame.loader_opacity,
            flag(frame.loader_visible),
            flag(frame.loaded),
        ];
        uniforms.viewport = [
            surface.width as f32,
            surface.height as f32,
            pointer_top_left[0],
            pointer_top_left[1],
        ];

        let count = panels.len().min(frame.panels.len()).min(MAX_PANELS);
        uniforms.meta = [
            count as f32,
            fraction(LOADER_BAR_WIDTH, logical_w),
            fraction(LOADER_BAR_HEIGHT, logical_h),
            0.0,
        ];

        for (index, (panel, reveal)) in panels.iter().zip(&frame.panels).take(count).enumerate() {
            let hovered = frame.loaded && panel.contains(pointer_top_left[0], pointer_top_left[1]);
            uniforms.panel_rect[index] = [panel.x, panel.y, panel.width, panel.height];
            uniforms.panel_color[index] = panel.color;
            uniforms.panel_state[index] = [
                reveal.opacity,
                viewport.logical_to_unit_y(reveal.offset),
                if hovered { panel.hover } else { 0.0 },
                flag(hovered),
            ];
        }
        uniforms
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn fraction(value: f32, total: f32) -> f32 {
    if total > 0.0 {
        (value / total).min(1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};
    use std::time::Duration;

    use reveal::Timeline;
    use sceneconfig::SceneConfig;
    use winit::dpi::PhysicalSize;

    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(PhysicalSize::new(1000, 500), 1.0, 2.0)
    }

    #[test]
    fn smoke_block_matches_std140() {
        assert_eq!(size_of::<SmokeUniforms>(), 48);
        assert_eq!(offset_of!(SmokeUniforms, resolution), 0);
        assert_eq!(offset_of!(SmokeUniforms, mouse), 8);
        assert_eq!(offset_of!(SmokeUniforms, frag_scale), 16);
        assert_eq!(offset_of!(SmokeUniforms, surface), 24);
        assert_eq!(offset_of!(SmokeUniforms, time), 32);
    }

    #[test]
    fn overlay_block_matches_std140() {
        assert_eq!(size_of::<OverlayUniforms>(), 432);
        assert_eq!(offset_of!(OverlayUniforms, loader), 0);
        assert_eq!(offset_of!(OverlayUniforms, viewport), 16);
        assert_eq!(offset_of!(OverlayUniforms, meta), 32);
        assert_eq!(offset_of!(OverlayUniforms, panel_rect), 48);
        assert_eq!(offset_of!(OverlayUniforms, panel_color), 176);
        assert_eq!(offset_of!(OverlayUniforms, panel_state), 304);
    }

    #[test]
    fn smoke_uniforms_carry_viewport() {
        let uniforms = SmokeUniforms::new(1.5, [0.2, 0.8], &viewport());
        assert_eq!(uniforms.resolution, [1000.0, 500.0]);
        assert_eq!(uniforms.surface, [1000.0, 500.0]);
        assert_eq!(uniforms.frag_scale, [1.0, 1.0]);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.mouse, [0.2, 0.8]);
    }

    #[test]
    fn hover_requires_loaded_scene() {
        let config = SceneConfig::default();
        let timeline = Timeline::from_config(&config);
        let panel = &config.panels[0];
        let over_panel = [
            panel.x + panel.width * 0.5,
            1.0 - (panel.y + panel.height * 0.5),
        ];

        let loading = timeline.sample(Duration::ZERO);
        let uniforms = OverlayUniforms::from_frame(&loading, &config.panels, over_panel, &viewport());
        assert!(uniforms.panel_state.iter().all(|state| state[3] == 0.0));
        assert_eq!(uniforms.loader[2], 1.0);

        let loaded = timeline.finished_frame();
        let uniforms = OverlayUniforms::from_frame(&loaded, &config.panels, over_panel, &viewport());
        let hovered: Vec<_> = uniforms.panel_state.iter().map(|state| state[3]).collect();
        assert_eq!(hovered[..3], [1.0, 0.0, 0.0]);
        assert_eq!(uniforms.panel_state[0][2], panel.hover);
        assert_eq!(uniforms.loader[3], 1.0);
    }

    #[test]
    fn pending_panels_sit_lowered_and_transparent() {
        let config = SceneConfig::default();
        let frame = Timeline::from_config(&config).sample(Duration::from_millis(2200));
        let uniforms = OverlayUniforms::from_frame(&frame, &config.panels, [0.0, 0.0], &viewport());
        assert_eq!(uniforms.meta[0], 3.0);
        assert_eq!(uniforms.panel_state[2][0], 0.0);
        assert!((uniforms.panel_state[2][1] - 40.0 / 500.0).abs() < 1e-6);
        assert!((uniforms.meta[1] - 0.24).abs() < 1e-6);
    }
}
