use winit::dpi::{PhysicalPosition, PhysicalSize};

/// Window geometry in the three spaces the renderer cares about: physical
/// surface pixels, logical (scale-independent) pixels, and the capped render
/// resolution fed to the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    surface: PhysicalSize<u32>,
    scale_factor: f64,
    max_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(surface: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f32) -> Self {
        Self {
            surface,
            scale_factor: sanitise_scale(scale_factor),
            max_pixel_ratio,
        }
    }

    pub fn resize(&mut self, surface: PhysicalSize<u32>) {
        self.surface = surface;
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = sanitise_scale(scale_factor);
    }

    pub fn surface_size(&self) -> PhysicalSize<u32> {
        self.surface
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// `min(scale_factor, max_pixel_ratio)`.
    pub fn pixel_ratio(&self) -> f32 {
        (self.scale_factor as f32).min(self.max_pixel_ratio)
    }

    pub fn logical_size(&self) -> [f32; 2] {
        let scale = self.scale_factor as f32;
        [
            self.surface.width as f32 / scale,
            self.surface.height as f32 / scale,
        ]
    }

    /// Logical size multiplied by the capped pixel ratio.
    pub fn render_resolution(&self) -> [f32; 2] {
        let [width, height] = self.logical_size();
        let ratio = self.pixel_ratio();
        [width * ratio, height * ratio]
    }

    /// Factor mapping surface pixels onto render-resolution pixels.
    pub fn frag_scale(&self) -> [f32; 2] {
        let [res_x, res_y] = self.render_resolution();
        let width = self.surface.width.max(1) as f32;
        let height = self.surface.height.max(1) as f32;
        [res_x / width, res_y / height]
    }

    pub fn is_empty(&self) -> bool {
        self.surface.width == 0 || self.surface.height == 0
    }

    /// Normalises a window position to `[0,1]²` with a bottom-left origin.
    pub fn normalize(&self, position: PhysicalPosition<f64>) -> Option<[f32; 2]> {
        if self.is_empty() {
            return None;
        }
        let x = position.x / self.surface.width as f64;
        let y = 1.0 - position.y / self.surface.height as f64;
        Some([x as f32, y as f32])
    }

    /// Converts a distance in logical pixels into a fraction of the height.
    pub fn logical_to_unit_y(&self, logical: f32) -> f32 {
        let [_, height] = self.logical_size();
        if height > 0.0 {
            logical / height
        } else {
            0.0
        }
    }
}

fn sanitise_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}
