use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};

use crate::noir::{shade, SmokeInputs};
use crate::pointer::POINTER_ORIGIN;

/// Renders the smoke background at `time` on the CPU and writes a PNG.
///
/// `size` is used directly as the render resolution; the pointer rests at
/// its initial centred position.
pub fn render_still(size: (u32, u32), time: f32, path: &Path) -> Result<PathBuf> {
    let image = render_image(size, time, POINTER_ORIGIN)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = size.0,
        height = size.1,
        time,
        "still frame exported"
    );
    Ok(path.to_path_buf())
}

pub(crate) fn render_image(size: (u32, u32), time: f32, mouse: [f32; 2]) -> Result<RgbaImage> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        bail!("still export needs a non-empty size, got {width}x{height}");
    }
    if !time.is_finite() {
        bail!("still export time must be finite");
    }

    let inputs = SmokeInputs::new(time, [width as f32, height as f32], mouse);
    Ok(RgbaImage::from_fn(width, height, |x, y| {
        // Image rows run top-down, fragment coordinates bottom-up.
        let frag_coord = [x as f32 + 0.5, (height - y) as f32 - 0.5];
        let [r, g, b] = shade(frag_coord, &inputs);
        Rgba([to_byte(r), to_byte(g), to_byte(b), 255])
    }))
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_png_of_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("still.png");
        let written = render_still((32, 18), 1.25, &path).unwrap();
        assert_eq!(written, path);

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (32, 18));
        assert!(decoded.pixels().all(|pixel| pixel[3] == 255));
    }

    #[test]
    fn image_matches_cpu_shader() {
        let image = render_image((16, 8), 3.0, POINTER_ORIGIN).unwrap();
        let inputs = SmokeInputs::new(3.0, [16.0, 8.0], POINTER_ORIGIN);
        let [r, g, b] = shade([0.5, 7.5], &inputs);
        let top_left = image.get_pixel(0, 0);
        assert_eq!(top_left[0], to_byte(r));
        assert_eq!(top_left[1], to_byte(g));
        assert_eq!(top_left[2], to_byte(b));
    }

    #[test]
    fn same_time_gives_same_image() {
        let first = render_image((24, 24), 5.0, POINTER_ORIGIN).unwrap();
        let second = render_image((24, 24), 5.0, POINTER_ORIGIN).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn rejects_empty_size() {
        assert!(render_image((0, 10), 0.0, POINTER_ORIGIN).is_err());
        assert!(render_image((10, 10), f32::INFINITY, POINTER_ORIGIN).is_err());
    }

    #[test]
    fn channel_quantisation_clamps() {
        assert_eq!(to_byte(-0.3), 0);
        assert_eq!(to_byte(1.7), 255);
        assert_eq!(to_byte(0.5), 128);
    }
}
