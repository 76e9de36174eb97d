//! Fixture helpers shared by pipeline tests.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// A diagonal RGB gradient, so dithering and resampling have real work to do.
pub(crate) fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 255 / (width + height).max(1)) as u8;
        Rgb([r, g, b])
    })
}

/// Write a gradient image; the format follows the extension.
pub(crate) fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height).save(path).unwrap();
}

/// Create `<root>/stack` holding one `width`x`height` image per name.
pub(crate) fn stack_dir(root: &Path, names: &[&str], width: u32, height: u32) -> PathBuf {
    let stack = root.join("stack");
    std::fs::create_dir_all(&stack).unwrap();
    for name in names {
        write_image(&stack.join(name), width, height);
    }
    stack
}

/// Every pixel of a grayscale image is pure black or pure white.
pub(crate) fn is_bilevel(image: &image::GrayImage) -> bool {
    image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
}
