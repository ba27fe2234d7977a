//! Point transforms and image resampling
//!
//! [`PointTransform`] is the pixel-to-pixel mapping a deformation model
//! exposes. [`warp_image`] uses one as a backward map to resample an image.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Maps a pixel coordinate to another pixel coordinate
pub trait PointTransform: Sync {
    fn transform_point(&self, x: f64, y: f64) -> (f64, f64);
}

/// Resample `src` through `transform`.
///
/// Each output pixel `(x, y)` takes the color found at
/// `transform.transform_point(x, y)` in the source, using bilinear
/// interpolation. Samples outside the source are clamped to its edge.
pub fn warp_image<T: PointTransform + ?Sized>(transform: &T, src: &RgbaImage) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut dst = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return dst;
    }

    let stride = width as usize * 4;
    dst.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(dst_y, row)| {
            for (dst_x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let (src_x, src_y) = transform.transform_point(dst_x as f64, dst_y as f64);
                pixel.copy_from_slice(&bilinear_sample(src, src_x, src_y).0);
            }
        });

    dst
}

/// Bilinear interpolation sampling with edge clamping
#[inline]
fn bilinear_sample(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return Rgba([0, 0, 0, 0]);
    }

    // Clamp coordinates
    let x = x.max(0.0).min((width - 1) as f64);
    let y = y.max(0.0).min((height - 1) as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x1, y0);
    let p01 = src.get_pixel(x0, y1);
    let p11 = src.get_pixel(x1, y1);

    let mut result = [0u8; 4];
    for c in 0..4 {
        let value = p00[c] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f64 * fx * (1.0 - fy)
            + p01[c] as f64 * (1.0 - fx) * fy
            + p11[c] as f64 * fx * fy;

        result[c] = value.round().clamp(0.0, 255.0) as u8;
    }

    Rgba(result)
}
