use image::{imageops, Rgba, RgbaImage};

use crate::geometry::Rect;

/// Whole-image filter applied before redactions are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFilter {
    #[default]
    None,
    Grayscale,
}

/// Gaussian radius used by the blur redaction.
pub(super) const BLUR_SIGMA: f32 = 6.0;

const PIXELATE_MIN_CELL: f32 = 10.0;
const PIXELATE_DIVISIONS: f32 = 8.0;

/// Replaces every pixel's RGB with its luminance, leaving alpha untouched.
/// Idempotent: the luminance of a gray pixel is the pixel itself.
pub(super) fn apply_grayscale(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let gray = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b))
            .round()
            .clamp(0.0, 255.0) as u8;
        *pixel = Rgba([gray, gray, gray, a]);
    }
}

/// Integer pixel region covered by a rectangle, clipped to the canvas.
/// Returns `(left, top, width, height)`, or `None` for a region that
/// rounds away to nothing.
pub(super) fn bounded_region(
    rect: Rect,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let rect = rect.normalized();
    let left = rect.x.round().max(0.0) as i64;
    let top = rect.y.round().max(0.0) as i64;
    let right = ((rect.x + rect.width).round() as i64).min(i64::from(canvas_width));
    let bottom = ((rect.y + rect.height).round() as i64).min(i64::from(canvas_height));
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Opaque fill of the clipped region.
pub(super) fn fill_region(target: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let Some((left, top, width, height)) =
        bounded_region(rect, target.width(), target.height())
    else {
        return;
    };
    for y in top..top + height {
        for x in left..left + width {
            target.put_pixel(x, y, color);
        }
    }
}

/// Redraws the rectangle's sub-region of `base` into `target` with a fixed
/// gaussian blur. The blur samples the unfiltered base image, matching the
/// redaction's obscuring intent rather than the preview filter.
pub(super) fn blur_region(target: &mut RgbaImage, base: &RgbaImage, rect: Rect) {
    let Some((left, top, width, height)) = bounded_region(rect, base.width(), base.height())
    else {
        return;
    };
    let region = imageops::crop_imm(base, left, top, width, height).to_image();
    let blurred = imageops::blur(&region, BLUR_SIGMA);
    imageops::replace(target, &blurred, i64::from(left), i64::from(top));
}

/// The square pixelation cell size for a rectangle of the given extent.
pub(super) fn pixelate_cell_size(width: f32, height: f32) -> f32 {
    (width.min(height) / PIXELATE_DIVISIONS).max(PIXELATE_MIN_CELL)
}

/// Tiles the rectangle with solid cells, each sampled from the cell's
/// top-left pixel in `sample` (nearest neighbor, no averaging). `sample`
/// is the post-filter, pre-redaction capture, so overlapping redactions
/// never read each other's output.
pub(super) fn pixelate_region(target: &mut RgbaImage, sample: &RgbaImage, rect: Rect) {
    let rect = rect.normalized();
    if rect.width <= 0.0 || rect.height <= 0.0 || sample.width() == 0 || sample.height() == 0 {
        return;
    }
    let cell = pixelate_cell_size(rect.width, rect.height);

    let mut y = 0.0;
    while y < rect.height {
        let mut x = 0.0;
        while x < rect.width {
            let source_x = ((rect.x + x).floor().max(0.0) as u32).min(sample.width() - 1);
            let source_y = ((rect.y + y).floor().max(0.0) as u32).min(sample.height() - 1);
            let color = *sample.get_pixel(source_x, source_y);
            fill_region(
                target,
                Rect::new(
                    rect.x + x,
                    rect.y + y,
                    cell.min(rect.width - x),
                    cell.min(rect.height - y),
                ),
                color,
            );
            x += cell;
        }
        y += cell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 40, 255])
        })
    }

    #[test]
    fn grayscale_uses_the_luminance_weights() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 50, 180]));
        apply_grayscale(&mut image);
        let Rgba([r, g, b, a]) = *image.get_pixel(0, 0);
        // 0.299 * 100 + 0.587 * 200 + 0.114 * 50 = 153.0
        assert_eq!((r, g, b), (153, 153, 153));
        assert_eq!(a, 180);
    }

    #[test]
    fn grayscale_is_idempotent() {
        let mut once = gradient_image(16, 16);
        apply_grayscale(&mut once);
        let mut twice = once.clone();
        apply_grayscale(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn bounded_region_clips_to_the_canvas() {
        let region = bounded_region(Rect::new(-5.0, -10.0, 200.0, 120.0), 64, 48)
            .expect("expected region");
        assert_eq!(region, (0, 0, 64, 48));
    }

    #[test]
    fn bounded_region_normalizes_negative_extents() {
        let region = bounded_region(Rect::new(30.0, 30.0, -10.0, -20.0), 64, 64)
            .expect("expected region");
        assert_eq!(region, (20, 10, 10, 20));
    }

    #[test]
    fn bounded_region_rejects_zero_area() {
        assert!(bounded_region(Rect::new(10.0, 10.0, 0.0, 5.0), 64, 64).is_none());
        assert!(bounded_region(Rect::new(100.0, 10.0, 5.0, 5.0), 64, 64).is_none());
    }

    #[test]
    fn fill_region_paints_only_inside_the_rectangle() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        fill_region(&mut image, Rect::new(2.0, 2.0, 4.0, 4.0), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(5, 5), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(6, 6), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn blur_region_keeps_dimensions_and_touches_only_the_region() {
        let base = gradient_image(64, 64);
        let mut target = base.clone();
        blur_region(&mut target, &base, Rect::new(8.0, 8.0, 24.0, 24.0));
        assert_eq!(target.dimensions(), base.dimensions());
        assert_eq!(*target.get_pixel(50, 50), *base.get_pixel(50, 50));
    }

    #[test]
    fn pixelate_cell_size_has_an_absolute_floor_of_ten() {
        assert_eq!(pixelate_cell_size(40.0, 80.0), 10.0);
        assert_eq!(pixelate_cell_size(160.0, 240.0), 20.0);
    }

    #[test]
    fn pixelate_fills_each_cell_with_its_top_left_sample() {
        let sample = gradient_image(64, 64);
        let mut target = sample.clone();
        let rect = Rect::new(10.0, 10.0, 40.0, 40.0);
        pixelate_region(&mut target, &sample, rect);

        let expected = *sample.get_pixel(10, 10);
        for (x, y) in [(10, 10), (15, 15), (19, 19)] {
            assert_eq!(*target.get_pixel(x, y), expected);
        }
        let next_cell = *sample.get_pixel(20, 10);
        assert_eq!(*target.get_pixel(25, 12), next_cell);
        assert_eq!(*target.get_pixel(55, 55), *sample.get_pixel(55, 55));
    }
}
