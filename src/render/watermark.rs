//! Tiled, wave-distorted, rotated text watermark.
//!
//! The text is laid out row by row in an unrotated staging layer large
//! enough to cover the canvas diagonal, then the whole layer is rotated
//! −30° about its center and composited over the canvas. Rows form a brick
//! pattern and every character rides a sine wave, rotated to follow the
//! wave's local slope. Per-glyph scale and alpha jitter are intentionally
//! random; everything else about the overlay is deterministic.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use rand::Rng;
use std::sync::OnceLock;

use super::blend_pixel;

/// Embedded font (DejaVu Sans Bold, freely redistributable).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

static EMBEDDED_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

const ROTATION_DEGREES: f32 = -30.0;
const WAVE_AMPLITUDE_FACTOR: f32 = 0.2;
const WAVE_FREQUENCY: f32 = 0.05;
const TILE_SPACING_FACTOR: f32 = 1.8;
const GRADIENT_GRAY: (f32, f32) = (120.0, 200.0);
const GRADIENT_ALPHA: (f32, f32) = (0.35, 0.55);
const STROKE_GRAY: u8 = 30;
const STROKE_ALPHA_FACTOR: f32 = 0.6;
const SCALE_JITTER: (f32, f32) = (0.97, 1.03);
const ALPHA_JITTER: (f32, f32) = (0.8, 0.95);

/// Watermark parameters supplied by the configuration surface. Purely a
/// render input; never part of undo history.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    pub text: String,
    pub font_size: f32,
    /// Overall strength in `0.0..=1.0`; scales both gradient stops and the
    /// stroke alpha.
    pub opacity: f32,
    /// Row spacing multiplier: rows are `font_size * density` apart.
    pub density: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 32.0,
            opacity: 0.5,
            density: 3.0,
        }
    }
}

fn embedded_font() -> Option<&'static FontRef<'static>> {
    EMBEDDED_FONT
        .get_or_init(|| FontRef::try_from_slice(EMBEDDED_FONT_DATA).ok())
        .as_ref()
}

fn advance_width(font: &FontRef<'_>, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    text.chars()
        .map(|c| scaled.h_advance(scaled.glyph_id(c)))
        .sum()
}

/// Paints the watermark overlay onto `target`. No-op for empty text or
/// degenerate parameters.
pub(super) fn draw_watermark(target: &mut RgbaImage, options: &WatermarkOptions) {
    if options.text.is_empty() || target.width() == 0 || target.height() == 0 {
        return;
    }
    if !options.font_size.is_finite() || options.font_size < 1.0 {
        return;
    }
    let row_spacing = options.font_size * options.density;
    if !row_spacing.is_finite() || row_spacing <= 1.0 {
        tracing::warn!(row_spacing, "degenerate watermark row spacing, skipping overlay");
        return;
    }
    let Some(font) = embedded_font() else {
        tracing::warn!("embedded watermark font failed to load, skipping overlay");
        return;
    };

    let scale = PxScale::from(options.font_size);
    let tile = format!("{}  ", options.text);
    let text_width = advance_width(font, scale, &options.text);
    let tile_width = advance_width(font, scale, &tile);
    if tile_width <= 0.0 {
        return;
    }
    let tile_spacing = text_width * TILE_SPACING_FACTOR;

    // Staging layer covering the canvas diagonal, so the rotated overlay
    // still reaches every corner.
    let width = target.width() as f32;
    let height = target.height() as f32;
    let side = (width * width + height * height).sqrt().ceil();
    let mut layer = RgbaImage::new(side as u32, side as u32);

    let amplitude = options.font_size * WAVE_AMPLITUDE_FACTOR;
    let repeats = (side / tile_width).ceil() as usize + 2;
    let scaled = font.as_scaled(scale);
    let advances: Vec<(char, f32)> = tile
        .chars()
        .map(|c| (c, scaled.h_advance(scaled.glyph_id(c))))
        .collect();
    let mut rng = rand::thread_rng();

    let mut row = 0_u32;
    let mut y = -row_spacing;
    while y < side + row_spacing {
        let row_offset = if row % 2 == 0 { -tile_spacing / 2.0 } else { 0.0 };
        let mut x = row_offset - tile_spacing;

        'row: for _ in 0..repeats {
            for &(c, advance) in &advances {
                if !c.is_whitespace() {
                    let wave_y = y + (x * WAVE_FREQUENCY).sin() * amplitude;
                    let slope = amplitude * WAVE_FREQUENCY * (x * WAVE_FREQUENCY).cos();
                    let angle = slope.atan();
                    let scale_jitter = rng.gen_range(SCALE_JITTER.0..SCALE_JITTER.1);
                    let alpha_jitter = rng.gen_range(ALPHA_JITTER.0..ALPHA_JITTER.1);
                    let (fill, stroke) = glyph_colors(options.opacity, x, wave_y, side);
                    stamp_glyph(
                        &mut layer,
                        font,
                        c,
                        (x, wave_y),
                        options.font_size * scale_jitter,
                        angle,
                        alpha_jitter,
                        fill,
                        stroke,
                    );
                }
                x += advance;
                if x > side + tile_spacing {
                    break 'row;
                }
            }
        }
        row += 1;
        y += row_spacing;
    }

    let rotated = rotate_image(&layer, ROTATION_DEGREES);
    overlay_centered(target, &rotated);
}

/// Fill and stroke colors for a glyph, sampled from the diagonal gradient
/// at its layer position. Both alphas scale with the opacity parameter.
fn glyph_colors(opacity: f32, x: f32, y: f32, side: f32) -> (Rgba<u8>, Rgba<u8>) {
    let t = ((x + y) / (2.0 * side)).clamp(0.0, 1.0);
    let gray = (GRADIENT_GRAY.0 + (GRADIENT_GRAY.1 - GRADIENT_GRAY.0) * t).round() as u8;
    let fill_alpha = opacity * (GRADIENT_ALPHA.0 + (GRADIENT_ALPHA.1 - GRADIENT_ALPHA.0) * t);
    let stroke_alpha = opacity * STROKE_ALPHA_FACTOR;
    (
        Rgba([gray, gray, gray, to_alpha_byte(fill_alpha)]),
        Rgba([STROKE_GRAY, STROKE_GRAY, STROKE_GRAY, to_alpha_byte(stroke_alpha)]),
    )
}

fn to_alpha_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rasterizes one character, stroked then filled, rotates it by the wave
/// slope and blends it into the layer centered on `center`.
#[allow(clippy::too_many_arguments)]
fn stamp_glyph(
    layer: &mut RgbaImage,
    font: &FontRef<'_>,
    c: char,
    center: (f32, f32),
    px_size: f32,
    angle: f32,
    alpha_jitter: f32,
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
) {
    let Some(patch) = render_glyph_patch(font, c, PxScale::from(px_size), alpha_jitter, fill, stroke)
    else {
        return;
    };
    let patch = if angle.abs() > 1e-3 {
        rotate_image(&patch, angle.to_degrees())
    } else {
        patch
    };

    let left = center.0 - patch.width() as f32 / 2.0;
    let top = center.1 - patch.height() as f32 / 2.0;
    blend_at(layer, &patch, left.round() as i64, top.round() as i64);
}

/// Draws a glyph's coverage into a small transparent patch: four offset
/// passes in the stroke color approximate the stroked outline, then the
/// fill goes on top.
fn render_glyph_patch(
    font: &FontRef<'_>,
    c: char,
    scale: PxScale,
    alpha_jitter: f32,
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
) -> Option<RgbaImage> {
    let glyph = font
        .glyph_id(c)
        .with_scale_and_position(scale, ab_glyph::point(0.0, 0.0));
    let outlined = font.outline_glyph(glyph)?;
    let bounds = outlined.px_bounds();

    let margin = 1_i32;
    let patch_width = bounds.width().ceil() as i32 + margin * 2;
    let patch_height = bounds.height().ceil() as i32 + margin * 2;
    if patch_width <= 0 || patch_height <= 0 {
        return None;
    }
    let mut patch = RgbaImage::new(patch_width as u32, patch_height as u32);

    let mut passes: Vec<(i32, i32, Rgba<u8>)> = Vec::with_capacity(5);
    for offset in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        passes.push((offset.0, offset.1, stroke));
    }
    passes.push((0, 0, fill));

    for (dx, dy, color) in passes {
        let alpha_scale = f32::from(color[3]) / 255.0 * alpha_jitter;
        outlined.draw(|px, py, coverage| {
            let x = px as i32 + margin + dx;
            let y = py as i32 + margin + dy;
            if x < 0 || y < 0 || x >= patch_width || y >= patch_height {
                return;
            }
            let alpha = (coverage * alpha_scale * 255.0).round().clamp(0.0, 255.0) as u8;
            if alpha == 0 {
                return;
            }
            let pixel = Rgba([color[0], color[1], color[2], alpha]);
            let blended = blend_pixel(*patch.get_pixel(x as u32, y as u32), pixel);
            patch.put_pixel(x as u32, y as u32, blended);
        });
    }

    Some(patch)
}

/// Blends `overlay` into `target` with its top-left at `(left, top)`,
/// clipping anything that falls outside.
fn blend_at(target: &mut RgbaImage, overlay: &RgbaImage, left: i64, top: i64) {
    for (x, y, pixel) in overlay.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let target_x = left + i64::from(x);
        let target_y = top + i64::from(y);
        if target_x < 0
            || target_y < 0
            || target_x >= i64::from(target.width())
            || target_y >= i64::from(target.height())
        {
            continue;
        }
        let blended = blend_pixel(*target.get_pixel(target_x as u32, target_y as u32), *pixel);
        target.put_pixel(target_x as u32, target_y as u32, blended);
    }
}

/// Blends `overlay` into `target` with both centers aligned.
fn overlay_centered(target: &mut RgbaImage, overlay: &RgbaImage) {
    let left = (i64::from(target.width()) - i64::from(overlay.width())) / 2;
    let top = (i64::from(target.height()) - i64::from(overlay.height())) / 2;
    blend_at(target, overlay, left, top);
}

/// Rotates an image by `degrees` about its center, expanding the canvas to
/// the rotated bounding box and sampling bilinearly.
fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = -degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for (x, y) in corners {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let dst_w = ((max_x - min_x).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y).ceil() as u32).max(1);
    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 - dst_cx;
            let ry = dy as f32 - dst_cy;
            let sx = rx * inv_cos - ry * inv_sin + cx;
            let sy = rx * inv_sin + ry * inv_cos + cy;

            if sx >= 0.0 && sx < src_w - 1.0 && sy >= 0.0 && sy < src_h - 1.0 {
                let x0 = sx.floor() as u32;
                let y0 = sy.floor() as u32;
                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let p00 = image.get_pixel(x0, y0);
                let p10 = image.get_pixel(x0 + 1, y0);
                let p01 = image.get_pixel(x0, y0 + 1);
                let p11 = image.get_pixel(x0 + 1, y0 + 1);

                let interpolate = |channel: usize| -> u8 {
                    let value = f32::from(p00[channel]) * (1.0 - fx) * (1.0 - fy)
                        + f32::from(p10[channel]) * fx * (1.0 - fy)
                        + f32::from(p01[channel]) * (1.0 - fx) * fy
                        + f32::from(p11[channel]) * fx * fy;
                    value.clamp(0.0, 255.0) as u8
                };

                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba([
                        interpolate(0),
                        interpolate(1),
                        interpolate(2),
                        interpolate(3),
                    ]),
                );
            }
        }
    }

    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_canvas(side: u32) -> RgbaImage {
        RgbaImage::from_pixel(side, side, Rgba([255, 255, 255, 255]))
    }

    fn changed_pixels(before: &RgbaImage, after: &RgbaImage) -> usize {
        before
            .pixels()
            .zip(after.pixels())
            .filter(|(a, b)| a != b)
            .count()
    }

    fn options(text: &str, opacity: f32) -> WatermarkOptions {
        WatermarkOptions {
            text: text.to_string(),
            font_size: 16.0,
            opacity,
            density: 2.0,
        }
    }

    #[test]
    fn empty_text_leaves_the_canvas_untouched() {
        let before = white_canvas(64);
        let mut after = before.clone();
        draw_watermark(&mut after, &options("", 1.0));
        assert_eq!(before, after);
    }

    #[test]
    fn non_empty_text_stamps_visible_glyphs() {
        let before = white_canvas(96);
        let mut after = before.clone();
        draw_watermark(&mut after, &options("CONFIDENTIAL", 1.0));
        assert!(changed_pixels(&before, &after) > 50);
    }

    #[test]
    fn higher_opacity_changes_more_than_near_zero_opacity() {
        let before = white_canvas(96);

        let mut faint = before.clone();
        draw_watermark(&mut faint, &options("DRAFT", 0.02));
        let mut strong = before.clone();
        draw_watermark(&mut strong, &options("DRAFT", 1.0));

        assert!(changed_pixels(&before, &strong) >= changed_pixels(&before, &faint));
        assert!(changed_pixels(&before, &strong) > 0);
    }

    #[test]
    fn degenerate_density_skips_the_overlay() {
        let before = white_canvas(64);
        let mut after = before.clone();
        let mut opts = options("LOOP", 1.0);
        opts.density = 0.0;
        draw_watermark(&mut after, &opts);
        assert_eq!(before, after);
    }

    #[test]
    fn rotate_image_expands_to_the_rotated_bounding_box() {
        let image = RgbaImage::from_pixel(100, 40, Rgba([9, 9, 9, 255]));
        let rotated = rotate_image(&image, -30.0);
        assert!(rotated.width() > 100);
        assert!(rotated.height() > 40);
    }

    #[test]
    fn rotate_by_zero_keeps_interior_pixels() {
        let mut image = RgbaImage::new(11, 11);
        image.put_pixel(5, 5, Rgba([200, 10, 10, 255]));
        let rotated = rotate_image(&image, 0.0);
        assert_eq!(rotated.get_pixel(5, 5)[0], 200);
    }

    #[test]
    fn default_options_render_nothing() {
        let before = white_canvas(32);
        let mut after = before.clone();
        draw_watermark(&mut after, &WatermarkOptions::default());
        assert_eq!(before, after);
    }

    #[test]
    fn glyph_colors_scale_with_opacity_and_gradient_position() {
        let (fill_near, _) = glyph_colors(1.0, 0.0, 0.0, 100.0);
        let (fill_far, stroke) = glyph_colors(1.0, 100.0, 100.0, 100.0);
        assert!(fill_far[0] > fill_near[0]);
        assert!(fill_far[3] > fill_near[3]);
        assert_eq!(stroke[0], STROKE_GRAY);

        let (fill_dim, stroke_dim) = glyph_colors(0.0, 100.0, 100.0, 100.0);
        assert_eq!(fill_dim[3], 0);
        assert_eq!(stroke_dim[3], 0);
    }
}
