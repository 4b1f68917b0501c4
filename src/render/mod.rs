//! Deterministic composition pipeline.
//!
//! `compose` is a pure function of the scene: it always starts from a fresh
//! copy of the base image, so repeated invocations never accumulate state.
//! The fixed pass order is base image, whole-image filter, redactions in
//! store order, selection decoration, draw preview, watermark.

mod filters;
mod watermark;

pub use filters::ImageFilter;
pub use watermark::WatermarkOptions;

use image::{Rgba, RgbaImage};

use crate::editor::{Redaction, RedactionKind};
use crate::geometry::Rect;

const SOLID_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PREVIEW_FILL: Rgba<u8> = Rgba([0, 0, 0, 128]);
const SELECTION_COLOR: Rgba<u8> = Rgba([0, 123, 255, 255]);
const SELECTION_STROKE_WIDTH: f32 = 2.0;
const SELECTION_DASH: f32 = 5.0;
const HANDLE_SIZE: f32 = 8.0;

/// Everything the pipeline reads. The session assembles one per redraw;
/// the selection is only passed while redaction mode is active.
#[derive(Debug)]
pub struct Scene<'a> {
    pub base: &'a RgbaImage,
    pub filter: ImageFilter,
    pub redactions: &'a [Redaction],
    pub selection: Option<&'a Redaction>,
    pub preview: Option<Rect>,
    pub watermark: &'a WatermarkOptions,
}

/// Runs the full pipeline and returns the finished raster.
pub fn compose(scene: &Scene<'_>) -> RgbaImage {
    let mut canvas = scene.base.clone();

    if scene.filter == ImageFilter::Grayscale {
        filters::apply_grayscale(&mut canvas);
    }

    // Captured once, post-filter and pre-redaction, so overlapping
    // pixelation samples the unredacted buffer.
    let sample = canvas.clone();

    for redaction in scene.redactions {
        match redaction.kind {
            RedactionKind::Solid => filters::fill_region(&mut canvas, redaction.region, SOLID_FILL),
            RedactionKind::Blur => filters::blur_region(&mut canvas, scene.base, redaction.region),
            RedactionKind::Pixelate => {
                filters::pixelate_region(&mut canvas, &sample, redaction.region)
            }
        }
    }

    if let Some(selected) = scene.selection {
        draw_selection(&mut canvas, selected.region);
    }

    if let Some(preview) = scene.preview {
        blend_region(&mut canvas, preview, PREVIEW_FILL);
    }

    watermark::draw_watermark(&mut canvas, scene.watermark);
    canvas
}

/// Source-over blend of two pixels.
pub(crate) fn blend_pixel(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = f32::from(top[3]) / 255.0;
    let bottom_alpha = f32::from(bottom[3]) / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);
    if out_alpha < f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |t: u8, b: u8| -> u8 {
        let t = f32::from(t) / 255.0;
        let b = f32::from(b) / 255.0;
        let value = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Translucent fill over the clipped region.
fn blend_region(target: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let Some((left, top, width, height)) =
        filters::bounded_region(rect, target.width(), target.height())
    else {
        return;
    };
    for y in top..top + height {
        for x in left..left + width {
            let blended = blend_pixel(*target.get_pixel(x, y), color);
            target.put_pixel(x, y, blended);
        }
    }
}

/// Dashed outline plus the four corner handle squares.
fn draw_selection(canvas: &mut RgbaImage, region: Rect) {
    let rect = region.normalized();
    let half_stroke = SELECTION_STROKE_WIDTH / 2.0;

    draw_dashed_line(canvas, rect.x, rect.y - half_stroke, rect.width, false);
    draw_dashed_line(
        canvas,
        rect.x,
        rect.y + rect.height - half_stroke,
        rect.width,
        false,
    );
    draw_dashed_line(canvas, rect.y, rect.x - half_stroke, rect.height, true);
    draw_dashed_line(
        canvas,
        rect.y,
        rect.x + rect.width - half_stroke,
        rect.height,
        true,
    );

    for (_, corner) in rect.corners() {
        filters::fill_region(
            canvas,
            Rect::new(
                corner.x - HANDLE_SIZE / 2.0,
                corner.y - HANDLE_SIZE / 2.0,
                HANDLE_SIZE,
                HANDLE_SIZE,
            ),
            SELECTION_COLOR,
        );
    }
}

/// One dashed edge, five pixels on, five off. `along` is the coordinate
/// running along the edge, `across` the fixed perpendicular offset.
fn draw_dashed_line(canvas: &mut RgbaImage, along: f32, across: f32, length: f32, vertical: bool) {
    let length = length.max(0.0);
    let mut offset = 0.0;
    while offset < length {
        let dash = SELECTION_DASH.min(length - offset);
        let rect = if vertical {
            Rect::new(across, along + offset, SELECTION_STROKE_WIDTH, dash)
        } else {
            Rect::new(along + offset, across, dash, SELECTION_STROKE_WIDTH)
        };
        filters::fill_region(canvas, rect, SELECTION_COLOR);
        offset += SELECTION_DASH * 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_defaults() -> (RgbaImage, WatermarkOptions) {
        let base = RgbaImage::from_pixel(64, 64, Rgba([255, 0, 0, 255]));
        (base, WatermarkOptions::default())
    }

    fn plain_scene<'a>(
        base: &'a RgbaImage,
        watermark: &'a WatermarkOptions,
        redactions: &'a [Redaction],
    ) -> Scene<'a> {
        Scene {
            base,
            filter: ImageFilter::None,
            redactions,
            selection: None,
            preview: None,
            watermark,
        }
    }

    #[test]
    fn compose_without_inputs_reproduces_the_base_image() {
        let (base, watermark) = scene_defaults();
        let scene = plain_scene(&base, &watermark, &[]);
        let first = compose(&scene);
        let second = compose(&scene);
        assert_eq!(first, base);
        assert_eq!(first, second);
    }

    #[test]
    fn solid_redaction_paints_opaque_black() {
        let (base, watermark) = scene_defaults();
        let redactions = [Redaction {
            id: 1,
            region: Rect::new(10.0, 10.0, 20.0, 20.0),
            kind: RedactionKind::Solid,
        }];
        let out = compose(&plain_scene(&base, &watermark, &redactions));
        assert_eq!(*out.get_pixel(15, 15), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(40, 40), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn blur_redaction_samples_the_unfiltered_base() {
        let (base, watermark) = scene_defaults();
        let redactions = [Redaction {
            id: 1,
            region: Rect::new(8.0, 8.0, 24.0, 24.0),
            kind: RedactionKind::Blur,
        }];
        let scene = Scene {
            filter: ImageFilter::Grayscale,
            ..plain_scene(&base, &watermark, &redactions)
        };
        let out = compose(&scene);
        // Inside the blur the solid red base shows through; outside it the
        // grayscale filter has collapsed the channels.
        let inside = out.get_pixel(20, 20);
        assert!(inside[0] > 250 && inside[1] < 5, "got {inside:?}");
        let outside = out.get_pixel(50, 50);
        assert_eq!(outside[0], outside[1]);
    }

    #[test]
    fn pixelate_samples_the_filtered_capture() {
        let base = RgbaImage::from_fn(64, 64, |x, _| Rgba([(x * 4 % 256) as u8, 0, 200, 255]));
        let watermark = WatermarkOptions::default();
        let redactions = [Redaction {
            id: 1,
            region: Rect::new(16.0, 16.0, 32.0, 32.0),
            kind: RedactionKind::Pixelate,
        }];
        let scene = Scene {
            filter: ImageFilter::Grayscale,
            ..plain_scene(&base, &watermark, &redactions)
        };
        let out = compose(&scene);
        let cell = out.get_pixel(18, 18);
        assert_eq!(cell[0], cell[1]);
        assert_eq!(cell[1], cell[2]);
    }

    #[test]
    fn selection_decoration_draws_outline_and_handles() {
        let (base, watermark) = scene_defaults();
        let selected = Redaction {
            id: 1,
            region: Rect::new(16.0, 16.0, 24.0, 24.0),
            kind: RedactionKind::Solid,
        };
        let redactions = [selected];
        let scene = Scene {
            selection: Some(&redactions[0]),
            ..plain_scene(&base, &watermark, &redactions)
        };
        let out = compose(&scene);

        // Corner handles are solid squares centered on the corners.
        assert_eq!(*out.get_pixel(16, 16), SELECTION_COLOR);
        assert_eq!(*out.get_pixel(40, 40), SELECTION_COLOR);
        // The second dash of the top edge sits clear of the corner handle.
        assert_eq!(*out.get_pixel(27, 15), SELECTION_COLOR);

        let undecorated = compose(&plain_scene(&base, &watermark, &redactions));
        assert_ne!(out, undecorated);
        assert_eq!(*undecorated.get_pixel(16, 16), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn preview_rectangle_blends_half_black() {
        let base = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        let watermark = WatermarkOptions::default();
        let scene = Scene {
            preview: Some(Rect::new(40.0, 40.0, -20.0, -20.0)),
            ..plain_scene(&base, &watermark, &[])
        };
        let out = compose(&scene);
        let inside = out.get_pixel(30, 30);
        assert!(inside[0] > 110 && inside[0] < 140, "got {}", inside[0]);
        assert_eq!(*out.get_pixel(50, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn blend_pixel_is_identity_for_transparent_overlay() {
        let bottom = Rgba([10, 200, 30, 255]);
        assert_eq!(blend_pixel(bottom, Rgba([99, 99, 99, 0])), bottom);
    }

    #[test]
    fn blend_pixel_replaces_with_opaque_overlay() {
        let bottom = Rgba([10, 200, 30, 255]);
        let top = Rgba([1, 2, 3, 255]);
        assert_eq!(blend_pixel(bottom, top), top);
    }
}
