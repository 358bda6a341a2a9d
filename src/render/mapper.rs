//! Coordinate mapping between canvas space and source-image space.
//!
//! The forward map is what the renderer applies when drawing the bitmap:
//! translate to canvas center, rotate, scale by the flip-signed zoom,
//! translate by minus the image center. The inverse map turns the crop
//! area back into a source rectangle in image pixels; that one rectangle
//! is shared by the overlay, every preview size, and the export, which is
//! what keeps all outputs pixel-identical up to resampling.

use serde::{Deserialize, Serialize};

use crate::state::{CropArea, ViewTransform};

/// Whether the inverse map undoes the mirror applied at draw time.
///
/// `Folded` divides by the flip-signed scale (the exact algebraic inverse
/// of the render transform). `DrawTime` divides by the bare zoom, so a
/// mirrored view samples the unmirrored position and relies on the target
/// draw to flip; kept as a selectable policy because shipped versions of
/// this widget disagreed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    Folded,
    DrawTime,
}

impl Default for FlipMode {
    fn default() -> Self {
        FlipMode::Folded
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Axis-aligned rectangle in source-image pixel coordinates.
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SourceRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The render transform as a tiny-skia matrix, for drawing the bitmap.
pub fn forward_transform(
    view: &ViewTransform,
    image_w: f32,
    image_h: f32,
    canvas_w: f32,
    canvas_h: f32,
) -> tiny_skia::Transform {
    let theta = (view.rotation_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let (sx, sy) = (view.scale_x(), view.scale_y());

    // Column-major linear part of translate(cc) * rotate * scale.
    let a = cos * sx;
    let b = sin * sx;
    let c = -sin * sy;
    let d = cos * sy;
    let (icx, icy) = (image_w / 2.0, image_h / 2.0);
    let e = canvas_w / 2.0 - (a * icx + c * icy);
    let f = canvas_h / 2.0 - (b * icx + d * icy);

    tiny_skia::Transform::from_row(a, b, c, d, e, f)
}

/// Maps an image-space point onto the canvas (forward map).
pub fn image_to_canvas(
    point: (f32, f32),
    view: &ViewTransform,
    image_w: f32,
    image_h: f32,
    canvas_w: f32,
    canvas_h: f32,
) -> (f32, f32) {
    let theta = (view.rotation_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let x = (point.0 - image_w / 2.0) * view.scale_x();
    let y = (point.1 - image_h / 2.0) * view.scale_y();
    (
        x * cos - y * sin + canvas_w / 2.0,
        x * sin + y * cos + canvas_h / 2.0,
    )
}

/// Maps a canvas-space point back into image space (inverse map).
pub fn canvas_to_image(
    point: (f32, f32),
    view: &ViewTransform,
    image_w: f32,
    image_h: f32,
    canvas_w: f32,
    canvas_h: f32,
    flip_mode: FlipMode,
) -> (f32, f32) {
    let theta = (view.rotation_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let lx = point.0 - canvas_w / 2.0;
    let ly = point.1 - canvas_h / 2.0;

    match flip_mode {
        FlipMode::Folded => {
            // Un-rotate, then divide by the signed scale.
            let rx = lx * cos + ly * sin;
            let ry = -lx * sin + ly * cos;
            (
                rx / view.scale_x() + image_w / 2.0,
                ry / view.scale_y() + image_h / 2.0,
            )
        }
        FlipMode::DrawTime => {
            // Legacy order: bare zoom divide, then un-rotate.
            let ux = lx / view.zoom;
            let uy = ly / view.zoom;
            let rx = ux * cos + uy * sin;
            let ry = -ux * sin + uy * cos;
            (rx + image_w / 2.0, ry + image_h / 2.0)
        }
    }
}

/// Source rectangle for the given crop area: centered on the inverse-mapped
/// crop center, `crop.width / zoom` by `crop.height / zoom`.
pub fn source_rect(
    crop: &CropArea,
    view: &ViewTransform,
    image_w: f32,
    image_h: f32,
    canvas_w: f32,
    canvas_h: f32,
    flip_mode: FlipMode,
) -> SourceRect {
    let (cx, cy) = canvas_to_image(
        crop.center(),
        view,
        image_w,
        image_h,
        canvas_w,
        canvas_h,
        flip_mode,
    );
    let width = crop.width / view.zoom;
    let height = crop.height / view.zoom;
    SourceRect {
        x: cx - width / 2.0,
        y: cy - height / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::{FlipMode, canvas_to_image, forward_transform, image_to_canvas, source_rect};
    use crate::state::{CropArea, ViewTransform};

    const IMG: (f32, f32) = (640.0, 480.0);
    const CANVAS: (f32, f32) = (800.0, 600.0);

    fn view(rotation: i32, zoom: f32, flip_x: bool, flip_y: bool) -> ViewTransform {
        ViewTransform {
            rotation_degrees: rotation,
            zoom,
            flip_x,
            flip_y,
        }
    }

    fn roundtrip(view: &ViewTransform, p: (f32, f32)) -> (f32, f32) {
        let c = image_to_canvas(p, view, IMG.0, IMG.1, CANVAS.0, CANVAS.1);
        canvas_to_image(c, view, IMG.0, IMG.1, CANVAS.0, CANVAS.1, FlipMode::Folded)
    }

    #[test]
    fn inverse_after_forward_is_identity() {
        let points = [(0.0, 0.0), (640.0, 480.0), (123.4, 77.7), (320.0, 240.0)];
        for rotation in [0, 37, 90, 183, 270] {
            for zoom in [0.1, 0.5, 1.0, 2.5, 10.0] {
                for (flip_x, flip_y) in [(false, false), (true, false), (false, true), (true, true)]
                {
                    let v = view(rotation, zoom, flip_x, flip_y);
                    for p in points {
                        let q = roundtrip(&v, p);
                        assert!(
                            (q.0 - p.0).abs() < 1e-2 && (q.1 - p.1).abs() < 1e-2,
                            "round trip failed for {v:?} at {p:?}: got {q:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn identity_view_maps_image_center_to_canvas_center() {
        let v = view(0, 1.0, false, false);
        let c = image_to_canvas((320.0, 240.0), &v, IMG.0, IMG.1, CANVAS.0, CANVAS.1);
        assert_eq!(c, (400.0, 300.0));
    }

    #[test]
    fn quarter_rotation_maps_axes_as_expected() {
        // 100 px to the right of the image center lands 100 px below the
        // canvas center after a 90° rotation (y grows downward).
        let v = view(90, 1.0, false, false);
        let c = image_to_canvas((420.0, 240.0), &v, IMG.0, IMG.1, CANVAS.0, CANVAS.1);
        assert!((c.0 - 400.0).abs() < 1e-3);
        assert!((c.1 - 400.0).abs() < 1e-3);
    }

    #[test]
    fn forward_matrix_agrees_with_point_mapping() {
        let v = view(37, 1.7, true, false);
        let ts = forward_transform(&v, IMG.0, IMG.1, CANVAS.0, CANVAS.1);
        let mut points = [tiny_skia::Point::from_xy(123.0, 45.0)];
        ts.map_points(&mut points);
        let q = image_to_canvas((123.0, 45.0), &v, IMG.0, IMG.1, CANVAS.0, CANVAS.1);
        assert!((points[0].x - q.0).abs() < 1e-3);
        assert!((points[0].y - q.1).abs() < 1e-3);
    }

    #[test]
    fn source_rect_dimensions_are_crop_over_zoom() {
        let crop = CropArea::new(100.0, 120.0, 150.0, 150.0);
        for zoom in [0.1, 0.33, 1.0, 4.2, 10.0] {
            let v = view(25, zoom, false, false);
            let src = source_rect(
                &crop,
                &v,
                IMG.0,
                IMG.1,
                CANVAS.0,
                CANVAS.1,
                FlipMode::Folded,
            );
            assert_eq!(src.width, crop.width / zoom);
            assert_eq!(src.height, crop.height / zoom);
        }
    }

    #[test]
    fn unrotated_source_rect_center_tracks_crop_offset() {
        let crop = CropArea::new(450.0, 300.0, 100.0, 100.0);
        let v = view(0, 2.0, false, false);
        let src = source_rect(
            &crop,
            &v,
            IMG.0,
            IMG.1,
            CANVAS.0,
            CANVAS.1,
            FlipMode::Folded,
        );
        // Crop center is (500, 350); 100 px right and 50 px down of the
        // canvas center, halved by zoom 2 in image space.
        assert_eq!(src.center(), (370.0, 265.0));
    }

    #[test]
    fn flip_modes_disagree_only_when_mirrored() {
        let crop = CropArea::new(450.0, 250.0, 100.0, 100.0);
        let plain = view(0, 1.0, false, false);
        let folded = source_rect(
            &crop,
            &plain,
            IMG.0,
            IMG.1,
            CANVAS.0,
            CANVAS.1,
            FlipMode::Folded,
        );
        let draw_time = source_rect(
            &crop,
            &plain,
            IMG.0,
            IMG.1,
            CANVAS.0,
            CANVAS.1,
            FlipMode::DrawTime,
        );
        assert_eq!(folded, draw_time);

        let mirrored = view(0, 1.0, true, false);
        let folded = source_rect(
            &crop,
            &mirrored,
            IMG.0,
            IMG.1,
            CANVAS.0,
            CANVAS.1,
            FlipMode::Folded,
        );
        let draw_time = source_rect(
            &crop,
            &mirrored,
            IMG.0,
            IMG.1,
            CANVAS.0,
            CANVAS.1,
            FlipMode::DrawTime,
        );
        // The crop sits 100 px right of center: folded sampling reflects it
        // to the left half of the image, the legacy mode does not.
        assert_eq!(folded.center().0, 220.0);
        assert_eq!(draw_time.center().0, 420.0);
        assert_eq!(folded.center().1, draw_time.center().1);
    }
}
