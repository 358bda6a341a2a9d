//! Border compositing: paints a decorative ring (circle crops) or inset
//! frame (square crops) strictly inward of the crop boundary, onto any
//! target surface. Purely a painter; geometry and spec state are never
//! mutated, so the same call works against the live canvas, each preview
//! thumbnail, and the export target.

use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap, Point, Rect,
    SpreadMode, Transform,
};

use crate::gradient::GradientSpec;
use crate::state::{BorderKind, BorderSpec, Color, CropArea, ShapeKind};

/// Base of the UI-angle to gradient-line mapping: the gradient endpoints
/// sit at `-270 - angle` degrees and its 180° opposite. Arbitrary but
/// load-bearing; changing it re-aims every saved gradient.
pub const GRADIENT_ANGLE_BASE: f32 = -270.0;

/// Minimum sub-ring count for the concentric-ring strategy.
const MIN_RINGS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a gradient decoration is rasterized into the border region.
pub enum RenderStrategy {
    /// One linear gradient spanning the surface, filling the whole region.
    Linear,
    /// Concentric flat-colored sub-rings sampling the ramp outer-to-inner.
    Rings,
}

/// Built-in border presets shown in the toolbar, `(name, label)`.
pub const BORDER_PRESETS: [(&str, &str); 4] = [
    ("retro", "Retro"),
    ("rgb", "RGB"),
    ("retro-rings", "Retro rings"),
    ("rgb-rings", "RGB rings"),
];

const RETRO_STOPS: [(f32, u32); 5] = [
    (0.0, 0xf97316),
    (0.25, 0xfb8c00),
    (0.5, 0xfbbf24),
    (0.75, 0xf97316),
    (1.0, 0xfb8c00),
];

const RGB_STOPS: [(f32, u32); 4] = [
    (0.0, 0xff0000),
    (0.33, 0x00ff00),
    (0.67, 0x0000ff),
    (1.0, 0xff0000),
];

/// Resolves a preset name to its gradient and render strategy.
pub fn preset(name: &str) -> Option<(GradientSpec, RenderStrategy)> {
    match name {
        "retro" => Some((GradientSpec::from_table(0, &RETRO_STOPS), RenderStrategy::Linear)),
        "rgb" => Some((GradientSpec::from_table(0, &RGB_STOPS), RenderStrategy::Linear)),
        "retro-rings" => Some((GradientSpec::from_table(0, &RETRO_STOPS), RenderStrategy::Rings)),
        "rgb-rings" => Some((GradientSpec::from_table(0, &RGB_STOPS), RenderStrategy::Rings)),
        _ => None,
    }
}

/// Paints `spec` into the crop region on `target`.
pub fn apply(target: &mut Pixmap, crop: &CropArea, shape: ShapeKind, spec: &BorderSpec) {
    if !spec.is_visible() {
        return;
    }
    match &spec.kind {
        BorderKind::None => {}
        BorderKind::Solid => {
            if let Some(path) = region_path(crop, shape, spec.size) {
                fill_solid(target, &path, spec.color);
            }
        }
        BorderKind::Preset(name) => {
            let Some((gradient, strategy)) = preset(name) else {
                return;
            };
            match strategy {
                RenderStrategy::Linear => fill_linear(target, crop, shape, spec.size, &gradient),
                RenderStrategy::Rings => fill_rings(target, crop, shape, spec.size, &gradient),
            }
        }
        BorderKind::Custom => {
            let Some(gradient) = &spec.gradient else {
                return;
            };
            fill_linear(target, crop, shape, spec.size, gradient);
        }
    }
}

/// Gradient line endpoints for a UI angle, projected onto the bounding
/// square of the surface so the line spans corner-to-corner.
pub fn gradient_endpoints(angle_degrees: i32, surface_w: f32, surface_h: f32) -> (Point, Point) {
    let size = surface_w.max(surface_h);
    let project = |angle_deg: f32| {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let t = 0.5 / cos.abs().max(sin.abs());
        Point::from_xy(t * cos * size + size / 2.0, t * sin * size + size / 2.0)
    };
    let base = GRADIENT_ANGLE_BASE - angle_degrees as f32;
    (project(base), project(base - 180.0))
}

/// Annulus/frame covering the border region: outer edge on the crop
/// boundary, inner edge shrunk by `size`.
fn region_path(crop: &CropArea, shape: ShapeKind, size: f32) -> Option<Path> {
    match shape {
        ShapeKind::Circle => {
            let (cx, cy) = crop.center();
            let outer = crop.width / 2.0;
            ring_path(cx, cy, outer, outer * (1.0 - size))
        }
        ShapeKind::Square => frame_path(crop, 0.0, crop.width * size),
    }
}

fn ring_path(cx: f32, cy: f32, outer: f32, inner: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.push_circle(cx, cy, outer);
    if inner > 0.0 {
        pb.push_circle(cx, cy, inner);
    }
    pb.finish()
}

/// Frame between two insets of the crop rectangle (even-odd region).
fn frame_path(crop: &CropArea, outer_inset: f32, inner_inset: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.push_rect(Rect::from_xywh(
        crop.x + outer_inset,
        crop.y + outer_inset,
        crop.width - outer_inset * 2.0,
        crop.height - outer_inset * 2.0,
    )?);
    let inner_w = crop.width - inner_inset * 2.0;
    let inner_h = crop.height - inner_inset * 2.0;
    if inner_w > 0.0 && inner_h > 0.0 {
        pb.push_rect(Rect::from_xywh(
            crop.x + inner_inset,
            crop.y + inner_inset,
            inner_w,
            inner_h,
        )?);
    }
    pb.finish()
}

fn fill_solid(target: &mut Pixmap, path: &Path, color: Color) {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    target.fill_path(path, &paint, FillRule::EvenOdd, Transform::identity(), None);
}

fn fill_linear(
    target: &mut Pixmap,
    crop: &CropArea,
    shape: ShapeKind,
    size: f32,
    gradient: &GradientSpec,
) {
    let Some(path) = region_path(crop, shape, size) else {
        return;
    };
    let (start, end) = gradient_endpoints(
        gradient.angle_degrees,
        target.width() as f32,
        target.height() as f32,
    );
    let stops: Vec<GradientStop> = gradient
        .sorted_stops()
        .iter()
        .map(|s| GradientStop::new(s.position.clamp(0.0, 1.0), s.color.to_skia()))
        .collect();
    let Some(shader) = LinearGradient::new(start, end, stops, SpreadMode::Pad, Transform::identity())
    else {
        return;
    };
    let paint = Paint {
        shader,
        anti_alias: true,
        ..Paint::default()
    };
    target.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
}

/// Concentric-ring strategy: the region is cut into equal-width sub-rings,
/// each filled flat with the ramp sample at its radial position.
fn fill_rings(
    target: &mut Pixmap,
    crop: &CropArea,
    shape: ShapeKind,
    size: f32,
    gradient: &GradientSpec,
) {
    let count = gradient.stops.len().max(MIN_RINGS);
    for i in 0..count {
        let t = i as f32 / (count - 1) as f32;
        let color = gradient.sample(t);
        let path = match shape {
            ShapeKind::Circle => {
                let (cx, cy) = crop.center();
                let outer_edge = crop.width / 2.0;
                let band = outer_edge * size / count as f32;
                let outer = outer_edge - band * i as f32;
                ring_path(cx, cy, outer, outer - band)
            }
            ShapeKind::Square => {
                let band = crop.width * size / count as f32;
                frame_path(crop, band * i as f32, band * (i + 1) as f32)
            }
        };
        if let Some(path) = path {
            fill_solid(target, &path, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderStrategy, apply, gradient_endpoints, preset};
    use crate::gradient::GradientSpec;
    use crate::state::{BorderKind, BorderSpec, Color, CropArea, ShapeKind};
    use tiny_skia::Pixmap;

    fn surface(size: u32) -> Pixmap {
        Pixmap::new(size, size).unwrap()
    }

    fn px(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap().demultiply();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn solid_spec(size: f32) -> BorderSpec {
        BorderSpec {
            kind: BorderKind::Solid,
            size,
            ..BorderSpec::default()
        }
    }

    #[test]
    fn solid_circle_paints_an_inward_annulus() {
        let mut target = surface(200);
        let crop = CropArea::new(0.0, 0.0, 200.0, 200.0);
        apply(&mut target, &crop, ShapeKind::Circle, &solid_spec(0.1));

        // Ring band is radius 90..100 around (100, 100).
        assert_eq!(px(&target, 100, 5), [255, 140, 0, 255]);
        assert_eq!(px(&target, 5, 100), [255, 140, 0, 255]);
        // Interior and the area past the crop edge stay untouched.
        assert_eq!(px(&target, 100, 100)[3], 0);
        assert_eq!(px(&target, 100, 15)[3], 0);
        assert_eq!(px(&target, 2, 2)[3], 0);
    }

    #[test]
    fn solid_square_paints_an_inset_frame() {
        let mut target = surface(200);
        let crop = CropArea::new(0.0, 0.0, 200.0, 200.0);
        apply(&mut target, &crop, ShapeKind::Square, &solid_spec(0.1));

        // Frame band is inset 0..20.
        assert_eq!(px(&target, 10, 100), [255, 140, 0, 255]);
        assert_eq!(px(&target, 100, 195), [255, 140, 0, 255]);
        assert_eq!(px(&target, 100, 100)[3], 0);
        assert_eq!(px(&target, 30, 30)[3], 0);
    }

    #[test]
    fn border_respects_crop_placement() {
        let mut target = surface(300);
        let crop = CropArea::new(20.0, 20.0, 100.0, 100.0);
        apply(&mut target, &crop, ShapeKind::Circle, &solid_spec(0.2));

        // Crop circle is centered at (70, 70) with radius 50.
        assert_eq!(px(&target, 70, 24), [255, 140, 0, 255]);
        assert_eq!(px(&target, 200, 200)[3], 0);
        assert_eq!(px(&target, 70, 70)[3], 0);
    }

    #[test]
    fn invisible_specs_paint_nothing() {
        let mut target = surface(64);
        let crop = CropArea::new(0.0, 0.0, 64.0, 64.0);
        apply(&mut target, &crop, ShapeKind::Circle, &BorderSpec::default());
        apply(&mut target, &crop, ShapeKind::Circle, &solid_spec(0.0));
        assert!(target.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn angle_zero_runs_bottom_to_top() {
        let (start, end) = gradient_endpoints(0, 200.0, 200.0);
        assert!((start.x - 100.0).abs() < 1e-3 && (start.y - 200.0).abs() < 1e-3);
        assert!((end.x - 100.0).abs() < 1e-3 && (end.y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn custom_linear_gradient_follows_the_line() {
        let mut target = surface(200);
        let crop = CropArea::new(0.0, 0.0, 200.0, 200.0);
        let spec = BorderSpec {
            kind: BorderKind::Custom,
            size: 0.5,
            gradient: Some(GradientSpec::from_table(0, &[(0.0, 0x000000), (1.0, 0xffffff)])),
            ..BorderSpec::default()
        };
        apply(&mut target, &crop, ShapeKind::Circle, &spec);

        // Stop 0 lands at the bottom of the ring, stop 1 at the top.
        let bottom = px(&target, 100, 195);
        let top = px(&target, 100, 4);
        assert!(bottom[0] < 20, "bottom should be near black: {bottom:?}");
        assert!(top[0] > 235, "top should be near white: {top:?}");
    }

    #[test]
    fn preset_names_select_distinct_strategies() {
        let (linear, s1) = preset("retro").unwrap();
        let (rings, s2) = preset("retro-rings").unwrap();
        assert_eq!(s1, RenderStrategy::Linear);
        assert_eq!(s2, RenderStrategy::Rings);
        assert_eq!(linear.stops, rings.stops);
        assert!(preset("plaid").is_none());
    }

    #[test]
    fn ring_strategy_samples_the_ramp_outermost_first() {
        let mut target = surface(200);
        let crop = CropArea::new(0.0, 0.0, 200.0, 200.0);
        let spec = BorderSpec {
            kind: BorderKind::Preset("retro-rings".to_string()),
            size: 0.3,
            ..BorderSpec::default()
        };
        apply(&mut target, &crop, ShapeKind::Circle, &spec);

        // Six sub-rings of width 5 between radius 70 and 100; the center
        // of the outermost band (radius 97.5) carries the first stop.
        let outermost = px(&target, 100, 2);
        let expected = Color::rgb(0xf9, 0x73, 0x16);
        assert!((outermost[0] as i32 - expected.r as i32).abs() <= 2);
        assert!((outermost[1] as i32 - expected.g as i32).abs() <= 2);
        assert!((outermost[2] as i32 - expected.b as i32).abs() <= 2);
        // Inside the innermost sub-ring nothing is painted.
        assert_eq!(px(&target, 100, 100)[3], 0);
    }
}
