//! Frame orchestration: main-canvas overlay rendering, preview/export
//! rendering from the shared source rectangle, and surface conversions.
//!
//! Draw order on the main surface: image → shade → cut-out → border →
//! dashed outline → corner handles. Previews and the export run the same
//! crop-masked draw at different target sizes; because they consume the
//! identical source rectangle, every output shows the same pixels up to
//! resampling.

use image::codecs::png::{
    CompressionType as PngCompressionType, FilterType as PngFilterType, PngEncoder,
};
use image::{Rgba, RgbaImage};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Stroke, StrokeDash, Transform,
};

use super::border;
use super::mapper::{self, SourceRect};
use crate::state::{BorderSpec, Color, CropArea, ShapeKind, ViewTransform};

/// Fixed export resolution.
pub const EXPORT_SIZE: u32 = 512;

/// Preview thumbnail edge lengths, in pixels.
pub const DEFAULT_PREVIEW_SIZES: [u32; 4] = [30, 40, 64, 128];

const SHADE_ALPHA: u8 = 128;
const OUTLINE_COLOR: Color = Color::rgb(0x00, 0xff, 0x00);
const OUTLINE_WIDTH: f32 = 2.0;
const DASH_PATTERN: [f32; 2] = [5.0, 5.0];
const HANDLE_SIZE: f32 = 8.0;

/// Renders the interactive view: transformed image, shaded surround with
/// the crop hole cut out, border decoration, outline, resize handles.
/// Without an image the surface is simply cleared.
pub fn render_main(
    target: &mut Pixmap,
    image: Option<&Pixmap>,
    crop: &CropArea,
    shape: ShapeKind,
    view: &ViewTransform,
    border_spec: &BorderSpec,
) {
    target.fill(tiny_skia::Color::TRANSPARENT);
    let Some(image) = image else {
        return;
    };

    let transform = mapper::forward_transform(
        view,
        image.width() as f32,
        image.height() as f32,
        target.width() as f32,
        target.height() as f32,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);

    draw_shade(target, crop, shape);
    border::apply(target, crop, shape, border_spec);
    draw_outline(target, crop, shape);
    draw_handles(target, crop);
}

/// Renders the crop into a square target (preview thumbnail or export):
/// scaled draw of the shared source rectangle, shape mask, then the same
/// border compositor against the full target bounds.
pub fn render_cropped(
    target: &mut Pixmap,
    image: &Pixmap,
    src: &SourceRect,
    shape: ShapeKind,
    view: &ViewTransform,
    border_spec: &BorderSpec,
) {
    target.fill(tiny_skia::Color::TRANSPARENT);
    let size = target.width() as f32;

    let scale = size / src.width.max(src.height);
    let sx = if view.flip_x { -scale } else { scale };
    let sy = if view.flip_y { -scale } else { scale };
    let (scx, scy) = src.center();
    let transform = Transform::from_row(
        sx,
        0.0,
        0.0,
        sy,
        size / 2.0 - sx * scx,
        size / 2.0 - sy * scy,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);

    if shape == ShapeKind::Circle {
        mask_circle(target);
    }

    let bounds = CropArea::new(0.0, 0.0, size, size);
    border::apply(target, &bounds, shape, border_spec);
}

/// Translucent shade over everything but the crop region. Runs on its own
/// layer so the erasing composite leaves the image underneath intact.
fn draw_shade(target: &mut Pixmap, crop: &CropArea, shape: ShapeKind) {
    let Some(mut layer) = Pixmap::new(target.width(), target.height()) else {
        return;
    };
    layer.fill(tiny_skia::Color::from_rgba8(0, 0, 0, SHADE_ALPHA));

    if let Some(path) = crop_path(crop, shape) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        paint.blend_mode = BlendMode::DestinationOut;
        layer.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    target.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Erases everything outside the inscribed circle.
fn mask_circle(target: &mut Pixmap) {
    let size = target.width() as f32;
    let Some(full) = Rect::from_xywh(0.0, 0.0, size, size) else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.push_rect(full);
    pb.push_circle(size / 2.0, size / 2.0, size / 2.0);
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    paint.blend_mode = BlendMode::DestinationOut;
    target.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
}

fn crop_path(crop: &CropArea, shape: ShapeKind) -> Option<Path> {
    match shape {
        ShapeKind::Circle => {
            let (cx, cy) = crop.center();
            PathBuilder::from_circle(cx, cy, crop.width / 2.0)
        }
        ShapeKind::Square => {
            Some(PathBuilder::from_rect(Rect::from_xywh(
                crop.x,
                crop.y,
                crop.width,
                crop.height,
            )?))
        }
    }
}

fn draw_outline(target: &mut Pixmap, crop: &CropArea, shape: ShapeKind) {
    let Some(path) = crop_path(crop, shape) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(OUTLINE_COLOR.to_skia());
    paint.anti_alias = true;
    let stroke = Stroke {
        width: OUTLINE_WIDTH,
        dash: StrokeDash::new(DASH_PATTERN.to_vec(), 0.0),
        ..Stroke::default()
    };
    target.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

fn draw_handles(target: &mut Pixmap, crop: &CropArea) {
    let mut paint = Paint::default();
    paint.set_color(OUTLINE_COLOR.to_skia());
    paint.anti_alias = true;
    for corner in crate::state::Corner::ALL {
        let (x, y) = crop.corner_point(corner);
        if let Some(rect) = Rect::from_xywh(
            x - HANDLE_SIZE / 2.0,
            y - HANDLE_SIZE / 2.0,
            HANDLE_SIZE,
            HANDLE_SIZE,
        ) {
            target.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

/// Premultiplies a decoded bitmap into a drawable surface.
pub fn pixmap_from_rgba(img: &RgbaImage) -> Option<Pixmap> {
    let (w, h) = img.dimensions();
    let mut data = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for p in img.pixels() {
        let c = tiny_skia::ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, tiny_skia::IntSize::from_wh(w, h)?)
}

/// Demultiplies a rendered surface back into straight-alpha RGBA.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Encodes a rendered surface as PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> anyhow::Result<Vec<u8>> {
    let img = rgba_from_pixmap(pixmap);
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buf,
        PngCompressionType::Default,
        PngFilterType::Adaptive,
    );
    img.write_with_encoder(encoder)?;
    Ok(buf)
}
