use serde::{Deserialize, Serialize};

use crate::gradient::GradientSpec;

/// Smallest crop edge the resize gesture may produce, in canvas pixels.
pub const MIN_CROP_SIZE: f32 = 50.0;

/// Interactive (wheel/pinch) zoom bounds. Button zoom and fit-to-view are
/// deliberately unbounded: fitting a very large image may land below 0.1.
pub const ZOOM_MIN: f32 = 0.1;
pub const ZOOM_MAX: f32 = 10.0;

/// Border thickness as a fraction of the crop radius.
pub const BORDER_SIZE_MAX: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// 8-bit RGBA color.
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Square,
}

impl ShapeKind {
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Circle => "Circle",
            ShapeKind::Square => "Square",
        }
    }

    /// Lowercase name used in export filenames.
    pub fn slug(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    /// True for corners on the west edge: dragging them moves `x`.
    pub fn is_west(self) -> bool {
        matches!(self, Corner::Nw | Corner::Sw)
    }

    /// True for corners on the north edge: dragging them moves `y`.
    pub fn is_north(self) -> bool {
        matches!(self, Corner::Nw | Corner::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Crop rectangle in canvas-pixel space, top-left origin.
pub struct CropArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropArea {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square crop of 40% of the shorter canvas edge, centered.
    pub fn centered(canvas_w: f32, canvas_h: f32) -> Self {
        let size = canvas_w.min(canvas_h) * 0.4;
        Self {
            x: (canvas_w - size) / 2.0,
            y: (canvas_h - size) / 2.0,
            width: size,
            height: size,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn corner_point(&self, corner: Corner) -> (f32, f32) {
        match corner {
            Corner::Nw => (self.x, self.y),
            Corner::Ne => (self.x + self.width, self.y),
            Corner::Sw => (self.x, self.y + self.height),
            Corner::Se => (self.x + self.width, self.y + self.height),
        }
    }

    /// Hit test against the crop shape: circles use the Euclidean distance
    /// from the center, squares the axis-aligned bounds.
    pub fn contains(&self, shape: ShapeKind, x: f32, y: f32) -> bool {
        match shape {
            ShapeKind::Circle => {
                let (cx, cy) = self.center();
                (x - cx).hypot(y - cy) <= self.width / 2.0
            }
            ShapeKind::Square => {
                x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
            }
        }
    }

    /// Clamps the rectangle fully inside the canvas by translating it.
    /// Never shrinks; idempotent.
    pub fn constrain(&mut self, canvas_w: f32, canvas_h: f32) {
        self.x = self.x.min(canvas_w - self.width).max(0.0);
        self.y = self.y.min(canvas_h - self.height).max(0.0);
    }

    /// Rescales for a canvas-size change: the center follows the per-axis
    /// scale, the extent scales uniformly so the shape is preserved.
    pub fn rescale(&mut self, scale_x: f32, scale_y: f32) {
        let uniform = scale_x.min(scale_y);
        let (cx, cy) = self.center();
        self.width *= uniform;
        self.height *= uniform;
        self.x = cx * scale_x - self.width / 2.0;
        self.y = cy * scale_y - self.height / 2.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// View transform applied to the image when drawing it into the canvas.
pub struct ViewTransform {
    pub rotation_degrees: i32,
    pub zoom: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            rotation_degrees: 0,
            zoom: 1.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl ViewTransform {
    /// Horizontal scale with the flip sign folded in.
    pub fn scale_x(&self) -> f32 {
        if self.flip_x { -self.zoom } else { self.zoom }
    }

    /// Vertical scale with the flip sign folded in.
    pub fn scale_y(&self) -> f32 {
        if self.flip_y { -self.zoom } else { self.zoom }
    }

    /// Interactive zoom step (wheel/pinch): multiplies and clamps.
    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    None,
    Solid,
    /// Named built-in gradient; the name also selects the render strategy.
    Preset(String),
    /// User-authored gradient from the editor.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One owned border description, passed explicitly to the compositor.
pub struct BorderSpec {
    pub kind: BorderKind,
    /// Thickness as a fraction of the crop radius, `0.0..=0.5`.
    pub size: f32,
    /// Fill for `BorderKind::Solid`.
    pub color: Color,
    /// Gradient for `BorderKind::Custom`.
    pub gradient: Option<GradientSpec>,
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self {
            kind: BorderKind::None,
            size: 0.05,
            color: Color::rgb(0xff, 0x8c, 0x00),
            gradient: None,
        }
    }
}

impl BorderSpec {
    /// A border paints only when a kind is selected and it has thickness.
    pub fn is_visible(&self) -> bool {
        self.kind != BorderKind::None && self.size > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{BorderSpec, Color, Corner, CropArea, ShapeKind, ViewTransform, ZOOM_MAX, ZOOM_MIN};

    #[test]
    fn hex_parsing_roundtrips() {
        let c = Color::from_hex("#ff8c00").unwrap();
        assert_eq!(c, Color::rgb(255, 140, 0));
        assert_eq!(c.to_hex(), "#ff8c00");
        assert_eq!(Color::from_hex("10203040").unwrap().a, 0x40);
        assert!(Color::from_hex("#ff8c0").is_none());
        assert!(Color::from_hex("nothex!").is_none());
    }

    #[test]
    fn circle_hit_test_excludes_rect_corners() {
        let area = CropArea::new(0.0, 0.0, 100.0, 100.0);
        assert!(area.contains(ShapeKind::Circle, 50.0, 50.0));
        assert!(!area.contains(ShapeKind::Circle, 2.0, 2.0));
        assert!(area.contains(ShapeKind::Square, 2.0, 2.0));
        assert!(!area.contains(ShapeKind::Square, 101.0, 50.0));
    }

    #[test]
    fn constrain_translates_without_shrinking() {
        let mut area = CropArea::new(-20.0, 380.0, 100.0, 100.0);
        area.constrain(400.0, 400.0);
        assert_eq!((area.x, area.y), (0.0, 300.0));
        assert_eq!((area.width, area.height), (100.0, 100.0));
    }

    #[test]
    fn constrain_is_idempotent() {
        let mut area = CropArea::new(500.0, -60.0, 150.0, 150.0);
        area.constrain(400.0, 300.0);
        let once = area;
        area.constrain(400.0, 300.0);
        assert_eq!(area, once);
    }

    #[test]
    fn rescale_keeps_crop_square_under_nonuniform_resize() {
        let mut area = CropArea::new(100.0, 100.0, 200.0, 200.0);
        area.rescale(2.0, 0.5);
        assert_eq!(area.width, area.height);
        assert_eq!(area.width, 100.0);
        // Center follows the per-axis scale.
        assert_eq!(area.center(), (400.0, 100.0));
    }

    #[test]
    fn interactive_zoom_clamps_to_bounds() {
        let mut view = ViewTransform::default();
        for _ in 0..100 {
            view.zoom_by(1.1);
        }
        assert_eq!(view.zoom, ZOOM_MAX);
        for _ in 0..200 {
            view.zoom_by(0.9);
        }
        assert_eq!(view.zoom, ZOOM_MIN);
    }

    #[test]
    fn flip_folds_into_scale_sign() {
        let view = ViewTransform {
            flip_x: true,
            zoom: 2.0,
            ..Default::default()
        };
        assert_eq!(view.scale_x(), -2.0);
        assert_eq!(view.scale_y(), 2.0);
    }

    #[test]
    fn west_and_north_corner_classification() {
        assert!(Corner::Nw.is_west() && Corner::Nw.is_north());
        assert!(!Corner::Se.is_west() && !Corner::Se.is_north());
        assert!(Corner::Sw.is_west() && !Corner::Sw.is_north());
    }

    #[test]
    fn default_border_is_invisible_until_kind_set() {
        let spec = BorderSpec::default();
        assert!(!spec.is_visible());
        assert_eq!(spec.size, 0.05);
    }
}
