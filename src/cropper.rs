//! The cropping session: owns the decoded bitmap, the crop geometry and
//! view state, and the render surfaces. All mutation flows through
//! [`Cropper::dispatch`]; rendering is a full synchronous repaint of the
//! main surface and every preview after each state change.

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use tiny_skia::Pixmap;
use tracing::info;

use crate::controller::{Controller, Hit, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use crate::gradient::{MAX_STOPS, MIN_STOPS};
use crate::intent::Intent;
use crate::notice::{Notice, Rejection};
use crate::render::mapper::{self, FlipMode, SourceRect};
use crate::render::pipeline;
use crate::state::{
    BORDER_SIZE_MAX, BorderSpec, CropArea, ShapeKind, ViewTransform,
};

/// Margin factor applied by fit-to-view so the image does not touch the
/// canvas edges.
const FIT_MARGIN: f32 = 0.8;

/// Toolbar zoom button factors.
const BUTTON_ZOOM_IN: f32 = 1.2;
const BUTTON_ZOOM_OUT: f32 = 0.8;

#[derive(Debug, Clone)]
/// Result of an export: encoded PNG plus a filename suggestion for the
/// save dialog. The caller performs the actual save side effect.
pub struct ExportedAvatar {
    pub png: Vec<u8>,
    pub suggested_name: String,
}

pub struct Cropper {
    image: Option<Pixmap>,
    crop: CropArea,
    shape: ShapeKind,
    view: ViewTransform,
    border: BorderSpec,
    controller: Controller,
    flip_mode: FlipMode,
    canvas_w: f32,
    canvas_h: f32,
    main: Pixmap,
    preview_sizes: Vec<u32>,
    previews: Vec<Pixmap>,
    revision: u64,
}

impl Cropper {
    pub fn new(canvas_w: u32, canvas_h: u32, preview_sizes: &[u32], flip_mode: FlipMode) -> Self {
        let canvas_w = canvas_w.max(1);
        let canvas_h = canvas_h.max(1);
        let previews = preview_sizes
            .iter()
            .map(|&size| surface(size, size))
            .collect();
        Self {
            image: None,
            crop: CropArea::centered(canvas_w as f32, canvas_h as f32),
            shape: ShapeKind::Circle,
            view: ViewTransform::default(),
            border: BorderSpec::default(),
            controller: Controller::new(),
            flip_mode,
            canvas_w: canvas_w as f32,
            canvas_h: canvas_h as f32,
            main: surface(canvas_w, canvas_h),
            preview_sizes: preview_sizes.to_vec(),
            previews,
            revision: 0,
        }
    }

    /// Classifies raw bytes as a decodable image. Runs on the decode
    /// worker, off the UI thread.
    pub fn decode(bytes: &[u8]) -> Result<RgbaImage, Rejection> {
        image::load_from_memory(bytes)
            .map(|img| img.to_rgba8())
            .map_err(|_| Rejection::UnsupportedImage)
    }

    /// Single entry point for all state changes. Returns a notice for the
    /// shell to show; unmet preconditions return `None` and change nothing.
    pub fn dispatch(&mut self, intent: Intent) -> Option<Notice> {
        let mut notice = None;
        let changed = match intent {
            Intent::LoadImage(img) => match self.set_image(&img) {
                Ok(()) => {
                    notice = Some(Notice::Success("Image loaded successfully!".into()));
                    true
                }
                Err(rejection) => {
                    notice = Some(rejection.into());
                    false
                }
            },
            Intent::SetShape(shape) => {
                self.shape = shape;
                true
            }
            Intent::SetRotation(degrees) => {
                self.view.rotation_degrees = degrees;
                true
            }
            Intent::ZoomIn => {
                self.view.zoom *= BUTTON_ZOOM_IN;
                true
            }
            Intent::ZoomOut => {
                self.view.zoom *= BUTTON_ZOOM_OUT;
                true
            }
            Intent::ZoomTo(value) => {
                if value > 0.0 {
                    self.view.zoom = value;
                    true
                } else {
                    false
                }
            }
            Intent::ZoomToFit => self.fit_to_view(),
            Intent::ZoomBy(factor) => {
                self.view.zoom_by(factor);
                true
            }
            Intent::FlipHorizontal => {
                self.view.flip_x = !self.view.flip_x;
                true
            }
            Intent::FlipVertical => {
                self.view.flip_y = !self.view.flip_y;
                true
            }
            Intent::SetBorderKind(kind) => {
                self.border.kind = kind;
                true
            }
            Intent::SetBorderSize(size) => {
                self.border.size = size.clamp(0.0, BORDER_SIZE_MAX);
                true
            }
            Intent::SetBorderColor(color) => {
                self.border.color = color;
                true
            }
            Intent::SaveGradient(spec) => {
                if (MIN_STOPS..=MAX_STOPS).contains(&spec.stops.len()) {
                    self.border.gradient = Some(spec);
                    self.border.kind = crate::state::BorderKind::Custom;
                    notice = Some(Notice::Success("Custom gradient applied!".into()));
                    true
                } else {
                    let rejection = if spec.stops.len() < MIN_STOPS {
                        Rejection::TooFewStops
                    } else {
                        Rejection::TooManyStops
                    };
                    notice = Some(rejection.into());
                    false
                }
            }
            Intent::PointerDown { x, y } => {
                self.controller.pointer_down(&self.crop, self.shape, x, y);
                false
            }
            Intent::PointerMove { x, y } => {
                self.controller
                    .pointer_move(&mut self.crop, self.canvas_w, self.canvas_h, x, y)
            }
            Intent::PointerUp => {
                self.controller.pointer_up();
                false
            }
            Intent::Nudge(direction) => {
                Controller::nudge(&mut self.crop, direction, self.canvas_w, self.canvas_h);
                true
            }
            Intent::Center => {
                if self.image.is_some() {
                    self.crop = CropArea::centered(self.canvas_w, self.canvas_h);
                    true
                } else {
                    false
                }
            }
            Intent::Reset => {
                self.view = ViewTransform::default();
                self.shape = ShapeKind::Circle;
                // The saved gradient survives a reset so re-selecting the
                // custom border does not require re-authoring it.
                self.border = BorderSpec {
                    gradient: self.border.gradient.take(),
                    ..BorderSpec::default()
                };
                self.fit_to_view();
                if self.image.is_some() {
                    self.crop = CropArea::centered(self.canvas_w, self.canvas_h);
                }
                notice = Some(Notice::Success("Crop reset to defaults".into()));
                true
            }
            Intent::CanvasResized { width, height } => self.resize_canvas(width, height),
        };

        if changed {
            self.render();
        }
        notice
    }

    /// Renders the crop at the fixed export resolution and encodes it.
    /// `Ok(None)` when no image is loaded.
    pub fn export(&self) -> anyhow::Result<Option<ExportedAvatar>> {
        let Some(image) = &self.image else {
            return Ok(None);
        };
        let mut target = surface(pipeline::EXPORT_SIZE, pipeline::EXPORT_SIZE);
        let src = self.current_source_rect(image);
        pipeline::render_cropped(&mut target, image, &src, self.shape, &self.view, &self.border);
        let png = pipeline::encode_png(&target)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let suggested_name = format!("avatar_{}_{}.png", self.shape.slug(), millis);
        info!(name = %suggested_name, bytes = png.len(), "exported avatar");
        Ok(Some(ExportedAvatar {
            png,
            suggested_name,
        }))
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn border(&self) -> &BorderSpec {
        &self.border
    }

    pub fn crop(&self) -> &CropArea {
        &self.crop
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    /// What a press at this canvas position would do; drives the cursor.
    pub fn hit_test(&self, x: f32, y: f32) -> Hit {
        Controller::hit_test(&self.crop, self.shape, x, y)
    }

    pub fn main_surface(&self) -> &Pixmap {
        &self.main
    }

    pub fn previews(&self) -> impl Iterator<Item = (u32, &Pixmap)> {
        self.preview_sizes.iter().copied().zip(self.previews.iter())
    }

    /// Bumped on every repaint; lets the shell skip texture re-uploads.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Wheel-notch zoom factor for the given scroll direction.
    pub fn wheel_zoom_factor(zoom_in: bool) -> f32 {
        if zoom_in { WHEEL_ZOOM_IN } else { WHEEL_ZOOM_OUT }
    }

    fn set_image(&mut self, img: &RgbaImage) -> Result<(), Rejection> {
        let pixmap = pipeline::pixmap_from_rgba(img).ok_or(Rejection::UnsupportedImage)?;
        info!(
            width = pixmap.width(),
            height = pixmap.height(),
            "image loaded"
        );
        self.image = Some(pixmap);
        self.fit_to_view();
        self.crop = CropArea::centered(self.canvas_w, self.canvas_h);
        Ok(())
    }

    fn fit_to_view(&mut self) -> bool {
        let Some(image) = &self.image else {
            return false;
        };
        let scale_x = self.canvas_w / image.width() as f32;
        let scale_y = self.canvas_h / image.height() as f32;
        self.view.zoom = scale_x.min(scale_y) * FIT_MARGIN;
        true
    }

    fn resize_canvas(&mut self, width: f32, height: f32) -> bool {
        if width < 1.0 || height < 1.0 {
            return false;
        }
        let scale_x = width / self.canvas_w;
        let scale_y = height / self.canvas_h;
        self.canvas_w = width;
        self.canvas_h = height;
        self.main = surface(width as u32, height as u32);
        self.crop.rescale(scale_x, scale_y);
        self.crop.constrain(width, height);
        true
    }

    fn current_source_rect(&self, image: &Pixmap) -> SourceRect {
        mapper::source_rect(
            &self.crop,
            &self.view,
            image.width() as f32,
            image.height() as f32,
            self.canvas_w,
            self.canvas_h,
            self.flip_mode,
        )
    }

    fn render(&mut self) {
        pipeline::render_main(
            &mut self.main,
            self.image.as_ref(),
            &self.crop,
            self.shape,
            &self.view,
            &self.border,
        );
        if let Some(image) = &self.image {
            let src = mapper::source_rect(
                &self.crop,
                &self.view,
                image.width() as f32,
                image.height() as f32,
                self.canvas_w,
                self.canvas_h,
                self.flip_mode,
            );
            for target in &mut self.previews {
                pipeline::render_cropped(target, image, &src, self.shape, &self.view, &self.border);
            }
        } else {
            for target in &mut self.previews {
                target.fill(tiny_skia::Color::TRANSPARENT);
            }
        }
        self.revision += 1;
    }
}

fn surface(w: u32, h: u32) -> Pixmap {
    Pixmap::new(w.max(1), h.max(1)).expect("surface dimensions are clamped nonzero")
}

#[cfg(test)]
mod tests {
    use super::Cropper;
    use crate::intent::Intent;
    use crate::notice::Notice;
    use crate::render::mapper::FlipMode;
    use crate::render::pipeline::DEFAULT_PREVIEW_SIZES;
    use crate::state::{BorderKind, ShapeKind, ZOOM_MAX};
    use image::{Rgba, RgbaImage};

    fn cropper() -> Cropper {
        Cropper::new(800, 600, &DEFAULT_PREVIEW_SIZES, FlipMode::Folded)
    }

    fn test_image() -> RgbaImage {
        RgbaImage::from_pixel(200, 200, Rgba([180, 40, 40, 255]))
    }

    fn loaded() -> Cropper {
        let mut c = cropper();
        c.dispatch(Intent::LoadImage(test_image()));
        c
    }

    #[test]
    fn loading_fits_and_centers() {
        let mut c = cropper();
        let notice = c.dispatch(Intent::LoadImage(test_image()));
        assert!(matches!(notice, Some(Notice::Success(_))));
        assert!(c.has_image());
        // min(800/200, 600/200) * 0.8
        assert_eq!(c.view().zoom, 2.4);
        // Centered square of 40% of the shorter canvas edge.
        assert_eq!(c.crop().width, 240.0);
        assert_eq!((c.crop().x, c.crop().y), (280.0, 180.0));
    }

    #[test]
    fn decode_rejects_non_image_bytes() {
        assert!(Cropper::decode(b"definitely not a png").is_err());
    }

    #[test]
    fn export_without_image_is_a_silent_no_op() {
        let c = cropper();
        assert!(c.export().unwrap().is_none());
    }

    #[test]
    fn export_produces_a_square_png_with_shape_in_the_name() {
        let mut c = loaded();
        c.dispatch(Intent::SetShape(ShapeKind::Square));
        let exported = c.export().unwrap().unwrap();
        assert!(exported.suggested_name.starts_with("avatar_square_"));
        assert!(exported.suggested_name.ends_with(".png"));
        let decoded = image::load_from_memory(&exported.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 512));
    }

    #[test]
    fn fit_and_center_require_an_image() {
        let mut c = cropper();
        let before = c.revision();
        assert!(c.dispatch(Intent::ZoomToFit).is_none());
        assert!(c.dispatch(Intent::Center).is_none());
        assert_eq!(c.revision(), before);
    }

    #[test]
    fn wheel_zoom_is_clamped_but_button_zoom_is_not() {
        let mut c = loaded();
        for _ in 0..60 {
            c.dispatch(Intent::ZoomBy(1.1));
        }
        assert_eq!(c.view().zoom, ZOOM_MAX);
        for _ in 0..10 {
            c.dispatch(Intent::ZoomIn);
        }
        assert!(c.view().zoom > ZOOM_MAX);
    }

    #[test]
    fn border_size_is_clamped_to_half_the_radius() {
        let mut c = loaded();
        c.dispatch(Intent::SetBorderSize(0.9));
        assert_eq!(c.border().size, 0.5);
        c.dispatch(Intent::SetBorderSize(-1.0));
        assert_eq!(c.border().size, 0.0);
    }

    #[test]
    fn saving_a_gradient_switches_to_the_custom_border() {
        let mut c = loaded();
        let spec = crate::gradient::GradientSpec::default();
        let notice = c.dispatch(Intent::SaveGradient(spec.clone()));
        assert!(matches!(notice, Some(Notice::Success(_))));
        assert_eq!(c.border().kind, BorderKind::Custom);
        assert_eq!(c.border().gradient.as_ref(), Some(&spec));
    }

    #[test]
    fn saving_an_invalid_gradient_rejects_and_keeps_state() {
        let mut c = loaded();
        let mut spec = crate::gradient::GradientSpec::default();
        spec.stops.truncate(1);
        let notice = c.dispatch(Intent::SaveGradient(spec));
        assert!(matches!(notice, Some(Notice::Error(_))));
        assert_eq!(c.border().kind, BorderKind::None);
        assert!(c.border().gradient.is_none());
    }

    #[test]
    fn reset_restores_defaults_but_keeps_the_saved_gradient() {
        let mut c = loaded();
        c.dispatch(Intent::SetShape(ShapeKind::Square));
        c.dispatch(Intent::SetRotation(90));
        c.dispatch(Intent::FlipHorizontal);
        c.dispatch(Intent::SaveGradient(crate::gradient::GradientSpec::default()));
        c.dispatch(Intent::Reset);

        assert_eq!(c.shape(), ShapeKind::Circle);
        assert_eq!(c.view().rotation_degrees, 0);
        assert!(!c.view().flip_x);
        assert_eq!(c.border().kind, BorderKind::None);
        assert!(c.border().gradient.is_some());
        assert_eq!(c.view().zoom, 2.4);
    }

    #[test]
    fn pointer_gestures_drive_the_crop_through_dispatch() {
        let mut c = loaded();
        let (x, y) = (c.crop().x, c.crop().y);
        c.dispatch(Intent::PointerDown {
            x: x + 120.0,
            y: y + 120.0,
        });
        assert!(c.is_dragging());
        c.dispatch(Intent::PointerMove {
            x: x + 150.0,
            y: y + 130.0,
        });
        assert_eq!((c.crop().x, c.crop().y), (x + 30.0, y + 10.0));
        c.dispatch(Intent::PointerUp);
        assert!(!c.is_dragging());
    }

    #[test]
    fn idle_pointer_moves_do_not_repaint() {
        let mut c = loaded();
        let before = c.revision();
        c.dispatch(Intent::PointerMove { x: 10.0, y: 10.0 });
        assert_eq!(c.revision(), before);
    }

    #[test]
    fn canvas_resize_rescales_the_crop_uniformly() {
        let mut c = loaded();
        c.dispatch(Intent::CanvasResized {
            width: 400.0,
            height: 600.0,
        });
        // Uniform factor is min(0.5, 1.0); the crop stays square.
        assert_eq!(c.crop().width, 120.0);
        assert_eq!(c.crop().height, 120.0);
        assert_eq!(c.main_surface().width(), 400);
    }

    #[test]
    fn previews_match_the_configured_sizes() {
        let c = loaded();
        let sizes: Vec<u32> = c.previews().map(|(size, _)| size).collect();
        assert_eq!(sizes, DEFAULT_PREVIEW_SIZES.to_vec());
        for (size, surface) in c.previews() {
            assert_eq!(surface.width(), size);
            assert_eq!(surface.height(), size);
        }
    }
}
