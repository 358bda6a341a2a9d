//! Gradient editor dialog: edits a working copy of a [`GradientSpec`] and
//! hands the finished spec back to the session on save.

use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, Rect, SpreadMode,
    Transform,
};

use crate::gradient::{GradientSpec, PRESET_NAMES};
use crate::notice::Notice;
use crate::render::pipeline::rgba_from_pixmap;
use crate::state::Color;

const STRIP_W: u32 = 220;
const STRIP_H: u32 = 48;

pub fn color32_from(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

pub fn color_from32(color: egui::Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color { r, g, b, a }
}

pub struct GradientEditor {
    open: bool,
    spec: GradientSpec,
    selected: usize,
    texture: Option<egui::TextureHandle>,
    dirty: bool,
}

impl GradientEditor {
    pub fn new() -> Self {
        Self {
            open: false,
            spec: GradientSpec::default(),
            selected: 0,
            texture: None,
            dirty: true,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
        self.dirty = true;
    }

    /// Draws the dialog when open. Returns the saved spec once the user
    /// confirms, plus any rejection notices raised while editing.
    pub fn show(&mut self, ctx: &egui::Context) -> (Option<GradientSpec>, Vec<Notice>) {
        let mut saved = None;
        let mut notices = Vec::new();
        if !self.open {
            return (saved, notices);
        }

        let mut keep_open = true;
        let mut done = false;
        egui::Window::new("Gradient editor")
            .open(&mut keep_open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                self.angle_row(ui);

                self.refresh_texture(ctx);
                if let Some(texture) = &self.texture {
                    ui.image(texture);
                }
                ui.label(format!(
                    "Stops: {}    Angle: {}°",
                    self.spec.stops.len(),
                    self.spec.angle_degrees
                ));
                ui.separator();

                self.stop_rows(ui, &mut notices);
                self.stop_buttons(ui, &mut notices);
                self.preset_row(ui);

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        saved = Some(self.spec.clone());
                        done = true;
                    }
                    if ui.button("Cancel").clicked() {
                        done = true;
                    }
                });
            });

        self.open = keep_open && !done;
        (saved, notices)
    }

    fn angle_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Angle");
            let mut angle = self.spec.angle_degrees;
            let resp = ui.add(egui::Slider::new(&mut angle, 0..=360).suffix("°"));
            if resp.changed() {
                self.spec.angle_degrees = angle;
                self.dirty = true;
            }
        });
    }

    fn stop_rows(&mut self, ui: &mut egui::Ui, notices: &mut Vec<Notice>) {
        let mut remove_at = None;
        for i in 0..self.spec.stops.len() {
            ui.horizontal(|ui| {
                let selected = i == self.selected;
                let mut color32 = color32_from(self.spec.stops[i].color);
                let picked = egui::color_picker::color_edit_button_srgba(
                    ui,
                    &mut color32,
                    egui::color_picker::Alpha::Opaque,
                );
                if picked.clicked() || picked.changed() {
                    self.selected = i;
                }
                if picked.changed() {
                    self.spec.stops[i].color = color_from32(color32);
                    self.dirty = true;
                }

                let mut percent = self.spec.stops[i].position * 100.0;
                let resp = ui.add(
                    egui::DragValue::new(&mut percent)
                        .range(0.0..=100.0)
                        .speed(1.0)
                        .suffix("%"),
                );
                if resp.changed() {
                    self.spec.stops[i].position = percent / 100.0;
                    self.dirty = true;
                }

                if selected {
                    ui.label("•");
                }
                if ui.small_button("×").clicked() {
                    remove_at = Some(i);
                }
            });
        }

        if let Some(i) = remove_at {
            match self.spec.remove_stop_at(i) {
                Ok(()) => {
                    self.selected = self.selected.min(self.spec.stops.len() - 1);
                    self.dirty = true;
                }
                Err(rejection) => notices.push(rejection.into()),
            }
        }
    }

    fn stop_buttons(&mut self, ui: &mut egui::Ui, notices: &mut Vec<Notice>) {
        ui.horizontal(|ui| {
            if ui.button("Add stop").clicked() {
                match self.spec.add_stop() {
                    Ok(index) => {
                        self.selected = index;
                        self.dirty = true;
                    }
                    Err(rejection) => notices.push(rejection.into()),
                }
            }
            if ui.button("Remove stop").clicked() {
                match self.spec.remove_stop_at(self.selected) {
                    Ok(()) => {
                        self.selected = self.selected.saturating_sub(1);
                        self.dirty = true;
                    }
                    Err(rejection) => notices.push(rejection.into()),
                }
            }
            if ui.button("Equidistant").clicked() {
                self.spec.make_equidistant();
                self.dirty = true;
            }
        });
    }

    fn preset_row(&mut self, ui: &mut egui::Ui) {
        egui::ComboBox::from_id_salt("gradient_presets")
            .selected_text("Load preset…")
            .show_ui(ui, |ui| {
                for name in PRESET_NAMES {
                    if ui.selectable_label(false, name).clicked() && self.spec.load_preset(name) {
                        self.selected = 0;
                        self.dirty = true;
                    }
                }
            });
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty && self.texture.is_some() {
            return;
        }
        let image = self.render_strip();
        self.texture = Some(ctx.load_texture("gradient_preview", image, egui::TextureOptions::LINEAR));
        self.dirty = false;
    }

    /// Rasterizes the working gradient into the preview strip. The strip
    /// uses the plain perpendicular-endpoint convention (the border
    /// compositor has its own endpoint mapping).
    fn render_strip(&self) -> egui::ColorImage {
        let mut pixmap =
            Pixmap::new(STRIP_W, STRIP_H).expect("preview strip dimensions are nonzero");
        let (w, h) = (STRIP_W as f32, STRIP_H as f32);

        let angle = (self.spec.angle_degrees as f32).to_radians();
        let start = Point::from_xy(
            w / 2.0 + (angle - std::f32::consts::FRAC_PI_2).cos() * w / 2.0,
            h / 2.0 + (angle - std::f32::consts::FRAC_PI_2).sin() * h / 2.0,
        );
        let end = Point::from_xy(
            w / 2.0 + (angle + std::f32::consts::FRAC_PI_2).cos() * w / 2.0,
            h / 2.0 + (angle + std::f32::consts::FRAC_PI_2).sin() * h / 2.0,
        );

        let stops: Vec<GradientStop> = self
            .spec
            .sorted_stops()
            .iter()
            .map(|s| GradientStop::new(s.position.clamp(0.0, 1.0), s.color.to_skia()))
            .collect();
        if let Some(shader) =
            LinearGradient::new(start, end, stops, SpreadMode::Pad, Transform::identity())
        {
            let paint = Paint {
                shader,
                anti_alias: false,
                ..Paint::default()
            };
            if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
                let path = PathBuilder::from_rect(rect);
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }

        let rgba = rgba_from_pixmap(&pixmap);
        egui::ColorImage::from_rgba_unmultiplied(
            [STRIP_W as usize, STRIP_H as usize],
            rgba.as_raw(),
        )
    }
}
