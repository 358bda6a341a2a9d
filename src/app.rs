//! The eframe shell: translates raw UI events into [`Intent`]s, keeps the
//! rendered surfaces uploaded as textures, and owns the transient toasts.
//! All cropping behavior lives in the session; this file is wiring.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::controller::{Hit, NudgeDirection};
use crate::cropper::Cropper;
use crate::editor::{GradientEditor, color32_from, color_from32};
use crate::intent::Intent;
use crate::notice::{Notice, Rejection};
use crate::render::border::BORDER_PRESETS;
use crate::render::pipeline::rgba_from_pixmap;
use crate::state::{BorderKind, Corner, ShapeKind};

const INITIAL_CANVAS: (u32, u32) = (800, 600);

enum LoadResult {
    Decoded(image::RgbaImage),
    Failed(Rejection),
}

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

pub struct PortraitApp {
    cropper: Cropper,
    editor: GradientEditor,
    config: AppConfig,
    toasts: Vec<Toast>,
    main_texture: Option<egui::TextureHandle>,
    preview_textures: Vec<(u32, egui::TextureHandle)>,
    shown_revision: Option<u64>,
    tx: mpsc::SyncSender<LoadResult>,
    rx: mpsc::Receiver<LoadResult>,
    loading: bool,
}

impl PortraitApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let (tx, rx) = mpsc::sync_channel(4);
        let cropper = Cropper::new(
            INITIAL_CANVAS.0,
            INITIAL_CANVAS.1,
            &config.preview_sizes(),
            config.flip_mode(),
        );
        Self {
            cropper,
            editor: GradientEditor::new(),
            config,
            toasts: Vec::new(),
            main_texture: None,
            preview_textures: Vec::new(),
            shown_revision: None,
            tx,
            rx,
            loading: false,
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        if let Some(notice) = self.cropper.dispatch(intent) {
            self.notify(notice);
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.toasts.push(Toast {
            notice,
            shown_at: Instant::now(),
        });
    }

    /// Decode happens off the UI thread; the pipeline never touches pixel
    /// data before the decoded bitmap arrives over the channel.
    fn spawn_decode(&mut self, ctx: &egui::Context, bytes: Vec<u8>) {
        self.loading = true;
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = match Cropper::decode(&bytes) {
                Ok(img) => LoadResult::Decoded(img),
                Err(rejection) => LoadResult::Failed(rejection),
            };
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn spawn_load(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.loading = true;
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = match std::fs::read(&path) {
                Ok(bytes) => match Cropper::decode(&bytes) {
                    Ok(img) => LoadResult::Decoded(img),
                    Err(rejection) => LoadResult::Failed(rejection),
                },
                Err(_) => LoadResult::Failed(Rejection::UnsupportedImage),
            };
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn drain(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            self.loading = false;
            match result {
                LoadResult::Decoded(img) => self.dispatch(Intent::LoadImage(img)),
                LoadResult::Failed(rejection) => self.notify(rejection.into()),
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(bytes) = file.bytes {
            self.spawn_decode(ctx, bytes.to_vec());
        } else if let Some(path) = file.path {
            self.spawn_load(ctx, path);
        }
    }

    fn export(&mut self) {
        match self.cropper.export() {
            Ok(None) => {}
            Ok(Some(exported)) => {
                let picked = rfd::FileDialog::new()
                    .set_file_name(&exported.suggested_name)
                    .add_filter("PNG image", &["png"])
                    .save_file();
                if let Some(path) = picked {
                    match std::fs::write(&path, &exported.png) {
                        Ok(()) => {
                            self.notify(Notice::Success("Avatar exported successfully!".into()))
                        }
                        Err(err) => self.notify(Notice::Error(format!("Save failed: {err}"))),
                    }
                }
            }
            Err(err) => self.notify(Notice::Error(format!("Export failed: {err}"))),
        }
    }

    fn toolbar_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Load image…").clicked() {
                let picked = rfd::FileDialog::new()
                    .add_filter(
                        "Images",
                        &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif"],
                    )
                    .pick_file();
                if let Some(path) = picked {
                    self.spawn_load(ctx, path);
                }
            }
            if self.loading {
                ui.spinner();
            }
            ui.separator();

            let shape = self.cropper.shape();
            if ui
                .selectable_label(shape == ShapeKind::Circle, "Circle")
                .clicked()
            {
                self.dispatch(Intent::SetShape(ShapeKind::Circle));
            }
            if ui
                .selectable_label(shape == ShapeKind::Square, "Square")
                .clicked()
            {
                self.dispatch(Intent::SetShape(ShapeKind::Square));
            }
            ui.separator();

            if ui.button("Zoom −").clicked() {
                self.dispatch(Intent::ZoomOut);
            }
            if ui.button("Zoom +").clicked() {
                self.dispatch(Intent::ZoomIn);
            }
            if ui.button("Fit").clicked() {
                self.dispatch(Intent::ZoomToFit);
            }
            ui.separator();

            ui.label("Rotate");
            let mut rotation = self.cropper.view().rotation_degrees;
            let resp = ui.add(egui::Slider::new(&mut rotation, 0..=360).suffix("°"));
            if resp.changed() {
                self.dispatch(Intent::SetRotation(rotation));
            }
            let view = self.cropper.view();
            let (flip_x, flip_y) = (view.flip_x, view.flip_y);
            if ui.selectable_label(flip_x, "Flip H").clicked() {
                self.dispatch(Intent::FlipHorizontal);
            }
            if ui.selectable_label(flip_y, "Flip V").clicked() {
                self.dispatch(Intent::FlipVertical);
            }
        });

        ui.horizontal_wrapped(|ui| {
            ui.label("Border");
            self.border_combo(ui);

            let border = self.cropper.border().clone();
            if border.kind != BorderKind::None {
                let mut size = border.size;
                let resp = ui.add(
                    egui::Slider::new(&mut size, 0.0..=0.5)
                        .fixed_decimals(2)
                        .text("size"),
                );
                if resp.changed() {
                    self.dispatch(Intent::SetBorderSize(size));
                }
            }
            if border.kind == BorderKind::Solid {
                let mut color32 = color32_from(border.color);
                let resp = egui::color_picker::color_edit_button_srgba(
                    ui,
                    &mut color32,
                    egui::color_picker::Alpha::Opaque,
                );
                if resp.changed() {
                    self.dispatch(Intent::SetBorderColor(color_from32(color32)));
                }
            }
            ui.separator();

            if ui.button("Center").clicked() {
                self.dispatch(Intent::Center);
            }
            if ui.button("Reset").clicked() {
                self.dispatch(Intent::Reset);
            }
            ui.separator();

            let export = ui.add_enabled(
                self.cropper.has_image(),
                egui::Button::new("Export PNG"),
            );
            if export.clicked() {
                self.export();
            }
        });
    }

    fn border_combo(&mut self, ui: &mut egui::Ui) {
        let kind = self.cropper.border().kind.clone();
        let selected = match &kind {
            BorderKind::None => "No border".to_string(),
            BorderKind::Solid => "Solid".to_string(),
            BorderKind::Preset(name) => BORDER_PRESETS
                .iter()
                .find(|(preset, _)| *preset == name.as_str())
                .map(|(_, label)| label.to_string())
                .unwrap_or_else(|| name.clone()),
            BorderKind::Custom => "Custom gradient".to_string(),
        };

        egui::ComboBox::from_id_salt("border_kind")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(kind == BorderKind::None, "No border")
                    .clicked()
                {
                    self.dispatch(Intent::SetBorderKind(BorderKind::None));
                }
                if ui
                    .selectable_label(kind == BorderKind::Solid, "Solid")
                    .clicked()
                {
                    self.dispatch(Intent::SetBorderKind(BorderKind::Solid));
                }
                for (name, label) in BORDER_PRESETS {
                    let active = kind == BorderKind::Preset(name.to_string());
                    if ui.selectable_label(active, label).clicked() {
                        self.dispatch(Intent::SetBorderKind(BorderKind::Preset(name.to_string())));
                    }
                }
                // Picking the custom entry opens the editor; the border
                // only switches once the gradient is saved.
                if ui
                    .selectable_label(kind == BorderKind::Custom, "Custom gradient…")
                    .clicked()
                {
                    self.editor.open();
                }
            });
    }

    fn canvas_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let avail = ui.available_rect_before_wrap();
        let wanted = (avail.width().max(1.0), avail.height().max(1.0));
        let current = self.cropper.main_surface();
        if (current.width() as f32 - wanted.0).abs() >= 1.0
            || (current.height() as f32 - wanted.1).abs() >= 1.0
        {
            self.dispatch(Intent::CanvasResized {
                width: wanted.0,
                height: wanted.1,
            });
        }

        let (rect, response) = ui.allocate_exact_size(avail.size(), egui::Sense::click_and_drag());
        let to_local = |p: egui::Pos2| (p.x - rect.min.x, p.y - rect.min.y);

        let (pressed, released, pointer) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        if pressed && response.hovered() {
            if let Some(p) = pointer {
                let (x, y) = to_local(p);
                self.dispatch(Intent::PointerDown { x, y });
            }
        }
        if self.cropper.is_dragging() {
            if let Some(p) = pointer {
                let (x, y) = to_local(p);
                self.dispatch(Intent::PointerMove { x, y });
            }
            if released {
                self.dispatch(Intent::PointerUp);
            }
        } else if let Some(p) = response.hover_pos() {
            let (x, y) = to_local(p);
            let icon = match self.cropper.hit_test(x, y) {
                Hit::Move => egui::CursorIcon::Grab,
                Hit::Resize(Corner::Nw) | Hit::Resize(Corner::Se) => egui::CursorIcon::ResizeNwSe,
                Hit::Resize(Corner::Ne) | Hit::Resize(Corner::Sw) => egui::CursorIcon::ResizeNeSw,
                Hit::None => egui::CursorIcon::Crosshair,
            };
            ctx.set_cursor_icon(icon);
        }

        self.zoom_input(ctx, &response);
        self.keyboard_input(ctx);

        self.sync_textures(ctx);
        if let Some(texture) = &self.main_texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        if !self.cropper.has_image() && !self.loading {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Drop an image here or use Load image",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
        }
    }

    fn zoom_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        if !response.hovered() {
            return;
        }
        // Pinch gestures and Ctrl/Cmd-wheel both arrive as a zoom factor.
        let factor = ctx.input(|i| i.zoom_delta());
        if (factor - 1.0).abs() > f32::EPSILON {
            self.dispatch(Intent::ZoomBy(factor));
            return;
        }
        if !self.config.wheel_zoom_needs_modifier() {
            let (scroll, plain) = ctx.input(|i| {
                (
                    i.raw_scroll_delta.y,
                    !i.modifiers.ctrl && !i.modifiers.command,
                )
            });
            if scroll != 0.0 && plain {
                self.dispatch(Intent::ZoomBy(Cropper::wheel_zoom_factor(scroll > 0.0)));
            }
        }
    }

    fn keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let directions = [
            (egui::Key::ArrowUp, NudgeDirection::Up),
            (egui::Key::ArrowDown, NudgeDirection::Down),
            (egui::Key::ArrowLeft, NudgeDirection::Left),
            (egui::Key::ArrowRight, NudgeDirection::Right),
        ];
        for (key, direction) in directions {
            if ctx.input(|i| i.key_pressed(key)) {
                self.dispatch(Intent::Nudge(direction));
            }
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        let revision = self.cropper.revision();
        if self.shown_revision == Some(revision) {
            return;
        }
        let main = rgba_from_pixmap(self.cropper.main_surface());
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [main.width() as usize, main.height() as usize],
            main.as_raw(),
        );
        self.main_texture = Some(ctx.load_texture("main_canvas", image, egui::TextureOptions::LINEAR));

        self.preview_textures = self
            .cropper
            .previews()
            .map(|(size, surface)| {
                let rgba = rgba_from_pixmap(surface);
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [size as usize, size as usize],
                    rgba.as_raw(),
                );
                let texture = ctx.load_texture(
                    format!("preview_{size}"),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                (size, texture)
            })
            .collect();
        self.shown_revision = Some(revision);
    }

    fn previews_ui(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Previews").strong());
        ui.separator();
        for (size, texture) in &self.preview_textures {
            ui.vertical_centered(|ui| {
                ui.image(texture);
                ui.label(egui::RichText::new(format!("{size}×{size}")).weak());
                ui.add_space(8.0);
            });
        }
    }

    fn toasts_ui(&mut self, ctx: &egui::Context) {
        self.toasts
            .retain(|toast| toast.shown_at.elapsed() < toast.notice.timeout());
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 16.0))
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    let color = match &toast.notice {
                        Notice::Success(_) => egui::Color32::from_rgb(0x2d, 0x6a, 0x4f),
                        Notice::Error(_) => egui::Color32::from_rgb(0x8b, 0x1e, 0x1e),
                    };
                    egui::Frame::popup(ui.style()).fill(color).show(ui, |ui| {
                        ui.colored_label(egui::Color32::WHITE, toast.notice.text());
                    });
                    ui.add_space(4.0);
                }
            });
        // Wake up to dismiss toasts even without input.
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for PortraitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain();
        self.handle_dropped_files(ctx);
        self.sync_textures(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar_ui(ctx, ui);
        });
        egui::SidePanel::right("preview_panel")
            .resizable(false)
            .default_width(160.0)
            .show(ctx, |ui| {
                self.previews_ui(ui);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas_ui(ctx, ui);
        });

        let (saved, notices) = self.editor.show(ctx);
        for notice in notices {
            self.notify(notice);
        }
        if let Some(spec) = saved {
            self.dispatch(Intent::SaveGradient(spec));
        }

        self.toasts_ui(ctx);

        let size = ctx.input(|i| i.screen_rect().size());
        self.config.window_width = Some(size.x);
        self.config.window_height = Some(size.y);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}
