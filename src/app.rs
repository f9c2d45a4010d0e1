use crate::engine::ModelKind;
use crate::io;
use crate::notify;
use crate::preview;
use crate::state::Studio;
use eframe::egui;
use image::RgbaImage;

pub struct ClearCutApp {
    studio: Studio,
    original_tex: Option<egui::TextureHandle>,
    result_tex: Option<egui::TextureHandle>,
}

impl ClearCutApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            studio: Studio::new(),
            original_tex: None,
            result_tex: None,
        }
    }
}

fn upload(ctx: &egui::Context, name: &str, image: &RgbaImage) -> egui::TextureHandle {
    ctx.load_texture(name, preview::color_image(image), egui::TextureOptions::LINEAR)
}

/// One preview pane: a fixed square panel with the texture fitted inside.
fn preview_panel(ui: &mut egui::Ui, title: &str, texture: Option<&egui::TextureHandle>) {
    ui.vertical(|ui| {
        ui.label(egui::RichText::new(title).strong());
        let (rect, _response) = ui.allocate_exact_size(
            egui::vec2(preview::PANEL, preview::PANEL),
            egui::Sense::hover(),
        );
        ui.painter()
            .rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);
        if let Some(texture) = texture {
            let [width, height] = texture.size();
            let target = preview::fit_rect(width as u32, height as u32, rect);
            ui.painter().image(
                texture.id(),
                target,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    });
}

impl eframe::App for ClearCutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.studio.poll() {
            self.result_tex = self
                .studio
                .output_image
                .as_ref()
                .map(|image| upload(ctx, "result", image));
        }
        // Keep repainting while a removal runs so the drain above stays live.
        if self.studio.busy() {
            ctx.request_repaint();
        }

        let dismissed = match &self.studio.notice {
            Some(notice) => notify::show(ctx, notice),
            None => false,
        };
        if dismissed {
            self.studio.notice = None;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Background Removal Tool");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Image:");
                if ui.button("Browse…").clicked()
                    && let Some(path) = io::pick_input_file()
                {
                    self.studio.select_input(path);
                    self.original_tex = self
                        .studio
                        .input_image
                        .as_ref()
                        .map(|image| upload(ctx, "original", image));
                }
                match &self.studio.input_path {
                    Some(path) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string());
                        ui.label(name);
                    }
                    None => {
                        ui.weak("No file selected");
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Model:");
                let mut selected = self.studio.current_model();
                egui::ComboBox::from_id_source("model_picker")
                    .selected_text(selected.identifier())
                    .width(220.0)
                    .show_ui(ui, |ui| {
                        for kind in ModelKind::all() {
                            ui.selectable_value(&mut selected, *kind, kind.identifier());
                        }
                    });
                if selected != self.studio.current_model() {
                    self.studio.select_model(selected);
                }
                ui.checkbox(&mut self.studio.options.alpha_matting, "Alpha matting");
            });

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("Remove Background").clicked() {
                    self.studio.run_removal();
                }
                if ui.button("Save Result").clicked() {
                    self.studio.save_output(io::pick_save_file);
                }
                if self.studio.busy() {
                    ui.spinner();
                    ui.label("Processing…");
                }
            });

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                preview_panel(ui, "Original", self.original_tex.as_ref());
                ui.add_space(8.0);
                preview_panel(ui, "Result", self.result_tex.as_ref());
            });
        });
    }
}
