//! In-app notices.
//!
//! At most one notice is up at a time; it renders as a small modal window
//! and stays until the user clicks OK.

use eframe::egui;

/// Severity of a notice; drives the title color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user, shown until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Draw `notice` as a modal window. Returns true once the user dismisses it.
pub fn show(ctx: &egui::Context, notice: &Notice) -> bool {
    let mut dismissed = false;

    egui::Window::new("notice_dialog")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .default_pos(egui::pos2(ctx.screen_rect().center().x - 160.0, 120.0))
        .show(ctx, |ui| {
            ui.set_min_width(320.0);
            let accent = match notice.level {
                NoticeLevel::Info => ui.visuals().strong_text_color(),
                NoticeLevel::Warning => ui.visuals().warn_fg_color,
                NoticeLevel::Error => ui.visuals().error_fg_color,
            };
            ui.label(egui::RichText::new(&notice.title).color(accent).strong());
            ui.add_space(4.0);
            ui.label(&notice.message);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

    dismissed
}
