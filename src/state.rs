//! Application state: the controller that owns the input, the result, the
//! session manager, and the single background removal job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use image::RgbaImage;

use crate::engine::error::{EngineError, Result};
use crate::engine::{ModelKind, RemovalOptions, Remover, SessionManager};
use crate::io;
use crate::notify::Notice;

/// What a finished worker sends back to the UI thread.
pub enum JobOutcome {
    Finished { image: RgbaImage },
    Failed { message: String },
}

/// Handle for the one removal allowed in flight at a time.
struct ActiveJob {
    model: ModelKind,
}

pub struct Studio {
    /// File the user picked, kept even when its preview failed to decode.
    pub input_path: Option<PathBuf>,
    pub input_image: Option<RgbaImage>,
    /// Last successful removal; survives failed runs and new input picks.
    pub output_image: Option<RgbaImage>,
    pub options: RemovalOptions,
    /// The one notice currently shown, if any.
    pub notice: Option<Notice>,
    sessions: SessionManager,
    job: Option<ActiveJob>,
    sender: Sender<JobOutcome>,
    receiver: Receiver<JobOutcome>,
}

impl Studio {
    pub fn new() -> Self {
        Self::with_sessions(SessionManager::new())
    }

    /// Build the controller around `sessions` and eagerly prepare the
    /// default model. A failed startup build is surfaced as a notice and
    /// retried by the next `run_removal`.
    pub fn with_sessions(sessions: SessionManager) -> Self {
        let (sender, receiver) = channel();
        let mut studio = Self {
            input_path: None,
            input_image: None,
            output_image: None,
            options: RemovalOptions::default(),
            notice: None,
            sessions,
            job: None,
            sender,
            receiver,
        };
        if let Err(e) = studio.sessions.acquire() {
            crate::logger::write("ERROR", &format!("Startup model load failed: {}", e));
            studio.notice = Some(Notice::error(
                "Error",
                format!("Failed to load model: {}", e),
            ));
        }
        studio
    }

    /// True while a removal is running.
    pub fn busy(&self) -> bool {
        self.job.is_some()
    }

    /// Model the in-flight job was started with.
    pub fn active_model(&self) -> Option<ModelKind> {
        self.job.as_ref().map(|job| job.model)
    }

    /// Model the picker currently shows.
    pub fn current_model(&self) -> ModelKind {
        self.sessions.current()
    }

    /// Record `path` as the input and decode it for preview.
    ///
    /// The path sticks even when decoding fails; the failure becomes an
    /// error notice and the removal itself may still succeed or fail on
    /// its own read of the file.
    pub fn select_input(&mut self, path: PathBuf) {
        crate::logger::write("INFO", &format!("Input selected: {}", path.display()));
        match io::decode_image(&path) {
            Ok(image) => {
                self.input_image = Some(image);
            }
            Err(e) => {
                self.input_image = None;
                crate::logger::write("ERROR", &format!("Input preview failed: {}", e));
                self.notice = Some(Notice::error(
                    "Error",
                    format!("Failed to load image: {}", e),
                ));
            }
        }
        self.input_path = Some(path);
    }

    /// Switch the active model, rebuilding its session immediately.
    ///
    /// An in-flight removal keeps the session it started with; only later
    /// runs pick up the new one. On failure the previous session and
    /// selection stay in place.
    pub fn select_model(&mut self, model: ModelKind) {
        match self.sessions.set_model(model) {
            Ok(_) => {
                crate::logger::write(
                    "INFO",
                    &format!("Model switched to '{}'", model.identifier()),
                );
                self.notice = Some(Notice::info(
                    "Model Changed",
                    format!("Switched to model: {}", model.identifier()),
                ));
            }
            Err(e) => {
                crate::logger::write("ERROR", &format!("Model switch failed: {}", e));
                self.notice = Some(Notice::error(
                    "Error",
                    format!("Failed to load model: {}", e),
                ));
            }
        }
    }

    /// Start a background removal for the selected input.
    ///
    /// Guards fire in order: an in-flight job, then a missing input, then
    /// session acquisition. The worker gets its own handle to the session
    /// and never touches the manager.
    pub fn run_removal(&mut self) {
        if self.busy() {
            self.notice = Some(Notice::warning("Notice", "Still processing, please wait"));
            return;
        }
        let Some(path) = self.input_path.clone() else {
            self.notice = Some(Notice::warning("Notice", "Select an image first"));
            return;
        };
        let session = match self.sessions.acquire() {
            Ok(session) => session,
            Err(e) => {
                crate::logger::write("ERROR", &format!("Session acquire failed: {}", e));
                self.notice = Some(Notice::error(
                    "Error",
                    format!("Failed to load model: {}", e),
                ));
                return;
            }
        };

        crate::logger::write(
            "INFO",
            &format!(
                "Removal started with '{}' on {}",
                session.model().identifier(),
                path.display()
            ),
        );
        self.job = Some(ActiveJob {
            model: session.model(),
        });

        let sender = self.sender.clone();
        let options = self.options;
        rayon::spawn(move || {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                run_job(&session, &path, &options)
            }));
            let message = match outcome {
                Ok(Ok(image)) => JobOutcome::Finished { image },
                Ok(Err(e)) => JobOutcome::Failed {
                    message: e.to_string(),
                },
                Err(panic_info) => JobOutcome::Failed {
                    message: panic_message(panic_info),
                },
            };
            // The UI may have shut down; a dead channel is fine.
            let _ = sender.send(message);
        });
    }

    /// Drain finished jobs. Returns true when a new result image arrived.
    pub fn poll(&mut self) -> bool {
        let mut refreshed = false;
        while let Ok(outcome) = self.receiver.try_recv() {
            self.job = None;
            match outcome {
                JobOutcome::Finished { image } => {
                    crate::logger::write("INFO", "Removal finished");
                    self.output_image = Some(image);
                    self.notice = Some(Notice::info("Done", "Background removal complete!"));
                    refreshed = true;
                }
                JobOutcome::Failed { message } => {
                    crate::logger::write("ERROR", &format!("Removal failed: {}", message));
                    self.notice = Some(Notice::error(
                        "Error",
                        format!("Failed to remove background: {}", message),
                    ));
                }
            }
        }
        refreshed
    }

    /// Save the current result as PNG.
    ///
    /// `pick` runs only when there is a result to save; a chosen name
    /// without an extension gets `.png` appended.
    pub fn save_output(&mut self, pick: impl FnOnce() -> Option<PathBuf>) {
        let Some(image) = self.output_image.as_ref() else {
            self.notice = Some(Notice::warning("Notice", "No result to save yet"));
            return;
        };
        let Some(path) = pick() else {
            return;
        };
        let path = io::ensure_png_extension(path);
        match io::save_png(image, &path) {
            Ok(()) => {
                crate::logger::write("INFO", &format!("Result saved to {}", path.display()));
                self.notice = Some(Notice::info(
                    "Saved",
                    format!("Image saved to {}", path.display()),
                ));
            }
            Err(e) => {
                crate::logger::write("ERROR", &format!("Save failed: {}", e));
                self.notice = Some(Notice::error(
                    "Error",
                    format!("Failed to save image: {}", e),
                ));
            }
        }
    }
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the input file, run the session, decode the produced PNG.
fn run_job(
    session: &Arc<dyn Remover>,
    path: &Path,
    options: &RemovalOptions,
) -> Result<RgbaImage> {
    let input =
        std::fs::read(path).map_err(|source| EngineError::io("read input image", path, source))?;
    let output = session.remove(&input, options)?;
    Ok(image::load_from_memory(&output)?.to_rgba8())
}

fn panic_message(panic_info: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockFactory;
    use crate::notify::NoticeLevel;
    use image::Rgba;
    use tempfile::TempDir;

    fn studio() -> Studio {
        let factory = MockFactory::instant();
        Studio::with_sessions(SessionManager::with_factory(Box::new(factory)))
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("sank"))), "sank");
        assert_eq!(panic_message(Box::new(17u32)), "unknown panic payload");
    }

    #[test]
    fn save_without_result_warns_and_skips_the_picker() {
        let mut studio = studio();
        let mut opened = false;
        studio.save_output(|| {
            opened = true;
            None
        });
        assert!(!opened);
        let notice = studio.notice.expect("expected a notice");
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "No result to save yet");
    }

    #[test]
    fn save_appends_png_and_writes_the_file() {
        let tmp = TempDir::new().unwrap();
        let mut studio = studio();
        studio.output_image = Some(RgbaImage::from_pixel(2, 2, Rgba([5, 6, 7, 255])));

        let target = tmp.path().join("cutout");
        studio.save_output(|| Some(target.clone()));

        assert!(tmp.path().join("cutout.png").exists());
        let notice = studio.notice.expect("expected a notice");
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("cutout.png"));
    }

    #[test]
    fn cancelled_save_picker_leaves_no_notice() {
        let mut studio = studio();
        studio.output_image = Some(RgbaImage::new(1, 1));
        studio.notice = None;
        studio.save_output(|| None);
        assert!(studio.notice.is_none());
    }

    #[test]
    fn selecting_an_unreadable_input_keeps_the_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut studio = studio();
        studio.select_input(path.clone());

        assert_eq!(studio.input_path.as_deref(), Some(path.as_path()));
        assert!(studio.input_image.is_none());
        let notice = studio.notice.expect("expected a notice");
        assert_eq!(notice.level, NoticeLevel::Error);
    }
}
