//! End-to-end controller tests: select, run, poll, save, driven through
//! mock sessions so no model weights or ONNX runtime are involved.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use clearcut::engine::{EngineError, ModelKind, SessionManager};
use clearcut::mocks::{
    FailingRemover, GatedRemover, InstantRemover, MockFactory, PanickingRemover,
};
use clearcut::notify::NoticeLevel;
use clearcut::state::Studio;

fn studio_with(factory: MockFactory) -> Studio {
    Studio::with_sessions(SessionManager::with_factory(Box::new(factory)))
}

fn write_input(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("photo.png");
    RgbaImage::from_pixel(4, 3, Rgba([200, 10, 10, 255]))
        .save(&path)
        .unwrap();
    path
}

/// Pump the channel until the in-flight job lands. Returns true when a
/// new result image arrived.
fn wait_idle(studio: &mut Studio) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut refreshed = false;
    while studio.busy() {
        assert!(Instant::now() < deadline, "removal did not finish in time");
        refreshed |= studio.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
    refreshed
}

#[test]
fn happy_path_removes_and_saves() {
    let tmp = TempDir::new().unwrap();
    let mut studio = studio_with(MockFactory::instant());

    studio.select_input(write_input(&tmp));
    assert!(studio.input_image.is_some());
    assert!(!studio.busy());

    studio.run_removal();
    assert!(studio.busy());
    assert!(wait_idle(&mut studio));

    let output = studio.output_image.as_ref().expect("result image");
    assert_eq!(output.dimensions(), (4, 3));
    assert!(output.pixels().all(|p| p[3] == 0));
    let notice = studio.notice.clone().expect("completion notice");
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, "Background removal complete!");

    let target = tmp.path().join("out");
    studio.save_output(|| Some(target.clone()));
    let reloaded = image::open(tmp.path().join("out.png")).unwrap().to_rgba8();
    assert_eq!(reloaded.dimensions(), (4, 3));
}

#[test]
fn run_without_input_warns() {
    let mut studio = studio_with(MockFactory::instant());
    studio.run_removal();

    assert!(!studio.busy());
    let notice = studio.notice.clone().expect("missing-input warning");
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Select an image first");
}

#[test]
fn second_run_while_busy_warns_and_keeps_the_job() {
    let tmp = TempDir::new().unwrap();
    let (remover, gate) = GatedRemover::new(ModelKind::U2net);
    let gated: Arc<GatedRemover> = Arc::new(remover);
    let mut studio = studio_with(MockFactory::new(move |_| Ok(gated.clone())));

    studio.select_input(write_input(&tmp));
    studio.run_removal();
    assert!(studio.busy());

    studio.run_removal();
    let notice = studio.notice.clone().expect("busy warning");
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Still processing, please wait");
    assert!(studio.busy());

    gate.open();
    assert!(wait_idle(&mut studio));
    assert!(studio.output_image.is_some());
    // Exactly one outcome came through for the two clicks.
    assert!(!studio.poll());
}

#[test]
fn failed_model_switch_keeps_the_previous_session() {
    let tmp = TempDir::new().unwrap();
    let factory = MockFactory::new(|model| {
        if model == ModelKind::IsnetAnime {
            Err(EngineError::inference("weights corrupt"))
        } else {
            Ok(Arc::new(InstantRemover { model }))
        }
    });
    let builds = factory.builds.clone();
    let mut studio = studio_with(factory);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    studio.select_model(ModelKind::IsnetAnime);
    let notice = studio.notice.clone().expect("switch failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to load model:"));
    assert_eq!(studio.current_model(), ModelKind::U2net);

    // Removal still runs on the surviving session, with no rebuild.
    studio.select_input(write_input(&tmp));
    studio.run_removal();
    assert!(wait_idle(&mut studio));
    assert!(studio.output_image.is_some());
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn switching_models_mid_flight_finishes_with_the_old_session() {
    let tmp = TempDir::new().unwrap();
    let (remover, gate) = GatedRemover::new(ModelKind::U2net);
    let gated: Arc<GatedRemover> = Arc::new(remover);
    let factory = MockFactory::new(move |model| {
        if model == ModelKind::U2net {
            Ok(gated.clone())
        } else {
            Ok(Arc::new(InstantRemover { model }))
        }
    });
    let mut studio = studio_with(factory);

    studio.select_input(write_input(&tmp));
    studio.run_removal();
    assert!(studio.busy());
    assert_eq!(studio.active_model(), Some(ModelKind::U2net));

    studio.select_model(ModelKind::Silueta);
    assert_eq!(studio.current_model(), ModelKind::Silueta);
    assert_eq!(studio.active_model(), Some(ModelKind::U2net));

    gate.open();
    assert!(wait_idle(&mut studio));
    assert!(studio.output_image.is_some());
    assert_eq!(studio.current_model(), ModelKind::Silueta);
}

#[test]
fn startup_build_failure_surfaces_and_the_next_run_retries() {
    let tmp = TempDir::new().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let factory = MockFactory::new(move |model| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(EngineError::inference("download interrupted"))
        } else {
            Ok(Arc::new(InstantRemover { model }))
        }
    });
    let mut studio = studio_with(factory);

    let notice = studio.notice.clone().expect("startup failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to load model:"));

    studio.select_input(write_input(&tmp));
    studio.run_removal();
    assert!(studio.busy());
    assert!(wait_idle(&mut studio));
    assert!(studio.output_image.is_some());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_removal_keeps_the_previous_result() {
    let tmp = TempDir::new().unwrap();
    let factory = MockFactory::new(|model| {
        Ok(Arc::new(FailingRemover {
            model,
            message: "tensor shape mismatch".into(),
        }))
    });
    let mut studio = studio_with(factory);

    studio.select_input(write_input(&tmp));
    studio.output_image = Some(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));

    studio.run_removal();
    assert!(!wait_idle(&mut studio));

    let kept = studio.output_image.as_ref().expect("previous result kept");
    assert_eq!(kept.dimensions(), (2, 2));
    let notice = studio.notice.clone().expect("failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to remove background:"));
    assert!(notice.message.contains("tensor shape mismatch"));
}

#[test]
fn panicking_removal_reports_the_panic_text() {
    let tmp = TempDir::new().unwrap();
    let factory = MockFactory::new(|model| Ok(Arc::new(PanickingRemover { model })));
    let mut studio = studio_with(factory);

    studio.select_input(write_input(&tmp));
    studio.run_removal();
    assert!(!wait_idle(&mut studio));

    assert!(studio.output_image.is_none());
    let notice = studio.notice.clone().expect("panic notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("mask head exploded"));
}

#[test]
fn unreadable_input_fails_the_run_not_the_app() {
    let tmp = TempDir::new().unwrap();
    let mut studio = studio_with(MockFactory::instant());

    studio.select_input(tmp.path().join("missing.png"));
    assert!(studio.input_path.is_some());
    assert!(studio.input_image.is_none());
    studio.notice = None;

    studio.run_removal();
    assert!(studio.busy());
    assert!(!wait_idle(&mut studio));
    let notice = studio.notice.clone().expect("read failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("read input image"));
}

#[test]
fn save_failure_surfaces_an_error_notice() {
    let tmp = TempDir::new().unwrap();
    let mut studio = studio_with(MockFactory::instant());
    studio.output_image = Some(RgbaImage::new(2, 2));

    let unwritable = tmp.path().join("no-such-dir").join("out.png");
    studio.save_output(|| Some(unwritable.clone()));

    let notice = studio.notice.clone().expect("save failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to save image:"));
}
