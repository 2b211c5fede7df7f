use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use profilm::{
    is_ffmpeg_on_path, Canvas, Fps, ProfileRecord, ProfilmError, RenderConfig, RenderSession,
    Typeface,
};

fn load_fixture(name: &str) -> ProfileRecord {
    ProfileRecord::from_path(Path::new("tests/data").join(name)).unwrap()
}

fn fast_config() -> RenderConfig {
    RenderConfig {
        canvas: Canvas { width: 320, height: 180 },
        fps: Fps { num: 30, den: 1 },
        duration_cap_secs: Some(2.0),
        ..RenderConfig::default()
    }
}

fn font_available() -> bool {
    Typeface::load(None).is_ok()
}

fn scratch_out(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("profilm_it_{}_{nanos}_{tag}.mp4", std::process::id()))
}

#[test]
fn full_delivery_muxes_the_score() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let out = scratch_out("full");
    let sess = RenderSession::new(load_fixture("full.json"), fast_config()).unwrap();
    let report = sess.render_to_file(&out).unwrap();

    assert!(report.audio_muxed, "score should mux when ffmpeg is available");
    assert_eq!(report.frames, 60);
    assert_eq!(report.out_path, out);
    assert!(report.bytes > 0);
    assert!(out.exists());
    let _ = fs::remove_file(&out);
}

#[test]
fn hung_mux_downgrades_to_silent_delivery() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let out = scratch_out("silent");
    let config = RenderConfig { mux_timeout: Duration::ZERO, ..fast_config() };
    let sess = RenderSession::new(load_fixture("full.json"), config).unwrap();
    let report = sess.render_to_file(&out).unwrap();

    assert!(!report.audio_muxed, "a dead mux should not sink the delivery");
    assert!(report.bytes > 0);
    assert!(out.exists());
    let _ = fs::remove_file(&out);
}

#[test]
fn disabled_audio_skips_the_mux() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let out = scratch_out("noaudio");
    let config = RenderConfig { enable_audio: false, ..fast_config() };
    let sess = RenderSession::new(load_fixture("sparse.json"), config).unwrap();
    let report = sess.render_to_file(&out).unwrap();

    assert!(!report.audio_muxed);
    assert!(out.exists());
    let _ = fs::remove_file(&out);
}

#[test]
fn existing_output_needs_overwrite() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let out = scratch_out("occupied");
    fs::write(&out, b"occupied").unwrap();

    let sess = RenderSession::new(load_fixture("sparse.json"), fast_config()).unwrap();
    let err = sess.render_to_file(&out).unwrap_err();
    assert!(matches!(err, ProfilmError::Validation { .. }), "got {err}");
    assert!(err.to_string().contains("already exists"));

    // The refusal must leave the existing file untouched.
    assert_eq!(fs::read(&out).unwrap(), b"occupied");
    let _ = fs::remove_file(&out);
}
