use std::path::Path;

use profilm::{
    Canvas, Fps, FrameIndex, FrameRange, InMemorySink, ProfileRecord, RenderConfig, RenderSession,
    Typeface,
};

fn load_fixture(name: &str) -> ProfileRecord {
    ProfileRecord::from_path(Path::new("tests/data").join(name)).unwrap()
}

fn small_config() -> RenderConfig {
    RenderConfig {
        canvas: Canvas { width: 192, height: 108 },
        fps: Fps { num: 30, den: 1 },
        ..RenderConfig::default()
    }
}

fn font_available() -> bool {
    Typeface::load(None).is_ok()
}

#[test]
fn render_single_frame_has_output_geometry() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let sess = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    let frame = sess.render_frame(FrameIndex(0)).unwrap();
    assert_eq!(frame.width(), 192);
    assert_eq!(frame.height(), 108);
    assert_eq!(frame.data().len(), 192 * 108 * 4);
}

#[test]
fn sparse_record_renders_without_optional_groups() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let sess = RenderSession::new(load_fixture("sparse.json"), small_config()).unwrap();
    let mid = FrameIndex(sess.frames_total() / 2);
    let frame = sess.render_frame(mid).unwrap();
    assert_eq!(frame.data().len(), 192 * 108 * 4);
}

#[test]
fn identical_records_render_identical_frames() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let range = FrameRange::new(FrameIndex(0), FrameIndex(40)).unwrap();

    let mut first = InMemorySink::new();
    let sess = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    sess.render_to_sink(range, &mut first).unwrap();

    let mut second = InMemorySink::new();
    let sess = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    sess.render_to_sink(range, &mut second).unwrap();

    assert_eq!(first.frames.len(), 40);
    assert_eq!(first.frames.len(), second.frames.len());
    for ((idx_a, a), (idx_b, b)) in first.frames.iter().zip(second.frames.iter()) {
        assert_eq!(idx_a, idx_b);
        assert_eq!(a.data(), b.data(), "frame {} differs between runs", idx_a.0);
    }
}

#[test]
fn sink_receives_contiguous_indices_from_zero() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let sess = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    let range = FrameRange::new(FrameIndex(0), FrameIndex(25)).unwrap();
    let mut sink = InMemorySink::new();
    let stats = sess.render_to_sink(range, &mut sink).unwrap();

    assert_eq!(stats.frames, 25);
    for (expect, (idx, _)) in sink.frames.iter().enumerate() {
        assert_eq!(idx.0, expect as u64);
    }
}

#[test]
fn visitor_identity_steers_the_picture() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let mut other = load_fixture("full.json");
    other.visitor_id = Some("someone-else".into());

    let a = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    let b = RenderSession::new(other, small_config()).unwrap();

    // Seeds differ, so the constellation layout differs. Any of the first
    // few world frames is enough to show it.
    let differs = (0..3).any(|f| {
        let fa = a.render_frame(FrameIndex(f)).unwrap();
        let fb = b.render_frame(FrameIndex(f)).unwrap();
        fa.data() != fb.data()
    });
    assert!(differs, "distinct visitor ids should change the rendered world");
}

#[test]
fn duration_cap_bounds_the_film() {
    if !font_available() {
        eprintln!("skipping: no system font found");
        return;
    }
    let uncapped = RenderSession::new(load_fixture("full.json"), small_config()).unwrap();
    let capped = RenderSession::new(
        load_fixture("full.json"),
        RenderConfig { duration_cap_secs: Some(2.0), ..small_config() },
    )
    .unwrap();

    assert!(uncapped.frames_total() > 60);
    assert_eq!(capped.frames_total(), 60);
    assert!(capped.render_frame(FrameIndex(60)).is_err());
    assert!(capped.render_frame(FrameIndex(59)).is_ok());
}
