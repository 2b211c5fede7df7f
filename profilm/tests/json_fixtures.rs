use std::fs;

use profilm::{build_schedule, Fps, ProfileRecord, ScriptVariant};

#[test]
fn load_validate_and_schedule_fixtures() {
    let fps = Fps { num: 30, den: 1 };
    for entry in fs::read_dir("tests/data").unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let record = ProfileRecord::from_path(&path).unwrap();
        record.validate().unwrap();
        for variant in [ScriptVariant::Full, ScriptVariant::Essential, ScriptVariant::Trailer] {
            let schedule = build_schedule(&record, variant, fps).unwrap();
            assert!(schedule.total_frames() > 0, "{}: empty {variant:?} schedule", path.display());
        }
    }
}
