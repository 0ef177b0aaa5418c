use std::path::PathBuf;

use freq_pick::artifacts::{write_artifacts, write_selection_json, ArtifactPaths, SCHEMA_VERSION};
use freq_pick::session::run_gestures;
use freq_pick::snapshot::PlotSnapshot;
use freq_pick::{
    Controller, DisplayDomain, Gesture, Metadata, MetadataValue, PickerConfig, Selection,
    Spectrum,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("freq_pick_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn committed_selection(domain: DisplayDomain) -> (Spectrum, Selection) {
    let mut meta = Metadata::new();
    meta.insert("source".into(), MetadataValue::String("test".into()));
    meta.insert("channel".into(), MetadataValue::Integer(3));
    let f: Vec<f64> = (0..11).map(|i| i as f64).collect();
    let m = vec![0.0, 1.0, 5.0, 2.0, 1.0, 9.0, 1.0, 0.0, 3.0, 0.0, 1.0];
    let s = Spectrum::with_metadata(f, m, domain, meta).unwrap();

    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    // Click at 2 Hz snaps to the 9.0 peak at 5 Hz (3 Hz window).
    let gestures = vec![
        Gesture::Click {
            point: Some([2.0, 0.0]),
            modifiers: freq_pick::config::Modifiers::only(freq_pick::Modifier::Shift),
        },
        Gesture::Key("l".into()),
        Gesture::Key("q".into()),
    ];
    let selection = run_gestures(controller, gestures)
        .into_selection()
        .expect("committed");
    (s, selection)
}

#[test]
fn selection_json_schema() {
    let (s, selection) = committed_selection(DisplayDomain::Db);
    let mut buf = Vec::new();
    write_selection_json(&mut buf, &selection, s.display_domain()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.ends_with("}\n"));

    let payload: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload["schema_version"], SCHEMA_VERSION);
    assert_eq!(payload["selected_idx"], serde_json::json!(selection.selected_idx));
    assert_eq!(payload["selected_hz"], serde_json::json!(selection.selected_hz));
    // Stored domain, even though the view was toggled to linear before commit.
    assert_eq!(payload["display_domain"], "dB");
    assert_eq!(payload["spectrum_meta"]["source"], "test");
    assert_eq!(payload["spectrum_meta"]["channel"], 3);
    assert_eq!(payload["settings"]["effective_snap_hz"], 3.0);
    assert_eq!(payload["settings"]["modifier"], "shift");
    assert_eq!(payload["settings"]["picker_keymap"]["commit"], "q");
    assert_eq!(payload["settings"]["picker_keymap"]["toggle_overlays"], "o");
    assert!(payload["settings"].get("xlim").is_none());
}

#[test]
fn selection_json_keys_are_sorted() {
    let (_, selection) = committed_selection(DisplayDomain::Linear);
    let mut buf = Vec::new();
    write_selection_json(&mut buf, &selection, DisplayDomain::Linear).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let top_level: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("  \""))
        .filter_map(|l| l.trim().split('"').nth(1))
        .collect();
    let mut sorted = top_level.clone();
    sorted.sort_unstable();
    assert_eq!(top_level, sorted);
    assert!(text.contains("\"display_domain\": \"linear\""));
}

#[test]
fn write_artifacts_creates_png_and_json() {
    let (s, selection) = committed_selection(DisplayDomain::Db);
    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let snapshot = PlotSnapshot::from_controller(&controller);

    let dir = scratch_dir("artifacts").join("nested");
    let paths = write_artifacts(&dir, "run01", &snapshot, &selection, s.display_domain()).unwrap();
    assert_eq!(paths, ArtifactPaths::for_stem(&dir, "run01"));
    assert!(paths.png.ends_with("run01_pick.png"));
    assert!(paths.json.ends_with("run01_pick.json"));

    let png = image::open(&paths.png).unwrap();
    assert_eq!((png.width(), png.height()), (1200, 800));

    let text = std::fs::read_to_string(&paths.json).unwrap();
    let payload: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload["selected_idx"], serde_json::json!([5]));

    let _ = std::fs::remove_dir_all(dir.parent().unwrap_or(&dir));
}

#[test]
fn snapshot_renders_headless_with_markers() {
    let snapshot = PlotSnapshot {
        title: Some("bench".into()),
        display_domain: DisplayDomain::Linear,
        frequencies: vec![0.0, 1.0, 2.0, 3.0],
        magnitudes: vec![0.0, 1.0, 0.5, 0.2],
        overlays: Vec::new(),
        markers_hz: vec![1.0],
        xlim: None,
    };
    let img = snapshot.render(320, 200).unwrap();
    assert_eq!(img.dimensions(), (320, 200));
    let painted = img.pixels().filter(|p| p.0 != img.get_pixel(0, 0).0).count();
    assert!(painted > 0);
}
