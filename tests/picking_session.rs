use freq_pick::config::{Modifier, Modifiers};
use freq_pick::session::run_gestures;
use freq_pick::{
    Controller, DisplayDomain, DragEnd, Effect, Gesture, OverlayContext, PickError, PickerConfig,
    SessionOutcome, Spectrum,
};

fn spectrum() -> Spectrum {
    let f: Vec<f64> = (0..11).map(|i| i as f64).collect();
    let m = vec![0.0, 1.0, 5.0, 2.0, 1.0, 9.0, 1.0, 0.0, 3.0, 0.0, 1.0];
    Spectrum::new(f, m, DisplayDomain::Db).unwrap()
}

fn shift() -> Modifiers {
    Modifiers::only(Modifier::Shift)
}

/// Modifier-held rectangle spanning `[f0, f1]` and the whole magnitude range.
fn drag(f0: f64, f1: f64) -> Gesture {
    Gesture::RegionSelect {
        start: DragEnd {
            point: Some([f0, -1000.0]),
            modifiers: shift(),
        },
        end: DragEnd {
            point: Some([f1, 1000.0]),
            modifiers: shift(),
        },
    }
}

fn key(name: &str) -> Gesture {
    Gesture::Key(name.to_string())
}

#[test]
fn two_region_selects_then_commit() {
    let s = spectrum();
    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let outcome = run_gestures(controller, vec![drag(1.5, 2.5), drag(4.5, 5.5), key("q")]);

    let selection = outcome.into_selection().expect("committed");
    assert_eq!(selection.selected_idx, vec![2, 5]);
    assert_eq!(selection.selected_hz, vec![2.0, 5.0]);
    assert_eq!(selection.settings.user_snap_hz, 0.5);
    assert_eq!(selection.settings.df_hz, 1.0);
    assert_eq!(selection.settings.effective_snap_hz, 3.0);
}

#[test]
fn cancel_is_not_an_empty_commit() {
    let s = spectrum();
    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let outcome = run_gestures(controller, vec![drag(1.5, 2.5), key("escape")]);
    assert_eq!(outcome, SessionOutcome::Cancelled);

    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let outcome = run_gestures(controller, vec![key("q")]);
    let selection = outcome.into_selection().expect("committed");
    assert!(selection.is_empty());
}

#[test]
fn stream_ending_while_active_commits() {
    let s = spectrum();
    let controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let outcome = run_gestures(controller, vec![drag(4.5, 5.5)]);
    assert_eq!(outcome.selection().map(|s| s.selected_idx.clone()), Some(vec![5]));
}

#[test]
fn gestures_after_commit_are_ignored() {
    let s = spectrum();
    let mut controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    assert_eq!(controller.handle(key("Q")), Effect::Committed);
    assert_eq!(controller.handle(drag(1.5, 2.5)), Effect::Ignored);
    assert_eq!(controller.handle(key("escape")), Effect::Ignored);
    assert!(controller.selection().is_empty());
}

#[test]
fn drag_without_modifier_selects_nothing() {
    let s = spectrum();
    let mut controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    let plain = Gesture::RegionSelect {
        start: DragEnd {
            point: Some([1.5, -1000.0]),
            modifiers: Modifiers::NONE,
        },
        end: DragEnd {
            point: Some([2.5, 1000.0]),
            modifiers: Modifiers::NONE,
        },
    };
    assert_eq!(controller.handle(plain), Effect::Ignored);
    assert!(controller.selection().is_empty());
}

#[test]
fn snap_click_picks_loudest_bin_in_window() {
    let s = spectrum();
    let mut controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    // Window is 3 Hz around 7.2 Hz: bins 5..=10, loudest is bin 5.
    let effect = controller.handle(Gesture::Click {
        point: Some([7.2, 0.0]),
        modifiers: shift(),
    });
    assert_eq!(
        effect,
        Effect::Toggled {
            index: 5,
            selected: true
        }
    );
}

#[test]
fn delete_nearest_removes_selection_closest_to_pointer() {
    let s = spectrum();
    let mut controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();
    controller.handle(drag(1.5, 2.5));
    controller.handle(drag(7.5, 8.5));
    controller.handle(Gesture::PointerMoved { freq_hz: 7.0 });
    assert_eq!(
        controller.handle(key("x")),
        Effect::Toggled {
            index: 8,
            selected: false
        }
    );
    assert_eq!(controller.selection().iter().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn cropped_view_reports_absolute_indices() {
    let s = spectrum();
    let config = PickerConfig {
        xlim: Some((3.0, 8.0)),
        ..PickerConfig::default()
    };
    let mut controller = Controller::new(&s, None, &config).unwrap();
    assert_eq!(controller.view_offset(), 3);
    assert_eq!(controller.view_frequencies(), &[3.0, 4.0, 5.0, 6.0, 7.0]);

    // Bin 8 lies outside the half-open window and cannot be picked.
    assert_eq!(controller.handle(drag(7.5, 8.5)), Effect::Ignored);

    controller.handle(drag(4.5, 5.5));
    let outcome = run_gestures(controller, vec![key("q")]);
    let selection = outcome.into_selection().expect("committed");
    assert_eq!(selection.selected_idx, vec![5]);
    assert_eq!(selection.settings.xlim, Some((3.0, 8.0)));
}

#[test]
fn empty_crop_window_is_rejected() {
    let s = spectrum();
    let config = PickerConfig {
        xlim: Some((20.0, 30.0)),
        ..PickerConfig::default()
    };
    assert!(matches!(
        Controller::new(&s, None, &config),
        Err(PickError::EmptyWindow { .. })
    ));

    // Without cropping the window only limits the initial view.
    let config = PickerConfig {
        crop_to_xlim: false,
        ..config
    };
    let controller = Controller::new(&s, None, &config).unwrap();
    assert_eq!(controller.view_frequencies().len(), 11);
}

#[test]
fn overlay_length_mismatch_fails_before_session_starts() {
    let s = spectrum();
    let context = OverlayContext {
        mean: Some(vec![0.0; 5]),
        ..OverlayContext::default()
    };
    let err = Controller::new(&s, Some(&context), &PickerConfig::default())
        .err()
        .expect("mismatch must be rejected");
    assert_eq!(
        err,
        PickError::OverlayLengthMismatch {
            series: "mean".into(),
            expected: 11,
            actual: 5,
        }
    );
}

#[test]
fn toggling_scale_does_not_change_selection_or_stored_domain() {
    let f: Vec<f64> = (0..5).map(|i| i as f64).collect();
    let s = Spectrum::new(f, vec![1.0, 10.0, 100.0, 10.0, 1.0], DisplayDomain::Linear).unwrap();
    let mut controller = Controller::new(&s, None, &PickerConfig::default()).unwrap();

    controller.handle(drag(1.5, 2.5));
    assert_eq!(
        controller.handle(key("l")),
        Effect::DomainChanged(DisplayDomain::Db)
    );
    let shown = controller.displayed_magnitudes();
    assert!((shown[2] - 0.0).abs() < 1e-9);
    assert!((shown[1] + 20.0).abs() < 1e-9);

    let outcome = run_gestures(controller, vec![key("q")]);
    assert_eq!(outcome.selection().map(|s| s.selected_idx.clone()), Some(vec![2]));
    assert_eq!(s.display_domain(), DisplayDomain::Linear);
}

#[test]
fn custom_keymap_rebinds_commit() {
    let s = spectrum();
    let mut config = PickerConfig::default();
    config.keymap.commit = "enter".into();
    let mut controller = Controller::new(&s, None, &config).unwrap();
    assert_eq!(controller.handle(key("q")), Effect::Ignored);
    assert_eq!(controller.handle(key("Enter")), Effect::Committed);
}
