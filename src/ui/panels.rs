use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use freq_pick::config::Action;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Right side panel – selection list, settings, help
// ---------------------------------------------------------------------------

/// Render the side panel.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    let controller = &state.controller;

    if state.help_visible {
        ui.heading("Keys");
        for line in controller.keymap().help_lines(controller.modifier()) {
            ui.monospace(line);
        }
        ui.separator();
    }

    ui.heading("Selected peaks");
    ui.separator();

    let freqs = controller.view_frequencies();
    let selected = controller.selected_in_view();
    let hidden = controller.selection().len() - selected.len();

    if selected.is_empty() {
        ui.label(format!(
            "Nothing selected. {}+drag around a peak to pick it.",
            controller.modifier()
        ));
    } else {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                header.col(|ui| {
                    ui.strong("Bin");
                });
                header.col(|ui| {
                    ui.strong("Frequency");
                });
            })
            .body(|mut body| {
                for (n, &v) in selected.iter().enumerate() {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(format!("{}", n + 1));
                        });
                        row.col(|ui| {
                            ui.label(format!("{}", controller.to_absolute(v)));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2} Hz", freqs[v]));
                        });
                    });
                }
            });
    }
    if hidden > 0 {
        ui.label(RichText::new(format!("{hidden} selected outside the view")).weak());
    }

    ui.add_space(8.0);
    egui::CollapsingHeader::new(RichText::new("Settings").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let s = controller.settings();
            ui.label(format!("bin spacing: {:.4} Hz", s.df_hz));
            ui.label(format!("snap (user): {} Hz", s.user_snap_hz));
            ui.label(format!("snap (effective): {:.4} Hz", s.effective_snap_hz));
            if let Some((fmin, fmax)) = s.xlim {
                let mode = if s.crop_to_xlim { "cropped" } else { "display only" };
                ui.label(format!("window: {fmin} – {fmax} Hz ({mode})"));
            }
        });

    let meta = controller.spectrum().metadata();
    if !meta.is_empty() {
        egui::CollapsingHeader::new(RichText::new("Metadata").strong())
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                ScrollArea::vertical()
                    .auto_shrink([false, true])
                    .show(ui, |ui: &mut Ui| {
                        for (key, value) in meta {
                            ui.label(format!("{key}: {value}"));
                        }
                    });
            });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the toolbar. Buttons run the same actions as their keys.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        if let Some(title) = state.controller.title() {
            ui.strong(title);
            ui.separator();
        }

        let keymap = state.controller.keymap().clone();
        let button = |ui: &mut Ui, label: &str, action: Action| {
            ui.button(label)
                .on_hover_text(format!("[{}]", keymap.key_for(action)))
                .clicked()
        };

        if button(ui, "Commit", Action::Commit) {
            state.apply(Action::Commit);
        }
        if button(ui, "Cancel", Action::Cancel) {
            state.apply(Action::Cancel);
        }
        if button(ui, "Clear", Action::Clear) {
            state.apply(Action::Clear);
        }

        ui.separator();

        let domain = state.controller.display_domain();
        if ui
            .selectable_label(domain == freq_pick::DisplayDomain::Db, "dB")
            .on_hover_text(format!("[{}]", keymap.key_for(Action::ToggleScale)))
            .clicked()
        {
            state.apply(Action::ToggleScale);
        }

        if state.controller.overlays_available()
            && ui
                .selectable_label(state.controller.overlays_visible(), "Overlays")
                .on_hover_text(format!("[{}]", keymap.key_for(Action::ToggleOverlays)))
                .clicked()
        {
            state.apply(Action::ToggleOverlays);
        }

        if ui
            .selectable_label(state.help_visible, "Help")
            .on_hover_text(format!("[{}]", keymap.key_for(Action::Help)))
            .clicked()
        {
            state.apply(Action::Help);
        }

        ui.separator();
        ui.label(format!("{} selected", state.controller.selection().len()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::GRAY));
        }
    });
}
