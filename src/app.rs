use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;

use freq_pick::controller::Gesture;
use freq_pick::session::SessionOutcome;
use freq_pick::snapshot::PlotSnapshot;

use crate::state::AppState;
use crate::ui::{panels, plot};

/// What the window hands back to `main` once the session is over.
#[derive(Debug)]
pub struct Finished {
    pub outcome: SessionOutcome,
    /// View as it looked when the session ended.
    pub snapshot: PlotSnapshot,
}

pub type FinishedSlot = Rc<RefCell<Option<Finished>>>;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PickerApp<'a> {
    pub state: AppState<'a>,
    finished: FinishedSlot,
}

impl<'a> PickerApp<'a> {
    pub fn new(state: AppState<'a>, finished: FinishedSlot) -> Self {
        Self { state, finished }
    }

    /// Feed key presses to the controller as named keys.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let keys: Vec<String> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => Some(key.name().to_ascii_lowercase()),
                    _ => None,
                })
                .collect()
        });
        for key in keys {
            self.state.dispatch(Gesture::Key(key));
        }
    }

    /// Hand the outcome to `main` once, then close the window.
    fn finish(&mut self, ctx: &egui::Context) {
        let mut slot = self.finished.borrow_mut();
        if slot.is_some() {
            return;
        }
        if let Some(outcome) = self.state.controller.outcome() {
            log::info!(
                "Session ended: {}",
                if outcome.is_cancelled() { "cancelled" } else { "committed" }
            );
            *slot = Some(Finished {
                outcome,
                snapshot: PlotSnapshot::from_controller(&self.state.controller),
            });
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for PickerApp<'_> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        if ctx.input(|i| i.viewport().close_requested()) {
            self.state.dispatch(Gesture::Close);
        }

        // ---- Top panel: toolbar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Right side panel: selection, settings, help ----
        egui::SidePanel::right("selection_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::picker_plot(ui, &mut self.state);
        });

        if self.state.controller.status().is_terminal() {
            self.finish(ctx);
        }
    }
}
