use eframe::egui;

use freq_pick::config::{Action, Modifiers};
use freq_pick::controller::{Controller, DragEnd, Effect, Gesture};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state around one picking session.
pub struct AppState<'a> {
    /// Session state machine; the only place selection is mutated.
    pub controller: Controller<'a>,

    /// Whether the key-binding help is shown.
    pub help_visible: bool,

    /// Start of the primary-button drag in progress, if any.
    pub drag_start: Option<DragEnd>,

    /// Set after a domain toggle so the plot re-fits its y bounds.
    pub reset_bounds: bool,

    /// Status line shown in the top bar.
    pub status_message: Option<String>,
}

impl<'a> AppState<'a> {
    pub fn new(controller: Controller<'a>) -> Self {
        Self {
            controller,
            help_visible: false,
            drag_start: None,
            reset_bounds: false,
            status_message: None,
        }
    }

    /// Forward a gesture to the controller and update the cosmetic state.
    pub fn dispatch(&mut self, gesture: Gesture) -> Effect {
        let effect = self.controller.handle(gesture);
        self.react(effect);
        effect
    }

    /// Run a bound action (toolbar buttons).
    pub fn apply(&mut self, action: Action) -> Effect {
        let effect = self.controller.apply(action);
        self.react(effect);
        effect
    }

    fn react(&mut self, effect: Effect) {
        match effect {
            Effect::Toggled { index, selected } => {
                let hz = self.controller.spectrum().frequencies()[index];
                let verb = if selected { "Selected" } else { "Removed" };
                self.status_message = Some(format!("{verb} {hz:.2} Hz (bin {index})"));
            }
            Effect::Cleared => self.status_message = Some("Selection cleared".into()),
            Effect::DomainChanged(domain) => {
                self.reset_bounds = true;
                self.status_message = Some(format!("Showing {domain} magnitudes"));
            }
            Effect::HelpRequested => self.help_visible = !self.help_visible,
            Effect::OverlaysChanged { .. }
            | Effect::PointerTracked
            | Effect::Committed
            | Effect::Cancelled
            | Effect::Ignored => {}
        }
    }

    pub fn y_axis_label(&self) -> &'static str {
        self.controller.display_domain().axis_label()
    }
}

/// Translate egui's modifier state.
pub fn modifiers_from(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        ctrl: m.ctrl,
        alt: m.alt,
        super_key: m.mac_cmd,
    }
}
