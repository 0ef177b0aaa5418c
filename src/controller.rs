//! Interactive picking state machine.
//!
//! The controller owns all mutable session state and is driven one [`Gesture`]
//! at a time. It never renders anything: the UI reads the displayed series
//! back out of it after each gesture.
//!
//! Index bookkeeping happens in view-local coordinates (the cropped window);
//! only [`Controller::to_absolute`] / [`Controller::to_view`] cross into the
//! absolute indices stored in [`SelectionState`].

use crate::config::{Action, KeyBindings, Modifier, Modifiers, PickerConfig};
use crate::data::model::{DisplayDomain, Spectrum};
use crate::data::overlay::{validate_context, ContextCheck, OverlayContext, OverlaySeries};
use crate::error::PickResult;
use crate::scale::DomainTransform;
use crate::selection::{build_selection, PickerSettings, SelectionState};
use crate::session::SessionOutcome;
use crate::snap::{compute_bin_spacing, crop_to_window, effective_snap_window, snap_to_peak};

// ---------------------------------------------------------------------------
// Gestures and effects
// ---------------------------------------------------------------------------

/// One end of a drag, in data coordinates (`[freq_hz, displayed_mag]`).
///
/// `point` is `None` when the event happened outside the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEnd {
    pub point: Option<[f64; 2]>,
    pub modifiers: Modifiers,
}

/// Discrete input delivered by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Rectangle drawn from `start` to `end`.
    RegionSelect { start: DragEnd, end: DragEnd },
    /// Single click; snaps to the loudest bin near the clicked frequency.
    Click {
        point: Option<[f64; 2]>,
        modifiers: Modifiers,
    },
    /// Pointer hovered over the plot at this frequency.
    PointerMoved { freq_hz: f64 },
    /// Named key pressed, e.g. `"q"` or `"escape"`.
    Key(String),
    /// The window was closed without a commit or cancel key.
    Close,
}

/// What a gesture did, for the UI to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing changed.
    Ignored,
    /// `index` (absolute) was toggled; `selected` is its new membership.
    Toggled { index: usize, selected: bool },
    Cleared,
    DomainChanged(DisplayDomain),
    OverlaysChanged { visible: bool },
    HelpRequested,
    PointerTracked,
    Committed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Committed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Active
    }
}

// ---------------------------------------------------------------------------
// View window
// ---------------------------------------------------------------------------

/// The (possibly cropped) part of the spectrum the session operates on.
#[derive(Debug, Clone, Copy)]
struct View<'a> {
    frequencies: &'a [f64],
    magnitudes: &'a [f64],
    offset: usize,
}

impl View<'_> {
    fn len(&self) -> usize {
        self.frequencies.len()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Single owner of a picking session's mutable state.
pub struct Controller<'a> {
    spectrum: &'a Spectrum,
    view: View<'a>,
    transform: DomainTransform,
    domain: DisplayDomain,
    displayed: Vec<f64>,
    /// Overlay series sliced to the view; `None` unless at least one series is present.
    overlays: Option<OverlayContext>,
    overlays_visible: bool,
    selection: SelectionState,
    last_pointer_hz: Option<f64>,
    status: SessionStatus,
    modifier: Modifier,
    keymap: KeyBindings,
    settings: PickerSettings,
    title: Option<String>,
}

impl<'a> Controller<'a> {
    /// Validate the configuration and overlay context, then set up the view.
    pub fn new(
        spectrum: &'a Spectrum,
        context: Option<&OverlayContext>,
        config: &PickerConfig,
    ) -> PickResult<Self> {
        config.validate()?;
        let check = validate_context(spectrum.frequencies(), context)?;

        let spacing = compute_bin_spacing(spectrum.frequencies())?;
        let effective_snap_hz = effective_snap_window(config.user_snap_hz, spacing.df_hz)?;

        let view = match config.xlim {
            Some(xlim) if config.crop_to_xlim => {
                let (frequencies, magnitudes, offset) =
                    crop_to_window(spectrum.frequencies(), spectrum.magnitudes(), xlim)?;
                View {
                    frequencies,
                    magnitudes,
                    offset,
                }
            }
            _ => View {
                frequencies: spectrum.frequencies(),
                magnitudes: spectrum.magnitudes(),
                offset: 0,
            },
        };

        let overlays = match (check, context) {
            (ContextCheck::Valid, Some(ctx)) => Some(ctx.cropped(view.offset, view.len())),
            _ => None,
        };

        let domain = spectrum.display_domain();
        let transform = DomainTransform::new(domain, view.magnitudes);
        let displayed = transform.apply(view.magnitudes, domain);

        let settings = PickerSettings {
            user_snap_hz: config.user_snap_hz,
            effective_snap_hz,
            df_hz: spacing.df_hz,
            modifier: config.modifier,
            picker_keymap: config.keymap.clone(),
            xlim: config.xlim,
            crop_to_xlim: config.crop_to_xlim,
        };

        log::debug!(
            "Picker session: {} of {} bins in view (offset {}), df={} Hz, snap={} Hz",
            view.len(),
            spectrum.len(),
            view.offset,
            spacing.df_hz,
            effective_snap_hz
        );

        Ok(Controller {
            spectrum,
            view,
            transform,
            domain,
            displayed,
            overlays_visible: overlays.is_some(),
            overlays,
            selection: SelectionState::new(),
            last_pointer_hz: None,
            status: SessionStatus::Active,
            modifier: config.modifier,
            keymap: config.keymap.clone(),
            settings,
            title: config.composed_title(),
        })
    }

    // ---- Gesture dispatch ----

    /// Apply one gesture. Once the session is terminal every gesture is ignored.
    pub fn handle(&mut self, gesture: Gesture) -> Effect {
        if self.status.is_terminal() {
            return Effect::Ignored;
        }
        let effect = match gesture {
            Gesture::RegionSelect { start, end } => self.region_select(start, end),
            Gesture::Click { point, modifiers } => self.snap_click(point, modifiers),
            Gesture::PointerMoved { freq_hz } => {
                if freq_hz.is_finite() {
                    self.last_pointer_hz = Some(freq_hz);
                    Effect::PointerTracked
                } else {
                    Effect::Ignored
                }
            }
            Gesture::Key(key) => match self.keymap.action_for(&key) {
                Some(action) => self.apply(action),
                None => Effect::Ignored,
            },
            Gesture::Close => {
                log::info!("Window closed; committing current selection");
                self.apply(Action::Commit)
            }
        };
        if effect != Effect::Ignored && effect != Effect::PointerTracked {
            log::debug!("Gesture effect: {effect:?}");
        }
        effect
    }

    /// Run a bound action directly.
    pub fn apply(&mut self, action: Action) -> Effect {
        if self.status.is_terminal() {
            return Effect::Ignored;
        }
        match action {
            Action::Commit => {
                self.status = SessionStatus::Committed;
                Effect::Committed
            }
            Action::Cancel => {
                self.status = SessionStatus::Cancelled;
                Effect::Cancelled
            }
            Action::Clear => {
                self.selection.clear();
                Effect::Cleared
            }
            Action::Help => Effect::HelpRequested,
            Action::DeleteNearest => self.delete_nearest(),
            Action::ToggleScale => {
                self.domain = self.domain.flipped();
                self.displayed = self.transform.apply(self.view.magnitudes, self.domain);
                Effect::DomainChanged(self.domain)
            }
            Action::ToggleOverlays => {
                if self.overlays.is_none() {
                    log::debug!("No overlay series bound; ignoring overlay toggle");
                    return Effect::Ignored;
                }
                self.overlays_visible = !self.overlays_visible;
                Effect::OverlaysChanged {
                    visible: self.overlays_visible,
                }
            }
        }
    }

    fn region_select(&mut self, start: DragEnd, end: DragEnd) -> Effect {
        if !(start.modifiers.contains(self.modifier) || end.modifiers.contains(self.modifier)) {
            return Effect::Ignored;
        }
        let (Some([xa, ya]), Some([xb, yb])) = (start.point, end.point) else {
            return Effect::Ignored;
        };
        let (x0, x1) = (xa.min(xb), xa.max(xb));
        let (y0, y1) = (ya.min(yb), ya.max(yb));

        let freqs = self.view.frequencies;
        let lo = freqs.partition_point(|&f| f < x0);
        let hi = freqs.partition_point(|&f| f <= x1);
        let mut best: Option<usize> = None;
        for i in lo..hi {
            let y = self.displayed[i];
            if y < y0 || y > y1 {
                continue;
            }
            if best.map_or(true, |b| y > self.displayed[b]) {
                best = Some(i);
            }
        }
        match best {
            Some(view_idx) => self.toggle_view_index(view_idx),
            None => Effect::Ignored,
        }
    }

    fn snap_click(&mut self, point: Option<[f64; 2]>, modifiers: Modifiers) -> Effect {
        if !modifiers.contains(self.modifier) {
            return Effect::Ignored;
        }
        let Some([freq, _]) = point else {
            return Effect::Ignored;
        };
        match snap_to_peak(
            self.view.frequencies,
            self.view.magnitudes,
            freq,
            self.settings.effective_snap_hz,
        ) {
            Ok(view_idx) => self.toggle_view_index(view_idx),
            Err(e) => {
                log::warn!("Snap failed: {e}");
                Effect::Ignored
            }
        }
    }

    fn delete_nearest(&mut self) -> Effect {
        if self.selection.is_empty() {
            return Effect::Ignored;
        }
        let Some(target) = self.last_pointer_hz else {
            log::debug!("No pointer position recorded; nothing to delete");
            return Effect::Ignored;
        };
        let freqs = self.view.frequencies;
        let mut nearest: Option<usize> = None;
        for view_idx in self.selected_in_view() {
            let d = (freqs[view_idx] - target).abs();
            if nearest.map_or(true, |n| d < (freqs[n] - target).abs()) {
                nearest = Some(view_idx);
            }
        }
        match nearest {
            Some(view_idx) => self.toggle_view_index(view_idx),
            None => Effect::Ignored,
        }
    }

    fn toggle_view_index(&mut self, view_idx: usize) -> Effect {
        let index = self.to_absolute(view_idx);
        self.selection.toggle(index);
        Effect::Toggled {
            index,
            selected: self.selection.contains(index),
        }
    }

    // ---- Coordinate translation ----

    /// View-local index → absolute spectrum index.
    pub fn to_absolute(&self, view_idx: usize) -> usize {
        view_idx + self.view.offset
    }

    /// Absolute index → view-local index, if it lies inside the view.
    pub fn to_view(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(self.view.offset)
            .filter(|&v| v < self.view.len())
    }

    // ---- Read access for the UI ----

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn spectrum(&self) -> &'a Spectrum {
        self.spectrum
    }

    pub fn settings(&self) -> &PickerSettings {
        &self.settings
    }

    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    pub fn keymap(&self) -> &KeyBindings {
        &self.keymap
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Plot title composed from the configured title and suffix.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn last_pointer_hz(&self) -> Option<f64> {
        self.last_pointer_hz
    }

    /// Absolute index of the first bin in view.
    pub fn view_offset(&self) -> usize {
        self.view.offset
    }

    pub fn view_frequencies(&self) -> &'a [f64] {
        self.view.frequencies
    }

    /// Magnitudes of the view in the current display domain.
    pub fn displayed_magnitudes(&self) -> &[f64] {
        &self.displayed
    }

    pub fn display_domain(&self) -> DisplayDomain {
        self.domain
    }

    pub fn overlays_available(&self) -> bool {
        self.overlays.is_some()
    }

    pub fn overlays_visible(&self) -> bool {
        self.overlays_visible && self.overlays.is_some()
    }

    /// Visible overlay series converted to the current display domain.
    pub fn displayed_overlays(&self) -> Vec<(OverlaySeries, Vec<f64>)> {
        if !self.overlays_visible() {
            return Vec::new();
        }
        self.overlays
            .iter()
            .flat_map(|ctx| ctx.present())
            .map(|(series, values)| (series, self.transform.apply(values, self.domain)))
            .collect()
    }

    /// Selected bins that fall inside the view, as view-local indices sorted by frequency.
    pub fn selected_in_view(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .selection
            .iter()
            .filter_map(|i| self.to_view(i))
            .collect();
        let freqs = self.view.frequencies;
        out.sort_by(|&a, &b| freqs[a].total_cmp(&freqs[b]));
        out
    }

    /// The terminal outcome, or `None` while the session is still active.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.status {
            SessionStatus::Active => None,
            SessionStatus::Cancelled => Some(SessionOutcome::Cancelled),
            SessionStatus::Committed => {
                let selection =
                    build_selection(self.spectrum, &self.selection, self.settings.clone());
                if selection.is_empty() {
                    log::warn!("No peaks selected");
                }
                Some(SessionOutcome::Committed(selection))
            }
        }
    }
}
