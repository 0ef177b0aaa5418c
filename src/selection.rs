use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::{KeyBindings, Modifier};
use crate::data::model::{Metadata, Spectrum};

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

/// Absolute indices picked so far in one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `index` if present, insert it otherwise.
    pub fn toggle(&mut self, index: usize) {
        toggle(&mut self.selected, index);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }
}

/// Toggle membership of `index`. Applying it twice is a no-op.
pub fn toggle(selected: &mut BTreeSet<usize>, index: usize) {
    if !selected.remove(&index) {
        selected.insert(index);
    }
}

// ---------------------------------------------------------------------------
// Settings snapshot
// ---------------------------------------------------------------------------

/// Parameters a selection was produced with, embedded for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerSettings {
    pub user_snap_hz: f64,
    pub effective_snap_hz: f64,
    pub df_hz: f64,
    pub modifier: Modifier,
    pub picker_keymap: KeyBindings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xlim: Option<(f64, f64)>,
    pub crop_to_xlim: bool,
}

// ---------------------------------------------------------------------------
// Output record
// ---------------------------------------------------------------------------

/// Immutable result of a committed session.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected bin frequencies, ascending.
    pub selected_hz: Vec<f64>,
    /// Absolute indices into the spectrum, same order as `selected_hz`.
    pub selected_idx: Vec<usize>,
    pub settings: PickerSettings,
    /// Owned copy of the spectrum metadata.
    pub meta: Metadata,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.selected_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_idx.is_empty()
    }
}

/// Assemble the output record, ordering indices by their frequency.
///
/// Every index in `selected` must address a bin of `spectrum`.
pub fn build_selection(
    spectrum: &Spectrum,
    selected: &SelectionState,
    settings: PickerSettings,
) -> Selection {
    let freqs = spectrum.frequencies();
    debug_assert!(
        selected.iter().all(|i| i < freqs.len()),
        "selection holds an index past the spectrum end ({} bins)",
        freqs.len()
    );
    let mut selected_idx: Vec<usize> = selected.iter().collect();
    selected_idx.sort_by(|&a, &b| freqs[a].total_cmp(&freqs[b]));
    let selected_hz = selected_idx.iter().map(|&i| freqs[i]).collect();
    Selection {
        selected_hz,
        selected_idx,
        settings,
        meta: spectrum.metadata().clone(),
    }
}
