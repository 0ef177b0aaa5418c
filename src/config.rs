use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PickError, PickResult};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Snap tolerance used when none is given, in Hz.
pub const DEFAULT_USER_SNAP_HZ: f64 = 0.5;

// ---------------------------------------------------------------------------
// Modifier keys
// ---------------------------------------------------------------------------

/// The modifier that gates selection gestures.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    #[default]
    Shift,
    Ctrl,
    Alt,
    Super,
}

impl Modifier {
    pub fn name(self) -> &'static str {
        match self {
            Modifier::Shift => "shift",
            Modifier::Ctrl => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Super => "super",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modifier {
    type Err = PickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shift" => Ok(Modifier::Shift),
            "ctrl" | "control" => Ok(Modifier::Ctrl),
            "alt" | "option" => Ok(Modifier::Alt),
            "super" | "cmd" | "command" | "meta" => Ok(Modifier::Super),
            other => Err(PickError::InvalidConfig(format!(
                "modifier must be one of shift, ctrl, alt, super; got '{other}'"
            ))),
        }
    }
}

/// Modifier keys held during an input event, as reported by the renderer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        super_key: false,
    };

    /// Only `modifier` held.
    pub fn only(modifier: Modifier) -> Self {
        let mut m = Modifiers::NONE;
        match modifier {
            Modifier::Shift => m.shift = true,
            Modifier::Ctrl => m.ctrl = true,
            Modifier::Alt => m.alt = true,
            Modifier::Super => m.super_key = true,
        }
        m
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Shift => self.shift,
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Super => self.super_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Key bindings
// ---------------------------------------------------------------------------

/// Picker actions reachable from the keyboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Commit,
    Cancel,
    Clear,
    Help,
    DeleteNearest,
    ToggleScale,
    ToggleOverlays,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Commit,
        Action::Cancel,
        Action::Clear,
        Action::Help,
        Action::DeleteNearest,
        Action::ToggleScale,
        Action::ToggleOverlays,
    ];

    /// Binding name as used in config files and the output record.
    pub fn name(self) -> &'static str {
        match self {
            Action::Commit => "commit",
            Action::Cancel => "cancel",
            Action::Clear => "clear",
            Action::Help => "help",
            Action::DeleteNearest => "delete_nearest",
            Action::ToggleScale => "toggle_scale",
            Action::ToggleOverlays => "toggle_overlays",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Commit => "commit and quit",
            Action::Cancel => "cancel",
            Action::Clear => "clear",
            Action::Help => "toggle help",
            Action::DeleteNearest => "delete nearest",
            Action::ToggleScale => "toggle y scale",
            Action::ToggleOverlays => "toggle overlays",
        }
    }
}

/// One key name per action. All fields are required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub commit: String,
    pub cancel: String,
    pub clear: String,
    pub help: String,
    pub delete_nearest: String,
    pub toggle_scale: String,
    pub toggle_overlays: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            commit: "q".into(),
            cancel: "escape".into(),
            clear: "c".into(),
            help: "h".into(),
            delete_nearest: "x".into(),
            toggle_scale: "l".into(),
            toggle_overlays: "o".into(),
        }
    }
}

impl KeyBindings {
    pub fn key_for(&self, action: Action) -> &str {
        match action {
            Action::Commit => &self.commit,
            Action::Cancel => &self.cancel,
            Action::Clear => &self.clear,
            Action::Help => &self.help,
            Action::DeleteNearest => &self.delete_nearest,
            Action::ToggleScale => &self.toggle_scale,
            Action::ToggleOverlays => &self.toggle_overlays,
        }
    }

    /// Resolve a pressed key name (case-insensitive).
    pub fn action_for(&self, key: &str) -> Option<Action> {
        let key = key.trim();
        Action::ALL
            .into_iter()
            .find(|&a| self.key_for(a).eq_ignore_ascii_case(key))
    }

    /// Every binding must be non-empty and distinct.
    pub fn validate(&self) -> PickResult<()> {
        for (i, a) in Action::ALL.iter().enumerate() {
            let key = self.key_for(*a).trim();
            if key.is_empty() {
                return Err(PickError::InvalidConfig(format!(
                    "key binding '{}' is empty",
                    a.name()
                )));
            }
            if let Some(b) = Action::ALL[i + 1..]
                .iter()
                .find(|b| self.key_for(**b).trim().eq_ignore_ascii_case(key))
            {
                return Err(PickError::InvalidConfig(format!(
                    "key '{key}' is bound to both '{}' and '{}'",
                    a.name(),
                    b.name()
                )));
            }
        }
        Ok(())
    }

    /// `(key, description)` lines for the help overlay.
    pub fn help_lines(&self, modifier: Modifier) -> Vec<String> {
        let mut lines = vec![
            format!("{modifier}+drag: toggle max in rectangle"),
            format!("{modifier}+click: toggle nearest peak"),
        ];
        lines.extend(
            [
                Action::Commit,
                Action::Cancel,
                Action::Clear,
                Action::DeleteNearest,
                Action::ToggleScale,
                Action::ToggleOverlays,
                Action::Help,
            ]
            .into_iter()
            .map(|a| format!("{}: {}", self.key_for(a), a.description())),
        );
        lines
    }
}

// ---------------------------------------------------------------------------
// Picker configuration
// ---------------------------------------------------------------------------

/// Parameters for one picking session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Minimum snap half-width in Hz; widened to three bins if smaller.
    pub user_snap_hz: f64,
    pub modifier: Modifier,
    pub keymap: KeyBindings,
    /// Frequency window `(fmin, fmax)` shown and, with `crop_to_xlim`, selectable.
    pub xlim: Option<(f64, f64)>,
    pub crop_to_xlim: bool,
    pub title: Option<String>,
    pub title_append: Option<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            user_snap_hz: DEFAULT_USER_SNAP_HZ,
            modifier: Modifier::default(),
            keymap: KeyBindings::default(),
            xlim: None,
            crop_to_xlim: true,
            title: None,
            title_append: None,
        }
    }
}

impl PickerConfig {
    pub fn validate(&self) -> PickResult<()> {
        if !(self.user_snap_hz > 0.0) || !self.user_snap_hz.is_finite() {
            return Err(PickError::InvalidParameter(format!(
                "user_snap_hz must be positive, got {}",
                self.user_snap_hz
            )));
        }
        self.keymap.validate()
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PickerConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Plot title with the optional suffix appended.
    pub fn composed_title(&self) -> Option<String> {
        compose_title(self.title.as_deref(), self.title_append.as_deref())
    }
}

/// `"title append"`, or whichever part is present.
pub fn compose_title(title: Option<&str>, append: Option<&str>) -> Option<String> {
    match (title, append) {
        (Some(t), Some(a)) => Some(format!("{t} {a}")),
        (Some(t), None) => Some(t.to_string()),
        (None, Some(a)) => Some(a.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_are_complete_and_distinct() {
        let kb = KeyBindings::default();
        kb.validate().unwrap();
        assert_eq!(kb.action_for("Q"), Some(Action::Commit));
        assert_eq!(kb.action_for("Escape"), Some(Action::Cancel));
        assert_eq!(kb.action_for("o"), Some(Action::ToggleOverlays));
        assert_eq!(kb.action_for("z"), None);
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let kb = KeyBindings {
            clear: "Q".into(),
            ..Default::default()
        };
        let err = kb.validate().unwrap_err();
        assert!(err.to_string().contains("commit"));
        assert!(err.to_string().contains("clear"));
    }

    #[test]
    fn empty_binding_is_rejected() {
        let kb = KeyBindings {
            help: " ".into(),
            ..Default::default()
        };
        assert!(matches!(kb.validate(), Err(PickError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_config_fills_defaults() {
        let cfg: PickerConfig =
            serde_json::from_str(r#"{"user_snap_hz": 2.0, "keymap": {"commit": "enter"}}"#)
                .unwrap();
        assert_eq!(cfg.user_snap_hz, 2.0);
        assert_eq!(cfg.keymap.commit, "enter");
        assert_eq!(cfg.keymap.cancel, "escape");
        assert!(cfg.crop_to_xlim);
        assert_eq!(cfg.modifier, Modifier::Shift);
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let cfg = PickerConfig {
            user_snap_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(PickError::InvalidParameter(_))));
    }

    #[test]
    fn modifier_parsing() {
        assert_eq!("Shift".parse::<Modifier>().unwrap(), Modifier::Shift);
        assert_eq!("control".parse::<Modifier>().unwrap(), Modifier::Ctrl);
        assert!("hyper".parse::<Modifier>().is_err());
        assert!(Modifiers::only(Modifier::Alt).contains(Modifier::Alt));
        assert!(!Modifiers::only(Modifier::Alt).contains(Modifier::Shift));
    }

    #[test]
    fn title_composition() {
        assert_eq!(compose_title(Some("Base"), Some("extra")).as_deref(), Some("Base extra"));
        assert_eq!(compose_title(Some("Base"), None).as_deref(), Some("Base"));
        assert_eq!(compose_title(None, Some("extra")).as_deref(), Some("extra"));
        assert_eq!(compose_title(None, None), None);
    }
}
