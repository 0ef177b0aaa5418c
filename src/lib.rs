//! Interactive frequency picking on a 1-D magnitude spectrum.
//!
//! The core is rendering-agnostic: a [`controller::Controller`] turns
//! gestures into a set of selected bins, and a committed session yields a
//! [`selection::Selection`] that [`artifacts`] can persist.

pub mod artifacts;
pub mod color;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod scale;
pub mod selection;
pub mod session;
pub mod snap;
pub mod snapshot;

pub use config::{KeyBindings, Modifier, PickerConfig};
pub use controller::{Controller, DragEnd, Effect, Gesture, SessionStatus};
pub use data::model::{DisplayDomain, Metadata, MetadataValue, Spectrum};
pub use data::overlay::{OverlayContext, OverlaySeries};
pub use error::PickError;
pub use selection::{PickerSettings, Selection};
pub use session::SessionOutcome;
