use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy for the selection engine
// ---------------------------------------------------------------------------

/// Errors raised by validation and the snap engine.
///
/// Cancellation is not represented here: a cancelled session is a normal
/// outcome, see [`crate::session::SessionOutcome`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PickError {
    /// Malformed or inconsistent spectrum input.
    #[error("invalid spectrum: {0}")]
    InvalidSpectrum(String),

    /// Numeric parameter out of its domain (tolerance, window, crop range).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The crop window excludes every sample.
    #[error("window [{fmin}, {fmax}) does not include any spectrum samples")]
    EmptyWindow { fmin: f64, fmax: f64 },

    /// An overlay series does not match the spectrum length.
    #[error("overlay '{series}' has length {actual}, expected {expected}")]
    OverlayLengthMismatch {
        series: String,
        expected: usize,
        actual: usize,
    },

    /// Picker configuration is unusable (missing or clashing key bindings, bad modifier).
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type PickResult<T> = Result<T, PickError>;
