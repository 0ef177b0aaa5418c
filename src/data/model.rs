use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PickError, PickResult};

// ---------------------------------------------------------------------------
// MetadataValue – a single opaque metadata entry
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value, copied verbatim into the output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

/// Open key → value map attached to a spectrum.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// DisplayDomain
// ---------------------------------------------------------------------------

/// Magnitude domain a spectrum is stored (and initially displayed) in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayDomain {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "dB")]
    Db,
}

impl DisplayDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayDomain::Linear => "linear",
            DisplayDomain::Db => "dB",
        }
    }

    /// Y-axis label for magnitudes shown in this domain.
    pub fn axis_label(self) -> &'static str {
        match self {
            DisplayDomain::Linear => "Magnitude (linear)",
            DisplayDomain::Db => "Magnitude (dB)",
        }
    }

    /// The other domain.
    pub fn flipped(self) -> Self {
        match self {
            DisplayDomain::Linear => DisplayDomain::Db,
            DisplayDomain::Db => DisplayDomain::Linear,
        }
    }
}

impl fmt::Display for DisplayDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayDomain {
    type Err = PickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(DisplayDomain::Linear),
            "dB" => Ok(DisplayDomain::Db),
            other => Err(PickError::InvalidSpectrum(format!(
                "display_domain must be 'linear' or 'dB', got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – validated, immutable input series
// ---------------------------------------------------------------------------

/// A single magnitude-vs-frequency spectrum.
///
/// Constructed once and validated at construction; there are no mutating
/// accessors, so the invariants hold for the lifetime of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
    display_domain: DisplayDomain,
    metadata: Metadata,
}

impl Spectrum {
    /// Build a spectrum without metadata.
    pub fn new(
        frequencies: Vec<f64>,
        magnitudes: Vec<f64>,
        display_domain: DisplayDomain,
    ) -> PickResult<Self> {
        Self::with_metadata(frequencies, magnitudes, display_domain, Metadata::new())
    }

    pub fn with_metadata(
        frequencies: Vec<f64>,
        magnitudes: Vec<f64>,
        display_domain: DisplayDomain,
        metadata: Metadata,
    ) -> PickResult<Self> {
        validate_series(&frequencies, &magnitudes)?;
        Ok(Spectrum {
            frequencies,
            magnitudes,
            display_domain,
            metadata,
        })
    }

    /// Frequency axis in Hz, strictly increasing.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Magnitudes aligned with [`Self::frequencies`].
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn display_domain(&self) -> DisplayDomain {
        self.display_domain
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of samples (always ≥ 1).
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always false for a validated spectrum; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Check the frequency / magnitude pair.
///
/// Both series are 1-D by construction (`&[f64]`), so the remaining checks are
/// emptiness, length agreement, finiteness and strict monotonicity.
pub fn validate_series(frequencies: &[f64], magnitudes: &[f64]) -> PickResult<()> {
    if frequencies.is_empty() || magnitudes.is_empty() {
        return Err(PickError::InvalidSpectrum(
            "f_hz and mag must be non-empty".into(),
        ));
    }
    if frequencies.len() != magnitudes.len() {
        return Err(PickError::InvalidSpectrum(format!(
            "f_hz and mag must be the same length (f_hz: {}, mag: {})",
            frequencies.len(),
            magnitudes.len()
        )));
    }
    if let Some(i) = frequencies.iter().position(|f| !f.is_finite()) {
        return Err(PickError::InvalidSpectrum(format!(
            "f_hz must contain only finite values (f_hz[{i}] = {})",
            frequencies[i]
        )));
    }
    if let Some(i) = magnitudes.iter().position(|m| !m.is_finite()) {
        return Err(PickError::InvalidSpectrum(format!(
            "mag must contain only finite values (mag[{i}] = {})",
            magnitudes[i]
        )));
    }
    if let Some(i) = frequencies.windows(2).position(|w| w[1] - w[0] <= 0.0) {
        return Err(PickError::InvalidSpectrum(format!(
            "f_hz must be strictly increasing (f_hz[{}] = {} follows {})",
            i + 1,
            frequencies[i + 1],
            frequencies[i]
        )));
    }
    Ok(())
}
