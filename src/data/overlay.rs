use std::fmt;

use crate::error::{PickError, PickResult};

// ---------------------------------------------------------------------------
// Overlay context – optional aggregate series drawn next to the spectrum
// ---------------------------------------------------------------------------

/// Names of the auxiliary series an overlay context may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlaySeries {
    Mean,
    Median,
    P10,
    P25,
    P75,
    P90,
}

impl OverlaySeries {
    pub const ALL: [OverlaySeries; 6] = [
        OverlaySeries::Mean,
        OverlaySeries::Median,
        OverlaySeries::P10,
        OverlaySeries::P25,
        OverlaySeries::P75,
        OverlaySeries::P90,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OverlaySeries::Mean => "mean",
            OverlaySeries::Median => "median",
            OverlaySeries::P10 => "p10",
            OverlaySeries::P25 => "p25",
            OverlaySeries::P75 => "p75",
            OverlaySeries::P90 => "p90",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for OverlaySeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mean / median / percentile series aligned with a spectrum's samples.
///
/// Never affects which bins get selected; it is display context only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayContext {
    pub mean: Option<Vec<f64>>,
    pub median: Option<Vec<f64>>,
    pub p10: Option<Vec<f64>>,
    pub p25: Option<Vec<f64>>,
    pub p75: Option<Vec<f64>>,
    pub p90: Option<Vec<f64>>,
}

impl OverlayContext {
    pub fn get(&self, series: OverlaySeries) -> Option<&[f64]> {
        let slot = match series {
            OverlaySeries::Mean => &self.mean,
            OverlaySeries::Median => &self.median,
            OverlaySeries::P10 => &self.p10,
            OverlaySeries::P25 => &self.p25,
            OverlaySeries::P75 => &self.p75,
            OverlaySeries::P90 => &self.p90,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, series: OverlaySeries, values: Vec<f64>) {
        let slot = match series {
            OverlaySeries::Mean => &mut self.mean,
            OverlaySeries::Median => &mut self.median,
            OverlaySeries::P10 => &mut self.p10,
            OverlaySeries::P25 => &mut self.p25,
            OverlaySeries::P75 => &mut self.p75,
            OverlaySeries::P90 => &mut self.p90,
        };
        *slot = Some(values);
    }

    /// Present series, in canonical order.
    pub fn present(&self) -> impl Iterator<Item = (OverlaySeries, &[f64])> + '_ {
        OverlaySeries::ALL
            .into_iter()
            .filter_map(move |s| self.get(s).map(|v| (s, v)))
    }

    pub fn has_any(&self) -> bool {
        self.present().next().is_some()
    }

    /// Slice every present series to `[offset, offset + len)`, matching a cropped view.
    pub fn cropped(&self, offset: usize, len: usize) -> OverlayContext {
        let mut out = OverlayContext::default();
        for (series, values) in self.present() {
            let end = (offset + len).min(values.len());
            let start = offset.min(end);
            out.set(series, values[start..end].to_vec());
        }
        out
    }
}

/// What [`validate_context`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextCheck {
    /// No context supplied.
    Absent,
    /// A context was supplied but carries no series, so it has no effect.
    Empty,
    /// At least one series, all of matching length.
    Valid,
}

/// Check every present overlay series against the spectrum's length.
pub fn validate_context(
    frequencies: &[f64],
    context: Option<&OverlayContext>,
) -> PickResult<ContextCheck> {
    let Some(context) = context else {
        return Ok(ContextCheck::Absent);
    };
    if !context.has_any() {
        log::warn!("Overlay context supplied without any series; it has no effect");
        return Ok(ContextCheck::Empty);
    }
    let expected = frequencies.len();
    for (series, values) in context.present() {
        if values.len() != expected {
            return Err(PickError::OverlayLengthMismatch {
                series: series.name().to_string(),
                expected,
                actual: values.len(),
            });
        }
    }
    Ok(ContextCheck::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn absent_and_empty_contexts_are_accepted() {
        let f = freqs(11);
        assert_eq!(validate_context(&f, None).unwrap(), ContextCheck::Absent);
        let empty = OverlayContext::default();
        assert_eq!(validate_context(&f, Some(&empty)).unwrap(), ContextCheck::Empty);
    }

    #[test]
    fn mismatch_names_series_and_lengths() {
        let f = freqs(11);
        let ctx = OverlayContext {
            mean: Some(vec![0.0; 5]),
            ..Default::default()
        };
        let err = validate_context(&f, Some(&ctx)).unwrap_err();
        assert_eq!(
            err,
            PickError::OverlayLengthMismatch {
                series: "mean".into(),
                expected: 11,
                actual: 5,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("mean") && msg.contains("11") && msg.contains('5'));
    }

    #[test]
    fn later_series_are_checked_too() {
        let f = freqs(4);
        let ctx = OverlayContext {
            mean: Some(vec![0.0; 4]),
            p90: Some(vec![0.0; 3]),
            ..Default::default()
        };
        match validate_context(&f, Some(&ctx)) {
            Err(PickError::OverlayLengthMismatch { series, .. }) => assert_eq!(series, "p90"),
            other => panic!("expected p90 mismatch, got {other:?}"),
        }
    }

    #[test]
    fn cropping_follows_view_offset() {
        let ctx = OverlayContext {
            median: Some((0..10).map(|i| i as f64).collect()),
            ..Default::default()
        };
        let view = ctx.cropped(3, 4);
        assert_eq!(view.median.as_deref(), Some(&[3.0, 4.0, 5.0, 6.0][..]));
        assert!(view.mean.is_none());
    }

    #[test]
    fn series_names_round_trip() {
        for s in OverlaySeries::ALL {
            assert_eq!(OverlaySeries::from_name(s.name()), Some(s));
        }
        assert_eq!(OverlaySeries::from_name("p50"), None);
    }
}
