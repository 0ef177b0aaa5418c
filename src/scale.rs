use crate::data::model::DisplayDomain;

/// Floor applied before taking the log, relative to the reference maximum.
const DB_FLOOR_RATIO: f64 = 1e-12;

/// Usable reference maximum; falls back to 1.0 for non-finite or non-positive input.
fn reference(max_linear: f64) -> f64 {
    if max_linear.is_finite() && max_linear > 0.0 {
        max_linear
    } else {
        1.0
    }
}

/// `20·log10(value / max)`, flooring values at `max × 1e-12`.
pub fn linear_to_db(value: f64, max_linear: f64) -> f64 {
    let max_linear = reference(max_linear);
    let safe = value.max(max_linear * DB_FLOOR_RATIO);
    20.0 * (safe / max_linear).log10()
}

/// Inverse of [`linear_to_db`]: `max · 10^(dB/20)`.
pub fn db_to_linear(db: f64, max_linear: f64) -> f64 {
    reference(max_linear) * 10f64.powf(db / 20.0)
}

/// Presentation transform from a spectrum's stored domain to a display domain.
///
/// Linear data converted to dB is anchored at its own maximum. dB data has no
/// linear reference, so 0 dB maps to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainTransform {
    stored: DisplayDomain,
    max_linear: f64,
}

impl DomainTransform {
    pub fn new(stored: DisplayDomain, magnitudes: &[f64]) -> Self {
        let max_linear = match stored {
            DisplayDomain::Linear => {
                reference(magnitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            DisplayDomain::Db => 1.0,
        };
        DomainTransform { stored, max_linear }
    }

    pub fn max_linear(&self) -> f64 {
        self.max_linear
    }

    /// Map stored values into `target`. Identity when the domains agree.
    pub fn apply(&self, values: &[f64], target: DisplayDomain) -> Vec<f64> {
        match (self.stored, target) {
            (DisplayDomain::Linear, DisplayDomain::Db) => values
                .iter()
                .map(|&v| linear_to_db(v, self.max_linear))
                .collect(),
            (DisplayDomain::Db, DisplayDomain::Linear) => values
                .iter()
                .map(|&v| db_to_linear(v, self.max_linear))
                .collect(),
            _ => values.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_is_normalised_to_max() {
        assert!((linear_to_db(2.0, 2.0)).abs() < 1e-12);
        assert!((linear_to_db(1.0, 2.0) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn db_to_linear_with_unit_max() {
        assert!((db_to_linear(0.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((db_to_linear(-6.0, 1.0) - 10f64.powf(-6.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn conversion_round_trips() {
        let max = 7.5;
        for v in [1e-6, 0.01, 0.5, 3.0, 7.5] {
            let back = db_to_linear(linear_to_db(v, max), max);
            assert!((back - v).abs() <= 1e-9 * v.max(1.0), "{v} → {back}");
        }
    }

    #[test]
    fn zero_and_negative_are_floored() {
        let db = linear_to_db(0.0, 1.0);
        assert!(db.is_finite());
        assert!((db + 240.0).abs() < 1e-9);
        assert!(linear_to_db(-3.0, 1.0).is_finite());
    }

    #[test]
    fn bad_reference_falls_back_to_unity() {
        assert_eq!(linear_to_db(1.0, 0.0), 0.0);
        assert_eq!(db_to_linear(0.0, f64::NAN), 1.0);
    }

    #[test]
    fn transform_is_identity_in_stored_domain() {
        let mags = [1.0, 2.0, 4.0];
        let t = DomainTransform::new(DisplayDomain::Linear, &mags);
        assert_eq!(t.max_linear(), 4.0);
        assert_eq!(t.apply(&mags, DisplayDomain::Linear), mags.to_vec());
        let db = t.apply(&mags, DisplayDomain::Db);
        assert!(db[2].abs() < 1e-12);
        assert!(db[0] < db[1] && db[1] < db[2]);
    }

    #[test]
    fn db_storage_uses_unit_reference() {
        let mags = [-20.0, 0.0];
        let t = DomainTransform::new(DisplayDomain::Db, &mags);
        let lin = t.apply(&mags, DisplayDomain::Linear);
        assert!((lin[0] - 0.1).abs() < 1e-12);
        assert!((lin[1] - 1.0).abs() < 1e-12);
    }
}
