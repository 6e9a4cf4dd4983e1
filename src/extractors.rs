//! # Bin Extractors
//!
//! One [`ValueExtractor`] per physical quantity, mapping a catalog record to a
//! bin coordinate on that quantity's axis plus a display label for the bin.
//!
//! ## Overview
//! -----------------
//! `extract_cell` returns `Some(bin)` with `bin` zero-based, or `None` when
//! the record does not fit the configured range. `None` is the out-of-range
//! sentinel: callers must treat it as exclusionary, never as a coordinate.
//! A record that fails the range test is dropped from that dimension pair
//! entirely, it is never clamped into the edge bin.
//!
//! `extract_label` renders the lower edge of the bin the record falls in,
//! computed with the same scale-and-truncate quantization as `extract_cell`,
//! so the two can never disagree about bin membership.
//!
//! ## Fixed-point semantics
//! -----------------
//! All variants truncate toward zero after scaling rather than rounding. Bin
//! boundaries are therefore deterministic and reproducible: a value sits in
//! the bin whose lower edge it is at or above, and `x <= max` keeps a value
//! exactly on the configured maximum in range.

use crate::catalog::MinorPlanet;

/// Maps one catalog record onto one dimension's discretized axis.
pub trait ValueExtractor: Send + Sync {
    /// Zero-based bin index for this record, or `None` when out of range.
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize>;

    /// Display label for the lower edge of the bin this record falls in.
    fn extract_label(&self, record: &MinorPlanet) -> String;
}

/// Scale a value onto a bin axis, rejecting anything above `max_value` or
/// below zero.
fn scale_axis(value: f64, max_value: f64, multiplier: f64) -> Option<usize> {
    if (0.0..=max_value).contains(&value) {
        Some((value * multiplier) as usize)
    } else {
        None
    }
}

/// Truncate a value to the resolution implied by `multiplier`, e.g. 9.87 with
/// multiplier 10.0 becomes 9.8. This is the bin's lower edge.
fn truncate_to_step(value: f64, multiplier: f64) -> f64 {
    (value * multiplier).trunc() / multiplier
}

/// Aphelion distance, `a + a*e`, in tenths of an AU.
pub struct AphelionExtractor {
    pub max_value: f64,
    pub multiplier: f64,
}

impl AphelionExtractor {
    fn aphelion(&self, record: &MinorPlanet) -> f64 {
        record.semimajor_axis + record.semimajor_axis * record.orbital_eccentricity
    }
}

impl ValueExtractor for AphelionExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        scale_axis(self.aphelion(record), self.max_value, self.multiplier)
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!("{:.1}", truncate_to_step(self.aphelion(record), self.multiplier))
    }
}

/// Perihelion distance, `a - a*e`, in tenths of an AU.
pub struct PerihelionExtractor {
    pub max_value: f64,
    pub multiplier: f64,
}

impl PerihelionExtractor {
    fn perihelion(&self, record: &MinorPlanet) -> f64 {
        record.semimajor_axis - record.semimajor_axis * record.orbital_eccentricity
    }
}

impl ValueExtractor for PerihelionExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        scale_axis(self.perihelion(record), self.max_value, self.multiplier)
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!(
            "{:.1}",
            truncate_to_step(self.perihelion(record), self.multiplier)
        )
    }
}

/// Year of first observation, one bin per year from `baseline_year` upwards.
/// The baseline itself is in range (bin 0).
pub struct YearOfFirstObsExtractor {
    pub baseline_year: i64,
}

impl ValueExtractor for YearOfFirstObsExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        year_cell(record.year_of_first_observation, self.baseline_year)
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        record.year_of_first_observation.to_string()
    }
}

/// Year of last observation, same binning as [`YearOfFirstObsExtractor`].
pub struct YearOfLastObsExtractor {
    pub baseline_year: i64,
}

impl ValueExtractor for YearOfLastObsExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        year_cell(record.year_of_last_observation, self.baseline_year)
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        record.year_of_last_observation.to_string()
    }
}

fn year_cell(year: i64, baseline_year: i64) -> Option<usize> {
    if year >= baseline_year {
        Some((year - baseline_year) as usize)
    } else {
        None
    }
}

/// Orbital eccentricity at fixed two-decimal resolution. No configured max:
/// the dimension's grid size bounds it implicitly.
pub struct OrbitalEccentricityExtractor;

impl ValueExtractor for OrbitalEccentricityExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        if record.orbital_eccentricity >= 0.0 {
            Some((record.orbital_eccentricity * 100.0) as usize)
        } else {
            None
        }
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!(
            "{:.2}",
            truncate_to_step(record.orbital_eccentricity, 100.0)
        )
    }
}

/// Inclination to the ecliptic in two-degree buckets.
pub struct InclinationToTheEclipticExtractor;

impl ValueExtractor for InclinationToTheEclipticExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        if record.inclination_to_the_ecliptic >= 0.0 {
            Some((record.inclination_to_the_ecliptic / 2.0) as usize)
        } else {
            None
        }
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!(
            "{:.1}",
            (record.inclination_to_the_ecliptic / 2.0).trunc() * 2.0
        )
    }
}

/// Semi-major axis in tenths of an AU, same scale/clamp rule as aphelion but
/// with its own constants.
pub struct SemimajorAxisExtractor {
    pub max_value: f64,
    pub multiplier: f64,
}

impl ValueExtractor for SemimajorAxisExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        scale_axis(record.semimajor_axis, self.max_value, self.multiplier)
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!(
            "{:.1}",
            truncate_to_step(record.semimajor_axis, self.multiplier)
        )
    }
}

/// Absolute magnitude coarsened to a fixed decimal resolution.
///
/// The coarsened value is used directly as the bin coordinate, not a bin
/// count: magnitude 14.5 lands in cell 14 while labelled "14.5". Negative
/// magnitudes fall below the axis and are out of range.
pub struct AbsoluteMagnitudeExtractor {
    pub multiplier: f64,
}

impl AbsoluteMagnitudeExtractor {
    fn coarsened(&self, record: &MinorPlanet) -> f64 {
        truncate_to_step(record.absolute_magnitude, self.multiplier)
    }
}

impl ValueExtractor for AbsoluteMagnitudeExtractor {
    fn extract_cell(&self, record: &MinorPlanet) -> Option<usize> {
        let coarse = self.coarsened(record);
        if coarse >= 0.0 {
            Some(coarse as usize)
        } else {
            None
        }
    }

    fn extract_label(&self, record: &MinorPlanet) -> String {
        format!("{:.1}", self.coarsened(record))
    }
}
