//! # Dimension Registry
//!
//! The fixed, ordered set of axes the pipeline aggregates over. Each
//! [`Dimension`] owns one extractor plus the binning metadata rendered into
//! `dimensions.json`. The registry is built once at startup and never mutated.

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::catalog::MinorPlanet;
use crate::extractors::{
    AbsoluteMagnitudeExtractor, AphelionExtractor, InclinationToTheEclipticExtractor,
    OrbitalEccentricityExtractor, PerihelionExtractor, SemimajorAxisExtractor, ValueExtractor,
    YearOfFirstObsExtractor, YearOfLastObsExtractor,
};
use crate::mpcgrid_errors::MpcGridError;

/// One named axis: binning metadata plus the extractor that does the actual
/// binning. `min_value`/`max_value`/`step_size` are descriptive metadata for
/// consumers of `dimensions.json`; the binning math lives entirely in the
/// extractor's own constants.
#[derive(Serialize)]
pub struct Dimension {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "min")]
    pub min_value: f64,
    #[serde(rename = "max")]
    pub max_value: f64,
    #[serde(rename = "grid")]
    pub grid_size: usize,
    #[serde(rename = "step")]
    pub step_size: f64,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(skip)]
    pub extractor: Box<dyn ValueExtractor>,
}

impl Dimension {
    /// Bin coordinate for `record` on this axis.
    ///
    /// Returns `None` both when the extractor reports out-of-range and when
    /// the extracted index would fall outside `[0, grid_size)` — extractors
    /// without a configured max (eccentricity) are bounded here, so callers
    /// can index grids with the result without further checks.
    pub fn bin(&self, record: &MinorPlanet) -> Option<usize> {
        self.extractor
            .extract_cell(record)
            .filter(|&cell| cell < self.grid_size)
    }

    /// Display label for the bin `record` falls in on this axis.
    pub fn label(&self, record: &MinorPlanet) -> String {
        self.extractor.extract_label(record)
    }
}

/// Build the standard registry, in its fixed order.
pub fn build_dimensions() -> Vec<Dimension> {
    vec![
        build_aphelion(),
        build_perihelion(),
        build_year_of_first_obs(),
        build_year_of_last_obs(),
        build_orbital_eccentricity(),
        build_inclination_to_the_ecliptic(),
        build_semimajor_axis(),
        build_absolute_magnitude(),
    ]
}

fn build_aphelion() -> Dimension {
    Dimension {
        name: "Aphelion".into(),
        min_value: 0.0,
        max_value: 10.0,
        grid_size: 100,
        step_size: 0.1,
        description: "Furthest distance from the sun (AU)".into(),
        extractor: Box::new(AphelionExtractor {
            max_value: 10.0,
            multiplier: 10.0,
        }),
    }
}

fn build_perihelion() -> Dimension {
    Dimension {
        name: "Perihelion".into(),
        min_value: 0.0,
        max_value: 10.0,
        grid_size: 100,
        step_size: 0.1,
        description: "Closest distance to the sun (AU)".into(),
        extractor: Box::new(PerihelionExtractor {
            max_value: 10.0,
            multiplier: 10.0,
        }),
    }
}

fn build_year_of_first_obs() -> Dimension {
    Dimension {
        name: "Year-Of-First-Obs".into(),
        min_value: 1915.0,
        max_value: 2015.0,
        grid_size: 101,
        step_size: 1.0,
        description: "Year the object was first observed".into(),
        extractor: Box::new(YearOfFirstObsExtractor { baseline_year: 1915 }),
    }
}

fn build_year_of_last_obs() -> Dimension {
    Dimension {
        name: "Year-Of-Last-Obs".into(),
        min_value: 1915.0,
        max_value: 2015.0,
        grid_size: 101,
        step_size: 1.0,
        description: "Year the object was last observed".into(),
        extractor: Box::new(YearOfLastObsExtractor { baseline_year: 1915 }),
    }
}

fn build_orbital_eccentricity() -> Dimension {
    Dimension {
        name: "Orbital-Eccentricity".into(),
        min_value: 0.0,
        max_value: 1.0,
        grid_size: 100,
        step_size: 0.01,
        description: "Eccentricity of the orbit".into(),
        extractor: Box::new(OrbitalEccentricityExtractor),
    }
}

fn build_inclination_to_the_ecliptic() -> Dimension {
    Dimension {
        name: "Inclination-To-The-Ecliptic".into(),
        min_value: 0.0,
        max_value: 90.0,
        grid_size: 90,
        step_size: 1.0,
        description: "Inclination of the orbit to the ecliptic (degrees)".into(),
        extractor: Box::new(InclinationToTheEclipticExtractor),
    }
}

fn build_semimajor_axis() -> Dimension {
    Dimension {
        name: "Semi-Major-Axis".into(),
        min_value: 0.0,
        max_value: 10.0,
        grid_size: 100,
        step_size: 0.1,
        description: "Semi-major axis of the orbit (AU)".into(),
        extractor: Box::new(SemimajorAxisExtractor {
            max_value: 10.0,
            multiplier: 10.0,
        }),
    }
}

fn build_absolute_magnitude() -> Dimension {
    Dimension {
        name: "Absolute-Magnitude".into(),
        min_value: -2.0,
        max_value: 28.0,
        grid_size: 60,
        step_size: 0.5,
        description: "Absolute magnitude of the object".into(),
        extractor: Box::new(AbsoluteMagnitudeExtractor { multiplier: 10.0 }),
    }
}

/// Write the registry metadata to `<output_root>/dimensions.json`, in registry
/// order, with a trailing newline. The extractors have no external
/// representation and are skipped.
pub fn render_dimensions(
    output_root: &Utf8Path,
    dimensions: &[Dimension],
) -> Result<(), MpcGridError> {
    let file = File::create(output_root.join("dimensions.json"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, dimensions)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
