//! # Minor Planet Catalog Input
//!
//! The record type consumed by the whole pipeline and the reader contract that
//! feeds it.
//!
//! ## Overview
//! -----------------
//! The pipeline only ever sees one record at a time through the
//! [`CatalogReader`] trait: `Ok(Some(record))` while the stream has data,
//! `Ok(None)` on clean end-of-stream, and `Err` for anything else. Any error
//! that is not a clean end-of-stream aborts the run (see
//! [`MpcGridError`](crate::MpcGridError)).
//!
//! [`CsvCatalogReader`] is the bundled implementation: a headered CSV file
//! whose column names match the [`MinorPlanet`] field names, deserialized row
//! by row with serde. Other catalog formats (e.g. the MPC fixed-width export)
//! can be plugged in by implementing [`CatalogReader`] over their own parser.

use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use serde::Deserialize;

use crate::mpcgrid_errors::MpcGridError;

/// One minor planet record, reduced to the fields the dimensions bin on.
///
/// Units follow the MPC orbit catalog conventions: the semi-major axis is in
/// AU, the inclination in degrees, observation years are calendar years and
/// `id` is the packed designation (opaque to the pipeline, only ever copied
/// into drill-down files).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MinorPlanet {
    pub id: String,
    pub semimajor_axis: f64,
    pub orbital_eccentricity: f64,
    pub year_of_first_observation: i64,
    pub year_of_last_observation: i64,
    pub inclination_to_the_ecliptic: f64,
    pub absolute_magnitude: f64,
}

/// Sequential reader over catalog records.
pub trait CatalogReader {
    /// Pull the next record. `Ok(None)` signals a clean end-of-stream.
    fn next_record(&mut self) -> Result<Option<MinorPlanet>, MpcGridError>;
}

/// [`CatalogReader`] over a headered CSV source.
pub struct CsvCatalogReader<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, MinorPlanet>,
}

impl CsvCatalogReader<File> {
    /// Open a CSV catalog file.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – Path to a CSV file with a header row naming the
    ///   [`MinorPlanet`] fields.
    ///
    /// Return
    /// ----------
    /// * A reader ready for [`CatalogReader::next_record`], or an error if the
    ///   file cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, MpcGridError> {
        let reader = csv::Reader::from_path(path)?;
        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl<R: Read> CsvCatalogReader<R> {
    /// Wrap an already opened CSV source (used by tests over in-memory data).
    pub fn from_reader(source: R) -> Self {
        Self {
            records: csv::Reader::from_reader(source).into_deserialize(),
        }
    }
}

impl<R: Read> CatalogReader for CsvCatalogReader<R> {
    fn next_record(&mut self) -> Result<Option<MinorPlanet>, MpcGridError> {
        self.records
            .next()
            .transpose()
            .map_err(MpcGridError::CsvError)
    }
}
