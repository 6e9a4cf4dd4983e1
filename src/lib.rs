pub mod catalog;
pub mod config;
pub mod dimensions;
pub mod drilldown;
pub mod extractors;
pub mod grid;
pub mod mpcgrid_errors;
pub mod pipeline;

pub use catalog::{CatalogReader, CsvCatalogReader, MinorPlanet};
pub use config::PipelineConfig;
pub use dimensions::{build_dimensions, Dimension};
pub use grid::{Grid, GridEntry, ResultTable};
pub use mpcgrid_errors::MpcGridError;
pub use pipeline::{Pipeline, RunSummary};
