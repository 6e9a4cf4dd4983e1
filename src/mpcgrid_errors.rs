use thiserror::Error;

/// Crate-wide error type.
///
/// Every failure in the pipeline is fatal for the run: a partially aggregated
/// grid with silently dropped records would be worse than a clean failure, so
/// there is no retry or skip policy anywhere. Records that merely fall outside
/// a dimension's configured range are not errors and never surface here.
#[derive(Error, Debug)]
pub enum MpcGridError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error parsing the catalog input: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Error serializing results: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog read failed after {records} records: {source}")]
    CatalogReadError {
        records: u64,
        source: Box<MpcGridError>,
    },

    #[error("Invalid dimension configuration: {0}")]
    InvalidDimension(String),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Drill-down worker for dimension {0} stopped before the stream ended")]
    WorkerStopped(usize),

    #[error("Drill-down worker panicked: {0}")]
    WorkerPanicked(String),
}
