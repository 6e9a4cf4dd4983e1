//! # Pipeline Orchestrator
//!
//! Streams catalog records through every dimension pair, updating the
//! histogram store and dispatching drill-down membership events, then flushes
//! both outputs.
//!
//! ## Phases
//! -----------------
//! * **Init** – validate configuration, build the registry's result table,
//!   launch one drill-down worker per row dimension.
//! * **Streaming** – pull records one at a time; each dimension's bin is
//!   resolved once per record, then every ordered pair with both coordinates
//!   valid gets a count and a membership message. An out-of-range coordinate
//!   on either axis excludes the record from that pair entirely — no partial
//!   update.
//! * **Draining** – close every worker queue and wait for the workers to
//!   drain and exit.
//! * **Done** – serialize every pair's populated cells and the dimension
//!   metadata.
//!
//! The orchestrator is the only mutator of the histogram store and the only
//! producer for the workers; the sole place it can stall is a full worker
//! queue, which is the intended backpressure.

use std::fs::{self, File};
use std::io::BufWriter;

use camino::Utf8PathBuf;
use itertools::iproduct;
use tracing::{debug, info};

use crate::catalog::CatalogReader;
use crate::config::PipelineConfig;
use crate::dimensions::{render_dimensions, Dimension};
use crate::drilldown::{DrilldownMessage, DrilldownWriter};
use crate::grid::ResultTable;
use crate::mpcgrid_errors::MpcGridError;

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records pulled from the catalog, including ones no dimension accepted.
    pub records: u64,
}

pub struct Pipeline {
    config: PipelineConfig,
    dimensions: Vec<Dimension>,
    table: ResultTable,
    /// Output directory per ordered pair, `<root>/<row name>/<column name>`,
    /// resolved once at startup.
    pair_dirs: Vec<Utf8PathBuf>,
}

impl Pipeline {
    /// Validate the configuration and allocate the full result table.
    pub fn new(config: PipelineConfig, dimensions: Vec<Dimension>) -> Result<Self, MpcGridError> {
        config.validate()?;
        let table = ResultTable::build(&dimensions)?;
        let pair_dirs = iproduct!(&dimensions, &dimensions)
            .map(|(row, column)| config.output_root.join(&row.name).join(&column.name))
            .collect();
        Ok(Self {
            config,
            dimensions,
            table,
            pair_dirs,
        })
    }

    /// Run the whole pipeline over `reader` until clean end-of-stream.
    ///
    /// Any read error, worker failure or output I/O error aborts the run;
    /// nothing is retried or skipped.
    pub async fn run<R: CatalogReader>(
        mut self,
        reader: &mut R,
    ) -> Result<RunSummary, MpcGridError> {
        let n = self.dimensions.len();
        let writer = DrilldownWriter::spawn(n, self.config.max_open_files, self.config.queue_capacity);
        info!(
            dimensions = n,
            output_root = %self.config.output_root,
            "pipeline started"
        );

        // Workers are always drained, even on a failed stream, so the
        // drill-down files on disk stay consistent with the error report.
        let streamed = self.stream(reader, &writer).await;
        let drained = writer.shutdown().await;
        let records = match (streamed, drained) {
            (Ok(records), Ok(())) => records,
            // A failed send only says the worker is gone; the join result
            // carries the root cause.
            (Err(MpcGridError::WorkerStopped(_)), Err(worker_error)) => return Err(worker_error),
            (Err(stream_error), _) => return Err(stream_error),
            (Ok(_), Err(worker_error)) => return Err(worker_error),
        };
        info!(records, "catalog stream complete, workers drained");

        self.write_results()?;
        info!(records, "run complete");
        Ok(RunSummary { records })
    }

    /// Streaming phase: pull records until clean end-of-stream, counting each
    /// in-range pair and dispatching its membership event.
    async fn stream<R: CatalogReader>(
        &mut self,
        reader: &mut R,
        writer: &DrilldownWriter,
    ) -> Result<u64, MpcGridError> {
        let n = self.dimensions.len();
        let mut records: u64 = 0;
        let mut bins: Vec<Option<usize>> = vec![None; n];
        loop {
            let record = match reader.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(source) => {
                    return Err(MpcGridError::CatalogReadError {
                        records,
                        source: Box::new(source),
                    });
                }
            };

            for (bin, dimension) in bins.iter_mut().zip(&self.dimensions) {
                *bin = dimension.bin(&record);
            }

            for (i, j) in iproduct!(0..n, 0..n) {
                let (Some(x), Some(y)) = (bins[i], bins[j]) else {
                    continue;
                };
                let dimensions = &self.dimensions;
                let first = self.table.record(i, j, x, y, || {
                    (dimensions[i].label(&record), dimensions[j].label(&record))
                });

                let cell_dir = self.pair_dirs[i * n + j].join(x.to_string());
                if first {
                    fs::create_dir_all(&cell_dir)?;
                }
                writer
                    .send(
                        i,
                        DrilldownMessage {
                            target: cell_dir.join(format!("{y}.txt")),
                            record_id: record.id.clone(),
                        },
                    )
                    .await?;
            }

            records += 1;
            if records % 100_000 == 0 {
                debug!(records, "streaming");
            }
        }
        Ok(records)
    }

    /// Serialize every pair's populated cells, then the registry metadata.
    fn write_results(&self) -> Result<(), MpcGridError> {
        let n = self.dimensions.len();
        for (i, j) in iproduct!(0..n, 0..n) {
            let dir = &self.pair_dirs[i * n + j];
            fs::create_dir_all(dir)?;
            let file = File::create(dir.join("data.json"))?;
            serde_json::to_writer(BufWriter::new(file), &self.table.grid(i, j).populated())?;
        }
        render_dimensions(&self.config.output_root, &self.dimensions)?;
        Ok(())
    }
}

#[cfg(test)]
mod pipeline_test {
    use super::*;
    use crate::catalog::MinorPlanet;
    use crate::dimensions::build_dimensions;
    use camino::Utf8Path;

    struct VecReader {
        records: std::vec::IntoIter<MinorPlanet>,
    }

    impl VecReader {
        fn new(records: Vec<MinorPlanet>) -> Self {
            Self {
                records: records.into_iter(),
            }
        }
    }

    impl CatalogReader for VecReader {
        fn next_record(&mut self) -> Result<Option<MinorPlanet>, MpcGridError> {
            Ok(self.records.next())
        }
    }

    struct FailingReader;

    impl CatalogReader for FailingReader {
        fn next_record(&mut self) -> Result<Option<MinorPlanet>, MpcGridError> {
            Err(MpcGridError::InvalidConfig("broken stream".into()))
        }
    }

    fn test_config(root: &Utf8Path) -> PipelineConfig {
        PipelineConfig::new(root.to_owned())
    }

    #[tokio::test]
    async fn test_empty_stream_writes_empty_grids() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let pipeline = Pipeline::new(test_config(root), build_dimensions()).unwrap();
        let summary = pipeline.run(&mut VecReader::new(vec![])).await.unwrap();
        assert_eq!(summary.records, 0);

        let data = fs::read_to_string(root.join("Aphelion/Perihelion/data.json")).unwrap();
        assert_eq!(data, "[]");
        assert!(root.join("dimensions.json").exists());
    }

    #[tokio::test]
    async fn test_read_error_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let pipeline = Pipeline::new(test_config(root), build_dimensions()).unwrap();
        let error = pipeline.run(&mut FailingReader).await.unwrap_err();
        assert!(matches!(
            error,
            MpcGridError::CatalogReadError { records: 0, .. }
        ));
    }
}
