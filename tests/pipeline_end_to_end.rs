use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use mpcgrid::{build_dimensions, CsvCatalogReader, GridEntry, Pipeline, PipelineConfig};

const HEADER: &str = "id,semimajor_axis,orbital_eccentricity,year_of_first_observation,year_of_last_observation,inclination_to_the_ecliptic,absolute_magnitude";

fn write_catalog(dir: &Utf8Path, rows: &[&str]) -> Utf8PathBuf {
    let path = dir.join("catalog.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    path
}

fn utf8(dir: &TempDir) -> &Utf8Path {
    Utf8Path::from_path(dir.path()).unwrap()
}

fn load_entries(path: &Utf8Path) -> Vec<GridEntry> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn two_identical_records_share_a_cell() {
    let dir = tempfile::tempdir().unwrap();
    let root = utf8(&dir);
    let catalog = write_catalog(
        root,
        &[
            "A,5.0,0.2,1920,1995,10.0,12.5",
            "B,5.0,0.2,1920,1995,10.0,12.5",
        ],
    );
    let output = root.join("out");

    let pipeline = Pipeline::new(PipelineConfig::new(output.clone()), build_dimensions()).unwrap();
    let mut reader = CsvCatalogReader::open(&catalog).unwrap();
    let summary = pipeline.run(&mut reader).await.unwrap();
    assert_eq!(summary.records, 2);

    // Aphelion 5.0 + 5.0*0.2 = 6.0 -> bin 60; first obs 1920 -> bin 5.
    let entries = load_entries(&output.join("Aphelion/Year-Of-First-Obs/data.json"));
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!((entry.x, entry.y), (60, 5));
    assert_eq!(entry.count, 2);
    assert_eq!(entry.start_x, "6.0");
    assert_eq!(entry.start_y, "1920");
    assert!(entry.special.is_empty());

    // Drill-down membership, first-seen order.
    let members = fs::read_to_string(output.join("Aphelion/Year-Of-First-Obs/60/5.txt")).unwrap();
    assert_eq!(members, "A\nB\n");

    // The mirrored ordering is a distinct grid with swapped axes.
    let mirrored = load_entries(&output.join("Year-Of-First-Obs/Aphelion/data.json"));
    assert_eq!(mirrored.len(), 1);
    assert_eq!((mirrored[0].x, mirrored[0].y), (5, 60));
    assert_eq!(mirrored[0].start_x, "1920");
    let members = fs::read_to_string(output.join("Year-Of-First-Obs/Aphelion/5/60.txt")).unwrap();
    assert_eq!(members, "A\nB\n");

    // Diagonal pairs are aggregated too.
    let diagonal = load_entries(&output.join("Aphelion/Aphelion/data.json"));
    assert_eq!(diagonal.len(), 1);
    assert_eq!((diagonal[0].x, diagonal[0].y), (60, 60));
}

#[tokio::test]
async fn every_pair_gets_a_data_file_and_metadata_is_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let root = utf8(&dir);
    let catalog = write_catalog(root, &["A,2.7,0.1,1960,2010,5.0,15.0"]);
    let output = root.join("out");

    let dimensions = build_dimensions();
    let names: Vec<String> = dimensions.iter().map(|d| d.name.clone()).collect();
    let pipeline = Pipeline::new(PipelineConfig::new(output.clone()), dimensions).unwrap();
    let mut reader = CsvCatalogReader::open(&catalog).unwrap();
    pipeline.run(&mut reader).await.unwrap();

    for row in &names {
        for column in &names {
            let data = output.join(row).join(column).join("data.json");
            assert!(data.exists(), "missing {data}");
        }
    }

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("dimensions.json")).unwrap()).unwrap();
    let listing = metadata.as_array().unwrap();
    assert_eq!(listing.len(), 8);
    assert_eq!(listing[0]["n"], "Aphelion");
    assert_eq!(listing[0]["grid"], 100);
    assert_eq!(listing[2]["n"], "Year-Of-First-Obs");
}

#[tokio::test]
async fn bin_zero_records_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let root = utf8(&dir);
    // First observed exactly in the baseline year 1915: bin 0, which must be
    // a valid coordinate, not an excluded one.
    let catalog = write_catalog(root, &["C,5.0,0.2,1915,1995,10.0,12.5"]);
    let output = root.join("out");

    let pipeline = Pipeline::new(PipelineConfig::new(output.clone()), build_dimensions()).unwrap();
    let mut reader = CsvCatalogReader::open(&catalog).unwrap();
    pipeline.run(&mut reader).await.unwrap();

    let entries = load_entries(&output.join("Aphelion/Year-Of-First-Obs/data.json"));
    assert_eq!(entries.len(), 1);
    assert_eq!((entries[0].x, entries[0].y), (60, 0));
    assert_eq!(entries[0].start_y, "1915");

    let members = fs::read_to_string(output.join("Aphelion/Year-Of-First-Obs/60/0.txt")).unwrap();
    assert_eq!(members, "C\n");
}

#[tokio::test]
async fn out_of_range_records_are_excluded_without_partial_updates() {
    let dir = tempfile::tempdir().unwrap();
    let root = utf8(&dir);
    // First observed before the baseline year: excluded from every pair with
    // Year-Of-First-Obs on either axis, still counted everywhere else.
    let catalog = write_catalog(root, &["D,5.0,0.2,1890,1995,10.0,12.5"]);
    let output = root.join("out");

    let pipeline = Pipeline::new(PipelineConfig::new(output.clone()), build_dimensions()).unwrap();
    let mut reader = CsvCatalogReader::open(&catalog).unwrap();
    let summary = pipeline.run(&mut reader).await.unwrap();
    assert_eq!(summary.records, 1);

    let excluded = load_entries(&output.join("Aphelion/Year-Of-First-Obs/data.json"));
    assert!(excluded.is_empty());
    let excluded = load_entries(&output.join("Year-Of-First-Obs/Aphelion/data.json"));
    assert!(excluded.is_empty());

    let counted = load_entries(&output.join("Aphelion/Year-Of-Last-Obs/data.json"));
    assert_eq!(counted.len(), 1);
    assert_eq!(counted[0].count, 1);
}
