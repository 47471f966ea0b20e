#![allow(clippy::expect_used)]

use std::io::BufReader;

use rankscope::application::services::import::ImportService;
use rankscope::domain::entities::record::{MetricSample, MetricValue};
use rankscope::domain::ports::sink::MetricSink;
use rankscope::domain::ports::store::{AdvisorQueries, MetricCondition, MetricStore};
use rankscope::domain::value_objects::TimeWindow;
use rankscope::infrastructure::import::import_reader;
use rankscope::infrastructure::persistence::sqlite_store::SqliteStore;
use rankscope::infrastructure::sinks::file::FileSink;

// ---------------------------------------------------------------------------
// Fixture loader
// ---------------------------------------------------------------------------

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn imported_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("store");
    ImportService::new(&store, false)
        .import_files(&[fixture_path("wordcount.metrics")])
        .expect("import fixture");
    store
}

// ---------------------------------------------------------------------------
// Import completeness
// ---------------------------------------------------------------------------

#[test]
fn fixture_import_counts() {
    let store = SqliteStore::open_in_memory().expect("store");
    let summary = ImportService::new(&store, false)
        .import_files(&[fixture_path("wordcount.metrics")])
        .expect("import");

    assert_eq!(summary.records_inserted, 8);
    assert_eq!(summary.metrics_inserted, 27);
    assert_eq!(summary.pairs_skipped, 1);
    assert_eq!(summary.objects_skipped, 0);
}

#[test]
fn reimporting_the_same_dump_stores_nothing_new() {
    let store = imported_store();
    let summary = ImportService::new(&store, false)
        .import_files(&[fixture_path("wordcount.metrics")])
        .expect("second import");

    assert_eq!(summary.records_inserted, 0);
    assert_eq!(summary.metrics_inserted, 0);
    assert_eq!(summary.objects_skipped, 8);
    assert_eq!(
        store.metric_values("ProgramDuration", None).expect("values").len(),
        3
    );
}

#[test]
fn metric_names_are_distinct_and_sorted() {
    let store = imported_store();
    let names = store.metric_names().expect("names");
    assert_eq!(
        names,
        vec![
            "GarbageCollectionTime",
            "GlobalRank",
            "HeapMemoryMax",
            "HeapMemoryUsed",
            "Label",
            "ProgramDuration",
            "SendReceiveDuration",
            "StartTimestamp",
        ]
    );
}

// ---------------------------------------------------------------------------
// Query surface
// ---------------------------------------------------------------------------

#[test]
fn values_filtered_by_sibling_metric_and_header() {
    let store = imported_store();

    let rank_two: MetricCondition = "GlobalRank=2".parse().expect("condition");
    let durations = store
        .metric_values("ProgramDuration", Some(&rank_two))
        .expect("values");
    assert_eq!(durations, vec![MetricValue::Numeric(50.0)]);

    let host: MetricCondition = "hostname=10.0.0.2".parse().expect("condition");
    let gc = store
        .metric_values("GarbageCollectionTime", Some(&host))
        .expect("values");
    assert_eq!(gc, vec![MetricValue::Numeric(1.0)]);

    let labels = store.metric_values("Label", None).expect("labels");
    assert_eq!(labels, vec![MetricValue::Text("mapper-0".into())]);
}

#[test]
fn statistics_over_window() {
    let store = imported_store();

    let all = store
        .statistics("HeapMemoryUsed", None)
        .expect("stats")
        .expect("data");
    assert_eq!(all.count, 4);
    assert!((all.sum - 1000.0).abs() < 1e-9);
    assert!((all.avg - 250.0).abs() < 1e-9);
    assert!((all.variance - 12_500.0).abs() < 1e-6);

    let window = TimeWindow::new(1010.0, 1020.0).expect("window");
    let part = store
        .statistics("HeapMemoryUsed", Some(&window))
        .expect("stats")
        .expect("data");
    assert_eq!(part.count, 2);
    assert!((part.min - 200.0).abs() < 1e-9);
    assert!((part.max - 300.0).abs() < 1e-9);

    let empty = TimeWindow::new(0.0, 1.0).expect("window");
    assert!(
        store
            .statistics("HeapMemoryUsed", Some(&empty))
            .expect("stats")
            .is_none()
    );
}

#[test]
fn time_bounds_span_the_dump() {
    let store = imported_store();
    let bounds = store.time_bounds().expect("bounds").expect("non-empty");
    assert!((bounds.start() - 1000.0).abs() < f64::EPSILON);
    assert!((bounds.end() - 1030.0).abs() < f64::EPSILON);
}

#[test]
fn clear_empties_the_cache() {
    let store = imported_store();
    assert_eq!(store.clear().expect("clear"), 8);
    assert!(store.metric_names().expect("names").is_empty());
    assert!(store.time_bounds().expect("bounds").is_none());
}

// ---------------------------------------------------------------------------
// File sink output is importable
// ---------------------------------------------------------------------------

#[test]
fn file_sink_output_round_trips_through_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sink.metrics");
    let sink = FileSink::new(path.to_str().expect("utf8"));
    sink.send(
        &MetricSample::new(5.0, Some("DataTransfer"), "n1")
            .with("GlobalRank", MetricValue::Numeric(3.0))
            .with("SendReceiveDuration", MetricValue::Numeric(0.5)),
    )
    .expect("send");

    let store = SqliteStore::open_in_memory().expect("store");
    let mut importer = store.importer().expect("importer");
    let file = std::fs::File::open(&path).expect("open");
    let summary = import_reader(BufReader::new(file), &mut importer).expect("import");
    importer.finish().expect("finish");

    assert_eq!(summary.records_inserted, 1);
    assert_eq!(summary.metrics_inserted, 2);
}
