#![allow(clippy::expect_used)]

use rankscope::application::config::AppConfig;
use rankscope::application::services::advise::AdviseService;
use rankscope::application::services::import::ImportService;
use rankscope::application::services::topology::load_topology;
use rankscope::domain::advisors::{AdvisorEngine, default_advisors};
use rankscope::domain::entities::advice::{AdviceArgument, EntityKind};
use rankscope::domain::entities::report::AdviceReport;
use rankscope::domain::topology::Application;
use rankscope::domain::value_objects::{AdvisorSettings, TimeWindow};
use rankscope::infrastructure::persistence::sqlite_store::SqliteStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn setup() -> (SqliteStore, Application) {
    let store = SqliteStore::open_in_memory().expect("store");
    ImportService::new(&store, false)
        .import_files(&[fixture_path("wordcount.metrics")])
        .expect("import fixture");
    let app = load_topology(&fixture_path("wordcount.toml")).expect("topology");
    (store, app)
}

fn advise(config: &AppConfig, window: Option<TimeWindow>) -> AdviceReport {
    let (store, app) = setup();
    let settings = AdvisorSettings::from(&config.advisors);
    let engine = AdvisorEngine::new(
        default_advisors(&settings),
        config.advisors.abort_on_failure,
    );
    AdviseService::new(&store, &engine)
        .run(&app, window)
        .expect("advise")
}

fn descriptions(report: &AdviceReport, name: &str) -> Vec<String> {
    report
        .advices
        .iter()
        .filter(|a| a.name == name)
        .map(|a| a.description.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// End-to-end runs
// ---------------------------------------------------------------------------

#[test]
fn default_run_emits_advice_in_registration_order() {
    let report = advise(&AppConfig::default(), None);

    let names: Vec<&str> = report.advices.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Execution times",
            "Execution times",
            "Data transfer overhead",
            "Garbage collection performance",
            "Garbage collection performance",
            "Out of memory prediction",
        ]
    );
    assert_eq!(report.window, TimeWindow::new(1000.0, 1030.0));
    assert_eq!(report.topology.name, "wordcount");
}

#[test]
fn execution_times_per_program() {
    let report = advise(&AppConfig::default(), None);
    let text = descriptions(&report, "Execution times");
    assert!(text[0].starts_with("Program mapper ran 2 times for 200.00 s"));
    assert!(text[1].starts_with("Program reducer ran 1 times for 50.00 s"));
}

#[test]
fn data_transfer_ratio_of_the_receiver() {
    let report = advise(&AppConfig::default(), None);
    let text = descriptions(&report, "Data transfer overhead");
    assert_eq!(text.len(), 1);
    assert!(text[0].contains("reducer"));
    assert!(text[0].contains("20.00%"));
}

#[test]
fn garbage_collection_threshold_filters_programs() {
    let mut config = AppConfig::default();
    let report = advise(&config, None);
    let text = descriptions(&report, "Garbage collection performance");
    assert!(text[0].contains("mapper") && text[0].contains("3.00%"));
    assert!(text[1].contains("reducer") && text[1].contains("0.00%"));

    config.advisors.garbage_collection.ratio_threshold = 0.02;
    let report = advise(&config, None);
    assert_eq!(descriptions(&report, "Garbage collection performance").len(), 1);

    config.advisors.garbage_collection.ratio_threshold = 0.031;
    let report = advise(&config, None);
    assert!(descriptions(&report, "Garbage collection performance").is_empty());
}

#[test]
fn heap_exhaustion_is_predicted() {
    let report = advise(&AppConfig::default(), None);
    let text = descriptions(&report, "Out of memory prediction");
    assert_eq!(text.len(), 1);
    assert_eq!(
        text[0],
        "Heap memory of program mapper grows by 10.00 B/s and is predicted to reach its limit \
         of 1000 B at 1970-01-01T00:18:10Z, 90.00 s after the start of the window"
    );
}

#[test]
fn disabled_advisors_do_not_run() {
    let mut config = AppConfig::default();
    config.advisors.execution_times.enabled = false;
    config.advisors.out_of_memory.enabled = false;
    let report = advise(&config, None);
    assert!(descriptions(&report, "Execution times").is_empty());
    assert!(descriptions(&report, "Out of memory prediction").is_empty());
    assert!(!descriptions(&report, "Garbage collection performance").is_empty());
}

#[test]
fn narrow_window_limits_the_data() {
    let window = TimeWindow::new(1000.0, 1020.0);
    let report = advise(&AppConfig::default(), window);
    assert_eq!(report.window, window);
    assert!(descriptions(&report, "Execution times").is_empty());
    assert_eq!(descriptions(&report, "Out of memory prediction").len(), 1);
}

#[test]
fn advice_keeps_entity_references() {
    let report = advise(&AppConfig::default(), None);
    let program = report.topology.programs.iter().find(|p| p.name == "reducer");
    let program = program.expect("reducer in snapshot");

    let transfer = report
        .advices
        .iter()
        .find(|a| a.name == "Data transfer overhead")
        .expect("advice");
    let entity = transfer
        .arguments
        .iter()
        .find_map(|arg| match arg {
            AdviceArgument::Entity { entity } => Some(entity),
            _ => None,
        })
        .expect("entity argument");
    assert_eq!(entity.kind, EntityKind::Program);
    assert_eq!(entity.id, program.id);
}

#[test]
fn unknown_rank_aborts_or_is_skipped() {
    let store = SqliteStore::open_in_memory().expect("store");
    ImportService::new(&store, false)
        .import_files(&[fixture_path("wordcount.metrics")])
        .expect("import");
    // Rank 2 is missing from this topology
    let mut app = Application::new("partial");
    let mapper = app.add_program("mapper");
    app.add_instance(mapper, 0).expect("rank 0");
    app.add_instance(mapper, 1).expect("rank 1");

    let settings = AdvisorSettings::default();
    let aborting = AdvisorEngine::new(default_advisors(&settings), true);
    assert!(AdviseService::new(&store, &aborting).run(&app, None).is_err());

    let lenient = AdvisorEngine::new(default_advisors(&settings), false);
    let report = AdviseService::new(&store, &lenient)
        .run(&app, None)
        .expect("lenient run");
    let names: Vec<&str> = report.advices.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Out of memory prediction"]);
}

#[test]
fn report_serializes_to_json() {
    let report = advise(&AppConfig::default(), None);
    let json = serde_json::to_string(&report).expect("serialize");
    let back: AdviceReport = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.advices.len(), report.advices.len());
}
