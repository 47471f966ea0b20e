use std::path::Path;

use anyhow::Context;

use crate::application::services::advise::AdviseService;
use crate::domain::advisors::AdvisorEngine;
use crate::domain::topology::Application;
use crate::presentation::cli::formatters::advice_fmt::{format_advisor_list, format_report};

/// Options of one `advise` invocation.
#[derive(Debug, Default)]
pub struct AdviseOptions<'a> {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub output: Option<&'a Path>,
    pub json: bool,
}

/// Run the advisors and emit the report.
///
/// The JSON report goes to `output` when given; stdout gets the text
/// rendering, or the JSON report with `json`.
///
/// # Errors
///
/// Returns an error if the window is invalid, an advisor run aborts, or the
/// report cannot be written.
pub fn run_advise(
    service: &AdviseService<'_>,
    topology: &Application,
    options: &AdviseOptions<'_>,
) -> anyhow::Result<()> {
    let window = service.resolve_window(options.from, options.to)?;
    let report = service.run(topology, window)?;
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = options.output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "advice report written");
    }

    if options.json {
        println!("{json}");
    } else {
        println!("{}", format_report(&report));
    }
    Ok(())
}

pub fn run_list_advisors(engine: &AdvisorEngine) {
    println!("{}", format_advisor_list(engine.advisors()));
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::advisors::default_advisors;
    use crate::domain::entities::report::AdviceReport;
    use crate::domain::value_objects::AdvisorSettings;
    use crate::infrastructure::persistence::sqlite_store::SqliteStore;

    #[test]
    fn report_file_is_valid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("report.json");
        let store = SqliteStore::open_in_memory().expect("store");
        let engine = AdvisorEngine::new(default_advisors(&AdvisorSettings::default()), true);
        let service = AdviseService::new(&store, &engine);
        let app = Application::new("empty");

        let options = AdviseOptions {
            output: Some(&output),
            ..AdviseOptions::default()
        };
        run_advise(&service, &app, &options).expect("advise");

        let content = std::fs::read_to_string(&output).expect("read");
        let report: AdviceReport = serde_json::from_str(&content).expect("parse");
        assert!(report.advices.is_empty());
        assert!(report.window.is_none());
    }

    #[test]
    fn inverted_window_fails() {
        let store = SqliteStore::open_in_memory().expect("store");
        let engine = AdvisorEngine::new(Vec::new(), true);
        let service = AdviseService::new(&store, &engine);
        let options = AdviseOptions {
            from: Some(5.0),
            to: Some(1.0),
            ..AdviseOptions::default()
        };
        assert!(run_advise(&service, &Application::new("x"), &options).is_err());
    }
}
