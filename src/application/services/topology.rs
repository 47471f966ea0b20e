use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::topology::{Application, TopologyDescription};

/// Read a topology description, as JSON when the file ends in `.json` and
/// as TOML otherwise, and build the deployment graph from it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it
/// describes an inconsistent topology.
pub fn load_topology(path: &Path) -> Result<Application> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let description = if is_json {
        serde_json::from_str::<TopologyDescription>(&content)
            .context("Failed to parse topology JSON")?
    } else {
        toml::from_str::<TopologyDescription>(&content).context("Failed to parse topology TOML")?
    };

    let app = description
        .build()
        .with_context(|| format!("Invalid topology in {}", path.display()))?;
    tracing::info!(
        application = app.name(),
        programs = app.catalog().programs().count(),
        "topology loaded"
    );
    Ok(app)
}
