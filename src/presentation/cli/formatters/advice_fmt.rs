use std::fmt::Write;

use colored::Colorize;

use crate::domain::advisors::Advisor;
use crate::domain::entities::report::{AdviceReport, ReportedAdvice};
use crate::domain::value_objects::time_window::epoch_to_datetime;

/// Strips escape characters so text read from dumps cannot drive the terminal.
fn sanitize_terminal(input: &str) -> String {
    input.chars().filter(|c| *c != '\x1b').collect()
}

fn format_epoch(secs: f64) -> String {
    epoch_to_datetime(secs).map_or_else(
        || format!("{secs}"),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

#[must_use]
pub fn format_advice(advice: &ReportedAdvice) -> String {
    let mut out = format!(
        "{} {}\n  {}",
        "●".yellow(),
        advice.name.bold(),
        sanitize_terminal(&advice.description)
    );
    if let Some(solution) = &advice.solution {
        let _ = write!(out, "\n  {} {}", "→".green(), solution.green());
    }
    if let Some(note) = &advice.note {
        let _ = write!(out, "\n  {}", note.dimmed());
    }
    out
}

/// Human-readable rendering of an advice report.
#[must_use]
pub fn format_report(report: &AdviceReport) -> String {
    let title = format!("Advice for {}", sanitize_terminal(&report.topology.name));
    let mut out = format!(
        "{}\n{}\n",
        title.bold().cyan(),
        "─".repeat(title.chars().count()).cyan()
    );

    match &report.window {
        Some(w) => {
            let _ = writeln!(
                out,
                "Window: {} → {}",
                format_epoch(w.start()),
                format_epoch(w.end())
            );
        }
        None => {
            let _ = writeln!(out, "{}", "Window: no cached records".dimmed());
        }
    }

    if report.advices.is_empty() {
        let _ = write!(out, "\n{}", "No advice for this window".green().bold());
        return out;
    }

    for advice in &report.advices {
        let _ = write!(out, "\n{}\n", format_advice(advice));
    }
    let _ = write!(out, "\n{} advice(s)", report.advices.len());
    out
}

/// Aligned table of registered advisors.
#[must_use]
pub fn format_advisor_list(advisors: &[Box<dyn Advisor>]) -> String {
    let header = format!("{:<20} {:<8} {}", "NAME", "ENABLED", "DESCRIPTION");
    let separator = "─".repeat(header.chars().count());
    let mut rows = vec![header.bold().to_string(), separator];
    for advisor in advisors {
        let enabled = if advisor.is_enabled() {
            format!("{:<8}", "yes").green()
        } else {
            format!("{:<8}", "no").dimmed()
        };
        rows.push(format!(
            "{:<20} {enabled} {}",
            advisor.name(),
            advisor.description()
        ));
    }
    rows.join("\n")
}
