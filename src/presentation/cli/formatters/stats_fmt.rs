use colored::Colorize;

use crate::domain::entities::record::MetricValue;
use crate::domain::entities::statistics::MetricStatistics;
use crate::infrastructure::import::ImportSummary;

fn section_header(title: &str) -> String {
    format!(
        "{}\n{}",
        title.bold().cyan(),
        "─".repeat(title.chars().count()).cyan()
    )
}

/// Statistics of one metric as an aligned key/value block.
#[must_use]
pub fn format_statistics(name: &str, stats: Option<&MetricStatistics>) -> String {
    let header = section_header(&format!("Statistics for {name}"));
    let Some(s) = stats else {
        return format!("{header}\n{}", "No numeric data".dimmed());
    };
    let rows = [
        ("count", s.count.to_string()),
        ("min", format!("{:.4}", s.min)),
        ("max", format!("{:.4}", s.max)),
        ("avg", format!("{:.4}", s.avg)),
        ("sum", format!("{:.4}", s.sum)),
        ("sum of squares", format!("{:.4}", s.sum_of_squares)),
        ("variance", format!("{:.4}", s.variance)),
        ("std deviation", format!("{:.4}", s.std_deviation)),
    ];
    let body: Vec<String> = rows
        .iter()
        .map(|(label, value)| format!("  {label:<15} {value:>16}"))
        .collect();
    format!("{header}\n{}", body.join("\n"))
}

#[must_use]
pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut line = format!(
        "{} metric(s) in {} record(s) imported",
        summary.metrics_inserted.to_string().bold(),
        summary.records_inserted
    );
    if summary.pairs_skipped > 0 || summary.objects_skipped > 0 {
        line.push_str(
            &format!(
                ", {} pair(s) and {} object(s) skipped",
                summary.pairs_skipped, summary.objects_skipped
            )
            .yellow()
            .to_string(),
        );
    }
    line
}

/// One value per line; text values are quoted.
#[must_use]
pub fn format_values(values: &[MetricValue]) -> String {
    values
        .iter()
        .map(|v| match v {
            MetricValue::Numeric(n) => n.to_string(),
            MetricValue::Text(t) => format!("{t:?}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
