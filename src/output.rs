// src/output.rs - CSV report of one matching run

use std::fs;
use std::path::Path;
use csv::Writer;

use crate::errors::{GestureMatchError, Result};
use crate::pipeline::MatchReport;

/// Write the full match report to `<output_dir>/<name>.csv`: one row per
/// metric per pass, scores with their diagnostic timings, the fused
/// probability as a percentage (as the original report displayed it) and
/// the decision.
pub fn write_report_csv<P: AsRef<Path>>(
    report: &MatchReport,
    output_dir: P,
    name: &str,
) -> Result<()> {
    let output_path = output_dir.as_ref().join(format!("{}.csv", name));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(GestureMatchError::Io)?;
    }

    let mut writer = Writer::from_path(&output_path).map_err(GestureMatchError::CsvOutput)?;

    writer
        .write_record([
            "Pass",
            "Metric",
            "Horizontal_Score",
            "Horizontal_Time",
            "Vertical_Score",
            "Vertical_Time",
            "Wrist_Score",
            "Wrist_Time",
            "Fingers_Score",
            "Fingers_Time",
            "Probability_Percent",
            "Decision",
        ])
        .map_err(GestureMatchError::CsvOutput)?;

    for metric_report in &report.coarse {
        writer
            .write_record([
                "coarse".to_string(),
                metric_report.metric.name().to_string(),
                format!("{:.6}", metric_report.horizontal.score),
                format!("{:.6}", metric_report.horizontal.elapsed),
                format!("{:.6}", metric_report.vertical.score),
                format!("{:.6}", metric_report.vertical.elapsed),
                format!("{:.6}", metric_report.wrist.score),
                format!("{:.6}", metric_report.wrist.elapsed),
                format!("{:.6}", metric_report.fingers.score),
                format!("{:.6}", metric_report.fingers.elapsed),
                format!("{:.2}", metric_report.probability * 100.0),
                metric_report.decision.as_str().to_string(),
            ])
            .map_err(GestureMatchError::CsvOutput)?;
    }

    for metric_report in &report.fine {
        writer
            .write_record([
                "fine".to_string(),
                metric_report.metric.name().to_string(),
                String::new(),
                String::new(),
                format!("{:.6}", metric_report.vertical.score),
                format!("{:.6}", metric_report.vertical.elapsed),
                format!("{:.6}", metric_report.wrist.score),
                format!("{:.6}", metric_report.wrist.elapsed),
                format!("{:.6}", metric_report.fingers.score),
                format!("{:.6}", metric_report.fingers.elapsed),
                format!("{:.2}", metric_report.probability * 100.0),
                metric_report.decision.as_str().to_string(),
            ])
            .map_err(GestureMatchError::CsvOutput)?;
    }

    writer
        .flush()
        .map_err(|e| GestureMatchError::CsvOutput(csv::Error::from(e)))?;

    Ok(())
}
