//! Handlers for the measurement commands.
//!
//! Each handler builds fresh clients from the effective configuration, runs
//! one or more sequential measurements and prints them. Unit conversion for
//! display happens here; the analyzer only returns raw values.

use crate::analyzer::{
    KubeClusterState, MetricKind, PrometheusClient, Selector, UsageAnalyzer, UsageReport,
    WorkloadSelection,
};
use crate::cli::OutputFormat;
use crate::config::types::Config;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

type LiveAnalyzer = UsageAnalyzer<KubeClusterState, PrometheusClient>;

/// Handle the `statefulset` command.
pub async fn handle_statefulset(
    config: &Config,
    namespace: &str,
    name: &str,
    metric: MetricKind,
) -> Result<()> {
    let analyzer = connect(config).await?;
    let selection = WorkloadSelection::StatefulSet(name.to_string());

    let report = analyzer.measure(namespace, &selection, metric).await?;
    print_reports(&[report], config.output.format)
}

/// Handle the `pods` command.
pub async fn handle_pods(
    config: &Config,
    namespace: &str,
    selector: Selector,
    metric: MetricKind,
) -> Result<()> {
    let analyzer = connect(config).await?;
    let selection = WorkloadSelection::Selector(selector);

    let report = analyzer.measure(namespace, &selection, metric).await?;
    print_reports(&[report], config.output.format)
}

/// Handle the `report` command.
///
/// Measures the StatefulSet's CPU (when given), then CPU, memory and storage
/// of the selector's pods. The first failure aborts the whole report.
pub async fn handle_report(
    config: &Config,
    namespace: &str,
    selector: Selector,
    statefulset: Option<String>,
) -> Result<()> {
    let analyzer = connect(config).await?;
    let mut reports = Vec::new();

    if let Some(name) = statefulset {
        let selection = WorkloadSelection::StatefulSet(name);
        reports.push(
            analyzer
                .measure(namespace, &selection, MetricKind::Cpu)
                .await?,
        );
    }

    let selection = WorkloadSelection::Selector(selector);
    for metric in MetricKind::ALL {
        reports.push(analyzer.measure(namespace, &selection, metric).await?);
    }

    print_reports(&reports, config.output.format)
}

/// Build the analyzer from configuration.
///
/// The Prometheus client is built first so a bad URL is reported without
/// touching the cluster.
async fn connect(config: &Config) -> Result<LiveAnalyzer> {
    // Install rustls crypto provider (required for TLS connections to K8s API)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let prometheus = PrometheusClient::with_options(
        &config.prometheus.url,
        config.prometheus.auth.clone(),
        config.prometheus.timeout_secs,
    )?;

    let cluster = KubeClusterState::connect(&config.kubernetes).await?;
    Ok(UsageAnalyzer::new(cluster, prometheus))
}

fn print_reports(reports: &[UsageReport], format: OutputFormat) -> Result<()> {
    println!("{}", format_reports(reports, format)?);
    Ok(())
}

// ============================================================================
// Formatting
// ============================================================================

/// A report with its value converted for display.
#[derive(Debug, Serialize)]
struct RenderedReport<'a> {
    #[serde(flatten)]
    report: &'a UsageReport,
    unit: &'static str,
    display_value: f64,
    display_unit: &'static str,
}

impl<'a> From<&'a UsageReport> for RenderedReport<'a> {
    fn from(report: &'a UsageReport) -> Self {
        let (display_value, display_unit) = display_value(report.metric, report.value);
        Self {
            report,
            unit: report.metric.unit(),
            display_value,
            display_unit,
        }
    }
}

/// Convert a raw value into the unit shown to users.
pub fn display_value(metric: MetricKind, value: f64) -> (f64, &'static str) {
    match metric {
        MetricKind::Cpu => (value, "cores"),
        MetricKind::Memory | MetricKind::Storage => (value / BYTES_PER_MIB, "MiB"),
    }
}

/// Format reports to string.
pub fn format_reports(reports: &[UsageReport], format: OutputFormat) -> Result<String> {
    let rendered: Vec<RenderedReport> = reports.iter().map(RenderedReport::from).collect();

    match format {
        OutputFormat::Json if rendered.len() == 1 => {
            Ok(serde_json::to_string_pretty(&rendered[0])?)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rendered)?),
        OutputFormat::Table => Ok(rendered
            .iter()
            .map(format_table_row)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn format_table_row(rendered: &RenderedReport) -> String {
    let report = rendered.report;
    let mut output = format!(
        "{} {} {}: {} {}",
        report.metric.label().bright_white().bold(),
        report.workload.cyan(),
        format!("({})", report.namespace).dimmed(),
        format!("{:.4}", rendered.display_value).green().bold(),
        rendered.display_unit,
    );

    if report.pods.is_empty() {
        output.push_str(&format!("\n  {}", "no pods matched".yellow()));
    } else {
        output.push_str(&format!(
            "\n  {} pod(s) matched by {}",
            report.pods.len(),
            report.pattern.dimmed()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(metric: MetricKind, value: f64) -> UsageReport {
        UsageReport {
            namespace: "demo".to_string(),
            workload: "pods/app=mg-sh".to_string(),
            metric,
            pods: vec!["mg-sh-0".to_string(), "mg-sh-1".to_string()],
            pattern: "mg-sh-.*".to_string(),
            query: "sum(x)".to_string(),
            value,
        }
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(MetricKind::Cpu, 0.25), (0.25, "cores"));
        assert_eq!(
            display_value(MetricKind::Memory, 512.0 * 1024.0 * 1024.0),
            (512.0, "MiB")
        );
        assert_eq!(display_value(MetricKind::Storage, 0.0), (0.0, "MiB"));
    }

    #[test]
    fn test_json_single_report() {
        let output =
            format_reports(&[report(MetricKind::Memory, 2.0 * BYTES_PER_MIB)], OutputFormat::Json)
                .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["metric"], "memory");
        assert_eq!(json["pattern"], "mg-sh-.*");
        assert_eq!(json["value"], 2.0 * BYTES_PER_MIB);
        assert_eq!(json["unit"], "bytes");
        assert_eq!(json["display_value"], 2.0);
        assert_eq!(json["display_unit"], "MiB");
    }

    #[test]
    fn test_json_many_reports() {
        let reports = [report(MetricKind::Cpu, 1.5), report(MetricKind::Storage, 0.0)];
        let output = format_reports(&reports, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["display_unit"], "cores");
    }

    #[test]
    fn test_table_output() {
        let output = format_reports(&[report(MetricKind::Cpu, 0.125)], OutputFormat::Table).unwrap();
        assert!(output.contains("CPU usage"));
        assert!(output.contains("0.1250"));
        assert!(output.contains("cores"));
        assert!(output.contains("2 pod(s) matched"));
    }

    #[test]
    fn test_table_without_pods() {
        let mut empty = report(MetricKind::Memory, 0.0);
        empty.pods.clear();
        empty.pattern.clear();
        let output = format_reports(&[empty], OutputFormat::Table).unwrap();
        assert!(output.contains("no pods matched"));
    }
}
