use crate::analyzer::query::MetricKind;
use crate::analyzer::workload::{Selector, parse_selector};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "podmeter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report the current resource usage of a Kubernetes workload")]
#[command(
    long_about = "Resolves the pods behind a StatefulSet or label selector, builds a compact pod matcher and asks Prometheus for the workload's current CPU, memory or storage usage."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (default: ~/.podmeter.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the kubeconfig file
    #[arg(long, global = true, value_name = "FILE", env = "PODMETER_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true, value_name = "NAME")]
    pub context: Option<String>,

    /// Prometheus base URL
    #[arg(long, global = true, value_name = "URL", env = "PODMETER_PROMETHEUS_URL")]
    pub prometheus: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure the pods owned by a StatefulSet
    Statefulset {
        /// StatefulSet name
        #[arg(value_name = "NAME")]
        name: String,

        /// Namespace of the StatefulSet
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Metric to measure
        #[arg(short, long, value_enum, default_value = "cpu")]
        metric: MetricKind,
    },

    /// Measure the pods matching a label selector
    Pods {
        /// Label selector (key=value[,key=value...])
        #[arg(short = 'l', long, value_name = "SELECTOR", value_parser = parse_selector_arg)]
        selector: Selector,

        /// Namespace of the pods
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Metric to measure
        #[arg(short, long, value_enum, default_value = "cpu")]
        metric: MetricKind,
    },

    /// Measure CPU, memory and storage of a selector's pods in one run
    Report {
        /// Label selector (key=value[,key=value...])
        #[arg(short = 'l', long, value_name = "SELECTOR", value_parser = parse_selector_arg)]
        selector: Selector,

        /// Namespace of the pods
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Also measure the CPU of this StatefulSet
        #[arg(long, value_name = "NAME")]
        statefulset: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_selector_arg(s: &str) -> Result<Selector, String> {
    parse_selector(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
