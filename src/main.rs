use clap::Parser;
use podmeter::{
    cli::{Cli, Commands},
    config::{self, types::Config},
    handlers,
};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> podmeter::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration, then let flags override it
    let mut config = config::load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    match cli.command {
        Commands::Statefulset {
            name,
            namespace,
            metric,
        } => handlers::handle_statefulset(&config, &namespace, &name, metric).await,
        Commands::Pods {
            selector,
            namespace,
            metric,
        } => handlers::handle_pods(&config, &namespace, selector, metric).await,
        Commands::Report {
            selector,
            namespace,
            statefulset,
        } => handlers::handle_report(&config, &namespace, selector, statefulset).await,
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.kubeconfig {
        config.kubernetes.kubeconfig = Some(path.clone());
    }
    if let Some(context) = &cli.context {
        config.kubernetes.context = Some(context.clone());
    }
    if let Some(url) = &cli.prometheus {
        config.prometheus.url = url.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
}
