//! prerender-cluster - Entry point
//!
//! Resolves configuration, bootstraps the rendering service, and starts it.

use anyhow::Context;
use tracing::{debug, error};

use prerender_cluster::{resolve_config, Bootstrapper, DryRunFactory, ProcessRole, SingleProcess};
use prerender_cluster_config::{CliSource, ConfigError, EnvSnapshot, ValidationError};
use prerender_cluster_telemetry::{init_logging, LogConfig};

fn main() {
    // .env values must be visible to the snapshot below
    let dotenv = dotenvy::dotenv();
    let snapshot = EnvSnapshot::capture();
    let role = ProcessRole::from_env(&snapshot);

    if let Err(e) = init_logging(&LogConfig::from_env("info")) {
        eprintln!("{e}");
    }
    if let Ok(path) = &dotenv {
        debug!(path = %path.display(), "loaded .env file");
    }

    let cli = match CliSource::from_env() {
        Ok(cli) => cli,
        Err(ConfigError::Usage(e)) => e.exit(),
        Err(ConfigError::Validation(e)) => {
            report_invalid_argument(&e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, snapshot, role) {
        error!(role = %role, "{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &CliSource, snapshot: EnvSnapshot, role: ProcessRole) -> anyhow::Result<()> {
    if cli.print_config {
        let config = resolve_config(cli, &snapshot, role);
        let json =
            serde_json::to_string_pretty(&config).context("failed to render configuration")?;
        println!("{json}");
        return Ok(());
    }

    let mut bootstrapper =
        Bootstrapper::new(DryRunFactory::new(), SingleProcess::new(role)).with_snapshot(snapshot);
    let handle = bootstrapper.bootstrap(cli).context("bootstrap failed")?;
    handle
        .start()
        .context("rendering service stopped with an error")
}

fn report_invalid_argument(e: &ValidationError) {
    eprintln!(
        "error: invalid value '{}' for '{}': {}",
        e.supplied_value, e.field, e.reason
    );
    eprintln!();
    eprintln!("  {}", e.remediation);
    eprintln!();
    eprintln!("For more information, try '--help'.");
}
