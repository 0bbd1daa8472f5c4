use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dashboard_core::{
    ApplyReport, FilterController, HttpDashboardApi, MultiSelectWidget, RegionOutcome, Sinks,
};
use shared::{
    domain::FilterState,
    error::{ApiException, ErrorCode},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod controls;
mod output;

use controls::{AvailableHospitals, FilterArgs};
use output::OutputView;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Filter the escalation dashboard and render its regions")]
struct Cli {
    /// Overrides the configured dashboard server.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Directory receiving table.html and the chart documents.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Print the cycle report as JSON.
    #[arg(long, global = true)]
    report: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the given filters.
    Apply(FilterArgs),
    /// Restore default filters with every hospital selected, then apply.
    Reset(AvailableHospitals),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(output_dir) = cli.output_dir {
        settings.output_dir = output_dir;
    }
    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create output directory '{}'",
                settings.output_dir.display()
            )
        })?;
    info!(
        server_url = %settings.server_url,
        output_dir = %settings.output_dir.display(),
        policy = ?settings.stale_policy,
        "dashboard: starting"
    );

    let api = HttpDashboardApi::new(&settings.server_url, settings.http_options())?;
    let view = Arc::new(OutputView::new(settings.output_dir.clone()));
    let controller = FilterController::new_with_sinks(Arc::new(api), Sinks::from_view(view.clone()))
        .with_policy(settings.stale_policy);

    let report = match cli.command {
        Command::Apply(args) => {
            let picker: Arc<dyn MultiSelectWidget> = Arc::new(args.picker());
            let controller = controller.with_hospital_widget(picker.clone());
            match args.hospital_action() {
                Some(press) => {
                    let mut changes = picker.subscribe();
                    press(picker.as_ref());
                    controller
                        .apply_next_hospital_change(&mut changes, &args)
                        .await
                        .context("hospital picker closed before its change was applied")?
                }
                None => {
                    let state = controller.read_state(&args);
                    controller.apply(&state).await
                }
            }
        }
        Command::Reset(available) => {
            let picker: Arc<dyn MultiSelectWidget> = Arc::new(available.picker(&[]));
            let mut state = FilterState::with_hospitals(picker.options());
            let controller = controller.with_hospital_widget(picker);
            controller.reset(&mut state).await
        }
    };

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    finish(&report, &view)
}

fn finish(report: &ApplyReport, view: &OutputView) -> Result<()> {
    if report.requires_reauth() || view.session_expired() {
        return Err(ApiException::new(
            ErrorCode::Unauthorized,
            "session expired; re-authenticate and set DASHBOARD_SESSION_COOKIE",
        )
        .into());
    }

    for (region, outcome) in [("table", &report.table), ("charts", &report.charts)] {
        if let RegionOutcome::Failed { error } = outcome {
            bail!("{region} failed to load: {}", error.message);
        }
    }

    info!(
        sequence = report.sequence,
        output_dir = %view.dir().display(),
        "dashboard: regions rendered"
    );
    Ok(())
}
