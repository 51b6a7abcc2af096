use std::process::ExitCode;

use tracing::{debug, error, info, warn};

use podcast_fetch::{
    api::{ApiClient, ClientConfig},
    application::{load_items, DownloadOrchestrator, OrchestratorOptions, StagingStore},
    cli::{self, Cli},
    domain::{AppError, RunOutcome},
    logging,
};

#[tokio::main]
async fn main() -> ExitCode {
    cli::print_banner();

    let no_args = std::env::args_os().len() <= 1;
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            if !no_args {
                println!("Error: Invalid input");
                println!();
            }
            cli::print_usage();
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let store = StagingStore::new(&cli.output_dir);
    store.ensure().await?;

    let mut config = ClientConfig::default();
    if let Some(user_agent) = cli.user_agent {
        config.user_agent = user_agent;
    }
    let client = ApiClient::new(config).map_err(|source| AppError::FeedUnavailable {
        url: cli.feed_url.clone(),
        source,
    })?;

    let items = load_items(&client, &cli.feed_url).await?;

    let options = OrchestratorOptions {
        max_passes: cli
            .max_passes
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
    };
    let mut orchestrator = DownloadOrchestrator::new(client, store, items, options);
    let (outcome, report) = orchestrator.run().await?;

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "Could not serialize run report"),
        }
    }
    debug!(?report, "run finished");

    match outcome {
        RunOutcome::Completed {
            downloaded,
            skipped,
        } => {
            info!(
                "Done: {} downloaded, {} already present, {} pass(es)",
                downloaded, skipped, report.passes
            );
            Ok(())
        }
        RunOutcome::Stalled { pending } => Err(AppError::Stalled {
            pending: pending.into_iter().map(|item| item.title).collect(),
        }),
    }
}
