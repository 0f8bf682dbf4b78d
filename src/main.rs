use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use openconvert::cli::Cli;
use openconvert::client::OpenConvertClient;
use openconvert::config::Settings;
use openconvert::domain::BatchStatus;
use openconvert::formats;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // -v / -q adjust the default filter; RUST_LOG still wins when set.
    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "openconvert=debug"
    } else {
        "openconvert=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::new_with_cli(&cli)?;

    // Ctrl-C aborts the in-flight wait at the next poll tick.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested");
                cancel.cancel();
            }
        });
    }

    if cli.list_formats {
        return list_formats(settings, cancel).await;
    }

    let jobs = cli.collect_jobs()?;
    tracing::info!("found {} file(s) to process", jobs.len());

    let mut client = OpenConvertClient::new(settings, cancel);
    client.connect().await?;
    let result = client.convert_all(&jobs).await;
    client.disconnect().await;
    let report = result?;

    for outcome in &report.outcomes {
        match &outcome.outcome {
            Ok(()) => println!("converted {} -> {}", outcome.input.display(), outcome.output.display()),
            Err(e) => println!("FAILED    {}: {}", outcome.input.display(), e),
        }
    }

    Ok(match report.status() {
        BatchStatus::AllConverted => {
            println!(
                "all {} file(s) converted successfully",
                report.outcomes.len()
            );
            ExitCode::SUCCESS
        }
        BatchStatus::Partial => {
            println!(
                "{}/{} file(s) converted successfully",
                report.succeeded(),
                report.outcomes.len()
            );
            ExitCode::SUCCESS
        }
        BatchStatus::NoneConverted => {
            println!("no files were converted successfully");
            ExitCode::FAILURE
        }
    })
}

async fn list_formats(settings: Settings, cancel: CancellationToken) -> anyhow::Result<ExitCode> {
    println!("discovering available conversion formats...");

    let mut client = OpenConvertClient::new(settings, cancel);
    client.connect().await?;
    let result = client.list_available_conversions().await;
    client.disconnect().await;
    let available = result?;

    if available.is_empty() {
        println!("no conversion agents found");
        return Ok(ExitCode::FAILURE);
    }

    println!("\nAvailable conversions:");
    println!("{}", "=".repeat(60));
    let mut current_source = "";
    let mut agents = std::collections::BTreeSet::new();
    for conversion in &available {
        if conversion.source != current_source {
            current_source = &conversion.source;
            println!(
                "\n{} ({})",
                formats::friendly_name(&conversion.source),
                conversion.source
            );
        }
        println!(
            "  -> {} ({})",
            formats::friendly_name(&conversion.target),
            conversion.target
        );
        println!("     agents: {}", conversion.agents.join(", "));
        agents.extend(conversion.agents.iter().cloned());
    }
    println!(
        "\n{} conversion(s) available from {} agent(s)",
        available.len(),
        agents.len()
    );

    Ok(ExitCode::SUCCESS)
}
