use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use labhub::server::run_rest_server;
use labhub::shared::logging::init_logging;
use labhub::shared::models::{EventKind, ProgressEvent};
use labhub::shared::state::initialize_app_state;
use labhub::shared::{HubConfig, RuntimeKind};

#[derive(Parser)]
#[command(name = "labhub")]
#[command(about = "Lab Hub - one lab environment at a time", long_about = None)]
struct Cli {
    /// Lab registry file (JSON, or YAML by extension)
    #[arg(long, global = true, env = "LABHUB_REGISTRY")]
    registry: Option<PathBuf>,

    /// Container runtime backend (docker or memory)
    #[arg(long, global = true, env = "LABHUB_RUNTIME")]
    runtime: Option<RuntimeKind>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API server (default command)
    Serve {
        /// Host for API server
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port for API server
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List registered labs and whether each is running
    List,

    /// Stop every other lab, then start this one and wait until it is ready
    Start {
        #[arg(value_name = "LAB_ID")]
        lab_id: String,
    },

    /// Stop all running labs
    Stop,

    /// Show the running lab, if any
    Status,
}

fn print_event(event: &ProgressEvent) {
    match event.kind {
        EventKind::Step => println!("  {}", event.message),
        EventKind::Error => eprintln!("✗ {}", event.message),
        EventKind::Done => {
            println!("✓ {}", event.message);
            if let Some(url) = &event.launch_url {
                println!("  Open: {url}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HubConfig::from_env()?;
    if let Some(registry) = cli.registry {
        config.registry_path = registry;
    }
    if let Some(runtime) = cli.runtime {
        config.runtime = runtime;
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    // Only the server logs to the console; CLI commands keep stdout for output.
    let serving = matches!(command, Commands::Serve { .. });
    let _ = init_logging(&config.log_dir, "labhub", serving);

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_rest_server(config).await?;
        }
        Commands::List => {
            let state = initialize_app_state(&config).await?;
            let labs = state.orchestrator.list_labs().await?;
            if labs.is_empty() {
                println!("No labs registered in {}", config.registry_path.display());
            }
            for lab in labs {
                let marker = if lab.running { "●" } else { "○" };
                println!("{marker} {:<16} {}", lab.spec.id, lab.spec.title);
                println!("    {}", lab.spec.launch_url);
            }
        }
        Commands::Start { lab_id } => {
            let state = initialize_app_state(&config).await?;
            let result = state
                .orchestrator
                .activate_with(&lab_id, Some(print_event))
                .await;
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Stop => {
            let state = initialize_app_state(&config).await?;
            let result = state
                .orchestrator
                .deactivate_all_with(Some(print_event))
                .await;
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            let state = initialize_app_state(&config).await?;
            let catalog = state.orchestrator.catalog()?;
            match state.orchestrator.running_lab_in(&catalog).await? {
                Some(lab_id) => {
                    let url = catalog
                        .find(&lab_id)
                        .map(|lab| lab.launch_url.as_str())
                        .unwrap_or_default();
                    println!("Running: {lab_id} ({url})");
                }
                None => println!("No lab is running."),
            }
        }
    }

    Ok(())
}
