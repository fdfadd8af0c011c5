use anyhow::Context;
use clap::{Parser, Subcommand};
use deckhand_app_core::DomainEvent;
use deckhand_cli::{commands, connect, ConnectArgs};
use deckhand_core::{ContainerAction, ContainerId};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    connect: ConnectArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List containers
    #[command(alias = "ps")]
    Containers,
    /// Show one container
    Inspect { id: ContainerId },
    Start { id: ContainerId },
    Stop { id: ContainerId },
    Restart { id: ContainerId },
    #[command(alias = "rm")]
    Delete { id: ContainerId },
    /// Deploy a compose file under a project name
    Compose {
        name: String,
        file: std::path::PathBuf,
    },
    /// Show host information
    Info,
    /// List swarm services
    Services,
    /// Follow a container's log stream until Ctrl-C
    Logs { id: ContainerId },
    /// Follow container events (and optionally stats) until Ctrl-C
    Watch {
        #[arg(long, value_delimiter = ',')]
        stats: Vec<ContainerId>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("default subscriber")?;

    let mut kernel = connect(&cli.connect).await?;

    let outcome = match cli.command {
        Commands::Containers => {
            let list = commands::list_containers(&mut kernel).await?;
            print_json(&list)
        }
        Commands::Inspect { id } => print_json(&commands::inspect(&mut kernel, &id).await?),
        Commands::Start { id } => {
            print_json(&commands::act(&mut kernel, ContainerAction::Start, &id).await?)
        }
        Commands::Stop { id } => {
            print_json(&commands::act(&mut kernel, ContainerAction::Stop, &id).await?)
        }
        Commands::Restart { id } => {
            print_json(&commands::act(&mut kernel, ContainerAction::Restart, &id).await?)
        }
        Commands::Delete { id } => {
            print_json(&commands::act(&mut kernel, ContainerAction::Delete, &id).await?)
        }
        Commands::Compose { name, file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            print_json(&commands::compose(&mut kernel, &name, content).await?)
        }
        Commands::Info => print_json(&commands::host_info(&mut kernel).await?),
        Commands::Services => print_json(&commands::list_services(&mut kernel).await?),
        Commands::Logs { id } => {
            commands::tail_logs(&mut kernel, &id, ctrl_c(), |line| println!("{line}")).await
        }
        Commands::Watch { stats } => {
            commands::watch(&mut kernel, &stats, ctrl_c(), |ev| match ev {
                DomainEvent::BusOpened => eprintln!(":: bus open"),
                DomainEvent::BusClosed => eprintln!(":: bus closed"),
                DomainEvent::FetchContainersSucceeded(list) => {
                    println!(
                        "{}",
                        serde_json::json!({ "containers": list.len() })
                    );
                }
                DomainEvent::AddStat(stat) => println!("{stat}"),
                DomainEvent::AddLog(line) => println!("{line}"),
                _ => {}
            })
            .await
        }
    };

    kernel.shutdown().await;
    outcome
}
