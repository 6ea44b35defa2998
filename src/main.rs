use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use robowatch::data::duration::parse_duration;
use robowatch::{FileSource, Session, Settings, StreamSource, TelemetrySource};

#[derive(Parser, Debug)]
#[command(name = "robowatch")]
#[command(about = "Track link health and peripheral telemetry of a robot controller")]
#[command(group(ArgGroup::new("source").required(true).args(["connect", "replay"])))]
struct Args {
    /// Connect to the controller telemetry bridge (host:port)
    #[arg(short, long)]
    connect: Option<String>,

    /// Replay a recorded session file (newline-delimited JSON events)
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Settings file (TOML); ROBOWATCH_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this long (e.g., "30s", "500ms"); runs until Ctrl-C otherwise
    #[arg(long)]
    run_for: Option<String>,

    /// Export the final session state to a JSON file on exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robowatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let run_for = args.run_for.as_deref().map(parse_duration).transpose()?;

    let source: Box<dyn TelemetrySource> = if let Some(addr) = &args.connect {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        info!("Connected");
        Box::new(StreamSource::spawn(stream, addr))
    } else if let Some(path) = &args.replay {
        Box::new(FileSource::new(path))
    } else {
        anyhow::bail!("Either --connect or --replay is required");
    };

    let mut session = Session::new(source, settings);
    let shutdown = async move {
        match run_for {
            Some(limit) => {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };
    session.run(shutdown).await;

    let view = session.store().read(|s| s.connection.view());
    info!(
        "Final status {} ({}), {} peripherals",
        view.status.symbol(),
        view.mode.label(),
        session.store().read(|s| s.peripherals.len())
    );

    if let Some(export_path) = args.export {
        session.export_state(&export_path)?;
        println!("Exported session state to: {}", export_path.display());
    }

    Ok(())
}
