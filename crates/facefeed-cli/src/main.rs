use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facefeed_stream::api::{self, ApiClient, TrainingRequest};
use facefeed_stream::{listener, spawn_listener, EventChannel};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::Config;
use session::{GallerySession, TerminalToasts};

#[derive(Parser)]
#[command(name = "facefeed", about = "Live face detection gallery client")]
struct Cli {
    /// TOML config file; FACEFEED_* variables override it
    #[arg(short, long, global = true, env = "FACEFEED_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the server's event stream and keep a live gallery
    Watch {
        /// Write the rendered gallery page here after every event
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
    /// Reconcile a recorded stream offline (one JSON payload per line)
    Replay {
        file: PathBuf,
        /// Write the final gallery page here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List known identities
    Identities,
    /// Show an image with its detected faces and matches
    Detail { id: u64 },
    /// Assign a detected face to a known identity
    Train {
        #[arg(long)]
        identity: u64,
        #[arg(long)]
        image: u64,
        #[arg(long)]
        face: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Watch { snapshot } => watch(&config, snapshot).await,
        Commands::Replay { file, out } => replay(&config, &file, out),
        Commands::Identities => {
            let client = api_client(&config)?;
            let mut toasts = toasts(&config);
            match client.identities().await {
                Ok(identities) if identities.is_empty() => println!("No identities"),
                Ok(identities) => {
                    for identity in identities {
                        println!("{:>6}  {}", identity.id, identity.name);
                    }
                }
                Err(err) => {
                    api::report_failure(&mut toasts, "Identities", &err);
                    return Err(err.into());
                }
            }
            Ok(())
        }
        Commands::Detail { id } => {
            let client = api_client(&config)?;
            let mut toasts = toasts(&config);
            let detail = match client.image_detail(id).await {
                Ok(detail) => detail,
                Err(err) => {
                    api::report_failure(&mut toasts, "Image details", &err);
                    return Err(err.into());
                }
            };
            let when = detail
                .timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            println!("image {}  source={}  {}  {}", detail.id, detail.source, detail.file_path, when);
            for face in detail.faces() {
                println!("  face {}  confidence={:.2}", face.id, face.confidence);
                for m in face.matches.as_deref().unwrap_or_default() {
                    println!(
                        "    match {} (#{})  confidence={:.2}",
                        m.identity.name, m.identity.id, m.confidence
                    );
                }
            }
            Ok(())
        }
        Commands::Train {
            identity,
            image,
            face,
        } => {
            let client = api_client(&config)?;
            let mut toasts = toasts(&config);
            let request = TrainingRequest {
                identity_id: identity,
                image_id: image,
                face_id: face,
            };
            let result = client.submit_training(&request).await;
            api::report(&mut toasts, "Training", &result, |message| message.clone());
            result.map(|_| ()).map_err(Into::into)
        }
    }
}

async fn watch(config: &Config, snapshot: Option<PathBuf>) -> Result<()> {
    let url = config.events_url()?;
    let http = reqwest::Client::builder()
        .connect_timeout(config.request_timeout)
        .build()
        .context("building http client")?;
    let channel = EventChannel::new(http, url).with_retry(config.reconnect);

    let mut session = GallerySession::new(config).with_snapshot(snapshot);
    let handle = spawn_listener(
        channel,
        move |payload: &str| {
            session.handle(payload);
        },
        listener::DEFAULT_BUFFER,
    );

    tracing::info!("facefeed watching; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("facefeed shutting down");

    handle.shutdown().await?;
    Ok(())
}

fn replay(config: &Config, file: &Path, out: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let mut session = GallerySession::new(config).with_snapshot(None);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        session.handle(line);
    }

    println!("{}", session.summary());
    if let Some(out) = out {
        session::write_atomic(&out, &session.page_html())
            .with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "gallery page written");
    }
    Ok(())
}

fn api_client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(config.server_url.clone(), config.request_timeout).context("building api client")
}

fn toasts(config: &Config) -> TerminalToasts {
    TerminalToasts {
        stack: facefeed_core::ToastStack::new(config.toast_ttl, config.toast_limit),
    }
}
