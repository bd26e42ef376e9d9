use anyhow::{bail, Context, Result};
use capture_recorder::{
    create_router, AppState, ArtifactStore, Config, EventForwarder, PcmCaptureHost,
    PcmEncoderFactory, PermissionNegotiator, RecorderCallbacks, RecorderEvent,
    RecordingController,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capture-recorder")]
#[command(about = "Capture a media stream and record it to an artifact")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/capture-recorder")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record for a fixed duration and save the artifact
    Record {
        /// Duration to record in seconds
        #[arg(short, long, default_value = "5")]
        duration: f64,

        /// Pause after this many seconds
        #[arg(long)]
        pause_at: Option<f64>,

        /// Resume after this many seconds (requires --pause-at)
        #[arg(long)]
        resume_at: Option<f64>,

        /// Audio file to serve as the capture source
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output file (default: <recordings_path>/<session>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the HTTP control API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load_or_default(&cli.config)?;

    info!("capture-recorder v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Record {
            duration,
            pause_at,
            resume_at,
            source,
            output,
        } => {
            if source.is_some() {
                cfg.host.source_path = source;
            }
            record(cfg, duration, pause_at, resume_at, output).await
        }
        Command::Serve => serve(cfg).await,
    }
}

/// Build a controller over the PCM host and run the permission request
async fn open_session(
    cfg: &Config,
    callbacks: Arc<dyn RecorderCallbacks>,
) -> Result<Arc<RecordingController>> {
    let host = Arc::new(PcmCaptureHost::new(cfg.host.clone()));
    let negotiator = PermissionNegotiator::new(host)
        .allow_insecure_origin(cfg.permission.allow_insecure_origin);

    let controller = Arc::new(RecordingController::new(
        Arc::new(PcmEncoderFactory),
        cfg.recorder.clone(),
        callbacks,
    ));

    controller.open(&negotiator, &cfg.constraints).await;

    let status = controller.status();
    info!("Session {} opened: {:?}", controller.session_id(), status.state);
    Ok(controller)
}

async fn record(
    cfg: Config,
    duration: f64,
    pause_at: Option<f64>,
    resume_at: Option<f64>,
    output: Option<PathBuf>,
) -> Result<()> {
    if resume_at.is_some() && pause_at.is_none() {
        bail!("--resume-at requires --pause-at");
    }
    for (flag, value) in [
        ("--duration", Some(duration)),
        ("--pause-at", pause_at),
        ("--resume-at", resume_at),
    ] {
        if let Some(seconds) = value {
            validate_seconds(flag, seconds)?;
        }
    }

    let (forwarder, mut events) = EventForwarder::new();
    let controller = open_session(&cfg, Arc::new(forwarder)).await?;

    if !controller.status().available {
        while let Ok(event) = events.try_recv() {
            match event {
                RecorderEvent::Denied(e) => error!("Permission denied: {}", e),
                RecorderEvent::Error(e) => error!("{}", e),
                _ => {}
            }
        }
        bail!("Recorder is not available");
    }

    info!("Recording for {:.1} seconds", duration);
    controller.start();

    let mut elapsed = 0.0;
    let mut wait_until = |target: f64| {
        let delta = (target - elapsed).max(0.0);
        elapsed = target.max(elapsed);
        sleep(Duration::from_secs_f64(delta))
    };

    if let Some(pause_at) = pause_at.filter(|t| *t < duration) {
        wait_until(pause_at).await;
        controller.pause();

        if let Some(resume_at) = resume_at.filter(|t| *t < duration) {
            wait_until(resume_at).await;
            controller.resume();
        }
    }

    wait_until(duration).await;
    controller.stop();
    controller.teardown();

    let mut artifact = None;
    while let Ok(event) = events.try_recv() {
        match event {
            RecorderEvent::Stopped(a) => artifact = Some(a),
            RecorderEvent::Error(e) => error!("{}", e),
            other => info!("Event: {:?}", other),
        }
    }
    let artifact = artifact.context("Recorder produced no artifact")?;

    let path = match output {
        Some(path) => path,
        None => cfg
            .output
            .recordings_dir()
            .join(format!("{}.{}", controller.session_id(), artifact.extension())),
    };

    let path = artifact.save(&path)?;
    info!(
        "Recording complete: {} bytes ({} chunks) -> {}",
        artifact.size(),
        artifact.chunk_count,
        path.display()
    );
    Ok(())
}

/// Reject values `Duration::from_secs_f64` would panic on
fn validate_seconds(flag: &str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("{} must be a finite, non-negative number of seconds", flag);
    }
    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let artifacts = Arc::new(ArtifactStore::new());
    let controller = open_session(&cfg, artifacts.clone()).await?;

    let app = create_router(AppState::new(controller.clone(), artifacts));

    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;

    controller.teardown();
    info!("HTTP server stopped");
    Ok(())
}
