//! Avaverse - VRM avatar retargeting for holistic tracking
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use avaverse::{
    avatar::VrmAvatar,
    config::Config,
    error::OutputError,
    output::{BrowserRenderer, BrowserServer},
    retarget::FrameDriver,
    session::{AvatarSlot, Session, SessionStats, Ticker},
    solver::SolveContext,
    tracking::{DetectionSource, LineSource, TrackerProcess},
    AppState,
};

/// Avaverse - drive a VRM avatar from face, body and hand tracking
#[derive(Parser, Debug)]
#[command(name = "avaverse", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// VRM model to drive (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Track this video with the helper subprocess (overrides config, enables auto launch)
    #[arg(long)]
    video: Option<PathBuf>,

    /// Solved records the helper attaches to each frame (overrides config)
    #[arg(long)]
    solved: Option<PathBuf>,

    /// Replay a recorded detection stream instead of launching the tracker
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Read the detection stream from stdin
    #[arg(long, conflicts_with = "input")]
    stdin: bool,

    /// Target frame rate, 0 for unpaced (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", avaverse::NAME, avaverse::VERSION);

    let config = load_config(&args)?;
    let state = AppState::new(config.clone());

    if config.http.enabled {
        let http_state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = run_http_server(http_state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let signal_state = Arc::clone(&state);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        signal_state.shutdown();
    });

    let mut shutdown_rx = state.subscribe_shutdown();
    let stats = run_session(Arc::clone(&state), &config, &args).await?;
    info!(
        "Processed {} frames ({} retargeted)",
        stats.frames, stats.retargeted
    );

    // Keep serving the last pose until asked to stop
    if config.http.enabled && shutdown_rx.try_recv().is_err() {
        info!("Detection stream finished, serving last pose until Ctrl+C");
        let _ = shutdown_rx.recv().await;
    }

    state.shutdown();
    // Give tasks a moment to clean up
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    info!("Avaverse stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            Config::from_file(path)?
        }
        None => Config::load()?,
    };

    // Apply CLI overrides
    if let Some(model) = &args.model {
        config.avatar.model_path = model.clone();
    }
    if let Some(video) = &args.video {
        config.tracker.video_path = Some(video.clone());
        config.tracker.auto_launch = true;
    }
    if let Some(solved) = &args.solved {
        config.tracker.solved_path = Some(solved.clone());
    }
    if let Some(input) = &args.input {
        config.tracker.input_file = Some(input.clone());
    }
    if args.stdin {
        config.tracker.auto_launch = false;
    }
    if let Some(fps) = args.fps {
        config.render.fps = fps;
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    config.validate()?;
    Ok(config)
}

async fn run_session(
    state: Arc<AppState>,
    config: &Config,
    args: &Args,
) -> anyhow::Result<SessionStats> {
    let model_path = config.avatar.model_path.clone();
    let slot = AvatarSlot::spawn(move || VrmAvatar::load(model_path));

    let ctx = SolveContext {
        image_size: None,
        runtime: config.tracker.runtime.clone(),
    };
    let mut session = Session::new(
        FrameDriver::new(&config.retarget, ctx),
        Ticker::new(config.render.fps),
        slot,
    );
    let mut renderer = BrowserRenderer::new(Arc::clone(&state));

    if args.stdin {
        info!("Reading detection frames from stdin");
        let mut source = LineSource::new(BufReader::new(tokio::io::stdin()));
        return drive(&mut session, &mut source, &mut renderer, &state).await;
    }

    if let Some(input) = &config.tracker.input_file {
        let mut source = LineSource::open(input).await?;
        return drive(&mut session, &mut source, &mut renderer, &state).await;
    }

    if !config.tracker.auto_launch {
        warn!("No detection input configured (tracker.auto_launch = false, no input file)");
        return Ok(SessionStats::default());
    }

    let mut tracker = TrackerProcess::new(&config.tracker);
    let mut source = tracker.start()?;
    let result = drive(&mut session, &mut source, &mut renderer, &state).await;
    if tracker.is_running() {
        tracker.stop().await;
    }
    result
}

async fn drive<S: DetectionSource>(
    session: &mut Session<VrmAvatar>,
    source: &mut S,
    renderer: &mut BrowserRenderer,
    state: &Arc<AppState>,
) -> anyhow::Result<SessionStats> {
    let stats = session
        .run(source, renderer, state.subscribe_shutdown(), |status| {
            state.set_avatar_status(status)
        })
        .await?;
    Ok(stats)
}

async fn run_http_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await.clone();
    let http_config = config.http.clone();

    let browser_server = BrowserServer::new(Arc::clone(&state), &config);
    let app = browser_server.router(&http_config);

    let addr = format!("{}:{}", http_config.host, http_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OutputError::Bind(format!("{}: {}", addr, e)))?;
    info!("HTTP server listening on http://{}", addr);

    let mut shutdown_rx = state.subscribe_shutdown();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| OutputError::Server(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
