//! Touch Remapper entry point.
//!
//! Loads configuration, wires the native macOS backends into a
//! `TouchPipeline`, and runs until Ctrl-C.  No UI host is attached in the
//! standalone binary, so a `HeadlessSurface` stands in for the target
//! window and a periodic JSON status line goes to the log instead.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_from()     -- TOML, defaults on first run
//!  └─ TouchPipeline::new()   -- tap, registry, displays, permission gate
//!  └─ pipeline.start()
//!       ├─ event tap           (CFRunLoop thread, interception context)
//!       ├─ DeliveryWorker      (Tokio task, surface context)
//!       └─ HealthWatchdog      (Tokio task, surface context)
//!  └─ status dump loop         (Tokio task)
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use touch_remapper::infrastructure::storage::config::{config_file_path, load_config_from};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Routes a secondary touch display's touches to the display they came from.
#[derive(Debug, Parser)]
#[command(name = "touch-remapper", version)]
struct Cli {
    /// Path to the TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "TOUCH_REMAPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Start in learning mode: the next touch defines the device identity.
    #[arg(long)]
    learn: bool,

    /// Seconds between JSON status lines in the log; 0 disables them.
    #[arg(long, default_value_t = 30)]
    status_interval_secs: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config_file_path().context("could not locate the config directory")?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    if cli.learn {
        config.device.learn_on_start = true;
    }

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!(config = %config_path.display(), "Touch Remapper starting");

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    run(cli, config, config_path, running).await?;

    info!("Touch Remapper stopped");
    Ok(())
}

#[cfg(target_os = "macos")]
async fn run(
    cli: Cli,
    config: touch_remapper::infrastructure::storage::config::AppConfig,
    config_path: PathBuf,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    use std::time::Duration;

    use touch_core::DiagnosticsRecorder;
    use touch_remapper::application::frames::resolve_frames;
    use touch_remapper::application::pipeline::{PipelineBackends, PipelineSettings, TouchPipeline};
    use touch_remapper::infrastructure::display::macos::MacosDisplayGeometry;
    use touch_remapper::infrastructure::display::DisplayGeometry;
    use touch_remapper::infrastructure::event_tap::macos::MacosEventTap;
    use touch_remapper::infrastructure::permission::macos::MacosPermissionGate;
    use touch_remapper::infrastructure::registry::macos::MacosRegistry;
    use touch_remapper::infrastructure::surface::headless::HeadlessSurface;
    use touch_remapper::infrastructure::surface::TargetSurface;
    use touch_remapper::infrastructure::ui_bridge::{self, AppState};

    let displays: Arc<dyn DisplayGeometry> = Arc::new(MacosDisplayGeometry::new());
    let settings = PipelineSettings::from_config(&config);

    // The headless surface follows the target display as displays change.
    let surface: Arc<dyn TargetSurface> = {
        let displays = Arc::clone(&displays);
        let target = settings.target;
        Arc::new(HeadlessSurface::with_frame_source(move || {
            let list = displays.displays().ok()?;
            resolve_frames(&list, target).map(|frames| frames.target_natural())
        }))
    };

    let pipeline = Arc::new(TouchPipeline::new(
        settings,
        PipelineBackends {
            permission: Arc::new(MacosPermissionGate::new()),
            tap: Arc::new(MacosEventTap::new()),
            registry: Arc::new(MacosRegistry::new()),
            displays,
        },
        Arc::new(DiagnosticsRecorder::new(config.pipeline.diagnostics_capacity)),
    ));
    pipeline.surface_slot().attach(&surface);

    let state = AppState::new(Arc::clone(&pipeline), config, Some(config_path));
    pipeline
        .start()
        .await
        .context("touch pipeline failed to start")?;

    let status_task = (cli.status_interval_secs > 0).then(|| {
        let state = Arc::clone(&state);
        let period = Duration::from_secs(cli.status_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let status = ui_bridge::get_status(Arc::clone(&state)).await;
                match serde_json::to_string(&status) {
                    Ok(json) => info!(target: "touch_remapper::status", "{json}"),
                    Err(e) => error!("failed to serialise status: {e}"),
                }
            }
        })
    });

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if let Some(task) = status_task {
        task.abort();
    }
    pipeline.stop().await;
    let saved = ui_bridge::save_device_identities(Arc::clone(&state)).await;
    if let Some(e) = saved.error {
        error!("{e}");
    }
    drop(surface);
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn run(
    _cli: Cli,
    _config: touch_remapper::infrastructure::storage::config::AppConfig,
    _config_path: PathBuf,
    _running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    anyhow::bail!("touch remapping needs the macOS event tap; this platform is not supported")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
