//! Status and calibration bridge: exposes pipeline state to a UI host.
//!
//! Every command here takes the shared [`AppState`] and returns a
//! [`CommandResult`], which a UI host (a settings window, a menu-bar item, or
//! the binary's periodic status dump) serialises to JSON.  Two groups:
//!
//! - **Diagnostics consumer**: [`get_status`], [`get_recent_entries`],
//!   [`get_statistics`].  Pull-based; nothing is pushed.
//! - **Manual calibration**: [`enter_learning_mode`],
//!   [`set_device_identities`], [`clear_device_identities`] and
//!   [`save_device_identities`], for setups where discovery fails or picks
//!   the wrong hardware.
//!
//! # Data Transfer Objects (DTOs)
//!
//! Internal types carry `Instant`s and `SystemTime`s that do not serialise
//! meaningfully.  DTOs contain only JSON-friendly fields: ages in
//! milliseconds, wall-clock times as Unix milliseconds.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so every
//! response has the same shape: `{ success: bool, data: T | null, error: string | null }`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use touch_core::{
    DeliveryStatus, DeviceIdentity, DeviceIdentitySet, DiagnosticsEntry, EventKind,
    RecorderStatistics,
};

use crate::application::intercept::PipelinePhase;
use crate::application::pipeline::TouchPipeline;
use crate::application::watchdog::WatchdogState;
use crate::infrastructure::storage::config::{save_config_to, AppConfig};

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between bridge commands.
///
/// `config` is an async Tokio mutex because commands run on the async
/// runtime and may hold it across a file write.
pub struct AppState {
    pub pipeline: Arc<TouchPipeline>,
    pub config: Mutex<AppConfig>,
    /// Where calibration changes are persisted; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<TouchPipeline>,
        config: AppConfig,
        config_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            config: Mutex::new(config),
            config_path,
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Watchdog counters for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogDto {
    pub is_healthy: bool,
    pub disable_count: u64,
    /// Unix time of the last detected disable, in milliseconds.
    pub last_disable_unix_ms: Option<u64>,
    pub checks_performed: u64,
}

impl From<&WatchdogState> for WatchdogDto {
    fn from(s: &WatchdogState) -> Self {
        Self {
            is_healthy: s.is_healthy,
            disable_count: s.disable_count,
            last_disable_unix_ms: s.last_disable_time.and_then(unix_ms),
            checks_performed: s.checks_performed,
        }
    }
}

/// Overall pipeline status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDto {
    pub running: bool,
    pub phase: PipelinePhase,
    pub identities: Vec<DeviceIdentity>,
    pub device_label: Option<String>,
    pub last_sequence_id: u64,
    pub watchdog: Option<WatchdogDto>,
    pub statistics: RecorderStatistics,
}

/// One diagnostics entry for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsEntryDto {
    /// Milliseconds between recording and the query.
    pub age_ms: u64,
    pub sequence_id: u64,
    pub device_identity: DeviceIdentity,
    pub kind: EventKind,
    pub original_x: f64,
    pub original_y: f64,
    pub remapped_x: Option<f64>,
    pub remapped_y: Option<f64>,
    pub status: DeliveryStatus,
    pub latency_ms: Option<f64>,
}

impl DiagnosticsEntryDto {
    fn from_entry(entry: &DiagnosticsEntry, now: Instant) -> Self {
        Self {
            age_ms: now.saturating_duration_since(entry.recorded_at).as_millis() as u64,
            sequence_id: entry.sequence_id,
            device_identity: entry.device_identity,
            kind: entry.kind,
            original_x: entry.original_point.x,
            original_y: entry.original_point.y,
            remapped_x: entry.remapped_point.map(|p| p.x),
            remapped_y: entry.remapped_point.map(|p| p.y),
            status: entry.delivery_status,
            latency_ms: entry.latency_ms,
        }
    }
}

/// Unified response wrapper used by bridge commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn unix_ms(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64)
}

// ── Diagnostics commands ──────────────────────────────────────────────────────

/// Returns the pipeline phase, identities, watchdog counters and statistics.
pub async fn get_status(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let statistics = statistics_now(&state).await;
    let pipeline = &state.pipeline;
    let interception = pipeline.interception();
    let watchdog = pipeline.watchdog_state().await;
    CommandResult::ok(StatusDto {
        running: pipeline.is_running().await,
        phase: interception.phase(),
        identities: interception.identities().to_vec(),
        device_label: pipeline.device_label(),
        last_sequence_id: interception.sequence().sequence_id,
        watchdog: watchdog.as_ref().map(WatchdogDto::from),
        statistics,
    })
}

/// Returns the `n` most recent diagnostics entries, oldest first.
pub async fn get_recent_entries(
    state: Arc<AppState>,
    n: usize,
) -> CommandResult<Vec<DiagnosticsEntryDto>> {
    let now = Instant::now();
    let entries = state
        .pipeline
        .recorder()
        .recent(n)
        .iter()
        .map(|e| DiagnosticsEntryDto::from_entry(e, now))
        .collect();
    CommandResult::ok(entries)
}

/// Returns recorder statistics over the configured throughput window.
pub async fn get_statistics(state: Arc<AppState>) -> CommandResult<RecorderStatistics> {
    CommandResult::ok(statistics_now(&state).await)
}

async fn statistics_now(state: &AppState) -> RecorderStatistics {
    let window = state.config.lock().await.pipeline.throughput_window();
    state
        .pipeline
        .recorder()
        .statistics_at(Instant::now(), window)
}

// ── Calibration commands ──────────────────────────────────────────────────────

/// Makes the next touch define the device identity.
pub async fn enter_learning_mode(state: Arc<AppState>) -> CommandResult<()> {
    state.pipeline.interception().enter_learning_mode();
    CommandResult::ok(())
}

/// Replaces the identity set and persists it.
pub async fn set_device_identities(
    state: Arc<AppState>,
    identities: Vec<DeviceIdentity>,
) -> CommandResult<()> {
    let set: DeviceIdentitySet = identities.into_iter().collect();
    if let Err(e) = state.pipeline.interception().set_identities(set) {
        return CommandResult::err(e.to_string());
    }
    persist_identities(&state).await
}

/// Empties the identity set (everything passes through) and persists that.
pub async fn clear_device_identities(state: Arc<AppState>) -> CommandResult<()> {
    if let Err(e) = state.pipeline.interception().clear_identities() {
        return CommandResult::err(e.to_string());
    }
    persist_identities(&state).await
}

/// Persists whatever identity set is current, e.g. after learning.
pub async fn save_device_identities(state: Arc<AppState>) -> CommandResult<()> {
    persist_identities(&state).await
}

async fn persist_identities(state: &AppState) -> CommandResult<()> {
    let identities = state.pipeline.interception().identities().to_vec();
    let mut cfg = state.config.lock().await;
    if cfg.device.identities == identities {
        return CommandResult::ok(());
    }
    cfg.device.identities = identities;

    if let Some(path) = &state.config_path {
        if let Err(e) = save_config_to(&cfg, path) {
            return CommandResult::err(format!("failed to save config: {e}"));
        }
        info!(path = %path.display(), identities = ?cfg.device.identities, "device identities saved");
    }
    CommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
