//! Pipeline lifecycle: wires the use cases to their backends.
//!
//! [`TouchPipeline::start`] runs, in order:
//!
//! 1. the permission gate (`check`, then one `request`);
//! 2. identity setup: forced learning, else the identities already held (from
//!    config or earlier calibration), else registry discovery, else learning;
//! 3. the delivery worker on the current runtime (the surface context);
//! 4. the event tap, with the interception point as its handler;
//! 5. the health watchdog.
//!
//! [`TouchPipeline::stop`] undoes steps 3-5 and is idempotent.  Queued
//! deliveries still drain after `stop`; the worker exits once the queue is
//! empty.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use touch_core::{DeviceIdentitySet, DiagnosticsRecorder};

use crate::application::deliver::{DeliveryChannel, DeliveryWorker};
use crate::application::error::TouchError;
use crate::application::frames::TargetDisplay;
use crate::application::intercept::InterceptionPoint;
use crate::application::resolve_device::DeviceIdentityResolver;
use crate::application::watchdog::{HealthWatchdog, WatchdogState};
use crate::infrastructure::display::DisplayGeometry;
use crate::infrastructure::event_tap::{InterceptionTap, TapHandler};
use crate::infrastructure::permission::PermissionGate;
use crate::infrastructure::registry::HardwareRegistry;
use crate::infrastructure::storage::config::AppConfig;
use crate::infrastructure::surface::SurfaceSlot;

/// Pipeline parameters, usually derived from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Manual identity set; non-empty skips discovery.
    pub identities: DeviceIdentitySet,
    pub learn_on_start: bool,
    pub target: TargetDisplay,
    pub watchdog_interval: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vendor_id: config.device.vendor_id,
            product_id: config.device.product_id,
            identities: config.device.identity_set(),
            learn_on_start: config.device.learn_on_start,
            target: config.display.target(),
            watchdog_interval: config.pipeline.watchdog_interval(),
        }
    }
}

/// The OS-facing collaborators the pipeline needs.
pub struct PipelineBackends {
    pub permission: Arc<dyn PermissionGate>,
    pub tap: Arc<dyn InterceptionTap>,
    pub registry: Arc<dyn HardwareRegistry>,
    pub displays: Arc<dyn DisplayGeometry>,
}

struct Running {
    watchdog: JoinHandle<()>,
    watchdog_state: Arc<std::sync::Mutex<WatchdogState>>,
}

/// One touch-remapping pipeline.  Designed for exactly one per process.
pub struct TouchPipeline {
    settings: PipelineSettings,
    permission: Arc<dyn PermissionGate>,
    tap: Arc<dyn InterceptionTap>,
    registry: Arc<dyn HardwareRegistry>,
    interception: Arc<InterceptionPoint>,
    surface: Arc<SurfaceSlot>,
    recorder: Arc<DiagnosticsRecorder>,
    running: Mutex<Option<Running>>,
    device_label: std::sync::Mutex<Option<String>>,
}

impl TouchPipeline {
    pub fn new(
        settings: PipelineSettings,
        backends: PipelineBackends,
        recorder: Arc<DiagnosticsRecorder>,
    ) -> Self {
        let interception = Arc::new(InterceptionPoint::new(
            backends.displays,
            settings.target,
            Arc::clone(&recorder),
        ));
        if !settings.identities.is_empty() {
            if let Err(e) = interception.set_identities(settings.identities.clone()) {
                warn!("configured device identities not applied: {e}");
            }
        }
        Self {
            settings,
            permission: backends.permission,
            tap: backends.tap,
            registry: backends.registry,
            interception,
            surface: Arc::new(SurfaceSlot::new()),
            recorder,
            running: Mutex::new(None),
            device_label: std::sync::Mutex::new(None),
        }
    }

    /// Starts the pipeline.  Calling it while running is a no-op.
    ///
    /// # Errors
    ///
    /// - [`TouchError::PermissionDenied`] if the grant is missing after one request.
    /// - [`TouchError::Tap`] if the event tap cannot be installed.
    pub async fn start(&self) -> Result<(), TouchError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        if !self.permission.check().await && !self.permission.request().await {
            warn!("{}", TouchError::PermissionDenied);
            return Err(TouchError::PermissionDenied);
        }

        self.prepare_identities().await;

        let (channel, rx) = DeliveryChannel::new();
        let worker = DeliveryWorker::new(rx, Arc::clone(&self.surface), Arc::clone(&self.recorder));
        tokio::spawn(worker.run());
        self.interception.start(channel);

        let handler: Arc<dyn TapHandler> = self.interception.clone();
        let control = match self.tap.install(handler) {
            Ok(control) => control,
            Err(e) => {
                // Dropping the sender ends the worker.
                self.interception.stop();
                return Err(e.into());
            }
        };

        let watchdog = HealthWatchdog::new(control);
        let watchdog_state = watchdog.state_handle();
        *running = Some(Running {
            watchdog: watchdog.spawn(self.settings.watchdog_interval),
            watchdog_state,
        });
        info!(phase = ?self.interception.phase(), "touch pipeline started");
        Ok(())
    }

    /// Stops the pipeline.  Idempotent.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.watchdog.abort();
        self.tap.uninstall();
        self.interception.stop();
        info!("touch pipeline stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Watchdog counters, or `None` when not running.
    pub async fn watchdog_state(&self) -> Option<WatchdogState> {
        self.running.lock().await.as_ref().map(|r| {
            r.watchdog_state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        })
    }

    pub fn interception(&self) -> &Arc<InterceptionPoint> {
        &self.interception
    }

    /// Where the UI host attaches the target surface.
    pub fn surface_slot(&self) -> &Arc<SurfaceSlot> {
        &self.surface
    }

    pub fn recorder(&self) -> &Arc<DiagnosticsRecorder> {
        &self.recorder
    }

    /// Product label found by the last successful discovery.
    pub fn device_label(&self) -> Option<String> {
        self.device_label
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    async fn prepare_identities(&self) {
        if self.settings.learn_on_start {
            self.interception.enter_learning_mode();
            return;
        }
        if !self.interception.identities().is_empty() {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let (vendor_id, product_id) = (self.settings.vendor_id, self.settings.product_id);
        // The registry walk can take tens of milliseconds.
        let resolved = tokio::task::spawn_blocking(move || {
            DeviceIdentityResolver::new(registry.as_ref()).resolve(vendor_id, product_id)
        })
        .await
        .unwrap_or(Err(TouchError::DeviceNotFound {
            vendor_id,
            product_id,
        }));

        match resolved {
            Ok(device) => {
                if self.interception.set_identities(device.identities).is_ok() {
                    *self
                        .device_label
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(device.label);
                }
            }
            Err(e) => {
                warn!("{e}; falling back to learning mode");
                self.interception.enter_learning_mode();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::intercept::PipelinePhase;
    use crate::infrastructure::display::mock::MockDisplayGeometry;
    use crate::infrastructure::event_tap::mock::MockEventTap;
    use crate::infrastructure::permission::MockPermissionGate;
    use crate::infrastructure::registry::mock::MockRegistry;

    fn settings() -> PipelineSettings {
        PipelineSettings::from_config(&AppConfig::default())
    }

    fn pipeline_with(
        permission: MockPermissionGate,
        settings: PipelineSettings,
        registry: MockRegistry,
    ) -> (TouchPipeline, Arc<MockEventTap>) {
        let tap = Arc::new(MockEventTap::new());
        let pipeline = TouchPipeline::new(
            settings,
            PipelineBackends {
                permission: Arc::new(permission),
                tap: tap.clone(),
                registry: Arc::new(registry),
                displays: Arc::new(MockDisplayGeometry::primary_and_touch_display()),
            },
            Arc::new(DiagnosticsRecorder::new(32)),
        );
        (pipeline, tap)
    }

    fn granted() -> MockPermissionGate {
        let mut gate = MockPermissionGate::new();
        gate.expect_check().returning(|| true);
        gate.expect_request().never();
        gate
    }

    #[tokio::test]
    async fn test_denied_permission_is_requested_once_then_fails() {
        // Arrange
        let mut gate = MockPermissionGate::new();
        gate.expect_check().times(1).returning(|| false);
        gate.expect_request().times(1).returning(|| false);
        let (pipeline, tap) = pipeline_with(gate, settings(), MockRegistry::new());

        // Act
        let result = pipeline.start().await;

        // Assert
        assert!(matches!(result, Err(TouchError::PermissionDenied)));
        assert!(!tap.is_installed());
        assert!(!pipeline.is_running().await);
    }

    #[tokio::test]
    async fn test_granted_on_request_starts() {
        let mut gate = MockPermissionGate::new();
        gate.expect_check().returning(|| false);
        gate.expect_request().times(1).returning(|| true);
        let (pipeline, tap) = pipeline_with(gate, settings(), MockRegistry::new());

        pipeline.start().await.expect("start");

        assert!(tap.is_installed());
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_discovery_failure_falls_back_to_learning() {
        let (pipeline, _tap) = pipeline_with(granted(), settings(), MockRegistry::new());

        pipeline.start().await.expect("start");

        assert_eq!(pipeline.interception().phase(), PipelinePhase::Learning);
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_discovery_success_sets_identities_and_label() {
        // Arrange
        let registry = MockRegistry::new();
        registry
            .add_interface(0x0eef, 0x0005, 100)
            .add_child(100, 101)
            .set_usage(101, 0x0D, 0x04)
            .set_label(100, "Touch Panel");
        let (pipeline, _tap) = pipeline_with(granted(), settings(), registry);

        // Act
        pipeline.start().await.expect("start");

        // Assert
        assert_eq!(pipeline.interception().identities().to_vec(), vec![100, 101]);
        assert_eq!(pipeline.device_label().as_deref(), Some("Touch Panel"));
        assert_eq!(pipeline.interception().phase(), PipelinePhase::Filtering);
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_configured_identities_skip_discovery() {
        let registry = MockRegistry::new();
        let settings = PipelineSettings {
            identities: DeviceIdentitySet::singleton(42),
            ..settings()
        };
        let (pipeline, _tap) = pipeline_with(granted(), settings, registry);

        pipeline.start().await.expect("start");

        assert_eq!(pipeline.interception().identities().to_vec(), vec![42]);
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_learn_on_start_overrides_configured_identities() {
        let settings = PipelineSettings {
            identities: DeviceIdentitySet::singleton(42),
            learn_on_start: true,
            ..settings()
        };
        let (pipeline, _tap) = pipeline_with(granted(), settings, MockRegistry::new());

        pipeline.start().await.expect("start");

        assert_eq!(pipeline.interception().phase(), PipelinePhase::Learning);
        pipeline.stop().await;
    }

    #[tokio::test]
    async fn test_tap_install_failure_is_reported_and_leaves_idle() {
        let (pipeline, tap) = pipeline_with(granted(), settings(), MockRegistry::new());
        tap.fail_next_install();

        let result = pipeline.start().await;

        assert!(matches!(result, Err(TouchError::Tap(_))));
        assert_eq!(pipeline.interception().phase(), PipelinePhase::Idle);
        assert!(pipeline.watchdog_state().await.is_none());
    }

    #[tokio::test]
    async fn test_start_twice_installs_once_and_stop_is_idempotent() {
        let (pipeline, tap) = pipeline_with(granted(), settings(), MockRegistry::new());

        pipeline.start().await.expect("start");
        pipeline.start().await.expect("second start is a no-op");
        pipeline.stop().await;
        pipeline.stop().await;

        assert_eq!(tap.install_count(), 1);
        assert_eq!(tap.uninstall_count(), 1);
        assert!(pipeline.watchdog_state().await.is_none());
    }
}
