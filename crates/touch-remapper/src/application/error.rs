//! Error taxonomy of the touch pipeline.
//!
//! Only [`TouchError::PermissionDenied`], [`TouchError::TouchInProgress`] and
//! [`TouchError::Tap`] ever reach a caller.  The rest describe outcomes the
//! pipeline absorbs itself (pass-through, a `Dropped` diagnostics entry, or an
//! automatic re-enable) and exist so those outcomes are logged with one name.

use thiserror::Error;

use crate::infrastructure::event_tap::TapError;

#[derive(Debug, Error)]
pub enum TouchError {
    /// The input-control grant is missing; the pipeline cannot start.
    #[error("input-control permission has not been granted")]
    PermissionDenied,

    /// Discovery found no digitizer for the configured hardware.
    #[error("no touch digitizer found for {vendor_id:#06x}:{product_id:#06x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// A point fell outside the source frame.
    #[error("point ({x}, {y}) lies outside the source display")]
    TransformRejected { x: f64, y: f64 },

    /// The target surface is gone.
    #[error("target surface is unavailable")]
    DeliveryUnavailable,

    /// The host disabled the event tap.
    #[error("event interception was disabled by the host")]
    InterceptionDisabled,

    /// Calibration was attempted while a touch sequence was live.
    #[error("cannot change device identities during an active touch")]
    TouchInProgress,

    #[error(transparent)]
    Tap(#[from] TapError),
}
