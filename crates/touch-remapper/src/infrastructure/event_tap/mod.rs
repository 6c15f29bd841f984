//! Event tap infrastructure: the hook into the host's global pointer stream.
//!
//! On macOS this installs a Quartz event tap at the head of the session event
//! chain, on a dedicated run-loop thread, for left-button down/up/drag and
//! plain mouse-move events.  The tap callback hands every observed event to a
//! [`TapHandler`] and either lets it continue or swallows it.
//!
//! # Timing
//!
//! The host disables a tap whose callback is too slow (a few milliseconds at
//! most).  Handlers must decide synchronously and defer all real work to
//! another context.
//!
//! # Disablement
//!
//! The host can switch the tap off at any time.  When it does so while events
//! still flow, the callback receives [`TapInput::DisabledByTimeout`] or
//! [`TapInput::DisabledByUserInput`].  When it does so silently, only polling
//! [`TapControl::is_enabled`] notices.
//!
//! # Testability
//!
//! The [`InterceptionTap`] trait lets tests drive the handler synchronously
//! through [`mock::MockEventTap`] without any OS hooks.

use std::sync::Arc;

use touch_core::PointerEvent;

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

/// Something the tap callback observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapInput {
    /// A pointer event of one of the registered kinds.
    Pointer(PointerEvent),
    /// The host disabled the tap because a callback took too long.
    DisabledByTimeout,
    /// The host disabled the tap in response to user input (secure input).
    DisabledByUserInput,
}

/// What the tap should do with the event it just reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDecision {
    /// Let the original event continue through normal routing.
    PassThrough,
    /// Swallow the original event.
    Suppress,
}

/// Error type for event tap operations.
#[derive(Debug, thiserror::Error)]
pub enum TapError {
    #[error("failed to create event tap: {0}")]
    InstallFailed(String),
    #[error("an event tap is already installed")]
    AlreadyInstalled,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Receives every tap callback, on the interception context.
pub trait TapHandler: Send + Sync {
    /// Decides what happens to `input`.
    ///
    /// `control` is the tap that produced the input, so an in-band disable
    /// notification can be answered by re-enabling before returning.
    fn on_tap_input(&self, input: TapInput, control: &dyn TapControl) -> TapDecision;
}

/// The OS-level enabled flag of an installed tap.
///
/// Both operations are safe to call from any thread.
pub trait TapControl: Send + Sync {
    /// Returns `true` if the host currently delivers events to the tap.
    fn is_enabled(&self) -> bool;
    /// Enables or disables the tap.
    fn set_enabled(&self, enabled: bool);
}

/// Installs and removes the tap.
pub trait InterceptionTap: Send + Sync {
    /// Installs the tap and starts delivering callbacks to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::InstallFailed`] when the host refuses the tap
    /// (typically missing input-monitoring permission) and
    /// [`TapError::AlreadyInstalled`] if called twice without `uninstall`.
    fn install(&self, handler: Arc<dyn TapHandler>) -> Result<Arc<dyn TapControl>, TapError>;

    /// Disables and removes the tap.  Calling it when nothing is installed is
    /// a no-op.
    fn uninstall(&self);
}
