//! Permission gate infrastructure.
//!
//! Installing an active event tap and posting events into another window
//! require a one-time accessibility / input-monitoring grant.  The pipeline
//! only needs to *check* the grant and, once, *request* it; the UI that walks
//! the user through System Settings lives elsewhere.

use async_trait::async_trait;

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

/// Access to the host's input-control grant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Returns `true` if the process already holds the grant.
    async fn check(&self) -> bool;

    /// Asks the host to prompt for the grant and returns whether it is now held.
    ///
    /// The host usually answers before the user has acted on the prompt, so
    /// `false` here is common on first launch.
    async fn request(&self) -> bool;
}
