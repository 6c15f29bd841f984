//! Fixed-answer permission gate for integration tests and headless runs.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use super::PermissionGate;

/// Answers `check` with a fixed value; `request` grants if `grant_on_request`.
pub struct StaticPermissionGate {
    granted: AtomicBool,
    grant_on_request: bool,
    requests: AtomicU32,
}

impl StaticPermissionGate {
    /// A gate that is already granted.
    pub fn granted() -> Self {
        Self::new(true, true)
    }

    /// A gate that is never granted.
    pub fn denied() -> Self {
        Self::new(false, false)
    }

    pub fn new(granted: bool, grant_on_request: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            grant_on_request,
            requests: AtomicU32::new(0),
        }
    }

    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    async fn check(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request {
            self.granted.store(true, Ordering::SeqCst);
        }
        self.granted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_gate_stays_denied_after_request() {
        let gate = StaticPermissionGate::denied();
        tokio_test::block_on(async {
            assert!(!gate.request().await);
            assert!(!gate.check().await);
        });
        assert_eq!(gate.request_count(), 1);
    }

    #[test]
    fn test_request_can_grant() {
        let gate = StaticPermissionGate::new(false, true);
        let granted = tokio_test::block_on(gate.request());
        assert!(granted);
        assert!(tokio_test::block_on(gate.check()));
    }
}
