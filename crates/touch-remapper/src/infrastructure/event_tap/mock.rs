//! Mock event tap for unit and integration testing.
//!
//! Lets tests feed synthetic [`TapInput`]s through the installed handler and
//! observe the decision, and simulate the host silently disabling the tap.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc, Mutex,
};

use touch_core::PointerEvent;

use super::{InterceptionTap, TapControl, TapDecision, TapError, TapHandler, TapInput};

/// Enabled flag of the mock tap, with knobs for failure injection.
#[derive(Default)]
pub struct MockTapControl {
    enabled: AtomicBool,
    enable_calls: AtomicU32,
    refuse_enable: AtomicBool,
}

impl MockTapControl {
    /// Number of `set_enabled(true)` calls observed.
    pub fn enable_calls(&self) -> u32 {
        self.enable_calls.load(Ordering::SeqCst)
    }

    /// When set, `set_enabled(true)` leaves the tap disabled, as when the
    /// host refuses to re-enable it.
    pub fn refuse_enable(&self, refuse: bool) {
        self.refuse_enable.store(refuse, Ordering::SeqCst);
    }
}

impl TapControl for MockTapControl {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.enable_calls.fetch_add(1, Ordering::SeqCst);
            if self.refuse_enable.load(Ordering::SeqCst) {
                return;
            }
        }
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

/// A mock implementation of [`InterceptionTap`] that calls the handler inline.
pub struct MockEventTap {
    handler: Mutex<Option<Arc<dyn TapHandler>>>,
    control: Arc<MockTapControl>,
    fail_install: AtomicBool,
    install_count: AtomicU32,
    uninstall_count: AtomicU32,
}

impl MockEventTap {
    /// Creates a new, uninstalled mock tap.
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            control: Arc::new(MockTapControl::default()),
            fail_install: AtomicBool::new(false),
            install_count: AtomicU32::new(0),
            uninstall_count: AtomicU32::new(0),
        }
    }

    /// Makes the next `install` fail as if the host refused the tap.
    pub fn fail_next_install(&self) {
        self.fail_install.store(true, Ordering::SeqCst);
    }

    /// The tap's enabled flag.
    pub fn control(&self) -> Arc<MockTapControl> {
        Arc::clone(&self.control)
    }

    pub fn is_installed(&self) -> bool {
        self.handler.lock().expect("lock poisoned").is_some()
    }

    pub fn install_count(&self) -> u32 {
        self.install_count.load(Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> u32 {
        self.uninstall_count.load(Ordering::SeqCst)
    }

    /// Runs `input` through the handler, as the host would.
    ///
    /// Returns `None` when nothing is installed or the tap is disabled (the
    /// host delivers nothing to a disabled tap, except the disable notice).
    pub fn inject(&self, input: TapInput) -> Option<TapDecision> {
        let handler = self.handler.lock().expect("lock poisoned").clone()?;
        let is_notice = !matches!(input, TapInput::Pointer(_));
        if !is_notice && !self.control.is_enabled() {
            return None;
        }
        Some(handler.on_tap_input(input, self.control.as_ref()))
    }

    /// Shorthand for injecting a pointer event; an event that never reached
    /// the handler counts as passed through.
    pub fn inject_pointer(&self, event: PointerEvent) -> TapDecision {
        self.inject(TapInput::Pointer(event))
            .unwrap_or(TapDecision::PassThrough)
    }

    /// The host disables the tap without telling the callback.
    pub fn simulate_silent_disable(&self) {
        self.control.enabled.store(false, Ordering::SeqCst);
    }

    /// The host disables the tap and reports it through the callback.
    pub fn simulate_timeout_disable(&self) -> Option<TapDecision> {
        self.control.enabled.store(false, Ordering::SeqCst);
        self.inject(TapInput::DisabledByTimeout)
    }
}

impl Default for MockEventTap {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptionTap for MockEventTap {
    fn install(&self, handler: Arc<dyn TapHandler>) -> Result<Arc<dyn TapControl>, TapError> {
        if self.fail_install.swap(false, Ordering::SeqCst) {
            return Err(TapError::InstallFailed("mock install failure".to_string()));
        }
        let mut guard = self.handler.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(TapError::AlreadyInstalled);
        }
        *guard = Some(handler);
        self.control.enabled.store(true, Ordering::SeqCst);
        self.install_count.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.control) as Arc<dyn TapControl>)
    }

    fn uninstall(&self) {
        let mut guard = self.handler.lock().expect("lock poisoned");
        if guard.take().is_some() {
            self.control.enabled.store(false, Ordering::SeqCst);
            self.uninstall_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touch_core::EventKind;

    /// Suppresses everything and re-enables on disable notices.
    struct SuppressAll;

    impl TapHandler for SuppressAll {
        fn on_tap_input(&self, input: TapInput, control: &dyn TapControl) -> TapDecision {
            if !matches!(input, TapInput::Pointer(_)) {
                control.set_enabled(true);
            }
            TapDecision::Suppress
        }
    }

    #[test]
    fn test_inject_before_install_returns_none() {
        let tap = MockEventTap::new();
        assert_eq!(tap.inject(TapInput::DisabledByTimeout), None);
    }

    #[test]
    fn test_install_enables_and_routes_to_handler() {
        // Arrange
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");

        // Act
        let decision = tap.inject_pointer(PointerEvent::new(1, EventKind::Down, 0.0, 0.0));

        // Assert
        assert!(tap.control().is_enabled());
        assert_eq!(decision, TapDecision::Suppress);
    }

    #[test]
    fn test_second_install_is_rejected() {
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");
        let second = tap.install(Arc::new(SuppressAll));
        assert!(matches!(second, Err(TapError::AlreadyInstalled)));
    }

    #[test]
    fn test_disabled_tap_receives_no_pointer_events() {
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");
        tap.simulate_silent_disable();
        assert_eq!(
            tap.inject(TapInput::Pointer(PointerEvent::new(1, EventKind::Down, 0.0, 0.0))),
            None
        );
    }

    #[test]
    fn test_timeout_notice_reaches_handler_which_reenables() {
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");
        tap.simulate_timeout_disable();
        assert!(tap.control().is_enabled());
        assert_eq!(tap.control().enable_calls(), 1);
    }

    #[test]
    fn test_uninstall_is_idempotent() {
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");
        tap.uninstall();
        tap.uninstall();
        assert_eq!(tap.uninstall_count(), 1);
        assert!(!tap.is_installed());
    }

    #[test]
    fn test_refused_enable_leaves_tap_disabled() {
        let tap = MockEventTap::new();
        tap.install(Arc::new(SuppressAll)).expect("install");
        tap.control().refuse_enable(true);
        tap.simulate_timeout_disable();
        assert!(!tap.control().is_enabled());
    }
}
