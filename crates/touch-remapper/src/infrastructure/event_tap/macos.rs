//! macOS Quartz event tap implementation.
//!
//! The tap is created with `CGEventTapCreate` at the session location, placed
//! at the head of the chain, and serviced by a `CFRunLoop` on a dedicated
//! thread.  The thread blocks in `CFRunLoopRun` until [`MacosEventTap::uninstall`]
//! stops its run loop.
//!
//! # Suppression
//!
//! The `core-graphics` callback wrapper passes the original event on when the
//! closure returns `None`, so a suppressed event is rewritten to
//! `kCGEventNull` in place, which the window server discards.
//!
//! # Device identity
//!
//! Every HID-originated event carries its sender's registry entry ID in the
//! undocumented integer field 87.  That value is what the identity set holds.
//!
//! # Safety
//!
//! `unsafe` is confined to the `CGEventTapIsEnabled`/`CGEventTapEnable`/
//! `CGEventGetTimestamp` FFI calls and to the `Send`/`Sync` wrappers around
//! the mach port and run loop.  Each block carries a `// SAFETY:` comment.

#![cfg(target_os = "macos")]

use std::sync::{mpsc, Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    EventField,
};
use core_graphics::sys::CGEventRef;
use foreign_types::ForeignType;
use tracing::{debug, info, warn};

use touch_core::{EventKind, PointerEvent};

use super::{InterceptionTap, TapControl, TapDecision, TapError, TapHandler, TapInput};

/// Undocumented `CGEventField` holding the sender's registry entry ID.
const SENDER_ID_FIELD: u32 = 87;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapIsEnabled(tap: CFMachPortRef) -> bool;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    fn CGEventGetTimestamp(event: CGEventRef) -> u64;
}

// ── Send wrappers ─────────────────────────────────────────────────────────────

/// The tap's mach port, shareable across threads.
struct SharedMachPort(CFMachPort);

// SAFETY: CGEventTapIsEnabled and CGEventTapEnable are documented as callable
// from any thread, and the port is retained for the wrapper's lifetime.
unsafe impl Send for SharedMachPort {}
unsafe impl Sync for SharedMachPort {}

/// The tap thread's run loop, kept only so another thread can stop it.
struct SharedRunLoop(CFRunLoop);

// SAFETY: CFRunLoopStop is thread-safe; no other method is called off-thread.
unsafe impl Send for SharedRunLoop {}

// ── Control ───────────────────────────────────────────────────────────────────

/// [`TapControl`] over the tap's mach port.
///
/// The port is filled in once the tap exists; before that the tap reports
/// disabled and ignores `set_enabled`.
#[derive(Default)]
pub struct MacosTapControl {
    port: OnceLock<SharedMachPort>,
}

impl TapControl for MacosTapControl {
    fn is_enabled(&self) -> bool {
        match self.port.get() {
            // SAFETY: the port is a live, retained CFMachPort created by CGEventTapCreate.
            Some(port) => unsafe { CGEventTapIsEnabled(port.0.as_concrete_TypeRef()) },
            None => false,
        }
    }

    fn set_enabled(&self, enabled: bool) {
        if let Some(port) = self.port.get() {
            // SAFETY: as above.
            unsafe { CGEventTapEnable(port.0.as_concrete_TypeRef(), enabled) }
        }
    }
}

// ── Tap ───────────────────────────────────────────────────────────────────────

struct Installed {
    control: Arc<MacosTapControl>,
    run_loop: SharedRunLoop,
    thread: JoinHandle<()>,
}

/// Session-level Quartz event tap on its own run-loop thread.
pub struct MacosEventTap {
    installed: Mutex<Option<Installed>>,
}

impl MacosEventTap {
    /// Creates a new, uninstalled tap.
    pub fn new() -> Self {
        Self {
            installed: Mutex::new(None),
        }
    }
}

impl Default for MacosEventTap {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptionTap for MacosEventTap {
    fn install(&self, handler: Arc<dyn TapHandler>) -> Result<Arc<dyn TapControl>, TapError> {
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        if installed.is_some() {
            return Err(TapError::AlreadyInstalled);
        }

        let control = Arc::new(MacosTapControl::default());
        let (ready_tx, ready_rx) = mpsc::channel::<Result<SharedRunLoop, TapError>>();

        let thread_control = Arc::clone(&control);
        let thread = thread::Builder::new()
            .name("touch-event-tap".to_string())
            .spawn(move || run_tap_loop(handler, thread_control, ready_tx))
            .map_err(|e| TapError::InstallFailed(e.to_string()))?;

        let run_loop = match ready_rx.recv() {
            Ok(Ok(run_loop)) => run_loop,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(TapError::InstallFailed(
                    "tap thread exited before reporting".to_string(),
                ));
            }
        };

        info!("event tap installed");
        *installed = Some(Installed {
            control: Arc::clone(&control),
            run_loop,
            thread,
        });
        Ok(control)
    }

    fn uninstall(&self) {
        let taken = self
            .installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(installed) = taken else {
            return;
        };
        installed.control.set_enabled(false);
        installed.run_loop.0.stop();
        if installed.thread.join().is_err() {
            warn!("event tap thread panicked during shutdown");
        }
        info!("event tap removed");
    }
}

/// Body of the tap thread: create the tap, report back, then run the loop.
fn run_tap_loop(
    handler: Arc<dyn TapHandler>,
    control: Arc<MacosTapControl>,
    ready: mpsc::Sender<Result<SharedRunLoop, TapError>>,
) {
    let callback_control = Arc::clone(&control);
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGEventType::LeftMouseDragged,
            CGEventType::MouseMoved,
        ],
        move |_proxy, event_type, event: &CGEvent| {
            let Some(input) = translate(event_type, event) else {
                return None;
            };
            if handler.on_tap_input(input, callback_control.as_ref()) == TapDecision::Suppress {
                event.set_type(CGEventType::Null);
            }
            None
        },
    );

    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(TapError::InstallFailed(
                "CGEventTapCreate returned NULL (input monitoring not granted?)".to_string(),
            )));
            return;
        }
    };

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(TapError::InstallFailed(
                "could not create run loop source for tap".to_string(),
            )));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    // SAFETY: kCFRunLoopCommonModes is an immutable framework constant.
    run_loop.add_source(&source, unsafe { kCFRunLoopCommonModes });
    let _ = control.port.set(SharedMachPort(tap.mach_port.clone()));
    tap.enable();

    if ready.send(Ok(SharedRunLoop(run_loop.clone()))).is_err() {
        return;
    }
    debug!("event tap run loop starting");
    CFRunLoop::run_current();
    debug!("event tap run loop exited");
    drop(tap);
}

/// Converts a raw callback into a [`TapInput`]; `None` for anything else.
fn translate(event_type: CGEventType, event: &CGEvent) -> Option<TapInput> {
    let kind = match event_type {
        CGEventType::LeftMouseDown => EventKind::Down,
        CGEventType::LeftMouseUp => EventKind::Up,
        CGEventType::LeftMouseDragged => EventKind::Drag,
        CGEventType::MouseMoved => EventKind::Move,
        CGEventType::TapDisabledByTimeout => return Some(TapInput::DisabledByTimeout),
        CGEventType::TapDisabledByUserInput => return Some(TapInput::DisabledByUserInput),
        _ => return None,
    };

    let location = event.location();
    let mut pointer = PointerEvent::new(
        event.get_integer_value_field(SENDER_ID_FIELD),
        kind,
        location.x,
        location.y,
    );
    pointer.click_count = event.get_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE);
    // SAFETY: the event reference is valid for the duration of the callback.
    pointer.timestamp_ns = unsafe { CGEventGetTimestamp(event.as_ptr()) };
    Some(TapInput::Pointer(pointer))
}
