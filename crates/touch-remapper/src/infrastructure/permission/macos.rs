//! macOS accessibility trust check.
//!
//! `AXIsProcessTrusted` reports the grant; `AXIsProcessTrustedWithOptions`
//! with `kAXTrustedCheckOptionPrompt = true` additionally shows the system
//! prompt that links to System Settings → Privacy & Security → Accessibility.

#![cfg(target_os = "macos")]

use async_trait::async_trait;
use core_foundation::base::TCFType;
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};
use tracing::info;

use super::PermissionGate;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    static kAXTrustedCheckOptionPrompt: CFStringRef;
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
}

/// [`PermissionGate`] backed by the Accessibility trust database.
#[derive(Default)]
pub struct MacosPermissionGate;

impl MacosPermissionGate {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PermissionGate for MacosPermissionGate {
    async fn check(&self) -> bool {
        // SAFETY: no arguments; reads the caller's trust state.
        unsafe { AXIsProcessTrusted() }
    }

    async fn request(&self) -> bool {
        // SAFETY: the key is an immutable framework constant; the dictionary
        // outlives the call.
        let trusted = unsafe {
            let key = CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt);
            let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
            AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef())
        };
        if !trusted {
            info!("accessibility permission requested; waiting for the user to grant it");
        }
        trusted
    }
}
