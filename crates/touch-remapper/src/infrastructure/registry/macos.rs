//! macOS IORegistry backend.
//!
//! Interfaces are found by enumerating `IOUSBHostInterface` services (falling
//! back to the legacy `IOUSBInterface` class) and filtering on their
//! `idVendor`/`idProduct` properties.  Nodes are re-looked-up by entry ID on
//! every query with `IORegistryEntryIDMatching`, so a node that disappears
//! between calls yields [`RegistryError::NodeGone`] instead of a dangling
//! handle.
//!
//! # Safety
//!
//! All IOKit calls are FFI.  Every `io_object_t` obtained here is released
//! through [`OwnedObject`]'s `Drop`, and every CF property is wrapped under
//! the create rule so it is released too.

#![cfg(target_os = "macos")]

use std::ffi::{c_char, CString};

use core_foundation::base::{kCFAllocatorDefault, CFType, TCFType};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use io_kit_sys::types::{io_iterator_t, io_object_t};
use io_kit_sys::{
    kIOMasterPortDefault, IOIteratorNext, IOObjectRelease, IORegistryEntryCreateCFProperty,
    IORegistryEntryGetRegistryEntryID, IORegistryEntryIDMatching, IOServiceGetMatchingService,
    IOServiceGetMatchingServices, IOServiceMatching,
};
use tracing::debug;

use super::{HardwareRegistry, RegistryError, RegistryNode};

const INTERFACE_CLASSES: [&str; 2] = ["IOUSBHostInterface", "IOUSBInterface"];
const SERVICE_PLANE: &[u8] = b"IOService\0";
const KERN_SUCCESS: i32 = 0;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IORegistryEntryGetChildIterator(
        entry: io_object_t,
        plane: *const c_char,
        iterator: *mut io_iterator_t,
    ) -> i32;
}

/// Releases an IOKit object on drop.
struct OwnedObject(io_object_t);

impl Drop for OwnedObject {
    fn drop(&mut self) {
        if self.0 != 0 {
            // SAFETY: the object was returned to us with +1 retain and is released once.
            unsafe {
                IOObjectRelease(self.0);
            }
        }
    }
}

/// Drains an IOKit iterator, taking ownership of every object.
fn drain(iterator: io_iterator_t) -> Vec<OwnedObject> {
    let iterator = OwnedObject(iterator);
    let mut objects = Vec::new();
    loop {
        // SAFETY: `iterator` is a valid iterator owned by this function.
        let next = unsafe { IOIteratorNext(iterator.0) };
        if next == 0 {
            break;
        }
        objects.push(OwnedObject(next));
    }
    objects
}

fn entry_id(object: &OwnedObject) -> Option<u64> {
    let mut id = 0u64;
    // SAFETY: `object` is a live registry entry; `id` is a valid out pointer.
    let kr = unsafe { IORegistryEntryGetRegistryEntryID(object.0, &mut id) };
    (kr == KERN_SUCCESS).then_some(id)
}

fn property(object: &OwnedObject, key: &str) -> Option<CFType> {
    let key = CFString::new(key);
    // SAFETY: valid entry and key; the returned reference follows the create rule.
    let value = unsafe {
        IORegistryEntryCreateCFProperty(
            object.0,
            key.as_concrete_TypeRef(),
            kCFAllocatorDefault,
            0,
        )
    };
    if value.is_null() {
        return None;
    }
    // SAFETY: non-null, +1 retained CF object.
    Some(unsafe { CFType::wrap_under_create_rule(value) })
}

fn number_property(object: &OwnedObject, key: &str) -> Option<i64> {
    property(object, key)?.downcast::<CFNumber>()?.to_i64()
}

fn string_property(object: &OwnedObject, key: &str) -> Option<String> {
    Some(property(object, key)?.downcast::<CFString>()?.to_string())
}

/// IORegistry-backed [`HardwareRegistry`].
#[derive(Default)]
pub struct MacosRegistry;

impl MacosRegistry {
    pub fn new() -> Self {
        Self
    }

    fn lookup(&self, node: RegistryNode) -> Result<OwnedObject, RegistryError> {
        // SAFETY: IORegistryEntryIDMatching returns a dictionary consumed by
        // IOServiceGetMatchingService.
        let service = unsafe {
            let matching = IORegistryEntryIDMatching(node.0);
            IOServiceGetMatchingService(kIOMasterPortDefault, matching as _)
        };
        if service == 0 {
            return Err(RegistryError::NodeGone(node.0));
        }
        Ok(OwnedObject(service))
    }

    fn services_of_class(&self, class: &str) -> Result<Vec<OwnedObject>, RegistryError> {
        let class = CString::new(class)
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        let mut iterator: io_iterator_t = 0;
        // SAFETY: IOServiceMatching returns a dictionary consumed by
        // IOServiceGetMatchingServices; `iterator` is a valid out pointer.
        let kr = unsafe {
            let matching = IOServiceMatching(class.as_ptr());
            IOServiceGetMatchingServices(kIOMasterPortDefault, matching as _, &mut iterator)
        };
        if kr != KERN_SUCCESS {
            return Err(RegistryError::Unavailable(format!(
                "IOServiceGetMatchingServices failed: {kr:#x}"
            )));
        }
        Ok(drain(iterator))
    }
}

impl HardwareRegistry for MacosRegistry {
    fn interfaces_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Vec<RegistryNode>, RegistryError> {
        let mut nodes = Vec::new();
        for class in INTERFACE_CLASSES {
            for service in self.services_of_class(class)? {
                let vendor = number_property(&service, "idVendor");
                let product = number_property(&service, "idProduct");
                if vendor != Some(i64::from(vendor_id)) || product != Some(i64::from(product_id)) {
                    continue;
                }
                if let Some(id) = entry_id(&service) {
                    nodes.push(RegistryNode(id));
                }
            }
            if !nodes.is_empty() {
                break;
            }
        }
        debug!(vendor_id, product_id, count = nodes.len(), "matched USB interfaces");
        Ok(nodes)
    }

    fn children(&self, node: RegistryNode) -> Result<Vec<RegistryNode>, RegistryError> {
        let entry = self.lookup(node)?;
        let mut iterator: io_iterator_t = 0;
        // SAFETY: valid entry, NUL-terminated plane name, valid out pointer.
        let kr = unsafe {
            IORegistryEntryGetChildIterator(entry.0, SERVICE_PLANE.as_ptr().cast(), &mut iterator)
        };
        if kr != KERN_SUCCESS {
            return Err(RegistryError::Unavailable(format!(
                "IORegistryEntryGetChildIterator failed: {kr:#x}"
            )));
        }
        Ok(drain(iterator)
            .iter()
            .filter_map(entry_id)
            .map(RegistryNode)
            .collect())
    }

    fn primary_usage(&self, node: RegistryNode) -> Option<(u32, u32)> {
        let entry = self.lookup(node).ok()?;
        let page = number_property(&entry, "PrimaryUsagePage")?;
        let usage = number_property(&entry, "PrimaryUsage")?;
        Some((u32::try_from(page).ok()?, u32::try_from(usage).ok()?))
    }

    fn label(&self, node: RegistryNode) -> Option<String> {
        let entry = self.lookup(node).ok()?;
        string_property(&entry, "Product")
            .or_else(|| string_property(&entry, "USB Interface Name"))
            .or_else(|| string_property(&entry, "USB Product Name"))
    }
}
