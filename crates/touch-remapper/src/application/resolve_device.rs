//! Device identity resolution.
//!
//! The host labels each pointer event with a registry entry ID, but which ID
//! depends on the layer that produced the event: the USB interface, the HID
//! driver beneath it, or one of several HID event services further down.
//! Matching on a single ID therefore misses events.  This use case walks the
//! registry once, at startup or calibration, and collects every ID that can
//! label events from the touch controller.
//!
//! # Algorithm
//!
//! 1. Find every logical interface of the configured vendor/product pair.
//! 2. For each interface, walk its descendants breadth-first, at most
//!    [`MAX_WALK_DEPTH`] levels deep, with a visited set so a cyclic or
//!    malformed topology cannot loop.
//! 3. Keep the interface only if some node in its subtree advertises a
//!    digitizer usage.  A vendor/product match alone is not proof of a touch
//!    device; controllers often expose keyboard or vendor interfaces too.
//! 4. Return the union of all IDs of the kept interfaces and a label.
//!
//! Any failure, including an unreachable registry, is reported as
//! [`TouchError::DeviceNotFound`]; the caller falls back to learning mode.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use touch_core::DeviceIdentitySet;

use crate::application::error::TouchError;
use crate::infrastructure::registry::{is_digitizer_usage, HardwareRegistry, RegistryNode};

/// Levels below an interface that are searched (the interface itself is level 0).
pub const MAX_WALK_DEPTH: usize = 4;

/// Everything discovery learned about the touch controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDevice {
    pub identities: DeviceIdentitySet,
    pub label: String,
}

/// One-shot resolver over a [`HardwareRegistry`].
pub struct DeviceIdentityResolver<'a> {
    registry: &'a dyn HardwareRegistry,
}

/// IDs and digitizer evidence collected below one interface.
struct Subtree {
    identities: DeviceIdentitySet,
    is_digitizer: bool,
    label: Option<String>,
}

impl<'a> DeviceIdentityResolver<'a> {
    pub fn new(registry: &'a dyn HardwareRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the identity set of the device `vendor_id`/`product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TouchError::DeviceNotFound`] if no interface matches, if no
    /// matching interface carries a digitizer usage, or if the registry
    /// cannot be queried.
    pub fn resolve(&self, vendor_id: u16, product_id: u16) -> Result<ResolvedDevice, TouchError> {
        let not_found = TouchError::DeviceNotFound {
            vendor_id,
            product_id,
        };

        let interfaces = match self.registry.interfaces_matching(vendor_id, product_id) {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!(error = %e, "hardware registry query failed");
                return Err(not_found);
            }
        };
        if interfaces.is_empty() {
            debug!(vendor_id, product_id, "no interface matches vendor/product");
            return Err(not_found);
        }

        let mut identities = DeviceIdentitySet::new();
        let mut label = None;
        let mut visited = HashSet::new();

        for interface in interfaces {
            let subtree = self.walk(interface, &mut visited);
            if !subtree.is_digitizer {
                debug!(interface = interface.0, "interface has no digitizer usage; skipped");
                continue;
            }
            identities.extend(&subtree.identities);
            if label.is_none() {
                label = subtree.label;
            }
        }

        if identities.is_empty() {
            return Err(not_found);
        }

        let label = label.unwrap_or_else(|| format!("{vendor_id:04x}:{product_id:04x}"));
        info!(%label, identities = %identities, "resolved touch digitizer");
        Ok(ResolvedDevice { identities, label })
    }

    /// Breadth-first walk below `root`, bounded by depth and `visited`.
    ///
    /// `visited` is shared across interfaces so a node reachable from two
    /// interfaces is attributed to the first one only.
    fn walk(&self, root: RegistryNode, visited: &mut HashSet<RegistryNode>) -> Subtree {
        let mut subtree = Subtree {
            identities: DeviceIdentitySet::new(),
            is_digitizer: false,
            label: None,
        };
        let mut queue = VecDeque::from([(root, 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            subtree.identities.insert(node.identity());
            if self.registry.primary_usage(node).is_some_and(is_digitizer_usage) {
                subtree.is_digitizer = true;
            }
            if subtree.label.is_none() {
                subtree.label = self.registry.label(node);
            }

            if depth == MAX_WALK_DEPTH {
                continue;
            }
            match self.registry.children(node) {
                Ok(children) => queue.extend(children.into_iter().map(|c| (c, depth + 1))),
                // A node vanishing mid-walk only truncates this branch.
                Err(e) => debug!(node = node.0, error = %e, "could not list children"),
            }
        }
        subtree
    }
}
