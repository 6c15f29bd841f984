//! Hardware registry infrastructure.
//!
//! The host keeps a tree of every attached device: a USB device node, one
//! node per logical interface beneath it, and drivers and HID services
//! beneath those.  Each node carries a 64-bit registry entry ID, and those IDs
//! are what pointer events report as their device identity, so walking the
//! tree below the touch controller's interfaces yields every identity the
//! controller may use.
//!
//! [`HardwareRegistry`] exposes just the queries the resolver needs.  The
//! resolver owns the walk itself (bounded depth, visited set) so a hostile or
//! cyclic topology cannot make the registry backend recurse.

use thiserror::Error;

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

/// A node in the hardware registry, addressed by its registry entry ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryNode(pub u64);

impl RegistryNode {
    /// The entry ID as it appears in a pointer event's identity field.
    pub fn identity(self) -> i64 {
        self.0 as i64
    }
}

/// HID usage page for digitizers.
pub const USAGE_PAGE_DIGITIZER: u32 = 0x0D;
/// Digitizer usage: generic digitizer.
pub const USAGE_DIGITIZER: u32 = 0x01;
/// Digitizer usage: touch screen.
pub const USAGE_TOUCH_SCREEN: u32 = 0x04;

/// Error type for registry queries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("hardware registry unavailable: {0}")]
    Unavailable(String),
    #[error("registry node {0:#x} no longer exists")]
    NodeGone(u64),
    #[error("access to the hardware registry was denied")]
    AccessDenied,
}

/// Read-only view of the host's hardware registry.
pub trait HardwareRegistry: Send + Sync {
    /// Every logical interface whose parent device reports `vendor_id`/`product_id`.
    fn interfaces_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Vec<RegistryNode>, RegistryError>;

    /// Immediate children of `node`.
    fn children(&self, node: RegistryNode) -> Result<Vec<RegistryNode>, RegistryError>;

    /// `(usage_page, usage)` of the primary HID usage advertised at `node`,
    /// if the node is a HID service.
    fn primary_usage(&self, node: RegistryNode) -> Option<(u32, u32)>;

    /// Human-readable product name at `node`, if any.
    fn label(&self, node: RegistryNode) -> Option<String>;
}

/// `true` for a digitizer touch screen or generic digitizer usage.
pub fn is_digitizer_usage(usage: (u32, u32)) -> bool {
    usage.0 == USAGE_PAGE_DIGITIZER && matches!(usage.1, USAGE_TOUCH_SCREEN | USAGE_DIGITIZER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_screen_and_generic_digitizer_are_digitizer_usages() {
        assert!(is_digitizer_usage((0x0D, 0x04)));
        assert!(is_digitizer_usage((0x0D, 0x01)));
    }

    #[test]
    fn test_pen_and_mouse_are_not_digitizer_usages() {
        // Pen (0x0D/0x02) and generic-desktop mouse (0x01/0x02).
        assert!(!is_digitizer_usage((0x0D, 0x02)));
        assert!(!is_digitizer_usage((0x01, 0x02)));
    }

    #[test]
    fn test_node_identity_preserves_bits() {
        let node = RegistryNode(0x1000_0a3f_u64);
        assert_eq!(node.identity(), 0x1000_0a3f_i64);
    }
}
