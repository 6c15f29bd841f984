//! In-memory hardware registry for tests.
//!
//! Build a tree with [`MockRegistry::add_interface`] and
//! [`MockRegistry::add_child`]; edges are stored as given, so tests can create
//! cycles and deep chains to exercise the resolver's bounds.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Mutex,
};

use super::{HardwareRegistry, RegistryError, RegistryNode};

#[derive(Default)]
struct Tree {
    interfaces: Vec<(u16, u16, RegistryNode)>,
    children: HashMap<RegistryNode, Vec<RegistryNode>>,
    usages: HashMap<RegistryNode, (u32, u32)>,
    labels: HashMap<RegistryNode, String>,
}

/// A hand-built registry tree.
#[derive(Default)]
pub struct MockRegistry {
    tree: Mutex<Tree>,
    unavailable: AtomicBool,
    children_queries: AtomicU32,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` as an interface of the device `vendor_id`/`product_id`.
    pub fn add_interface(&self, vendor_id: u16, product_id: u16, node: u64) -> &Self {
        self.tree
            .lock()
            .expect("lock poisoned")
            .interfaces
            .push((vendor_id, product_id, RegistryNode(node)));
        self
    }

    /// Adds an edge `parent -> child`.
    pub fn add_child(&self, parent: u64, child: u64) -> &Self {
        self.tree
            .lock()
            .expect("lock poisoned")
            .children
            .entry(RegistryNode(parent))
            .or_default()
            .push(RegistryNode(child));
        self
    }

    /// Sets the primary HID usage advertised at `node`.
    pub fn set_usage(&self, node: u64, usage_page: u32, usage: u32) -> &Self {
        self.tree
            .lock()
            .expect("lock poisoned")
            .usages
            .insert(RegistryNode(node), (usage_page, usage));
        self
    }

    pub fn set_label(&self, node: u64, label: &str) -> &Self {
        self.tree
            .lock()
            .expect("lock poisoned")
            .labels
            .insert(RegistryNode(node), label.to_string());
        self
    }

    /// Makes every query fail as if the registry could not be opened.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `children` calls served so far.
    pub fn children_queries(&self) -> u32 {
        self.children_queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("mock registry offline".to_string()));
        }
        Ok(())
    }
}

impl HardwareRegistry for MockRegistry {
    fn interfaces_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Vec<RegistryNode>, RegistryError> {
        self.check_available()?;
        let tree = self.tree.lock().expect("lock poisoned");
        Ok(tree
            .interfaces
            .iter()
            .filter(|(v, p, _)| *v == vendor_id && *p == product_id)
            .map(|(_, _, node)| *node)
            .collect())
    }

    fn children(&self, node: RegistryNode) -> Result<Vec<RegistryNode>, RegistryError> {
        self.check_available()?;
        self.children_queries.fetch_add(1, Ordering::SeqCst);
        let tree = self.tree.lock().expect("lock poisoned");
        Ok(tree.children.get(&node).cloned().unwrap_or_default())
    }

    fn primary_usage(&self, node: RegistryNode) -> Option<(u32, u32)> {
        self.tree.lock().expect("lock poisoned").usages.get(&node).copied()
    }

    fn label(&self, node: RegistryNode) -> Option<String> {
        self.tree.lock().expect("lock poisoned").labels.get(&node).cloned()
    }
}
