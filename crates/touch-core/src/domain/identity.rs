//! The set of host identity values that denote one physical touch digitizer.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::event::DeviceIdentity;

/// Every identity value that may label events from one physical device.
///
/// Several values are normal: different internal layers of the host report
/// different identities for the same hardware.  Once the set is non-empty,
/// events carrying any identity outside it are never touched by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIdentitySet {
    ids: BTreeSet<DeviceIdentity>,
}

impl DeviceIdentitySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding exactly one identity (the result of learning).
    pub fn singleton(id: DeviceIdentity) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// Adds an identity; returns `true` if it was not already present.
    pub fn insert(&mut self, id: DeviceIdentity) -> bool {
        self.ids.insert(id)
    }

    /// Adds every identity from `other`.
    pub fn extend(&mut self, other: &DeviceIdentitySet) {
        self.ids.extend(other.ids.iter().copied());
    }

    pub fn contains(&self, id: DeviceIdentity) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Iterates the identities in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DeviceIdentity> + '_ {
        self.ids.iter().copied()
    }

    /// Returns the identities as a sorted vector.
    pub fn to_vec(&self) -> Vec<DeviceIdentity> {
        self.iter().collect()
    }
}

impl FromIterator<DeviceIdentity> for DeviceIdentitySet {
    fn from_iter<I: IntoIterator<Item = DeviceIdentity>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for DeviceIdentitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_contains_only_that_identity() {
        let set = DeviceIdentitySet::singleton(42);
        assert!(set.contains(42));
        assert!(!set.contains(43));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_iter_deduplicates() {
        let set: DeviceIdentitySet = [7, 3, 7, 11].into_iter().collect();
        assert_eq!(set.to_vec(), vec![3, 7, 11]);
    }

    #[test]
    fn test_display_lists_identities_in_order() {
        let set: DeviceIdentitySet = [4294968875, 12].into_iter().collect();
        assert_eq!(set.to_string(), "{12, 4294968875}");
    }

    #[test]
    fn test_clear_empties_the_set() {
        let mut set = DeviceIdentitySet::singleton(1);
        set.clear();
        assert!(set.is_empty());
    }
}
