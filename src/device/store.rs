//! Device Handle Store (component A, spec §4.A).
//!
//! Grounded on `service/mod.rs`'s device cache, simplified for the
//! single-threaded event-loop model of spec §5: the controller is the only
//! accessor, so a plain `HashMap` plus an insertion-order `Vec` stands in
//! for the source's intrusive circular list (spec §9, "Intrusive linked
//! lists -> store abstraction").

use crate::device::handle::DeviceHandle;
use crate::domain::DeviceName;
use crate::error::CoreError;
use std::collections::HashMap;

/// Owns every live `DeviceHandle`. No handle outlives the store.
#[derive(Debug, Default)]
pub struct DeviceHandleStore {
    handles: HashMap<DeviceName, DeviceHandle>,
    order: Vec<DeviceName>,
}

impl DeviceHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new handle and insert it. The caller is responsible for
    /// name-collision policy (spec §4.A precondition); this returns a
    /// `ConsistencyFault` on collision rather than silently overwriting.
    pub fn create(
        &mut self,
        name: impl Into<DeviceName>,
        domain: impl Into<String>,
    ) -> Result<&mut DeviceHandle, CoreError> {
        let name = name.into();
        if self.handles.contains_key(&name) {
            return Err(CoreError::ConsistencyFault(format!(
                "device '{name}' already exists"
            )));
        }
        tracing::debug!(device = %name, "creating device handle");
        let handle = DeviceHandle::new(name.clone(), domain);
        self.handles.insert(name.clone(), handle);
        self.order.push(name.clone());
        Ok(self.handles.get_mut(&name).expect("just inserted"))
    }

    pub fn find(&self, name: &DeviceName) -> Option<&DeviceHandle> {
        self.handles.get(name)
    }

    pub fn find_mut(&mut self, name: &DeviceName) -> Option<&mut DeviceHandle> {
        self.handles.get_mut(name)
    }

    /// Insertion-order iteration (spec §4.A Iterate). Removal during
    /// iteration is forbidden by this API's shape (an immutable borrow of
    /// `self` is held for the whole iterator's lifetime).
    pub fn iter(&self) -> impl Iterator<Item = &DeviceHandle> {
        self.order.iter().filter_map(move |name| self.handles.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &DeviceName> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Remove a handle by name, releasing every subordinate allocation with
    /// it (spec §4.A Remove).
    pub fn remove(&mut self, name: &DeviceName) -> Option<DeviceHandle> {
        let removed = self.handles.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
            tracing::debug!(device = %name, "removed device handle");
        }
        removed
    }

    /// Release every handle (spec §4.A Clear, used at shutdown).
    pub fn clear(&mut self) {
        tracing::debug!(count = self.handles.len(), "clearing device handle store");
        self.handles.clear();
        self.order.clear();
    }

    /// Names of devices whose schema inventory is currently known —
    /// the "shallow query to the backend" step 2 of §4.F's resolver needs
    /// without this being a backend round-trip, since the store already
    /// holds that state locally.
    pub fn names_with_known_inventory(&self) -> impl Iterator<Item = &DeviceName> {
        self.order
            .iter()
            .filter(move |name| self.handles.get(*name).map_or(false, |h| h.inventory().is_some()))
    }
}
