//! Window-keyed callback registries.
//!
//! A registry associates per-window state (scale callback, lifecycle
//! subscription, cursor grab) with a window handle. Two storage modes exist:
//! `Bounded` keeps a fixed-capacity array with linear lookup and silently drops
//! registrations once full; `Unbounded` uses a hash map and never drops.

use std::collections::HashMap;

use crate::handle::Handle;

/// Capacity of a bounded registry unless configured otherwise.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    Bounded(usize),
    Unbounded,
}

impl Default for RegistryMode {
    fn default() -> Self {
        RegistryMode::Bounded(DEFAULT_REGISTRY_CAPACITY)
    }
}

/// Outcome of [`WindowRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// The window was already present; its payload was overwritten.
    Updated,
    /// The registry was full; nothing was stored.
    Dropped,
}

#[derive(Debug)]
enum Storage<T> {
    Linear { slots: Vec<(Handle, T)>, capacity: usize },
    Map(HashMap<Handle, T>),
}

#[derive(Debug)]
pub struct WindowRegistry<T> {
    name: &'static str,
    storage: Storage<T>,
}

impl<T> WindowRegistry<T> {
    pub fn new(name: &'static str, mode: RegistryMode) -> Self {
        let storage = match mode {
            RegistryMode::Bounded(capacity) => Storage::Linear {
                slots: Vec::with_capacity(capacity.min(DEFAULT_REGISTRY_CAPACITY)),
                capacity,
            },
            RegistryMode::Unbounded => Storage::Map(HashMap::new()),
        };
        Self { name, storage }
    }

    pub fn register(&mut self, window: Handle, payload: T) -> Registration {
        match &mut self.storage {
            Storage::Linear { slots, capacity } => {
                if let Some(slot) = slots.iter_mut().find(|(h, _)| *h == window) {
                    slot.1 = payload;
                    return Registration::Updated;
                }
                if slots.len() >= *capacity {
                    log::warn!(
                        "{} registry full ({} windows); {} will not receive these callbacks",
                        self.name,
                        capacity,
                        window
                    );
                    return Registration::Dropped;
                }
                slots.push((window, payload));
                Registration::Inserted
            }
            Storage::Map(map) => match map.insert(window, payload) {
                Some(_) => Registration::Updated,
                None => Registration::Inserted,
            },
        }
    }

    pub fn lookup(&self, window: Handle) -> Option<&T> {
        match &self.storage {
            Storage::Linear { slots, .. } => {
                slots.iter().find(|(h, _)| *h == window).map(|(_, p)| p)
            }
            Storage::Map(map) => map.get(&window),
        }
    }

    pub fn lookup_mut(&mut self, window: Handle) -> Option<&mut T> {
        match &mut self.storage {
            Storage::Linear { slots, .. } => {
                slots.iter_mut().find(|(h, _)| *h == window).map(|(_, p)| p)
            }
            Storage::Map(map) => map.get_mut(&window),
        }
    }

    /// Existing payload, or a freshly inserted one. `None` when the registry
    /// is full and the window is not already present.
    pub fn get_or_insert_with(&mut self, window: Handle, make: impl FnOnce() -> T) -> Option<&mut T> {
        if !self.contains(window) && self.register(window, make()) == Registration::Dropped {
            return None;
        }
        self.lookup_mut(window)
    }

    pub fn contains(&self, window: Handle) -> bool {
        self.lookup(window).is_some()
    }

    /// Remove a window's entry (called when the window is destroyed).
    pub fn forget(&mut self, window: Handle) -> Option<T> {
        match &mut self.storage {
            Storage::Linear { slots, .. } => {
                let index = slots.iter().position(|(h, _)| *h == window)?;
                Some(slots.remove(index).1)
            }
            Storage::Map(map) => map.remove(&window),
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Linear { slots, .. } => slots.len(),
            Storage::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Linear { slots, .. } => slots.clear(),
            Storage::Map(map) => map.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    #[test]
    fn test_reregistration_overwrites_in_place() {
        for mode in [RegistryMode::Bounded(4), RegistryMode::Unbounded] {
            let mut reg = WindowRegistry::new("test", mode);
            assert_eq!(reg.register(h(1), "first"), Registration::Inserted);
            assert_eq!(reg.register(h(1), "second"), Registration::Updated);
            assert_eq!(reg.len(), 1);
            assert_eq!(reg.lookup(h(1)), Some(&"second"));
        }
    }

    #[test]
    fn test_bounded_drops_past_capacity() {
        let cap = DEFAULT_REGISTRY_CAPACITY;
        let mut reg = WindowRegistry::new("scale", RegistryMode::default());
        for raw in 1..=cap {
            assert_eq!(reg.register(h(raw), raw), Registration::Inserted);
        }
        assert_eq!(reg.register(h(cap + 1), cap + 1), Registration::Dropped);
        assert_eq!(reg.lookup(h(cap + 1)), None);
        assert_eq!(reg.len(), cap);
        for raw in 1..=cap {
            assert_eq!(reg.lookup(h(raw)), Some(&raw));
        }
        // updating an existing entry still works when full
        assert_eq!(reg.register(h(1), 0), Registration::Updated);
    }

    #[test]
    fn test_unbounded_never_drops() {
        let mut reg = WindowRegistry::new("scale", RegistryMode::Unbounded);
        for raw in 1..=DEFAULT_REGISTRY_CAPACITY + 10 {
            assert_ne!(reg.register(h(raw), ()), Registration::Dropped);
        }
        assert_eq!(reg.len(), DEFAULT_REGISTRY_CAPACITY + 10);
    }

    #[test]
    fn test_forget_frees_a_slot() {
        let mut reg = WindowRegistry::new("lifecycle", RegistryMode::Bounded(1));
        reg.register(h(1), ());
        assert_eq!(reg.register(h(2), ()), Registration::Dropped);
        assert_eq!(reg.forget(h(1)), Some(()));
        assert_eq!(reg.register(h(2), ()), Registration::Inserted);
        assert_eq!(reg.forget(h(9)), None);
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut reg = WindowRegistry::new("cursor", RegistryMode::Bounded(1));
        *reg.get_or_insert_with(h(1), || 0).unwrap() += 5;
        assert_eq!(reg.lookup(h(1)), Some(&5));
        assert!(reg.get_or_insert_with(h(2), || 0).is_none());
    }
}
