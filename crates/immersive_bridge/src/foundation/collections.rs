//! Handle registry built on generational slot maps
//!
//! Every identity that crosses the host/engine boundary is minted by a
//! [`HandleRegistry`]. A handle pairs a slot map key with the serial of the
//! registry that issued it. Keys carry a generation, so a handle that was
//! invalidated never resolves to a resource that later reuses its slot, and
//! registry serials are unique for the life of the process, so a handle
//! never resolves in a registry that did not issue it.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, DefaultKey, Key, KeyData, SlotMap};

use crate::error::{BridgeError, BridgeResult};

/// Serial of the next registry; zero is never issued
static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Identity minted by a [`HandleRegistry`]
pub trait Handle: Copy + Eq + Hash + fmt::Debug {
    /// Assemble a handle from its issuing registry and slot
    fn from_parts(registry: u64, slot: KeyData) -> Self;

    /// Serial of the registry that issued the handle
    fn registry(&self) -> u64;

    /// Slot within the issuing registry
    fn slot(&self) -> KeyData;
}

macro_rules! define_handles {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $name {
                registry: u64,
                slot: KeyData,
            }

            impl Handle for $name {
                fn from_parts(registry: u64, slot: KeyData) -> Self {
                    Self { registry, slot }
                }

                fn registry(&self) -> u64 {
                    self.registry
                }

                fn slot(&self) -> KeyData {
                    self.slot
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({}:{:?})", stringify!($name), self.registry, self.slot)
                }
            }
        )*
    };
}

define_handles! {
    /// Identity of one engine instance
    InstanceId;
    /// Identity of a scene root supplied by the scene-graph collaborator
    SceneHandle;
    /// Identity of a scene node supplied by the scene-graph collaborator
    NodeHandle;
    /// Identity of a registered per-frame callback
    ListenerHandle;
}

new_key_type! {
    /// Completion token of one outstanding spatial query
    pub struct QueryToken;
}

/// Which kind of identity a registry hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Engine instance identity
    Instance,
    /// Scene root identity
    Scene,
    /// Scene node identity
    Node,
    /// Frame listener identity
    FrameListener,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "engine instance",
            Self::Scene => "scene root",
            Self::Node => "scene node",
            Self::FrameListener => "frame listener",
        };
        f.write_str(name)
    }
}

/// Maps opaque identities to the live resources they name
///
/// Resolving a handle that was never registered here, or that has been
/// invalidated, fails with [`BridgeError::DanglingHandle`].
pub struct HandleRegistry<K: Handle, T> {
    kind: HandleKind,
    serial: u64,
    slots: SlotMap<DefaultKey, T>,
    marker: PhantomData<fn() -> K>,
}

impl<K: Handle, T> HandleRegistry<K, T> {
    /// Create an empty registry for identities of `kind`
    pub fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            serial: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            slots: SlotMap::new(),
            marker: PhantomData,
        }
    }

    /// Kind of identity this registry hands out
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Store `resource` and return its new identity
    pub fn register(&mut self, resource: T) -> K {
        let slot = self.slots.insert(resource);
        K::from_parts(self.serial, slot.data())
    }

    /// Look up the resource named by `key`
    pub fn resolve(&self, key: K) -> BridgeResult<&T> {
        self.local(key)
            .and_then(|slot| self.slots.get(slot))
            .ok_or(BridgeError::DanglingHandle { kind: self.kind })
    }

    /// Look up the resource named by `key` for mutation
    pub fn resolve_mut(&mut self, key: K) -> BridgeResult<&mut T> {
        let kind = self.kind;
        let slot = self.local(key).ok_or(BridgeError::DanglingHandle { kind })?;
        self.slots.get_mut(slot).ok_or(BridgeError::DanglingHandle { kind })
    }

    /// Invalidate `key` and hand back the resource it named
    ///
    /// The registry drops its reference; the caller decides whether the
    /// resource is destroyed or returned to its owning domain.
    pub fn invalidate(&mut self, key: K) -> BridgeResult<T> {
        let kind = self.kind;
        let slot = self.local(key).ok_or(BridgeError::DanglingHandle { kind })?;
        self.slots.remove(slot).ok_or(BridgeError::DanglingHandle { kind })
    }

    /// Whether `key` currently resolves
    pub fn contains(&self, key: K) -> bool {
        self.local(key)
            .is_some_and(|slot| self.slots.contains_key(slot))
    }

    /// Number of live identities
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no identity is live
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live identities
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.keys().map(|slot| self.handle(slot))
    }

    /// Live identities with their resources
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        let serial = self.serial;
        self.slots
            .iter()
            .map(move |(slot, resource)| (K::from_parts(serial, slot.data()), resource))
    }

    /// Live identities with mutable access to their resources
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        let serial = self.serial;
        self.slots
            .iter_mut()
            .map(move |(slot, resource)| (K::from_parts(serial, slot.data()), resource))
    }

    /// Slot of `key` if this registry issued it
    fn local(&self, key: K) -> Option<DefaultKey> {
        (key.registry() == self.serial).then(|| key.slot().into())
    }

    fn handle(&self, slot: DefaultKey) -> K {
        K::from_parts(self.serial, slot.data())
    }
}

impl<K: Handle, T> fmt::Debug for HandleRegistry<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("kind", &self.kind)
            .field("serial", &self.serial)
            .field("live", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_after_invalidate_is_dangling() {
        let mut registry: HandleRegistry<SceneHandle, &str> =
            HandleRegistry::new(HandleKind::Scene);
        let key = registry.register("lobby");

        assert_eq!(registry.resolve(key), Ok(&"lobby"));
        assert_eq!(registry.invalidate(key), Ok("lobby"));
        assert_eq!(
            registry.resolve(key),
            Err(BridgeError::DanglingHandle { kind: HandleKind::Scene })
        );
        assert!(registry.invalidate(key).is_err());
    }

    #[test]
    fn test_reused_slot_does_not_alias_stale_key() {
        let mut registry: HandleRegistry<InstanceId, u32> =
            HandleRegistry::new(HandleKind::Instance);
        let stale = registry.register(1);
        registry.invalidate(stale).unwrap();

        let fresh = registry.register(2);
        assert_ne!(stale, fresh);
        assert!(registry.resolve(stale).is_err());
        assert_eq!(registry.resolve(fresh), Ok(&2));
    }

    #[test]
    fn test_unregistered_key_is_dangling() {
        let registry: HandleRegistry<NodeHandle, u32> = HandleRegistry::new(HandleKind::Node);
        assert_eq!(
            registry.resolve(NodeHandle::default()),
            Err(BridgeError::DanglingHandle { kind: HandleKind::Node })
        );
    }

    #[test]
    fn test_handle_from_another_registry_is_dangling() {
        let mut first: HandleRegistry<InstanceId, &str> =
            HandleRegistry::new(HandleKind::Instance);
        let mut second: HandleRegistry<InstanceId, &str> =
            HandleRegistry::new(HandleKind::Instance);
        let a = first.register("a");
        let b = second.register("b");

        assert_ne!(a, b);
        assert_eq!(a.slot(), b.slot());
        assert!(!second.contains(a));
        assert!(second.resolve(a).is_err());
        assert!(second.invalidate(a).is_err());
        assert_eq!(first.resolve(a), Ok(&"a"));
        assert_eq!(second.keys().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_len_tracks_live_identities() {
        let mut registry: HandleRegistry<ListenerHandle, ()> =
            HandleRegistry::new(HandleKind::FrameListener);
        assert!(registry.is_empty());

        let a = registry.register(());
        let _b = registry.register(());
        assert_eq!(registry.len(), 2);

        registry.invalidate(a).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys().count(), 1);
    }
}
