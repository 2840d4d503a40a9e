//! Generation-checked body storage.
//!
//! Bodies live in slots that never move. Removing a body empties its slot and
//! bumps the slot generation, so a [`BodyHandle`] taken before the removal
//! resolves to `None` instead of aliasing whatever is inserted next.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::RigidBody;

/// Opaque reference to a body stored in a [`BodyArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Create a handle from raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<RigidBody>,
}

/// Slot arena of rigid bodies.
///
/// Iteration visits live bodies in slot index order.
#[derive(Debug, Clone, Default)]
pub struct BodyArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bodies are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a body, reusing the most recently freed slot if any.
    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle::new(index, 0)
    }

    /// Remove and return the body behind `handle`.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(body)
    }

    /// Whether `handle` refers to a live body.
    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Borrow the body behind `handle`.
    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    /// Mutably borrow the body behind `handle`.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    /// Drop every body. Handles issued before the call become stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(u32::try_from(index).unwrap_or(u32::MAX));
        }
        self.len = 0;
    }

    /// Live bodies with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle::new(index as u32, slot.generation),
                    body,
                )
            })
        })
    }

    /// Mutable iteration over live bodies, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.body
                .as_mut()
                .map(|body| (BodyHandle::new(index as u32, generation), body))
        })
    }

    /// Handles of all live bodies, in slot order.
    #[must_use]
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Pose, Shape};

    fn sphere() -> RigidBody {
        RigidBody::new(Shape::sphere(0.5), 1.0, Pose::identity())
    }

    #[test]
    fn test_insert_and_get() {
        let mut arena = BodyArena::new();
        let a = arena.insert(sphere().with_name("a"));
        let b = arena.insert(sphere().with_name("b"));

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().name.as_deref(), Some("a"));
        assert_eq!(arena.get(b).unwrap().name.as_deref(), Some("b"));
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let mut arena = BodyArena::new();
        let a = arena.insert(sphere());
        assert!(arena.remove(a).is_some());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut arena = BodyArena::new();
        let a = arena.insert(sphere());
        let _b = arena.insert(sphere());
        arena.remove(a);

        let c = arena.insert(sphere().with_name("c"));
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(c).unwrap().name.as_deref(), Some("c"));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut arena = BodyArena::new();
        let handles: Vec<_> = (0..3).map(|_| arena.insert(sphere())).collect();
        arena.remove(handles[0]);
        arena.remove(handles[2]);

        assert_eq!(arena.insert(sphere()).index(), 2);
        assert_eq!(arena.insert(sphere()).index(), 0);
        assert_eq!(arena.insert(sphere()).index(), 3);
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena = BodyArena::new();
        let a = arena.insert(sphere());
        let b = arena.insert(sphere());
        arena.clear();

        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));

        let c = arena.insert(sphere());
        assert_eq!(c.index(), 0);
        assert!(!arena.contains(a));
    }

    #[test]
    fn test_iteration_in_slot_order() {
        let mut arena = BodyArena::new();
        let handles: Vec<_> = (0..4).map(|_| arena.insert(sphere())).collect();
        arena.remove(handles[1]);

        let seen: Vec<_> = arena.iter().map(|(h, _)| h).collect();
        assert_eq!(seen, vec![handles[0], handles[2], handles[3]]);
        assert_eq!(arena.handles(), seen);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(BodyHandle::new(3, 7).to_string(), "Body(3v7)");
    }
}
