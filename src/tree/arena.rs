//! Arena storage for MPQ-tree nodes
//!
//! Nodes are addressed by `NodeId` handles into a slot vector. Freed slots go
//! on a free list and are reused by later allocations, so handles stay small
//! and parent/child links never form ownership cycles.

use std::fmt;

/// Stable handle of a tree node
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Raw slot index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    data: Option<T>,
    next_free: Option<u32>,
}

/// Slot vector with free-list reuse
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    live: usize,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Store `data`, reusing the most recently freed slot if any
    pub(crate) fn allocate(&mut self, data: T) -> NodeId {
        self.live += 1;
        match self.free_head {
            Some(idx) => {
                let slot = &mut self.slots[idx as usize];
                debug_assert!(slot.data.is_none(), "free slot still holds data");
                self.free_head = slot.next_free.take();
                slot.data = Some(data);
                NodeId(idx)
            }
            None => {
                let idx = self.slots.len() as u32;
                self.slots.push(Slot {
                    data: Some(data),
                    next_free: None,
                });
                NodeId(idx)
            }
        }
    }

    /// Free the slot behind `id`, returning its data
    pub(crate) fn release(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        let data = slot.data.take()?;
        slot.next_free = self.free_head;
        self.free_head = Some(id.0);
        self.live -= 1;
        Some(data)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).and_then(|slot| slot.data.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.data.as_mut())
    }

    /// Handles of all live slots, ascending
    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.data.is_some())
            .map(|(idx, _)| NodeId(idx as u32))
    }

    /// Number of live nodes
    pub(crate) fn live_count(&self) -> usize {
        self.live
    }
}
