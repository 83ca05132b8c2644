// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage for cache entries.
//!
//! Entries refer to each other (list neighbours, owning atlas) by [`EntryId`]
//! instead of by reference. Freed slots are threaded onto an intrusive free
//! list and reused, and each reuse bumps the slot generation so that an id
//! kept past the free of its entry no longer resolves.

/// Stable handle to an entry stored in an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EntryId {
    index: u32,
    generation: u32,
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    first_free: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            first_free: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The id the next call to [`Arena::insert`] will return.
    pub(crate) fn next_id(&self) -> EntryId {
        match self.first_free {
            Some(index) => match self.slots[index as usize] {
                Slot::Vacant { generation, .. } => EntryId { index, generation },
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            },
            None => EntryId {
                index: self.next_index(),
                generation: 0,
            },
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> EntryId {
        let id = self.next_id();
        match self.first_free {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                if let Slot::Vacant { next_free, .. } = *slot {
                    self.first_free = next_free;
                }
                *slot = Slot::Occupied {
                    generation: id.generation,
                    value,
                };
            }
            None => self.slots.push(Slot::Occupied {
                generation: id.generation,
                value,
            }),
        }
        self.len += 1;
        id
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&T> {
        match self.slots.get(id.index as usize)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        match self.slots.get_mut(id.index as usize)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Removes the entry and returns it, or `None` if the id is stale.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }
        let vacant = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.first_free,
        };
        let Slot::Occupied { value, .. } = core::mem::replace(slot, vacant) else {
            unreachable!("slot was checked to be occupied");
        };
        self.first_free = Some(id.index);
        self.len -= 1;
        Some(value)
    }

    /// Iterates over all occupied slots in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntryId, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    EntryId {
                        index: slot_index(index),
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    fn next_index(&self) -> u32 {
        slot_index(self.slots.len())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the cache never holds anywhere near u32::MAX entries"
)]
fn slot_index(index: usize) -> u32 {
    debug_assert!(index < u32::MAX as usize, "arena index overflow");
    index as u32
}
