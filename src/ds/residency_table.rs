//! Residency table: pinned, weighted, recency-ordered entry storage.
//!
//! One structure owns everything eviction needs to know about an entry
//! besides its payload: the pin count that makes it untouchable, the weight
//! it charges against the budget, and its position in the recency order.
//! Slots are reusable and addressed by stable [`EntryId`] handles, so an
//! outside index can hold ids across mutations without pointer chasing.
//!
//! Entries begin as *placeholders*: they occupy a slot and carry one pin on
//! behalf of their inserter, but stay outside the recency order and the
//! weight accounting until [`publish`](ResidencyTable::publish). Victim
//! selection is built in: [`select_victims`](ResidencyTable::select_victims)
//! walks residents LRU-first, skips pinned slots, and commits to nothing.
//!
//! ```text
//!   slots: Vec<Option<Slot>>      Slot { payload, pin_count, weight,
//!                                        prev, next, resident }
//!
//!   head ─► [MRU] ◄──► [..] ◄──► [LRU] ◄── tail     (residents only)
//!
//!   placeholders: pinned, unlinked, weight 0
//! ```
//!
//! Pinning, publishing, and removal are O(1); victim selection and the
//! purge walk are O(residents).
//!
//! `debug_validate_invariants()` is available in debug/test builds.

/// Stable handle into a [`ResidencyTable`].
///
/// An `EntryId` stays valid until its entry is removed; after removal the
/// slot may be reused by a later `insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug)]
struct Slot<T> {
    payload: T,
    /// Holders currently working on this entry. Non-zero exempts the slot
    /// from victim selection.
    pin_count: u32,
    /// Weight charged against the budget; 0 until published.
    weight: u64,
    prev: Option<EntryId>,
    next: Option<EntryId>,
    /// Published entries are linked into the recency order and counted in
    /// the weight total; placeholders are not.
    resident: bool,
}

/// Entry storage combining slot reuse, pin counts, per-entry weights, and
/// the LRU recency order in one place.
#[derive(Debug)]
pub struct ResidencyTable<T> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    resident_count: usize,
    resident_weight: u64,
}

impl<T> ResidencyTable<T> {
    /// Creates an empty table with room for `capacity` slots before the
    /// first reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            resident_count: 0,
            resident_weight: 0,
        }
    }

    /// Inserts a placeholder and returns its id.
    ///
    /// The new entry starts with one pin, held by the inserter, and is not
    /// resident until [`publish`](Self::publish).
    pub fn insert(&mut self, payload: T) -> EntryId {
        let slot = Slot {
            payload,
            pin_count: 1,
            weight: 0,
            prev: None,
            next: None,
            resident: false,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                EntryId(idx)
            },
            None => {
                self.slots.push(Some(slot));
                EntryId(self.slots.len() - 1)
            },
        }
    }

    /// Makes a placeholder resident: charges `weight` against the budget
    /// and links the entry at the MRU position.
    ///
    /// Returns `false` if `id` is dead or already resident.
    pub fn publish(&mut self, id: EntryId, weight: u64) -> bool {
        match self.slot_mut(id) {
            Some(slot) if !slot.resident => {
                slot.resident = true;
                slot.weight = weight;
            },
            _ => return false,
        }
        self.attach_front(id);
        self.resident_count += 1;
        self.resident_weight += weight;
        true
    }

    /// Adds a pin and refreshes the entry's recency position.
    ///
    /// Returns `false` if `id` is dead. Placeholders can be pinned but have
    /// no recency position to refresh.
    pub fn pin(&mut self, id: EntryId) -> bool {
        let resident = match self.slot_mut(id) {
            Some(slot) => {
                slot.pin_count += 1;
                slot.resident
            },
            None => return false,
        };
        if resident && self.head != Some(id) {
            self.detach(id);
            self.attach_front(id);
        }
        true
    }

    /// Drops one pin.
    pub fn unpin(&mut self, id: EntryId) {
        if let Some(slot) = self.slot_mut(id) {
            debug_assert!(slot.pin_count > 0, "unpin without a matching pin");
            slot.pin_count -= 1;
        }
    }

    /// Removes an entry, unlinking it and refunding its weight if it was
    /// resident, and returns the payload.
    pub fn remove(&mut self, id: EntryId) -> Option<T> {
        if self.slot(id)?.resident {
            self.detach(id);
        }
        let slot = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        if slot.resident {
            self.resident_count -= 1;
            self.resident_weight -= slot.weight;
        }
        Some(slot.payload)
    }

    /// Returns a shared reference to the payload at `id`, if live.
    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.slot(id).map(|slot| &slot.payload)
    }

    /// Returns a mutable reference to the payload at `id`, if live.
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.slot_mut(id).map(|slot| &mut slot.payload)
    }

    /// Returns the least recently used resident, if any.
    pub fn lru(&self) -> Option<EntryId> {
        self.tail
    }

    /// Returns the number of resident entries. Placeholders do not count.
    pub fn resident_len(&self) -> usize {
        self.resident_count
    }

    /// Returns the summed weight of resident entries.
    pub fn resident_weight(&self) -> u64 {
        self.resident_weight
    }

    /// Picks the victims that would make `incoming` additional weight fit
    /// under `capacity`, walking residents LRU-first and skipping pinned
    /// slots.
    ///
    /// Returns an empty set when the candidate already fits, and `None` when
    /// it cannot fit: outright (`incoming > capacity`) or because the
    /// unpinned residents do not free enough. Selection never mutates the
    /// table; the caller decides whether to remove the victims.
    pub fn select_victims(&self, incoming: u64, capacity: u64) -> Option<Vec<EntryId>> {
        if incoming > capacity {
            return None;
        }
        if self.resident_weight + incoming <= capacity {
            return Some(Vec::new());
        }

        let mut victims = Vec::new();
        let mut remaining = self.resident_weight;
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            let slot = self.slot(id)?;
            cursor = slot.prev;
            if slot.pin_count > 0 {
                continue;
            }
            victims.push(id);
            remaining -= slot.weight;
            if remaining + incoming <= capacity {
                return Some(victims);
            }
        }
        None
    }

    /// Returns every unpinned resident, LRU-first.
    pub fn unpinned_residents(&self) -> Vec<EntryId> {
        let mut ids = Vec::new();
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            let Some(slot) = self.slot(id) else { break };
            cursor = slot.prev;
            if slot.pin_count == 0 {
                ids.push(id);
            }
        }
        ids
    }

    fn slot(&self, id: EntryId) -> Option<&Slot<T>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn slot_mut(&mut self, id: EntryId) -> Option<&mut Slot<T>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    fn detach(&mut self, id: EntryId) {
        let Some((prev, next)) = self.slot(id).map(|slot| (slot.prev, slot.next)) else {
            return;
        };
        match prev {
            Some(prev_id) => {
                if let Some(prev_slot) = self.slot_mut(prev_id) {
                    prev_slot.next = next;
                }
            },
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(next_slot) = self.slot_mut(next_id) {
                    next_slot.prev = prev;
                }
            },
            None => self.tail = prev,
        }
        if let Some(slot) = self.slot_mut(id) {
            slot.prev = None;
            slot.next = None;
        }
    }

    fn attach_front(&mut self, id: EntryId) {
        let old_head = self.head;
        if let Some(slot) = self.slot_mut(id) {
            slot.prev = None;
            slot.next = old_head;
        } else {
            return;
        }
        match old_head {
            Some(old_id) => {
                if let Some(head_slot) = self.slot_mut(old_id) {
                    head_slot.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut count = 0usize;
        let mut weight = 0u64;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = self.slot(id).expect("linked slot is live");
            assert!(slot.resident);
            assert_eq!(slot.prev, prev);
            weight += slot.weight;
            prev = Some(id);
            cursor = slot.next;
            count += 1;
            assert!(count <= self.resident_count);
        }
        assert_eq!(prev, self.tail);
        assert_eq!(count, self.resident_count);
        assert_eq!(weight, self.resident_weight);

        let live = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(self.slots.len(), live + self.free.len());
        let mut seen = std::collections::HashSet::new();
        for &idx in &self.free {
            assert!(idx < self.slots.len());
            assert!(self.slots[idx].is_none());
            assert!(seen.insert(idx));
        }
    }
}

impl<T> Default for ResidencyTable<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
