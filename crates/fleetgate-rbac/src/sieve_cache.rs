//! Bounded memo storage with SIEVE eviction.
//!
//! Resolved attribute lists are cheap to recompute but are requested on every
//! render of every permissioned table, so selectors keep the most useful ones
//! around. SIEVE keeps one `visited` bit per slot and a roving `hand`:
//!
//! - hit: set `visited`
//! - miss on a full cache: sweep from `hand`, clearing `visited` bits, and
//!   replace the first slot found unvisited
//!
//! Slots are only ever appended until the capacity is reached and then
//! replaced in place, so the slot vector never contains holes.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    visited: bool,
}

/// A bounded map using SIEVE eviction.
#[derive(Debug)]
pub(crate) struct SieveCache<K, V> {
    slots: Vec<Slot<K, V>>,
    positions: HashMap<K, usize>,
    hand: usize,
    capacity: usize,
}

impl<K, V> SieveCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            hand: 0,
            capacity,
        }
    }

    /// Looks up `key`, marking its slot as visited.
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let position = *self.positions.get(key)?;
        let slot = &mut self.slots[position];
        slot.visited = true;
        Some(&slot.value)
    }

    /// Stores `value` under `key`, evicting one entry if the cache is full.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        if let Some(&position) = self.positions.get(&key) {
            let slot = &mut self.slots[position];
            slot.value = value;
            slot.visited = true;
            return;
        }

        if self.slots.len() < self.capacity {
            self.positions.insert(key.clone(), self.slots.len());
            self.slots.push(Slot {
                key,
                value,
                visited: false,
            });
            return;
        }

        let victim = self.sweep();
        let evicted = std::mem::replace(
            &mut self.slots[victim],
            Slot {
                key: key.clone(),
                value,
                visited: false,
            },
        );
        self.positions.remove(&evicted.key);
        self.positions.insert(key, victim);
    }

    /// Drops every entry.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
        self.hand = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Advances the hand to the first unvisited slot and returns its index.
    ///
    /// Terminates within two laps: the first lap clears every visited bit.
    fn sweep(&mut self) -> usize {
        loop {
            let position = self.hand;
            self.hand = (self.hand + 1) % self.slots.len();

            let slot = &mut self.slots[position];
            if !slot.visited {
                return position;
            }
            slot.visited = false;
        }
    }
}
