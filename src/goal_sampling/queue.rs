// Priority queue of sampled goal candidates with mutable weights.
//
// Candidates live in a slot arena; the heap holds slot indices and every live
// slot remembers its heap position, so weight updates and removals by handle
// are O(log n). Slots carry a generation so handles of removed candidates
// never alias a later occupant.
use crate::config::QueueOrder;
use crate::geometry::{configuration_distance, Configuration};
use crate::{Error, Result};
use rand::Rng;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to a candidate inside a [`WeightedGoalQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalHandle {
    slot: usize,
    generation: u64,
}

/// A sampled, validated goal configuration and its priority weight
#[derive(Debug, Clone)]
pub struct WeightedGoal {
    pub configuration: Configuration,
    pub weight: f64,
    handle: GoalHandle,
}

impl WeightedGoal {
    pub fn handle(&self) -> GoalHandle {
        self.handle
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

#[derive(Debug)]
struct Entry {
    goal: WeightedGoal,
    heap_pos: usize,
}

#[derive(Debug)]
pub struct WeightedGoalQueue {
    order: QueueOrder,
    capacity: Option<usize>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    heap: Vec<usize>,
}

/// Weight given to freshly sampled candidates
pub const DEFAULT_GOAL_WEIGHT: f64 = 1.0;

/// Goal queue shared between the sampling thread and the host search
pub type SharedGoalQueue = Arc<Mutex<WeightedGoalQueue>>;

/// Lock the shared queue, recovering the data if a holder panicked
pub fn lock_queue(queue: &SharedGoalQueue) -> MutexGuard<'_, WeightedGoalQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WeightedGoalQueue {
    pub fn new(order: QueueOrder) -> Self {
        Self {
            order,
            capacity: None,
            slots: Vec::new(),
            free: Vec::new(),
            heap: Vec::new(),
        }
    }

    /// Queue that evicts its lowest-priority candidate once `capacity` is exceeded
    pub fn with_capacity_limit(order: QueueOrder, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(order)
        }
    }

    pub fn order(&self) -> QueueOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert with the default weight of 1.0
    pub fn insert(&mut self, configuration: Configuration) -> GoalHandle {
        self.insert_weighted(configuration, DEFAULT_GOAL_WEIGHT)
    }

    pub fn insert_weighted(&mut self, configuration: Configuration, weight: f64) -> GoalHandle {
        if let Some(capacity) = self.capacity {
            while self.heap.len() >= capacity {
                if let Some(evicted) = self.evict_lowest_priority() {
                    log::debug!("Goal queue full, evicted candidate with weight {:.3}", evicted.weight);
                }
            }
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot { generation: 0, entry: None });
                self.slots.len() - 1
            }
        };
        let handle = GoalHandle {
            slot,
            generation: self.slots[slot].generation,
        };

        let heap_pos = self.heap.len();
        self.heap.push(slot);
        self.slots[slot].entry = Some(Entry {
            goal: WeightedGoal { configuration, weight, handle },
            heap_pos,
        });
        self.sift_up(heap_pos);
        handle
    }

    pub fn contains(&self, handle: GoalHandle) -> bool {
        self.entry(handle).is_some()
    }

    pub fn get(&self, handle: GoalHandle) -> Option<&WeightedGoal> {
        self.entry(handle).map(|e| &e.goal)
    }

    pub fn update_weight(&mut self, handle: GoalHandle, weight: f64) -> Result<()> {
        let entry = self.entry_mut(handle).ok_or(Error::UnknownGoal(handle))?;
        entry.goal.weight = weight;
        let pos = entry.heap_pos;
        self.sift_up(pos);
        let pos = self.heap_pos(handle.slot);
        self.sift_down(pos);
        Ok(())
    }

    pub fn remove(&mut self, handle: GoalHandle) -> Result<WeightedGoal> {
        let pos = self.entry(handle).ok_or(Error::UnknownGoal(handle))?.heap_pos;
        self.remove_at(pos).ok_or(Error::UnknownGoal(handle))
    }

    /// Best candidate under the queue order
    pub fn peek(&self) -> Option<&WeightedGoal> {
        self.heap.first().and_then(|&slot| self.slots[slot].entry.as_ref()).map(|e| &e.goal)
    }

    /// Extract the best candidate under the queue order
    pub fn pop(&mut self) -> Option<WeightedGoal> {
        if self.heap.is_empty() {
            return None;
        }
        self.remove_at(0)
    }

    /// Drop every candidate; all outstanding handles become invalid
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation += 1;
            }
            self.free.push(index);
        }
        self.heap.clear();
    }

    /// Candidates in heap order (not sorted)
    pub fn iter(&self) -> impl Iterator<Item = &WeightedGoal> + '_ {
        self.heap
            .iter()
            .filter_map(move |&slot| self.slots[slot].entry.as_ref())
            .map(|e| &e.goal)
    }

    /// Configuration-space distance from `configuration` to the closest candidate
    pub fn nearest_distance(&self, configuration: &Configuration) -> Option<f64> {
        self.iter()
            .map(|goal| configuration_distance(&goal.configuration, configuration))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// A uniformly chosen candidate configuration
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Configuration> {
        if self.heap.is_empty() {
            return None;
        }
        let slot = self.heap[rng.gen_range(0..self.heap.len())];
        self.slots[slot].entry.as_ref().map(|e| e.goal.configuration.clone())
    }

    fn entry(&self, handle: GoalHandle) -> Option<&Entry> {
        self.slots
            .get(handle.slot)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, handle: GoalHandle) -> Option<&mut Entry> {
        self.slots
            .get_mut(handle.slot)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn weight_at(&self, pos: usize) -> f64 {
        self.slots[self.heap[pos]]
            .entry
            .as_ref()
            .map_or(f64::NAN, |e| e.goal.weight)
    }

    fn heap_pos(&self, slot: usize) -> usize {
        self.slots[slot].entry.as_ref().map_or(0, |e| e.heap_pos)
    }

    /// Whether the candidate at `a` should be served before the one at `b`
    fn precedes(&self, a: usize, b: usize) -> bool {
        let ordering = self.weight_at(a).total_cmp(&self.weight_at(b));
        match self.order {
            QueueOrder::MaxFirst => ordering == Ordering::Greater,
            QueueOrder::MinFirst => ordering == Ordering::Less,
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        for pos in [a, b] {
            let slot = self.heap[pos];
            if let Some(entry) = self.slots[slot].entry.as_mut() {
                entry.heap_pos = pos;
            }
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.precedes(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;
            if left < len && self.precedes(left, best) {
                best = left;
            }
            if right < len && self.precedes(right, best) {
                best = right;
            }
            if best == pos {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }

    fn remove_at(&mut self, pos: usize) -> Option<WeightedGoal> {
        let slot = *self.heap.get(pos)?;
        let last = self.heap.len() - 1;
        self.swap(pos, last);
        self.heap.pop();

        if pos < self.heap.len() {
            self.sift_down(pos);
            let moved_pos = self.heap_pos(self.heap[pos]);
            self.sift_up(moved_pos);
        }

        let removed = &mut self.slots[slot];
        removed.generation += 1;
        self.free.push(slot);
        removed.entry.take().map(|entry| entry.goal)
    }

    fn evict_lowest_priority(&mut self) -> Option<WeightedGoal> {
        // The lowest-priority candidate is always a leaf
        let len = self.heap.len();
        if len == 0 {
            return None;
        }
        let first_leaf = len / 2;
        let worst = (first_leaf..len)
            .reduce(|a, b| if self.precedes(a, b) { b } else { a })?;
        self.remove_at(worst)
    }
}
