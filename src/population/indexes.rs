//! Secondary, non-owning index over [`super::Population`]'s person vector
//! (§4.7). Swap-with-back like [`crate::host::shcpp`]; the owner writes the
//! new position back after every remove so no bucket ever holds a stale slot.
use rustc_hash::FxHashMap;

/// `(location, host_state, age_class) -> [person_id...]`, the bucket used by
/// `perform_infection_event` to draw susceptibles weighted by biting rate.
#[derive(Debug, Default)]
pub struct ByLocationStateAgeClass {
    buckets: FxHashMap<(usize, u8, usize), Vec<u64>>,
    position: FxHashMap<u64, (usize, u8, usize, usize)>,
}

impl ByLocationStateAgeClass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, person_id: u64, location: usize, state: u8, age_class: usize) {
        let bucket = self.buckets.entry((location, state, age_class)).or_default();
        let pos = bucket.len();
        bucket.push(person_id);
        self.position.insert(person_id, (location, state, age_class, pos));
    }

    pub fn remove(&mut self, person_id: u64) {
        if let Some((location, state, age_class, pos)) = self.position.remove(&person_id) {
            if let Some(bucket) = self.buckets.get_mut(&(location, state, age_class)) {
                bucket.swap_remove(pos);
                if let Some(&moved) = bucket.get(pos) {
                    self.position.insert(moved, (location, state, age_class, pos));
                }
            }
        }
    }

    /// Moves `person_id` from its current bucket to `(location, state,
    /// age_class)`, as a Person setter would call on a state transition.
    pub fn notify_change(&mut self, person_id: u64, location: usize, state: u8, age_class: usize) {
        self.remove(person_id);
        self.insert(person_id, location, state, age_class);
    }

    pub fn bucket(&self, location: usize, state: u8, age_class: usize) -> &[u64] {
        self.buckets
            .get(&(location, state, age_class))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All persons at `location` in `state`, across age classes.
    pub fn by_location_state(&self, location: usize, state: u8) -> Vec<u64> {
        self.buckets
            .iter()
            .filter(|((loc, st, _), _)| *loc == location && *st == state)
            .flat_map(|(_, v)| v.iter().copied())
            .collect()
    }

    /// Debug-only consistency check mirroring
    /// [`crate::host::shcpp::SingleHostClonalParasitePopulations::check_index_invariant`]:
    /// every tracked position agrees with its bucket.
    pub fn check_invariant(&self) -> bool {
        self.position.iter().all(|(&id, &(loc, state, age_class, pos))| {
            self.buckets
                .get(&(loc, state, age_class))
                .and_then(|b| b.get(pos))
                .copied()
                == Some(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_remove_keeps_positions_consistent() {
        let mut idx = ByLocationStateAgeClass::new();
        for id in 0..5 {
            idx.insert(id, 0, 0, 0);
        }
        idx.remove(2);
        assert!(idx.check_invariant());
        assert_eq!(idx.bucket(0, 0, 0).len(), 4);
    }

    #[test]
    fn notify_change_moves_between_buckets() {
        let mut idx = ByLocationStateAgeClass::new();
        idx.insert(7, 0, 0, 0);
        idx.notify_change(7, 0, 1, 0);
        assert!(idx.bucket(0, 0, 0).is_empty());
        assert_eq!(idx.bucket(0, 1, 0), &[7]);
    }
}
