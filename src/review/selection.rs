//! Reviewer selection
//!
//! Pure functions over an already filtered candidate list. Callers own the
//! filtering (active, same team, exclusions); this module only decides who
//! out of the pool gets picked.

use crate::models::User;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use uuid::Uuid;

/// Pick up to `max_count` distinct reviewers uniformly at random.
///
/// With `max_count` or fewer candidates every one of them is returned, in
/// random order. The candidate slice itself is never reordered.
pub fn select_reviewers<R: Rng + ?Sized>(
    candidates: &[User],
    max_count: usize,
    rng: &mut R,
) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !ids.contains(&candidate.id) {
            ids.push(candidate.id);
        }
    }

    ids.shuffle(rng);
    ids.truncate(max_count);
    ids
}

/// Pick one replacement reviewer, `None` for an empty pool
pub fn pick_one<R: Rng + ?Sized>(candidates: &[User], rng: &mut R) -> Option<Uuid> {
    candidates.choose(rng).map(|u| u.id)
}

/// Source of randomness for reviewer selection.
///
/// Hands out a fresh generator per operation so no lock is held across an
/// await point. When seeded, every generator is derived from one master
/// generator, which makes a sequence of operations reproducible.
pub struct ReviewerRng {
    master: Option<Mutex<StdRng>>,
}

impl ReviewerRng {
    pub fn from_entropy() -> Self {
        Self { master: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            master: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generator for a single operation
    pub fn fork(&self) -> StdRng {
        match &self.master {
            Some(master) => {
                let mut master = master.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                StdRng::seed_from_u64(master.gen())
            }
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for ReviewerRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn users(count: usize) -> Vec<User> {
        (0..count)
            .map(|i| User {
                id: Uuid::new_v4(),
                username: format!("user{}", i),
                team_id: None,
                is_active: true,
            })
            .collect()
    }

    #[test]
    fn test_select_returns_all_when_pool_is_small() {
        let pool = users(2);
        let mut rng = StdRng::seed_from_u64(7);

        let picked: HashSet<Uuid> = select_reviewers(&pool, 2, &mut rng).into_iter().collect();
        let expected: HashSet<Uuid> = pool.iter().map(|u| u.id).collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_select_is_bounded_and_distinct() {
        let pool = users(5);
        let ids: HashSet<Uuid> = pool.iter().map(|u| u.id).collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_reviewers(&pool, 2, &mut rng);
            assert_eq!(picked.len(), 2);
            assert_ne!(picked[0], picked[1]);
            assert!(picked.iter().all(|id| ids.contains(id)));
        }
    }

    #[test]
    fn test_select_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_reviewers(&[], 2, &mut rng).is_empty());
        assert!(select_reviewers(&users(3), 0, &mut rng).is_empty());
    }

    #[test]
    fn test_select_does_not_reorder_input() {
        let pool = users(4);
        let before = pool.clone();
        let mut rng = StdRng::seed_from_u64(3);
        select_reviewers(&pool, 2, &mut rng);
        assert_eq!(pool, before);
    }

    #[test]
    fn test_select_reaches_every_candidate() {
        let pool = users(4);
        let mut seen = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            seen.extend(select_reviewers(&pool, 2, &mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_pick_one() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(pick_one(&[], &mut rng), None);

        let pool = users(3);
        let picked = pick_one(&pool, &mut rng).unwrap();
        assert!(pool.iter().any(|u| u.id == picked));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let pool = users(6);
        let a = ReviewerRng::seeded(42);
        let b = ReviewerRng::seeded(42);

        for _ in 0..5 {
            assert_eq!(
                select_reviewers(&pool, 2, &mut a.fork()),
                select_reviewers(&pool, 2, &mut b.fork())
            );
        }
    }
}
