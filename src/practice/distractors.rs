use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::hash::Hash;

/// Up to `count` distinct wrong options drawn from `pool`, in random order.
///
/// The pool is deduplicated before sampling, so repeated values can never
/// produce two identical options.
pub fn build_distractors<T, R>(correct: &T, pool: &[T], count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    let candidates: Vec<&T> = pool.iter().unique().filter(|c| *c != correct).collect();
    let mut picked: Vec<T> = candidates
        .choose_multiple(rng, count)
        .map(|c| (*c).clone())
        .collect();
    picked.shuffle(rng);
    picked
}

/// Tops `distractors` up to `count` from `backfill`, skipping the correct
/// answer and anything already present.
pub fn backfill_distractors<T, R>(
    correct: &T,
    distractors: &mut Vec<T>,
    backfill: &[T],
    count: usize,
    rng: &mut R,
) where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    if distractors.len() >= count {
        return;
    }
    let fresh: Vec<T> = backfill
        .iter()
        .filter(|c| !distractors.contains(*c))
        .cloned()
        .collect();
    let extra = build_distractors(correct, &fresh, count - distractors.len(), rng);
    distractors.extend(extra);
}

/// Correct answer mixed in with its distractors, shuffled.
pub fn assemble_options<T, R>(correct: T, distractors: Vec<T>, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut options = distractors;
    options.push(correct);
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_distractors_exclude_correct_and_duplicates() {
        let pool = strings(&["猫", "猫", "狗", "狗", "狗", "鱼", "你好", "你好", "鸟"]);
        let correct = "你好".to_string();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = build_distractors(&correct, &pool, 3, &mut rng);
            assert_eq!(picked.len(), 3);
            assert!(!picked.contains(&correct));
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), picked.len(), "duplicate in {picked:?}");
        }
    }

    #[test]
    fn test_distractors_capped_by_unique_pool() {
        let pool = strings(&["a", "a", "b", "c", "c"]);
        let mut rng = StdRng::seed_from_u64(4);
        let picked = build_distractors(&"b".to_string(), &pool, 3, &mut rng);
        assert_eq!(picked.len(), 2);
        let set: HashSet<String> = picked.into_iter().collect();
        let expected: HashSet<String> = strings(&["a", "c"]).into_iter().collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_distractors_from_empty_pool() {
        let mut rng = StdRng::seed_from_u64(4);
        let picked = build_distractors(&1, &[], 3, &mut rng);
        assert!(picked.is_empty());
    }

    #[test]
    fn test_backfill_tops_up_without_collisions() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut picked = vec!["狗".to_string()];
        let backfill = strings(&["狗", "猫", "你好", "鱼", "鸟"]);
        backfill_distractors(&"你好".to_string(), &mut picked, &backfill, 3, &mut rng);

        assert_eq!(picked.len(), 3);
        assert!(!picked.contains(&"你好".to_string()));
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_backfill_noop_when_full() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut picked = vec![1, 2, 3];
        backfill_distractors(&0, &mut picked, &[4, 5], 3, &mut rng);
        assert_eq!(picked, vec![1, 2, 3]);
    }

    #[test]
    fn test_assemble_options_contains_everything() {
        let mut rng = StdRng::seed_from_u64(2);
        let options = assemble_options(0, vec![1, 2, 3], &mut rng);
        assert_eq!(options.len(), 4);
        let set: HashSet<i32> = options.into_iter().collect();
        assert_eq!(set, HashSet::from([0, 1, 2, 3]));
    }
}
