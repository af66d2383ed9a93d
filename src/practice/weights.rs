use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashMap;

use crate::error::{EngineError, Result};

pub type ItemId = i64;

/// Selection weights keyed by item id. Missing ids count as 1.0.
pub type Weights = HashMap<ItemId, f64>;

/// Anything that can be drawn from a practice pool.
pub trait PracticeItem {
    fn item_id(&self) -> ItemId;
}

/// Bounds of the recency window used to derive weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub window_size: usize,
    pub min_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_weight: 0.1,
        }
    }
}

/// Weight of one item from its outcome history, most recent first.
///
/// Unseen items get 1.0; a perfect record bottoms out at `min_weight` so
/// mastered items still come up now and then.
pub fn weight(history: &[bool], window_size: usize, min_weight: f64) -> f64 {
    let window = &history[..history.len().min(window_size)];
    if window.is_empty() {
        return 1.0;
    }
    let correct = window.iter().filter(|&&ok| ok).count();
    let correctness = correct as f64 / window.len() as f64;
    min_weight.max(1.0 - correctness * (1.0 - min_weight))
}

/// Weights for every item in `histories`.
pub fn compute_weights<'a, I>(histories: I, config: &WeightConfig) -> Weights
where
    I: IntoIterator<Item = (ItemId, &'a [bool])>,
{
    histories
        .into_iter()
        .map(|(id, history)| (id, weight(history, config.window_size, config.min_weight)))
        .collect()
}

/// Strategy for drawing the next item from a pool.
pub trait ItemSelector<T> {
    fn pick<'a>(&self, pool: &'a [T], weights: &Weights, rng: &mut dyn RngCore) -> Result<&'a T>;
}

/// Draw with probability proportional to weight.
pub struct WeightedSelector;

impl<T: PracticeItem> ItemSelector<T> for WeightedSelector {
    fn pick<'a>(&self, pool: &'a [T], weights: &Weights, rng: &mut dyn RngCore) -> Result<&'a T> {
        pick_weighted(pool, weights, rng)
    }
}

/// Uniform draw that ignores history.
pub struct UniformSelector;

impl<T> ItemSelector<T> for UniformSelector {
    fn pick<'a>(&self, pool: &'a [T], _weights: &Weights, rng: &mut dyn RngCore) -> Result<&'a T> {
        pool.choose(rng)
            .ok_or(EngineError::Precondition("cannot pick from an empty pool"))
    }
}

/// Single weighted draw from `pool`.
pub fn pick_weighted<'a, T, R>(pool: &'a [T], weights: &Weights, rng: &mut R) -> Result<&'a T>
where
    T: PracticeItem,
    R: RngCore + ?Sized,
{
    if pool.is_empty() {
        return Err(EngineError::Precondition("cannot pick from an empty pool"));
    }
    let item_weights: Vec<f64> = pool
        .iter()
        .map(|item| weights.get(&item.item_id()).copied().unwrap_or(1.0))
        .collect();
    let dist = WeightedIndex::new(&item_weights)
        .map_err(|_| EngineError::Precondition("weights must be finite, non-negative and not all zero"))?;
    let picked = &pool[dist.sample(rng)];
    debug!(
        "picked item {} from pool of {} (weight {:.2})",
        picked.item_id(),
        pool.len(),
        weights.get(&picked.item_id()).copied().unwrap_or(1.0)
    );
    Ok(picked)
}
