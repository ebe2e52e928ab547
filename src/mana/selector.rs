// src/mana/selector.rs

use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;
use tracing::trace;

use super::fenwick::FenwickTree;

/// Candidate pool for weighted sampling without replacement.
///
/// Each pick draws an offset uniformly from `0..total_weight` and locates
/// the owning slot through a [`FenwickTree`], so an item's chance of being
/// drawn is `weight / remaining_total`. Picking or removing an item is a point
/// update on the tree; nothing is re-sorted or rebuilt.
///
/// Zero-weight items are never drawn while positive weight remains. Once it is
/// exhausted they are drawn uniformly, so `pick_n(len)` always returns the
/// whole pool.
///
/// The pool is single-writer: share it across tasks only behind external
/// synchronisation.
#[derive(Debug, Clone)]
pub struct WeightedSelector<T> {
    slots: Vec<Option<T>>,
    weights: Vec<u64>,
    tree: FenwickTree,
    positions: HashMap<T, usize>,
    /// Slots still in the pool whose weight is zero.
    zero_weight: Vec<usize>,
    /// For each slot, its index in `zero_weight`, if listed there.
    zero_position: Vec<Option<usize>>,
    total: u128,
    len: usize,
}

impl<T> WeightedSelector<T>
where
    T: Clone + Eq + Hash,
{
    /// Build a pool from `(item, weight)` pairs.
    ///
    /// Repeated items are merged and their weights summed.
    pub fn build<I>(choices: I) -> Self
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        let mut slots = Vec::new();
        let mut weights: Vec<u64> = Vec::new();
        let mut positions: HashMap<T, usize> = HashMap::new();

        for (item, weight) in choices {
            match positions.get(&item) {
                Some(&slot) => {
                    weights[slot] = weights[slot].saturating_add(weight);
                }
                None => {
                    positions.insert(item.clone(), slots.len());
                    slots.push(Some(item));
                    weights.push(weight);
                }
            }
        }

        let tree = FenwickTree::from_weights(&weights);
        let total = weights.iter().map(|&w| u128::from(w)).sum();
        let zero_weight: Vec<usize> = weights
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w == 0)
            .map(|(slot, _)| slot)
            .collect();
        let mut zero_position = vec![None; weights.len()];
        for (index, &slot) in zero_weight.iter().enumerate() {
            zero_position[slot] = Some(index);
        }
        let len = slots.len();

        Self {
            slots,
            weights,
            tree,
            positions,
            zero_weight,
            zero_position,
            total,
            len,
        }
    }

    /// Number of items still in the pool.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of the weights of all items still in the pool.
    pub fn total_weight(&self) -> u128 {
        self.total
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    pub fn weight_of(&self, item: &T) -> Option<u64> {
        self.positions.get(item).map(|&slot| self.weights[slot])
    }

    /// Pick up to `n` distinct items, removing them from the pool.
    ///
    /// The returned order is the order in which items were drawn.
    pub fn pick_n<R>(&mut self, n: usize, rng: &mut R) -> Vec<T>
    where
        R: Rng + ?Sized,
    {
        let mut picked = Vec::with_capacity(n.min(self.len));

        while picked.len() < n {
            match self.pick_one(rng) {
                Some(item) => picked.push(item),
                None => break,
            }
        }

        trace!(requested = n, picked = picked.len(), remaining = self.len, "weighted pick");
        picked
    }

    /// Draw a single item, removing it from the pool.
    pub fn pick_one<R>(&mut self, rng: &mut R) -> Option<T>
    where
        R: Rng + ?Sized,
    {
        if self.len == 0 {
            return None;
        }

        let slot = if self.total > 0 {
            let offset = rng.random_range(0..self.total);
            self.tree.find(offset)
        } else {
            let index = rng.random_range(0..self.zero_weight.len());
            self.zero_weight[index]
        };

        self.take_slot(slot)
    }

    /// Remove `item` regardless of selection, returning its weight.
    pub fn remove(&mut self, item: &T) -> Option<u64> {
        let slot = *self.positions.get(item)?;
        let weight = self.weights[slot];
        self.take_slot(slot).map(|_| weight)
    }

    fn take_slot(&mut self, slot: usize) -> Option<T> {
        let item = self.slots.get_mut(slot)?.take()?;
        let weight = std::mem::take(&mut self.weights[slot]);

        if weight > 0 {
            self.tree.sub(slot, weight);
            self.total -= u128::from(weight);
        } else if let Some(index) = self.zero_position[slot].take() {
            self.zero_weight.swap_remove(index);
            if let Some(&moved) = self.zero_weight.get(index) {
                self.zero_position[moved] = Some(index);
            }
        }

        self.positions.remove(&item);
        self.len -= 1;
        Some(item)
    }
}
