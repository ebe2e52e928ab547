// src/mana/fenwick.rs

//! Binary indexed tree over item weights.
//!
//! Supports point updates, prefix sums and "which slot does this cumulative
//! offset fall into" in `O(log n)`. Sums are kept as `u128` so that adding up
//! many `u64` weights cannot overflow.

#[derive(Debug, Clone)]
pub struct FenwickTree {
    /// 1-based; `tree[0]` is unused.
    tree: Vec<u128>,
}

impl FenwickTree {
    /// Build in `O(n)` from per-slot weights.
    pub fn from_weights(weights: &[u64]) -> Self {
        let n = weights.len();
        let mut tree = vec![0u128; n + 1];

        for (i, &w) in weights.iter().enumerate() {
            let idx = i + 1;
            tree[idx] += u128::from(w);
            let parent = idx + lowest_bit(idx);
            if parent <= n {
                tree[parent] += tree[idx];
            }
        }

        Self { tree }
    }

    pub fn len(&self) -> usize {
        self.tree.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subtract `amount` from the weight stored at `slot` (0-based).
    pub fn sub(&mut self, slot: usize, amount: u64) {
        let amount = u128::from(amount);
        let mut idx = slot + 1;
        while idx <= self.len() {
            self.tree[idx] -= amount;
            idx += lowest_bit(idx);
        }
    }

    /// Sum of weights in slots `0..=slot`.
    pub fn prefix_sum(&self, slot: usize) -> u128 {
        let mut idx = (slot + 1).min(self.len());
        let mut sum = 0;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowest_bit(idx);
        }
        sum
    }

    /// Smallest slot whose prefix sum is strictly greater than `offset`.
    ///
    /// `offset` must be below the total weight; the returned slot then always
    /// carries a non-zero weight.
    pub fn find(&self, mut offset: u128) -> usize {
        let n = self.len();
        let mut pos = 0;
        let mut step = if n == 0 { 0 } else { 1usize << (usize::BITS - 1 - n.leading_zeros()) };

        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= offset {
                pos = next;
                offset -= self.tree[next];
            }
            step >>= 1;
        }

        pos
    }
}

fn lowest_bit(idx: usize) -> usize {
    idx & idx.wrapping_neg()
}
