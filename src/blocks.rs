//! Block sequence: the partitioned frontier queue behind the recursion.
//!
//! Items live in two lists of blocks. `d0` holds batch-prepended blocks
//! whose values are strictly smaller than everything in `d1`; `d1` holds
//! blocks ordered by a per-block `upper_bound` tag, with items unsorted
//! inside a block until they are pulled. This keeps insertion down to a
//! binary search over block bounds plus an O(1) append, while `pull`
//! still hands back a prefix of the total order.

use std::cmp::Ordering;
use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::UNREACHED;

/// A key/value pair held by the frontier: vertex id and distance
/// estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub key: usize,
    pub value: f64,
}

type BlockItems = SmallVec<[Item; 16]>;

fn cmp_values(a: &Item, b: &Item) -> Ordering {
    a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal)
}

#[derive(Debug)]
struct Block {
    items: BlockItems,
    /// Upper bound on every value stored in this block.
    upper_bound: f64,
}

impl Block {
    fn new(upper_bound: f64) -> Self {
        Self {
            items: SmallVec::new(),
            upper_bound,
        }
    }

    fn sort(&mut self) {
        self.items.sort_unstable_by(cmp_values);
    }
}

/// Priority structure over `(key, value)` pairs with block capacity M.
///
/// Values across blocks are ordered (block i precedes block j implies
/// every value of i is at most every value of j); values within a block
/// are not. The rightmost `d1` block keeps an infinite upper bound so a
/// binary search always lands somewhere.
#[derive(Debug)]
pub struct BlockSequence {
    m: usize,
    /// External bound; callers only insert values below it.
    bound: f64,
    len: usize,
    d0: VecDeque<Block>,
    d1: Vec<Block>,
}

impl BlockSequence {
    pub fn new(m: usize, bound: f64) -> Self {
        Self {
            m: m.max(1),
            bound,
            len: 0,
            d0: VecDeque::new(),
            d1: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts one pair. Amortized O(max(1, log(N/M))): a binary search
    /// over block bounds, an append, and an occasional median split.
    pub fn insert(&mut self, key: usize, value: f64) {
        debug_assert!(
            value <= self.bound,
            "inserted value must stay within the sequence bound"
        );
        if self.d1.is_empty() {
            self.d1.push(Block::new(UNREACHED));
        }
        let idx = self
            .d1
            .partition_point(|block| block.upper_bound < value)
            .min(self.d1.len() - 1);
        self.d1[idx].items.push(Item { key, value });
        self.len += 1;
        if self.d1[idx].items.len() > self.m {
            self.split(idx);
        }
    }

    /// Splits a block at its median. The lower half stays in place and
    /// takes its own maximum as the new bound; the upper half inherits
    /// the old bound and is inserted right after.
    fn split(&mut self, idx: usize) {
        let block = &mut self.d1[idx];
        let mid = block.items.len() / 2;
        block.items.select_nth_unstable_by(mid, cmp_values);

        let upper_items: BlockItems = block.items.drain(mid..).collect();
        let lower_max = block
            .items
            .iter()
            .map(|item| item.value)
            .fold(f64::MIN, f64::max);

        let inherited = block.upper_bound;
        block.upper_bound = lower_max;

        let mut upper = Block::new(inherited);
        upper.items = upper_items;
        self.d1.insert(idx + 1, upper);
    }

    /// Prepends a batch of pairs that are all strictly smaller than
    /// every value currently present (caller's precondition). The batch
    /// is sorted, chunked into blocks of at most M, and pushed onto the
    /// front of `d0` keeping ascending order. Never triggers splits.
    pub fn batch_prepend(&mut self, mut items: Vec<Item>) {
        if items.is_empty() {
            return;
        }
        items.sort_unstable_by(cmp_values);
        self.len += items.len();
        for chunk in items.chunks(self.m).rev() {
            let mut block = Block::new(chunk[chunk.len() - 1].value);
            block.items.extend(chunk.iter().copied());
            self.d0.push_front(block);
        }
    }

    /// Removes and returns up to M items of smallest value, together
    /// with the smallest value still present (`UNREACHED` when the
    /// sequence is drained).
    pub fn pull(&mut self) -> (Vec<Item>, f64) {
        let mut drained = Vec::with_capacity(self.m.min(self.len));

        while drained.len() < self.m {
            let Some(block) = self.d0.front_mut() else {
                break;
            };
            let take = (self.m - drained.len()).min(block.items.len());
            drained.extend(block.items.drain(..take));
            if block.items.is_empty() {
                self.d0.pop_front();
            }
        }

        while drained.len() < self.m && !self.d1.is_empty() {
            let block = &mut self.d1[0];
            if block.items.is_empty() {
                self.d1.remove(0);
                continue;
            }
            block.sort();
            let take = (self.m - drained.len()).min(block.items.len());
            drained.extend(block.items.drain(..take));
            if block.items.is_empty() {
                self.d1.remove(0);
            }
        }

        self.len -= drained.len();
        let boundary = self.min_remaining();
        (drained, boundary)
    }

    /// Smallest value still present. `d0` blocks are kept ascending so
    /// the front item is the minimum; a `d1` front block may be unsorted
    /// and is sorted in place before peeking.
    fn min_remaining(&mut self) -> f64 {
        if let Some(block) = self.d0.front() {
            return block.items[0].value;
        }
        if let Some(block) = self.d1.first_mut() {
            if !block.items.is_empty() {
                block.sort();
                return block.items[0].value;
            }
        }
        UNREACHED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[Item]) -> Vec<f64> {
        items.iter().map(|item| item.value).collect()
    }

    #[test]
    fn pull_returns_smallest_prefix_in_order() {
        let mut seq = BlockSequence::new(4, UNREACHED);
        for (i, v) in [9.0, 3.0, 7.0, 1.0, 8.0, 2.0, 5.0, 6.0, 4.0]
            .iter()
            .enumerate()
        {
            seq.insert(i, *v);
        }
        assert_eq!(seq.len(), 9);

        let (drained, boundary) = seq.pull();
        assert_eq!(values(&drained), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(boundary, 5.0);
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn pull_on_empty_reports_unreached() {
        let mut seq = BlockSequence::new(3, UNREACHED);
        let (drained, boundary) = seq.pull();
        assert!(drained.is_empty());
        assert_eq!(boundary, UNREACHED);
    }

    #[test]
    fn batch_prepended_items_come_out_first() {
        let mut seq = BlockSequence::new(3, UNREACHED);
        for (i, v) in [10.0, 12.0, 11.0, 14.0].iter().enumerate() {
            seq.insert(i, *v);
        }
        seq.batch_prepend(vec![
            Item { key: 100, value: 5.0 },
            Item { key: 101, value: 3.0 },
            Item { key: 102, value: 4.0 },
            Item { key: 103, value: 2.0 },
        ]);
        assert_eq!(seq.len(), 8);

        let (first, boundary) = seq.pull();
        assert_eq!(values(&first), vec![2.0, 3.0, 4.0]);
        assert_eq!(boundary, 5.0);

        let (second, boundary) = seq.pull();
        assert_eq!(values(&second), vec![5.0, 10.0, 11.0]);
        assert_eq!(boundary, 12.0);
    }

    #[test]
    fn splits_keep_the_global_order() {
        let mut seq = BlockSequence::new(2, UNREACHED);
        for (i, v) in [6.0, 1.0, 5.0, 2.0, 4.0, 3.0, 7.0, 0.5].iter().enumerate() {
            seq.insert(i, *v);
        }

        let mut seen = Vec::new();
        loop {
            let (drained, boundary) = seq.pull();
            if drained.is_empty() {
                assert_eq!(boundary, UNREACHED);
                break;
            }
            for item in &drained {
                assert!(item.value <= boundary);
            }
            seen.extend(values(&drained));
        }
        assert_eq!(seen, vec![0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!(seq.is_empty());
    }

    #[test]
    fn boundary_separates_successive_pulls() {
        let mut seq = BlockSequence::new(3, UNREACHED);
        for i in 0..20 {
            seq.insert(i, (37 * i % 20) as f64);
        }
        let mut previous_boundary = 0.0;
        while !seq.is_empty() {
            let (drained, boundary) = seq.pull();
            for item in &drained {
                assert!(item.value >= previous_boundary);
                assert!(item.value <= boundary);
            }
            previous_boundary = boundary;
        }
    }

    #[test]
    fn duplicate_values_survive_mixed_traffic() {
        let mut seq = BlockSequence::new(2, UNREACHED);
        seq.insert(0, 4.0);
        seq.insert(1, 4.0);
        seq.insert(2, 4.0);
        seq.batch_prepend(vec![
            Item { key: 3, value: 1.0 },
            Item { key: 4, value: 1.0 },
        ]);

        let mut total = 0;
        while !seq.is_empty() {
            let (drained, _) = seq.pull();
            total += drained.len();
        }
        assert_eq!(total, 5);
    }
}
