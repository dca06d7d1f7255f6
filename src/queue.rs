use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::grid::Color;
use crate::piece::ColorPair;

/// Upcoming pairs visible per board.
pub const QUEUE_LEN: usize = 2;

// ============================================================================
// Pair Providers
// ============================================================================

pub trait PairProvider {
    fn next_pair(&mut self) -> ColorPair;
}

/// Uniform colors from a seeded generator.
pub struct RandomPairs {
    rng: StdRng,
}

impl RandomPairs {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn color(&mut self) -> Color {
        Color::MATCHABLE[self.rng.gen_range(0..Color::MATCHABLE.len())]
    }
}

impl PairProvider for RandomPairs {
    fn next_pair(&mut self) -> ColorPair {
        let main = self.color();
        let sub = self.color();
        ColorPair::new(main, sub)
    }
}

/// Replays a fixed list of pairs, cycling at the end.
pub struct SequencePairs {
    pairs: Vec<ColorPair>,
    index: usize,
}

impl SequencePairs {
    pub fn new(pairs: Vec<ColorPair>) -> Self {
        assert!(!pairs.is_empty(), "sequence needs at least one pair");
        Self { pairs, index: 0 }
    }
}

impl PairProvider for SequencePairs {
    fn next_pair(&mut self) -> ColorPair {
        let pair = self.pairs[self.index % self.pairs.len()];
        self.index += 1;
        pair
    }
}

// ============================================================================
// Per-board Queue
// ============================================================================

/// Next and next-next pair for one board. Consuming the front appends a fresh pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairQueue {
    upcoming: VecDeque<ColorPair>,
}

impl PairQueue {
    pub fn new(provider: &mut dyn PairProvider) -> Self {
        let mut queue = Self {
            upcoming: VecDeque::with_capacity(QUEUE_LEN + 1),
        };
        queue.refill(provider);
        queue
    }

    fn refill(&mut self, provider: &mut dyn PairProvider) {
        self.upcoming.clear();
        for _ in 0..QUEUE_LEN {
            self.upcoming.push_back(provider.next_pair());
        }
    }

    /// Pops the front pair and tops the queue back up.
    pub fn take(&mut self, provider: &mut dyn PairProvider) -> ColorPair {
        self.upcoming.push_back(provider.next_pair());
        self.upcoming
            .pop_front()
            .unwrap_or_else(|| provider.next_pair())
    }

    pub fn restart(&mut self, provider: &mut dyn PairProvider) {
        self.refill(provider);
    }

    pub fn peek(&self) -> [ColorPair; QUEUE_LEN] {
        [self.upcoming[0], self.upcoming[1]]
    }
}
