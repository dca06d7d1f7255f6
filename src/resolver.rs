//! Chain resolution after a lock.
//!
//! Each [`ChainResolver::step`] is one pass: gravity, match scan, scoring and
//! removal. Passes repeat while either gravity moved something or a group
//! cleared; the pass that does neither settles the board. Callers may pause
//! between passes for display; the outcome never depends on it.

use crate::grid::{Color, Grid, Position};
use crate::scoring::{score_breakdown, ScoreBreakdown};

/// What a single pass did.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct PassReport {
    /// Gravity closed at least one gap.
    pub moved: bool,
    /// Chain number after this pass; unchanged on passes without a match.
    pub chain: u32,
    /// Every cleared colored cell, flattened across groups.
    pub cleared: Vec<(Position, Color)>,
    pub garbage_cleared: usize,
    pub breakdown: ScoreBreakdown,
    /// Nothing moved and nothing matched; the board is stable.
    pub settled: bool,
}

impl PassReport {
    pub fn matched(&self) -> bool {
        !self.cleared.is_empty()
    }

    pub fn score(&self) -> u32 {
        self.breakdown.score
    }

    /// Whether the pass changed the grid and is worth showing.
    pub fn visible(&self) -> bool {
        self.moved || self.matched()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ChainResolver {
    chain: u32,
    passes: u32,
    settled: bool,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Runs one pass over `grid`. Once settled, returns a settled no-op report.
    pub fn step(&mut self, grid: &mut Grid) -> PassReport {
        if self.settled {
            return PassReport {
                chain: self.chain,
                settled: true,
                ..PassReport::default()
            };
        }
        self.passes += 1;

        let moved = grid.apply_gravity();
        let groups = grid.find_matches();

        if groups.is_empty() {
            self.settled = !moved;
            return PassReport {
                moved,
                chain: self.chain,
                settled: self.settled,
                ..PassReport::default()
            };
        }

        self.chain += 1;
        let cleared: Vec<(Position, Color)> = groups
            .iter()
            .flat_map(|group| group.cells.iter().map(move |&pos| (pos, group.color)))
            .collect();
        let breakdown = score_breakdown(&cleared, self.chain);
        let positions: Vec<Position> = cleared.iter().map(|&(pos, _)| pos).collect();
        let garbage_cleared = grid.remove_matched(&positions);

        PassReport {
            moved,
            chain: self.chain,
            cleared,
            garbage_cleared,
            breakdown,
            settled: false,
        }
    }

    /// Steps until settled, returning every pass including the settling one.
    pub fn run(&mut self, grid: &mut Grid) -> Vec<PassReport> {
        let mut reports = Vec::new();
        while !self.settled {
            reports.push(self.step(grid));
        }
        reports
    }
}
