//! Nuisance bookkeeping and the end-of-turn exchange between the two boards.

use rand::Rng;

use crate::game::{BoardState, Player};
use crate::grid::{Grid, COLS};

/// Points per generated nuisance unit.
pub const NUISANCE_RATE: u32 = 70;

// ============================================================================
// Ledger
// ============================================================================

/// Per-board nuisance counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NuisanceLedger {
    /// Generated by this board's chains this turn, not yet exchanged.
    generated: u32,
    /// Points carried toward the next unit, always below [`NUISANCE_RATE`].
    remainder: u32,
    /// Owed to this board, waiting to drop.
    pending: u32,
}

impl NuisanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts one pass's score into nuisance units, carrying the fraction.
    /// Returns the units generated by this call.
    pub fn bank(&mut self, score: u32) -> u32 {
        let points = score + self.remainder;
        let units = points / NUISANCE_RATE;
        self.remainder = points % NUISANCE_RATE;
        self.generated += units;
        units
    }

    pub fn generated(&self) -> u32 {
        self.generated
    }

    pub fn remainder(&self) -> u32 {
        self.remainder
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn add_pending(&mut self, units: u32) {
        self.pending += units;
    }

    fn take_generated(&mut self) -> u32 {
        std::mem::take(&mut self.generated)
    }
}

// ============================================================================
// Exchange
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ExchangeOutcome {
    pub generated: u32,
    /// Units that cancelled the active board's own pending nuisance.
    pub offset: u32,
    /// Units added to the opponent's pending nuisance.
    pub sent: u32,
    /// Garbage cells placed on the active board.
    pub dropped: u32,
    /// Pending units lost to the drop cap or to full columns.
    pub discarded: u32,
}

/// Settles `active`'s turn: its generated nuisance first cancels what it owes,
/// the excess goes to the opponent, and whatever it still owes drops onto its
/// own grid (at most `max_drop` cells).
pub fn exchange<R: Rng>(
    boards: &mut [BoardState; 2],
    active: Player,
    max_drop: u32,
    rng: &mut R,
) -> ExchangeOutcome {
    let me = active.index();
    let them = active.opponent().index();

    let generated = boards[me].ledger.take_generated();
    let offset = generated.min(boards[me].ledger.pending);
    let sent = generated - offset;
    boards[me].ledger.pending -= offset;
    boards[them].ledger.add_pending(sent);

    let owed = std::mem::take(&mut boards[me].ledger.pending);
    let dropped = drop_garbage(&mut boards[me].grid, owed.min(max_drop), rng);

    ExchangeOutcome {
        generated,
        offset,
        sent,
        dropped,
        discarded: owed - dropped,
    }
}

/// Drops `count` garbage cells into uniformly random columns, each landing on
/// the stack as it stands after the previous one. Returns the cells placed.
pub fn drop_garbage<R: Rng>(grid: &mut Grid, count: u32, rng: &mut R) -> u32 {
    let mut placed = 0;
    for _ in 0..count {
        let col = rng.gen_range(0..COLS) as i16;
        if grid.drop_garbage(col) {
            placed += 1;
        }
    }
    placed
}
