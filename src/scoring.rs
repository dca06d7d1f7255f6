//! Official bonus-table scoring for one resolution pass.
//!
//! `score = 10 × cleared × clamp(chain_power + color_bonus + group_bonus, 1, 999)`

use std::collections::{BTreeSet, HashMap};

use crate::grid::{Color, Position};

// ============================================================================
// Tables
// ============================================================================

/// Indexed by chain number, 1-based. Chains past the end use the last entry.
const CHAIN_POWER: [u32; 19] = [
    0, 8, 16, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 480, 512,
];

/// Indexed by number of distinct colors cleared, 1-based.
const COLOR_BONUS: [u32; 5] = [0, 3, 6, 12, 24];

/// Indexed by group size; sizes below 4 never clear.
const GROUP_BONUS: [u32; 11] = [0, 0, 0, 0, 2, 3, 4, 5, 6, 7, 10];

pub const MIN_TOTAL_BONUS: u32 = 1;
pub const MAX_TOTAL_BONUS: u32 = 999;
pub const POINTS_PER_BLOCK: u32 = 10;

pub fn chain_power(chain: u32) -> u32 {
    let index = chain.max(1) as usize - 1;
    CHAIN_POWER[index.min(CHAIN_POWER.len() - 1)]
}

pub fn color_bonus(distinct_colors: usize) -> u32 {
    match distinct_colors {
        0 => 0,
        n => COLOR_BONUS[(n - 1).min(COLOR_BONUS.len() - 1)],
    }
}

pub fn group_bonus(size: usize) -> u32 {
    GROUP_BONUS[size.min(GROUP_BONUS.len() - 1)]
}

// ============================================================================
// Score
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ScoreBreakdown {
    pub cleared: u32,
    pub chain_power: u32,
    pub color_bonus: u32,
    pub group_bonus: u32,
    /// Sum of the three bonuses after clamping.
    pub total_bonus: u32,
    pub score: u32,
}

/// Scores the cells cleared in one pass at chain number `chain`.
pub fn calculate_score(matched: &[(Position, Color)], chain: u32) -> u32 {
    score_breakdown(matched, chain).score
}

pub fn score_breakdown(matched: &[(Position, Color)], chain: u32) -> ScoreBreakdown {
    if matched.is_empty() {
        return ScoreBreakdown::default();
    }

    let colors: BTreeSet<Color> = matched.iter().map(|&(_, color)| color).collect();
    let group_bonus: u32 = group_sizes(matched).into_iter().map(group_bonus).sum();
    let chain_power = chain_power(chain);
    let color_bonus = color_bonus(colors.len());

    let total_bonus =
        (chain_power + color_bonus + group_bonus).clamp(MIN_TOTAL_BONUS, MAX_TOTAL_BONUS);
    let cleared = matched.len() as u32;

    ScoreBreakdown {
        cleared,
        chain_power,
        color_bonus,
        group_bonus,
        total_bonus,
        score: POINTS_PER_BLOCK * cleared * total_bonus,
    }
}

/// Sizes of the connected same-color groups within `matched`, ignoring the
/// rest of the grid.
pub fn group_sizes(matched: &[(Position, Color)]) -> Vec<usize> {
    let mut remaining: HashMap<Position, Color> = matched.iter().copied().collect();
    let mut sizes = Vec::new();

    loop {
        let Some((start, color)) = remaining.iter().next().map(|(&pos, &color)| (pos, color))
        else {
            break;
        };
        remaining.remove(&start);
        let mut stack = vec![start];
        let mut size = 1;
        while let Some(pos) = stack.pop() {
            for next in pos.neighbours() {
                if remaining.get(&next) == Some(&color) {
                    remaining.remove(&next);
                    stack.push(next);
                    size += 1;
                }
            }
        }
        sizes.push(size);
    }

    sizes.sort_unstable();
    sizes
}
