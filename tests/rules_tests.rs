//! Tests for the single-board rules
//!
//! Test categories:
//! - Grid bounds and occupancy
//! - Gravity compaction
//! - Match scanning and removal
//! - Piece movement and rotation
//! - Scoring tables
//! - Chain resolution
//! - Nuisance ledger and exchange

use puyo_duel::game::{BoardState, Player};
use puyo_duel::grid::{
    test_helpers::*, Cell, Color, Grid, Position, COLS, MIN_GROUP_SIZE, ROWS,
};
use puyo_duel::nuisance::{drop_garbage, exchange, NuisanceLedger, NUISANCE_RATE};
use puyo_duel::piece::{ActivePiece, ColorPair, Rotation, SPAWN_MAIN, SPAWN_SUB};
use puyo_duel::queue::SequencePairs;
use puyo_duel::resolver::ChainResolver;
use puyo_duel::scoring::{
    calculate_score, chain_power, color_bonus, group_bonus, group_sizes, score_breakdown,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

const ALL_COLORS: [Color; 5] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Garbage,
];

fn random_grid(rng: &mut StdRng) -> Grid {
    let mut grid = Grid::new();
    for pos in Grid::positions() {
        if rng.gen_bool(0.6) {
            let color = ALL_COLORS[rng.gen_range(0..ALL_COLORS.len())];
            grid.set(pos, Cell::Filled(color));
        }
    }
    grid
}

fn pos(row: i16, col: i16) -> Position {
    Position::new(row, col)
}

// ============================================================================
// Grid Tests
// ============================================================================

mod grid {
    use super::*;

    #[test]
    fn out_of_bounds_queries_return_none() {
        let grid = Grid::new();

        assert_eq!(grid.get(pos(-1, 0)), None);
        assert_eq!(grid.get(pos(0, -1)), None);
        assert_eq!(grid.get(pos(ROWS as i16, 0)), None);
        assert_eq!(grid.get(pos(0, COLS as i16)), None);
        assert_eq!(grid.get(pos(0, 0)), Some(Cell::Empty));
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut grid = Grid::new();

        assert!(!grid.set(pos(ROWS as i16, 0), Cell::Filled(Color::Red)));
        assert_eq!(grid.filled_count(), 0);
    }

    #[test]
    fn occupancy_queries() {
        let mut grid = Grid::new();
        grid.set(pos(5, 3), Cell::Filled(Color::Blue));

        assert!(grid.is_occupied(pos(5, 3)));
        assert!(!grid.is_free(pos(5, 3)));
        assert!(grid.is_free(pos(5, 4)));
        assert!(!grid.is_free(pos(-1, 3)));
        assert!(!grid.is_occupied(pos(-1, 3)));
        assert_eq!(grid.color_at(pos(5, 3)), Some(Color::Blue));
    }

    #[test]
    fn helper_rows_align_to_floor() {
        let grid = grid_from_rows(&["R.....", "..X..Y"]);

        assert_eq!(grid.color_at(pos(10, 0)), Some(Color::Red));
        assert_eq!(grid.color_at(pos(11, 2)), Some(Color::Garbage));
        assert_eq!(grid.color_at(pos(11, 5)), Some(Color::Yellow));
        assert_eq!(bottom_rows(&grid, 2), vec!["R.....", "..X..Y"]);
    }
}

// ============================================================================
// Gravity Tests
// ============================================================================

mod gravity {
    use super::*;

    #[test]
    fn floating_cells_fall_to_floor() {
        let mut grid = grid_from_rows(&["R.....", "......", "G...B.", "....Y."]);

        assert!(grid.apply_gravity());
        assert_eq!(
            bottom_rows(&grid, 4),
            vec!["......", "......", "R...B.", "G...Y."]
        );
    }

    #[test]
    fn settled_grid_reports_no_movement() {
        let mut grid = grid_from_rows(&["R.....", "GB...."]);

        assert!(!grid.apply_gravity());
    }

    #[test]
    fn empty_grid_reports_no_movement() {
        let mut grid = Grid::new();

        assert!(!grid.apply_gravity());
    }

    #[test]
    fn compaction_preserves_column_order() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = random_grid(&mut rng);
            let before: Vec<Vec<Color>> = (0..COLS).map(|col| grid.column_stack(col)).collect();

            grid.apply_gravity();

            for col in 0..COLS {
                assert_eq!(grid.column_stack(col), before[col], "seed {seed} col {col}");
                for row in 0..ROWS as i16 - 1 {
                    if grid.is_occupied(pos(row, col as i16)) {
                        assert!(
                            grid.is_occupied(pos(row + 1, col as i16)),
                            "gap under ({row}, {col}) for seed {seed}"
                        );
                    }
                }
            }
            assert!(!grid.apply_gravity(), "second pass moved for seed {seed}");
        }
    }
}

// ============================================================================
// Match Tests
// ============================================================================

mod matching {
    use super::*;

    #[test]
    fn four_in_a_row_matches() {
        let grid = grid_from_rows(&["RRRR.."]);

        let groups = grid.find_matches();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].color, Color::Red);
        assert_eq!(groups[0].len(), 4);
    }

    #[test]
    fn three_do_not_match() {
        let grid = grid_from_rows(&["R.....", "RR...."]);

        assert!(grid.find_matches().is_empty());
    }

    #[test]
    fn bent_group_matches() {
        let grid = grid_from_rows(&["G.....", "G.....", "GG...."]);

        let groups = grid.find_matches();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].cells, vec![pos(9, 0), pos(10, 0), pos(11, 0), pos(11, 1)]);
    }

    #[test]
    fn diagonal_cells_are_not_connected() {
        let grid = grid_from_rows(&["R.....", ".R....", "..R...", "...R.."]);

        assert!(grid.find_matches().is_empty());
    }

    #[test]
    fn garbage_never_matches() {
        let grid = grid_from_rows(&["XXXXXX"]);

        assert!(grid.find_matches().is_empty());
    }

    #[test]
    fn separate_groups_reported_separately() {
        let grid = grid_from_rows(&["R...BB", "R...BB", "RR...."]);

        let groups = grid.find_matches();

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().any(|g| g.color == Color::Red && g.len() == 4));
        assert!(groups.iter().any(|g| g.color == Color::Blue && g.len() == 4));
    }

    #[test]
    fn scan_order_does_not_change_groups() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = random_grid(&mut rng);
            let mut order: Vec<Position> = Grid::positions().collect();
            order.shuffle(&mut rng);

            assert_eq!(
                grid.find_matches(),
                grid.find_matches_in_order(order),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn every_group_is_large_single_colored_and_connected() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = random_grid(&mut rng);

            for group in grid.find_matches() {
                assert!(group.len() >= MIN_GROUP_SIZE);
                assert!(!group.color.is_garbage());
                assert!(group
                    .cells
                    .iter()
                    .all(|&cell| grid.color_at(cell) == Some(group.color)));

                let flat: Vec<(Position, Color)> =
                    group.cells.iter().map(|&cell| (cell, group.color)).collect();
                assert_eq!(group_sizes(&flat), vec![group.len()], "seed {seed}");
            }
        }
    }
}

// ============================================================================
// Removal Tests
// ============================================================================

mod removal {
    use super::*;

    #[test]
    fn adjacent_garbage_is_cleared() {
        let mut grid = grid_from_rows(&["X.....", "RRRR.X"]);
        let matched: Vec<Position> = grid.find_matches()[0].cells.clone();

        let garbage = grid.remove_matched(&matched);

        assert_eq!(garbage, 1);
        assert_eq!(bottom_rows(&grid, 2), vec!["......", ".....X"]);
    }

    #[test]
    fn garbage_between_two_groups_is_cleared_once() {
        let mut grid = grid_from_rows(&["R.B...", "R.B...", "RXB...", "R.B..."]);
        let matched: Vec<Position> = grid
            .find_matches()
            .into_iter()
            .flat_map(|group| group.cells)
            .collect();

        let garbage = grid.remove_matched(&matched);

        assert_eq!(matched.len(), 8);
        assert_eq!(garbage, 1);
        assert_eq!(grid.filled_count(), 0);
    }

    #[test]
    fn diagonal_garbage_survives() {
        let mut grid = grid_from_rows(&["....X.", "RRRR.."]);
        let matched: Vec<Position> = grid.find_matches()[0].cells.clone();

        assert_eq!(grid.remove_matched(&matched), 0);
        assert_eq!(grid.color_at(pos(10, 4)), Some(Color::Garbage));
    }
}

// ============================================================================
// Piece Tests
// ============================================================================

mod piece {
    use super::*;

    fn red_green() -> ColorPair {
        ColorPair::new(Color::Red, Color::Green)
    }

    #[test]
    fn spawn_places_sub_above_main() {
        let piece = ActivePiece::spawn(red_green(), &Grid::new()).expect("open grid");

        assert_eq!(piece.main(), SPAWN_MAIN);
        assert_eq!(piece.sub(), SPAWN_SUB);
        assert_eq!(piece.main(), pos(1, 2));
        assert_eq!(piece.sub(), pos(0, 2));
        assert_eq!(piece.rotation(), 0);
    }

    #[test]
    fn spawn_fails_when_either_cell_taken() {
        for blocked in [SPAWN_MAIN, SPAWN_SUB] {
            let mut grid = Grid::new();
            grid.set(blocked, Cell::Filled(Color::Garbage));

            assert!(ActivePiece::spawn(red_green(), &grid).is_none());
        }
    }

    #[test]
    fn shifts_left_and_right() {
        let grid = Grid::new();
        let mut piece = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        assert!(piece.try_shift(&grid, -1));
        assert_eq!(piece.main(), pos(5, 1));
        assert!(piece.try_shift(&grid, 1));
        assert!(piece.try_shift(&grid, 1));
        assert_eq!(piece.main(), pos(5, 3));
        assert_eq!(piece.sub(), pos(4, 3));
    }

    #[test]
    fn cannot_shift_through_walls() {
        let grid = Grid::new();
        let mut left = ActivePiece::new_at(red_green(), pos(5, 0), (-1, 0));
        let mut right = ActivePiece::new_at(red_green(), pos(5, COLS as i16 - 1), (-1, 0));

        assert!(!left.try_shift(&grid, -1));
        assert!(!right.try_shift(&grid, 1));
        assert_eq!(left.main(), pos(5, 0));
        assert_eq!(right.main(), pos(5, COLS as i16 - 1));
    }

    #[test]
    fn cannot_shift_into_occupied_cell() {
        let mut grid = Grid::new();
        grid.set(pos(4, 3), Cell::Filled(Color::Blue));
        let mut piece = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        // Only the sub would collide; the whole move is refused.
        assert!(!piece.try_shift(&grid, 1));
        assert_eq!(piece.main(), pos(5, 2));
    }

    #[test]
    fn rotates_clockwise() {
        let grid = Grid::new();
        let mut piece = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        assert!(piece.try_rotate(&grid, Rotation::Clockwise));
        assert_eq!(piece.offset(), (0, 1));
        assert_eq!(piece.sub(), pos(5, 3));
        assert_eq!(piece.rotation(), 1);

        assert!(piece.try_rotate(&grid, Rotation::Clockwise));
        assert_eq!(piece.sub(), pos(6, 2));
        assert_eq!(piece.rotation(), 2);
    }

    #[test]
    fn rotates_counter_clockwise() {
        let grid = Grid::new();
        let mut piece = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        assert!(piece.try_rotate(&grid, Rotation::CounterClockwise));
        assert_eq!(piece.offset(), (0, -1));
        assert_eq!(piece.sub(), pos(5, 1));
        assert_eq!(piece.rotation(), 3);
    }

    #[test]
    fn four_rotations_return_to_start() {
        let grid = Grid::new();
        let start = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        for rotation in [Rotation::Clockwise, Rotation::CounterClockwise] {
            let mut piece = start;
            for _ in 0..4 {
                assert!(piece.try_rotate(&grid, rotation));
            }
            assert_eq!(piece, start);
        }
    }

    #[test]
    fn rotation_into_wall_is_rejected_without_kick() {
        let grid = Grid::new();
        let mut piece = ActivePiece::new_at(red_green(), pos(5, COLS as i16 - 1), (-1, 0));

        assert!(!piece.try_rotate(&grid, Rotation::Clockwise));
        assert_eq!(piece.main(), pos(5, COLS as i16 - 1));
        assert_eq!(piece.offset(), (-1, 0));
    }

    #[test]
    fn rotation_above_ceiling_is_rejected() {
        let grid = Grid::new();
        let mut piece = ActivePiece::new_at(red_green(), pos(0, 2), (0, 1));

        assert!(!piece.try_rotate(&grid, Rotation::CounterClockwise));
        assert_eq!(piece.offset(), (0, 1));
    }

    #[test]
    fn rotation_into_occupied_cell_is_rejected() {
        let mut grid = Grid::new();
        grid.set(pos(5, 3), Cell::Filled(Color::Yellow));
        let mut piece = ActivePiece::new_at(red_green(), pos(5, 2), (-1, 0));

        assert!(!piece.try_rotate(&grid, Rotation::Clockwise));
        assert!(piece.try_rotate(&grid, Rotation::CounterClockwise));
    }

    #[test]
    fn falls_until_floor() {
        let grid = Grid::new();
        let mut piece = ActivePiece::spawn(red_green(), &grid).expect("open grid");

        let mut falls = 0;
        while piece.try_fall(&grid) {
            falls += 1;
        }

        assert_eq!(falls, ROWS - 2);
        assert_eq!(piece.main(), pos(ROWS as i16 - 1, 2));
    }

    #[test]
    fn lock_writes_both_halves() {
        let mut grid = Grid::new();
        let piece = ActivePiece::new_at(red_green(), pos(11, 2), (0, 1));

        piece.lock(&mut grid);

        assert_eq!(grid.color_at(pos(11, 2)), Some(Color::Red));
        assert_eq!(grid.color_at(pos(11, 3)), Some(Color::Green));
        assert_eq!(grid.filled_count(), 2);
    }
}

// ============================================================================
// Scoring Tests
// ============================================================================

mod scoring {
    use super::*;

    fn row_of(color: Color, row: i16, cols: std::ops::Range<i16>) -> Vec<(Position, Color)> {
        cols.map(|col| (pos(row, col), color)).collect()
    }

    #[test]
    fn four_red_first_chain_scores_80() {
        let matched = row_of(Color::Red, 11, 0..4);

        let breakdown = score_breakdown(&matched, 1);

        assert_eq!(breakdown.chain_power, 0);
        assert_eq!(breakdown.color_bonus, 0);
        assert_eq!(breakdown.group_bonus, 2);
        assert_eq!(breakdown.total_bonus, 2);
        assert_eq!(breakdown.score, 80);
        assert_eq!(calculate_score(&matched, 1), 80);
    }

    #[test]
    fn chain_power_table() {
        assert_eq!(chain_power(1), 0);
        assert_eq!(chain_power(2), 8);
        assert_eq!(chain_power(3), 16);
        assert_eq!(chain_power(4), 32);
        assert_eq!(chain_power(5), 64);
        assert_eq!(chain_power(6), 96);
        assert_eq!(chain_power(10), 224);
        assert_eq!(chain_power(18), 480);
        assert_eq!(chain_power(19), 512);
        assert_eq!(chain_power(40), 512);
    }

    #[test]
    fn color_bonus_table() {
        assert_eq!(color_bonus(1), 0);
        assert_eq!(color_bonus(2), 3);
        assert_eq!(color_bonus(3), 6);
        assert_eq!(color_bonus(4), 12);
        assert_eq!(color_bonus(5), 24);
    }

    #[test]
    fn group_bonus_table() {
        assert_eq!(group_bonus(4), 2);
        assert_eq!(group_bonus(5), 3);
        assert_eq!(group_bonus(6), 4);
        assert_eq!(group_bonus(7), 5);
        assert_eq!(group_bonus(8), 6);
        assert_eq!(group_bonus(9), 7);
        assert_eq!(group_bonus(10), 10);
        assert_eq!(group_bonus(11), 10);
        assert_eq!(group_bonus(30), 10);
    }

    #[test]
    fn two_colors_second_chain() {
        let mut matched = row_of(Color::Red, 11, 0..4);
        matched.extend(row_of(Color::Blue, 9, 0..4));

        let breakdown = score_breakdown(&matched, 2);

        // chain power 8 + two colors 3 + two groups of four 2 + 2
        assert_eq!(breakdown.total_bonus, 15);
        assert_eq!(breakdown.score, 10 * 8 * 15);
    }

    #[test]
    fn same_color_groups_counted_separately() {
        let mut matched = row_of(Color::Red, 11, 0..4);
        matched.extend(row_of(Color::Red, 9, 0..5));

        assert_eq!(group_sizes(&matched), vec![4, 5]);
        assert_eq!(score_breakdown(&matched, 1).group_bonus, 2 + 3);
    }

    #[test]
    fn total_bonus_has_floor_of_one() {
        let matched = row_of(Color::Green, 11, 0..3);

        let breakdown = score_breakdown(&matched, 1);

        assert_eq!(breakdown.total_bonus, 1);
        assert_eq!(breakdown.score, 30);
    }

    #[test]
    fn total_bonus_has_ceiling_of_999() {
        let matched: Vec<(Position, Color)> = (0..50)
            .flat_map(|group| row_of(Color::Red, group * 2, 0..11))
            .collect();

        let breakdown = score_breakdown(&matched, 19);

        assert_eq!(breakdown.group_bonus, 500);
        assert_eq!(breakdown.total_bonus, 999);
        assert_eq!(breakdown.score, 10 * 550 * 999);
    }

    #[test]
    fn empty_match_scores_nothing() {
        assert_eq!(calculate_score(&[], 3), 0);
    }

    #[test]
    fn score_is_deterministic_and_order_free() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut matched = row_of(Color::Yellow, 11, 0..6);
        matched.extend(row_of(Color::Green, 8, 1..5));

        let expected = calculate_score(&matched, 4);
        for _ in 0..20 {
            matched.shuffle(&mut rng);
            assert_eq!(calculate_score(&matched, 4), expected);
        }
    }
}

// ============================================================================
// Resolver Tests
// ============================================================================

mod resolver {
    use super::*;

    #[test]
    fn stable_board_settles_in_one_pass() {
        let mut grid = grid_from_rows(&["RG...."]);
        let mut resolver = ChainResolver::new();

        let reports = resolver.run(&mut grid);

        assert_eq!(reports.len(), 1);
        assert!(reports[0].settled);
        assert!(!reports[0].moved);
        assert_eq!(resolver.chain(), 0);
    }

    #[test]
    fn gravity_only_pass_does_not_count_as_chain() {
        let mut grid = grid_from_rows(&["R.....", "......"]);
        let mut resolver = ChainResolver::new();

        let reports = resolver.run(&mut grid);

        assert_eq!(reports.len(), 2);
        assert!(reports[0].moved);
        assert!(!reports[0].matched());
        assert!(!reports[0].settled);
        assert!(reports[1].settled);
        assert_eq!(resolver.chain(), 0);
        assert_eq!(grid.color_at(pos(11, 0)), Some(Color::Red));
    }

    #[test]
    fn single_group_clears_as_first_chain() {
        let mut grid = grid_from_rows(&["X.....", "RRRR.."]);
        let mut resolver = ChainResolver::new();

        let reports = resolver.run(&mut grid);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].chain, 1);
        assert_eq!(reports[0].cleared.len(), 4);
        assert_eq!(reports[0].garbage_cleared, 1);
        assert_eq!(reports[0].score(), 80);
        assert_eq!(grid.filled_count(), 0);
    }

    #[test]
    fn falling_cells_trigger_second_chain() {
        let mut grid = grid_from_rows(&["B.....", "RR....", "RR....", "BBB..."]);
        let mut resolver = ChainResolver::new();

        let reports = resolver.run(&mut grid);

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].chain, 1);
        assert_eq!(reports[0].score(), 80);
        assert!(reports[1].moved);
        assert_eq!(reports[1].chain, 2);
        // chain power 8 + group 2
        assert_eq!(reports[1].score(), 10 * 4 * 10);
        assert!(reports[2].settled);
        assert_eq!(resolver.chain(), 2);
        assert_eq!(grid.filled_count(), 0);
    }

    #[test]
    fn step_after_settling_is_noop() {
        let mut grid = grid_from_rows(&["RRRR.G"]);
        let mut resolver = ChainResolver::new();
        resolver.run(&mut grid);
        let passes = resolver.passes();

        let report = resolver.step(&mut grid);

        assert!(report.settled);
        assert!(!report.visible());
        assert_eq!(report.chain, 1);
        assert_eq!(resolver.passes(), passes);
        assert_eq!(bottom_rows(&grid, 1), vec![".....G"]);
    }

    #[test]
    fn chain_counter_only_moves_on_matching_passes() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = random_grid(&mut rng);
            let mut resolver = ChainResolver::new();

            let reports = resolver.run(&mut grid);

            let matching = reports.iter().filter(|r| r.matched()).count() as u32;
            assert_eq!(resolver.chain(), matching, "seed {seed}");
            assert!(reports.last().is_some_and(|r| r.settled));
            assert!(grid.find_matches().is_empty());
        }
    }
}

// ============================================================================
// Nuisance Tests
// ============================================================================

mod nuisance {
    use super::*;

    fn boards() -> [BoardState; 2] {
        let mut provider = SequencePairs::new(vec![ColorPair::new(Color::Red, Color::Blue)]);
        [
            BoardState::new(Grid::new(), &mut provider),
            BoardState::new(Grid::new(), &mut provider),
        ]
    }

    fn generate(board: &mut BoardState, units: u32) {
        assert_eq!(board.ledger.bank(units * NUISANCE_RATE), units);
    }

    #[test]
    fn score_converts_at_seventy_points() {
        let mut ledger = NuisanceLedger::new();

        assert_eq!(ledger.bank(80), 1);
        assert_eq!(ledger.remainder(), 10);
        assert_eq!(ledger.bank(130), 2);
        assert_eq!(ledger.remainder(), 0);
        assert_eq!(ledger.bank(69), 0);
        assert_eq!(ledger.remainder(), 69);
        assert_eq!(ledger.generated(), 3);
    }

    #[test]
    fn remainder_accounting_is_conservative() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ledger = NuisanceLedger::new();
            let initial = ledger.bank(rng.gen_range(0..NUISANCE_RATE));
            assert_eq!(initial, 0);
            let initial_remainder = ledger.remainder();

            let mut total_score = 0;
            let mut total_units = 0;
            for _ in 0..40 {
                let score = rng.gen_range(0..5000);
                total_score += score;
                total_units += ledger.bank(score);
                assert!(ledger.remainder() < NUISANCE_RATE);
            }

            assert_eq!(
                total_units * NUISANCE_RATE + ledger.remainder(),
                total_score + initial_remainder
            );
        }
    }

    #[test]
    fn generated_beyond_pending_overflows_to_opponent() {
        let mut boards = boards();
        boards[0].ledger.add_pending(5);
        generate(&mut boards[0], 8);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = exchange(&mut boards, Player::One, 30, &mut rng);

        assert_eq!(outcome.offset, 5);
        assert_eq!(outcome.sent, 3);
        assert_eq!(outcome.dropped, 0);
        assert_eq!(boards[0].ledger.pending(), 0);
        assert_eq!(boards[0].ledger.generated(), 0);
        assert_eq!(boards[1].ledger.pending(), 3);
        assert_eq!(boards[0].grid.filled_count(), 0);
    }

    #[test]
    fn generated_below_pending_only_reduces_it() {
        let mut boards = boards();
        boards[0].ledger.add_pending(5);
        generate(&mut boards[0], 3);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = exchange(&mut boards, Player::One, 30, &mut rng);

        assert_eq!(outcome.offset, 3);
        assert_eq!(outcome.sent, 0);
        assert_eq!(boards[1].ledger.pending(), 0);
        // The two units still owed drop right away.
        assert_eq!(outcome.dropped, 2);
        assert_eq!(boards[0].ledger.pending(), 0);
        assert_eq!(boards[0].grid.filled_count(), 2);
    }

    #[test]
    fn nothing_pending_sends_everything() {
        let mut boards = boards();
        generate(&mut boards[1], 4);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = exchange(&mut boards, Player::Two, 30, &mut rng);

        assert_eq!(outcome.generated, 4);
        assert_eq!(outcome.sent, 4);
        assert_eq!(boards[0].ledger.pending(), 4);
        assert_eq!(boards[1].grid.filled_count(), 0);
    }

    #[test]
    fn drop_is_capped_and_clears_pending() {
        let mut boards = boards();
        boards[0].ledger.add_pending(50);
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = exchange(&mut boards, Player::One, 30, &mut rng);

        assert!(outcome.dropped <= 30);
        assert_eq!(outcome.dropped + outcome.discarded, 50);
        assert_eq!(boards[0].grid.filled_count(), outcome.dropped as usize);
        assert_eq!(boards[0].ledger.pending(), 0);
        assert!(boards[0].grid.find_matches().is_empty());
    }

    #[test]
    fn dropped_garbage_rests_on_stack() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = grid_from_rows(&["R.....", "GB.Y.."]);

            let placed = drop_garbage(&mut grid, 12, &mut rng);

            assert_eq!(placed, 12);
            assert!(!grid.apply_gravity(), "garbage left floating for seed {seed}");
        }
    }

    #[test]
    fn each_unit_lands_on_the_previous_one() {
        let mut grid = grid_from_rows(&["...Y.."]);

        assert_eq!(grid.landing_row(0), Some(11));
        assert!(grid.drop_garbage(0));
        assert!(grid.drop_garbage(0));
        assert!(grid.drop_garbage(3));

        assert_eq!(bottom_rows(&grid, 2), vec!["X..X..", "X..Y.."]);
    }

    #[test]
    fn full_columns_reject_garbage() {
        let mut grid = Grid::new();
        for position in Grid::positions() {
            grid.set(position, Cell::Filled(Color::Garbage));
        }
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(grid.landing_row(2), None);
        assert_eq!(drop_garbage(&mut grid, 10, &mut rng), 0);
    }
}
