use std::fmt;

// ============================================================================
// Configuration
// ============================================================================

pub const ROWS: usize = 12;
pub const COLS: usize = 6;

/// Smallest connected group that clears.
pub const MIN_GROUP_SIZE: usize = 4;

const NEIGHBOURS_4: [(i16, i16); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

// ============================================================================
// Types
// ============================================================================

/// Grid coordinate. Row 0 is the top, column 0 the left edge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Position {
    pub row: i16,
    pub col: i16,
}

impl Position {
    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    pub fn offset(self, dr: i16, dc: i16) -> Self {
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    pub fn neighbours(self) -> impl Iterator<Item = Position> {
        NEIGHBOURS_4
            .into_iter()
            .map(move |(dr, dc)| self.offset(dr, dc))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    /// Nuisance filler. Never matches, cleared only by an adjacent match.
    Garbage,
}

impl Color {
    /// Colors a generated pair can take.
    pub const MATCHABLE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn is_garbage(self) -> bool {
        self == Color::Garbage
    }

    pub fn symbol(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Garbage => 'X',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Color),
}

impl Cell {
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(color),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// Maximal 4-connected set of same-colored, non-garbage cells.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MatchGroup {
    pub color: Color,
    /// Sorted row-major.
    pub cells: Vec<Position>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ============================================================================
// Grid
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; COLS]; ROWS],
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < ROWS && (pos.col as usize) < COLS
    }

    /// `None` outside the grid; neighbour scans probe past the edges all the time.
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells[pos.row as usize][pos.col as usize])
    }

    /// Writes `cell` and returns `true`, or does nothing and returns `false` out of bounds.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        self.cells[pos.row as usize][pos.col as usize] = cell;
        true
    }

    /// In bounds and empty.
    pub fn is_free(&self, pos: Position) -> bool {
        self.get(pos) == Some(Cell::Empty)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        matches!(self.get(pos), Some(Cell::Filled(_)))
    }

    pub fn color_at(&self, pos: Position) -> Option<Color> {
        self.get(pos).and_then(Cell::color)
    }

    pub fn rows(&self) -> &[[Cell; COLS]; ROWS] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells = [[Cell::Empty; COLS]; ROWS];
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn positions() -> impl Iterator<Item = Position> {
        (0..ROWS as i16).flat_map(|row| (0..COLS as i16).map(move |col| Position::new(row, col)))
    }

    /// Column contents top to bottom, gaps skipped.
    pub fn column_stack(&self, col: usize) -> Vec<Color> {
        (0..ROWS)
            .filter_map(|row| self.cells[row][col].color())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Gravity
    // ------------------------------------------------------------------------

    /// Compacts every column downward, keeping relative order.
    /// Returns whether any cell moved.
    pub fn apply_gravity(&mut self) -> bool {
        let mut moved = false;
        for col in 0..COLS {
            let mut write = ROWS;
            for row in (0..ROWS).rev() {
                let cell = self.cells[row][col];
                if cell.is_empty() {
                    continue;
                }
                write -= 1;
                if write != row {
                    self.cells[write][col] = cell;
                    self.cells[row][col] = Cell::Empty;
                    moved = true;
                }
            }
        }
        moved
    }

    // ------------------------------------------------------------------------
    // Match scan
    // ------------------------------------------------------------------------

    /// All groups of at least [`MIN_GROUP_SIZE`], scanned row-major.
    pub fn find_matches(&self) -> Vec<MatchGroup> {
        self.find_matches_in_order(Self::positions())
    }

    /// Same as [`Grid::find_matches`] but seeds the flood fill in `order`,
    /// which must be a permutation of [`Grid::positions`]. Any such order
    /// yields the same groups.
    pub fn find_matches_in_order(
        &self,
        order: impl IntoIterator<Item = Position>,
    ) -> Vec<MatchGroup> {
        let mut visited = [[false; COLS]; ROWS];
        let mut groups = Vec::new();

        for start in order {
            let Some(color) = self.color_at(start) else {
                continue;
            };
            if color.is_garbage() || visited[start.row as usize][start.col as usize] {
                continue;
            }
            let group = self.flood_fill(start, color, &mut visited);
            if group.len() >= MIN_GROUP_SIZE {
                groups.push(group);
            }
        }

        groups.sort_by_key(|group| group.cells[0]);
        groups
    }

    fn flood_fill(
        &self,
        start: Position,
        color: Color,
        visited: &mut [[bool; COLS]; ROWS],
    ) -> MatchGroup {
        let mut cells = vec![start];
        let mut stack = vec![start];
        visited[start.row as usize][start.col as usize] = true;

        while let Some(pos) = stack.pop() {
            for next in pos.neighbours() {
                if self.color_at(next) != Some(color) {
                    continue;
                }
                let seen = &mut visited[next.row as usize][next.col as usize];
                if !*seen {
                    *seen = true;
                    cells.push(next);
                    stack.push(next);
                }
            }
        }

        cells.sort();
        MatchGroup { color, cells }
    }

    /// Empties every matched cell plus any garbage orthogonally adjacent to one.
    /// Returns the number of garbage cells removed.
    pub fn remove_matched(&mut self, matched: &[Position]) -> usize {
        let mut garbage = Vec::new();
        for &pos in matched {
            for next in pos.neighbours() {
                if self.color_at(next) == Some(Color::Garbage) && !garbage.contains(&next) {
                    garbage.push(next);
                }
            }
        }

        for &pos in matched.iter().chain(garbage.iter()) {
            self.set(pos, Cell::Empty);
        }
        garbage.len()
    }

    // ------------------------------------------------------------------------
    // Garbage
    // ------------------------------------------------------------------------

    /// Row a garbage cell dropped into `col` comes to rest on, or `None` if the
    /// column is full.
    pub fn landing_row(&self, col: i16) -> Option<i16> {
        let mut row = 0;
        while row < ROWS as i16 && self.is_free(Position::new(row, col)) {
            row += 1;
        }
        (row > 0).then_some(row - 1)
    }

    /// Places one garbage cell at rest in `col`. Returns `false` if the column is full.
    pub fn drop_garbage(&mut self, col: i16) -> bool {
        match self.landing_row(col) {
            Some(row) => self.set(Position::new(row, col), Cell::Filled(Color::Garbage)),
            None => false,
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| cell.color().map_or('.', Color::symbol))
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    /// Builds a grid from ASCII rows aligned to the floor: the last string is
    /// the bottom row. `R G B Y` are colors, `X` garbage, anything else empty.
    pub fn grid_from_rows(rows: &[&str]) -> Grid {
        assert!(rows.len() <= ROWS, "too many rows");
        let mut grid = Grid::new();
        let top = ROWS - rows.len();
        for (i, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().take(COLS).enumerate() {
                let cell = match ch {
                    'R' => Cell::Filled(Color::Red),
                    'G' => Cell::Filled(Color::Green),
                    'B' => Cell::Filled(Color::Blue),
                    'Y' => Cell::Filled(Color::Yellow),
                    'X' => Cell::Filled(Color::Garbage),
                    _ => Cell::Empty,
                };
                grid.set(Position::new((top + i) as i16, col as i16), cell);
            }
        }
        grid
    }

    /// Inverse of [`grid_from_rows`] over the bottom `count` rows.
    pub fn bottom_rows(grid: &Grid, count: usize) -> Vec<String> {
        grid.rows()[ROWS - count..]
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.color().map_or('.', Color::symbol))
                    .collect()
            })
            .collect()
    }
}
