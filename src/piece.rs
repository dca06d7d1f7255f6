use crate::grid::{Cell, Color, Grid, Position};

/// Column both halves of a new pair appear in.
pub const SPAWN_COL: i16 = 2;
pub const SPAWN_MAIN: Position = Position::new(1, SPAWN_COL);
pub const SPAWN_SUB: Position = Position::new(0, SPAWN_COL);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ColorPair {
    pub main: Color,
    pub sub: Color,
}

impl ColorPair {
    pub const fn new(main: Color, sub: Color) -> Self {
        Self { main, sub }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// True when a new pair cannot appear on `grid`; the only way to lose.
pub fn spawn_blocked(grid: &Grid) -> bool {
    grid.is_occupied(SPAWN_MAIN) || grid.is_occupied(SPAWN_SUB)
}

/// The falling two-cell unit. The satellite ("sub") always sits one step away
/// from the pivot ("main"); its offset is stored rather than a rotation index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    main: Position,
    offset: (i16, i16),
    pair: ColorPair,
}

impl ActivePiece {
    /// Places `pair` at the spawn cells, sub above main. `None` if either cell is taken.
    pub fn spawn(pair: ColorPair, grid: &Grid) -> Option<Self> {
        if spawn_blocked(grid) {
            return None;
        }
        Some(Self::new_at(pair, SPAWN_MAIN, (-1, 0)))
    }

    /// Piece at an arbitrary spot. `offset` must be a unit orthogonal step.
    pub fn new_at(pair: ColorPair, main: Position, offset: (i16, i16)) -> Self {
        debug_assert_eq!(offset.0.abs() + offset.1.abs(), 1);
        Self { main, offset, pair }
    }

    pub fn main(&self) -> Position {
        self.main
    }

    pub fn sub(&self) -> Position {
        self.main.offset(self.offset.0, self.offset.1)
    }

    pub fn offset(&self) -> (i16, i16) {
        self.offset
    }

    pub fn pair(&self) -> ColorPair {
        self.pair
    }

    /// 0 = sub above, 1 = right, 2 = below, 3 = left.
    pub fn rotation(&self) -> u8 {
        match self.offset {
            (-1, 0) => 0,
            (0, 1) => 1,
            (1, 0) => 2,
            _ => 3,
        }
    }

    pub fn blocks(&self) -> [(Position, Color); 2] {
        [(self.main, self.pair.main), (self.sub(), self.pair.sub)]
    }

    fn fits(&self, grid: &Grid) -> bool {
        grid.is_free(self.main) && grid.is_free(self.sub())
    }

    fn moved(&self, dr: i16, dc: i16) -> Self {
        Self {
            main: self.main.offset(dr, dc),
            ..*self
        }
    }

    fn rotated(&self, rotation: Rotation) -> Self {
        let (dr, dc) = self.offset;
        let offset = match rotation {
            Rotation::Clockwise => (dc, -dr),
            Rotation::CounterClockwise => (-dc, dr),
        };
        Self { offset, ..*self }
    }

    fn try_replace(&mut self, candidate: Self, grid: &Grid) -> bool {
        if candidate.fits(grid) {
            *self = candidate;
            true
        } else {
            false
        }
    }

    /// Shifts one column left (`-1`) or right (`+1`).
    pub fn try_shift(&mut self, grid: &Grid, dir: i16) -> bool {
        self.try_replace(self.moved(0, dir.signum()), grid)
    }

    /// Rotates the sub around main. Blocked rotations are rejected outright;
    /// no wall kicks.
    pub fn try_rotate(&mut self, grid: &Grid, rotation: Rotation) -> bool {
        self.try_replace(self.rotated(rotation), grid)
    }

    /// Moves down one row. `false` means the piece has landed and must lock.
    pub fn try_fall(&mut self, grid: &Grid) -> bool {
        self.try_replace(self.moved(1, 0), grid)
    }

    /// Writes both halves into the grid where they stand.
    pub fn lock(self, grid: &mut Grid) {
        for (pos, color) in self.blocks() {
            grid.set(pos, Cell::Filled(color));
        }
    }
}
