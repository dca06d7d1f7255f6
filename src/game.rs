use rand::{rngs::StdRng, SeedableRng};

use crate::config::{ConfigError, RulesConfig};
use crate::grid::{Cell, Grid};
use crate::nuisance::{self, NuisanceLedger};
use crate::piece::{spawn_blocked, ActivePiece, ColorPair, Rotation};
use crate::queue::{PairProvider, PairQueue, RandomPairs, QUEUE_LEN};
use crate::resolver::{ChainResolver, PassReport};

// ============================================================================
// Configuration
// ============================================================================

/// Keeps the garbage-column stream apart from pair generation under one seed.
const GARBAGE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// Player input for the active board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    RotateCcw,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnPhase {
    /// The active board has a piece and accepts commands.
    AwaitingInput,
    /// The active board is working through a chain; commands are rejected.
    Resolving,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceSpawned(Player),
    PieceMoved(Player),
    PieceRotated(Player),
    PieceLocked(Player),
    ChainPass {
        player: Player,
        chain: u32,
        score: u32,
        cleared: usize,
        garbage_cleared: usize,
        nuisance: u32,
    },
    BonusMoves {
        player: Player,
        moves: i32,
    },
    NuisanceOffset {
        player: Player,
        units: u32,
    },
    NuisanceSent {
        from: Player,
        units: u32,
    },
    GarbageDropped {
        player: Player,
        count: u32,
    },
    TurnSwitched(Player),
    GameOver {
        winner: Player,
    },
    GameReset,
}

// ============================================================================
// Board
// ============================================================================

/// Everything one player owns.
#[derive(Clone, Debug)]
pub struct BoardState {
    pub grid: Grid,
    pub active: Option<ActivePiece>,
    pub score: u32,
    pub ledger: NuisanceLedger,
    pub queue: PairQueue,
    resolver: Option<ChainResolver>,
}

impl BoardState {
    pub fn new(grid: Grid, provider: &mut dyn PairProvider) -> Self {
        Self {
            grid,
            active: None,
            score: 0,
            ledger: NuisanceLedger::new(),
            queue: PairQueue::new(provider),
            resolver: None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        self.resolver.is_some()
    }

    /// The settled grid with the falling piece drawn in.
    pub fn render_grid(&self) -> Grid {
        let mut visual = self.grid.clone();
        if let Some(piece) = self.active {
            for (pos, color) in piece.blocks() {
                visual.set(pos, Cell::Filled(color));
            }
        }
        visual
    }
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BoardSnapshot {
    pub grid: Grid,
    pub active: Option<ActivePiece>,
    pub score: u32,
    pub moves_remaining: i32,
    pub pending_nuisance: u32,
    pub nuisance_remainder: u32,
    pub queue: [ColorPair; QUEUE_LEN],
    pub resolving: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GameSnapshot {
    pub boards: [BoardSnapshot; 2],
    pub active_player: Player,
    pub phase: TurnPhase,
    pub last_winner: Option<Player>,
}

// ============================================================================
// Turn State
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TurnState {
    pub active: Player,
    /// Signed move budget per board, indexed by [`Player::index`].
    pub moves: [i32; 2],
}

impl TurnState {
    fn new(config: &RulesConfig) -> Self {
        Self {
            active: Player::One,
            moves: [config.starting_moves, 0],
        }
    }
}

// ============================================================================
// Game Session
// ============================================================================

pub struct GameSession {
    config: RulesConfig,
    boards: [BoardState; 2],
    turn: TurnState,
    phase: TurnPhase,
    provider: Box<dyn PairProvider>,
    rng: StdRng,
    last_winner: Option<Player>,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Session with random pairs drawn from `config.seed`.
    pub fn new(config: RulesConfig) -> Result<Self, ConfigError> {
        let provider = Box::new(RandomPairs::new(config.seed));
        Self::with_provider(config, provider)
    }

    pub fn with_provider(
        config: RulesConfig,
        provider: Box<dyn PairProvider>,
    ) -> Result<Self, ConfigError> {
        Self::with_grids(config, provider, [Grid::new(), Grid::new()])
    }

    /// Starts on prepared grids instead of empty ones. A later reset clears them.
    pub fn with_grids(
        config: RulesConfig,
        mut provider: Box<dyn PairProvider>,
        grids: [Grid; 2],
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let [first, second] = grids;
        let boards = [
            BoardState::new(first, provider.as_mut()),
            BoardState::new(second, provider.as_mut()),
        ];

        let mut session = Self {
            config,
            boards,
            turn: TurnState::new(&config),
            phase: TurnPhase::AwaitingInput,
            provider,
            rng: StdRng::seed_from_u64(config.seed ^ GARBAGE_SEED_SALT),
            last_winner: None,
            events: Vec::new(),
        };
        session.spawn(Player::One);
        Ok(session)
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn board(&self, player: Player) -> &BoardState {
        &self.boards[player.index()]
    }

    pub fn active_player(&self) -> Player {
        self.turn.active
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn moves_remaining(&self, player: Player) -> i32 {
        self.turn.moves[player.index()]
    }

    pub fn last_winner(&self) -> Option<Player> {
        self.last_winner
    }

    pub fn is_resolving(&self) -> bool {
        self.phase == TurnPhase::Resolving
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Applies `command` to the active board's piece. Returns `false` when the
    /// command was rejected: blocked, no piece, or mid-resolution.
    pub fn apply(&mut self, command: Command) -> bool {
        if self.phase != TurnPhase::AwaitingInput {
            return false;
        }
        let player = self.turn.active;
        let board = &mut self.boards[player.index()];
        if board.is_resolving() {
            return false;
        }
        let Some(piece) = board.active.as_mut() else {
            return false;
        };

        let (accepted, event) = match command {
            Command::MoveLeft => (
                piece.try_shift(&board.grid, -1),
                GameEvent::PieceMoved(player),
            ),
            Command::MoveRight => (
                piece.try_shift(&board.grid, 1),
                GameEvent::PieceMoved(player),
            ),
            Command::RotateCw => (
                piece.try_rotate(&board.grid, Rotation::Clockwise),
                GameEvent::PieceRotated(player),
            ),
            Command::RotateCcw => (
                piece.try_rotate(&board.grid, Rotation::CounterClockwise),
                GameEvent::PieceRotated(player),
            ),
            Command::SoftDrop => {
                if !piece.try_fall(&board.grid) {
                    self.lock_active(player);
                    return true;
                }
                (true, GameEvent::PieceMoved(player))
            }
        };

        if accepted {
            self.events.push(event);
        }
        accepted
    }

    fn lock_active(&mut self, player: Player) {
        let board = &mut self.boards[player.index()];
        let Some(piece) = board.active.take() else {
            return;
        };
        piece.lock(&mut board.grid);
        board.resolver = Some(ChainResolver::new());
        self.phase = TurnPhase::Resolving;
        self.events.push(GameEvent::PieceLocked(player));
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Advances the active board's chain by one pass. `None` when nothing is
    /// resolving. The settling pass also finishes the turn.
    pub fn step(&mut self) -> Option<PassReport> {
        let player = self.turn.active;
        let board = &mut self.boards[player.index()];
        let resolver = board.resolver.as_mut()?;

        let report = resolver.step(&mut board.grid);
        let chain = resolver.chain();

        if report.matched() {
            board.score += report.score();
            let nuisance = board.ledger.bank(report.score());
            self.events.push(GameEvent::ChainPass {
                player,
                chain: report.chain,
                score: report.score(),
                cleared: report.cleared.len(),
                garbage_cleared: report.garbage_cleared,
                nuisance,
            });
        }

        if report.settled {
            board.resolver = None;
            self.finish_turn(player, chain);
        }
        Some(report)
    }

    /// Runs the current chain to completion and returns every pass.
    pub fn settle(&mut self) -> Vec<PassReport> {
        let mut reports = Vec::new();
        while let Some(report) = self.step() {
            reports.push(report);
        }
        reports
    }

    fn finish_turn(&mut self, player: Player, chain: u32) {
        let me = player.index();
        let opponent = player.opponent();

        self.turn.moves[me] -= 1;
        let out_of_moves = self.turn.moves[me] <= 0;

        if chain == 0 && !out_of_moves {
            self.spawn(player);
            return;
        }

        let bonus = chain as i32 * self.config.bonus_moves_per_chain;
        if bonus > 0 {
            self.turn.moves[opponent.index()] += bonus;
            self.events.push(GameEvent::BonusMoves {
                player: opponent,
                moves: bonus,
            });
        }

        let outcome = nuisance::exchange(
            &mut self.boards,
            player,
            self.config.max_garbage_drop,
            &mut self.rng,
        );
        if outcome.offset > 0 {
            self.events.push(GameEvent::NuisanceOffset {
                player,
                units: outcome.offset,
            });
        }
        if outcome.sent > 0 {
            self.events.push(GameEvent::NuisanceSent {
                from: player,
                units: outcome.sent,
            });
        }
        if outcome.dropped > 0 {
            self.events.push(GameEvent::GarbageDropped {
                player,
                count: outcome.dropped,
            });
        }

        if spawn_blocked(&self.boards[me].grid) {
            self.game_over(opponent);
            return;
        }
        self.switch_turn();
    }

    // ------------------------------------------------------------------------
    // Turn Control
    // ------------------------------------------------------------------------

    fn switch_turn(&mut self) {
        let outgoing = self.turn.active;
        let incoming = outgoing.opponent();

        self.turn.moves[outgoing.index()] = 0;
        self.turn.moves[incoming.index()] += self.config.starting_moves;
        self.turn.active = incoming;
        self.events.push(GameEvent::TurnSwitched(incoming));

        self.spawn(incoming);
    }

    fn spawn(&mut self, player: Player) {
        let board = &mut self.boards[player.index()];
        let pair = board.queue.take(self.provider.as_mut());

        match ActivePiece::spawn(pair, &board.grid) {
            Some(piece) => {
                board.active = Some(piece);
                self.phase = TurnPhase::AwaitingInput;
                self.events.push(GameEvent::PieceSpawned(player));
            }
            None => self.game_over(player.opponent()),
        }
    }

    fn game_over(&mut self, winner: Player) {
        self.last_winner = Some(winner);
        self.events.push(GameEvent::GameOver { winner });
        self.reset();
    }

    /// Empties both boards, restarts both queues and hands player one a fresh turn.
    pub fn reset(&mut self) {
        for board in &mut self.boards {
            board.grid.clear();
            board.active = None;
            board.score = 0;
            board.ledger = NuisanceLedger::new();
            board.queue.restart(self.provider.as_mut());
            board.resolver = None;
        }
        self.turn = TurnState::new(&self.config);
        self.phase = TurnPhase::AwaitingInput;
        self.events.push(GameEvent::GameReset);

        self.spawn(Player::One);
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            boards: Player::BOTH.map(|player| {
                let board = self.board(player);
                BoardSnapshot {
                    grid: board.grid.clone(),
                    active: board.active,
                    score: board.score,
                    moves_remaining: self.moves_remaining(player),
                    pending_nuisance: board.ledger.pending(),
                    nuisance_remainder: board.ledger.remainder(),
                    queue: board.queue.peek(),
                    resolving: board.is_resolving(),
                }
            }),
            active_player: self.turn.active,
            phase: self.phase,
            last_winner: self.last_winner,
        }
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
