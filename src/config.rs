use thiserror::Error;

pub const DEFAULT_STARTING_MOVES: i32 = 3;
pub const DEFAULT_BONUS_MOVES_PER_CHAIN: i32 = 2;
/// Upper bound on garbage cells placed by a single exchange.
pub const DEFAULT_MAX_GARBAGE_DROP: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("starting moves must be at least 1, got {0}")]
    InvalidStartingMoves(i32),
    #[error("bonus moves per chain cannot be negative, got {0}")]
    InvalidBonusMoves(i32),
    #[error("garbage drop cap must be at least 1, got {0}")]
    InvalidDropCap(u32),
}

/// Rule knobs for a session. `Default` is the standard rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesConfig {
    /// Moves a board receives when its turn starts.
    pub starting_moves: i32,
    /// Moves granted to the opponent per chain step.
    pub bonus_moves_per_chain: i32,
    pub max_garbage_drop: u32,
    pub seed: u64,
}

impl RulesConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.starting_moves < 1 {
            return Err(ConfigError::InvalidStartingMoves(self.starting_moves));
        }
        if self.bonus_moves_per_chain < 0 {
            return Err(ConfigError::InvalidBonusMoves(self.bonus_moves_per_chain));
        }
        if self.max_garbage_drop == 0 {
            return Err(ConfigError::InvalidDropCap(self.max_garbage_drop));
        }
        Ok(self)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_moves: DEFAULT_STARTING_MOVES,
            bonus_moves_per_chain: DEFAULT_BONUS_MOVES_PER_CHAIN,
            max_garbage_drop: DEFAULT_MAX_GARBAGE_DROP,
            seed: 0,
        }
    }
}
