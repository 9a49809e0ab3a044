//! Catch: a falling ball and a paddle on a small grid.
//!
//! The ball starts in a random column of the top row and falls one row per
//! step; the paddle sits on the bottom row and moves left/stay/right. The
//! episode terminates when the ball reaches the bottom row, with reward `+1`
//! if the paddle is under it and `-1` otherwise. The only randomness is the
//! ball's starting column, drawn from the generator carried in the state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use safari_core::error::{ConfigError, EnvError};
use safari_core::spec::Spec;
use safari_core::types::Timestep;
use safari_core::value::{Tensor, Value};
use safari_env::env::Environment;

// ---------------------------------------------------------------------------
// CatchConfig
// ---------------------------------------------------------------------------

/// Grid dimensions for [`Catch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchConfig {
    /// Grid height; the ball takes `rows - 1` steps to fall.
    pub rows: usize,
    /// Grid width.
    pub cols: usize,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self { rows: 10, cols: 5 }
    }
}

impl CatchConfig {
    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < 2 {
            return Err(ConfigError::InvalidValue {
                field: "rows".into(),
                message: "must be >= 2 so the ball has room to fall".into(),
            });
        }
        if self.cols < 1 {
            return Err(ConfigError::InvalidValue {
                field: "cols".into(),
                message: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catch
// ---------------------------------------------------------------------------

/// The Catch environment.
#[derive(Debug, Clone)]
pub struct Catch {
    config: CatchConfig,
}

/// Full state of one Catch episode.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchState {
    pub ball_row: usize,
    pub ball_col: usize,
    pub paddle_col: usize,
    /// Generator state, threaded through so transitions stay pure.
    pub rng: ChaCha8Rng,
}

impl Catch {
    /// Build a Catch environment, validating the config eagerly.
    pub fn new(config: CatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn config(&self) -> &CatchConfig {
        &self.config
    }

    fn observe(&self, state: &CatchState) -> Value {
        let CatchConfig { rows, cols } = self.config;
        let mut board = vec![0.0; rows * cols];
        board[state.ball_row * cols + state.ball_col] = 1.0;
        board[(rows - 1) * cols + state.paddle_col] = 1.0;
        Value::Leaf(Tensor::from_f32(vec![rows, cols], board))
    }
}

impl Environment for Catch {
    type State = CatchState;

    fn reset(&self, seed: u64) -> (Self::State, Timestep) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ball_col = rng.gen_range(0..self.config.cols);
        let state = CatchState {
            ball_row: 0,
            ball_col,
            paddle_col: self.config.cols / 2,
            rng,
        };
        let timestep = Timestep::restart(self.observe(&state));
        (state, timestep)
    }

    fn step(
        &self,
        state: &Self::State,
        action: &Value,
    ) -> Result<(Self::State, Timestep), EnvError> {
        if state.ball_row >= self.config.rows - 1 {
            return Err(EnvError::StateMismatch(
                "episode already ended; reset to start a new one".into(),
            ));
        }
        self.action_spec().validate(action)?;
        let movement = action
            .as_leaf()
            .and_then(Tensor::scalar_as_i64)
            .ok_or_else(|| EnvError::StateMismatch("action is not a scalar int".into()))?;

        // Actions 0/1/2 map to left/stay/right. Moving into a wall is a
        // legal-but-ineffective move: the paddle stays put, no penalty.
        let delta = movement - 1;
        let paddle_col = (state.paddle_col as i64 + delta)
            .clamp(0, self.config.cols as i64 - 1) as usize;

        let next = CatchState {
            ball_row: state.ball_row + 1,
            ball_col: state.ball_col,
            paddle_col,
            rng: state.rng.clone(),
        };
        let observation = self.observe(&next);
        let timestep = if next.ball_row == self.config.rows - 1 {
            let caught = next.ball_col == next.paddle_col;
            Timestep::termination(if caught { 1.0 } else { -1.0 }, observation)
        } else {
            Timestep::transition(0.0, observation)
        };
        Ok((next, timestep))
    }

    fn observation_spec(&self) -> Spec {
        Spec::bounded_float(vec![self.config.rows, self.config.cols], 0.0, 1.0)
    }

    fn action_spec(&self) -> Spec {
        Spec::discrete(3)
    }

    fn reward_spec(&self) -> Spec {
        Spec::bounded_float(Vec::new(), -1.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
