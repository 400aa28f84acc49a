//! Encoder errors.

use std::fmt;

use thiserror::Error;

/// Entity within a snapshot, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Ball,
    Player(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ball => write!(f, "ball"),
            Self::Player(slot) => write!(f, "player {slot}"),
        }
    }
}

/// Precondition violations detected before encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("cannot encode an empty state sequence")]
    EmptySequence,

    #[error("roster size changed at tick {tick}: expected {expected} players, got {actual}")]
    RosterSizeChanged {
        tick: usize,
        expected: usize,
        actual: usize,
    },

    #[error("tick_skip must be at least 1, got {tick_skip}")]
    InvalidTickSkip { tick_skip: u32 },

    #[error("non-finite value at tick {tick} in {entity}")]
    NonFiniteValue { tick: usize, entity: EntityRef },
}
