//! Pearl Game State
//!
//! This crate contains the snapshot types observed from the physics
//! simulation of a match. A snapshot carries only instantaneous values:
//! positions, velocities, orientation, and the binary "demolished" and
//! "boost pad active" flags.
//!
//! # Constraints
//!
//! This crate MUST NOT:
//! - Perform I/O operations
//! - Simulate physics (it only describes externally supplied state)
//!
//! Snapshots are plain values. Anything derived across time (respawn
//! countdowns, pad timers) belongs to the encoder.

#![deny(unsafe_code)]

// ============================================================================
// Simulation Constants
// ============================================================================

/// Physics simulation rate in ticks per second.
pub const TICK_RATE_HZ: u32 = 120;

/// Number of boost pads on a standard arena.
pub const BOOST_PAD_COUNT: usize = 34;

// ============================================================================
// Core Types
// ============================================================================

/// Team membership of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Blue,
    Orange,
}

impl Team {
    /// Map a raw team number (0 = blue, 1 = orange).
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Blue),
            1 => Some(Self::Orange),
            _ => None,
        }
    }

    /// Raw team number (0 = blue, 1 = orange).
    pub fn index(self) -> u32 {
        match self {
            Self::Blue => 0,
            Self::Orange => 1,
        }
    }

    /// Signed unit value: -1 for blue, +1 for orange.
    pub fn sign(self) -> f32 {
        2.0 * self.index() as f32 - 1.0
    }
}

/// Rigid body state of a car.
///
/// `quaternion` is stored as `(w, x, y, z)` and is expected to be unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsState {
    pub position: [f32; 3],
    pub linear_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub quaternion: [f32; 4],
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            quaternion: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Ball state. The ball's orientation is not observed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallState {
    pub position: [f32; 3],
    pub linear_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
}

/// A single player in the roster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub team: Team,
    pub car: PhysicsState,
    /// Boost amount on a 0..=100 scale.
    pub boost_amount: f32,
    pub is_demoed: bool,
}

impl PlayerState {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            car: PhysicsState::default(),
            boost_amount: 0.0,
            is_demoed: false,
        }
    }
}

/// One observed snapshot of the match.
///
/// `players` is ordered by roster slot; the roster is expected to keep the
/// same size across a sequence. `boost_pads[i]` is true while pad `i` is
/// active (can be picked up).
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub ball: BallState,
    pub players: Vec<PlayerState>,
    pub boost_pads: [bool; BOOST_PAD_COUNT],
}

impl GameState {
    /// Snapshot with the ball at rest, the given roster, and all pads active.
    pub fn new(players: Vec<PlayerState>) -> Self {
        Self {
            ball: BallState::default(),
            players,
            boost_pads: [true; BOOST_PAD_COUNT],
        }
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }
}

// ============================================================================
// States Digest
// ============================================================================

/// Digest algorithm identifier for `states_digest`.
pub const STATES_DIGEST_ALGO_ID: &str = "statesdigest-v1-fnv1a64-le-f32canon-roster-order";

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn update_f32s(&mut self, values: &[f32]) {
        for &value in values {
            self.update(&canonicalize_f32(value).to_le_bytes());
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

/// Canonicalize an f32 value for deterministic hashing.
///
/// Rules:
/// - `-0.0` → `+0.0`
/// - Any NaN → quiet NaN bit pattern `0x7fc00000`
fn canonicalize_f32(value: f32) -> u32 {
    const QUIET_NAN_BITS: u32 = 0x7fc00000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0u32
    } else {
        value.to_bits()
    }
}

/// Compute a digest over a sequence of snapshots.
///
/// Hashes the sequence length, then for each state: ball kinematics, roster
/// size, each player (team, kinematics, quaternion, boost, demo flag) in
/// roster order, and the pad flags.
pub fn states_digest(states: &[GameState]) -> u64 {
    let mut hasher = Fnv1a64::new();
    hasher.update(&(states.len() as u64).to_le_bytes());

    for state in states {
        hasher.update_f32s(&state.ball.position);
        hasher.update_f32s(&state.ball.linear_velocity);
        hasher.update_f32s(&state.ball.angular_velocity);

        hasher.update(&(state.players.len() as u64).to_le_bytes());
        for player in &state.players {
            hasher.update(&player.team.index().to_le_bytes());
            hasher.update_f32s(&player.car.position);
            hasher.update_f32s(&player.car.linear_velocity);
            hasher.update_f32s(&player.car.angular_velocity);
            hasher.update_f32s(&player.car.quaternion);
            hasher.update_f32s(&[player.boost_amount]);
            hasher.update(&[u8::from(player.is_demoed)]);
        }

        for &active in &state.boost_pads {
            hasher.update(&[u8::from(active)]);
        }
    }

    hasher.finish()
}

// ============================================================================
// Tests
// ============================================================================
