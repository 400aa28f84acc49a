//! Pearl Encoder
//!
//! Converts game state snapshots into the fixed-schema tensors consumed by
//! the next-goal model.
//!
//! # Entry Points
//!
//! - `EpisodeEncoder` / `encode_episode`: an ordered sequence of snapshots,
//!   one row each, with demolition and boost pad timers reconstructed from
//!   flag transitions across rows.
//! - `encode_state`: one snapshot with no history, used to bootstrap live
//!   inference. Timers are proxies, not countdowns.
//!
//! Both share the schema (`schema`), the orientation basis (`geometry`) and
//! the row writers. Normalization is a separate `Normalizer` step;
//! `episode_to_data` and `state_to_data` apply it once after encoding.
//!
//! Encoding is synchronous and owns all its state, so independent calls may
//! run on separate threads without coordination.

#![deny(unsafe_code)]

pub mod config;
pub mod episode;
pub mod error;
mod fill;
pub mod geometry;
pub mod normalize;
pub mod schema;
pub mod snapshot;
pub mod tensor;
pub mod timers;
pub mod validation;

pub use config::{EncoderConfig, PadDecay};
pub use episode::{EpisodeEncoder, encode_episode, episode_to_data};
pub use error::{EncodeError, EntityRef};
pub use geometry::{Basis, basis_from_quaternion};
pub use normalize::{FieldStats, FieldSummary, Identity, MinMax, Normalizer, ZScore};
pub use schema::{BallField, BoostField, FEATURE_SCHEMA_ID, PlayerField};
pub use snapshot::{encode_state, state_to_data};
pub use tensor::{EpisodeData, Table, Tensor3};
pub use timers::{
    BIG_BOOST_INDEX, BIG_BOOST_RESPAWN_TIME, DEMO_RESPAWN_TIME, DemoPhase, DemoTimer, PadSize,
    PadTimer, PadTimers, SMALL_BOOST_RESPAWN_TIME,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
