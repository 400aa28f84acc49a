//! Single-snapshot encoder for live inference.
//!
//! With no history there is nothing to reconstruct timers from, so this path
//! writes coarser proxies than the sequence encoder:
//! - every car respawn timer is 0.0
//! - every pad timer is `1 - active` (0.0 active, 1.0 inactive)
//!
//! These values are not countdowns in seconds. A one-row sequence encoding
//! of the same snapshot differs wherever a car is demoed or a pad inactive.

use pearl_state::GameState;
use tracing::debug;

use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::fill::{write_ball, write_player};
use crate::normalize::Normalizer;
use crate::schema::BoostField;
use crate::tensor::EpisodeData;
use crate::validation::validate_state;

/// Encode one snapshot into a one-row container (not normalized).
pub fn encode_state(state: &GameState, config: &EncoderConfig) -> Result<EpisodeData, EncodeError> {
    validate_state(state, config)?;

    let mut data = EpisodeData::new_empty(1, state.num_players());
    write_ball(data.ball.entity_mut(0, 0), &state.ball);

    for (slot, player) in state.players.iter().enumerate() {
        write_player(data.players.entity_mut(0, slot), player, 0.0);
    }

    let boost = data.boost.entity_mut(0, 0);
    for (slot, &active) in state.boost_pads.iter().enumerate() {
        boost[BoostField::timer(slot)] = if active { 0.0 } else { 1.0 };
    }

    debug!(players = state.num_players(), "encoded snapshot");
    Ok(data)
}

/// Encode one snapshot, then normalize it once.
pub fn state_to_data<N: Normalizer + ?Sized>(
    state: &GameState,
    config: &EncoderConfig,
    normalizer: &N,
) -> Result<EpisodeData, EncodeError> {
    let mut data = encode_state(state, config)?;
    normalizer.normalize(&mut data);
    Ok(data)
}
