//! Sequence encoder.
//!
//! Encodes an ordered list of snapshots into one row per snapshot, carrying
//! demolition and boost pad timers across rows.
//!
//! # Row order
//!
//! Row 0 seeds the trackers from the first snapshot and writes them as-is.
//! For every later row the trackers are updated from the previous and
//! current flags first, then the row is written.

use pearl_state::GameState;
use tracing::debug;

use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::fill::{write_ball, write_player};
use crate::normalize::Normalizer;
use crate::schema::BoostField;
use crate::tensor::EpisodeData;
use crate::timers::{DemoTimer, PadTimers};
use crate::validation::validate_sequence;

/// Stateless sequence encoder. Timer state lives only for one `encode` call.
#[derive(Debug, Clone, Default)]
pub struct EpisodeEncoder {
    config: EncoderConfig,
}

impl EpisodeEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `states` into raw (not normalized) tables.
    ///
    /// # Errors
    /// Returns `EncodeError` if the sequence is empty, the roster size
    /// changes, `tick_skip` is 0, or (when enabled) any value is non-finite.
    pub fn encode(&self, states: &[GameState]) -> Result<EpisodeData, EncodeError> {
        let num_players = validate_sequence(states, &self.config)?;
        let first = &states[0];

        let car_dt = self.config.seconds_per_row();
        let pad_dt = self.config.pad_seconds_per_row();

        let mut demo_timers: Vec<DemoTimer> = first
            .players
            .iter()
            .map(|p| DemoTimer::start(p.is_demoed))
            .collect();
        let mut pad_timers = PadTimers::start(&first.boost_pads);

        let mut data = EpisodeData::new_empty(states.len(), num_players);

        for (row, state) in states.iter().enumerate() {
            if row != 0 {
                for (timer, player) in demo_timers.iter_mut().zip(&state.players) {
                    timer.update(player.is_demoed, car_dt);
                }
                pad_timers.update(&state.boost_pads, pad_dt);
            }

            write_ball(data.ball.entity_mut(row, 0), &state.ball);

            for (slot, (player, timer)) in state.players.iter().zip(&demo_timers).enumerate() {
                write_player(data.players.entity_mut(row, slot), player, timer.remaining());
            }

            data.boost.entity_mut(row, 0)[BoostField::timer(0)..]
                .copy_from_slice(&pad_timers.remaining());
        }

        debug!(
            rows = states.len(),
            players = num_players,
            tick_skip = self.config.tick_skip,
            pad_decay = self.config.pad_decay.as_str(),
            "encoded episode"
        );

        Ok(data)
    }
}

/// Encode a sequence with the default configuration and the given tick skip.
pub fn encode_episode(states: &[GameState], tick_skip: u32) -> Result<EpisodeData, EncodeError> {
    EpisodeEncoder::new(EncoderConfig::with_tick_skip(tick_skip)).encode(states)
}

/// Encode a sequence, then normalize the filled tables exactly once.
pub fn episode_to_data<N: Normalizer + ?Sized>(
    states: &[GameState],
    config: &EncoderConfig,
    normalizer: &N,
) -> Result<EpisodeData, EncodeError> {
    let mut data = EpisodeEncoder::new(config.clone()).encode(states)?;
    normalizer.normalize(&mut data);
    Ok(data)
}

// ============================================================================
// Tests
// ============================================================================
