//! Input validation.
//!
//! Malformed input is rejected before any row is written:
//! - Empty sequence: REJECT
//! - Roster size differs from the first snapshot: REJECT
//! - `tick_skip` of 0: REJECT
//! - NaN/Inf in any kinematic or boost value: REJECT (configurable)
//!
//! Non-unit quaternions are accepted as-is.

use pearl_state::{GameState, PhysicsState};

use crate::config::EncoderConfig;
use crate::error::{EncodeError, EntityRef};

/// Validate a sequence and return its roster size.
pub fn validate_sequence(
    states: &[GameState],
    config: &EncoderConfig,
) -> Result<usize, EncodeError> {
    if config.tick_skip == 0 {
        return Err(EncodeError::InvalidTickSkip {
            tick_skip: config.tick_skip,
        });
    }

    let first = states.first().ok_or(EncodeError::EmptySequence)?;
    let expected = first.num_players();

    for (tick, state) in states.iter().enumerate() {
        if state.num_players() != expected {
            return Err(EncodeError::RosterSizeChanged {
                tick,
                expected,
                actual: state.num_players(),
            });
        }
        if config.reject_non_finite {
            check_finite(state, tick)?;
        }
    }

    Ok(expected)
}

/// Validate a lone snapshot.
pub fn validate_state(state: &GameState, config: &EncoderConfig) -> Result<(), EncodeError> {
    if config.reject_non_finite {
        check_finite(state, 0)?;
    }
    Ok(())
}

fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn physics_finite(car: &PhysicsState) -> bool {
    all_finite(&car.position)
        && all_finite(&car.linear_velocity)
        && all_finite(&car.angular_velocity)
        && all_finite(&car.quaternion)
}

fn check_finite(state: &GameState, tick: usize) -> Result<(), EncodeError> {
    let ball = &state.ball;
    if !(all_finite(&ball.position)
        && all_finite(&ball.linear_velocity)
        && all_finite(&ball.angular_velocity))
    {
        return Err(EncodeError::NonFiniteValue {
            tick,
            entity: EntityRef::Ball,
        });
    }

    for (slot, player) in state.players.iter().enumerate() {
        if !(physics_finite(&player.car) && player.boost_amount.is_finite()) {
            return Err(EncodeError::NonFiniteValue {
                tick,
                entity: EntityRef::Player(slot),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pearl_state::{PlayerState, Team};

    fn state(num_players: usize) -> GameState {
        GameState::new(
            (0..num_players)
                .map(|i| PlayerState::new(if i % 2 == 0 { Team::Blue } else { Team::Orange }))
                .collect(),
        )
    }

    #[test]
    fn test_empty_rejected() {
        let result = validate_sequence(&[], &EncoderConfig::default());
        assert_eq!(result, Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_zero_tick_skip_rejected() {
        let result = validate_sequence(&[state(2)], &EncoderConfig::with_tick_skip(0));
        assert_eq!(result, Err(EncodeError::InvalidTickSkip { tick_skip: 0 }));
    }

    #[test]
    fn test_roster_change_rejected() {
        let states = vec![state(4), state(4), state(3)];
        let result = validate_sequence(&states, &EncoderConfig::default());
        assert_eq!(
            result,
            Err(EncodeError::RosterSizeChanged {
                tick: 2,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_valid_sequence_returns_roster_size() {
        let states = vec![state(6), state(6)];
        assert_eq!(validate_sequence(&states, &EncoderConfig::default()), Ok(6));
    }

    #[test]
    fn test_nan_rejected() {
        let mut states = vec![state(2), state(2)];
        states[1].players[1].car.linear_velocity[2] = f32::NAN;
        let result = validate_sequence(&states, &EncoderConfig::default());
        assert_eq!(
            result,
            Err(EncodeError::NonFiniteValue {
                tick: 1,
                entity: EntityRef::Player(1)
            })
        );
    }

    #[test]
    fn test_inf_ball_rejected_in_single_state() {
        let mut s = state(2);
        s.ball.position[0] = f32::INFINITY;
        let result = validate_state(&s, &EncoderConfig::default());
        assert_eq!(
            result,
            Err(EncodeError::NonFiniteValue {
                tick: 0,
                entity: EntityRef::Ball
            })
        );
    }

    #[test]
    fn test_non_finite_allowed_when_disabled() {
        let config = EncoderConfig {
            reject_non_finite: false,
            ..Default::default()
        };
        let mut s = state(2);
        s.players[0].boost_amount = f32::NAN;
        assert!(validate_state(&s, &config).is_ok());
    }

    #[test]
    fn test_non_unit_quaternion_accepted() {
        let mut s = state(1);
        s.players[0].car.quaternion = [3.0, 0.0, 0.0, 0.0];
        assert_eq!(validate_sequence(&[s], &EncoderConfig::default()), Ok(1));
    }

    #[test]
    fn test_error_messages() {
        let err = EncodeError::NonFiniteValue {
            tick: 3,
            entity: EntityRef::Player(2),
        };
        assert_eq!(err.to_string(), "non-finite value at tick 3 in player 2");
        assert_eq!(
            EncodeError::EmptySequence.to_string(),
            "cannot encode an empty state sequence"
        );
    }
}
