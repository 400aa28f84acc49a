//! Row writers shared by the sequence and single-snapshot encoders.

use pearl_state::{BallState, PlayerState};

use crate::geometry::basis_from_quaternion;
use crate::schema::{BallField, PlayerField};

fn write_vec3<F: Copy>(
    out: &mut [f32],
    fields: [F; 3],
    values: [f32; 3],
    index: impl Fn(F) -> usize,
) {
    for (field, value) in fields.into_iter().zip(values) {
        out[index(field)] = value;
    }
}

/// Write ball kinematics into one ball entity slice.
pub(crate) fn write_ball(out: &mut [f32], ball: &BallState) {
    write_vec3(out, BallField::POSITION, ball.position, BallField::index);
    write_vec3(out, BallField::LINEAR_VELOCITY, ball.linear_velocity, BallField::index);
    write_vec3(out, BallField::ANGULAR_VELOCITY, ball.angular_velocity, BallField::index);
}

/// Write one player into one player entity slice.
pub(crate) fn write_player(out: &mut [f32], player: &PlayerState, respawn_timer: f32) {
    let car = &player.car;
    let basis = basis_from_quaternion(car.quaternion);

    out[PlayerField::Team.index()] = player.team.sign();
    write_vec3(out, PlayerField::POSITION, car.position, PlayerField::index);
    write_vec3(out, PlayerField::LINEAR_VELOCITY, car.linear_velocity, PlayerField::index);
    write_vec3(out, PlayerField::FORWARD, basis.forward, PlayerField::index);
    write_vec3(out, PlayerField::UP, basis.up, PlayerField::index);
    write_vec3(out, PlayerField::ANGULAR_VELOCITY, car.angular_velocity, PlayerField::index);
    out[PlayerField::BoostAmount.index()] = player.boost_amount;
    out[PlayerField::IsDemoed.index()] = if player.is_demoed { 1.0 } else { 0.0 };
    out[PlayerField::RespawnTimer.index()] = respawn_timer;
}
