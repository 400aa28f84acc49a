//! Feature schema v1.
//!
//! Every table is shaped `(rows × entities × fields)`. Field 0 and 1 are
//! reserved in all three tables for the attention flags (`Ignore`, `Mask`);
//! the encoder leaves them at 0.0 and downstream masking fills them in.
//!
//! ### Ball (1 entity, 11 fields)
//! ignore, mask, position xyz, linear velocity xyz, angular velocity xyz
//!
//! ### Players (roster size entities, 21 fields)
//! ignore, mask, team (-1 blue / +1 orange), position xyz, linear velocity
//! xyz, forward xyz, up xyz, angular velocity xyz, boost amount, is demoed,
//! respawn timer
//!
//! ### Boost (1 entity, 36 fields)
//! ignore, mask, one timer per pad slot 0..34

use pearl_state::BOOST_PAD_COUNT;

/// Increment this whenever any table layout changes.
pub const FEATURE_SCHEMA_ID: u32 = 1;

/// First field written by the encoder in every table.
pub const FIRST_DATA_FIELD: usize = 2;

/// Ball table fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BallField {
    Ignore = 0,
    Mask,
    PosX,
    PosY,
    PosZ,
    VelX,
    VelY,
    VelZ,
    AngVelX,
    AngVelY,
    AngVelZ,
}

impl BallField {
    pub const COUNT: usize = 11;

    pub const POSITION: [Self; 3] = [Self::PosX, Self::PosY, Self::PosZ];
    pub const LINEAR_VELOCITY: [Self; 3] = [Self::VelX, Self::VelY, Self::VelZ];
    pub const ANGULAR_VELOCITY: [Self; 3] = [Self::AngVelX, Self::AngVelY, Self::AngVelZ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Player table fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PlayerField {
    /// Whether attention should skip this player.
    Ignore = 0,
    /// Whether the player's data is masked out (everything else zeroed).
    Mask,
    Team,
    PosX,
    PosY,
    PosZ,
    VelX,
    VelY,
    VelZ,
    FwX,
    FwY,
    FwZ,
    UpX,
    UpY,
    UpZ,
    AngVelX,
    AngVelY,
    AngVelZ,
    BoostAmount,
    IsDemoed,
    RespawnTimer,
}

impl PlayerField {
    pub const COUNT: usize = 21;

    pub const POSITION: [Self; 3] = [Self::PosX, Self::PosY, Self::PosZ];
    pub const LINEAR_VELOCITY: [Self; 3] = [Self::VelX, Self::VelY, Self::VelZ];
    pub const FORWARD: [Self; 3] = [Self::FwX, Self::FwY, Self::FwZ];
    pub const UP: [Self; 3] = [Self::UpX, Self::UpY, Self::UpZ];
    pub const ANGULAR_VELOCITY: [Self; 3] = [Self::AngVelX, Self::AngVelY, Self::AngVelZ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Boost table fields. Pad timers follow the two reserved flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BoostField {
    Ignore = 0,
    Mask,
}

impl BoostField {
    pub const COUNT: usize = FIRST_DATA_FIELD + BOOST_PAD_COUNT;

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field index of the timer for pad `slot`.
    pub const fn timer(slot: usize) -> usize {
        FIRST_DATA_FIELD + slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_fields_are_zero_and_one() {
        assert_eq!(BallField::Ignore.index(), 0);
        assert_eq!(BallField::Mask.index(), 1);
        assert_eq!(PlayerField::Ignore.index(), 0);
        assert_eq!(PlayerField::Mask.index(), 1);
        assert_eq!(BoostField::Ignore.index(), 0);
        assert_eq!(BoostField::Mask.index(), 1);
    }

    #[test]
    fn test_field_counts_match_last_field() {
        assert_eq!(BallField::AngVelZ.index() + 1, BallField::COUNT);
        assert_eq!(PlayerField::RespawnTimer.index() + 1, PlayerField::COUNT);
        assert_eq!(BoostField::timer(BOOST_PAD_COUNT - 1) + 1, BoostField::COUNT);
        assert_eq!(BoostField::COUNT, 36);
    }

    #[test]
    fn test_player_layout_v1() {
        assert_eq!(PlayerField::Team.index(), 2);
        assert_eq!(PlayerField::FwX.index(), 9);
        assert_eq!(PlayerField::UpX.index(), 12);
        assert_eq!(PlayerField::BoostAmount.index(), 18);
        assert_eq!(PlayerField::IsDemoed.index(), 19);
        assert_eq!(PlayerField::RespawnTimer.index(), 20);
    }
}
