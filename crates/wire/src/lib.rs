//! Pearl Wire Types
//!
//! This crate defines the Protobuf message types used to persist and move
//! game state sequences and encoded episodes between the recorder, the
//! verifier and the training pipeline.
//!
//! # Message Categories
//!
//! - **Snapshots**: `GameStateProto` and its parts, mirroring `pearl_state`
//! - **Tensors**: `TensorProto`, `EpisodeDataProto`, mirroring `pearl_encoder`
//! - **Artifacts**: `EpisodeArtifact`, snapshots plus their encoding
//!
//! Rust → proto conversions are infallible (`From`); proto → Rust
//! conversions check shapes (`TryFrom`).

#![deny(unsafe_code)]

use pearl_encoder::{BallField, BoostField, EpisodeData, PlayerField, Tensor3};
use pearl_state::{BOOST_PAD_COUNT, BallState, GameState, PhysicsState, PlayerState, Team};
use prost::Message;

// ============================================================================
// Snapshot Messages
// ============================================================================

/// Car rigid body state.
#[derive(Clone, PartialEq, Message)]
pub struct PhysicsStateProto {
    /// Position [x, y, z].
    #[prost(float, repeated, tag = "1")]
    pub position: Vec<f32>,

    /// Linear velocity [x, y, z].
    #[prost(float, repeated, tag = "2")]
    pub linear_velocity: Vec<f32>,

    /// Angular velocity [x, y, z].
    #[prost(float, repeated, tag = "3")]
    pub angular_velocity: Vec<f32>,

    /// Orientation [w, x, y, z].
    #[prost(float, repeated, tag = "4")]
    pub quaternion: Vec<f32>,
}

/// Ball state.
#[derive(Clone, PartialEq, Message)]
pub struct BallStateProto {
    #[prost(float, repeated, tag = "1")]
    pub position: Vec<f32>,

    #[prost(float, repeated, tag = "2")]
    pub linear_velocity: Vec<f32>,

    #[prost(float, repeated, tag = "3")]
    pub angular_velocity: Vec<f32>,
}

/// One roster slot.
#[derive(Clone, PartialEq, Message)]
pub struct PlayerStateProto {
    /// 0 = blue, 1 = orange.
    #[prost(uint32, tag = "1")]
    pub team_num: u32,

    #[prost(message, optional, tag = "2")]
    pub car_data: Option<PhysicsStateProto>,

    /// 0..=100.
    #[prost(float, tag = "3")]
    pub boost_amount: f32,

    #[prost(bool, tag = "4")]
    pub is_demoed: bool,
}

/// Observed snapshot.
#[derive(Clone, PartialEq, Message)]
pub struct GameStateProto {
    #[prost(message, optional, tag = "1")]
    pub ball: Option<BallStateProto>,

    /// Players in roster order.
    #[prost(message, repeated, tag = "2")]
    pub players: Vec<PlayerStateProto>,

    /// Pad activity, exactly 34 entries, true = active.
    #[prost(bool, repeated, tag = "3")]
    pub boost_pads: Vec<bool>,
}

// ============================================================================
// Tensor Messages
// ============================================================================

/// Dense row-major tensor.
#[derive(Clone, PartialEq, Message)]
pub struct TensorProto {
    /// [rows, entities, fields].
    #[prost(uint64, repeated, tag = "1")]
    pub shape: Vec<u64>,

    #[prost(float, repeated, tag = "2")]
    pub data: Vec<f32>,
}

/// Encoded episode tables.
#[derive(Clone, PartialEq, Message)]
pub struct EpisodeDataProto {
    #[prost(message, optional, tag = "1")]
    pub ball: Option<TensorProto>,

    #[prost(message, optional, tag = "2")]
    pub players: Option<TensorProto>,

    #[prost(message, optional, tag = "3")]
    pub boost: Option<TensorProto>,
}

// ============================================================================
// Artifact Messages
// ============================================================================

/// Encoder parameter key-value pair.
#[derive(Clone, PartialEq, Message)]
pub struct EncoderParameter {
    #[prost(string, tag = "1")]
    pub key: String,

    #[prost(double, tag = "2")]
    pub value: f64,
}

/// Snapshots of one episode with their encoding.
#[derive(Clone, PartialEq, Message)]
pub struct EpisodeArtifact {
    /// Artifact format version (starts at 1).
    #[prost(uint32, tag = "1")]
    pub artifact_format_version: u32,

    /// Feature schema id the tensors were written with.
    #[prost(uint32, tag = "2")]
    pub feature_schema_id: u32,

    /// Simulation tick rate.
    #[prost(uint32, tag = "3")]
    pub tick_rate_hz: u32,

    /// Simulation ticks per snapshot.
    #[prost(uint32, tag = "4")]
    pub tick_skip: u32,

    /// Pad timer decay mode ("wall_tick" or "tick_skip").
    #[prost(string, tag = "5")]
    pub pad_decay: String,

    /// Digest algorithm identifier for `states_digest`.
    #[prost(string, tag = "6")]
    pub states_digest_algo_id: String,

    /// Input snapshots in encoding order.
    #[prost(message, repeated, tag = "7")]
    pub states: Vec<GameStateProto>,

    /// Encoder constants (sorted by key).
    #[prost(message, repeated, tag = "8")]
    pub encoder_parameters: Vec<EncoderParameter>,

    /// Raw (not normalized) encoded tables.
    #[prost(message, optional, tag = "9")]
    pub episode: Option<EpisodeDataProto>,

    /// Digest of `states`.
    #[prost(uint64, tag = "10")]
    pub states_digest: u64,

    /// SHA-256 of the raw encoded tables, lowercase hex.
    #[prost(string, tag = "11")]
    pub tensor_sha256: String,

    /// Why recording stopped (e.g. "goal", "timeout").
    #[prost(string, tag = "12")]
    pub end_reason: String,
}

// ============================================================================
// Conversion Traits
// ============================================================================

fn vec3(values: &[f32], err: &'static str) -> Result<[f32; 3], &'static str> {
    <[f32; 3]>::try_from(values).map_err(|_| err)
}

impl From<PhysicsState> for PhysicsStateProto {
    fn from(p: PhysicsState) -> Self {
        Self {
            position: p.position.to_vec(),
            linear_velocity: p.linear_velocity.to_vec(),
            angular_velocity: p.angular_velocity.to_vec(),
            quaternion: p.quaternion.to_vec(),
        }
    }
}

impl TryFrom<PhysicsStateProto> for PhysicsState {
    type Error = &'static str;

    fn try_from(p: PhysicsStateProto) -> Result<Self, Self::Error> {
        Ok(Self {
            position: vec3(&p.position, "position must have exactly 3 elements")?,
            linear_velocity: vec3(
                &p.linear_velocity,
                "linear_velocity must have exactly 3 elements",
            )?,
            angular_velocity: vec3(
                &p.angular_velocity,
                "angular_velocity must have exactly 3 elements",
            )?,
            quaternion: <[f32; 4]>::try_from(p.quaternion.as_slice())
                .map_err(|_| "quaternion must have exactly 4 elements")?,
        })
    }
}

impl From<BallState> for BallStateProto {
    fn from(b: BallState) -> Self {
        Self {
            position: b.position.to_vec(),
            linear_velocity: b.linear_velocity.to_vec(),
            angular_velocity: b.angular_velocity.to_vec(),
        }
    }
}

impl TryFrom<BallStateProto> for BallState {
    type Error = &'static str;

    fn try_from(b: BallStateProto) -> Result<Self, Self::Error> {
        Ok(Self {
            position: vec3(&b.position, "ball position must have exactly 3 elements")?,
            linear_velocity: vec3(
                &b.linear_velocity,
                "ball linear_velocity must have exactly 3 elements",
            )?,
            angular_velocity: vec3(
                &b.angular_velocity,
                "ball angular_velocity must have exactly 3 elements",
            )?,
        })
    }
}

impl From<PlayerState> for PlayerStateProto {
    fn from(p: PlayerState) -> Self {
        Self {
            team_num: p.team.index(),
            car_data: Some(p.car.into()),
            boost_amount: p.boost_amount,
            is_demoed: p.is_demoed,
        }
    }
}

impl TryFrom<PlayerStateProto> for PlayerState {
    type Error = &'static str;

    fn try_from(p: PlayerStateProto) -> Result<Self, Self::Error> {
        let team = Team::from_index(p.team_num).ok_or("team_num must be 0 or 1")?;
        let car = p.car_data.ok_or("player is missing car_data")?.try_into()?;
        Ok(Self {
            team,
            car,
            boost_amount: p.boost_amount,
            is_demoed: p.is_demoed,
        })
    }
}

impl From<GameState> for GameStateProto {
    fn from(s: GameState) -> Self {
        Self {
            ball: Some(s.ball.into()),
            players: s.players.into_iter().map(Into::into).collect(),
            boost_pads: s.boost_pads.to_vec(),
        }
    }
}

impl TryFrom<GameStateProto> for GameState {
    type Error = &'static str;

    fn try_from(s: GameStateProto) -> Result<Self, Self::Error> {
        let ball = s.ball.ok_or("state is missing ball")?.try_into()?;
        let players: Result<Vec<_>, _> = s.players.into_iter().map(TryInto::try_into).collect();
        let boost_pads = <[bool; BOOST_PAD_COUNT]>::try_from(s.boost_pads.as_slice())
            .map_err(|_| "boost_pads must have exactly 34 elements")?;
        Ok(Self {
            ball,
            players: players?,
            boost_pads,
        })
    }
}

impl From<&Tensor3> for TensorProto {
    fn from(t: &Tensor3) -> Self {
        Self {
            shape: t.shape().iter().map(|&d| d as u64).collect(),
            data: t.data().to_vec(),
        }
    }
}

impl TryFrom<TensorProto> for Tensor3 {
    type Error = &'static str;

    fn try_from(t: TensorProto) -> Result<Self, Self::Error> {
        let shape: [u64; 3] = t
            .shape
            .as_slice()
            .try_into()
            .map_err(|_| "tensor shape must have exactly 3 dimensions")?;
        let mut dims = [0usize; 3];
        for (dim, &d) in dims.iter_mut().zip(&shape) {
            *dim = usize::try_from(d).map_err(|_| "tensor dimension does not fit in usize")?;
        }
        Tensor3::from_parts(dims, t.data).ok_or("tensor data length does not match shape")
    }
}

impl From<&EpisodeData> for EpisodeDataProto {
    fn from(e: &EpisodeData) -> Self {
        Self {
            ball: Some((&e.ball).into()),
            players: Some((&e.players).into()),
            boost: Some((&e.boost).into()),
        }
    }
}

impl TryFrom<EpisodeDataProto> for EpisodeData {
    type Error = &'static str;

    fn try_from(e: EpisodeDataProto) -> Result<Self, Self::Error> {
        let ball: Tensor3 = e.ball.ok_or("episode is missing ball table")?.try_into()?;
        let players: Tensor3 = e
            .players
            .ok_or("episode is missing players table")?
            .try_into()?;
        let boost: Tensor3 = e.boost.ok_or("episode is missing boost table")?.try_into()?;

        let [rows, ball_entities, ball_fields] = ball.shape();
        let [player_rows, _, player_fields] = players.shape();
        let [boost_rows, boost_entities, boost_fields] = boost.shape();
        if player_rows != rows || boost_rows != rows {
            return Err("episode tables must share the row count");
        }
        if ball_entities != 1 || boost_entities != 1 {
            return Err("ball and boost tables must have exactly 1 entity");
        }
        if ball_fields != BallField::COUNT
            || player_fields != PlayerField::COUNT
            || boost_fields != BoostField::COUNT
        {
            return Err("episode table width does not match the feature schema");
        }
        Ok(Self {
            ball,
            players,
            boost,
        })
    }
}

/// Decode a snapshot from bytes.
pub fn decode_state(bytes: &[u8]) -> Result<GameState, String> {
    let proto = GameStateProto::decode(bytes).map_err(|e| format!("Failed to decode state: {e}"))?;
    proto.try_into().map_err(|e: &str| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
