//! Pearl Episode Artifacts
//!
//! This crate records a sequence of snapshots together with its encoding,
//! and verifies that re-encoding the recorded snapshots reproduces the
//! recorded tensors bit for bit.
//!
//! # Architecture
//!
//! - `EpisodeRecorder`: collects snapshots and finalizes an `EpisodeArtifact`
//! - `verify_artifact`: re-encodes and compares digests
//! - `write_artifact` / `read_artifact`: Protobuf file I/O
//!
//! Tensors are stored and hashed before normalization, so an artifact does
//! not depend on any fitted statistics.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use pearl_encoder::{
    BIG_BOOST_INDEX, BIG_BOOST_RESPAWN_TIME, DEMO_RESPAWN_TIME, EncodeError, EncoderConfig,
    EpisodeData, EpisodeEncoder, FEATURE_SCHEMA_ID, PadDecay, SMALL_BOOST_RESPAWN_TIME, Tensor3,
};
use pearl_state::{GameState, STATES_DIGEST_ALGO_ID, TICK_RATE_HZ, states_digest};
use pearl_wire::{EncoderParameter, EpisodeArtifact, EpisodeDataProto, GameStateProto};
use prost::Message;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Current artifact format version.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Tensor Digest
// ============================================================================

fn hash_tensor(hasher: &mut Sha256, tensor: &Tensor3) {
    for dim in tensor.shape() {
        hasher.update((dim as u64).to_le_bytes());
    }
    for value in tensor.data() {
        hasher.update(value.to_bits().to_le_bytes());
    }
}

/// SHA-256 over the ball, player and boost tables, lowercase hex.
///
/// Each table contributes its shape (u64 LE per dimension) followed by the
/// raw f32 bits (LE). No canonicalization: the digest is bit-exact.
pub fn tensor_sha256(data: &EpisodeData) -> String {
    let mut hasher = Sha256::new();
    hash_tensor(&mut hasher, &data.ball);
    hash_tensor(&mut hasher, &data.players);
    hash_tensor(&mut hasher, &data.boost);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Encoder Parameters
// ============================================================================

/// Bit `slot` set for every big pad slot.
fn big_boost_slot_mask() -> u64 {
    BIG_BOOST_INDEX.iter().fold(0u64, |mask, &slot| mask | (1u64 << slot))
}

/// Encoder constants and settings recorded with an artifact, sorted by key.
pub fn encoder_parameters(config: &EncoderConfig) -> Vec<EncoderParameter> {
    let mut params = vec![
        ("big_boost_respawn_time", f64::from(BIG_BOOST_RESPAWN_TIME)),
        ("big_boost_slot_mask", big_boost_slot_mask() as f64),
        ("demo_respawn_time", f64::from(DEMO_RESPAWN_TIME)),
        (
            "reject_non_finite",
            if config.reject_non_finite { 1.0 } else { 0.0 },
        ),
        ("small_boost_respawn_time", f64::from(SMALL_BOOST_RESPAWN_TIME)),
        ("tick_rate_hz", f64::from(TICK_RATE_HZ)),
        ("tick_skip", f64::from(config.tick_skip)),
    ];
    params.sort_by(|a, b| a.0.cmp(b.0));
    params
        .into_iter()
        .map(|(key, value)| EncoderParameter {
            key: key.to_string(),
            value,
        })
        .collect()
}

// ============================================================================
// Episode Recorder
// ============================================================================

/// Collects snapshots for one episode.
#[derive(Debug, Clone)]
pub struct EpisodeRecorder {
    config: EncoderConfig,
    states: Vec<GameState>,
}

impl EpisodeRecorder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            states: Vec::new(),
        }
    }

    pub fn record_state(&mut self, state: GameState) {
        self.states.push(state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Encode the recorded snapshots and build the artifact.
    pub fn finalize(self, end_reason: &str) -> Result<EpisodeArtifact, EncodeError> {
        let data = EpisodeEncoder::new(self.config.clone()).encode(&self.states)?;
        let tensor_sha256 = tensor_sha256(&data);
        let states_digest = states_digest(&self.states);

        debug!(
            rows = data.rows(),
            players = data.num_players(),
            %tensor_sha256,
            "finalized episode artifact"
        );

        Ok(EpisodeArtifact {
            artifact_format_version: ARTIFACT_FORMAT_VERSION,
            feature_schema_id: FEATURE_SCHEMA_ID,
            tick_rate_hz: TICK_RATE_HZ,
            tick_skip: self.config.tick_skip,
            pad_decay: self.config.pad_decay.as_str().to_string(),
            states_digest_algo_id: STATES_DIGEST_ALGO_ID.to_string(),
            encoder_parameters: encoder_parameters(&self.config),
            states: self.states.into_iter().map(GameStateProto::from).collect(),
            episode: Some(EpisodeDataProto::from(&data)),
            states_digest,
            tensor_sha256,
            end_reason: end_reason.to_string(),
        })
    }
}

// ============================================================================
// Artifact Verification
// ============================================================================

/// Artifact verification error.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// Unsupported artifact format version.
    FormatVersionMismatch { expected: u32, actual: u32 },
    /// Tensors were written with a different feature schema.
    SchemaMismatch { expected: u32, actual: u32 },
    /// Recorded encoder constant differs from this build.
    ParameterMismatch {
        key: String,
        expected: f64,
        actual: f64,
    },
    /// Recorded encoder constants are missing a key.
    MissingParameter { key: String },
    /// Recorded snapshots do not hash to the recorded digest.
    StatesDigestMismatch { expected: u64, actual: u64 },
    /// Re-encoding the recorded snapshots failed.
    EncodeFailed(EncodeError),
    /// Re-encoded tensors differ from the recorded digest.
    TensorDigestMismatch { expected: String, actual: String },
    /// Stored tensors differ from the recorded digest.
    StoredTensorMismatch { expected: String, actual: String },
    /// Invalid artifact contents.
    InvalidFormat { reason: String },
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FormatVersionMismatch { expected, actual } => {
                write!(
                    f,
                    "Artifact format version mismatch: expected {expected}, got {actual}"
                )
            }
            Self::SchemaMismatch { expected, actual } => {
                write!(f, "Feature schema mismatch: expected {expected}, got {actual}")
            }
            Self::ParameterMismatch {
                key,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Encoder parameter {key} mismatch: expected {expected}, got {actual}"
                )
            }
            Self::MissingParameter { key } => write!(f, "Missing encoder parameter {key}"),
            Self::StatesDigestMismatch { expected, actual } => {
                write!(
                    f,
                    "States digest mismatch: expected {expected:#x}, got {actual:#x}"
                )
            }
            Self::EncodeFailed(e) => write!(f, "Re-encoding failed: {e}"),
            Self::TensorDigestMismatch { expected, actual } => {
                write!(f, "Tensor digest mismatch: expected {expected}, got {actual}")
            }
            Self::StoredTensorMismatch { expected, actual } => {
                write!(
                    f,
                    "Stored tensor digest mismatch: expected {expected}, got {actual}"
                )
            }
            Self::InvalidFormat { reason } => write!(f, "Invalid artifact format: {reason}"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Options for artifact verification.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Whether a feature schema mismatch fails verification.
    /// - true: fail on mismatch
    /// - false: warn and continue
    pub strict_schema_check: bool,
    /// Whether stored tensors (if present) are checked against the digest.
    pub check_stored_tensors: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            strict_schema_check: true,
            check_stored_tensors: true,
        }
    }
}

/// Rebuild the encoder configuration recorded in an artifact.
pub fn artifact_config(artifact: &EpisodeArtifact) -> Result<EncoderConfig, VerifyError> {
    let pad_decay = PadDecay::parse(&artifact.pad_decay).ok_or_else(|| VerifyError::InvalidFormat {
        reason: format!("unknown pad_decay {:?}", artifact.pad_decay),
    })?;
    let reject_non_finite = artifact
        .encoder_parameters
        .iter()
        .find(|p| p.key == "reject_non_finite")
        .map(|p| p.value != 0.0)
        .ok_or_else(|| VerifyError::MissingParameter {
            key: "reject_non_finite".to_string(),
        })?;

    Ok(EncoderConfig {
        tick_skip: artifact.tick_skip,
        pad_decay,
        reject_non_finite,
    })
}

/// Verify an artifact's tensors are reproduced by re-encoding its snapshots.
///
/// # Verification Steps
/// 1. Format version and feature schema id
/// 2. Tick rate and encoder constants match this build
/// 3. Decode snapshots and check the states digest
/// 4. Re-encode and check the tensor digest
/// 5. Check stored tensors against the digest (optional)
pub fn verify_artifact(
    artifact: &EpisodeArtifact,
    options: &VerifyOptions,
) -> Result<(), VerifyError> {
    // Step 1: Versions
    if artifact.artifact_format_version != ARTIFACT_FORMAT_VERSION {
        return Err(VerifyError::FormatVersionMismatch {
            expected: ARTIFACT_FORMAT_VERSION,
            actual: artifact.artifact_format_version,
        });
    }
    if artifact.feature_schema_id != FEATURE_SCHEMA_ID {
        if options.strict_schema_check {
            return Err(VerifyError::SchemaMismatch {
                expected: FEATURE_SCHEMA_ID,
                actual: artifact.feature_schema_id,
            });
        }
        warn!(
            expected = FEATURE_SCHEMA_ID,
            actual = artifact.feature_schema_id,
            "feature schema mismatch, continuing"
        );
    }

    // Step 2: Constants
    if artifact.tick_rate_hz != TICK_RATE_HZ {
        return Err(VerifyError::ParameterMismatch {
            key: "tick_rate_hz".to_string(),
            expected: f64::from(TICK_RATE_HZ),
            actual: f64::from(artifact.tick_rate_hz),
        });
    }
    let config = artifact_config(artifact)?;
    validate_parameters(artifact, &config)?;

    // Step 3: Snapshots
    if artifact.states_digest_algo_id != STATES_DIGEST_ALGO_ID {
        return Err(VerifyError::InvalidFormat {
            reason: format!(
                "unsupported states digest algorithm {:?}",
                artifact.states_digest_algo_id
            ),
        });
    }
    let states: Vec<GameState> = artifact
        .states
        .iter()
        .cloned()
        .map(GameState::try_from)
        .collect::<Result<_, _>>()
        .map_err(|e: &str| VerifyError::InvalidFormat {
            reason: e.to_string(),
        })?;

    let actual_digest = states_digest(&states);
    if actual_digest != artifact.states_digest {
        return Err(VerifyError::StatesDigestMismatch {
            expected: artifact.states_digest,
            actual: actual_digest,
        });
    }

    // Step 4: Re-encode
    let data = EpisodeEncoder::new(config)
        .encode(&states)
        .map_err(VerifyError::EncodeFailed)?;
    let actual_sha = tensor_sha256(&data);
    if actual_sha != artifact.tensor_sha256 {
        return Err(VerifyError::TensorDigestMismatch {
            expected: artifact.tensor_sha256.clone(),
            actual: actual_sha,
        });
    }

    // Step 5: Stored tensors
    if options.check_stored_tensors {
        if let Some(episode) = &artifact.episode {
            let stored = EpisodeData::try_from(episode.clone()).map_err(|e: &str| {
                VerifyError::InvalidFormat {
                    reason: e.to_string(),
                }
            })?;
            let stored_sha = tensor_sha256(&stored);
            if stored_sha != artifact.tensor_sha256 {
                return Err(VerifyError::StoredTensorMismatch {
                    expected: artifact.tensor_sha256.clone(),
                    actual: stored_sha,
                });
            }
        }
    }

    Ok(())
}

/// Every parameter this build would record must be present with the same
/// value.
fn validate_parameters(
    artifact: &EpisodeArtifact,
    config: &EncoderConfig,
) -> Result<(), VerifyError> {
    let recorded: HashMap<&str, f64> = artifact
        .encoder_parameters
        .iter()
        .map(|p| (p.key.as_str(), p.value))
        .collect();

    for expected in encoder_parameters(config) {
        match recorded.get(expected.key.as_str()) {
            None => {
                return Err(VerifyError::MissingParameter { key: expected.key });
            }
            Some(&actual) if actual != expected.value => {
                return Err(VerifyError::ParameterMismatch {
                    key: expected.key,
                    expected: expected.value,
                    actual,
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

// ============================================================================
// Artifact I/O
// ============================================================================

/// Write an artifact to a file. Refuses to overwrite an existing file.
pub fn write_artifact(artifact: &EpisodeArtifact, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Episode artifact already exists at {}", path.display()),
                )
            } else {
                e
            }
        })?;
    file.write_all(&artifact.encode_to_vec())?;

    Ok(())
}

/// Read an artifact from a file.
pub fn read_artifact(path: &Path) -> io::Result<EpisodeArtifact> {
    let data = fs::read(path)?;
    EpisodeArtifact::decode(data.as_slice()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to decode episode artifact: {e}"),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pearl_state::{PlayerState, Team};

    fn create_test_artifact() -> EpisodeArtifact {
        let mut recorder = EpisodeRecorder::new(EncoderConfig::with_tick_skip(8));
        for row in 0..12 {
            let mut blue = PlayerState::new(Team::Blue);
            blue.car.position = [0.0, -1000.0 + row as f32 * 50.0, 17.0];
            blue.is_demoed = (3..6).contains(&row);
            let orange = PlayerState::new(Team::Orange);
            let mut state = GameState::new(vec![blue, orange]);
            state.boost_pads[4] = !(2..9).contains(&row);
            recorder.record_state(state);
        }
        recorder.finalize("goal").unwrap()
    }

    #[test]
    fn test_artifact_has_required_fields() {
        let artifact = create_test_artifact();

        assert_eq!(artifact.artifact_format_version, 1);
        assert_eq!(artifact.feature_schema_id, FEATURE_SCHEMA_ID);
        assert_eq!(artifact.tick_rate_hz, 120);
        assert_eq!(artifact.tick_skip, 8);
        assert_eq!(artifact.pad_decay, "wall_tick");
        assert_eq!(artifact.states.len(), 12);
        assert!(artifact.episode.is_some());
        assert_eq!(artifact.tensor_sha256.len(), 64);
        assert_eq!(artifact.end_reason, "goal");
    }

    #[test]
    fn test_parameters_sorted_by_key() {
        let params = encoder_parameters(&EncoderConfig::default());
        let keys: Vec<&str> = params.iter().map(|p| p.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_big_boost_slot_mask() {
        let mask = big_boost_slot_mask();
        assert_eq!(mask.count_ones(), 6);
        assert_ne!(mask & (1 << 3), 0);
        assert_eq!(mask & 1, 0);
    }

    #[test]
    fn test_verification_passes() {
        let artifact = create_test_artifact();
        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(result.is_ok(), "Artifact verification failed: {result:?}");
    }

    #[test]
    fn test_empty_recorder_fails_to_finalize() {
        let recorder = EpisodeRecorder::new(EncoderConfig::default());
        assert!(recorder.is_empty());
        assert_eq!(recorder.finalize("none"), Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_tampered_state_fails_digest() {
        let mut artifact = create_test_artifact();
        artifact.states[5].players[0].is_demoed = false;

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(
            result,
            Err(VerifyError::StatesDigestMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_tensor_digest_fails() {
        let mut artifact = create_test_artifact();
        artifact.tensor_sha256 = "0".repeat(64);

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(
            result,
            Err(VerifyError::TensorDigestMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_stored_tensor_fails() {
        let mut artifact = create_test_artifact();
        if let Some(players) = artifact.episode.as_mut().and_then(|e| e.players.as_mut()) {
            players.data[0] = 42.0;
        }

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(
            result,
            Err(VerifyError::StoredTensorMismatch { .. })
        ));

        let lenient = VerifyOptions {
            check_stored_tensors: false,
            ..Default::default()
        };
        assert!(verify_artifact(&artifact, &lenient).is_ok());
    }

    #[test]
    fn test_corrupt_stored_shape_is_invalid_format() {
        let mut artifact = create_test_artifact();
        if let Some(ball) = artifact.episode.as_mut().and_then(|e| e.ball.as_mut()) {
            ball.shape = vec![u64::MAX, 2, 1];
            ball.data = vec![0.0; 2];
        }

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(result, Err(VerifyError::InvalidFormat { .. })));
    }

    #[test]
    fn test_changed_constant_fails() {
        let mut artifact = create_test_artifact();
        for p in &mut artifact.encoder_parameters {
            if p.key == "demo_respawn_time" {
                p.value = 5.0;
            }
        }

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert_eq!(
            result,
            Err(VerifyError::ParameterMismatch {
                key: "demo_respawn_time".to_string(),
                expected: 3.0,
                actual: 5.0,
            })
        );
    }

    #[test]
    fn test_missing_parameter_fails() {
        let mut artifact = create_test_artifact();
        artifact
            .encoder_parameters
            .retain(|p| p.key != "small_boost_respawn_time");

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(result, Err(VerifyError::MissingParameter { .. })));
    }

    #[test]
    fn test_schema_mismatch_strict_and_lenient() {
        let mut artifact = create_test_artifact();
        artifact.feature_schema_id = FEATURE_SCHEMA_ID + 1;

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(result, Err(VerifyError::SchemaMismatch { .. })));

        let lenient = VerifyOptions {
            strict_schema_check: false,
            ..Default::default()
        };
        assert!(verify_artifact(&artifact, &lenient).is_ok());
    }

    #[test]
    fn test_unknown_pad_decay_fails() {
        let mut artifact = create_test_artifact();
        artifact.pad_decay = "hourly".to_string();

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(result, Err(VerifyError::InvalidFormat { .. })));
    }

    #[test]
    fn test_unknown_digest_algorithm_fails() {
        let mut artifact = create_test_artifact();
        artifact.states_digest_algo_id = "sha1".to_string();

        let result = verify_artifact(&artifact, &VerifyOptions::default());
        assert!(matches!(result, Err(VerifyError::InvalidFormat { .. })));
    }

    #[test]
    fn test_tensor_sha256_is_bit_exact() {
        let mut data = EpisodeData::new_empty(1, 1);
        let zero = tensor_sha256(&data);
        data.ball.set(0, 0, 2, -0.0);
        assert_ne!(tensor_sha256(&data), zero);
    }
}
