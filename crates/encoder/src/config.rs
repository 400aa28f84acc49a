//! Encoder configuration.

use serde::{Deserialize, Serialize};

use crate::timers::{SECONDS_PER_TICK, seconds_per_row};

/// How far pad timers count down per encoded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum PadDecay {
    /// One simulation tick (1/120 s) per row, regardless of tick skip.
    #[default]
    WallTick,
    /// `tick_skip` simulation ticks per row, the same rate as car timers.
    TickSkip,
}

impl PadDecay {
    /// Names used in JSON configs and artifacts.
    const NAMES: [(Self, &'static str); 2] =
        [(Self::WallTick, "wall_tick"), (Self::TickSkip, "tick_skip")];

    pub fn as_str(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(decay, _)| decay == self)
            .map_or("", |(_, name)| *name)
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(decay, _)| *decay)
    }
}

impl From<PadDecay> for &'static str {
    fn from(decay: PadDecay) -> Self {
        decay.as_str()
    }
}

impl TryFrom<String> for PadDecay {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown pad decay {s:?}"))
    }
}

/// Sequence encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Simulation ticks represented by each row. Must be at least 1.
    pub tick_skip: u32,
    pub pad_decay: PadDecay,
    /// Reject snapshots carrying NaN or infinite values.
    pub reject_non_finite: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            tick_skip: 8,
            pad_decay: PadDecay::WallTick,
            reject_non_finite: true,
        }
    }
}

impl EncoderConfig {
    pub fn with_tick_skip(tick_skip: u32) -> Self {
        Self {
            tick_skip,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Seconds a car respawn timer decays per row.
    pub fn seconds_per_row(&self) -> f32 {
        seconds_per_row(self.tick_skip)
    }

    /// Seconds a pad timer decays per row.
    pub fn pad_seconds_per_row(&self) -> f32 {
        match self.pad_decay {
            PadDecay::WallTick => SECONDS_PER_TICK,
            PadDecay::TickSkip => self.seconds_per_row(),
        }
    }
}
