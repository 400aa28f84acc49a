//! Normalization of encoded episodes.
//!
//! Encoding never normalizes. Callers apply a `Normalizer` exactly once on a
//! filled container, typically through `episode_to_data`. The reserved
//! ignore/mask fields are never modified.

use serde::{Deserialize, Serialize};

use crate::schema::FIRST_DATA_FIELD;
use crate::tensor::{EpisodeData, Table, Tensor3};

/// Post-processing step applied to a filled container.
pub trait Normalizer {
    fn normalize(&self, data: &mut EpisodeData);
}

/// Leaves data untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Normalizer for Identity {
    fn normalize(&self, _data: &mut EpisodeData) {}
}

/// Summary of one field over every row and entity seen by `FieldStats::fit`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSummary {
    pub count: u64,
    pub mean: f64,
    pub std: f64,
    pub min: f32,
    pub max: f32,
}

/// Per-table, per-field statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub ball: Vec<FieldSummary>,
    pub players: Vec<FieldSummary>,
    pub boost: Vec<FieldSummary>,
}

impl FieldStats {
    /// Fit statistics over a set of episodes. All episodes must share the
    /// schema; the roster size may differ.
    pub fn fit(episodes: &[&EpisodeData]) -> Self {
        Self {
            ball: fit_table(episodes, Table::Ball),
            players: fit_table(episodes, Table::Players),
            boost: fit_table(episodes, Table::Boost),
        }
    }

    pub fn table(&self, table: Table) -> &[FieldSummary] {
        match table {
            Table::Ball => &self.ball,
            Table::Players => &self.players,
            Table::Boost => &self.boost,
        }
    }
}

fn fit_table(episodes: &[&EpisodeData], table: Table) -> Vec<FieldSummary> {
    let width = episodes
        .first()
        .map_or(0, |episode| episode.table(table).shape()[2]);

    (0..width)
        .map(|field| {
            if field < FIRST_DATA_FIELD {
                return FieldSummary::default();
            }

            let mut count = 0u64;
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for episode in episodes {
                for v in episode.table(table).field(field) {
                    count += 1;
                    sum += f64::from(v);
                    sum_sq += f64::from(v) * f64::from(v);
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            if count == 0 {
                return FieldSummary::default();
            }
            let mean = sum / count as f64;
            let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
            FieldSummary {
                count,
                mean,
                std: variance.sqrt(),
                min,
                max,
            }
        })
        .collect()
}

fn apply(stats: &FieldStats, data: &mut EpisodeData, f: impl Fn(&FieldSummary, f32) -> f32) {
    for table in Table::ALL {
        let summaries = stats.table(table);
        let tensor: &mut Tensor3 = data.table_mut(table);
        let width = tensor.shape()[2].min(summaries.len());
        for (field, summary) in summaries.iter().enumerate().take(width).skip(FIRST_DATA_FIELD) {
            tensor.map_field(field, |v| f(summary, v));
        }
    }
}

/// `(v - mean) / std`; constant fields become `v - mean`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZScore {
    stats: FieldStats,
}

impl ZScore {
    pub fn new(stats: FieldStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &FieldStats {
        &self.stats
    }
}

impl Normalizer for ZScore {
    fn normalize(&self, data: &mut EpisodeData) {
        apply(&self.stats, data, |s, v| {
            let centred = f64::from(v) - s.mean;
            if s.std > 0.0 {
                (centred / s.std) as f32
            } else {
                centred as f32
            }
        });
    }
}

/// `(v - min) / (max - min)`; constant fields become `v - min`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMax {
    stats: FieldStats,
}

impl MinMax {
    pub fn new(stats: FieldStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &FieldStats {
        &self.stats
    }
}

impl Normalizer for MinMax {
    fn normalize(&self, data: &mut EpisodeData) {
        apply(&self.stats, data, |s, v| {
            let range = s.max - s.min;
            if range > 0.0 {
                (v - s.min) / range
            } else {
                v - s.min
            }
        });
    }
}
