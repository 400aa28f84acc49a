//! Output tensor container.
//!
//! One row-major `(rows × entities × fields)` buffer per table. The encoder
//! allocates a fresh container per call and fills every data field.

use crate::schema::{BallField, BoostField, PlayerField};

/// Dense row-major 3-D buffer of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3 {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl Tensor3 {
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Rebuild a tensor from a shape and flat data.
    /// Returns `None` if the shape overflows or `data.len()` does not match it.
    pub fn from_parts(shape: [usize; 3], data: Vec<f32>) -> Option<Self> {
        let len = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
        if data.len() != len {
            return None;
        }
        Some(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn get(&self, row: usize, entity: usize, field: usize) -> f32 {
        self.data[self.offset(row, entity, field)]
    }

    pub fn set(&mut self, row: usize, entity: usize, field: usize, value: f32) {
        let offset = self.offset(row, entity, field);
        self.data[offset] = value;
    }

    /// All fields of one entity at one row.
    pub fn entity(&self, row: usize, entity: usize) -> &[f32] {
        let start = self.offset(row, entity, 0);
        &self.data[start..start + self.shape[2]]
    }

    pub fn entity_mut(&mut self, row: usize, entity: usize) -> &mut [f32] {
        let start = self.offset(row, entity, 0);
        let width = self.shape[2];
        &mut self.data[start..start + width]
    }

    /// Iterate over one field across all rows and entities.
    pub fn field(&self, field: usize) -> impl Iterator<Item = f32> + '_ {
        assert!(field < self.shape[2], "field {field} out of range");
        self.data.chunks_exact(self.shape[2]).map(move |e| e[field])
    }

    /// Apply `f` to one field across all rows and entities.
    pub fn map_field(&mut self, field: usize, mut f: impl FnMut(f32) -> f32) {
        assert!(field < self.shape[2], "field {field} out of range");
        let width = self.shape[2];
        for entity in self.data.chunks_exact_mut(width) {
            entity[field] = f(entity[field]);
        }
    }

    fn offset(&self, row: usize, entity: usize, field: usize) -> usize {
        let [rows, entities, fields] = self.shape;
        assert!(
            row < rows && entity < entities && field < fields,
            "index ({row}, {entity}, {field}) out of bounds for shape {:?}",
            self.shape
        );
        (row * entities + entity) * fields + field
    }
}

/// Table selector within an `EpisodeData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Ball,
    Players,
    Boost,
}

impl Table {
    pub const ALL: [Self; 3] = [Self::Ball, Self::Players, Self::Boost];
}

/// Encoded episode: ball, player and boost tables sharing a row axis.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeData {
    pub ball: Tensor3,
    pub players: Tensor3,
    pub boost: Tensor3,
}

impl EpisodeData {
    /// Zero-filled container for `rows` rows and a roster of `num_players`.
    pub fn new_empty(rows: usize, num_players: usize) -> Self {
        Self {
            ball: Tensor3::zeros([rows, 1, BallField::COUNT]),
            players: Tensor3::zeros([rows, num_players, PlayerField::COUNT]),
            boost: Tensor3::zeros([rows, 1, BoostField::COUNT]),
        }
    }

    pub fn rows(&self) -> usize {
        self.ball.shape()[0]
    }

    pub fn num_players(&self) -> usize {
        self.players.shape()[1]
    }

    pub fn table(&self, table: Table) -> &Tensor3 {
        match table {
            Table::Ball => &self.ball,
            Table::Players => &self.players,
            Table::Boost => &self.boost,
        }
    }

    pub fn table_mut(&mut self, table: Table) -> &mut Tensor3 {
        match table {
            Table::Ball => &mut self.ball,
            Table::Players => &mut self.players,
            Table::Boost => &mut self.boost,
        }
    }
}
