//! The hash table: quad codes and their frame geometry, stored as parallel
//! columns.
//!
//! Rows are append-only; tables built independently (per block, per level,
//! or by parallel callers) compose through [`HashTable::merge`]. Values are
//! narrowed to f32 on entry, which is also the persisted precision
//! ([`store`]), so saved tables round-trip bit-identically.

pub mod builder;
pub mod store;

use crate::quad::{CODE_DIM, EncodedQuad, QUAD_STARS};

/// One hash table row: the rectified code, the hash frame geometry, and
/// the catalog indices of the four stars that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashRecord {
    pub code: [f32; CODE_DIM],
    /// (ra, dec) of backbone star A.
    pub origin: [f32; 2],
    /// Baseline angle of the hash frame.
    pub rotation: f32,
    /// Inverse squared baseline length.
    pub scale: f32,
    /// Catalog indices in generation order (one star per block cell), not
    /// the encoder's internal backbone relabeling.
    pub stars: [u32; QUAD_STARS],
}

impl HashRecord {
    /// Narrow an encoded quad to storage precision. The single place where
    /// f64 becomes f32.
    pub fn from_encoded(quad: &EncodedQuad, stars: [u32; QUAD_STARS]) -> HashRecord {
        HashRecord {
            code: quad.code.map(|v| v as f32),
            origin: quad.origin.map(|v| v as f32),
            rotation: quad.rotation as f32,
            scale: quad.scale as f32,
            stars,
        }
    }
}

/// Growable store of hash records as five parallel column vectors.
///
/// All columns always share one length; growth is amortized Vec doubling,
/// so pushes cannot fail and there is no capacity to exceed.
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    codes: Vec<[f32; CODE_DIM]>,
    origins: Vec<[f32; 2]>,
    rotations: Vec<f32>,
    scales: Vec<f32>,
    stars: Vec<[u32; QUAD_STARS]>,
}

impl HashTable {
    pub fn new() -> HashTable {
        HashTable::default()
    }

    /// An empty table with room for `capacity` records, for callers that
    /// know the row count up front (a block's quad product, a file's
    /// record count).
    pub fn with_capacity(capacity: usize) -> HashTable {
        HashTable {
            codes: Vec::with_capacity(capacity),
            origins: Vec::with_capacity(capacity),
            rotations: Vec::with_capacity(capacity),
            scales: Vec::with_capacity(capacity),
            stars: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn push(&mut self, record: HashRecord) {
        self.codes.push(record.code);
        self.origins.push(record.origin);
        self.rotations.push(record.rotation);
        self.scales.push(record.scale);
        self.stars.push(record.stars);
    }

    pub fn get(&self, i: usize) -> Option<HashRecord> {
        if i >= self.len() {
            return None;
        }
        Some(HashRecord {
            code: self.codes[i],
            origin: self.origins[i],
            rotation: self.rotations[i],
            scale: self.scales[i],
            stars: self.stars[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = HashRecord> + '_ {
        (0..self.len()).map(|i| HashRecord {
            code: self.codes[i],
            origin: self.origins[i],
            rotation: self.rotations[i],
            scale: self.scales[i],
            stars: self.stars[i],
        })
    }

    /// The code column, the one the nearest-code scan walks.
    pub fn codes(&self) -> &[[f32; CODE_DIM]] {
        &self.codes
    }

    /// Append another table's rows after this table's rows. Relative order
    /// is preserved on both sides, so merging is associative in content.
    pub fn merge(&mut self, other: HashTable) {
        self.codes.extend(other.codes);
        self.origins.extend(other.origins);
        self.rotations.extend(other.rotations);
        self.scales.extend(other.scales);
        self.stars.extend(other.stars);
    }
}
