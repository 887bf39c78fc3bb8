//! Astrometric pattern matching via geometric hashing of star quads.
//!
//! Asterism encodes 4-star patterns as similarity-invariant hash codes,
//! indexes a star catalog on a multi-level RA/Dec grid to enumerate quads
//! of nearby bright stars, and stores the resulting codes in a table that
//! persists to a versioned binary format and answers nearest-code queries.

pub mod catalog;
pub mod grid;
pub mod matcher;
pub mod quad;
pub mod sources;
pub mod table;
