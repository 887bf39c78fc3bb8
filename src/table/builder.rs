//! Grid-driven hash table construction.
//!
//! Walks every halving level of a grid, and within each level every
//! adjacent 2x2 cell block, encoding one quad per combination of candidate
//! stars (one from each cell). Blocks with an empty cell contribute
//! nothing; degenerate and invariant-violating quads are skipped and
//! counted. Record order is fully deterministic: levels ascending, then RA
//! index, then Dec index, then product order with the A-cell star varying
//! slowest.

use itertools::iproduct;
use log::{debug, warn};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::grid::{GridIndex, GridSpec, index_level};
use crate::quad::{QUAD_STARS, QuadError, encode_quad};
use crate::table::{HashRecord, HashTable};

/// Failure to build a hash table.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Every block at every level came up empty (or `depth` was 0).
    #[error("no hash records produced for the given catalog and grid")]
    NoRecords,
}

/// Counters accumulated over one build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    /// Grid levels processed.
    pub levels: usize,
    /// 2x2 blocks examined.
    pub blocks_visited: usize,
    /// Blocks skipped because at least one cell held no stars.
    pub blocks_skipped: usize,
    /// Quads successfully encoded into records.
    pub quads_encoded: usize,
    /// Quads dropped for a coincident backbone.
    pub degenerate_quads: usize,
    /// Quads dropped for failing the code validity invariant.
    pub invariant_violations: usize,
}

/// Encode every quad of one 2x2 cell block into a fresh table.
///
/// The block's cells contribute stars by role: A from (i, j), B from
/// (i+1, j), C from (i, j+1), D from (i+1, j+1). An empty cell anywhere
/// skips the whole block.
fn hash_block(
    catalog: &Catalog,
    index: &GridIndex,
    i_ra: usize,
    i_dec: usize,
    stats: &mut BuildStats,
) -> HashTable {
    stats.blocks_visited += 1;

    let cell_a = index.cell_stars(i_ra, i_dec);
    let cell_b = index.cell_stars(i_ra + 1, i_dec);
    let cell_c = index.cell_stars(i_ra, i_dec + 1);
    let cell_d = index.cell_stars(i_ra + 1, i_dec + 1);

    if cell_a.is_empty() || cell_b.is_empty() || cell_c.is_empty() || cell_d.is_empty() {
        stats.blocks_skipped += 1;
        return HashTable::new();
    }

    let product = cell_a.len() * cell_b.len() * cell_c.len() * cell_d.len();
    let mut table = HashTable::with_capacity(product);

    for (&id_a, &id_b, &id_c, &id_d) in iproduct!(&cell_a, &cell_b, &cell_c, &cell_d) {
        let stars = [id_a, id_b, id_c, id_d];
        let points: [[f64; 2]; QUAD_STARS] =
            std::array::from_fn(|k| catalog.position(stars[k] as usize));

        match encode_quad(&points) {
            Ok(quad) => {
                table.push(HashRecord::from_encoded(&quad, stars));
                stats.quads_encoded += 1;
            }
            Err(QuadError::DegenerateQuad { .. }) => {
                stats.degenerate_quads += 1;
            }
            Err(err @ QuadError::InvariantViolation { .. }) => {
                warn!("skipping quad of stars {stars:?}: {err}");
                stats.invariant_violations += 1;
            }
        }
    }

    table
}

/// Build a hash table over every level of a grid.
///
/// Each level indexes the catalog once, then hashes every adjacent 2x2
/// block; block tables merge into the accumulator in scan order. An empty
/// result is an error ([`BuildError::NoRecords`]), not an empty table.
pub fn build_table(
    catalog: &Catalog,
    grid: &GridSpec,
) -> Result<(HashTable, BuildStats), BuildError> {
    let mut table = HashTable::new();
    let mut stats = BuildStats::default();

    for level in 0..grid.depth {
        let spec = grid.subgrid(level);
        debug!(
            "hashing level {level}: {} x {} cells, {} stars per cell",
            spec.n_ra, spec.n_dec, spec.n_brgh
        );
        let index = index_level(catalog, &spec);

        for i_ra in 0..spec.n_ra - 1 {
            for i_dec in 0..spec.n_dec - 1 {
                let block = hash_block(catalog, &index, i_ra, i_dec, &mut stats);
                table.merge(block);
            }
        }

        stats.levels += 1;
        debug!("level {level} done: {} records so far", table.len());
    }

    if table.is_empty() {
        return Err(BuildError::NoRecords);
    }
    Ok((table, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn entry(ra: f64, dec: f64, mag: f64) -> CatalogEntry {
        CatalogEntry {
            ra,
            dec,
            mag,
            name: None,
        }
    }

    /// 2x2 grid over RA [0.5, 1.0] x Dec [0.2, 0.7].
    fn spec(n_brgh: usize, depth: usize) -> GridSpec {
        GridSpec::new(1.0, 0.2, 0.5, 0.7, 2, 2, n_brgh, depth).unwrap()
    }

    /// One star in the middle of each level-0 cell, magnitudes fixing the
    /// catalog order to the listing order.
    fn four_corner_catalog() -> Catalog {
        Catalog::from_entries(vec![
            entry(0.875, 0.325, 1.0), // cell (0, 0) -> role A
            entry(0.625, 0.325, 2.0), // cell (1, 0) -> role B
            entry(0.875, 0.575, 3.0), // cell (0, 1) -> role C
            entry(0.625, 0.575, 4.0), // cell (1, 1) -> role D
        ])
    }

    #[test]
    fn single_block_single_quad() {
        let catalog = four_corner_catalog();
        let (table, stats) = build_table(&catalog, &spec(1, 1)).unwrap();

        assert_eq!(table.len(), 1);
        let rec = table.get(0).unwrap();
        assert_eq!(rec.stars, [0, 1, 2, 3]);

        assert_eq!(stats.levels, 1);
        assert_eq!(stats.blocks_visited, 1);
        assert_eq!(stats.blocks_skipped, 0);
        assert_eq!(stats.quads_encoded, 1);
        assert_eq!(stats.degenerate_quads, 0);
        assert_eq!(stats.invariant_violations, 0);
    }

    #[test]
    fn record_matches_direct_encoding() {
        let catalog = four_corner_catalog();
        let (table, _) = build_table(&catalog, &spec(1, 1)).unwrap();

        let points: [[f64; 2]; QUAD_STARS] = std::array::from_fn(|i| catalog.position(i));
        let expected = HashRecord::from_encoded(&encode_quad(&points).unwrap(), [0, 1, 2, 3]);
        assert_eq!(table.get(0).unwrap(), expected);
    }

    #[test]
    fn deeper_levels_add_no_records_for_sparse_sky() {
        // At level 1 the four stars sit in non-adjacent fine cells, so
        // every fine block has an empty cell and only level 0 contributes.
        let catalog = four_corner_catalog();
        let (shallow, _) = build_table(&catalog, &spec(1, 1)).unwrap();
        let (deep, stats) = build_table(&catalog, &spec(1, 2)).unwrap();

        assert_eq!(deep.len(), shallow.len());
        assert_eq!(stats.levels, 2);
        // Level 0 has 1 block, level 1 has 3x3.
        assert_eq!(stats.blocks_visited, 10);
        assert_eq!(stats.blocks_skipped, 9);
    }

    #[test]
    fn product_order_is_deterministic() {
        // Two stars in the A cell: records enumerate the A candidates
        // slowest, brightness rank first.
        let catalog = Catalog::from_entries(vec![
            entry(0.875, 0.325, 1.0),
            entry(0.850, 0.350, 1.5), // second star in cell (0, 0)
            entry(0.625, 0.325, 2.0),
            entry(0.875, 0.575, 3.0),
            entry(0.625, 0.575, 4.0),
        ]);

        let (table, stats) = build_table(&catalog, &spec(2, 1)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().stars, [0, 2, 3, 4]);
        assert_eq!(table.get(1).unwrap().stars, [1, 2, 3, 4]);
        assert_eq!(stats.quads_encoded, 2);

        // Identical inputs reproduce the identical sequence.
        let (again, _) = build_table(&catalog, &spec(2, 1)).unwrap();
        let a: Vec<_> = table.iter().collect();
        let b: Vec<_> = again.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_cell_skips_block() {
        // Only three of the four block cells are occupied.
        let catalog = Catalog::from_entries(vec![
            entry(0.875, 0.325, 1.0),
            entry(0.625, 0.325, 2.0),
            entry(0.875, 0.575, 3.0),
        ]);

        let err = build_table(&catalog, &spec(1, 1)).unwrap_err();
        assert!(matches!(err, BuildError::NoRecords));
    }

    #[test]
    fn depth_zero_builds_nothing() {
        let catalog = four_corner_catalog();
        let err = build_table(&catalog, &spec(1, 0)).unwrap_err();
        assert!(matches!(err, BuildError::NoRecords));
    }

    #[test]
    fn empty_catalog_builds_nothing() {
        let catalog = Catalog::from_entries(Vec::new());
        let err = build_table(&catalog, &spec(1, 3)).unwrap_err();
        assert!(matches!(err, BuildError::NoRecords));
    }

    #[test]
    fn duplicate_positions_across_quads_still_encode() {
        // Two C candidates at the same position yield two distinct quads
        // with identical codes. Neither is degenerate: the backbone only
        // collapses when the most distant pair coincides, and distinct
        // cells always separate at least one pair.
        let catalog = Catalog::from_entries(vec![
            entry(0.875, 0.325, 1.0), // cell (0, 0)
            entry(0.625, 0.325, 1.5), // cell (1, 0)
            entry(0.875, 0.575, 2.0), // cell (0, 1), rank 0
            entry(0.875, 0.575, 2.5), // cell (0, 1), rank 1: same position
            entry(0.625, 0.575, 3.0), // cell (1, 1)
        ]);

        let (table, stats) = build_table(&catalog, &spec(2, 1)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(stats.degenerate_quads, 0);
        assert_eq!(
            table.get(0).unwrap().code,
            table.get(1).unwrap().code
        );
        assert_ne!(table.get(0).unwrap().stars, table.get(1).unwrap().stars);
    }

    #[test]
    fn n_brgh_product_size() {
        // Two stars per cell, eight stars total: 2^4 quads from the one
        // block.
        let catalog = Catalog::from_entries(vec![
            entry(0.875, 0.325, 1.0),
            entry(0.850, 0.300, 1.1),
            entry(0.625, 0.325, 2.0),
            entry(0.650, 0.300, 2.1),
            entry(0.875, 0.575, 3.0),
            entry(0.850, 0.600, 3.1),
            entry(0.625, 0.575, 4.0),
            entry(0.650, 0.600, 4.1),
        ]);

        let (table, stats) = build_table(&catalog, &spec(2, 1)).unwrap();
        assert_eq!(table.len(), 16);
        assert_eq!(stats.quads_encoded, 16);
    }
}
