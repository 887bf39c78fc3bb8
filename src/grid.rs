//! Spatial grid over a rectangular RA/Dec region.
//!
//! A [`GridSpec`] partitions a bounded patch of sky into cells; indexing a
//! magnitude-sorted catalog against it records the brightest stars per cell.
//! Successive levels halve the cell width (4x more cells each level), which
//! keeps quad enumeration local at every angular scale.

use std::f64::consts::TAU;

use thiserror::Error;

use crate::catalog::Catalog;

/// Sentinel marking an unoccupied star slot in a [`GridIndex`]. Catalog
/// index 0 (the brightest star) is a valid occupant; only this value is
/// filtered from cell lookups.
pub const NO_STAR: u32 = u32::MAX;

/// Invalid grid configuration.
#[derive(Debug, Clone, Error)]
pub enum GridError {
    #[error("{name} = {value} is outside [0, 2*pi)")]
    AngleOutOfRange { name: &'static str, value: f64 },
    /// RA increases eastward, so the grid runs from a larger RA down to a
    /// smaller one.
    #[error("ra_start ({ra_start}) must be greater than ra_end ({ra_end})")]
    RaNotDecreasing { ra_start: f64, ra_end: f64 },
    #[error("dec_start ({dec_start}) must be less than dec_end ({dec_end})")]
    DecNotIncreasing { dec_start: f64, dec_end: f64 },
    #[error("{name} must be positive")]
    EmptyAxis { name: &'static str },
}

/// Configuration of the indexing grid: the sky footprint, the base cell
/// counts, the per-cell star budget, and how many halving levels to build.
#[derive(Debug, Clone)]
pub struct GridSpec {
    /// Right ascension of the west grid edge (radians). Larger than
    /// `ra_end` because RA increases eastward.
    pub ra_start: f64,
    /// Declination of the south grid edge (radians).
    pub dec_start: f64,
    /// Right ascension of the east grid edge (radians).
    pub ra_end: f64,
    /// Declination of the north grid edge (radians).
    pub dec_end: f64,
    /// Number of cells along RA at level 0.
    pub n_ra: usize,
    /// Number of cells along Dec at level 0.
    pub n_dec: usize,
    /// Brightest stars kept per cell.
    pub n_brgh: usize,
    /// Number of halving levels processed by the table builder; level 0 is
    /// this grid, each further level doubles both cell counts.
    pub depth: usize,
}

fn check_angle(name: &'static str, value: f64) -> Result<(), GridError> {
    if (0.0..TAU).contains(&value) {
        Ok(())
    } else {
        Err(GridError::AngleOutOfRange { name, value })
    }
}

impl GridSpec {
    /// Validate and build a grid spec.
    ///
    /// `depth == 0` is accepted here; building a table over it fails with
    /// the empty-table error instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ra_start: f64,
        dec_start: f64,
        ra_end: f64,
        dec_end: f64,
        n_ra: usize,
        n_dec: usize,
        n_brgh: usize,
        depth: usize,
    ) -> Result<GridSpec, GridError> {
        check_angle("ra_start", ra_start)?;
        check_angle("dec_start", dec_start)?;
        check_angle("ra_end", ra_end)?;
        check_angle("dec_end", dec_end)?;
        if ra_start <= ra_end {
            return Err(GridError::RaNotDecreasing { ra_start, ra_end });
        }
        if dec_start >= dec_end {
            return Err(GridError::DecNotIncreasing { dec_start, dec_end });
        }
        if n_ra == 0 {
            return Err(GridError::EmptyAxis { name: "n_ra" });
        }
        if n_dec == 0 {
            return Err(GridError::EmptyAxis { name: "n_dec" });
        }
        if n_brgh == 0 {
            return Err(GridError::EmptyAxis { name: "n_brgh" });
        }

        Ok(GridSpec {
            ra_start,
            dec_start,
            ra_end,
            dec_end,
            n_ra,
            n_dec,
            n_brgh,
            depth,
        })
    }

    /// Cell width along RA. Negative, since the grid runs east.
    pub fn ra_width(&self) -> f64 {
        (self.ra_end - self.ra_start) / self.n_ra as f64
    }

    /// Cell width along Dec. Positive.
    pub fn dec_width(&self) -> f64 {
        (self.dec_end - self.dec_start) / self.n_dec as f64
    }

    /// Derive the grid at a halving level: the same footprint with both
    /// cell counts multiplied by `2^level`. `subgrid(0)` equals the base.
    /// Pure; the base spec is never modified.
    pub fn subgrid(&self, level: usize) -> GridSpec {
        let factor = 1usize << level;
        GridSpec {
            n_ra: self.n_ra * factor,
            n_dec: self.n_dec * factor,
            ..self.clone()
        }
    }

    /// Cell boundaries along RA, `n_ra + 1` values, monotonically
    /// decreasing from `ra_start` to `ra_end`.
    pub fn ra_bounds(&self) -> Vec<f64> {
        let width = self.ra_width();
        (0..=self.n_ra)
            .map(|i| self.ra_start + i as f64 * width)
            .collect()
    }

    /// Cell boundaries along Dec, `n_dec + 1` values, increasing from
    /// `dec_start` to `dec_end`.
    pub fn dec_bounds(&self) -> Vec<f64> {
        let width = self.dec_width();
        (0..=self.n_dec)
            .map(|j| self.dec_start + j as f64 * width)
            .collect()
    }
}

/// Per-level spatial index: the brightest stars of every grid cell.
///
/// A flat `n_ra x n_dec x n_brgh` buffer of catalog indices, preallocated
/// and sentinel-filled. Ranks within a cell are brightness order; cells
/// with fewer than `n_brgh` stars keep trailing [`NO_STAR`] slots.
#[derive(Debug, Clone)]
pub struct GridIndex {
    spec: GridSpec,
    star_ids: Vec<u32>,
}

impl GridIndex {
    fn new(spec: GridSpec) -> GridIndex {
        let slots = spec.n_ra * spec.n_dec * spec.n_brgh;
        GridIndex {
            spec,
            star_ids: vec![NO_STAR; slots],
        }
    }

    /// The spec this index was built against.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    fn slot(&self, i_ra: usize, i_dec: usize, rank: usize) -> usize {
        (i_ra * self.spec.n_dec + i_dec) * self.spec.n_brgh + rank
    }

    /// The catalog indices filed in a cell, brightest first, sentinel
    /// slots filtered out.
    pub fn cell_stars(&self, i_ra: usize, i_dec: usize) -> Vec<u32> {
        let start = self.slot(i_ra, i_dec, 0);
        self.star_ids[start..start + self.spec.n_brgh]
            .iter()
            .copied()
            .filter(|&id| id != NO_STAR)
            .collect()
    }
}

/// Index a catalog against one grid level.
///
/// For each cell, scans the catalog in ascending-magnitude order and files
/// stars whose position falls inside the cell until `n_brgh` are found; the
/// catalog's sort order makes those the brightest. Membership is half-open
/// (`ra_bound[i+1] < ra <= ra_bound[i]`, `dec_bound[j] <= dec <
/// dec_bound[j+1]`), so a star on an interior boundary lands in exactly one
/// cell. Stars outside the footprint are ignored. The scan is
/// O(cells x catalog) per level, an acceptable one-time build cost.
pub fn index_level(catalog: &Catalog, spec: &GridSpec) -> GridIndex {
    let ra_bounds = spec.ra_bounds();
    let dec_bounds = spec.dec_bounds();
    let mut index = GridIndex::new(spec.clone());

    for i_ra in 0..spec.n_ra {
        for i_dec in 0..spec.n_dec {
            let mut rank = 0;
            for (star, entry) in catalog.iter().enumerate() {
                if rank == spec.n_brgh {
                    break;
                }
                let in_ra = entry.ra > ra_bounds[i_ra + 1] && entry.ra <= ra_bounds[i_ra];
                let in_dec = entry.dec >= dec_bounds[i_dec] && entry.dec < dec_bounds[i_dec + 1];
                if in_ra && in_dec {
                    let slot = index.slot(i_ra, i_dec, rank);
                    index.star_ids[slot] = star as u32;
                    rank += 1;
                }
            }
        }
    }

    index
}

/// Index a catalog at every halving level of a base grid, one
/// [`GridIndex`] per level `0..depth`.
pub fn index_levels(catalog: &Catalog, base: &GridSpec) -> Vec<GridIndex> {
    (0..base.depth)
        .map(|level| index_level(catalog, &base.subgrid(level)))
        .collect()
}
