//! Nearest-code lookup over a hash table.
//!
//! An exhaustive scan in 4-D code space. An indexed search structure over
//! codes is deliberately out of scope; the table sizes this crate targets
//! scan fast enough, and the scan's first-wins tie-break is easy to state.

use crate::quad::{CODE_DIM, Code};
use crate::table::{HashRecord, HashTable};

/// The closest stored record to a probe code.
#[derive(Debug, Clone, Copy)]
pub struct CodeMatch {
    /// Row index in the table.
    pub index: usize,
    /// Euclidean distance in code space.
    pub distance: f64,
    pub record: HashRecord,
}

/// Scan the whole table for the code nearest the probe.
///
/// Distances are computed in f64 over the stored f32 columns. Ties go to
/// the lowest row index (strict `<` keeps the first minimum). An empty
/// table has no nearest record.
pub fn nearest_code(table: &HashTable, probe: &Code) -> Option<CodeMatch> {
    let mut best: Option<(usize, f64)> = None;

    for (i, code) in table.codes().iter().enumerate() {
        let mut dist_sq = 0.0;
        for k in 0..CODE_DIM {
            let diff = probe[k] - code[k] as f64;
            dist_sq += diff * diff;
        }
        if best.is_none_or(|(_, b)| dist_sq < b) {
            best = Some((i, dist_sq));
        }
    }

    let (index, dist_sq) = best?;
    let record = table.get(index)?;
    Some(CodeMatch {
        index,
        distance: dist_sq.sqrt(),
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_code(code: [f32; CODE_DIM], tag: u32) -> HashRecord {
        HashRecord {
            code,
            origin: [0.0, 0.0],
            rotation: 0.0,
            scale: 1.0,
            stars: [tag, tag, tag, tag],
        }
    }

    fn table_with_codes(codes: &[[f32; CODE_DIM]]) -> HashTable {
        let mut table = HashTable::new();
        for (i, &code) in codes.iter().enumerate() {
            table.push(record_with_code(code, i as u32));
        }
        table
    }

    #[test]
    fn empty_table_has_no_match() {
        let table = HashTable::new();
        assert!(nearest_code(&table, &[0.0; CODE_DIM]).is_none());
    }

    #[test]
    fn exact_probe_matches_at_zero_distance() {
        let table = table_with_codes(&[
            [0.1, 0.2, 0.3, 0.4],
            [0.5, 0.1, 0.6, 0.2],
            [0.2, 0.9, 0.4, 0.8],
        ]);

        // Upcast the stored row exactly.
        let probe: Code = std::array::from_fn(|k| table.codes()[1][k] as f64);
        let found = nearest_code(&table, &probe).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.distance, 0.0);
        assert_eq!(found.record.stars, [1, 1, 1, 1]);
    }

    #[test]
    fn nearest_of_several() {
        let table = table_with_codes(&[
            [0.0, 0.0, 0.0, 0.0],
            [0.5, 0.5, 0.5, 0.5],
            [1.0, 1.0, 1.0, 1.0],
        ]);

        let found = nearest_code(&table, &[0.6, 0.6, 0.6, 0.6]).unwrap();
        assert_eq!(found.index, 1);
        assert!((found.distance - 0.2).abs() < 1e-7);
    }

    #[test]
    fn ties_go_to_the_first_row() {
        let table = table_with_codes(&[
            [0.2, 0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0, 0.0],
        ]);

        let found = nearest_code(&table, &[0.1, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.distance, 0.0);
    }
}
