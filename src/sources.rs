//! Interface to an external star detector.
//!
//! Detection itself (filtering, local-maxima extraction) lives outside
//! this crate; what arrives here is its output, parallel sequences of
//! pixel positions and brightness values. Those become probe quads through
//! the same encoder the catalog side uses, so their codes are directly
//! comparable against a built table.

use std::cmp::Ordering;

use itertools::Itertools;
use log::debug;

use crate::quad::{EncodedQuad, QUAD_STARS, encode_quad};

/// One detector output: a pixel position and a flux-like brightness
/// (higher = brighter, unlike catalog magnitudes).
#[derive(Debug, Clone, Copy)]
pub struct DetectedStar {
    pub x: f64,
    pub y: f64,
    pub brightness: f64,
}

/// An encoded probe quad with the detector indices of its four stars, so
/// a match can be traced back to image sources.
#[derive(Debug, Clone, Copy)]
pub struct ProbeQuad {
    pub encoded: EncodedQuad,
    /// Indices into the detector's original output order.
    pub stars: [usize; QUAD_STARS],
}

/// Zip a detector's parallel position and brightness sequences into
/// detected stars. If the lengths differ, the excess of the longer side
/// is dropped.
pub fn collect_stars(positions: &[[f64; 2]], brightness: &[f64]) -> Vec<DetectedStar> {
    positions
        .iter()
        .zip(brightness)
        .map(|(&[x, y], &b)| DetectedStar { x, y, brightness: b })
        .collect()
}

/// Encode every 4-combination of the brightest detected stars.
///
/// Stars are ranked by brightness descending (ties keep detector order)
/// and truncated to `max_stars` before enumeration, which bounds the
/// combination count. Quads the encoder rejects are skipped; probe sets
/// come from real images, where a failed quad is noise rather than a bug.
pub fn probe_quads(stars: &[DetectedStar], max_stars: usize) -> Vec<ProbeQuad> {
    let mut order: Vec<usize> = (0..stars.len()).collect();
    order.sort_by(|&a, &b| {
        stars[b]
            .brightness
            .partial_cmp(&stars[a].brightness)
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(max_stars);

    let mut quads = Vec::new();
    for combo in order.into_iter().combinations(QUAD_STARS) {
        let points: [[f64; 2]; QUAD_STARS] = std::array::from_fn(|k| {
            let s = &stars[combo[k]];
            [s.x, s.y]
        });
        match encode_quad(&points) {
            Ok(encoded) => quads.push(ProbeQuad {
                encoded,
                stars: std::array::from_fn(|k| combo[k]),
            }),
            Err(err) => debug!("skipping probe quad {combo:?}: {err}"),
        }
    }
    quads
}
