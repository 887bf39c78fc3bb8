//! Quad codec: geometric hashing of 4-star patterns.
//!
//! Encodes the relative geometry of four stars as a 4-dimensional code that
//! is invariant to rotation, translation and uniform scaling of the input
//! coordinates. With rectification, equivalent configurations produce the
//! same code regardless of star labeling.

use thiserror::Error;

/// Number of stars in a quad.
pub const QUAD_STARS: usize = 4;

/// Dimensionality of the code (2 coordinates per non-backbone star).
pub const CODE_DIM: usize = 2 * (QUAD_STARS - 2);

/// A geometric hash code: the normalized coordinates of stars C and D in
/// the frame spanned by the backbone stars A and B.
pub type Code = [f64; CODE_DIM];

/// Squared radius of the two validity disks (radius sqrt(2), centered on
/// the normalized backbone endpoints (0,0) and (1,1)).
const DISK_RADIUS_SQ: f64 = 2.0;

/// Failure to encode a quad.
#[derive(Debug, Clone, Error)]
pub enum QuadError {
    /// The backbone stars coincide, so the quad spans no frame.
    #[error("degenerate quad: backbone stars coincide at {at:?}")]
    DegenerateQuad { at: [f64; 2] },
    /// Neither C nor D landed inside both validity disks. Carries the raw
    /// (unrectified) code and the four input points for diagnosis.
    #[error("quad code {code:?} falls outside the validity disks")]
    InvariantViolation {
        code: Code,
        points: [[f64; 2]; QUAD_STARS],
    },
}

/// An encoded quad: the canonical code plus the geometry of the hash frame,
/// everything a hash-table row records about the quad.
#[derive(Debug, Clone, Copy)]
pub struct EncodedQuad {
    /// Rectified geometric hash code.
    pub code: Code,
    /// Position of backbone star A in the input coordinate system.
    pub origin: [f64; 2],
    /// Baseline angle `atan2(b_x, b_y)` of the shifted backbone star B.
    pub rotation: f64,
    /// Inverse squared baseline length, the similarity scale factor.
    pub scale: f64,
}

/// Find the most distant pair among the four points.
///
/// Scans unordered pairs (i, j) with i < j in lexicographic order and keeps
/// the first maximum, so ties break deterministically toward the lowest
/// indices.
pub fn most_distant_pair(points: &[[f64; 2]; QUAD_STARS]) -> (usize, usize) {
    let mut best = (0, 1);
    let mut best_dist = f64::NEG_INFINITY;
    for i in 0..QUAD_STARS {
        for j in (i + 1)..QUAD_STARS {
            let dx = points[j][0] - points[i][0];
            let dy = points[j][1] - points[i][1];
            let dist = dx * dx + dy * dy;
            if dist > best_dist {
                best_dist = dist;
                best = (i, j);
            }
        }
    }
    best
}

/// Rectify a code so star labeling cannot change it.
///
/// Two reorderings are normalized away:
///
/// 1. If `code[0] + code[2] > 1`, the backbone is flipped (A and B trade
///    ends) by mapping every entry to `1 - entry`.
/// 2. If `code[0] > code[2]`, the C and D halves are swapped.
///
/// Afterwards `code[0] + code[2] <= 1` and `code[0] <= code[2]` hold, and
/// rectifying again changes nothing.
pub fn rectify_code(mut code: Code) -> Code {
    if code[0] + code[2] > 1.0 {
        for v in &mut code {
            *v = 1.0 - *v;
        }
    }
    if code[0] > code[2] {
        code.swap(0, 2);
        code.swap(1, 3);
    }
    code
}

fn within_disks(x: f64, y: f64) -> bool {
    x * x + y * y <= DISK_RADIUS_SQ
        && (x - 1.0) * (x - 1.0) + (y - 1.0) * (y - 1.0) <= DISK_RADIUS_SQ
}

/// Encode a quad whose backbone is already chosen: `points[0]` is A,
/// `points[1]` is B, and A-B must be the most distant pair (use
/// [`encode_quad`] to establish that ordering).
///
/// The similarity transform is built in three steps:
/// 1. Shift all points by -A, putting A at the origin.
/// 2. Rotate by the baseline angle, then by -45 degrees, so B lies on the
///    diagonal.
/// 3. Scale by the inverse squared baseline length, landing B on (1, 1).
///
/// The transformed C and D concatenate into the raw code. At least one of
/// them must lie within both validity disks of radius sqrt(2) around (0,0)
/// and (1,1); a quad whose backbone truly is its most distant pair always
/// satisfies this, so a violation means the ordering or the arithmetic has
/// broken down and is reported rather than corrected.
pub fn encode_backbone_quad(
    points: &[[f64; 2]; QUAD_STARS],
) -> Result<EncodedQuad, QuadError> {
    let a = points[0];
    let b = [points[1][0] - a[0], points[1][1] - a[1]];

    let baseline_sq = b[0] * b[0] + b[1] * b[1];
    if baseline_sq == 0.0 {
        return Err(QuadError::DegenerateQuad { at: a });
    }
    let scale = 1.0 / baseline_sq;

    // Combined rotation by the baseline angle and -45 degrees; the scale
    // factor folds the sqrt(2) diagonal stretch back in.
    let costheta = (b[1] + b[0]) * scale;
    let sintheta = (b[1] - b[0]) * scale;

    let mut raw = [0.0f64; CODE_DIM];
    for i in 2..QUAD_STARS {
        let px = points[i][0] - a[0];
        let py = points[i][1] - a[1];
        raw[2 * (i - 2)] = px * costheta + py * sintheta;
        raw[2 * (i - 2) + 1] = -px * sintheta + py * costheta;
    }

    if !(within_disks(raw[0], raw[1]) || within_disks(raw[2], raw[3])) {
        return Err(QuadError::InvariantViolation {
            code: raw,
            points: *points,
        });
    }

    Ok(EncodedQuad {
        code: rectify_code(raw),
        origin: a,
        rotation: b[0].atan2(b[1]),
        scale,
    })
}

/// Encode four stars into a canonical geometric hash code.
///
/// Picks the most distant pair as the backbone (ties break toward the
/// lowest indices), keeps the remaining two stars in ascending input
/// order, and encodes.
pub fn encode_quad(points: &[[f64; 2]; QUAD_STARS]) -> Result<EncodedQuad, QuadError> {
    let (i_a, i_b) = most_distant_pair(points);

    let mut rest = [0usize; QUAD_STARS - 2];
    let mut n_rest = 0;
    for i in 0..QUAD_STARS {
        if i != i_a && i != i_b {
            rest[n_rest] = i;
            n_rest += 1;
        }
    }

    let ordered = [points[i_a], points[i_b], points[rest[0]], points[rest[1]]];
    encode_backbone_quad(&ordered)
}
