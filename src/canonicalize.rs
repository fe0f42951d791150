//! Canonical form of orientation channels.
//!
//! `q` and `-q` describe the same rotation. For learning, each rotation should
//! have a single representation, so orientations are normalized and flipped
//! to a non-negative scalar part.

use nalgebra::Quaternion;
use tracing::debug;

use crate::error::{FeatureError, Result};
use crate::frames::FrameTable;
use crate::math::quaternion::canonicalize;

fn canonical_series(joint: &str, orientations: &[Quaternion<f64>]) -> Result<Vec<Quaternion<f64>>> {
    orientations
        .iter()
        .enumerate()
        .map(|(row, q)| canonicalize(q).ok_or_else(|| FeatureError::degenerate_input(joint, row)))
        .collect()
}

/// Canonicalize the orientations of the given joints, returning a new table.
///
/// Other channels are copied unchanged. Missing rows stay missing.
///
/// # Errors
///
/// - [`FeatureError::ColumnNotFound`] if a joint has no orientation channels
/// - [`FeatureError::DegenerateInput`] for a zero-norm orientation
pub fn canonicalize_quaternions(frames: &FrameTable, joints: &[impl AsRef<str>]) -> Result<FrameTable> {
    let mut canonical = frames.clone();
    canonicalize_quaternions_in_place(&mut canonical, joints)?;
    Ok(canonical)
}

/// Canonicalize the orientations of the given joints in place.
///
/// On error the table is left unchanged.
///
/// # Errors
///
/// See [`canonicalize_quaternions`].
pub fn canonicalize_quaternions_in_place(
    frames: &mut FrameTable,
    joints: &[impl AsRef<str>],
) -> Result<()> {
    debug!(frames = frames.len(), joints = joints.len(), "canonicalizing quaternions");

    let canonical = joints
        .iter()
        .map(|joint| {
            let joint = joint.as_ref();
            let series = canonical_series(joint, frames.orientations(joint)?)?;
            Ok::<_, FeatureError>((joint, series))
        })
        .collect::<Result<Vec<_>>>()?;

    for (joint, series) in canonical {
        frames.set_orientations(joint, series)?;
    }
    frames.quantize();
    Ok(())
}
