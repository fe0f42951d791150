//! Body-relative (egocentric) coordinate transform.
//!
//! Re-expresses joint poses in a frame attached to a reference joint (usually
//! the head): positions become offsets from the reference joint, and a per-frame
//! rotation about the `up` axis removes the reference joint's heading.
//!
//! # Algorithm
//!
//! Per frame, batched over the whole table:
//!
//! 1. Normalize the reference orientation.
//! 2. Rotate the canonical `forward` vector by it (viewing direction).
//! 3. Zero the `up` component of the viewing direction. The remaining two
//!    components are not rescaled.
//! 4. Unsigned heading angle = `acos` of the normalized dot product with `forward`.
//! 5. Sign from the `right` component of the projection (`0` counts as positive),
//!    negated so the correction turns the heading back onto `forward`.
//! 6. Correction quaternion = rotation about `up` by the signed angle.
//! 7. Targets: `R_c · (p - p_ref)` for positions, `q_c ⊗ q` for orientations.
//! 8. Reference orientation: `q_c ⊗ q_ref`.

use nalgebra::{Quaternion, Vector3};
use tracing::{debug, warn};

use crate::config::{BodyRelativeConfig, CoordinateSystem};
use crate::error::{FeatureError, Result};
use crate::frames::FrameTable;
use crate::math::quaternion::{self, compose, from_axis_angle, rotate_vector, rotation_matrix};

/// Projections shorter than this have no defined heading.
pub const MIN_PROJECTION_NORM: f64 = 1e-12;

/// Yaw-only correction rotations derived from a reference joint.
#[derive(Debug, Clone)]
pub struct HeadingCorrection {
    /// Normalized reference orientations.
    pub reference: Vec<Quaternion<f64>>,

    /// Correction rotation per frame; missing where the heading is undefined.
    pub corrections: Vec<Quaternion<f64>>,

    /// Frames whose viewing direction was (nearly) parallel to `up`.
    pub degenerate_frames: usize,
}

/// Signed correction angle about `up` for one viewing direction.
///
/// Returns `NaN` for a missing orientation or a vertical viewing direction.
fn correction_angle(view: &Vector3<f64>, system: &CoordinateSystem) -> f64 {
    let mut projected = *view;
    projected[system.up.index()] = 0.0;

    let forward = system.forward.unit();
    let norm = projected.norm();
    if norm < MIN_PROJECTION_NORM {
        return f64::NAN;
    }

    let cos = (projected.dot(&forward) / norm).clamp(-1.0, 1.0);
    let angle = cos.acos();

    let direction = if projected[system.right.index()] < 0.0 {
        -1.0
    } else {
        1.0
    };
    -direction * system.handedness() * angle
}

/// Compute the per-frame heading correction for a reference orientation series.
///
/// # Errors
///
/// Returns [`FeatureError::DegenerateInput`] if a reference orientation has
/// zero norm.
pub fn correction_rotations(
    reference: &[Quaternion<f64>],
    system: &CoordinateSystem,
) -> Result<HeadingCorrection> {
    system.validate()?;

    let reference = quaternion::normalize_batch(reference)?;
    let forward = system.forward.unit();
    let up = system.up.unit();

    let mut degenerate_frames = 0;
    let corrections = reference
        .iter()
        .map(|q| {
            let view = rotate_vector(q, &forward);
            let angle = correction_angle(&view, system);
            if angle.is_nan() && !quaternion::is_missing(q) {
                degenerate_frames += 1;
            }
            from_axis_angle(&(up * angle))
        })
        .collect();

    Ok(HeadingCorrection {
        reference,
        corrections,
        degenerate_frames,
    })
}

/// Transform joint poses into the body-relative frame of the reference joint.
///
/// The result holds, in order, the corrected positions and orientations of
/// every target joint followed by the corrected orientation of the reference
/// joint. All other channels are dropped. The reference position is the
/// origin and is not emitted. Output precision equals input precision.
///
/// # Errors
///
/// - [`FeatureError::Configuration`] for an invalid axis mapping
/// - [`FeatureError::ColumnNotFound`] when a required channel is absent
/// - [`FeatureError::DegenerateInput`] for a zero-norm orientation
///
/// # Example
///
/// ```
/// use kinematic_features::{to_body_relative, BodyRelativeConfig, CoordinateSystem, FrameTable, Precision};
///
/// let columns = vec![
///     ("hmd_pos_x", vec![0.0]), ("hmd_pos_y", vec![1.7]), ("hmd_pos_z", vec![0.0]),
///     ("hmd_rot_w", vec![1.0]), ("hmd_rot_x", vec![0.0]), ("hmd_rot_y", vec![0.0]), ("hmd_rot_z", vec![0.0]),
///     ("hand_pos_x", vec![0.3]), ("hand_pos_y", vec![1.2]), ("hand_pos_z", vec![0.4]),
///     ("hand_rot_w", vec![1.0]), ("hand_rot_x", vec![0.0]), ("hand_rot_y", vec![0.0]), ("hand_rot_z", vec![0.0]),
/// ];
/// let frames = FrameTable::from_columns(columns, Precision::Double)?;
///
/// let config = BodyRelativeConfig::new(CoordinateSystem::unity())
///     .with_reference_joint("hmd")
///     .with_target_joints(["hand"]);
/// let relative = to_body_relative(&frames, &config)?;
///
/// let y = relative.column("hand_pos_y").unwrap();
/// assert!((y[0] + 0.5).abs() < 1e-12);
/// # Ok::<(), kinematic_features::FeatureError>(())
/// ```
pub fn to_body_relative(frames: &FrameTable, config: &BodyRelativeConfig) -> Result<FrameTable> {
    config.validate()?;

    let reference_joint = config.reference_joint.as_str();
    let reference_positions = frames.positions(reference_joint)?;
    let reference_orientations = frames.orientations(reference_joint)?;

    // fail on missing target channels before doing any work
    for joint in &config.target_joints {
        frames.positions(joint)?;
        frames.orientations(joint)?;
    }

    debug!(
        frames = frames.len(),
        reference = reference_joint,
        targets = config.target_joints.len(),
        "computing body-relative transform"
    );

    let heading = correction_rotations(reference_orientations, &config.coordinate_system)
        .map_err(|e| e.for_joint(reference_joint))?;
    if heading.degenerate_frames > 0 {
        warn!(
            reference = reference_joint,
            count = heading.degenerate_frames,
            "viewing direction parallel to up axis, frames left missing"
        );
    }

    let matrices: Vec<_> = heading.corrections.iter().map(rotation_matrix).collect();
    let mut relative = FrameTable::new(frames.len(), frames.precision());

    for joint in &config.target_joints {
        let positions = frames
            .positions(joint)?
            .iter()
            .zip(reference_positions)
            .zip(&matrices)
            .map(|((p, origin), r)| r * (p - origin))
            .collect();
        relative.set_positions(joint, positions)?;

        let orientations = quaternion::compose_batch(&heading.corrections, frames.orientations(joint)?)
            .map_err(|e| e.for_joint(joint))?;
        relative.set_orientations(joint, orientations)?;
    }

    let reference = quaternion::compose_batch(&heading.corrections, &heading.reference)
        .map_err(|e| e.for_joint(reference_joint))?;
    relative.set_orientations(reference_joint, reference)?;

    relative.quantize();
    Ok(relative)
}
