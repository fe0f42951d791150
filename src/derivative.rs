//! Temporal derivatives of position and orientation channels.
//!
//! Velocity at frame `i` is taken between frames `i - step` and `i`:
//!
//! - positions: `p[i] - p[i - step]`, so `p[i - step] + v[i] == p[i]`
//! - orientations: `q[i - step]⁻¹ ⊗ q[i]`, so `q[i - step] ⊗ dq[i] == q[i]`
//!
//! A delta is missing (`NaN`) when the row lies within `step` frames of the
//! table start or of a segment boundary, or when either source sample is
//! missing. Acceleration applies the same engine to the velocities, which
//! widens every missing window by another `step`.
//!
//! Output joints carry the [`DELTA_PREFIX`], so `J_pos_x` becomes
//! `delta_J_pos_x` and its acceleration `delta_delta_J_pos_x`.

use nalgebra::{Quaternion, Vector3};
use tracing::debug;

use crate::config::DerivativeConfig;
use crate::error::{FeatureError, Result};
use crate::frames::{FrameTable, JointChannels};
use crate::math::quaternion::{self, relative_rotation};

/// Prefix marking a derivative channel.
pub const DELTA_PREFIX: &str = "delta_";

fn missing_position() -> Vector3<f64> {
    Vector3::repeat(f64::NAN)
}

fn check_mask(len: usize, invalid: &[bool]) -> Result<()> {
    if invalid.len() == len {
        Ok(())
    } else {
        Err(FeatureError::length_mismatch("boundary mask", len, invalid.len()))
    }
}

/// Position deltas `p[i] - p[i - step]`.
///
/// `invalid` flags rows inside a boundary window; see
/// [`DerivativeConfig::boundary_mask`].
///
/// # Errors
///
/// Returns [`FeatureError::LengthMismatch`] if `invalid` and `positions`
/// differ in length.
pub fn position_deltas(
    positions: &[Vector3<f64>],
    step: usize,
    invalid: &[bool],
) -> Result<Vec<Vector3<f64>>> {
    check_mask(positions.len(), invalid)?;
    Ok(positions
        .iter()
        .enumerate()
        .map(|(i, current)| match i.checked_sub(step) {
            Some(prev) if !invalid[i] => current - positions[prev],
            _ => missing_position(),
        })
        .collect())
}

/// Orientation deltas `q[i - step]⁻¹ ⊗ q[i]`.
///
/// # Errors
///
/// Returns [`FeatureError::DegenerateInput`] for the first zero-norm
/// orientation. The joint name is left empty for the caller to fill.
/// Returns [`FeatureError::LengthMismatch`] if `invalid` and `orientations`
/// differ in length.
pub fn orientation_deltas(
    orientations: &[Quaternion<f64>],
    step: usize,
    invalid: &[bool],
) -> Result<Vec<Quaternion<f64>>> {
    check_mask(orientations.len(), invalid)?;
    if let Some(row) = orientations.iter().position(|q| q.norm() == 0.0) {
        return Err(FeatureError::degenerate_input("", row));
    }

    Ok(orientations
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let Some(prev) = i.checked_sub(step) else {
                return quaternion::missing();
            };
            let previous = &orientations[prev];
            if invalid[i] || quaternion::is_missing(previous) || quaternion::is_missing(current) {
                return quaternion::missing();
            }
            relative_rotation(previous, current).unwrap_or_else(quaternion::missing)
        })
        .collect())
}

/// Compute velocities, returning a new table.
///
/// Every channel of `frames` is differentiated; the result has the same row
/// count and only derivative channels.
///
/// # Errors
///
/// - [`FeatureError::Configuration`] for a zero step or out-of-range change index
/// - [`FeatureError::DegenerateInput`] for a zero-norm orientation
///
/// # Example
///
/// ```
/// use kinematic_features::{to_velocity, DerivativeConfig, FrameTable, Precision};
///
/// let frames = FrameTable::from_columns(
///     vec![
///         ("hand_pos_x", vec![0.0, 1.0, 3.0]),
///         ("hand_pos_y", vec![0.0, 0.0, 0.0]),
///         ("hand_pos_z", vec![0.0, 0.5, 0.5]),
///     ],
///     Precision::Double,
/// )?;
///
/// let velocity = to_velocity(&frames, &DerivativeConfig::default())?;
/// let dx = velocity.column("delta_hand_pos_x").unwrap();
/// assert!(dx[0].is_nan());
/// assert_eq!(&dx[1..], &[1.0, 2.0]);
/// # Ok::<(), kinematic_features::FeatureError>(())
/// ```
pub fn to_velocity(frames: &FrameTable, config: &DerivativeConfig) -> Result<FrameTable> {
    let mut velocities = frames.clone();
    to_velocity_in_place(&mut velocities, config)?;
    Ok(velocities)
}

/// Compute velocities, overwriting the channels of `frames`.
///
/// On error the table is left unchanged.
///
/// # Errors
///
/// See [`to_velocity`].
pub fn to_velocity_in_place(frames: &mut FrameTable, config: &DerivativeConfig) -> Result<()> {
    config.validate(frames.len())?;

    let step = config.step;
    let invalid = config.boundary_mask(frames.len());

    debug!(
        frames = frames.len(),
        joints = frames.joint_names().count(),
        step,
        segments = config.change_indices.len(),
        "computing temporal derivatives"
    );

    let deltas = frames
        .joints()
        .map(|(joint, channels)| -> Result<JointChannels> {
            Ok(JointChannels {
                positions: channels
                    .positions
                    .as_deref()
                    .map(|ps| position_deltas(ps, step, &invalid))
                    .transpose()?,
                orientations: channels
                    .orientations
                    .as_deref()
                    .map(|qs| orientation_deltas(qs, step, &invalid))
                    .transpose()
                    .map_err(|e| e.for_joint(joint))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for ((_, channels), delta) in frames.joints_mut().zip(deltas) {
        *channels = delta;
    }
    frames.prefix_joints(DELTA_PREFIX);
    frames.quantize();
    Ok(())
}

/// Compute accelerations (the velocity of the velocity), returning a new table.
///
/// # Errors
///
/// See [`to_velocity`].
pub fn to_acceleration(frames: &FrameTable, config: &DerivativeConfig) -> Result<FrameTable> {
    let mut accelerations = to_velocity(frames, config)?;
    to_velocity_in_place(&mut accelerations, config)?;
    Ok(accelerations)
}

/// Compute accelerations, overwriting the channels of `frames`.
///
/// # Errors
///
/// See [`to_velocity`].
pub fn to_acceleration_in_place(frames: &mut FrameTable, config: &DerivativeConfig) -> Result<()> {
    let mut velocities = to_velocity(frames, config)?;
    to_velocity_in_place(&mut velocities, config)?;
    *frames = velocities;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Precision;
    use crate::math::quaternion::{compose, from_axis_angle};
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> Vec<Vector3<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                Vector3::new(t, t * t, -2.0 * t)
            })
            .collect()
    }

    #[test]
    fn test_position_deltas() {
        let positions = ramp(5);
        let invalid = DerivativeConfig::default().boundary_mask(5);
        let deltas = position_deltas(&positions, 1, &invalid).unwrap();

        assert!(deltas[0].iter().all(|v| v.is_nan()));
        for i in 1..5 {
            assert_relative_eq!(positions[i - 1] + deltas[i], positions[i]);
        }
    }

    #[test]
    fn test_position_deltas_step_two() {
        let positions = ramp(6);
        let config = DerivativeConfig::new().with_step(2);
        let deltas = position_deltas(&positions, 2, &config.boundary_mask(6)).unwrap();

        assert!(deltas[0].x.is_nan());
        assert!(deltas[1].x.is_nan());
        assert_relative_eq!(deltas[4], positions[4] - positions[2]);
    }

    #[test]
    fn test_orientation_deltas_reproduce_next_frame() {
        let orientations: Vec<_> = (0..6)
            .map(|i| from_axis_angle(&Vector3::new(0.1 * i as f64, -0.05, 0.2 * i as f64)))
            .collect();
        let invalid = DerivativeConfig::default().boundary_mask(6);
        let deltas = orientation_deltas(&orientations, 1, &invalid).unwrap();

        assert!(quaternion::is_missing(&deltas[0]));
        for i in 1..6 {
            let rebuilt = compose(&orientations[i - 1], &deltas[i]).unwrap();
            assert!(quaternion::angle_between(&rebuilt, &orientations[i]) < 1e-9);
        }
    }

    #[test]
    fn test_missing_orientation_invalidates_both_endpoints() {
        let mut orientations = vec![Quaternion::identity(); 6];
        orientations[2] = quaternion::missing();
        let invalid = DerivativeConfig::default().boundary_mask(6);
        let deltas = orientation_deltas(&orientations, 1, &invalid).unwrap();

        let missing: Vec<bool> = deltas.iter().map(quaternion::is_missing).collect();
        assert_eq!(missing, vec![true, false, true, true, false, false]);
    }

    #[test]
    fn test_short_mask_rejected() {
        let invalid = DerivativeConfig::default().boundary_mask(3);

        assert_eq!(
            position_deltas(&ramp(5), 1, &invalid).unwrap_err(),
            FeatureError::length_mismatch("boundary mask", 5, 3)
        );
        assert_eq!(
            orientation_deltas(&[Quaternion::identity(); 5], 1, &invalid).unwrap_err(),
            FeatureError::length_mismatch("boundary mask", 5, 3)
        );
    }

    #[test]
    fn test_zero_norm_orientation_fails() {
        let mut frames = FrameTable::new(3, Precision::Double);
        frames
            .set_orientations(
                "hmd",
                vec![
                    Quaternion::identity(),
                    Quaternion::new(0.0, 0.0, 0.0, 0.0),
                    Quaternion::identity(),
                ],
            )
            .unwrap();
        let before = frames.clone();

        let err = to_velocity_in_place(&mut frames, &DerivativeConfig::default()).unwrap_err();
        assert_eq!(err, FeatureError::degenerate_input("hmd", 1));
        assert_eq!(frames, before);
    }

    #[test]
    fn test_in_place_matches_copy() {
        let mut frames = FrameTable::new(4, Precision::Double);
        frames.set_positions("hand", ramp(4)).unwrap();
        let config = DerivativeConfig::default();

        let copied = to_velocity(&frames, &config).unwrap();
        to_velocity_in_place(&mut frames, &config).unwrap();

        assert_eq!(
            frames.column_names(crate::ComponentOrder::Wxyz),
            vec!["delta_hand_pos_x", "delta_hand_pos_y", "delta_hand_pos_z"]
        );
        let a = frames.column("delta_hand_pos_y").unwrap();
        let b = copied.column("delta_hand_pos_y").unwrap();
        assert!(a[0].is_nan() && b[0].is_nan());
        assert_eq!(a[1..], b[1..]);
    }

    #[test]
    fn test_acceleration_of_quadratic_is_constant() {
        let mut frames = FrameTable::new(6, Precision::Double);
        frames.set_positions("hand", ramp(6)).unwrap();

        let acceleration = to_acceleration(&frames, &DerivativeConfig::default()).unwrap();
        let ay = acceleration.column("delta_delta_hand_pos_y").unwrap();

        assert!(ay[0].is_nan());
        assert!(ay[1].is_nan());
        for v in &ay[2..] {
            assert_relative_eq!(*v, 2.0);
        }

        let mut in_place = frames.clone();
        to_acceleration_in_place(&mut in_place, &DerivativeConfig::default()).unwrap();
        assert_eq!(in_place.column("delta_delta_hand_pos_y").unwrap()[2..], ay[2..]);
    }
}
