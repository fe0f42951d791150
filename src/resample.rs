//! Resampling of recordings to a uniform frame rate.
//!
//! Tracking devices deliver frames at irregular intervals. Before differencing,
//! recordings are resampled onto a uniform time grid: positions by linear
//! interpolation, orientations by spherical linear interpolation.

use nalgebra::{Quaternion, Vector3};
use tracing::debug;

use crate::error::{FeatureError, Result};
use crate::frames::{position_column, rotation_column, FrameTable};
use crate::math::interpolate::{fill_gaps, interp};
use crate::math::quaternion::{self, slerp};

/// A resampled recording and its uniform time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledFrames {
    /// Timestamp of every output frame in milliseconds.
    pub timestamps_ms: Vec<f64>,

    /// Resampled channels of the requested joints.
    pub frames: FrameTable,
}

/// Uniform grid `start, start + step, ...` strictly below `end`.
#[must_use]
pub fn uniform_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    (0..)
        .map(|k| start + f64::from(k) * step)
        .take_while(|&t| t < end)
        .collect()
}

fn validate_timestamps(timestamps_ms: &[f64], len: usize) -> Result<()> {
    if timestamps_ms.len() != len {
        return Err(FeatureError::length_mismatch("timestamp", len, timestamps_ms.len()));
    }
    if len < 2 {
        return Err(FeatureError::invalid_input(format!(
            "resampling needs at least 2 frames, got {len}"
        )));
    }
    if let Some(index) = timestamps_ms
        .windows(2)
        .position(|w| !(w[1] > w[0]))
    {
        return Err(FeatureError::invalid_input(format!(
            "timestamps must be strictly increasing at index {}",
            index + 1
        )));
    }
    Ok(())
}

fn resample_positions(
    joint: &str,
    positions: &[Vector3<f64>],
    times: &[f64],
    grid: &[f64],
) -> Result<Vec<Vector3<f64>>> {
    let mut axes = Vec::with_capacity(3);
    for (axis, label) in ['x', 'y', 'z'].into_iter().enumerate() {
        let values: Vec<f64> = positions.iter().map(|p| p[axis]).collect();
        if values.iter().all(|v| v.is_nan()) {
            return Err(FeatureError::invalid_input(format!(
                "column {} has no valid samples",
                position_column(joint, label)
            )));
        }
        let filled = fill_gaps(times, &values);
        axes.push(grid.iter().map(|&t| interp(t, times, &filled)).collect::<Vec<_>>());
    }
    Ok((0..grid.len())
        .map(|i| Vector3::new(axes[0][i], axes[1][i], axes[2][i]))
        .collect())
}

fn resample_orientations(
    joint: &str,
    orientations: &[Quaternion<f64>],
    times: &[f64],
    grid: &[f64],
) -> Result<Vec<Quaternion<f64>>> {
    let mut valid_t = Vec::new();
    let mut valid_q = Vec::new();
    for (row, (q, &t)) in orientations.iter().zip(times).enumerate() {
        if quaternion::is_missing(q) {
            continue;
        }
        let unit = quaternion::normalize(q).ok_or_else(|| FeatureError::degenerate_input(joint, row))?;
        valid_t.push(t);
        valid_q.push(unit);
    }
    if valid_q.len() < 2 {
        return Err(FeatureError::invalid_input(format!(
            "column {} needs at least 2 valid samples, got {}",
            rotation_column(joint, 'w'),
            valid_q.len()
        )));
    }

    let last = valid_t.len() - 1;
    Ok(grid
        .iter()
        .map(|&t| {
            if t <= valid_t[0] {
                return valid_q[0];
            }
            if t >= valid_t[last] {
                return valid_q[last];
            }
            let hi = valid_t.partition_point(|&v| v <= t);
            let lo = hi - 1;
            let alpha = (t - valid_t[lo]) / (valid_t[hi] - valid_t[lo]);
            slerp(&valid_q[lo], &valid_q[hi], alpha)
        })
        .collect())
}

/// Resample the named joints to `target_fps` frames per second.
///
/// The output grid starts at the first timestamp and advances by
/// `1000 / target_fps` milliseconds while staying strictly below the last one.
/// Interior gaps in position channels are filled by time interpolation first;
/// missing orientations are skipped. Only the named joints are kept.
///
/// # Errors
///
/// - [`FeatureError::Configuration`] for a non-positive or non-finite rate
/// - [`FeatureError::InvalidInput`] for fewer than 2 frames, non-increasing
///   timestamps, or a channel without enough valid samples
/// - [`FeatureError::LengthMismatch`] if `timestamps_ms` and the table differ in length
/// - [`FeatureError::ColumnNotFound`] if a joint lacks position or orientation channels
pub fn resample(
    frames: &FrameTable,
    timestamps_ms: &[f64],
    target_fps: f64,
    joints: &[impl AsRef<str>],
) -> Result<ResampledFrames> {
    if !(target_fps.is_finite() && target_fps > 0.0) {
        return Err(FeatureError::configuration(format!(
            "target fps must be positive, got {target_fps}"
        )));
    }
    validate_timestamps(timestamps_ms, frames.len())?;

    let start = timestamps_ms[0];
    let end = timestamps_ms[timestamps_ms.len() - 1];
    let grid = uniform_grid(start, end, 1000.0 / target_fps);

    debug!(
        input_frames = frames.len(),
        output_frames = grid.len(),
        target_fps,
        "resampling recording"
    );

    let mut resampled = FrameTable::new(grid.len(), frames.precision());
    for joint in joints {
        let joint = joint.as_ref();
        let positions = resample_positions(joint, frames.positions(joint)?, timestamps_ms, &grid)?;
        let orientations =
            resample_orientations(joint, frames.orientations(joint)?, timestamps_ms, &grid)?;
        resampled.set_positions(joint, positions)?;
        resampled.set_orientations(joint, orientations)?;
    }
    resampled.quantize();

    Ok(ResampledFrames {
        timestamps_ms: grid,
        frames: resampled,
    })
}
