//! Detection of swapped left/right controllers.
//!
//! Some recordings label the two hand controllers the wrong way round. In the
//! body-relative frame the left controller sits, on average, further left
//! along the `right` axis than the right controller. If that does not hold,
//! the two joints' channels are exchanged.

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::body_relative::to_body_relative;
use crate::config::BodyRelativeConfig;
use crate::error::Result;
use crate::frames::FrameTable;

/// Mean of the non-missing values, `NaN` if there are none.
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn mean_along(positions: &[Vector3<f64>], axis: usize) -> f64 {
    nan_mean(positions.iter().map(|p| p[axis]))
}

/// Whether the controllers `left` and `right` appear to be swapped.
///
/// Unless `is_body_relative` is set, the two controllers are first
/// transformed into the frame of `config.reference_joint`; the target joints of
/// `config` are ignored.
///
/// # Errors
///
/// Propagates errors from the body-relative transform or a missing joint.
pub fn controllers_swapped(
    frames: &FrameTable,
    left: &str,
    right: &str,
    config: &BodyRelativeConfig,
    is_body_relative: bool,
) -> Result<bool> {
    let axis = config.coordinate_system.right.index();
    let (left_mean, right_mean) = if is_body_relative {
        config.coordinate_system.validate()?;
        (
            mean_along(frames.positions(left)?, axis),
            mean_along(frames.positions(right)?, axis),
        )
    } else {
        let relative = to_body_relative(frames, &config.clone().with_target_joints([left, right]))?;
        (
            mean_along(relative.positions(left)?, axis),
            mean_along(relative.positions(right)?, axis),
        )
    };

    debug!(left, right, left_mean, right_mean, "compared controller sides");
    Ok(right_mean < left_mean)
}

/// Swap the channels of `left` and `right` in place if they appear swapped.
///
/// Returns whether a swap happened. Column names and order are kept; only the
/// data moves.
///
/// # Errors
///
/// See [`controllers_swapped`].
pub fn fix_controller_mapping_in_place(
    frames: &mut FrameTable,
    left: &str,
    right: &str,
    config: &BodyRelativeConfig,
    is_body_relative: bool,
) -> Result<bool> {
    let swapped = controllers_swapped(frames, left, right, config, is_body_relative)?;
    if swapped {
        info!(left, right, "controller mapping swapped");
        frames.swap_joints(left, right)?;
    }
    Ok(swapped)
}

/// Copying variant of [`fix_controller_mapping_in_place`].
///
/// # Errors
///
/// See [`controllers_swapped`].
pub fn fix_controller_mapping(
    frames: &FrameTable,
    left: &str,
    right: &str,
    config: &BodyRelativeConfig,
    is_body_relative: bool,
) -> Result<(FrameTable, bool)> {
    let mut fixed = frames.clone();
    let swapped = fix_controller_mapping_in_place(&mut fixed, left, right, config, is_body_relative)?;
    Ok((fixed, swapped))
}
