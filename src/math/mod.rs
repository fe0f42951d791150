//! Mathematical utilities for kinematic features.
//!
//! This module provides:
//! - [`quaternion`]: normalization, composition, relative rotation, slerp
//! - [`interpolate`]: linear interpolation over a time axis

pub mod interpolate;
pub mod quaternion;

pub use interpolate::{fill_gaps, interp};
pub use quaternion::{
    compose, compose_batch, from_axis_angle, normalize, normalize_batch, relative_rotation,
    rotate_vector, rotation_matrix, ComponentOrder,
};
