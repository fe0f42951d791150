//! Kinematic Feature Library
//!
//! Turns multi-joint 6-DOF tracking recordings (position + orientation per
//! joint, sampled over time) into machine-learning-ready features.
//!
//! # Features
//!
//! - **Typed frames**: column tables `{joint}_pos_{xyz}` / `{joint}_rot_{wxyz}`
//!   validated once into per-joint channels
//! - **Body-relative transform**: positions and orientations re-expressed in a
//!   yaw-corrected frame attached to a reference joint
//! - **Temporal derivatives**: velocity and acceleration with segment-boundary
//!   and missing-data invalidation
//! - **Preprocessing**: resampling to a fixed frame rate, quaternion
//!   canonicalization, left/right controller repair
//!
//! # Quick Start
//!
//! ```
//! use kinematic_features::{
//!     to_body_relative, to_velocity, BodyRelativeConfig, ComponentOrder, CoordinateSystem,
//!     DerivativeConfig, FrameTable, Precision,
//! };
//!
//! let columns = vec![
//!     ("hmd_pos_x", vec![0.0, 0.0, 0.1]),
//!     ("hmd_pos_y", vec![1.7, 1.7, 1.7]),
//!     ("hmd_pos_z", vec![0.0, 0.1, 0.1]),
//!     ("hmd_rot_w", vec![1.0, 1.0, 1.0]),
//!     ("hmd_rot_x", vec![0.0, 0.0, 0.0]),
//!     ("hmd_rot_y", vec![0.0, 0.0, 0.0]),
//!     ("hmd_rot_z", vec![0.0, 0.0, 0.0]),
//!     ("right_hand_pos_x", vec![0.3, 0.3, 0.4]),
//!     ("right_hand_pos_y", vec![1.2, 1.3, 1.3]),
//!     ("right_hand_pos_z", vec![0.2, 0.3, 0.3]),
//!     ("right_hand_rot_w", vec![1.0, 1.0, 1.0]),
//!     ("right_hand_rot_x", vec![0.0, 0.0, 0.0]),
//!     ("right_hand_rot_y", vec![0.0, 0.0, 0.0]),
//!     ("right_hand_rot_z", vec![0.0, 0.0, 0.0]),
//! ];
//! let frames = FrameTable::from_columns(columns, Precision::Double)?;
//!
//! let config = BodyRelativeConfig::new(CoordinateSystem::unity())
//!     .with_reference_joint("hmd")
//!     .with_target_joints(["right_hand"]);
//! let relative = to_body_relative(&frames, &config)?;
//! let velocity = to_velocity(&relative, &DerivativeConfig::default())?;
//!
//! assert_eq!(velocity.len(), 3);
//! assert!(velocity
//!     .column_names(ComponentOrder::Wxyz)
//!     .contains(&"delta_right_hand_pos_x".to_string()));
//! # Ok::<(), kinematic_features::FeatureError>(())
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod body_relative;
pub mod canonicalize;
pub mod config;
pub mod controller_mapping;
pub mod derivative;
pub mod error;
pub mod frames;
pub mod math;
pub mod resample;

// Re-exports for convenient access
pub use body_relative::{correction_rotations, to_body_relative, HeadingCorrection};
pub use canonicalize::{canonicalize_quaternions, canonicalize_quaternions_in_place};
pub use config::{Axis, BodyRelativeConfig, CoordinateSystem, DerivativeConfig};
pub use controller_mapping::{
    controllers_swapped, fix_controller_mapping, fix_controller_mapping_in_place,
};
pub use derivative::{
    to_acceleration, to_acceleration_in_place, to_velocity, to_velocity_in_place, DELTA_PREFIX,
};
pub use error::{FeatureError, Result};
pub use frames::{FrameTable, JointChannels, Precision};
pub use math::quaternion::ComponentOrder;
pub use resample::{resample, ResampledFrames};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
