//! Configuration for kinematic feature extraction.
//!
//! This module provides the [`CoordinateSystem`] axis mapping along with the
//! option structs for the body-relative transform ([`BodyRelativeConfig`]) and
//! the temporal derivative engine ([`DerivativeConfig`]).
//!
//! # Example
//!
//! ```
//! use kinematic_features::{BodyRelativeConfig, CoordinateSystem};
//!
//! let config = BodyRelativeConfig::new(CoordinateSystem::unity())
//!     .with_reference_joint("hmd")
//!     .with_target_joints(["left_hand", "right_hand"]);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::error::{FeatureError, Result};

/// Default reference joint of the body-relative transform.
pub const DEFAULT_REFERENCE_JOINT: &str = "head";

/// A spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// First component.
    X,
    /// Second component.
    Y,
    /// Third component.
    Z,
}

impl Axis {
    /// Component index (`x = 0`, `y = 1`, `z = 2`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Unit vector along this axis.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }

    /// Lowercase axis label.
    #[must_use]
    pub const fn label(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Axis {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            other => Err(FeatureError::configuration(format!(
                "unknown axis '{other}', expected one of x, y, z"
            ))),
        }
    }
}

/// Assignment of the semantic directions to spatial axes.
///
/// The three roles must map to pairwise distinct axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinateSystem {
    /// Axis a joint looks along in its rest orientation.
    pub forward: Axis,
    /// Axis pointing to the joint's right.
    pub right: Axis,
    /// Vertical axis; the body-relative correction rotates about it.
    pub up: Axis,
}

impl CoordinateSystem {
    /// Create a mapping without validating it.
    #[must_use]
    pub const fn new(forward: Axis, right: Axis, up: Axis) -> Self {
        Self { forward, right, up }
    }

    /// Unity / common VR convention: forward `z`, right `x`, up `y`.
    #[must_use]
    pub const fn unity() -> Self {
        Self::new(Axis::Z, Axis::X, Axis::Y)
    }

    /// Z-up convention: forward `x`, right `y`, up `z`.
    #[must_use]
    pub const fn z_up() -> Self {
        Self::new(Axis::X, Axis::Y, Axis::Z)
    }

    /// Parse a `{forward, right, up} -> {x, y, z}` mapping.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Configuration`] on unknown roles or axes, a
    /// missing or repeated role, or a non-bijective mapping.
    pub fn from_mapping<'a, I>(mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut forward, mut right, mut up) = (None, None, None);
        for (role, axis) in mapping {
            let axis: Axis = axis.parse()?;
            let slot = match role.trim().to_ascii_lowercase().as_str() {
                "forward" => &mut forward,
                "right" => &mut right,
                "up" => &mut up,
                other => {
                    return Err(FeatureError::configuration(format!(
                        "unknown direction '{other}', expected forward, right or up"
                    )));
                }
            };
            if slot.replace(axis).is_some() {
                return Err(FeatureError::configuration(format!(
                    "direction '{role}' assigned twice"
                )));
            }
        }
        let require = |axis: Option<Axis>, role: &str| {
            axis.ok_or_else(|| FeatureError::configuration(format!("direction '{role}' missing")))
        };
        let system = Self::new(
            require(forward, "forward")?,
            require(right, "right")?,
            require(up, "up")?,
        );
        system.validate()?;
        Ok(system)
    }

    /// Check that the three roles use distinct axes.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Configuration`] if two roles share an axis.
    pub fn validate(&self) -> Result<()> {
        if self.forward == self.right || self.forward == self.up || self.right == self.up {
            return Err(FeatureError::configuration(format!(
                "axis mapping must be bijective, got forward={}, right={}, up={}",
                self.forward, self.right, self.up
            )));
        }
        Ok(())
    }

    /// `+1.0` if `forward × right = up`, `-1.0` if `forward × right = -up`.
    #[must_use]
    pub fn handedness(&self) -> f64 {
        let cross = self.forward.unit().cross(&self.right.unit());
        if cross.dot(&self.up.unit()) < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::unity()
    }
}

/// Options of the body-relative transform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyRelativeConfig {
    /// Axis mapping of the input data.
    pub coordinate_system: CoordinateSystem,

    /// Joint that defines origin and heading, typically the head / HMD.
    pub reference_joint: String,

    /// Joints whose positions and orientations are transformed, in output order.
    pub target_joints: Vec<String>,
}

impl Default for BodyRelativeConfig {
    fn default() -> Self {
        Self {
            coordinate_system: CoordinateSystem::default(),
            reference_joint: DEFAULT_REFERENCE_JOINT.to_string(),
            target_joints: Vec::new(),
        }
    }
}

impl BodyRelativeConfig {
    /// Create a configuration for the given axis mapping.
    #[must_use]
    pub fn new(coordinate_system: CoordinateSystem) -> Self {
        Self {
            coordinate_system,
            ..Self::default()
        }
    }

    /// Set the reference joint.
    #[must_use]
    pub fn with_reference_joint(mut self, joint: impl Into<String>) -> Self {
        self.reference_joint = joint.into();
        self
    }

    /// Set the target joints.
    #[must_use]
    pub fn with_target_joints<I, S>(mut self, joints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_joints = joints.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Configuration`] for a non-bijective axis mapping,
    /// an empty reference joint name, or a repeated target joint.
    pub fn validate(&self) -> Result<()> {
        self.coordinate_system.validate()?;
        if self.reference_joint.is_empty() {
            return Err(FeatureError::configuration("reference joint name is empty"));
        }
        let mut seen = BTreeSet::new();
        for joint in &self.target_joints {
            if !seen.insert(joint.as_str()) {
                return Err(FeatureError::configuration(format!(
                    "target joint '{joint}' listed twice"
                )));
            }
        }
        Ok(())
    }
}

/// Options of the temporal derivative engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivativeConfig {
    /// Frame distance between the two samples of a difference.
    pub step: usize,

    /// First rows of contiguous recording segments. Row 0 always starts one.
    pub change_indices: BTreeSet<usize>,
}

impl Default for DerivativeConfig {
    fn default() -> Self {
        Self {
            step: 1,
            change_indices: BTreeSet::from([0]),
        }
    }
}

impl DerivativeConfig {
    /// Create a configuration with step 1 and a single segment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame step.
    #[must_use]
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Set the segment boundaries. An empty set falls back to `{0}`.
    #[must_use]
    pub fn with_change_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.change_indices = indices.into_iter().collect();
        if self.change_indices.is_empty() {
            self.change_indices.insert(0);
        }
        self
    }

    /// Validate against a table of `len` frames.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Configuration`] if `step` is zero or a change
    /// index lies outside the table.
    pub fn validate(&self, len: usize) -> Result<()> {
        if self.step == 0 {
            return Err(FeatureError::configuration("step must be at least 1"));
        }
        if let Some(&index) = self.change_indices.iter().find(|&&i| i > 0 && i >= len) {
            return Err(FeatureError::configuration(format!(
                "change index {index} out of range for {len} frames"
            )));
        }
        Ok(())
    }

    /// Per-row flag: `true` where the derivative is undefined because the row
    /// lies within `step` frames of the table start or a segment boundary.
    #[must_use]
    pub fn boundary_mask(&self, len: usize) -> Vec<bool> {
        let mut invalid = vec![false; len];
        let starts = std::iter::once(0).chain(self.change_indices.iter().copied());
        for start in starts {
            for flag in invalid.iter_mut().skip(start).take(self.step) {
                *flag = true;
            }
        }
        invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BodyRelativeConfig::default();
        assert_eq!(config.reference_joint, "head");
        assert_eq!(config.coordinate_system, CoordinateSystem::unity());
        assert!(config.validate().is_ok());

        let derivative = DerivativeConfig::default();
        assert_eq!(derivative.step, 1);
        assert_eq!(derivative.change_indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!(" Z ".parse::<Axis>().unwrap(), Axis::Z);
        assert!("w".parse::<Axis>().is_err());
    }

    #[test]
    fn test_from_mapping() {
        let system =
            CoordinateSystem::from_mapping([("forward", "z"), ("right", "x"), ("up", "y")])
                .unwrap();
        assert_eq!(system, CoordinateSystem::unity());

        let err = CoordinateSystem::from_mapping([("forward", "z"), ("right", "z"), ("up", "y")]);
        assert!(matches!(err, Err(FeatureError::Configuration(_))));

        let err = CoordinateSystem::from_mapping([("forward", "z"), ("up", "y")]);
        assert!(matches!(err, Err(FeatureError::Configuration(_))));

        let err = CoordinateSystem::from_mapping([
            ("forward", "z"),
            ("forward", "x"),
            ("right", "x"),
            ("up", "y"),
        ]);
        assert!(matches!(err, Err(FeatureError::Configuration(_))));
    }

    #[test]
    fn test_validation_catches_shared_outer_axes() {
        // forward and up equal, right different
        let system = CoordinateSystem::new(Axis::Y, Axis::X, Axis::Y);
        assert!(system.validate().is_err());
    }

    #[test]
    fn test_handedness() {
        assert_eq!(CoordinateSystem::unity().handedness(), 1.0);
        assert_eq!(CoordinateSystem::z_up().handedness(), 1.0);
        assert_eq!(CoordinateSystem::new(Axis::X, Axis::Z, Axis::Y).handedness(), -1.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = BodyRelativeConfig::new(CoordinateSystem::z_up())
            .with_reference_joint("hmd")
            .with_target_joints(["left_hand", "right_hand"]);
        assert_eq!(config.reference_joint, "hmd");
        assert_eq!(config.target_joints, vec!["left_hand", "right_hand"]);

        let dup = config.clone().with_target_joints(["left_hand", "left_hand"]);
        assert!(dup.validate().is_err());

        let empty = config.with_reference_joint("");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_derivative_validation() {
        let config = DerivativeConfig::new().with_step(0);
        assert!(config.validate(10).is_err());

        let config = DerivativeConfig::new().with_change_indices([0, 12]);
        assert!(config.validate(10).is_err());
        assert!(config.validate(13).is_ok());

        let config = DerivativeConfig::new().with_change_indices(std::iter::empty());
        assert_eq!(config.change_indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_boundary_mask() {
        let config = DerivativeConfig::new().with_step(2).with_change_indices([0, 5]);
        let mask = config.boundary_mask(8);
        assert_eq!(
            mask,
            vec![true, true, false, false, false, true, true, false]
        );

        // windows near the end are clipped
        let config = DerivativeConfig::new().with_change_indices([4]);
        assert_eq!(config.boundary_mask(5), vec![true, false, false, false, true]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_coordinate_system_json() {
        let system: CoordinateSystem =
            serde_json::from_str(r#"{"forward":"z","right":"x","up":"y"}"#).unwrap();
        assert_eq!(system, CoordinateSystem::unity());
    }
}
