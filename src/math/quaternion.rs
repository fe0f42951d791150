//! Quaternion algebra on `nalgebra::Quaternion<f64>`.
//!
//! Orientations are kept in nalgebra's representation everywhere inside the
//! crate. [`ComponentOrder`] is the single place where the `(w, x, y, z)` versus
//! `(x, y, z, w)` layout of external data is translated.
//!
//! A quaternion with any `NaN` component is a missing sample. Missing samples
//! pass through every operation as `NaN`; only a finite zero-norm quaternion
//! is treated as degenerate.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::error::{FeatureError, Result};

/// Threshold below which two orientations are considered identical for slerp.
pub const SLERP_EPS: f64 = 1e-9;

/// Component layout of a quaternion in external (column or array) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ComponentOrder {
    /// Scalar first: `(w, x, y, z)`.
    #[default]
    Wxyz,
    /// Scalar last: `(x, y, z, w)`.
    Xyzw,
}

impl ComponentOrder {
    /// Component labels in this order.
    #[must_use]
    pub const fn labels(self) -> [char; 4] {
        match self {
            Self::Wxyz => ['w', 'x', 'y', 'z'],
            Self::Xyzw => ['x', 'y', 'z', 'w'],
        }
    }

    /// Flatten a quaternion into an array in this order.
    #[must_use]
    pub fn to_array(self, q: &Quaternion<f64>) -> [f64; 4] {
        match self {
            Self::Wxyz => [q.w, q.i, q.j, q.k],
            Self::Xyzw => [q.i, q.j, q.k, q.w],
        }
    }

    /// Build a quaternion from an array in this order.
    #[must_use]
    pub fn from_array(self, a: [f64; 4]) -> Quaternion<f64> {
        match self {
            Self::Wxyz => Quaternion::new(a[0], a[1], a[2], a[3]),
            Self::Xyzw => Quaternion::new(a[3], a[0], a[1], a[2]),
        }
    }
}

/// A quaternion with every component set to `NaN`.
#[must_use]
pub fn missing() -> Quaternion<f64> {
    Quaternion::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
}

/// Whether any component is `NaN`.
#[must_use]
#[inline]
pub fn is_missing(q: &Quaternion<f64>) -> bool {
    q.coords.iter().any(|c| c.is_nan())
}

/// Divide by the Euclidean norm.
///
/// Returns `None` for a zero-norm quaternion. Missing input stays missing.
#[must_use]
pub fn normalize(q: &Quaternion<f64>) -> Option<Quaternion<f64>> {
    let norm = q.norm();
    if norm == 0.0 {
        return None;
    }
    Some(*q / norm)
}

/// Normalize every quaternion of a batch.
///
/// # Errors
///
/// Returns [`FeatureError::DegenerateInput`] with the offending row when a
/// quaternion has zero norm. The joint name is left empty for the caller to fill.
pub fn normalize_batch(qs: &[Quaternion<f64>]) -> Result<Vec<Quaternion<f64>>> {
    qs.iter()
        .enumerate()
        .map(|(row, q)| normalize(q).ok_or_else(|| FeatureError::degenerate_input("", row)))
        .collect()
}

/// Hamilton product `q1 ⊗ q2`, re-normalized.
///
/// Applying the result to a vector applies `q2` first, then `q1`.
#[must_use]
pub fn compose(q1: &Quaternion<f64>, q2: &Quaternion<f64>) -> Option<Quaternion<f64>> {
    normalize(&(*q1 * *q2))
}

/// Row-wise [`compose`] over two batches of equal length.
///
/// # Errors
///
/// Returns [`FeatureError::DegenerateInput`] when a product has zero norm, and
/// [`FeatureError::InvalidInput`] when the batches differ in length.
pub fn compose_batch(
    lhs: &[Quaternion<f64>],
    rhs: &[Quaternion<f64>],
) -> Result<Vec<Quaternion<f64>>> {
    if lhs.len() != rhs.len() {
        return Err(FeatureError::invalid_input(format!(
            "cannot compose {} quaternions with {}",
            lhs.len(),
            rhs.len()
        )));
    }
    lhs.iter()
        .zip(rhs)
        .enumerate()
        .map(|(row, (a, b))| compose(a, b).ok_or_else(|| FeatureError::degenerate_input("", row)))
        .collect()
}

/// Rotate a 3-vector by a unit quaternion.
#[must_use]
pub fn rotate_vector(q: &Quaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    UnitQuaternion::new_unchecked(*q) * *v
}

/// Rotation matrix of a unit quaternion.
#[must_use]
pub fn rotation_matrix(q: &Quaternion<f64>) -> Matrix3<f64> {
    UnitQuaternion::new_unchecked(*q)
        .to_rotation_matrix()
        .into_inner()
}

/// Build a quaternion from a rotation vector.
///
/// The direction of `axis_angle` is the rotation axis and its length the
/// angle in radians. A zero vector gives the identity, a `NaN` vector a missing
/// quaternion.
#[must_use]
pub fn from_axis_angle(axis_angle: &Vector3<f64>) -> Quaternion<f64> {
    let angle = axis_angle.norm();
    if angle == 0.0 {
        return Quaternion::identity();
    }
    let half = angle / 2.0;
    let axis = axis_angle / angle;
    Quaternion::from_parts(half.cos(), axis * half.sin())
}

/// The rotation `q_from⁻¹ ⊗ q_to` taking orientation `q_from` onto `q_to`.
///
/// `q_from ⊗ relative_rotation(q_from, q_to)` reproduces `q_to`.
#[must_use]
pub fn relative_rotation(q_from: &Quaternion<f64>, q_to: &Quaternion<f64>) -> Option<Quaternion<f64>> {
    let from = normalize(q_from)?;
    compose(&from.conjugate(), q_to)
}

/// Unit quaternion with non-negative scalar part describing the same rotation.
///
/// A scalar part of exactly zero keeps its sign.
#[must_use]
pub fn canonicalize(q: &Quaternion<f64>) -> Option<Quaternion<f64>> {
    let q = normalize(q)?;
    Some(if q.w < 0.0 { -q } else { q })
}

/// Spherical linear interpolation along the shortest arc.
///
/// Falls back to normalized linear interpolation when both orientations are
/// (numerically) identical.
#[must_use]
pub fn slerp(a: &Quaternion<f64>, b: &Quaternion<f64>, t: f64) -> Quaternion<f64> {
    let ua = UnitQuaternion::new_unchecked(*a);
    let ub = UnitQuaternion::new_unchecked(*b);
    match ua.try_slerp(&ub, t, SLERP_EPS) {
        Some(q) => q.into_inner(),
        None => {
            let b = if a.dot(b) < 0.0 { -*b } else { *b };
            let lerped = *a * (1.0 - t) + b * t;
            normalize(&lerped).unwrap_or(*a)
        }
    }
}

/// Angle in radians between two orientations, ignoring quaternion sign.
///
/// Taken from the half-angle of `a⁻¹ ⊗ b` via `atan2`, which stays exact for
/// nearly identical orientations where `acos` of the dot product does not.
#[must_use]
pub fn angle_between(a: &Quaternion<f64>, b: &Quaternion<f64>) -> f64 {
    let delta = a.conjugate() * *b;
    2.0 * delta.imag().norm().atan2(delta.w.abs())
}
