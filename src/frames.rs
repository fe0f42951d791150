//! Typed table of per-frame joint poses.
//!
//! A recording arrives as named columns following the schema
//! `{joint}_pos_{x|y|z}` and `{joint}_rot_{w|x|y|z}`. [`FrameTable::from_columns`]
//! validates the schema once and groups the columns into per-joint
//! [`JointChannels`]; every operation in the crate works on this structure.
//!
//! Rows are frames in time-ascending order. A missing sample is `NaN`.

use half::f16;
use nalgebra::{Quaternion, Vector3};

use crate::error::{FeatureError, Result};
use crate::math::quaternion::ComponentOrder;

/// Column infix marking a position channel.
pub const POSITION_INFIX: &str = "_pos_";

/// Column infix marking an orientation channel.
pub const ROTATION_INFIX: &str = "_rot_";

const POSITION_LABELS: [char; 3] = ['x', 'y', 'z'];
const ROTATION_LABELS: [char; 4] = ['w', 'x', 'y', 'z'];

/// Floating-point precision of the source data.
///
/// All computation runs in `f64`; results are rounded to this precision
/// before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Precision {
    /// IEEE 754 binary16.
    Half,
    /// IEEE 754 binary32.
    Single,
    /// IEEE 754 binary64.
    #[default]
    Double,
}

impl Precision {
    /// Round a value to this precision. `NaN` stays `NaN`.
    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn round(self, v: f64) -> f64 {
        match self {
            Self::Half => f16::from_f64(v).to_f64(),
            Self::Single => f64::from(v as f32),
            Self::Double => v,
        }
    }
}

/// Position and orientation channels of a single joint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointChannels {
    /// Positions, one per frame.
    pub positions: Option<Vec<Vector3<f64>>>,

    /// Orientations, one per frame.
    pub orientations: Option<Vec<Quaternion<f64>>>,
}

/// Row-ordered table of joint poses.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    len: usize,
    precision: Precision,
    joints: Vec<(String, JointChannels)>,
}

/// Name of a position column.
#[must_use]
pub fn position_column(joint: &str, axis: char) -> String {
    format!("{joint}{POSITION_INFIX}{axis}")
}

/// Name of an orientation column.
#[must_use]
pub fn rotation_column(joint: &str, component: char) -> String {
    format!("{joint}{ROTATION_INFIX}{component}")
}

#[derive(Clone, Copy)]
enum ChannelKind {
    Position(usize),
    Rotation(usize),
}

/// Split a column name into joint name and channel.
fn parse_column(name: &str) -> Option<(&str, ChannelKind)> {
    let (joint, rest) = name.rsplit_once('_')?;
    let mut chars = rest.chars();
    let component = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let (joint, kind) = if let Some(joint) = joint.strip_suffix("_pos") {
        let idx = POSITION_LABELS.iter().position(|&c| c == component)?;
        (joint, ChannelKind::Position(idx))
    } else if let Some(joint) = joint.strip_suffix("_rot") {
        let idx = ROTATION_LABELS.iter().position(|&c| c == component)?;
        (joint, ChannelKind::Rotation(idx))
    } else {
        return None;
    };
    (!joint.is_empty()).then_some((joint, kind))
}

#[derive(Default)]
struct PendingJoint {
    positions: [Option<Vec<f64>>; 3],
    rotations: [Option<Vec<f64>>; 4],
}

impl FrameTable {
    /// Create an empty table with `len` frames.
    #[must_use]
    pub const fn new(len: usize, precision: Precision) -> Self {
        Self {
            len,
            precision,
            joints: Vec::new(),
        }
    }

    /// Parse and validate named columns.
    ///
    /// Channel groups must be complete: if any `{joint}_pos_*` column is
    /// present, all three must be; likewise for the four `{joint}_rot_*`
    /// columns. Joints keep the order of their first column.
    ///
    /// # Errors
    ///
    /// - [`FeatureError::UnexpectedColumn`] for names outside the schema
    /// - [`FeatureError::DuplicateColumn`] for repeated names
    /// - [`FeatureError::LengthMismatch`] when column lengths differ
    /// - [`FeatureError::ColumnNotFound`] naming the first missing column of an
    ///   incomplete channel group
    pub fn from_columns<I, S>(columns: I, precision: Precision) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let mut pending: Vec<(String, PendingJoint)> = Vec::new();
        let mut len: Option<usize> = None;

        for (name, values) in columns {
            let name = name.as_ref();
            let (joint, kind) =
                parse_column(name).ok_or_else(|| FeatureError::unexpected_column(name))?;

            match len {
                Some(expected) if expected != values.len() => {
                    return Err(FeatureError::length_mismatch(name, expected, values.len()));
                }
                Some(_) => {}
                None => len = Some(values.len()),
            }

            let idx = match pending.iter().position(|(j, _)| j == joint) {
                Some(idx) => idx,
                None => {
                    pending.push((joint.to_string(), PendingJoint::default()));
                    pending.len() - 1
                }
            };
            let slot = match kind {
                ChannelKind::Position(i) => &mut pending[idx].1.positions[i],
                ChannelKind::Rotation(i) => &mut pending[idx].1.rotations[i],
            };
            if slot.is_some() {
                return Err(FeatureError::duplicate_column(name));
            }
            *slot = Some(values);
        }

        let mut table = Self::new(len.unwrap_or(0), precision);
        for (joint, columns) in pending {
            let channels = JointChannels {
                positions: assemble_positions(&joint, columns.positions)?,
                orientations: assemble_rotations(&joint, columns.rotations)?,
            };
            table.joints.push((joint, channels));
        }
        Ok(table)
    }

    /// Emit all channels as named columns.
    ///
    /// Per joint, positions come first (`x, y, z`) followed by orientations in
    /// the requested component order.
    #[must_use]
    pub fn to_columns(&self, order: ComponentOrder) -> Vec<(String, Vec<f64>)> {
        let mut columns = Vec::new();
        for (joint, channels) in &self.joints {
            if let Some(positions) = &channels.positions {
                for (axis, label) in POSITION_LABELS.iter().enumerate() {
                    columns.push((
                        position_column(joint, *label),
                        positions.iter().map(|p| p[axis]).collect(),
                    ));
                }
            }
            if let Some(orientations) = &channels.orientations {
                let arrays: Vec<[f64; 4]> =
                    orientations.iter().map(|q| order.to_array(q)).collect();
                for (c, label) in order.labels().iter().enumerate() {
                    columns.push((
                        rotation_column(joint, *label),
                        arrays.iter().map(|a| a[c]).collect(),
                    ));
                }
            }
        }
        columns
    }

    /// Column names in the order produced by [`Self::to_columns`].
    #[must_use]
    pub fn column_names(&self, order: ComponentOrder) -> Vec<String> {
        self.to_columns(order).into_iter().map(|(name, _)| name).collect()
    }

    /// Values of a single column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let (joint, kind) = parse_column(name)?;
        let channels = self.joint(joint)?;
        match kind {
            ChannelKind::Position(axis) => channels
                .positions
                .as_ref()
                .map(|ps| ps.iter().map(|p| p[axis]).collect()),
            ChannelKind::Rotation(c) => channels.orientations.as_ref().map(|qs| {
                qs.iter()
                    .map(|q| ComponentOrder::Wxyz.to_array(q)[c])
                    .collect()
            }),
        }
    }

    /// Number of frames.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the table has no frames.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Precision of the stored values.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Joint names in table order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|(name, _)| name.as_str())
    }

    /// Joints and their channels in table order.
    pub fn joints(&self) -> impl Iterator<Item = (&str, &JointChannels)> {
        self.joints.iter().map(|(name, ch)| (name.as_str(), ch))
    }

    /// Mutable access to every joint's channels.
    pub fn joints_mut(&mut self) -> impl Iterator<Item = (&str, &mut JointChannels)> {
        self.joints.iter_mut().map(|(name, ch)| (name.as_str(), ch))
    }

    /// Channels of a joint.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&JointChannels> {
        self.joints
            .iter()
            .find(|(joint, _)| joint == name)
            .map(|(_, ch)| ch)
    }

    fn joint_entry(&mut self, name: &str) -> &mut JointChannels {
        let idx = match self.joints.iter().position(|(joint, _)| joint == name) {
            Some(idx) => idx,
            None => {
                self.joints.push((name.to_string(), JointChannels::default()));
                self.joints.len() - 1
            }
        };
        &mut self.joints[idx].1
    }

    /// Positions of a joint.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::ColumnNotFound`] naming `{joint}_pos_x` when the
    /// joint has no position channels.
    pub fn positions(&self, joint: &str) -> Result<&[Vector3<f64>]> {
        self.joint(joint)
            .and_then(|ch| ch.positions.as_deref())
            .ok_or_else(|| FeatureError::column_not_found(position_column(joint, 'x')))
    }

    /// Orientations of a joint.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::ColumnNotFound`] naming `{joint}_rot_w` when the
    /// joint has no orientation channels.
    pub fn orientations(&self, joint: &str) -> Result<&[Quaternion<f64>]> {
        self.joint(joint)
            .and_then(|ch| ch.orientations.as_deref())
            .ok_or_else(|| FeatureError::column_not_found(rotation_column(joint, 'w')))
    }

    /// Add or replace a joint's positions.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::LengthMismatch`] if the series length differs
    /// from the table's.
    pub fn set_positions(&mut self, joint: &str, positions: Vec<Vector3<f64>>) -> Result<()> {
        self.check_len(&position_column(joint, 'x'), positions.len())?;
        self.joint_entry(joint).positions = Some(positions);
        Ok(())
    }

    /// Add or replace a joint's orientations.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::LengthMismatch`] if the series length differs
    /// from the table's.
    pub fn set_orientations(
        &mut self,
        joint: &str,
        orientations: Vec<Quaternion<f64>>,
    ) -> Result<()> {
        self.check_len(&rotation_column(joint, 'w'), orientations.len())?;
        self.joint_entry(joint).orientations = Some(orientations);
        Ok(())
    }

    fn check_len(&self, column: &str, actual: usize) -> Result<()> {
        if actual != self.len {
            return Err(FeatureError::length_mismatch(column, self.len, actual));
        }
        Ok(())
    }

    /// Table restricted to the named joints, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::ColumnNotFound`] for a joint without channels.
    pub fn select(&self, joints: &[impl AsRef<str>]) -> Result<Self> {
        let mut selected = Self::new(self.len, self.precision);
        for joint in joints {
            let joint = joint.as_ref();
            let channels = self
                .joint(joint)
                .ok_or_else(|| FeatureError::column_not_found(position_column(joint, 'x')))?;
            selected.joints.push((joint.to_string(), channels.clone()));
        }
        Ok(selected)
    }

    /// Prepend `prefix` to every joint name, and so to every column name.
    pub fn prefix_joints(&mut self, prefix: &str) {
        for (name, _) in &mut self.joints {
            name.insert_str(0, prefix);
        }
    }

    /// Exchange the channels of two joints, keeping names and order.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::ColumnNotFound`] if either joint is absent.
    pub fn swap_joints(&mut self, a: &str, b: &str) -> Result<()> {
        let find = |name: &str| {
            self.joints
                .iter()
                .position(|(joint, _)| joint == name)
                .ok_or_else(|| FeatureError::column_not_found(position_column(name, 'x')))
        };
        let (ia, ib) = (find(a)?, find(b)?);
        if ia != ib {
            let tmp = std::mem::take(&mut self.joints[ia].1);
            self.joints[ia].1 = std::mem::replace(&mut self.joints[ib].1, tmp);
        }
        Ok(())
    }

    /// Round every stored value to the table's precision.
    pub fn quantize(&mut self) {
        let precision = self.precision;
        if precision == Precision::Double {
            return;
        }
        for (_, channels) in &mut self.joints {
            if let Some(positions) = &mut channels.positions {
                for p in positions.iter_mut() {
                    p.apply(|v| *v = precision.round(*v));
                }
            }
            if let Some(orientations) = &mut channels.orientations {
                for q in orientations.iter_mut() {
                    q.coords.apply(|v| *v = precision.round(*v));
                }
            }
        }
    }
}

fn assemble_positions(
    joint: &str,
    columns: [Option<Vec<f64>>; 3],
) -> Result<Option<Vec<Vector3<f64>>>> {
    if columns.iter().all(Option::is_none) {
        return Ok(None);
    }
    let [x, y, z] = columns;
    let missing = |axis: char| FeatureError::column_not_found(position_column(joint, axis));
    let x = x.ok_or_else(|| missing('x'))?;
    let y = y.ok_or_else(|| missing('y'))?;
    let z = z.ok_or_else(|| missing('z'))?;
    Ok(Some(
        x.iter()
            .zip(&y)
            .zip(&z)
            .map(|((&x, &y), &z)| Vector3::new(x, y, z))
            .collect(),
    ))
}

fn assemble_rotations(
    joint: &str,
    columns: [Option<Vec<f64>>; 4],
) -> Result<Option<Vec<Quaternion<f64>>>> {
    if columns.iter().all(Option::is_none) {
        return Ok(None);
    }
    let [w, x, y, z] = columns;
    let missing = |c: char| FeatureError::column_not_found(rotation_column(joint, c));
    let w = w.ok_or_else(|| missing('w'))?;
    let x = x.ok_or_else(|| missing('x'))?;
    let y = y.ok_or_else(|| missing('y'))?;
    let z = z.ok_or_else(|| missing('z'))?;
    Ok(Some(
        w.iter()
            .zip(&x)
            .zip(&y)
            .zip(&z)
            .map(|(((&w, &x), &y), &z)| Quaternion::new(w, x, y, z))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hmd_columns() -> Vec<(String, Vec<f64>)> {
        vec![
            ("hmd_pos_x".to_string(), vec![1.0, 2.0]),
            ("hmd_pos_y".to_string(), vec![3.0, 4.0]),
            ("hmd_pos_z".to_string(), vec![5.0, 6.0]),
            ("hmd_rot_x".to_string(), vec![0.0, 0.0]),
            ("hmd_rot_y".to_string(), vec![0.0, 1.0]),
            ("hmd_rot_z".to_string(), vec![0.0, 0.0]),
            ("hmd_rot_w".to_string(), vec![1.0, 0.0]),
        ]
    }

    #[test]
    fn test_parse_column() {
        assert!(matches!(
            parse_column("left_hand_pos_y"),
            Some(("left_hand", ChannelKind::Position(1)))
        ));
        assert!(matches!(
            parse_column("delta_hmd_rot_w"),
            Some(("delta_hmd", ChannelKind::Rotation(0)))
        ));
        assert!(parse_column("timestamp").is_none());
        assert!(parse_column("_pos_x").is_none());
        assert!(parse_column("hmd_pos_w").is_none());
        assert!(parse_column("hmd_rot_xx").is_none());
    }

    #[test]
    fn test_from_columns_scalar_last_input() {
        let table = FrameTable::from_columns(hmd_columns(), Precision::Double).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.joint_names().collect::<Vec<_>>(), vec!["hmd"]);

        let positions = table.positions("hmd").unwrap();
        assert_relative_eq!(positions[1], Vector3::new(2.0, 4.0, 6.0));

        let orientations = table.orientations("hmd").unwrap();
        assert_eq!(orientations[0], Quaternion::identity());
        assert_relative_eq!(orientations[1].j, 1.0);
    }

    #[test]
    fn test_to_columns_order() {
        let table = FrameTable::from_columns(hmd_columns(), Precision::Double).unwrap();

        let names = table.column_names(ComponentOrder::Xyzw);
        assert_eq!(
            names,
            vec![
                "hmd_pos_x", "hmd_pos_y", "hmd_pos_z", "hmd_rot_x", "hmd_rot_y", "hmd_rot_z",
                "hmd_rot_w"
            ]
        );
        assert_eq!(table.column("hmd_rot_w"), Some(vec![1.0, 0.0]));
        assert_eq!(table.column("hmd_pos_z"), Some(vec![5.0, 6.0]));
        assert_eq!(table.column("head_pos_z"), None);
    }

    #[test]
    fn test_incomplete_group_names_missing_column() {
        let mut columns = hmd_columns();
        columns.retain(|(name, _)| name != "hmd_rot_z");

        let err = FrameTable::from_columns(columns, Precision::Double).unwrap_err();
        assert_eq!(err, FeatureError::column_not_found("hmd_rot_z"));
    }

    #[test]
    fn test_rejects_unexpected_and_duplicate_columns() {
        let mut columns = hmd_columns();
        columns.push(("timestamp".to_string(), vec![0.0, 1.0]));
        let err = FrameTable::from_columns(columns, Precision::Double).unwrap_err();
        assert_eq!(err, FeatureError::unexpected_column("timestamp"));

        let mut columns = hmd_columns();
        columns.push(("hmd_pos_x".to_string(), vec![0.0, 1.0]));
        let err = FrameTable::from_columns(columns, Precision::Double).unwrap_err();
        assert_eq!(err, FeatureError::duplicate_column("hmd_pos_x"));
    }

    #[test]
    fn test_length_mismatch() {
        let mut columns = hmd_columns();
        columns[2].1.push(7.0);
        let err = FrameTable::from_columns(columns, Precision::Double).unwrap_err();
        assert_eq!(err, FeatureError::length_mismatch("hmd_pos_z", 2, 3));
    }

    #[test]
    fn test_missing_joint_lookup() {
        let table = FrameTable::from_columns(hmd_columns(), Precision::Double).unwrap();
        assert_eq!(
            table.positions("head").unwrap_err(),
            FeatureError::column_not_found("head_pos_x")
        );
        assert_eq!(
            table.orientations("head").unwrap_err(),
            FeatureError::column_not_found("head_rot_w")
        );
    }

    #[test]
    fn test_prefix_and_swap() {
        let mut table = FrameTable::new(1, Precision::Double);
        table.set_positions("left", vec![Vector3::new(-1.0, 0.0, 0.0)]).unwrap();
        table.set_positions("right", vec![Vector3::new(1.0, 0.0, 0.0)]).unwrap();

        table.swap_joints("left", "right").unwrap();
        assert_relative_eq!(table.positions("left").unwrap()[0].x, 1.0);

        table.prefix_joints("delta_");
        assert_eq!(table.column("delta_right_pos_x"), Some(vec![-1.0]));
    }

    #[test]
    fn test_precision_rounding() {
        let v = 0.1_f64;
        assert_eq!(Precision::Double.round(v), v);
        assert_eq!(Precision::Single.round(v), f64::from(0.1_f32));
        assert!((Precision::Half.round(v) - v).abs() < 1e-3);
        assert!(Precision::Half.round(f64::NAN).is_nan());
    }
}
