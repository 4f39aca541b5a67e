// Workspace goal regions and the pose constraints sampled from them
use crate::geometry::{angle_difference, from_rpy, rpy, Orientation, Point3D, Pose};
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Whether an orientation axis may take any value or is held at the region's orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationAxis {
    Free,
    Fixed,
}

impl OrientationAxis {
    pub fn is_free(self) -> bool {
        self == OrientationAxis::Free
    }
}

/// Axis-aligned position box `[min.x, max.x] x [min.y, max.y] x [min.z, max.z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBounds {
    pub min: Point3D,
    pub max: Point3D,
}

impl PositionBounds {
    pub fn new(min: Point3D, max: Point3D) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        for axis in 0..3 {
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(Error::InvalidRegion(format!(
                    "non-finite bound on axis {}: [{}, {}]",
                    axis, lo, hi
                )));
            }
            if lo > hi {
                return Err(Error::InvalidRegion(format!(
                    "inverted bound on axis {}: [{}, {}]",
                    axis, lo, hi
                )));
            }
        }
        Ok(())
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &Point3D) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    pub fn centroid(&self) -> Point3D {
        nalgebra::center(&self.min, &self.max)
    }

    /// Euclidean distance from `point` to the box, zero inside
    pub fn distance_to(&self, point: &Point3D) -> f64 {
        let clamped = Point3D::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        );
        (point - clamped).norm()
    }

    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Point3D {
        Point3D::new(
            rng.gen_range(self.min.x..=self.max.x),
            rng.gen_range(self.min.y..=self.max.y),
            rng.gen_range(self.min.z..=self.max.z),
        )
    }
}

/// Cartesian goal region: a position box plus per-axis free/fixed orientation
///
/// Fixed axes are held at the corresponding roll/pitch/yaw of `orientation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceGoalRegion {
    pub bounds: PositionBounds,
    pub roll: OrientationAxis,
    pub pitch: OrientationAxis,
    pub yaw: OrientationAxis,
    #[serde(default = "Orientation::identity")]
    pub orientation: Orientation,
}

impl WorkspaceGoalRegion {
    /// Region with every orientation axis free
    pub fn new(bounds: PositionBounds) -> Self {
        Self {
            bounds,
            roll: OrientationAxis::Free,
            pitch: OrientationAxis::Free,
            yaw: OrientationAxis::Free,
            orientation: Orientation::identity(),
        }
    }

    /// Hold the given axes at the matching angles of `orientation`
    pub fn with_orientation(mut self, orientation: Orientation, axes: [OrientationAxis; 3]) -> Self {
        self.orientation = orientation;
        [self.roll, self.pitch, self.yaw] = axes;
        self
    }

    pub fn axes(&self) -> [OrientationAxis; 3] {
        [self.roll, self.pitch, self.yaw]
    }

    pub fn all_free(&self) -> bool {
        self.axes().iter().all(|a| a.is_free())
    }

    pub fn any_free(&self) -> bool {
        self.axes().iter().any(|a| a.is_free())
    }

    pub fn centroid(&self) -> Point3D {
        self.bounds.centroid()
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()
    }

    /// Largest wrapped deviation of `orientation` from this region on any fixed axis
    pub fn fixed_axis_error(&self, orientation: &Orientation) -> f64 {
        let target = rpy(&self.orientation);
        let actual = rpy(orientation);

        self.axes()
            .iter()
            .zip(target.iter().zip(actual.iter()))
            .filter(|(axis, _)| !axis.is_free())
            .map(|(_, (t, a))| angle_difference(*t, *a).abs())
            .fold(0.0, f64::max)
    }
}

/// Position + orientation target for the projector, refreshed every sampling iteration
#[derive(Debug, Clone, PartialEq)]
pub struct PoseConstraint {
    pub region_index: usize,
    pub position: Point3D,
    pub orientation: Orientation,
    pub position_tolerance: f64,
    pub orientation_tolerance: f64,
}

impl PoseConstraint {
    /// Initial constraint for a region: centroid position, region orientation
    pub fn from_region(
        region_index: usize,
        region: &WorkspaceGoalRegion,
        position_tolerance: f64,
        orientation_tolerance: f64,
    ) -> Self {
        Self {
            region_index,
            position: region.centroid(),
            orientation: region.orientation,
            position_tolerance,
            orientation_tolerance,
        }
    }

    /// Move the constraint to a freshly sampled pose.
    ///
    /// Free axes take the sampled angle, fixed axes keep the current one.
    /// With no free axis the orientation is left as is.
    pub fn refresh(&mut self, region: &WorkspaceGoalRegion, sampled: &Pose) {
        self.position = sampled.position;

        if !region.any_free() {
            return;
        }

        let sampled_rpy = sampled.rpy();
        let current_rpy = rpy(&self.orientation);
        let mut composed = [0.0; 3];
        for (i, axis) in region.axes().iter().enumerate() {
            composed[i] = if axis.is_free() { sampled_rpy[i] } else { current_rpy[i] };
        }
        self.orientation = from_rpy(composed[0], composed[1], composed[2]);
    }

    pub fn target(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// Whether `pose` meets the constraint within its tolerances.
    ///
    /// Orientation is compared through the relative rotation `target^-1 * actual`,
    /// each of its roll/pitch/yaw within `orientation_tolerance`.
    pub fn is_satisfied_by(&self, pose: &Pose) -> bool {
        if (pose.position - self.position).norm() > self.position_tolerance {
            return false;
        }
        let relative = self.orientation.inverse() * pose.orientation;
        rpy(&relative)
            .iter()
            .all(|angle| angle.abs() <= self.orientation_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn unit_box() -> PositionBounds {
        PositionBounds::new(Point3D::new(0.0, 0.0, 0.0), Point3D::new(1.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = PositionBounds::new(Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 1.0, 1.0));
        assert!(matches!(result, Err(Error::InvalidRegion(_))));
    }

    #[test]
    fn test_contains_and_distance() {
        let bounds = unit_box();
        assert!(bounds.contains(&Point3D::new(0.5, 0.5, 0.5)));
        assert!(bounds.contains(&Point3D::new(1.0, 0.0, 1.0)));
        assert!(!bounds.contains(&Point3D::new(1.5, 0.5, 0.5)));

        assert_eq!(bounds.distance_to(&Point3D::new(0.5, 0.5, 0.5)), 0.0);
        assert!((bounds.distance_to(&Point3D::new(2.0, 0.5, 0.5)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_samples_stay_in_box() {
        let bounds = unit_box();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(bounds.contains(&bounds.sample_uniform(&mut rng)));
        }
    }

    #[test]
    fn test_degenerate_box_samples_point() {
        let p = Point3D::new(0.2, 0.3, 0.4);
        let bounds = PositionBounds::new(p, p).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(bounds.sample_uniform(&mut rng), p);
    }

    #[test]
    fn test_refresh_keeps_fixed_axes() {
        use OrientationAxis::*;
        let region = WorkspaceGoalRegion::new(unit_box())
            .with_orientation(from_rpy(0.1, 0.2, 0.3), [Fixed, Free, Fixed]);
        let mut constraint = PoseConstraint::from_region(0, &region, 1e-3, 0.02);

        let sampled = Pose::new(Point3D::new(0.9, 0.1, 0.4), from_rpy(1.0, -0.7, 2.0));
        constraint.refresh(&region, &sampled);

        let [roll, pitch, yaw] = rpy(&constraint.orientation);
        assert_eq!(constraint.position, sampled.position);
        assert!((roll - 0.1).abs() < 1e-9);
        assert!((pitch + 0.7).abs() < 1e-9);
        assert!((yaw - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_without_free_axes_keeps_orientation() {
        use OrientationAxis::*;
        let orientation = from_rpy(0.4, 0.0, -0.2);
        let region = WorkspaceGoalRegion::new(unit_box()).with_orientation(orientation, [Fixed; 3]);
        let mut constraint = PoseConstraint::from_region(0, &region, 1e-3, 0.02);

        constraint.refresh(&region, &Pose::new(Point3D::new(0.5, 0.5, 0.5), from_rpy(2.0, 1.0, 0.5)));
        assert_eq!(constraint.orientation, orientation);
    }

    #[test]
    fn test_constraint_satisfaction() {
        let region = WorkspaceGoalRegion::new(unit_box());
        let constraint = PoseConstraint::from_region(0, &region, 1e-3, 0.02);

        assert!(constraint.is_satisfied_by(&constraint.target()));

        let off = Pose::new(constraint.position + nalgebra::Vector3::new(0.01, 0.0, 0.0), constraint.orientation);
        assert!(!constraint.is_satisfied_by(&off));

        let twisted = Pose::new(constraint.position, from_rpy(0.05, 0.0, 0.0));
        assert!(!constraint.is_satisfied_by(&twisted));
    }

    #[test]
    fn test_fixed_axis_error_ignores_free_axes() {
        use OrientationAxis::*;
        let region = WorkspaceGoalRegion::new(unit_box())
            .with_orientation(Orientation::identity(), [Fixed, Free, Free]);

        assert!(region.fixed_axis_error(&from_rpy(0.0, 1.0, 2.0)) < 1e-9);
        assert!((region.fixed_axis_error(&from_rpy(0.5, 0.0, 0.0)) - 0.5).abs() < 1e-9);
    }
}
