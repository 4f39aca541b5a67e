use nalgebra::{DVector, Point3, UnitQuaternion, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// 3D point type
pub type Point3D = Point3<f64>;

/// 3D vector type
pub type Vector3D = Vector3<f64>;

/// End-effector orientation
pub type Orientation = UnitQuaternion<f64>;

/// Full assignment of values to every controllable joint of the robot
pub type Configuration = DVector<f64>;

/// End-effector pose in the model frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3D,
    pub orientation: Orientation,
}

impl Pose {
    pub fn new(position: Point3D, orientation: Orientation) -> Self {
        Self { position, orientation }
    }

    /// Pose at `position` with identity orientation
    pub fn from_position(position: Point3D) -> Self {
        Self::new(position, Orientation::identity())
    }

    /// Roll, pitch and yaw of the orientation
    pub fn rpy(&self) -> [f64; 3] {
        rpy(&self.orientation)
    }
}

/// Decompose an orientation into fixed-axis roll, pitch, yaw (X, then Y, then Z)
pub fn rpy(orientation: &Orientation) -> [f64; 3] {
    let (roll, pitch, yaw) = orientation.euler_angles();
    [roll, pitch, yaw]
}

/// Compose an orientation from roll, pitch, yaw
pub fn from_rpy(roll: f64, pitch: f64, yaw: f64) -> Orientation {
    Orientation::from_euler_angles(roll, pitch, yaw)
}

/// Signed difference `a - b` wrapped into `[-PI, PI]`
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let mut diff = (a - b) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    diff
}

/// Uniformly distributed random rotation
pub fn uniform_orientation<R: Rng + ?Sized>(rng: &mut R) -> Orientation {
    rng.gen()
}

/// Euclidean distance between two configurations
///
/// Configurations of different dimension are infinitely far apart.
pub fn configuration_distance(a: &Configuration, b: &Configuration) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    (a - b).norm()
}

/// Interpolate between two configurations, `t` in `[0, 1]`
pub fn interpolate(a: &Configuration, b: &Configuration, t: f64) -> Configuration {
    a + (b - a) * t
}
