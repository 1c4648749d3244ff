use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};

/// Yaw of a forward axis projected onto the XZ plane, `atan2(x, z)`.
///
/// 0 faces +Z, +PI/2 faces +X.
#[inline]
pub fn yaw_from_forward(forward: &Vector3<f32>) -> f32 {
    forward.x.atan2(forward.z)
}

/// Rotation about +Y only.
#[inline]
pub fn yaw_rotation(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

/// Wrap an angle into `[-PI, PI]`.
pub fn wrap_angle(mut a: f32) -> f32 {
    if !a.is_finite() {
        return 0.0;
    }
    a %= TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Planar (XZ) distance squared between two world positions (meters^2).
#[inline]
pub fn planar_distance_sq(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    let x = b.x - a.x;
    let z = b.y - a.y;
    x * x + z * z
}

/// XZ components of a world position.
#[inline]
pub fn to_planar(p: &Point3<f32>) -> Vector2<f32> {
    Vector2::new(p.x, p.z)
}

#[inline]
pub fn vec3(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}
