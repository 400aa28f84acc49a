//! Orientation basis extraction.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion};

/// Forward and up basis vectors of a car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub forward: [f32; 3],
    pub up: [f32; 3],
}

/// Rotation matrix for a `(w, x, y, z)` quaternion.
///
/// The quaternion is assumed to be unit length and is not renormalized. A
/// non-unit input yields a non-orthonormal matrix.
pub fn rotation_matrix(quaternion: [f32; 4]) -> Matrix3<f32> {
    let [w, x, y, z] = quaternion;
    let q = UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z));
    q.to_rotation_matrix().into_inner()
}

/// Forward basis is row 0 of the rotation matrix, up is row 2.
pub fn basis_from_quaternion(quaternion: [f32; 4]) -> Basis {
    let m = rotation_matrix(quaternion);
    Basis {
        forward: [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        up: [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    }
}
