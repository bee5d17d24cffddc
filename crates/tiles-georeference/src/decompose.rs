//! Splitting linear transforms into rotation and scale.

use glam::{DMat3, DQuat, DVec3};

/// A rotation followed by a per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAndScale {
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl RotationAndScale {
    /// Recompose into `rotation * diag(scale)`.
    #[must_use]
    pub fn to_mat3(&self) -> DMat3 {
        DMat3::from_quat(self.rotation) * DMat3::from_diagonal(self.scale)
    }
}

/// Decompose `matrix` into a rotation and a per-axis scale.
///
/// Reflections are folded into a negative X scale. Shear is discarded.
#[must_use]
pub fn matrix_to_rotation_and_scale(matrix: DMat3) -> RotationAndScale {
    let mut scale = DVec3::new(
        matrix.x_axis.length(),
        matrix.y_axis.length(),
        matrix.z_axis.length(),
    );

    let mut x = matrix.x_axis / scale.x;
    let y = matrix.y_axis / scale.y;
    let z = matrix.z_axis / scale.z;

    if matrix.determinant() < 0.0 {
        x = -x;
        scale.x = -scale.x;
    }

    // Gram-Schmidt, so the quaternion comes from a proper rotation.
    let x = x.normalize();
    let y = (y - x * x.dot(y)).normalize();
    let z = (z - x * x.dot(z) - y * y.dot(z)).normalize();

    RotationAndScale {
        rotation: DQuat::from_mat3(&DMat3::from_cols(x, y, z)),
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_mat_close(a: DMat3, b: DMat3, tolerance: f64) {
        for i in 0..3 {
            let difference = (a.col(i) - b.col(i)).length();
            assert!(difference < tolerance, "column {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_identity() {
        let decomposed = matrix_to_rotation_and_scale(DMat3::IDENTITY);
        assert!(decomposed.rotation.angle_between(DQuat::IDENTITY) < 1e-12);
        assert_eq!(decomposed.scale, DVec3::ONE);
    }

    #[test]
    fn test_rotation_and_scale() {
        let rotation = DQuat::from_rotation_y(0.7) * DQuat::from_rotation_x(-0.3);
        let scale = DVec3::new(2.0, 0.5, 3.0);
        let matrix = DMat3::from_quat(rotation) * DMat3::from_diagonal(scale);

        let decomposed = matrix_to_rotation_and_scale(matrix);
        assert!(decomposed.rotation.angle_between(rotation) < 1e-12);
        assert!((decomposed.scale - scale).length() < 1e-12);
    }

    #[test]
    fn test_reflection_folds_into_x_scale() {
        // East, up, north axes swap Y and Z: a reflection.
        let matrix = DMat3::from_cols(DVec3::X, DVec3::Z, DVec3::Y);
        let decomposed = matrix_to_rotation_and_scale(matrix);

        assert!(decomposed.scale.x < 0.0);
        assert!((decomposed.rotation.length() - 1.0).abs() < 1e-12);
        assert_mat_close(decomposed.to_mat3(), matrix, 1e-12);
    }

    proptest! {
        #[test]
        fn prop_recompose(
            yaw in -3.1f64..3.1,
            pitch in -1.5f64..1.5,
            roll in -3.1f64..3.1,
            sx in 0.1f64..10.0,
            sy in 0.1f64..10.0,
            sz in 0.1f64..10.0,
            reflect in proptest::bool::ANY,
        ) {
            let rotation = DQuat::from_euler(glam::EulerRot::YXZ, yaw, pitch, roll);
            let mut matrix = DMat3::from_quat(rotation) * DMat3::from_diagonal(DVec3::new(sx, sy, sz));
            if reflect {
                matrix.z_axis = -matrix.z_axis;
            }

            let recomposed = matrix_to_rotation_and_scale(matrix).to_mat3();
            for i in 0..3 {
                prop_assert!((recomposed.col(i) - matrix.col(i)).length() < 1e-9);
            }
        }
    }
}
