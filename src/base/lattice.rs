use nalgebra::base::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::error::GenError;

/// Lattice parameters `(a, b, c, alpha, beta, gamma)`. Lengths in Angstrom,
/// angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LatticeParams {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }
}

/// Which corner of the 3x3 matrix `para2matrix` leaves empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangularForm {
    /// **a** along x, **b** in the xy-plane; matrix is lower-triangular.
    Lower,
    /// **c** along z, **b** in the yz-plane; matrix is upper-triangular.
    Upper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Representing basis vectors of a lattice
pub struct Lattice {
    /// basis.column(i) is the i-th basis vector
    pub basis: Matrix3<f64>,
}

impl Lattice {
    /// Create a new lattice from row basis vectors (row i is the i-th lattice vector)
    pub fn new(row_basis: Matrix3<f64>) -> Self {
        Self {
            basis: row_basis.transpose(),
        }
    }

    /// Realize `(a, b, c, alpha, beta, gamma)` as a lattice matrix whose rows are
    /// the lattice vectors. Fails with `GenError::DomainError` when the
    /// parameters do not describe a realizable cell (a negative radicand under
    /// the triangular-form construction).
    pub fn from_params(params: LatticeParams, form: TriangularForm) -> Result<Self, GenError> {
        Ok(Self::new(para2matrix(params, form)?))
    }

    /// Inverse of `from_params`: recover `(a, b, c, alpha, beta, gamma)` from the
    /// row-basis matrix, independent of which triangular form produced it.
    pub fn to_params(&self) -> LatticeParams {
        matrix2para(&self.basis.transpose())
    }

    /// Return metric tensor of the basis vectors
    pub fn metric_tensor(&self) -> Matrix3<f64> {
        self.basis.transpose() * self.basis
    }

    /// Return cartesian coordinates from the given fractional coordinates
    pub fn cartesian_coords(&self, fractional_coords: &Vector3<f64>) -> Vector3<f64> {
        self.basis * fractional_coords
    }

    /// Return volume of the cell
    pub fn volume(&self) -> f64 {
        self.basis.determinant().abs()
    }

    /// Rotate the lattice by the given rotation matrix
    pub fn rotate(&self, rotation_matrix: &Matrix3<f64>) -> Self {
        Self {
            basis: rotation_matrix * self.basis,
        }
    }
}

/// Realize `(a, b, c, alpha, beta, gamma)` as a row-basis matrix (row i is the
/// i-th lattice vector). `Lower` aligns **a** along x and puts **b** in the
/// xy-plane; `Upper` aligns **c** along z and puts **b** in the yz-plane.
pub fn para2matrix(p: LatticeParams, form: TriangularForm) -> Result<Matrix3<f64>, GenError> {
    let mut matrix = Matrix3::<f64>::zeros();
    match form {
        TriangularForm::Lower => {
            let cos_alpha = p.alpha.cos();
            let cos_beta = p.beta.cos();
            let cos_gamma = p.gamma.cos();
            let sin_gamma = p.gamma.sin();

            let c1 = p.c * cos_beta;
            let c2 = p.c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
            let radicand = p.c * p.c - c1 * c1 - c2 * c2;
            if radicand < 0.0 {
                return Err(GenError::DomainError {
                    reason: format!(
                        "lattice parameters do not form a realizable cell (radicand {radicand} < 0)"
                    ),
                });
            }

            matrix[(0, 0)] = p.a;
            matrix[(1, 0)] = p.b * cos_gamma;
            matrix[(1, 1)] = p.b * sin_gamma;
            matrix[(2, 0)] = c1;
            matrix[(2, 1)] = c2;
            matrix[(2, 2)] = radicand.sqrt();
        }
        TriangularForm::Upper => {
            let cos_alpha = p.alpha.cos();
            let cos_beta = p.beta.cos();
            let cos_gamma = p.gamma.cos();
            let sin_alpha = p.alpha.sin();

            let a3 = p.a * cos_beta;
            let a2 = p.a * (cos_gamma - cos_beta * cos_alpha) / sin_alpha;
            let radicand = p.a * p.a - a3 * a3 - a2 * a2;
            if radicand < 0.0 {
                return Err(GenError::DomainError {
                    reason: format!(
                        "lattice parameters do not form a realizable cell (radicand {radicand} < 0)"
                    ),
                });
            }

            matrix[(2, 2)] = p.c;
            matrix[(1, 2)] = p.b * cos_alpha;
            matrix[(1, 1)] = p.b * sin_alpha;
            matrix[(0, 2)] = a3;
            matrix[(0, 1)] = a2;
            matrix[(0, 0)] = radicand.sqrt();
        }
    }
    Ok(matrix)
}

/// Recover `(a, b, c, alpha, beta, gamma)` from a row-basis matrix (row i is
/// the i-th lattice vector).
pub fn matrix2para(row_basis: &Matrix3<f64>) -> LatticeParams {
    let va = row_basis.row(0).transpose();
    let vb = row_basis.row(1).transpose();
    let vc = row_basis.row(2).transpose();

    let a = va.norm();
    let b = vb.norm();
    let c = vc.norm();
    let alpha = vector_angle(&vb, &vc);
    let beta = vector_angle(&va, &vc);
    let gamma = vector_angle(&va, &vb);

    LatticeParams::new(a, b, c, alpha, beta, gamma)
}

fn vector_angle(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let cos_angle = (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0);
    cos_angle.acos()
}

#[cfg(test)]
mod tests {
    use nalgebra::matrix;
    use std::f64::consts::PI;
    use test_log::test;

    use super::{para2matrix, Lattice, LatticeParams, TriangularForm};

    #[test]
    fn test_metric_tensor() {
        let lattice = Lattice::new(matrix![
            1.0, 1.0, 1.0;
            1.0, 1.0, 0.0;
            1.0, -1.0, 0.0;
        ]);
        let metric_tensor = lattice.metric_tensor();
        assert_relative_eq!(
            metric_tensor,
            matrix![
                3.0, 2.0, 0.0;
                2.0, 2.0, 0.0;
                0.0, 0.0, 2.0;
            ]
        );
    }

    #[test]
    fn test_para2matrix_cubic_volume() {
        let params = LatticeParams::new(2.0, 2.0, 2.0, PI / 2.0, PI / 2.0, PI / 2.0);
        let matrix = para2matrix(params, TriangularForm::Lower).unwrap();
        assert_relative_eq!(matrix.determinant().abs(), 8.0, epsilon = 1e-8);
    }

    #[test]
    fn test_para2matrix_domain_error() {
        // alpha, beta nearly antiparallel to gamma: forces a negative radicand.
        let params = LatticeParams::new(1.0, 1.0, 1.0, 0.01, 0.01, PI - 0.01);
        assert!(para2matrix(params, TriangularForm::Lower).is_err());
    }

    #[rstest::rstest]
    #[case(3.0, 4.0, 5.0, PI / 2.0, PI / 2.0, PI / 2.0)]
    #[case(2.0, 2.0, 3.0, PI / 2.0, PI / 2.0, 2.0 * PI / 3.0)]
    #[case(1.5, 2.5, 3.5, 1.3, 1.1, 1.0)]
    fn test_para_matrix_roundtrip(
        #[case] a: f64,
        #[case] b: f64,
        #[case] c: f64,
        #[case] alpha: f64,
        #[case] beta: f64,
        #[case] gamma: f64,
    ) {
        let params = LatticeParams::new(a, b, c, alpha, beta, gamma);
        let lattice = Lattice::from_params(params, TriangularForm::Lower).unwrap();
        let recovered = lattice.to_params();
        assert_relative_eq!(recovered.a, params.a, epsilon = crate::base::EPS);
        assert_relative_eq!(recovered.b, params.b, epsilon = crate::base::EPS);
        assert_relative_eq!(recovered.c, params.c, epsilon = crate::base::EPS);
        assert_relative_eq!(recovered.alpha, params.alpha, epsilon = crate::base::EPS);
        assert_relative_eq!(recovered.beta, params.beta, epsilon = crate::base::EPS);
        assert_relative_eq!(recovered.gamma, params.gamma, epsilon = crate::base::EPS);
    }
}
