//! Geometry primitives: lattice-parameter conversions live in
//! [`crate::base::lattice`]; this module covers minimum-image distances
//! under periodic boundary conditions and the stochastic primitives the
//! lattice sampler and placement driver build on.

use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::Rng;

use crate::base::Lattice;

/// Minimum-image length of fractional displacement `v` under lattice `L`,
/// minimizing over the 27 images along the axes named in `pbc`. Axes not in
/// `pbc` are not replicated (the displacement is taken as given along them).
pub fn distance(v: &Vector3<f64>, lattice: &Lattice, pbc: [bool; 3]) -> f64 {
    let mut min_dist_sq = f64::INFINITY;
    for shift_a in shift_range(pbc[0]) {
        for shift_b in shift_range(pbc[1]) {
            for shift_c in shift_range(pbc[2]) {
                let shifted = v + Vector3::new(shift_a as f64, shift_b as f64, shift_c as f64);
                let cart = lattice.cartesian_coords(&shifted);
                let dist_sq = cart.norm_squared();
                if dist_sq < min_dist_sq {
                    min_dist_sq = dist_sq;
                }
            }
        }
    }
    min_dist_sq.sqrt()
}

pub(crate) fn shift_range(periodic: bool) -> std::ops::RangeInclusive<i32> {
    if periodic {
        -1..=1
    } else {
        0..=0
    }
}

/// Pairwise minimum-image distances between two fractional point sets.
pub fn distance_matrix(
    a: &[Vector3<f64>],
    b: &[Vector3<f64>],
    lattice: &Lattice,
    pbc: [bool; 3],
) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(a.len(), b.len());
    for (i, pa) in a.iter().enumerate() {
        for (j, pb) in b.iter().enumerate() {
            matrix[(i, j)] = distance(&(pb - pa), lattice, pbc);
        }
    }
    matrix
}

/// Sample a normal distribution centered at `(lo + hi) / 2` with standard
/// deviation `(hi - lo) / (2 * sigma)`, rejecting draws outside `(lo, hi)`.
/// Terminates with probability 1 since the acceptance region covers `sigma`
/// standard deviations on either side of the mean.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64, sigma: f64) -> f64 {
    let mean = (lo + hi) / 2.0;
    let std_dev = (hi - lo) / (2.0 * sigma);
    loop {
        let value = mean + std_dev * sample_standard_normal(rng);
        if value > lo && value < hi {
            return value;
        }
    }
}

/// Box-Muller transform of two independent uniforms into one standard normal
/// deviate.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Three independent uniforms in `(0, 1]`, used as ratio seeds for lattice
/// edge lengths.
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    Vector3::new(
        1.0 - rng.gen_range(0.0..1.0),
        1.0 - rng.gen_range(0.0..1.0),
        1.0 - rng.gen_range(0.0..1.0),
    )
}

/// Identity plus small uniform off-diagonal entries in `(-w, w)`, used to
/// seed triclinic lattices.
pub fn random_shear_matrix<R: Rng + ?Sized>(rng: &mut R, w: f64) -> Matrix3<f64> {
    let mut m = Matrix3::<f64>::identity();
    for i in 0..3 {
        for j in 0..3 {
            if i != j {
                m[(i, j)] += rng.gen_range(-w..w);
            }
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use nalgebra::matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;

    #[test]
    fn test_distance_periodic_wraps_around() {
        let lattice = Lattice::new(Matrix3::<f64>::identity());
        // 0.9 apart directly, but 0.1 apart through the periodic image.
        let v = Vector3::new(0.9, 0.0, 0.0);
        assert_relative_eq!(distance(&v, &lattice, [true, true, true]), 0.1, epsilon = 1e-8);
    }

    #[test]
    fn test_distance_non_periodic_axis_not_wrapped() {
        let lattice = Lattice::new(Matrix3::<f64>::identity());
        let v = Vector3::new(0.0, 0.0, 0.9);
        assert_relative_eq!(
            distance(&v, &lattice, [true, true, false]),
            0.9,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_distance_matrix_shape() {
        let lattice = Lattice::new(Matrix3::<f64>::identity());
        let a = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.0, 0.0)];
        let b = vec![Vector3::new(0.0, 0.0, 0.0)];
        let dm = distance_matrix(&a, &b, &lattice, [true, true, true]);
        assert_eq!(dm.nrows(), 2);
        assert_eq!(dm.ncols(), 1);
        assert_relative_eq!(dm[(0, 0)], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_gaussian_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = gaussian(&mut rng, 1.0, 3.0, 3.0);
            assert!(v > 1.0 && v < 3.0);
        }
    }

    #[test]
    fn test_random_vector_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_vector(&mut rng);
            for x in v.iter() {
                assert!(*x > 0.0 && *x <= 1.0);
            }
        }
    }

    #[test]
    fn test_random_shear_matrix_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = random_shear_matrix(&mut rng, 0.1);
        for i in 0..3 {
            assert_relative_eq!(m[(i, i)], 1.0, epsilon = 1e-12);
        }
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert!(m[(i, j)].abs() < 0.1);
                }
            }
        }
    }

    #[test]
    fn test_nontrivial_lattice_distance() {
        let lattice = Lattice::new(matrix![
            2.0, 0.0, 0.0;
            0.0, 2.0, 0.0;
            0.0, 0.0, 2.0;
        ]);
        let v = Vector3::new(0.25, 0.0, 0.0);
        assert_relative_eq!(distance(&v, &lattice, [true, true, true]), 0.5, epsilon = 1e-8);
    }
}
