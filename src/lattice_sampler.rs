//! Crystal-system-aware lattice sampler (§4.2). Three entry points share a
//! retry envelope: keep sampling 6-tuples until one passes the acceptance
//! predicate, or give up with `GenError::LatticeUnsampleable`.

use std::f64::consts::PI;

use rand::Rng;

use crate::base::{GenError, Lattice, LatticeParams, TriangularForm};
use crate::config::GenerationParams;
use crate::data::{crystal_system_1d, crystal_system_2d, crystal_system_3d, CrystalSystem, UniqueAxis};
use crate::geometry::{gaussian, random_shear_matrix, random_vector};

/// Sample a 3D lattice for the given space-group number whose determinant
/// matches `volume` (within the acceptance predicate's tolerance).
pub fn sample_lattice_3d<R: Rng>(
    rng: &mut R,
    group_number: u16,
    volume: f64,
    params: &GenerationParams,
) -> Result<Lattice, GenError> {
    let system = crystal_system_3d(group_number)?;
    for _ in 0..params.max_lattice_attempts {
        let Some(candidate) = sample_candidate_3d(rng, system, volume) else {
            continue;
        };
        if !accept(&candidate, params) {
            continue;
        }
        if let Ok(lattice) = Lattice::from_params(candidate, TriangularForm::Lower) {
            return Ok(lattice);
        }
    }
    Err(GenError::LatticeUnsampleable)
}

/// Sample a 2D lattice (one non-periodic axis, convention `c`) carrying the
/// given `thickness`, whose in-plane area matches `volume / thickness`.
pub fn sample_lattice_2d<R: Rng>(
    rng: &mut R,
    group_number: u16,
    volume: f64,
    thickness: f64,
    params: &GenerationParams,
) -> Result<Lattice, GenError> {
    let (system, unique_axis) = crystal_system_2d(group_number)?;
    let area_target = volume / thickness;
    for _ in 0..params.max_lattice_attempts {
        let Some(candidate) = sample_in_plane_candidate(rng, system, unique_axis, area_target, thickness, params)
        else {
            return Err(GenError::LatticeUnsampleable);
        };
        if !accept(&candidate, params) {
            continue;
        }
        if let Ok(lattice) = Lattice::from_params(candidate, TriangularForm::Lower) {
            return Ok(lattice);
        }
    }
    Err(GenError::LatticeUnsampleable)
}

/// Sample a 1D lattice (one periodic axis, convention `c`) whose
/// cross-sectional area matches `area`; the periodic length is
/// `volume / area`.
pub fn sample_lattice_1d<R: Rng>(
    rng: &mut R,
    group_number: u16,
    volume: f64,
    area: f64,
    params: &GenerationParams,
) -> Result<Lattice, GenError> {
    let (system, unique_axis) = crystal_system_1d(group_number)?;
    let periodic_length = volume / area;
    for _ in 0..params.max_lattice_attempts {
        let Some(candidate) = sample_cross_section_candidate(rng, system, unique_axis, area, periodic_length, params)
        else {
            return Err(GenError::LatticeUnsampleable);
        };
        if !accept(&candidate, params) {
            continue;
        }
        if let Ok(lattice) = Lattice::from_params(candidate, TriangularForm::Lower) {
            return Ok(lattice);
        }
    }
    Err(GenError::LatticeUnsampleable)
}

/// Edge bounds, angle bounds, ratio bounds, and the near-degenerate guard
/// of §3, all of which must hold for a sampled 6-tuple to be accepted.
fn accept(p: &LatticeParams, params: &GenerationParams) -> bool {
    let edges = [p.a, p.b, p.c];
    if edges.iter().any(|&e| e < params.minvec || !e.is_finite()) {
        return false;
    }
    let angles = [p.alpha, p.beta, p.gamma];
    if angles
        .iter()
        .any(|&ang| ang <= params.minangle || ang >= PI - params.minangle)
    {
        return false;
    }
    let max_edge = edges.iter().cloned().fold(f64::MIN, f64::max);
    let min_edge = edges.iter().cloned().fold(f64::MAX, f64::min);
    if max_edge / min_edge > params.max_ratio {
        return false;
    }
    let guard = [
        p.a * p.beta.max(p.gamma).cos(),
        p.b * p.alpha.max(p.gamma).cos(),
        p.c * p.alpha.max(p.beta).cos(),
    ];
    let guard_min = guard.iter().cloned().fold(f64::MAX, f64::min);
    guard_min < params.minvec
}

/// Angles between the three axis directions of a random shear matrix.
/// Used by every triclinic branch in place of an explicit three-angle
/// sample, since a shear matrix's rows are nearly orthonormal by
/// construction.
fn shear_angles<R: Rng>(rng: &mut R) -> (f64, f64, f64) {
    let shear = random_shear_matrix(rng, 0.2);
    let row = |i: usize| shear.row(i).transpose().normalize();
    let (va, vb, vc) = (row(0), row(1), row(2));
    let alpha = vb.dot(&vc).clamp(-1.0, 1.0).acos();
    let beta = va.dot(&vc).clamp(-1.0, 1.0).acos();
    let gamma = va.dot(&vb).clamp(-1.0, 1.0).acos();
    (alpha, beta, gamma)
}

fn sample_candidate_3d<R: Rng>(rng: &mut R, system: CrystalSystem, volume: f64) -> Option<LatticeParams> {
    match system {
        CrystalSystem::Triclinic => {
            let (alpha, beta, gamma) = shear_angles(rng);
            let cos_a = alpha.cos();
            let cos_b = beta.cos();
            let cos_g = gamma.cos();
            let radicand = 1.0 - cos_a * cos_a - cos_b * cos_b - cos_g * cos_g
                + 2.0 * cos_a * cos_b * cos_g;
            if radicand <= 0.0 {
                return None;
            }
            let correction = radicand.sqrt();
            let ratios = random_vector(rng);
            let s = (volume / (ratios.x * ratios.y * ratios.z * correction)).cbrt();
            Some(LatticeParams::new(
                ratios.x * s,
                ratios.y * s,
                ratios.z * s,
                alpha,
                beta,
                gamma,
            ))
        }
        CrystalSystem::Monoclinic => {
            let beta = gaussian(rng, PI / 6.0, PI - PI / 6.0, 3.0);
            let ratios = random_vector(rng);
            let s = (volume / (ratios.x * ratios.y * ratios.z * beta.sin())).cbrt();
            Some(LatticeParams::new(
                ratios.x * s,
                ratios.y * s,
                ratios.z * s,
                PI / 2.0,
                beta,
                PI / 2.0,
            ))
        }
        CrystalSystem::Orthorhombic => {
            let ratios = random_vector(rng);
            let s = (volume / (ratios.x * ratios.y * ratios.z)).cbrt();
            Some(LatticeParams::new(
                ratios.x * s,
                ratios.y * s,
                ratios.z * s,
                PI / 2.0,
                PI / 2.0,
                PI / 2.0,
            ))
        }
        CrystalSystem::Tetragonal => {
            let t = rng.gen_range(0.2..5.0);
            let a = (volume / t).cbrt();
            Some(LatticeParams::new(a, a, t * a, PI / 2.0, PI / 2.0, PI / 2.0))
        }
        CrystalSystem::TrigonalHexagonal => {
            let t = rng.gen_range(0.2..5.0);
            let a = (volume / (t * (3.0f64.sqrt() / 2.0))).cbrt();
            Some(LatticeParams::new(
                a,
                a,
                t * a,
                PI / 2.0,
                PI / 2.0,
                2.0 * PI / 3.0,
            ))
        }
        CrystalSystem::Cubic => {
            let a = volume.cbrt();
            Some(LatticeParams::new(a, a, a, PI / 2.0, PI / 2.0, PI / 2.0))
        }
    }
}

/// 2D sampler: `c` (non-periodic) is fixed at `thickness`; `a, b` solve the
/// in-plane area equation.
fn sample_in_plane_candidate<R: Rng>(
    rng: &mut R,
    system: CrystalSystem,
    unique_axis: UniqueAxis,
    area_target: f64,
    thickness: f64,
    params: &GenerationParams,
) -> Option<LatticeParams> {
    match system {
        CrystalSystem::Triclinic => {
            let (alpha, beta, gamma) = shear_angles(rng);
            let ratio = random_vector(rng).x;
            let a = (area_target / (ratio * gamma.sin())).sqrt();
            Some(LatticeParams::new(a, ratio * a, thickness, alpha, beta, gamma))
        }
        CrystalSystem::Monoclinic => match unique_axis {
            UniqueAxis::C => {
                let gamma = gaussian(rng, params.minangle, PI - params.minangle, 3.0);
                let ratio = random_vector(rng).x;
                let a = (area_target / (ratio * gamma.sin())).sqrt();
                Some(LatticeParams::new(
                    a,
                    ratio * a,
                    thickness,
                    PI / 2.0,
                    PI / 2.0,
                    gamma,
                ))
            }
            UniqueAxis::A | UniqueAxis::B => {
                let alpha = gaussian(rng, params.minangle, PI - params.minangle, 3.0);
                let ratio = random_vector(rng).x;
                let a = (area_target / ratio).sqrt();
                Some(LatticeParams::new(
                    a,
                    ratio * a,
                    thickness,
                    alpha,
                    PI / 2.0,
                    PI / 2.0,
                ))
            }
        },
        CrystalSystem::Orthorhombic => {
            let ratio = random_vector(rng).x;
            let a = (area_target / ratio).sqrt();
            Some(LatticeParams::new(
                a,
                ratio * a,
                thickness,
                PI / 2.0,
                PI / 2.0,
                PI / 2.0,
            ))
        }
        CrystalSystem::Tetragonal => {
            let a = area_target.sqrt();
            Some(LatticeParams::new(a, a, thickness, PI / 2.0, PI / 2.0, PI / 2.0))
        }
        CrystalSystem::TrigonalHexagonal => {
            let a = (area_target / (3.0f64.sqrt() / 2.0)).sqrt();
            Some(LatticeParams::new(
                a,
                a,
                thickness,
                PI / 2.0,
                PI / 2.0,
                2.0 * PI / 3.0,
            ))
        }
        CrystalSystem::Cubic => {
            // Not a meaningful 2D classification; treated as unsampleable.
            None
        }
    }
}

/// 1D sampler: `a, b` (non-periodic cross-section) solve the area equation;
/// `c` (periodic) is fixed at `periodic_length`.
fn sample_cross_section_candidate<R: Rng>(
    rng: &mut R,
    system: CrystalSystem,
    unique_axis: UniqueAxis,
    area_target: f64,
    periodic_length: f64,
    params: &GenerationParams,
) -> Option<LatticeParams> {
    match system {
        CrystalSystem::Triclinic => {
            let (alpha, beta, gamma) = shear_angles(rng);
            let ratio = random_vector(rng).x;
            let a = (area_target / (ratio * gamma.sin())).sqrt();
            Some(LatticeParams::new(a, ratio * a, periodic_length, alpha, beta, gamma))
        }
        CrystalSystem::Monoclinic => match unique_axis {
            UniqueAxis::A => {
                let alpha = if params.legacy_rod_monoclinic_typo {
                    // The original generator assigned the sampled angle to a
                    // misspelled variable, so it never reached this field and
                    // the axis angle silently stayed at pi/2.
                    let _discarded = gaussian(rng, params.minangle, PI - params.minangle, 3.0);
                    PI / 2.0
                } else {
                    gaussian(rng, params.minangle, PI - params.minangle, 3.0)
                };
                let ratio = random_vector(rng).x;
                let a = (area_target / ratio).sqrt();
                Some(LatticeParams::new(
                    a,
                    ratio * a,
                    periodic_length,
                    alpha,
                    PI / 2.0,
                    PI / 2.0,
                ))
            }
            UniqueAxis::C | UniqueAxis::B => {
                let gamma = gaussian(rng, params.minangle, PI - params.minangle, 3.0);
                let ratio = random_vector(rng).x;
                let a = (area_target / (ratio * gamma.sin())).sqrt();
                Some(LatticeParams::new(
                    a,
                    ratio * a,
                    periodic_length,
                    PI / 2.0,
                    PI / 2.0,
                    gamma,
                ))
            }
        },
        CrystalSystem::Orthorhombic => {
            let ratio = random_vector(rng).x;
            let a = (area_target / ratio).sqrt();
            Some(LatticeParams::new(
                a,
                ratio * a,
                periodic_length,
                PI / 2.0,
                PI / 2.0,
                PI / 2.0,
            ))
        }
        CrystalSystem::Tetragonal => {
            let a = area_target.sqrt();
            Some(LatticeParams::new(
                a,
                a,
                periodic_length,
                PI / 2.0,
                PI / 2.0,
                PI / 2.0,
            ))
        }
        CrystalSystem::TrigonalHexagonal => {
            let a = (area_target / (3.0f64.sqrt() / 2.0)).sqrt();
            Some(LatticeParams::new(
                a,
                a,
                periodic_length,
                PI / 2.0,
                PI / 2.0,
                2.0 * PI / 3.0,
            ))
        }
        CrystalSystem::Cubic => None,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;

    #[test]
    fn test_sample_lattice_3d_cubic_matches_volume() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = GenerationParams::default();
        let lattice = sample_lattice_3d(&mut rng, 225, 64.0, &params).unwrap();
        assert_relative_eq!(lattice.volume(), 64.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sample_lattice_3d_triclinic_roundtrips() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = GenerationParams::default();
        let lattice = sample_lattice_3d(&mut rng, 1, 50.0, &params).unwrap();
        assert_relative_eq!(lattice.volume(), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_sample_lattice_2d_respects_thickness() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = GenerationParams::default();
        let lattice = sample_lattice_2d(&mut rng, 1, 25.0, 5.0, &params).unwrap();
        let recovered = lattice.to_params();
        assert_relative_eq!(recovered.c, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sample_lattice_1d_periodic_length() {
        let mut rng = StdRng::seed_from_u64(4);
        let params = GenerationParams::default();
        let lattice = sample_lattice_1d(&mut rng, 1, 40.0, 20.0, &params).unwrap();
        let recovered = lattice.to_params();
        assert_relative_eq!(recovered.c, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_group_number_errors() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = GenerationParams::default();
        assert!(sample_lattice_3d(&mut rng, 999, 10.0, &params).is_err());
    }
}
