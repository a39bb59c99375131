//! Merge / collision resolver (§4.4): collapses orbit points that land too
//! close together under periodic boundary conditions into the centroid of
//! their connected component, then tries to re-identify the result as a
//! (possibly higher-symmetry) Wyckoff position.

use nalgebra::Vector3;
use std::collections::BTreeMap;

use crate::base::{connected_components, Lattice};
use crate::data::WyckoffPosition;
use crate::geometry::{distance, distance_matrix, shift_range};

/// A successfully resolved orbit: its (possibly merged) points, the index
/// into the Wyckoff table it was identified against, and the canonical
/// generator point that reproduces it.
#[derive(Debug, Clone)]
pub struct ResolvedOrbit {
    pub points: Vec<Vector3<f64>>,
    pub wyckoff_index: usize,
    pub generator: Vector3<f64>,
}

/// Reduce periodic axes mod 1; leave non-periodic axes unshifted.
fn canonicalize(point: &Vector3<f64>, pbc: [bool; 3]) -> Vector3<f64> {
    Vector3::new(
        if pbc[0] {
            point[0].rem_euclid(1.0)
        } else {
            point[0]
        },
        if pbc[1] {
            point[1].rem_euclid(1.0)
        } else {
            point[1]
        },
        if pbc[2] {
            point[2].rem_euclid(1.0)
        } else {
            point[2]
        },
    )
}

/// Translate points one at a time by the lattice image minimizing Cartesian
/// distance to the centroid of the already-processed prefix, then average.
/// Avoids the "wrap-around mean" bug a naive fractional-space mean has near
/// a periodic boundary.
pub fn periodic_centroid(points: &[Vector3<f64>], lattice: &Lattice, pbc: [bool; 3]) -> Vector3<f64> {
    assert!(!points.is_empty());
    let mut shifted = Vec::with_capacity(points.len());
    shifted.push(points[0]);
    let mut running_sum = points[0];

    for k in 1..points.len() {
        let prefix_centroid = running_sum / (k as f64);
        let mut best_shift = Vector3::zeros();
        let mut best_dist_sq = f64::INFINITY;
        for sa in shift_range(pbc[0]) {
            for sb in shift_range(pbc[1]) {
                for sc in shift_range(pbc[2]) {
                    let shift = Vector3::new(sa as f64, sb as f64, sc as f64);
                    let candidate = points[k] + shift;
                    let cart = lattice.cartesian_coords(&(candidate - prefix_centroid));
                    let dist_sq = cart.norm_squared();
                    if dist_sq < best_dist_sq {
                        best_dist_sq = dist_sq;
                        best_shift = shift;
                    }
                }
            }
        }
        let shifted_point = points[k] + best_shift;
        shifted.push(shifted_point);
        running_sum += shifted_point;
    }

    running_sum / (points.len() as f64)
}

/// Locate the WP whose orbit of some generator point matches `points` (in
/// any order, modulo lattice translations). Ties are broken by the WP's
/// position in `wyckoffs` (its canonical order in the symmetry table).
pub fn check_wyckoff_position(
    points: &[Vector3<f64>],
    lattice: &Lattice,
    tol: f64,
    pbc: [bool; 3],
    wyckoffs: &[&WyckoffPosition],
) -> Option<(usize, Vector3<f64>)> {
    for (index, wp) in wyckoffs.iter().enumerate() {
        if wp.multiplicity() != points.len() {
            continue;
        }
        for candidate_generator in points {
            let orbit: Vec<Vector3<f64>> = wp
                .orbit(candidate_generator)
                .iter()
                .map(|p| canonicalize(p, pbc))
                .collect();
            if orbit_matches(&orbit, points, lattice, tol, pbc) {
                return Some((index, *candidate_generator));
            }
        }
    }
    None
}

fn orbit_matches(
    orbit: &[Vector3<f64>],
    points: &[Vector3<f64>],
    lattice: &Lattice,
    tol: f64,
    pbc: [bool; 3],
) -> bool {
    if orbit.len() != points.len() {
        return false;
    }
    let mut used = vec![false; points.len()];
    for op in orbit {
        let found = points.iter().enumerate().find(|(i, p)| {
            !used[*i] && distance(&(*p - op), lattice, pbc) < tol
        });
        match found {
            Some((i, _)) => used[i] = true,
            None => return false,
        }
    }
    true
}

/// Resolve a set of orbit points that may contain near-coincident members
/// into a valid Wyckoff orbit, merging colliding points into periodic
/// centroids until either the result is identified or no further merge is
/// possible (`None`).
///
/// `wyckoffs` should be every remaining Wyckoff position the species could
/// still occupy, used both for identification and for the "unmergable"
/// bound (the smallest multiplicity among them).
pub fn resolve_orbit(
    points: &[Vector3<f64>],
    lattice: &Lattice,
    tol: f64,
    pbc: [bool; 3],
    wyckoffs: &[&WyckoffPosition],
) -> Option<ResolvedOrbit> {
    let smallest_remaining = wyckoffs.iter().map(|wp| wp.multiplicity()).min()?;
    let mut current = points.to_vec();

    loop {
        let n = current.len();
        let dm = distance_matrix(&current, &current, lattice, pbc);
        let mut d_min = f64::INFINITY;
        for i in 0..n {
            for j in 0..n {
                if i != j && dm[(i, j)] < d_min {
                    d_min = dm[(i, j)];
                }
            }
        }

        if n == 1 || d_min > tol {
            return check_wyckoff_position(&current, lattice, tol, pbc, wyckoffs).map(
                |(wyckoff_index, generator)| ResolvedOrbit {
                    points: current.clone(),
                    wyckoff_index,
                    generator,
                },
            );
        }

        let mut pairs = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                if dm[(i, j)] <= d_min + 1e-3 {
                    pairs.push((i, j));
                }
            }
        }
        let labels = connected_components(n, &pairs);

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(i);
        }

        let merged: Vec<Vector3<f64>> = groups
            .values()
            .map(|member_indices| {
                let cluster: Vec<Vector3<f64>> =
                    member_indices.iter().map(|&i| current[i]).collect();
                periodic_centroid(&cluster, lattice, pbc)
            })
            .collect();

        if merged.len() >= smallest_remaining {
            return None;
        }
        current = merged;
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{vector, Matrix3};
    use test_log::test;

    use super::*;
    use crate::base::Operation;

    fn identity_lattice() -> Lattice {
        Lattice::new(Matrix3::<f64>::identity())
    }

    #[test]
    fn test_periodic_centroid_no_wraparound() {
        let lattice = identity_lattice();
        // 0.95 and 0.05 are 0.1 apart through the periodic boundary; a naive
        // fractional mean would give 0.5, the wrong side of the cell.
        let points = vec![vector![0.95, 0.0, 0.0], vector![0.05, 0.0, 0.0]];
        let centroid = periodic_centroid(&points, &lattice, [true, true, true]);
        let wrapped = centroid[0].rem_euclid(1.0);
        assert!(wrapped < 0.05 || wrapped > 0.95);
    }

    #[test]
    fn test_check_wyckoff_position_general() {
        let lattice = identity_lattice();
        let wp = WyckoffPosition::from_coordinates(
            'a',
            "1",
            vec![Operation::identity()],
            &["x,y,z", "-x,-y,-z"],
        );
        let wyckoffs = vec![&wp];
        let generator = vector![0.2, 0.3, 0.4];
        let points = wp.orbit(&generator);
        let result = check_wyckoff_position(&points, &lattice, 1e-6, [true, true, true], &wyckoffs);
        assert!(result.is_some());
        assert_eq!(result.unwrap().0, 0);
    }

    #[test]
    fn test_resolve_orbit_already_valid() {
        let lattice = identity_lattice();
        let wp = WyckoffPosition::from_coordinates(
            'a',
            "1",
            vec![Operation::identity()],
            &["x,y,z", "-x,-y,-z"],
        );
        let wyckoffs = vec![&wp];
        let points = wp.orbit(&vector![0.2, 0.3, 0.4]);
        let resolved = resolve_orbit(&points, &lattice, 0.05, [true, true, true], &wyckoffs);
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().wyckoff_index, 0);
    }

    #[test]
    fn test_resolve_orbit_merges_collision_into_smaller_wp() {
        let lattice = identity_lattice();
        // Two points nearly on top of each other should merge into a single
        // point that identifies as the multiplicity-1 position.
        let wp_general = WyckoffPosition::from_coordinates(
            'b',
            "1",
            vec![Operation::identity()],
            &["x,y,z", "-x,-y,-z"],
        );
        let wp_special = WyckoffPosition::from_coordinates(
            'a',
            "-1",
            vec![Operation::identity()],
            &["0,0,0"],
        );
        let wyckoffs = vec![&wp_special, &wp_general];
        let points = vec![vector![0.001, 0.0, 0.0], vector![-0.001, 0.0, 0.0]];
        let resolved = resolve_orbit(&points, &lattice, 0.1, [true, true, true], &wyckoffs);
        let resolved = resolved.expect("collision should merge into the special position");
        assert_eq!(resolved.points.len(), 1);
        assert_eq!(resolved.wyckoff_index, 0);
    }

    #[test]
    fn test_resolve_orbit_unmergable_when_no_smaller_wp() {
        let lattice = identity_lattice();
        let wp = WyckoffPosition::from_coordinates(
            'a',
            "1",
            vec![Operation::identity()],
            &["x,y,z", "-x,-y,-z"],
        );
        let wyckoffs = vec![&wp];
        let points = vec![vector![0.001, 0.0, 0.0], vector![-0.001, 0.0, 0.0]];
        // Merging collapses the pair to a single point, but no multiplicity-1
        // position exists in this table to identify it against.
        assert!(resolve_orbit(&points, &lattice, 0.1, [true, true, true], &wyckoffs).is_none());
    }
}
