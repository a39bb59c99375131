use serde::{Deserialize, Serialize};

/// Tunable parameters of the placement driver and lattice sampler (§6).
/// Constructed explicitly and passed by value; there is no file-based
/// config loader, since this is a library, not a service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Minimum separation tolerance in Angstrom, used when a species-pair
    /// covalent-radius tolerance would otherwise be implausibly small.
    pub tol_m: f64,
    /// Minimum lattice edge length in Angstrom.
    pub minvec: f64,
    /// Maximum pairwise lattice-vector length ratio.
    pub max_ratio: f64,
    /// Minimum lattice angle (and `pi - minangle` is the maximum).
    pub minangle: f64,
    /// Outer (lattice) retry budget.
    pub max1: usize,
    /// Middle (structure) retry budget.
    pub max2: usize,
    /// Inner (per-species) retry budget.
    pub max3: usize,
    /// Maximum lattice-sampling attempts before giving up with
    /// `GenError::LatticeUnsampleable`.
    pub max_lattice_attempts: usize,
    /// Vacuum padding (Angstrom) added along non-periodic axes of 2D/1D
    /// outputs when embedding them in a 3D container.
    pub vacuum_thickness: f64,
    /// Reproduce the original generator's Rod-group monoclinic typo (see
    /// `GenError` docs and DESIGN.md): the sampled angle is discarded and
    /// the axis angle silently stays at pi/2. Default `false` (corrected).
    pub legacy_rod_monoclinic_typo: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            tol_m: 0.3,
            minvec: 1.0,
            max_ratio: 10.0,
            minangle: std::f64::consts::PI / 6.0,
            max1: 40,
            max2: 10,
            max3: 10,
            max_lattice_attempts: 100,
            vacuum_thickness: 10.0,
            legacy_rod_monoclinic_typo: false,
        }
    }
}

impl GenerationParams {
    /// Collapsed retry budgets used when the compatibility predicate finds
    /// the output essentially unique (`Feasibility::FeasibleRigid`).
    pub fn rigid(&self) -> Self {
        Self {
            max1: 5,
            max2: 5,
            max3: 5,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_default_matches_stated_constants() {
        let params = GenerationParams::default();
        assert_relative_eq!(params.tol_m, 0.3);
        assert_relative_eq!(params.minvec, 1.0);
        assert_eq!(params.max1, 40);
        assert_eq!(params.max2, 10);
        assert_eq!(params.max3, 10);
        assert_relative_eq!(params.max_ratio, 10.0);
        assert!(!params.legacy_rod_monoclinic_typo);
    }

    #[test]
    fn test_rigid_collapses_budgets() {
        let params = GenerationParams::default().rigid();
        assert_eq!(params.max1, 5);
        assert_eq!(params.max2, 5);
        assert_eq!(params.max3, 5);
        assert_relative_eq!(params.tol_m, 0.3);
    }
}
