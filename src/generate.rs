//! Placement driver (§4.6): the three-level retry loop (lattice → structure
//! → per-species) that composes the lattice sampler, Wyckoff machinery,
//! merge resolver and compatibility predicate into a full crystal.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use rand::Rng;

use crate::base::{AtomicSpecie, Cell, GenError, Lattice, Position};
use crate::compatibility::{check_compatible, Feasibility};
use crate::config::GenerationParams;
use crate::data::{Dim, WyckoffPosition};
use crate::external::{ElementTable, SymmetryDatabase};
use crate::geometry::distance;
use crate::lattice_sampler::{sample_lattice_1d, sample_lattice_2d, sample_lattice_3d};
use crate::merge::resolve_orbit;

/// Cooperative cancellation flag, checked at the top of each outer-loop
/// iteration. Cloning shares the same underlying flag, so a caller can
/// cancel an in-flight generation from another thread.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which of the three dimensionalities to generate, plus the extra
/// parameter each non-3D case needs (§4.2).
#[derive(Debug, Clone, Copy)]
pub enum DimensionParams {
    ThreeD,
    /// Thickness (Å) of the non-periodic axis (convention `c`).
    TwoD { thickness: f64 },
    /// Cross-sectional area (Å²) of the two non-periodic axes.
    OneD { area: f64 },
}

impl DimensionParams {
    fn dim(&self) -> Dim {
        match self {
            DimensionParams::ThreeD => Dim::ThreeD,
            DimensionParams::TwoD { .. } => Dim::TwoD,
            DimensionParams::OneD { .. } => Dim::OneD,
        }
    }

    fn pbc(&self) -> [bool; 3] {
        match self {
            DimensionParams::ThreeD => [true, true, true],
            DimensionParams::TwoD { .. } => [true, true, false],
            DimensionParams::OneD { .. } => [false, false, true],
        }
    }
}

/// Drives the full generation loop against a fixed element table and
/// symmetry database.
pub struct CrystalGenerator<'a> {
    elements: &'a dyn ElementTable,
    symmetry: &'a dyn SymmetryDatabase,
}

impl<'a> CrystalGenerator<'a> {
    pub fn new(elements: &'a dyn ElementTable, symmetry: &'a dyn SymmetryDatabase) -> Self {
        Self { elements, symmetry }
    }

    /// Generate a crystal with `counts[i]` atoms of `species[i]` per
    /// primitive cell, under `group_number` of the given dimensionality,
    /// scaled by `factor`.
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        group_number: u16,
        species: &[String],
        counts: &[usize],
        factor: f64,
        dim_params: DimensionParams,
        params: &GenerationParams,
        cancel: &CancellationToken,
    ) -> Result<Cell, GenError> {
        if species.is_empty() {
            return Err(GenError::EmptySpeciesList);
        }
        if species.len() != counts.len() {
            return Err(GenError::MismatchedSpeciesCounts {
                species_len: species.len(),
                counts_len: counts.len(),
            });
        }

        let dim = dim_params.dim();
        let pbc = dim_params.pbc();
        let tables = self.symmetry.tables(dim, group_number)?;
        let conventional_counts: Vec<usize> = counts.iter().map(|&n| n * tables.cellsize).collect();
        let wyckoffs_organized = tables.wyckoffs_organized();

        let feasibility = check_compatible(&conventional_counts, &wyckoffs_organized);
        if feasibility == Feasibility::Infeasible {
            return Err(GenError::Infeasible);
        }
        let params = if feasibility == Feasibility::FeasibleRigid {
            params.rigid()
        } else {
            *params
        };

        let volume_target = estimate_volume(rng, species, &conventional_counts, self.elements, factor)?;

        for cycle1 in 0..params.max1 {
            if cancel.is_cancelled() {
                return Err(GenError::Cancelled);
            }
            debug!("state=LATTICE cycle1={cycle1}/{}", params.max1);

            let lattice = match dim_params {
                DimensionParams::ThreeD => sample_lattice_3d(rng, group_number, volume_target, &params),
                DimensionParams::TwoD { thickness } => {
                    sample_lattice_2d(rng, group_number, volume_target, thickness, &params)
                }
                DimensionParams::OneD { area } => {
                    sample_lattice_1d(rng, group_number, volume_target, area, &params)
                }
            }?;

            debug_assert!(
                (lattice.volume() - volume_target).abs() <= 1.0,
                "sampled lattice volume {} does not match target {}",
                lattice.volume(),
                volume_target
            );

            let mut accepted = None;
            for cycle2 in 0..params.max2 {
                trace!("state=FILL cycle1={cycle1} cycle2={cycle2}/{}", params.max2);
                match attempt_fill(
                    rng,
                    &lattice,
                    pbc,
                    species,
                    &conventional_counts,
                    &tables.wyckoffs,
                    &wyckoffs_organized,
                    self.elements,
                    &params,
                ) {
                    Ok(fill) => {
                        accepted = Some(fill);
                        break;
                    }
                    Err(FillFailure::MergeBudgetExhausted) => {
                        debug!("state=MERGE->LATTICE cycle1={cycle1} merge budget exhausted");
                        break;
                    }
                    Err(FillFailure::DistanceRejected) => {
                        trace!("state=MERGE->FILL cycle1={cycle1} cycle2={cycle2} distance rejected, retrying");
                    }
                }
            }

            if let Some((positions, species_out, numbers)) = accepted {
                debug!("state=ACCEPTED cycle1={cycle1}");
                let (lattice, positions) = pad_with_vacuum(&lattice, &positions, pbc, params.vacuum_thickness);
                return Ok(Cell::new(lattice, positions, species_out, numbers));
            }
        }

        debug!("state=EXHAUSTED");
        Err(GenError::PlacementExhausted)
    }
}

enum FillFailure {
    /// A species could not be fully placed within `max3` attempts; the
    /// driver should resample the lattice rather than keep retrying.
    MergeBudgetExhausted,
    /// The middle (structure) loop's generic failure: at least one
    /// attempt placed some atoms before a later distance check failed.
    DistanceRejected,
}

#[allow(clippy::too_many_arguments)]
fn attempt_fill<R: Rng>(
    rng: &mut R,
    lattice: &Lattice,
    pbc: [bool; 3],
    species: &[String],
    conventional_counts: &[usize],
    all_wyckoffs: &[WyckoffPosition],
    wyckoffs_organized: &[&WyckoffPosition],
    elements: &dyn ElementTable,
    params: &GenerationParams,
) -> Result<(Vec<Position>, Vec<String>, Vec<AtomicSpecie>), FillFailure> {
    let mut acc_positions: Vec<Position> = vec![];
    let mut acc_species: Vec<String> = vec![];
    let mut acc_numbers: Vec<AtomicSpecie> = vec![];
    let mut acc_tol: Vec<f64> = vec![];

    for (symbol, &count) in species.iter().zip(conventional_counts) {
        let covalent_radius = elements.covalent_radius(symbol).map_err(|_| FillFailure::DistanceRejected)?;
        let atomic_number = elements.atomic_number(symbol).map_err(|_| FillFailure::DistanceRejected)?;
        let tol_s = (0.5 * covalent_radius).max(params.tol_m);

        let mut placed = 0;
        let mut attempts = 0;
        while placed < count {
            if attempts >= params.max3 {
                // No atom of any species has landed yet this attempt: the
                // lattice itself is likely too cramped, so give up on it.
                // Otherwise some placement already succeeded; retry the
                // whole fill within the same lattice rather than resample.
                if acc_positions.is_empty() {
                    return Err(FillFailure::MergeBudgetExhausted);
                } else {
                    return Err(FillFailure::DistanceRejected);
                }
            }
            attempts += 1;

            let remaining = count - placed;
            let Some(wp) = choose_wyckoff(rng, wyckoffs_organized, remaining) else {
                continue;
            };

            let point = Position::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            );
            let orbit = wp.orbit(&point);

            let Some(resolved) = resolve_orbit(&orbit, lattice, 2.0 * tol_s, pbc, all_wyckoffs.iter().collect::<Vec<_>>().as_slice()) else {
                continue;
            };
            if resolved.points.len() > remaining {
                continue;
            }

            let mut ok = true;
            'check: for new_point in &resolved.points {
                for (old_point, &old_tol) in acc_positions.iter().zip(&acc_tol) {
                    let threshold = tol_s + old_tol;
                    if distance(&(old_point - new_point), lattice, pbc) < threshold {
                        ok = false;
                        break 'check;
                    }
                }
            }
            if !ok {
                trace!("distance check rejected candidate placement for {symbol}");
                continue;
            }

            placed += resolved.points.len();
            for p in resolved.points {
                acc_positions.push(p);
                acc_species.push(symbol.clone());
                acc_numbers.push(atomic_number);
                acc_tol.push(tol_s);
            }
        }
    }

    Ok((acc_positions, acc_species, acc_numbers))
}

/// With probability ½ scan from highest to lowest multiplicity and return
/// the first that fits; with probability ½ pick uniformly among all that
/// fit.
fn choose_wyckoff<'a, R: Rng>(
    rng: &mut R,
    wyckoffs_organized: &[&'a WyckoffPosition],
    remaining: usize,
) -> Option<&'a WyckoffPosition> {
    if rng.gen_bool(0.5) {
        wyckoffs_organized
            .iter()
            .find(|wp| wp.multiplicity() <= remaining)
            .copied()
    } else {
        let candidates: Vec<&WyckoffPosition> = wyckoffs_organized
            .iter()
            .filter(|wp| wp.multiplicity() <= remaining)
            .copied()
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }
}

/// Per-species volume estimate: a radius sampled uniformly between the
/// covalent and van-der-Waals radius, accumulated as a sphere volume,
/// scaled by `factor` (§11).
fn estimate_volume<R: Rng>(
    rng: &mut R,
    species: &[String],
    conventional_counts: &[usize],
    elements: &dyn ElementTable,
    factor: f64,
) -> Result<f64, GenError> {
    let mut volume = 0.0;
    for (symbol, &count) in species.iter().zip(conventional_counts) {
        let r_cov = elements.covalent_radius(symbol)?;
        let r_vdw = elements.van_der_waals_radius(symbol)?;
        let (lo, hi) = (r_cov.min(r_vdw), r_cov.max(r_vdw));
        for _ in 0..count {
            let r = if hi > lo { rng.gen_range(lo..hi) } else { lo };
            volume += (4.0 / 3.0) * PI * r.powi(3);
        }
    }
    Ok(volume * factor)
}

/// Scale each non-periodic axis's lattice vector so its length grows by
/// `vacuum`, rescaling the corresponding fractional coordinate so the
/// Cartesian position of every atom is unchanged.
fn pad_with_vacuum(
    lattice: &Lattice,
    positions: &[Position],
    pbc: [bool; 3],
    vacuum: f64,
) -> (Lattice, Vec<Position>) {
    if vacuum <= 0.0 || pbc.iter().all(|&p| p) {
        return (lattice.clone(), positions.to_vec());
    }

    let mut basis = lattice.basis;
    let mut scales = [1.0; 3];
    for axis in 0..3 {
        if !pbc[axis] {
            let length = basis.column(axis).norm();
            let scale = (length + vacuum) / length;
            basis.set_column(axis, &(basis.column(axis) * scale));
            scales[axis] = scale;
        }
    }
    let padded_lattice = Lattice { basis };

    let padded_positions = positions
        .iter()
        .map(|p| Position::new(p.x / scales[0], p.y / scales[1], p.z / scales[2]))
        .collect();

    (padded_lattice, padded_positions)
}
