//! Pre-flight compatibility check (§4.5): prunes impossible
//! (species-count, group) pairs before any lattice sampling begins.

use std::collections::HashSet;

use crate::data::WyckoffPosition;

/// Three-valued result of the compatibility predicate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feasibility {
    /// Some Wyckoff position with rotational freedom participated in every
    /// species' decomposition.
    FeasibleWithFreedom,
    /// Every species decomposes entirely into zero-freedom positions — the
    /// output is essentially unique, so the driver collapses its retry
    /// budgets.
    FeasibleRigid,
    /// No decomposition of some species count into Wyckoff multiplicities
    /// exists.
    Infeasible,
}

/// Check whether `species_counts` (one count per species, conventional
/// cell) can be decomposed as a sum of Wyckoff multiplicities from
/// `wyckoffs`.
///
/// `wyckoffs` need not be pre-sorted; this function handles the
/// largest-first greedy subtraction itself, matching the way a general
/// position is preferred over special positions whenever one is big enough
/// to absorb the remaining count.
pub fn check_compatible(species_counts: &[usize], wyckoffs: &[&WyckoffPosition]) -> Feasibility {
    if wyckoffs.is_empty() || species_counts.is_empty() {
        return Feasibility::Infeasible;
    }

    let m_min = wyckoffs.iter().map(|wp| wp.multiplicity()).min().unwrap();
    if species_counts.iter().any(|&n| n % m_min != 0) {
        return Feasibility::Infeasible;
    }

    let mut descending: Vec<&WyckoffPosition> = wyckoffs.to_vec();
    descending.sort_by_key(|wp| std::cmp::Reverse(wp.multiplicity()));

    let mut any_freedom_used = false;

    for &n in species_counts {
        let mut remaining = n;
        let mut rigid_used: HashSet<usize> = HashSet::new();

        while remaining > 0 {
            let choice = descending.iter().enumerate().find(|(index, wp)| {
                wp.multiplicity() <= remaining && (wp.has_freedom() || !rigid_used.contains(index))
            });

            match choice {
                Some((index, wp)) => {
                    remaining -= wp.multiplicity();
                    if wp.has_freedom() {
                        any_freedom_used = true;
                    } else {
                        rigid_used.insert(index);
                    }
                }
                None => return Feasibility::Infeasible,
            }
        }
    }

    if any_freedom_used {
        Feasibility::FeasibleWithFreedom
    } else {
        Feasibility::FeasibleRigid
    }
}
