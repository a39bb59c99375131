use std::collections::BTreeMap;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use union_find::{QuickFindUf, UnionByRank, UnionFind};

use super::lattice::Lattice;

/// Fractional coordinates
pub type Position = Vector3<f64>;
/// Atomic number
pub type AtomicSpecie = i32;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A crystal structure: a lattice plus the fractional coordinates, chemical
/// symbols and atomic numbers of the atoms sitting in it.
pub struct Cell {
    /// Lattice of the cell.
    pub lattice: Lattice,
    /// `positions[i]` is the fractional coordinates of the i-th site.
    pub positions: Vec<Position>,
    /// `species[i]` is the chemical symbol of the i-th site.
    pub species: Vec<String>,
    /// `numbers[i]` is the atomic number of the i-th site.
    pub numbers: Vec<AtomicSpecie>,
}

impl Cell {
    pub fn new(
        lattice: Lattice,
        positions: Vec<Position>,
        species: Vec<String>,
        numbers: Vec<AtomicSpecie>,
    ) -> Self {
        if positions.len() != numbers.len() || positions.len() != species.len() {
            panic!("positions, species and numbers should be the same length");
        }
        Self {
            lattice,
            positions,
            species,
            numbers,
        }
    }

    /// Return the number of atoms in the cell.
    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }

    /// Rotate the cell by the given rotation matrix.
    pub fn rotate(&self, rotation_matrix: &Matrix3<f64>) -> Self {
        Self::new(
            self.lattice.rotate(rotation_matrix),
            self.positions.clone(),
            self.species.clone(),
            self.numbers.clone(),
        )
    }
}

/// If and only if the `i`th and `j`th points are equivalent under the given
/// adjacency (`pairs` holds index pairs that should be merged), `orbits[i] ==
/// orbits[j]`. For each orbit, exactly one member satisfies `orbits[i] == i`.
///
/// Grounds the connected-components step of the merge/collision resolver on
/// `union-find`'s quick-find-by-rank structure rather than hand-rolled DFS
/// bookkeeping.
pub fn connected_components(num_points: usize, pairs: &[(usize, usize)]) -> Vec<usize> {
    let mut uf = QuickFindUf::<UnionByRank>::new(num_points);
    for &(i, j) in pairs {
        uf.union(i, j);
    }
    let mut identifier_mapping = BTreeMap::new();
    for i in 0..num_points {
        identifier_mapping.entry(uf.find(i)).or_insert(i);
    }

    (0..num_points)
        .map(|i| *identifier_mapping.get(&uf.find(i)).unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::panic;

    use nalgebra::{vector, Matrix3};

    use super::{connected_components, Cell};
    use crate::base::lattice::Lattice;

    #[test]
    fn test_connected_components() {
        let num_points = 3;
        let pairs = vec![(0, 2)];
        assert_eq!(connected_components(num_points, &pairs), vec![0, 1, 0]);
    }

    #[test]
    fn test_connected_components_chain() {
        let num_points = 4;
        let pairs = vec![(0, 1), (1, 2)];
        assert_eq!(connected_components(num_points, &pairs), vec![0, 0, 0, 3]);
    }

    #[test]
    fn test_mismatched_length() {
        let lattice = Lattice::new(Matrix3::<f64>::identity());
        let positions = vec![vector![0.0, 0.0, 0.0], vector![0.5, 0.5, 0.5]];
        let species = vec!["Na".to_string()];
        let numbers = vec![11];

        let result = panic::catch_unwind(|| Cell::new(lattice, positions, species, numbers));
        assert!(result.is_err());
    }

    #[test]
    fn test_cell_json_roundtrip() {
        let lattice = Lattice::new(Matrix3::<f64>::identity() * 4.0);
        let cell = Cell::new(
            lattice,
            vec![vector![0.0, 0.0, 0.0], vector![0.5, 0.5, 0.5]],
            vec!["Na".to_string(), "Cl".to_string()],
            vec![11, 17],
        );

        let json = serde_json::to_string(&cell).unwrap();
        let recovered: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.species, cell.species);
        assert_eq!(recovered.numbers, cell.numbers);
        assert_relative_eq!(recovered.lattice.basis, cell.lattice.basis);
    }
}
