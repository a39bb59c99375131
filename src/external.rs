//! Adapters to the two external collaborators named in §6: the periodic
//! element table and the symmetry database. Both are consumed as opaque,
//! read-only tables; the core never mutates or derives them. The static
//! fixtures here stand in for a real database/table implementation and
//! cover the groups and species exercised by the seed scenarios.

use std::collections::HashMap;

use crate::base::{GenError, Operation, Operations, Rotation};
use crate::data::{parse_operation, Centering, Dim, WyckoffPosition};

/// Covalent radius, van der Waals radius and atomic number lookup by
/// chemical symbol.
pub trait ElementTable {
    fn covalent_radius(&self, symbol: &str) -> Result<f64, GenError>;
    fn van_der_waals_radius(&self, symbol: &str) -> Result<f64, GenError>;
    fn atomic_number(&self, symbol: &str) -> Result<i32, GenError>;
}

#[derive(Debug, Clone, Copy)]
struct ElementEntry {
    covalent_radius: f64,
    van_der_waals_radius: f64,
    atomic_number: i32,
}

/// Minimal element table backed by a fixed list, covering the species used
/// by the seed scenarios. Radii in Angstrom.
pub struct StaticElementTable {
    entries: HashMap<&'static str, ElementEntry>,
}

impl StaticElementTable {
    pub fn new() -> Self {
        let table: &[(&str, f64, f64, i32)] = &[
            ("H", 0.31, 1.20, 1),
            ("Li", 1.28, 1.82, 3),
            ("C", 0.76, 1.70, 6),
            ("O", 0.66, 1.52, 8),
            ("Na", 1.66, 2.27, 11),
            ("Cl", 1.02, 1.75, 17),
        ];
        let entries = table
            .iter()
            .map(|&(symbol, covalent_radius, van_der_waals_radius, atomic_number)| {
                (
                    symbol,
                    ElementEntry {
                        covalent_radius,
                        van_der_waals_radius,
                        atomic_number,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    fn get(&self, symbol: &str) -> Result<&ElementEntry, GenError> {
        self.entries
            .get(symbol)
            .ok_or_else(|| GenError::UnknownSpecies {
                symbol: symbol.to_string(),
            })
    }
}

impl Default for StaticElementTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTable for StaticElementTable {
    fn covalent_radius(&self, symbol: &str) -> Result<f64, GenError> {
        Ok(self.get(symbol)?.covalent_radius)
    }

    fn van_der_waals_radius(&self, symbol: &str) -> Result<f64, GenError> {
        Ok(self.get(symbol)?.van_der_waals_radius)
    }

    fn atomic_number(&self, symbol: &str) -> Result<i32, GenError> {
        Ok(self.get(symbol)?.atomic_number)
    }
}

/// The Wyckoff/cellsize tables for one symmetry group, as handed to the
/// placement driver.
#[derive(Debug, Clone)]
pub struct GroupTables {
    /// All Wyckoff positions, canonically ordered (largest multiplicity
    /// last, matching the convention most symmetry tables print in).
    pub wyckoffs: Vec<WyckoffPosition>,
    /// Conventional-to-primitive atom multiplier.
    pub cellsize: usize,
}

impl GroupTables {
    /// The same positions grouped by multiplicity, largest first.
    pub fn wyckoffs_organized(&self) -> Vec<&WyckoffPosition> {
        crate::data::organize_by_multiplicity(&self.wyckoffs)
    }
}

/// Given `(dim, group_number)`, returns the Wyckoff tables for that group.
pub trait SymmetryDatabase {
    fn tables(&self, dim: Dim, group_number: u16) -> Result<&GroupTables, GenError>;
}

/// Minimal symmetry database backed by a fixed list, covering the groups
/// used by the seed scenarios: 3D space groups 1 (P1), 36 (Cmc2_1), 225
/// (Fm-3m) and 230 (Ia-3d); 2D layer group 1 (p1); 1D Rod group 1 (p1).
pub struct StaticSymmetryDatabase {
    entries: HashMap<(Dim, u16), GroupTables>,
}

impl StaticSymmetryDatabase {
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        entries.insert((Dim::ThreeD, 1), triclinic_p1());
        entries.insert((Dim::ThreeD, 36), cmc21());
        entries.insert((Dim::ThreeD, 225), fm3m());
        entries.insert((Dim::ThreeD, 230), ia3d());
        entries.insert((Dim::TwoD, 1), planar_p1());
        entries.insert((Dim::OneD, 1), rod_p1());

        Self { entries }
    }
}

impl Default for StaticSymmetryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl SymmetryDatabase for StaticSymmetryDatabase {
    fn tables(&self, dim: Dim, group_number: u16) -> Result<&GroupTables, GenError> {
        self.entries
            .get(&(dim, group_number))
            .ok_or(GenError::UnknownGroup {
                dim: format!("{dim:?}"),
                group_number,
            })
    }
}

fn general_position_wp(letter: char, operations: Operations) -> WyckoffPosition {
    WyckoffPosition::new(letter, "1", vec![Operation::identity()], operations)
}

fn triclinic_p1() -> GroupTables {
    GroupTables {
        wyckoffs: vec![general_position_wp('a', vec![Operation::identity()])],
        cellsize: 1,
    }
}

fn planar_p1() -> GroupTables {
    triclinic_p1()
}

fn rod_p1() -> GroupTables {
    triclinic_p1()
}

/// Fm-3m (#225): rock-salt prototype. The two octahedral/tetrahedral
/// special positions 4a/4b, enough to exercise the NaCl seed scenario
/// (4 Na on 4a, 4 Cl on 4b).
fn fm3m() -> GroupTables {
    let centering_shifts = Centering::F.lattice_points();
    let fixed_point_at = |t: nalgebra::Vector3<f64>| Operation::new(Rotation::zeros(), t);

    let wp_4a: Operations = centering_shifts.iter().map(|&t| fixed_point_at(t)).collect();
    let wp_4b: Operations = centering_shifts
        .iter()
        .map(|&t| fixed_point_at(t + nalgebra::Vector3::new(0.5, 0.5, 0.5)))
        .collect();

    GroupTables {
        wyckoffs: vec![
            general_position_wp('a', wp_4a),
            general_position_wp('b', wp_4b),
        ],
        cellsize: Centering::F.order(),
    }
}

/// Ia-3d (#230): garnet prototype. Only the two smallest special positions
/// (16a, 16b) are tabulated, which is enough to demonstrate the
/// compatibility predicate rejecting a single atom (no multiplicity divides
/// 1 other than a WP with freedom, and none has multiplicity 1 here).
fn ia3d() -> GroupTables {
    let body_centering = Centering::I.lattice_points();

    // 16a and 16b each have 8 operations in the primitive description;
    // body centering doubles that to 16.
    let point_group_16a = [
        nalgebra::Vector3::new(0.0, 0.0, 0.0),
        nalgebra::Vector3::new(0.75, 0.25, 0.5),
        nalgebra::Vector3::new(0.5, 0.75, 0.25),
        nalgebra::Vector3::new(0.25, 0.5, 0.75),
        nalgebra::Vector3::new(0.0, 0.5, 0.5),
        nalgebra::Vector3::new(0.75, 0.75, 0.0),
        nalgebra::Vector3::new(0.5, 0.25, 0.75),
        nalgebra::Vector3::new(0.25, 0.0, 0.25),
    ];
    let point_group_16b: Vec<nalgebra::Vector3<f64>> = point_group_16a
        .iter()
        .map(|p| p + nalgebra::Vector3::new(0.125, 0.125, 0.125))
        .collect();

    let wp_16a: Operations = body_centering
        .iter()
        .flat_map(|&t| {
            point_group_16a
                .iter()
                .map(move |&p| Operation::new(Rotation::zeros(), p + t))
        })
        .collect();
    let wp_16b: Operations = body_centering
        .iter()
        .flat_map(|&t| {
            point_group_16b
                .iter()
                .map(move |&p| Operation::new(Rotation::zeros(), p + t))
        })
        .collect();

    GroupTables {
        wyckoffs: vec![
            general_position_wp('a', wp_16a),
            general_position_wp('b', wp_16b),
        ],
        cellsize: Centering::I.order(),
    }
}

/// Cmc2_1 (#36): orthorhombic, C-centered. The zero-freedom 4a and the
/// free-parameter 8b positions, enough to place 16 Li via either WP alone
/// or a mix of both.
fn cmc21() -> GroupTables {
    let centering_shifts = Centering::C.lattice_points();
    let shift_op = |base: Operation, t: nalgebra::Vector3<f64>| {
        Operation::new(base.rotation, base.translation + t)
    };

    let site_4a = [
        Operation::new(Rotation::zeros(), nalgebra::Vector3::new(0.0, 0.0, 0.0)),
        Operation::new(
            Rotation::zeros(),
            nalgebra::Vector3::new(0.0, 0.5, 0.5),
        ),
    ];
    let wp_4a: Operations = centering_shifts
        .iter()
        .flat_map(|&t| site_4a.iter().map(move |op| shift_op(op.clone(), t)))
        .collect();

    let general_op = parse_operation("x,y,z");
    let mirror_op = parse_operation("-x,y,z");
    let wp_8b: Operations = centering_shifts
        .iter()
        .flat_map(|&t| {
            vec![
                shift_op(general_op.clone(), t),
                shift_op(mirror_op.clone(), t),
            ]
        })
        .collect();

    GroupTables {
        wyckoffs: vec![
            general_position_wp('a', wp_4a),
            general_position_wp('b', wp_8b),
        ],
        cellsize: Centering::C.order(),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_static_element_table_known_species() {
        let table = StaticElementTable::new();
        assert_relative_eq!(table.covalent_radius("Na").unwrap(), 1.66);
        assert_relative_eq!(table.van_der_waals_radius("Cl").unwrap(), 1.75);
        assert_eq!(table.atomic_number("C").unwrap(), 6);
    }

    #[test]
    fn test_static_element_table_unknown_species() {
        let table = StaticElementTable::new();
        assert!(table.covalent_radius("Xx").is_err());
    }

    #[test]
    fn test_static_symmetry_database_seed_groups() {
        let db = StaticSymmetryDatabase::new();
        assert!(db.tables(Dim::ThreeD, 1).is_ok());
        assert!(db.tables(Dim::ThreeD, 225).is_ok());
        assert!(db.tables(Dim::ThreeD, 230).is_ok());
        assert!(db.tables(Dim::ThreeD, 36).is_ok());
        assert!(db.tables(Dim::TwoD, 1).is_ok());
        assert!(db.tables(Dim::OneD, 1).is_ok());
        assert!(db.tables(Dim::ThreeD, 999).is_err());
    }

    #[test]
    fn test_ia3d_smallest_multiplicity_is_16() {
        let db = StaticSymmetryDatabase::new();
        let tables = db.tables(Dim::ThreeD, 230).unwrap();
        let smallest = tables
            .wyckoffs
            .iter()
            .map(|wp| wp.multiplicity())
            .min()
            .unwrap();
        assert_eq!(smallest, 16);
    }

    #[test]
    fn test_fm3m_special_positions_have_no_freedom() {
        let db = StaticSymmetryDatabase::new();
        let tables = db.tables(Dim::ThreeD, 225).unwrap();
        let wp_a = tables.wyckoffs.iter().find(|wp| wp.letter == 'a').unwrap();
        assert_eq!(wp_a.multiplicity(), 4);
        assert!(!wp_a.has_freedom());
    }
}
