use serde::{Deserialize, Serialize};

use crate::base::GenError;

/// Periodicity of the symmetry group a crystal is generated under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    /// 3D space group, number in `[1, 230]`.
    ThreeD,
    /// 2D layer group, number in `[1, 80]`.
    TwoD,
    /// 1D Rod group, number in `[1, 75]`.
    OneD,
}

impl Dim {
    pub fn max_group_number(&self) -> u16 {
        match self {
            Dim::ThreeD => 230,
            Dim::TwoD => 80,
            Dim::OneD => 75,
        }
    }

    /// Number of periodic axes: 3 for a space group, 2 for a layer group
    /// (the non-periodic axis is conventionally c), 1 for a Rod group (the
    /// periodic axis is conventionally c).
    pub fn num_periodic_axes(&self) -> usize {
        match self {
            Dim::ThreeD => 3,
            Dim::TwoD => 2,
            Dim::OneD => 1,
        }
    }
}

/// The seven 3D crystal systems (2D/1D groups are classified onto the same
/// lattice-shape buckets the lattice sampler understands: triclinic,
/// monoclinic, orthorhombic, tetragonal, trigonal/hexagonal, cubic).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    TrigonalHexagonal,
    Cubic,
}

/// Which lattice axis carries the Gaussian-sampled monoclinic angle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueAxis {
    A,
    B,
    C,
}

/// Classify a 3D space-group number into its crystal system.
pub fn crystal_system_3d(group_number: u16) -> Result<CrystalSystem, GenError> {
    match group_number {
        1..=2 => Ok(CrystalSystem::Triclinic),
        3..=15 => Ok(CrystalSystem::Monoclinic),
        16..=74 => Ok(CrystalSystem::Orthorhombic),
        75..=142 => Ok(CrystalSystem::Tetragonal),
        143..=194 => Ok(CrystalSystem::TrigonalHexagonal),
        195..=230 => Ok(CrystalSystem::Cubic),
        _ => Err(GenError::DomainError {
            reason: format!("{group_number} is not a valid 3D space-group number"),
        }),
    }
}

/// Classify a 2D layer-group number into its crystal system, along with the
/// unique monoclinic axis the original generator used for that range.
pub fn crystal_system_2d(group_number: u16) -> Result<(CrystalSystem, UniqueAxis), GenError> {
    match group_number {
        1..=2 => Ok((CrystalSystem::Triclinic, UniqueAxis::C)),
        3..=7 => Ok((CrystalSystem::Monoclinic, UniqueAxis::C)),
        8..=18 => Ok((CrystalSystem::Monoclinic, UniqueAxis::A)),
        19..=48 => Ok((CrystalSystem::Orthorhombic, UniqueAxis::C)),
        49..=64 => Ok((CrystalSystem::Tetragonal, UniqueAxis::C)),
        65..=80 => Ok((CrystalSystem::TrigonalHexagonal, UniqueAxis::C)),
        _ => Err(GenError::DomainError {
            reason: format!("{group_number} is not a valid layer-group number"),
        }),
    }
}

/// Classify a 1D Rod-group number into its crystal system, along with the
/// unique monoclinic axis the original generator used for that range.
pub fn crystal_system_1d(group_number: u16) -> Result<(CrystalSystem, UniqueAxis), GenError> {
    match group_number {
        1..=2 => Ok((CrystalSystem::Triclinic, UniqueAxis::C)),
        3..=7 => Ok((CrystalSystem::Monoclinic, UniqueAxis::A)),
        8..=12 => Ok((CrystalSystem::Monoclinic, UniqueAxis::C)),
        13..=22 => Ok((CrystalSystem::Orthorhombic, UniqueAxis::C)),
        23..=41 => Ok((CrystalSystem::Tetragonal, UniqueAxis::C)),
        42..=75 => Ok((CrystalSystem::TrigonalHexagonal, UniqueAxis::C)),
        _ => Err(GenError::DomainError {
            reason: format!("{group_number} is not a valid Rod-group number"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_crystal_system_3d_boundaries() {
        assert_eq!(crystal_system_3d(1).unwrap(), CrystalSystem::Triclinic);
        assert_eq!(crystal_system_3d(2).unwrap(), CrystalSystem::Triclinic);
        assert_eq!(crystal_system_3d(3).unwrap(), CrystalSystem::Monoclinic);
        assert_eq!(crystal_system_3d(74).unwrap(), CrystalSystem::Orthorhombic);
        assert_eq!(crystal_system_3d(75).unwrap(), CrystalSystem::Tetragonal);
        assert_eq!(
            crystal_system_3d(194).unwrap(),
            CrystalSystem::TrigonalHexagonal
        );
        assert_eq!(crystal_system_3d(230).unwrap(), CrystalSystem::Cubic);
        assert!(crystal_system_3d(231).is_err());
        assert!(crystal_system_3d(0).is_err());
    }

    #[test]
    fn test_crystal_system_2d_unique_axis() {
        assert_eq!(
            crystal_system_2d(5).unwrap(),
            (CrystalSystem::Monoclinic, UniqueAxis::C)
        );
        assert_eq!(
            crystal_system_2d(10).unwrap(),
            (CrystalSystem::Monoclinic, UniqueAxis::A)
        );
    }

    #[test]
    fn test_crystal_system_1d_unique_axis() {
        assert_eq!(
            crystal_system_1d(4).unwrap(),
            (CrystalSystem::Monoclinic, UniqueAxis::A)
        );
        assert_eq!(
            crystal_system_1d(10).unwrap(),
            (CrystalSystem::Monoclinic, UniqueAxis::C)
        );
    }
}
