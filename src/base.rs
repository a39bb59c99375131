mod cell;
mod error;
mod lattice;
mod operation;
mod tolerance;

pub use cell::{AtomicSpecie, Cell, Position};
pub use error::GenError;
pub use lattice::{para2matrix, matrix2para, Lattice, LatticeParams, TriangularForm};
pub use operation::{Operation, Operations, Rotation, Rotations, Translation};
pub use tolerance::EPS;

pub(super) use cell::connected_components;
pub(super) use operation::project_rotations;
#[allow(unused_imports)]
pub(super) use operation::traverse;
