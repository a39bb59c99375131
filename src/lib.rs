//! Random crystal-structure generator constrained by crystallographic
//! symmetry: given a 3D space group, 2D layer group or 1D Rod group, a set
//! of chemical species with per-species atom counts, and a volume-scaling
//! factor, produces a lattice plus a symmetry-compatible set of fractional
//! coordinates.
//!
//! The symmetry database and periodic element table are consumed as opaque,
//! read-only tables through the [`external`] traits; a CIF writer or other
//! file-format concern is out of scope.

#[allow(unused_imports)]
#[macro_use]
extern crate approx;

pub mod base;
pub mod compatibility;
pub mod config;
pub mod data;
pub mod external;
pub mod generate;
pub mod geometry;
pub mod lattice_sampler;
pub mod merge;

pub use base::{AtomicSpecie, Cell, GenError, Position};
pub use compatibility::{check_compatible, Feasibility};
pub use config::GenerationParams;
pub use generate::{CancellationToken, CrystalGenerator, DimensionParams};
